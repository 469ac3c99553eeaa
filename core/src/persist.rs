use crate::error::StoreError;
use crate::index::{Index, PostingIndex};
use crate::scoring::TfIdfTable;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"BWIX";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub num_terms: usize,
    pub num_biwords: usize,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn for_index(index: &Index, created_at: String) -> Self {
        Self {
            num_docs: index.num_docs,
            num_terms: index.inverted.len(),
            num_biwords: index.biword.len(),
            created_at,
            version: FORMAT_VERSION,
        }
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn inverted(&self) -> PathBuf { self.root.join("inverted.bin") }
    pub fn biword(&self) -> PathBuf { self.root.join("biword.bin") }
    pub fn scores(&self) -> PathBuf { self.root.join("tfidf.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Encode a value as an index blob: magic, format version, bincode payload.
pub fn to_blob<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    let payload = bincode::serialize(value)?;
    let mut blob = Vec::with_capacity(HEADER_LEN + payload.len());
    blob.extend_from_slice(MAGIC);
    blob.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    blob.extend_from_slice(&payload);
    Ok(blob)
}

pub fn from_blob<T: DeserializeOwned>(blob: &[u8]) -> Result<T, StoreError> {
    if blob.len() < HEADER_LEN || &blob[..4] != MAGIC {
        return Err(StoreError::BadMagic);
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&blob[4..HEADER_LEN]);
    let version = u32::from_le_bytes(version);
    if version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion(version));
    }
    Ok(bincode::deserialize(&blob[HEADER_LEN..])?)
}

/// `save`/`load` contract for one posting index.
pub trait IndexStore {
    fn save(&self, index: &PostingIndex) -> Result<Vec<u8>, StoreError>;
    fn load(&self, blob: &[u8]) -> Result<PostingIndex, StoreError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeStore;

impl IndexStore for BincodeStore {
    fn save(&self, index: &PostingIndex) -> Result<Vec<u8>, StoreError> {
        to_blob(index)
    }

    fn load(&self, blob: &[u8]) -> Result<PostingIndex, StoreError> {
        from_blob(blob)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>, StoreError> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn save_posting_index(path: &Path, index: &PostingIndex) -> Result<(), StoreError> {
    write_file(path, &BincodeStore.save(index)?)
}

pub fn load_posting_index(path: &Path) -> Result<PostingIndex, StoreError> {
    BincodeStore.load(&read_file(path)?)
}

/// Write both posting indexes and the meta file.
pub fn save_index(paths: &IndexPaths, index: &Index, meta: &MetaFile) -> Result<(), StoreError> {
    create_dir_all(&paths.root)?;
    save_posting_index(&paths.inverted(), &index.inverted)?;
    save_posting_index(&paths.biword(), &index.biword)?;
    save_meta(paths, meta)?;
    tracing::info!(root = %paths.root.display(), terms = index.inverted.len(), biwords = index.biword.len(), "index saved");
    Ok(())
}

/// Load both posting indexes. Any missing or corrupt artifact fails the whole load.
pub fn load_index(paths: &IndexPaths) -> Result<Index, StoreError> {
    let meta = load_meta(paths)?;
    let inverted = load_posting_index(&paths.inverted())?;
    let biword = load_posting_index(&paths.biword())?;
    tracing::info!(root = %paths.root.display(), terms = inverted.len(), biwords = biword.len(), "index loaded");
    Ok(Index::new(inverted, biword, meta.num_docs))
}

pub fn save_scores(paths: &IndexPaths, scores: &TfIdfTable) -> Result<(), StoreError> {
    create_dir_all(&paths.root)?;
    write_file(&paths.scores(), &to_blob(scores)?)
}

/// `Ok(None)` when the index was saved without a TF-IDF table.
pub fn load_scores(paths: &IndexPaths) -> Result<Option<TfIdfTable>, StoreError> {
    match read_file(&paths.scores()) {
        Ok(blob) => Ok(Some(from_blob(&blob)?)),
        Err(StoreError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<(), StoreError> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_file(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile, StoreError> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}
