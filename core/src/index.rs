use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub type DocId = String;

/// Stride of the skip path over a posting list.
pub const SKIP_STRIDE: usize = 2;

/// Entries at positions 0, 2, 4, ... of a posting list.
pub fn skip_path(postings: &[DocId]) -> impl Iterator<Item = &DocId> {
    postings.iter().step_by(SKIP_STRIDE)
}

/// Tokenized documents in processing order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<(DocId, Vec<String>)>,
    positions: HashMap<DocId, usize>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document. An existing ID keeps its position and gets the new tokens.
    pub fn insert(&mut self, doc_id: impl Into<DocId>, tokens: Vec<String>) {
        let doc_id = doc_id.into();
        match self.positions.get(&doc_id) {
            Some(&pos) => self.docs[pos].1 = tokens,
            None => {
                self.positions.insert(doc_id.clone(), self.docs.len());
                self.docs.push((doc_id, tokens));
            }
        }
    }

    pub fn tokens(&self, doc_id: &str) -> Option<&[String]> {
        self.positions.get(doc_id).map(|&pos| self.docs[pos].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DocId, &[String])> {
        self.docs.iter().map(|(id, tokens)| (id, tokens.as_slice()))
    }

    pub(crate) fn as_slice(&self) -> &[(DocId, Vec<String>)] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Key → posting list. Keys are ordered so serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingIndex {
    postings: BTreeMap<String, Vec<DocId>>,
}

impl PostingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, doc_id: &str) {
        match self.postings.get_mut(key) {
            Some(list) => list.push(doc_id.to_string()),
            None => {
                self.postings.insert(key.to_string(), vec![doc_id.to_string()]);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&[DocId]> {
        self.postings.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.postings.contains_key(key)
    }

    /// Number of entries in the key's posting list (its document frequency for
    /// the inverted index).
    pub fn df(&self, key: &str) -> usize {
        self.postings.get(key).map_or(0, Vec::len)
    }

    pub fn contains(&self, key: &str, doc_id: &str) -> bool {
        self.get(key).is_some_and(|list| list.iter().any(|d| d == doc_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<DocId>)> {
        self.postings.iter()
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

pub fn biword_key(first: &str, second: &str) -> String {
    format!("{first} {second}")
}

/// Inverted and biword indexes built from one corpus snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub inverted: PostingIndex,
    pub biword: PostingIndex,
    pub num_docs: usize,
}

impl Index {
    pub fn new(inverted: PostingIndex, biword: PostingIndex, num_docs: usize) -> Self {
        Self { inverted, biword, num_docs }
    }
}

/// What one document adds to both indexes, in append order.
struct DocContribution<'a> {
    doc_id: &'a str,
    distinct: Vec<&'a str>,
    biwords: Vec<String>,
}

fn contribution<'a>(doc_id: &'a str, tokens: &'a [String]) -> DocContribution<'a> {
    let mut seen: HashSet<&str> = HashSet::new();
    let distinct = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| seen.insert(*t))
        .collect();
    let biwords = tokens.windows(2).map(|w| biword_key(&w[0], &w[1])).collect();
    DocContribution { doc_id, distinct, biwords }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexBuilder;

impl IndexBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Single-threaded build. Posting order follows corpus order.
    pub fn build(&self, corpus: &Corpus) -> Index {
        let contributions = corpus
            .as_slice()
            .iter()
            .map(|(id, tokens)| contribution(id, tokens));
        self.merge(contributions, corpus.len())
    }

    /// Per-document work runs on the rayon pool; the merge stays in corpus
    /// order so the result equals [`IndexBuilder::build`].
    pub fn build_parallel(&self, corpus: &Corpus) -> Index {
        let contributions: Vec<DocContribution<'_>> = corpus
            .as_slice()
            .par_iter()
            .map(|(id, tokens)| contribution(id, tokens))
            .collect();
        self.merge(contributions, corpus.len())
    }

    fn merge<'a>(&self, contributions: impl IntoIterator<Item = DocContribution<'a>>, num_docs: usize) -> Index {
        let mut inverted = PostingIndex::new();
        let mut biword = PostingIndex::new();
        for c in contributions {
            for token in c.distinct {
                inverted.push(token, c.doc_id);
            }
            // One append per occurrence, duplicates kept.
            for key in &c.biwords {
                biword.push(key, c.doc_id);
            }
        }
        tracing::info!(
            num_docs,
            num_terms = inverted.len(),
            num_biwords = biword.len(),
            "index built"
        );
        Index::new(inverted, biword, num_docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn inverted_is_deduplicated_biword_is_not() {
        let mut corpus = Corpus::new();
        corpus.insert("d1", toks("new york new york"));
        corpus.insert("d2", toks("york"));
        let index = IndexBuilder::new().build(&corpus);
        assert_eq!(index.inverted.get("new").unwrap(), ["d1"]);
        assert_eq!(index.inverted.get("york").unwrap(), ["d1", "d2"]);
        assert_eq!(index.biword.get("new york").unwrap(), ["d1", "d1"]);
        assert_eq!(index.biword.get("york new").unwrap(), ["d1"]);
        assert_eq!(index.num_docs, 2);
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut corpus = Corpus::new();
        corpus.insert("a", toks("x"));
        corpus.insert("b", toks("x"));
        corpus.insert("a", toks("x y"));
        assert_eq!(corpus.len(), 2);
        let index = IndexBuilder::new().build(&corpus);
        assert_eq!(index.inverted.get("x").unwrap(), ["a", "b"]);
        assert_eq!(index.inverted.get("y").unwrap(), ["a"]);
    }

    #[test]
    fn skip_path_takes_even_positions() {
        let list: Vec<DocId> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let sampled: Vec<&DocId> = skip_path(&list).collect();
        assert_eq!(sampled, ["a", "c", "e"]);
    }
}
