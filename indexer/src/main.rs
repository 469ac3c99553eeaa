use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scraper::Html;
use search_core::persist::{save_index, save_scores, IndexPaths, MetaFile};
use search_core::{Corpus, IndexBuilder, TfIdfTable, Tokenizer, TokenizerConfig};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build inverted and biword indexes from a document directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a directory of HTML or text files
    Build {
        /// Input directory (or a single file)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Extra stop words, one per line, merged into the custom list
        #[arg(long)]
        stopwords: Option<String>,
        /// File extensions to index
        #[arg(long, value_delimiter = ',', default_value = "html,htm,txt")]
        extensions: Vec<String>,
        /// Build postings and scores on the rayon pool
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stopwords, extensions, parallel } => {
            let mut config = TokenizerConfig::english();
            if let Some(path) = stopwords {
                let words = fs::read_to_string(&path).with_context(|| format!("reading stop words from {path}"))?;
                config = config.with_custom_words(words.lines());
            }
            build_index(Path::new(&input), Path::new(&output), &Tokenizer::new(config), &extensions, parallel)
        }
    }
}

fn build_index(input: &Path, output: &Path, tokenizer: &Tokenizer, extensions: &[String], parallel: bool) -> Result<()> {
    let files = collect_files(input, extensions);
    tracing::info!(files = files.len(), input = %input.display(), "found documents");

    // Sorted walk keeps posting order reproducible across runs.
    let mut corpus = Corpus::new();
    for file in files {
        match read_document(&file) {
            Ok(text) => corpus.insert(file.to_string_lossy().into_owned(), tokenizer.tokenize(&text)),
            Err(err) => tracing::warn!(path = %file.display(), error = %err, "skipping unreadable document"),
        }
    }
    tracing::info!(num_docs = corpus.len(), "documents read");

    let builder = IndexBuilder::new();
    let (index, scores) = if parallel {
        let index = builder.build_parallel(&corpus);
        let scores = TfIdfTable::build_parallel(&corpus, &index.inverted);
        (index, scores)
    } else {
        let index = builder.build(&corpus);
        let scores = TfIdfTable::build(&corpus, &index.inverted);
        (index, scores)
    };

    let paths = IndexPaths::new(output);
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    save_index(&paths, &index, &MetaFile::for_index(&index, created_at))?;
    save_scores(&paths, &scores)?;

    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}

fn collect_files(input: &Path, extensions: &[String]) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e.into_path()),
            Err(err) => {
                let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
                tracing::warn!(path = %path, error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|p| p.is_file() && has_extension(p, extensions))
        .collect()
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

fn read_document(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)?;
    let is_html = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
    Ok(if is_html { html_text(&raw) } else { raw })
}

/// Visible text of an HTML document, with script and style bodies removed.
fn html_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut out = String::new();
    for node in doc.tree.nodes() {
        let Some(text) = node.value().as_text() else { continue };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| matches!(e.name(), "script" | "style" | "noscript")))
            .unwrap_or(false);
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}
