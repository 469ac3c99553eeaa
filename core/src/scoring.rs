//! TF-IDF weights per (document, term).
//!
//! `tf = count(t, d) / |d|` over the filtered token stream and
//! `idf = ln(N / (1 + df(t)))` with `df` read from the inverted index.

use crate::index::{Corpus, DocId, PostingIndex};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Ordered at both levels so the persisted blob is byte-stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfIdfTable {
    weights: BTreeMap<DocId, BTreeMap<String, f64>>,
}

pub fn idf(num_docs: usize, df: usize) -> f64 {
    (num_docs as f64 / (1.0 + df as f64)).ln()
}

// None for a document without tokens.
fn score_doc(tokens: &[String], inverted: &PostingIndex, num_docs: usize) -> Option<BTreeMap<String, f64>> {
    if tokens.is_empty() {
        return None;
    }
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for t in tokens {
        *counts.entry(t.as_str()).or_insert(0) += 1;
    }
    let total = tokens.len() as f64;
    let weights = counts
        .into_iter()
        .map(|(term, count)| {
            let tf = count as f64 / total;
            (term.to_string(), tf * idf(num_docs, inverted.df(term)))
        })
        .collect();
    Some(weights)
}

impl TfIdfTable {
    pub fn build(corpus: &Corpus, inverted: &PostingIndex) -> Self {
        let n = corpus.len();
        let weights = corpus
            .iter()
            .filter_map(|(id, tokens)| score_doc(tokens, inverted, n).map(|w| (id.clone(), w)))
            .collect::<BTreeMap<_, _>>();
        tracing::info!(scored_docs = weights.len(), num_docs = n, "tf-idf table built");
        Self { weights }
    }

    pub fn build_parallel(corpus: &Corpus, inverted: &PostingIndex) -> Self {
        let n = corpus.len();
        let weights = corpus
            .as_slice()
            .par_iter()
            .filter_map(|(id, tokens)| score_doc(tokens, inverted, n).map(|w| (id.clone(), w)))
            .collect::<BTreeMap<_, _>>();
        tracing::info!(scored_docs = weights.len(), num_docs = n, "tf-idf table built");
        Self { weights }
    }

    /// Weight of `term` in `doc_id`; 0.0 when either is absent.
    pub fn weight(&self, doc_id: &str, term: &str) -> f64 {
        self.get(doc_id, term).unwrap_or(0.0)
    }

    pub fn get(&self, doc_id: &str, term: &str) -> Option<f64> {
        self.weights.get(doc_id).and_then(|terms| terms.get(term)).copied()
    }

    pub fn terms(&self, doc_id: &str) -> Option<&BTreeMap<String, f64>> {
        self.weights.get(doc_id)
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.weights.contains_key(doc_id)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
