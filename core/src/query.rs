//! Boolean and ranked retrieval over a built [`Index`].
//!
//! Raw query terms are expanded with a [`SynonymSource`]; the expanded set
//! drives the AND/OR evaluation against the inverted index. Biword and
//! skip-path matches are reported next to the primary matches as secondary
//! signals.

use crate::error::QueryError;
use crate::index::{biword_key, skip_path, DocId, Index};
use crate::scoring::TfIdfTable;
use crate::synonyms::{NoSynonyms, SynonymSource};
use crate::tokenizer::normalize;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryMode {
    And,
    Or,
}

impl FromStr for QueryMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(QueryMode::And),
            "OR" => Ok(QueryMode::Or),
            _ => Err(QueryError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryMode::And => f.write_str("AND"),
            QueryMode::Or => f.write_str("OR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    terms: Vec<String>,
    mode: QueryMode,
    /// Query as the user typed it, reported back in result rows.
    original: String,
}

impl Query {
    /// Terms are used as given.
    pub fn new<I, S>(terms: I, mode: QueryMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        let original = terms.join(" ");
        Self { terms, mode, original }
    }

    /// Split on whitespace and normalize each term like the tokenizer does.
    pub fn parse(text: &str, mode: &str) -> Result<Self, QueryError> {
        let mode = mode.parse()?;
        let raw: Vec<&str> = text.split_whitespace().collect();
        Ok(Self {
            terms: raw.iter().map(|t| normalize(t)).collect(),
            mode,
            original: raw.join(" "),
        })
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// A single term is always evaluated as OR.
    pub fn mode(&self) -> QueryMode {
        if self.terms.len() == 1 {
            QueryMode::Or
        } else {
            self.mode
        }
    }

    pub fn text(&self) -> &str {
        &self.original
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// One boolean-mode row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Hit {
    pub doc_id: DocId,
    /// Query term, synonym or biword key that produced the row.
    pub matched: String,
    pub biword: bool,
    pub skip_path: bool,
    pub query: String,
}

/// One ranked-mode row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedHit {
    pub doc_id: DocId,
    pub score: f64,
    /// Expanded terms with a weight in this document.
    pub terms: Vec<String>,
    pub biword: bool,
    pub skip_path: bool,
    pub query: String,
}

struct Expansion<'q> {
    raw: &'q [String],
    synonyms: Vec<BTreeSet<String>>,
    all: BTreeSet<String>,
}

impl Expansion<'_> {
    fn biwords(&self) -> Vec<String> {
        self.raw.windows(2).map(|w| biword_key(&w[0], &w[1])).collect()
    }
}

/// Read-only query engine over one index snapshot.
#[derive(Clone)]
pub struct Engine {
    index: Arc<Index>,
    scores: Option<Arc<TfIdfTable>>,
    synonyms: Arc<dyn SynonymSource>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("num_docs", &self.index.num_docs)
            .field("num_terms", &self.index.inverted.len())
            .field("ranked", &self.scores.is_some())
            .finish()
    }
}

impl Engine {
    pub fn new(index: Index) -> Self {
        Self { index: Arc::new(index), scores: None, synonyms: Arc::new(NoSynonyms) }
    }

    pub fn with_scores(mut self, scores: TfIdfTable) -> Self {
        self.scores = Some(Arc::new(scores));
        self
    }

    pub fn with_synonyms<S: SynonymSource + 'static>(mut self, synonyms: S) -> Self {
        self.synonyms = Arc::new(synonyms);
        self
    }

    pub fn with_shared_synonyms(mut self, synonyms: Arc<dyn SynonymSource>) -> Self {
        self.synonyms = synonyms;
        self
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn scores(&self) -> Option<&TfIdfTable> {
        self.scores.as_deref()
    }

    pub fn has_scores(&self) -> bool {
        self.scores.is_some()
    }

    fn expand<'q>(&self, query: &'q Query) -> Expansion<'q> {
        let raw = query.terms();
        let synonyms: Vec<BTreeSet<String>> = raw.iter().map(|t| self.synonyms.synonyms(t)).collect();
        let mut all: BTreeSet<String> = raw.iter().cloned().collect();
        for syns in &synonyms {
            all.extend(syns.iter().cloned());
        }
        tracing::debug!(raw = ?raw, expanded = ?all, "expanded query terms");
        Expansion { raw, synonyms, all }
    }

    /// Documents matched by the boolean evaluation, ascending by ID.
    fn evaluate(&self, mode: QueryMode, terms: &BTreeSet<String>) -> BTreeSet<DocId> {
        let inverted = &self.index.inverted;
        let mut present = terms.iter().filter_map(|t| inverted.get(t));
        match mode {
            QueryMode::And => {
                // No present term means no match, not every document.
                let Some(first) = present.next() else {
                    return BTreeSet::new();
                };
                let mut result: BTreeSet<DocId> = first.iter().cloned().collect();
                for postings in present {
                    let docs: HashSet<&DocId> = postings.iter().collect();
                    result.retain(|d| docs.contains(d));
                }
                result
            }
            QueryMode::Or => present.flatten().cloned().collect(),
        }
    }

    /// Primary matched document set for `query`.
    pub fn documents(&self, query: &Query) -> Vec<DocId> {
        if query.is_empty() {
            return Vec::new();
        }
        let expansion = self.expand(query);
        self.evaluate(query.mode(), &expansion.all).into_iter().collect()
    }

    /// Raw terms first in query order, then synonyms in query order.
    fn provenance(&self, doc_id: &str, expansion: &Expansion<'_>) -> Option<String> {
        let inverted = &self.index.inverted;
        expansion
            .raw
            .iter()
            .find(|t| inverted.contains(t, doc_id))
            .or_else(|| {
                expansion
                    .synonyms
                    .iter()
                    .flatten()
                    .find(|s| inverted.contains(s, doc_id))
            })
            .cloned()
    }

    /// Unranked search: one row per matched document, then biword rows, then
    /// skip-path rows. Rows are unique per (document, key, kind).
    pub fn search(&self, query: &Query) -> Vec<Hit> {
        if query.is_empty() {
            return Vec::new();
        }
        let expansion = self.expand(query);
        let docs = self.evaluate(query.mode(), &expansion.all);
        let text = query.text().to_string();

        let mut hits = Vec::new();
        let mut seen: HashSet<Hit> = HashSet::new();
        let mut emit = |hit: Hit, hits: &mut Vec<Hit>| {
            if seen.insert(hit.clone()) {
                hits.push(hit);
            }
        };

        for doc_id in &docs {
            if let Some(matched) = self.provenance(doc_id, &expansion) {
                let hit = Hit { doc_id: doc_id.clone(), matched, biword: false, skip_path: false, query: text.clone() };
                emit(hit, &mut hits);
            }
        }

        for key in expansion.biwords() {
            let Some(postings) = self.index.biword.get(&key) else { continue };
            for doc_id in postings {
                let hit = Hit { doc_id: doc_id.clone(), matched: key.clone(), biword: true, skip_path: false, query: text.clone() };
                emit(hit, &mut hits);
            }
        }

        for term in &expansion.all {
            let Some(postings) = self.index.inverted.get(term) else { continue };
            for doc_id in skip_path(postings) {
                let hit = Hit { doc_id: doc_id.clone(), matched: term.clone(), biword: false, skip_path: true, query: text.clone() };
                emit(hit, &mut hits);
            }
        }

        tracing::debug!(query = %text, mode = %query.mode(), docs = docs.len(), rows = hits.len(), "search finished");
        hits
    }

    /// Ranked search: documents ordered by summed TF-IDF weight of the
    /// expanded terms, descending, ties by document ID ascending.
    pub fn rank(&self, query: &Query) -> Result<Vec<RankedHit>, QueryError> {
        let table = self.scores.as_deref().ok_or(QueryError::ScoresUnavailable)?;
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let expansion = self.expand(query);
        let docs = self.evaluate(query.mode(), &expansion.all);
        let biwords = expansion.biwords();
        let text = query.text().to_string();

        let biword_docs: HashSet<&DocId> = biwords
            .iter()
            .filter_map(|k| self.index.biword.get(k))
            .flatten()
            .collect();
        let skip_docs: HashSet<&DocId> = expansion
            .all
            .iter()
            .filter_map(|t| self.index.inverted.get(t))
            .flat_map(|postings| skip_path(postings))
            .collect();

        let mut ranked: Vec<RankedHit> = docs
            .into_iter()
            .map(|doc_id| {
                let mut score = 0.0;
                let mut terms = Vec::new();
                for term in &expansion.all {
                    if let Some(w) = table.get(&doc_id, term) {
                        score += w;
                        terms.push(term.clone());
                    }
                }
                // Biword keys only count when the table holds them literally.
                for key in &biwords {
                    if let Some(w) = table.get(&doc_id, key) {
                        score += w;
                    }
                }
                RankedHit {
                    biword: biword_docs.contains(&doc_id),
                    skip_path: skip_docs.contains(&doc_id),
                    doc_id,
                    score,
                    terms,
                    query: text.clone(),
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        Ok(ranked)
    }
}
