use crate::tokenizer::normalize;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A lexical resource that maps a term to its synonyms.
///
/// A miss is an empty set, never an error.
pub trait SynonymSource: Send + Sync {
    fn synonyms(&self, term: &str) -> BTreeSet<String>;
}

/// Expansion disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSynonyms;

impl SynonymSource for NoSynonyms {
    fn synonyms(&self, _term: &str) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// Static thesaurus: each term maps to its sense groups, each group a list of
/// lemma names.
///
/// Keys are normalized on every path in, so lookups by query term hit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawSenses", into = "RawSenses")]
pub struct SynonymTable {
    senses: HashMap<String, Vec<Vec<String>>>,
}

type RawSenses = HashMap<String, Vec<Vec<String>>>;

impl From<RawSenses> for SynonymTable {
    fn from(raw: RawSenses) -> Self {
        let mut table = SynonymTable::new();
        for (term, groups) in raw {
            for group in groups {
                table.add_sense(&term, group);
            }
        }
        table
    }
}

impl From<SynonymTable> for RawSenses {
    fn from(table: SynonymTable) -> Self {
        table.senses
    }
}

impl SynonymTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one sense group for `term`.
    pub fn add_sense<I, S>(&mut self, term: &str, lemmas: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = lemmas.into_iter().map(Into::into).collect();
        self.senses.entry(normalize(term)).or_default().push(group);
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        let table: SynonymTable = serde_json::from_reader(BufReader::new(f))?;
        tracing::info!(terms = table.senses.len(), path = %path.as_ref().display(), "synonym table loaded");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.senses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }
}

impl SynonymSource for SynonymTable {
    fn synonyms(&self, term: &str) -> BTreeSet<String> {
        self.senses
            .get(term)
            .map(|groups| groups.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unions_lemmas_across_senses() {
        let table = SynonymTable::from_json_str(
            r#"{"car": [["car", "auto", "automobile"], ["car", "railcar"]]}"#,
        )
        .unwrap();
        let syns: Vec<String> = table.synonyms("car").into_iter().collect();
        assert_eq!(syns, vec!["auto", "automobile", "car", "railcar"]);
    }

    #[test]
    fn json_keys_are_normalized_like_added_senses() {
        let table = SynonymTable::from_json_str(
            r#"{"Hound": [["hound", "dog"]], "hound": [["hound", "beagle"]]}"#,
        )
        .unwrap();
        let syns: Vec<String> = table.synonyms("hound").into_iter().collect();
        assert_eq!(syns, vec!["beagle", "dog", "hound"]);
        assert_eq!(table.len(), 1);
        assert!(table.synonyms("Hound").is_empty());
    }

    #[test]
    fn miss_is_empty() {
        let mut table = SynonymTable::new();
        table.add_sense("Dog", ["dog", "domestic_dog"]);
        assert!(table.synonyms("cat").is_empty());
        assert!(table.synonyms("dog").contains("domestic_dog"));
        assert!(NoSynonyms.synonyms("dog").is_empty());
    }
}
