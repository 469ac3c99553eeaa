pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod scoring;
pub mod synonyms;
pub mod tokenizer;

pub use error::{QueryError, StoreError};
pub use index::{skip_path, Corpus, DocId, Index, IndexBuilder, PostingIndex, SKIP_STRIDE};
pub use query::{Engine, Hit, Query, QueryMode, RankedHit};
pub use scoring::TfIdfTable;
pub use synonyms::{NoSynonyms, SynonymSource, SynonymTable};
pub use tokenizer::{Tokenizer, TokenizerConfig};
