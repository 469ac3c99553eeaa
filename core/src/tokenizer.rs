use lazy_static::lazy_static;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

lazy_static! {
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","ain","all","am","an","and","any","are","aren","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","couldn","couldn't",
            "d","did","didn","didn't","do","does","doesn","doesn't","doing","don","don't","down","during",
            "each","few","for","from","further",
            "had","hadn","hadn't","has","hasn","hasn't","have","haven","haven't","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","isn","isn't","it","it's","its","itself",
            "just","ll","m","ma","me","mightn","mightn't","more","most","mustn","mustn't","my","myself",
            "needn","needn't","no","nor","not","now",
            "o","of","off","on","once","only","or","other","our","ours","ourselves","out","over","own",
            "re","s","same","shan","shan't","she","she's","should","should've","shouldn","shouldn't","so","some","such",
            "t","than","that","that'll","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","wasn","wasn't","we","were","weren","weren't","what","when","where","which","while","who","whom","why","will","with","won","won't","wouldn","wouldn't",
            "y","you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    static ref CUSTOM_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "i","me","my","myself","we","our","ours","ourselves","you","your","yours",
            "yourself","yourselves","he","him","his","himself","she","her","hers",
            "herself","it","its","itself","they","them","their","theirs","themselves",
            "what","which","who","whom","this","that","these","those","am","is","are",
            "was","were","be","been","being","have","has","had","having","do","does",
            "did","doing","a","an","the","and","but","if","or","because","as","until",
            "while","of","at","by","for","with","about","against","between","into",
            "through","during","before","after","above","below","to","from","up","down",
            "in","out","on","off","over","under","again","further","then","once","here",
            "there","when","where","why","how","all","any","both","each","few","more",
            "most","other","some","such","no","nor","not","only","own","same","so",
            "than","too","very","s","t","can","will","just","don","should","now"
        ];
        words.iter().copied().collect()
    };
}

/// Stop-word configuration for a [`Tokenizer`].
///
/// `stop_words` holds the language list, `custom_stop_words` the closed-class
/// words curated for the corpus. Both are plain sets so callers can swap them
/// for another language or domain.
#[derive(Debug, Clone, Default)]
pub struct TokenizerConfig {
    pub stop_words: HashSet<String>,
    pub custom_stop_words: HashSet<String>,
}

impl TokenizerConfig {
    /// Built-in English stop list plus the built-in custom list.
    pub fn english() -> Self {
        Self {
            stop_words: ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            custom_stop_words: CUSTOM_STOPWORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// No stop words at all; only lowercasing and punctuation removal apply.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add extra words to the custom set. Words are lowercased.
    pub fn with_custom_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for w in words {
            let w = w.as_ref().trim();
            if !w.is_empty() {
                self.custom_stop_words.insert(w.to_lowercase());
            }
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::english())
    }
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    fn is_stopword(&self, token: &str) -> bool {
        self.config.stop_words.contains(token) || self.config.custom_stop_words.contains(token)
    }

    /// Tokenize text using NFKC normalization, lowercase, Unicode word
    /// boundaries, punctuation removal and both stop-word sets. Token order
    /// follows the text.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        normalize(text)
            .split_word_bounds()
            .filter(|word| is_word(word))
            .filter(|word| !self.is_stopword(word))
            .map(str::to_string)
            .collect()
    }
}

/// NFKC then lowercase. Query terms go through the same step as document text.
pub fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

// Pure punctuation and whitespace segments carry no alphanumeric character.
fn is_word(segment: &str) -> bool {
    segment.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order_and_drops_punctuation() {
        let t = Tokenizer::new(TokenizerConfig::empty());
        assert_eq!(t.tokenize("Cat, sat; MAT!"), vec!["cat", "sat", "mat"]);
    }

    #[test]
    fn custom_words_are_lowercased() {
        let cfg = TokenizerConfig::empty().with_custom_words(["Lorem", " ", "ipsum"]);
        let t = Tokenizer::new(cfg);
        assert_eq!(t.tokenize("lorem ipsum dolor"), vec!["dolor"]);
    }
}
