use search_core::{Tokenizer, TokenizerConfig};

#[test]
fn it_lowercases_and_keeps_order() {
    let t = Tokenizer::default();
    let words = t.tokenize("Quantum ENTANGLEMENT experiments, revisited.");
    assert_eq!(words, vec!["quantum", "entanglement", "experiments", "revisited"]);
}

#[test]
fn it_filters_both_stopword_sets() {
    let t = Tokenizer::default();
    let words = t.tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words, vec!["quick", "brown", "fox", "lazy", "dog"]);

    // pronouns and auxiliaries come from the custom list
    let cfg = TokenizerConfig { stop_words: Default::default(), ..TokenizerConfig::english() };
    let words = Tokenizer::new(cfg).tokenize("They were having lunch");
    assert_eq!(words, vec!["lunch"]);
}

#[test]
fn it_does_not_stem() {
    let t = Tokenizer::default();
    let words = t.tokenize("Running runners run");
    assert_eq!(words, vec!["running", "runners", "run"]);
}

#[test]
fn it_applies_nfkc() {
    let t = Tokenizer::new(TokenizerConfig::empty());
    // fullwidth letters fold to ASCII
    assert_eq!(t.tokenize("ＣＡＦＥ menu"), vec!["cafe", "menu"]);
}

#[test]
fn punctuation_only_text_is_empty() {
    let t = Tokenizer::default();
    assert!(t.tokenize("... !!! -- ??").is_empty());
    assert!(t.tokenize("").is_empty());
}
