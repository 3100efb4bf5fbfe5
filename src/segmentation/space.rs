use std::sync::OnceLock;

use regex::Regex;

use super::Morphemizer;
use crate::core::Morph;

fn word_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r"\w+(?:['’-]\w+)*").expect("invalid built-in regex")
    })
}

/// For languages that delimit words with spaces. There is no lemmatization,
/// so lemma and inflection are the same word.
pub struct SpaceMorphemizer;

impl Morphemizer for SpaceMorphemizer {
    fn name(&self) -> &str {
        "space"
    }

    fn segment(&self, text: &str) -> Vec<Morph> {
        word_regex()
            .find_iter(text)
            .map(|word| Morph::uninflected(word.as_str().to_lowercase()))
            .collect()
    }
}
