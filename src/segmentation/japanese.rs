use vibrato::Tokenizer;
use wana_kana::IsJapaneseStr;

use super::Morphemizer;
use crate::{
    core::Morph,
    dictionary::token_dictionary::DictType,
};

// Tokens with these top-level parts of speech never carry vocabulary.
const SKIPPED_POS: &[&str] = &["補助記号", "記号", "空白"];

/// Dictionary-based Japanese segmentation on top of vibrato.
pub struct VibratoMorphemizer {
    tokenizer: Tokenizer,
    lemma_index: usize,
}

impl VibratoMorphemizer {
    pub fn new(tokenizer: Tokenizer, dict_type: &DictType) -> Self {
        Self { tokenizer, lemma_index: dict_type.lemma_index() }
    }
}

/// Turns one token's surface and feature string into a morph.
pub fn morph_from_token(surface: &str, features: &str, lemma_index: usize) -> Option<Morph> {
    let fields: Vec<&str> = features.split(',').collect();
    let pos = fields.first().copied().unwrap_or("*");

    if SKIPPED_POS.contains(&pos) || surface.trim().is_empty() || !surface.is_japanese() {
        return None;
    }

    let lemma = match fields.get(lemma_index) {
        Some(&lemma) if lemma != "*" && !lemma.is_empty() => lemma,
        _ => surface,
    };

    Some(Morph::new(lemma, surface))
}

impl Morphemizer for VibratoMorphemizer {
    fn name(&self) -> &str {
        "japanese"
    }

    fn segment(&self, text: &str) -> Vec<Morph> {
        self.segment_batch(&[text.to_string()]).pop().unwrap_or_default()
    }

    fn segment_batch(&self, texts: &[String]) -> Vec<Vec<Morph>> {
        // One worker for the whole batch.
        let mut worker = self.tokenizer.new_worker();

        texts
            .iter()
            .map(|text| {
                worker.reset_sentence(text);
                worker.tokenize();
                worker
                    .token_iter()
                    .filter_map(|token| {
                        morph_from_token(token.surface(), token.feature(), self.lemma_index)
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIDIC_LEMMA: usize = 10;

    #[test]
    fn test_unidic_token_uses_orthographic_base() {
        let features = "動詞,一般,*,*,下一段-バ行,連用形-一般,タベル,食べる,食べ,タベ,食べる,タベル,和,*,*,*,*";
        let morph = morph_from_token("食べ", features, UNIDIC_LEMMA).unwrap();
        assert_eq!(morph.lemma(), "食べる");
        assert_eq!(morph.inflection(), "食べ");
    }

    #[test]
    fn test_missing_lemma_falls_back_to_surface() {
        let morph = morph_from_token("ヨミネ", "名詞,固有名詞,*,*", UNIDIC_LEMMA).unwrap();
        assert_eq!(morph.lemma(), "ヨミネ");
    }

    #[test]
    fn test_symbols_and_latin_are_skipped() {
        assert!(morph_from_token("。", "補助記号,句点,*,*", UNIDIC_LEMMA).is_none());
        assert!(morph_from_token(" ", "空白,*,*,*", UNIDIC_LEMMA).is_none());
        assert!(morph_from_token("abc", "名詞,普通名詞,*,*", UNIDIC_LEMMA).is_none());
    }
}
