use std::sync::OnceLock;

use jieba_rs::Jieba;
use log::info;

use super::Morphemizer;
use crate::core::{
    utils::is_cjk_ideograph,
    Morph,
};

/// Statistical Chinese word segmentation on top of jieba's embedded dictionary.
/// The dictionary is loaded the first time text is segmented.
#[derive(Default)]
pub struct JiebaMorphemizer {
    jieba: OnceLock<Jieba>,
}

impl JiebaMorphemizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn jieba(&self) -> &Jieba {
        self.jieba.get_or_init(|| {
            info!("Loading jieba dictionary");
            Jieba::new()
        })
    }
}

/// Segments containing anything but ideographs (punctuation, latin, digits) are dropped.
fn is_chinese_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(is_cjk_ideograph)
}

impl Morphemizer for JiebaMorphemizer {
    fn name(&self) -> &str {
        "chinese"
    }

    fn segment(&self, text: &str) -> Vec<Morph> {
        self.jieba()
            .tag(text, true)
            .into_iter()
            .filter(|tag| is_chinese_word(tag.word))
            // Chinese has no inflection.
            .map(|tag| Morph::uninflected(tag.word))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chinese_word_filter() {
        assert!(is_chinese_word("学习"));
        assert!(is_chinese_word("〇"));
        assert!(!is_chinese_word("，"));
        assert!(!is_chinese_word("hello"));
        assert!(!is_chinese_word("3D"));
        assert!(!is_chinese_word("中a"));
        assert!(!is_chinese_word(""));
    }

    #[test]
    fn test_segments_are_whole_ideograph_words() {
        let morphemizer = JiebaMorphemizer::new();
        let morphs = morphemizer.segment("我们中出了一个叛徒，hello 2024！");

        assert!(!morphs.is_empty());
        for morph in &morphs {
            assert!(is_chinese_word(morph.lemma()), "{:?}", morph);
            assert_eq!(morph.lemma(), morph.inflection());
        }
        let joined: String = morphs.iter().map(|m| m.lemma()).collect();
        assert_eq!(joined, "我们中出了一个叛徒");
    }

    #[test]
    fn test_punctuation_and_latin_only_is_empty() {
        let morphemizer = JiebaMorphemizer::new();
        assert!(morphemizer.segment("Hello, world! 123 。").is_empty());
    }
}
