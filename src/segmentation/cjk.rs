use super::Morphemizer;
use crate::core::{
    utils::is_cjk_ideograph,
    Morph,
};

/// Every CJK ideograph is its own morph. Chinese has no inflection, so the
/// character is used for both lemma and inflection.
pub struct CjkCharMorphemizer;

impl Morphemizer for CjkCharMorphemizer {
    fn name(&self) -> &str {
        "cjk-characters"
    }

    fn segment(&self, text: &str) -> Vec<Morph> {
        text.chars()
            .filter(|c| is_cjk_ideograph(*c))
            .map(|c| Morph::uninflected(c.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ideographs_become_morphs() {
        let morphs = CjkCharMorphemizer.segment("我爱学习 hello，中文！");
        let chars: Vec<&str> = morphs.iter().map(|m| m.lemma()).collect();
        assert_eq!(chars, vec!["我", "爱", "学", "习", "中", "文"]);
    }

    #[test]
    fn test_repeated_characters_are_not_deduplicated_here() {
        assert_eq!(CjkCharMorphemizer.segment("人人").len(), 2);
    }
}
