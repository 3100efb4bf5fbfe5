pub mod chinese;
pub mod cjk;
pub mod japanese;
pub mod space;

use std::collections::HashMap;

pub use chinese::JiebaMorphemizer;
pub use cjk::CjkCharMorphemizer;
pub use japanese::VibratoMorphemizer;
pub use space::SpaceMorphemizer;

use crate::core::{
    Morph,
    MorphRankError,
};

/// Splits text into morphs. Implementations are selected by name from the config.
pub trait Morphemizer: Send {
    fn name(&self) -> &str;

    fn segment(&self, text: &str) -> Vec<Morph>;

    /// Segments many texts at once. The output is aligned 1:1 with `texts`.
    fn segment_batch(&self, texts: &[String]) -> Vec<Vec<Morph>> {
        texts.iter().map(|text| self.segment(text)).collect()
    }
}

/// Owns the morphemizer instances available to one recalc run.
#[derive(Default)]
pub struct MorphemizerRegistry {
    morphemizers: HashMap<String, Box<dyn Morphemizer>>,
}

impl MorphemizerRegistry {
    pub fn new() -> Self {
        Self { morphemizers: HashMap::new() }
    }

    /// The backends that need no external resources. Jieba's dictionary is
    /// embedded, so Chinese is always available.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SpaceMorphemizer));
        registry.register(Box::new(CjkCharMorphemizer));
        registry.register(Box::new(JiebaMorphemizer::new()));
        registry
    }

    pub fn register(&mut self, morphemizer: Box<dyn Morphemizer>) {
        self.morphemizers.insert(morphemizer.name().to_string(), morphemizer);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Morphemizer, MorphRankError> {
        self.morphemizers
            .get(name)
            .map(|m| m.as_ref())
            .ok_or_else(|| MorphRankError::MorphemizerNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.morphemizers.keys().cloned().collect();
        names.sort();
        names
    }
}
