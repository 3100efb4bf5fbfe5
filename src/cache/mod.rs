pub mod builder;

use std::{
    collections::BTreeMap,
    path::{
        Path,
        PathBuf,
    },
};

pub use builder::build_morph_cache;
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    core::{
        config::MORPH_CACHE_FILE_NAME,
        Morph,
        MorphKey,
        MorphRankError,
    },
    persistence::{
        get_data_file_path,
        load_snapshot,
        save_snapshot,
    },
};

/// Card id → de-duplicated morphs, plus the highest learning interval seen for every morph.
///
/// Ordered maps and an explicit scan order keep the encoded snapshot identical
/// across rebuilds of unchanged input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMorphCache {
    cards: BTreeMap<u64, Vec<Morph>>,
    scan_order: Vec<u64>,
    morph_intervals: BTreeMap<MorphKey, u32>,
}

impl CardMorphCache {
    pub fn default_path() -> PathBuf {
        get_data_file_path(MORPH_CACHE_FILE_NAME)
    }

    pub fn get(&self, card_id: u64) -> Option<&[Morph]> {
        self.cards.get(&card_id).map(Vec::as_slice)
    }

    pub fn contains_card(&self, card_id: u64) -> bool {
        self.cards.contains_key(&card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn morph_count(&self) -> usize {
        self.morph_intervals.len()
    }

    /// Cards in the order they were read from the collection.
    pub fn iter_in_scan_order(&self) -> impl Iterator<Item = &[Morph]> {
        self.scan_order.iter().filter_map(|id| self.get(*id))
    }

    pub fn insert_card(&mut self, card_id: u64, morphs: Vec<Morph>) {
        if self.cards.insert(card_id, morphs).is_none() {
            self.scan_order.push(card_id);
        }
    }

    pub fn morph_interval(&self, key: &MorphKey) -> Option<u32> {
        self.morph_intervals.get(key).copied()
    }

    /// Keeps the highest interval recorded for `key`.
    pub fn record_interval(&mut self, key: &MorphKey, interval: u32) {
        match self.morph_intervals.get_mut(key) {
            Some(highest) => *highest = (*highest).max(interval),
            None => {
                self.morph_intervals.insert(key.clone(), interval);
            }
        }
    }

    /// Copies the aggregated intervals onto every cached morph.
    pub fn apply_intervals(&mut self) {
        for morphs in self.cards.values_mut() {
            for morph in morphs.iter_mut() {
                morph.highest_learning_interval =
                    Some(self.morph_intervals.get(morph.key()).copied().unwrap_or(0));
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), MorphRankError> {
        save_snapshot(self, path)
    }

    pub fn load(path: &Path) -> Result<Option<Self>, MorphRankError> {
        load_snapshot(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intervals_keep_the_highest_value() {
        let mut cache = CardMorphCache::default();
        let cat = MorphKey::new("cat", "cat");

        cache.insert_card(7, vec![Morph::uninflected("cat")]);
        cache.record_interval(&cat, 3);
        cache.record_interval(&cat, 30);
        cache.record_interval(&cat, 0);
        cache.apply_intervals();

        assert_eq!(cache.morph_interval(&cat), Some(30));
        assert_eq!(cache.get(7).unwrap()[0].highest_learning_interval, Some(30));
        assert!(cache.get(8).is_none());
    }

    #[test]
    fn test_scan_order_is_insertion_order() {
        let mut cache = CardMorphCache::default();
        cache.insert_card(20, vec![Morph::uninflected("b")]);
        cache.insert_card(10, vec![Morph::uninflected("a")]);
        cache.insert_card(20, vec![Morph::uninflected("c")]);

        let first: Vec<&str> = cache.iter_in_scan_order().map(|m| m[0].lemma()).collect();
        assert_eq!(first, vec!["c", "a"]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MORPH_CACHE_FILE_NAME);

        let mut cache = CardMorphCache::default();
        cache.insert_card(1, vec![Morph::new("go", "went")]);
        cache.record_interval(&MorphKey::new("go", "went"), 5);
        cache.apply_intervals();
        cache.save(&path).unwrap();

        assert_eq!(CardMorphCache::load(&path).unwrap(), Some(cache));
    }
}
