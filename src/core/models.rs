use std::{
    borrow::Borrow,
    hash::{
        Hash,
        Hasher,
    },
};

use serde::{
    Deserialize,
    Serialize,
};

/// Identity of a morph. Two morphs are the same entity when lemma and inflection match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MorphKey {
    pub lemma: String,
    pub inflection: String,
}

impl MorphKey {
    pub fn new(lemma: impl Into<String>, inflection: impl Into<String>) -> Self {
        Self { lemma: lemma.into(), inflection: inflection.into() }
    }
}

/// A vocabulary unit extracted from card text.
///
/// Equality and hashing only look at `(lemma, inflection)`; the interval is
/// derived data attached after the morph cache has been built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Morph {
    key: MorphKey,
    pub highest_learning_interval: Option<u32>,
}

impl Morph {
    pub fn new(lemma: impl Into<String>, inflection: impl Into<String>) -> Self {
        Self { key: MorphKey::new(lemma, inflection), highest_learning_interval: None }
    }

    /// Languages without inflection (ideographic scripts) use the lemma for both.
    pub fn uninflected(lemma: impl Into<String>) -> Self {
        let lemma = lemma.into();
        Self::new(lemma.clone(), lemma)
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.highest_learning_interval = Some(interval);
        self
    }

    pub fn lemma(&self) -> &str {
        &self.key.lemma
    }

    pub fn inflection(&self) -> &str {
        &self.key.inflection
    }

    pub fn key(&self) -> &MorphKey {
        &self.key
    }

    /// A morph never seen on a reviewed card. Morphs without interval data count as unknown.
    pub fn is_unknown(&self) -> bool {
        self.highest_learning_interval.unwrap_or(0) == 0
    }
}

impl PartialEq for Morph {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Morph {}

impl Hash for Morph {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Borrow<MorphKey> for Morph {
    fn borrow(&self) -> &MorphKey {
        &self.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    New,
    Learning,
    Review,
    Relearning,
}

impl From<i32> for CardKind {
    fn from(value: i32) -> Self {
        match value {
            0 => CardKind::New,
            1 => CardKind::Learning,
            3 => CardKind::Relearning,
            _ => CardKind::Review,
        }
    }
}

impl From<CardKind> for i32 {
    fn from(kind: CardKind) -> Self {
        match kind {
            CardKind::New => 0,
            CardKind::Learning => 1,
            CardKind::Review => 2,
            CardKind::Relearning => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueState {
    SchedulerBuried,
    UserBuried,
    Suspended,
    New,
    Learning,
    Review,
    DayLearning,
    Preview,
}

impl From<i32> for QueueState {
    fn from(value: i32) -> Self {
        match value {
            -3 => QueueState::SchedulerBuried,
            -2 => QueueState::UserBuried,
            -1 => QueueState::Suspended,
            1 => QueueState::Learning,
            2 => QueueState::Review,
            3 => QueueState::DayLearning,
            4 => QueueState::Preview,
            _ => QueueState::New,
        }
    }
}

impl From<QueueState> for i32 {
    fn from(queue: QueueState) -> Self {
        match queue {
            QueueState::SchedulerBuried => -3,
            QueueState::UserBuried => -2,
            QueueState::Suspended => -1,
            QueueState::New => 0,
            QueueState::Learning => 1,
            QueueState::Review => 2,
            QueueState::DayLearning => 3,
            QueueState::Preview => 4,
        }
    }
}

/// Scheduling side of a flashcard. Fields and tags live on the note the card belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    pub id: u64,
    pub note_id: u64,
    pub note_type_id: u64,
    pub kind: CardKind,
    pub due: i64,
    pub queue: QueueState,
    pub interval: u32, // days
}

impl CardRecord {
    pub fn is_new(&self) -> bool {
        self.kind == CardKind::New
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub id: u64,
    pub note_type_id: u64,
    pub fields: Vec<String>,
    pub tags: Vec<String>,
}

impl NoteRecord {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteType {
    pub id: u64,
    pub name: String,
    pub fields: Vec<String>,
}

impl NoteType {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field == name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_morph_identity_ignores_interval() {
        let a = Morph::new("go", "went").with_interval(5);
        let b = Morph::new("go", "went");
        let c = Morph::new("go", "going");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Morph> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&MorphKey::new("go", "going")));
    }

    #[test]
    fn test_uninflected_morph() {
        let morph = Morph::uninflected("学");
        assert_eq!(morph.lemma(), "学");
        assert_eq!(morph.inflection(), "学");
        assert!(morph.is_unknown());
        assert!(!morph.with_interval(3).is_unknown());
    }

    #[test]
    fn test_queue_and_kind_round_trip_anki_values() {
        assert_eq!(QueueState::from(-1), QueueState::Suspended);
        assert_eq!(i32::from(QueueState::Suspended), -1);
        assert_eq!(CardKind::from(0), CardKind::New);
        assert_eq!(i32::from(CardKind::Learning), 1);
    }
}
