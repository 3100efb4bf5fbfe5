use std::collections::HashMap;

use crate::core::{
    config::NoteFilter,
    CardRecord,
    MorphRankError,
    NoteRecord,
    NoteType,
};

pub mod api;
pub mod connect;
pub mod fields;
pub mod highlight;
pub mod memory;
pub mod offset;
pub mod scoring;
pub mod state;

pub use connect::AnkiConnectCollection;
pub use memory::InMemoryCollection;

/// The flashcard store recalc reads from and, in the commit phase only, writes to.
pub trait Collection: Send {
    fn note_type(&self, name: &str) -> Result<Option<NoteType>, MorphRankError>;

    /// All cards of the note type, ordered by card id.
    fn cards_of_note_type(&self, note_type: &NoteType) -> Result<Vec<CardRecord>, MorphRankError>;

    fn notes(&self, note_ids: &[u64]) -> Result<Vec<NoteRecord>, MorphRankError>;

    /// Appends fields to the end of a note type. Existing notes get empty values for them.
    fn add_fields(&mut self, note_type: &str, field_names: &[String]) -> Result<(), MorphRankError>;

    fn update_cards(&mut self, cards: &[CardRecord]) -> Result<(), MorphRankError>;

    fn update_notes(&mut self, notes: &[NoteRecord]) -> Result<(), MorphRankError>;
}

/// The cards a note filter selects, together with their notes.
#[derive(Debug, Clone)]
pub struct FilterCards {
    pub note_type: NoteType,
    pub field_index: usize,
    pub cards: Vec<CardRecord>,
    pub notes: HashMap<u64, NoteRecord>,
}

impl FilterCards {
    pub fn note(&self, card: &CardRecord) -> Option<&NoteRecord> {
        self.notes.get(&card.note_id)
    }
}

pub fn resolve_note_type(
    collection: &dyn Collection,
    filter: &NoteFilter,
) -> Result<(NoteType, usize), MorphRankError> {
    if filter.note_type.is_empty() {
        return Err(MorphRankError::DefaultSettings);
    }

    let note_type = collection
        .note_type(&filter.note_type)?
        .ok_or_else(|| MorphRankError::NoteTypeNotFound(filter.note_type.clone()))?;

    let field_index =
        note_type.field_index(&filter.field).ok_or_else(|| MorphRankError::FieldNotFound {
            note_type: filter.note_type.clone(),
            field: filter.field.clone(),
        })?;

    Ok((note_type, field_index))
}

/// Loads the filter's cards in card-id order, dropping those whose note misses the tag selection.
pub fn load_filter_cards(
    collection: &dyn Collection,
    filter: &NoteFilter,
) -> Result<FilterCards, MorphRankError> {
    let (note_type, field_index) = resolve_note_type(collection, filter)?;

    let mut cards = collection.cards_of_note_type(&note_type)?;
    cards.sort_by_key(|card| card.id);

    let mut note_ids: Vec<u64> = cards.iter().map(|card| card.note_id).collect();
    note_ids.sort_unstable();
    note_ids.dedup();

    let notes: HashMap<u64, NoteRecord> = collection
        .notes(&note_ids)?
        .into_iter()
        .filter(|note| filter.tags.matches(&note.tags))
        .map(|note| (note.id, note))
        .collect();

    cards.retain(|card| notes.contains_key(&card.note_id));

    Ok(FilterCards { note_type, field_index, cards, notes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        config::TagSelector,
        CardKind,
        QueueState,
    };

    fn sample_collection() -> InMemoryCollection {
        let mut collection = InMemoryCollection::new();
        let note_type = collection.add_note_type("Sentence", &["Front", "Back"]);
        for (id, tag) in [(3u64, "core"), (1, "core"), (2, "leech")] {
            collection.add_note(NoteRecord {
                id: id * 10,
                note_type_id: note_type,
                fields: vec![format!("front {id}"), String::new()],
                tags: vec![tag.to_string()],
            });
            collection.add_card(CardRecord {
                id,
                note_id: id * 10,
                note_type_id: note_type,
                kind: CardKind::New,
                due: 0,
                queue: QueueState::New,
                interval: 0,
            });
        }
        collection
    }

    #[test]
    fn test_filter_cards_are_sorted_and_tag_filtered() {
        let collection = sample_collection();
        let filter = NoteFilter {
            note_type: "Sentence".to_string(),
            field: "Front".to_string(),
            tags: TagSelector { include: vec![], exclude: vec!["leech".to_string()] },
            ..NoteFilter::default()
        };

        let selected = load_filter_cards(&collection, &filter).unwrap();
        let ids: Vec<u64> = selected.cards.iter().map(|c| c.id).collect();

        assert_eq!(ids, vec![1, 3]);
        assert_eq!(selected.field_index, 0);
        assert_eq!(selected.note(&selected.cards[0]).unwrap().fields[0], "front 1");
    }

    #[test]
    fn test_resolution_faults() {
        let collection = sample_collection();

        let unset = NoteFilter::default();
        assert!(matches!(
            resolve_note_type(&collection, &unset),
            Err(MorphRankError::DefaultSettings)
        ));

        let missing_type = NoteFilter { note_type: "Vocab".into(), ..NoteFilter::default() };
        assert!(matches!(
            resolve_note_type(&collection, &missing_type),
            Err(MorphRankError::NoteTypeNotFound(name)) if name == "Vocab"
        ));

        let missing_field = NoteFilter {
            note_type: "Sentence".into(),
            field: "Expression".into(),
            ..NoteFilter::default()
        };
        assert!(matches!(
            resolve_note_type(&collection, &missing_field),
            Err(MorphRankError::FieldNotFound { .. })
        ));
    }
}
