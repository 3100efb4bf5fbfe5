use std::collections::BTreeMap;

use super::Collection;
use crate::core::{
    CardRecord,
    MorphRankError,
    NoteRecord,
    NoteType,
};

/// A collection held entirely in memory. Every write batch is recorded so
/// callers can check what a recalc actually committed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollection {
    note_types: Vec<NoteType>,
    cards: BTreeMap<u64, CardRecord>,
    notes: BTreeMap<u64, NoteRecord>,
    card_batches: Vec<Vec<u64>>,
    note_batches: Vec<Vec<u64>>,
    field_additions: Vec<(String, Vec<String>)>,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a note type and returns its id.
    pub fn add_note_type(&mut self, name: &str, fields: &[&str]) -> u64 {
        let id = 1_000 + self.note_types.len() as u64;
        self.note_types.push(NoteType {
            id,
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        id
    }

    pub fn add_card(&mut self, card: CardRecord) {
        self.cards.insert(card.id, card);
    }

    pub fn add_note(&mut self, note: NoteRecord) {
        self.notes.insert(note.id, note);
    }

    pub fn card(&self, id: u64) -> Option<&CardRecord> {
        self.cards.get(&id)
    }

    pub fn note(&self, id: u64) -> Option<&NoteRecord> {
        self.notes.get(&id)
    }

    pub fn all_cards(&self) -> Vec<CardRecord> {
        self.cards.values().cloned().collect()
    }

    pub fn all_notes(&self) -> Vec<NoteRecord> {
        self.notes.values().cloned().collect()
    }

    pub fn card_batches(&self) -> &[Vec<u64>] {
        &self.card_batches
    }

    pub fn note_batches(&self) -> &[Vec<u64>] {
        &self.note_batches
    }

    pub fn field_additions(&self) -> &[(String, Vec<String>)] {
        &self.field_additions
    }

    pub fn write_count(&self) -> usize {
        self.card_batches.len() + self.note_batches.len() + self.field_additions.len()
    }
}

impl Collection for InMemoryCollection {
    fn note_type(&self, name: &str) -> Result<Option<NoteType>, MorphRankError> {
        Ok(self.note_types.iter().find(|nt| nt.name == name).cloned())
    }

    fn cards_of_note_type(&self, note_type: &NoteType) -> Result<Vec<CardRecord>, MorphRankError> {
        Ok(self.cards.values().filter(|card| card.note_type_id == note_type.id).cloned().collect())
    }

    fn notes(&self, note_ids: &[u64]) -> Result<Vec<NoteRecord>, MorphRankError> {
        Ok(note_ids.iter().filter_map(|id| self.notes.get(id)).cloned().collect())
    }

    fn add_fields(&mut self, note_type: &str, field_names: &[String]) -> Result<(), MorphRankError> {
        let model = self
            .note_types
            .iter_mut()
            .find(|nt| nt.name == note_type)
            .ok_or_else(|| MorphRankError::NoteTypeNotFound(note_type.to_string()))?;

        model.fields.extend(field_names.iter().cloned());
        let field_count = model.fields.len();
        let model_id = model.id;

        for note in self.notes.values_mut().filter(|n| n.note_type_id == model_id) {
            note.fields.resize(field_count, String::new());
        }

        self.field_additions.push((note_type.to_string(), field_names.to_vec()));
        Ok(())
    }

    fn update_cards(&mut self, cards: &[CardRecord]) -> Result<(), MorphRankError> {
        for card in cards {
            if !self.cards.contains_key(&card.id) {
                return Err(MorphRankError::Custom(format!("Card {} does not exist", card.id)));
            }
        }
        for card in cards {
            self.cards.insert(card.id, card.clone());
        }
        self.card_batches.push(cards.iter().map(|c| c.id).collect());
        Ok(())
    }

    fn update_notes(&mut self, notes: &[NoteRecord]) -> Result<(), MorphRankError> {
        for note in notes {
            if !self.notes.contains_key(&note.id) {
                return Err(MorphRankError::Custom(format!("Note {} does not exist", note.id)));
            }
        }
        for note in notes {
            self.notes.insert(note.id, note.clone());
        }
        self.note_batches.push(notes.iter().map(|n| n.id).collect());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_fields_pad_existing_notes() {
        let mut collection = InMemoryCollection::new();
        let id = collection.add_note_type("Vocab", &["Word"]);
        collection.add_note(NoteRecord {
            id: 1,
            note_type_id: id,
            fields: vec!["cat".to_string()],
            tags: vec![],
        });

        collection.add_fields("Vocab", &["morph-score".to_string()]).unwrap();

        let note_type = collection.note_type("Vocab").unwrap().unwrap();
        assert_eq!(note_type.field_index("morph-score"), Some(1));
        assert_eq!(collection.note(1).unwrap().fields, vec!["cat".to_string(), String::new()]);
        assert_eq!(collection.write_count(), 1);
    }

    #[test]
    fn test_updating_unknown_card_fails_without_writing() {
        let mut collection = InMemoryCollection::new();
        let card = CardRecord {
            id: 9,
            note_id: 1,
            note_type_id: 1,
            kind: crate::core::CardKind::New,
            due: 0,
            queue: crate::core::QueueState::New,
            interval: 0,
        };

        assert!(collection.update_cards(&[card]).is_err());
        assert!(collection.card_batches().is_empty());
    }
}
