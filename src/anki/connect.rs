use std::{
    collections::HashMap,
    time::Instant,
};

use log::{
    debug,
    info,
};
use tokio::runtime::Runtime;

use super::{
    api::{
        note_type_query,
        set_card_due_and_queue,
        update_note,
        AnkiConnectClient,
        CardInfo,
        NoteInfo,
    },
    Collection,
};
use crate::core::{
    CardKind,
    CardRecord,
    MorphRankError,
    NoteRecord,
    NoteType,
    QueueState,
};

/// AnkiConnect answers slowly for very large requests, so reads and writes are chunked.
const BATCH_SIZE: usize = 500;

fn card_record(info: CardInfo, note_type_id: u64) -> CardRecord {
    CardRecord {
        id: info.card_id,
        note_id: info.note,
        note_type_id,
        kind: CardKind::from(info.card_type),
        due: info.due,
        queue: QueueState::from(info.queue),
        // Learning steps are reported as negative seconds.
        interval: u32::try_from(info.interval.max(0)).unwrap_or(u32::MAX),
    }
}

fn note_record(info: &NoteInfo, model_ids: &HashMap<String, u64>) -> NoteRecord {
    NoteRecord {
        id: info.note_id,
        note_type_id: model_ids.get(&info.model_name).copied().unwrap_or_default(),
        fields: info.ordered_fields(),
        tags: info.tags.clone(),
    }
}

/// Collection backed by a running Anki instance with the AnkiConnect add-on.
pub struct AnkiConnectCollection {
    runtime: Runtime,
    client: AnkiConnectClient,
}

impl AnkiConnectCollection {
    pub fn new(url: &str) -> Result<Self, MorphRankError> {
        let runtime = Runtime::new()?;
        Ok(Self { runtime, client: AnkiConnectClient::new(url) })
    }

    /// Fails with the underlying connection error when AnkiConnect does not answer.
    pub fn check_connection(&self) -> Result<u32, MorphRankError> {
        let version = self.runtime.block_on(self.client.get_version())?;
        info!("AnkiConnect is online at {}. Version: {}", self.client.url(), version);
        Ok(version)
    }

    fn model_names_by_id(&self) -> Result<HashMap<u64, String>, MorphRankError> {
        let model_ids = self.runtime.block_on(self.client.get_model_ids())?;
        Ok(model_ids.into_iter().map(|(name, id)| (id, name)).collect())
    }
}

impl Collection for AnkiConnectCollection {
    fn note_type(&self, name: &str) -> Result<Option<NoteType>, MorphRankError> {
        self.runtime.block_on(async {
            let model_ids = self.client.get_model_ids().await?;
            let Some(&id) = model_ids.get(name) else {
                return Ok(None);
            };
            let fields = self.client.get_field_names(name).await?;
            Ok(Some(NoteType { id, name: name.to_string(), fields }))
        })
    }

    fn cards_of_note_type(&self, note_type: &NoteType) -> Result<Vec<CardRecord>, MorphRankError> {
        let start = Instant::now();
        let cards = self.runtime.block_on(async {
            let mut card_ids = self.client.find_cards(&note_type_query(&note_type.name)).await?;
            card_ids.sort_unstable();

            let mut cards = Vec::with_capacity(card_ids.len());
            for chunk in card_ids.chunks(BATCH_SIZE) {
                let infos = self.client.get_cards(chunk).await?;
                cards.extend(
                    infos
                        .into_iter()
                        .filter(|info| info.model_name == note_type.name)
                        .map(|info| card_record(info, note_type.id)),
                );
            }
            Ok::<Vec<CardRecord>, MorphRankError>(cards)
        })?;

        info!(
            "Loaded {} {} cards from Anki ({:.1}s)",
            cards.len(),
            note_type.name,
            start.elapsed().as_secs_f32()
        );
        Ok(cards)
    }

    fn notes(&self, note_ids: &[u64]) -> Result<Vec<NoteRecord>, MorphRankError> {
        self.runtime.block_on(async {
            let model_ids = self.client.get_model_ids().await?;
            let mut notes = Vec::with_capacity(note_ids.len());
            for chunk in note_ids.chunks(BATCH_SIZE) {
                let infos = self.client.get_notes(chunk).await?;
                notes.extend(infos.iter().map(|info| note_record(info, &model_ids)));
            }
            Ok(notes)
        })
    }

    fn add_fields(&mut self, note_type: &str, field_names: &[String]) -> Result<(), MorphRankError> {
        self.runtime.block_on(async {
            let mut index = self.client.get_field_names(note_type).await?.len();
            for field_name in field_names {
                self.client.add_field(note_type, field_name, index).await?;
                info!("Added field {} to note type {}", field_name, note_type);
                index += 1;
            }
            Ok(())
        })
    }

    fn update_cards(&mut self, cards: &[CardRecord]) -> Result<(), MorphRankError> {
        self.runtime.block_on(async {
            for chunk in cards.chunks(BATCH_SIZE) {
                let actions = chunk
                    .iter()
                    .map(|card| set_card_due_and_queue(card.id, card.due, i32::from(card.queue)))
                    .collect();
                self.client.multi(actions).await?;
                debug!("Updated {} cards", chunk.len());
            }
            Ok(())
        })
    }

    fn update_notes(&mut self, notes: &[NoteRecord]) -> Result<(), MorphRankError> {
        let model_names = self.model_names_by_id()?;

        self.runtime.block_on(async {
            let mut field_names: HashMap<u64, Vec<String>> = HashMap::new();
            for note in notes {
                if !field_names.contains_key(&note.note_type_id) {
                    let name = model_names.get(&note.note_type_id).ok_or_else(|| {
                        MorphRankError::Custom(format!(
                            "Note type {} of note {} does not exist",
                            note.note_type_id, note.id
                        ))
                    })?;
                    field_names
                        .insert(note.note_type_id, self.client.get_field_names(name).await?);
                }
            }

            for chunk in notes.chunks(BATCH_SIZE) {
                let actions = chunk
                    .iter()
                    .map(|note| {
                        let names = &field_names[&note.note_type_id];
                        let fields: HashMap<&str, &str> = names
                            .iter()
                            .map(String::as_str)
                            .zip(note.fields.iter().map(String::as_str))
                            .collect();
                        update_note(note.id, fields, &note.tags)
                    })
                    .collect();
                self.client.multi(actions).await?;
                debug!("Updated {} notes", chunk.len());
            }
            Ok(())
        })
    }
}
