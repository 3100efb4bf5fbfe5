use std::{
    collections::{
        BTreeMap,
        HashSet,
    },
    path::Path,
    time::{
        Duration,
        Instant,
    },
};

use log::{
    debug,
    info,
};

use super::{
    config::{
        NoteFilter,
        RecalcConfig,
    },
    tasks::ProgressReporter,
    CardRecord,
    MorphRankError,
    NoteRecord,
};
use crate::{
    anki::{
        fields::{
            update_highlighted_field,
            update_score_field,
            update_unknowns_count_field,
            update_unknowns_field,
        },
        load_filter_cards,
        offset::add_offsets_to_new_cards,
        resolve_note_type,
        scoring::score_card,
        state::update_tags_and_queue,
        Collection,
        FilterCards,
    },
    cache::{
        build_morph_cache,
        CardMorphCache,
    },
    dictionary::PriorityTable,
    segmentation::MorphemizerRegistry,
};

/// Everything a recalc wants to write, computed without touching the collection.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Extra fields to add, per note type name.
    pub new_fields: Vec<(String, Vec<String>)>,
    pub cards: Vec<CardRecord>,
    pub notes: Vec<NoteRecord>,
    pub cache: CardMorphCache,
    pub cards_offset: usize,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.new_fields.is_empty() && self.cards.is_empty() && self.notes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecalcSummary {
    pub cached_cards: usize,
    pub cards_updated: usize,
    pub notes_updated: usize,
    pub fields_added: usize,
    pub cards_offset: usize,
    pub duration: Duration,
}

fn enabled_filters(config: &RecalcConfig) -> impl Iterator<Item = &NoteFilter> {
    config.filters.iter().filter(|filter| filter.read || filter.modify)
}

/// Fails on the first configuration fault, before any card is read.
pub fn validate(
    config: &RecalcConfig,
    collection: &dyn Collection,
    morphemizers: &MorphemizerRegistry,
) -> Result<(), MorphRankError> {
    if enabled_filters(config).any(|filter| filter.note_type.is_empty()) {
        return Err(MorphRankError::DefaultSettings);
    }

    for filter in config.read_enabled_filters() {
        morphemizers.get(&filter.morphemizer)?;
    }

    for filter in enabled_filters(config) {
        resolve_note_type(collection, filter)?;
    }
    Ok(())
}

/// Extra fields that modify-enabled filters write to but that their note types lack.
pub fn new_extra_fields_selected(
    collection: &dyn Collection,
    config: &RecalcConfig,
) -> Result<Vec<(String, Vec<String>)>, MorphRankError> {
    let mut missing: Vec<(String, Vec<String>)> = Vec::new();

    for filter in config.modify_enabled_filters() {
        let (note_type, _) = resolve_note_type(collection, filter)?;
        let position = match missing.iter().position(|(name, _)| *name == note_type.name) {
            Some(position) => position,
            None => {
                missing.push((note_type.name.clone(), Vec::new()));
                missing.len() - 1
            }
        };

        let fields = &mut missing[position].1;
        for field in filter.selected_extra_fields() {
            if note_type.field_index(field).is_none() && !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        }
    }

    missing.retain(|(_, fields)| !fields.is_empty());
    Ok(missing)
}

/// Appends every extra field the note type is about to gain and pads its notes,
/// the same way the collection will once the fields are added for real. Filters
/// sharing a note type all see the same field order, so their writes land at the
/// indices `commit` creates.
fn provision_extra_fields(selected: &mut FilterCards, new_fields: &[(String, Vec<String>)]) {
    let Some((_, fields)) = new_fields.iter().find(|(name, _)| *name == selected.note_type.name)
    else {
        return;
    };
    for field in fields {
        if selected.note_type.field_index(field).is_none() {
            selected.note_type.fields.push(field.clone());
        }
    }

    let field_count = selected.note_type.fields.len();
    for note in selected.notes.values_mut() {
        if note.fields.len() < field_count {
            note.fields.resize(field_count, String::new());
        }
    }
}

/// Runs everything up to, but not including, the first write.
pub fn compute_changes(
    collection: &dyn Collection,
    config: &RecalcConfig,
    morphemizers: &MorphemizerRegistry,
    progress: &ProgressReporter,
) -> Result<ChangeSet, MorphRankError> {
    validate(config, collection, morphemizers)?;
    let new_fields = new_extra_fields_selected(collection, config)?;

    let cache = build_morph_cache(collection, config, morphemizers, progress)?;

    let threshold = config.known_interval_threshold;
    let mut handled_ids: HashSet<u64> = HashSet::new();
    let mut handled_cards: Vec<CardRecord> = Vec::new();
    let mut modified_cards: BTreeMap<u64, CardRecord> = BTreeMap::new();
    let mut modified_notes: BTreeMap<u64, NoteRecord> = BTreeMap::new();

    for filter in config.modify_enabled_filters() {
        let mut selected = load_filter_cards(collection, filter)?;
        provision_extra_fields(&mut selected, &new_fields);
        let priority = PriorityTable::build(filter, &cache, config)?;

        let card_amount = selected.cards.len();
        for (counter, card) in selected.cards.iter().enumerate() {
            progress.checkpoint(
                || {
                    format!(
                        "Updating {} cards, card: {} of {}",
                        filter.note_type, counter, card_amount
                    )
                },
                counter,
                card_amount,
            )?;

            // The first filter that selects a card owns it.
            if !handled_ids.insert(card.id) {
                continue;
            }
            let Some(persisted_note) = selected.note(card) else {
                continue;
            };

            // Sibling cards share a note, so start from its pending state.
            let mut note = modified_notes
                .get(&persisted_note.id)
                .cloned()
                .unwrap_or_else(|| persisted_note.clone());
            let mut updated_card = card.clone();
            let card_morphs = cache.get(card.id);

            if card.is_new() {
                let card_score =
                    score_card(card_morphs, &priority, threshold, config.move_known_new_cards_to_end);
                updated_card.due = card_score.score;

                update_tags_and_queue(
                    config,
                    &mut note,
                    &mut updated_card,
                    card_score.unknown_count(),
                    card_score.has_learning_morph,
                );

                if filter.extra_unknowns {
                    update_unknowns_field(
                        &mut note,
                        &selected.note_type,
                        &card_score.unknown_morphs,
                        config.unknowns_field_shows_inflections,
                    );
                }
                if filter.extra_unknowns_count {
                    update_unknowns_count_field(
                        &mut note,
                        &selected.note_type,
                        &card_score.unknown_morphs,
                    );
                }
                if filter.extra_score {
                    update_score_field(&mut note, &selected.note_type, card_score.score);
                }
            }

            if filter.extra_highlighted {
                update_highlighted_field(
                    &mut note,
                    &selected.note_type,
                    selected.field_index,
                    card_morphs,
                    threshold,
                );
            }

            handled_cards.push(card.clone());
            if updated_card != *card {
                modified_cards.insert(card.id, updated_card);
            }
            if note != *persisted_note {
                modified_notes.insert(note.id, note);
            } else {
                modified_notes.remove(&note.id);
            }
        }
        debug!(
            "{}: {} cards and {} notes pending",
            filter.note_type,
            modified_cards.len(),
            modified_notes.len()
        );
    }

    let cards_offset = if config.offset_new_cards {
        add_offsets_to_new_cards(config, &cache, &handled_cards, &mut modified_cards, progress)?
    } else {
        0
    };

    Ok(ChangeSet {
        new_fields,
        cards: modified_cards.into_values().collect(),
        notes: modified_notes.into_values().collect(),
        cache,
        cards_offset,
    })
}

/// Writes a change set. This is the only step of a recalc that mutates the
/// collection or the cache file.
pub fn commit(
    collection: &mut dyn Collection,
    changes: &ChangeSet,
    cache_path: Option<&Path>,
) -> Result<(), MorphRankError> {
    for (note_type, fields) in &changes.new_fields {
        collection.add_fields(note_type, fields)?;
    }
    if !changes.cards.is_empty() {
        collection.update_cards(&changes.cards)?;
    }
    if !changes.notes.is_empty() {
        collection.update_notes(&changes.notes)?;
    }
    if let Some(path) = cache_path {
        changes.cache.save(path)?;
    }

    info!("Committed {} cards and {} notes", changes.cards.len(), changes.notes.len());
    Ok(())
}

/// Recomputes scores, tags and extra fields for every filtered card and writes the changes.
///
/// A cancelled or failed run returns before `commit`, so the collection and the
/// cache file keep their previous state.
pub fn recalc(
    collection: &mut dyn Collection,
    config: &RecalcConfig,
    morphemizers: &MorphemizerRegistry,
    progress: &ProgressReporter,
    cache_path: Option<&Path>,
) -> Result<RecalcSummary, MorphRankError> {
    let start = Instant::now();

    let changes = compute_changes(&*collection, config, morphemizers, progress)?;
    progress.check_cancelled()?;

    progress.report("Saving changes", 0, changes.cards.len() + changes.notes.len());
    commit(collection, &changes, cache_path)?;

    let duration = start.elapsed();
    info!("Recalc duration: {:.2}s", duration.as_secs_f32());

    Ok(RecalcSummary {
        cached_cards: changes.cache.len(),
        cards_updated: changes.cards.len(),
        notes_updated: changes.notes.len(),
        fields_added: changes.new_fields.iter().map(|(_, fields)| fields.len()).sum(),
        cards_offset: changes.cards_offset,
        duration,
    })
}
