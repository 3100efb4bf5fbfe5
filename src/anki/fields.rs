use log::debug;

use super::highlight::highlight_text;
use crate::core::{
    config::{
        EXTRA_FIELD_HIGHLIGHTED,
        EXTRA_FIELD_SCORE,
        EXTRA_FIELD_UNKNOWNS,
        EXTRA_FIELD_UNKNOWNS_COUNT,
    },
    Morph,
    NoteRecord,
    NoteType,
};

/// Writes `value` into the named field. Returns false, leaving the note untouched,
/// when the field was never provisioned.
fn write_field(
    note: &mut NoteRecord,
    note_type: &NoteType,
    field_name: &str,
    value: String,
) -> bool {
    match note_type.field_index(field_name).and_then(|index| note.fields.get_mut(index)) {
        Some(field) => {
            *field = value;
            true
        }
        None => false,
    }
}

pub fn format_unknowns(unknowns: &[Morph], show_inflections: bool) -> String {
    unknowns
        .iter()
        .map(|morph| if show_inflections { morph.inflection() } else { morph.lemma() })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn update_unknowns_field(
    note: &mut NoteRecord,
    note_type: &NoteType,
    unknowns: &[Morph],
    show_inflections: bool,
) -> bool {
    write_field(note, note_type, EXTRA_FIELD_UNKNOWNS, format_unknowns(unknowns, show_inflections))
}

pub fn update_unknowns_count_field(
    note: &mut NoteRecord,
    note_type: &NoteType,
    unknowns: &[Morph],
) -> bool {
    write_field(note, note_type, EXTRA_FIELD_UNKNOWNS_COUNT, unknowns.len().to_string())
}

pub fn update_score_field(note: &mut NoteRecord, note_type: &NoteType, score: i64) -> bool {
    write_field(note, note_type, EXTRA_FIELD_SCORE, score.to_string())
}

/// Re-renders the highlighted copy of the source field. Cards without cached
/// morphs keep whatever the field held before.
pub fn update_highlighted_field(
    note: &mut NoteRecord,
    note_type: &NoteType,
    source_field_index: usize,
    card_morphs: Option<&[Morph]>,
    known_interval_threshold: u32,
) -> bool {
    let (Some(morphs), Some(source)) = (card_morphs, note.fields.get(source_field_index)) else {
        return false;
    };

    match highlight_text(morphs, source, known_interval_threshold) {
        Ok(highlighted) => write_field(note, note_type, EXTRA_FIELD_HIGHLIGHTED, highlighted),
        Err(e) => {
            debug!("Skipping highlight of note {}: {}", note.id, e);
            false
        }
    }
}
