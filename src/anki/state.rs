use crate::core::{
    config::RecalcConfig,
    CardRecord,
    NoteRecord,
    QueueState,
};

/// Learning status a new card is tagged with after scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    /// Set by the user. Recalc never adds or removes tags while it is present.
    KnownManually,
    /// No unknown morphs. Not tagged while a morph is still being learned.
    KnownAutomatically,
    Ready,
    NotReady,
}

impl CardState {
    pub fn classify(note: &NoteRecord, unknowns: usize, config: &RecalcConfig) -> Self {
        if note.has_tag(&config.tags.known_manually) {
            return CardState::KnownManually;
        }
        match unknowns {
            0 => CardState::KnownAutomatically,
            1 => CardState::Ready,
            _ => CardState::NotReady,
        }
    }
}

fn remove_exclusive_tags(note: &mut NoteRecord, config: &RecalcConfig) {
    let exclusive = [
        &config.tags.ready,
        &config.tags.not_ready,
        &config.tags.known_automatically,
    ];
    note.tags.retain(|tag| !exclusive.contains(&tag));
}

/// Moves a tag to `tag` unless it is already there. Tags are only touched on an actual transition.
fn enter_state(note: &mut NoteRecord, tag: &str, config: &RecalcConfig) {
    if !note.has_tag(tag) {
        remove_exclusive_tags(note, config);
        note.tags.push(tag.to_string());
    }
}

/// Applies the ready / not-ready / known tag machine to a new card and its note.
pub fn update_tags_and_queue(
    config: &RecalcConfig,
    note: &mut NoteRecord,
    card: &mut CardRecord,
    unknowns: usize,
    has_learning_morphs: bool,
) -> CardState {
    let state = CardState::classify(note, unknowns, config);

    match state {
        CardState::KnownManually => remove_exclusive_tags(note, config),
        CardState::KnownAutomatically => {
            if config.suspend_known_new_cards && card.queue != QueueState::Suspended {
                card.queue = QueueState::Suspended;
            }
            if !note.has_tag(&config.tags.known_automatically) {
                remove_exclusive_tags(note, config);
                // A known tag would mark the learning morphs as known.
                if !has_learning_morphs {
                    note.tags.push(config.tags.known_automatically.clone());
                }
            }
        }
        CardState::Ready => enter_state(note, &config.tags.ready, config),
        CardState::NotReady => enter_state(note, &config.tags.not_ready, config),
    }

    state
}
