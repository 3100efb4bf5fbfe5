use std::{
    collections::HashSet,
    time::Instant,
};

use log::{
    debug,
    info,
};

use super::CardMorphCache;
use crate::{
    anki::{
        load_filter_cards,
        Collection,
    },
    core::{
        config::RecalcConfig,
        tasks::{
            ProgressReporter,
            CHECKPOINT_INTERVAL,
        },
        utils::{
            process_expression,
            process_morphs,
        },
        CardKind,
        CardRecord,
        Morph,
        MorphRankError,
        NoteRecord,
    },
    dictionary::known_morphs::load_known_morphs,
    segmentation::MorphemizerRegistry,
};

/// Interval a card contributes to each of its morphs.
fn card_interval(card: &CardRecord, note: &NoteRecord, config: &RecalcConfig) -> u32 {
    if note.has_tag(&config.tags.known_automatically) || note.has_tag(&config.tags.known_manually)
    {
        config.known_interval_threshold
    } else if card.kind == CardKind::Learning {
        // Learning cards have a zero interval but their morphs are not unknown.
        1
    } else {
        card.interval
    }
}

fn dedup_morphs(morphs: Vec<Morph>) -> Vec<Morph> {
    let mut seen = HashSet::new();
    morphs.into_iter().filter(|morph| seen.insert(morph.key().clone())).collect()
}

/// Segments every card of the read-enabled filters and builds a fresh cache.
///
/// A card matched by several filters is cached by the first one. Cards without
/// any morph are left out, so lookups for them fail like for unknown cards.
pub fn build_morph_cache(
    collection: &dyn Collection,
    config: &RecalcConfig,
    morphemizers: &MorphemizerRegistry,
    progress: &ProgressReporter,
) -> Result<CardMorphCache, MorphRankError> {
    let start = Instant::now();
    let mut cache = CardMorphCache::default();
    let read_filters = config.read_enabled_filters();

    for filter in &read_filters {
        let morphemizer = morphemizers.get(&filter.morphemizer)?;
        let selected = load_filter_cards(collection, filter)?;
        let card_amount = selected.cards.len();

        let texts: Vec<String> = selected
            .cards
            .iter()
            .map(|card| {
                let text = selected
                    .note(card)
                    .and_then(|note| note.fields.get(selected.field_index))
                    .map(String::as_str)
                    .unwrap_or_default();
                process_expression(text, &config.preprocess)
            })
            .collect();

        let segment_start = Instant::now();
        let mut card_morphs: Vec<Vec<Morph>> = Vec::with_capacity(card_amount);
        for (chunk_index, chunk) in texts.chunks(CHECKPOINT_INTERVAL).enumerate() {
            let counter = chunk_index * CHECKPOINT_INTERVAL;
            progress.checkpoint(
                || {
                    format!(
                        "Extracting morphs from {} cards, card: {} of {}",
                        filter.note_type, counter, card_amount
                    )
                },
                counter,
                card_amount,
            )?;
            card_morphs.extend(morphemizer.segment_batch(chunk));
        }
        debug!(
            "Segmented {} {} cards with {} ({:.2}s)",
            card_amount,
            filter.note_type,
            morphemizer.name(),
            segment_start.elapsed().as_secs_f32()
        );

        for (counter, (card, morphs)) in selected.cards.iter().zip(card_morphs).enumerate() {
            progress.checkpoint(
                || format!("Caching {} cards, card: {} of {}", filter.note_type, counter, card_amount),
                counter,
                card_amount,
            )?;

            if cache.contains_card(card.id) {
                continue;
            }
            let Some(note) = selected.note(card) else {
                continue;
            };

            let morphs = dedup_morphs(process_morphs(morphs, &config.preprocess));
            if morphs.is_empty() {
                continue;
            }

            let interval = card_interval(card, note, config);
            for morph in &morphs {
                cache.record_interval(morph.key(), interval);
            }
            cache.insert_card(card.id, morphs);
        }
    }

    if config.read_known_morphs_folder {
        for key in load_known_morphs(&config.known_morphs_dir(), progress)? {
            cache.record_interval(&key, config.known_interval_threshold);
        }
    }

    cache.apply_intervals();

    info!(
        "Cached {} cards with {} distinct morphs from {} note filters ({:.2}s)",
        cache.len(),
        cache.morph_count(),
        read_filters.len(),
        start.elapsed().as_secs_f32()
    );
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        anki::InMemoryCollection,
        core::{
            config::NoteFilter,
            MorphKey,
            QueueState,
        },
    };

    fn add_card(
        collection: &mut InMemoryCollection,
        note_type: u64,
        id: u64,
        text: &str,
        kind: CardKind,
        interval: u32,
        tags: &[&str],
    ) {
        collection.add_note(NoteRecord {
            id,
            note_type_id: note_type,
            fields: vec![text.to_string()],
            tags: tags.iter().map(|t| t.to_string()).collect(),
        });
        collection.add_card(CardRecord {
            id,
            note_id: id,
            note_type_id: note_type,
            kind,
            due: id as i64,
            queue: QueueState::from(i32::from(kind)),
            interval,
        });
    }

    fn config_for(note_type: &str) -> RecalcConfig {
        RecalcConfig {
            filters: vec![NoteFilter {
                note_type: note_type.to_string(),
                field: "Text".to_string(),
                ..NoteFilter::default()
            }],
            ..RecalcConfig::default()
        }
    }

    fn sample() -> InMemoryCollection {
        let mut collection = InMemoryCollection::new();
        let nt = collection.add_note_type("Sentence", &["Text"]);
        add_card(&mut collection, nt, 1, "The cat, the CAT.", CardKind::Review, 40, &[]);
        add_card(&mut collection, nt, 2, "A cat sat", CardKind::New, 0, &[]);
        add_card(&mut collection, nt, 3, "dog <b>sat</b>", CardKind::Learning, 0, &[]);
        add_card(&mut collection, nt, 4, "bird", CardKind::New, 0, &["am-known-manually"]);
        add_card(&mut collection, nt, 5, "...", CardKind::New, 0, &[]);
        collection
    }

    #[test]
    fn test_cards_are_deduplicated_and_intervals_aggregated() {
        let collection = sample();
        let cache = build_morph_cache(
            &collection,
            &config_for("Sentence"),
            &MorphemizerRegistry::with_builtin(),
            &ProgressReporter::default(),
        )
        .unwrap();

        let first: Vec<&str> = cache.get(1).unwrap().iter().map(|m| m.lemma()).collect();
        assert_eq!(first, vec!["the", "cat"]);

        assert_eq!(cache.morph_interval(&MorphKey::new("cat", "cat")), Some(40));
        assert_eq!(cache.morph_interval(&MorphKey::new("a", "a")), Some(0));
        assert_eq!(cache.morph_interval(&MorphKey::new("sat", "sat")), Some(1));
        assert_eq!(cache.morph_interval(&MorphKey::new("bird", "bird")), Some(21));

        // Morphs on a new card pick up the interval earned elsewhere.
        let second = cache.get(2).unwrap();
        assert_eq!(second[1].lemma(), "cat");
        assert_eq!(second[1].highest_learning_interval, Some(40));
        assert!(second[0].is_unknown());

        assert!(cache.get(5).is_none());
    }

    #[test]
    fn test_rebuild_is_bit_identical() {
        let collection = sample();
        let config = config_for("Sentence");
        let registry = MorphemizerRegistry::with_builtin();
        let progress = ProgressReporter::default();

        let first = build_morph_cache(&collection, &config, &registry, &progress).unwrap();
        let second = build_morph_cache(&collection, &config, &registry, &progress).unwrap();

        let encode = |cache: &CardMorphCache| {
            bincode::serde::encode_to_vec(cache, bincode::config::standard()).unwrap()
        };
        assert_eq!(encode(&first), encode(&second));
    }

    #[test]
    fn test_unknown_morphemizer_aborts() {
        let collection = sample();
        let mut config = config_for("Sentence");
        config.filters[0].morphemizer = "japanese".to_string();

        let result = build_morph_cache(
            &collection,
            &config,
            &MorphemizerRegistry::with_builtin(),
            &ProgressReporter::default(),
        );
        assert!(matches!(result, Err(MorphRankError::MorphemizerNotFound(_))));
    }

    #[test]
    fn test_known_morph_files_seed_known_interval() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("known.csv"), "lemma,inflection\na,a\n").unwrap();

        let collection = sample();
        let mut config = config_for("Sentence");
        config.read_known_morphs_folder = true;
        config.known_morphs_dir = Some(dir.path().to_path_buf());

        let cache = build_morph_cache(
            &collection,
            &config,
            &MorphemizerRegistry::with_builtin(),
            &ProgressReporter::default(),
        )
        .unwrap();

        assert_eq!(cache.morph_interval(&MorphKey::new("a", "a")), Some(21));
        assert!(!cache.get(2).unwrap()[0].is_unknown());
    }

    #[test]
    fn test_unread_filters_are_skipped() {
        let collection = sample();
        let mut config = config_for("Sentence");
        config.filters[0].read = false;

        let cache = build_morph_cache(
            &collection,
            &config,
            &MorphemizerRegistry::with_builtin(),
            &ProgressReporter::default(),
        )
        .unwrap();
        assert!(cache.is_empty());
    }
}
