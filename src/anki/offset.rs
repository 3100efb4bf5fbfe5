use std::collections::{
    BTreeMap,
    HashMap,
};

use log::info;

use super::scoring::MAX_SCORE;
use crate::{
    cache::CardMorphCache,
    core::{
        config::RecalcConfig,
        tasks::ProgressReporter,
        CardRecord,
        MorphKey,
        MorphRankError,
    },
};

/// The only unknown morph on a card, if it has exactly one.
fn sole_unknown_morph(cache: &CardMorphCache, card_id: u64) -> Option<&MorphKey> {
    let mut unknowns = cache.get(card_id)?.iter().filter(|m| m.is_unknown()).map(|m| m.key());
    let first = unknowns.next()?;
    if unknowns.any(|other| other != first) {
        return None;
    }
    Some(first)
}

/// Pushes back new cards that teach the same single unknown morph as an earlier card.
///
/// `handled_cards` holds the persisted state of every card recalc looked at, in
/// handling order. `modified_cards` holds the pending changes and is updated in
/// place: offset cards are added, and cards whose offset lands exactly on their
/// persisted state are dropped so a repeated run writes nothing.
///
/// Returns the number of cards that received an offset.
pub fn add_offsets_to_new_cards(
    config: &RecalcConfig,
    cache: &CardMorphCache,
    handled_cards: &[CardRecord],
    modified_cards: &mut BTreeMap<u64, CardRecord>,
    progress: &ProgressReporter,
) -> Result<usize, MorphRankError> {
    let effective_due = |card: &CardRecord, modified: &BTreeMap<u64, CardRecord>| {
        modified.get(&card.id).map(|c| c.due).unwrap_or(card.due)
    };

    let mut earliest_card: HashMap<&MorphKey, (u64, i64)> = HashMap::new();
    let mut cards_with_morph: HashMap<&MorphKey, Vec<&CardRecord>> = HashMap::new();
    let mut morph_order: Vec<&MorphKey> = Vec::new();

    let card_amount = handled_cards.len();
    for (counter, card) in handled_cards.iter().enumerate() {
        progress.checkpoint(
            || format!("Potentially offsetting cards, card: {} of {}", counter, card_amount),
            counter,
            card_amount,
        )?;

        if !card.is_new() {
            continue;
        }
        // Cards missing from the cache have no usable morph data.
        let Some(morph) = sole_unknown_morph(cache, card.id) else {
            continue;
        };

        let due = effective_due(card, &*modified_cards);
        match earliest_card.get_mut(morph) {
            Some(earliest) if earliest.1 > due => *earliest = (card.id, due),
            Some(_) => {}
            None => {
                earliest_card.insert(morph, (card.id, due));
                morph_order.push(morph);
            }
        }
        cards_with_morph.entry(morph).or_default().push(card);
    }

    progress.report("Applying offsets", 0, morph_order.len());

    // Stable sort: morphs whose earliest cards tie stay in first-seen order.
    morph_order.sort_by_key(|morph| earliest_card[morph].1);

    let mut offset_cards = 0;
    for (counter, morph) in morph_order.iter().enumerate() {
        // Allows max_morphs_to_offset + 1 morphs.
        if counter > config.max_morphs_to_offset {
            break;
        }

        let (earliest_id, _) = earliest_card[morph];
        for &card in &cards_with_morph[morph] {
            if card.id == earliest_id {
                continue;
            }

            let target = effective_due(card, &*modified_cards)
                .saturating_add(config.offset_amount)
                .min(MAX_SCORE);

            let mut updated = modified_cards.get(&card.id).cloned().unwrap_or_else(|| card.clone());
            updated.due = target;

            if updated == *card {
                modified_cards.remove(&card.id);
            } else {
                modified_cards.insert(card.id, updated);
                offset_cards += 1;
            }
        }
    }

    info!("Offset {} new cards across {} unknown morphs", offset_cards, morph_order.len());
    Ok(offset_cards)
}
