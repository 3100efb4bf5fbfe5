use crate::{
    core::Morph,
    dictionary::PriorityTable,
};

/// Highest score recalc ever assigns. It stays 10^8 below the host's 32-bit `due`
/// ceiling so that offsets added later cannot overflow.
pub const MAX_SCORE: i64 = 2_047_483_647;

// One unknown morph must outweigh any number of known low-priority morphs:
// with at most 50k ranks and 10 morphs' worth of priority, the penalty is 500k.
pub const MORPH_UNKNOWN_PENALTY: i64 = 500_000;

/// The summed priority penalty of a card never reaches one unknown-morph penalty.
pub const MAX_PRIORITY_PENALTY: i64 = MORPH_UNKNOWN_PENALTY - 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardScore {
    pub score: i64,
    pub unknown_morphs: Vec<Morph>,
    pub has_learning_morph: bool,
}

impl CardScore {
    fn sentinel(unknown_morphs: Vec<Morph>, has_learning_morph: bool) -> Self {
        Self { score: MAX_SCORE, unknown_morphs, has_learning_morph }
    }

    pub fn unknown_count(&self) -> usize {
        self.unknown_morphs.len()
    }
}

/// Scores a card from its cached morphs. Lower scores are shown first.
///
/// A card without cached morphs gets `MAX_SCORE` so it sinks to the end of the
/// new queue instead of failing the run.
pub fn score_card(
    card_morphs: Option<&[Morph]>,
    priority: &PriorityTable,
    known_interval_threshold: u32,
    move_known_to_end: bool,
) -> CardScore {
    let Some(card_morphs) = card_morphs else {
        return CardScore::sentinel(Vec::new(), false);
    };

    let mut unknown_morphs = Vec::new();
    let mut has_learning_morph = false;
    let mut priority_penalty: i64 = 0;

    for morph in card_morphs {
        let interval = morph.highest_learning_interval.unwrap_or(0);
        if interval == 0 {
            unknown_morphs.push(morph.clone());
        } else if interval < known_interval_threshold {
            has_learning_morph = true;
        }

        // Unranked morphs are assumed maximally unfamiliar.
        let penalty = match priority.rank(morph.key()) {
            Some(rank) => i64::from(rank),
            None => MAX_PRIORITY_PENALTY,
        };
        priority_penalty = priority_penalty.saturating_add(penalty);
    }

    if unknown_morphs.is_empty() && move_known_to_end {
        return CardScore::sentinel(unknown_morphs, has_learning_morph);
    }

    let unknown_penalty = (unknown_morphs.len() as i64).saturating_mul(MORPH_UNKNOWN_PENALTY);
    let score = priority_penalty
        .min(MAX_PRIORITY_PENALTY)
        .saturating_add(unknown_penalty)
        .min(MAX_SCORE);

    CardScore { score, unknown_morphs, has_learning_morph }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::core::MorphKey;

    fn known(word: &str, interval: u32) -> Morph {
        Morph::uninflected(word).with_interval(interval)
    }

    fn unknown(word: &str) -> Morph {
        Morph::uninflected(word).with_interval(0)
    }

    fn ranked(words: &[&str]) -> PriorityTable {
        PriorityTable::from_keys(words.iter().map(|w| MorphKey::new(*w, *w)))
    }

    #[test]
    fn test_missing_morphs_score_the_sentinel() {
        let result = score_card(None, &PriorityTable::default(), 21, false);
        assert_eq!(result.score, MAX_SCORE);
        assert!(result.unknown_morphs.is_empty());
        assert!(!result.has_learning_morph);
    }

    #[test]
    fn test_priority_ranks_are_summed() {
        let priority = ranked(&["the", "a", "cat", "dog"]);
        let morphs = vec![known("the", 30), known("cat", 30), unknown("dog")];

        let result = score_card(Some(&morphs), &priority, 21, false);

        assert_eq!(result.score, 2 + 3 + MORPH_UNKNOWN_PENALTY);
        assert_eq!(result.unknown_morphs, vec![unknown("dog")]);
        assert!(!result.has_learning_morph);
    }

    #[test]
    fn test_unranked_morph_gets_the_capped_penalty() {
        let priority = ranked(&["the"]);
        let morphs = vec![known("the", 30), known("zyzzyva", 30)];

        let result = score_card(Some(&morphs), &priority, 21, false);
        assert_eq!(result.score, MAX_PRIORITY_PENALTY);
    }

    #[test]
    fn test_learning_morph_is_flagged() {
        let morphs = vec![known("cat", 5)];
        let result = score_card(Some(&morphs), &ranked(&["cat"]), 21, false);

        assert!(result.has_learning_morph);
        assert_eq!(result.unknown_count(), 0);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_known_cards_move_to_end() {
        let morphs = vec![known("cat", 30)];
        let result = score_card(Some(&morphs), &ranked(&["cat"]), 21, true);
        assert_eq!(result.score, MAX_SCORE);

        let with_unknown = vec![known("cat", 30), unknown("dog")];
        let result = score_card(Some(&with_unknown), &ranked(&["cat"]), 21, true);
        assert!(result.score < MAX_SCORE);
    }

    fn arb_known_morphs() -> impl Strategy<Value = Vec<Morph>> {
        proptest::collection::vec(0u32..100, 0..40).prop_map(|known_ids| {
            known_ids.into_iter().map(|id| known(&format!("k{id}"), 30)).collect()
        })
    }

    fn arb_priority() -> impl Strategy<Value = PriorityTable> {
        proptest::collection::vec(0u32..150, 0..200).prop_map(|ids| {
            PriorityTable::from_keys(ids.into_iter().map(|id| {
                let word = if id < 100 { format!("k{id}") } else { format!("u{}", id - 100) };
                MorphKey::new(word.clone(), word)
            }))
        })
    }

    proptest! {
        /// More unknown morphs always means a higher score, whatever the known morphs are.
        #[test]
        fn prop_unknown_count_dominates(
            (low, high) in (1usize..100).prop_flat_map(|low| (Just(low), (low + 1)..=100)),
            low_card in arb_known_morphs(),
            high_card in arb_known_morphs(),
            priority in arb_priority(),
        ) {
            let mut low_card = low_card;
            let mut high_card = high_card;
            low_card.extend((0..low).map(|i| unknown(&format!("u{i}"))));
            high_card.extend((0..high).map(|i| unknown(&format!("u{i}"))));

            let low_score = score_card(Some(&low_card), &priority, 21, false).score;
            let high_score = score_card(Some(&high_card), &priority, 21, false).score;

            prop_assert!(high_score > low_score, "{} unknowns scored {} <= {} unknowns scored {}", high, high_score, low, low_score);
        }

        #[test]
        fn prop_score_never_exceeds_max(
            unknowns in 0usize..6_000,
            card in arb_known_morphs(),
            move_known_to_end in any::<bool>(),
        ) {
            let mut card = card;
            card.extend((0..unknowns).map(|i| unknown(&format!("u{i}"))));

            let result = score_card(Some(&card), &PriorityTable::default(), 21, move_known_to_end);
            prop_assert!(result.score >= 0);
            prop_assert!(result.score <= MAX_SCORE);
            prop_assert_eq!(result.unknown_count(), unknowns);
        }

        #[test]
        fn prop_fully_known_cards_sink_when_moved_to_end(
            card in arb_known_morphs(),
            priority in arb_priority(),
        ) {
            let result = score_card(Some(&card), &priority, 21, true);
            prop_assert_eq!(result.score, MAX_SCORE);
        }
    }
}
