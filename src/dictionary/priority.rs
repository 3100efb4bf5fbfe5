use std::{
    collections::HashMap,
    fs::File,
    io::{
        self,
        BufReader,
    },
    path::Path,
    time::Instant,
};

use log::info;

use crate::{
    cache::CardMorphCache,
    core::{
        config::{
            MorphPriority,
            NoteFilter,
            RecalcConfig,
        },
        MorphKey,
        MorphRankError,
    },
};

/// Ranks past this point can never change a score, so sources are truncated here.
pub const PRIORITY_RANK_CEILING: usize = 50_000;

/// Morph → rank, 0 being the most important. Built fresh for every recalc run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityTable {
    ranks: HashMap<MorphKey, u32>,
}

impl PriorityTable {
    pub fn rank(&self, key: &MorphKey) -> Option<u32> {
        self.ranks.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Ranks keys densely in iteration order. Repeated keys keep their first rank.
    pub fn from_keys<I: IntoIterator<Item = MorphKey>>(keys: I) -> Self {
        let mut table = Self::default();
        for key in keys {
            let next_rank = table.ranks.len() as u32;
            table.ranks.entry(key).or_insert(next_rank);
        }
        table
    }

    /// Morphs appearing on more cached cards rank higher. Ties keep scan order.
    pub fn from_collection(cache: &CardMorphCache) -> Self {
        let mut counts: HashMap<&MorphKey, (usize, usize)> = HashMap::new();

        for morphs in cache.iter_in_scan_order() {
            for morph in morphs {
                let first_seen = counts.len();
                counts.entry(morph.key()).or_insert((0, first_seen)).0 += 1;
            }
        }

        let mut ordered: Vec<(&MorphKey, (usize, usize))> = counts.into_iter().collect();
        ordered.sort_by(|(_, (count_a, seen_a)), (_, (count_b, seen_b))| {
            count_b.cmp(count_a).then(seen_a.cmp(seen_b))
        });

        Self::from_keys(
            ordered.into_iter().take(PRIORITY_RANK_CEILING).map(|(key, _)| key.clone()),
        )
    }

    /// Reads a `lemma,inflection,...` CSV where the row order is the rank. The header is skipped.
    pub fn from_frequency_file(path: &Path) -> Result<Self, MorphRankError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                MorphRankError::FrequencyFileNotFound(path.display().to_string())
            }
            _ => MorphRankError::from(e),
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut table = Self::default();
        for (index, record) in reader.records().enumerate() {
            if index >= PRIORITY_RANK_CEILING {
                break;
            }
            let record = record?;
            let Some(lemma) = record.get(0) else {
                continue;
            };
            let inflection = record.get(1).unwrap_or(lemma);

            // Rank is the row index, so a repeated row keeps its first rank and leaves a gap.
            table.ranks.entry(MorphKey::new(lemma, inflection)).or_insert(index as u32);
        }
        Ok(table)
    }

    /// The table selected by a note filter's priority setting.
    pub fn build(
        filter: &NoteFilter,
        cache: &CardMorphCache,
        config: &RecalcConfig,
    ) -> Result<Self, MorphRankError> {
        let start = Instant::now();
        let table = match &filter.morph_priority {
            MorphPriority::Collection => Self::from_collection(cache),
            MorphPriority::FrequencyFile { file_name } => {
                Self::from_frequency_file(&config.frequency_files_dir().join(file_name))?
            }
        };
        info!(
            "Built priority table for {} with {} morphs ({:.2}s)",
            filter.note_type,
            table.len(),
            start.elapsed().as_secs_f32()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::core::Morph;

    fn write_csv(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_frequency_file_ranks_rows_after_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "freq.csv", "lemma,inflection\nbe,is\ngo,went\n");

        let table = PriorityTable::from_frequency_file(&path).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rank(&MorphKey::new("be", "is")), Some(0));
        assert_eq!(table.rank(&MorphKey::new("go", "went")), Some(1));
        assert_eq!(table.rank(&MorphKey::new("lemma", "inflection")), None);
    }

    #[test]
    fn test_missing_frequency_file_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");

        match PriorityTable::from_frequency_file(&path) {
            Err(MorphRankError::FrequencyFileNotFound(reported)) => {
                assert_eq!(reported, path.display().to_string())
            }
            other => panic!("expected FrequencyFileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_frequency_file_stops_at_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let mut contents = String::from("lemma,inflection,count\n");
        for i in 0..(PRIORITY_RANK_CEILING + 10) {
            contents.push_str(&format!("w{i},w{i},1\n"));
        }
        let path = write_csv(dir.path(), "big.csv", &contents);

        let table = PriorityTable::from_frequency_file(&path).unwrap();
        assert_eq!(table.len(), PRIORITY_RANK_CEILING);
        assert_eq!(table.rank(&MorphKey::new("w49999", "w49999")), Some(49_999));
        assert_eq!(table.rank(&MorphKey::new("w50000", "w50000")), None);
    }

    #[test]
    fn test_collection_priority_orders_by_card_count() {
        let mut cache = CardMorphCache::default();
        cache.insert_card(1, vec![Morph::uninflected("rare"), Morph::uninflected("common")]);
        cache.insert_card(2, vec![Morph::uninflected("common"), Morph::uninflected("tie")]);
        cache.insert_card(3, vec![Morph::uninflected("common")]);

        let table = PriorityTable::from_collection(&cache);

        assert_eq!(table.rank(&MorphKey::new("common", "common")), Some(0));
        assert_eq!(table.rank(&MorphKey::new("rare", "rare")), Some(1));
        assert_eq!(table.rank(&MorphKey::new("tie", "tie")), Some(2));
    }

    #[test]
    fn test_build_resolves_frequency_files_in_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "top.csv", "lemma,inflection\nthe,the\n");
        let config = RecalcConfig {
            frequency_files_dir: Some(dir.path().to_path_buf()),
            ..RecalcConfig::default()
        };
        let filter = NoteFilter {
            note_type: "Sentence".to_string(),
            morph_priority: MorphPriority::FrequencyFile { file_name: "top.csv".to_string() },
            ..NoteFilter::default()
        };

        let table = PriorityTable::build(&filter, &CardMorphCache::default(), &config).unwrap();
        assert_eq!(table.rank(&MorphKey::new("the", "the")), Some(0));
    }
}
