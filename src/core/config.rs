use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};

use super::MorphRankError;
use crate::persistence::{
    get_app_data_dir,
    get_data_file_path,
    load_json,
    save_json,
};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const FREQUENCY_FILES_DIR_NAME: &str = "frequency-files";
pub const KNOWN_MORPHS_DIR_NAME: &str = "known-morphs";
pub const MORPH_CACHE_FILE_NAME: &str = "morph_cache.bin";

pub const EXTRA_FIELD_UNKNOWNS: &str = "morph-unknowns";
pub const EXTRA_FIELD_UNKNOWNS_COUNT: &str = "morph-unknowns-count";
pub const EXTRA_FIELD_HIGHLIGHTED: &str = "morph-highlighted";
pub const EXTRA_FIELD_SCORE: &str = "morph-score";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum MorphPriority {
    Collection,
    FrequencyFile { file_name: String },
}

impl Default for MorphPriority {
    fn default() -> Self {
        MorphPriority::Collection
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSelector {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl TagSelector {
    pub fn matches(&self, tags: &[String]) -> bool {
        let has = |wanted: &String| tags.iter().any(|t| t.eq_ignore_ascii_case(wanted));
        self.include.iter().all(has) && !self.exclude.iter().any(has)
    }
}

/// Selects the cards of one note type and says what recalc does with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteFilter {
    pub note_type: String,
    pub tags: TagSelector,
    pub field: String,
    pub morphemizer: String,
    pub morph_priority: MorphPriority,
    pub read: bool,
    pub modify: bool,
    pub extra_unknowns: bool,
    pub extra_unknowns_count: bool,
    pub extra_highlighted: bool,
    pub extra_score: bool,
}

impl Default for NoteFilter {
    fn default() -> Self {
        Self {
            note_type: String::new(),
            tags: TagSelector::default(),
            field: String::new(),
            morphemizer: "space".to_string(),
            morph_priority: MorphPriority::Collection,
            read: true,
            modify: true,
            extra_unknowns: false,
            extra_unknowns_count: false,
            extra_highlighted: false,
            extra_score: false,
        }
    }
}

impl NoteFilter {
    /// Extra field names this filter writes to, in the order they get provisioned.
    pub fn selected_extra_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.extra_unknowns {
            fields.push(EXTRA_FIELD_UNKNOWNS);
        }
        if self.extra_unknowns_count {
            fields.push(EXTRA_FIELD_UNKNOWNS_COUNT);
        }
        if self.extra_highlighted {
            fields.push(EXTRA_FIELD_HIGHLIGHTED);
        }
        if self.extra_score {
            fields.push(EXTRA_FIELD_SCORE);
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateTags {
    pub ready: String,
    pub not_ready: String,
    pub known_automatically: String,
    pub known_manually: String,
}

impl Default for StateTags {
    fn default() -> Self {
        Self {
            ready: "am-ready".to_string(),
            not_ready: "am-not-ready".to_string(),
            known_automatically: "am-known-automatically".to_string(),
            known_manually: "am-known-manually".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessOptions {
    pub ignore_bracket_contents: bool,
    pub ignore_round_bracket_contents: bool,
    pub ignore_slim_round_bracket_contents: bool,
    pub ignore_numbers: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecalcConfig {
    pub filters: Vec<NoteFilter>,
    pub known_interval_threshold: u32,
    pub move_known_new_cards_to_end: bool,
    pub offset_new_cards: bool,
    pub offset_amount: i64,
    pub max_morphs_to_offset: usize,
    pub suspend_known_new_cards: bool,
    pub unknowns_field_shows_inflections: bool,
    pub read_known_morphs_folder: bool,
    pub tags: StateTags,
    pub preprocess: PreprocessOptions,
    pub frequency_files_dir: Option<PathBuf>,
    pub known_morphs_dir: Option<PathBuf>,
}

impl Default for RecalcConfig {
    fn default() -> Self {
        Self {
            filters: vec![NoteFilter::default()],
            known_interval_threshold: 21,
            move_known_new_cards_to_end: false,
            offset_new_cards: false,
            offset_amount: 50_000,
            max_morphs_to_offset: 100,
            suspend_known_new_cards: false,
            unknowns_field_shows_inflections: false,
            read_known_morphs_folder: false,
            tags: StateTags::default(),
            preprocess: PreprocessOptions::default(),
            frequency_files_dir: None,
            known_morphs_dir: None,
        }
    }
}

impl RecalcConfig {
    pub fn default_path() -> PathBuf {
        get_data_file_path(CONFIG_FILE_NAME)
    }

    pub fn load(path: &Path) -> Result<Self, MorphRankError> {
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), MorphRankError> {
        save_json(self, path)
    }

    pub fn read_enabled_filters(&self) -> Vec<&NoteFilter> {
        self.filters.iter().filter(|f| f.read).collect()
    }

    pub fn modify_enabled_filters(&self) -> Vec<&NoteFilter> {
        self.filters.iter().filter(|f| f.modify).collect()
    }

    pub fn frequency_files_dir(&self) -> PathBuf {
        self.frequency_files_dir
            .clone()
            .unwrap_or_else(|| get_app_data_dir().join(FREQUENCY_FILES_DIR_NAME))
    }

    pub fn known_morphs_dir(&self) -> PathBuf {
        self.known_morphs_dir
            .clone()
            .unwrap_or_else(|| get_app_data_dir().join(KNOWN_MORPHS_DIR_NAME))
    }
}
