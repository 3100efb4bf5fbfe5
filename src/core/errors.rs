use thiserror::Error;

#[derive(Error, Debug)]
pub enum MorphRankError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("Vibrato error: {0}")]
    Vibrato(Box<vibrato::errors::VibratoError>),

    #[error("Cache encoding error: {0}")]
    CacheEncoding(String),

    #[error("AnkiConnect error on '{action}': {message}")]
    AnkiConnect { action: String, message: String },

    #[error("A note filter has no note type selected")]
    DefaultSettings,

    #[error("Note type \"{0}\" was not found")]
    NoteTypeNotFound(String),

    #[error("Field \"{field}\" was not found on note type \"{note_type}\"")]
    FieldNotFound { note_type: String, field: String },

    #[error("Morphemizer \"{0}\" was not found")]
    MorphemizerNotFound(String),

    #[error("Frequency file: {0} not found")]
    FrequencyFileNotFound(String),

    #[error("Recalc was cancelled")]
    Cancelled,

    #[error("MorphRankError: {0}")]
    Custom(String),
}

impl MorphRankError {
    /// Faults caused by incomplete or inconsistent settings. They abort the run
    /// before anything is written.
    pub fn is_config_fault(&self) -> bool {
        matches!(
            self,
            MorphRankError::DefaultSettings
                | MorphRankError::NoteTypeNotFound(_)
                | MorphRankError::FieldNotFound { .. }
                | MorphRankError::MorphemizerNotFound(_)
                | MorphRankError::FrequencyFileNotFound(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, MorphRankError::Cancelled)
    }

    pub fn user_message(&self) -> String {
        match self {
            MorphRankError::DefaultSettings => "Save settings before using Recalc!".to_string(),
            MorphRankError::MorphemizerNotFound(name) if name == "japanese" => {
                "Morphemizer \"japanese\" was not found.\n\n\
                 The Japanese morphemizer needs a tokenizer dictionary. Run recalc with \
                 `--dictionary unidic` (or ipadic) to download one."
                    .to_string()
            }
            MorphRankError::FrequencyFileNotFound(path) => {
                format!("Frequency file: {} not found!", path)
            }
            MorphRankError::Cancelled => "Cancelled recalc".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for MorphRankError {
    fn from(error: std::io::Error) -> Self {
        MorphRankError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for MorphRankError {
    fn from(error: reqwest::Error) -> Self {
        MorphRankError::Reqwest(Box::new(error))
    }
}

impl From<vibrato::errors::VibratoError> for MorphRankError {
    fn from(error: vibrato::errors::VibratoError) -> Self {
        MorphRankError::Vibrato(Box::new(error))
    }
}

impl From<bincode::error::EncodeError> for MorphRankError {
    fn from(error: bincode::error::EncodeError) -> Self {
        MorphRankError::CacheEncoding(error.to_string())
    }
}

impl From<bincode::error::DecodeError> for MorphRankError {
    fn from(error: bincode::error::DecodeError) -> Self {
        MorphRankError::CacheEncoding(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_faults() {
        assert!(MorphRankError::DefaultSettings.is_config_fault());
        assert!(MorphRankError::MorphemizerNotFound("x".into()).is_config_fault());
        assert!(MorphRankError::FrequencyFileNotFound("/tmp/a.csv".into()).is_config_fault());
        assert!(!MorphRankError::Cancelled.is_config_fault());
        assert!(MorphRankError::Cancelled.is_cancelled());
        assert!(!MorphRankError::Custom("boom".into()).is_config_fault());
    }

    #[test]
    fn test_user_messages() {
        let missing = MorphRankError::FrequencyFileNotFound("/data/freq.csv".into());
        assert_eq!(missing.user_message(), "Frequency file: /data/freq.csv not found!");

        let morphemizer = MorphRankError::MorphemizerNotFound("klingon".into());
        assert_eq!(morphemizer.user_message(), "Morphemizer \"klingon\" was not found");

        let japanese = MorphRankError::MorphemizerNotFound("japanese".into());
        assert!(japanese.user_message().contains("--dictionary"));
    }
}
