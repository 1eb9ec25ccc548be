use thiserror::Error;

/// Failures when resolving embedded text sources.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("content source not found: {0}")]
    NotFound(String),

    #[error("content source '{name}' is not valid utf-8")]
    Encoding { name: String },

    #[error("content source '{name}' could not be parsed: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejections raised by the leaderboard. State is untouched when one is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeaderboardError {
    #[error("invalid entry: {reason}")]
    InvalidEntry { reason: String },
}

impl LeaderboardError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            reason: reason.into(),
        }
    }
}
