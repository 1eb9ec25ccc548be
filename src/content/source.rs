use crate::error::ContentError;
use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use serde_json::from_str;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

/// Longest sentence, in characters, offered for display.
pub const MAX_SENTENCE_LEN: usize = 80;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Sentences,
}

/// A difficulty-tagged list of text units.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ContentSource {
    pub name: String,
    pub difficulty: Difficulty,
    pub items: Vec<String>,
}

impl ContentSource {
    pub fn new(name: impl Into<String>, difficulty: Difficulty, items: Vec<String>) -> Self {
        Self {
            name: name.into(),
            difficulty,
            items,
        }
    }

    /// Load the embedded source for a difficulty.
    pub fn builtin(difficulty: Difficulty) -> Result<Self, ContentError> {
        read_source_from_file(format!("{difficulty}.json"))
    }

    /// Units eligible for drawing. Sentences longer than `max_len` are skipped
    /// unless that would leave nothing to draw from.
    pub fn candidates(&self, max_len: usize) -> Vec<&str> {
        if self.difficulty != Difficulty::Sentences {
            return self.items.iter().map(String::as_str).collect();
        }

        let short: Vec<&str> = self
            .items
            .iter()
            .filter(|s| s.chars().count() <= max_len)
            .map(String::as_str)
            .collect();

        if short.is_empty() {
            self.items.iter().map(String::as_str).collect()
        } else {
            short
        }
    }
}

fn read_source_from_file(file_name: String) -> Result<ContentSource, ContentError> {
    let file = LANG_DIR
        .get_file(&file_name)
        .ok_or_else(|| ContentError::NotFound(file_name.clone()))?;

    let file_as_str = file.contents_utf8().ok_or_else(|| ContentError::Encoding {
        name: file_name.clone(),
    })?;

    from_str(file_as_str).map_err(|source| ContentError::Parse {
        name: file_name,
        source,
    })
}
