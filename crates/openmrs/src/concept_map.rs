//! Caller-supplied concept map configuration.
//!
//! A concept map is keyed by question concept uuid. Each entry carries the label to show for
//! the question and a table of friendlier labels for the question's enumerated answers:
//!
//! ```json
//! { "163454AAAAAAAAAAAAAAAAAAAAAAAAAAAAAA": {
//!     "display": "Placenta complete",
//!     "answers": { "703AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA": "Yes" } } }
//! ```
//!
//! The map is built once per screen and only read afterwards.

use crate::{schema_mismatch, OpenmrsResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display overrides for one question concept.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConceptMapEntry {
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

impl ConceptMapEntry {
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            answers: BTreeMap::new(),
        }
    }

    pub fn with_answer(mut self, answer_uuid: impl Into<String>, label: impl Into<String>) -> Self {
        self.answers.insert(answer_uuid.into(), label.into());
        self
    }

    /// The configured label for `answer_uuid`, if present and non-blank.
    pub fn answer(&self, answer_uuid: &str) -> Option<&str> {
        self.answers
            .get(answer_uuid)
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
    }
}

/// Outcome of looking an answer up across every question in the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerLookup<'a> {
    NotFound,
    /// Every question that maps this answer agrees on the label.
    Unique(&'a str),
    /// Questions map this answer to different labels.
    Ambiguous,
}

/// Question concept uuid to [`ConceptMapEntry`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConceptMap {
    entries: BTreeMap<String, ConceptMapEntry>,
}

impl ConceptMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used when assembling a map in code.
    pub fn with_entry(mut self, question_uuid: impl Into<String>, entry: ConceptMapEntry) -> Self {
        self.entries.insert(question_uuid.into(), entry);
        self
    }

    pub fn entry(&self, question_uuid: &str) -> Option<&ConceptMapEntry> {
        self.entries.get(question_uuid)
    }

    /// The configured question label, if present and non-blank.
    pub fn question_display(&self, question_uuid: &str) -> Option<&str> {
        self.entry(question_uuid)
            .map(|entry| entry.display.trim())
            .filter(|display| !display.is_empty())
    }

    /// The label configured for `answer_uuid` under `question_uuid` only.
    pub fn answer_label(&self, question_uuid: &str, answer_uuid: &str) -> Option<&str> {
        self.entry(question_uuid)
            .and_then(|entry| entry.answer(answer_uuid))
    }

    /// Look `answer_uuid` up under every question.
    pub fn find_answer(&self, answer_uuid: &str) -> AnswerLookup<'_> {
        let mut found: Option<&str> = None;

        for label in self.entries.values().filter_map(|e| e.answer(answer_uuid)) {
            match found {
                None => found = Some(label),
                Some(existing) if existing == label => {}
                Some(_) => return AnswerLookup::Ambiguous,
            }
        }

        found.map_or(AnswerLookup::NotFound, AnswerLookup::Unique)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a concept map from JSON text.
pub(crate) fn read_json(json: &str) -> OpenmrsResult<ConceptMap> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|err| schema_mismatch("concept map", err))
}

/// Parse a concept map from YAML text.
pub(crate) fn read_yaml(yaml: &str) -> OpenmrsResult<ConceptMap> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml);
    serde_path_to_error::deserialize(deserializer)
        .map_err(|err| schema_mismatch("concept map", err))
}
