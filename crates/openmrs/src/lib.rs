//! OpenMRS REST wire/boundary support.
//!
//! This crate is responsible for translating the JSON returned by the OpenMRS REST API
//! (encounters with their observation trees) and caller-supplied concept map configuration
//! into typed wire structs.
//!
//! Display rules (how a coded value becomes a label, how rows are projected) live in
//! `obsview-core`. This crate handles payload shapes and the one-time classification of
//! observation values only.

pub mod concept_map;
pub mod constants;
pub mod ws_rest_v1;

pub use concept_map::{AnswerLookup, ConceptMap, ConceptMapEntry};
pub use ws_rest_v1::encounter::{Encounter, EncounterTypeRef, FormRef};
pub use ws_rest_v1::observation::{
    CodedValue, ConceptName, ConceptRef, DateValue, LocalizedName, ObsValue, Observation,
    Primitive,
};

use thiserror::Error;

/// Errors returned by the `openmrs` boundary crate.
#[derive(Debug, Error)]
pub enum OpenmrsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with an [`OpenmrsError`].
pub type OpenmrsResult<T> = Result<T, OpenmrsError>;

/// Read a list of encounters from REST JSON.
///
/// Accepts a bare JSON array or a REST page object (`{ "results": [...] }`).
pub fn read_encounters_json(json: &str) -> OpenmrsResult<Vec<Encounter>> {
    ws_rest_v1::encounter::read_list_json(json)
}

/// Read a single encounter from REST JSON.
pub fn read_encounter_json(json: &str) -> OpenmrsResult<Encounter> {
    ws_rest_v1::encounter::read_json(json)
}

/// Read a concept map from JSON.
pub fn read_concept_map_json(json: &str) -> OpenmrsResult<ConceptMap> {
    concept_map::read_json(json)
}

/// Read a concept map from YAML.
pub fn read_concept_map_yaml(yaml: &str) -> OpenmrsResult<ConceptMap> {
    concept_map::read_yaml(yaml)
}

/// Turn a `serde_path_to_error` failure into a [`OpenmrsError::Translation`] naming the
/// failing path (`<root>` when the path is empty).
pub(crate) fn schema_mismatch<E: std::fmt::Display>(
    what: &str,
    err: serde_path_to_error::Error<E>,
) -> OpenmrsError {
    let path = err.path().to_string();
    let source = err.into_inner();
    let path = if path.is_empty() || path == "." {
        "<root>"
    } else {
        path.as_str()
    };
    OpenmrsError::Translation(format!("{what} schema mismatch at {path}: {source}"))
}
