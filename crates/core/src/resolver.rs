//! Concept display resolution.
//!
//! Turns a coded observation value into exactly one display string. Resolution is total: it
//! never fails and never returns "nothing", because a detail panel must not crash the screen
//! for one bad observation.
//!
//! Precedence for a coded value:
//! 1. A concept map answer label for the value's uuid.
//! 2. The `FULLY_SPECIFIED` name in the requested locale (the one marked `localePreferred`
//!    when there are several), else the value's own `name.name`.
//! 3. The value's raw `display`.
//! 4. The value's uuid.
//!
//! A value without a uuid is malformed and resolves to an empty string. Blank strings are
//! skipped at every step.

use obsview_types::Locale;
use openmrs::{AnswerLookup, CodedValue, ConceptMap, ConceptRef, LocalizedName, ObsValue};

/// Resolve a coded value without knowing which question it answers.
///
/// Step 1 searches the answers of every question in `concept_map`. When two questions map the
/// answer to different labels the match is ambiguous and step 1 is skipped.
pub fn resolve(
    value: &CodedValue,
    concept_map: Option<&ConceptMap>,
    locale: Option<&Locale>,
) -> String {
    let Some(uuid) = value.uuid() else {
        tracing::debug!("coded value without a concept uuid");
        return String::new();
    };

    let mapped = concept_map.and_then(|map| match map.find_answer(uuid) {
        AnswerLookup::Unique(label) => Some(label),
        AnswerLookup::Ambiguous => {
            tracing::debug!(answer = uuid, "answer mapped to conflicting labels; ignoring map");
            None
        }
        AnswerLookup::NotFound => None,
    });

    match mapped {
        Some(label) => label.to_string(),
        None => resolve_from_names(value, uuid, locale),
    }
}

/// Resolve a coded value given the question concept it answers.
///
/// Step 1 consults only the concept map entry of `question_uuid`.
pub fn resolve_answer(
    question_uuid: &str,
    value: &CodedValue,
    concept_map: Option<&ConceptMap>,
    locale: Option<&Locale>,
) -> String {
    let Some(uuid) = value.uuid() else {
        tracing::debug!(question = question_uuid, "coded value without a concept uuid");
        return String::new();
    };

    match concept_map.and_then(|map| map.answer_label(question_uuid, uuid)) {
        Some(label) => label.to_string(),
        None => resolve_from_names(value, uuid, locale),
    }
}

/// Steps 2 to 4.
fn resolve_from_names(value: &CodedValue, uuid: &str, locale: Option<&Locale>) -> String {
    let fallback = Locale::default();
    let locale = locale.unwrap_or(&fallback);

    let candidates: Vec<&LocalizedName> = value
        .names()
        .iter()
        .filter(|name| name.is_fully_specified() && name.text().is_some())
        .filter(|name| name.locale().map_or(true, |tag| locale.matches_tag(tag)))
        .collect();

    let fully_specified = candidates
        .iter()
        .find(|name| name.is_locale_preferred())
        .or_else(|| candidates.first())
        .and_then(|name| name.text());

    fully_specified
        .or_else(|| value.name())
        .or_else(|| value.display())
        .unwrap_or(uuid)
        .to_string()
}

/// Label for a question concept: its own `name.name`, then `display`, then uuid.
///
/// Questions are never coded answers, so the concept map is not consulted. A missing concept
/// yields an empty label.
pub fn concept_label(concept: Option<&ConceptRef>) -> String {
    concept
        .and_then(|c| c.name().or_else(|| c.display()).or_else(|| c.uuid()))
        .unwrap_or_default()
        .to_string()
}

/// Render any observation value as text.
///
/// Coded values go through [`resolve_answer`] when the question is known and [`resolve`]
/// otherwise. Primitives and dates render as received. Absent and unsupported values render
/// as an empty string.
pub fn display_obs_value(
    value: &ObsValue,
    question_uuid: Option<&str>,
    concept_map: Option<&ConceptMap>,
    locale: Option<&Locale>,
) -> String {
    match value {
        ObsValue::Coded(coded) => match question_uuid {
            Some(question) => resolve_answer(question, coded, concept_map, locale),
            None => resolve(coded, concept_map, locale),
        },
        ObsValue::Primitive(primitive) => primitive.display(),
        ObsValue::Date(date) => date.raw.clone(),
        ObsValue::Absent => String::new(),
        ObsValue::Unsupported(_) => {
            tracing::warn!(
                question = question_uuid.unwrap_or("<unknown>"),
                "observation value has an unsupported shape"
            );
            String::new()
        }
    }
}
