//! Ready-made column extractors and declarative column configuration.
//!
//! List screens mostly show the same kinds of cells: the encounter date, the form or
//! encounter type, and the answer to a particular question. This module builds
//! [`ColumnSpec`]s for those, either directly or from a YAML column list:
//!
//! ```yaml
//! - key: visitDate
//!   header: Visit date
//!   source: { type: encounter_date }
//! - key: vdrl
//!   header: VDRL
//!   source: { type: obs, concept: 299AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA }
//! ```
//!
//! The concept map and display settings are captured by each extractor when the column is
//! built, so extraction stays a pure function of the encounter.

use crate::config::ViewConfig;
use crate::error::{CellError, CellResult};
use crate::projection::{CellValue, ColumnLink, ColumnSpec};
use crate::resolver::resolve_answer;
use crate::{ViewError, ViewResult};
use chrono::NaiveDateTime;
use obsview_types::{ColumnKey, Locale};
use openmrs::{ConceptMap, Encounter, ObsValue, Observation};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;

/// Where a configured column takes its value from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnSource {
    EncounterDate,
    FormName,
    EncounterType,
    Obs {
        concept: String,
        #[serde(default)]
        fallback_concepts: Vec<String>,
        #[serde(default)]
        is_date: bool,
    },
}

/// Static link target for a configured column.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    pub url: String,
}

/// One entry of a declarative column list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    pub key: ColumnKey,
    pub header: String,
    pub source: ColumnSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkConfig>,
}

/// Parse a declarative column list from YAML text.
///
/// # Errors
///
/// Returns [`ViewError::YamlDeserialization`] for malformed YAML or unknown keys, and
/// [`ViewError::InvalidConfig`] when two columns share a key or an observation column names
/// no concept.
pub fn read_column_configs_yaml(yaml: &str) -> ViewResult<Vec<ColumnConfig>> {
    let configs: Vec<ColumnConfig> =
        serde_yaml::from_str(yaml).map_err(ViewError::YamlDeserialization)?;

    for (index, config) in configs.iter().enumerate() {
        if configs[..index].iter().any(|c| c.key == config.key) {
            return Err(ViewError::InvalidConfig(format!(
                "duplicate column key '{}'",
                config.key
            )));
        }

        if let ColumnSource::Obs { concept, .. } = &config.source {
            if concept.trim().is_empty() {
                return Err(ViewError::InvalidConfig(format!(
                    "column '{}' has an empty concept",
                    config.key
                )));
            }
        }
    }

    Ok(configs)
}

/// Build column specs from configuration.
pub fn build_columns(
    configs: &[ColumnConfig],
    concept_map: Arc<ConceptMap>,
    config: &ViewConfig,
) -> Vec<ColumnSpec> {
    configs
        .iter()
        .map(|column| {
            let key = column.key.clone();
            let header = column.header.as_str();

            let spec = match &column.source {
                ColumnSource::EncounterDate => encounter_date_column(key, header, config),
                ColumnSource::FormName => form_name_column(key, header, config),
                ColumnSource::EncounterType => encounter_type_column(key, header, config),
                ColumnSource::Obs {
                    concept,
                    fallback_concepts,
                    is_date,
                } => {
                    let mut concepts = vec![concept.clone()];
                    concepts.extend(fallback_concepts.iter().cloned());
                    obs_column(
                        key,
                        header,
                        ObsColumn { concepts, is_date: *is_date },
                        Arc::clone(&concept_map),
                        config,
                    )
                }
            };

            match &column.link {
                Some(link) => {
                    let url = link.url.clone();
                    spec.with_link(ColumnLink::new().with_url(move || url.clone()))
                }
                None => spec,
            }
        })
        .collect()
}

/// The encounter date, formatted with the configured date format.
///
/// A missing date renders the placeholder; an unparseable one is a cell error.
pub fn encounter_date_column(
    key: ColumnKey,
    header: impl Into<String>,
    config: &ViewConfig,
) -> ColumnSpec {
    let date_format = config.date_format().to_string();
    let placeholder = config.placeholder().to_string();

    ColumnSpec::new(key, header, move |encounter: &Encounter| {
        let Some(raw) = encounter.encounter_datetime.as_deref() else {
            return Ok(CellValue::text(&placeholder));
        };
        let datetime = encounter.datetime().ok_or_else(|| {
            CellError::Extraction(format!("unparseable encounter datetime '{raw}'"))
        })?;
        format_date(&datetime, &date_format).map(CellValue::Text)
    })
}

/// The form's name, or the placeholder.
pub fn form_name_column(
    key: ColumnKey,
    header: impl Into<String>,
    config: &ViewConfig,
) -> ColumnSpec {
    let placeholder = config.placeholder().to_string();
    ColumnSpec::new(key, header, move |encounter: &Encounter| {
        Ok(CellValue::text(encounter.form_label().unwrap_or(&placeholder)))
    })
}

/// The encounter type's name, or the placeholder.
pub fn encounter_type_column(
    key: ColumnKey,
    header: impl Into<String>,
    config: &ViewConfig,
) -> ColumnSpec {
    let placeholder = config.placeholder().to_string();
    ColumnSpec::new(key, header, move |encounter: &Encounter| {
        Ok(CellValue::text(
            encounter.encounter_type_label().unwrap_or(&placeholder),
        ))
    })
}

/// Settings for [`obs_column`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObsColumn {
    /// Question concepts to look for, in priority order.
    pub concepts: Vec<String>,
    /// Format date values with the configured date format.
    pub is_date: bool,
}

impl ObsColumn {
    pub fn new(concept: impl Into<String>) -> Self {
        Self {
            concepts: vec![concept.into()],
            is_date: false,
        }
    }

    pub fn with_fallback(mut self, concept: impl Into<String>) -> Self {
        self.concepts.push(concept.into());
        self
    }

    pub fn date(mut self) -> Self {
        self.is_date = true;
        self
    }
}

/// The answer to a question, taken from the first matching observation.
///
/// Each concept in `settings.concepts` is tried in turn; group members are searched and
/// voided observations ignored. Coded answers resolve through the concept map entry of the
/// question they answer.
pub fn obs_column(
    key: ColumnKey,
    header: impl Into<String>,
    settings: ObsColumn,
    concept_map: Arc<ConceptMap>,
    config: &ViewConfig,
) -> ColumnSpec {
    let date_format = config.date_format().to_string();
    let placeholder = config.placeholder().to_string();
    let locale = config.locale().clone();

    ColumnSpec::new(key, header, move |encounter: &Encounter| {
        let found = settings
            .concepts
            .iter()
            .find_map(|concept| find_obs(&encounter.obs, concept));

        match found {
            Some(obs) => obs_cell(
                obs,
                settings.is_date,
                &concept_map,
                &locale,
                &date_format,
                &placeholder,
            ),
            None => Ok(CellValue::text(&placeholder)),
        }
    })
}

/// First non-voided observation for `concept_uuid`, searching group members depth first.
pub fn find_obs<'a>(observations: &'a [Observation], concept_uuid: &str) -> Option<&'a Observation> {
    observations
        .iter()
        .filter(|obs| !obs.voided)
        .find_map(|obs| {
            if obs.concept_uuid() == Some(concept_uuid) {
                Some(obs)
            } else {
                find_obs(obs.members(), concept_uuid)
            }
        })
}

fn obs_cell(
    obs: &Observation,
    is_date: bool,
    concept_map: &ConceptMap,
    locale: &Locale,
    date_format: &str,
    placeholder: &str,
) -> CellResult<CellValue> {
    let question = obs.concept_uuid().ok_or_else(|| {
        CellError::MalformedObservation("matched observation lost its concept uuid".into())
    })?;

    let text = match &obs.value {
        ObsValue::Absent => placeholder.to_string(),
        ObsValue::Date(date) if is_date => format_date(&date.datetime, date_format)?,
        ObsValue::Date(date) => date.raw.clone(),
        ObsValue::Primitive(primitive) => primitive.display(),
        ObsValue::Coded(coded) => {
            let resolved = resolve_answer(question, coded, Some(concept_map), Some(locale));
            if resolved.is_empty() {
                return Err(CellError::MalformedObservation(format!(
                    "coded answer to {question} has no concept uuid"
                )));
            }
            resolved
        }
        ObsValue::Unsupported(_) => {
            return Err(CellError::UnsupportedValue {
                concept: question.to_string(),
            })
        }
    };

    Ok(CellValue::Text(text))
}

fn format_date(datetime: &NaiveDateTime, date_format: &str) -> CellResult<String> {
    let mut out = String::new();
    write!(out, "{}", datetime.format(date_format))
        .map_err(|_| CellError::Extraction(format!("invalid date format '{date_format}'")))?;
    Ok(out)
}
