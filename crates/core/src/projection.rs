//! Row projection for encounter list tables.
//!
//! A screen configures a table with an ordered list of [`ColumnSpec`]s. [`project`] turns each
//! encounter into one [`RowViewModel`] by running every column's extractor, in column order.
//!
//! A failing extractor never aborts the batch: the cell is rendered empty and the remaining
//! cells and rows are still produced, so one malformed observation cannot hide a visit
//! history.

use crate::constants::{EDIT_FORM_LABEL, VIEW_DETAILS_LABEL};
use crate::error::CellResult;
use crate::flatten::{flatten_all, DetailEntry};
use obsview_types::{ColumnKey, Locale};
use openmrs::{ConceptMap, Encounter, Observation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Extracts a cell value from an encounter.
pub type Extractor = Arc<dyn Fn(&Encounter) -> CellResult<CellValue> + Send + Sync>;

type UrlFn = Arc<dyn Fn() -> String + Send + Sync>;
type NavigateFn = Arc<dyn Fn(&Encounter) + Send + Sync>;

/// Display value of one cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    /// Placeholder for a cell whose extraction failed.
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// The text to render; empty for [`CellValue::Empty`].
    pub fn as_text(&self) -> &str {
        match self {
            CellValue::Text(text) => text,
            CellValue::Empty => "",
        }
    }
}

/// Marks a column's cells as activation targets.
///
/// The projector resolves `get_url` into each cell. Navigation itself is left to the
/// renderer, which calls [`ColumnSpec::activate`].
#[derive(Clone, Default)]
pub struct ColumnLink {
    get_url: Option<UrlFn>,
    handle_navigate: Option<NavigateFn>,
}

impl ColumnLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, get_url: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.get_url = Some(Arc::new(get_url));
        self
    }

    pub fn with_navigate(
        mut self,
        handle_navigate: impl Fn(&Encounter) + Send + Sync + 'static,
    ) -> Self {
        self.handle_navigate = Some(Arc::new(handle_navigate));
        self
    }

    pub fn url(&self) -> Option<String> {
        self.get_url.as_ref().map(|get_url| get_url())
    }
}

impl fmt::Debug for ColumnLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnLink")
            .field("get_url", &self.get_url.is_some())
            .field("handle_navigate", &self.handle_navigate.is_some())
            .finish()
    }
}

/// One table column: a key, a header and an extractor.
#[derive(Clone)]
pub struct ColumnSpec {
    key: ColumnKey,
    header: String,
    get_value: Extractor,
    link: Option<ColumnLink>,
}

impl ColumnSpec {
    pub fn new(
        key: ColumnKey,
        header: impl Into<String>,
        get_value: impl Fn(&Encounter) -> CellResult<CellValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            key,
            header: header.into(),
            get_value: Arc::new(get_value),
            link: None,
        }
    }

    pub fn with_link(mut self, link: ColumnLink) -> Self {
        self.link = Some(link);
        self
    }

    pub fn key(&self) -> &ColumnKey {
        &self.key
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn link(&self) -> Option<&ColumnLink> {
        self.link.as_ref()
    }

    pub fn extract(&self, encounter: &Encounter) -> CellResult<CellValue> {
        (self.get_value)(encounter)
    }

    /// Run the column's navigation handler for `encounter`.
    ///
    /// Returns `false` when the column has no handler.
    pub fn activate(&self, encounter: &Encounter) -> bool {
        match self.link.as_ref().and_then(|l| l.handle_navigate.as_ref()) {
            Some(handle_navigate) => {
                handle_navigate(encounter);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

/// Table header for one column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Header {
    pub key: ColumnKey,
    pub header: String,
}

/// Headers in column order.
pub fn headers(columns: &[ColumnSpec]) -> Vec<Header> {
    columns
        .iter()
        .map(|c| Header {
            key: c.key.clone(),
            header: c.header.clone(),
        })
        .collect()
}

/// One projected cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub key: ColumnKey,
    pub value: CellValue,
    /// `true` when the column is an activation target.
    pub linked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// How an action opens a form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    View,
    Edit,
}

/// A form a screen can launch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDescriptor {
    pub uuid: String,
    pub name: String,
}

/// A row-level action offered by the renderer (for example in an overflow menu).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterAction {
    pub label: String,
    pub mode: FormMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<FormDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter_uuid: Option<String>,
}

/// Caller-supplied settings for [`project`].
///
/// Row actions come from, in order: the encounter's own entry in `encounter_actions`, then
/// `default_actions`, then a synthesized view/edit pair. Empty lists are skipped.
#[derive(Clone, Debug, Default)]
pub struct ProjectionOptions {
    /// Actions for specific encounters, keyed by encounter uuid.
    pub encounter_actions: BTreeMap<String, Vec<EncounterAction>>,
    /// Used verbatim on every row without its own actions.
    pub default_actions: Vec<EncounterAction>,
    /// Forms the screen is configured with; the first one backs the synthesized actions.
    pub forms: Vec<FormDescriptor>,
}

/// Display-ready representation of one encounter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowViewModel {
    pub id: String,
    pub cells: Vec<Cell>,
    pub actions: Vec<EncounterAction>,
    /// Source observations, kept for lazy detail expansion.
    #[serde(skip)]
    pub obs: Vec<Observation>,
}

impl RowViewModel {
    pub fn cell(&self, key: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.key.as_str() == key)
    }

    pub fn value(&self, key: &str) -> Option<&CellValue> {
        self.cell(key).map(|c| &c.value)
    }

    /// Flatten the row's observations for the expanded-row panel.
    pub fn detail(
        &self,
        concept_map: Option<&ConceptMap>,
        locale: Option<&Locale>,
    ) -> Vec<DetailEntry> {
        flatten_all(&self.obs, concept_map, locale)
    }
}

/// Project encounters into rows, one per encounter, in input order.
pub fn project(
    encounters: &[Encounter],
    columns: &[ColumnSpec],
    options: &ProjectionOptions,
) -> Vec<RowViewModel> {
    encounters
        .iter()
        .map(|encounter| project_row(encounter, columns, options))
        .collect()
}

fn project_row(
    encounter: &Encounter,
    columns: &[ColumnSpec],
    options: &ProjectionOptions,
) -> RowViewModel {
    let cells = columns
        .iter()
        .map(|column| {
            let value = column.extract(encounter).unwrap_or_else(|err| {
                tracing::warn!(
                    encounter = %encounter.uuid,
                    column = %column.key,
                    "cell extraction failed: {err}"
                );
                CellValue::Empty
            });

            Cell {
                key: column.key.clone(),
                value,
                linked: column.link.is_some(),
                url: column.link.as_ref().and_then(ColumnLink::url),
            }
        })
        .collect();

    RowViewModel {
        id: encounter.uuid.clone(),
        cells,
        actions: row_actions(encounter, options),
        obs: encounter.obs.clone(),
    }
}

fn row_actions(encounter: &Encounter, options: &ProjectionOptions) -> Vec<EncounterAction> {
    if let Some(actions) = options
        .encounter_actions
        .get(&encounter.uuid)
        .filter(|actions| !actions.is_empty())
    {
        return actions.clone();
    }

    if !options.default_actions.is_empty() {
        return options.default_actions.clone();
    }

    let form = options.forms.first().cloned().or_else(|| {
        encounter.form.as_ref().and_then(|form| {
            Some(FormDescriptor {
                uuid: form.uuid()?.to_string(),
                name: form.label().unwrap_or_default().to_string(),
            })
        })
    });

    let Some(form) = form else {
        return Vec::new();
    };

    [(VIEW_DETAILS_LABEL, FormMode::View), (EDIT_FORM_LABEL, FormMode::Edit)]
        .into_iter()
        .map(|(label, mode)| EncounterAction {
            label: label.to_string(),
            mode,
            form: Some(form.clone()),
            encounter_uuid: Some(encounter.uuid.clone()),
        })
        .collect()
}
