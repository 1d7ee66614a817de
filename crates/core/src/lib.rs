//! # Obsview Core
//!
//! Turns OpenMRS encounters into display-ready table rows and detail panels.
//!
//! The pipeline is pure and runs in memory:
//! - [`resolver`] picks one display string for a coded answer
//! - [`flatten`] turns nested observation groups into label/value pairs
//! - [`projection`] runs column extractors over encounters to build rows
//! - [`pagination`] slices rows into pages
//!
//! **No fetching**: encounters arrive already loaded. The helpers at the bottom of this module
//! read them from files for the CLI.

pub mod columns;
pub mod config;
pub mod constants;
pub mod error;
pub mod flatten;
pub mod pagination;
pub mod projection;
pub mod resolver;

pub use columns::{build_columns, read_column_configs_yaml, ColumnConfig, ColumnSource};
pub use config::ViewConfig;
pub use error::{CellError, CellResult, ViewError, ViewResult};
pub use flatten::{flatten, flatten_all, DetailEntry};
pub use pagination::{paginate, Page, PageChange, PaginationState};
pub use projection::{
    headers, project, CellValue, ColumnLink, ColumnSpec, EncounterAction, FormDescriptor,
    FormMode, Header, ProjectionOptions, RowViewModel,
};
pub use resolver::{resolve, resolve_answer};

use openmrs::{ConceptMap, Encounter};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// One projected page of an encounter list.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowPage {
    pub rows: Vec<RowViewModel>,
    pub total_items: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// An encounter list screen: configuration, concept map and columns bundled together.
#[derive(Clone, Debug)]
pub struct EncounterListView {
    config: ViewConfig,
    concept_map: Arc<ConceptMap>,
    columns: Vec<ColumnSpec>,
    options: ProjectionOptions,
}

impl EncounterListView {
    pub fn new(config: ViewConfig, concept_map: Arc<ConceptMap>, columns: Vec<ColumnSpec>) -> Self {
        Self {
            config,
            concept_map,
            columns,
            options: ProjectionOptions::default(),
        }
    }

    /// Build a view whose columns come from declarative configuration.
    pub fn from_column_configs(
        config: ViewConfig,
        concept_map: ConceptMap,
        column_configs: &[ColumnConfig],
    ) -> Self {
        let concept_map = Arc::new(concept_map);
        let columns = build_columns(column_configs, Arc::clone(&concept_map), &config);
        Self::new(config, concept_map, columns)
    }

    pub fn with_options(mut self, options: ProjectionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<Header> {
        headers(&self.columns)
    }

    /// Project every encounter.
    pub fn rows(&self, encounters: &[Encounter]) -> Vec<RowViewModel> {
        project(encounters, &self.columns, &self.options)
    }

    /// Project one page of encounters.
    ///
    /// Rows are projected independently, so only the requested slice is projected. The result
    /// equals paginating [`EncounterListView::rows`].
    pub fn page(&self, encounters: &[Encounter], page_size: usize, page_number: usize) -> RowPage {
        let slice = paginate(encounters, page_size, page_number);
        tracing::debug!(
            page = page_number,
            page_size,
            total = slice.total_items,
            "projecting page"
        );

        RowPage {
            rows: project(slice.page_rows, &self.columns, &self.options),
            total_items: slice.total_items,
            page: slice.page,
            page_size: slice.page_size,
            total_pages: slice.total_pages(),
        }
    }

    /// Detail panel entries for a projected row.
    pub fn detail(&self, row: &RowViewModel) -> Vec<DetailEntry> {
        row.detail(Some(&self.concept_map), Some(self.config.locale()))
    }
}

fn read_file(path: &Path) -> ViewResult<String> {
    fs::read_to_string(path).map_err(ViewError::FileRead)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Load encounters from a JSON file holding an array or a REST `{ "results": [...] }` page.
pub fn load_encounters(path: &Path) -> ViewResult<Vec<Encounter>> {
    let encounters = openmrs::read_encounters_json(&read_file(path)?)?;
    tracing::info!(count = encounters.len(), path = %path.display(), "loaded encounters");
    Ok(encounters)
}

/// Load a concept map; `.yaml`/`.yml` files are read as YAML, anything else as JSON.
pub fn load_concept_map(path: &Path) -> ViewResult<ConceptMap> {
    let text = read_file(path)?;
    let map = if is_yaml(path) {
        openmrs::read_concept_map_yaml(&text)?
    } else {
        openmrs::read_concept_map_json(&text)?
    };
    tracing::info!(questions = map.len(), path = %path.display(), "loaded concept map");
    Ok(map)
}

/// Load a YAML column list.
pub fn load_column_configs(path: &Path) -> ViewResult<Vec<ColumnConfig>> {
    read_column_configs_yaml(&read_file(path)?)
}
