//! View runtime configuration.
//!
//! Configuration is resolved once at start-up and passed into the pipeline. Nothing in the
//! pipeline reads environment variables, so two projections with the same inputs always
//! agree.

use crate::constants::{
    DEFAULT_DATE_FORMAT, DEFAULT_PAGE_SIZE, MISSING_VALUE_PLACEHOLDER, PAGE_SIZE_OPTIONS,
};
use crate::{ViewError, ViewResult};
use chrono::format::{Item, StrftimeItems};
use obsview_types::Locale;

/// Display configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewConfig {
    locale: Locale,
    page_size: usize,
    page_size_options: Vec<usize>,
    date_format: String,
    placeholder: String,
}

impl ViewConfig {
    /// Create a new `ViewConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidConfig`] if:
    /// - `page_size_options` is empty or contains `0`,
    /// - `page_size` is not one of `page_size_options`,
    /// - `date_format` is blank or not a valid `chrono` strftime pattern.
    pub fn new(
        locale: Locale,
        page_size: usize,
        page_size_options: Vec<usize>,
        date_format: String,
        placeholder: String,
    ) -> ViewResult<Self> {
        if page_size_options.is_empty() || page_size_options.contains(&0) {
            return Err(ViewError::InvalidConfig(
                "page size options must be non-empty and greater than zero".into(),
            ));
        }

        if !page_size_options.contains(&page_size) {
            return Err(ViewError::InvalidConfig(format!(
                "page size {page_size} is not one of {page_size_options:?}"
            )));
        }

        if date_format.trim().is_empty() {
            return Err(ViewError::InvalidConfig(
                "date format cannot be empty".into(),
            ));
        }

        if StrftimeItems::new(&date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ViewError::InvalidConfig(format!(
                "date format '{date_format}' is not a valid strftime pattern"
            )));
        }

        Ok(Self {
            locale,
            page_size,
            page_size_options,
            date_format,
            placeholder,
        })
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_size_options(&self) -> &[usize] {
        &self.page_size_options
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Text shown for a cell whose value is missing.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Same configuration with a different locale.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Same configuration with a different page size.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidConfig`] if `page_size` is not an allowed option.
    pub fn with_page_size(self, page_size: usize) -> ViewResult<Self> {
        Self::new(
            self.locale,
            page_size,
            self.page_size_options,
            self.date_format,
            self.placeholder,
        )
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            placeholder: MISSING_VALUE_PLACEHOLDER.to_string(),
        }
    }
}

/// Parse a locale from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the fallback locale (`en`).
pub fn locale_from_env_value(value: Option<String>) -> ViewResult<Locale> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(Locale::new).transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse a page size from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_PAGE_SIZE`].
pub fn page_size_from_env_value(value: Option<String>) -> ViewResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            ViewError::InvalidConfig(format!("page size must be a positive integer, got '{raw}'"))
        }),
    }
}
