//! Constant values used across the core crate.

/// Rows per page when no page size has been chosen.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes offered by list screens.
pub const PAGE_SIZE_OPTIONS: [usize; 5] = [10, 20, 30, 40, 50];

/// `chrono` format for dates shown in list cells (`15-Sep-2021`).
pub const DEFAULT_DATE_FORMAT: &str = "%d-%b-%Y";

/// Shown in a cell when the encounter has no value for the column.
pub const MISSING_VALUE_PLACEHOLDER: &str = "--";

pub const VIEW_DETAILS_LABEL: &str = "View details";
pub const EDIT_FORM_LABEL: &str = "Edit form";
