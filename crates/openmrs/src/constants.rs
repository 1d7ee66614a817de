//! Constant values used across the openmrs boundary crate.

/// `conceptNameType` of the canonical, fully specified name of a concept.
pub const FULLY_SPECIFIED: &str = "FULLY_SPECIFIED";

/// Date-time layout the REST API uses for `obsDatetime`, `encounterDatetime` and date values
/// (`2023-05-12T08:30:00.000+0000`).
pub const REST_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Date-only layout accepted for date values.
pub const REST_DATE_FORMAT: &str = "%Y-%m-%d";
