//! Validated primitive types shared by the observation view crates.
//!
//! - [`Locale`]: a language tag such as `en` or `en_GB`, used to pick localized concept names.
//! - [`ColumnKey`]: the stable key a table column stores its cell under.

use std::fmt;

/// Locale used when none is requested.
pub const FALLBACK_LOCALE: &str = "en";

/// Errors that can occur when creating validated types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypesError {
    /// The input was empty or contained only whitespace
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// The input contained characters outside the permitted set
    #[error("{kind} contains invalid characters: '{value}'")]
    InvalidCharacters { kind: &'static str, value: String },
}

/// A locale tag (for example `en`, `fr`, `en_GB`, `pt-BR`).
///
/// The input is trimmed and `-` separators are normalised to `_`. Only ASCII letters and a
/// single region separator are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(String);

impl Locale {
    /// Creates a new `Locale` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::Empty`] for blank input and [`TypesError::InvalidCharacters`] when
    /// the tag contains anything other than ASCII letters and `_`/`-` separators.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::Empty("locale"));
        }

        let normalised = trimmed.replace('-', "_");
        let mut parts = normalised.split('_');
        let valid = parts
            .by_ref()
            .take(2)
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_alphabetic()))
            && parts.next().is_none();

        if !valid {
            return Err(TypesError::InvalidCharacters {
                kind: "locale",
                value: trimmed.to_owned(),
            });
        }

        Ok(Self(normalised))
    }

    /// Returns the locale tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The language part of the tag (`en` for `en_GB`).
    pub fn language(&self) -> &str {
        self.0.split('_').next().unwrap_or(&self.0)
    }

    fn has_region(&self) -> bool {
        self.0.contains('_')
    }

    /// Returns `true` if a name tagged with `tag` should be shown to a user in this locale.
    ///
    /// Comparison ignores case and treats `-` and `_` alike. A bare language on either side
    /// matches every region of that language. Tags that are not valid locales never match.
    pub fn matches_tag(&self, tag: &str) -> bool {
        let Ok(other) = Locale::new(tag) else {
            return false;
        };

        if self.0.eq_ignore_ascii_case(&other.0) {
            return true;
        }

        let same_language = self.language().eq_ignore_ascii_case(other.language());
        same_language && (!self.has_region() || !other.has_region())
    }
}

impl Default for Locale {
    /// The [`FALLBACK_LOCALE`].
    fn default() -> Self {
        Self(FALLBACK_LOCALE.to_owned())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Locale {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::new(s)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for Locale {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Locale {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Locale::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Key under which a table column stores its cell on a row.
///
/// Keys are trimmed, non-empty, and restricted to ASCII alphanumerics plus `_`, `-` and `.`
/// so they can double as JSON object keys and DOM ids in a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey(String);

impl ColumnKey {
    /// Creates a new `ColumnKey`.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::Empty`] for blank input and [`TypesError::InvalidCharacters`]
    /// when the key contains characters outside `[A-Za-z0-9_.-]`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::Empty("column key"));
        }

        let ok = trimmed
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
        if !ok {
            return Err(TypesError::InvalidCharacters {
                kind: "column key",
                value: trimmed.to_owned(),
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ColumnKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for ColumnKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ColumnKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ColumnKey::new(&s).map_err(serde::de::Error::custom)
    }
}
