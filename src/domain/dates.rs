//! The canonical textual date format.
//!
//! Dates carry day precision only, with no time-of-day or time-zone
//! component. Whenever a date crosses a serialization boundary it is
//! written as `day.month.year` without zero padding, e.g. `1.1.1990` or
//! `17.11.2003`. Parsing accepts both padded and unpadded components.

use chrono::{Datelike, NaiveDate};

/// Returns the canonical `day.month.year` representation of `date`.
#[must_use]
pub fn format(date: NaiveDate) -> String {
    format!("{}.{}.{}", date.day(), date.month(), date.year())
}

/// Parses a date from its canonical `day.month.year` representation.
///
/// # Errors
///
/// Returns [`ParseError`] if the text is not a valid calendar date in the
/// canonical format.
pub fn parse(s: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(s.trim(), "%d.%m.%Y").map_err(|_| ParseError(s.to_string()))
}

/// Error returned when text does not match the canonical date format.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid date '{0}': expected day.month.year")]
pub struct ParseError(String);

/// Serde adapter for `Option<NaiveDate>` fields using the canonical format.
///
/// Use with `#[serde(with = "...")]` on optional date fields.
pub mod optional {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    /// Serializes an optional date in the canonical format.
    ///
    /// # Errors
    ///
    /// Propagates any error from the underlying serializer.
    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_some(&super::format(*date)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional date from the canonical format.
    ///
    /// # Errors
    ///
    /// Fails if the text is present but not a valid canonical date.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|s| super::parse(&s).map_err(de::Error::custom))
            .transpose()
    }
}
