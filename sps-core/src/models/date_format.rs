//! Serde support for calendar dates written as `YYYY-MM-DD`.
//!
//! Storefronts schedule price changes by calendar day, so the date is the
//! only precision the wire format carries.

use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

/// The `YYYY-MM-DD` format used for scheduled and effective dates.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Serialize a date as `YYYY-MM-DD`
pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
    let text = date.format(DATE_FORMAT).map_err(S::Error::custom)?;
    serializer.serialize_str(&text)
}

/// Deserialize a date from `YYYY-MM-DD`
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
    let text = String::deserialize(deserializer)?;
    Date::parse(&text, DATE_FORMAT).map_err(D::Error::custom)
}

/// The same format for optional dates
pub mod option {
    use super::*;

    /// Serialize an optional date as `YYYY-MM-DD` or null
    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => super::serialize(date, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional date from `YYYY-MM-DD` or null
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| Date::parse(&text, DATE_FORMAT).map_err(D::Error::custom))
            .transpose()
    }
}
