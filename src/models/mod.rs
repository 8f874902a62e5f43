pub mod menu;
pub mod servings;
pub mod user;

use chrono::{DateTime, SecondsFormat, Utc};

/// RFC 3339 at second precision with a `Z` suffix, e.g. `2024-05-13T15:09:00Z`.
pub(crate) fn iso_key(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
