use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::iso_key;

/// A cafeteria account as reported by the upstream data endpoint.
///
/// Field names on the wire follow what existing clients expect
/// (`imageCode`, `imageURL`, `expirationDate`, `type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub code: String,
    pub name: String,
    /// Negative when the account is in debt.
    pub balance: i64,
    pub image_code: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(serialize_with = "serialize_expiration")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub account_type: String,
}

fn serialize_expiration<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(at) => serializer.serialize_some(&iso_key(*at)),
        None => serializer.serialize_none(),
    }
}
