use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::{error::ParseError, models::servings::Servings};

lazy_static! {
    /// A bare identifier used as an object key, as in `{v:` or `,rows:`.
    static ref BARE_KEY: Regex = Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").unwrap();
    static ref SINGLE_QUOTED: Regex = Regex::new(r"'((?:[^'\\]|\\.)*)'").unwrap();
}

/// Extract the argument of the `callback({...})` wrapper the endpoint answers with.
fn call_argument(payload: &str) -> Option<&str> {
    let open = payload.find('(')?;
    let close = payload.rfind(')')?;
    payload.get(open + 1..close)
}

/// Turn a JavaScript object literal into JSON: quote bare keys and swap single
/// quotes for double quotes. This is a textual repair, not a tokenizer; a string
/// value containing something like `,key:` will be mangled.
fn repair_object_literal(literal: &str) -> String {
    let keyed = BARE_KEY.replace_all(literal, "$1\"$2\":");
    SINGLE_QUOTED
        .replace_all(&keyed, |caps: &Captures| {
            format!("\"{}\"", caps[1].replace("\\'", "'").replace('"', "\\\""))
        })
        .into_owned()
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn parse_count(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    // The data source sometimes sends whole numbers as floats.
    let f = value.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX)).then_some(f as u32)
}

fn cell_value<'a>(cells: &'a [Value], index: usize) -> Option<&'a Value> {
    cells.get(index)?.get("v")
}

/// Parse today's serving counts.
///
/// Each row carries a time of day in the cafeteria's local time; it is pinned to
/// `today` at `offset`. Rows without a usable time or count are skipped.
pub fn parse_servings(
    raw: &[u8],
    today: NaiveDate,
    offset: FixedOffset,
) -> Result<Servings, ParseError> {
    let payload = std::str::from_utf8(raw).map_err(|_| ParseError::DataDecodingError)?;
    let literal = call_argument(payload).ok_or(ParseError::ServingsUnparseable)?;

    let json: Value = serde_json::from_str(&repair_object_literal(literal))
        .map_err(|_| ParseError::ServingsUnparseable)?;
    let rows = json
        .get("table")
        .and_then(|table| table.get("rows"))
        .and_then(Value::as_array)
        .ok_or(ParseError::ServingsUnparseable)?;

    let mut slots = BTreeMap::new();
    let mut skipped = 0usize;
    for row in rows {
        let Some(cells) = row.get("c").and_then(Value::as_array) else {
            skipped += 1;
            continue;
        };
        let time = cell_value(cells, 0).and_then(Value::as_str).and_then(parse_time);
        let count = cell_value(cells, 1).and_then(parse_count);
        match (time, count) {
            (Some(time), Some(count)) => {
                let local = today.and_time(time);
                if let Some(at) = offset.from_local_datetime(&local).single() {
                    slots.insert(at, count);
                }
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} malformed servings row(s)", skipped);
    }
    Ok(Servings { slots })
}
