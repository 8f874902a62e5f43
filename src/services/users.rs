use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures_util::stream::{self, StreamExt};

use crate::{
    config::UpstreamConfig,
    error::{FetchError, ParseError},
    models::user::User,
    services::{fetcher::Fetcher, metrics::USER_FETCH_FAILURES_COUNTER},
};

const ROWS_PREFIX: &str = "rows: [{c: [";
const ROWS_SUFFIX: &str = "]}]}});";
const CELL_SEPARATOR: &str = "},{";

/// Where each field sits in the account row.
///
/// The upstream has no schema; these positions were read off live responses
/// and break silently if the columns are reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserLayout {
    pub expiration: usize,
    pub balance: usize,
    pub account_type: usize,
    pub first_name: usize,
    pub last_name: usize,
    pub image_code: usize,
}

impl UserLayout {
    pub const OBSERVED: UserLayout = UserLayout {
        expiration: 4,
        balance: 5,
        account_type: 8,
        first_name: 16,
        last_name: 17,
        image_code: 24,
    };

    /// Fewest cells a row must have for every index to be addressable.
    pub fn min_cells(&self) -> usize {
        [
            self.expiration,
            self.balance,
            self.account_type,
            self.first_name,
            self.last_name,
            self.image_code,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

impl Default for UserLayout {
    fn default() -> Self {
        Self::OBSERVED
    }
}

// Cell wrappers: `v: 'text'`, `v: 123`, `v: new Date(2024, 5, 10)`.
const STRING_CELL_OFFSET: usize = 4;
const NUMBER_CELL_OFFSET: usize = 3;
const DATE_CELL_OFFSET: usize = 12;

fn is_null(cell: &str) -> bool {
    cell.get(NUMBER_CELL_OFFSET..).map(str::trim) == Some("null")
}

fn string_cell(cell: &str) -> Option<&str> {
    if is_null(cell) {
        return Some("");
    }
    cell.get(STRING_CELL_OFFSET..cell.len().checked_sub(1)?)
        .map(str::trim)
}

fn number_cell(cell: &str) -> Option<&str> {
    cell.get(NUMBER_CELL_OFFSET..).map(str::trim)
}

/// `v: new Date(2024, 5, 10)` → midnight UTC on that day.
fn date_cell(cell: &str) -> Option<DateTime<Utc>> {
    let inner = cell.get(DATE_CELL_OFFSET..cell.len().checked_sub(1)?)?;
    let mut parts = inner.split(',').map(str::trim);
    let year = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    let day = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.and_time(NaiveTime::MIN).and_utc())
}

pub fn image_url(image_base: &str, image_code: &str) -> String {
    format!("{}/{}", image_base.trim_end_matches('/'), image_code)
}

/// Parse the account row returned for `code`.
pub fn parse_user(code: &str, raw: &[u8], image_base: &str) -> Result<User, ParseError> {
    let payload = std::str::from_utf8(raw).map_err(|_| ParseError::DataDecodingError)?;

    let start = payload
        .find(ROWS_PREFIX)
        .map(|i| i + ROWS_PREFIX.len())
        .ok_or(ParseError::UserUnparseable)?;
    let end = payload[start..]
        .find(ROWS_SUFFIX)
        .map(|i| start + i)
        .ok_or(ParseError::UserUnparseable)?;

    let cells: Vec<&str> = payload[start..end]
        .split(CELL_SEPARATOR)
        .map(|cell| {
            let cell = cell.trim();
            let cell = cell.strip_prefix('{').unwrap_or(cell);
            cell.strip_suffix('}').unwrap_or(cell).trim()
        })
        .collect();

    let layout = UserLayout::OBSERVED;
    if cells.len() < layout.min_cells() {
        tracing::debug!(
            "Account {} row has {} cells, need {}",
            code,
            cells.len(),
            layout.min_cells()
        );
        return Err(ParseError::UserUnparseable);
    }

    let text = |index: usize| string_cell(cells[index]).ok_or(ParseError::UserUnparseable);

    let balance = number_cell(cells[layout.balance])
        .and_then(|n| n.parse::<i64>().ok())
        .ok_or(ParseError::UserUnparseable)?;
    let name = format!("{} {}", text(layout.first_name)?, text(layout.last_name)?)
        .trim()
        .to_string();
    let image_code = text(layout.image_code)?.to_string();

    Ok(User {
        code: code.to_string(),
        name,
        balance,
        image_url: image_url(image_base, &image_code),
        image_code,
        expiration_date: date_cell(cells[layout.expiration]),
        account_type: text(layout.account_type)?.to_string(),
    })
}

/// Account codes go straight into a form body; anything beyond these characters is rejected.
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Fetch and parse a single account.
pub async fn fetch_user(
    fetcher: &dyn Fetcher,
    upstream: &UpstreamConfig,
    code: &str,
) -> Result<User, FetchError> {
    if !is_valid_code(code) {
        return Err(FetchError::InvalidCode(code.to_string()));
    }
    let response = fetcher
        .post(
            &upstream.data_url,
            format!("accion=4&codigo={code}"),
            "application/x-www-form-urlencoded",
        )
        .await?;
    let body = response.into_body()?;
    Ok(parse_user(code, &body, &upstream.image_base_url)?)
}

/// Fetch many accounts concurrently, at most `upstream.user_fetch_concurrency` at a time.
///
/// Codes that fail are logged and left out; the batch itself never fails.
/// Dropping the returned future cancels whatever requests are still in flight.
pub async fn fetch_users<I>(fetcher: &dyn Fetcher, upstream: &UpstreamConfig, codes: I) -> Vec<User>
where
    I: IntoIterator<Item = String>,
{
    let codes: Vec<String> = codes.into_iter().collect();
    if codes.is_empty() {
        return Vec::new();
    }
    let requested = codes.len();

    let mut results = stream::iter(codes)
        .map(move |code| async move {
            let result = fetch_user(fetcher, upstream, &code).await;
            (code, result)
        })
        .buffer_unordered(upstream.user_fetch_concurrency.max(1));

    // Single consumer: only this loop touches the result map.
    let mut users = BTreeMap::new();
    while let Some((code, result)) = results.next().await {
        match result {
            Ok(user) => {
                users.insert(code, user);
            }
            Err(e) => {
                tracing::warn!("Dropping account {}: {}", code, e);
                USER_FETCH_FAILURES_COUNTER
                    .with_label_values(&[e.reason()])
                    .inc();
            }
        }
    }

    tracing::info!("Fetched {} of {} requested account(s)", users.len(), requested);
    users.into_values().collect()
}
