use std::sync::Arc;

use bytes::Bytes;
use chrono::{FixedOffset, NaiveDate, Utc};

use crate::{
    config::UpstreamConfig,
    error::FetchError,
    models::{menu::Menu, servings::Servings, user::User},
    services::{
        fetcher::Fetcher, menu::parse_menu, metrics::PARSE_FAILURES_COUNTER,
        servings::parse_servings, users,
    },
};

/// The cafeteria reports local times without an offset; it runs on UTC-3 all year.
const CAFETERIA_UTC_OFFSET_SECS: i32 = -3 * 3600;

pub fn cafeteria_offset() -> FixedOffset {
    FixedOffset::east_opt(CAFETERIA_UTC_OFFSET_SECS).expect("UTC-3 is a valid offset")
}

/// Today's date at the cafeteria.
pub fn cafeteria_today() -> NaiveDate {
    Utc::now().with_timezone(&cafeteria_offset()).date_naive()
}

/// Entry point to the three normalized views of the cafeteria's data.
///
/// Holds no state between calls besides the injected fetcher; every call
/// builds a fresh result.
pub struct ComedorService {
    fetcher: Arc<dyn Fetcher>,
    upstream: UpstreamConfig,
}

impl ComedorService {
    pub fn new(fetcher: Arc<dyn Fetcher>, upstream: UpstreamConfig) -> Self {
        Self { fetcher, upstream }
    }

    pub async fn fetch_menu(&self) -> Result<Menu, FetchError> {
        self.fetch_menu_on(cafeteria_today()).await
    }

    /// The menu page, read as the week containing `today`.
    pub async fn fetch_menu_on(&self, today: NaiveDate) -> Result<Menu, FetchError> {
        let result = self
            .get_body(&self.upstream.menu_url)
            .await
            .and_then(|body| parse_menu(&body, today).map_err(FetchError::from));
        record_failure("menu", &result);
        result
    }

    pub async fn fetch_servings(&self) -> Result<Servings, FetchError> {
        self.fetch_servings_on(cafeteria_today()).await
    }

    pub async fn fetch_servings_on(&self, today: NaiveDate) -> Result<Servings, FetchError> {
        let result = self
            .get_body(&self.upstream.servings_url)
            .await
            .and_then(|body| {
                parse_servings(&body, today, cafeteria_offset()).map_err(FetchError::from)
            });
        record_failure("servings", &result);
        result
    }

    async fn get_body(&self, url: &str) -> Result<Bytes, FetchError> {
        Ok(self.fetcher.get(url).await?.into_body()?)
    }

    /// Accounts for every code that could be fetched; see [`users::fetch_users`].
    pub async fn fetch_users<I>(&self, codes: I) -> Vec<User>
    where
        I: IntoIterator<Item = String>,
    {
        users::fetch_users(self.fetcher.as_ref(), &self.upstream, codes).await
    }
}

fn record_failure<T>(view: &str, result: &Result<T, FetchError>) {
    if let Err(e) = result {
        tracing::warn!("Fetching {} failed: {}", view, e);
        PARSE_FAILURES_COUNTER
            .with_label_values(&[view, e.reason()])
            .inc();
    }
}
