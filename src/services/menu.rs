use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use crate::{error::ParseError, models::menu::Menu};

lazy_static! {
    /// The weekly menu lives in the page body's `field-item even` div, one `ul` per day.
    static ref CONTAINER: Selector = Selector::parse(r#"div[class="field-item even"]"#).unwrap();
    static ref DAY_LIST: Selector = Selector::parse("ul").unwrap();
    static ref FOOD_ITEM: Selector = Selector::parse("li").unwrap();
}

/// Monday of the ISO week containing `day`.
pub fn week_monday(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Parse the weekly menu page.
///
/// The page carries no dates: the n-th list is taken to be the n-th day of the
/// week that contains `today`. A page with more or fewer lists than usual
/// yields more or fewer days; only a page with no lists at all is an error.
pub fn parse_menu(html: &[u8], today: NaiveDate) -> Result<Menu, ParseError> {
    let html = std::str::from_utf8(html).map_err(|_| ParseError::DataDecodingError)?;
    let document = Html::parse_document(html);

    let lists: Vec<ElementRef> = document
        .select(&CONTAINER)
        .flat_map(|container| container.select(&DAY_LIST))
        .collect();
    if lists.is_empty() {
        return Err(ParseError::MenuUnparseable);
    }

    let monday = week_monday(today);
    let mut days = BTreeMap::new();
    for (offset, list) in (0i64..).zip(lists) {
        let food: Vec<String> = list.select(&FOOD_ITEM).filter_map(item_text).collect();
        days.insert(monday + Duration::days(offset), food);
    }

    tracing::debug!("Parsed menu with {} day(s) starting {}", days.len(), monday);
    Ok(Menu { days })
}

fn item_text(item: ElementRef) -> Option<String> {
    let text = item
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}
