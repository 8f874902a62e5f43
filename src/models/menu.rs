use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{ser::SerializeMap, Serialize, Serializer};

use super::iso_key;

/// The week's menu: one entry per day found on the page, food items in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    pub days: BTreeMap<NaiveDate, Vec<String>>,
}

impl Menu {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn get(&self, day: &NaiveDate) -> Option<&Vec<String>> {
        self.days.get(day)
    }
}

/// JSON object keys must be strings, so days go out as `"2024-05-13T00:00:00Z"`.
impl Serialize for Menu {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for (day, items) in &self.days {
            map.serialize_entry(&iso_key(day.and_time(NaiveTime::MIN).and_utc()), items)?;
        }
        map.end()
    }
}
