use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{ser::SerializeMap, Serialize, Serializer};

use super::iso_key;

/// Serving counts for today, keyed by the instant of each time slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Servings {
    pub slots: BTreeMap<DateTime<FixedOffset>, u32>,
}

impl Servings {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.slots.values().map(|&c| u64::from(c)).sum()
    }
}

impl Serialize for Servings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for (at, count) in &self.slots {
            map.serialize_entry(&iso_key(at.with_timezone(&Utc)), count)?;
        }
        map.end()
    }
}
