use std::{collections::BTreeSet, fmt::Display, str::FromStr};

use anyhow::anyhow;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Separator of tags, both on the command line and inside the record files.
pub const TAG_SEPARATOR: char = ',';

/// Tags a record is labeled with. Never empty. A single tag can't be empty or contain whitespace
/// or [TAG_SEPARATOR].
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }
}

impl FromStr for TagSet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tags = BTreeSet::new();
        for tag in s.split(TAG_SEPARATOR) {
            if tag.is_empty() {
                return Err(anyhow!("Tag list {s:?} contains an empty tag"));
            }
            if tag.chars().any(char::is_whitespace) {
                return Err(anyhow!("Tag {tag:?} contains whitespace"));
            }
            tags.insert(tag.to_string());
        }
        Ok(TagSet(tags))
    }
}

impl Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, tag) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, "{TAG_SEPARATOR}")?;
            }
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One timed activity. A record without `end` is active, meaning it's still being recorded.
/// Stored as a single line of a day file.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Record {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub end: Option<DateTime<Utc>>,
    pub tags: TagSet,
}

impl Record {
    /// Creates an active record. Sub-second precision is dropped, files only store seconds.
    pub fn active(start: DateTime<Utc>, tags: TagSet) -> Self {
        Self {
            start: start.trunc_subsecs(0),
            end: None,
            tags,
        }
    }

    /// Creates a finished record. `end` before `start` is collapsed into an empty interval.
    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>, tags: TagSet) -> Self {
        let start = start.trunc_subsecs(0);
        Self {
            start,
            end: Some(end.trunc_subsecs(0).max(start)),
            tags,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }

    /// Closes the record. Keeps `end >= start` even if the clock went backwards.
    pub fn set_end(&mut self, end: DateTime<Utc>) {
        self.end = Some(end.trunc_subsecs(0).max(self.start));
    }

    /// Duration of a finished record, [None] for an active one.
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }
}
