use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::{storage::entities::Record, utils::time::day_start};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagUsage {
    pub tag: String,
    #[serde(with = "duration_ser")]
    pub duration: Duration,
    /// The tag is part of a record that is still being recorded.
    pub active: bool,
}

impl TagUsage {
    fn new(tag: String) -> Self {
        Self {
            tag,
            duration: Duration::zero(),
            active: false,
        }
    }
}

/// Summary of a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStats {
    pub date: NaiveDate,
    /// Sorted from the longest to the shortest.
    pub tags: Vec<TagUsage>,
    /// Time covered by the records. A record with several tags is counted once.
    #[serde(with = "duration_ser")]
    pub total: Duration,
}

/// Sums durations of `records` per tag. Only the part of a record that lies on `date` is counted,
/// an active record counts up to `now`. Records that don't reach into `date` are left out.
pub fn analyze_tags(date: NaiveDate, records: &[Record], now: DateTime<Utc>) -> DayStats {
    let from = day_start(date);
    let to = date.succ_opt().map(day_start);

    let mut map = BTreeMap::<&str, TagUsage>::new();
    let mut total = Duration::zero();

    for record in records {
        let end = record.end.unwrap_or(now);
        if record.start < from && end <= from {
            continue;
        }
        let end = to.map_or(end, |to| end.min(to));
        let duration = (end - record.start.max(from)).max(Duration::zero());

        total += duration;
        for tag in record.tags.iter() {
            let usage = map
                .entry(tag)
                .or_insert_with(|| TagUsage::new(tag.to_string()));
            usage.duration += duration;
            usage.active |= record.is_active();
        }
    }

    let mut tags = map.into_values().collect::<Vec<_>>();
    // Stable sort, ties stay in alphabetical order.
    tags.sort_by(|a, b| b.duration.cmp(&a.duration));
    DayStats { date, tags, total }
}

mod duration_ser {
    use chrono::Duration;
    use serde::Serializer;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_seconds())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

    use crate::storage::entities::{Record, TagSet};

    use super::analyze_tags;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 7, 4).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2018, 7, 4, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn tags(s: &str) -> TagSet {
        s.parse().unwrap()
    }

    #[test]
    fn test_sums_per_tag() {
        let records = [
            Record::closed(at(8, 0), at(9, 0), tags("work")),
            Record::closed(at(9, 0), at(11, 0), tags("work,meeting")),
            Record::closed(at(12, 0), at(12, 30), tags("lunch")),
        ];

        let stats = analyze_tags(date(), &records, at(20, 0));

        let summary = stats
            .tags
            .iter()
            .map(|v| (v.tag.as_str(), v.duration))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("work", Duration::hours(3)),
                ("meeting", Duration::hours(2)),
                ("lunch", Duration::minutes(30)),
            ]
        );
        assert_eq!(stats.total, Duration::minutes(210));
    }

    #[test]
    fn test_active_record_is_clipped_to_now() {
        let records = [
            Record::closed(at(8, 0), at(9, 0), tags("work")),
            Record::active(at(10, 0), tags("work")),
        ];

        let stats = analyze_tags(date(), &records, at(10, 45));

        assert_eq!(stats.tags[0].duration, Duration::minutes(105));
        assert!(stats.tags[0].active);
        assert_eq!(stats.total, Duration::minutes(105));
    }

    #[test]
    fn test_active_record_is_clipped_to_end_of_day() {
        let records = [Record::active(at(22, 0), tags("night"))];

        let stats = analyze_tags(date(), &records, at(22, 0) + Duration::days(2));

        assert_eq!(stats.tags[0].duration, Duration::hours(2));
        assert_eq!(stats.total, Duration::hours(2));
    }

    #[test]
    fn test_closed_record_is_split_at_midnight() {
        let records = [Record::closed(at(23, 0), at(23, 0) + Duration::hours(2), tags("night"))];
        let next = date().succ_opt().unwrap();

        let first = analyze_tags(date(), &records, at(23, 0) + Duration::days(1));
        let second = analyze_tags(next, &records, at(23, 0) + Duration::days(1));

        assert_eq!(first.total, Duration::hours(1));
        assert_eq!(second.total, Duration::hours(1));
        assert_eq!(second.tags[0].tag, "night");
    }

    #[test]
    fn test_records_of_previous_day_are_left_out() {
        let records = [Record::closed(at(8, 0), at(9, 0), tags("work"))];
        let next = date().succ_opt().unwrap();

        let stats = analyze_tags(next, &records, at(20, 0) + Duration::days(1));

        assert!(stats.tags.is_empty());
        assert!(stats.total.is_zero());
    }

    #[test]
    fn test_ties_are_alphabetical() {
        let records = [Record::closed(at(8, 0), at(9, 0), tags("b,a"))];
        let stats = analyze_tags(date(), &records, at(20, 0));
        assert_eq!(stats.tags[0].tag, "a");
        assert_eq!(stats.tags[1].tag, "b");
        assert!(!stats.tags[0].active);
    }

    #[test]
    fn test_empty_day() {
        let stats = analyze_tags(date(), &[], at(20, 0));
        assert!(stats.tags.is_empty());
        assert!(stats.total.is_zero());
    }
}
