//! Value parsers for the arguments of the cli.

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use chrono_english::{parse_date_string, Dialect};

/// Parses `HH[:MM[:SS]]`. Missing minutes and seconds are zero.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    let parts = s.split(':').collect::<Vec<_>>();
    if parts.len() > 3 {
        return Err(anyhow!("Expected HH[:MM[:SS]], got {s:?}"));
    }

    let mut values = [0u32; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        if part.is_empty() || part.len() > 2 || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(anyhow!("Expected HH[:MM[:SS]], got {s:?}"));
        }
        *value = part.parse()?;
    }

    let [hour, minute, second] = values;
    NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| anyhow!("{s:?} is not a valid time of day"))
}

/// Parses `YYYY-MM-DD`, falling back to descriptions like "yesterday" or "last friday".
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_date_string(s, Local::now(), Dialect::Uk)
        .map(|v| v.date_naive())
        .map_err(|e| anyhow!("Can't parse date {s:?}, expected YYYY-MM-DD. {e}"))
}
