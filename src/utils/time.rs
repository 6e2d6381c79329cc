use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

/// Extension of the files containing records of a day.
pub const RECORD_EXTENSION: &str = "csv";

/// This is the standard way of converting a date to a file name in timelog.
pub fn date_to_record_name(date: NaiveDate) -> String {
    format!("{}.{RECORD_EXTENSION}", date.format("%Y-%m-%d"))
}

/// Calendar date of a moment, as seen by the user.
pub fn local_date(moment: DateTime<Utc>) -> NaiveDate {
    moment.with_timezone(&Local).date_naive()
}

/// Converts a wall clock time on a date into an instant. Returns [None] if the time doesn't exist
/// on that date, which happens when clocks are moved forward. Ambiguous times resolve to the
/// earlier instant.
pub fn local_moment(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    moment_in(&Local, date, time)
}

/// [local_moment] for any time zone.
pub fn moment_in<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|v| v.with_timezone(&Utc))
}

/// First moment of `date` in the local time zone.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    day_start_in(&Local, date)
}

/// [day_start] for any time zone. If midnight is skipped by a clock change, the day starts at the
/// change.
pub fn day_start_in<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    moment_in(tz, date, NaiveTime::MIN).unwrap_or_else(|| {
        let before = tz
            .offset_from_utc_datetime(&(midnight - Duration::days(1)))
            .fix();
        Utc.from_utc_datetime(&(midnight - Duration::seconds(before.local_minus_utc().into())))
    })
}
