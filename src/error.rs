//! Error kinds that callers need to tell apart. Everything else travels as [anyhow::Error].

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimelogError {
    #[error("A recording is already active since {since} (recorded on {date}). Stop it first")]
    AlreadyActive {
        date: NaiveDate,
        since: DateTime<Local>,
    },

    #[error("There is no active recording")]
    NoActiveRecord,

    #[error("Invalid interval: --to {to} must be later than --from {from}")]
    InvalidInterval { from: NaiveTime, to: NaiveTime },

    #[error("Time {time} doesn't exist on {date} in the local timezone")]
    NonexistentLocalTime { date: NaiveDate, time: NaiveTime },

    #[error("Invalid record in {path:?} at line {line}: {message}")]
    CorruptDayFile {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("Invalid configuration in {path:?}: {message}")]
    Config { path: PathBuf, message: String },
}
