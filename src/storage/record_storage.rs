use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{error::TimelogError, utils::time::date_to_record_name};

use super::{day_log::DayLog, entities::Record};

/// Name of the file pointing to the day file with the active record.
pub const ACTIVE_POINTER_NAME: &str = ".active";

/// Interface for abstracting storage of records.
pub trait RecordStorage {
    /// Reads all records of a day. A day without a file is empty.
    fn load(&self, date: NaiveDate) -> impl Future<Output = Result<DayLog>>;

    /// Replaces the records of a day with `log`.
    fn save(&self, date: NaiveDate, log: &DayLog) -> impl Future<Output = Result<()>>;

    /// Date of the day file that holds the active record, if one was started.
    fn active_date(&self) -> impl Future<Output = Result<Option<NaiveDate>>>;

    /// Updates (or with [None] removes) the pointer to the day with the active record.
    fn set_active_date(&self, date: Option<NaiveDate>) -> impl Future<Output = Result<()>>;
}

/// The main realization of [RecordStorage]. Every day is a csv file without a header inside
/// `record_dir`.
pub struct RecordStorageImpl {
    record_dir: PathBuf,
}

impl RecordStorageImpl {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.record_dir.join(date_to_record_name(date))
    }

    fn pointer_path(&self) -> PathBuf {
        self.record_dir.join(ACTIVE_POINTER_NAME)
    }

    /// Writes next to `path` first, so an interrupted write doesn't leave a half written file
    /// behind.
    async fn replace_file(path: &Path, content: &[u8]) -> Result<()> {
        let temporary = path.with_extension("tmp");
        tokio::fs::write(&temporary, content).await?;
        tokio::fs::rename(&temporary, path).await?;
        Ok(())
    }
}

impl RecordStorage for RecordStorageImpl {
    async fn load(&self, date: NaiveDate) -> Result<DayLog> {
        let path = self.path_for(date);
        debug!("Extracting {path:?}");
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(decode_day(&path, &content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(DayLog::default()),
            Err(e) => Err(e)?,
        }
    }

    async fn save(&self, date: NaiveDate, log: &DayLog) -> Result<()> {
        let path = self.path_for(date);
        let content = encode_day(log)?;
        Self::replace_file(&path, &content).await?;
        debug!("Wrote {} records to {path:?}", log.records().len());
        Ok(())
    }

    async fn active_date(&self) -> Result<Option<NaiveDate>> {
        let path = self.pointer_path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => Err(e)?,
        };
        match NaiveDate::parse_from_str(content.trim(), "%Y-%m-%d") {
            Ok(date) => Ok(Some(date)),
            Err(e) => {
                // The pointer is only a shortcut, today's file is still checked without it.
                warn!("Ignoring unreadable active pointer {path:?} {content:?}: {e}");
                Ok(None)
            }
        }
    }

    async fn set_active_date(&self, date: Option<NaiveDate>) -> Result<()> {
        let path = self.pointer_path();
        match date {
            Some(date) => {
                Self::replace_file(&path, format!("{}\n", date.format("%Y-%m-%d")).as_bytes())
                    .await
            }
            None => match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e)?,
            },
        }
    }
}

/// Parses a day file. Unlike the writer this fails on the first broken line: the whole day gets
/// rewritten on the next change, so skipping it would silently lose data.
fn decode_day(path: &Path, content: &[u8]) -> Result<DayLog, TimelogError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(content);

    let mut records = vec![];
    for (index, row) in reader.deserialize::<Record>().enumerate() {
        let record = row.map_err(|e| TimelogError::CorruptDayFile {
            path: path.to_owned(),
            line: e.position().map_or(index as u64 + 1, |v| v.line()),
            message: e.to_string(),
        })?;
        if let Some(end) = record.end.filter(|end| *end < record.start) {
            return Err(TimelogError::CorruptDayFile {
                path: path.to_owned(),
                line: index as u64 + 1,
                message: format!("record ends at {end} before it starts at {}", record.start),
            });
        }
        records.push(record);
    }
    Ok(DayLog::new(records))
}

fn encode_day(log: &DayLog) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    for record in log.records() {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush records: {}", e.error()))
}
