use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::error::TimelogError;

use super::entities::{Record, TagSet};

/// Records of a single day, in the order they are stored. At most one record is active and, when
/// there is one, it's always the last.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct DayLog {
    records: Vec<Record>,
}

impl DayLog {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn active(&self) -> Option<&Record> {
        self.records.last().filter(|v| v.is_active())
    }

    fn active_mut(&mut self) -> Result<&mut Record, TimelogError> {
        self.records
            .last_mut()
            .filter(|v| v.is_active())
            .ok_or(TimelogError::NoActiveRecord)
    }

    /// Opens a new record. `date` is only used for reporting which day holds the conflicting
    /// record.
    pub fn start(
        &mut self,
        date: NaiveDate,
        now: DateTime<Utc>,
        tags: TagSet,
    ) -> Result<&Record, TimelogError> {
        if let Some(active) = self.active() {
            return Err(TimelogError::AlreadyActive {
                date,
                since: active.start.with_timezone(&Local),
            });
        }
        self.records.push(Record::active(now, tags));
        Ok(&self.records[self.records.len() - 1])
    }

    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<&Record, TimelogError> {
        let active = self.active_mut()?;
        active.set_end(now);
        Ok(active)
    }

    /// Adds a finished record. The active record, if any, is kept at the end.
    pub fn add(&mut self, record: Record) {
        let position = if self.active().is_some() {
            self.records.len() - 1
        } else {
            self.records.len()
        };
        self.records.insert(position, record);
    }

    /// Throws away the active record.
    pub fn reset(&mut self) -> Result<Record, TimelogError> {
        self.active_mut()?;
        self.records.pop().ok_or(TimelogError::NoActiveRecord)
    }

    /// Moves start of the active record to `now`, keeping its tags.
    pub fn restart(&mut self, now: DateTime<Utc>) -> Result<&Record, TimelogError> {
        let active = self.active_mut()?;
        *active = Record::active(now, active.tags.clone());
        Ok(active)
    }
}
