use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime};
use tracing::{debug, info, instrument, warn};

use crate::{
    cli::output::analysis::{analyze_tags, DayStats},
    error::TimelogError,
    storage::{
        day_log::DayLog,
        entities::{Record, TagSet},
        record_storage::RecordStorage,
    },
    utils::{
        clock::Clock,
        time::{local_date, local_moment},
    },
};

/// Day file holding the active record, together with its content.
struct ActiveDay {
    date: NaiveDate,
    log: DayLog,
}

/// Implements every command on top of a [RecordStorage]. Bridges the records of separate days
/// through the active pointer of the storage.
pub struct Tracker<R: RecordStorage> {
    storage: R,
    clock: Box<dyn Clock>,
}

impl<R: RecordStorage> Tracker<R> {
    pub fn new(storage: R, clock: Box<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn today(&self) -> NaiveDate {
        local_date(self.clock.time())
    }

    /// The pointer is checked first, so a recording started before midnight can still be found.
    /// Today's file is the fallback for files that were edited or synchronized without the
    /// pointer.
    async fn find_active(&self) -> Result<Option<ActiveDay>> {
        let today = self.today();
        let pointed = self.storage.active_date().await?;
        let candidates = pointed
            .into_iter()
            .chain((pointed != Some(today)).then_some(today));

        for date in candidates {
            let log = self.storage.load(date).await?;
            if log.active().is_some() {
                return Ok(Some(ActiveDay { date, log }));
            }
            if Some(date) == pointed {
                warn!("Active pointer refers to {date}, which has no active record");
            }
        }
        Ok(None)
    }

    #[instrument(skip(self))]
    pub async fn start(&self, tags: TagSet) -> Result<Record> {
        if let Some(ActiveDay { date, log }) = self.find_active().await? {
            if let Some(active) = log.active() {
                return Err(TimelogError::AlreadyActive {
                    date,
                    since: active.start.with_timezone(&Local),
                }
                .into());
            }
        }

        let now = self.clock.time();
        let today = local_date(now);
        let mut log = self.storage.load(today).await?;
        let record = log.start(today, now, tags)?.clone();
        self.storage.save(today, &log).await?;
        self.storage.set_active_date(Some(today)).await?;
        info!("Started recording {} at {}", record.tags, record.start);
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<Record> {
        let Some(ActiveDay { date, mut log }) = self.find_active().await? else {
            return Err(TimelogError::NoActiveRecord.into());
        };

        let record = log.stop(self.clock.time())?.clone();
        self.storage.save(date, &log).await?;
        self.storage.set_active_date(None).await?;
        info!("Stopped recording {} started on {date}", record.tags);
        Ok(record)
    }

    /// Adds a finished record to `date`, regardless of whether something is being recorded.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        date: NaiveDate,
        from: NaiveTime,
        to: NaiveTime,
        tags: TagSet,
    ) -> Result<Record> {
        if to <= from {
            return Err(TimelogError::InvalidInterval { from, to }.into());
        }
        let start = local_moment(date, from)
            .ok_or(TimelogError::NonexistentLocalTime { date, time: from })?;
        let end =
            local_moment(date, to).ok_or(TimelogError::NonexistentLocalTime { date, time: to })?;

        let record = Record::closed(start, end, tags);
        let mut log = self.storage.load(date).await?;
        log.add(record.clone());
        self.storage.save(date, &log).await?;
        info!("Added {} to {date}", record.tags);
        Ok(record)
    }

    /// Discards the active record.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<Record> {
        let Some(ActiveDay { date, mut log }) = self.find_active().await? else {
            return Err(TimelogError::NoActiveRecord.into());
        };

        let record = log.reset()?;
        self.storage.save(date, &log).await?;
        self.storage.set_active_date(None).await?;
        info!("Discarded recording {} started on {date}", record.tags);
        Ok(record)
    }

    /// Starts the active record anew at the current time. A record started on a previous day is
    /// moved into today's file.
    #[instrument(skip(self))]
    pub async fn restart(&self) -> Result<Record> {
        let Some(ActiveDay { date, mut log }) = self.find_active().await? else {
            return Err(TimelogError::NoActiveRecord.into());
        };

        let now = self.clock.time();
        let today = local_date(now);
        let record = if date == today {
            let record = log.restart(now)?.clone();
            self.storage.save(date, &log).await?;
            record
        } else {
            debug!("Moving active record from {date} to {today}");
            let previous = log.reset()?;
            // Nothing is written until today's file accepts the record.
            let mut today_log = self.storage.load(today).await?;
            let record = today_log.start(today, now, previous.tags)?.clone();
            self.storage.save(today, &today_log).await?;
            self.storage.save(date, &log).await?;
            record
        };
        self.storage.set_active_date(Some(today)).await?;
        info!("Restarted recording {} at {}", record.tags, record.start);
        Ok(record)
    }

    /// Time spent on `date`. Records of the previous day count with the part past midnight.
    pub async fn stats(&self, date: NaiveDate) -> Result<DayStats> {
        let mut records = match date.pred_opt() {
            Some(previous) => self.storage.load(previous).await?.records().to_vec(),
            None => vec![],
        };
        records.extend_from_slice(self.storage.load(date).await?.records());
        Ok(analyze_tags(date, &records, self.clock.time()))
    }
}
