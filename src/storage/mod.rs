//!  Storage is organized through [record_storage::RecordStorageImpl].
//!  The basic idea is:
//!   - There is a directory with all the records, possibly a git repository.
//!   - Records are stored in day files, one file per local calendar day.
//!   - A day file is always read and rewritten as a whole, see [day_log::DayLog].
//!   - A small pointer file remembers which day holds the active record.

pub mod day_log;
pub mod entities;
pub mod record_storage;
