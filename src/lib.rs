//! Small command line utility for logging the time spent on tagged activities.
//! Every day is stored as a separate flat file, so the cost of a command doesn't grow with
//! history. The directory with the records can be kept in a git repository, in which case the
//! changes are pulled and pushed around every command.
//!

pub mod cli;
pub mod config;
pub mod error;
pub mod storage;
pub mod sync;
pub mod tracker;
pub mod utils;
