use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub const CLI_PREFIX: &str = "cli";

/// Sets up logging into rolling files inside `application_data_path` and stderr. Warnings and
/// errors always reach stderr, since that's how failures of synchronization are reported. With
/// `verbose` everything that passes the filter is printed.
pub fn enable_logging(application_data_path: &Path, verbose: bool) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(CLI_PREFIX)
        .build(application_data_path.join("logs"))?;

    let stderr_level = if verbose {
        tracing::Level::TRACE
    } else {
        tracing::Level::WARN
    };
    let stderr = std::io::stderr.with_max_level(stderr_level);

    let level = if verbose {
        LevelFilter::TRACE.to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace("-", "_"),
        )))
        .with_ansi(false)
        .with_target(false)
        .with_writer(stderr.and(appender))
        .compact()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
