use anyhow::Result;
use timelog::{cli::run_cli, utils::runtime::single_thread_runtime};
use tracing::debug;

fn main() -> Result<()> {
    single_thread_runtime()?
        .block_on(run_cli())
        .inspect_err(|e| {
            debug!("Error running cli {e:?}");
        })
}
