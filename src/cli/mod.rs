pub mod output;
pub mod parse;

use std::{
    io::{IsTerminal, Write},
    path::PathBuf,
};

use anyhow::Result;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use clap::{ArgAction, Parser, Subcommand};
use output::{format_duration, print_stats, print_stats_json};
use parse::{parse_date, parse_time_of_day};
use tracing::debug;

use crate::{
    config::Config,
    storage::{
        entities::TagSet,
        record_storage::{RecordStorage, RecordStorageImpl},
    },
    sync::{synchronized, GitSync},
    tracker::Tracker,
    utils::{clock::DefaultClock, dir::create_application_default_path, logging::enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "tl", version, disable_version_flag = true, long_about = None)]
#[command(about = "Time logging/tracking utility for the command line", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub commands: Commands,
    #[arg(short = 'v', long, action = ArgAction::Version, help = "Print version")]
    pub version: (),
    #[arg(long, global = true, help = "Print debug logs to stderr")]
    pub log: bool,
    #[arg(
        long,
        global = true,
        help = "Additional configuration file. Overrides the files found in the default locations"
    )]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, overrides_with = "no_git", help = "Synchronize records with git")]
    pub git: bool,
    #[arg(long = "no-git", global = true, overrides_with = "git", help = "Don't synchronize records with git")]
    pub no_git: bool,
}

impl Args {
    fn git_override(&self) -> Option<bool> {
        if self.git {
            Some(true)
        } else if self.no_git {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Start recording")]
    Start {
        #[arg(short, long, default_value = "default", help = "Comma separated tags, e.g. work,email")]
        tags: TagSet,
    },
    #[command(about = "Stop the active recording")]
    Stop {},
    #[command(about = "Add a finished record to a day")]
    Add {
        #[arg(short, long, default_value = "default", help = "Comma separated tags, e.g. work,email")]
        tags: TagSet,
        #[arg(short, long, value_parser = parse_date, help = "Day of the record, YYYY-MM-DD or e.g. \"yesterday\". Today by default")]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time_of_day, help = "Start of the record, in HH[:MM[:SS]]")]
        from: NaiveTime,
        #[arg(long, value_parser = parse_time_of_day, help = "End of the record, in HH[:MM[:SS]]")]
        to: NaiveTime,
    },
    #[command(about = "Show time spent per tag on a day")]
    Stats {
        #[arg(short, long, value_parser = parse_date, help = "Day to summarize, YYYY-MM-DD or e.g. \"yesterday\". Today by default")]
        date: Option<NaiveDate>,
        #[arg(long, help = "Print as json")]
        json: bool,
    },
    #[command(about = "Discard the active recording")]
    Reset {},
    #[command(about = "Start the active recording anew from now")]
    Restart {},
}

impl Commands {
    /// Whether the command changes records, and so needs to be pushed afterwards.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Commands::Stats { .. })
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = create_application_default_path()?;
    enable_logging(&app_dir, args.log)?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(enabled) = args.git_override() {
        config.git.enabled = enabled;
    }
    debug!("Running with {config:?}");

    let record_dir = config.database_directory(&app_dir);
    let tracker = Tracker::new(
        RecordStorageImpl::new(record_dir.clone())?,
        Box::new(DefaultClock),
    );
    let hook = config
        .git
        .enabled
        .then(|| GitSync::new(record_dir, &config.git));

    let mutating = args.commands.is_mutating();
    let mut stdout = std::io::stdout();
    let colored = stdout.is_terminal();
    synchronized(
        hook.as_ref(),
        mutating,
        execute(&tracker, args.commands, &mut stdout, colored),
    )
    .await
}

fn local_time(moment: DateTime<Utc>) -> String {
    moment.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Runs a single command, reporting the outcome into `out`.
pub async fn execute<R: RecordStorage>(
    tracker: &Tracker<R>,
    command: Commands,
    out: &mut impl Write,
    colored: bool,
) -> Result<()> {
    match command {
        Commands::Start { tags } => {
            let record = tracker.start(tags).await?;
            writeln!(
                out,
                "Started recording {} at {}",
                record.tags,
                local_time(record.start)
            )?;
        }
        Commands::Stop {} => {
            let record = tracker.stop().await?;
            writeln!(
                out,
                "Stopped recording {} after {}",
                record.tags,
                format_duration(record.duration().unwrap_or_else(Duration::zero))
            )?;
        }
        Commands::Add {
            tags,
            date,
            from,
            to,
        } => {
            let date = date.unwrap_or_else(|| tracker.today());
            let record = tracker.add(date, from, to, tags).await?;
            writeln!(
                out,
                "Added {} ({} - {}) to {date}",
                record.tags,
                local_time(record.start),
                record.end.map(local_time).unwrap_or_default()
            )?;
        }
        Commands::Stats { date, json } => {
            let date = date.unwrap_or_else(|| tracker.today());
            let stats = tracker.stats(date).await?;
            if json {
                print_stats_json(out, &stats)?;
            } else {
                print_stats(out, &stats, colored)?;
            }
        }
        Commands::Reset {} => {
            let record = tracker.reset().await?;
            writeln!(
                out,
                "Discarded recording {} started at {}",
                record.tags,
                local_time(record.start)
            )?;
        }
        Commands::Restart {} => {
            let record = tracker.restart().await?;
            writeln!(
                out,
                "Restarted recording {} at {}",
                record.tags,
                local_time(record.start)
            )?;
        }
    }
    Ok(())
}
