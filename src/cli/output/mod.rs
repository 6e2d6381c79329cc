pub mod analysis;

use std::io::Write;

use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono::Duration;

use analysis::DayStats;

/// Marker appended to tags that are still being recorded.
const ACTIVE_MARKER: &str = "*";

pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}

fn format_hours(v: Duration) -> String {
    format!("{:.2}", v.num_seconds() as f64 / 3600.)
}

/// Prints a table with time spent per tag, followed by the total.
///
/// ```text
/// 2018-07-04
/// ==========
///
/// Tag     Time     Hours
/// work    3h0m0s   3.00
/// email*  15m0s    0.25
///
/// Total   3h15m0s  3.25
/// ```
pub fn print_stats(out: &mut impl Write, stats: &DayStats, colored: bool) -> Result<()> {
    let paint = |style: Style, text: &str| {
        if colored {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    };

    let title = stats.date.format("%Y-%m-%d").to_string();
    writeln!(out, "{}", paint(Style::new().bold(), &title))?;
    writeln!(out, "{}", "=".repeat(title.len()))?;
    writeln!(out)?;

    if stats.tags.is_empty() {
        writeln!(out, "No records")?;
        return Ok(());
    }

    let rows = stats
        .tags
        .iter()
        .map(|v| {
            let tag = if v.active {
                format!("{}{ACTIVE_MARKER}", v.tag)
            } else {
                v.tag.clone()
            };
            (tag, format_duration(v.duration), format_hours(v.duration), v.active)
        })
        .collect::<Vec<_>>();

    let total_duration = format_duration(stats.total);
    let tag_width = rows
        .iter()
        .map(|v| v.0.len())
        .chain(["Total".len()])
        .max()
        .unwrap_or_default();
    let time_width = rows
        .iter()
        .map(|v| v.1.len())
        .chain([total_duration.len(), "Time".len()])
        .max()
        .unwrap_or_default();

    let header = format!("{:tag_width$}  {:time_width$}  Hours", "Tag", "Time");
    writeln!(out, "{}", paint(Style::new().underline(), &header))?;
    for (tag, time, hours, active) in rows {
        let line = format!("{tag:tag_width$}  {time:time_width$}  {hours}");
        if active {
            writeln!(out, "{}", paint(Colour::Green.normal(), &line))?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    writeln!(out)?;
    let total = format!(
        "{:tag_width$}  {total_duration:time_width$}  {}",
        "Total",
        format_hours(stats.total)
    );
    writeln!(out, "{}", paint(Style::new().bold(), &total))?;
    Ok(())
}

pub fn print_stats_json(out: &mut impl Write, stats: &DayStats) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, stats)?;
    writeln!(out)?;
    Ok(())
}
