use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use std::{fmt::Write, path::PathBuf};

use crate::config;
use crate::domain::{
    metadata::{CompleteMetadata, Timestamp},
    window::ReleaseWindow,
};
use crate::release::{compute_progress, redact, released_segment_count};
use crate::storage::operations::MetadataStore;

#[derive(Parser)]
#[command(name = "mosaicdeck")]
#[command(version = "0.1")]
#[command(about = "Progressive release server for album mosaics")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run http server serving the album metadata
    Serve,
    /// Show release progress
    Status {
        /// Compute progress at this ISO 8601 instant instead of now
        #[arg(long, value_parser = DateTime::parse_from_rfc3339)]
        at: Option<Timestamp>,
        /// List released segments
        #[arg(short, long)]
        verbose: bool,
    },
    /// Check the stored metadata record
    Validate,
    /// Set the release window of the stored metadata record
    Schedule {
        /// Start of release period (ISO 8601 timestamp)
        #[arg(long, value_parser = DateTime::parse_from_rfc3339)]
        release_start: Timestamp,
        /// End of release period (ISO 8601 timestamp)
        #[arg(long, value_parser = DateTime::parse_from_rfc3339)]
        release_end: Timestamp,
    },
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let cfg = config::Config::load(&cli.config)?;
    let store = MetadataStore::from_config(&cfg.metadata);

    match cli.command {
        Commands::Serve => {
            // fail at startup rather than on the first request
            store.load().with_context(|| {
                format!(
                    "Failed to load metadata from {}",
                    store.path().to_string_lossy()
                )
            })?;

            if cfg.http.dev_overrides {
                log::warn!("development overrides are enabled; do not run this in production");
            }

            let http_server = crate::http::server::HttpServer::new(store, cfg.http);

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }

        Commands::Status { at, verbose } => {
            let metadata = store.load()?;
            let now = at.unwrap_or_else(|| Utc::now().fixed_offset());
            print!("{}", status_report(&metadata, now, verbose)?);
        }

        Commands::Validate => {
            let metadata = store.load()?;
            println!(
                "Metadata at {} is valid: {} tracks, {} segments, {}x{} px",
                store.path().to_string_lossy(),
                metadata.tracks.len(),
                metadata.segment_count,
                metadata.total_width,
                metadata.total_height
            );
            println!(
                "Release period: {} - {}",
                metadata.release_start, metadata.release_end
            );
        }

        Commands::Schedule {
            release_start,
            release_end,
        } => {
            let window = ReleaseWindow::new(release_start, release_end)
                .context("releaseEnd must be after releaseStart")?;
            let metadata = store.schedule(window)?;

            println!(
                "Release period: {} - {} ({})",
                metadata.release_start,
                metadata.release_end,
                human_duration(window.duration())
            );
            let interval = window.duration() / metadata.segment_count as i32;
            println!(
                "Segment release interval: {} ({} segments)",
                human_duration(interval),
                metadata.segment_count
            );
        }
    }

    Ok(())
}

/// Describes the release state of `metadata` at `now`
pub fn status_report(
    metadata: &CompleteMetadata,
    now: Timestamp,
    verbose: bool,
) -> anyhow::Result<String> {
    let progress = compute_progress(
        now,
        metadata.release_start,
        metadata.release_end,
        metadata.segment_count,
    )?;
    let released = released_segment_count(progress.percent_released, metadata.segment_count);

    let mut report = String::new();
    writeln!(report, "Status at {now}")?;
    writeln!(
        report,
        "Released {:.2}% ({} of {} segments)",
        progress.percent_released, released, metadata.segment_count
    )?;
    match progress.refresh_in_seconds {
        Some(seconds) => writeln!(
            report,
            "Next segment in {}",
            human_duration(Duration::seconds(seconds as i64))
        )?,
        None if progress.percent_released <= 0.0 => {
            writeln!(report, "Release starts {}", metadata.release_start)?
        }
        None => writeln!(report, "Release complete")?,
    }

    if verbose {
        let partial = redact(metadata, progress.percent_released);
        for numbered in partial.numbered_segments() {
            if numbered.segment.is_redacted() {
                continue;
            }
            let track = match numbered.track_name {
                Some(name) => format!("{} - {}", numbered.track_num + 1, name),
                None => format!("Track {}", numbered.track_num + 1),
            };
            writeln!(report, "  [{track}] segment {}", numbered.segment_num + 1)?;
        }
    }

    Ok(report)
}

/// Renders a duration like `7d 3h 20m`
fn human_duration(duration: Duration) -> String {
    let total_ms = duration.num_milliseconds().max(0);
    let parts = [
        (total_ms / 86_400_000, "d"),
        (total_ms / 3_600_000 % 24, "h"),
        (total_ms / 60_000 % 60, "m"),
        (total_ms / 1000 % 60, "s"),
        (total_ms % 1000, "ms"),
    ];

    let rendered: Vec<String> = parts
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if rendered.is_empty() {
        "0s".to_string()
    } else {
        rendered.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metadata::fixtures::{metadata, ts};

    #[test]
    fn test_human_duration() {
        assert_eq!(human_duration(Duration::days(7)), "7d");
        assert_eq!(human_duration(Duration::minutes(200)), "3h 20m");
        assert_eq!(human_duration(Duration::milliseconds(1500)), "1s 500ms");
        assert_eq!(human_duration(Duration::zero()), "0s");
    }

    #[test]
    fn test_status_mid_release() -> anyhow::Result<()> {
        let report = status_report(&metadata(&[84, 84]), ts("2024-01-01T12:20:00Z"), false)?;

        assert!(report.contains("Released 7.34% (12 of 168 segments)"), "{report}");
        assert!(report.contains("Next segment in 40m"), "{report}");

        Ok(())
    }

    #[test]
    fn test_status_before_and_after_release() -> anyhow::Result<()> {
        let complete = metadata(&[4]);

        let before = status_report(&complete, ts("2023-06-01T00:00:00Z"), false)?;
        let after = status_report(&complete, ts("2024-06-01T00:00:00Z"), false)?;

        assert!(before.contains("Release starts"), "{before}");
        assert!(after.contains("Release complete"), "{after}");

        Ok(())
    }

    #[test]
    fn test_status_verbose_lists_released_segments() -> anyhow::Result<()> {
        let complete = metadata(&[4, 6]);

        let report = status_report(&complete, ts("2024-01-08T00:00:00Z"), true)?;

        assert_eq!(report.matches("segment ").count(), 10);
        assert!(report.contains("[2 - Track 2] segment 6"), "{report}");

        Ok(())
    }

    #[test]
    fn test_cli_parses_schedule() {
        let cli = Cli::try_parse_from([
            "mosaicdeck",
            "--config",
            "album.toml",
            "schedule",
            "--release-start",
            "2024-01-01T00:00:00Z",
            "--release-end",
            "2024-01-08T00:00:00Z",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("album.toml"));
        assert!(matches!(
            cli.command,
            Commands::Schedule { release_start, .. } if release_start == ts("2024-01-01T00:00:00Z")
        ));
    }

    #[test]
    fn test_cli_rejects_bad_timestamp() {
        let result = Cli::try_parse_from(["mosaicdeck", "status", "--at", "tomorrow"]);

        assert!(result.is_err());
    }
}
