//! Command-line interface for the extractor.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::aggregate::{daily_window, AggregateFormat};
use crate::classify::ClassifierOptions;
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::export::{export_from_source, export_tables, parse_export, ExportOptions, ExportSummary};
use crate::extract::{ProjectionConfig, TableView};
use crate::store::{BlobLocation, DirectoryStore, HttpSource};

/// Health export extractor - Convert a health-data XML export into per-kind CSV tables.
#[derive(Parser)]
#[command(name = "health-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract one CSV table per record type, workouts and activity summaries.
    Extract {
        /// Export file, or `container/key` when reading from --source-url
        input: String,

        /// Output directory (default: $HEALTH_EXPORT_OUTPUT_DIR or ./out)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Container (subdirectory) tables are published to
        #[arg(short, long)]
        container: Option<String>,

        /// YAML file with per-tag column projections
        #[arg(long, conflicts_with = "trailing")]
        projection: Option<PathBuf>,

        /// Emit record tables as activity,unit,time,starttime,endtime,value
        #[arg(long)]
        trailing: bool,

        /// Base URL of a blob store to fetch the input from
        #[arg(long)]
        source_url: Option<String>,

        /// Print tag, field and type counts after extracting
        #[arg(long)]
        stats: bool,
    },

    /// Print tag, field and type counts of an export.
    Stats {
        /// Export file
        input: PathBuf,
    },

    /// Sum a table's values per day over its last 30 days.
    Daily {
        /// Table produced by `extract`
        table: PathBuf,

        /// Output format: csv or json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            output,
            container,
            projection,
            trailing,
            source_url,
            stats,
        } => {
            let mut config = ExportConfig::from_env()?;
            if let Some(output) = output {
                config = config.with_output_dir(output);
            }
            if let Some(container) = container {
                config = config.with_container(container);
            }
            if let Some(projection) = projection {
                config = config.with_projection_path(projection);
            }
            if let Some(url) = source_url {
                config = config.with_source_url(url);
            }
            extract_command(&input, &config, trailing, stats)
        }
        Commands::Stats { input } => stats_command(&input),
        Commands::Daily { table, format } => daily_command(&table, &format),
    }
}

/// Execute the extract command.
fn extract_command(input: &str, config: &ExportConfig, trailing: bool, stats: bool) -> Result<()> {
    // Validate output directory before reading anything
    let output_dir = &config.output_dir;
    if output_dir.exists() && !output_dir.is_dir() {
        return Err(ExportError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Output path is not a directory: {}", output_dir.display()),
        )));
    }

    let view = if trailing {
        TableView::Projected(ProjectionConfig::trailing_record_columns())
    } else {
        config.table_view()?
    };
    let options = ExportOptions {
        view,
        classifier: ClassifierOptions::default(),
        retry: config.retry_policy(),
        deadline: None,
    };
    let sink = DirectoryStore::new(output_dir);

    println!(
        "{} {} into {}",
        style("Extracting").bold(),
        style(input).cyan(),
        style(output_dir.join(&config.container).display()).green()
    );
    println!();

    let pb = spinner();
    pb.set_message("Reading export...");

    let result = match &config.source_url {
        Some(url) => HttpSource::new(url.as_str()).and_then(|source| {
            let source = source.with_retry(options.retry);
            let location = BlobLocation::parse(input)?;
            export_from_source(&source, &location, &sink, &config.container, &options)
        }),
        None => read_input(Path::new(input)).and_then(|bytes| {
            pb.set_message("Extracting tables...");
            export_tables(&bytes, &sink, &config.container, &options)
        }),
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    print_summary(&summary);
    if stats {
        println!();
        print!("{}", summary.stats.report());
    }

    Ok(())
}

fn print_summary(summary: &ExportSummary) {
    for table in &summary.published {
        println!(
            "  {} {} ({} rows)",
            style("✓").green(),
            table.key,
            table.rows
        );
    }
    println!();
    println!("  Tables: {}", summary.published.len());
    println!("  Rows: {}", summary.total_rows());
    if !summary.warnings.is_empty() {
        println!(
            "  Warnings: {}",
            style(summary.warnings.len()).yellow().bold()
        );
        for warning in &summary.warnings {
            println!("    {}", style(warning).yellow());
        }
    }
}

/// Execute the stats command.
fn stats_command(input: &Path) -> Result<()> {
    let bytes = read_input(input)?;
    let classification = parse_export(&bytes, &ClassifierOptions::default())?;

    print!("{}", classification.stats.report());
    for warning in &classification.warnings {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }
    Ok(())
}

/// Execute the daily command.
fn daily_command(table: &Path, format: &str) -> Result<()> {
    let format: AggregateFormat = format.parse()?;
    let bytes = read_input(table)?;
    let totals = daily_window(&bytes)?;

    let rendered = format.render(&totals)?;
    if rendered.ends_with('\n') {
        print!("{rendered}");
    } else {
        println!("{rendered}");
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        ExportError::Io(io::Error::new(
            e.kind(),
            format!("Cannot read {}: {e}", path.display()),
        ))
    })
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_extract() {
        let cli = Cli::parse_from(["health-export", "extract", "export.xml"]);

        let Commands::Extract {
            input,
            output,
            container,
            projection,
            trailing,
            source_url,
            stats,
        } = cli.command
        else {
            panic!("expected extract");
        };
        assert_eq!(input, "export.xml");
        assert!(output.is_none());
        assert!(container.is_none());
        assert!(projection.is_none());
        assert!(!trailing);
        assert!(source_url.is_none());
        assert!(!stats);
    }

    #[test]
    fn test_cli_parse_extract_with_flags() {
        let cli = Cli::parse_from([
            "health-export",
            "extract",
            "uploads/export.xml",
            "-o",
            "/tmp/out",
            "-c",
            "user-42",
            "--trailing",
            "--source-url",
            "https://blobs.example.com",
            "--stats",
        ]);

        let Commands::Extract {
            output,
            container,
            trailing,
            source_url,
            stats,
            ..
        } = cli.command
        else {
            panic!("expected extract");
        };
        assert_eq!(output, Some(PathBuf::from("/tmp/out")));
        assert_eq!(container.as_deref(), Some("user-42"));
        assert!(trailing);
        assert_eq!(source_url.as_deref(), Some("https://blobs.example.com"));
        assert!(stats);
    }

    #[test]
    fn test_cli_projection_conflicts_with_trailing() {
        let result = Cli::try_parse_from([
            "health-export",
            "extract",
            "export.xml",
            "--trailing",
            "--projection",
            "p.yaml",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_daily_default_format() {
        let cli = Cli::parse_from(["health-export", "daily", "out/ActiveEnergyBurned.csv"]);

        let Commands::Daily { table, format } = cli.command else {
            panic!("expected daily");
        };
        assert_eq!(table, PathBuf::from("out/ActiveEnergyBurned.csv"));
        assert_eq!(format, "csv");
    }
}
