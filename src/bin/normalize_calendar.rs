use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cycle_calendar_service::calendar::{self, NormalizedCalendar, SkipReason};

#[derive(Parser)]
#[command(name = "normalize-calendar")]
#[command(about = "Normalize a cycle calendar spreadsheet and print the result as JSON", long_about = None)]
struct Cli {
    /// Path to the calendar spreadsheet (xlsx, xlsm, xlsb, xls or ods)
    #[arg(long, env = "CALENDAR_FILE")]
    file: PathBuf,

    /// Print a one-line summary instead of the full record set
    #[arg(long)]
    summary: bool,
}

fn skip_category(reason: &SkipReason) -> &'static str {
    match reason {
        SkipReason::MissingDate => "missing date",
        SkipReason::UnparseableDate(_) => "unparseable date",
        SkipReason::UnrecognizedType(_) => "unrecognized type",
        SkipReason::DuplicateDate(_) => "duplicate date",
    }
}

fn print_summary(calendar: &NormalizedCalendar) {
    let mut skipped: BTreeMap<&'static str, usize> = BTreeMap::new();
    for row in &calendar.skipped_rows {
        *skipped.entry(skip_category(&row.reason)).or_default() += 1;
    }

    let skipped_text = if skipped.is_empty() {
        "none".to_string()
    } else {
        skipped
            .iter()
            .map(|(reason, count)| format!("{count} {reason}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!(
        "{} days, max cycle {}, year {}, skipped: {}",
        calendar.row_count(),
        calendar.max_cycle,
        calendar.inferred_year,
        skipped_text
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Normalizing {}", cli.file.display());

    let calendar = calendar::normalize_file(&cli.file).map_err(|e| {
        error!("Failed to normalize {}: {}", cli.file.display(), e);
        e
    })?;

    if cli.summary {
        print_summary(&calendar);
    } else {
        println!("{}", serde_json::to_string_pretty(&calendar)?);
    }

    Ok(())
}
