use clap::{Parser, Subcommand};
use lib::{
    DatasetConfig, Result, SimpleLogger, UnitReport, UnitStatus, anomaly, archive, load,
    microclimate, normalize, report, season, trend,
};
use log::debug;
use std::path::{Path, PathBuf};
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about = "Weather dataset preparation commands", long_about = None)]
struct Cli {
    /// Base directory containing the per-city open-meteo exports
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Also write the produced rows as a JSON file next to the CSV
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Log level for output
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge per-city exports into one wide weather report
    Report {
        #[arg(short, long, default_value = "weather_output.csv")]
        output: PathBuf,
    },
    /// Compute per-city seasonal temperature/precipitation averages
    Seasons {
        #[arg(short, long, default_value = "season.csv")]
        output: PathBuf,
    },
    /// Fit the long-term temperature trend of every city
    Trend {
        #[arg(short, long, default_value = "climate_trend_analysis.csv")]
        output: PathBuf,
    },
    /// Classify every city's microclimate from its observation history
    Microclimate {
        #[arg(short, long, default_value = "microclima.csv")]
        output: PathBuf,
    },
    /// Generate a synthetic anomaly-events dataset
    Anomalies {
        #[arg(short, long, default_value = "anomaly.csv")]
        output: PathBuf,

        /// Where the per-source-file summary is written
        #[arg(long, default_value = "loaded_files.csv")]
        files_output: PathBuf,
    },
    /// Merge the yearly/monthly station archive into one clean file
    Archive {
        /// Directory holding the year subdirectories
        #[arg(long)]
        archive_dir: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rewrite anomaly detection dates as ISO 8601 plus a date-time column
    Normalize {
        /// Anomaly CSV produced by the generator
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "anomaly_normalized.csv")]
        output: PathBuf,
    },
    /// Append station codes to a merged weather report
    CityCodes {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "report_with_codes.csv")]
        output: PathBuf,
    },
    /// Keep only report rows inside an inclusive year range
    Filter {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "report_filtered.csv")]
        output: PathBuf,

        #[arg(long, default_value_t = 2010)]
        start_year: i32,

        #[arg(long, default_value_t = 2025)]
        end_year: i32,
    },
}

fn main() -> Result<()> {
    let total_start = Instant::now();
    log::set_logger(&LOGGER).unwrap();

    // Acquire CLI args
    let cli = Cli::parse();
    if cli.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    let mut cfg = DatasetConfig::default();
    if let Some(dir) = cli.base_dir {
        cfg.base_dir = dir;
    }

    println!("Weather Dataset Preparation Pipeline");
    debug!("Base directory: {}", cfg.base_dir.display());

    match cli.command {
        Command::Report { output } => {
            println!("Merging per-city exports...");
            let out = report::run(&cfg.base_dir)?;
            print_units(&out.units);
            load::write_report_csv(&out.rows, &output)?;
            maybe_json(cli.json, &out.rows, &output)?;
            println!("Wrote {} rows to {}", out.rows.len(), output.display());
        }
        Command::Seasons { output } => {
            println!("Computing seasonal aggregates...");
            let out = season::run(&cfg);
            print_units(&out.units);
            load::write_seasonal_csv(&out.rows, &output)?;
            maybe_json(cli.json, &out.rows, &output)?;
            println!("Wrote {} rows to {}", out.rows.len(), output.display());
        }
        Command::Trend { output } => {
            println!("Estimating climate trends...");
            let out = trend::run(&cfg);
            print_units(&out.units);
            load::write_trend_csv(&out.rows, &output)?;
            maybe_json(cli.json, &out.rows, &output)?;
            println!("Wrote {} rows to {}", out.rows.len(), output.display());
        }
        Command::Microclimate { output } => {
            println!("Classifying microclimates...");
            let out = microclimate::run(&cfg);
            print_units(&out.units);
            load::write_microclimate_csv(&out.rows, &output)?;
            maybe_json(cli.json, &out.rows, &output)?;
            println!("Wrote {} rows to {}", out.rows.len(), output.display());
        }
        Command::Anomalies {
            output,
            files_output,
        } => {
            println!("Generating synthetic anomaly events...");
            let mut rng = rand::rng();
            let run = anomaly::run(&cfg, &mut rng);
            print_units(&run.units);
            load::write_anomaly_csv(&run.events, &output)?;
            load::write_loaded_files_csv(&run.files, &files_output)?;
            maybe_json(cli.json, &run.events, &output)?;
            println!("Wrote {} events to {}", run.events.len(), output.display());
            println!("Wrote source summary to {}", files_output.display());
        }
        Command::Archive {
            archive_dir,
            output,
        } => {
            if let Some(dir) = archive_dir {
                cfg.set_archive_dir(dir);
            }
            let output = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "{}_{}_{}_clean.csv",
                    cfg.archive_station, cfg.archive_years.0, cfg.archive_years.1
                ))
            });
            println!("Merging station archive from {}...", cfg.archive_dir.display());
            let out = archive::run(&cfg)?;
            print_units(&out.units);
            load::write_archive_csv(&out.rows, &output)?;
            maybe_json(cli.json, &out.rows, &output)?;
            println!("Wrote {} rows to {}", out.rows.len(), output.display());
        }
        Command::Normalize { input, output } => {
            println!("Normalizing anomaly dates from {}...", input.display());
            let rows = normalize::normalize_anomalies(&input)?;
            load::write_normalized_csv(&rows, &output)?;
            maybe_json(cli.json, &rows, &output)?;
            println!("Wrote {} rows to {}", rows.len(), output.display());
        }
        Command::CityCodes { input, output } => {
            println!("Appending city codes to {}...", input.display());
            let written = report::append_city_codes(&input, &output)?;
            println!("Wrote {} rows to {}", written, output.display());
        }
        Command::Filter {
            input,
            output,
            start_year,
            end_year,
        } => {
            println!(
                "Filtering {} to years {start_year}-{end_year}...",
                input.display()
            );
            let written = report::filter_report_years(&input, &output, (start_year, end_year))?;
            println!("Wrote {} rows to {}", written, output.display());
        }
    }

    println!("Completed in {:.2?}", total_start.elapsed());
    Ok(())
}

/// One line per skipped unit, then the processed/skipped tally. The run
/// itself never aborts on a skipped unit.
fn print_units(units: &[UnitReport]) {
    let skipped = units.iter().filter(|u| u.is_skipped()).count();
    for unit in units {
        match &unit.status {
            UnitStatus::Processed { rows } => debug!("{}: {} rows", unit.unit, rows),
            UnitStatus::Skipped { reason } => println!("  skipped {}: {}", unit.unit, reason),
        }
    }
    println!("{} units processed, {} skipped", units.len() - skipped, skipped);
}

fn maybe_json<T: serde::Serialize>(enabled: bool, rows: &[T], csv_path: &Path) -> Result<()> {
    if !enabled {
        return Ok(());
    }
    let json_path = csv_path.with_extension("json");
    load::write_json(rows, &json_path)?;
    debug!("JSON sidecar: {}", json_path.display());
    Ok(())
}
