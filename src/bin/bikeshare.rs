//! Explore US bike-share trip data from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Statistics for all Chicago trips
//! bikeshare stats chicago
//!
//! # Only Mondays in March, as JSON
//! bikeshare stats "new york" -m mar -d mon -f json
//!
//! # The first two pages of raw Washington rows
//! bikeshare raw "washington dc" -n 2
//!
//! # The original question-and-answer session
//! bikeshare explore
//! ```

use bikeshare::conventions::TripFilter;
use bikeshare::error::TripError;
use bikeshare::loader;
use bikeshare::paginate::{batches, batches_by_name};
use bikeshare::report::{TableFormat, TripStats};
use bikeshare::shell::Shell;
use bikeshare::sources::CityRegistry;

use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "bikeshare",
    version,
    about = "Explore US bike-share trip data",
    long_about = "Explore US bike-share trip data for Chicago, New York and Washington DC.\n\n\
                  Trips can be restricted to one month (jan-jun) and/or one weekday (mon-sun)."
)]
struct Cli {
    /// Directory holding the city trip files (default: current directory)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Configuration file override (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print popular times, stations, trip durations and user information for a city
    Stats {
        #[command(flatten)]
        selection: Selection,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Page through a city's raw trip rows
    Raw {
        #[command(flatten)]
        selection: Selection,

        /// Rows per page (default: from configuration, normally 5)
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Stop after this many pages
        #[arg(short = 'n', long)]
        max_batches: Option<usize>,

        /// Columns to show (comma-separated, default: all source columns)
        #[arg(short = 'C', long, value_delimiter = ',')]
        columns: Option<Vec<String>>,
    },
    /// Answer questions interactively, as the original tool did
    Explore,
}

#[derive(Args, Debug)]
struct Selection {
    /// City name, e.g. chicago, "new york", "washington dc"
    city: String,

    /// Month code (jan..jun) or "all"
    #[arg(short, long, default_value = "all")]
    month: String,

    /// Weekday code (mon..sun) or "all"
    #[arg(short, long, default_value = "all")]
    day: String,
}

impl Selection {
    fn filter(&self) -> TripFilter {
        TripFilter::from_codes(&self.month, &self.day)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn registry_from(cli: &Cli) -> Result<CityRegistry, TripError> {
    let registry = CityRegistry::with_config(cli.config.as_deref())?;
    Ok(match cli.data_root {
        Some(ref root) => registry.with_data_root(root),
        None => registry,
    })
}

fn print_stats(registry: &CityRegistry, selection: &Selection, format: &str) -> Result<(), TripError> {
    let table_format = TableFormat::from_str(format)
        .map_err(|e| TripError::Msg(format!("{}: '{}'", e, format)))?;
    let table = loader::load(registry, &selection.city, &selection.filter())?;
    let stats = TripStats::compute(&table)?;
    println!("{}", stats.output(table_format)?);
    Ok(())
}

fn print_raw(
    registry: &CityRegistry,
    selection: &Selection,
    batch_size: Option<usize>,
    max_batches: Option<usize>,
    columns: Option<&[String]>,
) -> Result<(), TripError> {
    let table = loader::load(registry, &selection.city, &selection.filter())?;
    let batch_size = batch_size.unwrap_or(registry.raw_batch_size);
    let pages = match columns {
        Some(names) => batches_by_name(&table, batch_size, names)?,
        None => batches(&table, batch_size, &table.schema().source_columns())?,
    };

    for (page, batch) in pages.take(max_batches.unwrap_or(usize::MAX)).enumerate() {
        if page > 0 {
            println!();
        }
        for row in batch.labelled_rows() {
            for (column, value) in row {
                println!("{} : {}", column.name().to_uppercase(), value);
            }
            println!("{}", str::repeat("-", 110));
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let registry = match registry_from(&cli) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Can't set up city sources: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Stats {
            ref selection,
            ref format,
        } => print_stats(&registry, selection, format),
        Command::Raw {
            ref selection,
            batch_size,
            max_batches,
            ref columns,
        } => print_raw(
            &registry,
            selection,
            batch_size,
            max_batches,
            columns.as_deref(),
        ),
        Command::Explore => {
            let stdin = io::stdin();
            let mut shell = Shell::new(&registry, stdin.lock(), io::stdout());
            shell.run()
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
