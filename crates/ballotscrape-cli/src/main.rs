use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use ballotscrape::insights::{majority_threshold, total_seats};
use ballotscrape::legacy::{self, RawConstituencyResult};
use ballotscrape::types::DatasetStats;
use ballotscrape::{ParsedTable, Pipeline, RowSkip, ScraperConfig, WebScraper};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "ballotscrape")]
#[command(about = "An election results scraper and insight generator", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Base URL that party detail links are resolved against"
    )]
    base_url: Option<String>,

    #[arg(
        long,
        global = true,
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Per-request timeout in seconds"
    )]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List every party in the results summary table with its seat counts
    Parties {
        #[arg(
            long,
            default_value = "index.htm",
            help = "Path or URL of the party summary page"
        )]
        summary: String,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Fetch the winning candidates listed on one party's detail page
    Candidates {
        #[arg(help = "Detail link of the party, relative to the base URL or absolute")]
        link: String,

        #[arg(long, help = "Party name recorded on each candidate")]
        party: String,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Scrape every party and candidate, then print all seat and vote insights
    Insights {
        #[arg(
            long,
            default_value = "index.htm",
            help = "Path or URL of the party summary page"
        )]
        summary: String,

        #[arg(long, help = "Also write the text insights to this file")]
        output_file: Option<PathBuf>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Analyse a JSON export of per-candidate constituency rows, sorted by constituency then votes
    Legacy {
        #[arg(help = "JSON file holding an array of {constituency, candidate, party, votes}")]
        input: PathBuf,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn print_skipped(skipped: &[RowSkip]) {
    if skipped.is_empty() {
        return;
    }
    println!("\nSkipped rows:");
    for skip in skipped {
        println!("  row {}: {}", skip.row, skip.reason);
    }
}

fn build_scraper(base_url: Option<String>, timeout_secs: u64) -> WebScraper {
    let mut config = ScraperConfig {
        timeout: Duration::from_secs(timeout_secs),
        ..Default::default()
    };
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }

    WebScraper::with_config(config).unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Parties { summary, format } => {
            let scraper = build_scraper(cli.base_url, cli.timeout_secs);

            let table = scraper
                .fetch_party_summary(&summary)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching party summary: {}", e);
                    process::exit(1);
                });
            let parties = &table.records;

            match format {
                OutputFormat::Json => serialize_json(&table),
                OutputFormat::Text => {
                    if parties.is_empty() {
                        println!("No entries to display.");
                    } else {
                        for (i, party) in parties.iter().enumerate() {
                            println!("{:>3}. {}", i + 1, party);
                        }
                        print_skipped(&table.skipped);
                        println!(
                            "\nTotal seats: {} (majority: {})",
                            total_seats(parties),
                            majority_threshold(parties)
                        );
                    }
                }
            }
        }

        Commands::Candidates {
            link,
            party,
            format,
        } => {
            let scraper = build_scraper(cli.base_url, cli.timeout_secs);

            let fetch = scraper.fetch_candidates(&link, &party).await;
            let skipped = fetch.skipped().to_vec();
            let candidates = fetch.into_records();

            match format {
                OutputFormat::Json => serialize_json(&ParsedTable {
                    records: candidates,
                    skipped,
                }),
                OutputFormat::Text => {
                    if candidates.is_empty() {
                        println!("No entries to display.");
                    }
                    for (i, candidate) in candidates.iter().enumerate() {
                        println!("{:>3}. {}", i + 1, candidate);
                    }
                    print_skipped(&skipped);
                }
            }
        }

        Commands::Insights {
            summary,
            output_file,
            format,
        } => {
            let scraper = build_scraper(cli.base_url, cli.timeout_secs);
            let pipeline = Pipeline::new(scraper).with_summary_path(&summary);

            let ct = CancellationToken::new();
            let signal_ct = ct.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupt received, finishing after the current party...");
                    signal_ct.cancel();
                }
            });

            let output = pipeline.run(&ct).await.unwrap_or_else(|e| {
                log::error!("Error fetching party summary: {}", e);
                process::exit(1);
            });

            for diagnostic in &output.report.diagnostics {
                log::warn!("{}", diagnostic);
            }

            if let Some(path) = &output_file {
                let written = File::create(path).and_then(|file| {
                    let mut writer = BufWriter::new(file);
                    output.report.write_text(&mut writer)?;
                    writer.flush()
                });
                match written {
                    Ok(()) => log::info!("Insights written to {}", path.display()),
                    Err(e) => log::error!("Error writing {}: {}", path.display(), e),
                }
            }

            match format {
                OutputFormat::Json => serialize_json(&output),
                OutputFormat::Text => {
                    print!("{}", output.report.to_text());
                    print!("{}", DatasetStats::from_dataset(&output.dataset));
                    println!("  Failed parties:          {}", output.failures.len());
                    println!("  Skipped rows:            {}", output.skipped_rows());
                }
            }
        }

        Commands::Legacy { input, format } => {
            let contents = fs::read_to_string(&input).unwrap_or_else(|e| {
                log::error!("Error reading {}: {}", input.display(), e);
                process::exit(1);
            });

            let raw: Vec<RawConstituencyResult> =
                serde_json::from_str(&contents).unwrap_or_else(|e| {
                    log::error!("Error parsing {}: {}", input.display(), e);
                    process::exit(1);
                });

            let rows = legacy::clean_rows(raw).unwrap_or_else(|e| {
                log::error!("Invalid row in {}: {}", input.display(), e);
                process::exit(1);
            });

            let insights = legacy::analyze(&rows).unwrap_or_else(|e| {
                log::error!("Error analysing {}: {}", input.display(), e);
                process::exit(1);
            });

            match format {
                OutputFormat::Json => serialize_json(&insights),
                OutputFormat::Text => println!("{}", insights),
            }
        }
    }
}
