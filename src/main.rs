use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use visitlog::config::Config;
use visitlog::recorder::{PageContext, PageEnvironment, VisitRecorder};
use visitlog::report::{export_filename, ReportService};
use visitlog::storage;

#[derive(Parser)]
#[command(name = "visitlog")]
#[command(about = "Record page visits and report traffic statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a page view
    Record {
        /// Page URL, absolute or path with query (e.g. /blog?id=3)
        url: String,
        /// Referring page URL
        #[arg(long)]
        referrer: Option<String>,
        #[arg(long, default_value = "")]
        user_agent: String,
        /// Viewport as WIDTHxHEIGHT
        #[arg(long, default_value = "")]
        screen: String,
        #[arg(long, default_value = "")]
        language: String,
        /// Page load time in milliseconds
        #[arg(long, default_value_t = 0)]
        load_time: u64,
        /// Seconds spent on the page; also records the exit save
        #[arg(long)]
        stay: Option<u64>,
        /// Visit time in milliseconds since the epoch (defaults to now)
        #[arg(long)]
        at: Option<i64>,
    },
    /// Render the HTML statistics page
    Report {
        #[arg(long)]
        password: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the statistics summary as JSON
    Stats {
        #[arg(long)]
        password: String,
    },
    /// Export the raw visit log as CSV
    Export {
        #[arg(long)]
        password: String,
        /// Write to this file; "-" for stdout. Defaults to traffic_data_<date>.csv
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Drop events older than the retention window
    Prune,
    /// Delete all recorded visits
    Clear {
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries report output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let store = storage::connect(&config.storage)
        .await
        .context("failed to open visit log storage")?;

    match cli.command {
        Commands::Record {
            url,
            referrer,
            user_agent,
            screen,
            language,
            load_time,
            stay,
            at,
        } => {
            let page = PageContext {
                url,
                user_agent,
                referrer,
                screen_size: screen,
                language,
            };
            let env = Arc::new(match at {
                Some(at) => PageEnvironment::new(page, at),
                None => PageEnvironment::starting_now(page),
            });
            let recorder = VisitRecorder::new(store, env.clone(), &config.site);

            let mut session = recorder.begin();
            let mut stored = recorder.record_load(&mut session, load_time).await?;
            if let Some(seconds) = stay {
                env.advance(i64::try_from(seconds.saturating_mul(1000)).unwrap_or(i64::MAX));
                stored = recorder.record_unload(&mut session).await?;
            }

            println!("Recorded visit to {} ({} events stored)", session.event().path, stored);
        }
        Commands::Report { password, output } => {
            let service = ReportService::new(store, &config.site)?;
            let html = service.html(&password).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, html)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Report written to {}", path.display());
                }
                None => print!("{html}"),
            }
        }
        Commands::Stats { password } => {
            let service = ReportService::new(store, &config.site)?;
            println!("{}", service.json(&password).await?);
        }
        Commands::Export { password, output } => {
            let service = ReportService::new(store, &config.site)?;
            let Some(csv) = service.csv(&password).await? else {
                println!("No data to export");
                return Ok(());
            };

            let now = chrono::Utc::now().timestamp_millis();
            let path = output.unwrap_or_else(|| PathBuf::from(export_filename(now)));
            if path.as_os_str() == "-" {
                println!("{csv}");
            } else {
                tokio::fs::write(&path, csv)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Exported to {}", path.display());
            }
        }
        Commands::Prune => {
            let env = Arc::new(PageEnvironment::starting_now(PageContext::default()));
            let recorder = VisitRecorder::new(store, env, &config.site);
            let removed = recorder.prune().await?;
            println!("Removed {} expired events", removed);
        }
        Commands::Clear { password } => {
            let service = ReportService::new(store, &config.site)?;
            if service.clear(&password).await? {
                println!("All visit data cleared");
            } else {
                println!("No visit data stored");
            }
        }
    }

    Ok(())
}
