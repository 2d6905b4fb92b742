mod cleaner;
mod client;
mod crawler;
mod db;
mod error;
mod export;
mod parser;
mod settings;
mod table;
mod text;
mod tunnel;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use client::HttpPageSource;
use crawler::{CrawlOptions, CrawlOutcome, Crawler, PageSource};
use export::TableSink;
use settings::Settings;
use table::Table;
use tunnel::{Direct, ExpressVpn, Tunnel, TunnelSession};

#[derive(Parser)]
#[command(name = "asc_scraper", about = "Alberta Securities Commission notices & decisions scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl every result page, clean the table and write it out
    Run {
        /// Output file (.xlsx, .sqlite or .db)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Retries per failed page (0 = fail on first error)
        #[arg(long)]
        max_retries: Option<u32>,
        /// Skip the VPN tunnel
        #[arg(long)]
        no_tunnel: bool,
    },
    /// Crawl the first few pages and print the cleaned rows
    Preview {
        /// Pages to fetch
        #[arg(short = 'n', long, default_value = "1")]
        pages: usize,
        /// Skip the VPN tunnel
        #[arg(long)]
        no_tunnel: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    let result = match cli.command {
        Commands::Run {
            output,
            max_retries,
            no_tunnel,
        } => {
            if let Some(path) = output {
                settings.output = path;
            }
            if let Some(n) = max_retries {
                settings.max_retries = n;
            }
            settings.tunnel_enabled &= !no_tunnel;
            run(&settings).await
        }
        Commands::Preview { pages, no_tunnel } => {
            settings.tunnel_enabled &= !no_tunnel;
            preview(&settings, pages).await
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Full pipeline against the live site.
async fn run(settings: &Settings) -> anyhow::Result<()> {
    let sink = export::sink_for(&settings.output)?;
    let source = HttpPageSource::new(settings.request_timeout())
        .context("Failed to build HTTP client")?;
    run_with(
        source,
        tunnel_for(settings),
        sink.as_ref(),
        &settings.output,
        settings.crawl_options(),
        settings.tunnel_settle(),
    )
    .await
}

/// Crawl, clean and write behind `tunnel`. The tunnel is held until the sink
/// has finished and is released on every exit path. A failed write is logged
/// and the run still succeeds.
async fn run_with<S: PageSource, T: Tunnel + 'static>(
    source: S,
    tunnel: T,
    sink: &dyn TableSink,
    output: &Path,
    options: CrawlOptions,
    settle: Duration,
) -> anyhow::Result<()> {
    let _session = TunnelSession::open(tunnel, settle)
        .await
        .context("Failed to connect tunnel")?;

    let outcome = Crawler::new(source, options).run().await;
    report(&outcome);

    let table = cleaner::clean_rows(&outcome.rows);
    println!(
        "Cleaned table: {} rows x {} columns",
        table.len(),
        table.columns().len()
    );

    match export::export(sink, &table, output) {
        Ok(()) => println!("Saved {}", output.display()),
        Err(e) => error!("Failed to write {}: {}", output.display(), e),
    }
    Ok(())
}

async fn preview(settings: &Settings, pages: usize) -> anyhow::Result<()> {
    let _session = open_tunnel(settings).await?;

    let options = CrawlOptions {
        max_pages: Some(pages.max(1)),
        ..settings.crawl_options()
    };
    let outcome = crawl(settings, options).await?;
    report(&outcome);

    let table = cleaner::clean_rows(&outcome.rows);
    if table.is_empty() {
        println!("No results.");
        return Ok(());
    }
    print_table(&table);
    Ok(())
}

fn tunnel_for(settings: &Settings) -> Box<dyn Tunnel> {
    if settings.tunnel_enabled {
        info!("Connecting tunnel ({})", settings.tunnel_location);
        Box::new(ExpressVpn::new(settings.tunnel_location.clone()))
    } else {
        Box::new(Direct)
    }
}

async fn open_tunnel(settings: &Settings) -> anyhow::Result<TunnelSession<Box<dyn Tunnel>>> {
    TunnelSession::open(tunnel_for(settings), settings.tunnel_settle())
        .await
        .context("Failed to connect tunnel")
}

async fn crawl(settings: &Settings, options: CrawlOptions) -> anyhow::Result<CrawlOutcome> {
    let source = HttpPageSource::new(settings.request_timeout())
        .context("Failed to build HTTP client")?;
    Ok(Crawler::new(source, options).run().await)
}

fn report(outcome: &CrawlOutcome) {
    println!(
        "Fetched {} pages, {} records (server reports {})",
        outcome.pages,
        outcome.rows.len(),
        outcome.total_count
    );
    if outcome.is_complete() {
        return;
    }
    if let Some(e) = &outcome.aborted {
        warn!("Crawl incomplete, keeping partial results: {}", e);
        println!("Crawl stopped early: {}", e);
    }
}

fn print_table(table: &Table) {
    println!(
        "{:>3} | {:<10} | {:<24} | {:<32} | {:<24}",
        "#", "Date", "Type", "Title", "Alias"
    );
    println!("{}", "-".repeat(105));

    for i in 0..table.len() {
        let cell = |name: &str| table.get(i, name).unwrap_or("");
        println!(
            "{:>3} | {:<10} | {:<24} | {:<32} | {:<24}",
            i + 1,
            cell("date"),
            truncate(cell("type"), 24),
            truncate(cell("title"), 32),
            truncate(cell("alias"), 24),
        );
    }

    println!("\n{} rows | {} columns", table.len(), table.columns().len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler::testing::{page, ScriptedSource};
    use error::SinkError;
    use std::sync::{Arc, Mutex};
    use tunnel::testing::FakeTunnel;

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    /// Logs the write into the shared call log, then fails or keeps the table.
    struct LoggingSink {
        log: CallLog,
        fail: bool,
        written: Mutex<Option<Table>>,
    }

    impl LoggingSink {
        fn new(log: CallLog, fail: bool) -> Self {
            Self {
                log,
                fail,
                written: Mutex::new(None),
            }
        }
    }

    impl TableSink for LoggingSink {
        fn write(&self, table: &Table, _path: &Path) -> Result<(), SinkError> {
            self.log.lock().unwrap().push("sink-write");
            if self.fail {
                return Err(SinkError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only volume",
                )));
            }
            *self.written.lock().unwrap() = Some(table.clone());
            Ok(())
        }
    }

    fn options() -> CrawlOptions {
        CrawlOptions {
            date_zone: parser::extract::DateZone::Utc,
            ..CrawlOptions::default()
        }
    }

    #[tokio::test]
    async fn failed_write_is_logged_and_tunnel_released_after_it() {
        let log = CallLog::default();
        let source = ScriptedSource::new(vec![page(3, 3)]);
        let sink = LoggingSink::new(log.clone(), true);

        let result = run_with(
            &source,
            FakeTunnel::with_log(log.clone()),
            &sink,
            Path::new("asc_ca.xlsx"),
            options(),
            Duration::ZERO,
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["connect", "sink-write", "disconnect"]);
    }

    #[tokio::test]
    async fn cleaned_rows_reach_the_sink() {
        let log = CallLog::default();
        let source = ScriptedSource::new(vec![page(13, 10), page(13, 3)]);
        let sink = LoggingSink::new(log.clone(), false);

        run_with(
            &source,
            FakeTunnel::with_log(log.clone()),
            &sink,
            Path::new("asc_ca.xlsx"),
            options(),
            Duration::ZERO,
        )
        .await
        .unwrap();

        assert_eq!(source.offsets(), vec![0, 10]);
        let table = sink.written.lock().unwrap().take().unwrap();
        assert_eq!(table.len(), 13);
        assert_eq!(&table.columns()[..2], ["url", "title"]);
        assert_eq!(*log.lock().unwrap(), vec!["connect", "sink-write", "disconnect"]);
    }

    #[tokio::test]
    async fn unreachable_tunnel_stops_before_any_request() {
        let source = ScriptedSource::new(vec![page(3, 3)]);
        let tunnel = FakeTunnel::unreachable();
        let sink = LoggingSink::new(CallLog::default(), false);

        let result = run_with(
            &source,
            tunnel.clone(),
            &sink,
            Path::new("asc_ca.xlsx"),
            options(),
            Duration::ZERO,
        )
        .await;

        assert!(result.is_err());
        assert!(source.offsets().is_empty());
        assert_eq!(tunnel.calls(), vec!["connect"]);
        assert!(sink.written.lock().unwrap().is_none());
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("Résumé", 6), "Résumé");
        assert_eq!(truncate("Northern Resources", 8), "Northern...");
    }
}
