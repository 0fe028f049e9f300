use anyhow::Context;
use clap::Parser;
use mapscraper::{
    ChromiumLauncher, Controller, DiscoveryMode, RegionConfig, SessionConfig, SessionEvent,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Looks up every company in INPUT on the map application and writes what it
/// finds to empresas_info.xlsx next to the input file.
#[derive(Parser, Debug)]
#[command(name = "mapscraper", version, about)]
struct Args {
    /// Text file with one company name per line
    input: PathBuf,

    /// JSON file overriding the default settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// How related businesses are discovered
    #[arg(long, value_enum)]
    discovery: Option<DiscoveryMode>,

    /// Region a listing's address must mention
    #[arg(long)]
    region: Option<String>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Open the spreadsheet when the run ends
    #[arg(long)]
    open: bool,

    /// Print progress as one JSON object per line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("chromiumoxide", log::LevelFilter::Warn)
        .filter_module("tungstenite", log::LevelFilter::Warn)
        .filter_module("selectors", log::LevelFilter::Warn)
        .filter_module("html5ever", log::LevelFilter::Error)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(mode) = args.discovery {
        config = config.with_discovery(mode);
    }
    if let Some(region) = &args.region {
        config = config.with_region(RegionConfig::named(region));
    }
    if args.headless {
        config = config.with_headless(true);
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<SessionEvent>();
    let json = args.json;
    let printer = tokio::spawn(async move {
        let mut total = 0;
        let mut done = 0;
        while let Some(event) = rx.recv().await {
            if json {
                match event.to_json_line() {
                    Ok(line) => println!("{}", line),
                    Err(e) => log::warn!("Could not render event: {}", e),
                }
                continue;
            }
            match event {
                SessionEvent::Started { total: t } => {
                    total = t;
                    println!("Processing {} companies", total);
                }
                SessionEvent::Progress { rows, term, outcome } => {
                    done += 1;
                    let percent = if total == 0 { 100 } else { done * 100 / total };
                    println!("[{:>3}%] {} -> {} ({} rows)", percent, term, outcome, rows);
                }
                SessionEvent::Done { rows, stopped } => {
                    let verb = if stopped { "Stopped" } else { "Finished" };
                    println!("{} with {} rows written", verb, rows);
                }
            }
        }
    });

    let mut controller =
        Controller::new(config, Arc::new(ChromiumLauncher)).with_events(tx);
    controller.select_input(&args.input)?;
    let output = controller.output_path();

    if !controller.start()? {
        anyhow::bail!("the run could not be started");
    }

    if let Some(stop) = controller.stop_handle() {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                println!("Stopping after the current company...");
                stop.request_stop();
            }
        });
    }

    let summary = controller.wait().await?;
    if args.open {
        controller.open_output()?;
    }
    drop(controller);
    printer.await.context("progress printer failed")?;

    if let (Some(summary), Some(output)) = (summary, output) {
        println!(
            "{} of {} companies processed, spreadsheet at {}",
            summary.processed,
            summary.stats.terms_total,
            output.display()
        );
    }

    Ok(())
}
