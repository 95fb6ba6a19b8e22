//! Content-directed prefetcher trace replay CLI.
//!
//! This binary replays a recorded cache event trace through one prefetcher
//! instance. It performs:
//! 1. **Configuration:** Built-in defaults, or a JSON `CdpConfig` file.
//! 2. **Replay:** Every trace event is delivered to the matching notification hook.
//! 3. **Reporting:** Statistics as text sections or JSON, and optionally every
//!    emitted request.

use std::process;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rvsim_cdp::config::CdpConfig;
use rvsim_cdp::sim::{Replayer, load_config, load_trace};
use rvsim_cdp::stats::STATS_SECTIONS;
use rvsim_cdp::CdpPrefetcher;

#[derive(Parser, Debug)]
#[command(
    name = "cdp-replay",
    author,
    version,
    about = "Replay a cache event trace through the content-directed prefetcher",
    long_about = "Replay a JSON-lines cache event trace through the content-directed prefetcher.\n\nLog verbosity follows RUST_LOG (e.g. RUST_LOG=rvsim_cdp=debug).\n\nExamples:\n  cdp-replay --trace list_walk.jsonl\n  cdp-replay --trace list_walk.jsonl --config cdp.json --stats filter --stats accuracy\n  cdp-replay --trace list_walk.jsonl --json --emit"
)]
struct Cli {
    /// JSON-lines event trace to replay.
    #[arg(short, long)]
    trace: String,

    /// JSON prefetcher configuration (defaults when omitted).
    #[arg(short, long)]
    config: Option<String>,

    /// Statistics section to print; repeat for several (default: all).
    #[arg(long = "stats", value_parser = clap::builder::PossibleValuesParser::new(STATS_SECTIONS.iter().copied()))]
    sections: Vec<String>,

    /// Print statistics as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Print every emitted prefetch request.
    #[arg(long)]
    emit: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(msg) = run(&cli) {
        eprintln!("cdp-replay: {msg}");
        process::exit(1);
    }
}

/// Loads inputs, replays the trace, and reports.
fn run(cli: &Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => load_config(path).map_err(|e| e.to_string())?,
        None => CdpConfig::default(),
    };
    debug!(?config, "configuration loaded");
    let events = load_trace(&cli.trace).map_err(|e| e.to_string())?;
    info!(events = events.len(), trace = %cli.trace, "trace loaded");
    let byte_order = config.byte_order;
    let prefetcher = CdpPrefetcher::new(config).map_err(|e| e.to_string())?;

    let mut replayer = Replayer::new(prefetcher, byte_order).retain_issued(cli.emit);
    let summary = replayer.run(&events);

    if cli.emit {
        for req in replayer.issued() {
            println!(
                "{:#x} priority={} depth={} source={:?}",
                req.addr, req.priority, req.depth, req.source
            );
        }
    }

    let stats = replayer.prefetcher().stats();
    if cli.json {
        let text = serde_json::to_string_pretty(stats).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        println!(
            "replayed {} events, {} prefetch requests",
            summary.events, summary.requests
        );
        stats.print_sections(&cli.sections);
    }
    Ok(())
}
