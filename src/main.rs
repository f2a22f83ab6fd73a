//! media-sweep main entry point
//!
//! This is the command-line front end: it builds a crawl configuration from a
//! TOML file and flags, starts the crawl, prints its status events, and turns
//! Ctrl-C into a cooperative stop.

use anyhow::{bail, Context};
use clap::Parser;
use media_sweep::config::{
    parse_extensions, parse_list, read_config, Config, RendererKind, DEFAULT_EXTENSIONS,
    DEFAULT_NEXT_PATTERNS,
};
use media_sweep::crawler::{ManualGate, StopSignal};
use media_sweep::output::{CrawlEvent, LinkTally, Severity};
use media_sweep::Controller;
use std::io::BufRead;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// media-sweep: harvest media links from a paginated website
///
/// Starting from a URL, media-sweep renders each page, collects links to files
/// with the requested extensions, follows the next-page link and appends every
/// new link to a text file.
#[derive(Parser, Debug)]
#[command(name = "media-sweep")]
#[command(version)]
#[command(about = "Harvest media links from a paginated website", long_about = None)]
struct Cli {
    /// Page to start from
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Comma-separated file extensions, dot optional
    #[arg(short, long, value_name = "LIST")]
    extensions: Option<String>,

    /// Comma-separated next-page text patterns, in priority order
    #[arg(short, long, value_name = "LIST")]
    next: Option<String>,

    /// File new links are appended to
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    visible: bool,

    /// Pause on the first page until confirmed (for CAPTCHAs and logins)
    #[arg(long)]
    manual: bool,

    /// Stop after this many pages (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Renderer backend: http or chrome
    #[arg(long, value_name = "KIND")]
    renderer: Option<RendererKind>,

    /// Validate the configuration and show what would be crawled
    #[arg(long)]
    dry_run: bool,

    /// Increase diagnostic verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.quiet).await
}

/// Sets up the diagnostics subscriber based on verbosity level
///
/// Crawl progress is printed from the event stream; tracing only carries
/// internal diagnostics.
fn setup_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("media_sweep=warn"),
        1 => EnvFilter::new("media_sweep=debug,warn"),
        2 => EnvFilter::new("media_sweep=trace,info"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Layers command-line values over the config file (or the defaults)
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::new(""),
    };

    if let Some(url) = &cli.url {
        config.start_url = url.trim().to_string();
    }
    if let Some(raw) = &cli.extensions {
        config.extensions = parse_extensions(raw);
    }
    if let Some(raw) = &cli.next {
        config.next_patterns = parse_list(raw);
    }
    if let Some(path) = &cli.output {
        config.output_path = path.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.max_pages = Some(max_pages);
    }
    if let Some(kind) = cli.renderer {
        config.renderer.kind = kind;
    }
    config.visible_browser |= cli.visible;
    config.manual_intervention |= cli.manual;

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== media-sweep Dry Run ===\n");

    println!("Start URL: {}", config.start_url);
    println!("Output file: {}", config.output_path.display());
    println!(
        "File types: {} (default: {})",
        config.extensions.join(", "),
        DEFAULT_EXTENSIONS
    );
    println!(
        "Next patterns: {} (default: {})",
        config.next_patterns.join(", "),
        DEFAULT_NEXT_PATTERNS
    );
    match config.page_limit() {
        Some(limit) => println!("Max pages: {}", limit),
        None => println!("Max pages: unlimited"),
    }

    println!("\nRenderer:");
    println!("  Kind: {}", config.renderer.kind);
    println!("  Headless: {}", config.headless());
    println!("  Manual intervention: {}", config.manual_intervention);
    println!(
        "  Page load timeout: {}ms",
        config.renderer.page_load_timeout_ms
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, quiet: bool) -> anyhow::Result<()> {
    let controller = Controller::new();
    let mut handle = controller.start(config)?;

    watch_for_interrupt(handle.stop_signal());
    // Held until the start page is up; dropping it cancels the crawl
    let mut gate = handle.take_gate();

    let mut summary = None;
    while let Some(event) = handle.next_event().await {
        let terminal = event.is_terminal();
        match event {
            CrawlEvent::Log(line) => {
                if !quiet || line.severity >= Severity::Warning {
                    println!("{}", line);
                }
            }
            CrawlEvent::AwaitingConfirmation => {
                if let Some(gate) = gate.take() {
                    prompt_manual_gate(gate);
                }
            }
            CrawlEvent::Finished(finished) => summary = Some(finished),
        }
        if terminal {
            break;
        }
    }

    let report = handle.wait().await?;

    if let Some(summary) = summary {
        if !quiet {
            println!("\nStatus: {}", report.reason.status_line());
            println!("Result: {}", summary.result_line());
            if let LinkTally::Found { output_path, .. } = &summary.tally {
                println!("Output: {}", output_path.display());
            }
        }
    }

    if !report.is_success() {
        bail!("Crawl ended: {}", report.reason.status_line());
    }

    Ok(())
}

/// Turns the first Ctrl-C into a cooperative stop
fn watch_for_interrupt(stop: StopSignal) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Stopping after the current step...");
            stop.stop();
        }
    });
}

/// Asks on stdin whether to continue past the manual-intervention step
///
/// Runs on its own thread; stdin reads block.
fn prompt_manual_gate(gate: ManualGate) {
    std::thread::spawn(move || {
        eprintln!("Press Enter to continue crawling, or type q and Enter to cancel.");

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => gate.cancel(),
            Ok(_) if answer.trim().eq_ignore_ascii_case("q") => gate.cancel(),
            Ok(_) => gate.confirm(),
        }
    });
}
