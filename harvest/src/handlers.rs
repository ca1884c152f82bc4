use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use harvest_core::config::{FingerprintKind, HarvestConfig};
use harvest_core::export::{DirectorySink, HeaderLayout};
use harvest_core::harvest::{
    Continuation, HarvestProgressCallback, HarvestSummary, HtmlLoader, PageOutcome,
    execute_harvest, visit_once,
};
use harvest_core::queue::{NavigationQueue, QUEUE_KEY, QueueSnapshot};
use harvest_core::store::SqliteStore;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use url::Url;

use crate::commands::DEFAULT_DB_PATH;

pub fn print_banner() {
    println!(
        "{} {}",
        "harvest".bright_green().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
    println!("{}", "resumable review scraper".bright_black());
    println!();
}

pub fn init_tracing(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::WARN
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Expand `~` and environment references in a database path
pub fn resolve_db_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Build a run configuration from `run`/`visit` arguments
pub fn build_config(args: &ArgMatches) -> HarvestConfig {
    let mut config = if args.get_flag("fast") {
        HarvestConfig::fast()
    } else {
        HarvestConfig::default()
    };

    if args.get_flag("legacy-header") {
        config = config.with_header_layout(HeaderLayout::Legacy);
    }

    if let Some(kind) = args
        .get_one::<String>("fingerprint")
        .and_then(|s| FingerprintKind::parse(s))
    {
        config = config.with_fingerprint(kind);
    }

    if let Some(secs) = args.get_one::<u64>("timeout") {
        config = config.with_request_timeout(Duration::from_secs(*secs));
    }

    config
}

fn db_path_arg(args: &ArgMatches) -> PathBuf {
    let raw = args
        .get_one::<String>("db")
        .map(String::as_str)
        .unwrap_or(DEFAULT_DB_PATH);
    resolve_db_path(raw)
}

fn out_dir_arg(args: &ArgMatches) -> PathBuf {
    args.get_one::<PathBuf>("out")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."))
}

fn url_arg(args: &ArgMatches) -> Result<&Url> {
    args.get_one::<Url>("url").context("--url is required")
}

fn open_store(db_path: &Path) -> Result<SqliteStore> {
    SqliteStore::open(db_path)
        .with_context(|| format!("Failed to open queue database {}", db_path.display()))
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// Plain-text listing of a persisted queue, the current target marked
pub fn format_snapshot(snapshot: &QueueSnapshot) -> String {
    let mut out = format!(
        "Company {} of {} ({} remaining)\n",
        (snapshot.cursor + 1).min(snapshot.targets.len()),
        snapshot.targets.len(),
        snapshot.remaining()
    );
    for (i, target) in snapshot.targets.iter().enumerate() {
        let marker = if i == snapshot.cursor {
            "→"
        } else if i < snapshot.cursor {
            "✓"
        } else {
            " "
        };
        out.push_str(&format!("  {} {:>3}. {}\n", marker, i + 1, target));
    }
    out
}

pub fn format_summary(summary: &HarvestSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Page loads: {}\n", summary.page_loads));
    out.push_str(&format!("Companies exported: {}\n", summary.exports.len()));
    let total: usize = summary.exports.iter().map(|e| e.records).sum();
    out.push_str(&format!("Reviews saved: {}\n", total));
    for export in &summary.exports {
        out.push_str(&format!(
            "  {} ({} reviews, {})\n",
            export.file_name,
            export.records,
            export.terminal_state.as_str()
        ));
    }
    out
}

pub async fn handle_run(args: &ArgMatches) -> Result<()> {
    let url = url_arg(args)?;
    let db_path = db_path_arg(args);
    let out_dir = out_dir_arg(args);
    let config = build_config(args);

    println!("{} Start: {}", "→".blue(), url.as_str().bright_white());
    println!(
        "{} Database: {}",
        "→".blue(),
        db_path.display().to_string().bright_white()
    );
    println!(
        "{} Exports: {}",
        "→".blue(),
        out_dir.display().to_string().bright_white()
    );
    println!();

    let store = open_store(&db_path)?;
    let sink = DirectorySink::new(&out_dir);
    let loader = HtmlLoader::new(&config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let bar = spinner.clone();
    let progress_callback: HarvestProgressCallback = Arc::new(move |msg: String| {
        bar.set_message(msg);
    });

    let result = execute_harvest(
        url.as_str(),
        &loader,
        &store,
        &sink,
        &config,
        Some(progress_callback),
    )
    .await;
    spinner.finish_and_clear();

    let summary = result.context("Harvest failed")?;

    print_divider();
    if summary.finished {
        println!("{}", "  HARVEST COMPLETE".green().bold());
    } else {
        println!("{}", "  NOTHING MORE QUEUED".yellow().bold());
    }
    print_divider();
    print!("{}", format_summary(&summary));
    Ok(())
}

pub fn describe_outcome(outcome: &PageOutcome) -> String {
    let mut out = String::new();
    if let Some(export) = &outcome.export {
        out.push_str(&format!(
            "Saved {} reviews to {} ({})\n",
            export.records,
            export.file_name,
            export.terminal_state.as_str()
        ));
    }
    match &outcome.continuation {
        Continuation::Navigate(target) => out.push_str(&format!("Next: {}\n", target)),
        Continuation::Finished => out.push_str("All companies visited\n"),
        Continuation::Idle => out.push_str("Nothing queued for this page\n"),
    }
    out
}

pub async fn handle_visit(args: &ArgMatches) -> Result<()> {
    let url = url_arg(args)?;
    let db_path = db_path_arg(args);
    let config = build_config(args);

    let store = open_store(&db_path)?;
    let sink = DirectorySink::new(out_dir_arg(args));
    let loader = HtmlLoader::new(&config)?;

    let outcome = visit_once(url.as_str(), &loader, &store, &sink, &config)
        .await
        .with_context(|| format!("Failed to handle {}", url))?;

    print!("{}", describe_outcome(&outcome));
    Ok(())
}

pub fn handle_status(args: &ArgMatches) -> Result<()> {
    let db_path = db_path_arg(args);
    if !SqliteStore::exists(&db_path) {
        println!(
            "{} No database at {}",
            "ℹ".blue(),
            db_path.display().to_string().bright_white()
        );
        return Ok(());
    }

    let store = open_store(&db_path)?;
    let queue = NavigationQueue::new(&store);
    match queue.snapshot()? {
        Some(snapshot) => {
            print!("{}", format_snapshot(&snapshot));
            if let Some(ts) = store.updated_at(QUEUE_KEY)?
                && let Some(at) = chrono::DateTime::from_timestamp(ts, 0)
            {
                println!("Last updated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        None => println!("{} No traversal in progress", "ℹ".blue()),
    }
    Ok(())
}

pub fn handle_reset(args: &ArgMatches) -> Result<()> {
    let db_path = db_path_arg(args);
    if !SqliteStore::exists(&db_path) {
        println!("{} Nothing to reset", "ℹ".blue());
        return Ok(());
    }

    if args.get_flag("force") {
        SqliteStore::drop(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
        println!(
            "{} Database removed: {}",
            "✓".green().bold(),
            db_path.display().to_string().bright_white()
        );
        return Ok(());
    }

    let store = open_store(&db_path)?;
    NavigationQueue::new(&store).clear()?;
    println!("{} Queue cleared", "✓".green().bold());
    Ok(())
}
