//! `odds-sampler <yyyymmdd>`: sample every event of the date until all of
//! their poll series are exhausted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use odds_sampler::builders::{build_in_memory_scheduler, build_registrar, build_sink, build_source};
use odds_sampler::config::SamplerConfig;
use odds_sampler::core::AppResult;
use odds_sampler::infra::catalog;
use odds_sampler::runtime::TokioSpawner;
use odds_sampler::util::clock::{Clock, SystemClock};
use odds_sampler::util::stamp::{format_minute_stamp, parse_date};
use odds_sampler::util::telemetry::init_tracing;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target date, `yyyymmdd`
    date: String,

    /// JSON configuration file
    #[arg(short, long, env = "ODDS_SAMPLER_CONFIG")]
    config: Option<PathBuf>,

    /// Root directory holding the event catalog and sample files
    #[arg(long, env = "ODDS_SAMPLER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Base URL of the sample endpoint
    #[arg(long, env = "ODDS_SAMPLER_SOURCE_URL")]
    source_url: Option<String>,

    /// Print the registration plan and exit without sampling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();
    let date = parse_date(&args.date)?;
    let cfg = SamplerConfig::load(args.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(args.data_dir, args.source_url);
    cfg.validate().context("invalid configuration")?;

    let clock = Arc::new(SystemClock);
    clock.check().context("system clock unavailable")?;

    let events = catalog::load_events(&cfg.storage.data_dir, date)
        .with_context(|| format!("failed to load events from {}", cfg.storage.data_dir.display()))?;
    if events.is_empty() {
        warn!(date = %args.date, "no events found; nothing to sample");
        return Ok(());
    }

    let source = build_source(&cfg)?;
    let sink = build_sink(&cfg, date);
    let registrar = build_registrar(&cfg, source, sink, clock.clone())?;

    if args.dry_run {
        for event in &events {
            let plan = registrar.plan(event);
            info!(
                event = %plan.event,
                entries = plan.entries,
                first = %format_minute_stamp(plan.first),
                last = %format_minute_stamp(plan.last),
                "planned"
            );
        }
        return Ok(());
    }

    let scheduler = build_in_memory_scheduler(&cfg, clock.clone(), TokioSpawner::current())?;
    let handle = scheduler.handle();
    let report = registrar.register_all(&handle, events)?;
    info!(
        date = %args.date,
        events = report.events,
        entries = report.entries,
        now = %format_minute_stamp(clock.now()),
        "sampling started"
    );

    let shutdown = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let dropped = shutdown.cancel_all();
            warn!(dropped, "interrupt received; waiting for in-flight samples");
        }
    });

    let summary = scheduler.run().await;
    info!(
        dispatched = summary.dispatched,
        succeeded = summary.succeeded,
        failed = summary.failed,
        missed = summary.missed,
        samples = summary.samples,
        "sampling finished"
    );
    Ok(())
}
