// Castaway scorer entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout stays JSON)
// 2. Load config, copying defaults on first run
// 3. Load the season snapshot
// 4. Score the season
// 5. Print the report

use std::sync::Arc;

use castaway_app::config;
use castaway_app::pipeline;
use castaway_app::report::SeasonReport;
use castaway_app::snapshot;

use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Castaway scorer starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} base rules, {} custom rules, streak cap {}",
        config.league.name,
        config.rules.base.len(),
        config.rules.custom.len(),
        config.rules.survival.cap
    );

    // 3. Load the season snapshot
    let snapshot_path = config.snapshot_path();
    let input = snapshot::load_snapshot(&snapshot_path)
        .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;
    let input = Arc::new(input);

    // 4. Score
    let scores = pipeline::score_snapshot(Arc::clone(&input), Arc::new(config.rules.clone()))
        .await
        .context("failed to score season")?;

    // 5. Report
    let report = SeasonReport::new(&config.league.name, &input, &scores);
    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &report).context("failed to write report")?;
    println!();

    info!("Castaway scorer finished");
    Ok(())
}

/// Initialize tracing to stderr; stdout carries the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("castaway_app=info,castaway_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
