// Scoring pipeline: runs the independent timeline builders concurrently on
// the blocking pool, then scores the season once all of them have joined.

use std::sync::Arc;
use std::time::Instant;

use castaway_core::engine::{self, Timelines, PRIMARY_SELECTIONS, SECONDARY_SELECTIONS};
use castaway_core::selection::SelectionTimeline;
use castaway_core::{EngineError, LeagueRules, SeasonInput, SeasonScores};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("scoring stage `{stage}` did not complete: {source}")]
    Join {
        stage: &'static str,
        source: JoinError,
    },
}

/// Score one league-season.
///
/// Stage order:
/// 1. Validate rules and every id in the snapshot
/// 2. Concurrently: eliminations then tribes, primary selections, secondary selections
/// 3. Score episodes in order
pub async fn score_snapshot(
    input: Arc<SeasonInput>,
    rules: Arc<LeagueRules>,
) -> Result<SeasonScores, PipelineError> {
    let started = Instant::now();

    let known = {
        let (input, rules) = (Arc::clone(&input), Arc::clone(&rules));
        run_stage("validate", move || engine::prepare(&input, &rules)).await?
    };
    let known = Arc::new(known);

    let tribes = {
        let (input, known) = (Arc::clone(&input), Arc::clone(&known));
        run_stage("tribes", move || Ok(engine::tribe_stage(&input, &known)))
    };
    let selection = {
        let (input, known) = (Arc::clone(&input), Arc::clone(&known));
        run_stage(PRIMARY_SELECTIONS, move || {
            SelectionTimeline::build(&input.selections, &known, PRIMARY_SELECTIONS)
        })
    };
    let secondary = {
        let (input, known) = (Arc::clone(&input), Arc::clone(&known));
        run_stage(SECONDARY_SELECTIONS, move || {
            SelectionTimeline::build(&input.secondary_selections, &known, SECONDARY_SELECTIONS)
        })
    };
    let (tribe, selection, secondary) = tokio::try_join!(tribes, selection, secondary)?;

    let timelines = Timelines {
        tribe,
        selection,
        secondary,
    };
    let scores = run_stage("score", move || {
        Ok(engine::score_with_timelines(&input, &rules, &known, timelines))
    })
    .await?;

    info!(
        "Season scored through episode {} in {:?} ({} warnings)",
        scores.last_episode(),
        started.elapsed(),
        scores.warnings.len()
    );
    Ok(scores)
}

async fn run_stage<T, F>(stage: &'static str, work: F) -> Result<T, PipelineError>
where
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    let started = Instant::now();
    let output = tokio::task::spawn_blocking(work)
        .await
        .map_err(|source| PipelineError::Join { stage, source })??;
    debug!(stage, elapsed = ?started.elapsed(), "stage finished");
    Ok(output)
}
