// Integration tests for the castaway host.
//
// These load the shipped defaults and sample snapshot through the library's
// public API and score them on the async pipeline.

use std::path::Path;
use std::sync::Arc;

use castaway_app::config::{self, Config};
use castaway_app::pipeline::{self, PipelineError};
use castaway_app::report::SeasonReport;
use castaway_app::snapshot;
use castaway_core::model::{MemberId, SelectionUpdate};
use castaway_core::{EngineError, SeasonInput};

// ===========================================================================
// Test helpers
// ===========================================================================

/// Load the shipped defaults from a temp copy so the working tree never grows
/// a config/ directory. `name` keeps parallel tests out of each other's way.
fn shipped_config(name: &str) -> Config {
    let tmp = std::env::temp_dir().join(format!("castaway_integration_{name}"));
    let _ = std::fs::remove_dir_all(&tmp);
    std::fs::create_dir_all(tmp.join("config")).unwrap();
    std::fs::copy("defaults/league.toml", tmp.join("config/league.toml")).unwrap();
    let mut config = config::load_config_from(&tmp).expect("defaults should load");
    config.base_dir = Path::new(".").to_path_buf();
    config
}

fn sample_season() -> SeasonInput {
    snapshot::load_snapshot(Path::new("data/season.json")).expect("sample snapshot should load")
}

// ===========================================================================
// Pipeline
// ===========================================================================

#[tokio::test]
async fn sample_season_scores_end_to_end() {
    let config = shipped_config("sample");
    let input = Arc::new(sample_season());

    let scores = pipeline::score_snapshot(Arc::clone(&input), Arc::new(config.rules.clone()))
        .await
        .expect("sample season should score");

    assert_eq!(scores.last_episode(), 6);
    assert!(scores.warnings.is_empty(), "warnings: {:?}", scores.warnings);

    assert_eq!(scores.member_scores[&MemberId(1)], vec![0, 9, 12, 19, 28, 31, 37]);
    assert_eq!(scores.member_scores[&MemberId(2)], vec![0, 7, 8, 11, 18, 22, 41]);
    assert_eq!(scores.member_scores[&MemberId(3)], vec![0, 3, 7, 11, 18, 29, 62]);

    // The episode-4 shot in the dark kept Jordan's streak alive.
    let jordan = scores.streak_state[&MemberId(1)];
    assert_eq!((jordan.current, jordan.shots_used), (4, 1));

    let table: Vec<(usize, u32)> = scores
        .standings(6)
        .iter()
        .map(|s| (s.rank, s.member_id.0))
        .collect();
    assert_eq!(table, vec![(1, 3), (2, 2), (3, 1)]);
}

#[tokio::test]
async fn ledger_accounts_for_every_point() {
    let config = shipped_config("ledger");
    let scores = pipeline::score_snapshot(Arc::new(sample_season()), Arc::new(config.rules))
        .await
        .unwrap();

    for (&member, series) in &scores.member_scores {
        for episode in 1..series.len() {
            let from_ledger: i32 = scores
                .deltas_for(member, episode as u32)
                .map(|d| d.points)
                .sum();
            assert_eq!(
                series[episode] - series[episode - 1],
                from_ledger,
                "{member} at episode {episode}"
            );
        }
    }
}

#[tokio::test]
async fn pipeline_surfaces_engine_errors() {
    let config = shipped_config("pipeline");
    let mut input = sample_season();
    input.secondary_selections.push(SelectionUpdate {
        episode: 2,
        member_id: MemberId(42),
        contestant_id: None,
        is_draft_pick: false,
    });

    let err = pipeline::score_snapshot(Arc::new(input), Arc::new(config.rules))
        .await
        .unwrap_err();
    match err {
        PipelineError::Engine(EngineError::UnknownMember { member, .. }) => {
            assert_eq!(member, MemberId(42));
        }
        other => panic!("expected UnknownMember, got: {other}"),
    }
}

// ===========================================================================
// Report
// ===========================================================================

#[tokio::test]
async fn report_serializes_standings_with_names() {
    let config = shipped_config("report");
    let input = Arc::new(sample_season());
    let scores = pipeline::score_snapshot(Arc::clone(&input), Arc::new(config.rules.clone()))
        .await
        .unwrap();

    let report = SeasonReport::new(&config.league.name, &input, &scores);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["league"], config.league.name.as_str());
    assert_eq!(json["episode"], 6);
    assert_eq!(json["standings"][0]["displayName"], "Marcus");
    assert_eq!(json["standings"][0]["points"], 62);
    assert_eq!(json["standings"][0]["streak"], 6);
    assert!(json["warnings"].as_array().unwrap().is_empty());
}
