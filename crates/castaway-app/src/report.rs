// JSON report printed by the `castaway` binary.

use std::collections::BTreeMap;

use castaway_core::model::{EpisodeNumber, MemberId, SeasonInput};
use castaway_core::{ScoringWarning, SeasonScores, Standing};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow<'a> {
    pub rank: usize,
    pub member_id: MemberId,
    pub display_name: &'a str,
    pub points: i32,
    pub streak: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonReport<'a> {
    pub league: &'a str,
    pub episode: EpisodeNumber,
    pub standings: Vec<StandingRow<'a>>,
    pub member_scores: &'a BTreeMap<MemberId, Vec<i32>>,
    pub warnings: &'a [ScoringWarning],
}

impl<'a> SeasonReport<'a> {
    /// Report the standings after the last scored episode.
    pub fn new(league: &'a str, input: &'a SeasonInput, scores: &'a SeasonScores) -> Self {
        let episode = scores.last_episode();
        let standings = scores
            .standings(episode)
            .into_iter()
            .map(|Standing { rank, member_id, points }| StandingRow {
                rank,
                member_id,
                display_name: input
                    .members
                    .iter()
                    .find(|m| m.id == member_id)
                    .map(|m| m.display_name.as_str())
                    .unwrap_or(""),
                points,
                streak: scores
                    .streak_state
                    .get(&member_id)
                    .map(|s| s.current)
                    .unwrap_or(0),
            })
            .collect();

        SeasonReport {
            league,
            episode,
            standings,
            member_scores: &scores.member_scores,
            warnings: &scores.warnings,
        }
    }
}
