// Score engine output: cumulative series, streaks, the per-episode ledger and standings.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::eliminations::Eliminations;
use crate::error::ScoringWarning;
use crate::model::{ContestantId, EpisodeNumber, EventKind, MemberId, Reference, TribeId};
use crate::selection::SelectionTimeline;
use crate::streak::StreakState;
use crate::tribes::TribeTimeline;

/// Why a member's score moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum DeltaSource {
    Event {
        kind: EventKind,
        reference: Reference,
    },
    /// Credited through the member's secondary pick, already scaled.
    SecondaryEvent {
        kind: EventKind,
        reference: Reference,
    },
    Prediction {
        kind: EventKind,
        hit: bool,
    },
    Survival {
        streak: u32,
    },
}

/// One line of the ledger: points a member earned or lost at an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDelta {
    pub episode: EpisodeNumber,
    pub member_id: MemberId,
    pub source: DeltaSource,
    pub points: i32,
}

/// A member's place on the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    /// 1-based; tied members share a rank and the next rank is skipped.
    pub rank: usize,
    pub member_id: MemberId,
    pub points: i32,
}

/// Everything the engine derives for one league-season. Every series is
/// indexed by episode, with index 0 holding the pre-season zero.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonScores {
    pub member_scores: BTreeMap<MemberId, Vec<i32>>,
    pub contestant_scores: BTreeMap<ContestantId, Vec<i32>>,
    pub tribe_scores: BTreeMap<TribeId, Vec<i32>>,
    pub streak_state: BTreeMap<MemberId, StreakState>,
    /// Index = episode; the streak after that episode was scored.
    pub streak_history: BTreeMap<MemberId, Vec<StreakState>>,
    pub ledger: Vec<ScoreDelta>,
    pub selection_timeline: SelectionTimeline,
    pub secondary_timeline: SelectionTimeline,
    pub tribe_timeline: TribeTimeline,
    pub eliminations: Eliminations,
    pub warnings: Vec<ScoringWarning>,
}

impl SeasonScores {
    pub fn last_episode(&self) -> EpisodeNumber {
        self.member_scores
            .values()
            .next()
            .map(|series| series.len().saturating_sub(1) as EpisodeNumber)
            .unwrap_or(0)
    }

    /// A member's cumulative total after `episode`.
    pub fn total(&self, member: MemberId, episode: EpisodeNumber) -> Option<i32> {
        self.member_scores
            .get(&member)
            .and_then(|series| series.get(episode as usize))
            .copied()
    }

    /// The ledger lines for one member at one episode.
    pub fn deltas_for(
        &self,
        member: MemberId,
        episode: EpisodeNumber,
    ) -> impl Iterator<Item = &ScoreDelta> + '_ {
        self.ledger
            .iter()
            .filter(move |d| d.member_id == member && d.episode == episode)
    }

    /// Leaderboard after `episode`: points descending, member id breaking
    /// ties in display order only.
    pub fn standings(&self, episode: EpisodeNumber) -> Vec<Standing> {
        let mut rows: Vec<(MemberId, i32)> = self
            .member_scores
            .iter()
            .filter_map(|(&member, series)| series.get(episode as usize).map(|&p| (member, p)))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut standings = Vec::with_capacity(rows.len());
        for (idx, &(member_id, points)) in rows.iter().enumerate() {
            let rank = match standings.last() {
                Some(&Standing { rank, points: prev, .. }) if prev == points => rank,
                _ => idx + 1,
            };
            standings.push(Standing {
                rank,
                member_id,
                points,
            });
        }
        standings
    }
}
