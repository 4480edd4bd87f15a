// Prediction scoring: standing predictions settled against the events of each episode.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::ScoringWarning;
use crate::model::{
    EpisodeEvent, EpisodeNumber, EventKind, MemberId, Prediction, PredictionTiming, Reference,
};
use crate::rules::{LeagueRules, RuleLookup};

/// Where the merge and finale fall, for timing-window checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonShape {
    pub merge: Option<EpisodeNumber>,
    pub finale: Option<EpisodeNumber>,
}

impl SeasonShape {
    /// Whether a prediction with this timing may be made for episode `made`.
    pub fn accepts(&self, timing: PredictionTiming, made: EpisodeNumber) -> bool {
        let premerge = self.merge.is_none_or(|merge| made < merge);
        match timing {
            PredictionTiming::Draft | PredictionTiming::Weekly => true,
            PredictionTiming::WeeklyPremerge | PredictionTiming::BeforeMerge => premerge,
            PredictionTiming::WeeklyPostmerge | PredictionTiming::AfterMerge => !premerge,
            PredictionTiming::BeforeFinale => self.finale.is_none_or(|finale| made < finale),
        }
    }
}

/// Whether a prediction made for `made` can be settled by events at `episode`.
pub fn window_covers(
    timing: PredictionTiming,
    made: EpisodeNumber,
    episode: EpisodeNumber,
) -> bool {
    if timing.is_weekly() {
        episode == made
    } else {
        episode >= made
    }
}

/// A settled prediction and the points it is worth to the member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub member_id: MemberId,
    pub kind: EventKind,
    pub reference: Reference,
    pub hit: bool,
    pub points: i32,
}

/// Predictions not yet settled, carried from one episode to the next.
#[derive(Debug, Clone, Default)]
pub struct PendingPredictions<'a> {
    open: Vec<&'a Prediction>,
}

impl<'a> PendingPredictions<'a> {
    /// Admit every prediction whose rule allows its timing and whose timing
    /// allows the episode it was made for. A later prediction by the same
    /// member for the same kind, timing and episode replaces an earlier one.
    pub fn open(
        predictions: &'a [Prediction],
        rules: &LeagueRules,
        shape: SeasonShape,
        warnings: &mut Vec<ScoringWarning>,
    ) -> Self {
        let mut standing: BTreeMap<(MemberId, EpisodeNumber, EventKind, PredictionTiming), usize> =
            BTreeMap::new();
        let mut open: Vec<&'a Prediction> = Vec::new();

        for prediction in predictions {
            let rule = match rules.resolve(&prediction.kind) {
                RuleLookup::Missing => {
                    ScoringWarning::MissingRule {
                        episode: prediction.episode,
                        kind: prediction.kind,
                    }
                    .record(warnings);
                    continue;
                }
                lookup => lookup.prediction(),
            };

            let admitted = rule.is_some_and(|rule| rule.allows(prediction.timing))
                && shape.accepts(prediction.timing, prediction.episode);
            if !admitted {
                ScoringWarning::PredictionOutsideWindow {
                    episode: prediction.episode,
                    member: prediction.member_id,
                    kind: prediction.kind,
                    timing: prediction.timing,
                }
                .record(warnings);
                continue;
            }

            let key = (
                prediction.member_id,
                prediction.episode,
                prediction.kind,
                prediction.timing,
            );
            match standing.get(&key) {
                Some(&slot) => open[slot] = prediction,
                None => {
                    standing.insert(key, open.len());
                    open.push(prediction);
                }
            }
        }

        debug!(open = open.len(), "predictions opened");
        PendingPredictions { open }
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Settle whatever this episode's events decide. A prediction settles at
    /// the first covered episode with an event of its kind: a hit earns the
    /// rule's points plus any bet, a miss loses the bet. Weekly predictions
    /// with no such event expire unscored; the rest stay pending.
    pub fn settle(
        self,
        episode: EpisodeNumber,
        events: &[&EpisodeEvent],
        rules: &LeagueRules,
    ) -> (Self, Vec<Settlement>) {
        let mut still_open = Vec::with_capacity(self.open.len());
        let mut settled = Vec::new();

        for prediction in self.open {
            if !window_covers(prediction.timing, prediction.episode, episode) {
                if prediction.timing.is_weekly() && episode > prediction.episode {
                    debug!(
                        member = %prediction.member_id,
                        kind = %prediction.kind,
                        made = prediction.episode,
                        "weekly prediction expired unresolved"
                    );
                } else {
                    still_open.push(prediction);
                }
                continue;
            }

            let mut outcomes = events
                .iter()
                .filter(|event| event.kind == prediction.kind)
                .peekable();
            if outcomes.peek().is_none() {
                if prediction.timing.is_weekly() {
                    debug!(
                        member = %prediction.member_id,
                        kind = %prediction.kind,
                        episode,
                        "no event decided weekly prediction"
                    );
                } else {
                    still_open.push(prediction);
                }
                continue;
            }
            let hit = outcomes.any(|event| event.reference == prediction.reference);

            let Some(rule) = rules.resolve(&prediction.kind).prediction() else {
                continue;
            };
            let bet = if rule.betting {
                prediction.bet.unwrap_or(0).saturating_abs()
            } else {
                0
            };
            let points = if hit {
                rule.points.saturating_add(bet)
            } else {
                -bet
            };

            settled.push(Settlement {
                member_id: prediction.member_id,
                kind: prediction.kind,
                reference: prediction.reference,
                hit,
                points,
            });
        }

        (PendingPredictions { open: still_open }, settled)
    }
}
