// Score engine: folds a season's events, predictions and survival into
// cumulative per-episode scores for every member, contestant and tribe.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::eliminations::Eliminations;
use crate::error::{EngineError, ScoringWarning};
use crate::integrity::{check_season, KnownIds};
use crate::model::{
    ContestantId, EpisodeEvent, EpisodeNumber, EventKind, MemberId, Reference, SeasonInput,
    TribeId,
};
use crate::predictions::{PendingPredictions, SeasonShape};
use crate::rules::{LeagueRules, RuleLookup};
use crate::scores::{DeltaSource, ScoreDelta, SeasonScores};
use crate::selection::SelectionTimeline;
use crate::streak::{self, PickOutcome, ShotResult, StreakState};
use crate::tribes::TribeTimeline;

pub const PRIMARY_SELECTIONS: &str = "selection";
pub const SECONDARY_SELECTIONS: &str = "secondary selection";

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Eliminations and the tribe timeline built from them.
#[derive(Debug, Clone, Default)]
pub struct TribeStage {
    pub eliminations: Eliminations,
    pub tribes: TribeTimeline,
    pub warnings: Vec<ScoringWarning>,
}

/// Every derived timeline the scorer needs.
#[derive(Debug, Clone, Default)]
pub struct Timelines {
    pub tribe: TribeStage,
    pub selection: SelectionTimeline,
    pub secondary: SelectionTimeline,
}

/// Validate the rules and every id in the snapshot.
pub fn prepare(input: &SeasonInput, rules: &LeagueRules) -> Result<KnownIds, EngineError> {
    rules.validate()?;
    let known = KnownIds::from_season(input);
    check_season(input, &known)?;
    Ok(known)
}

pub fn tribe_stage(input: &SeasonInput, known: &KnownIds) -> TribeStage {
    let last_episode = known.last_episode();
    let mut warnings = Vec::new();
    let eliminations = Eliminations::track(
        &input.events,
        &input.tribe_updates,
        last_episode,
        &mut warnings,
    );
    let tribes = TribeTimeline::build(&input.tribe_updates, &eliminations, last_episode);
    TribeStage {
        eliminations,
        tribes,
        warnings,
    }
}

/// Build every timeline and score the season in one call.
pub fn score_season(input: &SeasonInput, rules: &LeagueRules) -> Result<SeasonScores, EngineError> {
    let known = prepare(input, rules)?;
    let timelines = Timelines {
        tribe: tribe_stage(input, &known),
        selection: SelectionTimeline::build(&input.selections, &known, PRIMARY_SELECTIONS)?,
        secondary: SelectionTimeline::build(
            &input.secondary_selections,
            &known,
            SECONDARY_SELECTIONS,
        )?,
    };
    Ok(score_with_timelines(input, rules, &known, timelines))
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Deltas gathered for a single episode before they are committed.
#[derive(Debug, Default)]
struct EpisodeDeltas {
    members: BTreeMap<MemberId, i32>,
    contestants: BTreeMap<ContestantId, i32>,
    tribes: BTreeMap<TribeId, i32>,
    ledger: Vec<ScoreDelta>,
}

impl EpisodeDeltas {
    fn credit(
        &mut self,
        episode: EpisodeNumber,
        member_id: MemberId,
        source: DeltaSource,
        points: i32,
    ) {
        if points == 0 {
            return;
        }
        let total = self.members.entry(member_id).or_default();
        *total = total.saturating_add(points);
        self.ledger.push(ScoreDelta {
            episode,
            member_id,
            source,
            points,
        });
    }
}

struct Scorer<'a> {
    rules: &'a LeagueRules,
    timelines: &'a Timelines,
}

impl Scorer<'_> {
    /// Credit one directly scored event to whoever held its subject.
    fn score_event(
        &self,
        event: &EpisodeEvent,
        points: i32,
        deltas: &mut EpisodeDeltas,
        warnings: &mut Vec<ScoringWarning>,
    ) {
        let episode = event.episode;
        let source = DeltaSource::Event {
            kind: event.kind,
            reference: event.reference,
        };

        let contestants: Vec<ContestantId> = match event.reference {
            Reference::Member(member) => {
                deltas.credit(episode, member, source, points);
                return;
            }
            Reference::Contestant(contestant) => vec![contestant],
            Reference::Tribe(tribe) => {
                let total = deltas.tribes.entry(tribe).or_default();
                *total = total.saturating_add(points);
                self.timelines
                    .tribe
                    .tribes
                    .roster_at(tribe, episode)
                    .map(<[ContestantId]>::to_vec)
                    .unwrap_or_default()
            }
        };

        // A secondary pick shares event points only. Survival streaks follow
        // the primary pick alone (see `pick_outcome`).
        let secondary = self.rules.secondary_pick;
        let mut credited = false;
        for contestant in contestants {
            let total = deltas.contestants.entry(contestant).or_default();
            *total = total.saturating_add(points);

            if let Some(member) = self.timelines.selection.holder_of(contestant, episode) {
                deltas.credit(episode, member, source, points);
                credited = true;
            }

            if !secondary.enabled {
                continue;
            }
            let Some(member) = self.timelines.secondary.holder_of(contestant, episode) else {
                continue;
            };
            if self.timelines.selection.pick_of(member, episode) == Some(contestant) {
                ScoringWarning::SecondaryMatchesPrimary {
                    episode,
                    member,
                    contestant,
                }
                .record(warnings);
                continue;
            }
            deltas.credit(
                episode,
                member,
                DeltaSource::SecondaryEvent {
                    kind: event.kind,
                    reference: event.reference,
                },
                secondary.scale(points),
            );
            credited = true;
        }

        if !credited {
            ScoringWarning::UnresolvableReference {
                episode,
                kind: event.kind,
                reference: event.reference,
            }
            .record(warnings);
        }
    }

    /// What happened to a member's primary pick this episode.
    fn pick_outcome(
        &self,
        member: MemberId,
        episode: EpisodeNumber,
        shot_played: bool,
    ) -> PickOutcome {
        let eliminations = &self.timelines.tribe.eliminations;
        match self.timelines.selection.pick_of(member, episode) {
            None => PickOutcome::Idle,
            Some(pick) if eliminations.was_removed_at(pick, episode) => PickOutcome::Eliminated {
                shot_played,
                returns: eliminations.returns_after(pick, episode).is_some(),
            },
            Some(pick) if eliminations.in_play(pick, episode) => PickOutcome::Survived,
            Some(_) => PickOutcome::Idle,
        }
    }
}

/// Score the season from prebuilt timelines. Episodes are processed strictly
/// in order; each member's total at `e` is their total at `e - 1` plus every
/// delta credited at `e`.
pub fn score_with_timelines(
    input: &SeasonInput,
    rules: &LeagueRules,
    known: &KnownIds,
    timelines: Timelines,
) -> SeasonScores {
    let last_episode = known.last_episode();
    let len = last_episode as usize + 1;
    let scorer = Scorer {
        rules,
        timelines: &timelines,
    };
    let mut warnings = timelines.tribe.warnings.clone();

    let mut events_by_episode: BTreeMap<EpisodeNumber, Vec<&EpisodeEvent>> = BTreeMap::new();
    for event in &input.events {
        events_by_episode.entry(event.episode).or_default().push(event);
    }
    let mut shots_by_episode: BTreeMap<EpisodeNumber, BTreeSet<MemberId>> = BTreeMap::new();
    for shot in &input.shots {
        shots_by_episode
            .entry(shot.episode)
            .or_default()
            .insert(shot.member_id);
    }

    let shape = SeasonShape {
        merge: input.merge_episode(),
        finale: input.finale_episode(),
    };
    let mut pending = PendingPredictions::open(&input.predictions, rules, shape, &mut warnings);

    let mut member_scores: BTreeMap<MemberId, Vec<i32>> =
        known.members.iter().map(|&m| (m, vec![0; len])).collect();
    let mut contestant_scores: BTreeMap<ContestantId, Vec<i32>> =
        known.contestants.iter().map(|&c| (c, vec![0; len])).collect();
    let mut tribe_scores: BTreeMap<TribeId, Vec<i32>> =
        known.tribes.iter().map(|&t| (t, vec![0; len])).collect();
    let mut streak_history: BTreeMap<MemberId, Vec<StreakState>> = known
        .members
        .iter()
        .map(|&m| (m, vec![StreakState::default(); len]))
        .collect();
    let mut ledger = Vec::new();

    for episode in 1..=last_episode {
        let mut deltas = EpisodeDeltas::default();
        let events = events_by_episode
            .get(&episode)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        // Direct events.
        for event in events {
            match rules.resolve(&event.kind) {
                RuleLookup::Scored { points: 0, .. } | RuleLookup::PredictionOnly(_) => {}
                RuleLookup::Scored { points, .. } => {
                    scorer.score_event(event, points, &mut deltas, &mut warnings)
                }
                RuleLookup::Missing => {
                    if !matches!(event.kind, EventKind::Base(name) if name.removes_from_play()) {
                        ScoringWarning::MissingRule {
                            episode,
                            kind: event.kind,
                        }
                        .record(&mut warnings);
                    }
                }
            }
        }

        // Predictions.
        let (still_pending, settled) = pending.settle(episode, events, rules);
        pending = still_pending;
        for settlement in settled {
            deltas.credit(
                episode,
                settlement.member_id,
                DeltaSource::Prediction {
                    kind: settlement.kind,
                    hit: settlement.hit,
                },
                settlement.points,
            );
        }

        // Survival streaks.
        let shots = shots_by_episode.get(&episode);
        for (&member, history) in streak_history.iter_mut() {
            let shot_played = shots.is_some_and(|s| s.contains(&member));
            let outcome = scorer.pick_outcome(member, episode, shot_played);
            let step = streak::advance(history[episode as usize - 1], outcome, &rules.survival);

            let unused = match (step.shot, outcome) {
                (ShotResult::Unused(reason), _) => Some(reason),
                (ShotResult::NotPlayed, PickOutcome::Eliminated { .. })
                | (ShotResult::Saved, _) => None,
                (ShotResult::NotPlayed, _) if shot_played => Some("pick was not eliminated"),
                (ShotResult::NotPlayed, _) => None,
            };
            if let Some(reason) = unused {
                ScoringWarning::UnusedShot {
                    episode,
                    member,
                    reason,
                }
                .record(&mut warnings);
            }
            if step.shot == ShotResult::Saved {
                debug!(
                    %member,
                    episode,
                    shots_used = step.state.shots_used,
                    "shot in the dark saved streak"
                );
            }

            deltas.credit(
                episode,
                member,
                DeltaSource::Survival {
                    streak: step.state.current,
                },
                step.bonus,
            );
            history[episode as usize] = step.state;
        }

        commit(&mut member_scores, &deltas.members, episode);
        commit(&mut contestant_scores, &deltas.contestants, episode);
        commit(&mut tribe_scores, &deltas.tribes, episode);
        ledger.extend(deltas.ledger);
    }

    if !pending.is_empty() {
        debug!(pending = pending.len(), "predictions still unresolved");
    }

    let streak_state = streak_history
        .iter()
        .map(|(&m, history)| (m, history.last().copied().unwrap_or_default()))
        .collect();

    debug!(
        members = member_scores.len(),
        episodes = last_episode,
        ledger = ledger.len(),
        warnings = warnings.len(),
        "season scored"
    );

    SeasonScores {
        member_scores,
        contestant_scores,
        tribe_scores,
        streak_state,
        streak_history,
        ledger,
        selection_timeline: timelines.selection,
        secondary_timeline: timelines.secondary,
        tribe_timeline: timelines.tribe.tribes,
        eliminations: timelines.tribe.eliminations,
        warnings,
    }
}

/// Write `series[e] = series[e - 1] + delta` for every series, saturating at
/// the bounds of `i32`.
fn commit<K: Ord>(
    series: &mut BTreeMap<K, Vec<i32>>,
    deltas: &BTreeMap<K, i32>,
    episode: EpisodeNumber,
) {
    let e = episode as usize;
    for (key, values) in series.iter_mut() {
        let delta = deltas.get(key).copied().unwrap_or(0);
        values[e] = values[e - 1].saturating_add(delta);
    }
}
