// Who left play at which episode, and who came back.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::error::ScoringWarning;
use crate::model::{
    BaseEventName, ContestantId, EpisodeEvent, EpisodeNumber, EventKind, Reference, TribeUpdate,
};

/// One stretch a contestant spent out of play. `reentry` is the episode they
/// were back on a tribe, if they ever were.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutOfPlay {
    pub eliminated: EpisodeNumber,
    pub reentry: Option<EpisodeNumber>,
}

impl OutOfPlay {
    /// A contestant still plays the episode they are eliminated in.
    pub fn covers(&self, episode: EpisodeNumber) -> bool {
        episode > self.eliminated && self.reentry.is_none_or(|r| episode < r)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Eliminations {
    /// Index = episode; who left play at that episode.
    removed: Vec<Vec<ContestantId>>,
    intervals: BTreeMap<ContestantId, Vec<OutOfPlay>>,
}

impl Eliminations {
    /// Derive removals from `elim`/`noVoteExit` events and re-entries from a
    /// later tribe update listing an eliminated contestant.
    pub fn track(
        events: &[EpisodeEvent],
        tribe_updates: &[TribeUpdate],
        last_episode: EpisodeNumber,
        warnings: &mut Vec<ScoringWarning>,
    ) -> Self {
        let mut removals: BTreeMap<EpisodeNumber, Vec<(ContestantId, BaseEventName)>> =
            BTreeMap::new();
        for event in events {
            let EventKind::Base(name) = event.kind else {
                continue;
            };
            if !name.removes_from_play() {
                continue;
            }
            match event.reference {
                Reference::Contestant(contestant) => removals
                    .entry(event.episode)
                    .or_default()
                    .push((contestant, name)),
                reference => ScoringWarning::UnresolvableReference {
                    episode: event.episode,
                    kind: event.kind,
                    reference,
                }
                .record(warnings),
            }
        }

        let mut listed: BTreeMap<EpisodeNumber, BTreeSet<ContestantId>> = BTreeMap::new();
        for update in tribe_updates {
            listed
                .entry(update.episode)
                .or_default()
                .extend(update.contestant_ids.iter().copied());
        }

        let mut removed = vec![Vec::new(); last_episode as usize + 1];
        let mut intervals: BTreeMap<ContestantId, Vec<OutOfPlay>> = BTreeMap::new();

        for episode in 1..=last_episode {
            if let Some(contestants) = listed.get(&episode) {
                for contestant in contestants {
                    let Some(open) = intervals
                        .get_mut(contestant)
                        .and_then(|spans| spans.last_mut())
                        .filter(|span| span.reentry.is_none() && span.eliminated < episode)
                    else {
                        continue;
                    };
                    open.reentry = Some(episode);
                    debug!(%contestant, episode, "contestant re-entered play");
                }
            }

            for &(contestant, name) in removals.get(&episode).into_iter().flatten() {
                let spans = intervals.entry(contestant).or_default();
                let already_out = spans.last().is_some_and(|span| span.reentry.is_none());
                if already_out {
                    ScoringWarning::RepeatElimination {
                        episode,
                        contestant,
                        event: name,
                    }
                    .record(warnings);
                    continue;
                }
                spans.push(OutOfPlay {
                    eliminated: episode,
                    reentry: None,
                });
                removed[episode as usize].push(contestant);
            }
        }

        debug!(
            removals = removed.iter().map(Vec::len).sum::<usize>(),
            contestants = intervals.len(),
            "eliminations tracked"
        );

        Eliminations { removed, intervals }
    }

    pub fn last_episode(&self) -> EpisodeNumber {
        self.removed.len().saturating_sub(1) as EpisodeNumber
    }

    /// Contestants who left play at `episode`.
    pub fn removed_at(&self, episode: EpisodeNumber) -> &[ContestantId] {
        self.removed
            .get(episode as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn was_removed_at(&self, contestant: ContestantId, episode: EpisodeNumber) -> bool {
        self.intervals(contestant)
            .iter()
            .any(|span| span.eliminated == episode)
    }

    /// Whether the contestant is still in the game during `episode`.
    pub fn in_play(&self, contestant: ContestantId, episode: EpisodeNumber) -> bool {
        !self
            .intervals(contestant)
            .iter()
            .any(|span| span.covers(episode))
    }

    /// For a contestant removed at `episode`, the episode they come back, if any.
    pub fn returns_after(
        &self,
        contestant: ContestantId,
        episode: EpisodeNumber,
    ) -> Option<EpisodeNumber> {
        self.intervals(contestant)
            .iter()
            .find(|span| span.eliminated == episode)
            .and_then(|span| span.reentry)
    }

    pub fn intervals(&self, contestant: ContestantId) -> &[OutOfPlay] {
        self.intervals
            .get(&contestant)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TribeId;

    fn elim(episode: EpisodeNumber, contestant: u32) -> EpisodeEvent {
        EpisodeEvent {
            episode,
            kind: EventKind::Base(BaseEventName::Elim),
            reference: Reference::Contestant(ContestantId(contestant)),
            notes: None,
        }
    }

    fn update(episode: EpisodeNumber, tribe: u32, contestants: &[u32]) -> TribeUpdate {
        TribeUpdate {
            episode,
            tribe_id: TribeId(tribe),
            contestant_ids: contestants.iter().map(|&c| ContestantId(c)).collect(),
        }
    }

    #[test]
    fn removals_keyed_by_episode() {
        let mut warnings = Vec::new();
        let mut exit = elim(4, 2);
        exit.kind = EventKind::Base(BaseEventName::NoVoteExit);
        let events = vec![elim(2, 1), exit, elim(4, 3)];
        let elims = Eliminations::track(&events, &[], 5, &mut warnings);

        assert_eq!(elims.last_episode(), 5);
        assert!(elims.removed_at(1).is_empty());
        assert_eq!(elims.removed_at(2), &[ContestantId(1)]);
        assert_eq!(elims.removed_at(4), &[ContestantId(2), ContestantId(3)]);
        assert!(elims.removed_at(99).is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn contestant_plays_their_elimination_episode() {
        let elims = Eliminations::track(&[elim(3, 1)], &[], 5, &mut Vec::new());
        assert!(elims.in_play(ContestantId(1), 3));
        assert!(!elims.in_play(ContestantId(1), 4));
        assert!(elims.was_removed_at(ContestantId(1), 3));
        assert!(!elims.was_removed_at(ContestantId(1), 4));
    }

    #[test]
    fn redemption_reopens_play_and_keeps_history() {
        let events = vec![elim(2, 1), elim(6, 1)];
        let updates = vec![update(1, 1, &[1, 2]), update(4, 1, &[1, 2])];
        let elims = Eliminations::track(&events, &updates, 8, &mut Vec::new());

        assert_eq!(
            elims.intervals(ContestantId(1)),
            &[
                OutOfPlay {
                    eliminated: 2,
                    reentry: Some(4)
                },
                OutOfPlay {
                    eliminated: 6,
                    reentry: None
                },
            ]
        );
        assert!(!elims.in_play(ContestantId(1), 3));
        assert!(elims.in_play(ContestantId(1), 4));
        assert!(elims.in_play(ContestantId(1), 6));
        assert!(!elims.in_play(ContestantId(1), 7));
        assert_eq!(elims.returns_after(ContestantId(1), 2), Some(4));
        assert_eq!(elims.returns_after(ContestantId(1), 6), None);
        assert_eq!(elims.removed_at(2), &[ContestantId(1)]);
        assert_eq!(elims.removed_at(6), &[ContestantId(1)]);
    }

    #[test]
    fn tribe_update_in_elimination_episode_is_not_a_reentry() {
        let updates = vec![update(3, 1, &[1])];
        let elims = Eliminations::track(&[elim(3, 1)], &updates, 5, &mut Vec::new());
        assert_eq!(elims.returns_after(ContestantId(1), 3), None);
        assert!(!elims.in_play(ContestantId(1), 5));
    }

    #[test]
    fn repeat_elimination_while_out_is_warned() {
        let mut warnings = Vec::new();
        let elims = Eliminations::track(&[elim(2, 1), elim(3, 1)], &[], 4, &mut warnings);
        assert_eq!(elims.intervals(ContestantId(1)).len(), 1);
        assert!(elims.removed_at(3).is_empty());
        assert_eq!(
            warnings,
            vec![ScoringWarning::RepeatElimination {
                episode: 3,
                contestant: ContestantId(1),
                event: BaseEventName::Elim,
            }]
        );
    }

    #[test]
    fn elimination_of_a_tribe_is_unresolvable() {
        let mut warnings = Vec::new();
        let event = EpisodeEvent {
            episode: 1,
            kind: EventKind::Base(BaseEventName::Elim),
            reference: Reference::Tribe(TribeId(1)),
            notes: None,
        };
        let elims = Eliminations::track(&[event], &[], 2, &mut warnings);
        assert!(elims.removed_at(1).is_empty());
        assert_eq!(warnings.len(), 1);
    }
}
