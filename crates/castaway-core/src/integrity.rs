// Identity checks: every id and episode an input row mentions must exist in the season.

use std::collections::BTreeSet;

use crate::error::EngineError;
use crate::model::{ContestantId, EpisodeNumber, MemberId, Reference, SeasonInput, TribeId};

/// The complete identity set for one league-season.
#[derive(Debug, Clone, Default)]
pub struct KnownIds {
    pub members: BTreeSet<MemberId>,
    pub contestants: BTreeSet<ContestantId>,
    pub tribes: BTreeSet<TribeId>,
    pub episodes: BTreeSet<EpisodeNumber>,
}

impl KnownIds {
    pub fn from_season(input: &SeasonInput) -> Self {
        KnownIds {
            members: input.members.iter().map(|m| m.id).collect(),
            contestants: input.contestants.iter().map(|c| c.id).collect(),
            tribes: input.tribes.iter().map(|t| t.id).collect(),
            episodes: input.episodes.iter().map(|e| e.number).collect(),
        }
    }

    pub fn last_episode(&self) -> EpisodeNumber {
        self.episodes.iter().next_back().copied().unwrap_or(0)
    }

    pub fn episode(
        &self,
        episode: EpisodeNumber,
        context: &'static str,
    ) -> Result<(), EngineError> {
        if self.episodes.contains(&episode) {
            Ok(())
        } else {
            Err(EngineError::UnknownEpisode { episode, context })
        }
    }

    pub fn member(
        &self,
        member: MemberId,
        episode: EpisodeNumber,
        context: &'static str,
    ) -> Result<(), EngineError> {
        if self.members.contains(&member) {
            Ok(())
        } else {
            Err(EngineError::UnknownMember {
                member,
                episode,
                context,
            })
        }
    }

    pub fn contestant(
        &self,
        contestant: ContestantId,
        episode: EpisodeNumber,
        context: &'static str,
    ) -> Result<(), EngineError> {
        if self.contestants.contains(&contestant) {
            Ok(())
        } else {
            Err(EngineError::UnknownContestant {
                contestant,
                episode,
                context,
            })
        }
    }

    pub fn tribe(
        &self,
        tribe: TribeId,
        episode: EpisodeNumber,
        context: &'static str,
    ) -> Result<(), EngineError> {
        if self.tribes.contains(&tribe) {
            Ok(())
        } else {
            Err(EngineError::UnknownTribe {
                tribe,
                episode,
                context,
            })
        }
    }

    pub fn reference(
        &self,
        reference: &Reference,
        episode: EpisodeNumber,
        context: &'static str,
    ) -> Result<(), EngineError> {
        match *reference {
            Reference::Contestant(id) => self.contestant(id, episode, context),
            Reference::Tribe(id) => self.tribe(id, episode, context),
            Reference::Member(id) => self.member(id, episode, context),
        }
    }
}

/// Check every row of the snapshot against its identity set. Selection rows
/// are checked again by the selection builder itself.
pub fn check_season(input: &SeasonInput, known: &KnownIds) -> Result<(), EngineError> {
    for update in &input.tribe_updates {
        known.episode(update.episode, "tribe update")?;
        known.tribe(update.tribe_id, update.episode, "tribe update")?;
        for &contestant in &update.contestant_ids {
            known.contestant(contestant, update.episode, "tribe update")?;
        }
    }
    for event in &input.events {
        known.episode(event.episode, "event")?;
        known.reference(&event.reference, event.episode, "event")?;
    }
    for prediction in &input.predictions {
        known.episode(prediction.episode, "prediction")?;
        known.member(prediction.member_id, prediction.episode, "prediction")?;
        known.reference(&prediction.reference, prediction.episode, "prediction")?;
    }
    for shot in &input.shots {
        known.episode(shot.episode, "shot in the dark")?;
        known.member(shot.member_id, shot.episode, "shot in the dark")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BaseEventName, Contestant, Episode, EpisodeEvent, EventKind, Member, Tribe, TribeUpdate,
    };

    fn season() -> SeasonInput {
        SeasonInput {
            episodes: (1..=3)
                .map(|n| Episode {
                    number: n,
                    air_date: None,
                    is_merge: false,
                    is_finale: false,
                })
                .collect(),
            contestants: vec![Contestant {
                id: ContestantId(1),
                name: "Parvati".into(),
            }],
            tribes: vec![Tribe {
                id: TribeId(1),
                name: "Heroes".into(),
                color: "#3355ff".into(),
            }],
            members: vec![Member {
                id: MemberId(1),
                display_name: "Sam".into(),
            }],
            ..SeasonInput::default()
        }
    }

    #[test]
    fn accepts_consistent_season() {
        let mut input = season();
        input.tribe_updates.push(TribeUpdate {
            episode: 1,
            tribe_id: TribeId(1),
            contestant_ids: vec![ContestantId(1)],
        });
        let known = KnownIds::from_season(&input);
        assert_eq!(known.last_episode(), 3);
        assert!(check_season(&input, &known).is_ok());
    }

    #[test]
    fn rejects_unknown_tribe_in_event() {
        let mut input = season();
        input.events.push(EpisodeEvent {
            episode: 2,
            kind: EventKind::Base(BaseEventName::Tribe1st),
            reference: Reference::Tribe(TribeId(9)),
            notes: None,
        });
        let known = KnownIds::from_season(&input);
        assert_eq!(
            check_season(&input, &known),
            Err(EngineError::UnknownTribe {
                tribe: TribeId(9),
                episode: 2,
                context: "event",
            })
        );
    }

    #[test]
    fn rejects_event_past_last_episode() {
        let mut input = season();
        input.events.push(EpisodeEvent {
            episode: 4,
            kind: EventKind::Base(BaseEventName::Elim),
            reference: Reference::Contestant(ContestantId(1)),
            notes: None,
        });
        let known = KnownIds::from_season(&input);
        assert!(matches!(
            check_season(&input, &known),
            Err(EngineError::UnknownEpisode { episode: 4, .. })
        ));
    }

    #[test]
    fn rejects_unknown_contestant_in_tribe_update() {
        let mut input = season();
        input.tribe_updates.push(TribeUpdate {
            episode: 1,
            tribe_id: TribeId(1),
            contestant_ids: vec![ContestantId(1), ContestantId(2)],
        });
        let known = KnownIds::from_season(&input);
        assert!(matches!(
            check_season(&input, &known),
            Err(EngineError::UnknownContestant { contestant: ContestantId(2), .. })
        ));
    }
}
