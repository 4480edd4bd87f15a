// Selection timeline: sparse pick changes folded into dense member -> contestant
// and contestant -> member histories.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::EngineError;
use crate::integrity::KnownIds;
use crate::model::{ContestantId, EpisodeNumber, MemberId, SelectionUpdate};

/// Dense pick history for one league. Every array is indexed by episode and
/// runs from 0 (pre-draft, always `None`) through the season's last episode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionTimeline {
    member_castaways: BTreeMap<MemberId, Vec<Option<ContestantId>>>,
    castaway_members: BTreeMap<ContestantId, Vec<Option<MemberId>>>,
}

impl SelectionTimeline {
    /// Fold the updates into `memberCastaways`, then derive `castawayMembers`
    /// by inverting it. Fails on any id the league does not know.
    pub fn build(
        updates: &[SelectionUpdate],
        known: &KnownIds,
        label: &'static str,
    ) -> Result<Self, EngineError> {
        let last_episode = known.last_episode();

        let mut ordered: Vec<&SelectionUpdate> = updates.iter().collect();
        ordered.sort_by_key(|u| u.episode);

        let folded = ordered
            .into_iter()
            .try_fold(SelectionFold::default(), |fold, update| {
                fold.apply(update, known, label)
            })?;

        let member_castaways = folded.finish(known, last_episode);
        let castaway_members = invert(&member_castaways, known, last_episode)?;

        let timeline = SelectionTimeline {
            member_castaways,
            castaway_members,
        };
        timeline.check_density(last_episode, label)?;

        debug!(
            label,
            updates = updates.len(),
            members = timeline.member_castaways.len(),
            last_episode,
            "selection timeline built"
        );
        Ok(timeline)
    }

    /// The contestant `member` held at `episode`.
    pub fn pick_of(&self, member: MemberId, episode: EpisodeNumber) -> Option<ContestantId> {
        self.member_castaways
            .get(&member)
            .and_then(|slots| slots.get(episode as usize))
            .copied()
            .flatten()
    }

    /// The member holding `contestant` at `episode`.
    pub fn holder_of(&self, contestant: ContestantId, episode: EpisodeNumber) -> Option<MemberId> {
        self.castaway_members
            .get(&contestant)
            .and_then(|slots| slots.get(episode as usize))
            .copied()
            .flatten()
    }

    pub fn picks_of(&self, member: MemberId) -> &[Option<ContestantId>] {
        self.member_castaways
            .get(&member)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn holders_of(&self, contestant: ContestantId) -> &[Option<MemberId>] {
        self.castaway_members
            .get(&contestant)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn member_castaways(&self) -> &BTreeMap<MemberId, Vec<Option<ContestantId>>> {
        &self.member_castaways
    }

    pub fn castaway_members(&self) -> &BTreeMap<ContestantId, Vec<Option<MemberId>>> {
        &self.castaway_members
    }

    fn check_density(
        &self,
        last_episode: EpisodeNumber,
        label: &'static str,
    ) -> Result<(), EngineError> {
        let expected = last_episode as usize + 1;
        let members = self
            .member_castaways
            .iter()
            .map(|(id, slots)| (id.to_string(), slots.len()));
        let contestants = self
            .castaway_members
            .iter()
            .map(|(id, slots)| (id.to_string(), slots.len()));
        for (owner, len) in members.chain(contestants) {
            if len < expected {
                return Err(EngineError::UndefinedSlot {
                    timeline: label,
                    owner,
                    episode: len as EpisodeNumber,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fold
// ---------------------------------------------------------------------------

/// Intermediate fold state: each member's slots up to the last episode they
/// (or a handoff) touched, plus who currently holds each contestant.
#[derive(Debug, Default)]
struct SelectionFold {
    slots: BTreeMap<MemberId, Vec<Option<ContestantId>>>,
    holders: BTreeMap<ContestantId, MemberId>,
}

impl SelectionFold {
    fn apply(
        mut self,
        update: &SelectionUpdate,
        known: &KnownIds,
        label: &'static str,
    ) -> Result<Self, EngineError> {
        let episode = update.episode;
        known.episode(episode, label)?;
        known.member(update.member_id, episode, label)?;
        if let Some(contestant) = update.contestant_id {
            known.contestant(contestant, episode, label)?;
        }

        let slots = self.slots.entry(update.member_id).or_default();
        let previous = current(slots);
        if previous == update.contestant_id {
            debug!(
                label,
                member = %update.member_id,
                episode,
                "selection repeats the current pick; skipped"
            );
            return Ok(self);
        }
        // Only a draft pick may leave the episodes before it empty.
        if slots.is_empty() && !update.is_draft_pick && episode > 1 {
            return Err(EngineError::UndefinedSlot {
                timeline: label,
                owner: update.member_id.to_string(),
                episode: 1,
            });
        }

        write_slot(slots, episode, update.contestant_id);

        if let Some(old) = previous {
            if self.holders.get(&old) == Some(&update.member_id) {
                self.holders.remove(&old);
            }
        }

        if let Some(new) = update.contestant_id {
            if let Some(loser) = self.holders.insert(new, update.member_id) {
                if loser != update.member_id {
                    debug!(
                        label,
                        contestant = %new,
                        from = %loser,
                        to = %update.member_id,
                        episode,
                        "contestant handed off"
                    );
                    write_slot(self.slots.entry(loser).or_default(), episode, None);
                }
            }
        }

        Ok(self)
    }

    /// Carry every known member's last value through `last_episode`.
    fn finish(
        mut self,
        known: &KnownIds,
        last_episode: EpisodeNumber,
    ) -> BTreeMap<MemberId, Vec<Option<ContestantId>>> {
        for member in &known.members {
            carry_forward(self.slots.entry(*member).or_default(), last_episode);
        }
        self.slots
    }
}

/// The value in force at the end of the written slots.
fn current(slots: &[Option<ContestantId>]) -> Option<ContestantId> {
    slots.last().copied().flatten()
}

/// Extend `slots` with its current value through index `through`. An empty
/// history extends with `None`, which covers both index 0 and the episodes
/// before a draft pick.
fn carry_forward(slots: &mut Vec<Option<ContestantId>>, through: EpisodeNumber) {
    let fill = current(slots);
    while slots.len() <= through as usize {
        slots.push(fill);
    }
}

/// Set the value from `episode` onwards, replacing anything already written
/// for that episode.
fn write_slot(
    slots: &mut Vec<Option<ContestantId>>,
    episode: EpisodeNumber,
    value: Option<ContestantId>,
) {
    carry_forward(slots, episode.saturating_sub(1));
    slots.truncate(episode as usize);
    slots.push(value);
}

// ---------------------------------------------------------------------------
// Inversion
// ---------------------------------------------------------------------------

fn invert(
    member_castaways: &BTreeMap<MemberId, Vec<Option<ContestantId>>>,
    known: &KnownIds,
    last_episode: EpisodeNumber,
) -> Result<BTreeMap<ContestantId, Vec<Option<MemberId>>>, EngineError> {
    let mut castaway_members: BTreeMap<ContestantId, Vec<Option<MemberId>>> = known
        .contestants
        .iter()
        .map(|&c| (c, vec![None; last_episode as usize + 1]))
        .collect();

    for (&member, slots) in member_castaways {
        for (episode, pick) in slots.iter().enumerate() {
            let Some(contestant) = *pick else {
                continue;
            };
            let holders = castaway_members
                .entry(contestant)
                .or_insert_with(|| vec![None; last_episode as usize + 1]);
            match holders[episode] {
                Some(first) if first != member => {
                    return Err(EngineError::ConflictingHolder {
                        contestant,
                        first,
                        second: member,
                        episode: episode as EpisodeNumber,
                    });
                }
                _ => holders[episode] = Some(member),
            }
        }
    }

    Ok(castaway_members)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(members: u32, contestants: u32, episodes: u32) -> KnownIds {
        KnownIds {
            members: (1..=members).map(MemberId).collect(),
            contestants: (1..=contestants).map(ContestantId).collect(),
            tribes: Default::default(),
            episodes: (1..=episodes).collect(),
        }
    }

    fn pick(episode: EpisodeNumber, member: u32, contestant: u32, draft: bool) -> SelectionUpdate {
        SelectionUpdate {
            episode,
            member_id: MemberId(member),
            contestant_id: Some(ContestantId(contestant)),
            is_draft_pick: draft,
        }
    }

    fn drop_pick(episode: EpisodeNumber, member: u32) -> SelectionUpdate {
        SelectionUpdate {
            episode,
            member_id: MemberId(member),
            contestant_id: None,
            is_draft_pick: false,
        }
    }

    fn c(id: u32) -> Option<ContestantId> {
        Some(ContestantId(id))
    }

    fn m(id: u32) -> Option<MemberId> {
        Some(MemberId(id))
    }

    #[test]
    fn carry_forward_between_changes() {
        let updates = vec![pick(1, 1, 1, true), pick(5, 1, 2, false)];
        let timeline = SelectionTimeline::build(&updates, &known(1, 2, 5), "primary").unwrap();
        assert_eq!(
            timeline.picks_of(MemberId(1)),
            &[None, c(1), c(1), c(1), c(1), c(2)]
        );
        assert_eq!(timeline.holders_of(ContestantId(1)), &[None, m(1), m(1), m(1), m(1), None]);
        assert_eq!(timeline.holders_of(ContestantId(2)), &[None, None, None, None, None, m(1)]);
    }

    #[test]
    fn carries_through_last_episode() {
        let updates = vec![pick(2, 1, 1, true)];
        let timeline = SelectionTimeline::build(&updates, &known(1, 1, 4), "primary").unwrap();
        assert_eq!(timeline.picks_of(MemberId(1)), &[None, None, c(1), c(1), c(1)]);
        assert_eq!(timeline.pick_of(MemberId(1), 1), None);
        assert_eq!(timeline.pick_of(MemberId(1), 4), c(1));
        assert_eq!(timeline.pick_of(MemberId(1), 40), None);
    }

    #[test]
    fn repeated_pick_is_a_no_op() {
        let base = vec![pick(1, 1, 1, true), pick(6, 1, 2, false)];
        let mut replayed = base.clone();
        replayed.insert(1, pick(3, 1, 1, false));

        let k = known(1, 2, 8);
        let without = SelectionTimeline::build(&base, &k, "primary").unwrap();
        let with = SelectionTimeline::build(&replayed, &k, "primary").unwrap();
        assert_eq!(without, with);
    }

    #[test]
    fn swap_and_revert_in_one_episode_leaves_no_trace() {
        let base = vec![pick(1, 1, 1, true)];
        let noisy = vec![pick(1, 1, 1, true), pick(3, 1, 2, false), pick(3, 1, 1, false)];
        let k = known(1, 2, 4);
        assert_eq!(
            SelectionTimeline::build(&base, &k, "primary").unwrap(),
            SelectionTimeline::build(&noisy, &k, "primary").unwrap()
        );
    }

    #[test]
    fn drop_leaves_member_without_pick() {
        let updates = vec![pick(1, 1, 1, true), drop_pick(3, 1)];
        let timeline = SelectionTimeline::build(&updates, &known(1, 1, 4), "primary").unwrap();
        assert_eq!(timeline.picks_of(MemberId(1)), &[None, c(1), c(1), None, None]);
        assert_eq!(timeline.holders_of(ContestantId(1)), &[None, m(1), m(1), None, None]);
    }

    #[test]
    fn handoff_drops_previous_holder() {
        let updates = vec![pick(1, 1, 1, true), pick(1, 2, 2, true), pick(4, 2, 1, false)];
        let timeline = SelectionTimeline::build(&updates, &known(2, 2, 5), "primary").unwrap();

        assert_eq!(
            timeline.picks_of(MemberId(1)),
            &[None, c(1), c(1), c(1), None, None]
        );
        assert_eq!(
            timeline.picks_of(MemberId(2)),
            &[None, c(2), c(2), c(2), c(1), c(1)]
        );
        assert_eq!(
            timeline.holders_of(ContestantId(1)),
            &[None, m(1), m(1), m(1), m(2), m(2)]
        );
        assert_eq!(timeline.holder_of(ContestantId(2), 4), None);
    }

    #[test]
    fn member_without_updates_is_dense_null() {
        let updates = vec![pick(1, 1, 1, true)];
        let timeline = SelectionTimeline::build(&updates, &known(3, 1, 3), "primary").unwrap();
        assert_eq!(timeline.picks_of(MemberId(3)), &[None, None, None, None]);
        assert_eq!(timeline.member_castaways().len(), 3);
    }

    #[test]
    fn out_of_order_input_is_sorted_by_episode() {
        let updates = vec![pick(5, 1, 2, false), pick(1, 1, 1, true)];
        let timeline = SelectionTimeline::build(&updates, &known(1, 2, 5), "primary").unwrap();
        assert_eq!(
            timeline.picks_of(MemberId(1)),
            &[None, c(1), c(1), c(1), c(1), c(2)]
        );
    }

    #[test]
    fn unknown_member_is_fatal() {
        let updates = vec![pick(1, 9, 1, true)];
        let err = SelectionTimeline::build(&updates, &known(1, 1, 2), "primary").unwrap_err();
        assert_eq!(
            err,
            EngineError::UnknownMember {
                member: MemberId(9),
                episode: 1,
                context: "primary",
            }
        );
    }

    #[test]
    fn unknown_contestant_is_fatal() {
        let updates = vec![pick(1, 1, 4, true)];
        assert!(matches!(
            SelectionTimeline::build(&updates, &known(1, 1, 2), "primary"),
            Err(EngineError::UnknownContestant { .. })
        ));
    }

    #[test]
    fn late_first_pick_must_be_a_draft_pick() {
        let updates = vec![pick(4, 1, 1, false)];
        let err = SelectionTimeline::build(&updates, &known(1, 1, 5), "primary").unwrap_err();
        assert_eq!(
            err,
            EngineError::UndefinedSlot {
                timeline: "primary",
                owner: "member#1".into(),
                episode: 1,
            }
        );

        let drafted = vec![pick(4, 1, 1, true)];
        let timeline = SelectionTimeline::build(&drafted, &known(1, 1, 5), "primary").unwrap();
        assert_eq!(
            timeline.picks_of(MemberId(1)),
            &[None, None, None, None, c(1), c(1)]
        );
    }

    #[test]
    fn first_pick_at_episode_one_needs_no_draft_flag() {
        let updates = vec![pick(1, 1, 1, false)];
        let timeline = SelectionTimeline::build(&updates, &known(1, 1, 2), "primary").unwrap();
        assert_eq!(timeline.picks_of(MemberId(1)), &[None, c(1), c(1)]);
    }

    #[test]
    fn every_slot_defined_and_exclusive() {
        let updates = vec![
            pick(1, 1, 1, true),
            pick(1, 2, 2, true),
            pick(2, 3, 3, true),
            pick(3, 1, 3, false),
            pick(4, 3, 1, false),
            drop_pick(5, 2),
            pick(6, 2, 2, false),
            pick(6, 1, 2, false),
        ];
        let last = 7;
        let timeline = SelectionTimeline::build(&updates, &known(3, 3, last), "primary").unwrap();

        for slots in timeline.member_castaways().values() {
            assert_eq!(slots.len(), last as usize + 1);
        }
        for (contestant, holders) in timeline.castaway_members() {
            assert_eq!(holders.len(), last as usize + 1);
            for (episode, holder) in holders.iter().enumerate() {
                if let Some(holder) = holder {
                    assert_eq!(timeline.pick_of(*holder, episode as u32), Some(*contestant));
                }
            }
        }
        for episode in 1..=last {
            let mut held = Vec::new();
            for member in 1..=3 {
                if let Some(c) = timeline.pick_of(MemberId(member), episode) {
                    assert!(!held.contains(&c), "{c} held twice at episode {episode}");
                    held.push(c);
                }
            }
        }
    }
}
