// Tribe timeline: sparse roster updates folded into a per-episode roster for every tribe.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::eliminations::Eliminations;
use crate::model::{ContestantId, EpisodeNumber, TribeId, TribeUpdate};

pub type Rosters = BTreeMap<TribeId, Vec<ContestantId>>;

/// Dense tribe rosters. Index = episode; index 0 is the empty pre-season state.
///
/// A tribe appears from its first update onwards and is never removed, even
/// when its roster empties out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TribeTimeline {
    episodes: Vec<Rosters>,
}

impl TribeTimeline {
    /// Fold updates in episode order. Before applying episode `e`'s updates,
    /// anyone who left play in `e - 1` is taken off their tribe. Each update
    /// replaces its tribe's roster and pulls the listed contestants off every
    /// other tribe, so a contestant is never on two tribes at once.
    pub fn build(
        updates: &[TribeUpdate],
        eliminations: &Eliminations,
        last_episode: EpisodeNumber,
    ) -> Self {
        let mut by_episode: BTreeMap<EpisodeNumber, Vec<&TribeUpdate>> = BTreeMap::new();
        for update in updates {
            by_episode.entry(update.episode).or_default().push(update);
        }

        let mut current = Rosters::new();
        let mut episodes = Vec::with_capacity(last_episode as usize + 1);
        episodes.push(Rosters::new());

        for episode in 1..=last_episode {
            for gone in eliminations.removed_at(episode - 1) {
                for roster in current.values_mut() {
                    roster.retain(|c| c != gone);
                }
            }

            for update in by_episode.get(&episode).into_iter().flatten() {
                current = apply_update(current, update);
            }

            episodes.push(current.clone());
        }

        debug!(
            episodes = last_episode,
            tribes = current.len(),
            "tribe timeline built"
        );

        TribeTimeline { episodes }
    }

    pub fn last_episode(&self) -> EpisodeNumber {
        self.episodes.len().saturating_sub(1) as EpisodeNumber
    }

    /// Every tribe that exists at `episode`, with its roster.
    pub fn tribes_at(&self, episode: EpisodeNumber) -> Option<&Rosters> {
        self.episodes.get(episode as usize)
    }

    /// The tribe's roster at `episode`. `None` means the tribe did not exist
    /// yet; an empty slice means it exists with nobody on it.
    pub fn roster_at(&self, tribe: TribeId, episode: EpisodeNumber) -> Option<&[ContestantId]> {
        self.tribes_at(episode)
            .and_then(|rosters| rosters.get(&tribe))
            .map(Vec::as_slice)
    }

    pub fn tribe_of(&self, contestant: ContestantId, episode: EpisodeNumber) -> Option<TribeId> {
        self.tribes_at(episode)?
            .iter()
            .find(|(_, roster)| roster.contains(&contestant))
            .map(|(&tribe, _)| tribe)
    }
}

fn apply_update(mut rosters: Rosters, update: &TribeUpdate) -> Rosters {
    for (tribe, roster) in rosters.iter_mut() {
        if *tribe != update.tribe_id {
            roster.retain(|c| !update.contestant_ids.contains(c));
        }
    }

    let mut roster = Vec::with_capacity(update.contestant_ids.len());
    for &contestant in &update.contestant_ids {
        if !roster.contains(&contestant) {
            roster.push(contestant);
        }
    }
    rosters.insert(update.tribe_id, roster);
    rosters
}
