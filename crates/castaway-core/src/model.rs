// Season snapshot types: ids, episodes, roster/selection updates, events, predictions.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Episodes are numbered per season starting at 1.
pub type EpisodeNumber = u32;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(
    /// A league participant.
    MemberId,
    "member#"
);
id_type!(
    /// A contestant on the show.
    ContestantId,
    "contestant#"
);
id_type!(
    /// A tribe within a season.
    TribeId,
    "tribe#"
);
id_type!(
    /// A league-defined custom event rule.
    CustomRuleId,
    "custom#"
);

// ---------------------------------------------------------------------------
// Season entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub number: EpisodeNumber,
    #[serde(default)]
    pub air_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_merge: bool,
    #[serde(default)]
    pub is_finale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contestant {
    pub id: ContestantId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tribe {
    pub id: TribeId,
    pub name: String,
    /// Display color, e.g. "#f2c230".
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Sparse updates
// ---------------------------------------------------------------------------

/// "As of this episode, these contestants are the members of this tribe."
/// Replaces the tribe's roster; does not append to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TribeUpdate {
    pub episode: EpisodeNumber,
    pub tribe_id: TribeId,
    pub contestant_ids: Vec<ContestantId>,
}

/// "As of this episode, this member's active pick is this contestant."
/// A `None` contestant is an explicit drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionUpdate {
    pub episode: EpisodeNumber,
    pub member_id: MemberId,
    pub contestant_id: Option<ContestantId>,
    #[serde(default)]
    pub is_draft_pick: bool,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The entity an event or prediction is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum Reference {
    Contestant(ContestantId),
    Tribe(TribeId),
    Member(MemberId),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Contestant(id) => write!(f, "{id}"),
            Reference::Tribe(id) => write!(f, "{id}"),
            Reference::Member(id) => write!(f, "{id}"),
        }
    }
}

/// Built-in show events every league can put points on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaseEventName {
    AdvFound,
    AdvPlay,
    BadAdvPlay,
    AdvElim,
    SpokeEpTitle,
    Tribe1st,
    Tribe2nd,
    IndivWin,
    IndivReward,
    Finalists,
    FireWin,
    SoleSurvivor,
    Elim,
    NoVoteExit,
}

impl BaseEventName {
    /// Whether the event takes the referenced contestant out of play.
    pub fn removes_from_play(&self) -> bool {
        matches!(self, BaseEventName::Elim | BaseEventName::NoVoteExit)
    }
}

impl fmt::Display for BaseEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BaseEventName::AdvFound => "advFound",
            BaseEventName::AdvPlay => "advPlay",
            BaseEventName::BadAdvPlay => "badAdvPlay",
            BaseEventName::AdvElim => "advElim",
            BaseEventName::SpokeEpTitle => "spokeEpTitle",
            BaseEventName::Tribe1st => "tribe1st",
            BaseEventName::Tribe2nd => "tribe2nd",
            BaseEventName::IndivWin => "indivWin",
            BaseEventName::IndivReward => "indivReward",
            BaseEventName::Finalists => "finalists",
            BaseEventName::FireWin => "fireWin",
            BaseEventName::SoleSurvivor => "soleSurvivor",
            BaseEventName::Elim => "elim",
            BaseEventName::NoVoteExit => "noVoteExit",
        };
        f.write_str(name)
    }
}

/// What happened: a built-in event or one of the league's custom events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Base(BaseEventName),
    Custom(CustomRuleId),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Base(name) => write!(f, "{name}"),
            EventKind::Custom(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeEvent {
    pub episode: EpisodeNumber,
    pub kind: EventKind,
    pub reference: Reference,
    #[serde(default)]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Predictions and saves
// ---------------------------------------------------------------------------

/// When a prediction may be made and how long it stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PredictionTiming {
    Draft,
    Weekly,
    WeeklyPremerge,
    WeeklyPostmerge,
    BeforeMerge,
    AfterMerge,
    BeforeFinale,
}

impl PredictionTiming {
    /// Weekly predictions only cover the episode they were made for; the rest
    /// stay open until an event of the predicted kind settles them.
    pub fn is_weekly(&self) -> bool {
        matches!(
            self,
            PredictionTiming::Weekly
                | PredictionTiming::WeeklyPremerge
                | PredictionTiming::WeeklyPostmerge
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// The episode the prediction was made for.
    pub episode: EpisodeNumber,
    pub member_id: MemberId,
    pub kind: EventKind,
    pub timing: PredictionTiming,
    pub reference: Reference,
    #[serde(default)]
    pub bet: Option<i32>,
}

/// A member staking one of their saves on their pick surviving this episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotInTheDark {
    pub episode: EpisodeNumber,
    pub member_id: MemberId,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything the engine needs for one league in one season, already fetched
/// and ordered by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonInput {
    pub episodes: Vec<Episode>,
    pub contestants: Vec<Contestant>,
    pub tribes: Vec<Tribe>,
    pub members: Vec<Member>,
    #[serde(default)]
    pub tribe_updates: Vec<TribeUpdate>,
    #[serde(default)]
    pub selections: Vec<SelectionUpdate>,
    #[serde(default)]
    pub secondary_selections: Vec<SelectionUpdate>,
    #[serde(default)]
    pub events: Vec<EpisodeEvent>,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub shots: Vec<ShotInTheDark>,
}

impl SeasonInput {
    /// The highest episode number the season knows about.
    pub fn last_episode(&self) -> EpisodeNumber {
        self.episodes.iter().map(|e| e.number).max().unwrap_or(0)
    }

    /// The merge episode number, if one has been flagged.
    pub fn merge_episode(&self) -> Option<EpisodeNumber> {
        self.episodes.iter().filter(|e| e.is_merge).map(|e| e.number).min()
    }

    /// The finale episode number, if one has been flagged.
    pub fn finale_episode(&self) -> Option<EpisodeNumber> {
        self.episodes.iter().filter(|e| e.is_finale).map(|e| e.number).min()
    }
}
