// Fatal data-integrity errors and non-fatal scoring warnings.

use serde::Serialize;
use thiserror::Error;

use crate::model::{
    BaseEventName, ContestantId, EpisodeNumber, EventKind, MemberId, PredictionTiming, Reference,
    TribeId,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Any of these aborts the whole computation; no partial scores are returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{context} at episode {episode} references unknown {member}")]
    UnknownMember {
        member: MemberId,
        episode: EpisodeNumber,
        context: &'static str,
    },

    #[error("{context} at episode {episode} references unknown {contestant}")]
    UnknownContestant {
        contestant: ContestantId,
        episode: EpisodeNumber,
        context: &'static str,
    },

    #[error("{context} at episode {episode} references unknown {tribe}")]
    UnknownTribe {
        tribe: TribeId,
        episode: EpisodeNumber,
        context: &'static str,
    },

    #[error("{context} references episode {episode}, which is not part of the season")]
    UnknownEpisode {
        episode: EpisodeNumber,
        context: &'static str,
    },

    #[error("{timeline} timeline left episode {episode} undefined for {owner}")]
    UndefinedSlot {
        timeline: &'static str,
        owner: String,
        episode: EpisodeNumber,
    },

    #[error("{contestant} is held by both {first} and {second} at episode {episode}")]
    ConflictingHolder {
        contestant: ContestantId,
        first: MemberId,
        second: MemberId,
        episode: EpisodeNumber,
    },

    #[error("invalid league rules: `{field}` {message}")]
    InvalidRules { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Imperfect administrative data that is skipped rather than fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "camelCase")]
pub enum ScoringWarning {
    /// Nobody could be credited for the event at that episode.
    UnresolvableReference {
        episode: EpisodeNumber,
        kind: EventKind,
        reference: Reference,
    },
    /// The league has no rule for this event kind; it scores zero.
    MissingRule {
        episode: EpisodeNumber,
        kind: EventKind,
    },
    /// A prediction whose timing is not allowed or was made outside its window.
    PredictionOutsideWindow {
        episode: EpisodeNumber,
        member: MemberId,
        kind: EventKind,
        timing: PredictionTiming,
    },
    /// A shot in the dark was played but could not be applied.
    UnusedShot {
        episode: EpisodeNumber,
        member: MemberId,
        reason: &'static str,
    },
    /// A removal event for a contestant who was already out of play.
    RepeatElimination {
        episode: EpisodeNumber,
        contestant: ContestantId,
        event: BaseEventName,
    },
    /// The secondary pick equals the primary pick and earns nothing twice.
    SecondaryMatchesPrimary {
        episode: EpisodeNumber,
        member: MemberId,
        contestant: ContestantId,
    },
}

impl ScoringWarning {
    /// Emit the warning through `tracing` and keep it for the caller.
    pub(crate) fn record(self, sink: &mut Vec<ScoringWarning>) {
        tracing::warn!(warning = ?self, "scoring warning");
        sink.push(self);
    }
}
