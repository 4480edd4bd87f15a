// Library root: the scoring engine for a Survivor-style fantasy league.
// Timelines are rebuilt from sparse updates, then every episode is scored
// in order into cumulative per-member totals.

pub mod eliminations;
pub mod engine;
pub mod error;
pub mod integrity;
pub mod model;
pub mod predictions;
pub mod rules;
pub mod scores;
pub mod selection;
pub mod streak;
pub mod tribes;

pub use engine::{score_season, score_with_timelines, Timelines, TribeStage};
pub use error::{EngineError, ScoringWarning};
pub use model::SeasonInput;
pub use rules::LeagueRules;
pub use scores::{SeasonScores, Standing};
