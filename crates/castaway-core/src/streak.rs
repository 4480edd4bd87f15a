// Survival streaks: consecutive episodes a member's pick stayed in the game.

use serde::Serialize;

use crate::rules::SurvivalSettings;

/// A member's streak after some episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    /// Consecutive episodes survived. Not capped; only the bonus is.
    pub current: u32,
    pub shots_used: u32,
}

/// What happened to a member's pick in one episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// No pick, or a pick that is already out of play.
    Idle,
    Survived,
    Eliminated {
        /// The member staked a shot in the dark on this episode.
        shot_played: bool,
        /// The pick comes back later in the season.
        returns: bool,
    },
}

/// Whether a played shot in the dark did anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotResult {
    NotPlayed,
    Saved,
    /// Played but not applied; the shot is not used up.
    Unused(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakStep {
    pub state: StreakState,
    pub bonus: i32,
    pub shot: ShotResult,
}

/// Points a streak earns in one episode.
pub fn streak_bonus(streak: u32, cap: u32) -> i32 {
    i32::try_from(streak.min(cap)).unwrap_or(i32::MAX)
}

/// Advance one member's streak by one episode.
///
/// Surviving extends the streak and earns `min(streak, cap)`. An elimination
/// resets it to zero unless a shot in the dark saves it (the episode then
/// counts as survived), or the pick later returns and the league preserves
/// streaks across re-entry (the streak is held, earning nothing).
pub fn advance(
    state: StreakState,
    outcome: PickOutcome,
    settings: &SurvivalSettings,
) -> StreakStep {
    match outcome {
        PickOutcome::Idle => StreakStep {
            state,
            bonus: 0,
            shot: ShotResult::NotPlayed,
        },
        PickOutcome::Survived => survive(state, settings, ShotResult::NotPlayed),
        PickOutcome::Eliminated {
            shot_played,
            returns,
        } => {
            let shot = if !shot_played {
                ShotResult::NotPlayed
            } else if state.shots_used < settings.shots_allowed {
                ShotResult::Saved
            } else {
                ShotResult::Unused("no shots in the dark left")
            };

            if shot == ShotResult::Saved {
                let saved = StreakState {
                    shots_used: state.shots_used + 1,
                    ..state
                };
                return survive(saved, settings, shot);
            }

            let current = if returns && settings.preserve_across_reentry {
                state.current
            } else {
                0
            };
            StreakStep {
                state: StreakState { current, ..state },
                bonus: 0,
                shot,
            }
        }
    }
}

fn survive(state: StreakState, settings: &SurvivalSettings, shot: ShotResult) -> StreakStep {
    let current = state.current.saturating_add(1);
    StreakStep {
        state: StreakState { current, ..state },
        bonus: streak_bonus(current, settings.cap),
        shot,
    }
}
