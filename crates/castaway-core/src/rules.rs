// League rule configuration: point values, predictability, survival and secondary-pick settings.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{BaseEventName, CustomRuleId, EventKind, PredictionTiming};

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

/// Points for predicting an event correctly, and when such predictions may be made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRule {
    pub points: i32,
    pub timings: Vec<PredictionTiming>,
    /// Whether members may wager on this prediction.
    #[serde(default)]
    pub betting: bool,
}

impl PredictionRule {
    pub fn allows(&self, timing: PredictionTiming) -> bool {
        self.timings.contains(&timing)
    }
}

/// Points for one built-in event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRule {
    pub event: BaseEventName,
    pub points: i32,
    #[serde(default)]
    pub prediction: Option<PredictionRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomEventType {
    /// Scored whenever it happens.
    Direct,
    /// Only scored through predictions.
    Prediction,
}

/// A league-defined event ("cried at tribal", "found a clue", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    pub id: CustomRuleId,
    pub name: String,
    pub event_type: CustomEventType,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub prediction: Option<PredictionRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurvivalSettings {
    /// Most bonus points a streak can earn in one episode.
    pub cap: u32,
    /// A pick's redemption re-entry does not break their member's streak.
    #[serde(default)]
    pub preserve_across_reentry: bool,
    /// Shots in the dark each member may use in a season.
    #[serde(default)]
    pub shots_allowed: u32,
}

impl Default for SurvivalSettings {
    fn default() -> Self {
        SurvivalSettings {
            cap: 5,
            preserve_across_reentry: false,
            shots_allowed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryPickSettings {
    pub enabled: bool,
    /// Integer percentage applied to secondary-pick points (150 = 1.5x).
    pub multiplier_percent: u32,
}

impl Default for SecondaryPickSettings {
    fn default() -> Self {
        SecondaryPickSettings {
            enabled: false,
            multiplier_percent: 100,
        }
    }
}

impl SecondaryPickSettings {
    /// Scale points by the multiplier, rounding half away from zero.
    pub fn scale(&self, points: i32) -> i32 {
        let scaled = i64::from(points) * i64::from(self.multiplier_percent);
        let rounded = (scaled + scaled.signum() * 50) / 100;
        rounded.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }
}

/// Everything a league configures about scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueRules {
    #[serde(default)]
    pub base: Vec<BaseRule>,
    #[serde(default)]
    pub custom: Vec<CustomRule>,
    #[serde(default)]
    pub survival: SurvivalSettings,
    #[serde(default)]
    pub secondary_pick: SecondaryPickSettings,
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// How the league scores one event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleLookup<'a> {
    /// Awards `points` whenever it happens; may also be predictable.
    Scored {
        points: i32,
        prediction: Option<&'a PredictionRule>,
    },
    /// Never scored directly, only settles predictions.
    PredictionOnly(&'a PredictionRule),
    /// The league has no rule for this kind.
    Missing,
}

impl<'a> RuleLookup<'a> {
    pub fn prediction(&self) -> Option<&'a PredictionRule> {
        match *self {
            RuleLookup::Scored { prediction, .. } => prediction,
            RuleLookup::PredictionOnly(rule) => Some(rule),
            RuleLookup::Missing => None,
        }
    }
}

impl LeagueRules {
    /// Resolve the rule for an event kind.
    pub fn resolve(&self, kind: &EventKind) -> RuleLookup<'_> {
        match kind {
            EventKind::Base(name) => match self.base.iter().find(|r| r.event == *name) {
                Some(rule) => RuleLookup::Scored {
                    points: rule.points,
                    prediction: rule.prediction.as_ref(),
                },
                None => RuleLookup::Missing,
            },
            EventKind::Custom(id) => match self.custom.iter().find(|r| r.id == *id) {
                Some(CustomRule {
                    event_type: CustomEventType::Direct,
                    points,
                    prediction,
                    ..
                }) => RuleLookup::Scored {
                    points: *points,
                    prediction: prediction.as_ref(),
                },
                Some(CustomRule {
                    event_type: CustomEventType::Prediction,
                    prediction: Some(rule),
                    ..
                }) => RuleLookup::PredictionOnly(rule),
                Some(CustomRule {
                    event_type: CustomEventType::Prediction,
                    prediction: None,
                    ..
                })
                | None => RuleLookup::Missing,
            },
        }
    }

    /// Reject rule sets the engine cannot score consistently.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen_base = HashSet::new();
        for rule in &self.base {
            if !seen_base.insert(rule.event) {
                return Err(invalid(
                    format!("base.{}", rule.event),
                    "is configured more than once",
                ));
            }
            if let Some(prediction) = &rule.prediction {
                check_prediction(&format!("base.{}.prediction", rule.event), prediction)?;
            }
        }

        let mut seen_custom = HashSet::new();
        for rule in &self.custom {
            let field = format!("custom.{}", rule.id.0);
            if !seen_custom.insert(rule.id) {
                return Err(invalid(field, "is configured more than once"));
            }
            if rule.name.trim().is_empty() {
                return Err(invalid(format!("{field}.name"), "must not be empty"));
            }
            match (&rule.event_type, &rule.prediction) {
                (CustomEventType::Prediction, None) => {
                    return Err(invalid(
                        format!("{field}.prediction"),
                        "is required for prediction-type events",
                    ));
                }
                (_, Some(prediction)) => {
                    check_prediction(&format!("{field}.prediction"), prediction)?
                }
                (CustomEventType::Direct, None) => {}
            }
        }

        if self.secondary_pick.enabled && self.secondary_pick.multiplier_percent == 0 {
            return Err(invalid(
                "secondary_pick.multiplier_percent".into(),
                "must be > 0 when the secondary pick is enabled",
            ));
        }

        Ok(())
    }
}

fn check_prediction(field: &str, rule: &PredictionRule) -> Result<(), EngineError> {
    if rule.timings.is_empty() {
        return Err(invalid(
            format!("{field}.timings"),
            "must list at least one timing",
        ));
    }
    Ok(())
}

fn invalid(field: String, message: &str) -> EngineError {
    EngineError::InvalidRules {
        field,
        message: message.to_string(),
    }
}
