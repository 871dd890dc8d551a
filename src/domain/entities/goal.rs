use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    Low,
    Medium,
    High,
}

impl GoalPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalPriority::Low => "low",
            GoalPriority::Medium => "medium",
            GoalPriority::High => "high",
        }
    }
}

impl std::str::FromStr for GoalPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(GoalPriority::Low),
            "medium" => Ok(GoalPriority::Medium),
            "high" => Ok(GoalPriority::High),
            other => Err(format!("unknown goal priority: {}", other)),
        }
    }
}

/// A trading goal with a measurable target.
///
/// `goal_type` and `category` are free-form labels chosen by the user; the
/// service stores them as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    #[serde(rename = "type")]
    pub goal_type: String,
    pub target: f64,
    pub current: f64,
    pub deadline: String,
    pub description: String,
    pub is_active: bool,
    pub priority: GoalPriority,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    /// Progress toward the target, clamped to 0..=100.
    pub fn progress_percent(&self) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        (self.current / self.target * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDraft {
    #[serde(rename = "type")]
    pub goal_type: String,
    pub target: f64,
    #[serde(default)]
    pub current: f64,
    pub deadline: String,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
    pub priority: GoalPriority,
    pub category: String,
}

impl GoalDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.target.is_finite() || !self.current.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        if self.target < 0.0 || self.current < 0.0 {
            return Err(ValidationError::MustBeNonNegative);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdate {
    #[serde(rename = "type")]
    pub goal_type: Option<String>,
    pub target: Option<f64>,
    pub current: Option<f64>,
    pub deadline: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub priority: Option<GoalPriority>,
    pub category: Option<String>,
}

impl GoalUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for value in [self.target, self.current].into_iter().flatten() {
            if !value.is_finite() {
                return Err(ValidationError::MustBeFinite);
            }
            if value < 0.0 {
                return Err(ValidationError::MustBeNonNegative);
            }
        }
        Ok(())
    }
}
