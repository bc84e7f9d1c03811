//! Weight vectors and score records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::target::TargetKey;
use crate::settings::ConfigError;

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Relative importance of the five score components.
///
/// Must be validated before use; it is never normalized on the caller's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub speed: f64,
    pub efficiency: f64,
    pub cost: f64,
    pub capability: f64,
    pub recency: f64,
}

impl WeightVector {
    pub const DEFAULT: Self = Self {
        speed: 0.25,
        efficiency: 0.20,
        cost: 0.25,
        capability: 0.20,
        recency: 0.10,
    };

    /// Build and validate a weight vector.
    pub fn new(
        speed: f64,
        efficiency: f64,
        cost: f64,
        capability: f64,
        recency: f64,
    ) -> Result<Self, ConfigError> {
        let weights = Self {
            speed,
            efficiency,
            cost,
            capability,
            recency,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Component weights paired with their names, in scoring order.
    pub const fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("speed", self.speed),
            ("efficiency", self.efficiency),
            ("cost", self.cost),
            ("capability", self.capability),
            ("recency", self.recency),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.speed + self.efficiency + self.cost + self.capability + self.recency
    }

    /// Each weight finite and non-negative, total within tolerance of 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (component, weight) in self.named() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight { component, weight });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-component scores, each in `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub speed: f64,
    pub efficiency: f64,
    pub cost: f64,
    pub capability: f64,
    pub recency: f64,
}

/// Either a numeric score or an explicit statement that none could be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreOutcome {
    Scored {
        components: ScoreComponents,
        /// In `[0, 100]`.
        composite: f64,
    },
    Unscored {
        reason: String,
    },
}

/// Output of the scoring engine for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub target: TargetKey,
    pub weights: WeightVector,
    pub outcome: ScoreOutcome,
    pub computed_at: DateTime<Utc>,
    /// SHA-256 over the canonical scoring inputs.
    pub calculation_hash: String,
}

impl ScoreRecord {
    pub const fn composite(&self) -> Option<f64> {
        match &self.outcome {
            ScoreOutcome::Scored { composite, .. } => Some(*composite),
            ScoreOutcome::Unscored { .. } => None,
        }
    }

    pub const fn components(&self) -> Option<&ScoreComponents> {
        match &self.outcome {
            ScoreOutcome::Scored { components, .. } => Some(components),
            ScoreOutcome::Unscored { .. } => None,
        }
    }

    pub const fn is_scored(&self) -> bool {
        matches!(self.outcome, ScoreOutcome::Scored { .. })
    }

    /// Model-name suffix such as `(SC:5.1)`, on a 0-10 scale.
    pub fn score_suffix(&self) -> Option<String> {
        self.composite()
            .map(|composite| format!("(SC:{:.1})", composite / 10.0))
    }
}
