// ABOUTME: Coach block model, the structured UI units carried by turn responses and events
// ABOUTME: Tagged sum type covering status, metrics, suggestions and domain result blocks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::messages::DEFAULT_SUGGESTIONS;

/// Weight unit preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    /// Kilograms
    #[default]
    Kg,
    /// Pounds
    Lb,
}

impl WeightUnit {
    const KG_PER_LB: f64 = 0.453_592_37;

    /// Wire name of the unit
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::Lb => "lb",
        }
    }

    /// Parse a user-supplied unit name (`kg`, `kgs`, `kilos`, `lb`, `lbs`, `pounds`)
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilo" | "kilos" | "kilogram" | "kilograms" => Some(Self::Kg),
            "lb" | "lbs" | "pound" | "pounds" => Some(Self::Lb),
            _ => None,
        }
    }

    /// Convert a weight expressed in `self` into `target`
    #[must_use]
    pub fn convert(self, weight: f64, target: Self) -> f64 {
        match (self, target) {
            (Self::Kg, Self::Lb) => weight / Self::KG_PER_LB,
            (Self::Lb, Self::Kg) => weight * Self::KG_PER_LB,
            _ => weight,
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual tone of a status block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    /// Neutral information
    Info,
    /// Something completed
    Success,
    /// Attention needed
    Warning,
    /// Something failed
    Error,
}

/// One label/value pair of a metrics block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricItem {
    /// Metric label
    pub label: String,
    /// Pre-formatted metric value
    pub value: String,
}

impl MetricItem {
    /// Create a metric item
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A structured UI unit
///
/// Blocks are append-only within a turn and are rendered in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoachBlock {
    /// Status line with a tone
    Status {
        /// Visual tone
        tone: StatusTone,
        /// Short title
        title: String,
        /// Longer description
        description: String,
    },
    /// Table of metrics
    Metrics {
        /// Block title
        title: String,
        /// Metric rows
        items: Vec<MetricItem>,
    },
    /// Follow-up prompts the user can tap
    Suggestions {
        /// Prompt texts
        prompts: Vec<String>,
    },
    /// A set was recorded
    SetLogged {
        /// Exercise name
        exercise: String,
        /// Repetitions
        reps: u32,
        /// Weight lifted
        weight: f64,
        /// Unit of `weight`
        unit: WeightUnit,
    },
    /// History of one exercise
    ExerciseReport {
        /// Exercise name
        exercise: String,
        /// Number of logged sets
        sessions: u32,
        /// Heaviest logged weight
        #[serde(default, skip_serializing_if = "Option::is_none")]
        best_weight: Option<f64>,
        /// Sum of reps times weight
        total_volume: f64,
        /// Unit of the weights
        unit: WeightUnit,
    },
    /// Preferences changed
    PreferencesUpdated {
        /// Current unit
        unit: WeightUnit,
        /// Current sound setting
        sound_enabled: bool,
    },
}

impl CoachBlock {
    /// Create a status block
    #[must_use]
    pub fn status(tone: StatusTone, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Status {
            tone,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Create an error-tone status block
    #[must_use]
    pub fn error_status(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::status(StatusTone::Error, title, description)
    }

    /// Create a suggestions block
    #[must_use]
    pub fn suggestions<I, S>(prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Suggestions {
            prompts: prompts.into_iter().map(Into::into).collect(),
        }
    }

    /// The suggestions block substituted whenever a turn has nothing else to show
    #[must_use]
    pub fn default_suggestions() -> Self {
        Self::suggestions(DEFAULT_SUGGESTIONS)
    }

    /// Wire name of the block type
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Metrics { .. } => "metrics",
            Self::Suggestions { .. } => "suggestions",
            Self::SetLogged { .. } => "set_logged",
            Self::ExerciseReport { .. } => "exercise_report",
            Self::PreferencesUpdated { .. } => "preferences_updated",
        }
    }

    /// Whether this is an error-tone status block
    #[must_use]
    pub const fn is_error_status(&self) -> bool {
        matches!(
            self,
            Self::Status {
                tone: StatusTone::Error,
                ..
            }
        )
    }
}
