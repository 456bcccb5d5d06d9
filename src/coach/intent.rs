// ABOUTME: Regex-based intent classifier for the deterministic coach fallback
// ABOUTME: Maps one utterance to a closed set of intents, each bound to exactly one tool call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Intent Classification
//!
//! Rules are tried in a fixed order and the first match wins, so the same
//! utterance always yields the same intent.

use regex::{Captures, Regex};
use serde_json::{json, Value};

use crate::constants::tools::{
    GET_EXERCISE_REPORT, GET_TODAY_SUMMARY, LOG_SET, SET_SOUND, SET_UNIT, SUGGEST_WORKOUT,
};
use crate::models::WeightUnit;

const UNIT: &str = r"kgs?|kilos?|kilograms?|lbs?|pounds?";

/// What the user asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Record a set
    LogSet {
        /// Exercise name
        exercise: String,
        /// Repetitions
        reps: u32,
        /// Weight as spoken
        weight: f64,
        /// Unit if stated
        unit: Option<WeightUnit>,
    },
    /// Summarize today
    TodaySummary,
    /// Report on one exercise
    ExerciseReport {
        /// Exercise name
        exercise: String,
    },
    /// Switch weight unit
    ChangeUnit {
        /// Requested unit
        unit: WeightUnit,
    },
    /// Sound on, off, or toggle when `None`
    ToggleSound {
        /// Requested state
        enabled: Option<bool>,
    },
    /// Ask what to train
    CoachingSuggestion,
    /// Nothing matched
    Unrecognized,
}

impl Intent {
    /// Stable intent name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LogSet { .. } => "log_set",
            Self::TodaySummary => "today_summary",
            Self::ExerciseReport { .. } => "exercise_report",
            Self::ChangeUnit { .. } => "change_unit",
            Self::ToggleSound { .. } => "toggle_sound",
            Self::CoachingSuggestion => "coaching_suggestion",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// The single tool call this intent maps to
    #[must_use]
    pub fn tool_call(&self) -> Option<(&'static str, Value)> {
        match self {
            Self::LogSet {
                exercise,
                reps,
                weight,
                unit,
            } => {
                let mut args = json!({"exercise": exercise, "reps": reps, "weight": weight});
                if let Some(unit) = unit {
                    args["unit"] = json!(unit);
                }
                Some((LOG_SET, args))
            }
            Self::TodaySummary => Some((GET_TODAY_SUMMARY, json!({}))),
            Self::ExerciseReport { exercise } => {
                Some((GET_EXERCISE_REPORT, json!({"exercise": exercise})))
            }
            Self::ChangeUnit { unit } => Some((SET_UNIT, json!({"unit": unit}))),
            Self::ToggleSound { enabled } => Some((
                SET_SOUND,
                enabled.map_or_else(|| json!({}), |enabled| json!({"enabled": enabled})),
            )),
            Self::CoachingSuggestion => Some((SUGGEST_WORKOUT, json!({}))),
            Self::Unrecognized => None,
        }
    }
}

/// Ordered rule set
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    log_set: Vec<Regex>,
    change_unit: Regex,
    sound: Regex,
    sound_off: Regex,
    sound_on: Regex,
    today_summary: Regex,
    exercise_report: Vec<Regex>,
    suggestion: Regex,
}

impl IntentClassifier {
    /// Compile the rule set
    ///
    /// # Errors
    ///
    /// Returns an error if a rule fails to compile
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            log_set: vec![
                // "log bench press 5 reps at 80kg", "squat 5x100", "deadlift 3 reps 140"
                Regex::new(&format!(
                    r"^(?:(?:log|record|add|did)\s+)?(?P<exercise>[a-z][a-z ]*?)\s+(?P<reps>\d+)\s*(?:reps?|x)?\s*(?:at|@|with|x|of)?\s*(?P<weight>\d+(?:\.\d+)?)\s*(?P<unit>{UNIT})?$"
                ))?,
                // "did 5 reps of squat at 100"
                Regex::new(&format!(
                    r"^(?:(?:log|record|add|did)\s+)?(?P<reps>\d+)\s*reps?\s+(?:of\s+)?(?P<exercise>[a-z][a-z ]*?)\s+(?:at|@|with)\s+(?P<weight>\d+(?:\.\d+)?)\s*(?P<unit>{UNIT})?$"
                ))?,
            ],
            change_unit: Regex::new(&format!(
                r"\b(?:switch|change|set|use|convert)\b.*?\b(?P<unit>{UNIT})\b"
            ))?,
            sound: Regex::new(r"\b(?:sounds?|audio|beeps?|mute|unmute)\b")?,
            sound_off: Regex::new(r"\b(?:off|mute|disable|silence|stop)\b")?,
            sound_on: Regex::new(r"\b(?:on|unmute|enable|start)\b")?,
            today_summary: Regex::new(
                r"\bsummary\b|\bwhat did i do today\b|\btoday'?s (?:workout|session|sets|training)\b|\bhow did i do today\b",
            )?,
            exercise_report: vec![
                Regex::new(
                    r"^(?:how is|how's|hows) my (?P<exercise>[a-z][a-z ]*?) (?:going|progressing|doing|coming along)$",
                )?,
                Regex::new(
                    r"^(?:(?:show|get|give me)\s+)?(?:my\s+)?(?P<exercise>[a-z][a-z ]*?) (?:report|progress|history|stats)$",
                )?,
                Regex::new(
                    r"^(?:report|progress|history|stats) (?:for|on) (?:my\s+)?(?P<exercise>[a-z][a-z ]*)$",
                )?,
            ],
            suggestion: Regex::new(
                r"\bwhat should i (?:train|do|lift|work on)\b|\bsuggest\b|\brecommend\b|\bnext workout\b|\bwhat next\b",
            )?,
        })
    }

    /// Classify one utterance
    #[must_use]
    pub fn classify(&self, utterance: &str) -> Intent {
        let text = normalize(utterance);
        if text.is_empty() {
            return Intent::Unrecognized;
        }

        if let Some(intent) = self.log_set.iter().find_map(|rule| {
            rule.captures(&text).and_then(|caps| log_set_from(&caps))
        }) {
            return intent;
        }

        if let Some(unit) = self
            .change_unit
            .captures(&text)
            .and_then(|caps| caps.name("unit").and_then(|m| WeightUnit::parse(m.as_str())))
        {
            return Intent::ChangeUnit { unit };
        }

        if self.sound.is_match(&text) {
            let enabled = if text.contains("unmute") {
                Some(true)
            } else if self.sound_off.is_match(&text) {
                Some(false)
            } else if self.sound_on.is_match(&text) {
                Some(true)
            } else {
                None
            };
            return Intent::ToggleSound { enabled };
        }

        if self.today_summary.is_match(&text) {
            return Intent::TodaySummary;
        }

        if let Some(exercise) = self.exercise_report.iter().find_map(|rule| {
            rule.captures(&text)
                .and_then(|caps| caps.name("exercise").map(|m| m.as_str().trim().to_owned()))
        }) {
            return Intent::ExerciseReport { exercise };
        }

        if self.suggestion.is_match(&text) {
            return Intent::CoachingSuggestion;
        }

        Intent::Unrecognized
    }
}

fn normalize(utterance: &str) -> String {
    utterance
        .to_lowercase()
        .replace('\u{2019}', "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', '!', '?'])
        .to_owned()
}

fn log_set_from(caps: &Captures<'_>) -> Option<Intent> {
    let exercise = caps.name("exercise")?.as_str().trim().to_owned();
    let reps = caps.name("reps")?.as_str().parse::<u32>().ok()?;
    let weight = caps.name("weight")?.as_str().parse::<f64>().ok()?;
    let unit = caps.name("unit").and_then(|m| WeightUnit::parse(m.as_str()));
    Some(Intent::LogSet {
        exercise,
        reps,
        weight,
        unit,
    })
}
