// ABOUTME: In-memory workout tools backing the coach: set logging, summaries, reports, preferences
// ABOUTME: Per-subject state lives in DashMaps so one instance serves concurrent turns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # In-Memory Workout Tools
//!
//! Reference implementations of the six coach tools:
//! - `log_set` - Record a performed set
//! - `get_today_summary` - Summarize today's sets
//! - `get_exercise_report` - History of one exercise
//! - `set_unit` - Switch between kg and lb
//! - `set_sound` - Toggle sound feedback
//! - `suggest_workout` - Propose what to train next
//!
//! Weights are stored in kilograms and converted to the subject's unit on
//! the way out.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;
use serde_json::{json, Value};
use tracing::debug;

use crate::constants::tools::{
    GET_EXERCISE_REPORT, GET_TODAY_SUMMARY, LOG_SET, SET_SOUND, SET_UNIT, SUGGEST_WORKOUT,
};
use crate::errors::ToolError;
use crate::models::{CoachBlock, MetricItem, StatusTone, WeightUnit};

use super::registry::ToolRegistry;
use super::traits::{CoachTool, ToolCapabilities};
use super::{ProgressSink, ToolContext, ToolOutput};

/// Exercise suggested when a subject has no history
const STARTER_EXERCISE: &str = "squat";

// ============================================================================
// Store
// ============================================================================

/// One recorded set
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedSet {
    /// Normalized exercise name
    pub exercise: String,
    /// Repetitions
    pub reps: u32,
    /// Weight in kilograms
    pub weight_kg: f64,
    /// When the set was logged
    pub logged_at: DateTime<Utc>,
}

/// Preference overrides persisted by `set_unit` / `set_sound`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredPreferences {
    /// Weight unit
    pub unit: WeightUnit,
    /// Sound feedback
    pub sound_enabled: bool,
}

/// Per-subject set log and preferences
#[derive(Debug, Default)]
pub struct InMemoryWorkoutTools {
    sets: DashMap<String, Vec<LoggedSet>>,
    preferences: DashMap<String, StoredPreferences>,
}

impl InMemoryWorkoutTools {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry exposing every workout tool over this store
    ///
    /// # Errors
    ///
    /// Returns `ToolError::AlreadyRegistered` if two tools share a name
    pub fn registry(self: &Arc<Self>) -> Result<ToolRegistry, ToolError> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(LogSetTool::new(Arc::clone(self))))?;
        registry.register(Arc::new(TodaySummaryTool::new(Arc::clone(self))))?;
        registry.register(Arc::new(ExerciseReportTool::new(Arc::clone(self))))?;
        registry.register(Arc::new(SetUnitTool::new(Arc::clone(self))))?;
        registry.register(Arc::new(SetSoundTool::new(Arc::clone(self))))?;
        registry.register(Arc::new(SuggestWorkoutTool::new(Arc::clone(self))))?;
        debug!(tools = registry.len(), "Workout tool registry ready");
        Ok(registry)
    }

    /// Record a set for `subject`
    pub fn record_set(&self, subject: &str, set: LoggedSet) {
        self.sets.entry(subject.to_owned()).or_default().push(set);
    }

    /// All sets logged by `subject`, oldest first
    #[must_use]
    pub fn sets_for(&self, subject: &str) -> Vec<LoggedSet> {
        self.sets
            .get(subject)
            .map(|sets| sets.value().clone())
            .unwrap_or_default()
    }

    /// Stored overrides take precedence over the preferences sent with the turn
    #[must_use]
    pub fn effective_preferences(&self, context: &ToolContext) -> StoredPreferences {
        self.preferences
            .get(&context.subject)
            .map_or(
                StoredPreferences {
                    unit: context.preferences.unit,
                    sound_enabled: context.preferences.sound_enabled,
                },
                |stored| *stored.value(),
            )
    }

    fn update_preferences(
        &self,
        context: &ToolContext,
        update: impl FnOnce(&mut StoredPreferences),
    ) -> StoredPreferences {
        let mut current = self.effective_preferences(context);
        update(&mut current);
        self.preferences.insert(context.subject.clone(), current);
        current
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn normalize_exercise(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn format_weight(weight: f64) -> String {
    if (weight.fract()).abs() < f64::EPSILON {
        format!("{weight:.0}")
    } else {
        format!("{weight:.1}")
    }
}

fn local_date(at: DateTime<Utc>, offset_minutes: Option<i32>) -> NaiveDate {
    (at + Duration::minutes(i64::from(offset_minutes.unwrap_or(0)))).date_naive()
}

fn required_str<'a>(tool: &str, args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
        Some(Value::String(_)) => Err(ToolError::invalid_parameter(tool, key, "must not be empty")),
        Some(_) => Err(ToolError::invalid_parameter(tool, key, "must be a string")),
        None => Err(ToolError::missing_parameter(tool, key)),
    }
}

/// Numbers may arrive as JSON numbers or numeric strings depending on the model
fn required_number(tool: &str, args: &Value, key: &str) -> Result<f64, ToolError> {
    let value = args
        .get(key)
        .ok_or_else(|| ToolError::missing_parameter(tool, key))?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .ok_or_else(|| ToolError::invalid_parameter(tool, key, "must be a number"))
}

fn optional_unit(tool: &str, args: &Value) -> Result<Option<WeightUnit>, ToolError> {
    match args.get("unit") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => WeightUnit::parse(s)
            .map(Some)
            .ok_or_else(|| ToolError::invalid_parameter(tool, "unit", "must be kg or lb")),
        Some(_) => Err(ToolError::invalid_parameter(tool, "unit", "must be a string")),
    }
}

// ============================================================================
// LogSetTool
// ============================================================================

/// Records one set
pub struct LogSetTool {
    store: Arc<InMemoryWorkoutTools>,
}

impl LogSetTool {
    /// Create the tool over `store`
    #[must_use]
    pub const fn new(store: Arc<InMemoryWorkoutTools>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CoachTool for LogSetTool {
    fn name(&self) -> &'static str {
        LOG_SET
    }

    fn description(&self) -> &'static str {
        "Record a set the user performed. Call once per set."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "exercise": {"type": "string", "description": "Exercise name, e.g. bench press"},
                "reps": {"type": "integer", "minimum": 1},
                "weight": {"type": "number", "minimum": 0},
                "unit": {"type": "string", "enum": ["kg", "lb"]}
            },
            "required": ["exercise", "reps", "weight"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::WRITES_DATA
    }

    async fn execute(
        &self,
        args: Value,
        context: &ToolContext,
        _progress: Option<&dyn ProgressSink>,
    ) -> Result<ToolOutput, ToolError> {
        let exercise = normalize_exercise(required_str(LOG_SET, &args, "exercise")?);
        let reps = required_number(LOG_SET, &args, "reps")?;
        if reps < 1.0 || reps.fract() != 0.0 || reps > f64::from(u16::MAX) {
            return Err(ToolError::invalid_parameter(
                LOG_SET,
                "reps",
                "must be a positive whole number",
            ));
        }
        let reps = reps as u32;
        let weight = required_number(LOG_SET, &args, "weight")?;
        if weight < 0.0 {
            return Err(ToolError::invalid_parameter(LOG_SET, "weight", "must not be negative"));
        }
        let unit = optional_unit(LOG_SET, &args)?
            .unwrap_or_else(|| self.store.effective_preferences(context).unit);

        self.store.record_set(
            &context.subject,
            LoggedSet {
                exercise: exercise.clone(),
                reps,
                weight_kg: unit.convert(weight, WeightUnit::Kg),
                logged_at: Utc::now(),
            },
        );

        let summary = format!(
            "Logged {exercise}: {reps} reps at {} {unit}.",
            format_weight(weight)
        );
        Ok(ToolOutput::new(
            vec![CoachBlock::SetLogged {
                exercise: exercise.clone(),
                reps,
                weight,
                unit,
            }],
            json!({"logged": true, "exercise": exercise, "reps": reps, "weight": weight, "unit": unit}),
            summary,
        ))
    }
}

// ============================================================================
// TodaySummaryTool
// ============================================================================

/// Summarizes the current local day
pub struct TodaySummaryTool {
    store: Arc<InMemoryWorkoutTools>,
}

impl TodaySummaryTool {
    /// Create the tool over `store`
    #[must_use]
    pub const fn new(store: Arc<InMemoryWorkoutTools>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CoachTool for TodaySummaryTool {
    fn name(&self) -> &'static str {
        GET_TODAY_SUMMARY
    }

    fn description(&self) -> &'static str {
        "Summarize the sets logged today: set count, reps, volume and exercises."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::ANALYTICS
    }

    async fn execute(
        &self,
        _args: Value,
        context: &ToolContext,
        _progress: Option<&dyn ProgressSink>,
    ) -> Result<ToolOutput, ToolError> {
        let offset = context.preferences.timezone_offset_minutes;
        let today = local_date(Utc::now(), offset);
        let unit = self.store.effective_preferences(context).unit;

        let sets: Vec<LoggedSet> = self
            .store
            .sets_for(&context.subject)
            .into_iter()
            .filter(|set| local_date(set.logged_at, offset) == today)
            .collect();

        if sets.is_empty() {
            return Ok(ToolOutput::new(
                vec![
                    CoachBlock::status(
                        StatusTone::Info,
                        "No sets yet today",
                        "Log your first set to start today's summary.",
                    ),
                    CoachBlock::default_suggestions(),
                ],
                json!({"date": today.to_string(), "sets": 0}),
                "You have not logged any sets today.",
            ));
        }

        let total_reps: u32 = sets.iter().map(|s| s.reps).sum();
        let volume: f64 = sets
            .iter()
            .map(|s| f64::from(s.reps) * WeightUnit::Kg.convert(s.weight_kg, unit))
            .sum();
        let exercises: BTreeSet<&str> = sets.iter().map(|s| s.exercise.as_str()).collect();
        let exercise_list = exercises.iter().copied().collect::<Vec<_>>().join(", ");

        let summary = format!(
            "You logged {} sets today across {} exercises.",
            sets.len(),
            exercises.len()
        );
        Ok(ToolOutput::new(
            vec![CoachBlock::Metrics {
                title: "Today".to_owned(),
                items: vec![
                    MetricItem::new("Sets", sets.len().to_string()),
                    MetricItem::new("Reps", total_reps.to_string()),
                    MetricItem::new("Volume", format!("{} {unit}", format_weight(volume))),
                    MetricItem::new("Exercises", exercise_list.clone()),
                ],
            }],
            json!({
                "date": today.to_string(),
                "sets": sets.len(),
                "reps": total_reps,
                "volume": volume,
                "unit": unit,
                "exercises": exercises,
            }),
            summary,
        ))
    }
}

// ============================================================================
// ExerciseReportTool
// ============================================================================

/// Reports the history of one exercise
pub struct ExerciseReportTool {
    store: Arc<InMemoryWorkoutTools>,
}

impl ExerciseReportTool {
    /// Create the tool over `store`
    #[must_use]
    pub const fn new(store: Arc<InMemoryWorkoutTools>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CoachTool for ExerciseReportTool {
    fn name(&self) -> &'static str {
        GET_EXERCISE_REPORT
    }

    fn description(&self) -> &'static str {
        "Report history for one exercise: sessions, best weight and total volume."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "exercise": {"type": "string", "description": "Exercise name"}
            },
            "required": ["exercise"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::ANALYTICS | ToolCapabilities::REPORTS_PROGRESS
    }

    async fn execute(
        &self,
        args: Value,
        context: &ToolContext,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<ToolOutput, ToolError> {
        let exercise = normalize_exercise(required_str(GET_EXERCISE_REPORT, &args, "exercise")?);
        let unit = self.store.effective_preferences(context).unit;
        let offset = context.preferences.timezone_offset_minutes;

        let sets: Vec<LoggedSet> = self
            .store
            .sets_for(&context.subject)
            .into_iter()
            .filter(|set| set.exercise == exercise)
            .collect();

        if let Some(progress) = progress {
            progress
                .report(vec![CoachBlock::status(
                    StatusTone::Info,
                    format!("Analyzing {exercise}"),
                    format!("Reviewing {} logged sets", sets.len()),
                )])
                .await;
        }

        let sessions = sets
            .iter()
            .map(|s| local_date(s.logged_at, offset))
            .collect::<BTreeSet<_>>()
            .len();
        let sessions = u32::try_from(sessions).unwrap_or(u32::MAX);
        let best_weight = sets
            .iter()
            .map(|s| WeightUnit::Kg.convert(s.weight_kg, unit))
            .fold(None, |best: Option<f64>, w| Some(best.map_or(w, |b| b.max(w))));
        let total_volume: f64 = sets
            .iter()
            .map(|s| f64::from(s.reps) * WeightUnit::Kg.convert(s.weight_kg, unit))
            .sum();

        let summary = best_weight.map_or_else(
            || format!("No {exercise} sets logged yet."),
            |best| {
                format!(
                    "{exercise}: {sessions} sessions, best {} {unit}.",
                    format_weight(best)
                )
            },
        );

        Ok(ToolOutput::new(
            vec![CoachBlock::ExerciseReport {
                exercise: exercise.clone(),
                sessions,
                best_weight,
                total_volume,
                unit,
            }],
            json!({
                "exercise": exercise,
                "sessions": sessions,
                "sets": sets.len(),
                "best_weight": best_weight,
                "total_volume": total_volume,
                "unit": unit,
            }),
            summary,
        ))
    }
}

// ============================================================================
// SetUnitTool
// ============================================================================

/// Changes the weight unit
pub struct SetUnitTool {
    store: Arc<InMemoryWorkoutTools>,
}

impl SetUnitTool {
    /// Create the tool over `store`
    #[must_use]
    pub const fn new(store: Arc<InMemoryWorkoutTools>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CoachTool for SetUnitTool {
    fn name(&self) -> &'static str {
        SET_UNIT
    }

    fn description(&self) -> &'static str {
        "Switch the weight unit used for logging and reports."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "unit": {"type": "string", "enum": ["kg", "lb"]}
            },
            "required": ["unit"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::CONFIGURATION | ToolCapabilities::WRITES_DATA
    }

    async fn execute(
        &self,
        args: Value,
        context: &ToolContext,
        _progress: Option<&dyn ProgressSink>,
    ) -> Result<ToolOutput, ToolError> {
        let unit = optional_unit(SET_UNIT, &args)?
            .ok_or_else(|| ToolError::missing_parameter(SET_UNIT, "unit"))?;
        let updated = self.store.update_preferences(context, |prefs| prefs.unit = unit);

        Ok(ToolOutput::new(
            vec![CoachBlock::PreferencesUpdated {
                unit: updated.unit,
                sound_enabled: updated.sound_enabled,
            }],
            json!({"unit": updated.unit, "sound_enabled": updated.sound_enabled}),
            format!("Weights will now be shown in {unit}."),
        ))
    }
}

// ============================================================================
// SetSoundTool
// ============================================================================

/// Toggles sound feedback
pub struct SetSoundTool {
    store: Arc<InMemoryWorkoutTools>,
}

impl SetSoundTool {
    /// Create the tool over `store`
    #[must_use]
    pub const fn new(store: Arc<InMemoryWorkoutTools>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CoachTool for SetSoundTool {
    fn name(&self) -> &'static str {
        SET_SOUND
    }

    fn description(&self) -> &'static str {
        "Turn sound feedback on or off. Omit `enabled` to toggle."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "enabled": {"type": "boolean"}
            }
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::CONFIGURATION | ToolCapabilities::WRITES_DATA
    }

    async fn execute(
        &self,
        args: Value,
        context: &ToolContext,
        _progress: Option<&dyn ProgressSink>,
    ) -> Result<ToolOutput, ToolError> {
        let requested = match args.get("enabled") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                return Err(ToolError::invalid_parameter(
                    SET_SOUND,
                    "enabled",
                    "must be a boolean",
                ))
            }
        };
        let updated = self.store.update_preferences(context, |prefs| {
            prefs.sound_enabled = requested.unwrap_or(!prefs.sound_enabled);
        });

        let summary = if updated.sound_enabled {
            "Sounds are on."
        } else {
            "Sounds are off."
        };
        Ok(ToolOutput::new(
            vec![CoachBlock::PreferencesUpdated {
                unit: updated.unit,
                sound_enabled: updated.sound_enabled,
            }],
            json!({"unit": updated.unit, "sound_enabled": updated.sound_enabled}),
            summary,
        ))
    }
}

// ============================================================================
// SuggestWorkoutTool
// ============================================================================

/// Suggests the exercise trained least recently
pub struct SuggestWorkoutTool {
    store: Arc<InMemoryWorkoutTools>,
}

impl SuggestWorkoutTool {
    /// Create the tool over `store`
    #[must_use]
    pub const fn new(store: Arc<InMemoryWorkoutTools>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CoachTool for SuggestWorkoutTool {
    fn name(&self) -> &'static str {
        SUGGEST_WORKOUT
    }

    fn description(&self) -> &'static str {
        "Suggest what to train next based on which exercise was trained least recently."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::ANALYTICS
    }

    async fn execute(
        &self,
        _args: Value,
        context: &ToolContext,
        _progress: Option<&dyn ProgressSink>,
    ) -> Result<ToolOutput, ToolError> {
        let unit = self.store.effective_preferences(context).unit;
        let sets = self.store.sets_for(&context.subject);

        // Latest set per exercise, then pick the stalest exercise
        let mut latest: Vec<&LoggedSet> = Vec::new();
        for set in &sets {
            match latest.iter_mut().find(|s| s.exercise == set.exercise) {
                Some(existing) if existing.logged_at <= set.logged_at => *existing = set,
                Some(_) => {}
                None => latest.push(set),
            }
        }
        let stalest = latest.iter().min_by_key(|s| s.logged_at);

        let (exercise, prompt, description) = stalest.map_or_else(
            || {
                (
                    STARTER_EXERCISE.to_owned(),
                    format!("Log {STARTER_EXERCISE} 5 reps"),
                    "No history yet. Start with a compound lift.".to_owned(),
                )
            },
            |set| {
                let weight = WeightUnit::Kg.convert(set.weight_kg, unit);
                (
                    set.exercise.clone(),
                    format!(
                        "Log {} {} reps at {} {unit}",
                        set.exercise,
                        set.reps,
                        format_weight(weight)
                    ),
                    format!(
                        "You last trained {} on {}.",
                        set.exercise,
                        local_date(set.logged_at, context.preferences.timezone_offset_minutes)
                    ),
                )
            },
        );

        Ok(ToolOutput::new(
            vec![
                CoachBlock::status(StatusTone::Info, format!("Next up: {exercise}"), description),
                CoachBlock::suggestions([prompt, format!("How is my {exercise} going?")]),
            ],
            json!({"exercise": exercise}),
            format!("How about some {exercise} today?"),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Preferences;
    use crate::tools::ToolExecutor;

    fn context() -> ToolContext {
        ToolContext::new("athlete", Preferences::default(), "turn")
    }

    fn registry() -> (Arc<InMemoryWorkoutTools>, ToolRegistry) {
        let store = Arc::new(InMemoryWorkoutTools::new());
        let registry = store.registry().unwrap();
        (store, registry)
    }

    #[tokio::test]
    async fn test_log_set_then_summary() {
        let (_, registry) = registry();
        let ctx = context();
        let logged = registry
            .execute(
                LOG_SET,
                json!({"exercise": "Bench  Press", "reps": 5, "weight": 80}),
                &ctx,
                None,
            )
            .await
            .unwrap();
        assert_eq!(logged.summary, "Logged bench press: 5 reps at 80 kg.");

        let summary = registry
            .execute(GET_TODAY_SUMMARY, json!({}), &ctx, None)
            .await
            .unwrap();
        assert!(matches!(summary.blocks[0], CoachBlock::Metrics { .. }));
        assert_eq!(summary.output_for_model["sets"], 1);
        assert_eq!(summary.output_for_model["reps"], 5);
    }

    #[tokio::test]
    async fn test_log_set_validates_arguments() {
        let (_, registry) = registry();
        let err = registry
            .execute(LOG_SET, json!({"exercise": "squat", "weight": 100}), &context(), None)
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::missing_parameter(LOG_SET, "reps"));

        let err = registry
            .execute(
                LOG_SET,
                json!({"exercise": "squat", "reps": 0, "weight": 100}),
                &context(),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameter { .. }));
    }

    #[tokio::test]
    async fn test_unit_change_applies_to_reports() {
        let (_, registry) = registry();
        let ctx = context();
        registry
            .execute(
                LOG_SET,
                json!({"exercise": "deadlift", "reps": 3, "weight": 100, "unit": "kg"}),
                &ctx,
                None,
            )
            .await
            .unwrap();
        registry
            .execute(SET_UNIT, json!({"unit": "lb"}), &ctx, None)
            .await
            .unwrap();

        let report = registry
            .execute(GET_EXERCISE_REPORT, json!({"exercise": "deadlift"}), &ctx, None)
            .await
            .unwrap();
        match &report.blocks[0] {
            CoachBlock::ExerciseReport {
                best_weight, unit, sessions, ..
            } => {
                assert_eq!(*unit, WeightUnit::Lb);
                assert_eq!(*sessions, 1);
                assert!((best_weight.unwrap() - 220.46).abs() < 0.01);
            }
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sound_toggles_without_argument() {
        let (store, registry) = registry();
        let ctx = context();
        registry
            .execute(SET_SOUND, json!({}), &ctx, None)
            .await
            .unwrap();
        assert!(!store.effective_preferences(&ctx).sound_enabled);
        registry
            .execute(SET_SOUND, json!({"enabled": true}), &ctx, None)
            .await
            .unwrap();
        assert!(store.effective_preferences(&ctx).sound_enabled);
    }

    #[tokio::test]
    async fn test_suggestion_picks_stalest_exercise() {
        let (store, registry) = registry();
        let ctx = context();
        let now = Utc::now();
        store.record_set(
            "athlete",
            LoggedSet {
                exercise: "squat".into(),
                reps: 5,
                weight_kg: 100.0,
                logged_at: now - Duration::days(3),
            },
        );
        store.record_set(
            "athlete",
            LoggedSet {
                exercise: "bench press".into(),
                reps: 5,
                weight_kg: 80.0,
                logged_at: now,
            },
        );

        let output = registry
            .execute(SUGGEST_WORKOUT, json!({}), &ctx, None)
            .await
            .unwrap();
        assert_eq!(output.output_for_model["exercise"], "squat");
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(80.0), "80");
        assert_eq!(format_weight(82.5), "82.5");
    }
}
