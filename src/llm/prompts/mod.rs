// ABOUTME: System prompts for coach LLM interactions loaded at compile time
// ABOUTME: Builds the per-turn preamble from the static prompt and the client's preferences
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # System Prompts
//!
//! The static coach prompt lives in a markdown file for easy maintenance and
//! is extended per turn with the user's unit, sound and timezone settings.

use std::fmt::Write as _;

use pierre_coach_core::models::Preferences;

/// Pierre strength coach system prompt
pub const COACH_SYSTEM_PROMPT: &str = include_str!("coach_system.md");

/// Build the system preamble sent as the first message of every planner round
#[must_use]
pub fn build_coach_preamble(preferences: &Preferences) -> String {
    let mut preamble = String::with_capacity(COACH_SYSTEM_PROMPT.len() + 256);
    preamble.push_str(COACH_SYSTEM_PROMPT);
    preamble.push_str("\n## User Preferences\n\n");
    // Writing to a String cannot fail
    let _ = writeln!(preamble, "- Weight unit: {}", preferences.unit);
    let _ = writeln!(
        preamble,
        "- Sound feedback: {}",
        if preferences.sound_enabled { "on" } else { "off" }
    );
    if let Some(offset) = preferences.timezone_offset_minutes {
        let sign = if offset < 0 { '-' } else { '+' };
        let abs = offset.unsigned_abs();
        let _ = writeln!(
            preamble,
            "- Timezone: UTC{sign}{:02}:{:02}",
            abs / 60,
            abs % 60
        );
    }
    preamble
}

#[cfg(test)]
mod tests {
    use super::*;
    use pierre_coach_core::models::WeightUnit;

    #[test]
    fn test_preamble_includes_preferences() {
        let preamble = build_coach_preamble(&Preferences {
            unit: WeightUnit::Lb,
            sound_enabled: false,
            timezone_offset_minutes: Some(-330),
        });
        assert!(preamble.starts_with("# Pierre Strength Coach"));
        assert!(preamble.contains("- Weight unit: lb"));
        assert!(preamble.contains("- Sound feedback: off"));
        assert!(preamble.contains("- Timezone: UTC-05:30"));
    }

    #[test]
    fn test_preamble_omits_unknown_timezone() {
        let preamble = build_coach_preamble(&Preferences::default());
        assert!(!preamble.contains("Timezone"));
    }
}
