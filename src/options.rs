use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRACTICE_TRIALS_PER_CONDITION: usize = 1;
pub const DEFAULT_MAIN_TRIALS_PER_CONDITION: usize = 6;
pub const DEFAULT_TRIAL_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_FIXATION_MIN_MS: u64 = 300;
pub const DEFAULT_FIXATION_MAX_MS: u64 = 1000;
/// Upper bound for practice and main repetition counts
pub const MAX_TRIALS_PER_CONDITION: usize = 1000;

/// Raw, partially specified timeline options as they arrive from a config
/// file or the command line. Every key is optional; unset keys fall back to
/// the defaults in [`TimelineConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practice_trials_per_condition: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_trials_per_condition: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixation_duration: Option<FixationOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_practice_feedback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_fixation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_instructions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_results: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl TimelineOptions {
    /// Layers `overrides` on top of `self`; keys set in `overrides` win.
    pub fn overridden_by(&self, overrides: &TimelineOptions) -> TimelineOptions {
        let fixation_duration = match (self.fixation_duration, overrides.fixation_duration) {
            (Some(base), Some(top)) => Some(FixationOptions {
                min: top.min.or(base.min),
                max: top.max.or(base.max),
            }),
            (base, top) => top.or(base),
        };

        TimelineOptions {
            practice_trials_per_condition: overrides
                .practice_trials_per_condition
                .or(self.practice_trials_per_condition),
            main_trials_per_condition: overrides
                .main_trials_per_condition
                .or(self.main_trials_per_condition),
            trial_timeout: overrides.trial_timeout.or(self.trial_timeout),
            fixation_duration,
            show_practice_feedback: overrides
                .show_practice_feedback
                .or(self.show_practice_feedback),
            include_fixation: overrides.include_fixation.or(self.include_fixation),
            show_instructions: overrides.show_instructions.or(self.show_instructions),
            show_results: overrides.show_results.or(self.show_results),
        }
    }
}

/// Inclusive fixation duration range in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixationRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for FixationRange {
    fn default() -> Self {
        Self {
            min_ms: DEFAULT_FIXATION_MIN_MS,
            max_ms: DEFAULT_FIXATION_MAX_MS,
        }
    }
}

/// Validated settings for one timeline build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub practice_trials_per_condition: usize,
    pub main_trials_per_condition: usize,
    pub trial_timeout_ms: u64,
    pub fixation: FixationRange,
    pub show_practice_feedback: bool,
    pub include_fixation: bool,
    pub show_instructions: bool,
    pub show_results: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            practice_trials_per_condition: DEFAULT_PRACTICE_TRIALS_PER_CONDITION,
            main_trials_per_condition: DEFAULT_MAIN_TRIALS_PER_CONDITION,
            trial_timeout_ms: DEFAULT_TRIAL_TIMEOUT_MS,
            fixation: FixationRange::default(),
            show_practice_feedback: true,
            include_fixation: true,
            show_instructions: true,
            show_results: true,
        }
    }
}

impl TimelineConfig {
    pub fn from_options(options: &TimelineOptions) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let practice_trials_per_condition = count(
            "practiceTrialsPerCondition",
            options.practice_trials_per_condition,
            defaults.practice_trials_per_condition,
        )?;
        let main_trials_per_condition = count(
            "mainTrialsPerCondition",
            options.main_trials_per_condition,
            defaults.main_trials_per_condition,
        )?;

        let trial_timeout_ms = match options.trial_timeout {
            None => defaults.trial_timeout_ms,
            Some(value) if value > 0 => value as u64,
            Some(value) => {
                return Err(ConfigError::NonPositiveDuration {
                    field: "trialTimeout",
                    value,
                })
            }
        };

        let fixation = match options.fixation_duration {
            None => defaults.fixation,
            Some(raw) => {
                let min = raw.min.unwrap_or(DEFAULT_FIXATION_MIN_MS as i64);
                let max = raw.max.unwrap_or(DEFAULT_FIXATION_MAX_MS as i64);
                if min < 0 {
                    return Err(ConfigError::NegativeCount {
                        field: "fixationDuration.min",
                        value: min,
                    });
                }
                if min > max {
                    return Err(ConfigError::FixationRange { min, max });
                }
                FixationRange {
                    min_ms: min as u64,
                    max_ms: max as u64,
                }
            }
        };

        Ok(Self {
            practice_trials_per_condition,
            main_trials_per_condition,
            trial_timeout_ms,
            fixation,
            show_practice_feedback: options
                .show_practice_feedback
                .unwrap_or(defaults.show_practice_feedback),
            include_fixation: options.include_fixation.unwrap_or(defaults.include_fixation),
            show_instructions: options
                .show_instructions
                .unwrap_or(defaults.show_instructions),
            show_results: options.show_results.unwrap_or(defaults.show_results),
        })
    }
}

fn count(field: &'static str, value: Option<i64>, default: usize) -> Result<usize, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) if v < 0 => Err(ConfigError::NegativeCount { field, value: v }),
        Some(v) if v as u64 > MAX_TRIALS_PER_CONDITION as u64 => Err(ConfigError::TooLarge {
            field,
            value: v,
            max: MAX_TRIALS_PER_CONDITION,
        }),
        Some(v) => Ok(v as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn empty_options_yield_defaults() {
        let cfg = TimelineConfig::from_options(&TimelineOptions::default()).unwrap();
        assert_eq!(cfg, TimelineConfig::default());
        assert_eq!(cfg.practice_trials_per_condition, 1);
        assert_eq!(cfg.main_trials_per_condition, 6);
        assert_eq!(cfg.trial_timeout_ms, 3000);
        assert_eq!(cfg.fixation, FixationRange { min_ms: 300, max_ms: 1000 });
    }

    #[test]
    fn keys_override_independently() {
        let options = TimelineOptions {
            main_trials_per_condition: Some(2),
            include_fixation: Some(false),
            fixation_duration: Some(FixationOptions { min: Some(500), max: None }),
            ..Default::default()
        };
        let cfg = TimelineConfig::from_options(&options).unwrap();
        assert_eq!(cfg.main_trials_per_condition, 2);
        assert_eq!(cfg.practice_trials_per_condition, 1);
        assert!(!cfg.include_fixation);
        assert!(cfg.show_practice_feedback);
        assert_eq!(cfg.fixation, FixationRange { min_ms: 500, max_ms: 1000 });
    }

    #[test]
    fn negative_counts_are_rejected() {
        let options = TimelineOptions {
            practice_trials_per_condition: Some(-1),
            ..Default::default()
        };
        assert_matches!(
            TimelineConfig::from_options(&options),
            Err(ConfigError::NegativeCount { field: "practiceTrialsPerCondition", value: -1 })
        );
    }

    #[test]
    fn oversized_counts_are_rejected() {
        let options = TimelineOptions {
            main_trials_per_condition: Some(i64::MAX),
            ..Default::default()
        };
        assert_eq!(
            TimelineConfig::from_options(&options),
            Err(ConfigError::TooLarge {
                field: "mainTrialsPerCondition",
                value: i64::MAX,
                max: MAX_TRIALS_PER_CONDITION,
            })
        );

        let at_limit = TimelineOptions {
            practice_trials_per_condition: Some(MAX_TRIALS_PER_CONDITION as i64),
            ..Default::default()
        };
        let cfg = TimelineConfig::from_options(&at_limit).unwrap();
        assert_eq!(cfg.practice_trials_per_condition, MAX_TRIALS_PER_CONDITION);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let options = TimelineOptions {
            trial_timeout: Some(0),
            ..Default::default()
        };
        assert_matches!(
            TimelineConfig::from_options(&options),
            Err(ConfigError::NonPositiveDuration { .. })
        );
    }

    #[test]
    fn inverted_fixation_range_is_rejected() {
        let options = TimelineOptions {
            fixation_duration: Some(FixationOptions { min: Some(900), max: Some(100) }),
            ..Default::default()
        };
        assert_eq!(
            TimelineConfig::from_options(&options),
            Err(ConfigError::FixationRange { min: 900, max: 100 })
        );
    }

    #[test]
    fn non_integer_counts_fail_to_parse() {
        let parsed = serde_json::from_str::<TimelineOptions>(r#"{"mainTrialsPerCondition": 2.5}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_original_option_keys() {
        let options: TimelineOptions = serde_json::from_str(
            r#"{"practiceTrialsPerCondition": 2, "trialTimeout": 2500,
                "fixationDuration": {"min": 200, "max": 400}, "showResults": false}"#,
        )
        .unwrap();
        let cfg = TimelineConfig::from_options(&options).unwrap();
        assert_eq!(cfg.practice_trials_per_condition, 2);
        assert_eq!(cfg.trial_timeout_ms, 2500);
        assert_eq!(cfg.fixation, FixationRange { min_ms: 200, max_ms: 400 });
        assert!(!cfg.show_results);
    }

    #[test]
    fn overrides_win_over_base() {
        let base = TimelineOptions {
            main_trials_per_condition: Some(4),
            fixation_duration: Some(FixationOptions { min: Some(100), max: Some(200) }),
            show_results: Some(false),
            ..Default::default()
        };
        let top = TimelineOptions {
            main_trials_per_condition: Some(8),
            fixation_duration: Some(FixationOptions { min: None, max: Some(300) }),
            ..Default::default()
        };
        let merged = base.overridden_by(&top);
        assert_eq!(merged.main_trials_per_condition, Some(8));
        assert_eq!(merged.show_results, Some(false));
        assert_eq!(
            merged.fixation_duration,
            Some(FixationOptions { min: Some(100), max: Some(300) })
        );
    }
}
