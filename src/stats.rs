use crate::trial::{Task, TrialResult};
use crate::util::{mean, round_half_up};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accuracy and speed for one congruence condition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionStats {
    pub trials: usize,
    pub correct: usize,
    /// Percent correct, rounded; 0 when there are no trials.
    pub accuracy: i64,
    /// Mean rt over correct trials, rounded; 0 when none were correct.
    pub mean_rt_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
    NoData,
    Complete {
        congruent: ConditionStats,
        incongruent: ConditionStats,
        stroop_effect_ms: i64,
    },
}

impl Summary {
    pub fn stroop_effect_ms(&self) -> Option<i64> {
        match self {
            Summary::NoData => None,
            Summary::Complete {
                stroop_effect_ms, ..
            } => Some(*stroop_effect_ms),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::NoData => write!(f, "No trial data found."),
            Summary::Complete {
                congruent,
                incongruent,
                stroop_effect_ms,
            } => {
                writeln!(
                    f,
                    "Congruent trials: {}% correct, {}ms average",
                    congruent.accuracy, congruent.mean_rt_ms
                )?;
                writeln!(
                    f,
                    "Incongruent trials: {}% correct, {}ms average",
                    incongruent.accuracy, incongruent.mean_rt_ms
                )?;
                write!(f, "Stroop Effect: {}ms", stroop_effect_ms)
            }
        }
    }
}

/// Summarizes main-phase (`response`) trials; everything else is ignored.
pub fn summarize(log: &[TrialResult]) -> Summary {
    let trials: Vec<&TrialResult> = log.iter().filter(|t| t.task == Task::Response).collect();
    if trials.is_empty() {
        return Summary::NoData;
    }

    let in_condition = |congruent: bool| {
        trials
            .iter()
            .copied()
            .filter(|t| t.congruent == Some(congruent))
            .collect::<Vec<_>>()
    };
    let congruent = in_condition(true);
    let incongruent = in_condition(false);

    let congruent = condition_stats(&congruent);
    let incongruent = condition_stats(&incongruent);

    Summary::Complete {
        congruent,
        incongruent,
        stroop_effect_ms: incongruent.mean_rt_ms - congruent.mean_rt_ms,
    }
}

fn condition_stats(trials: &[&TrialResult]) -> ConditionStats {
    let correct: Vec<&&TrialResult> = trials.iter().filter(|t| t.correct).collect();
    let accuracy = match trials.len() {
        0 => 0,
        n => round_half_up(correct.len() as f64 / n as f64 * 100.0),
    };
    let rts: Vec<f64> = correct.iter().filter_map(|t| t.rt).map(|rt| rt as f64).collect();
    let mean_rt_ms = mean(&rts).map(round_half_up).unwrap_or(0);

    ConditionStats {
        trials: trials.len(),
        correct: correct.len(),
        accuracy,
        mean_rt_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::{InkColor, Stimulus, Word};
    use crate::trial::{TrialOutcome, TrialSpec};

    fn response(word: Word, color: InkColor, correct: bool, rt: u64) -> TrialResult {
        let spec = TrialSpec {
            stimulus: Stimulus::new(word, color),
            task: Task::Response,
            timeout_ms: 3000,
        };
        let answer = if correct {
            spec.stimulus.correct_response
        } else {
            (spec.stimulus.correct_response + 1) % 4
        };
        TrialResult::scored(0, &spec, TrialOutcome::answered(answer, rt))
    }

    #[test]
    fn reference_example() {
        let mut log = Vec::new();
        for rt in [500, 520, 480, 500] {
            log.push(response(Word::Red, InkColor::Red, true, rt));
        }
        for rt in [650, 600, 700, 650] {
            log.push(response(Word::Red, InkColor::Blue, true, rt));
        }

        let summary = summarize(&log);
        let Summary::Complete {
            congruent,
            incongruent,
            stroop_effect_ms,
        } = summary
        else {
            panic!("expected complete summary");
        };
        assert_eq!(congruent.accuracy, 100);
        assert_eq!(congruent.mean_rt_ms, 500);
        assert_eq!(incongruent.accuracy, 100);
        assert_eq!(incongruent.mean_rt_ms, 650);
        assert_eq!(stroop_effect_ms, 150);
    }

    #[test]
    fn no_response_trials_is_no_data() {
        assert_eq!(summarize(&[]), Summary::NoData);

        let mut practice = response(Word::Red, InkColor::Red, true, 400);
        practice.task = Task::Practice;
        let fixation = TrialResult::fixation(1, 300);
        assert_eq!(summarize(&[practice, fixation]), Summary::NoData);
        assert_eq!(Summary::NoData.stroop_effect_ms(), None);
    }

    #[test]
    fn rt_only_counts_correct_trials() {
        let log = vec![
            response(Word::Green, InkColor::Green, true, 400),
            response(Word::Green, InkColor::Green, false, 100),
            response(Word::Blue, InkColor::Blue, true, 601),
        ];
        let Summary::Complete { congruent, incongruent, .. } = summarize(&log) else {
            panic!("expected complete summary");
        };
        assert_eq!(congruent.trials, 3);
        assert_eq!(congruent.correct, 2);
        assert_eq!(congruent.accuracy, 67);
        assert_eq!(congruent.mean_rt_ms, 501);
        assert_eq!(incongruent, ConditionStats::default());
    }

    #[test]
    fn all_wrong_condition_reports_zero_rt() {
        let log = vec![
            response(Word::Red, InkColor::Red, true, 500),
            response(Word::Red, InkColor::Yellow, false, 900),
        ];
        let summary = summarize(&log);
        let Summary::Complete { incongruent, stroop_effect_ms, .. } = summary else {
            panic!("expected complete summary");
        };
        assert_eq!(incongruent.accuracy, 0);
        assert_eq!(incongruent.mean_rt_ms, 0);
        assert_eq!(stroop_effect_ms, -500);
    }

    #[test]
    fn timeouts_count_against_accuracy() {
        let spec = TrialSpec {
            stimulus: Stimulus::new(Word::Yellow, InkColor::Yellow),
            task: Task::Response,
            timeout_ms: 3000,
        };
        let log = vec![
            TrialResult::scored(0, &spec, TrialOutcome::timed_out()),
            TrialResult::scored(1, &spec, TrialOutcome::answered(3, 450)),
        ];
        let Summary::Complete { congruent, .. } = summarize(&log) else {
            panic!("expected complete summary");
        };
        assert_eq!(congruent.accuracy, 50);
        assert_eq!(congruent.mean_rt_ms, 450);
    }

    #[test]
    fn rows_without_congruence_are_left_out() {
        let mut unlabelled = response(Word::Red, InkColor::Blue, true, 400);
        unlabelled.congruent = None;
        let log = vec![response(Word::Red, InkColor::Red, true, 500), unlabelled];
        match summarize(&log) {
            Summary::Complete {
                congruent,
                incongruent,
                ..
            } => {
                assert_eq!(congruent.trials, 1);
                assert_eq!(incongruent.trials, 0);
                assert_eq!(incongruent.mean_rt_ms, 0);
            }
            Summary::NoData => panic!("expected a summary"),
        }
    }

    #[test]
    fn display_matches_results_screen() {
        let mut log = Vec::new();
        for rt in [500, 520, 480, 500] {
            log.push(response(Word::Red, InkColor::Red, true, rt));
        }
        for rt in [650, 600, 700, 650] {
            log.push(response(Word::Red, InkColor::Blue, true, rt));
        }
        assert_eq!(
            summarize(&log).to_string(),
            "Congruent trials: 100% correct, 500ms average\n\
             Incongruent trials: 100% correct, 650ms average\n\
             Stroop Effect: 150ms"
        );
        assert_eq!(Summary::NoData.to_string(), "No trial data found.");
    }
}
