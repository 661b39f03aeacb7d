use crate::stimulus::{InkColor, Stimulus, Word};
use serde::{Deserialize, Serialize};

/// Task tag carried by every logged step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Task {
    Fixation,
    Practice,
    Response,
}

/// A trial as handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSpec {
    pub stimulus: Stimulus,
    pub task: Task,
    pub timeout_ms: u64,
}

impl TrialSpec {
    pub fn is_practice(&self) -> bool {
        self.task == Task::Practice
    }

    /// Button labels in response-index order
    pub fn choices(&self) -> [Word; 4] {
        InkColor::ALL.map(InkColor::button_label)
    }
}

/// What the presentation layer reports back when a trial ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub response: Option<usize>,
    pub rt_ms: Option<u64>,
}

impl TrialOutcome {
    pub fn answered(response: usize, rt_ms: u64) -> Self {
        Self {
            response: Some(response),
            rt_ms: Some(rt_ms),
        }
    }

    pub fn timed_out() -> Self {
        Self::default()
    }
}

/// One row of the trial log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_index: usize,
    pub task: Task,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<Word>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<InkColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_response: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congruent: Option<bool>,
    pub response: Option<usize>,
    pub rt: Option<u64>,
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl TrialResult {
    /// Scores a finished trial.
    pub fn scored(trial_index: usize, spec: &TrialSpec, outcome: TrialOutcome) -> Self {
        let stimulus = spec.stimulus;
        Self {
            trial_index,
            task: spec.task,
            word: Some(stimulus.word),
            color: Some(stimulus.color),
            correct_response: Some(stimulus.correct_response),
            congruent: Some(stimulus.congruent),
            response: outcome.response,
            rt: outcome.rt_ms,
            correct: score(outcome.response, stimulus.correct_response),
            user_id: None,
        }
    }

    pub fn fixation(trial_index: usize, duration_ms: u64) -> Self {
        Self {
            trial_index,
            task: Task::Fixation,
            word: None,
            color: None,
            correct_response: None,
            congruent: None,
            response: None,
            rt: Some(duration_ms),
            correct: false,
            user_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_owned);
        self
    }
}

/// A missing response (timeout) is always incorrect.
pub fn score(response: Option<usize>, correct_response: usize) -> bool {
    response == Some(correct_response)
}

/// Feedback line shown after a practice trial
pub fn feedback_message(last: &TrialResult) -> String {
    if last.correct {
        return "CORRECT!".to_string();
    }
    let expected = last
        .correct_response
        .and_then(InkColor::from_response_index)
        .map(|c| c.button_label().to_string())
        .unwrap_or_default();
    let ink = last
        .color
        .map(|c| c.to_string().to_uppercase())
        .unwrap_or_default();
    format!("INCORRECT. The correct answer was {expected} for {ink} ink.")
}
