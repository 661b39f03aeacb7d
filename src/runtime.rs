use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SessionError;
use crate::session::SessionState;
use crate::stats::{summarize, Summary};
use crate::timeline::{Timeline, TimelineStep};
use crate::trial::{feedback_message, Task, TrialOutcome, TrialResult, TrialSpec};

/// Coarse position in the session, in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Welcome,
    Instructions,
    Practice,
    PracticeDebrief,
    Main,
    Results,
}

impl Phase {
    fn of(step: &TimelineStep, current: Phase) -> Phase {
        match step {
            TimelineStep::Welcome => Phase::Welcome,
            TimelineStep::Instructions => Phase::Instructions,
            TimelineStep::PracticeFeedback => Phase::Practice,
            TimelineStep::PracticeDebrief => Phase::PracticeDebrief,
            TimelineStep::Results => Phase::Results,
            TimelineStep::Trial(spec) if spec.task == Task::Practice => Phase::Practice,
            TimelineStep::Trial(_) => Phase::Main,
            // fixation belongs to whichever trial block it precedes
            TimelineStep::Fixation { .. } => match current {
                Phase::Welcome | Phase::Instructions => Phase::Practice,
                Phase::PracticeDebrief => Phase::Main,
                other => other,
            },
        }
    }
}

/// The presentation side of a session: shows a trial and reports what the
/// participant did.
pub trait Responder {
    fn respond(&mut self, trial: &TrialSpec) -> TrialOutcome;
}

/// Responder fed from another thread; a receive timeout counts as no response.
pub struct ChannelResponder {
    rx: Receiver<TrialOutcome>,
}

impl ChannelResponder {
    pub fn new(rx: Receiver<TrialOutcome>) -> Self {
        Self { rx }
    }
}

impl Responder for ChannelResponder {
    fn respond(&mut self, trial: &TrialSpec) -> TrialOutcome {
        match self.rx.recv_timeout(Duration::from_millis(trial.timeout_ms)) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                TrialOutcome::timed_out()
            }
        }
    }
}

pub const DEFAULT_SIMULATED_ACCURACY: f64 = 0.95;

/// Synthetic participant with a fixed accuracy and an incongruent slowdown
#[derive(Debug, Clone)]
pub struct SimulatedResponder<R: Rng> {
    rng: R,
    pub accuracy: f64,
    pub base_rt_ms: u64,
    pub jitter_ms: u64,
    pub interference_ms: u64,
}

impl<R: Rng> SimulatedResponder<R> {
    /// `accuracy` is clamped to `0.0..=1.0`; NaN falls back to the default.
    pub fn new(rng: R, accuracy: f64) -> Self {
        Self {
            rng,
            accuracy: if accuracy.is_nan() {
                DEFAULT_SIMULATED_ACCURACY
            } else {
                accuracy.clamp(0.0, 1.0)
            },
            base_rt_ms: 520,
            jitter_ms: 120,
            interference_ms: 90,
        }
    }
}

impl<R: Rng> Responder for SimulatedResponder<R> {
    fn respond(&mut self, trial: &TrialSpec) -> TrialOutcome {
        let mut rt = self.base_rt_ms + self.rng.gen_range(0..=self.jitter_ms);
        if !trial.stimulus.congruent {
            rt += self.interference_ms;
        }
        let response = if self.rng.gen_bool(self.accuracy) {
            trial.stimulus.correct_response
        } else {
            (trial.stimulus.correct_response + self.rng.gen_range(1..4)) % 4
        };
        TrialOutcome::answered(response, rt)
    }
}

/// Everything one pass over a timeline produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session: SessionState,
    pub log: Vec<TrialResult>,
    pub feedback: Vec<String>,
    pub summary: Option<Summary>,
}

/// Walks a timeline in order, scoring trials and firing the session callbacks
#[derive(Debug, Clone, Default)]
pub struct SessionRunner {
    user_id: Option<String>,
}

impl SessionRunner {
    pub fn new(user_id: Option<String>) -> Self {
        Self { user_id }
    }

    pub fn run<P: Responder + ?Sized>(
        &self,
        timeline: Timeline,
        responder: &mut P,
    ) -> Result<SessionReport, SessionError> {
        let Timeline { steps, mut session } = timeline;
        let mut log: Vec<TrialResult> = Vec::new();
        let mut feedback = Vec::new();
        let mut summary = None;
        let mut phase = Phase::Welcome;
        let user_id = self.user_id.as_deref();

        info!(steps = steps.len(), total_trials = session.total_trials, "session started");

        for step in &steps {
            let next = Phase::of(step, phase);
            if next != phase {
                debug!(from = %phase, to = %next, "phase change");
                phase = next;
            }

            match step {
                TimelineStep::Welcome | TimelineStep::Instructions => {}
                TimelineStep::Fixation { duration_ms } => {
                    log.push(TrialResult::fixation(log.len(), *duration_ms).with_user_id(user_id));
                }
                TimelineStep::Trial(spec) => {
                    let outcome = within_deadline(responder.respond(spec), spec.timeout_ms);
                    let result = TrialResult::scored(log.len(), spec, outcome).with_user_id(user_id);
                    debug!(
                        index = result.trial_index,
                        task = %result.task,
                        correct = result.correct,
                        "trial finished"
                    );
                    log.push(result);
                    if spec.task == Task::Response {
                        session.on_main_trial_finished()?;
                    }
                }
                TimelineStep::PracticeFeedback => {
                    if let Some(last) = log.iter().rev().find(|t| t.task == Task::Practice) {
                        feedback.push(feedback_message(last));
                    }
                }
                TimelineStep::PracticeDebrief => session.on_practice_debrief_finished(),
                TimelineStep::Results => summary = Some(summarize(&log)),
            }
        }

        info!(
            main_trials = session.main_trials_completed,
            practice_completed = session.practice_completed,
            "session finished"
        );

        Ok(SessionReport {
            session,
            log,
            feedback,
            summary,
        })
    }
}

/// Responses arriving after the trial deadline count as timeouts.
fn within_deadline(outcome: TrialOutcome, timeout_ms: u64) -> TrialOutcome {
    match outcome.rt_ms {
        Some(rt) if rt > timeout_ms => TrialOutcome::timed_out(),
        _ => outcome,
    }
}
