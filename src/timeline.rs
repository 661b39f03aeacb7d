use crate::options::TimelineConfig;
use crate::session::SessionState;
use crate::stimulus::{generate_stimuli, partition_by_congruence, Stimulus};
use crate::trial::{Task, TrialSpec};
use crate::util::shuffle;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Practice over-samples incongruent stimuli relative to congruent ones.
pub const PRACTICE_INCONGRUENT_RATIO: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineStep {
    Welcome,
    Instructions,
    Fixation { duration_ms: u64 },
    Trial(TrialSpec),
    PracticeFeedback,
    PracticeDebrief,
    Results,
}

/// An ordered session plan plus the state its callbacks update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub steps: Vec<TimelineStep>,
    pub session: SessionState,
}

impl Timeline {
    pub fn trials(&self) -> impl Iterator<Item = &TrialSpec> {
        self.steps.iter().filter_map(|step| match step {
            TimelineStep::Trial(spec) => Some(spec),
            _ => None,
        })
    }

    pub fn count_trials(&self, task: Task) -> usize {
        self.trials().filter(|t| t.task == task).count()
    }
}

/// First `p` congruent plus first `3p` incongruent, clamped to what exists.
pub fn practice_stimuli(
    congruent: &[Stimulus],
    incongruent: &[Stimulus],
    per_condition: usize,
) -> Vec<Stimulus> {
    let incongruent_count = per_condition.saturating_mul(PRACTICE_INCONGRUENT_RATIO);
    congruent
        .iter()
        .take(per_condition)
        .chain(incongruent.iter().take(incongruent_count))
        .copied()
        .collect()
}

/// `m` passes over congruent plus `floor(m / 2)` passes over incongruent.
pub fn main_stimuli(
    congruent: &[Stimulus],
    incongruent: &[Stimulus],
    per_condition: usize,
) -> Vec<Stimulus> {
    let capacity = congruent
        .len()
        .checked_mul(per_condition)
        .zip(incongruent.len().checked_mul(per_condition / 2))
        .and_then(|(c, i)| c.checked_add(i))
        .unwrap_or(0);
    let mut stimuli = Vec::with_capacity(capacity);
    for _ in 0..per_condition {
        stimuli.extend_from_slice(congruent);
    }
    for _ in 0..per_condition / 2 {
        stimuli.extend_from_slice(incongruent);
    }
    stimuli
}

/// Builds the full session timeline eagerly.
///
/// All randomness (practice/main ordering and fixation durations) is drawn
/// from `rng`, so a seeded generator reproduces the same timeline.
pub fn build_timeline<R: Rng + ?Sized>(config: &TimelineConfig, rng: &mut R) -> Timeline {
    let stimuli = generate_stimuli();
    let (congruent, incongruent) = partition_by_congruence(&stimuli);

    let mut steps = vec![TimelineStep::Welcome];
    if config.show_instructions {
        steps.push(TimelineStep::Instructions);
    }

    let practice = shuffle(
        &practice_stimuli(&congruent, &incongruent, config.practice_trials_per_condition),
        rng,
    );
    for stimulus in &practice {
        push_fixation(&mut steps, config, rng);
        steps.push(TimelineStep::Trial(TrialSpec {
            stimulus: *stimulus,
            task: Task::Practice,
            timeout_ms: config.trial_timeout_ms,
        }));
        if config.show_practice_feedback {
            steps.push(TimelineStep::PracticeFeedback);
        }
    }

    steps.push(TimelineStep::PracticeDebrief);

    let main = shuffle(
        &main_stimuli(&congruent, &incongruent, config.main_trials_per_condition),
        rng,
    );
    let session = SessionState::new(main.len());
    for stimulus in &main {
        push_fixation(&mut steps, config, rng);
        steps.push(TimelineStep::Trial(TrialSpec {
            stimulus: *stimulus,
            task: Task::Response,
            timeout_ms: config.trial_timeout_ms,
        }));
    }

    if config.show_results {
        steps.push(TimelineStep::Results);
    }

    info!(
        practice = practice.len(),
        main = main.len(),
        steps = steps.len(),
        "built stroop timeline"
    );

    Timeline { steps, session }
}

fn push_fixation<R: Rng + ?Sized>(
    steps: &mut Vec<TimelineStep>,
    config: &TimelineConfig,
    rng: &mut R,
) {
    if !config.include_fixation {
        return;
    }
    let duration_ms = rng.gen_range(config.fixation.min_ms..=config.fixation.max_ms);
    debug!(duration_ms, "fixation");
    steps.push(TimelineStep::Fixation { duration_ms });
}
