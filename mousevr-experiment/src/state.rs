use super::action::{Deferred, TaskAction};
use super::config::TaskTiming;
use super::delay::sample_delay;
use mousevr_core::{Choice, SessionParameters, TaskKind, TrialRecord, TrialState, ZoneEvent};
use mousevr_timing::{DeferredQueue, Timer};
use rand::Rng;
use tracing::{debug, info};

/// Behavioral core of the session.
///
/// Owns the trial record and implements the alternation and avoidance
/// transition tables. Side effects are queued as [`TaskAction`]s and drained
/// by the caller with [`TrialController::take_actions`] once per tick.
pub struct TrialController<T, R>
where
    T: Timer,
    R: Rng,
{
    pub params: SessionParameters,
    pub timing: TaskTiming,
    pub timer: T,
    pub rng: R,
    record: TrialRecord,
    deferred: DeferredQueue<Deferred>,
    actions: Vec<TaskAction>,
}

impl<T, R> TrialController<T, R>
where
    T: Timer,
    R: Rng,
{
    pub fn new(params: SessionParameters, timing: TaskTiming, timer: T, rng: R) -> Self {
        Self {
            params,
            timing,
            timer,
            rng,
            record: TrialRecord::new(),
            deferred: DeferredQueue::new(),
            actions: Vec::new(),
        }
    }

    /// Arms the task. Alternation stays in `Standby` until the first `end`
    /// crossing opens trial 1.
    pub fn begin(&mut self) {
        if self.params.task != TaskKind::Alternation {
            self.record.state = TrialState::Start;
        }
        info!(task = %self.params.task, "task armed");
    }

    /// Back to start-of-session defaults; pending deferred events are dropped
    pub fn reset(&mut self) {
        self.record.reset();
        self.deferred.clear();
        self.actions.clear();
    }

    /// Runs one control-loop tick: starts a pending avoidance cycle and fires
    /// every deferred event that has come due
    pub fn update(&mut self) {
        if self.params.task == TaskKind::Avoidance && self.record.state == TrialState::Start {
            self.start_delay_cycle();
        }

        let now = self.timer.now_ms();
        for event in self.deferred.drain_due(now) {
            debug!(?event, now, "deferred event fired");
            match event {
                Deferred::CueOn { trial } => self.cue_on(trial),
                Deferred::SuccessWindowClosed { trial } => self.check_success(trial),
                Deferred::TrialWindowClosed { trial } => self.check_failure(trial),
            }
        }
    }

    pub fn handle_zone(&mut self, event: &ZoneEvent) {
        self.record.note = event.name.clone();

        match self.params.task {
            TaskKind::Alternation => self.alternation(&event.object),
            TaskKind::Avoidance => self.avoidance(&event.object),
            TaskKind::Other(_) => {}
        }
    }

    pub fn take_actions(&mut self) -> Vec<TaskAction> {
        std::mem::take(&mut self.actions)
    }

    pub fn record(&self) -> &TrialRecord {
        &self.record
    }

    pub fn state(&self) -> TrialState {
        self.record.state
    }

    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    pub fn next_deferred_ms(&self) -> Option<u64> {
        self.deferred.next_fire_ms()
    }

    fn alternation(&mut self, object: &str) {
        if self.record.state == TrialState::Start {
            if object.starts_with('l') || object.starts_with('r') {
                self.record.choice = if object.starts_with('l') {
                    Choice::Left
                } else {
                    Choice::Right
                };
                if self.record.target == Choice::None || self.record.target == self.record.choice {
                    self.record.state = TrialState::Success;
                    self.record.correct += 1;
                    self.record.reward_ul += self.params.reward_ul;
                    self.actions.push(TaskAction::Reward);
                } else {
                    self.record.state = TrialState::Failure;
                }
                self.log_trial();
            }
        } else if object.starts_with('e') {
            self.record.state = TrialState::Start;
            self.record.target = self.record.choice.opposite();
            self.log_trial();
            self.print_summary();

            self.actions
                .push(TaskAction::Teleport(self.timing.start_waypoint.clone()));
            self.record.trial += 1;

            if self.record.trial >= self.params.trial_budget {
                info!(trials = self.record.trial, "trial budget reached");
                self.actions.push(TaskAction::Quit);
            }
        }
    }

    fn avoidance(&mut self, object: &str) {
        if object.starts_with("target") {
            if self.record.state == TrialState::Cue {
                self.record.state = TrialState::Success;
                self.record.correct += 1;
            } else {
                self.record.state = TrialState::Other;
            }
            self.clear_outputs();
            self.log_trial();
            self.print_summary();
            self.start_delay_cycle();
        } else if object.starts_with("end") {
            self.clear_outputs();
            self.start_delay_cycle();
            self.actions
                .push(TaskAction::Teleport(self.timing.origin_waypoint.clone()));
        }
    }

    fn start_delay_cycle(&mut self) {
        self.record.state = TrialState::Delay;
        self.record.trial += 1;
        self.log_trial();

        let delay = sample_delay(&mut self.rng);
        let trial = self.record.trial;
        self.deferred
            .schedule(self.timer.now_ms(), delay, Deferred::CueOn { trial });
    }

    fn cue_on(&mut self, trial: u32) {
        if trial != self.record.trial || self.record.state != TrialState::Delay {
            return;
        }
        self.record.state = TrialState::Cue;
        let now = self.timer.now_ms();
        self.deferred.schedule(
            now,
            self.timing.punishment_latency(),
            Deferred::SuccessWindowClosed { trial },
        );
        self.deferred.schedule(
            now,
            self.timing.punishment_duration(),
            Deferred::TrialWindowClosed { trial },
        );
        self.actions.push(TaskAction::ShowCue);
        self.log_trial();
    }

    fn check_success(&mut self, trial: u32) {
        if trial == self.record.trial && self.record.state == TrialState::Cue {
            self.record.state = TrialState::Failure;
            self.actions.push(TaskAction::PunishmentOn);
            self.log_trial();
        }
    }

    fn check_failure(&mut self, trial: u32) {
        if trial == self.record.trial && self.record.state == TrialState::Failure {
            self.record.state = TrialState::FailureEnd;
            self.clear_outputs();
            self.log_trial();
            self.print_summary();
            self.start_delay_cycle();
        }
    }

    fn clear_outputs(&mut self) {
        self.actions.push(TaskAction::HideCue);
        self.actions.push(TaskAction::PunishmentOff);
    }

    fn log_trial(&mut self) {
        self.actions.push(TaskAction::Log(self.record.snapshot()));
    }

    fn print_summary(&self) {
        info!(
            "trial: {}, correct: {}",
            self.record.trial, self.record.correct
        );
    }
}
