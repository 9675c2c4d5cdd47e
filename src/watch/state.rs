// src/watch/state.rs

//! Per-rule debounce / single-flight state machine.
//!
//! Pure and synchronous: every transition returns a [`RuleCommand`] for the
//! async watcher shell to carry out. Only the watcher loop owns these states.

/// Coarse state of one watch rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    /// A change was seen; waiting for the debounce window to close.
    Pending,
    /// The rule's target task is executing.
    Running,
}

/// What the watcher shell should do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCommand {
    /// (Re)start the debounce timer; only a timer carrying this generation
    /// may fire the rule.
    ArmTimer(u64),
    /// Execute the rule's target task now.
    Execute,
    Nothing,
}

#[derive(Debug, Clone, Default)]
pub struct RuleState {
    run_state: RunState,
    /// Set when a change arrives while running; coalesces into one catch-up run.
    rerun_pending: bool,
    generation: u64,
}

impl RuleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn has_pending_rerun(&self) -> bool {
        self.rerun_pending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A matching filesystem change was observed.
    pub fn on_change(&mut self) -> RuleCommand {
        match self.run_state {
            RunState::Idle | RunState::Pending => {
                self.run_state = RunState::Pending;
                self.arm()
            }
            RunState::Running => {
                self.rerun_pending = true;
                RuleCommand::Nothing
            }
        }
    }

    /// A debounce timer armed with `generation` elapsed.
    pub fn on_timer(&mut self, generation: u64) -> RuleCommand {
        if generation != self.generation || self.run_state != RunState::Pending {
            return RuleCommand::Nothing;
        }
        self.run_state = RunState::Running;
        RuleCommand::Execute
    }

    /// The target task finished, successfully or not.
    pub fn on_finished(&mut self) -> RuleCommand {
        if self.run_state != RunState::Running {
            return RuleCommand::Nothing;
        }

        if std::mem::take(&mut self.rerun_pending) {
            self.run_state = RunState::Pending;
            self.arm()
        } else {
            self.run_state = RunState::Idle;
            RuleCommand::Nothing
        }
    }

    fn arm(&mut self) -> RuleCommand {
        self.generation += 1;
        RuleCommand::ArmTimer(self.generation)
    }
}
