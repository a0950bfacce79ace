use crate::view_model::AppViewModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Stopped,
    Running,
    /// Stop was requested; waiting for the loop to confirm.
    Stopping,
}

/// Stage of the current cycle, as last reported by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Stopped,
    Init,
    Fetching,
    Validating,
    SearchingNew,
    Persisting,
    Sending,
    Idle,
    Error,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Stopped => "Stopped",
            Phase::Init => "Initializing",
            Phase::Fetching => "Fetching posts",
            Phase::Validating => "Validating posts",
            Phase::SearchingNew => "Searching new posts",
            Phase::Persisting => "Saving new posts",
            Phase::Sending => "Sending",
            Phase::Idle => "Waiting for next cycle",
            Phase::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    phase: Phase,
    cycle: Option<u64>,
    cycles_completed: u64,
    last_error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            session: self.session,
            phase: self.phase,
            status: self.phase.label().to_string(),
            cycle: self.cycle,
            cycles_completed: self.cycles_completed,
            last_error: self.last_error.clone(),
            start_enabled: self.session == SessionState::Stopped,
            stop_enabled: self.session == SessionState::Running,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn start_session(&mut self) {
        self.session = SessionState::Running;
        self.last_error = None;
        self.dirty = true;
    }

    pub(crate) fn request_stop(&mut self) {
        self.session = SessionState::Stopping;
        self.dirty = true;
    }

    pub(crate) fn apply_progress(&mut self, cycle: u64, phase: Phase) {
        if phase == Phase::Idle && self.phase != Phase::Idle {
            self.cycles_completed += 1;
        }
        self.cycle = Some(cycle);
        self.phase = phase;
        self.dirty = true;
    }

    pub(crate) fn apply_failure(&mut self, message: String) {
        self.phase = Phase::Error;
        self.last_error = Some(message);
        self.dirty = true;
    }

    pub(crate) fn apply_stopped(&mut self) {
        self.session = SessionState::Stopped;
        if self.phase != Phase::Error {
            self.phase = Phase::Stopped;
        }
        self.dirty = true;
    }
}
