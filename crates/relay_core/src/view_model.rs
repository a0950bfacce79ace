use crate::{Phase, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub phase: Phase,
    pub status: String,
    pub cycle: Option<u64>,
    pub cycles_completed: u64,
    pub last_error: Option<String>,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub dirty: bool,
}
