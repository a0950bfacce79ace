#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User clicked Start.
    StartClicked,
    /// User clicked Stop.
    StopClicked,
    /// Control loop entered a new stage of a cycle.
    Progress { cycle: u64, phase: crate::Phase },
    /// Control loop reported the error paired with `Phase::Error`.
    CycleFailed { cycle: u64, message: String },
    /// Control loop is back in its stopped state.
    LoopStopped,
}
