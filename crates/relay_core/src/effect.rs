#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the control loop to begin cycling.
    StartLoop,
    /// Ask the control loop to halt at the next cycle boundary.
    StopLoop,
    /// Surface a cycle error to the user.
    ShowError { message: String },
}
