use crate::{AppState, Effect, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
///
/// Start is only honoured while stopped and Stop only while running, which is
/// how the front-end disables redundant commands.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartClicked => {
            if state.session() == SessionState::Stopped {
                state.start_session();
                vec![Effect::StartLoop]
            } else {
                Vec::new()
            }
        }
        Msg::StopClicked => {
            if state.session() == SessionState::Running {
                state.request_stop();
                vec![Effect::StopLoop]
            } else {
                Vec::new()
            }
        }
        Msg::Progress { cycle, phase } => {
            state.apply_progress(cycle, phase);
            Vec::new()
        }
        Msg::CycleFailed { cycle: _, message } => {
            state.apply_failure(message.clone());
            vec![Effect::ShowError { message }]
        }
        Msg::LoopStopped => {
            state.apply_stopped();
            Vec::new()
        }
    };

    (state, effects)
}
