use relay_core::{Effect, Msg, Phase};
use relay_engine::{ControlEvent, ControlHandle, CycleProgress};
use relay_logging::{relay_error, relay_info};

/// Executes core effects against the control loop.
pub(crate) struct EffectRunner<'a> {
    control: &'a ControlHandle,
}

impl<'a> EffectRunner<'a> {
    pub(crate) fn new(control: &'a ControlHandle) -> Self {
        Self { control }
    }

    pub(crate) fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartLoop => {
                    relay_info!("Start requested");
                    self.control.start();
                }
                Effect::StopLoop => {
                    relay_info!("Stop requested");
                    self.control.stop();
                }
                Effect::ShowError { message } => {
                    relay_error!("Cycle error: {}", message);
                    eprintln!("error: {message}");
                }
            }
        }
    }
}

pub(crate) fn map_event(event: ControlEvent) -> Msg {
    match event {
        ControlEvent::Progress { cycle, progress } => Msg::Progress {
            cycle,
            phase: map_progress(progress),
        },
        ControlEvent::CycleFailed { cycle, error } => Msg::CycleFailed {
            cycle,
            message: error.to_string(),
        },
        ControlEvent::Stopped => Msg::LoopStopped,
    }
}

fn map_progress(progress: CycleProgress) -> Phase {
    match progress {
        CycleProgress::Init => Phase::Init,
        CycleProgress::Fetching => Phase::Fetching,
        CycleProgress::Validating => Phase::Validating,
        CycleProgress::SearchingNew => Phase::SearchingNew,
        CycleProgress::Persisting => Phase::Persisting,
        CycleProgress::Sending => Phase::Sending,
        CycleProgress::Idle => Phase::Idle,
        CycleProgress::Error => Phase::Error,
    }
}
