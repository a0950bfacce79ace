mod cli;
mod effects;
mod settings;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use relay_core::{update, AppState, Msg, SessionState};
use relay_engine::{
    ControlHandle, ControlSettings, CycleRunner, Ledger, LiveConnector, STOPPED_CODE,
};
use relay_logging::{relay_info, LogDestination};

use cli::Cli;
use effects::{map_event, EffectRunner};
use settings::{load_settings, save_settings, SettingsFile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    relay_logging::initialize(LogDestination::Both(cli.log_file.clone()), cli.log_level);

    if cli.write_default_settings {
        let current = load_settings(&cli.settings)?;
        save_settings(&cli.settings, &current)?;
        return Ok(());
    }

    let ledger = Ledger::new(cli.ledger.clone());
    ledger
        .ensure_exists()
        .with_context(|| format!("initializing ledger {:?}", cli.ledger))?;

    if cli.compact_ledger {
        let removed = ledger.compact()?;
        println!("removed {removed} duplicate entries");
        return Ok(());
    }

    let runner = CycleRunner::new(Box::new(LiveConnector::default()), ledger);
    let mut control = ControlHandle::spawn(
        Arc::new(runner),
        Arc::new(SettingsFile::new(cli.settings.clone())),
        ControlSettings::default(),
    );

    let mut state = AppState::new();
    state = dispatch(state, Msg::StartClicked, &control);

    loop {
        tokio::select! {
            event = control.next_event() => {
                let Some(event) = event else { break };
                state = dispatch(state, map_event(event), &control);
                if state.session() == SessionState::Stopped {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for ctrl-c")?;
                relay_info!("Interrupt received; stopping after the current cycle");
                state = dispatch(state, Msg::StopClicked, &control);
            }
        }
    }

    relay_info!("Exited (state code {})", STOPPED_CODE);
    Ok(())
}

fn dispatch(state: AppState, msg: Msg, control: &ControlHandle) -> AppState {
    let (mut state, effects) = update(state, msg);
    EffectRunner::new(control).run(effects);
    if state.consume_dirty() {
        let view = state.view();
        match view.cycle {
            Some(cycle) => relay_info!("State [cycle {}]: {}", cycle, view.status),
            None => relay_info!("State: {}", view.status),
        }
    }
    state
}
