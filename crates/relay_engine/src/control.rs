//! Long-lived orchestrator: runs cycles back to back until told to stop.
//!
//! A supervisory task owns the lifecycle flag. Each `Running` period gets its
//! own cancellation token, checked before a cycle is launched and between sleep
//! increments. A cycle in flight always runs to completion.
use std::sync::Arc;
use std::time::Duration;

use relay_logging::{relay_debug, relay_info, relay_warn};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::ConfigProvider;
use crate::cycle::{Cycle, ProgressSink};
use crate::{ControlEvent, CycleEvent, CycleId, CycleProgress, FailureKind, RelayError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
    StopRequested,
}

#[derive(Debug, Clone)]
pub struct ControlSettings {
    /// Granularity of the inter-cycle sleep; a stop is observed between increments.
    pub sleep_increment: Duration,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            sleep_increment: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlCommand {
    Start,
    Stop,
}

/// Owner's side of the control loop.
pub struct ControlHandle {
    cmd_tx: mpsc::UnboundedSender<ControlCommand>,
    event_rx: mpsc::UnboundedReceiver<ControlEvent>,
    state_rx: watch::Receiver<LoopState>,
}

impl ControlHandle {
    /// Spawn the supervisory task on the current tokio runtime.
    pub fn spawn(
        cycle: Arc<dyn Cycle>,
        config: Arc<dyn ConfigProvider>,
        settings: ControlSettings,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(LoopState::Stopped);

        let supervisor = Supervisor {
            cycle,
            config,
            settings,
            event_tx,
            state_tx,
        };
        tokio::spawn(supervisor.run(cmd_rx));

        Self {
            cmd_tx,
            event_rx,
            state_rx,
        }
    }

    /// Begin cycling. Ignored unless the loop is `Stopped`.
    pub fn start(&self) {
        let _ = self.cmd_tx.send(ControlCommand::Start);
    }

    /// Halt at the next cycle boundary. Ignored unless the loop is `Running`.
    pub fn stop(&self) {
        let _ = self.cmd_tx.send(ControlCommand::Stop);
    }

    pub fn state(&self) -> LoopState {
        *self.state_rx.borrow()
    }

    /// Next event, or `None` once the supervisor has exited.
    pub async fn next_event(&mut self) -> Option<ControlEvent> {
        self.event_rx.recv().await
    }
}

struct Supervisor {
    cycle: Arc<dyn Cycle>,
    config: Arc<dyn ConfigProvider>,
    settings: ControlSettings,
    event_tx: mpsc::UnboundedSender<ControlEvent>,
    state_tx: watch::Sender<LoopState>,
}

impl Supervisor {
    async fn run(self, mut cmd_rx: mpsc::UnboundedReceiver<ControlCommand>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();
        let mut state = LoopState::Stopped;
        let mut token: Option<CancellationToken> = None;

        loop {
            tokio::select! {
                command = cmd_rx.recv() => {
                    let Some(command) = command else {
                        if let Some(token) = token.take() {
                            token.cancel();
                        }
                        break;
                    };
                    match (command, state) {
                        (ControlCommand::Start, LoopState::Stopped) => {
                            relay_info!("Starting control loop");
                            state = LoopState::Running;
                            self.state_tx.send_replace(state);
                            let run_token = CancellationToken::new();
                            token = Some(run_token.clone());
                            let run = RunLoop {
                                cycle: self.cycle.clone(),
                                config: self.config.clone(),
                                settings: self.settings.clone(),
                                event_tx: self.event_tx.clone(),
                                token: run_token,
                            };
                            let done_tx = done_tx.clone();
                            tokio::spawn(async move {
                                run.run().await;
                                let _ = done_tx.send(());
                            });
                        }
                        (ControlCommand::Stop, LoopState::Running) => {
                            relay_info!("Stop requested; finishing current cycle");
                            if let Some(token) = &token {
                                token.cancel();
                            }
                            state = LoopState::StopRequested;
                        }
                        (command, state) => {
                            relay_debug!("Ignoring {:?} while {:?}", command, state);
                        }
                    }
                    self.state_tx.send_replace(state);
                }
                Some(()) = done_rx.recv() => {
                    relay_info!("Control loop stopped");
                    token = None;
                    state = LoopState::Stopped;
                    self.state_tx.send_replace(state);
                    let _ = self.event_tx.send(ControlEvent::Stopped);
                }
            }
        }
    }
}

struct ChannelProgressSink {
    cycle: CycleId,
    tx: mpsc::UnboundedSender<ControlEvent>,
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: CycleEvent) {
        let event = match event {
            CycleEvent::Progress(progress) => ControlEvent::Progress {
                cycle: self.cycle,
                progress,
            },
            CycleEvent::Failed(error) => ControlEvent::CycleFailed {
                cycle: self.cycle,
                error,
            },
        };
        let _ = self.tx.send(event);
    }
}

struct RunLoop {
    cycle: Arc<dyn Cycle>,
    config: Arc<dyn ConfigProvider>,
    settings: ControlSettings,
    event_tx: mpsc::UnboundedSender<ControlEvent>,
    token: CancellationToken,
}

impl RunLoop {
    async fn run(self) {
        let mut cycle_id: CycleId = 0;
        let mut sleep = Duration::ZERO;

        loop {
            if self.token.is_cancelled() {
                break;
            }
            if cycle_id > 0 {
                relay_debug!("Sleep for {:?}", sleep);
                if !sleep_in_increments(sleep, self.settings.sleep_increment, &self.token).await {
                    break;
                }
            }
            relay_debug!("Searching loop cycle={}", cycle_id);

            let sink = ChannelProgressSink {
                cycle: cycle_id,
                tx: self.event_tx.clone(),
            };
            let config = match self.config.snapshot() {
                Ok(config) => config,
                Err(err) => {
                    relay_warn!("Cannot start cycle {}: {}", cycle_id, err);
                    report_failure(&sink, err);
                    break;
                }
            };
            sleep = config.sleep;

            let cycle = self.cycle.clone();
            let task = tokio::spawn(async move { cycle.run(&config, &sink).await });
            match task.await {
                Ok(Ok(_)) => {}
                // The cycle has already reported the error.
                Ok(Err(_)) => break,
                Err(join_err) => {
                    let sink = ChannelProgressSink {
                        cycle: cycle_id,
                        tx: self.event_tx.clone(),
                    };
                    report_failure(
                        &sink,
                        RelayError::new(FailureKind::Internal, join_err.to_string()),
                    );
                    break;
                }
            }
            cycle_id += 1;
        }
    }
}

fn report_failure(sink: &dyn ProgressSink, err: RelayError) {
    sink.emit(CycleEvent::Progress(CycleProgress::Error));
    sink.emit(CycleEvent::Failed(err));
}

/// Sleep `total` in `increment` steps. Returns `false` if cancelled at a step boundary.
async fn sleep_in_increments(
    total: Duration,
    increment: Duration,
    token: &CancellationToken,
) -> bool {
    let increment = if increment.is_zero() { total } else { increment };
    let mut remaining = total;
    while !remaining.is_zero() {
        if token.is_cancelled() {
            return false;
        }
        let step = remaining.min(increment);
        tokio::time::sleep(step).await;
        remaining -= step;
    }
    !token.is_cancelled()
}
