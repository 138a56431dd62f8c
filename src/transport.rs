//! Isolation boundary between the kernel and its consumers
//!
//! The kernel runs on its own thread. Commands go in over one channel; state
//! snapshots and fatal errors come out over another. Nothing else is shared.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, after, select, unbounded};
use serde::{Deserialize, Serialize};

use crate::consts::FRAME_MS;
use crate::error::{KernelError, TransportError};
use crate::sim::{Command, Event, Kernel, SimulationState, Snapshot};
use crate::tuning::Tuning;

/// Re-arm interval for the tick timer
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Kernel -> consumer message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Outbound {
    State {
        snapshot: SimulationState,
        events: Vec<Event>,
    },
    Error {
        message: String,
    },
}

impl Outbound {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<Snapshot> for Outbound {
    fn from(snapshot: Snapshot) -> Self {
        Outbound::State {
            snapshot: snapshot.state,
            events: snapshot.events,
        }
    }
}

/// Owner side of a kernel running on a dedicated thread
pub struct SimulationHost {
    commands: Option<Sender<Command>>,
    outbound: Receiver<Outbound>,
    handle: Option<JoinHandle<()>>,
}

impl SimulationHost {
    /// Validate `tuning` and start the simulation thread
    pub fn spawn(tuning: Tuning) -> Result<Self, TransportError> {
        let kernel = Kernel::new(tuning)?;
        let (command_tx, command_rx) = unbounded();
        let (outbound_tx, outbound_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("meltdown-sim".into())
            .spawn(move || run(kernel, command_rx, outbound_tx))?;
        log::info!("Simulation thread started");

        Ok(Self {
            commands: Some(command_tx),
            outbound: outbound_rx,
            handle: Some(handle),
        })
    }

    /// Fire-and-forget command delivery
    pub fn send(&self, cmd: Command) -> Result<(), TransportError> {
        let sender = self.commands.as_ref().ok_or(TransportError::Disconnected)?;
        sender.send(cmd).map_err(|_| TransportError::Disconnected)
    }

    /// Stream of state snapshots and errors
    pub fn outbound(&self) -> &Receiver<Outbound> {
        &self.outbound
    }

    /// Terminate the kernel and wait for its thread
    pub fn shutdown(mut self) -> Result<(), TransportError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), TransportError> {
        if let Some(sender) = self.commands.take() {
            // The worker may already be gone after a fatal error
            let _ = sender.send(Command::Terminate);
        }
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|payload| TransportError::WorkerPanicked(panic_message(payload.as_ref()))),
            None => Ok(()),
        }
    }
}

impl Drop for SimulationHost {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::warn!("Simulation thread ended badly: {err}");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run kernel work, turning both errors and panics into a message
fn guarded(work: impl FnOnce() -> Result<(), KernelError>) -> Result<(), String> {
    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(format!("kernel panicked: {}", panic_message(payload.as_ref()))),
    }
}

/// Push the current snapshot out; a dead consumer pauses the kernel
fn publish(kernel: &mut Kernel, outbound: &Sender<Outbound>) {
    if outbound.send(kernel.snapshot().into()).is_err() {
        log::warn!("State consumer disconnected, pausing simulation");
        // Pause is never an error
        let _ = kernel.handle_command(Command::Pause);
    }
}

fn fail(message: String, outbound: &Sender<Outbound>) {
    log::error!("Simulation halted: {message}");
    let _ = outbound.send(Outbound::Error { message });
}

fn run(kernel: Kernel, commands: Receiver<Command>, outbound: Sender<Outbound>) {
    run_with_interval(kernel, commands, outbound, TICK_INTERVAL);
}

/// Apply every already-queued command, stopping early once the kernel stops
/// ticking. Returns the failure message if one of them faulted.
fn drain_commands(kernel: &mut Kernel, commands: &Receiver<Command>) -> Result<(), String> {
    for cmd in commands.try_iter() {
        guarded(|| kernel.handle_command(cmd))?;
        if !kernel.is_ticking() {
            break;
        }
    }
    Ok(())
}

fn run_with_interval(
    mut kernel: Kernel,
    commands: Receiver<Command>,
    outbound: Sender<Outbound>,
    interval: Duration,
) {
    let epoch = Instant::now();
    let mut last_tick = epoch;
    let mut ticker = after(interval);

    while !kernel.is_terminated() {
        let was_ticking = kernel.is_ticking();

        if was_ticking {
            select! {
                recv(commands) -> msg => {
                    let Ok(cmd) = msg else { break };
                    if let Err(message) = guarded(|| kernel.handle_command(cmd)) {
                        fail(message, &outbound);
                        break;
                    }
                    if !kernel.is_ticking() {
                        publish(&mut kernel, &outbound);
                    }
                }
                recv(ticker) -> _ => {
                    // Commands that beat the deadline land before this frame
                    if let Err(message) = drain_commands(&mut kernel, &commands) {
                        fail(message, &outbound);
                        break;
                    }
                    if !kernel.is_ticking() {
                        publish(&mut kernel, &outbound);
                        continue;
                    }
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32() * 1000.0 / FRAME_MS;
                    last_tick = now;
                    if let Err(message) = guarded(|| kernel.update(dt, now.duration_since(epoch))) {
                        fail(message, &outbound);
                        break;
                    }
                    publish(&mut kernel, &outbound);
                    ticker = after(interval);
                }
            }
        } else {
            // Nothing to simulate; wait for a command
            let Ok(cmd) = commands.recv() else { break };
            if let Err(message) = guarded(|| kernel.handle_command(cmd)) {
                fail(message, &outbound);
                break;
            }
            publish(&mut kernel, &outbound);
            if kernel.is_ticking() {
                last_tick = Instant::now();
                ticker = after(interval);
            }
        }
    }
    log::info!("Simulation thread exiting");
}
