//! Commands accepted by the kernel
//!
//! Every command is safe to send at any time; ones that make no sense in the
//! current phase are ignored.

use serde::{Deserialize, Serialize};

use super::state::CounterType;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Begin a fresh run; without a seed the next seed in sequence is used
    Start { seed: Option<u64> },
    /// Begin a fresh run that continues past the last configured wave
    StartEndless,
    Pause,
    Resume,
    TriggerAbility { kind: CounterType },
    TriggerNuke,
    /// Pointer selection in playfield coordinates
    SelectAt { x: f32, y: f32 },
    /// Stop the run and release the host
    Terminate,
}

impl Command {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::StartEndless => "start_endless",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::TriggerAbility { .. } => "trigger_ability",
            Command::TriggerNuke => "trigger_nuke",
            Command::SelectAt { .. } => "select_at",
            Command::Terminate => "terminate",
        }
    }
}
