//! Fatal error types
//!
//! Invalid commands and cooldown rejections are not errors: the kernel ignores
//! them. Only corrupted state or a broken transport surfaces here.

use thiserror::Error;

use crate::sim::CounterType;

/// Internal invariant violations. Any of these halts the tick loop.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("tuning must configure at least one wave")]
    NoWaves,
    #[error("wave {wave} has no enemy counter types configured")]
    NoEnemyTypes { wave: u32 },
    #[error("vocabulary for {kind:?} enemies is empty")]
    EmptyVocabulary { kind: CounterType },
    #[error("simulation field `{field}` became non-finite")]
    NonFinite { field: &'static str },
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),
}

/// Faults at the isolation boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("simulation worker is no longer connected")]
    Disconnected,
    #[error("simulation worker panicked: {0}")]
    WorkerPanicked(String),
    #[error("failed to spawn simulation worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Failures while loading tuning data.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] KernelError),
}
