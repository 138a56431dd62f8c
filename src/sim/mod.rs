//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame-scaled timestep, clamped per update
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio, or platform dependencies

pub mod boss;
pub mod command;
pub mod event;
pub mod kernel;
pub mod panic;
pub mod rng;
pub mod state;
pub mod tick;

pub use boss::{BossBrain, BossView, Directive};
pub use command::Command;
pub use event::Event;
pub use kernel::{Kernel, Snapshot};
pub use panic::{
    DifficultyModifiers, TensionReading, TensionState, Zone, difficulty_modifiers, transform_state,
};
pub use rng::SeededRng;
pub use state::{
    AbilityCooldowns, Boss, BossPattern, ColorTag, CounterType, Enemy, MomentumPerks,
    PowerUpInstance, PowerUpKind, PowerUpTimers, SimulationState,
};
