//! Meltdown - authoritative simulation kernel for an arcade panic-survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kernel, panic dynamics, boss AI)
//! - `tuning`: Data-driven game balance
//! - `transport`: Worker-thread host speaking the command/state protocol
//! - `error`: Fatal kernel and transport faults

pub mod error;
pub mod sim;
pub mod transport;
pub mod tuning;

pub use error::{KernelError, TransportError, TuningError};
pub use sim::{Command, Event, Kernel, SimulationState};
pub use transport::{Outbound, SimulationHost};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Duration of one reference frame (60 Hz) in milliseconds
    pub const FRAME_MS: f32 = 16.67;
    /// Default clamp on frames advanced by a single update (stall protection)
    pub const MAX_DT_STEPS: f32 = 60.0;

    /// Playfield dimensions
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;
    /// Distance past the edge before an enemy counts as escaped
    pub const EXIT_MARGIN: f32 = 40.0;
    /// Spawn row above the visible field
    pub const SPAWN_Y: f32 = -20.0;

    /// Hit-test radii for `SelectAt`
    pub const ENEMY_HIT_RADIUS: f32 = 36.0;
    pub const POWERUP_PICKUP_RADIUS: f32 = 30.0;

    /// Upper band the boss is confined to (px)
    pub const BOSS_BAND_TOP: f32 = 60.0;
    pub const BOSS_BAND_BOTTOM: f32 = 270.0;
    pub const BOSS_SIDE_MARGIN: f32 = 60.0;

    /// Panic scale
    pub const PANIC_MAX: f32 = 100.0;
}

/// Convert a logical frame count to milliseconds
#[inline]
pub fn frames_to_ms(frames: f32) -> f32 {
    frames * consts::FRAME_MS
}

/// True if a point lies inside the playfield expanded by `margin` on each side
#[inline]
pub fn in_playfield(pos: Vec2, margin: f32) -> bool {
    pos.x >= -margin
        && pos.x <= consts::PLAYFIELD_WIDTH + margin
        && pos.y >= -margin * 2.0
        && pos.y <= consts::PLAYFIELD_HEIGHT + margin
}

/// Clamp a point into the boss movement band
#[inline]
pub fn clamp_to_boss_band(pos: Vec2) -> Vec2 {
    Vec2::new(
        pos.x.clamp(
            consts::BOSS_SIDE_MARGIN,
            consts::PLAYFIELD_WIDTH - consts::BOSS_SIDE_MARGIN,
        ),
        pos.y.clamp(consts::BOSS_BAND_TOP, consts::BOSS_BAND_BOTTOM),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_playfield_edges() {
        assert!(in_playfield(Vec2::new(400.0, 300.0), 0.0));
        assert!(in_playfield(Vec2::new(-10.0, 300.0), 40.0));
        assert!(!in_playfield(Vec2::new(400.0, 700.0), 40.0));
        // Spawn row sits above the field but inside the doubled top margin
        assert!(in_playfield(Vec2::new(400.0, consts::SPAWN_Y), consts::EXIT_MARGIN));
    }

    #[test]
    fn test_clamp_to_boss_band() {
        let p = clamp_to_boss_band(Vec2::new(-100.0, 900.0));
        assert_eq!(p, Vec2::new(consts::BOSS_SIDE_MARGIN, consts::BOSS_BAND_BOTTOM));
    }
}
