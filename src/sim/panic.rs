//! Panic dynamics
//!
//! Pure functions over the 0-100 panic scalar: the damage curve, combo-gated
//! recovery, zone classification, rubber-band difficulty, and the hysteretic
//! tension state used for presentation cues. Nothing here holds state.

use serde::{Deserialize, Serialize};

use crate::consts::PANIC_MAX;

/// Zone boundaries (lower edge inclusive)
pub const UNEASY_AT: f32 = 25.0;
pub const PANICKED_AT: f32 = 50.0;
pub const MELTDOWN_AT: f32 = 75.0;

/// Hysteresis thresholds for the tension state
pub const ENTER_TENSE: f32 = 33.0;
pub const EXIT_TENSE: f32 = 28.0;
pub const ENTER_CRITICAL: f32 = 66.0;
pub const EXIT_CRITICAL: f32 = 61.0;

/// Contiguous panic bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    Calm,
    Uneasy,
    Panicked,
    Meltdown,
}

impl Zone {
    /// Panic range covered by this zone
    pub fn bounds(self) -> (f32, f32) {
        match self {
            Zone::Calm => (0.0, UNEASY_AT),
            Zone::Uneasy => (UNEASY_AT, PANICKED_AT),
            Zone::Panicked => (PANICKED_AT, MELTDOWN_AT),
            Zone::Meltdown => (MELTDOWN_AT, PANIC_MAX),
        }
    }
}

/// Classify panic into its zone
pub fn zone_of(panic: f32) -> Zone {
    if panic >= MELTDOWN_AT {
        Zone::Meltdown
    } else if panic >= PANICKED_AT {
        Zone::Panicked
    } else if panic >= UNEASY_AT {
        Zone::Uneasy
    } else {
        Zone::Calm
    }
}

#[inline]
fn sigmoid8(x: f32) -> f32 {
    1.0 / (1.0 + (-8.0 * x).exp())
}

/// Scale a base hit by current panic; multiplier lies in (0.5, 2.0)
pub fn damage(base: f32, current_panic: f32) -> f32 {
    let p = current_panic.clamp(0.0, PANIC_MAX) / PANIC_MAX;
    base * (0.5 + sigmoid8(p - 0.5) * 1.5)
}

/// Panic recovered over `dt` frames at a given combo; never exceeds `current_panic`
pub fn decay(current_panic: f32, combo: u32, dt: f32) -> f32 {
    if combo < 3 || current_panic <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    let p = current_panic.min(PANIC_MAX) / PANIC_MAX;
    let streak = (combo.saturating_sub(2) as f32).sqrt();
    let resistance = 1.0 - 0.95 * p.powf(1.5);
    let amount = streak * 0.15 * resistance * dt * 0.08;
    amount.clamp(0.0, current_panic)
}

/// Panic after taking a hit of `base` size
pub fn apply_damage(current_panic: f32, base: f32) -> f32 {
    (current_panic + damage(base, current_panic)).clamp(0.0, PANIC_MAX)
}

/// Panic after one decay step
pub fn apply_decay(current_panic: f32, combo: u32, dt: f32) -> f32 {
    (current_panic - decay(current_panic, combo, dt)).clamp(0.0, PANIC_MAX)
}

/// Rubber-band multipliers handed to the spawner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyModifiers {
    /// Applied to the spawn interval (lower = faster spawns)
    pub spawn_rate_multiplier: f32,
    pub speed_multiplier: f32,
    pub encrypt_chance: f32,
    pub variant_chance: f32,
}

/// (start, end) of each linear ramp across a zone
struct ZoneRamp {
    spawn: (f32, f32),
    speed: (f32, f32),
    encrypt: (f32, f32),
    variant: (f32, f32),
}

fn ramp_for(zone: Zone) -> ZoneRamp {
    match zone {
        Zone::Calm => ZoneRamp {
            spawn: (1.00, 0.90),
            speed: (1.00, 1.08),
            encrypt: (0.02, 0.05),
            variant: (0.05, 0.08),
        },
        Zone::Uneasy => ZoneRamp {
            spawn: (0.95, 0.85),
            speed: (1.05, 1.12),
            encrypt: (0.05, 0.08),
            variant: (0.08, 0.12),
        },
        // Cresting into panic eases off before ramping again
        Zone::Panicked => ZoneRamp {
            spawn: (1.05, 0.90),
            speed: (1.00, 1.12),
            encrypt: (0.06, 0.12),
            variant: (0.10, 0.16),
        },
        Zone::Meltdown => ZoneRamp {
            spawn: (0.85, 0.75),
            speed: (1.15, 1.30),
            encrypt: (0.15, 0.25),
            variant: (0.20, 0.30),
        },
    }
}

#[inline]
fn lerp((a, b): (f32, f32), t: f32) -> f32 {
    a + (b - a) * t
}

/// Maximum encrypt/variant chance after wave scaling
pub const MAX_SPAWN_CHANCE: f32 = 0.6;

/// Difficulty for a panic level and wave index
pub fn difficulty_modifiers(panic: f32, wave: u32) -> DifficultyModifiers {
    let panic = panic.clamp(0.0, PANIC_MAX);
    let zone = zone_of(panic);
    let (lo, hi) = zone.bounds();
    let t = ((panic - lo) / (hi - lo)).clamp(0.0, 1.0);
    let ramp = ramp_for(zone);

    let w = (1.0 + 0.06 * wave as f32).min(2.0);
    let sw = w.sqrt();

    DifficultyModifiers {
        spawn_rate_multiplier: lerp(ramp.spawn, t) / sw,
        speed_multiplier: lerp(ramp.speed, t) * sw,
        encrypt_chance: (lerp(ramp.encrypt, t) * w).min(MAX_SPAWN_CHANCE),
        variant_chance: (lerp(ramp.variant, t) * w).min(MAX_SPAWN_CHANCE),
    }
}

/// Presentation-facing tension level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TensionState {
    #[default]
    Normal,
    Tense,
    Critical,
}

impl TensionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TensionState::Normal => "normal",
            TensionState::Tense => "tense",
            TensionState::Critical => "critical",
        }
    }
}

/// Tension state plus how deep into it panic sits (0-1)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TensionReading {
    pub state: TensionState,
    pub intensity: f32,
}

/// Classify tension with asymmetric thresholds so a boundary doesn't flicker
pub fn transform_state(panic: f32, previous: TensionState) -> TensionReading {
    let state = match previous {
        TensionState::Normal => {
            if panic >= ENTER_CRITICAL {
                TensionState::Critical
            } else if panic >= ENTER_TENSE {
                TensionState::Tense
            } else {
                TensionState::Normal
            }
        }
        TensionState::Tense => {
            if panic >= ENTER_CRITICAL {
                TensionState::Critical
            } else if panic <= EXIT_TENSE {
                TensionState::Normal
            } else {
                TensionState::Tense
            }
        }
        TensionState::Critical => {
            if panic <= EXIT_TENSE {
                TensionState::Normal
            } else if panic <= EXIT_CRITICAL {
                TensionState::Tense
            } else {
                TensionState::Critical
            }
        }
    };

    let intensity = match state {
        TensionState::Normal => panic / ENTER_TENSE,
        TensionState::Tense => (panic - EXIT_TENSE) / (ENTER_CRITICAL - EXIT_TENSE),
        TensionState::Critical => (panic - EXIT_CRITICAL) / (PANIC_MAX - EXIT_CRITICAL),
    };

    TensionReading {
        state,
        intensity: intensity.clamp(0.0, 1.0),
    }
}
