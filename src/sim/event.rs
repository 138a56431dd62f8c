//! Outbound events
//!
//! The kernel appends events while it mutates state; they are drained in one
//! move each time a snapshot is taken. Consumers never feed them back.

use serde::{Deserialize, Serialize};

use super::panic::TensionState;
use super::state::{ColorTag, PowerUpKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Audio cue by name with free-form numeric arguments
    SoundCue { name: String, args: Vec<f32> },
    ParticleBurst { x: f32, y: f32, color: ColorTag },
    ConfettiBurst { x: f32, y: f32 },
    /// Cosmetic social-feed chatter
    FeedItem { handle: String, text: String },
    WaveStart { index: u32, name: String, endless_level: u32 },
    BossStart { name: String, hp: u32 },
    BossHit { hp: u32, max_hp: u32 },
    BossDie { name: String, x: f32, y: f32 },
    PowerUpCollected { kind: PowerUpKind },
    TensionShift { state: TensionState, intensity: f32 },
    GameOver { score: u64, win: bool },
}

impl Event {
    pub fn sound(name: &str, args: &[f32]) -> Self {
        Event::SoundCue {
            name: name.to_string(),
            args: args.to_vec(),
        }
    }

    /// True for the terminal event of a run
    pub fn is_game_over(&self) -> bool {
        matches!(self, Event::GameOver { .. })
    }
}
