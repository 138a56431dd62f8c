//! Simulation state and core entity types
//!
//! `SimulationState` is the single aggregate owned by the kernel. Consumers
//! only ever see clones of it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::event::Event;
use super::panic::{TensionReading, Zone};
use crate::tuning::Tuning;

/// Which ability counters an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterType {
    Reality,
    History,
    Logic,
}

impl CounterType {
    pub const ALL: [CounterType; 3] =
        [CounterType::Reality, CounterType::History, CounterType::Logic];

    pub fn as_str(&self) -> &'static str {
        match self {
            CounterType::Reality => "reality",
            CounterType::History => "history",
            CounterType::Logic => "logic",
        }
    }

    /// Particle tint used when an enemy of this type is countered
    pub fn color(&self) -> ColorTag {
        match self {
            CounterType::Reality => ColorTag::Cyan,
            CounterType::History => ColorTag::Gold,
            CounterType::Logic => ColorTag::Green,
        }
    }
}

/// Named colours for flashes and particles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    #[default]
    White,
    Red,
    Gold,
    Violet,
    Cyan,
    Green,
}

/// A falling piece of misinformation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub label: String,
    pub counter_type: CounterType,
    pub speed: f32,
    /// Immune to abilities; only a nuke or escaping removes it
    pub encrypted: bool,
    pub is_child_variant: bool,
}

/// Boss attack pattern currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BossPattern {
    #[default]
    Idle,
    Burst,
    Sweep,
    Spiral,
    Summon,
    Rage,
    Reposition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub pos: Vec2,
    pub active_pattern: BossPattern,
    pub invuln_frames: u32,
    /// Seconds since the encounter started
    pub timer: f32,
    /// Configured base aggression (0-1)
    pub aggression: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    Slow,
    Shield,
    Double,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [PowerUpKind::Slow, PowerUpKind::Shield, PowerUpKind::Double];
}

/// A collectible floating in the playfield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpInstance {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    /// Milliseconds until it disappears
    pub ttl_ms: f32,
}

/// Remaining ability cooldowns (ms)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityCooldowns {
    pub reality: f32,
    pub history: f32,
    pub logic: f32,
}

impl AbilityCooldowns {
    pub fn get(&self, kind: CounterType) -> f32 {
        match kind {
            CounterType::Reality => self.reality,
            CounterType::History => self.history,
            CounterType::Logic => self.logic,
        }
    }

    pub fn set(&mut self, kind: CounterType, ms: f32) {
        let slot = match kind {
            CounterType::Reality => &mut self.reality,
            CounterType::History => &mut self.history,
            CounterType::Logic => &mut self.logic,
        };
        *slot = ms.max(0.0);
    }

    pub fn tick(&mut self, elapsed_ms: f32) {
        for slot in [&mut self.reality, &mut self.history, &mut self.logic] {
            *slot = (*slot - elapsed_ms).max(0.0);
        }
    }
}

/// Remaining power-up effect durations (ms)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerUpTimers {
    pub slow: f32,
    pub shield: f32,
    pub double: f32,
}

impl PowerUpTimers {
    pub fn activate(&mut self, kind: PowerUpKind, ms: f32) {
        let slot = match kind {
            PowerUpKind::Slow => &mut self.slow,
            PowerUpKind::Shield => &mut self.shield,
            PowerUpKind::Double => &mut self.double,
        };
        *slot = slot.max(ms);
    }

    pub fn tick(&mut self, elapsed_ms: f32) {
        for slot in [&mut self.slow, &mut self.shield, &mut self.double] {
            *slot = (*slot - elapsed_ms).max(0.0);
        }
    }

    pub fn slow_active(&self) -> bool {
        self.slow > 0.0
    }

    pub fn shield_active(&self) -> bool {
        self.shield > 0.0
    }

    pub fn double_active(&self) -> bool {
        self.double > 0.0
    }
}

/// Bonuses derived from the current combo; never set directly
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MomentumPerks {
    pub spawn_delay_reduction: f32,
    pub score_bonus: f32,
    pub cooldown_reduction: f32,
}

impl MomentumPerks {
    pub fn for_combo(combo: u32, tuning: &Tuning) -> Self {
        tuning
            .momentum_for(combo)
            .map(|b| Self {
                spawn_delay_reduction: b.spawn_delay_reduction,
                score_bonus: b.score_bonus,
                cooldown_reduction: b.cooldown_reduction,
            })
            .unwrap_or_default()
    }
}

/// Complete kernel state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub running: bool,
    pub paused: bool,
    pub endless: bool,
    pub endless_level: u32,
    pub boss_phase: bool,

    pub score: u64,
    pub combo_count: u32,
    pub max_combo: u32,
    pub counter_hits: u32,
    pub miss_count: u32,
    pub nukes_used: u32,

    /// Current wave index (0-based)
    pub wave_index: u32,
    /// Whole seconds left in the wave
    pub wave_time_remaining: f32,

    pub panic: f32,
    pub panic_invuln_frames: u32,
    pub tension: TensionReading,
    /// Band the current panic level falls in
    pub zone: Zone,

    pub ability_cooldowns: AbilityCooldowns,
    pub nuke_cooldown: f32,
    pub powerup_timers: PowerUpTimers,
    pub momentum_perks: MomentumPerks,

    /// Live enemies (sorted by id)
    pub enemies: Vec<Enemy>,
    pub powerups: Vec<PowerUpInstance>,
    pub boss: Option<Boss>,

    pub flash_intensity: f32,
    pub flash_color: ColorTag,
    pub shake_intensity: f32,

    /// Events raised since the last snapshot
    #[serde(skip)]
    pub pending_events: Vec<Event>,
    /// Next entity ID
    next_id: u32,
}

impl SimulationState {
    /// Fresh state for a run; nothing is carried over from a previous run
    pub fn new(seed: u64, endless: bool) -> Self {
        Self {
            seed,
            running: false,
            paused: false,
            endless,
            endless_level: 0,
            boss_phase: false,
            score: 0,
            combo_count: 0,
            max_combo: 0,
            counter_hits: 0,
            miss_count: 0,
            nukes_used: 0,
            wave_index: 0,
            wave_time_remaining: 0.0,
            panic: 0.0,
            panic_invuln_frames: 0,
            tension: TensionReading::default(),
            zone: Zone::Calm,
            ability_cooldowns: AbilityCooldowns::default(),
            nuke_cooldown: 0.0,
            powerup_timers: PowerUpTimers::default(),
            momentum_perks: MomentumPerks::default(),
            enemies: Vec::new(),
            powerups: Vec::new(),
            boss: None,
            flash_intensity: 0.0,
            flash_color: ColorTag::White,
            shake_intensity: 0.0,
            pending_events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append an event for the next snapshot
    pub fn emit(&mut self, event: Event) {
        self.pending_events.push(event);
    }

    /// Move out every pending event
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events)
    }

    /// True while updates should advance the world
    pub fn is_live(&self) -> bool {
        self.running && !self.paused
    }

    /// Raise flash to at least `intensity`
    pub fn flash(&mut self, intensity: f32, color: ColorTag) {
        if intensity >= self.flash_intensity {
            self.flash_color = color;
        }
        self.flash_intensity = self.flash_intensity.max(intensity).min(1.0);
    }

    /// Raise shake to at least `intensity`
    pub fn shake(&mut self, intensity: f32) {
        self.shake_intensity = self.shake_intensity.max(intensity).min(1.0);
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.powerups.sort_by_key(|p| p.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique() {
        let mut state = SimulationState::new(1, false);
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_drain_events_empties_queue() {
        let mut state = SimulationState::new(1, false);
        state.emit(Event::sound("ping", &[]));
        assert_eq!(state.drain_events().len(), 1);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_cooldowns_never_negative() {
        let mut cd = AbilityCooldowns::default();
        cd.set(CounterType::Logic, 100.0);
        cd.tick(250.0);
        assert_eq!(cd.get(CounterType::Logic), 0.0);
        cd.set(CounterType::History, -5.0);
        assert_eq!(cd.get(CounterType::History), 0.0);
    }

    #[test]
    fn test_powerup_activation_keeps_longer_timer() {
        let mut timers = PowerUpTimers::default();
        timers.activate(PowerUpKind::Shield, 5000.0);
        timers.activate(PowerUpKind::Shield, 1000.0);
        assert_eq!(timers.shield, 5000.0);
        timers.tick(5000.0);
        assert!(!timers.shield_active());
    }

    #[test]
    fn test_momentum_perks_follow_combo() {
        let tuning = Tuning::default();
        assert_eq!(MomentumPerks::for_combo(0, &tuning), MomentumPerks::default());
        let perks = MomentumPerks::for_combo(12, &tuning);
        assert!((perks.score_bonus - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_flash_keeps_strongest_color() {
        let mut state = SimulationState::new(1, false);
        state.flash(0.8, ColorTag::Red);
        state.flash(0.3, ColorTag::Violet);
        assert_eq!(state.flash_color, ColorTag::Red);
        assert!((state.flash_intensity - 0.8).abs() < 1e-6);
    }
}
