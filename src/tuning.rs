//! Data-driven game balance
//!
//! Every balance constant the kernel reads lives here. Tuning is plain serde
//! data so a host can ship it as JSON; missing fields fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_DT_STEPS;
use crate::error::{KernelError, TuningError};
use crate::sim::CounterType;

/// Which boss attack patterns are enabled for an encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSet {
    pub burst: bool,
    pub sweep: bool,
    pub spiral: bool,
    pub summon: bool,
    pub rage: bool,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            burst: true,
            sweep: true,
            spiral: true,
            summon: true,
            rage: true,
        }
    }
}

/// Boss encounter attached to the end of a wave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossConfig {
    pub name: String,
    pub hp: u32,
    /// 0.0 (lazy) to 1.0 (relentless)
    pub aggression: f32,
    #[serde(default)]
    pub patterns: PatternSet,
}

/// One entry of the wave list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    pub name: String,
    pub duration_secs: f32,
    pub spawn_interval_ms: f32,
    pub max_enemies: usize,
    /// Base enemy speed in px per reference frame
    pub enemy_speed: f32,
    pub counter_types: Vec<CounterType>,
    #[serde(default)]
    pub boss: Option<BossConfig>,
}

/// Perks granted once combo reaches `min_combo`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumBreakpoint {
    pub min_combo: u32,
    pub spawn_delay_reduction: f32,
    pub score_bonus: f32,
    pub cooldown_reduction: f32,
}

/// Label words per counter type, plus cosmetic feed content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub reality: Vec<String>,
    pub history: Vec<String>,
    pub logic: Vec<String>,
    pub feed_handles: Vec<String>,
    pub feed_lines: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            reality: words(&["HOAX", "DEEPFAKE", "CROP CIRCLE", "FLAT EARTH", "DOCTORED"]),
            history: words(&["REVISIONISM", "MYTH", "FAKE QUOTE", "LOST EMPIRE", "ANACHRONISM"]),
            logic: words(&["STRAWMAN", "FALLACY", "SLIPPERY SLOPE", "AD HOMINEM", "CIRCULAR"]),
            feed_handles: words(&["@truthseeker", "@dailyclick", "@grandpa_posts", "@viral_now"]),
            feed_lines: words(&[
                "you won't believe what happened next",
                "scientists HATE this one trick",
                "sharing before they delete it",
                "do your own research",
                "this changes everything",
            ]),
        }
    }
}

impl Vocabulary {
    /// Words used to label enemies of a counter type
    pub fn labels(&self, kind: CounterType) -> &[String] {
        match kind {
            CounterType::Reality => &self.reality,
            CounterType::History => &self.history,
            CounterType::Logic => &self.logic,
        }
    }
}

/// Complete balance sheet for the kernel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Seed used when `Start` carries none and no run has happened yet
    pub default_seed: u64,
    /// Clamp on frames advanced by one update
    pub max_dt_steps: f32,

    // === Scoring ===
    pub counter_base_score: u64,
    pub boss_kill_bonus: u64,
    pub momentum: Vec<MomentumBreakpoint>,

    // === Abilities (ms) ===
    pub reality_cooldown_ms: f32,
    pub history_cooldown_ms: f32,
    pub logic_cooldown_ms: f32,
    pub nuke_cooldown_ms: f32,
    pub nuke_damage: u32,
    /// Frames the boss ignores further nuke damage after a hit
    pub boss_invuln_frames: u32,

    // === Panic ===
    pub escape_panic_damage: f32,
    pub panic_invuln_frames: u32,

    // === Power-ups (ms) ===
    pub powerup_interval_ms: f32,
    pub powerup_lifetime_ms: f32,
    pub slow_duration_ms: f32,
    pub shield_duration_ms: f32,
    pub double_duration_ms: f32,

    // === Cosmetics ===
    pub feed_interval_ms: f32,

    pub vocabulary: Vocabulary,
    pub waves: Vec<WaveConfig>,
}

impl Default for Tuning {
    fn default() -> Self {
        use CounterType::*;

        Self {
            default_seed: 0x5EED_CAFE,
            max_dt_steps: MAX_DT_STEPS,

            counter_base_score: 100,
            boss_kill_bonus: 500,
            momentum: vec![
                MomentumBreakpoint {
                    min_combo: 5,
                    spawn_delay_reduction: 0.05,
                    score_bonus: 0.10,
                    cooldown_reduction: 0.05,
                },
                MomentumBreakpoint {
                    min_combo: 10,
                    spawn_delay_reduction: 0.10,
                    score_bonus: 0.25,
                    cooldown_reduction: 0.10,
                },
                MomentumBreakpoint {
                    min_combo: 20,
                    spawn_delay_reduction: 0.15,
                    score_bonus: 0.50,
                    cooldown_reduction: 0.20,
                },
                MomentumBreakpoint {
                    min_combo: 35,
                    spawn_delay_reduction: 0.20,
                    score_bonus: 1.00,
                    cooldown_reduction: 0.30,
                },
            ],

            reality_cooldown_ms: 2500.0,
            history_cooldown_ms: 3000.0,
            logic_cooldown_ms: 3500.0,
            nuke_cooldown_ms: 12_000.0,
            nuke_damage: 3,
            boss_invuln_frames: 45,

            escape_panic_damage: 8.0,
            panic_invuln_frames: 12,

            powerup_interval_ms: 15_000.0,
            powerup_lifetime_ms: 6_000.0,
            slow_duration_ms: 8_000.0,
            shield_duration_ms: 10_000.0,
            double_duration_ms: 10_000.0,

            feed_interval_ms: 4_000.0,

            vocabulary: Vocabulary::default(),
            waves: vec![
                WaveConfig {
                    name: "Rumors".into(),
                    duration_secs: 30.0,
                    spawn_interval_ms: 1600.0,
                    max_enemies: 6,
                    enemy_speed: 1.0,
                    counter_types: vec![Reality],
                    boss: None,
                },
                WaveConfig {
                    name: "Chain Letters".into(),
                    duration_secs: 35.0,
                    spawn_interval_ms: 1400.0,
                    max_enemies: 8,
                    enemy_speed: 1.15,
                    counter_types: vec![Reality, History],
                    boss: None,
                },
                WaveConfig {
                    name: "Comment Section".into(),
                    duration_secs: 40.0,
                    spawn_interval_ms: 1200.0,
                    max_enemies: 10,
                    enemy_speed: 1.3,
                    counter_types: vec![Reality, History, Logic],
                    boss: Some(BossConfig {
                        name: "The Algorithm".into(),
                        hp: 6,
                        aggression: 0.35,
                        patterns: PatternSet {
                            spiral: false,
                            ..PatternSet::default()
                        },
                    }),
                },
                WaveConfig {
                    name: "Trending".into(),
                    duration_secs: 45.0,
                    spawn_interval_ms: 1000.0,
                    max_enemies: 12,
                    enemy_speed: 1.45,
                    counter_types: vec![Reality, History, Logic],
                    boss: None,
                },
                WaveConfig {
                    name: "Going Viral".into(),
                    duration_secs: 50.0,
                    spawn_interval_ms: 850.0,
                    max_enemies: 14,
                    enemy_speed: 1.6,
                    counter_types: vec![Reality, History, Logic],
                    boss: Some(BossConfig {
                        name: "Patient Zero".into(),
                        hp: 9,
                        aggression: 0.7,
                        patterns: PatternSet::default(),
                    }),
                },
            ],
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON and validate it
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json_str(&json)?;
        log::info!(
            "Loaded tuning from {} ({} waves)",
            path.as_ref().display(),
            tuning.waves.len()
        );
        Ok(tuning)
    }

    /// Check the invariants the kernel relies on
    pub fn validate(&self) -> Result<(), KernelError> {
        if self.waves.is_empty() {
            return Err(KernelError::NoWaves);
        }
        for (index, wave) in self.waves.iter().enumerate() {
            if wave.counter_types.is_empty() {
                return Err(KernelError::NoEnemyTypes { wave: index as u32 });
            }
            for &kind in &wave.counter_types {
                if self.vocabulary.labels(kind).is_empty() {
                    return Err(KernelError::EmptyVocabulary { kind });
                }
            }
            if !wave.duration_secs.is_finite() || wave.duration_secs <= 0.0 {
                return Err(KernelError::InvalidTuning(format!(
                    "wave {index} duration must be positive"
                )));
            }
        }
        if !self.max_dt_steps.is_finite() || self.max_dt_steps < 1.0 {
            return Err(KernelError::InvalidTuning(
                "max_dt_steps must be at least one frame".into(),
            ));
        }
        Ok(())
    }

    /// Full cooldown for an ability
    pub fn ability_cooldown_ms(&self, kind: CounterType) -> f32 {
        match kind {
            CounterType::Reality => self.reality_cooldown_ms,
            CounterType::History => self.history_cooldown_ms,
            CounterType::Logic => self.logic_cooldown_ms,
        }
    }

    /// Wave configuration for an index; endless runs cycle the list
    pub fn wave(&self, index: u32) -> Option<&WaveConfig> {
        if self.waves.is_empty() {
            return None;
        }
        self.waves.get(index as usize % self.waves.len())
    }

    /// Highest momentum breakpoint reached by a combo
    pub fn momentum_for(&self, combo: u32) -> Option<&MomentumBreakpoint> {
        self.momentum
            .iter()
            .filter(|b| combo >= b.min_combo)
            .max_by_key(|b| b.min_combo)
    }
}
