//! Simulation kernel: state ownership, commands, and snapshots
//!
//! The per-tick `update` pass lives in `tick.rs`.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boss::BossBrain;
use super::command::Command;
use super::event::Event;
use super::rng::{COSMETIC_STREAM, GAMEPLAY_STREAM, SeededRng};
use super::state::{
    Boss, BossPattern, ColorTag, CounterType, Enemy, MomentumPerks, PowerUpKind, SimulationState,
};
use crate::consts::{ENEMY_HIT_RADIUS, PLAYFIELD_WIDTH, POWERUP_PICKUP_RADIUS};
use crate::error::KernelError;
use crate::tuning::{BossConfig, Tuning};

/// Where a new boss appears
pub const BOSS_ENTRY_POS: Vec2 = Vec2::new(PLAYFIELD_WIDTH / 2.0, 140.0);
/// Step between derived seeds when `Start` omits one
const SEED_STEP: u64 = 0x9E37_79B9_7F4A_7C15;

/// Read-only copy of the state plus the events drained with it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: SimulationState,
    pub events: Vec<Event>,
}

/// Run-scoped bookkeeping that is not part of the observable state.
/// Replaced wholesale on every start.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunBook {
    pub(crate) brain: Option<BossBrain>,
    pub(crate) boss_started: bool,
    pub(crate) wave_advance_pending: bool,
    pub(crate) last_wall: Option<Duration>,
    pub(crate) second_bucket_ms: f32,
    pub(crate) spawn_elapsed_ms: f32,
    pub(crate) powerup_elapsed_ms: f32,
    pub(crate) feed_elapsed_ms: f32,
    frame_carry: f32,
}

impl RunBook {
    /// Whole frames elapsed, carrying the fractional remainder
    pub(crate) fn take_frames(&mut self, dt: f32) -> u32 {
        self.frame_carry += dt;
        let whole = self.frame_carry.floor();
        self.frame_carry -= whole;
        whole as u32
    }
}

/// Difficulty scale for endless levels past the configured waves
pub fn endless_scale(level: u32) -> f32 {
    1.0 + 0.08 * level as f32
}

/// The authoritative simulation
pub struct Kernel {
    pub(crate) tuning: Tuning,
    pub(crate) state: SimulationState,
    pub(crate) run: RunBook,
    pub(crate) rng: SeededRng,
    pub(crate) cosmetic: SeededRng,
    last_seed: Option<u64>,
    terminated: bool,
}

impl Kernel {
    pub fn new(tuning: Tuning) -> Result<Self, KernelError> {
        tuning.validate()?;
        let seed = tuning.default_seed;
        Ok(Self {
            tuning,
            state: SimulationState::new(seed, false),
            run: RunBook::default(),
            rng: SeededRng::new(seed, GAMEPLAY_STREAM),
            cosmetic: SeededRng::new(seed, COSMETIC_STREAM),
            last_seed: None,
            terminated: false,
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// True while the host should keep scheduling ticks
    pub fn is_ticking(&self) -> bool {
        !self.terminated && self.state.is_live()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Copy the state and drain the event queue
    pub fn snapshot(&mut self) -> Snapshot {
        let events = self.state.drain_events();
        Snapshot {
            state: self.state.clone(),
            events,
        }
    }

    /// Apply one command. Commands that don't fit the current phase are
    /// ignored; only a broken invariant is an error.
    pub fn handle_command(&mut self, cmd: Command) -> Result<(), KernelError> {
        if self.terminated {
            return Ok(());
        }
        log::debug!("command {}", cmd.name());

        match cmd {
            Command::Start { seed } => {
                let seed = seed.unwrap_or_else(|| self.next_seed());
                self.start_run(seed, false)?;
            }
            Command::StartEndless => {
                let seed = self.next_seed();
                self.start_run(seed, true)?;
            }
            Command::Pause => {
                if self.state.is_live() {
                    self.state.paused = true;
                    self.state.emit(Event::sound("pause", &[]));
                }
            }
            Command::Resume => {
                if self.state.running && self.state.paused {
                    self.state.paused = false;
                    // Time spent paused never reaches the wave clock
                    self.run.last_wall = None;
                    self.state.emit(Event::sound("resume", &[]));
                }
            }
            Command::TriggerAbility { kind } => {
                if self.state.is_live() {
                    self.trigger_ability(kind);
                }
            }
            Command::TriggerNuke => {
                if self.state.is_live() {
                    self.trigger_nuke();
                }
            }
            Command::SelectAt { x, y } => {
                if self.state.is_live() && x.is_finite() && y.is_finite() {
                    self.select_at(Vec2::new(x, y));
                }
            }
            Command::Terminate => {
                self.state.running = false;
                self.terminated = true;
                log::info!("Kernel terminated");
            }
        }
        Ok(())
    }

    fn next_seed(&self) -> u64 {
        self.last_seed
            .map(|s| s.wrapping_add(SEED_STEP))
            .unwrap_or(self.tuning.default_seed)
    }

    /// Throw away every trace of the previous run and begin wave 0
    pub(crate) fn start_run(&mut self, seed: u64, endless: bool) -> Result<(), KernelError> {
        self.state = SimulationState::new(seed, endless);
        self.run = RunBook::default();
        self.rng.reseed(seed);
        self.cosmetic.reseed(seed);
        self.last_seed = Some(seed);
        self.state.running = true;
        log::info!("Run started with seed {seed} (endless: {endless})");
        self.begin_wave(0)
    }

    pub(crate) fn begin_wave(&mut self, index: u32) -> Result<(), KernelError> {
        let len = self.tuning.waves.len() as u32;
        let wave = self.tuning.wave(index).ok_or(KernelError::NoWaves)?;
        if wave.counter_types.is_empty() {
            return Err(KernelError::NoEnemyTypes { wave: index });
        }
        let name = wave.name.clone();
        let duration = wave.duration_secs;

        self.state.wave_index = index;
        self.state.endless_level = if index >= len { index - len + 1 } else { 0 };
        self.state.wave_time_remaining = duration;
        self.run.boss_started = false;
        self.run.spawn_elapsed_ms = 0.0;

        log::info!("Wave {} ({name}) starting, endless level {}", index, self.state.endless_level);
        self.state.emit(Event::WaveStart {
            index,
            name,
            endless_level: self.state.endless_level,
        });
        self.state.emit(Event::sound("wave_start", &[index as f32]));
        self.state.flash(0.4, ColorTag::White);
        Ok(())
    }

    /// Move to the next wave, or end the run when the list is exhausted
    pub(crate) fn advance_wave(&mut self) -> Result<(), KernelError> {
        let next = self.state.wave_index + 1;
        if next as usize >= self.tuning.waves.len() && !self.state.endless {
            self.finish(true);
            return Ok(());
        }
        self.begin_wave(next)
    }

    pub(crate) fn finish(&mut self, win: bool) {
        self.state.running = false;
        self.state.boss = None;
        self.state.boss_phase = false;
        self.run.brain = None;
        log::info!("Game over (win: {win}) with score {}", self.state.score);
        self.state.emit(Event::sound(if win { "victory" } else { "defeat" }, &[]));
        self.state.emit(Event::GameOver {
            score: self.state.score,
            win,
        });
    }

    /// Enter the boss phase; regular enemies never share the field with a boss
    pub(crate) fn start_boss(&mut self, config: &BossConfig) {
        let level = self.state.endless_level;
        let hp = (config.hp + level * 2).max(1);
        let aggression = (config.aggression + 0.05 * level as f32).clamp(0.0, 1.0);

        self.state.enemies.clear();
        self.state.boss = Some(Boss {
            name: config.name.clone(),
            hp,
            max_hp: hp,
            pos: BOSS_ENTRY_POS,
            active_pattern: BossPattern::Idle,
            invuln_frames: 0,
            timer: 0.0,
            aggression,
        });
        self.state.boss_phase = true;
        self.run.boss_started = true;
        self.run.brain = Some(BossBrain::new(BOSS_ENTRY_POS));

        log::info!("Boss {} enters with {hp} hp", config.name);
        self.state.emit(Event::BossStart {
            name: config.name.clone(),
            hp,
        });
        self.state.emit(Event::sound("boss_start", &[aggression]));
        self.state.flash(0.7, ColorTag::Violet);
        self.state.shake(0.5);
    }

    fn kill_boss(&mut self) {
        let Some(boss) = self.state.boss.take() else {
            return;
        };
        self.state.boss_phase = false;
        self.run.brain = None;
        self.state.score += boss.max_hp as u64 * self.tuning.boss_kill_bonus;
        log::info!("Boss {} defeated", boss.name);
        self.state.emit(Event::BossDie {
            name: boss.name,
            x: boss.pos.x,
            y: boss.pos.y,
        });
        self.state.emit(Event::ConfettiBurst {
            x: boss.pos.x,
            y: boss.pos.y,
        });
        self.state.emit(Event::sound("boss_die", &[]));
        self.run.wave_advance_pending = true;
    }

    /// Score one countered enemy and grow the combo
    fn counter(&mut self, enemy: &Enemy) {
        let state = &mut self.state;
        state.combo_count += 1;
        state.max_combo = state.max_combo.max(state.combo_count);
        state.counter_hits += 1;

        let multiplier = if state.powerup_timers.double_active() { 2 } else { 1 };
        let base = self.tuning.counter_base_score * state.combo_count as u64 * multiplier;
        let bonus = (base as f32 * state.momentum_perks.score_bonus).round() as u64;
        state.score += base + bonus;
        state.momentum_perks = MomentumPerks::for_combo(state.combo_count, &self.tuning);

        state.emit(Event::ParticleBurst {
            x: enemy.pos.x,
            y: enemy.pos.y,
            color: enemy.counter_type.color(),
        });
    }

    pub(crate) fn break_combo(&mut self) {
        self.state.combo_count = 0;
        self.state.momentum_perks = MomentumPerks::default();
    }

    fn record_miss(&mut self) {
        self.break_combo();
        self.state.miss_count += 1;
        self.state.emit(Event::sound("miss", &[]));
    }

    /// Counter every live, unencrypted enemy of `kind`
    pub(crate) fn trigger_ability(&mut self, kind: CounterType) {
        if self.state.ability_cooldowns.get(kind) > 0.0 {
            return;
        }
        let cooldown = self.tuning.ability_cooldown_ms(kind)
            * (1.0 - self.state.momentum_perks.cooldown_reduction);
        self.state.ability_cooldowns.set(kind, cooldown);

        let (hit, keep): (Vec<Enemy>, Vec<Enemy>) = std::mem::take(&mut self.state.enemies)
            .into_iter()
            .partition(|e| e.counter_type == kind && !e.encrypted);
        self.state.enemies = keep;

        if hit.is_empty() {
            self.record_miss();
            return;
        }
        for enemy in &hit {
            self.counter(enemy);
        }
        self.state.emit(Event::sound(
            &format!("ability_{}", kind.as_str()),
            &[hit.len() as f32, self.state.combo_count as f32],
        ));
        self.state.flash(0.25, kind.color());
    }

    /// Damage the boss (if vulnerable) and wipe the field
    pub(crate) fn trigger_nuke(&mut self) {
        if self.state.nuke_cooldown > 0.0 {
            return;
        }
        self.state.nuke_cooldown = self.tuning.nuke_cooldown_ms;
        self.state.nukes_used += 1;
        self.state.emit(Event::sound("nuke", &[]));

        let mut boss_killed = false;
        if let Some(boss) = self.state.boss.as_mut() {
            if boss.invuln_frames == 0 {
                boss.hp = boss.hp.saturating_sub(self.tuning.nuke_damage);
                boss.invuln_frames = self.tuning.boss_invuln_frames;
                let (hp, max_hp) = (boss.hp, boss.max_hp);
                boss_killed = hp == 0;
                self.state.emit(Event::BossHit { hp, max_hp });
            }
        }
        if boss_killed {
            self.kill_boss();
        }

        let (encrypted, plain): (Vec<Enemy>, Vec<Enemy>) =
            std::mem::take(&mut self.state.enemies).into_iter().partition(|e| e.encrypted);
        for enemy in &plain {
            self.counter(enemy);
        }
        // Encrypted enemies are purged without score
        for enemy in &encrypted {
            self.state.emit(Event::ParticleBurst {
                x: enemy.pos.x,
                y: enemy.pos.y,
                color: ColorTag::Red,
            });
        }

        self.state.shake(0.8);
        self.state.flash(1.0, ColorTag::White);
    }

    /// Pick up a power-up, or resolve the enemy under the pointer
    pub(crate) fn select_at(&mut self, point: Vec2) {
        let nearest_powerup = self
            .state
            .powerups
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.pos.distance(point)))
            .filter(|&(_, d)| d <= POWERUP_PICKUP_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        if let Some(index) = nearest_powerup {
            let powerup = self.state.powerups.remove(index);
            let duration = match powerup.kind {
                PowerUpKind::Slow => self.tuning.slow_duration_ms,
                PowerUpKind::Shield => self.tuning.shield_duration_ms,
                PowerUpKind::Double => self.tuning.double_duration_ms,
            };
            self.state.powerup_timers.activate(powerup.kind, duration);
            self.state.emit(Event::PowerUpCollected { kind: powerup.kind });
            self.state.emit(Event::sound("powerup", &[]));
            return;
        }

        let target = self
            .state
            .enemies
            .iter()
            .map(|e| (e, e.pos.distance(point)))
            .filter(|&(_, d)| d <= ENEMY_HIT_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(e, _)| (e.counter_type, e.encrypted));

        match target {
            Some((_, true)) => self.state.emit(Event::sound("denied", &[])),
            Some((kind, false)) => self.trigger_ability(kind),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::PowerUpInstance;
    use crate::tuning::PatternSet;

    fn kernel() -> Kernel {
        let mut k = Kernel::new(Tuning::default()).unwrap();
        k.handle_command(Command::Start { seed: Some(42) }).unwrap();
        k
    }

    fn enemy(k: &mut Kernel, kind: CounterType, pos: Vec2, encrypted: bool) -> u32 {
        let id = k.state.next_entity_id();
        k.state.enemies.push(Enemy {
            id,
            pos,
            vel: Vec2::new(0.0, 1.0),
            label: "TEST".into(),
            counter_type: kind,
            speed: 1.0,
            encrypted,
            is_child_variant: false,
        });
        id
    }

    fn boss_config(hp: u32) -> BossConfig {
        BossConfig {
            name: "Tester".into(),
            hp,
            aggression: 0.5,
            patterns: PatternSet::default(),
        }
    }

    #[test]
    fn test_start_creates_fresh_run() {
        let mut k = kernel();
        let snap = k.snapshot();
        assert!(snap.state.running);
        assert_eq!(snap.state.wave_index, 0);
        assert_eq!(snap.state.seed, 42);
        assert!(matches!(snap.events[0], Event::WaveStart { index: 0, .. }));
    }

    #[test]
    fn test_restart_reinitializes_everything() {
        let mut k = kernel();
        enemy(&mut k, CounterType::Reality, Vec2::new(100.0, 100.0), false);
        k.state.score = 999;
        k.state.panic = 70.0;
        k.start_boss(&boss_config(5));
        k.handle_command(Command::Start { seed: Some(7) }).unwrap();
        let s = k.state();
        assert_eq!(s.score, 0);
        assert_eq!(s.panic, 0.0);
        assert!(s.enemies.is_empty());
        assert!(s.boss.is_none());
        assert!(!s.boss_phase);
        assert!(k.run.brain.is_none());
    }

    #[test]
    fn test_start_without_seed_is_reproducible() {
        let mut a = Kernel::new(Tuning::default()).unwrap();
        let mut b = Kernel::new(Tuning::default()).unwrap();
        a.handle_command(Command::Start { seed: None }).unwrap();
        b.handle_command(Command::Start { seed: None }).unwrap();
        assert_eq!(a.state().seed, b.state().seed);
        a.handle_command(Command::Start { seed: None }).unwrap();
        assert_ne!(a.state().seed, b.state().seed);
    }

    #[test]
    fn test_commands_ignored_before_start() {
        let mut k = Kernel::new(Tuning::default()).unwrap();
        k.handle_command(Command::TriggerNuke).unwrap();
        k.handle_command(Command::TriggerAbility { kind: CounterType::Logic }).unwrap();
        k.handle_command(Command::Pause).unwrap();
        let snap = k.snapshot();
        assert!(snap.events.is_empty());
        assert_eq!(snap.state.nukes_used, 0);
        assert_eq!(snap.state.miss_count, 0);
        assert!(!snap.state.paused);
    }

    #[test]
    fn test_ability_miss() {
        let mut k = kernel();
        enemy(&mut k, CounterType::Logic, Vec2::new(100.0, 100.0), false);
        k.state.combo_count = 4;
        k.handle_command(Command::TriggerAbility { kind: CounterType::Reality }).unwrap();
        assert_eq!(k.state.combo_count, 0);
        assert_eq!(k.state.miss_count, 1);
        assert_eq!(k.state.score, 0);
        assert_eq!(k.state.enemies.len(), 1);
    }

    #[test]
    fn test_ability_counters_matching_unencrypted() {
        let mut k = kernel();
        enemy(&mut k, CounterType::Reality, Vec2::new(100.0, 100.0), false);
        enemy(&mut k, CounterType::Reality, Vec2::new(200.0, 100.0), false);
        enemy(&mut k, CounterType::Reality, Vec2::new(300.0, 100.0), true);
        enemy(&mut k, CounterType::History, Vec2::new(400.0, 100.0), false);

        k.handle_command(Command::TriggerAbility { kind: CounterType::Reality }).unwrap();

        assert_eq!(k.state.enemies.len(), 2);
        assert!(k.state.enemies.iter().any(|e| e.encrypted));
        assert_eq!(k.state.combo_count, 2);
        assert_eq!(k.state.max_combo, 2);
        // 100 * 1 + 100 * 2
        assert_eq!(k.state.score, 300);
        assert!(k.state.ability_cooldowns.get(CounterType::Reality) > 0.0);
    }

    #[test]
    fn test_double_powerup_doubles_score() {
        let mut k = kernel();
        k.state.powerup_timers.activate(PowerUpKind::Double, 5000.0);
        enemy(&mut k, CounterType::Reality, Vec2::new(100.0, 100.0), false);
        k.handle_command(Command::TriggerAbility { kind: CounterType::Reality }).unwrap();
        assert_eq!(k.state.score, 200);
    }

    #[test]
    fn test_momentum_bonus_and_cooldown_reduction() {
        let mut k = kernel();
        k.state.combo_count = 10;
        k.state.momentum_perks = MomentumPerks::for_combo(10, &k.tuning);
        enemy(&mut k, CounterType::Reality, Vec2::new(100.0, 100.0), false);
        k.handle_command(Command::TriggerAbility { kind: CounterType::Reality }).unwrap();
        // base 100 * 11, +25% bonus
        assert_eq!(k.state.score, 1100 + 275);
        let expected = k.tuning.reality_cooldown_ms * 0.9;
        assert!((k.state.ability_cooldowns.reality - expected).abs() < 1e-3);
    }

    #[test]
    fn test_ability_on_cooldown_is_noop() {
        let mut k = kernel();
        k.handle_command(Command::TriggerAbility { kind: CounterType::History }).unwrap();
        assert_eq!(k.state.miss_count, 1);
        k.snapshot();
        k.handle_command(Command::TriggerAbility { kind: CounterType::History }).unwrap();
        assert_eq!(k.state.miss_count, 1);
        assert!(k.snapshot().events.is_empty());
    }

    #[test]
    fn test_boss_kill_via_nuke() {
        let mut k = kernel();
        k.tuning.nuke_damage = 3;
        k.start_boss(&boss_config(3));
        k.snapshot();
        assert_eq!(k.state.nuke_cooldown, 0.0);

        k.handle_command(Command::TriggerNuke).unwrap();

        let snap = k.snapshot();
        assert!(snap.state.boss.is_none());
        assert!(!snap.state.boss_phase);
        let hit = snap.events.iter().position(|e| matches!(e, Event::BossHit { hp: 0, .. }));
        let die = snap.events.iter().position(|e| matches!(e, Event::BossDie { .. }));
        assert!(hit.is_some() && die.is_some());
        assert!(hit < die, "hit must precede death");
        assert!(k.run.wave_advance_pending);
    }

    #[test]
    fn test_nuke_respects_boss_invulnerability() {
        let mut k = kernel();
        k.start_boss(&boss_config(9));
        k.handle_command(Command::TriggerNuke).unwrap();
        k.state.nuke_cooldown = 0.0;
        k.handle_command(Command::TriggerNuke).unwrap();

        let snap = k.snapshot();
        assert_eq!(snap.state.boss.as_ref().map(|b| b.hp), Some(6));
        let hits = snap.events.iter().filter(|e| matches!(e, Event::BossHit { .. })).count();
        assert_eq!(hits, 1);
        assert_eq!(snap.state.nukes_used, 2);
    }

    #[test]
    fn test_nuke_clears_field() {
        let mut k = kernel();
        enemy(&mut k, CounterType::Reality, Vec2::new(100.0, 100.0), false);
        enemy(&mut k, CounterType::Logic, Vec2::new(200.0, 100.0), true);
        enemy(&mut k, CounterType::History, Vec2::new(300.0, 100.0), false);
        k.handle_command(Command::TriggerNuke).unwrap();
        assert!(k.state.enemies.is_empty());
        assert_eq!(k.state.counter_hits, 2);
        assert_eq!(k.state.combo_count, 2);
        assert!(k.state.shake_intensity > 0.0);

        // Second nuke is on cooldown
        enemy(&mut k, CounterType::Reality, Vec2::new(100.0, 100.0), false);
        k.handle_command(Command::TriggerNuke).unwrap();
        assert_eq!(k.state.enemies.len(), 1);
        assert_eq!(k.state.nukes_used, 1);
    }

    #[test]
    fn test_select_at_resolves_enemy_type() {
        let mut k = kernel();
        enemy(&mut k, CounterType::History, Vec2::new(100.0, 100.0), false);
        enemy(&mut k, CounterType::History, Vec2::new(500.0, 300.0), false);
        k.handle_command(Command::SelectAt { x: 110.0, y: 95.0 }).unwrap();
        assert!(k.state.enemies.is_empty());
        assert_eq!(k.state.combo_count, 2);
    }

    #[test]
    fn test_select_encrypted_is_denied() {
        let mut k = kernel();
        enemy(&mut k, CounterType::Logic, Vec2::new(100.0, 100.0), true);
        k.snapshot();
        k.handle_command(Command::SelectAt { x: 100.0, y: 100.0 }).unwrap();
        assert_eq!(k.state.enemies.len(), 1);
        assert_eq!(k.state.ability_cooldowns.logic, 0.0);
        let events = k.snapshot().events;
        assert_eq!(events, vec![Event::sound("denied", &[])]);
    }

    #[test]
    fn test_select_empty_space_does_nothing() {
        let mut k = kernel();
        k.snapshot();
        k.handle_command(Command::SelectAt { x: 700.0, y: 500.0 }).unwrap();
        assert!(k.snapshot().events.is_empty());
        assert_eq!(k.state.miss_count, 0);
    }

    #[test]
    fn test_select_collects_powerup() {
        let mut k = kernel();
        let id = k.state.next_entity_id();
        k.state.powerups.push(PowerUpInstance {
            id,
            kind: PowerUpKind::Shield,
            pos: Vec2::new(300.0, 300.0),
            ttl_ms: 1000.0,
        });
        k.handle_command(Command::SelectAt { x: 305.0, y: 300.0 }).unwrap();
        assert!(k.state.powerups.is_empty());
        assert!(k.state.powerup_timers.shield_active());
    }

    #[test]
    fn test_snapshot_drains_events_once() {
        let mut k = kernel();
        assert!(!k.snapshot().events.is_empty());
        assert!(k.snapshot().events.is_empty());
    }

    #[test]
    fn test_pause_and_resume() {
        let mut k = kernel();
        k.handle_command(Command::Pause).unwrap();
        assert!(k.state.paused);
        assert!(!k.is_ticking());
        k.handle_command(Command::TriggerNuke).unwrap();
        assert_eq!(k.state.nukes_used, 0);
        k.handle_command(Command::Resume).unwrap();
        assert!(k.is_ticking());
    }

    #[test]
    fn test_terminate_stops_everything() {
        let mut k = kernel();
        k.handle_command(Command::Terminate).unwrap();
        assert!(k.is_terminated());
        assert!(!k.is_ticking());
        k.handle_command(Command::Start { seed: Some(1) }).unwrap();
        assert!(!k.state.running);
    }

    #[test]
    fn test_max_combo_never_decreases() {
        let mut k = kernel();
        for x in [100.0, 200.0, 300.0] {
            enemy(&mut k, CounterType::Reality, Vec2::new(x, 100.0), false);
        }
        k.handle_command(Command::TriggerAbility { kind: CounterType::Reality }).unwrap();
        assert_eq!(k.state.max_combo, 3);
        k.handle_command(Command::TriggerAbility { kind: CounterType::Logic }).unwrap();
        assert_eq!(k.state.combo_count, 0);
        assert_eq!(k.state.max_combo, 3);
    }

    #[test]
    fn test_start_fails_without_enemy_types() {
        let mut k = Kernel::new(Tuning::default()).unwrap();
        k.tuning.waves[0].counter_types.clear();
        let err = k.handle_command(Command::Start { seed: Some(1) }).unwrap_err();
        assert!(matches!(err, KernelError::NoEnemyTypes { wave: 0 }));
    }

    #[test]
    fn test_boss_start_clears_enemies() {
        let mut k = kernel();
        enemy(&mut k, CounterType::Reality, Vec2::new(100.0, 100.0), false);
        enemy(&mut k, CounterType::Logic, Vec2::new(200.0, 100.0), true);
        k.start_boss(&boss_config(4));
        assert!(k.state.enemies.is_empty());
        assert!(k.state.boss_phase);
        assert!(k.state.boss.is_some());
    }

    #[test]
    fn test_endless_boss_grows_with_level() {
        let mut k = kernel();
        k.start_boss(&boss_config(5));
        let base = k.state.boss.clone().unwrap();
        assert_eq!(base.max_hp, 5);
        assert!((base.aggression - 0.5).abs() < 1e-6);

        k.state.endless_level = 1;
        k.start_boss(&boss_config(5));
        let grown = k.state.boss.clone().unwrap();
        assert_eq!(grown.hp, 7);
        assert_eq!(grown.max_hp, 7);
        assert!((grown.aggression - 0.55).abs() < 1e-6);
    }
}
