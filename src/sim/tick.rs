//! Per-update simulation pass
//!
//! Advances the kernel by `dt` reference frames. Wave time follows the wall
//! clock in whole seconds; everything else scales with `dt`.

use std::time::Duration;

use glam::Vec2;

use super::boss::{BossBrain, BossView, Directive, SpawnSpec};
use super::event::Event;
use super::kernel::{Kernel, endless_scale};
use super::panic::{self, DifficultyModifiers};
use super::state::{BossPattern, ColorTag, Enemy, PowerUpInstance, PowerUpKind};
use crate::consts::*;
use crate::error::KernelError;
use crate::{clamp_to_boss_band, frames_to_ms, in_playfield};

/// Extra enemies allowed on the field per endless level
const ENDLESS_EXTRA_ENEMIES: usize = 2;
const CHILD_SPEED_SCALE: f32 = 1.35;
/// Child variants cost half an escape
const CHILD_ESCAPE_SCALE: f32 = 0.5;
/// Per-frame decay factors for screen effects
const SHAKE_DECAY: f32 = 0.9;
const FLASH_DECAY: f32 = 0.95;

impl Kernel {
    /// Advance the simulation by `dt` frames; `now` is the host's monotonic clock
    pub fn update(&mut self, dt: f32, now: Duration) -> Result<(), KernelError> {
        if !self.is_ticking() {
            // Idle time never reaches the wave clock
            self.run.last_wall = None;
            return Ok(());
        }

        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.tuning.max_dt_steps)
        } else {
            0.0
        };
        let elapsed_ms = frames_to_ms(dt);
        let frames = self.run.take_frames(dt);

        if self.run.wave_advance_pending {
            self.run.wave_advance_pending = false;
            self.advance_wave()?;
            if !self.state.running {
                return Ok(());
            }
        }

        self.tick_wave_clock(now)?;
        if !self.state.running {
            return Ok(());
        }

        self.tick_timers(elapsed_ms, frames);
        if !self.state.boss_phase {
            self.spawn_enemies(elapsed_ms)?;
        }
        self.move_enemies(dt);
        if !self.state.running {
            return Ok(());
        }

        self.settle_panic(dt);
        self.tick_powerups(elapsed_ms);
        self.run_boss(dt)?;
        self.decay_effects(dt);
        self.tick_feed(elapsed_ms);

        self.state.normalize_order();
        self.check_finite()
    }

    fn enemy_cap(&self) -> usize {
        let base = self
            .tuning
            .wave(self.state.wave_index)
            .map(|w| w.max_enemies)
            .unwrap_or(0);
        base + self.state.endless_level as usize * ENDLESS_EXTRA_ENEMIES
    }

    /// Count down wave time in whole wall-clock seconds
    fn tick_wave_clock(&mut self, now: Duration) -> Result<(), KernelError> {
        let delta_ms = match self.run.last_wall {
            Some(prev) => now.saturating_sub(prev).as_secs_f32() * 1000.0,
            None => 0.0,
        };
        self.run.last_wall = Some(now);

        // Frozen while a boss is up
        if self.state.boss_phase {
            return Ok(());
        }

        self.run.second_bucket_ms += delta_ms.min(frames_to_ms(self.tuning.max_dt_steps));
        while self.run.second_bucket_ms >= 1000.0 {
            self.run.second_bucket_ms -= 1000.0;
            self.state.wave_time_remaining = (self.state.wave_time_remaining - 1.0).max(0.0);
            if self.state.wave_time_remaining <= 0.0 {
                self.run.second_bucket_ms = 0.0;
                return self.wave_timer_expired();
            }
        }
        Ok(())
    }

    fn wave_timer_expired(&mut self) -> Result<(), KernelError> {
        let boss = self
            .tuning
            .wave(self.state.wave_index)
            .and_then(|w| w.boss.clone());
        match boss {
            Some(config) if !self.run.boss_started => {
                self.start_boss(&config);
                Ok(())
            }
            _ => self.advance_wave(),
        }
    }

    fn tick_timers(&mut self, elapsed_ms: f32, frames: u32) {
        let state = &mut self.state;
        state.ability_cooldowns.tick(elapsed_ms);
        state.nuke_cooldown = (state.nuke_cooldown - elapsed_ms).max(0.0);
        state.powerup_timers.tick(elapsed_ms);
        state.panic_invuln_frames = state.panic_invuln_frames.saturating_sub(frames);
        if let Some(boss) = state.boss.as_mut() {
            boss.invuln_frames = boss.invuln_frames.saturating_sub(frames);
            boss.timer += elapsed_ms / 1000.0;
        }
    }

    fn spawn_enemies(&mut self, elapsed_ms: f32) -> Result<(), KernelError> {
        let index = self.state.wave_index;
        let wave = self.tuning.wave(index).ok_or(KernelError::NoWaves)?;
        let mods = panic::difficulty_modifiers(self.state.panic, index);
        // Momentum shortens the gap between spawns
        let interval = wave.spawn_interval_ms
            * mods.spawn_rate_multiplier
            * (1.0 - self.state.momentum_perks.spawn_delay_reduction);
        let speed =
            wave.enemy_speed * mods.speed_multiplier * endless_scale(self.state.endless_level);

        self.run.spawn_elapsed_ms += elapsed_ms;
        if self.run.spawn_elapsed_ms < interval || self.state.enemies.len() >= self.enemy_cap() {
            return Ok(());
        }
        self.run.spawn_elapsed_ms = 0.0;

        let child = self.rng.chance(mods.variant_chance);
        let speed = if child { speed * CHILD_SPEED_SCALE } else { speed };
        let x = self.rng.range(EXIT_MARGIN, PLAYFIELD_WIDTH - EXIT_MARGIN);
        let drift = self.rng.range(-0.25, 0.25);
        let spec = SpawnSpec {
            pos: Vec2::new(x, SPAWN_Y),
            vel: Vec2::new(drift * speed, speed),
            child,
        };
        self.materialize(spec, &mods)
    }

    /// Turn a spawn request into a labelled enemy of the current wave
    fn materialize(
        &mut self,
        spec: SpawnSpec,
        mods: &DifficultyModifiers,
    ) -> Result<(), KernelError> {
        let index = self.state.wave_index;
        let wave = self.tuning.wave(index).ok_or(KernelError::NoWaves)?;
        let kind = *self
            .rng
            .pick(&wave.counter_types)
            .ok_or(KernelError::NoEnemyTypes { wave: index })?;
        let label = self
            .rng
            .pick(self.tuning.vocabulary.labels(kind))
            .ok_or(KernelError::EmptyVocabulary { kind })?
            .clone();
        let encrypted = self.rng.chance(mods.encrypt_chance);

        let id = self.state.next_entity_id();
        self.state.enemies.push(Enemy {
            id,
            pos: spec.pos,
            vel: spec.vel,
            label,
            counter_type: kind,
            speed: spec.vel.length(),
            encrypted,
            is_child_variant: spec.child,
        });
        Ok(())
    }

    fn move_enemies(&mut self, dt: f32) {
        let slow = if self.state.powerup_timers.slow_active() { 0.5 } else { 1.0 };
        for enemy in &mut self.state.enemies {
            enemy.pos += enemy.vel * dt * slow;
        }

        let (live, escaped): (Vec<Enemy>, Vec<Enemy>) = std::mem::take(&mut self.state.enemies)
            .into_iter()
            .partition(|e| in_playfield(e.pos, EXIT_MARGIN));
        self.state.enemies = live;

        for enemy in &escaped {
            self.enemy_escaped(enemy);
            if !self.state.running {
                break;
            }
        }
    }

    fn enemy_escaped(&mut self, enemy: &Enemy) {
        self.break_combo();
        self.state.emit(Event::sound("escape", &[enemy.pos.x]));

        if self.state.panic_invuln_frames > 0 || self.state.powerup_timers.shield_active() {
            return;
        }
        let scale = if enemy.is_child_variant { CHILD_ESCAPE_SCALE } else { 1.0 };
        let damage = self.tuning.escape_panic_damage * scale;
        self.state.panic = panic::apply_damage(self.state.panic, damage);
        self.state.zone = panic::zone_of(self.state.panic);
        self.state.panic_invuln_frames = self.tuning.panic_invuln_frames;
        self.state.flash(0.35, ColorTag::Red);
        self.state.shake(0.3);

        if self.state.panic >= PANIC_MAX {
            log::info!("Panic maxed out");
            self.finish(false);
        }
    }

    /// Combo-gated recovery, then re-read tension
    fn settle_panic(&mut self, dt: f32) {
        self.state.panic = panic::apply_decay(self.state.panic, self.state.combo_count, dt);
        self.state.zone = panic::zone_of(self.state.panic);

        let previous = self.state.tension.state;
        let reading = panic::transform_state(self.state.panic, previous);
        if reading.state != previous {
            log::debug!("tension {} -> {}", previous.as_str(), reading.state.as_str());
            self.state.emit(Event::TensionShift {
                state: reading.state,
                intensity: reading.intensity,
            });
            self.state.emit(Event::sound(
                &format!("tension_{}", reading.state.as_str()),
                &[reading.intensity],
            ));
        }
        self.state.tension = reading;
    }

    fn tick_powerups(&mut self, elapsed_ms: f32) {
        self.run.powerup_elapsed_ms += elapsed_ms;
        if self.run.powerup_elapsed_ms >= self.tuning.powerup_interval_ms {
            self.run.powerup_elapsed_ms = 0.0;
            let kind = PowerUpKind::ALL[self.rng.index(PowerUpKind::ALL.len())];
            let pos = Vec2::new(
                self.rng.range(80.0, PLAYFIELD_WIDTH - 80.0),
                self.rng.range(BOSS_BAND_BOTTOM, PLAYFIELD_HEIGHT - 120.0),
            );
            let id = self.state.next_entity_id();
            self.state.powerups.push(PowerUpInstance {
                id,
                kind,
                pos,
                ttl_ms: self.tuning.powerup_lifetime_ms,
            });
            self.state.emit(Event::sound("powerup_spawn", &[]));
        }

        for powerup in &mut self.state.powerups {
            powerup.ttl_ms -= elapsed_ms;
        }
        self.state.powerups.retain(|p| p.ttl_ms > 0.0);
    }

    /// Let the boss AI think, then apply what it asked for
    fn run_boss(&mut self, dt: f32) -> Result<(), KernelError> {
        let Some(boss) = self.state.boss.as_ref() else {
            return Ok(());
        };
        let patterns = self
            .tuning
            .wave(self.state.wave_index)
            .and_then(|w| w.boss.as_ref())
            .map(|b| b.patterns)
            .unwrap_or_default();
        let view = BossView {
            pos: boss.pos,
            hp: boss.hp,
            max_hp: boss.max_hp,
            base_aggression: boss.aggression,
            patterns,
            live_enemies: self.state.enemies.len(),
            enemy_cap: self.enemy_cap(),
        };

        let brain = self.run.brain.get_or_insert_with(|| BossBrain::new(view.pos));
        let directives = brain.step(&view, dt, &mut self.rng);
        let pattern = brain.active_pattern();
        if let Some(boss) = self.state.boss.as_mut() {
            boss.active_pattern = pattern;
        }

        for directive in directives {
            self.apply_directive(directive)?;
        }
        Ok(())
    }

    fn apply_directive(&mut self, directive: Directive) -> Result<(), KernelError> {
        match directive {
            Directive::Move { x, y } => {
                if let Some(boss) = self.state.boss.as_mut() {
                    boss.pos = clamp_to_boss_band(Vec2::new(x, y));
                }
            }
            Directive::SpawnEnemies { specs } => {
                let mods = panic::difficulty_modifiers(self.state.panic, self.state.wave_index);
                let cap = self.enemy_cap();
                let mut spawned = 0;
                for spec in specs {
                    if self.state.enemies.len() >= cap {
                        break;
                    }
                    self.materialize(spec, &mods)?;
                    spawned += 1;
                }
                if spawned > 0 {
                    self.state.emit(Event::sound("boss_attack", &[spawned as f32]));
                }
            }
            Directive::Flash { intensity } => {
                let raging = self
                    .state
                    .boss
                    .as_ref()
                    .is_some_and(|b| b.active_pattern == BossPattern::Rage);
                let color = if raging { ColorTag::Red } else { ColorTag::Violet };
                self.state.flash(intensity, color);
            }
            Directive::Shake { intensity } => self.state.shake(intensity),
        }
        Ok(())
    }

    fn decay_effects(&mut self, dt: f32) {
        // Decay screen shake
        self.state.shake_intensity *= SHAKE_DECAY.powf(dt);
        if self.state.shake_intensity < 0.01 {
            self.state.shake_intensity = 0.0;
        }

        // Flash fades slower
        self.state.flash_intensity *= FLASH_DECAY.powf(dt);
        if self.state.flash_intensity < 0.01 {
            self.state.flash_intensity = 0.0;
        }
    }

    /// Cosmetic chatter; draws only from the cosmetic stream
    fn tick_feed(&mut self, elapsed_ms: f32) {
        if self.tuning.feed_interval_ms <= 0.0 {
            return;
        }
        self.run.feed_elapsed_ms += elapsed_ms;
        if self.run.feed_elapsed_ms < self.tuning.feed_interval_ms {
            return;
        }
        self.run.feed_elapsed_ms = 0.0;

        let vocab = &self.tuning.vocabulary;
        let handle = self.cosmetic.pick(&vocab.feed_handles).cloned();
        let text = self.cosmetic.pick(&vocab.feed_lines).cloned();
        if let (Some(handle), Some(text)) = (handle, text) {
            self.state.emit(Event::FeedItem { handle, text });
        }
    }

    fn check_finite(&self) -> Result<(), KernelError> {
        let state = &self.state;
        if !state.panic.is_finite() {
            return Err(KernelError::NonFinite { field: "panic" });
        }
        if !state.wave_time_remaining.is_finite() {
            return Err(KernelError::NonFinite { field: "wave_time_remaining" });
        }
        if state.enemies.iter().any(|e| !e.pos.is_finite() || !e.vel.is_finite()) {
            return Err(KernelError::NonFinite { field: "enemy position" });
        }
        if state.boss.as_ref().is_some_and(|b| !b.pos.is_finite()) {
            return Err(KernelError::NonFinite { field: "boss position" });
        }
        Ok(())
    }
}
