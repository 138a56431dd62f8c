//! Steering behaviors for the boss vehicle
//!
//! Velocities are in px per reference frame; `dt` is in frames.

use glam::Vec2;

use crate::clamp_to_boss_band;
use crate::sim::rng::SeededRng;

pub const WANDER_WEIGHT: f32 = 0.25;
pub const ARRIVE_WEIGHT: f32 = 1.0;
/// How long an arrive lasts before drifting again (ms)
pub const ARRIVE_TIMEOUT_MS: f32 = 1500.0;
/// Distance at which the target counts as reached
pub const ARRIVAL_RADIUS: f32 = 8.0;
/// Distance at which arrive starts braking
pub const SLOWING_RADIUS: f32 = 120.0;

/// Point mass moved by steering forces
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub max_speed: f32,
    pub max_force: f32,
}

impl Vehicle {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            max_speed: 1.5,
            max_force: 0.2,
        }
    }

    /// Integrate a steering force and keep the vehicle inside the boss band
    pub fn apply(&mut self, force: Vec2, dt: f32) {
        let force = force.clamp_length_max(self.max_force);
        self.vel = (self.vel + force * dt).clamp_length_max(self.max_speed);
        let next = self.pos + self.vel * dt;
        let clamped = clamp_to_boss_band(next);
        // Bounce off the band edges
        if clamped.x != next.x {
            self.vel.x = -self.vel.x;
        }
        if clamped.y != next.y {
            self.vel.y = -self.vel.y;
        }
        self.pos = clamped;
    }

    fn heading(&self) -> Vec2 {
        let h = self.vel.normalize_or_zero();
        if h == Vec2::ZERO { Vec2::X } else { h }
    }
}

/// Reynolds-style wander: a target jittering on a circle ahead of the vehicle
#[derive(Debug, Clone)]
pub struct Wander {
    pub radius: f32,
    pub distance: f32,
    pub jitter: f32,
    target: Vec2,
}

impl Default for Wander {
    fn default() -> Self {
        Self {
            radius: 40.0,
            distance: 60.0,
            jitter: 0.3,
            target: Vec2::new(40.0, 0.0),
        }
    }
}

impl Wander {
    pub fn force(&mut self, vehicle: &Vehicle, dt: f32, rng: &mut SeededRng) -> Vec2 {
        let nudge = Vec2::new(rng.range(-1.0, 1.0), rng.range(-1.0, 1.0))
            * self.jitter
            * self.radius
            * dt.min(4.0);
        let moved = (self.target + nudge).normalize_or_zero();
        self.target = if moved == Vec2::ZERO {
            Vec2::new(self.radius, 0.0)
        } else {
            moved * self.radius
        };

        let ahead = vehicle.pos + vehicle.heading() * self.distance + self.target;
        let desired = (ahead - vehicle.pos).normalize_or_zero() * vehicle.max_speed;
        desired - vehicle.vel
    }
}

/// Steer toward `target`, braking inside the slowing radius
pub fn arrive(vehicle: &Vehicle, target: Vec2) -> Vec2 {
    let to_target = target - vehicle.pos;
    let distance = to_target.length();
    if distance < 1e-3 {
        return -vehicle.vel;
    }
    let speed = if distance < SLOWING_RADIUS {
        vehicle.max_speed * distance / SLOWING_RADIUS
    } else {
        vehicle.max_speed
    };
    to_target / distance * speed - vehicle.vel
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SteeringMode {
    Wander,
    Arrive { target: Vec2, remaining_ms: f32 },
}

/// Blend of wander (always on, low weight) and arrive (deliberate moves only)
#[derive(Debug, Clone)]
pub struct Steering {
    pub mode: SteeringMode,
    pub wander: Wander,
}

impl Default for Steering {
    fn default() -> Self {
        Self {
            mode: SteeringMode::Wander,
            wander: Wander::default(),
        }
    }
}

impl Steering {
    pub fn arrive_at(&mut self, target: Vec2) {
        self.mode = SteeringMode::Arrive {
            target: clamp_to_boss_band(target),
            remaining_ms: ARRIVE_TIMEOUT_MS,
        };
    }

    pub fn is_arriving(&self) -> bool {
        matches!(self.mode, SteeringMode::Arrive { .. })
    }

    /// Advance the vehicle one step; arrive reverts to wander on arrival or timeout
    pub fn step(&mut self, vehicle: &mut Vehicle, dt: f32, elapsed_ms: f32, rng: &mut SeededRng) {
        let mut force = self.wander.force(vehicle, dt, rng) * WANDER_WEIGHT;

        if let SteeringMode::Arrive { target, remaining_ms } = self.mode {
            force += arrive(vehicle, target) * ARRIVE_WEIGHT;
            let remaining_ms = remaining_ms - elapsed_ms;
            self.mode = if remaining_ms <= 0.0 || vehicle.pos.distance(target) <= ARRIVAL_RADIUS {
                SteeringMode::Wander
            } else {
                SteeringMode::Arrive { target, remaining_ms }
            };
        }

        vehicle.apply(force, dt);
    }
}
