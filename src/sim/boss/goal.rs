//! Boss goals as small value-type state machines
//!
//! Multi-tick goals keep `{elapsed_ms, spawned}` and emit their spawns a few
//! at a time as they are advanced.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;

use super::evaluate::GoalKind;
use super::steering::Steering;
use super::Directive;
use crate::consts::{BOSS_SIDE_MARGIN, PLAYFIELD_WIDTH};
use crate::sim::rng::SeededRng;
use crate::sim::state::BossPattern;

pub const SWEEP_DURATION_MS: f32 = 2000.0;
pub const SPIRAL_DURATION_MS: f32 = 1500.0;
pub const SPIRAL_SPAWNS: u32 = 12;
pub const RAGE_DURATION_MS: f32 = 1200.0;
pub const RAGE_VOLLEY_MS: f32 = 200.0;

/// Enemy requested by a directive; the kernel fills in id, label and type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnSpec {
    pub pos: Vec2,
    pub vel: Vec2,
    pub child: bool,
}

/// What a goal can see of the boss this tick
#[derive(Debug, Clone, Copy)]
pub struct GoalContext {
    pub pos: Vec2,
    pub aggression: f32,
    pub hp_ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    Active,
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Goal {
    Burst,
    Sweep {
        elapsed_ms: f32,
        spawned: u32,
        total: u32,
        from_x: f32,
        to_x: f32,
        y: f32,
    },
    Spiral {
        elapsed_ms: f32,
        spawned: u32,
        angle: f32,
    },
    Summon,
    Rage {
        elapsed_ms: f32,
        volleys: u32,
    },
    Reposition,
}

/// Fan of `count` spawns heading downward around `origin`
fn fan(origin: Vec2, count: u32, spread: f32, speed: f32) -> Vec<SpawnSpec> {
    (0..count)
        .map(|i| {
            let t = if count <= 1 { 0.5 } else { i as f32 / (count - 1) as f32 };
            let angle = FRAC_PI_2 + (t - 0.5) * spread;
            let dir = Vec2::new(angle.cos(), angle.sin());
            SpawnSpec {
                pos: origin + dir * 30.0,
                vel: dir * speed,
                child: false,
            }
        })
        .collect()
}

impl Goal {
    /// Instantiate a goal; reposition hands its target to the steering layer
    pub fn start(
        kind: GoalKind,
        ctx: &GoalContext,
        steering: &mut Steering,
        rng: &mut SeededRng,
    ) -> Goal {
        match kind {
            GoalKind::Burst => Goal::Burst,
            GoalKind::Sweep => {
                let centre = PLAYFIELD_WIDTH / 2.0;
                let to_x = if ctx.pos.x < centre {
                    PLAYFIELD_WIDTH - BOSS_SIDE_MARGIN
                } else {
                    BOSS_SIDE_MARGIN
                };
                Goal::Sweep {
                    elapsed_ms: 0.0,
                    spawned: 0,
                    total: 5 + (3.0 * ctx.aggression).round() as u32,
                    from_x: ctx.pos.x,
                    to_x,
                    y: ctx.pos.y,
                }
            }
            GoalKind::Spiral => Goal::Spiral {
                elapsed_ms: 0.0,
                spawned: 0,
                angle: rng.range(0.0, TAU),
            },
            GoalKind::Summon => Goal::Summon,
            GoalKind::Rage => Goal::Rage {
                elapsed_ms: 0.0,
                volleys: 0,
            },
            GoalKind::Reposition => {
                let target = Vec2::new(
                    rng.range(BOSS_SIDE_MARGIN, PLAYFIELD_WIDTH - BOSS_SIDE_MARGIN),
                    rng.range(80.0, 240.0),
                );
                steering.arrive_at(target);
                Goal::Reposition
            }
        }
    }

    pub fn kind(&self) -> GoalKind {
        match self {
            Goal::Burst => GoalKind::Burst,
            Goal::Sweep { .. } => GoalKind::Sweep,
            Goal::Spiral { .. } => GoalKind::Spiral,
            Goal::Summon => GoalKind::Summon,
            Goal::Rage { .. } => GoalKind::Rage,
            Goal::Reposition => GoalKind::Reposition,
        }
    }

    pub fn pattern(&self) -> BossPattern {
        match self {
            Goal::Burst => BossPattern::Burst,
            Goal::Sweep { .. } => BossPattern::Sweep,
            Goal::Spiral { .. } => BossPattern::Spiral,
            Goal::Summon => BossPattern::Summon,
            Goal::Rage { .. } => BossPattern::Rage,
            Goal::Reposition => BossPattern::Reposition,
        }
    }

    /// Sweep drives the boss position itself instead of steering
    pub fn controls_movement(&self) -> bool {
        matches!(self, Goal::Sweep { .. })
    }

    /// Advance by `elapsed_ms`, appending directives to `out`
    pub fn advance(
        &mut self,
        ctx: &GoalContext,
        elapsed_ms: f32,
        steering: &Steering,
        rng: &mut SeededRng,
        out: &mut Vec<Directive>,
    ) -> GoalStatus {
        let a = ctx.aggression;
        match self {
            Goal::Burst => {
                let count = 3 + (3.0 * a).round() as u32;
                out.push(Directive::SpawnEnemies {
                    specs: fan(ctx.pos, count, 1.6, 1.2 + a),
                });
                out.push(Directive::Flash { intensity: 0.35 });
                out.push(Directive::Shake { intensity: 0.25 });
                GoalStatus::Complete
            }
            Goal::Sweep {
                elapsed_ms: elapsed,
                spawned,
                total,
                from_x,
                to_x,
                y,
            } => {
                *elapsed += elapsed_ms;
                let t = (*elapsed / SWEEP_DURATION_MS).min(1.0);
                let x = *from_x + (*to_x - *from_x) * t;
                out.push(Directive::Move { x, y: *y });

                // Spawns are evenly spaced along the traverse
                let due = ((t * *total as f32).ceil() as u32).min(*total);
                if due > *spawned {
                    let specs = (*spawned..due)
                        .map(|_| SpawnSpec {
                            pos: Vec2::new(x, *y + 30.0),
                            vel: Vec2::new(0.0, 1.1 + 0.8 * a),
                            child: false,
                        })
                        .collect();
                    out.push(Directive::SpawnEnemies { specs });
                    *spawned = due;
                }

                if t >= 1.0 && *spawned >= *total {
                    GoalStatus::Complete
                } else {
                    GoalStatus::Active
                }
            }
            Goal::Spiral {
                elapsed_ms: elapsed,
                spawned,
                angle,
            } => {
                *elapsed += elapsed_ms;
                let interval = SPIRAL_DURATION_MS / SPIRAL_SPAWNS as f32;
                let due = ((*elapsed / interval).floor() as u32 + 1).min(SPIRAL_SPAWNS);
                if due > *spawned {
                    let mut specs = Vec::with_capacity((due - *spawned) as usize);
                    for _ in *spawned..due {
                        *angle += 0.9;
                        // Keep a downward component so the arm drifts into play
                        let dir = Vec2::new(angle.cos(), 0.35 + 0.65 * angle.sin().abs())
                            .normalize();
                        specs.push(SpawnSpec {
                            pos: ctx.pos + dir * 36.0,
                            vel: dir * (1.0 + a),
                            child: false,
                        });
                    }
                    out.push(Directive::SpawnEnemies { specs });
                    *spawned = due;
                }
                if *spawned >= SPIRAL_SPAWNS {
                    out.push(Directive::Flash { intensity: 0.3 });
                    GoalStatus::Complete
                } else {
                    GoalStatus::Active
                }
            }
            Goal::Summon => {
                let count = 2 + (2.0 * (1.0 - ctx.hp_ratio)).round() as u32;
                let specs = (0..count)
                    .map(|i| {
                        let side = if i % 2 == 0 { -1.0 } else { 1.0 };
                        let offset = Vec2::new(side * (70.0 + 20.0 * (i / 2) as f32), 20.0);
                        SpawnSpec {
                            pos: ctx.pos + offset,
                            vel: Vec2::new(side * rng.range(0.0, 0.4), 1.4 + a),
                            child: true,
                        }
                    })
                    .collect();
                out.push(Directive::SpawnEnemies { specs });
                out.push(Directive::Flash { intensity: 0.5 });
                GoalStatus::Complete
            }
            Goal::Rage {
                elapsed_ms: elapsed,
                volleys,
            } => {
                *elapsed += elapsed_ms;
                let total = (RAGE_DURATION_MS / RAGE_VOLLEY_MS) as u32;
                let due = ((*elapsed / RAGE_VOLLEY_MS).floor() as u32 + 1).min(total);
                while *volleys < due {
                    out.push(Directive::SpawnEnemies {
                        specs: fan(ctx.pos, 3, 1.2 + 0.3 * (*volleys % 2) as f32, 1.6 + a),
                    });
                    out.push(Directive::Shake { intensity: 0.6 });
                    out.push(Directive::Flash { intensity: 0.6 });
                    *volleys += 1;
                }
                if *volleys >= total && *elapsed >= RAGE_DURATION_MS {
                    GoalStatus::Complete
                } else {
                    GoalStatus::Active
                }
            }
            Goal::Reposition => {
                if steering.is_arriving() {
                    GoalStatus::Active
                } else {
                    GoalStatus::Complete
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::GAMEPLAY_STREAM;

    fn ctx() -> GoalContext {
        GoalContext {
            pos: Vec2::new(200.0, 150.0),
            aggression: 0.5,
            hp_ratio: 1.0,
        }
    }

    fn spawn_count(directives: &[Directive]) -> usize {
        directives
            .iter()
            .map(|d| match d {
                Directive::SpawnEnemies { specs } => specs.len(),
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn test_burst_is_instant() {
        let mut rng = SeededRng::new(1, GAMEPLAY_STREAM);
        let mut steering = Steering::default();
        let mut goal = Goal::start(GoalKind::Burst, &ctx(), &mut steering, &mut rng);
        let mut out = Vec::new();
        let status = goal.advance(&ctx(), 16.67, &steering, &mut rng, &mut out);
        assert_eq!(status, GoalStatus::Complete);
        assert_eq!(spawn_count(&out), 5);
    }

    #[test]
    fn test_sweep_spawns_incrementally() {
        let mut rng = SeededRng::new(1, GAMEPLAY_STREAM);
        let mut steering = Steering::default();
        let mut goal = Goal::start(GoalKind::Sweep, &ctx(), &mut steering, &mut rng);
        let mut out = Vec::new();
        assert_eq!(goal.advance(&ctx(), 16.67, &steering, &mut rng, &mut out), GoalStatus::Active);
        let first = spawn_count(&out);
        assert!(first < 7, "sweep must not spawn everything at once");

        let mut ticks = 1;
        loop {
            let status = goal.advance(&ctx(), 16.67, &steering, &mut rng, &mut out);
            ticks += 1;
            if status == GoalStatus::Complete {
                break;
            }
            assert!(ticks < 200);
        }
        // 5 + round(3 * 0.5) = 7 spawns over ~2s
        assert_eq!(spawn_count(&out), 7);
        assert!(ticks >= 119);
        // Boss ends at the far side
        let last_move = out.iter().rev().find_map(|d| match d {
            Directive::Move { x, .. } => Some(*x),
            _ => None,
        });
        assert_eq!(last_move, Some(PLAYFIELD_WIDTH - BOSS_SIDE_MARGIN));
    }

    #[test]
    fn test_spiral_total_spawns() {
        let mut rng = SeededRng::new(5, GAMEPLAY_STREAM);
        let mut steering = Steering::default();
        let mut goal = Goal::start(GoalKind::Spiral, &ctx(), &mut steering, &mut rng);
        let mut out = Vec::new();
        let mut ticks = 0;
        while goal.advance(&ctx(), 16.67, &steering, &mut rng, &mut out) == GoalStatus::Active {
            ticks += 1;
            assert!(ticks < 200);
        }
        assert_eq!(spawn_count(&out), SPIRAL_SPAWNS as usize);
        for d in &out {
            if let Directive::SpawnEnemies { specs } = d {
                assert!(specs.iter().all(|s| s.vel.y > 0.0));
            }
        }
    }

    #[test]
    fn test_summon_scales_with_damage() {
        let mut rng = SeededRng::new(5, GAMEPLAY_STREAM);
        let steering = Steering::default();
        let hurt = GoalContext { hp_ratio: 0.0, ..ctx() };
        let mut out = Vec::new();
        Goal::Summon.advance(&hurt, 16.67, &steering, &mut rng, &mut out);
        assert_eq!(spawn_count(&out), 4);
        if let Some(Directive::SpawnEnemies { specs }) = out.first() {
            assert!(specs.iter().all(|s| s.child));
        } else {
            panic!("summon should spawn first");
        }
    }

    #[test]
    fn test_rage_volleys() {
        let mut rng = SeededRng::new(5, GAMEPLAY_STREAM);
        let steering = Steering::default();
        let mut goal = Goal::Rage { elapsed_ms: 0.0, volleys: 0 };
        let mut out = Vec::new();
        // One big step covers the whole rage
        let status = goal.advance(&ctx(), RAGE_DURATION_MS, &steering, &mut rng, &mut out);
        assert_eq!(status, GoalStatus::Complete);
        assert_eq!(spawn_count(&out), 18);
    }

    #[test]
    fn test_reposition_completes_when_steering_wanders() {
        let mut rng = SeededRng::new(5, GAMEPLAY_STREAM);
        let mut steering = Steering::default();
        let mut goal = Goal::start(GoalKind::Reposition, &ctx(), &mut steering, &mut rng);
        let mut out = Vec::new();
        assert!(steering.is_arriving());
        assert_eq!(goal.advance(&ctx(), 16.67, &steering, &mut rng, &mut out), GoalStatus::Active);
        steering.mode = super::super::steering::SteeringMode::Wander;
        assert_eq!(
            goal.advance(&ctx(), 16.67, &steering, &mut rng, &mut out),
            GoalStatus::Complete
        );
        assert!(out.is_empty());
    }
}
