//! Utility evaluators for boss goal arbitration
//!
//! Each evaluator scores one candidate behavior in [0, ~1.4]. Zero means
//! ineligible. Reposition is never zero, so arbitration always picks something.

use serde::{Deserialize, Serialize};

use crate::sim::rng::SeededRng;
use crate::tuning::PatternSet;

/// HP ratio at or below which rage becomes available
pub const RAGE_THRESHOLD: f32 = 0.30;
/// Score floor that lets rage dominate every other evaluator
pub const RAGE_FLOOR: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalKind {
    Burst,
    Sweep,
    Spiral,
    Reposition,
    Summon,
    Rage,
}

impl GoalKind {
    /// Evaluation order; ties go to the earlier entry
    pub const ALL: [GoalKind; 6] = [
        GoalKind::Rage,
        GoalKind::Burst,
        GoalKind::Sweep,
        GoalKind::Spiral,
        GoalKind::Summon,
        GoalKind::Reposition,
    ];

    /// Attack goals set the shared cooldown when they finish
    pub fn is_attack(self) -> bool {
        !matches!(self, GoalKind::Reposition)
    }
}

/// Inputs every evaluator sees
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    pub hp_ratio: f32,
    pub aggression: f32,
    pub cooldown_ready: bool,
    pub patterns: PatternSet,
    pub live_enemies: usize,
    pub enemy_cap: usize,
}

impl GoalKind {
    /// Desirability of this goal; `roll` is a uniform [0,1) draw
    pub fn desirability(self, ctx: &EvalContext, roll: f32) -> f32 {
        let a = ctx.aggression;
        let attack_ready = ctx.cooldown_ready;
        match self {
            GoalKind::Burst => {
                if !attack_ready || !ctx.patterns.burst {
                    return 0.0;
                }
                0.45 + 0.30 * a + 0.25 * roll
            }
            GoalKind::Sweep => {
                if !attack_ready || !ctx.patterns.sweep {
                    return 0.0;
                }
                0.40 + 0.35 * a + 0.25 * roll
            }
            GoalKind::Spiral => {
                if !attack_ready || !ctx.patterns.spiral {
                    return 0.0;
                }
                0.15 + 0.75 * a + 0.15 * roll
            }
            GoalKind::Summon => {
                if !attack_ready || !ctx.patterns.summon || ctx.live_enemies >= ctx.enemy_cap {
                    return 0.0;
                }
                0.20 + 0.80 * (1.0 - ctx.hp_ratio) + 0.15 * roll
            }
            GoalKind::Rage => {
                if !attack_ready || !ctx.patterns.rage || ctx.hp_ratio > RAGE_THRESHOLD {
                    return 0.0;
                }
                RAGE_FLOOR + 0.2 * roll
            }
            GoalKind::Reposition => {
                if attack_ready {
                    0.08 + 0.05 * roll
                } else {
                    0.40 + 0.20 * roll
                }
            }
        }
    }
}

/// Result of one arbitration pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Choice {
    pub kind: GoalKind,
    pub score: f32,
}

/// Score every evaluator and pick the best non-zero one
pub fn arbitrate(ctx: &EvalContext, rng: &mut SeededRng) -> Choice {
    let mut best = Choice {
        kind: GoalKind::Reposition,
        score: 0.0,
    };
    for kind in GoalKind::ALL {
        let score = kind.desirability(ctx, rng.next_f32());
        if score > best.score {
            best = Choice { kind, score };
        }
    }
    best
}
