pub mod status;

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::world::World;
pub use status::StatusEffect;

pub const MAX_VITAL: f32 = 100.0;
/// Resist skill levels above this have no further effect.
pub const MAX_RESIST_LEVEL: u32 = 5;
/// Decay multiplier per resist level.
pub const RESIST_FACTOR: f32 = 0.9;

/// Directions currently held by the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveInput {
    /// Unit direction (or zero). Screen convention: +y is down.
    pub fn direction(self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        dir.normalize_or_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    pub hunger: f32,
    pub thirst: f32,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: MAX_VITAL,
            hunger: MAX_VITAL,
            thirst: MAX_VITAL,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub hunger_resist: u32,
    pub thirst_resist: u32,
}

/// Decay rates applied by `PlayerState::update`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayRates {
    pub hunger_per_sec: f32,
    pub thirst_per_sec: f32,
    /// Health lost per second for each of hunger and thirst sitting at zero.
    pub starvation_per_sec: f32,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            hunger_per_sec: 0.1,
            thirst_per_sec: 0.15,
            starvation_per_sec: 1.0,
        }
    }
}

/// Environmental exposure at the player's position this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ambient {
    pub cold: bool,
    pub heat: bool,
}

/// What changed during one `update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerTick {
    pub gained: Vec<StatusEffect>,
    pub lost: Vec<StatusEffect>,
    pub health_delta: f32,
    pub died: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub input: MoveInput,
    pub speed: f32,
    pub vitals: Vitals,
    pub skills: Skills,
    pub effects: BTreeSet<StatusEffect>,
}

impl PlayerState {
    pub fn new(position: Vec2, speed: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            input: MoveInput::default(),
            speed,
            vitals: Vitals::default(),
            skills: Skills::default(),
            effects: BTreeSet::new(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.vitals.health <= 0.0
    }

    /// Advance movement, vitals and status effects by `dt` seconds.
    pub fn update(&mut self, dt: f32, world: &World, rates: &DecayRates, ambient: Ambient) -> PlayerTick {
        let mut tick = PlayerTick::default();
        if self.is_dead() || dt <= 0.0 {
            self.velocity = Vec2::ZERO;
            return tick;
        }

        self.integrate_movement(dt, world);

        let hunger_rate = rates.hunger_per_sec * resist_multiplier(self.skills.hunger_resist);
        let thirst_rate = rates.thirst_per_sec * resist_multiplier(self.skills.thirst_resist);
        self.vitals.hunger = clamp_vital(self.vitals.hunger - hunger_rate * dt);
        self.vitals.thirst = clamp_vital(self.vitals.thirst - thirst_rate * dt);

        let health_before = self.vitals.health;
        let mut health_rate = 0.0;
        if self.vitals.hunger <= 0.0 {
            health_rate -= rates.starvation_per_sec;
        }
        if self.vitals.thirst <= 0.0 {
            health_rate -= rates.starvation_per_sec;
        }

        let next = status::active_effects(&self.vitals, ambient);
        tick.gained = next.difference(&self.effects).copied().collect();
        tick.lost = self.effects.difference(&next).copied().collect();
        self.effects = next;

        health_rate += self
            .effects
            .iter()
            .map(|e| e.health_per_sec())
            .sum::<f32>();
        self.vitals.health = clamp_vital(self.vitals.health + health_rate * dt);

        tick.health_delta = self.vitals.health - health_before;
        tick.died = health_before > 0.0 && self.is_dead();
        if tick.died {
            self.velocity = Vec2::ZERO;
        }
        tick
    }

    /// Restore health. Returns the amount actually applied.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.is_dead() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.vitals.health;
        self.vitals.health = clamp_vital(before + amount);
        self.vitals.health - before
    }

    /// Apply damage. Returns true exactly when health is now zero.
    pub fn damage(&mut self, amount: f32) -> bool {
        if amount > 0.0 {
            self.vitals.health = clamp_vital(self.vitals.health - amount);
        }
        self.vitals.health == 0.0
    }

    /// Restore hunger. Returns the amount actually applied.
    pub fn eat(&mut self, nutrition: f32) -> f32 {
        if self.is_dead() || nutrition <= 0.0 {
            return 0.0;
        }
        let before = self.vitals.hunger;
        self.vitals.hunger = clamp_vital(before + nutrition);
        self.vitals.hunger - before
    }

    /// Restore thirst. Returns the amount actually applied.
    pub fn drink(&mut self, hydration: f32) -> f32 {
        if self.is_dead() || hydration <= 0.0 {
            return 0.0;
        }
        let before = self.vitals.thirst;
        self.vitals.thirst = clamp_vital(before + hydration);
        self.vitals.thirst - before
    }

    /// Move along each axis separately so the player slides along walls.
    fn integrate_movement(&mut self, dt: f32, world: &World) {
        let start = self.position;
        let step = self.input.direction() * self.speed * dt;
        if step != Vec2::ZERO {
            let candidate_x = self.position.x + step.x;
            if world.is_walkable(candidate_x, self.position.y) {
                self.position.x = candidate_x;
            }
            let candidate_y = self.position.y + step.y;
            if world.is_walkable(self.position.x, candidate_y) {
                self.position.y = candidate_y;
            }
        }
        self.velocity = (self.position - start) / dt;
    }
}

/// `RESIST_FACTOR^level`, with the level clamped to `MAX_RESIST_LEVEL`.
pub fn resist_multiplier(level: u32) -> f32 {
    RESIST_FACTOR.powi(level.min(MAX_RESIST_LEVEL) as i32)
}

fn clamp_vital(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_VITAL)
}
