use std::collections::HashMap;

use serde::Serialize;

use crate::inventory::Inventory;
use crate::player::{PlayerState, StatusEffect};
use crate::simulation::clock::{DayClock, TimeOfDay};
use crate::simulation::weather::Weather;
use crate::world::{TerrainType, World};

/// Aggregate snapshot of a running game, for periodic logging and inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStatistics {
    pub tick: u64,
    pub game_time: f64,
    pub day: u64,
    pub time_of_day: TimeOfDay,
    pub weather: Weather,
    pub node_count: usize,
    pub pending_regenerations: usize,
    pub health: f32,
    pub hunger: f32,
    pub thirst: f32,
    pub effects: Vec<StatusEffect>,
    pub used_slots: usize,
    pub capacity: usize,
    /// Shannon diversity of terrain types, 0 = one terrain, 1 = all equally common.
    pub terrain_diversity: f32,
}

pub fn compute_statistics(
    tick: u64,
    clock: &DayClock,
    weather: Weather,
    world: &World,
    player: &PlayerState,
    inventory: &Inventory,
) -> GameStatistics {
    let terrain = world.terrain_counts();
    GameStatistics {
        tick,
        game_time: world.time,
        day: clock.day(),
        time_of_day: clock.time_of_day(),
        weather,
        node_count: world.node_count(),
        pending_regenerations: world.pending_regeneration(),
        health: player.vitals.health,
        hunger: player.vitals.hunger,
        thirst: player.vitals.thirst,
        effects: player.effects.iter().copied().collect(),
        used_slots: inventory.used_slots(),
        capacity: inventory.capacity(),
        terrain_diversity: shannon_diversity(&terrain, world.tiles.len() as u32),
    }
}

/// Shannon diversity index normalized to [0, 1].
fn shannon_diversity(distribution: &HashMap<TerrainType, u32>, total: u32) -> f32 {
    if total == 0 {
        return 0.0;
    }

    let total_f = total as f64;
    let mut entropy = 0.0_f64;
    let mut non_zero_types = 0_u32;

    for &count in distribution.values() {
        if count > 0 {
            non_zero_types += 1;
            let p = count as f64 / total_f;
            entropy -= p * p.ln();
        }
    }

    if non_zero_types <= 1 {
        return 0.0;
    }

    // Normalize by ln of the number of types present
    let max_entropy = (non_zero_types as f64).ln();
    (entropy / max_entropy) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::uniform_world;
    use glam::Vec2;

    #[test]
    fn monoculture_has_zero_diversity() {
        let mut dist = HashMap::new();
        dist.insert(TerrainType::Grass, 100);
        assert_eq!(shannon_diversity(&dist, 100), 0.0);
    }

    #[test]
    fn even_split_has_full_diversity() {
        let mut dist = HashMap::new();
        dist.insert(TerrainType::Grass, 50);
        dist.insert(TerrainType::Water, 50);
        assert!((shannon_diversity(&dist, 100) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_distribution_is_zero() {
        assert_eq!(shannon_diversity(&HashMap::new(), 0), 0.0);
    }

    #[test]
    fn statistics_reflect_parts() {
        let world = uniform_world(4, 4, TerrainType::Grass);
        let mut player = PlayerState::new(Vec2::new(5.0, 5.0), 10.0);
        player.vitals.hunger = 42.0;
        let inventory = Inventory::new(9);
        let clock = DayClock::new(100.0, 0.5);

        let stats = compute_statistics(7, &clock, Weather::Fog, &world, &player, &inventory);
        assert_eq!(stats.tick, 7);
        assert_eq!(stats.time_of_day, TimeOfDay::Day);
        assert_eq!(stats.weather, Weather::Fog);
        assert_eq!(stats.hunger, 42.0);
        assert_eq!(stats.capacity, 9);
        assert_eq!(stats.used_slots, 0);
        assert_eq!(stats.terrain_diversity, 0.0);
    }
}
