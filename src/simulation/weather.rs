use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Weather {
    #[default]
    Clear,
    Cloudy,
    Rain,
    Storm,
    Snow,
    Fog,
}

impl Weather {
    pub const ALL: [Weather; 6] = [
        Weather::Clear,
        Weather::Cloudy,
        Weather::Rain,
        Weather::Storm,
        Weather::Snow,
        Weather::Fog,
    ];

    /// Relative likelihood of each successor, in `Weather::ALL` order.
    ///
    /// The current weather always has weight zero, so a roll is always a change.
    fn successor_weights(self) -> [u32; 6] {
        match self {
            Weather::Clear => [0, 50, 20, 5, 5, 20],
            Weather::Cloudy => [40, 0, 35, 10, 5, 10],
            Weather::Rain => [20, 40, 0, 30, 5, 5],
            Weather::Storm => [10, 30, 60, 0, 0, 0],
            Weather::Snow => [30, 50, 0, 5, 0, 15],
            Weather::Fog => [50, 30, 10, 0, 10, 0],
        }
    }

    /// Draw the next weather from the table for the current one.
    pub fn next(self, rng: &mut impl Rng) -> Weather {
        let weights = self.successor_weights();
        let total: u32 = weights.iter().sum();
        let mut roll = rng.gen_range(0..total);
        for (weather, weight) in Weather::ALL.into_iter().zip(weights) {
            if roll < weight {
                return weather;
            }
            roll -= weight;
        }
        Weather::Clear
    }

    /// Roll for a change over `dt` seconds given a per-second probability.
    ///
    /// Returns the new weather only when it changed.
    pub fn maybe_change(self, dt: f32, chance_per_sec: f32, rng: &mut impl Rng) -> Option<Weather> {
        let chance = (chance_per_sec * dt).clamp(0.0, 1.0);
        if chance <= 0.0 || rng.r#gen::<f32>() >= chance {
            return None;
        }
        Some(self.next(rng))
    }

    /// Whether this weather chills the player regardless of time of day.
    pub fn is_cold(self) -> bool {
        matches!(self, Weather::Snow | Weather::Storm)
    }

    pub fn name(self) -> &'static str {
        match self {
            Weather::Clear => "clear",
            Weather::Cloudy => "cloudy",
            Weather::Rain => "rain",
            Weather::Storm => "storm",
            Weather::Snow => "snow",
            Weather::Fog => "fog",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn next_always_changes() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for current in Weather::ALL {
            for _ in 0..200 {
                assert_ne!(current.next(&mut rng), current);
            }
        }
    }

    #[test]
    fn zero_weight_successors_never_drawn() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..500 {
            let next = Weather::Storm.next(&mut rng);
            assert!(matches!(next, Weather::Clear | Weather::Cloudy | Weather::Rain));
        }
    }

    #[test]
    fn zero_chance_never_changes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            assert_eq!(Weather::Clear.maybe_change(1.0, 0.0, &mut rng), None);
        }
    }

    #[test]
    fn certain_chance_always_changes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            let next = Weather::Rain.maybe_change(1.0, 1.0, &mut rng);
            assert!(next.is_some_and(|w| w != Weather::Rain));
        }
    }

    #[test]
    fn change_rate_scales_with_dt() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let trials = 20_000;
        let changes = (0..trials)
            .filter(|_| Weather::Clear.maybe_change(0.5, 0.2, &mut rng).is_some())
            .count();
        let rate = changes as f64 / trials as f64;
        assert!((rate - 0.1).abs() < 0.02, "rate {}", rate);
    }
}
