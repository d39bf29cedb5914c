use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::player::{Ambient, Vitals};

/// Hunger or thirst at or below this level applies the matching effect.
pub const LOW_VITAL_THRESHOLD: f32 = 25.0;
/// Hunger and thirst both at or above this level grant `WellFed`.
pub const WELL_FED_THRESHOLD: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusEffect {
    Hungry,
    Thirsty,
    Cold,
    Heat,
    WellFed,
}

impl StatusEffect {
    /// Signed health change per second while the effect is active.
    pub fn health_per_sec(self) -> f32 {
        match self {
            StatusEffect::Hungry => -0.2,
            StatusEffect::Thirsty => -0.3,
            StatusEffect::Cold => -0.5,
            StatusEffect::Heat => -0.3,
            StatusEffect::WellFed => 0.25,
        }
    }
}

/// The effects implied by the current vitals and surroundings.
pub fn active_effects(vitals: &Vitals, ambient: Ambient) -> BTreeSet<StatusEffect> {
    let mut effects = BTreeSet::new();
    if vitals.hunger <= LOW_VITAL_THRESHOLD {
        effects.insert(StatusEffect::Hungry);
    }
    if vitals.thirst <= LOW_VITAL_THRESHOLD {
        effects.insert(StatusEffect::Thirsty);
    }
    if ambient.cold {
        effects.insert(StatusEffect::Cold);
    }
    if ambient.heat {
        effects.insert(StatusEffect::Heat);
    }
    if vitals.hunger >= WELL_FED_THRESHOLD && vitals.thirst >= WELL_FED_THRESHOLD {
        effects.insert(StatusEffect::WellFed);
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_map_to_effects() {
        let vitals = Vitals {
            health: 50.0,
            hunger: 25.0,
            thirst: 26.0,
        };
        let effects = active_effects(&vitals, Ambient::default());
        assert!(effects.contains(&StatusEffect::Hungry));
        assert!(!effects.contains(&StatusEffect::Thirsty));
    }

    #[test]
    fn well_fed_requires_both() {
        let mut vitals = Vitals::default();
        assert!(active_effects(&vitals, Ambient::default()).contains(&StatusEffect::WellFed));
        vitals.thirst = 79.0;
        assert!(!active_effects(&vitals, Ambient::default()).contains(&StatusEffect::WellFed));
    }

    #[test]
    fn ambient_adds_exposure_effects() {
        let effects = active_effects(
            &Vitals::default(),
            Ambient {
                cold: true,
                heat: true,
            },
        );
        assert!(effects.contains(&StatusEffect::Cold));
        assert!(effects.contains(&StatusEffect::Heat));
    }

    #[test]
    fn only_well_fed_heals() {
        assert!(StatusEffect::WellFed.health_per_sec() > 0.0);
        for effect in [
            StatusEffect::Hungry,
            StatusEffect::Thirsty,
            StatusEffect::Cold,
            StatusEffect::Heat,
        ] {
            assert!(effect.health_per_sec() < 0.0);
        }
    }
}
