use serde::Serialize;

use crate::player::StatusEffect;
use crate::simulation::clock::TimeOfDay;
use crate::simulation::weather::Weather;
use crate::world::{ResourceType, TileCoord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Everything the game reports back to its driver during a step or action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    TimeOfDayChanged {
        from: TimeOfDay,
        to: TimeOfDay,
        day: u64,
        light_level: f32,
        overlay_alpha: f32,
        ambient_track: &'static str,
    },
    WeatherChanged {
        from: Weather,
        to: Weather,
    },
    ResourceHarvested {
        coord: TileCoord,
        resource: ResourceType,
        item_id: String,
        remaining: u32,
    },
    ResourceSpawned {
        coord: TileCoord,
        resource: ResourceType,
        amount: u32,
        regenerated: bool,
    },
    ItemCrafted {
        recipe_id: String,
        item_id: String,
        count: u32,
    },
    CraftFailed {
        recipe_id: String,
        reason: String,
    },
    InventoryFull {
        item_id: String,
    },
    ItemConsumed {
        item_id: String,
        hunger_restored: f32,
        thirst_restored: f32,
    },
    ToolBroke {
        item_id: String,
    },
    SelectionChanged {
        slot: usize,
    },
    PanelToggled {
        panel: Panel,
        open: bool,
    },
    StatusGained {
        effect: StatusEffect,
    },
    StatusLost {
        effect: StatusEffect,
    },
    PlayerDamaged {
        amount: f32,
        health: f32,
    },
    PlayerDied,
    AutosaveDue {
        tick: u64,
    },
    Notification {
        severity: Severity,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Inventory,
    Crafting,
}

impl GameEvent {
    pub fn notify(severity: Severity, message: impl Into<String>) -> Self {
        GameEvent::Notification {
            severity,
            message: message.into(),
        }
    }

    /// One-line description for console output.
    pub fn describe(&self) -> String {
        match self {
            GameEvent::TimeOfDayChanged { to, day, ambient_track, .. } => {
                format!("Day {}: {:?} begins ({})", day, to, ambient_track)
            }
            GameEvent::WeatherChanged { from, to } => {
                format!("Weather: {} -> {}", from.name(), to.name())
            }
            GameEvent::ResourceHarvested { item_id, remaining, .. } => {
                format!("Harvested {} ({} left)", item_id, remaining)
            }
            GameEvent::ResourceSpawned { coord, resource, amount, regenerated } => {
                let verb = if *regenerated { "regrew" } else { "appeared" };
                format!("{:?} x{} {} at ({}, {})", resource, amount, verb, coord.x, coord.y)
            }
            GameEvent::ItemCrafted { item_id, count, .. } => format!("Crafted {} x{}", item_id, count),
            GameEvent::CraftFailed { recipe_id, reason } => {
                format!("Cannot craft {}: {}", recipe_id, reason)
            }
            GameEvent::InventoryFull { item_id } => format!("Inventory full, no room for {}", item_id),
            GameEvent::ItemConsumed { item_id, .. } => format!("Consumed {}", item_id),
            GameEvent::ToolBroke { item_id } => format!("{} broke", item_id),
            GameEvent::SelectionChanged { slot } => format!("Selected slot {}", slot + 1),
            GameEvent::PanelToggled { panel, open } => {
                format!("{:?} panel {}", panel, if *open { "opened" } else { "closed" })
            }
            GameEvent::StatusGained { effect } => format!("Now {:?}", effect),
            GameEvent::StatusLost { effect } => format!("No longer {:?}", effect),
            GameEvent::PlayerDamaged { amount, health } => {
                format!("Took {:.1} damage ({:.1} health)", amount, health)
            }
            GameEvent::PlayerDied => "You died".to_string(),
            GameEvent::AutosaveDue { tick } => format!("Autosave due at tick {}", tick),
            GameEvent::Notification { severity, message } => format!("[{:?}] {}", severity, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = GameEvent::WeatherChanged {
            from: Weather::Clear,
            to: Weather::Rain,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "weather_changed");
        assert_eq!(json["to"], "Rain");
    }

    #[test]
    fn notifications_describe_severity() {
        let event = GameEvent::notify(Severity::Warning, "Inventory full");
        assert_eq!(event.describe(), "[Warning] Inventory full");
    }
}
