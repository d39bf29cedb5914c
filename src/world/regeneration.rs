use serde::{Deserialize, Serialize};

use crate::world::tile::{ResourceType, TileCoord};

/// Probability and delay window for re-seeding a depleted node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegenPolicy {
    pub chance: f32,
    pub delay_min_secs: f32,
    pub delay_max_secs: f32,
}

impl Default for RegenPolicy {
    fn default() -> Self {
        Self {
            chance: 0.3,
            delay_min_secs: 10.0,
            delay_max_secs: 40.0,
        }
    }
}

/// A pending request to re-seed `resource` near `origin` once world time reaches `due_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenEvent {
    pub due_at: f64,
    pub origin: TileCoord,
    pub resource: ResourceType,
}

/// Regeneration events owned by the world, kept sorted by due time.
///
/// Events scheduled for the same instant fire in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegenQueue {
    events: Vec<RegenEvent>,
}

impl RegenQueue {
    pub fn schedule(&mut self, event: RegenEvent) {
        let idx = self.events.partition_point(|e| e.due_at <= event.due_at);
        self.events.insert(idx, event);
    }

    /// Remove and return every event due at or before `now`, earliest first.
    pub fn pop_due(&mut self, now: f64) -> Vec<RegenEvent> {
        let split = self.events.partition_point(|e| e.due_at <= now);
        self.events.drain(..split).collect()
    }

    pub fn cancel_all(&mut self) -> usize {
        let n = self.events.len();
        self.events.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn next_due(&self) -> Option<f64> {
        self.events.first().map(|e| e.due_at)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegenEvent> {
        self.events.iter()
    }
}
