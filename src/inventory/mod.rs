use serde::{Deserialize, Serialize};

use crate::items::ItemStack;

/// Number of leading slots reachable with the number keys and mouse wheel.
pub const HOTBAR_SIZE: usize = 9;

/// Errors from slot-level inventory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    SlotOutOfRange { slot: usize, capacity: usize },
    EmptySlot(usize),
    InvalidCount,
    NotEnough { slot: usize, have: u32, requested: u32 },
}

impl std::fmt::Display for InventoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InventoryError::SlotOutOfRange { slot, capacity } => {
                write!(f, "Slot {} out of range (capacity {})", slot, capacity)
            }
            InventoryError::EmptySlot(slot) => write!(f, "Slot {} is empty", slot),
            InventoryError::InvalidCount => write!(f, "Count must be at least 1"),
            InventoryError::NotEnough {
                slot,
                have,
                requested,
            } => write!(
                f,
                "Slot {} holds {} but {} were requested",
                slot, have, requested
            ),
        }
    }
}

impl std::error::Error for InventoryError {}

/// What happened to the selected item after wearing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WearOutcome {
    /// Nothing selected, or the selected item has no durability.
    NotApplicable,
    Worn { item_id: String, remaining: u32 },
    Broke { item_id: String },
}

/// Fixed-capacity slot array with per-stack caps.
///
/// No slot ever holds more than its stack's `max_stack`, and a slot holds
/// exactly one item type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
    selected_slot: usize,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            selected_slot: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn used_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn total_count(&self) -> u32 {
        self.slots.iter().flatten().map(|s| s.count).sum()
    }

    /// Add a stack. Returns the quantity that could not be placed (0 = fully absorbed).
    ///
    /// Stackable items first top up existing compatible stacks, then fill
    /// empty slots in `max_stack` chunks. Non-stackable items take one empty
    /// slot per unit.
    pub fn add_item(&mut self, item: ItemStack) -> u32 {
        let mut remaining = item.count;
        if remaining == 0 {
            return 0;
        }

        // First pass: top up existing stacks of the same item
        if item.stackable {
            for slot in self.slots.iter_mut() {
                if remaining == 0 {
                    break;
                }
                if let Some(s) = slot {
                    if s.is_compatible(&item) && s.count < s.max_stack {
                        let add = remaining.min(s.space());
                        s.count += add;
                        remaining -= add;
                    }
                }
            }
        }

        // Second pass: fill empty slots
        let chunk = if item.stackable { item.max_stack.max(1) } else { 1 };
        for slot in self.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let add = remaining.min(chunk);
                *slot = Some(item.with_count(add));
                remaining -= add;
            }
        }

        remaining
    }

    /// Whether `count` units of `item` would fit without any remainder.
    pub fn can_accept(&self, item: &ItemStack, count: u32) -> bool {
        let mut room: u64 = 0;
        for slot in &self.slots {
            room += match slot {
                None if item.stackable => item.max_stack.max(1) as u64,
                None => 1,
                Some(s) if item.stackable && s.is_compatible(item) => s.space() as u64,
                Some(_) => 0,
            };
            if room >= count as u64 {
                return true;
            }
        }
        room >= count as u64
    }

    /// Remove `count` units from one slot, clearing it when it reaches zero.
    pub fn remove_item(&mut self, slot: usize, count: u32) -> Result<ItemStack, InventoryError> {
        let capacity = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(InventoryError::SlotOutOfRange { slot, capacity })?;
        let stack = entry.as_mut().ok_or(InventoryError::EmptySlot(slot))?;
        if count == 0 {
            return Err(InventoryError::InvalidCount);
        }
        if count > stack.count {
            return Err(InventoryError::NotEnough {
                slot,
                have: stack.count,
                requested: count,
            });
        }

        let removed = stack.with_count(count);
        stack.count -= count;
        if stack.count == 0 {
            *entry = None;
        }
        Ok(removed)
    }

    /// Remove up to `count` units of `item_id` across slots, last slot first
    /// so hotbar stacks are consumed after the backpack. Returns how many were removed.
    pub fn remove_by_id(&mut self, item_id: &str, count: u32) -> u32 {
        let mut remaining = count;
        for slot in self.slots.iter_mut().rev() {
            if remaining == 0 {
                break;
            }
            if let Some(s) = slot {
                if s.item_id == item_id {
                    let take = remaining.min(s.count);
                    s.count -= take;
                    remaining -= take;
                    if s.count == 0 {
                        *slot = None;
                    }
                }
            }
        }
        count - remaining
    }

    pub fn count_of(&self, item_id: &str) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.item_id == item_id)
            .map(|s| s.count)
            .sum()
    }

    pub fn has_item(&self, item_id: &str, count: u32) -> bool {
        self.count_of(item_id) >= count
    }

    pub fn selected_index(&self) -> usize {
        self.selected_slot
    }

    pub fn selected(&self) -> Option<&ItemStack> {
        self.slot(self.selected_slot)
    }

    /// Select a hotbar slot. Returns false (and keeps the selection) if out of range.
    pub fn select_slot(&mut self, index: usize) -> bool {
        if index < self.hotbar_len() {
            self.selected_slot = index;
            true
        } else {
            false
        }
    }

    /// Move the selection by `delta`, wrapping around the hotbar.
    pub fn cycle_selection(&mut self, delta: i32) -> usize {
        let len = self.hotbar_len() as i64;
        if len > 0 {
            let next = (self.selected_slot as i64 + delta as i64).rem_euclid(len);
            self.selected_slot = next as usize;
        }
        self.selected_slot
    }

    /// Wear the selected item by `amount`, removing it when durability runs out.
    pub fn wear_selected(&mut self, amount: u32) -> WearOutcome {
        let Some(entry) = self.slots.get_mut(self.selected_slot) else {
            return WearOutcome::NotApplicable;
        };
        let Some(stack) = entry.as_mut() else {
            return WearOutcome::NotApplicable;
        };
        let Some(durability) = stack.durability.as_mut() else {
            return WearOutcome::NotApplicable;
        };

        durability.current = durability.current.saturating_sub(amount);
        if durability.current == 0 {
            let item_id = stack.item_id.clone();
            *entry = None;
            WearOutcome::Broke { item_id }
        } else {
            WearOutcome::Worn {
                item_id: stack.item_id.clone(),
                remaining: durability.current,
            }
        }
    }

    /// Check the slot invariants. Used by tests and after loading saves.
    pub fn validate(&self) -> Result<(), String> {
        if self.selected_slot >= self.slots.len().max(1) {
            return Err(format!(
                "selected slot {} out of range (capacity {})",
                self.selected_slot,
                self.slots.len()
            ));
        }
        for (i, stack) in self.slots.iter().enumerate() {
            let Some(s) = stack else { continue };
            if s.count == 0 || s.count > s.max_stack {
                return Err(format!(
                    "slot {} holds {} {} (max {})",
                    i, s.count, s.item_id, s.max_stack
                ));
            }
            if !s.stackable && s.max_stack != 1 {
                return Err(format!("slot {}: non-stackable {} has max {}", i, s.item_id, s.max_stack));
            }
            if let Some(d) = s.durability {
                if d.current > d.max {
                    return Err(format!(
                        "slot {}: durability {}/{} exceeds max",
                        i, d.current, d.max
                    ));
                }
            }
        }
        Ok(())
    }

    fn hotbar_len(&self) -> usize {
        self.slots.len().min(HOTBAR_SIZE)
    }
}
