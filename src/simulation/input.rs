use crate::crafting::CraftError;
use crate::inventory::{HOTBAR_SIZE, InventoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Tile step in this direction; y grows downwards.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// A player intent, decoupled from the device that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Start moving in a direction; cancels the opposite direction.
    Move(Direction),
    StopMoving,
    Harvest,
    ToggleInventory,
    ToggleCrafting,
    /// Zero-based hotbar slot.
    SelectSlot(usize),
    CycleSelection(i32),
    UseSelected,
    Craft(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionError {
    UnknownInput(String),
    PlayerDead,
    NothingToHarvest,
    InventoryFull { item_id: String },
    NothingSelected,
    NotConsumable(String),
    UnknownItem(String),
    NoSpawnPoint,
    InvalidSlot(usize),
    Craft(CraftError),
    Inventory(InventoryError),
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::UnknownInput(s) => write!(f, "Unknown input: {}", s),
            ActionError::PlayerDead => write!(f, "The player is dead"),
            ActionError::NothingToHarvest => write!(f, "Nothing to harvest here"),
            ActionError::InventoryFull { item_id } => {
                write!(f, "Inventory full, no room for {}", item_id)
            }
            ActionError::NothingSelected => write!(f, "No item selected"),
            ActionError::NotConsumable(id) => write!(f, "{} cannot be eaten or drunk", id),
            ActionError::UnknownItem(id) => write!(f, "Unknown item: {}", id),
            ActionError::NoSpawnPoint => write!(f, "The world has no walkable tile to spawn on"),
            ActionError::InvalidSlot(slot) => {
                write!(f, "Slot {} is not a hotbar slot (1-{})", slot + 1, HOTBAR_SIZE)
            }
            ActionError::Craft(e) => write!(f, "{}", e),
            ActionError::Inventory(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<CraftError> for ActionError {
    fn from(e: CraftError) -> Self {
        ActionError::Craft(e)
    }
}

impl From<InventoryError> for ActionError {
    fn from(e: InventoryError) -> Self {
        ActionError::Inventory(e)
    }
}

/// Parse one line of keyboard input.
///
/// `W/A/S/D` or arrow names move, `E` harvests, `I` and `C` toggle panels,
/// `1`-`9` select a hotbar slot, `wheelup`/`wheeldown` cycle it, `U` uses the
/// selected item, `craft <id>` crafts and `stop` halts movement.
pub fn parse_action(line: &str) -> Result<Action, ActionError> {
    let trimmed = line.trim();
    let mut parts = trimmed.split_whitespace();
    let Some(key) = parts.next() else {
        return Err(ActionError::UnknownInput(String::new()));
    };
    let key = key.to_ascii_lowercase();

    if key == "craft" {
        return match (parts.next(), parts.next()) {
            (Some(id), None) => Ok(Action::Craft(id.to_string())),
            _ => Err(ActionError::UnknownInput(trimmed.to_string())),
        };
    }
    if parts.next().is_some() {
        return Err(ActionError::UnknownInput(trimmed.to_string()));
    }

    let action = match key.as_str() {
        "w" | "up" | "arrowup" => Action::Move(Direction::Up),
        "s" | "down" | "arrowdown" => Action::Move(Direction::Down),
        "a" | "left" | "arrowleft" => Action::Move(Direction::Left),
        "d" | "right" | "arrowright" => Action::Move(Direction::Right),
        "stop" => Action::StopMoving,
        "e" => Action::Harvest,
        "i" => Action::ToggleInventory,
        "c" => Action::ToggleCrafting,
        "u" => Action::UseSelected,
        "wheelup" => Action::CycleSelection(-1),
        "wheeldown" => Action::CycleSelection(1),
        digit => match digit.parse::<usize>() {
            Ok(n) if (1..=HOTBAR_SIZE).contains(&n) => Action::SelectSlot(n - 1),
            _ => return Err(ActionError::UnknownInput(trimmed.to_string())),
        },
    };
    Ok(action)
}
