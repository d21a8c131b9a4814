//! Input vocabulary
//!
//! The simulation never wires key events itself. The platform layer fills a
//! `KeySet` with whatever is held down and hands a snapshot to each tick.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Logical keys the simulation understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Shoot while playing, place a block in build mode
    Fire,
    /// Start / continue from menu, victory and game over screens
    Confirm,
    Pause,
    /// Toggle build mode
    Build,
    /// Remove a player-placed block in build mode
    Remove,
    /// Select build material 1..=5
    Material(u8),
}

impl Key {
    /// Map a raw keyboard key name (DOM `KeyboardEvent.key` style) to a logical key
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "w" | "W" | "ArrowUp" => Key::Up,
            "s" | "S" | "ArrowDown" => Key::Down,
            "a" | "A" | "ArrowLeft" => Key::Left,
            "d" | "D" | "ArrowRight" => Key::Right,
            "j" | "J" | " " => Key::Fire,
            "Enter" => Key::Confirm,
            "p" | "P" | "Escape" => Key::Pause,
            "b" | "B" => Key::Build,
            "x" | "X" => Key::Remove,
            "1" => Key::Material(1),
            "2" => Key::Material(2),
            "3" => Key::Material(3),
            "4" => Key::Material(4),
            "5" => Key::Material(5),
            _ => return None,
        })
    }
}

/// Set of currently held keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    held: HashSet<Key>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot holding exactly these keys
    pub fn of(keys: &[Key]) -> Self {
        Self {
            held: keys.iter().copied().collect(),
        }
    }

    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    /// Feed a raw key-down event; unknown names are ignored
    pub fn press_named(&mut self, name: &str) {
        if let Some(key) = Key::from_name(name) {
            self.press(key);
        }
    }

    /// Feed a raw key-up event; unknown names are ignored
    pub fn release_named(&mut self, name: &str) {
        if let Some(key) = Key::from_name(name) {
            self.release(key);
        }
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Held now but not in the previous snapshot (edge-triggered keys)
    pub fn just_pressed(&self, key: Key, previous: &KeySet) -> bool {
        self.is_pressed(key) && !previous.is_pressed(key)
    }
}
