//! Platform-agnostic input state
//!
//! Platform adapters translate their events into [`Input::press_key`],
//! [`Input::set_pointer_position`] and friends. The engine clears the
//! per-step "pressed" sets after every simulation step, so a press is seen by
//! exactly one step.

use glam::Vec2;
use rustc_hash::FxHashSet;

/// Keyboard key (platform-agnostic)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    // Letter keys
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Number keys
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,

    // Control keys
    Space,
    Enter,
    Escape,
    Backspace,
    Tab,
    Shift,
    Control,
    Alt,

    // Arrow keys
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Pointer and keyboard state read by components and transition predicates.
#[derive(Debug, Clone, Default)]
pub struct Input {
    keys_down: FxHashSet<Key>,
    keys_pressed: FxHashSet<Key>,

    buttons_down: FxHashSet<MouseButton>,
    buttons_pressed: FxHashSet<MouseButton>,

    pointer_position: Vec2,
}

impl Input {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Adapter API ==========

    pub fn press_key(&mut self, key: Key) {
        if self.keys_down.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn release_key(&mut self, key: Key) {
        self.keys_down.remove(&key);
    }

    pub fn press_button(&mut self, button: MouseButton) {
        if self.buttons_down.insert(button) {
            self.buttons_pressed.insert(button);
        }
    }

    pub fn release_button(&mut self, button: MouseButton) {
        self.buttons_down.remove(&button);
    }

    pub fn set_pointer_position(&mut self, position: Vec2) {
        self.pointer_position = position;
    }

    /// Forgets which keys and buttons went down since the last call.
    pub fn clear_press_state(&mut self) {
        self.keys_pressed.clear();
        self.buttons_pressed.clear();
    }

    // ========== Query API ==========

    #[must_use]
    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Whether `key` went down since the last simulation step.
    #[must_use]
    pub fn was_key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    #[must_use]
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    #[must_use]
    pub fn was_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    #[must_use]
    pub fn pointer_position(&self) -> Vec2 {
        self.pointer_position
    }
}
