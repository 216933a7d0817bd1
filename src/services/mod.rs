//! External services the engine reads from during updates.

pub mod input;
pub mod sound;

pub use input::{Input, Key, MouseButton};
pub use sound::{SoundCallback, SoundComponent, SoundService};
