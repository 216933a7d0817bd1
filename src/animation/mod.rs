//! Animation
//!
//! Keyframe channels grouped into named states, driven per node by an
//! [`AnimationStateMachine`] that cross-fades between states.

pub mod action;
pub mod channel;
pub mod state;
pub mod state_machine;
pub mod track;
mod values;

pub use action::{AnimationAction, DEFAULT_ACTION_SLOP};
pub use channel::{AnimationChannel, ChannelTrack, ChannelValue, TargetPath};
pub use state::{AnimationState, WrapMode};
pub use state_machine::{AnimationStateMachine, AnimationTransition, MachineStatus};
pub use track::{InterpolationMode, KeyframeTrack};
pub use values::Interpolatable;
