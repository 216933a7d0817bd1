#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod engine;
pub mod errors;
pub mod render;
pub mod scene;
pub mod services;
pub mod settings;
pub mod utils;

pub use animation::{
    AnimationAction, AnimationChannel, AnimationState, AnimationStateMachine, WrapMode,
};
pub use assets::{GltfImporter, ImportedModel, TextureLoader, TextureSource};
pub use engine::{DisplaySync, Engine, StopHandle, UpdateContext};
pub use errors::{AnimationError, AssetError, EngineError, GpuError, Result};
pub use render::{GpuBackend, RecordingBackend, Renderable};
pub use scene::{Camera, Component, FnComponent, Node, NodeHandle, RenderPhase, Scene, SceneGraph, Skin, Transform};
pub use services::{Input, SoundComponent, SoundService};
pub use settings::EngineSettings;
