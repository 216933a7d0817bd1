//! Scene graph
//!
//! Manages the node hierarchy and everything hanging off it:
//! - Node: a transformable entity ("GameObject") with components, an optional
//!   renderable and an embedded animation state machine
//! - Transform: position, rotation, scale and derived matrices
//! - SceneGraph: the node arena with hierarchy editing and queries
//! - TransformSystem: the single top-down world-matrix pass
//! - Scene: layers, camera, lights and skybox
//! - Skin: joint palette for skeletal meshes

pub mod camera;
pub mod component;
pub mod graph;
pub mod light;
pub mod node;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod skin;
pub mod transform;
pub mod transform_system;

pub use camera::Camera;
pub use component::{Component, FnComponent};
pub use graph::SceneGraph;
pub use light::{MAX_POINT_LIGHTS, PointLight};
pub use node::{Node, RenderPhase};
pub use scene::Scene;
pub use skin::Skin;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    /// Non-owning reference to a node in a [`SceneGraph`].
    ///
    /// Used for parent links, skin joints and animation channel targets. A
    /// handle to a destroyed node simply fails to resolve.
    pub struct NodeHandle;
}
