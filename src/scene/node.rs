use std::fmt;

use glam::Affine3A;

use crate::animation::AnimationStateMachine;
use crate::engine::UpdateContext;
use crate::errors::Result;
use crate::render::mesh::Renderable;
use crate::scene::NodeHandle;
use crate::scene::component::{Component, FnComponent};
use crate::scene::graph::SceneGraph;
use crate::scene::transform::Transform;

/// Render pass bucket a node is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderPhase {
    /// Opaque geometry, drawn during the layer's first pass.
    #[default]
    Standard,
    /// Alpha-blended geometry, deferred until the layer's opaque pass is done.
    Alpha,
}

/// A scene node ("GameObject").
///
/// # Hierarchy
///
/// Nodes form a tree through parent-child relationships:
/// - `parent`: non-owning handle to the parent (`None` for roots)
/// - `children`: ordered child handles, never duplicated
///
/// Hierarchy edits go through [`SceneGraph`](crate::scene::SceneGraph) so
/// both sides of an edge stay in sync.
///
/// # Behaviour
///
/// Each update a node runs its components in insertion order, then advances
/// its animation state machine. Rendering uses `renderable` when present.
pub struct Node {
    /// Identity label used for lookups. Not required to be unique.
    pub name: String,

    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    pub transform: Transform,

    pub visible: bool,

    pub(crate) components: Vec<Box<dyn Component>>,

    pub renderable: Option<Renderable>,

    pub animation: AnimationStateMachine,

    pub render_phase: RenderPhase,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            components: Vec::new(),
            renderable: None,
            animation: AnimationStateMachine::new(),
            render_phase: RenderPhase::Standard,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// World matrix from the last hierarchy pass, if the node has been visited.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> Option<&Affine3A> {
        self.transform.world_matrix()
    }

    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn add_component(&mut self, component: impl Component) {
        self.components.push(Box::new(component));
    }

    /// Attaches a closure as an untagged component.
    pub fn add_fn_component<F>(&mut self, func: F)
    where
        F: FnMut(&mut UpdateContext<'_>, &mut SceneGraph, NodeHandle) -> Result<()> + 'static,
    {
        self.add_component(FnComponent::new(func));
    }

    /// First component of type `T`, optionally filtered by tag.
    #[must_use]
    pub fn find_component<T: Component>(&self, tag: Option<&str>) -> Option<&T> {
        self.components
            .iter()
            .filter(|c| tag.is_none() || c.tag() == tag)
            .find_map(|c| (c.as_ref() as &dyn std::any::Any).downcast_ref::<T>())
    }

    #[must_use]
    pub fn find_component_mut<T: Component>(&mut self, tag: Option<&str>) -> Option<&mut T> {
        self.components
            .iter_mut()
            .filter(|c| tag.is_none() || c.tag() == tag)
            .find_map(|c| (c.as_mut() as &mut dyn std::any::Any).downcast_mut::<T>())
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("transform", &self.transform)
            .field("visible", &self.visible)
            .field("components", &self.components.len())
            .field("renderable", &self.renderable.is_some())
            .field("render_phase", &self.render_phase)
            .finish_non_exhaustive()
    }
}
