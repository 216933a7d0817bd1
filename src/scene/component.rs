//! Node components
//!
//! A component is per-node behaviour run once per simulation step, before the
//! node's animation state machine advances. Plain closures are wrapped with
//! [`FnComponent`].

use std::any::Any;

use crate::engine::UpdateContext;
use crate::errors::Result;
use crate::scene::NodeHandle;
use crate::scene::graph::SceneGraph;

/// Per-node update behaviour.
///
/// `update` receives the graph with the owning node's components temporarily
/// detached, so a component may freely edit its own node (or any other) but
/// will not see itself through `graph`.
pub trait Component: Any {
    fn update(
        &mut self,
        ctx: &mut UpdateContext<'_>,
        graph: &mut SceneGraph,
        node: NodeHandle,
    ) -> Result<()>;

    /// Optional label used by [`Node::find_component`](crate::scene::Node::find_component).
    fn tag(&self) -> Option<&str> {
        None
    }
}

/// Wraps a closure as a [`Component`].
pub struct FnComponent<F> {
    tag: Option<String>,
    func: F,
}

impl<F> FnComponent<F>
where
    F: FnMut(&mut UpdateContext<'_>, &mut SceneGraph, NodeHandle) -> Result<()> + 'static,
{
    pub fn new(func: F) -> Self {
        Self { tag: None, func }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

impl<F> Component for FnComponent<F>
where
    F: FnMut(&mut UpdateContext<'_>, &mut SceneGraph, NodeHandle) -> Result<()> + 'static,
{
    fn update(
        &mut self,
        ctx: &mut UpdateContext<'_>,
        graph: &mut SceneGraph,
        node: NodeHandle,
    ) -> Result<()> {
        (self.func)(ctx, graph, node)
    }

    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}
