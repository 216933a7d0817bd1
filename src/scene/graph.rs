//! Scene graph arena
//!
//! [`SceneGraph`] owns every [`Node`] in a slotmap arena. Parent/child edges
//! are handles into the arena; the child list is the owning edge and the
//! parent handle is the back-reference.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::engine::UpdateContext;
use crate::errors::Result;
use crate::scene::NodeHandle;
use crate::scene::node::Node;
use crate::scene::transform::Transform;
use crate::scene::transform_system;

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeHandle, Node>,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    // ========================================================================
    // Node lifecycle
    // ========================================================================

    /// Creates an empty, detached node.
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeHandle {
        self.nodes.insert(Node::new(name))
    }

    /// Inserts a prepared node as a detached root.
    ///
    /// Any hierarchy links already set on `node` are discarded.
    pub fn insert(&mut self, mut node: Node) -> NodeHandle {
        node.parent = None;
        node.children.clear();
        self.nodes.insert(node)
    }

    /// Removes `handle` and its whole subtree from the arena.
    pub fn destroy(&mut self, handle: NodeHandle) {
        self.remove_from_parent(handle);

        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    #[inline]
    pub fn transform_mut(&mut self, handle: NodeHandle) -> Option<&mut Transform> {
        self.nodes.get_mut(handle).map(|n| &mut n.transform)
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self, handle: NodeHandle) -> Option<Affine3A> {
        self.nodes.get(handle).and_then(|n| n.transform.world_matrix)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.nodes.iter()
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut SlotMap<NodeHandle, Node> {
        &mut self.nodes
    }

    // ========================================================================
    // Hierarchy editing
    // ========================================================================

    /// Attaches `child` under `parent`, detaching it from any previous parent
    /// first.
    ///
    /// Self-attachment and attachments that would create a cycle are ignored.
    /// Returns whether the edge was created.
    pub fn add(&mut self, parent: NodeHandle, child: NodeHandle) -> bool {
        if parent == child {
            log::warn!("Cannot attach node to itself");
            return false;
        }
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            log::warn!("Attach skipped: node not found");
            return false;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Attach skipped: child is an ancestor of the new parent");
            return false;
        }

        self.remove_from_parent(child);

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        true
    }

    /// Detaches `child` from `parent`. A no-op if `child` is not a child of
    /// `parent`.
    pub fn remove(&mut self, parent: NodeHandle, child: NodeHandle) -> bool {
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let Some(pos) = parent_node.children.iter().position(|&c| c == child) else {
            return false;
        };
        parent_node.children.remove(pos);

        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }
        true
    }

    /// Detaches `child` from whatever parent it has.
    pub fn remove_from_parent(&mut self, child: NodeHandle) -> bool {
        match self.parent(child) {
            Some(parent) => self.remove(parent, child),
            None => false,
        }
    }

    #[must_use]
    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle).and_then(|n| n.parent)
    }

    #[must_use]
    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        self.nodes.get(handle).map_or(&[], |n| n.children.as_slice())
    }

    /// Whether `ancestor` is `node` or lies on its parent chain.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.parent(handle);
        }
        false
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Finds a node named `id` among the children of `root`, or anywhere
    /// below it when `recursive`.
    #[must_use]
    pub fn get_object_by_id(&self, root: NodeHandle, id: &str, recursive: bool) -> Option<NodeHandle> {
        for &child in self.children(root) {
            if self.nodes.get(child).is_some_and(|n| n.name == id) {
                return Some(child);
            }
            if recursive && let Some(found) = self.get_object_by_id(child, id, true) {
                return Some(found);
            }
        }
        None
    }

    /// All nodes below `root` in depth-first pre-order, excluding `root`.
    #[must_use]
    pub fn descendants(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeHandle> = self.children(root).iter().rev().copied().collect();
        while let Some(handle) = stack.pop() {
            out.push(handle);
            stack.extend(self.children(handle).iter().rev());
        }
        out
    }

    /// Visits `root`, then each of its direct children.
    pub fn traverse(&self, root: NodeHandle, mut visit: impl FnMut(NodeHandle, &Node)) {
        let Some(node) = self.nodes.get(root) else {
            return;
        };
        visit(root, node);
        for &child in &node.children {
            if let Some(child_node) = self.nodes.get(child) {
                visit(child, child_node);
            }
        }
    }

    /// Deep-copies the subtree at `root` and returns the detached copy.
    ///
    /// Name, transform, visibility, render phase and renderable are copied.
    /// Components and animation states hold closures and are not cloned; the
    /// copy starts without them.
    pub fn clone_subtree(&mut self, root: NodeHandle) -> Option<NodeHandle> {
        if !self.nodes.contains_key(root) {
            return None;
        }

        let mut copy_root = None;
        let mut stack: Vec<(NodeHandle, Option<NodeHandle>)> = vec![(root, None)];

        while let Some((source, new_parent)) = stack.pop() {
            let Some(node) = self.nodes.get(source) else {
                continue;
            };

            let mut copy = Node::new(node.name.clone());
            copy.transform = node.transform.clone();
            copy.visible = node.visible;
            copy.render_phase = node.render_phase;
            copy.renderable = node.renderable.clone();
            let children = node.children.clone();

            let handle = self.nodes.insert(copy);
            match new_parent {
                Some(parent) => {
                    self.add(parent, handle);
                }
                None => copy_root = Some(handle),
            }

            for child in children.into_iter().rev() {
                stack.push((child, Some(handle)));
            }
        }

        copy_root
    }

    // ========================================================================
    // Per-frame update
    // ========================================================================

    /// Runs components and animation for `root` and its subtree, depth-first.
    ///
    /// World matrices are not touched; call [`Self::update_world_matrices`]
    /// once all behaviour has run.
    pub fn update(&mut self, root: NodeHandle, ctx: &mut UpdateContext<'_>) -> Result<()> {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            self.update_node(handle, ctx)?;
            if let Some(node) = self.nodes.get(handle) {
                stack.extend(node.children.iter().rev());
            }
        }
        Ok(())
    }

    fn update_node(&mut self, handle: NodeHandle, ctx: &mut UpdateContext<'_>) -> Result<()> {
        // Components and the state machine are taken out of the node while
        // they run so they can borrow the graph mutably.
        let Some(node) = self.nodes.get_mut(handle) else {
            return Ok(());
        };
        let mut components = std::mem::take(&mut node.components);

        let mut result = Ok(());
        for component in &mut components {
            result = component.update(ctx, self, handle);
            if result.is_err() {
                break;
            }
        }

        if let Some(node) = self.nodes.get_mut(handle) {
            components.append(&mut node.components);
            node.components = components;
        }
        result?;

        let Some(node) = self.nodes.get_mut(handle) else {
            return Ok(());
        };
        let mut machine = std::mem::take(&mut node.animation);
        let result = machine.update(ctx, self);
        if let Some(node) = self.nodes.get_mut(handle) {
            node.animation = machine;
        }
        result?;

        Ok(())
    }

    /// Recomputes world matrices for every tree rooted at `roots`.
    pub fn update_world_matrices(&mut self, roots: &[NodeHandle]) {
        transform_system::update_hierarchy(&mut self.nodes, roots);
    }

    /// Recomputes world matrices below `node` only, starting from its parent's
    /// current world matrix.
    pub fn update_subtree_world_matrices(&mut self, node: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroy_removes_whole_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.create_node("root");
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        graph.add(root, a);
        graph.add(a, b);

        graph.destroy(a);

        assert!(graph.contains(root));
        assert!(!graph.contains(a));
        assert!(!graph.contains(b));
        assert!(graph.children(root).is_empty());
    }

    #[test]
    fn cycle_is_rejected() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        assert!(graph.add(a, b));
        assert!(!graph.add(b, a));
        assert_eq!(graph.parent(a), None);
    }
}
