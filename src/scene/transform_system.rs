//! Transform System
//!
//! Resolves world matrices for the node hierarchy. Decoupled from
//! [`SceneGraph`](crate::scene::SceneGraph) so it only borrows the node arena.
//!
//! Every visited node rebuilds its local matrix from TRS and then sets
//! `world = parent.world * local` (`world = local` at a root), in a single
//! top-down pass. Parents are always resolved before their children, so
//! children observe their parent's current-frame matrix.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::NodeHandle;
use crate::scene::node::Node;

/// Updates world matrices for every tree rooted at `roots`.
///
/// Uses an explicit stack instead of recursion so deep hierarchies cannot
/// overflow the call stack.
pub fn update_hierarchy(nodes: &mut SlotMap<NodeHandle, Node>, roots: &[NodeHandle]) {
    let mut stack: Vec<(NodeHandle, Option<Affine3A>)> = Vec::with_capacity(64);

    for &root in roots.iter().rev() {
        stack.push((root, None));
    }

    run(nodes, &mut stack);
}

/// Updates the subtree rooted at `root`, starting from its parent's current
/// world matrix (or as a root when it has none).
pub fn update_subtree(nodes: &mut SlotMap<NodeHandle, Node>, root: NodeHandle) {
    let Some(node) = nodes.get(root) else {
        return;
    };

    let parent_world = node
        .parent
        .and_then(|parent| nodes.get(parent))
        .and_then(|parent| parent.transform.world_matrix);

    let mut stack = vec![(root, parent_world)];
    run(nodes, &mut stack);
}

fn run(nodes: &mut SlotMap<NodeHandle, Node>, stack: &mut Vec<(NodeHandle, Option<Affine3A>)>) {
    while let Some((handle, parent_world)) = stack.pop() {
        let Some(node) = nodes.get_mut(handle) else {
            continue;
        };

        let local = node.transform.update_local_matrix();
        let world = match parent_world {
            Some(parent) => parent * local,
            None => local,
        };
        node.transform.set_world_matrix(world);

        // Reverse push keeps children in declaration order.
        for &child in node.children.iter().rev() {
            stack.push((child, Some(world)));
        }
    }
}
