//! Scene Integration Tests
//!
//! Tests for:
//! - SceneGraph: create/destroy nodes, attach/detach hierarchy, cycle rejection
//! - Queries: get_object_by_id, descendants, traverse, clone_subtree
//! - Components: closure components, tagged lookup, errors propagating
//! - Scene: layers, game objects, per-step update
//! - SoundComponent against a scripted sound service

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use arbor::engine::UpdateContext;
use arbor::errors::{AnimationError, EngineError, Result};
use arbor::scene::{FnComponent, RenderPhase, Scene, SceneGraph};
use arbor::services::{Input, SoundCallback, SoundComponent, SoundService};
use glam::Vec3;

// ============================================================================
// Hierarchy editing
// ============================================================================

#[test]
fn create_node_is_detached_root() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("a");

    assert_eq!(graph.len(), 1);
    let node = graph.get(node).unwrap();
    assert_eq!(node.name, "a");
    assert!(node.parent().is_none());
    assert!(node.children().is_empty());
    assert!(node.visible);
    assert_eq!(node.render_phase, RenderPhase::Standard);
}

#[test]
fn add_links_both_sides() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_node("parent");
    let child = graph.create_node("child");

    assert!(graph.add(parent, child));
    assert_eq!(graph.children(parent), &[child]);
    assert_eq!(graph.parent(child), Some(parent));
}

#[test]
fn reattach_detaches_from_old_parent_exactly_once() {
    let mut graph = SceneGraph::new();
    let old_parent = graph.create_node("old");
    let new_parent = graph.create_node("new");
    let sibling = graph.create_node("sibling");
    let child = graph.create_node("child");

    graph.add(old_parent, sibling);
    graph.add(old_parent, child);
    graph.add(new_parent, child);

    assert_eq!(graph.children(old_parent), &[sibling]);
    assert_eq!(graph.children(new_parent), &[child]);
    assert_eq!(graph.parent(child), Some(new_parent));

    let memberships = graph
        .iter()
        .filter(|(_, node)| node.children().contains(&child))
        .count();
    assert_eq!(memberships, 1);
}

#[test]
fn add_to_same_parent_moves_child_to_end() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_node("parent");
    let a = graph.create_node("a");
    let b = graph.create_node("b");
    graph.add(parent, a);
    graph.add(parent, b);
    graph.add(parent, a);

    assert_eq!(graph.children(parent), &[b, a]);
}

#[test]
fn add_rejects_self_and_cycles() {
    let mut graph = SceneGraph::new();
    let root = graph.create_node("root");
    let child = graph.create_node("child");
    let grandchild = graph.create_node("grandchild");
    graph.add(root, child);
    graph.add(child, grandchild);

    assert!(!graph.add(root, root));
    assert!(!graph.add(grandchild, root));
    assert_eq!(graph.parent(root), None);
    assert_eq!(graph.parent(grandchild), Some(child));
}

#[test]
fn remove_only_detaches_direct_children() {
    let mut graph = SceneGraph::new();
    let root = graph.create_node("root");
    let child = graph.create_node("child");
    let grandchild = graph.create_node("grandchild");
    graph.add(root, child);
    graph.add(child, grandchild);

    assert!(!graph.remove(root, grandchild));
    assert!(graph.remove(child, grandchild));
    assert!(graph.parent(grandchild).is_none());
    assert!(!graph.remove_from_parent(grandchild));
    assert!(graph.remove_from_parent(child));
    assert!(graph.children(root).is_empty());
}

#[test]
fn destroy_removes_subtree_and_parent_link() {
    let mut graph = SceneGraph::new();
    let root = graph.create_node("root");
    let child = graph.create_node("child");
    let grandchild = graph.create_node("grandchild");
    graph.add(root, child);
    graph.add(child, grandchild);

    graph.destroy(child);

    assert_eq!(graph.len(), 1);
    assert!(graph.children(root).is_empty());
    assert!(!graph.contains(grandchild));
}

// ============================================================================
// Queries
// ============================================================================

fn sample_tree(graph: &mut SceneGraph) -> [arbor::scene::NodeHandle; 5] {
    let root = graph.create_node("root");
    let a = graph.create_node("a");
    let b = graph.create_node("b");
    let a1 = graph.create_node("a1");
    let a2 = graph.create_node("target");
    graph.add(root, a);
    graph.add(root, b);
    graph.add(a, a1);
    graph.add(a, a2);
    [root, a, b, a1, a2]
}

#[test]
fn get_object_by_id_respects_recursion_flag() {
    let mut graph = SceneGraph::new();
    let [root, _, b, _, target] = sample_tree(&mut graph);

    assert_eq!(graph.get_object_by_id(root, "b", false), Some(b));
    assert_eq!(graph.get_object_by_id(root, "target", false), None);
    assert_eq!(graph.get_object_by_id(root, "target", true), Some(target));
    assert_eq!(graph.get_object_by_id(root, "missing", true), None);
}

#[test]
fn descendants_are_pre_order_without_root() {
    let mut graph = SceneGraph::new();
    let [root, a, b, a1, a2] = sample_tree(&mut graph);

    assert_eq!(graph.descendants(root), vec![a, a1, a2, b]);
}

#[test]
fn traverse_visits_node_then_direct_children() {
    let mut graph = SceneGraph::new();
    let [root, a, b, _, _] = sample_tree(&mut graph);

    let mut visited = Vec::new();
    graph.traverse(root, |handle, _| visited.push(handle));
    assert_eq!(visited, vec![root, a, b]);
}

#[test]
fn clone_subtree_copies_structure_and_transforms() {
    let mut graph = SceneGraph::new();
    let [_, a, _, _, _] = sample_tree(&mut graph);
    graph.transform_mut(a).unwrap().position = Vec3::new(1.0, 2.0, 3.0);
    graph.get_mut(a).unwrap().render_phase = RenderPhase::Alpha;

    let copy = graph.clone_subtree(a).unwrap();

    assert_ne!(copy, a);
    assert!(graph.parent(copy).is_none());
    let node = graph.get(copy).unwrap();
    assert_eq!(node.name, "a");
    assert_eq!(node.transform.position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(node.render_phase, RenderPhase::Alpha);

    let names: Vec<_> = graph
        .children(copy)
        .iter()
        .map(|&c| graph.get(c).unwrap().name.clone())
        .collect();
    assert_eq!(names, vec!["a1", "target"]);
    assert_eq!(graph.len(), 8);
}

// ============================================================================
// Components
// ============================================================================

#[test]
fn components_run_in_order_each_step() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("mover");
    let log = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&log);
    graph.get_mut(node).unwrap().add_component(FnComponent::new(
        move |ctx: &mut UpdateContext<'_>, graph: &mut SceneGraph, handle| {
            first.borrow_mut().push("first");
            graph.transform_mut(handle).unwrap().position.x += ctx.delta_seconds;
            Ok(())
        },
    ));
    let second = Rc::clone(&log);
    graph.get_mut(node).unwrap().add_component(FnComponent::new(
        move |_: &mut UpdateContext<'_>, _: &mut SceneGraph, _| {
            second.borrow_mut().push("second");
            Ok(())
        },
    ));

    let input = Input::new();
    let mut ctx = UpdateContext::new(0.5, &input);
    graph.update(node, &mut ctx).unwrap();
    graph.update(node, &mut ctx).unwrap();

    assert_eq!(*log.borrow(), vec!["first", "second", "first", "second"]);
    assert_eq!(graph.get(node).unwrap().transform.position.x, 1.0);
}

#[test]
fn component_may_add_children_during_update() {
    let mut graph = SceneGraph::new();
    let root = graph.create_node("root");
    let spawned = Rc::new(Cell::new(false));

    let flag = Rc::clone(&spawned);
    graph.get_mut(root).unwrap().add_component(FnComponent::new(
        move |_: &mut UpdateContext<'_>, graph: &mut SceneGraph, handle| {
            if !flag.get() {
                let child = graph.create_node("spawned");
                graph.add(handle, child);
                flag.set(true);
            }
            Ok(())
        },
    ));

    let input = Input::new();
    let mut ctx = UpdateContext::new(0.1, &input);
    graph.update(root, &mut ctx).unwrap();

    assert_eq!(graph.children(root).len(), 1);
    assert_eq!(graph.get(root).unwrap().component_count(), 1);
}

#[test]
fn find_component_filters_by_type_and_tag() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("node");
    let n = graph.get_mut(node).unwrap();
    n.add_component(SoundComponent::new("boom"));
    n.add_component(
        FnComponent::new(|_: &mut UpdateContext<'_>, _: &mut SceneGraph, _| Ok(())).with_tag("spin"),
    );

    let sound = n.find_component::<SoundComponent>(Some(SoundComponent::TAG)).unwrap();
    assert_eq!(sound.resource, "boom");
    assert!(n.find_component::<SoundComponent>(Some("spin")).is_none());
    assert!(n.find_component::<SoundComponent>(None).is_some());

    n.find_component_mut::<SoundComponent>(None).unwrap().auto_remove = false;
    assert!(!n.find_component::<SoundComponent>(None).unwrap().auto_remove);
}

#[test]
fn component_error_propagates_out_of_update() {
    let mut scene = Scene::new();
    let node = scene.graph.create_node("broken");
    scene.graph.get_mut(node).unwrap().add_component(FnComponent::new(
        |_: &mut UpdateContext<'_>, _: &mut SceneGraph, _| -> Result<()> {
            Err(AnimationError::UnknownState("walk".into()).into())
        },
    ));
    scene.add_game_object(node, 0);

    let input = Input::new();
    let mut ctx = UpdateContext::new(0.1, &input);
    let err = scene.update(&mut ctx).unwrap_err();

    assert!(matches!(
        err,
        EngineError::Animation(AnimationError::UnknownState(ref name)) if name == "walk"
    ));
    assert_eq!(scene.graph.get(node).unwrap().component_count(), 1);
}

// ============================================================================
// Scene layers
// ============================================================================

#[test]
fn add_game_object_creates_missing_layers() {
    let mut scene = Scene::new();
    let node = scene.graph.create_node("hud");

    scene.add_game_object(node, 2);

    assert_eq!(scene.layers().len(), 3);
    let layer2 = scene.layer(2).unwrap();
    assert_eq!(scene.graph.parent(node), Some(layer2));
    assert_eq!(scene.get_object_by_id("hud"), Some(node));
}

#[test]
fn remove_game_object_detaches_from_layer() {
    let mut scene = Scene::new();
    let node = scene.graph.create_node("enemy");
    scene.add_game_object(node, 0);

    assert!(scene.remove_game_object(node));
    assert!(!scene.remove_game_object(node));
    assert!(scene.get_object_by_id("enemy").is_none());
    assert!(scene.graph.contains(node));
}

#[test]
fn scene_update_resolves_world_matrices() {
    let mut scene = Scene::new();
    let parent = scene.graph.create_node("parent");
    let child = scene.graph.create_node("child");
    scene.graph.add(parent, child);
    scene.graph.transform_mut(parent).unwrap().position = Vec3::new(0.0, 1.0, 0.0);
    scene.graph.transform_mut(child).unwrap().position = Vec3::new(2.0, 0.0, 0.0);
    scene.add_game_object(parent, 0);

    let input = Input::new();
    let mut ctx = UpdateContext::new(1.0 / 30.0, &input);
    scene.update(&mut ctx).unwrap();

    let world = scene.graph.world_matrix(child).unwrap();
    assert!(Vec3::from(world.translation).abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), 1e-6));
}

// ============================================================================
// SoundComponent
// ============================================================================

#[derive(Default)]
struct ScriptedSound {
    played: Rc<RefCell<Vec<String>>>,
    pending: Rc<RefCell<Vec<SoundCallback>>>,
}

impl SoundService for ScriptedSound {
    fn load_effect(&mut self, _name: &str, _bytes: Vec<u8>) -> Result<()> {
        Ok(())
    }

    fn play(&mut self, name: &str, on_complete: Option<SoundCallback>) {
        self.played.borrow_mut().push(name.to_owned());
        if let Some(callback) = on_complete {
            self.pending.borrow_mut().push(callback);
        }
    }
}

#[test]
fn sound_component_plays_once_and_removes_node_when_finished() {
    let mut graph = SceneGraph::new();
    let root = graph.create_node("root");
    let effect = graph.create_node("explosion");
    graph.add(root, effect);
    graph
        .get_mut(effect)
        .unwrap()
        .add_component(SoundComponent::new("boom"));

    let mut sound = ScriptedSound::default();
    let played = Rc::clone(&sound.played);
    let pending = Rc::clone(&sound.pending);
    let input = Input::new();

    for _ in 0..3 {
        let mut ctx = UpdateContext::new(0.1, &input).with_sound(&mut sound);
        graph.update(root, &mut ctx).unwrap();
    }
    assert_eq!(*played.borrow(), vec!["boom".to_owned()]);
    assert_eq!(graph.parent(effect), Some(root));

    for callback in pending.borrow_mut().drain(..) {
        callback();
    }
    let mut ctx = UpdateContext::new(0.1, &input).with_sound(&mut sound);
    graph.update(root, &mut ctx).unwrap();

    assert!(graph.children(root).is_empty());
    assert!(graph.contains(effect));
}

#[test]
fn sound_component_without_auto_start_waits_for_start() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("speaker");
    let mut component = SoundComponent::new("chime");
    component.auto_start = false;
    graph.get_mut(node).unwrap().add_component(component);

    let mut sound = ScriptedSound::default();
    let played = Rc::clone(&sound.played);
    let input = Input::new();

    let mut ctx = UpdateContext::new(0.1, &input).with_sound(&mut sound);
    graph.update(node, &mut ctx).unwrap();
    assert!(played.borrow().is_empty());

    graph
        .get_mut(node)
        .unwrap()
        .find_component_mut::<SoundComponent>(None)
        .unwrap()
        .start();
    let mut ctx = UpdateContext::new(0.1, &input).with_sound(&mut sound);
    graph.update(node, &mut ctx).unwrap();

    assert_eq!(*played.borrow(), vec!["chime".to_owned()]);
    assert!(
        graph
            .get(node)
            .unwrap()
            .find_component::<SoundComponent>(None)
            .unwrap()
            .is_started()
    );
}
