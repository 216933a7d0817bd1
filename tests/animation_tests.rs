//! Animation System Tests
//!
//! Tests for:
//! - KeyframeTrack sampling, clamping and validation
//! - AnimationChannel value lookup and weighted application
//! - AnimationState wrap modes (None, Loop, Bounce) and time scale
//! - AnimationAction edge-triggered cues
//! - AnimationStateMachine transitions, cross-fade weights and callbacks

use std::cell::{Cell, RefCell};
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use arbor::animation::{
    AnimationAction, AnimationChannel, AnimationState, AnimationStateMachine, ChannelValue,
    DEFAULT_ACTION_SLOP, InterpolationMode, KeyframeTrack, MachineStatus, WrapMode,
};
use arbor::engine::UpdateContext;
use arbor::errors::AnimationError;
use arbor::scene::transform::Transform;
use arbor::scene::{NodeHandle, SceneGraph};
use arbor::services::Input;
use glam::{Quat, Vec3};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn translation_state(duration: f32, wrap_mode: WrapMode) -> AnimationState {
    let channel = AnimationChannel::translation(
        NodeHandle::default(),
        vec![0.0, duration],
        vec![Vec3::ZERO, Vec3::new(duration, 0.0, 0.0)],
    )
    .unwrap();
    AnimationState::with_channels(vec![channel]).with_wrap_mode(wrap_mode)
}

/// Runs `steps` updates of `dt` seconds on `graph`'s node `node`.
fn run_machine(graph: &mut SceneGraph, node: NodeHandle, dt: f32, steps: usize) {
    let input = Input::new();
    for _ in 0..steps {
        let mut ctx = UpdateContext::new(dt, &input);
        graph.update(node, &mut ctx).unwrap();
    }
}

// ============================================================================
// KeyframeTrack
// ============================================================================

#[test]
fn track_linear_interpolates_between_keys() {
    let track = KeyframeTrack::new(vec![0.0, 1.0, 3.0], vec![0.0_f32, 10.0, 30.0], InterpolationMode::Linear)
        .unwrap();
    assert!(approx(track.sample(0.5), 5.0));
    assert!(approx(track.sample(2.0), 20.0));
    assert!(approx(track.sample(1.0), 10.0));
    assert!(approx(track.duration(), 3.0));
}

#[test]
fn track_clamps_outside_range() {
    let track =
        KeyframeTrack::new(vec![1.0, 2.0], vec![4.0_f32, 8.0], InterpolationMode::Linear).unwrap();
    assert!(approx(track.sample(-5.0), 4.0));
    assert!(approx(track.sample(0.0), 4.0));
    assert!(approx(track.sample(100.0), 8.0));
    assert!(track.sample(f32::MAX).is_finite());
}

#[test]
fn track_step_holds_previous_key() {
    let track =
        KeyframeTrack::new(vec![0.0, 1.0], vec![1.0_f32, 2.0], InterpolationMode::Step).unwrap();
    assert!(approx(track.sample(0.99), 1.0));
    assert!(approx(track.sample(1.0), 2.0));
}

#[test]
fn track_rejects_mismatched_and_empty_inputs() {
    let err = KeyframeTrack::new(vec![0.0, 1.0], vec![1.0_f32], InterpolationMode::Linear).unwrap_err();
    assert_eq!(
        err,
        AnimationError::MismatchedKeyframes {
            keyframes: 2,
            values: 1
        }
    );

    let err = KeyframeTrack::<f32>::new(vec![], vec![], InterpolationMode::Linear).unwrap_err();
    assert_eq!(err, AnimationError::EmptyTrack);
}

#[test]
fn single_key_track_is_constant() {
    let track = KeyframeTrack::new(vec![0.5], vec![Vec3::ONE], InterpolationMode::Linear).unwrap();
    assert_eq!(track.sample(0.0), Vec3::ONE);
    assert_eq!(track.sample(9.0), Vec3::ONE);
}

// ============================================================================
// AnimationChannel
// ============================================================================

#[test]
fn channel_value_at_zero_and_past_duration() {
    let values = vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(5.0, 5.0, 5.0), Vec3::new(-1.0, 0.0, 9.0)];
    let channel =
        AnimationChannel::translation(NodeHandle::default(), vec![0.0, 1.0, 2.0], values.clone()).unwrap();

    assert_eq!(channel.get_value(0.0), ChannelValue::Translation(values[0]));
    assert_eq!(channel.get_value(2.0), ChannelValue::Translation(values[2]));
    assert_eq!(channel.get_value(50.0), ChannelValue::Translation(values[2]));
}

#[test]
fn channel_constructor_rejects_mismatched_counts() {
    let err = AnimationChannel::scale(NodeHandle::default(), vec![0.0, 1.0, 2.0], vec![Vec3::ONE])
        .unwrap_err();
    assert!(matches!(err, AnimationError::MismatchedKeyframes { keyframes: 3, values: 1 }));
}

#[test]
fn rotation_channel_slerp_endpoints_and_unit_length() {
    let a = Quat::from_rotation_y(0.2);
    let b = Quat::from_rotation_x(FRAC_PI_2) * Quat::from_rotation_z(1.0);
    let channel = AnimationChannel::rotation(NodeHandle::default(), vec![0.0, 1.0], vec![a, b]).unwrap();

    let ChannelValue::Rotation(start) = channel.get_value(0.0) else {
        panic!("expected rotation");
    };
    let ChannelValue::Rotation(end) = channel.get_value(1.0) else {
        panic!("expected rotation");
    };
    assert!(start.abs_diff_eq(a, EPSILON));
    assert!(end.dot(b).abs() > 1.0 - EPSILON);

    for i in 0..=20 {
        let ChannelValue::Rotation(q) = channel.get_value(i as f32 / 20.0) else {
            panic!("expected rotation");
        };
        assert!(approx(q.length(), 1.0), "non-unit quaternion at step {i}");
    }
}

#[test]
fn rotation_channel_takes_shortest_path() {
    let a = Quat::from_rotation_z(0.1);
    let b = -Quat::from_rotation_z(0.3);
    let channel = AnimationChannel::rotation(NodeHandle::default(), vec![0.0, 1.0], vec![a, b]).unwrap();
    let ChannelValue::Rotation(mid) = channel.get_value(0.5) else {
        panic!("expected rotation");
    };
    assert!(mid.dot(Quat::from_rotation_z(0.2)).abs() > 1.0 - EPSILON);
}

#[test]
fn channel_apply_blends_by_weight() {
    let mut transform = Transform::new();
    AnimationChannel::apply(ChannelValue::Translation(Vec3::new(10.0, 0.0, 0.0)), 0.25, &mut transform);
    assert!(transform.position.abs_diff_eq(Vec3::new(2.5, 0.0, 0.0), EPSILON));

    AnimationChannel::apply(ChannelValue::Scale(Vec3::splat(3.0)), 1.0, &mut transform);
    assert_eq!(transform.scale, Vec3::splat(3.0));

    let target = Quat::from_rotation_y(1.0);
    AnimationChannel::apply(ChannelValue::Rotation(target), 0.5, &mut transform);
    assert!(transform.rotation.dot(Quat::from_rotation_y(0.5)).abs() > 1.0 - EPSILON);
}

#[test]
fn channel_evaluate_ignores_missing_target() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("gone");
    let channel =
        AnimationChannel::translation(node, vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::ONE]).unwrap();
    graph.destroy(node);

    channel.evaluate(0.5, 1.0, &mut graph);
    assert!(graph.is_empty());
}

// ============================================================================
// AnimationState wrap modes
// ============================================================================

#[test]
fn loop_wraps_elapsed_time() {
    let mut state = translation_state(2.0, WrapMode::Loop);
    let (_, t) = state.advance(5.0);
    assert!(approx(t, 1.0));
    assert!(approx(state.time(), 1.0));
    assert!(approx(state.total_time(), 5.0));
}

#[test]
fn loop_keeps_exact_end_time() {
    let mut state = translation_state(2.0, WrapMode::Loop);
    state.advance(2.0);
    assert!(approx(state.time(), 2.0));
}

#[test]
fn bounce_reflects_past_end() {
    let mut state = translation_state(2.0, WrapMode::Bounce);
    let (_, t) = state.advance(3.0);
    assert!(approx(t, 1.0));

    let mut state = translation_state(2.0, WrapMode::Bounce);
    state.advance(1.5);
    state.advance(3.0);
    assert!(approx(state.time(), 0.5));
}

#[test]
fn none_clamps_to_duration() {
    let mut state = translation_state(2.0, WrapMode::None);
    state.advance(1.0);
    state.advance(10.0);
    assert!(approx(state.time(), 2.0));
}

#[test]
fn duration_is_longest_channel() {
    let mut state = translation_state(2.0, WrapMode::Loop);
    state.add_channel(
        AnimationChannel::scale(NodeHandle::default(), vec![0.0, 3.5], vec![Vec3::ONE, Vec3::ONE]).unwrap(),
    );
    assert!(approx(state.duration(), 3.5));
}

#[test]
fn state_update_drives_target_node() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("box");
    let channel = AnimationChannel::translation(
        node,
        vec![0.0, 2.0],
        vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)],
    )
    .unwrap();
    let mut state = AnimationState::with_channels(vec![channel]).with_wrap_mode(WrapMode::Loop);

    let input = Input::new();
    let mut ctx = UpdateContext::new(0.5, &input);
    state.update(&mut ctx, 1.0, &mut graph);

    let position = graph.get(node).unwrap().transform.position;
    assert!(position.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPSILON));
}

#[test]
fn time_scale_speeds_up_playback() {
    let mut state = translation_state(4.0, WrapMode::None);
    state.time_scale = 2.0;
    state.advance(1.5);
    assert!(approx(state.time(), 3.0));
    assert!(approx(state.total_time(), 1.5));
}

// ============================================================================
// AnimationAction
// ============================================================================

#[test]
fn action_fires_once_while_inside_slop_window() {
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);

    let mut state = translation_state(4.0, WrapMode::None);
    state.add_action(AnimationAction::new(2.2, move |_| counter.set(counter.get() + 1)));
    assert!(approx(state.actions()[0].slop(), DEFAULT_ACTION_SLOP));

    let mut graph = SceneGraph::new();
    let input = Input::new();
    for _ in 0..360 {
        let mut ctx = UpdateContext::new(1.0 / 120.0, &input);
        state.update(&mut ctx, 1.0, &mut graph);
    }

    assert_eq!(fired.get(), 1);
}

#[test]
fn action_fires_when_step_jumps_over_window() {
    let input = Input::new();
    let mut ctx = UpdateContext::new(0.0, &input);
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    let mut action = AnimationAction::new(1.0, move |_| counter.set(counter.get() + 1));

    assert!(!action.process(0.0, 0.5, &mut ctx));
    assert!(action.process(0.5, 1.5, &mut ctx));
    assert!(!action.process(1.5, 2.0, &mut ctx));
    assert_eq!(fired.get(), 1);
}

#[test]
fn action_rearms_after_leaving_window() {
    let input = Input::new();
    let mut ctx = UpdateContext::new(0.0, &input);
    let mut action = AnimationAction::new(1.0, |_| {}).with_slop(0.1);

    assert!(action.process(0.85, 0.95, &mut ctx));
    assert!(action.is_applied());
    assert!(!action.process(0.95, 1.05, &mut ctx));
    assert!(!action.process(1.05, 0.2, &mut ctx));
    assert!(!action.is_applied());
    assert!(action.process(0.2, 1.0, &mut ctx));
}

#[test]
fn looping_state_retriggers_action_each_cycle() {
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);

    let mut state = translation_state(1.0, WrapMode::Loop);
    state.add_action(AnimationAction::new(0.5, move |_| counter.set(counter.get() + 1)).with_slop(0.05));

    let mut graph = SceneGraph::new();
    let input = Input::new();
    for _ in 0..30 {
        let mut ctx = UpdateContext::new(0.125, &input);
        state.update(&mut ctx, 1.0, &mut graph);
    }

    // 3.75 s of a 1 s loop lands on 0.5 four times.
    assert_eq!(fired.get(), 4);
}

#[test]
fn action_at_clip_start_fires_when_loop_wraps() {
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);

    let mut state = translation_state(1.0, WrapMode::Loop);
    state.add_action(AnimationAction::new(0.0, move |_| counter.set(counter.get() + 1)));

    let mut graph = SceneGraph::new();
    let input = Input::new();
    for _ in 0..24 {
        let mut ctx = UpdateContext::new(0.125, &input);
        state.update(&mut ctx, 1.0, &mut graph);
    }

    // Wraps 1.0 -> 0.125 at 1.125 s and 2.125 s, never landing on 0.0.
    assert_eq!(fired.get(), 2);
}

#[test]
fn wrapped_step_fires_cue_at_clip_end_once() {
    let input = Input::new();
    let mut ctx = UpdateContext::new(0.0, &input);
    let mut action = AnimationAction::new(1.0, |_| {});

    assert!(action.process_wrapped(0.9, 0.1, 1.0, &mut ctx));
    assert!(!action.process(0.1, 0.2, &mut ctx));
}

// ============================================================================
// AnimationStateMachine
// ============================================================================

#[test]
fn machine_is_idle_without_initial_state() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("idle");
    graph
        .get_mut(node)
        .unwrap()
        .animation
        .register_state("a", AnimationState::new());

    run_machine(&mut graph, node, 0.1, 3);

    let machine = &graph.get(node).unwrap().animation;
    assert_eq!(machine.status(), MachineStatus::Idle);
    assert!(machine.current_state().is_none());
}

#[test]
fn machine_enters_initial_state_on_first_update() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("walker");
    let entered = Rc::new(Cell::new(0));

    let counter = Rc::clone(&entered);
    let mut walk = AnimationState::new();
    walk.set_on_enter(move || counter.set(counter.get() + 1));

    let machine = &mut graph.get_mut(node).unwrap().animation;
    machine.register_state("walk", walk);
    machine.set_initial_state("walk");

    run_machine(&mut graph, node, 0.1, 3);

    let machine = &graph.get(node).unwrap().animation;
    assert_eq!(machine.status(), MachineStatus::Playing("walk"));
    assert_eq!(entered.get(), 1);
}

#[test]
fn machine_with_unregistered_initial_state_fails() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("broken");
    graph.get_mut(node).unwrap().animation.set_initial_state("ghost");

    let input = Input::new();
    let mut ctx = UpdateContext::new(0.1, &input);
    let err = graph.update(node, &mut ctx).unwrap_err();
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn register_transition_requires_known_states() {
    let mut machine = AnimationStateMachine::new();
    machine.register_state("a", AnimationState::new());

    let err = machine
        .register_transition("a", "b", 1.0, |_, _, _| true)
        .unwrap_err();
    assert_eq!(err, AnimationError::UnknownState("b".into()));
    assert_eq!(
        machine.transition_to("nowhere", 0.0),
        Err(AnimationError::UnknownState("nowhere".into()))
    );
}

#[test]
fn predicate_transition_cross_fades_and_fires_callbacks_once() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("actor");
    let events = Rc::new(RefCell::new(Vec::new()));

    let mut a = AnimationState::new();
    let log = Rc::clone(&events);
    a.set_on_enter(move || log.borrow_mut().push("enter a"));
    let log = Rc::clone(&events);
    a.set_on_exit(move || log.borrow_mut().push("exit a"));

    let mut b = AnimationState::new();
    let log = Rc::clone(&events);
    b.set_on_enter(move || log.borrow_mut().push("enter b"));
    let log = Rc::clone(&events);
    b.set_on_exit(move || log.borrow_mut().push("exit b"));

    let machine = &mut graph.get_mut(node).unwrap().animation;
    machine.register_state("a", a);
    machine.register_state("b", b);
    machine.set_initial_state("a");
    machine
        .register_transition("a", "b", 1.0, |elapsed, _, _| elapsed > 5.0)
        .unwrap();

    // 20 steps reach exactly 5.0 s, which does not satisfy `> 5`.
    run_machine(&mut graph, node, 0.25, 20);
    assert_eq!(graph.get(node).unwrap().animation.status(), MachineStatus::Playing("a"));

    run_machine(&mut graph, node, 0.25, 1);
    let machine = &graph.get(node).unwrap().animation;
    assert_eq!(machine.status(), MachineStatus::Transitioning { from: "a", to: "b" });
    assert_eq!(machine.transition_weight(), Some(0.0));

    run_machine(&mut graph, node, 0.25, 2);
    let weight = graph.get(node).unwrap().animation.transition_weight().unwrap();
    assert!(approx(weight, 0.5));

    run_machine(&mut graph, node, 0.25, 2);
    let machine = &graph.get(node).unwrap().animation;
    assert_eq!(machine.status(), MachineStatus::Playing("b"));
    assert_eq!(machine.current_state(), Some("b"));
    assert!(!machine.is_transitioning());

    assert_eq!(*events.borrow(), vec!["enter a", "exit a", "enter b"]);
}

#[test]
fn cross_fade_blends_channel_values() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("slider");

    let left = AnimationChannel::translation(node, vec![0.0], vec![Vec3::ZERO]).unwrap();
    let right = AnimationChannel::translation(node, vec![0.0], vec![Vec3::new(8.0, 0.0, 0.0)]).unwrap();

    let machine = &mut graph.get_mut(node).unwrap().animation;
    machine.register_state("left", AnimationState::with_channels(vec![left]));
    machine.register_state("right", AnimationState::with_channels(vec![right]));
    machine.set_initial_state("left");

    run_machine(&mut graph, node, 0.25, 1);
    graph
        .get_mut(node)
        .unwrap()
        .animation
        .transition_to("right", 1.0)
        .unwrap();

    run_machine(&mut graph, node, 0.25, 1);
    let x = graph.get(node).unwrap().transform.position.x;
    assert!(approx(x, 2.0), "expected quarter blend, got {x}");
}

#[test]
fn zero_duration_transition_is_immediate_cut() {
    let mut machine = AnimationStateMachine::new();
    machine.register_state("a", AnimationState::new());
    machine.register_state("b", AnimationState::new());
    machine.transition_to("a", 0.0).unwrap();

    machine.transition_to("b", 0.0).unwrap();

    assert_eq!(machine.status(), MachineStatus::Playing("b"));
    assert!(machine.transition_weight().is_none());
}

#[test]
fn predicates_are_not_evaluated_mid_transition() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("actor");
    let checks = Rc::new(Cell::new(0));

    let machine = &mut graph.get_mut(node).unwrap().animation;
    machine.register_state("a", AnimationState::new());
    machine.register_state("b", AnimationState::new());
    machine.set_initial_state("a");
    let counter = Rc::clone(&checks);
    machine
        .register_transition("a", "b", 10.0, move |_, _, _| {
            counter.set(counter.get() + 1);
            true
        })
        .unwrap();

    run_machine(&mut graph, node, 0.1, 20);

    assert_eq!(checks.get(), 1);
    assert!(graph.get(node).unwrap().animation.is_transitioning());
}

#[test]
fn forced_transition_mid_flight_replaces_target() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut machine = AnimationStateMachine::new();
    for name in ["a", "b", "c"] {
        let mut state = AnimationState::new();
        let log = Rc::clone(&events);
        state.set_on_enter(move || log.borrow_mut().push(format!("enter {name}")));
        let log = Rc::clone(&events);
        state.set_on_exit(move || log.borrow_mut().push(format!("exit {name}")));
        machine.register_state(name, state);
    }

    machine.transition_to("a", 0.0).unwrap();
    machine.transition_to("b", 1.0).unwrap();
    machine.transition_to("c", 1.0).unwrap();

    assert_eq!(machine.status(), MachineStatus::Transitioning { from: "a", to: "c" });
    assert_eq!(
        *events.borrow(),
        vec!["enter a", "exit a", "enter b", "exit b", "enter c"]
    );
}

#[test]
fn transition_resets_incoming_state_clock() {
    let mut graph = SceneGraph::new();
    let node = graph.create_node("actor");
    let machine = &mut graph.get_mut(node).unwrap().animation;
    machine.register_state("a", translation_state(10.0, WrapMode::Loop));
    machine.register_state("b", translation_state(10.0, WrapMode::Loop));
    machine.set_initial_state("b");

    run_machine(&mut graph, node, 0.5, 4);
    let machine = &mut graph.get_mut(node).unwrap().animation;
    assert!(approx(machine.state("b").unwrap().time(), 2.0));

    machine.transition_to("a", 0.0).unwrap();
    machine.transition_to("b", 0.0).unwrap();
    assert!(approx(machine.state("b").unwrap().time(), 0.0));
}
