//! Animation State Machine
//!
//! Each node owns one [`AnimationStateMachine`]. It holds named
//! [`AnimationState`]s, predicated transitions between them, and blends from
//! the current state into the next one during a transition.
//!
//! # Lifecycle
//!
//! - **Idle**: no state is active. The first update enters the initial state
//!   if one is configured; otherwise the machine stays idle.
//! - **Playing(S)**: `S` plays at full weight. After each update the
//!   transitions leaving `S` are tested in registration order and the first
//!   predicate that holds starts a transition.
//! - **Transitioning(S -> S')**: `S` keeps playing at weight 1 while `S'` is
//!   layered on top with weight `min(elapsed / duration, 1)`. Predicates are not
//!   evaluated. Once `elapsed >= duration`, `S'` becomes the current state.
//!
//! [`AnimationStateMachine::transition_to`] forces a transition from any
//! lifecycle stage. When called mid-transition it replaces the pending target.
//! A duration of zero is an immediate cut.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::animation::state::AnimationState;
use crate::engine::UpdateContext;
use crate::errors::AnimationError;
use crate::scene::graph::SceneGraph;

/// Transition predicate: `(time in state, state duration, context) -> fire?`
pub type TransitionPredicate = Box<dyn Fn(f32, f32, &UpdateContext<'_>) -> bool>;

/// A predicated edge between two states.
pub struct AnimationTransition {
    from: String,
    to: String,
    duration: f32,
    predicate: TransitionPredicate,
}

impl AnimationTransition {
    #[must_use]
    pub fn from(&self) -> &str {
        &self.from
    }

    #[must_use]
    pub fn to(&self) -> &str {
        &self.to
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }
}

impl fmt::Debug for AnimationTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationTransition")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct PendingTransition {
    to: String,
    duration: f32,
    elapsed: f32,
}

/// Observable stage of a state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineStatus<'a> {
    Idle,
    Playing(&'a str),
    Transitioning { from: &'a str, to: &'a str },
}

#[derive(Default)]
pub struct AnimationStateMachine {
    states: FxHashMap<String, AnimationState>,
    transitions: FxHashMap<String, SmallVec<[AnimationTransition; 2]>>,
    current: Option<String>,
    pending: Option<PendingTransition>,
    initial_state: Option<String>,
}

impl AnimationStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers `state` under `name`, replacing any state with that name.
    pub fn register_state(&mut self, name: impl Into<String>, state: AnimationState) {
        let name = name.into();
        if self.states.insert(name.clone(), state).is_some() {
            log::warn!("Animation state '{name}' replaced");
        }
    }

    /// Adds a transition from `from` to `to`. Both states must already be
    /// registered.
    pub fn register_transition(
        &mut self,
        from: &str,
        to: &str,
        duration: f32,
        predicate: impl Fn(f32, f32, &UpdateContext<'_>) -> bool + 'static,
    ) -> Result<(), AnimationError> {
        self.require(from)?;
        self.require(to)?;

        self.transitions
            .entry(from.to_owned())
            .or_default()
            .push(AnimationTransition {
                from: from.to_owned(),
                to: to.to_owned(),
                duration,
                predicate: Box::new(predicate),
            });
        Ok(())
    }

    /// Sets the state entered on the first update.
    ///
    /// The name is resolved lazily, so it may be set before the state is
    /// registered.
    pub fn set_initial_state(&mut self, name: impl Into<String>) {
        self.initial_state = Some(name.into());
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn state(&self, name: &str) -> Option<&AnimationState> {
        self.states.get(name)
    }

    pub fn state_mut(&mut self, name: &str) -> Option<&mut AnimationState> {
        self.states.get_mut(name)
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[must_use]
    pub fn initial_state(&self) -> Option<&str> {
        self.initial_state.as_deref()
    }

    #[must_use]
    pub fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn next_state(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.to.as_str())
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    /// Blend weight of the incoming state, if a transition is in flight.
    #[must_use]
    pub fn transition_weight(&self) -> Option<f32> {
        self.pending.as_ref().map(Self::weight_of)
    }

    #[must_use]
    pub fn status(&self) -> MachineStatus<'_> {
        match (&self.current, &self.pending) {
            (None, _) => MachineStatus::Idle,
            (Some(current), None) => MachineStatus::Playing(current),
            (Some(current), Some(pending)) => MachineStatus::Transitioning {
                from: current,
                to: &pending.to,
            },
        }
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Forces a transition to `name` over `duration` seconds.
    ///
    /// Fires the outgoing exit callback and the incoming enter callback, and
    /// resets the incoming clock. From idle, or with a non-positive duration,
    /// the switch is immediate.
    pub fn transition_to(&mut self, name: &str, duration: f32) -> Result<(), AnimationError> {
        self.require(name)?;
        self.begin_transition(name, duration);
        Ok(())
    }

    fn begin_transition(&mut self, to: &str, duration: f32) {
        // The current state's exit already fired when the pending transition
        // began, so only the pending target needs to be exited here.
        let outgoing = match self.pending.take() {
            Some(pending) => Some(pending.to),
            None => self.current.clone(),
        };
        if let Some(state) = outgoing.as_deref().and_then(|n| self.states.get_mut(n)) {
            state.exit();
        }

        if let Some(state) = self.states.get_mut(to) {
            state.enter();
        }

        let immediate =
            duration <= 0.0 || self.current.is_none() || self.current.as_deref() == Some(to);
        if immediate {
            log::debug!("Animation state -> '{to}'");
            self.current = Some(to.to_owned());
        } else {
            log::debug!(
                "Animation transition '{}' -> '{to}' over {duration}s",
                self.current.as_deref().unwrap_or_default()
            );
            self.pending = Some(PendingTransition {
                to: to.to_owned(),
                duration,
                elapsed: 0.0,
            });
        }
    }

    fn require(&self, name: &str) -> Result<(), AnimationError> {
        if self.states.contains_key(name) {
            Ok(())
        } else {
            Err(AnimationError::UnknownState(name.to_owned()))
        }
    }

    fn weight_of(pending: &PendingTransition) -> f32 {
        if pending.duration > 0.0 {
            (pending.elapsed / pending.duration).min(1.0)
        } else {
            1.0
        }
    }

    // ========================================================================
    // Update
    // ========================================================================

    pub fn update(
        &mut self,
        ctx: &mut UpdateContext<'_>,
        graph: &mut SceneGraph,
    ) -> Result<(), AnimationError> {
        if self.current.is_none() {
            let Some(initial) = self.initial_state.clone() else {
                return Ok(());
            };
            self.require(&initial)?;
            self.begin_transition(&initial, 0.0);
        }

        let Some(current) = self.current.clone() else {
            return Ok(());
        };

        if let Some(mut pending) = self.pending.take() {
            pending.elapsed += ctx.delta_seconds;
            let weight = Self::weight_of(&pending);

            if let Some(state) = self.states.get_mut(&current) {
                state.update(ctx, 1.0, graph);
            }
            if let Some(state) = self.states.get_mut(&pending.to) {
                state.update(ctx, weight, graph);
            }

            if pending.elapsed >= pending.duration {
                log::debug!("Animation transition complete -> '{}'", pending.to);
                self.current = Some(pending.to);
            } else {
                self.pending = Some(pending);
            }
            return Ok(());
        }

        let Some(state) = self.states.get_mut(&current) else {
            return Err(AnimationError::UnknownState(current));
        };
        state.update(ctx, 1.0, graph);
        let elapsed = state.total_time();
        let duration = state.duration();

        let ctx: &UpdateContext<'_> = ctx;
        let chosen = self.transitions.get(&current).and_then(|transitions| {
            transitions
                .iter()
                .find(|t| (t.predicate)(elapsed, duration, ctx))
                .map(|t| (t.to.clone(), t.duration))
        });

        if let Some((to, duration)) = chosen {
            self.begin_transition(&to, duration);
        }

        Ok(())
    }
}

impl fmt::Debug for AnimationStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationStateMachine")
            .field("states", &self.states.len())
            .field("current", &self.current)
            .field("pending", &self.pending)
            .field("initial_state", &self.initial_state)
            .finish_non_exhaustive()
    }
}
