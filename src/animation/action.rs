use std::fmt;

use crate::engine::UpdateContext;

/// Default half-width of an action's trigger window: one frame at 60 Hz.
pub const DEFAULT_ACTION_SLOP: f32 = 1.0 / 60.0;

pub type ActionCallback = Box<dyn FnMut(&mut UpdateContext<'_>)>;

/// A one-shot cue embedded in an animation state.
///
/// Fires once each time playback crosses `time`. The trigger window is
/// `[time - slop, time + slop]`; an `applied` latch keeps the cue from firing
/// again until playback leaves the window. A frame step that jumps over the
/// whole window still fires the cue, including a step that wraps a looping
/// clip (see [`AnimationAction::process_wrapped`]).
pub struct AnimationAction {
    time: f32,
    slop: f32,
    applied: bool,
    callback: ActionCallback,
}

impl AnimationAction {
    pub fn new(time: f32, callback: impl FnMut(&mut UpdateContext<'_>) + 'static) -> Self {
        Self {
            time,
            slop: DEFAULT_ACTION_SLOP,
            applied: false,
            callback: Box::new(callback),
        }
    }

    #[must_use]
    pub fn with_slop(mut self, slop: f32) -> Self {
        self.slop = slop.abs();
        self
    }

    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    #[must_use]
    pub fn slop(&self) -> f32 {
        self.slop
    }

    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    pub fn reset(&mut self) {
        self.applied = false;
    }

    /// Checks the playback step `previous -> current` and fires if it crossed
    /// the cue. Returns whether the callback ran.
    pub fn process(&mut self, previous: f32, current: f32, ctx: &mut UpdateContext<'_>) -> bool {
        let start = self.time - self.slop;
        let end = self.time + self.slop;

        if (start..=end).contains(&current) {
            if self.applied {
                return false;
            }
            self.applied = true;
            (self.callback)(ctx);
            return true;
        }

        self.applied = false;
        if previous < start && current > end {
            (self.callback)(ctx);
            return true;
        }
        false
    }

    /// Checks a step that wrapped a looping clip: first `previous -> duration`,
    /// then from before the start of the clip to `current`.
    pub fn process_wrapped(
        &mut self,
        previous: f32,
        current: f32,
        duration: f32,
        ctx: &mut UpdateContext<'_>,
    ) -> bool {
        let before_wrap = self.process(previous, duration, ctx);
        let after_wrap = self.process(f32::NEG_INFINITY, current, ctx);
        before_wrap || after_wrap
    }
}

impl fmt::Debug for AnimationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationAction")
            .field("time", &self.time)
            .field("slop", &self.slop)
            .field("applied", &self.applied)
            .finish_non_exhaustive()
    }
}
