use std::fmt;

use crate::animation::action::AnimationAction;
use crate::animation::channel::AnimationChannel;
use crate::engine::UpdateContext;
use crate::scene::graph::SceneGraph;

/// What happens when playback runs past the end of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Hold the final pose.
    #[default]
    None,
    /// Restart from the beginning.
    Loop,
    /// Play backwards to the start, then forwards again.
    Bounce,
}

pub type StateCallback = Box<dyn FnMut()>;

/// A named animation clip: channels, timed actions and a wrap policy.
pub struct AnimationState {
    channels: Vec<AnimationChannel>,
    actions: Vec<AnimationAction>,

    pub wrap_mode: WrapMode,
    pub time_scale: f32,

    duration: Option<f32>,
    /// Scaled clock, kept within one wrap period.
    time: f32,
    /// Unscaled time since the last reset.
    total_time: f32,
    /// Effective clip-local time after wrapping.
    playback_time: f32,
    /// Whether the last advance wrapped a looping clip past its end.
    wrapped: bool,

    on_enter: Option<StateCallback>,
    on_exit: Option<StateCallback>,
}

impl AnimationState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
            actions: Vec::new(),
            wrap_mode: WrapMode::None,
            time_scale: 1.0,
            duration: None,
            time: 0.0,
            total_time: 0.0,
            playback_time: 0.0,
            wrapped: false,
            on_enter: None,
            on_exit: None,
        }
    }

    #[must_use]
    pub fn with_channels(channels: Vec<AnimationChannel>) -> Self {
        Self {
            channels,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_wrap_mode(mut self, wrap_mode: WrapMode) -> Self {
        self.wrap_mode = wrap_mode;
        self
    }

    pub fn add_channel(&mut self, channel: AnimationChannel) {
        self.channels.push(channel);
        self.duration = None;
    }

    pub fn add_action(&mut self, action: AnimationAction) {
        self.actions.push(action);
    }

    #[must_use]
    pub fn channels(&self) -> &[AnimationChannel] {
        &self.channels
    }

    #[must_use]
    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    pub fn set_on_enter(&mut self, callback: impl FnMut() + 'static) {
        self.on_enter = Some(Box::new(callback));
    }

    pub fn set_on_exit(&mut self, callback: impl FnMut() + 'static) {
        self.on_exit = Some(Box::new(callback));
    }

    /// Length of the clip: the latest keyframe across all channels.
    ///
    /// Computed on first use and cached until [`Self::reset`].
    pub fn duration(&mut self) -> f32 {
        *self.duration.get_or_insert_with(|| {
            self.channels
                .iter()
                .map(AnimationChannel::duration)
                .fold(0.0, f32::max)
        })
    }

    /// Effective clip-local time after the last update.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.playback_time
    }

    /// Unscaled time since the last reset.
    #[inline]
    #[must_use]
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
        self.total_time = 0.0;
        self.playback_time = 0.0;
        self.wrapped = false;
        self.duration = None;
        for action in &mut self.actions {
            action.reset();
        }
    }

    pub(crate) fn enter(&mut self) {
        self.reset();
        if let Some(callback) = &mut self.on_enter {
            callback();
        }
    }

    pub(crate) fn exit(&mut self) {
        if let Some(callback) = &mut self.on_exit {
            callback();
        }
    }

    /// Advances the clocks by `delta` seconds and resolves the wrap policy.
    ///
    /// Returns the previous and new effective playback time.
    pub fn advance(&mut self, delta: f32) -> (f32, f32) {
        let previous = self.playback_time;
        self.wrapped = false;

        self.time += delta * self.time_scale;
        self.total_time += delta;

        let duration = self.duration();
        if duration <= 0.0 {
            self.playback_time = self.time;
            return (previous, self.playback_time);
        }

        self.playback_time = match self.wrap_mode {
            WrapMode::None => {
                self.time = self.time.clamp(0.0, duration);
                self.time
            }
            WrapMode::Loop => {
                if self.time > duration || self.time < 0.0 {
                    self.wrapped = self.time > duration;
                    self.time = self.time.rem_euclid(duration);
                }
                self.time
            }
            WrapMode::Bounce => {
                let period = duration * 2.0;
                if self.time > period || self.time < 0.0 {
                    self.time = self.time.rem_euclid(period);
                }
                if self.time > duration {
                    period - self.time
                } else {
                    self.time
                }
            }
        };

        (previous, self.playback_time)
    }

    /// Advances playback, applies every channel at `weight`, then runs actions.
    pub fn update(&mut self, ctx: &mut UpdateContext<'_>, weight: f32, graph: &mut SceneGraph) {
        let (previous, current) = self.advance(ctx.delta_seconds);

        for channel in &self.channels {
            channel.evaluate(current, weight, graph);
        }

        let duration = self.duration();
        for action in &mut self.actions {
            if self.wrapped {
                action.process_wrapped(previous, current, duration, ctx);
            } else {
                action.process(previous, current, ctx);
            }
        }
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationState")
            .field("channels", &self.channels.len())
            .field("actions", &self.actions.len())
            .field("wrap_mode", &self.wrap_mode)
            .field("time_scale", &self.time_scale)
            .field("duration", &self.duration)
            .field("time", &self.playback_time)
            .field("total_time", &self.total_time)
            .finish_non_exhaustive()
    }
}
