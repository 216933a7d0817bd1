use glam::{Quat, Vec3};

use crate::animation::track::{InterpolationMode, KeyframeTrack};
use crate::errors::AnimationError;
use crate::scene::NodeHandle;
use crate::scene::graph::SceneGraph;
use crate::scene::transform::Transform;

/// Defines the target property for animation data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation, // Maps to transform.position
    Rotation,    // Maps to transform.rotation
    Scale,       // Maps to transform.scale
}

/// Typed keyframe data for one animated property.
#[derive(Debug, Clone)]
pub enum ChannelTrack {
    Translation(KeyframeTrack<Vec3>),
    Rotation(KeyframeTrack<Quat>),
    Scale(KeyframeTrack<Vec3>),
}

/// A sampled channel value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelValue {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

/// One animated property of one node.
///
/// The target is a non-owning handle. If the node has been destroyed the
/// channel silently does nothing.
#[derive(Debug, Clone)]
pub struct AnimationChannel {
    target: NodeHandle,
    track: ChannelTrack,
}

impl AnimationChannel {
    #[must_use]
    pub fn new(target: NodeHandle, track: ChannelTrack) -> Self {
        Self { target, track }
    }

    pub fn translation(
        target: NodeHandle,
        times: Vec<f32>,
        values: Vec<Vec3>,
    ) -> Result<Self, AnimationError> {
        let track = KeyframeTrack::new(times, values, InterpolationMode::Linear)?;
        Ok(Self::new(target, ChannelTrack::Translation(track)))
    }

    pub fn rotation(
        target: NodeHandle,
        times: Vec<f32>,
        values: Vec<Quat>,
    ) -> Result<Self, AnimationError> {
        let track = KeyframeTrack::new(times, values, InterpolationMode::Linear)?;
        Ok(Self::new(target, ChannelTrack::Rotation(track)))
    }

    pub fn scale(
        target: NodeHandle,
        times: Vec<f32>,
        values: Vec<Vec3>,
    ) -> Result<Self, AnimationError> {
        let track = KeyframeTrack::new(times, values, InterpolationMode::Linear)?;
        Ok(Self::new(target, ChannelTrack::Scale(track)))
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> NodeHandle {
        self.target
    }

    #[must_use]
    pub fn path(&self) -> TargetPath {
        match &self.track {
            ChannelTrack::Translation(_) => TargetPath::Translation,
            ChannelTrack::Rotation(_) => TargetPath::Rotation,
            ChannelTrack::Scale(_) => TargetPath::Scale,
        }
    }

    /// Time of the channel's last keyframe.
    #[must_use]
    pub fn duration(&self) -> f32 {
        match &self.track {
            ChannelTrack::Translation(t) | ChannelTrack::Scale(t) => t.duration(),
            ChannelTrack::Rotation(t) => t.duration(),
        }
    }

    /// Samples the channel, clamping outside the keyframe range.
    #[must_use]
    pub fn get_value(&self, time: f32) -> ChannelValue {
        match &self.track {
            ChannelTrack::Translation(t) => ChannelValue::Translation(t.sample(time)),
            ChannelTrack::Rotation(t) => ChannelValue::Rotation(t.sample(time)),
            ChannelTrack::Scale(t) => ChannelValue::Scale(t.sample(time)),
        }
    }

    /// Blends `value` into `transform` by `weight`.
    ///
    /// A weight of 1 replaces the property outright.
    pub fn apply(value: ChannelValue, weight: f32, transform: &mut Transform) {
        let weight = weight.clamp(0.0, 1.0);
        let replace = weight >= 1.0;

        match value {
            ChannelValue::Translation(v) => {
                transform.position = if replace { v } else { transform.position.lerp(v, weight) };
            }
            ChannelValue::Rotation(q) => {
                transform.rotation = if replace {
                    q
                } else {
                    transform.rotation.slerp(q, weight).normalize()
                };
            }
            ChannelValue::Scale(v) => {
                transform.scale = if replace { v } else { transform.scale.lerp(v, weight) };
            }
        }
    }

    /// Samples at `time` and blends the result into the target node.
    pub fn evaluate(&self, time: f32, weight: f32, graph: &mut SceneGraph) {
        if let Some(transform) = graph.transform_mut(self.target) {
            Self::apply(self.get_value(time), weight, transform);
        }
    }
}
