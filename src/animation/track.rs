use crate::animation::values::Interpolatable;
use crate::errors::AnimationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
}

/// Parallel keyframe times and values.
///
/// Times are expected in ascending order. Queries outside the keyframe range
/// clamp to the first or last value.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>,
    interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Builds a track, rejecting empty or mismatched inputs.
    pub fn new(
        times: Vec<f32>,
        values: Vec<T>,
        interpolation: InterpolationMode,
    ) -> Result<Self, AnimationError> {
        if times.len() != values.len() {
            return Err(AnimationError::MismatchedKeyframes {
                keyframes: times.len(),
                values: values.len(),
            });
        }
        if times.is_empty() {
            return Err(AnimationError::EmptyTrack);
        }

        Ok(Self {
            times,
            values,
            interpolation,
        })
    }

    #[inline]
    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    /// Time of the last keyframe.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        let len = self.times.len();
        if len == 1 {
            return self.values[0];
        }

        // partition_point finds the first index where t > time, i.e. next_index
        let next = self.times.partition_point(|&t| t <= time);
        if next == 0 {
            return self.values[0];
        }
        if next >= len {
            return self.values[len - 1];
        }

        let index = next - 1;
        let t0 = self.times[index];
        let t1 = self.times[next];
        let dt = t1 - t0;

        let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };
        let t = t.clamp(0.0, 1.0);

        match self.interpolation {
            InterpolationMode::Step => self.values[index],
            InterpolationMode::Linear => {
                T::interpolate_linear(self.values[index], self.values[next], t)
            }
        }
    }
}
