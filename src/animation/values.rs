use glam::{Quat, Vec3};

/// Values a keyframe track can blend between.
pub trait Interpolatable: Copy + Sized {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

impl Interpolatable for Quat {
    /// Spherical interpolation along the shortest arc.
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        // glam negates `end` when the dot product is negative.
        start.slerp(end, t).normalize()
    }
}
