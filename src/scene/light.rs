use glam::Vec3;

/// Number of point-light slots the standard program supports.
pub const MAX_POINT_LIGHTS: usize = 2;

/// A point light. A black light contributes nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
}

impl PointLight {
    #[must_use]
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self { position, color }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Vec3::ZERO,
        }
    }
}
