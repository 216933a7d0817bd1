use glam::{Mat4, Vec3};

use crate::settings::EngineSettings;

/// Perspective look-at camera.
///
/// `apply` must be called with the current aspect ratio before the matrices
/// are read; the renderer does this once per frame.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Vertical field of view in radians.
    pub fov: f32,
    pub z_near: f32,
    pub z_far: f32,

    pub position: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,

    projection: Mat4,
    view: Mat4,
    view_projection: Mat4,
}

impl Camera {
    #[must_use]
    pub fn new(fov: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov,
            z_near,
            z_far,
            position: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            up: Vec3::Y,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(
            settings.camera_fov_degrees.to_radians(),
            settings.camera_near,
            settings.camera_far,
        )
    }

    /// Rebuilds the projection for `aspect` and the view from position,
    /// target and up.
    pub fn apply(&mut self, aspect: f32) {
        self.projection = Mat4::perspective_rh_gl(self.fov, aspect, self.z_near, self.z_far);
        // Inverse of the camera's target-to placement matrix.
        self.view = Mat4::look_at_rh(self.position, self.look_at, self.up);
        self.view_projection = self.projection * self.view;
    }

    #[inline]
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}
