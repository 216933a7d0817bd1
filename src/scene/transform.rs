use glam::{Affine3A, EulerRot, Mat3, Mat4, Quat, Vec3};

/// Transform component
///
/// Holds a node's position, rotation and scale (TRS) together with the
/// derived local and world matrices.
///
/// The local matrix is rebuilt from TRS on every update and is never written
/// directly. The world matrix stays `None` until the hierarchy pass has visited
/// the node at least once.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Option<Affine3A>,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: Affine3A::IDENTITY,
            world_matrix: None,
        }
    }

    /// Builds a transform from explicit translation, rotation and scale.
    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut transform = Self {
            position,
            rotation,
            scale,
            ..Self::new()
        };
        transform.update_local_matrix();
        transform
    }

    /// Builds a transform by decomposing a baked 4x4 matrix.
    #[must_use]
    pub fn from_matrix(mat: Mat4) -> Self {
        let mut transform = Self::new();
        transform.apply_local_matrix_from_mat4(mat);
        transform
    }

    // ========================================================================
    // Matrix maintenance
    // ========================================================================

    /// Rebuilds the local matrix as `translation * rotation * scale`.
    pub fn update_local_matrix(&mut self) -> Affine3A {
        self.local_matrix =
            Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);
        self.local_matrix
    }

    /// Local matrix as of the last update.
    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    /// World matrix as of the last hierarchy pass, if any.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> Option<&Affine3A> {
        self.world_matrix.as_ref()
    }

    /// World matrix widened to `Mat4` for uniform upload.
    #[inline]
    #[must_use]
    pub fn world_matrix_as_mat4(&self) -> Option<Mat4> {
        self.world_matrix.map(Mat4::from)
    }

    pub(crate) fn set_world_matrix(&mut self, mat: Affine3A) {
        self.world_matrix = Some(mat);
    }

    /// Replaces TRS by decomposing `mat`.
    ///
    /// Translation comes straight from the matrix's translation column; scale
    /// and rotation from the column lengths and the normalised basis. Shear is
    /// lost.
    pub fn apply_local_matrix(&mut self, mat: Affine3A) {
        let (scale, rotation, translation) = mat.to_scale_rotation_translation();
        self.scale = scale;
        self.rotation = rotation.normalize();
        self.position = translation;
        self.local_matrix = mat;
    }

    pub fn apply_local_matrix_from_mat4(&mut self, mat: Mat4) {
        self.apply_local_matrix(Affine3A::from_mat4(mat));
    }

    // ========================================================================
    // Space conversion
    // ========================================================================

    /// Maps a point from local space to world space.
    ///
    /// Returns the point unchanged if the world matrix was never computed.
    #[must_use]
    pub fn local_to_world(&self, point: Vec3) -> Vec3 {
        match &self.world_matrix {
            Some(world) => world.transform_point3(point),
            None => point,
        }
    }

    /// Maps a point from world space into this transform's local space.
    ///
    /// Returns the point unchanged if the world matrix was never computed.
    #[must_use]
    pub fn world_to_local(&self, point: Vec3) -> Vec3 {
        match &self.world_matrix {
            Some(world) => world.inverse().transform_point3(point),
            None => point,
        }
    }

    // ========================================================================
    // Rotation & translation helpers
    // ========================================================================

    /// Applies incremental rotations about the local X, then Y, then Z axes.
    pub fn rotate(&mut self, x: f32, y: f32, z: f32) {
        if x != 0.0 {
            self.rotation *= Quat::from_rotation_x(x);
        }
        if y != 0.0 {
            self.rotation *= Quat::from_rotation_y(y);
        }
        if z != 0.0 {
            self.rotation *= Quat::from_rotation_z(z);
        }
    }

    /// Sets the rotation to `angle` radians about `axis`.
    pub fn set_rotation_from_axis_angle(&mut self, axis: Vec3, angle: f32) {
        self.rotation = Quat::from_axis_angle(axis.normalize(), angle);
    }

    /// Sets the rotation from a pure rotation matrix.
    pub fn set_rotation_from_mat3(&mut self, mat: &Mat3) {
        self.rotation = Quat::from_mat3(mat).normalize();
    }

    pub fn set_rotation_from_quat(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    /// Sets (does not accumulate) a rotation about `axis`.
    pub fn rotate_on_axis(&mut self, axis: Vec3, angle: f32) {
        self.set_rotation_from_axis_angle(axis, angle);
    }

    pub fn rotate_x(&mut self, angle: f32) {
        self.rotate_on_axis(Vec3::X, angle);
    }

    pub fn rotate_y(&mut self, angle: f32) {
        self.rotate_on_axis(Vec3::Y, angle);
    }

    pub fn rotate_z(&mut self, angle: f32) {
        self.rotate_on_axis(Vec3::Z, angle);
    }

    /// Sets the rotation from XYZ Euler angles.
    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    #[must_use]
    pub fn rotation_euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    /// Moves `distance` along `axis` expressed in the node's rotated frame.
    pub fn translate_on_axis(&mut self, axis: Vec3, distance: f32) {
        let direction = self.rotation * axis.normalize();
        self.position += direction * distance;
    }

    pub fn translate_x(&mut self, distance: f32) {
        self.translate_on_axis(Vec3::X, distance);
    }

    pub fn translate_y(&mut self, distance: f32) {
        self.translate_on_axis(Vec3::Y, distance);
    }

    pub fn translate_z(&mut self, distance: f32) {
        self.translate_on_axis(Vec3::Z, distance);
    }

    /// Orients -Z towards `target`.
    ///
    /// `target` and `up` are in the parent's space. Degenerate inputs (target
    /// parallel to `up`) leave the rotation untouched.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        if forward == Vec3::ZERO || forward.cross(up).length_squared() < 1e-4 {
            return;
        }

        let right = forward.cross(up).normalize();
        let new_up = right.cross(forward).normalize();

        let rot_mat = Mat3::from_cols(right, new_up, -forward);
        self.rotation = Quat::from_mat3(&rot_mat);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
