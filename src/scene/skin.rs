use glam::Mat4;
use uuid::Uuid;

use crate::errors::AssetError;
use crate::render::backend::{GpuBackend, TextureHandle};
use crate::scene::NodeHandle;
use crate::scene::graph::SceneGraph;

/// Texels per joint row: one RGBA32F texel per matrix column.
pub const JOINT_TEXTURE_WIDTH: u32 = 4;

/// Skeletal binding for one mesh.
///
/// `joints[i]` drives `jointMatrix[i]` in the shader. The palette lives in a
/// float texture `JOINT_TEXTURE_WIDTH` texels wide and one row per joint,
/// rewritten in full every time the skin is updated.
#[derive(Debug, Clone)]
pub struct Skin {
    pub id: Uuid,
    pub name: String,

    joints: Vec<NodeHandle>,
    inverse_bind_matrices: Vec<Mat4>,
    joint_matrices: Vec<Mat4>,
    joint_texture: TextureHandle,
}

impl Skin {
    /// Binds `joints` with their inverse-bind matrices. Missing inverse-bind
    /// data means identity for every joint.
    pub fn new(
        name: impl Into<String>,
        joints: Vec<NodeHandle>,
        inverse_bind_matrices: Option<Vec<Mat4>>,
        gpu: &mut dyn GpuBackend,
    ) -> Result<Self, AssetError> {
        let count = joints.len();
        let inverse_bind_matrices =
            inverse_bind_matrices.unwrap_or_else(|| vec![Mat4::IDENTITY; count]);

        if inverse_bind_matrices.len() != count {
            return Err(AssetError::SkinMismatch {
                joints: count,
                inverse_bind_matrices: inverse_bind_matrices.len(),
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            joints,
            inverse_bind_matrices,
            joint_matrices: vec![Mat4::IDENTITY; count],
            joint_texture: gpu.create_texture(),
        })
    }

    #[inline]
    #[must_use]
    pub fn joints(&self) -> &[NodeHandle] {
        &self.joints
    }

    #[inline]
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    #[must_use]
    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    #[inline]
    #[must_use]
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    #[inline]
    #[must_use]
    pub fn joint_texture(&self) -> TextureHandle {
        self.joint_texture
    }

    /// `jointMatrix[j] = global_inverse * joint_worlds[j] * inverseBind[j]`
    pub fn compute_joint_matrices(&mut self, global_inverse: Mat4, joint_worlds: &[Mat4]) {
        for ((out, world), ibm) in self
            .joint_matrices
            .iter_mut()
            .zip(joint_worlds)
            .zip(&self.inverse_bind_matrices)
        {
            *out = global_inverse * *world * *ibm;
        }
    }

    /// Uploads the whole palette in one transfer.
    pub fn upload(&self, gpu: &mut dyn GpuBackend) {
        let data: &[f32] = bytemuck::cast_slice(&self.joint_matrices);
        gpu.upload_texture_rgba32f(
            self.joint_texture,
            JOINT_TEXTURE_WIDTH,
            self.joint_matrices.len() as u32,
            data,
        );
    }
}

/// Recomputes and uploads the palette of the skin bound to `node`'s renderable.
///
/// The global inverse comes from `node`'s own world matrix. Joints without a
/// world matrix contribute identity. Returns `false` when the node has no skin
/// or has not been placed by a hierarchy pass yet.
pub fn update_node_skin(graph: &mut SceneGraph, node: NodeHandle, gpu: &mut dyn GpuBackend) -> bool {
    let Some(owner) = graph.get(node) else {
        return false;
    };
    let Some(skin) = owner.renderable.as_ref().and_then(|r| r.skin.as_ref()) else {
        return false;
    };
    let Some(root_world) = owner.transform.world_matrix() else {
        return false;
    };

    let global_inverse = Mat4::from(*root_world).inverse();
    let joint_worlds: Vec<Mat4> = skin
        .joints
        .iter()
        .map(|&joint| graph.world_matrix(joint).map_or(Mat4::IDENTITY, Mat4::from))
        .collect();

    let Some(skin) = graph
        .get_mut(node)
        .and_then(|n| n.renderable.as_mut())
        .and_then(|r| r.skin.as_mut())
    else {
        return false;
    };

    skin.compute_joint_matrices(global_inverse, &joint_worlds);
    skin.upload(gpu);
    true
}
