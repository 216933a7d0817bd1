use glam::Vec4;

use crate::render::backend::{
    BufferHandle, GpuBackend, IndexFormat, ProgramHandle, TextureHandle, UniformValue,
    VertexAttribute,
};
use crate::scene::skin::Skin;

/// A base-color texture bound to a texture-coordinate set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureBinding {
    pub texture: TextureHandle,
    /// Index of the `TEXCOORD_n` set sampled.
    pub tex_coord: u32,
}

/// Flat material parameters for the standard program.
///
/// A textured material renders with the texture and ignores `color`; the
/// `u_hasTexture` flag lets the shader branch.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialUniforms {
    pub color: Vec4,
    pub texture: Option<TextureBinding>,
}

impl MaterialUniforms {
    /// Opaque white, untextured.
    pub const WHITE: Self = Self {
        color: Vec4::ONE,
        texture: None,
    };

    #[must_use]
    pub fn flat(color: Vec4) -> Self {
        Self {
            color,
            texture: None,
        }
    }

    #[must_use]
    pub fn textured(texture: TextureHandle, tex_coord: u32) -> Self {
        Self {
            color: Vec4::ONE,
            texture: Some(TextureBinding { texture, tex_coord }),
        }
    }

    #[inline]
    #[must_use]
    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    pub fn apply(&self, gpu: &mut dyn GpuBackend) {
        gpu.set_uniform("u_color", &UniformValue::Vec4(self.color));
        gpu.set_uniform("u_hasTexture", &UniformValue::Bool(self.has_texture()));
        if let Some(binding) = &self.texture {
            gpu.set_uniform(
                &format!("u_texture{}", binding.tex_coord),
                &UniformValue::Texture {
                    texture: binding.texture,
                    unit: binding.tex_coord,
                },
            );
        }
    }
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self::WHITE
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexBuffer {
    pub buffer: BufferHandle,
    pub format: IndexFormat,
    pub count: usize,
}

/// One draw call's worth of geometry and material.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub attributes: Vec<VertexAttribute>,
    pub indices: Option<IndexBuffer>,
    /// Vertex count for non-indexed draws.
    pub vertex_count: usize,
    pub material: MaterialUniforms,
}

impl Primitive {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn draw(&self, gpu: &mut dyn GpuBackend) {
        self.material.apply(gpu);
        gpu.bind_vertex_attributes(&self.attributes, self.indices.map(|i| i.buffer));
        match &self.indices {
            Some(indices) => gpu.draw_indexed(indices.count, indices.format),
            None => gpu.draw_arrays(self.vertex_count),
        }
    }
}

/// Mesh binding attached to a node.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub program: ProgramHandle,
    pub primitives: Vec<Primitive>,
    pub skin: Option<Skin>,
}

impl Renderable {
    #[must_use]
    pub fn new(program: ProgramHandle) -> Self {
        Self {
            program,
            primitives: Vec::new(),
            skin: None,
        }
    }

    /// Joint count of the bound skin, zero when unskinned.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.skin.as_ref().map_or(0, Skin::joint_count)
    }
}
