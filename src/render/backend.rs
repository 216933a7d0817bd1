//! GPU backend interface
//!
//! The engine issues all GPU work through [`GpuBackend`]. Implementations
//! wrap a concrete graphics API; [`RecordingBackend`](super::RecordingBackend)
//! records the calls for headless runs and tests.

use glam::{Mat4, Vec3, Vec4};
use slotmap::new_key_type;

use crate::errors::GpuError;

new_key_type! {
    pub struct BufferHandle;
    pub struct TextureHandle;
    pub struct ProgramHandle;
}

/// Built-in shader programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Lit, optionally textured and skinned meshes.
    Standard,
    /// Cube-mapped background.
    Skybox,
}

impl ProgramKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ProgramKind::Standard => "standard",
            ProgramKind::Skybox => "skybox",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// Scalar type of vertex attribute components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U8,
    U16,
    U32,
}

/// Fragment blend state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// `ONE, ZERO`: blending effectively off.
    Replace,
    /// `ONE, ONE_MINUS_SRC_ALPHA`: premultiplied alpha, used for layers.
    Premultiplied,
    /// `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`: straight alpha, used for the alpha pass.
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Less,
    LessEqual,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Vec3Array(Vec<Vec3>),
    /// Texture bound to the given unit.
    Texture { texture: TextureHandle, unit: u32 },
}

/// One vertex attribute stream in a GPU buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    /// Shader attribute name, e.g. `a_position`.
    pub name: String,
    pub buffer: BufferHandle,
    /// Components per element (1 to 4, or 16 for matrices).
    pub components: u32,
    pub component_type: ComponentType,
    pub normalized: bool,
    pub count: usize,
}

/// Verbs the engine needs from a graphics API.
pub trait GpuBackend {
    /// Creates a built-in program. Failure is fatal to engine construction.
    fn create_program(&mut self, kind: ProgramKind) -> Result<ProgramHandle, GpuError>;

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> BufferHandle;

    fn create_texture(&mut self) -> TextureHandle;

    /// Replaces a 2D texture's contents with RGBA8 pixels.
    fn upload_texture_rgba8(
        &mut self,
        texture: TextureHandle,
        width: u32,
        height: u32,
        pixels: &[u8],
        generate_mipmaps: bool,
    );

    /// Replaces a 2D texture's contents with RGBA32F texels.
    fn upload_texture_rgba32f(&mut self, texture: TextureHandle, width: u32, height: u32, data: &[f32]);

    /// Replaces a cube texture's six faces (+X, -X, +Y, -Y, +Z, -Z) with RGBA8 pixels.
    fn upload_cube_texture_rgba8(&mut self, texture: TextureHandle, size: u32, faces: &[Vec<u8>]);

    fn use_program(&mut self, program: ProgramHandle);

    fn set_uniform(&mut self, name: &str, value: &UniformValue);

    fn bind_vertex_attributes(&mut self, attributes: &[VertexAttribute], indices: Option<BufferHandle>);

    fn draw_indexed(&mut self, count: usize, format: IndexFormat);

    fn draw_arrays(&mut self, count: usize);

    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clears the color buffer when `color` is given, and the depth buffer
    /// when `depth` is set.
    fn clear(&mut self, color: Option<Vec4>, depth: bool);

    fn set_depth_test(&mut self, enabled: bool);

    fn set_depth_write(&mut self, enabled: bool);

    fn set_depth_func(&mut self, func: DepthFunc);

    fn set_blend_mode(&mut self, mode: BlendMode);
}
