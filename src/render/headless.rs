//! Command-recording GPU backend.

use glam::Vec4;
use rustc_hash::FxHashSet;
use slotmap::SlotMap;

use crate::errors::GpuError;
use crate::render::backend::{
    BlendMode, BufferHandle, BufferTarget, DepthFunc, GpuBackend, IndexFormat, ProgramHandle,
    ProgramKind, TextureHandle, UniformValue, VertexAttribute,
};

/// A call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateProgram(ProgramKind),
    CreateBuffer { target: BufferTarget, len: usize },
    CreateTexture(TextureHandle),
    UploadTexture { texture: TextureHandle, width: u32, height: u32 },
    UploadFloatTexture { texture: TextureHandle, width: u32, height: u32 },
    UploadCubeTexture { texture: TextureHandle, size: u32 },
    UseProgram(ProgramHandle),
    SetUniform { name: String, value: UniformValue },
    BindAttributes { attributes: usize, indexed: bool },
    DrawIndexed { count: usize, format: IndexFormat },
    DrawArrays { count: usize },
    Viewport { width: u32, height: u32 },
    Clear { color: Option<Vec4>, depth: bool },
    DepthTest(bool),
    DepthWrite(bool),
    DepthFunc(DepthFunc),
    Blend(BlendMode),
}

/// Last contents uploaded to a texture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TexturePixels {
    #[default]
    Empty,
    Rgba8 { width: u32, height: u32, pixels: Vec<u8> },
    Rgba32F { width: u32, height: u32, data: Vec<f32> },
    Cube { size: u32, faces: Vec<Vec<u8>> },
}

/// A [`GpuBackend`] that keeps resources in memory and records every call.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    programs: SlotMap<ProgramHandle, ProgramKind>,
    buffers: SlotMap<BufferHandle, (BufferTarget, Vec<u8>)>,
    textures: SlotMap<TextureHandle, TexturePixels>,
    failing_programs: FxHashSet<ProgramKind>,
    commands: Vec<GpuCommand>,
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `create_program` fail for `kind`.
    #[must_use]
    pub fn failing_program(mut self, kind: ProgramKind) -> Self {
        self.failing_programs.insert(kind);
        self
    }

    #[must_use]
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    #[must_use]
    pub fn program_kind(&self, program: ProgramHandle) -> Option<ProgramKind> {
        self.programs.get(program).copied()
    }

    #[must_use]
    pub fn buffer(&self, buffer: BufferHandle) -> Option<(BufferTarget, &[u8])> {
        self.buffers.get(buffer).map(|(t, d)| (*t, d.as_slice()))
    }

    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn texture(&self, texture: TextureHandle) -> Option<&TexturePixels> {
        self.textures.get(texture)
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Number of draw calls recorded.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, GpuCommand::DrawIndexed { .. } | GpuCommand::DrawArrays { .. }))
            .count()
    }
}

impl GpuBackend for RecordingBackend {
    fn create_program(&mut self, kind: ProgramKind) -> Result<ProgramHandle, GpuError> {
        if self.failing_programs.contains(&kind) {
            return Err(GpuError::ProgramCreation {
                program: kind.name().to_owned(),
                reason: "compilation disabled on recording backend".to_owned(),
            });
        }
        self.commands.push(GpuCommand::CreateProgram(kind));
        Ok(self.programs.insert(kind))
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> BufferHandle {
        self.commands.push(GpuCommand::CreateBuffer {
            target,
            len: data.len(),
        });
        self.buffers.insert((target, data.to_vec()))
    }

    fn create_texture(&mut self) -> TextureHandle {
        let texture = self.textures.insert(TexturePixels::Empty);
        self.commands.push(GpuCommand::CreateTexture(texture));
        texture
    }

    fn upload_texture_rgba8(
        &mut self,
        texture: TextureHandle,
        width: u32,
        height: u32,
        pixels: &[u8],
        _generate_mipmaps: bool,
    ) {
        self.commands.push(GpuCommand::UploadTexture {
            texture,
            width,
            height,
        });
        if let Some(slot) = self.textures.get_mut(texture) {
            *slot = TexturePixels::Rgba8 {
                width,
                height,
                pixels: pixels.to_vec(),
            };
        }
    }

    fn upload_texture_rgba32f(&mut self, texture: TextureHandle, width: u32, height: u32, data: &[f32]) {
        self.commands.push(GpuCommand::UploadFloatTexture {
            texture,
            width,
            height,
        });
        if let Some(slot) = self.textures.get_mut(texture) {
            *slot = TexturePixels::Rgba32F {
                width,
                height,
                data: data.to_vec(),
            };
        }
    }

    fn upload_cube_texture_rgba8(&mut self, texture: TextureHandle, size: u32, faces: &[Vec<u8>]) {
        self.commands
            .push(GpuCommand::UploadCubeTexture { texture, size });
        if let Some(slot) = self.textures.get_mut(texture) {
            *slot = TexturePixels::Cube {
                size,
                faces: faces.to_vec(),
            };
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.commands.push(GpuCommand::UseProgram(program));
    }

    fn set_uniform(&mut self, name: &str, value: &UniformValue) {
        self.commands.push(GpuCommand::SetUniform {
            name: name.to_owned(),
            value: value.clone(),
        });
    }

    fn bind_vertex_attributes(&mut self, attributes: &[VertexAttribute], indices: Option<BufferHandle>) {
        self.commands.push(GpuCommand::BindAttributes {
            attributes: attributes.len(),
            indexed: indices.is_some(),
        });
    }

    fn draw_indexed(&mut self, count: usize, format: IndexFormat) {
        self.commands.push(GpuCommand::DrawIndexed { count, format });
    }

    fn draw_arrays(&mut self, count: usize) {
        self.commands.push(GpuCommand::DrawArrays { count });
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.commands.push(GpuCommand::Viewport { width, height });
    }

    fn clear(&mut self, color: Option<Vec4>, depth: bool) {
        self.commands.push(GpuCommand::Clear { color, depth });
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.commands.push(GpuCommand::DepthTest(enabled));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.commands.push(GpuCommand::DepthWrite(enabled));
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.commands.push(GpuCommand::DepthFunc(func));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.commands.push(GpuCommand::Blend(mode));
    }
}
