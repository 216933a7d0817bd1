//! Rendering
//!
//! The engine never talks to a graphics API directly. Everything goes through
//! the [`GpuBackend`] trait; [`renderer`] walks the scene and issues the
//! calls.

pub mod backend;
pub mod headless;
pub mod mesh;
pub mod renderer;
pub mod skybox;

pub use backend::{
    BlendMode, BufferHandle, BufferTarget, ComponentType, DepthFunc, GpuBackend, IndexFormat,
    ProgramHandle, ProgramKind, TextureHandle, UniformValue, VertexAttribute,
};
pub use headless::{GpuCommand, RecordingBackend, TexturePixels};
pub use mesh::{IndexBuffer, MaterialUniforms, Primitive, Renderable, TextureBinding};
pub use skybox::Skybox;
