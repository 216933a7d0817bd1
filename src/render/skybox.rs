use glam::Mat4;

use crate::render::backend::{
    BufferTarget, ComponentType, GpuBackend, ProgramHandle, TextureHandle, UniformValue,
    VertexAttribute,
};

/// Two clip-space triangles covering the viewport.
const QUAD: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

/// Cube-mapped background drawn as a fullscreen quad at the far plane.
#[derive(Debug, Clone)]
pub struct Skybox {
    pub program: ProgramHandle,
    pub texture: TextureHandle,
    attribute: VertexAttribute,
}

impl Skybox {
    pub fn new(gpu: &mut dyn GpuBackend, program: ProgramHandle, texture: TextureHandle) -> Self {
        let buffer = gpu.create_buffer(BufferTarget::Vertex, bytemuck::cast_slice(&QUAD));
        Self {
            program,
            texture,
            attribute: VertexAttribute {
                name: "a_position".to_owned(),
                buffer,
                components: 2,
                component_type: ComponentType::F32,
                normalized: false,
                count: QUAD.len(),
            },
        }
    }

    pub fn draw(&self, gpu: &mut dyn GpuBackend, view_projection: Mat4) {
        gpu.use_program(self.program);
        gpu.bind_vertex_attributes(std::slice::from_ref(&self.attribute), None);
        gpu.set_uniform(
            "u_skybox",
            &UniformValue::Texture {
                texture: self.texture,
                unit: 0,
            },
        );
        gpu.set_uniform(
            "u_viewDirectionProjectionInverse",
            &UniformValue::Mat4(view_projection.inverse()),
        );
        gpu.draw_arrays(QUAD.len());
    }
}
