use glam::Vec3;

use crate::assets::texture_loader::{TextureLoader, TextureSource};
use crate::engine::UpdateContext;
use crate::errors::Result;
use crate::render::backend::{GpuBackend, ProgramHandle};
use crate::render::renderer;
use crate::render::skybox::Skybox;
use crate::scene::NodeHandle;
use crate::scene::camera::Camera;
use crate::scene::graph::SceneGraph;
use crate::scene::light::{MAX_POINT_LIGHTS, PointLight};
use crate::settings::EngineSettings;

/// Scene container
///
/// Owns the node graph plus everything needed to draw it: ordered layer
/// roots, camera, ambient color, point lights and an optional skybox.
///
/// Layers are drawn in index order and each starts with a fresh depth
/// buffer, so a higher layer always draws over a lower one.
#[derive(Debug)]
pub struct Scene {
    pub graph: SceneGraph,
    layers: Vec<NodeHandle>,

    pub camera: Camera,
    pub ambient_color: Vec3,
    pub point_lights: [PointLight; MAX_POINT_LIGHTS],
    pub skybox: Option<Skybox>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::from_settings(&EngineSettings::default())
    }

    #[must_use]
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            graph: SceneGraph::new(),
            layers: Vec::new(),
            camera: Camera::from_settings(settings),
            ambient_color: Vec3::from(settings.ambient_color),
            point_lights: [PointLight::default(); MAX_POINT_LIGHTS],
            skybox: None,
        }
    }

    // ========================================================================
    // Layers & objects
    // ========================================================================

    #[must_use]
    pub fn layers(&self) -> &[NodeHandle] {
        &self.layers
    }

    #[must_use]
    pub fn layer(&self, index: usize) -> Option<NodeHandle> {
        self.layers.get(index).copied()
    }

    /// Returns the root of layer `index`, creating it and any missing lower
    /// layers.
    pub fn ensure_layer(&mut self, index: usize) -> NodeHandle {
        while self.layers.len() <= index {
            let root = self.graph.create_node(format!("layer{}", self.layers.len()));
            self.layers.push(root);
        }
        self.layers[index]
    }

    /// Attaches `node` to layer `layer`, detaching it from wherever it was.
    pub fn add_game_object(&mut self, node: NodeHandle, layer: usize) {
        let root = self.ensure_layer(layer);
        self.graph.add(root, node);
    }

    /// Detaches `node` from whichever layer root holds it directly.
    pub fn remove_game_object(&mut self, node: NodeHandle) -> bool {
        let mut removed = false;
        for &layer in &self.layers {
            removed |= self.graph.remove(layer, node);
        }
        removed
    }

    /// Finds the first node named `id` in any layer, searching layers in order.
    #[must_use]
    pub fn get_object_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.layers
            .iter()
            .find_map(|&layer| self.graph.get_object_by_id(layer, id, true))
    }

    // ========================================================================
    // Skybox
    // ========================================================================

    /// Requests the six cube faces (+X, -X, +Y, -Y, +Z, -Z) and installs a
    /// skybox that samples them. The faces render as a placeholder until the
    /// decode completes.
    pub fn load_skybox(
        &mut self,
        gpu: &mut dyn GpuBackend,
        textures: &mut TextureLoader,
        program: ProgramHandle,
        faces: [TextureSource; 6],
    ) {
        let texture = textures.request_cube(gpu, faces);
        self.skybox = Some(Skybox::new(gpu, program, texture));
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Runs one simulation step: node behaviour for every layer, then one
    /// top-down world-matrix pass.
    pub fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<()> {
        for &layer in &self.layers {
            self.graph.update(layer, ctx)?;
        }
        self.graph.update_world_matrices(&self.layers);
        Ok(())
    }

    pub fn render(&mut self, gpu: &mut dyn GpuBackend, viewport_width: u32, viewport_height: u32) {
        renderer::render_scene(self, gpu, viewport_width, viewport_height);
    }
}
