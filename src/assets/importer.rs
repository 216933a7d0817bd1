//! glTF 2.0 importer.
//!
//! Turns a glTF document (JSON or GLB) into scene-graph nodes with renderables,
//! skins and animation states:
//!
//! 1. Buffers are resolved from `data:` URIs, files next to the model, or the
//!    GLB binary chunk.
//! 2. One node is created per document node, with its transform taken from
//!    TRS properties or a decomposed matrix. Mesh primitives become GPU
//!    buffers with `a_<semantic>` attribute names.
//! 3. Child lists become parent/child edges, then skins are bound to the
//!    finished joint nodes.
//! 4. Scene roots are gathered under the returned import root, and every
//!    animation is registered as a looping state on that root's machine.
//!
//! A failed import removes every node it created.

use std::path::{Path, PathBuf};

use glam::{Mat4, Quat, Vec3, Vec4};
use gltf::animation::util::ReadOutputs;
use gltf::mesh::Semantic;
use gltf::mesh::util::ReadIndices;
use rustc_hash::FxHashMap;

use crate::animation::{
    AnimationChannel, AnimationState, ChannelTrack, InterpolationMode, KeyframeTrack, WrapMode,
};
use crate::assets::data_uri::{decode_data_uri, is_data_uri};
use crate::assets::texture_loader::{TextureLoader, TextureSource};
use crate::errors::{AssetError, Result};
use crate::render::backend::{
    BufferTarget, ComponentType, GpuBackend, IndexFormat, ProgramHandle, TextureHandle,
    VertexAttribute,
};
use crate::render::mesh::{IndexBuffer, MaterialUniforms, Primitive, Renderable};
use crate::scene::skin::Skin;
use crate::scene::transform::Transform;
use crate::scene::{NodeHandle, SceneGraph};

/// Result of a successful import.
#[derive(Debug, Clone)]
pub struct ImportedModel {
    /// Detached root holding the scene's nodes and the animation states.
    pub root: NodeHandle,
    /// Handles indexed like the document's `nodes` array. Nodes outside the
    /// instantiated scene are removed again, so their handles are stale.
    pub nodes: Vec<NodeHandle>,
    /// Names the animations were registered under, in document order.
    pub animation_names: Vec<String>,
}

pub struct GltfImporter<'a> {
    gpu: &'a mut dyn GpuBackend,
    textures: &'a mut TextureLoader,
    program: ProgramHandle,
    base_path: Option<PathBuf>,
    texture_cache: FxHashMap<usize, TextureHandle>,
}

impl<'a> GltfImporter<'a> {
    pub fn new(gpu: &'a mut dyn GpuBackend, textures: &'a mut TextureLoader, program: ProgramHandle) -> Self {
        Self {
            gpu,
            textures,
            program,
            base_path: None,
            texture_cache: FxHashMap::default(),
        }
    }

    /// Directory external buffer and image URIs are resolved against.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Imports a `.gltf` or `.glb` file.
    ///
    /// Without an explicit base path, URIs resolve relative to the file.
    pub fn import_file(&mut self, graph: &mut SceneGraph, path: &Path) -> Result<ImportedModel> {
        let data = std::fs::read(path)?;
        if self.base_path.is_none() {
            self.base_path = path.parent().map(Path::to_path_buf);
        }
        self.import_slice(graph, &data)
    }

    /// Imports an in-memory document. GLB input is recognised by its magic,
    /// anything else is parsed as JSON.
    pub fn import_slice(&mut self, graph: &mut SceneGraph, data: &[u8]) -> Result<ImportedModel> {
        let gltf = gltf::Gltf::from_slice(data)?;
        self.import(graph, &gltf)
    }

    /// Imports data that must be a GLB container.
    pub fn import_glb(&mut self, graph: &mut SceneGraph, data: &[u8]) -> Result<ImportedModel> {
        // Without this, a corrupt header would be retried as JSON.
        gltf::Glb::from_slice(data)?;
        self.import_slice(graph, data)
    }

    pub fn import(&mut self, graph: &mut SceneGraph, gltf: &gltf::Gltf) -> Result<ImportedModel> {
        let mut created = Vec::new();
        let result = self.build(graph, gltf, &mut created);

        if result.is_err() {
            for handle in created {
                graph.destroy(handle);
            }
        }
        result
    }

    fn build(
        &mut self,
        graph: &mut SceneGraph,
        gltf: &gltf::Gltf,
        created: &mut Vec<NodeHandle>,
    ) -> Result<ImportedModel> {
        let buffers = self.load_buffers(gltf)?;

        // Nodes
        for gltf_node in gltf.nodes() {
            let name = gltf_node
                .name()
                .map_or_else(|| format!("Node_{}", gltf_node.index()), str::to_owned);
            let handle = graph.create_node(name);
            created.push(handle);

            let renderable = match gltf_node.mesh() {
                Some(mesh) => Some(self.load_mesh(&mesh, &buffers)?),
                None => None,
            };

            if let Some(node) = graph.get_mut(handle) {
                node.transform = node_transform(gltf_node.transform());
                node.renderable = renderable;
            }
        }
        let nodes = created.clone();

        // Hierarchy
        for gltf_node in gltf.nodes() {
            let parent = node_handle(&nodes, gltf_node.index())?;
            for child in gltf_node.children() {
                if !graph.add(parent, node_handle(&nodes, child.index())?) {
                    log::warn!(
                        "glTF node {} cannot adopt node {}, edge skipped",
                        gltf_node.index(),
                        child.index()
                    );
                }
            }
        }

        self.load_skins(graph, gltf, &buffers, &nodes)?;

        let root = Self::resolve_root(graph, gltf, &nodes, created)?;

        let animations = Self::load_animations(gltf, &buffers, &nodes, graph)?;
        let mut animation_names = Vec::with_capacity(animations.len());
        if let Some(root_node) = graph.get_mut(root) {
            for (name, state) in animations {
                root_node.animation.register_state(name.clone(), state);
                animation_names.push(name);
            }
        }

        log::debug!(
            "Imported glTF: {} nodes, {} meshes, {} skins, {} animations, {} textures",
            gltf.nodes().count(),
            gltf.meshes().count(),
            gltf.skins().count(),
            animation_names.len(),
            self.texture_cache.len()
        );

        Ok(ImportedModel {
            root,
            nodes,
            animation_names,
        })
    }

    // ========================================================================
    // Buffers
    // ========================================================================

    fn load_buffers(&self, gltf: &gltf::Gltf) -> Result<Vec<Vec<u8>>> {
        let mut buffer_data = Vec::with_capacity(gltf.buffers().count());

        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => gltf
                    .blob
                    .clone()
                    .ok_or(AssetError::MissingBinaryPayload(buffer.index()))?,
                gltf::buffer::Source::Uri(uri) if is_data_uri(uri) => decode_data_uri(uri)?.data,
                gltf::buffer::Source::Uri(uri) => std::fs::read(self.resolve_uri(uri)?)?,
            };

            if data.len() < buffer.length() {
                return Err(AssetError::Truncated(format!(
                    "buffer {} ({} of {} bytes)",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                ))
                .into());
            }
            buffer_data.push(data);
        }

        Ok(buffer_data)
    }

    fn resolve_uri(&self, uri: &str) -> std::result::Result<PathBuf, AssetError> {
        self.base_path
            .as_ref()
            .map(|base| base.join(uri))
            .ok_or_else(|| AssetError::UnresolvedUri(uri.to_owned()))
    }

    // ========================================================================
    // Meshes & materials
    // ========================================================================

    fn load_mesh(&mut self, mesh: &gltf::Mesh<'_>, buffers: &[Vec<u8>]) -> Result<Renderable> {
        let mut renderable = Renderable::new(self.program);

        for gltf_primitive in mesh.primitives() {
            if gltf_primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Mesh {} uses primitive mode {:?}, drawing as triangles",
                    mesh.index(),
                    gltf_primitive.mode()
                );
            }

            let reader = gltf_primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let mut attributes = Vec::new();

            for (semantic, accessor) in gltf_primitive.attributes() {
                check_accessor(&accessor, buffers)?;

                let attribute = match semantic {
                    Semantic::Positions => reader.read_positions().map(|iter| {
                        let data: Vec<[f32; 3]> = iter.collect();
                        self.upload_attribute("a_position".to_owned(), &data, 3, ComponentType::F32)
                    }),
                    Semantic::Normals => reader.read_normals().map(|iter| {
                        let data: Vec<[f32; 3]> = iter.collect();
                        self.upload_attribute("a_normal".to_owned(), &data, 3, ComponentType::F32)
                    }),
                    Semantic::Tangents => reader.read_tangents().map(|iter| {
                        let data: Vec<[f32; 4]> = iter.collect();
                        self.upload_attribute("a_tangent".to_owned(), &data, 4, ComponentType::F32)
                    }),
                    Semantic::TexCoords(set) => reader.read_tex_coords(set).map(|read| {
                        let data: Vec<[f32; 2]> = read.into_f32().collect();
                        self.upload_attribute(format!("a_texcoord_{set}"), &data, 2, ComponentType::F32)
                    }),
                    Semantic::Colors(set) => reader.read_colors(set).map(|read| {
                        let data: Vec<[f32; 4]> = read.into_rgba_f32().collect();
                        self.upload_attribute(format!("a_color_{set}"), &data, 4, ComponentType::F32)
                    }),
                    Semantic::Joints(set) => reader.read_joints(set).map(|read| {
                        let data: Vec<[u16; 4]> = read.into_u16().collect();
                        self.upload_attribute(format!("a_joints_{set}"), &data, 4, ComponentType::U16)
                    }),
                    Semantic::Weights(set) => reader.read_weights(set).map(|read| {
                        let data: Vec<[f32; 4]> = read.into_f32().collect();
                        self.upload_attribute(format!("a_weights_{set}"), &data, 4, ComponentType::F32)
                    }),
                    #[allow(unreachable_patterns)]
                    other => {
                        log::warn!("Unsupported vertex attribute {other:?} in mesh {}, skipped", mesh.index());
                        continue;
                    }
                };

                match attribute {
                    Some(attribute) => attributes.push(attribute),
                    None => {
                        return Err(AssetError::Truncated(format!("accessor {}", accessor.index())).into());
                    }
                }
            }

            let indices = match gltf_primitive.indices() {
                Some(accessor) => {
                    check_accessor(&accessor, buffers)?;
                    let read = reader
                        .read_indices()
                        .ok_or_else(|| AssetError::Truncated(format!("accessor {}", accessor.index())))?;
                    Some(self.upload_indices(read))
                }
                None => None,
            };

            let material = self.load_material(&gltf_primitive.material(), buffers)?;

            renderable.primitives.push(Primitive {
                vertex_count: attributes
                    .iter()
                    .find(|a| a.name == "a_position")
                    .or_else(|| attributes.first())
                    .map_or(0, |a| a.count),
                attributes,
                indices,
                material,
            });
        }

        Ok(renderable)
    }

    fn upload_attribute<T: bytemuck::Pod>(
        &mut self,
        name: String,
        data: &[T],
        components: u32,
        component_type: ComponentType,
    ) -> VertexAttribute {
        VertexAttribute {
            name,
            buffer: self.gpu.create_buffer(BufferTarget::Vertex, bytemuck::cast_slice(data)),
            components,
            component_type,
            normalized: false,
            count: data.len(),
        }
    }

    fn upload_indices(&mut self, read: ReadIndices<'_>) -> IndexBuffer {
        let (format, bytes, count) = match read {
            ReadIndices::U8(iter) => {
                let data: Vec<u8> = iter.collect();
                let count = data.len();
                (IndexFormat::U8, data, count)
            }
            ReadIndices::U16(iter) => {
                let data: Vec<u16> = iter.collect();
                (IndexFormat::U16, bytemuck::cast_slice(&data).to_vec(), data.len())
            }
            ReadIndices::U32(iter) => {
                let data: Vec<u32> = iter.collect();
                (IndexFormat::U32, bytemuck::cast_slice(&data).to_vec(), data.len())
            }
        };

        IndexBuffer {
            buffer: self.gpu.create_buffer(BufferTarget::Index, &bytes),
            format,
            count,
        }
    }

    /// Textured if a base-color texture resolves, else the base-color factor.
    /// A primitive without a material is opaque white.
    fn load_material(&mut self, material: &gltf::Material<'_>, buffers: &[Vec<u8>]) -> Result<MaterialUniforms> {
        if material.index().is_none() {
            return Ok(MaterialUniforms::WHITE);
        }
        let pbr = material.pbr_metallic_roughness();

        if let Some(info) = pbr.base_color_texture()
            && let Some(texture) = self.get_or_request_texture(&info.texture(), buffers)?
        {
            return Ok(MaterialUniforms::textured(texture, info.tex_coord()));
        }

        Ok(MaterialUniforms::flat(Vec4::from_array(pbr.base_color_factor())))
    }

    /// Requests each document texture at most once per import.
    fn get_or_request_texture(
        &mut self,
        texture: &gltf::Texture<'_>,
        buffers: &[Vec<u8>],
    ) -> Result<Option<TextureHandle>> {
        if let Some(handle) = self.texture_cache.get(&texture.index()) {
            return Ok(Some(*handle));
        }

        let source = match texture.source().source() {
            gltf::image::Source::Uri { uri, mime_type } if is_data_uri(uri) => {
                let decoded = decode_data_uri(uri)?;
                TextureSource::Bytes {
                    bytes: decoded.data,
                    mime_type: decoded.mime_type.or_else(|| mime_type.map(str::to_owned)),
                }
            }
            gltf::image::Source::Uri { uri, .. } => TextureSource::Path(self.resolve_uri(uri)?),
            gltf::image::Source::View { view, mime_type } => TextureSource::Bytes {
                bytes: buffer_view_bytes(&view, buffers)?.to_vec(),
                mime_type: Some(mime_type.to_owned()),
            },
        };

        let handle = self.textures.request_2d(&mut *self.gpu, source);
        self.texture_cache.insert(texture.index(), handle);
        Ok(Some(handle))
    }

    // ========================================================================
    // Skins
    // ========================================================================

    fn load_skins(
        &mut self,
        graph: &mut SceneGraph,
        gltf: &gltf::Gltf,
        buffers: &[Vec<u8>],
        nodes: &[NodeHandle],
    ) -> Result<()> {
        for gltf_node in gltf.nodes() {
            let Some(gltf_skin) = gltf_node.skin() else {
                continue;
            };
            let handle = node_handle(nodes, gltf_node.index())?;
            let has_mesh = graph.get(handle).is_some_and(|node| node.renderable.is_some());
            if !has_mesh {
                log::warn!(
                    "glTF node {} references skin {} without a mesh, ignored",
                    gltf_node.index(),
                    gltf_skin.index()
                );
                continue;
            }

            let joints = gltf_skin
                .joints()
                .map(|joint| node_handle(nodes, joint.index()))
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let inverse_bind_matrices = match gltf_skin.inverse_bind_matrices() {
                Some(accessor) => {
                    check_accessor(&accessor, buffers)?;
                    let reader = gltf_skin.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
                    let matrices = reader
                        .read_inverse_bind_matrices()
                        .ok_or_else(|| AssetError::Truncated(format!("accessor {}", accessor.index())))?
                        .map(|m| Mat4::from_cols_array_2d(&m))
                        .collect();
                    Some(matrices)
                }
                None => None,
            };

            let name = gltf_skin
                .name()
                .map_or_else(|| format!("Skin_{}", gltf_skin.index()), str::to_owned);
            let skin = Skin::new(name, joints, inverse_bind_matrices, &mut *self.gpu)?;

            if let Some(renderable) = graph.get_mut(handle).and_then(|node| node.renderable.as_mut()) {
                renderable.skin = Some(skin);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Scene root
    // ========================================================================

    /// A single scene root becomes the import root itself. Several roots are
    /// gathered under a new node named after the scene. Nodes the scene does
    /// not reach are removed.
    fn resolve_root(
        graph: &mut SceneGraph,
        gltf: &gltf::Gltf,
        nodes: &[NodeHandle],
        created: &mut Vec<NodeHandle>,
    ) -> Result<NodeHandle> {
        let (scene_name, roots) = match gltf.default_scene().or_else(|| gltf.scenes().next()) {
            Some(scene) => {
                let roots = scene
                    .nodes()
                    .map(|node| node_handle(nodes, node.index()))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                (scene.name().map(str::to_owned), roots)
            }
            None => {
                let roots = nodes
                    .iter()
                    .copied()
                    .filter(|&node| graph.parent(node).is_none())
                    .collect();
                (None, roots)
            }
        };

        let root = match roots.as_slice() {
            [single] if graph.parent(*single).is_none() => *single,
            _ => {
                let container = graph.create_node(scene_name.unwrap_or_default());
                created.push(container);
                for &node in &roots {
                    graph.add(container, node);
                }
                container
            }
        };

        for &node in nodes {
            if node != root && graph.contains(node) && !graph.is_ancestor(root, node) {
                graph.destroy(node);
            }
        }

        Ok(root)
    }

    // ========================================================================
    // Animations
    // ========================================================================

    fn load_animations(
        gltf: &gltf::Gltf,
        buffers: &[Vec<u8>],
        nodes: &[NodeHandle],
        graph: &SceneGraph,
    ) -> Result<Vec<(String, AnimationState)>> {
        let mut animations = Vec::with_capacity(gltf.animations().count());
        let mut unnamed = 0;

        for animation in gltf.animations() {
            let name = match animation.name() {
                Some(name) => name.to_owned(),
                None => {
                    unnamed += 1;
                    format!("animation{unnamed}")
                }
            };

            let mut state = AnimationState::new().with_wrap_mode(WrapMode::Loop);
            for channel in animation.channels() {
                if let Some(channel) = load_channel(&channel, buffers, nodes, graph)? {
                    state.add_channel(channel);
                }
            }

            animations.push((name, state));
        }

        Ok(animations)
    }
}

fn load_channel(
    channel: &gltf::animation::Channel<'_>,
    buffers: &[Vec<u8>],
    nodes: &[NodeHandle],
    graph: &SceneGraph,
) -> Result<Option<AnimationChannel>> {
    let node = channel.target().node().index();
    let target = node_handle(nodes, node)?;
    if !graph.contains(target) {
        log::warn!("Animation channel targets node {node} outside the scene, skipped");
        return Ok(None);
    }

    let property = channel.target().property();
    if property == gltf::animation::Property::MorphTargetWeights {
        log::warn!("Morph target weight animation is not supported, channel skipped");
        return Ok(None);
    }

    let sampler = channel.sampler();
    let (interpolation, cubic) = match sampler.interpolation() {
        gltf::animation::Interpolation::Step => (InterpolationMode::Step, false),
        gltf::animation::Interpolation::CubicSpline => {
            log::warn!("CUBICSPLINE interpolation is sampled linearly through its keyframe values");
            (InterpolationMode::Linear, true)
        }
        gltf::animation::Interpolation::Linear => (InterpolationMode::Linear, false),
    };

    let input = sampler.input();
    let output = sampler.output();
    check_accessor(&input, buffers)?;
    check_accessor(&output, buffers)?;

    let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    let times: Vec<f32> = reader
        .read_inputs()
        .ok_or_else(|| AssetError::Truncated(format!("accessor {}", input.index())))?
        .collect();
    let outputs = reader
        .read_outputs()
        .ok_or_else(|| AssetError::Truncated(format!("accessor {}", output.index())))?;

    let track = match outputs {
        ReadOutputs::Translations(iter) => ChannelTrack::Translation(KeyframeTrack::new(
            times,
            spline_values(iter.map(Vec3::from_array).collect(), cubic),
            interpolation,
        )?),
        ReadOutputs::Rotations(rotations) => ChannelTrack::Rotation(KeyframeTrack::new(
            times,
            spline_values(rotations.into_f32().map(Quat::from_array).collect(), cubic),
            interpolation,
        )?),
        ReadOutputs::Scales(iter) => ChannelTrack::Scale(KeyframeTrack::new(
            times,
            spline_values(iter.map(Vec3::from_array).collect(), cubic),
            interpolation,
        )?),
        ReadOutputs::MorphTargetWeights(_) => return Ok(None),
    };

    Ok(Some(AnimationChannel::new(target, track)))
}

/// Cubic-spline outputs store `(in-tangent, value, out-tangent)` per key.
fn spline_values<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.chunks_exact(3).map(|key| key[1]).collect()
    } else {
        values
    }
}

fn node_transform(transform: gltf::scene::Transform) -> Transform {
    match transform {
        gltf::scene::Transform::Matrix { matrix } => Transform::from_matrix(Mat4::from_cols_array_2d(&matrix)),
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => Transform::from_trs(
            Vec3::from_array(translation),
            Quat::from_array(rotation).normalize(),
            Vec3::from_array(scale),
        ),
    }
}

fn node_handle(nodes: &[NodeHandle], index: usize) -> std::result::Result<NodeHandle, AssetError> {
    nodes
        .get(index)
        .copied()
        .ok_or_else(|| AssetError::IndexOutOfBounds {
            context: "node".to_owned(),
            index,
        })
}

/// Verifies that every element of `accessor` lies inside its buffer view and
/// the view inside its buffer, with overflow-checked arithmetic.
fn check_accessor(accessor: &gltf::Accessor<'_>, buffers: &[Vec<u8>]) -> std::result::Result<(), AssetError> {
    let truncated = || AssetError::Truncated(format!("accessor {}", accessor.index()));
    let Some(view) = accessor.view() else {
        return Ok(());
    };

    let count = accessor.count();
    if count == 0 {
        return Err(truncated());
    }

    let element_size = accessor.size();
    let stride = view.stride().unwrap_or(element_size);
    let end = stride
        .checked_mul(count - 1)
        .and_then(|n| n.checked_add(element_size))
        .and_then(|n| n.checked_add(accessor.offset()))
        .ok_or_else(truncated)?;
    if end > view.length() {
        return Err(truncated());
    }

    buffer_view_bytes(&view, buffers)?;
    Ok(())
}

fn buffer_view_bytes<'b>(
    view: &gltf::buffer::View<'_>,
    buffers: &'b [Vec<u8>],
) -> std::result::Result<&'b [u8], AssetError> {
    let buffer = buffers
        .get(view.buffer().index())
        .ok_or_else(|| AssetError::IndexOutOfBounds {
            context: "buffer".to_owned(),
            index: view.buffer().index(),
        })?;
    view.offset()
        .checked_add(view.length())
        .and_then(|end| buffer.get(view.offset()..end))
        .ok_or_else(|| AssetError::Truncated(format!("bufferView {}", view.index())))
}
