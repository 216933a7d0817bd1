//! Scene render orchestration
//!
//! Per frame the camera projection is rebuilt for the viewport aspect, then
//! each layer is drawn in order:
//!
//! 1. Clear depth only and switch to premultiplied blending.
//! 2. Standard pass. Nodes whose phase is not `Standard` are set aside, along
//!    with their subtrees.
//! 3. After the first layer's standard pass, the skybox with `LEQUAL` depth.
//! 4. Alpha pass over the set-aside nodes with depth writes off and straight
//!    alpha blending, then depth writes and blend state are restored.

use glam::{Mat4, Vec3};

use crate::render::backend::{BlendMode, DepthFunc, GpuBackend, UniformValue};
use crate::scene::graph::SceneGraph;
use crate::scene::node::RenderPhase;
use crate::scene::skin;
use crate::scene::{NodeHandle, Scene};

/// Uniforms shared by every draw in a frame.
struct FrameUniforms {
    view_projection: Mat4,
    ambient: Vec3,
    light_positions: Vec<Vec3>,
    light_colors: Vec<Vec3>,
    camera_position: Vec3,
}

pub fn render_scene(scene: &mut Scene, gpu: &mut dyn GpuBackend, width: u32, height: u32) {
    let aspect = if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    };
    scene.camera.apply(aspect);

    let frame = FrameUniforms {
        view_projection: scene.camera.view_projection(),
        ambient: scene.ambient_color,
        light_positions: scene.point_lights.iter().map(|l| l.position).collect(),
        light_colors: scene.point_lights.iter().map(|l| l.color).collect(),
        camera_position: scene.camera.position,
    };

    let layers = scene.layers().to_vec();
    let mut deferred = Vec::new();

    for (index, layer) in layers.into_iter().enumerate() {
        gpu.clear(None, true);
        gpu.set_blend_mode(BlendMode::Premultiplied);

        deferred.clear();
        render_pass(
            &mut scene.graph,
            layer,
            RenderPhase::Standard,
            &frame,
            gpu,
            Some(&mut deferred),
        );

        if index == 0
            && let Some(skybox) = &scene.skybox
        {
            gpu.set_depth_func(DepthFunc::LessEqual);
            skybox.draw(gpu, frame.view_projection);
            gpu.set_depth_func(DepthFunc::Less);
        }

        if !deferred.is_empty() {
            gpu.set_depth_write(false);
            gpu.set_blend_mode(BlendMode::Alpha);

            for &node in &deferred {
                render_pass(&mut scene.graph, node, RenderPhase::Alpha, &frame, gpu, None);
            }

            gpu.set_depth_write(true);
            gpu.set_blend_mode(BlendMode::Replace);
        }
    }
}

/// Draws the subtree at `root` for `phase`.
///
/// A node in another phase is pushed to `deferred` (or dropped when there is
/// nowhere to defer to) and its subtree is skipped. Invisible nodes skip their
/// subtree.
fn render_pass(
    graph: &mut SceneGraph,
    root: NodeHandle,
    phase: RenderPhase,
    frame: &FrameUniforms,
    gpu: &mut dyn GpuBackend,
    mut deferred: Option<&mut Vec<NodeHandle>>,
) {
    let mut stack = vec![root];

    while let Some(handle) = stack.pop() {
        let Some(node) = graph.get(handle) else {
            continue;
        };
        if !node.visible {
            continue;
        }
        if node.render_phase != phase {
            if let Some(list) = deferred.as_deref_mut() {
                list.push(handle);
            }
            continue;
        }

        stack.extend(node.children().iter().rev());
        draw_node(graph, handle, frame, gpu);
    }
}

fn draw_node(graph: &mut SceneGraph, handle: NodeHandle, frame: &FrameUniforms, gpu: &mut dyn GpuBackend) {
    let Some(node) = graph.get(handle) else {
        return;
    };
    let (Some(renderable), Some(world)) = (&node.renderable, node.world_matrix()) else {
        return;
    };

    let world = Mat4::from(*world);
    gpu.use_program(renderable.program);
    gpu.set_uniform("u_projectionMatrix", &UniformValue::Mat4(frame.view_projection));
    gpu.set_uniform("u_matrix", &UniformValue::Mat4(world));
    gpu.set_uniform(
        "u_worldInverseTranspose",
        &UniformValue::Mat4(world.inverse().transpose()),
    );
    gpu.set_uniform("u_ambientColor", &UniformValue::Vec3(frame.ambient));
    gpu.set_uniform(
        "u_lightWorldPosition",
        &UniformValue::Vec3Array(frame.light_positions.clone()),
    );
    gpu.set_uniform(
        "u_lightWorldColor",
        &UniformValue::Vec3Array(frame.light_colors.clone()),
    );
    gpu.set_uniform("u_cameraPos", &UniformValue::Vec3(frame.camera_position));
    gpu.set_uniform("u_useSkinning", &UniformValue::Bool(false));

    if skin::update_node_skin(graph, handle, gpu)
        && let Some(skin) = graph
            .get(handle)
            .and_then(|n| n.renderable.as_ref())
            .and_then(|r| r.skin.as_ref())
    {
        gpu.set_uniform(
            "u_jointTexture",
            &UniformValue::Texture {
                texture: skin.joint_texture(),
                unit: 1,
            },
        );
        gpu.set_uniform("u_numJoints", &UniformValue::Int(skin.joint_count() as i32));
        gpu.set_uniform("u_useSkinning", &UniformValue::Bool(true));
    }

    let Some(renderable) = graph.get(handle).and_then(|n| n.renderable.as_ref()) else {
        return;
    };
    for primitive in &renderable.primitives {
        primitive.draw(gpu);
    }
}
