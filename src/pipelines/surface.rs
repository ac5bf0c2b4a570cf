use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{MeshVertex, Vertex},
        texture::Texture,
    },
    resources::material_layout,
};

/// Pipeline for all lit scene geometry: textured or flat-coloured meshes
/// shaded by the two lamps.
pub fn mk_surface_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    lights_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout =
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Surface Pipeline Layout"),
            bind_group_layouts: &[
                &material_layout(device),
                camera_bind_group_layout,
                lights_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Surface Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("surface.wgsl").into()),
    };

    super::mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        &[MeshVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
