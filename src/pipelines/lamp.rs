use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::InstanceRaw,
    model::{MeshVertex, Vertex},
    texture,
};

/// Uniform state for both lamps plus the global shading parameters.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    // xyz used, w is padding to satisfy 16 byte uniform alignment
    positions: [[f32; 4]; 2],
    colors: [[f32; 4]; 2],
    // rgb ambient colour, w ambient strength
    ambient: [f32; 4],
    // x specular intensity, y highlight size
    params: [f32; 4],
}

impl LightsUniform {
    pub fn new(
        positions: [[f32; 3]; 2],
        colors: [[f32; 3]; 2],
        ambient: [f32; 3],
        ambient_strength: f32,
        specular_intensity: f32,
        highlight_size: f32,
    ) -> Self {
        let pad = |v: [f32; 3]| [v[0], v[1], v[2], 0.0];
        Self {
            positions: [pad(positions[0]), pad(positions[1])],
            colors: [pad(colors[0]), pad(colors[1])],
            ambient: [ambient[0], ambient[1], ambient[2], ambient_strength],
            params: [specular_intensity, highlight_size, 0.0, 0.0],
        }
    }

    /// The two desk lamps lighting the tabletop.
    pub fn tabletop() -> Self {
        Self::new(
            [[7.0, 2.8, -1.0], [2.0, 1.0, -1.0]],
            [[0.5, 0.5, 0.5], [0.5, 0.5, 0.5]],
            [0.2, 0.2, 0.2],
            0.4,
            0.8,
            2.0,
        )
    }
}

pub struct LightResources {
    pub uniform: LightsUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = LightsUniform::tabletop();
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, lights_uniform: LightsUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Lights Buffer"),
        contents: bytemuck::cast_slice(&[lights_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: None,
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    lights_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: lights_buffer.as_entire_binding(),
        }],
        label: None,
    })
}

/// Pipeline for the lamp shades themselves, drawn unlit in plain white.
pub fn mk_lamp_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Lamp Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Lamp Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("lamp.wgsl").into()),
    };
    super::mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(texture::Texture::DEPTH_FORMAT),
        &[MeshVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_size_matches_wgsl_layout() {
        // 2 vec4 positions + 2 vec4 colors + ambient + params
        assert_eq!(std::mem::size_of::<LightsUniform>(), 6 * 16);
    }

    #[test]
    fn ambient_is_accumulated_once_per_light() {
        // The lighting loop must add the ambient share for each of the two
        // lights rather than seeding the accumulator with it once.
        let source = include_str!("surface.wgsl");
        let loop_body = source
            .split("for (")
            .nth(1)
            .expect("surface shader has a lighting loop");
        assert!(loop_body.contains("lighting += ambient + diffuse + specular"));

        // At the scene constants that doubles the ambient product.
        let uniform = LightsUniform::tabletop();
        let total_ambient = 2.0 * uniform.ambient[3] * uniform.ambient[0];
        assert!((total_ambient - 0.16).abs() < 1e-6);
    }

    #[test]
    fn tabletop_lights_are_padded_into_vec4s() {
        let uniform = LightsUniform::tabletop();
        assert_eq!(uniform.positions[0], [7.0, 2.8, -1.0, 0.0]);
        assert_eq!(uniform.positions[1], [2.0, 1.0, -1.0, 0.0]);
        assert_eq!(uniform.ambient, [0.2, 0.2, 0.2, 0.4]);
        assert_eq!(uniform.params[0], 0.8);
        assert_eq!(uniform.params[1], 2.0);
    }
}
