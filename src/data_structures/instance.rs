//! Instance transformation data for GPU rendering.
//!
//! Per-instance position, rotation and scale are packed into a GPU buffer so
//! several copies of the same mesh can be drawn in a single instanced call.

use cgmath::{Matrix, Matrix3, Matrix4, One, SquareMatrix};

use crate::data_structures::model;

/// Per-instance transformation: position, rotation (as quaternion), and scale.
///
/// The model matrix composes right-to-left: scale first, then rotation, then
/// translation.
#[derive(Clone, Debug)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    pub fn new(
        position: cgmath::Vector3<f32>,
        rotation: cgmath::Quaternion<f32>,
        scale: cgmath::Vector3<f32>,
    ) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        let model = self.to_matrix();
        // Normals transform with the inverse transpose of the upper 3x3 so
        // non-uniform (and negative) scales keep them perpendicular.
        let linear = Matrix3::new(
            model.x.x, model.x.y, model.x.z, //
            model.y.x, model.y.y, model.y.z, //
            model.z.x, model.z.y, model.z.z,
        );
        let normal = linear
            .invert()
            .map(|inv| inv.transpose())
            .unwrap_or_else(|| Matrix3::from(self.rotation));
        InstanceRaw {
            model: model.into(),
            normal: normal.into(),
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    /// Identity transformation: no move, rotate, or scale.
    fn default() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/**
 * The raw instance is the actual data stored on the GPU.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

/**
 * As we store instance data directly in GPU memory we need to tell what the
 * bytes refer to.
 *
 * Stride layout here: model matrix as four 4d vectors followed by the normal
 * matrix as three 3d vectors.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // We need to switch from using a step mode of Vertex to Instance
            // This means that our shaders will only change to use the next
            // instance when the shader starts processing a new instance
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Normal matrix as 3x3
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, InnerSpace, Rad, Rotation3, Transform, Vector3, Vector4};

    #[test]
    fn identity_instance_maps_points_to_themselves() {
        let instance = Instance::default();
        let p = cgmath::Point3::new(1.0, 2.0, 3.0);
        let q = instance.to_matrix().transform_point(p);
        assert!((q.x - 1.0).abs() < 1e-6);
        assert!((q.y - 2.0).abs() < 1e-6);
        assert!((q.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn matrix_composes_translate_rotate_scale() {
        let instance = Instance {
            position: Vector3::new(4.0, 0.9, 1.0),
            rotation: cgmath::Quaternion::from_angle_y(Deg(90.0)),
            scale: Vector3::new(2.0, 1.0, 3.0),
        };
        // Unit x: scaled to (2,0,0), rotated about y to (0,0,-2), translated.
        let p = instance
            .to_matrix()
            .transform_point(cgmath::Point3::new(1.0, 0.0, 0.0));
        assert!((p.x - 4.0).abs() < 1e-5);
        assert!((p.y - 0.9).abs() < 1e-5);
        assert!((p.z - -1.0).abs() < 1e-5);
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let instance = Instance {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: Vector3::new(8.0, 1.0, 3.0),
        };
        let raw = instance.to_raw();
        let normal = Matrix3::from(raw.normal);
        // A surface normal on the squashed axis must stay axis-aligned once
        // renormalized: inverse transpose of a diagonal scale is diagonal.
        let n = (normal * Vector3::unit_y()).normalize();
        assert!((n.y - 1.0).abs() < 1e-6);
        assert!(n.x.abs() < 1e-6 && n.z.abs() < 1e-6);
    }

    #[test]
    fn negative_scale_still_yields_finite_normal_matrix() {
        // The cup body mirrors the tapered cylinder with a negative y scale.
        let instance = Instance {
            position: Vector3::new(7.0, 1.5, 1.0),
            rotation: cgmath::Quaternion::from_angle_z(Rad(0.0)),
            scale: Vector3::new(0.4, -0.7, 0.4),
        };
        let raw = instance.to_raw();
        let m: [[f32; 4]; 4] = raw.model;
        let n: [[f32; 3]; 3] = raw.normal;
        for col in m.iter() {
            let v = Vector4::from(*col);
            assert!(v.x.is_finite() && v.y.is_finite() && v.z.is_finite() && v.w.is_finite());
        }
        // Mirrored y flips the normal's y sign.
        assert!(n[1][1] < 0.0);
    }
}
