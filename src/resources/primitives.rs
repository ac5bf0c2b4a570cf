//! Procedural generation of the primitive shapes the scene is built from.
//!
//! All generators are pure CPU code producing indexed triangle lists with
//! position/uv/normal vertices; [`Primitives`] uploads one GPU mesh per shape
//! and owns them for the lifetime of the process.

use std::f32::consts::{PI, TAU};

use crate::data_structures::model::{Mesh, MeshVertex};

const SECTORS: u32 = 36;
const STACKS: u32 = 18;
const TORUS_SEGMENTS: u32 = 32;
const TORUS_SIDES: u32 = 16;

/// The fixed catalog of shapes the scene table can reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Plane,
    Box,
    Sphere,
    Cylinder,
    TaperedCylinder,
    Torus,
    Pyramid,
}

impl Shape {
    pub const ALL: [Shape; 7] = [
        Shape::Plane,
        Shape::Box,
        Shape::Sphere,
        Shape::Cylinder,
        Shape::TaperedCylinder,
        Shape::Torus,
        Shape::Pyramid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Plane => "plane",
            Shape::Box => "box",
            Shape::Sphere => "sphere",
            Shape::Cylinder => "cylinder",
            Shape::TaperedCylinder => "tapered_cylinder",
            Shape::Torus => "torus",
            Shape::Pyramid => "pyramid",
        }
    }
}

/// CPU-side geometry of one shape, ready for upload.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    fn push_vertex(&mut self, position: [f32; 3], tex_coords: [f32; 2], normal: [f32; 3]) -> u32 {
        self.vertices.push(MeshVertex {
            position,
            tex_coords,
            normal,
        });
        (self.vertices.len() - 1) as u32
    }

    fn push_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }
}

pub fn generate(shape: Shape) -> MeshData {
    match shape {
        Shape::Plane => plane(),
        Shape::Box => cuboid(),
        Shape::Sphere => sphere(),
        Shape::Cylinder => conical(1.0, 1.0),
        Shape::TaperedCylinder => conical(1.0, 0.5),
        Shape::Torus => torus(0.75, 0.25),
        Shape::Pyramid => pyramid4(),
    }
}

/// A 2x2 square in the xz plane facing +y.
fn plane() -> MeshData {
    let mut data = MeshData::default();
    let n = [0.0, 1.0, 0.0];
    let a = data.push_vertex([-1.0, 0.0, -1.0], [0.0, 0.0], n);
    let b = data.push_vertex([1.0, 0.0, -1.0], [1.0, 0.0], n);
    let c = data.push_vertex([1.0, 0.0, 1.0], [1.0, 1.0], n);
    let d = data.push_vertex([-1.0, 0.0, 1.0], [0.0, 1.0], n);
    data.push_quad(a, b, c, d);
    data
}

/// A unit cube centered at the origin, one uv tile per face.
fn cuboid() -> MeshData {
    let mut data = MeshData::default();
    // (normal, tangent-u, tangent-v) per face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];
    for (normal, u, v) in faces {
        let corner = |su: f32, sv: f32| {
            [
                0.5 * (normal[0] + su * u[0] + sv * v[0]),
                0.5 * (normal[1] + su * u[1] + sv * v[1]),
                0.5 * (normal[2] + su * u[2] + sv * v[2]),
            ]
        };
        let a = data.push_vertex(corner(-1.0, -1.0), [0.0, 1.0], normal);
        let b = data.push_vertex(corner(1.0, -1.0), [1.0, 1.0], normal);
        let c = data.push_vertex(corner(1.0, 1.0), [1.0, 0.0], normal);
        let d = data.push_vertex(corner(-1.0, 1.0), [0.0, 0.0], normal);
        data.push_quad(a, b, c, d);
    }
    data
}

/// A unit-radius uv sphere.
fn sphere() -> MeshData {
    let mut data = MeshData::default();
    for stack in 0..=STACKS {
        let phi = PI * stack as f32 / STACKS as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for sector in 0..=SECTORS {
            let theta = TAU * sector as f32 / SECTORS as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let position = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
            data.push_vertex(
                position,
                [
                    sector as f32 / SECTORS as f32,
                    stack as f32 / STACKS as f32,
                ],
                position,
            );
        }
    }
    let cols = SECTORS + 1;
    for stack in 0..STACKS {
        for sector in 0..SECTORS {
            let a = stack * cols + sector;
            let b = a + 1;
            let c = a + cols + 1;
            let d = a + cols;
            data.push_quad(a, b, c, d);
        }
    }
    data
}

/// A capped cylinder from y=0 to y=1 with linearly interpolated radius.
///
/// Equal radii give the straight cylinder; `top_radius < bottom_radius`
/// gives the tapered cylinder the cup body uses.
fn conical(bottom_radius: f32, top_radius: f32) -> MeshData {
    let mut data = MeshData::default();

    // Side wall. The outward normal tilts with the slope of the profile.
    let slope = bottom_radius - top_radius;
    let side_base = data.vertices.len() as u32;
    for sector in 0..=SECTORS {
        let theta = TAU * sector as f32 / SECTORS as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let inv_len = 1.0 / (1.0 + slope * slope).sqrt();
        let normal = [cos_theta * inv_len, slope * inv_len, sin_theta * inv_len];
        let u = sector as f32 / SECTORS as f32;
        data.push_vertex(
            [bottom_radius * cos_theta, 0.0, bottom_radius * sin_theta],
            [u, 1.0],
            normal,
        );
        data.push_vertex(
            [top_radius * cos_theta, 1.0, top_radius * sin_theta],
            [u, 0.0],
            normal,
        );
    }
    for sector in 0..SECTORS {
        let a = side_base + sector * 2;
        data.push_quad(a, a + 2, a + 3, a + 1);
    }

    // Caps as triangle fans around a center vertex.
    for (y, radius, ny) in [(0.0, bottom_radius, -1.0), (1.0, top_radius, 1.0)] {
        let normal = [0.0, ny, 0.0];
        let center = data.push_vertex([0.0, y, 0.0], [0.5, 0.5], normal);
        let ring_base = data.vertices.len() as u32;
        for sector in 0..=SECTORS {
            let theta = TAU * sector as f32 / SECTORS as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            data.push_vertex(
                [radius * cos_theta, y, radius * sin_theta],
                [0.5 + 0.5 * cos_theta, 0.5 + 0.5 * sin_theta],
                normal,
            );
        }
        for sector in 0..SECTORS {
            data.indices
                .extend_from_slice(&[center, ring_base + sector, ring_base + sector + 1]);
        }
    }

    data
}

/// A torus in the xy plane: ring radius plus tube radius.
fn torus(ring_radius: f32, tube_radius: f32) -> MeshData {
    let mut data = MeshData::default();
    for segment in 0..=TORUS_SEGMENTS {
        let u = TAU * segment as f32 / TORUS_SEGMENTS as f32;
        let (sin_u, cos_u) = u.sin_cos();
        for side in 0..=TORUS_SIDES {
            let v = TAU * side as f32 / TORUS_SIDES as f32;
            let (sin_v, cos_v) = v.sin_cos();
            let position = [
                (ring_radius + tube_radius * cos_v) * cos_u,
                (ring_radius + tube_radius * cos_v) * sin_u,
                tube_radius * sin_v,
            ];
            // Normal points from the tube center to the surface point.
            let normal = [cos_v * cos_u, cos_v * sin_u, sin_v];
            data.push_vertex(
                position,
                [
                    segment as f32 / TORUS_SEGMENTS as f32,
                    side as f32 / TORUS_SIDES as f32,
                ],
                normal,
            );
        }
    }
    let cols = TORUS_SIDES + 1;
    for segment in 0..TORUS_SEGMENTS {
        for side in 0..TORUS_SIDES {
            let a = segment * cols + side;
            let b = a + cols;
            data.push_quad(a, b, b + 1, a + 1);
        }
    }
    data
}

/// A four-sided pyramid: unit square base, apex at y=0.5, base at y=-0.5.
fn pyramid4() -> MeshData {
    let mut data = MeshData::default();
    let apex: [f32; 3] = [0.0, 0.5, 0.0];
    let corners = [
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, -0.5, 0.5],
        [-0.5, -0.5, 0.5],
    ];

    // Flat-shaded side faces.
    for i in 0..4 {
        let b = corners[i];
        let c = corners[(i + 1) % 4];
        let e1 = [b[0] - apex[0], b[1] - apex[1], b[2] - apex[2]];
        let e2 = [c[0] - apex[0], c[1] - apex[1], c[2] - apex[2]];
        let cross = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];
        let len = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
        let normal = [cross[0] / len, cross[1] / len, cross[2] / len];
        let a = data.push_vertex(apex, [0.5, 0.0], normal);
        let b = data.push_vertex(b, [0.0, 1.0], normal);
        let c = data.push_vertex(c, [1.0, 1.0], normal);
        data.indices.extend_from_slice(&[a, b, c]);
    }

    // Base.
    let normal = [0.0, -1.0, 0.0];
    let a = data.push_vertex(corners[0], [0.0, 0.0], normal);
    let b = data.push_vertex(corners[1], [1.0, 0.0], normal);
    let c = data.push_vertex(corners[2], [1.0, 1.0], normal);
    let d = data.push_vertex(corners[3], [0.0, 1.0], normal);
    data.push_quad(a, b, c, d);

    data
}

/// GPU meshes for every [`Shape`], generated once at startup.
#[derive(Debug)]
pub struct Primitives {
    plane: Mesh,
    cuboid: Mesh,
    sphere: Mesh,
    cylinder: Mesh,
    tapered_cylinder: Mesh,
    torus: Mesh,
    pyramid: Mesh,
}

impl Primitives {
    pub fn new(device: &wgpu::Device) -> Self {
        let upload = |shape: Shape| {
            let data = generate(shape);
            Mesh::new(device, shape.name(), &data.vertices, &data.indices)
        };
        Self {
            plane: upload(Shape::Plane),
            cuboid: upload(Shape::Box),
            sphere: upload(Shape::Sphere),
            cylinder: upload(Shape::Cylinder),
            tapered_cylinder: upload(Shape::TaperedCylinder),
            torus: upload(Shape::Torus),
            pyramid: upload(Shape::Pyramid),
        }
    }

    pub fn mesh(&self, shape: Shape) -> &Mesh {
        match shape {
            Shape::Plane => &self.plane,
            Shape::Box => &self.cuboid,
            Shape::Sphere => &self.sphere,
            Shape::Cylinder => &self.cylinder,
            Shape::TaperedCylinder => &self.tapered_cylinder,
            Shape::Torus => &self.torus,
            Shape::Pyramid => &self.pyramid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn length(v: [f32; 3]) -> f32 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    #[test]
    fn every_shape_generates_geometry() {
        for shape in Shape::ALL {
            let data = generate(shape);
            assert!(!data.vertices.is_empty(), "{} has no vertices", shape.name());
            assert!(!data.indices.is_empty(), "{} has no indices", shape.name());
            assert_eq!(
                data.indices.len() % 3,
                0,
                "{} is not a triangle list",
                shape.name()
            );
        }
    }

    #[test]
    fn indices_stay_in_bounds() {
        for shape in Shape::ALL {
            let data = generate(shape);
            let max = data.vertices.len() as u32;
            assert!(
                data.indices.iter().all(|&i| i < max),
                "{} indexes out of bounds",
                shape.name()
            );
        }
    }

    #[test]
    fn normals_are_unit_length() {
        for shape in Shape::ALL {
            let data = generate(shape);
            for vertex in &data.vertices {
                let len = length(vertex.normal);
                assert!(
                    (len - 1.0).abs() < 1e-4,
                    "{} has a normal of length {}",
                    shape.name(),
                    len
                );
            }
        }
    }

    #[test]
    fn sphere_vertices_sit_on_unit_radius() {
        let data = generate(Shape::Sphere);
        for vertex in &data.vertices {
            assert!((length(vertex.position) - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn plane_faces_up() {
        let data = generate(Shape::Plane);
        for vertex in &data.vertices {
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
            assert_eq!(vertex.position[1], 0.0);
        }
    }

    #[test]
    fn conical_shapes_span_unit_height() {
        for shape in [Shape::Cylinder, Shape::TaperedCylinder] {
            let data = generate(shape);
            let min_y = data
                .vertices
                .iter()
                .map(|v| v.position[1])
                .fold(f32::INFINITY, f32::min);
            let max_y = data
                .vertices
                .iter()
                .map(|v| v.position[1])
                .fold(f32::NEG_INFINITY, f32::max);
            assert_eq!(min_y, 0.0);
            assert_eq!(max_y, 1.0);
        }
    }

    #[test]
    fn tapered_cylinder_narrows_toward_the_top() {
        let data = generate(Shape::TaperedCylinder);
        let radius_at = |y: f32| {
            data.vertices
                .iter()
                .filter(|v| v.position[1] == y)
                .map(|v| (v.position[0] * v.position[0] + v.position[2] * v.position[2]).sqrt())
                .fold(0.0f32, f32::max)
        };
        assert!((radius_at(0.0) - 1.0).abs() < 1e-4);
        assert!((radius_at(1.0) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn torus_tube_radius_is_respected() {
        let data = generate(Shape::Torus);
        for vertex in &data.vertices {
            let [x, y, z] = vertex.position;
            let ring_distance = (x * x + y * y).sqrt();
            // Distance from the tube's center circle equals the tube radius.
            let tube = ((ring_distance - 0.75).powi(2) + z * z).sqrt();
            assert!((tube - 0.25).abs() < 1e-4);
        }
    }

    #[test]
    fn pyramid_has_four_sides_and_a_base() {
        let data = generate(Shape::Pyramid);
        // 4 side triangles plus 2 base triangles.
        assert_eq!(data.indices.len(), 4 * 3 + 6);
        let apex_count = data
            .vertices
            .iter()
            .filter(|v| v.position == [0.0, 0.5, 0.0])
            .count();
        assert_eq!(apex_count, 4);
    }
}
