//! The tabletop scene as data: a table of object descriptors, grouped into
//! instanced draw batches per shape and material.

use cgmath::{InnerSpace, One, Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::Instance,
        model::{Material, MaterialUniform},
        texture::Texture,
    },
    resources::{
        self,
        primitives::{Primitives, Shape},
    },
};

/// The texture images the scene uses, one file per slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Table,
    LaptopLid,
    LaptopBack,
    Logo,
    Mouse,
    Cup,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 6] = [
        TextureSlot::Table,
        TextureSlot::LaptopLid,
        TextureSlot::LaptopBack,
        TextureSlot::Logo,
        TextureSlot::Mouse,
        TextureSlot::Cup,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            TextureSlot::Table => "table.png",
            TextureSlot::LaptopLid => "laptop_lid.png",
            TextureSlot::LaptopBack => "laptop_back.png",
            TextureSlot::Logo => "logo.png",
            TextureSlot::Mouse => "mouse.png",
            TextureSlot::Cup => "cup.png",
        }
    }
}

/// How an object is coloured: a texture slot or a flat colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Finish {
    Textured(TextureSlot),
    Flat([f32; 4]),
}

/// One object in the scene: a shape plus its finish and transform.
///
/// Rotation is an angle in radians around an axis, matching how the
/// transforms were authored.
#[derive(Clone, Copy, Debug)]
pub struct ObjectDesc {
    pub name: &'static str,
    pub shape: Shape,
    pub finish: Finish,
    pub scale: [f32; 3],
    pub rotation: (f32, [f32; 3]),
    pub translation: [f32; 3],
}

impl ObjectDesc {
    pub fn to_instance(&self) -> Instance {
        let (angle, axis) = self.rotation;
        let rotation = if angle == 0.0 {
            Quaternion::one()
        } else {
            Quaternion::from_axis_angle(Vector3::from(axis).normalize(), Rad(angle))
        };
        Instance::new(
            self.translation.into(),
            rotation,
            Vector3::from(self.scale),
        )
    }
}

const NO_ROTATION: (f32, [f32; 3]) = (0.0, [0.0, 1.0, 0.0]);

/// The static objects on the table: the table top itself, a laptop with its
/// logo, a mouse, a cup of coffee and the two lamp stands.
pub fn tabletop_objects() -> Vec<ObjectDesc> {
    use Finish::Textured;
    use TextureSlot::*;

    vec![
        ObjectDesc {
            name: "table",
            shape: Shape::Plane,
            finish: Textured(Table),
            scale: [8.0, 1.0, 3.0],
            rotation: NO_ROTATION,
            translation: [0.0, 0.8, 1.0],
        },
        ObjectDesc {
            name: "laptop_base",
            shape: Shape::Box,
            finish: Textured(LaptopLid),
            scale: [4.0, 0.2, 2.0],
            rotation: NO_ROTATION,
            translation: [4.0, 0.9, 1.0],
        },
        ObjectDesc {
            name: "laptop_screen",
            shape: Shape::Box,
            finish: Textured(LaptopBack),
            scale: [2.8, 0.2, 0.01],
            rotation: NO_ROTATION,
            translation: [4.0, 0.9, 2.0],
        },
        ObjectDesc {
            name: "logo_disc_left",
            shape: Shape::Sphere,
            finish: Textured(Logo),
            scale: [0.3, 0.006, 0.2],
            rotation: (-35.0, [0.0, 1.0, 0.0]),
            translation: [4.0, 1.0, 1.0],
        },
        ObjectDesc {
            name: "logo_disc_right",
            shape: Shape::Sphere,
            finish: Textured(Logo),
            scale: [0.3, 0.006, 0.2],
            rotation: NO_ROTATION,
            translation: [4.08, 1.0, 1.12],
        },
        ObjectDesc {
            name: "logo_bar",
            shape: Shape::Box,
            finish: Textured(Logo),
            scale: [0.33, 0.006, 0.1],
            rotation: (35.0, [0.0, 1.0, 0.0]),
            translation: [3.8, 1.0, 1.0],
        },
        ObjectDesc {
            name: "mouse_body",
            shape: Shape::Sphere,
            finish: Textured(Mouse),
            scale: [0.2, 0.18, 0.35],
            rotation: (173.0, [1.0, 0.0, 0.0]),
            translation: [1.5, 0.94, 1.5],
        },
        ObjectDesc {
            name: "mouse_base",
            shape: Shape::Box,
            finish: Textured(Mouse),
            scale: [0.3, 0.22, 0.35],
            rotation: (170.0, [1.0, 0.0, 0.0]),
            translation: [1.5, 0.86, 1.33],
        },
        // The negative y scale turns the tapered cylinder upside down so
        // the cup is wider at the rim.
        ObjectDesc {
            name: "cup_body",
            shape: Shape::TaperedCylinder,
            finish: Textured(Cup),
            scale: [0.4, -0.7, 0.4],
            rotation: NO_ROTATION,
            translation: [7.0, 1.5, 1.0],
        },
        ObjectDesc {
            name: "cup_handle",
            shape: Shape::Torus,
            finish: Textured(Cup),
            scale: [0.15, 0.3, 1.0],
            rotation: (-0.65, [0.0, 0.0, 1.0]),
            translation: [7.3, 1.2, 1.05],
        },
        ObjectDesc {
            name: "cup_top",
            shape: Shape::Sphere,
            finish: Textured(LaptopLid),
            scale: [0.38, 0.05, 0.4],
            rotation: NO_ROTATION,
            translation: [7.0, 1.47, 1.0],
        },
        ObjectDesc {
            name: "lamp_stand_left",
            shape: Shape::Cylinder,
            finish: Textured(Mouse),
            scale: [0.2, 0.8, 0.2],
            rotation: NO_ROTATION,
            translation: [1.0, 1.0, -1.0],
        },
        ObjectDesc {
            name: "lamp_stand_right",
            shape: Shape::Cylinder,
            finish: Textured(Mouse),
            scale: [0.2, 0.8, 0.2],
            rotation: NO_ROTATION,
            translation: [7.0, 1.0, -1.0],
        },
        ObjectDesc {
            name: "lamp_base_left",
            shape: Shape::Box,
            finish: Textured(Mouse),
            scale: [1.0, 0.14, 0.8],
            rotation: NO_ROTATION,
            translation: [1.0, 1.0, -1.0],
        },
        ObjectDesc {
            name: "lamp_base_right",
            shape: Shape::Box,
            finish: Textured(Mouse),
            scale: [1.0, 0.14, 0.8],
            rotation: NO_ROTATION,
            translation: [7.0, 1.0, -1.0],
        },
    ]
}

/// Every texture is tiled the same way.
pub const UV_SCALE: [f32; 2] = [2.0, 3.0];

const LAMP_SCALE: [f32; 3] = [1.0, 2.0, 0.8];
const LAMP_POSITIONS: [[f32; 3]; 2] = [[1.0, 2.8, -1.0], [7.0, 2.8, -1.0]];
// 0.003 rad per frame at a 60 fps cadence, made frame-rate independent.
const LAMP_SPIN_RATE: f32 = 0.18;
// The second shade leads the shared angle by a small constant phase.
const LAMP_PHASE_OFFSET: f32 = 0.002;

/// Both shades turn at the same rate; only their phase differs.
fn lamp_angles(angle: f32) -> [f32; 2] {
    [angle, angle + LAMP_PHASE_OFFSET]
}

/// One instanced draw: a shape, a material and the instances drawn with it.
pub struct Batch {
    pub shape: Shape,
    pub material: Material,
    pub instances: Vec<Instance>,
    pub instance_buffer: wgpu::Buffer,
}

pub struct Scene {
    pub primitives: Primitives,
    pub batches: Vec<Batch>,
    pub lamp_instances: Vec<Instance>,
    pub lamp_buffer: wgpu::Buffer,
    lamp_angle: f32,
}

impl Scene {
    pub fn new(ctx: &Context) -> anyhow::Result<Self> {
        let primitives = Primitives::new(&ctx.device);
        let layout = resources::material_layout(&ctx.device);

        // Group the descriptor table into one batch per (shape, finish)
        // pair, preserving first-seen order.
        let mut groups: Vec<(Shape, Finish, Vec<Instance>)> = Vec::new();
        for desc in tabletop_objects() {
            let instance = desc.to_instance();
            let slot = groups
                .iter()
                .position(|(shape, finish, _)| *shape == desc.shape && *finish == desc.finish);
            match slot {
                Some(i) => groups[i].2.push(instance),
                None => groups.push((desc.shape, desc.finish, vec![instance])),
            }
        }

        let mut batches = Vec::with_capacity(groups.len());
        for (shape, finish, instances) in groups {
            let (texture, uniform) = match finish {
                Finish::Textured(slot) => {
                    let texture =
                        resources::load_texture(slot.file_name(), &ctx.device, &ctx.queue)?;
                    (texture, MaterialUniform::textured(UV_SCALE))
                }
                Finish::Flat(color) => {
                    let rgba = color.map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
                    let texture =
                        Texture::one_pixel(&ctx.device, &ctx.queue, rgba, "flat colour")?;
                    (texture, MaterialUniform::flat(color))
                }
            };
            let material = Material::new(&ctx.device, shape.name(), texture, uniform, &layout);
            let raw = instances.iter().map(Instance::to_raw).collect::<Vec<_>>();
            let instance_buffer =
                ctx.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Instance Buffer"),
                        contents: bytemuck::cast_slice(&raw),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
            batches.push(Batch {
                shape,
                material,
                instances,
                instance_buffer,
            });
        }

        let lamp_instances = LAMP_POSITIONS
            .iter()
            .zip(lamp_angles(0.0))
            .map(|(&position, angle)| {
                Instance::new(
                    position.into(),
                    Quaternion::from_angle_y(Rad(angle)),
                    LAMP_SCALE.into(),
                )
            })
            .collect::<Vec<_>>();
        let raw = lamp_instances
            .iter()
            .map(Instance::to_raw)
            .collect::<Vec<_>>();
        let lamp_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Lamp Instance Buffer"),
                contents: bytemuck::cast_slice(&raw),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });

        Ok(Self {
            primitives,
            batches,
            lamp_instances,
            lamp_buffer,
            lamp_angle: 0.0,
        })
    }

    /// Spin the lamp shades and push the new transforms to the GPU.
    pub fn update(&mut self, dt: Duration, ctx: &Context) {
        self.lamp_angle += LAMP_SPIN_RATE * dt.as_secs_f32();
        for (instance, angle) in self
            .lamp_instances
            .iter_mut()
            .zip(lamp_angles(self.lamp_angle))
        {
            instance.rotation = Quaternion::from_angle_y(Rad(angle));
        }
        let raw = self
            .lamp_instances
            .iter()
            .map(Instance::to_raw)
            .collect::<Vec<_>>();
        ctx.queue
            .write_buffer(&self.lamp_buffer, 0, bytemuck::cast_slice(&raw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_has_fifteen_objects() {
        assert_eq!(tabletop_objects().len(), 15);
    }

    #[test]
    fn every_texture_slot_is_used() {
        let objects = tabletop_objects();
        for slot in TextureSlot::ALL {
            assert!(
                objects
                    .iter()
                    .any(|desc| desc.finish == Finish::Textured(slot)),
                "{:?} is never referenced",
                slot
            );
        }
    }

    #[test]
    fn object_names_are_unique() {
        let objects = tabletop_objects();
        for (i, a) in objects.iter().enumerate() {
            for b in &objects[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn cup_body_is_flipped_upside_down() {
        let objects = tabletop_objects();
        let cup = objects.iter().find(|d| d.name == "cup_body").unwrap();
        assert_eq!(cup.shape, Shape::TaperedCylinder);
        assert!(cup.scale[1] < 0.0);
    }

    #[test]
    fn unrotated_objects_get_the_identity_quaternion() {
        let objects = tabletop_objects();
        let table = objects.iter().find(|d| d.name == "table").unwrap();
        let instance = table.to_instance();
        assert_eq!(instance.rotation, Quaternion::one());
    }

    #[test]
    fn rotations_are_applied_about_the_given_axis() {
        let objects = tabletop_objects();
        let mouse = objects.iter().find(|d| d.name == "mouse_body").unwrap();
        let (angle, axis) = mouse.rotation;
        assert_eq!(angle, 173.0);
        assert_eq!(axis, [1.0, 0.0, 0.0]);
        let instance = mouse.to_instance();
        // A rotation about x leaves the x axis fixed.
        let rotated = instance.rotation * Vector3::unit_x();
        assert!((rotated.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn lamp_shades_spin_at_one_rate_with_a_fixed_phase() {
        let early = lamp_angles(1.0);
        let late = lamp_angles(2.5);
        // Both shades advance by the same amount over the same interval.
        assert_eq!(late[0] - early[0], late[1] - early[1]);
        // The offset between the two shades never changes.
        assert!((early[1] - early[0] - LAMP_PHASE_OFFSET).abs() < 1e-6);
        assert!((late[1] - late[0] - LAMP_PHASE_OFFSET).abs() < 1e-6);
    }

    #[test]
    fn flat_finishes_disable_texture_sampling() {
        let color = [1.0, 0.5, 0.25, 1.0];
        let uniform = match Finish::Flat(color) {
            Finish::Flat(c) => MaterialUniform::flat(c),
            Finish::Textured(_) => unreachable!(),
        };
        assert_eq!(uniform.has_texture, 0);
        assert_eq!(uniform.object_color, color);
        assert_eq!(uniform.uv_scale, [1.0, 1.0]);
        // Textured materials flip the flag and carry the shared uv scale.
        let textured = MaterialUniform::textured(UV_SCALE);
        assert_eq!(textured.has_texture, 1);
        assert_eq!(textured.uv_scale, UV_SCALE);
    }

    #[test]
    fn batching_groups_by_shape_and_finish() {
        let objects = tabletop_objects();
        // The two lamp stands share a shape and a finish.
        let stands = objects
            .iter()
            .filter(|d| d.shape == Shape::Cylinder)
            .collect::<Vec<_>>();
        assert_eq!(stands.len(), 2);
        assert_eq!(stands[0].finish, stands[1].finish);
    }
}
