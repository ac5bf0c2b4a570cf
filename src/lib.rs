//! tabletop
//!
//! An interactive 3D renderer for a fixed tabletop scene: a table carrying a
//! laptop, a mouse and a cup, flanked by two lamp stands whose light pyramids
//! rotate slowly above them. The viewer moves through the scene with a
//! first-person free-fly camera and can switch between perspective and
//! orthographic projection at runtime. Surfaces are shaded with a two-light
//! Phong model over diffuse textures.
//!
//! High-level modules
//! - `app`: winit application handler, event loop and per-frame rendering
//! - `camera`: camera, controller, projection and view/projection uniforms
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: meshes, materials, textures and instance transforms
//! - `pipelines`: the Phong surface pipeline and the flat lamp pipeline
//! - `resources`: texture loading and procedural primitive generation
//! - `scene`: the declarative object table and its GPU instance batches
//!

pub mod app;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

pub use app::run;
