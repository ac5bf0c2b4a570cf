//! Engine data structures: meshes, materials, textures and instances.
//!
//! - `model` contains mesh, vertex and material definitions plus draw helpers
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation data for GPU instancing

pub mod instance;
pub mod model;
pub mod texture;
