//! Physics sandbox for disco mode
//!
//! Platform-free and driven one fixed tick at a time:
//! - `world`: zero-gravity rectangle bodies with elastic overlap response
//! - `binding`: the tile <-> body map (bodies never point at tiles)
//! - `sandbox`: walls, start/stop lifecycle, per-tick sync and self-healing

pub mod binding;
pub mod sandbox;
pub mod world;

pub use binding::Binding;
pub use sandbox::{Sandbox, near_edge};
pub use world::{BodyDesc, BodyHandle, RigidBody, World};
