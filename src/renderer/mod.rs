//! Portal rendering module
//!
//! Orchestrates the recursive portal passes over a `SceneBackend`; the scene
//! itself (meshes, materials, lights) belongs to the backend.

pub mod camera;
pub mod portal_pass;
pub mod targets;
pub mod visibility;

pub use camera::Camera;
pub use portal_pass::{FrameReport, PortalRenderer, SceneBackend, SurfaceSource};
pub use targets::{PortalTargets, TargetHandle};
