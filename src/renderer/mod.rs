//! WebGPU rendering module
//!
//! The whole field is drawn by one fullscreen fragment shader evaluating
//! signed distance fields for the ground, runner, obstacles and pickups.

pub mod sdf_pipeline;

pub use sdf_pipeline::{GlitchBand, RenderInitError, SdfRenderState};
