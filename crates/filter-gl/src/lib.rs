//! OpenGL backend for the filter pipeline.
//!
//! Use [`GlesApi`] on the rendering thread, after the surface's GL context
//! has been made current.
//!
//! ### Warning
//!
//! GL function pointers are loaded through `gl_loader` from whatever context
//! is current when the first [`GlesApi`] is created.

mod api;
mod gl_backend;
pub mod glsl;
pub mod reset;

pub use api::GlesApi;
pub use glsl::{GlslVersion, ShaderStage};
