//! GPU-agnostic building blocks for the filter pipeline.
//!
//! # Overview
//!
//! - [`GpuApi`] is the command surface stages draw through.
//! - [`GpuTexture`] / [`TextureSlot`] own auxiliary texture handles.
//! - [`DrawQueue`] serializes work onto the rendering thread.
//! - [`FilterType`] is the closed set of selectable filters.
//! - [`ResourceLoader`] supplies shader text and texture pixels.
//! - [`recording::RecordingGpu`] (feature `test-utils`) records commands in
//!   memory for tests.

pub mod filter_type;
pub mod geometry;
pub mod gpu;
pub mod loader;
pub mod logging;
pub mod parameters;
pub mod queue;
#[cfg(any(test, feature = "test-utils"))]
pub mod recording;
pub mod texture;

pub use filter_type::FilterType;
pub use gpu::{
    AttribLocation, FramebufferId, GpuApi, ProgramId, QuadDraw, RenderTarget, TextureId,
    TextureUnit, UniformLocation,
};
pub use loader::{AssetDirLoader, ResourceLoader};
pub use parameters::ParamInfo;
pub use queue::{DrawQueue, DrawTask, QueueHandle};
pub use texture::{GpuTexture, PixelBuffer, TextureSlot, TextureSource};
