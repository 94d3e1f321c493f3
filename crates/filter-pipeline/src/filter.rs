//! The [`Filter`] trait shared by single stages and graphs.

use anyhow::Result;
use filter_core::geometry::FULL_QUAD;
use filter_core::{FramebufferId, GpuApi, RenderTarget, TextureId};

use crate::stage::{FilterStage, StageId};

/// The primary input of a draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub texture: TextureId,
    pub tex_coords: [f32; 8],
}

/// Where a draw lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawTarget {
    /// `None` is the presentation surface.
    pub framebuffer: Option<FramebufferId>,
    pub width: u32,
    pub height: u32,
    pub positions: [f32; 8],
    /// Cleared before drawing when set.
    pub clear_color: Option<[f32; 4]>,
}

impl DrawTarget {
    /// Full-quad draw into an intermediate target.
    pub fn offscreen(target: &RenderTarget) -> Self {
        Self {
            framebuffer: Some(target.framebuffer),
            width: target.width,
            height: target.height,
            positions: FULL_QUAD,
            clear_color: None,
        }
    }
}

/// Schedules a stage's auxiliary texture upload on the rendering thread.
pub trait TextureUploads {
    fn schedule(&self, stage: StageId);
}

/// A filter that can be installed on the render thread: one stage or a graph.
///
/// Construction may happen on any thread. Every method taking a
/// [`GpuApi`] runs on the rendering thread.
pub trait Filter: Send {
    fn filter_name(&self) -> &str;

    /// Compile programs and resolve uniform locations.
    fn init(&mut self, gpu: &mut dyn GpuApi) -> Result<()>;

    /// Schedule deferred texture uploads.
    fn on_initialized(&mut self, uploads: &dyn TextureUploads);

    fn on_output_size_changed(
        &mut self,
        gpu: &mut dyn GpuApi,
        width: u32,
        height: u32,
    ) -> Result<()>;

    fn draw(&mut self, gpu: &mut dyn GpuApi, input: &FrameInput, target: &DrawTarget);

    /// Returns whether any stage declares `name`.
    fn set_param(&mut self, gpu: &mut dyn GpuApi, name: &str, value: f32) -> bool;

    fn stage_mut(&mut self, id: StageId) -> Option<&mut FilterStage>;

    fn for_each_stage_mut(&mut self, f: &mut dyn FnMut(&mut FilterStage));

    /// Release every GPU resource. Calling it again is a no-op.
    fn destroy(&mut self, gpu: &mut dyn GpuApi);

    fn is_destroyed(&self) -> bool;
}
