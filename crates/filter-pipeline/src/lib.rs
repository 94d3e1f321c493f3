//! Real-time image filter pipeline.
//!
//! Frames pushed through a [`ViewHandle`] are drawn by a [`RenderView`] on
//! the rendering thread, through the selected filter: a single
//! [`FilterStage`] or a [`FilterGraph`] of stages chained through offscreen
//! targets.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use filter_core::{AssetDirLoader, FilterType, PixelBuffer};
//! # use filter_pipeline::RenderConfig;
//! # fn main() -> anyhow::Result<()> {
//! let loader = Arc::new(AssetDirLoader::new("assets"));
//! // With the surface's GL context current:
//! let (mut view, mut handle) =
//!     unsafe { filter_pipeline::gl_view((1280, 720), 0, loader, RenderConfig::default())? };
//! handle.on_surface_created(1280, 720);
//! handle.select_filter(FilterType::Lomo);
//! handle.push_frame(PixelBuffer::rgba(2, 2, vec![255; 16])?);
//! view.draw_frame();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use anyhow::Result;
use filter_core::ResourceLoader;
use filter_gl::GlesApi;

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod factory;
pub mod filter;
pub mod graph;
pub mod placement;
pub mod renderer;
pub mod shaders;
pub mod stage;
pub mod view;

#[cfg(test)]
mod testing;

pub use config::RenderConfig;
pub use descriptor::{AuxTexture, FilterDescriptor, ShaderSource, SizeUniforms, SizeUnits};
pub use factory::FilterFactory;
pub use filter::{DrawTarget, Filter, FrameInput, TextureUploads};
pub use graph::FilterGraph;
pub use placement::{ContentRect, FillMode, Placement};
pub use renderer::{FrameOutcome, RenderState};
pub use stage::{FilterStage, StageId, StageState};
pub use view::{MaskSink, RenderView, ViewHandle};

/// Create a view drawing through OpenGL.
///
/// # Safety
///
/// The surface's GL context must be current on the calling thread, which
/// becomes the rendering thread.
pub unsafe fn gl_view(
    size: (u32, u32),
    host_framebuffer: u32,
    loader: Arc<dyn ResourceLoader>,
    config: RenderConfig,
) -> Result<(RenderView<GlesApi>, ViewHandle<GlesApi>)> {
    let gpu = GlesApi::new(size, host_framebuffer)?;
    Ok(RenderView::new(gpu, loader, config))
}
