//! Render-thread state.
//!
//! [`RenderState`] owns the [`GpuApi`], the installed filter and every GPU
//! resource. It is only touched on the rendering thread: by the frame loop
//! and by tasks drained from the draw queue.

use std::sync::Arc;

use filter_core::geometry::{mirrored, TEX_COORDS_TOP_DOWN};
use filter_core::{FilterType, GpuApi, GpuTexture, PixelBuffer, QueueHandle, ResourceLoader};
use tracing::{debug, error, info, trace, warn};

use crate::config::RenderConfig;
use crate::factory::FilterFactory;
use crate::filter::{DrawTarget, Filter, FrameInput, TextureUploads};
use crate::placement::{FillMode, Placement};
use crate::stage::{FilterStage, StageId};

/// What one call to [`RenderState::draw`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// No frame has been pushed yet; the surface was cleared.
    NoInput,
    SurfaceUnavailable,
    /// Shut down; the frame loop should exit.
    Stopped,
}

impl<G: GpuApi + 'static> TextureUploads for QueueHandle<RenderState<G>> {
    fn schedule(&self, stage: StageId) {
        if !self.enqueue(move |state: &mut RenderState<G>| state.load_stage_textures(stage)) {
            debug!(%stage, "render thread gone, upload dropped");
        }
    }
}

pub struct RenderState<G: GpuApi + 'static> {
    gpu: G,
    factory: FilterFactory,
    uploads: QueueHandle<RenderState<G>>,
    config: RenderConfig,
    passthrough: Option<FilterStage>,
    active: Option<Box<dyn Filter>>,
    active_type: FilterType,
    input: Option<GpuTexture>,
    mask: Option<Arc<PixelBuffer>>,
    surface_size: Option<(u32, u32)>,
    frames: u64,
    running: bool,
}

impl<G: GpuApi + 'static> RenderState<G> {
    pub(crate) fn new(
        gpu: G,
        loader: Arc<dyn ResourceLoader>,
        uploads: QueueHandle<RenderState<G>>,
        config: RenderConfig,
    ) -> Self {
        Self {
            gpu,
            factory: FilterFactory::new(loader),
            uploads,
            config,
            passthrough: None,
            active: None,
            active_type: FilterType::None,
            input: None,
            mask: None,
            surface_size: None,
            frames: 0,
            running: true,
        }
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn factory(&self) -> &FilterFactory {
        &self.factory
    }

    /// The type most recently selected, even if its filter failed to build
    /// or is waiting for a surface.
    pub fn active_type(&self) -> FilterType {
        self.active_type
    }

    pub fn active_filter(&self) -> Option<&dyn Filter> {
        self.active.as_deref()
    }

    pub fn active_filter_mut(&mut self) -> Option<&mut (dyn Filter + 'static)> {
        self.active.as_deref_mut()
    }

    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface_size
    }

    /// The surface size, when it has a non-zero area to draw into.
    fn drawable_size(&self) -> Option<(u32, u32)> {
        self.surface_size.filter(|&(width, height)| width > 0 && height > 0)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Build the filter for `ty` from its shader sources and install it.
    ///
    /// Without a surface only the selection is recorded; the filter is built
    /// when the surface is created.
    pub fn select_filter(&mut self, ty: FilterType) {
        if self.surface_size.is_none() {
            if let Some(mut previous) = self.active.take() {
                previous.destroy(&mut self.gpu);
            }
            self.active_type = ty;
            debug!(filter = %ty, "no surface, filter will be built on surface creation");
            return;
        }
        match self.factory.select(ty) {
            Ok(filter) => self.install_filter(ty, filter),
            Err(err) => {
                error!(filter = %ty, "filter failed to build: {err:#}");
                self.install_filter(ty, None);
            }
        }
    }

    /// Swap in a built filter, destroying the previous one.
    ///
    /// A filter that fails to initialize is destroyed and the pass-through
    /// stage draws instead. One whose targets cannot be allocated yet stays
    /// installed and is resized again on the next size change.
    pub fn install_filter(&mut self, ty: FilterType, filter: Option<Box<dyn Filter>>) {
        if let Some(mut previous) = self.active.take() {
            previous.destroy(&mut self.gpu);
        }
        self.active_type = ty;

        let Some(mut filter) = filter else {
            info!(filter = %ty, "pass-through installed");
            return;
        };
        if self.surface_size.is_none() {
            debug!(filter = %ty, "no surface, filter will be rebuilt on surface creation");
            filter.destroy(&mut self.gpu);
            return;
        }

        if let Err(err) = filter.init(&mut self.gpu) {
            error!(filter = %ty, "filter failed to initialize: {err:#}");
            filter.destroy(&mut self.gpu);
            return;
        }
        filter.on_initialized(&self.uploads);
        if let Some((width, height)) = self.drawable_size() {
            if let Err(err) = filter.on_output_size_changed(&mut self.gpu, width, height) {
                warn!(filter = %ty, "filter not sized yet, retrying on next resize: {err:#}");
            }
        }
        info!(filter = %ty, name = filter.filter_name(), "filter installed");
        self.active = Some(filter);
    }

    /// Upload a stage's auxiliary textures. A stage that is no longer
    /// installed, or was destroyed, allocates nothing.
    pub fn load_stage_textures(&mut self, id: StageId) {
        let stage = self
            .active
            .as_mut()
            .and_then(|filter| filter.stage_mut(id));
        match stage {
            Some(stage) => {
                stage.load_textures(&mut self.gpu, &**self.factory.loader(), self.mask.as_deref());
            }
            None => debug!(stage = %id, "stage no longer installed, upload skipped"),
        }
    }

    pub fn surface_created(&mut self, width: u32, height: u32) {
        info!(width, height, "surface created");
        self.surface_size = Some((width, height));
        if self.passthrough.is_none() {
            let mut stage = FilterStage::passthrough();
            match stage.init(&mut self.gpu) {
                Ok(()) => self.passthrough = Some(stage),
                Err(err) => {
                    error!("pass-through stage failed to initialize: {err:#}");
                    stage.destroy(&mut self.gpu);
                }
            }
        }
        self.resize(width, height);

        if self.active.is_none() && self.active_type != FilterType::None {
            self.select_filter(self.active_type);
        }
    }

    /// Propagate a new surface size to the installed filter.
    ///
    /// A zero-area surface (a minimized window) keeps every resource as it
    /// is and draws nothing until a real size arrives.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_size = Some((width, height));
        self.gpu.surface_resized(width, height);
        if width == 0 || height == 0 {
            debug!(width, height, "zero-area surface, drawing paused");
            return;
        }
        if let Some(passthrough) = self.passthrough.as_mut() {
            passthrough.on_output_size_changed(&mut self.gpu, width, height);
        }
        if let Some(filter) = self.active.as_mut() {
            if let Err(err) = filter.on_output_size_changed(&mut self.gpu, width, height) {
                warn!(filter = %self.active_type, "resize failed, retrying on next resize: {err:#}");
            }
        }
        debug!(width, height, "surface resized");
    }

    /// Release every GPU resource. The surface must be re-created before the
    /// next frame presents.
    pub fn surface_destroyed(&mut self) {
        if let Some(mut filter) = self.active.take() {
            filter.destroy(&mut self.gpu);
        }
        if let Some(mut passthrough) = self.passthrough.take() {
            passthrough.destroy(&mut self.gpu);
        }
        if let Some(input) = self.input.take() {
            input.release(&mut self.gpu);
        }
        self.gpu.reset_state();
        self.surface_size = None;
        info!("surface destroyed, GPU resources released");
    }

    /// Replace the primary frame texture. A frame of the same size and
    /// format as the previous one is written into the existing texture.
    pub fn push_frame(&mut self, pixels: &PixelBuffer) {
        if self.surface_size.is_none() {
            trace!("no surface, frame dropped");
            return;
        }
        if let Some(input) = self.input.as_mut().filter(|input| input.matches(pixels)) {
            match input.update(&mut self.gpu, pixels) {
                Ok(()) => return,
                Err(err) => warn!("frame update failed, re-uploading: {err:#}"),
            }
        }
        if let Some(previous) = self.input.take() {
            previous.release(&mut self.gpu);
        }
        match GpuTexture::upload(&mut self.gpu, pixels) {
            Ok(texture) => self.input = Some(texture),
            Err(err) => warn!("frame upload failed: {err:#}"),
        }
    }

    /// Keep `mask` for stages installed later and refresh the mask slots of
    /// the installed filter.
    pub fn push_mask(&mut self, mask: Arc<PixelBuffer>) {
        if self.surface_size.is_some() {
            if let Some(filter) = self.active.as_mut() {
                let gpu = &mut self.gpu;
                filter.for_each_stage_mut(&mut |stage| stage.replace_mask(&mut *gpu, &mask));
            }
        }
        self.mask = Some(mask);
    }

    pub fn set_param(&mut self, name: &str, value: f32) {
        let declared = self
            .active
            .as_mut()
            .is_some_and(|filter| filter.set_param(&mut self.gpu, name, value));
        if !declared {
            debug!(param = name, "no installed stage declares parameter");
        }
    }

    pub fn set_fill_mode(&mut self, fill_mode: FillMode) {
        self.config.fill_mode = fill_mode;
    }

    pub fn set_mirror(&mut self, mirror: bool) {
        self.config.mirror = mirror;
    }

    /// Tear everything down and stop the frame loop.
    pub fn shutdown(&mut self) {
        self.surface_destroyed();
        self.mask = None;
        self.running = false;
        info!(frames = self.frames, "renderer stopped");
    }

    /// Draw one frame to the presentation surface.
    pub fn draw(&mut self) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::Stopped;
        }
        let Some((width, height)) = self.drawable_size() else {
            return FrameOutcome::SurfaceUnavailable;
        };
        let Some(input) = self.input.as_ref() else {
            self.gpu.bind_framebuffer(None);
            self.gpu.viewport(width, height);
            self.gpu.clear(self.config.clear_color);
            return FrameOutcome::NoInput;
        };

        let placement = Placement::compute(self.config.fill_mode, input.size(), (width, height));
        let tex_coords = if self.config.mirror {
            mirrored(TEX_COORDS_TOP_DOWN)
        } else {
            TEX_COORDS_TOP_DOWN
        };
        let frame = FrameInput {
            texture: input.id(),
            tex_coords,
        };
        let target = DrawTarget {
            framebuffer: None,
            width,
            height,
            positions: placement.vertices,
            clear_color: Some(self.config.clear_color),
        };

        match (self.active.as_mut(), self.passthrough.as_mut()) {
            (Some(filter), _) => filter.draw(&mut self.gpu, &frame, &target),
            (None, Some(passthrough)) => passthrough.draw(&mut self.gpu, &frame, &target),
            (None, None) => return FrameOutcome::SurfaceUnavailable,
        }
        self.frames += 1;
        FrameOutcome::Presented
    }
}
