//! [`RenderView`] drives frames on the rendering thread; [`ViewHandle`] and
//! [`MaskSink`] talk to it from anywhere else.
//!
//! Every mutation coming from outside the rendering thread travels through
//! the draw queue and is applied before the next frame draws.

use std::sync::Arc;

use anyhow::Result;
use filter_core::{DrawQueue, FilterType, GpuApi, PixelBuffer, QueueHandle, ResourceLoader};
use tracing::{debug, info, warn};

use crate::config::RenderConfig;
use crate::placement::{FillMode, Placement};
use crate::renderer::{FrameOutcome, RenderState};

/// Owns the render-thread state and its draw queue.
pub struct RenderView<G: GpuApi + 'static> {
    queue: DrawQueue<RenderState<G>>,
    state: RenderState<G>,
}

impl<G: GpuApi + 'static> RenderView<G> {
    /// Create the view on the rendering thread, with the GPU context current.
    ///
    /// The returned [`ViewHandle`] is the control surface for every other
    /// thread.
    pub fn new(
        gpu: G,
        loader: Arc<dyn ResourceLoader>,
        config: RenderConfig,
    ) -> (Self, ViewHandle<G>) {
        let queue = DrawQueue::new();
        let state = RenderState::new(gpu, loader, queue.handle(), config);
        let handle = ViewHandle {
            queue: queue.handle(),
            selected: FilterType::None,
            fill_mode: config.fill_mode,
            view_size: None,
            content_size: None,
        };
        (Self { queue, state }, handle)
    }

    /// Drain queued tasks, then draw. Call once per vertical sync.
    pub fn draw_frame(&mut self) -> FrameOutcome {
        let drained = self.queue.run_pending(&mut self.state);
        if drained > 0 {
            debug!(drained, "draw queue drained");
        }
        self.state.draw()
    }

    /// Draw frames until the view is shut down. `vsync` runs after every
    /// frame and should present and pace the loop (swap buffers).
    pub fn run(&mut self, mut vsync: impl FnMut(FrameOutcome)) {
        info!("render loop started");
        loop {
            let outcome = self.draw_frame();
            if outcome == FrameOutcome::Stopped {
                break;
            }
            vsync(outcome);
        }
        info!(frames = self.state.frames(), "render loop finished");
    }

    pub fn state(&self) -> &RenderState<G> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RenderState<G> {
        &mut self.state
    }

    pub fn gpu(&self) -> &G {
        self.state.gpu()
    }

    pub fn handle(&self) -> QueueHandle<RenderState<G>> {
        self.queue.handle()
    }
}

/// Host-side control of a [`RenderView`].
///
/// Every method returns immediately without touching the GPU or the resource
/// loader; effects land on the rendering thread before its next frame.
pub struct ViewHandle<G: GpuApi + 'static> {
    queue: QueueHandle<RenderState<G>>,
    selected: FilterType,
    fill_mode: FillMode,
    view_size: Option<(u32, u32)>,
    content_size: Option<(u32, u32)>,
}

impl<G: GpuApi + 'static> ViewHandle<G> {
    fn post(&self, what: &'static str, task: impl FnOnce(&mut RenderState<G>) + Send + 'static) {
        if !self.queue.enqueue(task) {
            warn!(task = what, "render thread gone, task dropped");
        }
    }

    /// Select `ty`. Its shaders load and its filter is built on the
    /// rendering thread.
    pub fn select_filter(&mut self, ty: FilterType) {
        self.selected = ty;
        self.post("select filter", move |state| state.select_filter(ty));
    }

    /// Select by raw identifier. Unknown identifiers return `None` and keep
    /// the current filter.
    pub fn select_filter_id(&mut self, id: u32) -> Option<FilterType> {
        let Some(ty) = FilterType::from_id(id) else {
            warn!(id, current = %self.selected, "unknown filter id, keeping current filter");
            return None;
        };
        self.select_filter(ty);
        Some(ty)
    }

    pub fn active_filter_type(&self) -> FilterType {
        self.selected
    }

    pub fn is_filtered(&self) -> bool {
        self.selected != FilterType::None
    }

    pub fn on_size_changed(&mut self, width: u32, height: u32) {
        self.view_size = Some((width, height));
        self.post("resize", move |state| state.resize(width, height));
    }

    /// The surface (and its GPU context) exists again: recreate GPU state and
    /// rebuild the selected filter.
    pub fn on_surface_created(&mut self, width: u32, height: u32) {
        self.view_size = Some((width, height));
        self.post("surface created", move |state| {
            state.surface_created(width, height)
        });
    }

    pub fn on_surface_destroyed(&mut self) {
        self.post("surface destroyed", |state| state.surface_destroyed());
    }

    pub fn push_frame(&mut self, pixels: PixelBuffer) {
        self.content_size = Some(pixels.size());
        self.post("push frame", move |state| state.push_frame(&pixels));
    }

    pub fn set_param(&self, name: &str, value: f32) {
        let name = name.to_string();
        self.post("set param", move |state| state.set_param(&name, value));
    }

    pub fn set_fill_mode(&mut self, fill_mode: FillMode) {
        self.fill_mode = fill_mode;
        self.post("fill mode", move |state| state.set_fill_mode(fill_mode));
    }

    pub fn set_mirror(&self, mirror: bool) {
        self.post("mirror", move |state| state.set_mirror(mirror));
    }

    /// Where content currently lands in the view, for touch mapping.
    /// `None` until both the view and content sizes are known.
    pub fn placement(&self) -> Option<Placement> {
        Some(Placement::compute(
            self.fill_mode,
            self.content_size?,
            self.view_size?,
        ))
    }

    pub fn mask_sink(&self) -> MaskSink<G> {
        MaskSink {
            queue: self.queue.clone(),
        }
    }

    /// Release everything and stop [`RenderView::run`].
    pub fn shutdown(&self) {
        self.post("shutdown", |state| state.shutdown());
    }
}

/// Accepts masks from an external analysis producer on any thread.
pub struct MaskSink<G: GpuApi + 'static> {
    queue: QueueHandle<RenderState<G>>,
}

impl<G: GpuApi + 'static> Clone for MaskSink<G> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<G: GpuApi + 'static> MaskSink<G> {
    /// Queue a mask for upload to every `Mask` texture slot.
    pub fn push(&self, width: u32, height: u32, channels: u8, bytes: Vec<u8>) -> Result<()> {
        let mask = Arc::new(PixelBuffer::new(width, height, channels, bytes)?);
        if !self.queue.enqueue(move |state: &mut RenderState<G>| state.push_mask(mask)) {
            debug!("render thread gone, mask dropped");
        }
        Ok(())
    }
}
