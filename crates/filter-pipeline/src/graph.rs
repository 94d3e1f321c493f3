//! [`FilterGraph`]: stages chained through offscreen targets.

use anyhow::{ensure, Result};
use filter_core::geometry::TEX_COORDS_UPRIGHT;
use filter_core::{GpuApi, RenderTarget};
use tracing::{debug, warn};

use crate::filter::{DrawTarget, Filter, FrameInput, TextureUploads};
use crate::stage::{FilterStage, StageId};

/// `n` stages drawn in order through `n - 1` intermediate targets.
///
/// Stage `i` draws into target `i`; the last stage draws into the caller's
/// target. All targets share the graph's output size.
#[derive(Debug)]
pub struct FilterGraph {
    name: &'static str,
    stages: Vec<FilterStage>,
    targets: Vec<RenderTarget>,
    output_size: (u32, u32),
    destroyed: bool,
}

impl FilterGraph {
    pub fn new(name: &'static str, stages: Vec<FilterStage>) -> Result<Self> {
        ensure!(!stages.is_empty(), "filter graph {name} has no stages");
        Ok(Self {
            name,
            stages,
            targets: Vec::new(),
            output_size: (0, 0),
            destroyed: false,
        })
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn targets(&self) -> &[RenderTarget] {
        &self.targets
    }

    pub fn output_size(&self) -> (u32, u32) {
        self.output_size
    }

    fn release_targets(&mut self, gpu: &mut dyn GpuApi) {
        for target in self.targets.drain(..) {
            gpu.delete_render_target(target);
        }
    }

    fn targets_ready(&self) -> bool {
        self.targets.len() + 1 == self.stages.len()
            && self.targets.iter().all(|t| t.size() == self.output_size)
    }
}

impl Filter for FilterGraph {
    fn filter_name(&self) -> &str {
        self.name
    }

    fn init(&mut self, gpu: &mut dyn GpuApi) -> Result<()> {
        for stage in &mut self.stages {
            stage.init(gpu)?;
        }
        Ok(())
    }

    fn on_initialized(&mut self, uploads: &dyn TextureUploads) {
        for stage in &mut self.stages {
            stage.on_initialized(uploads);
        }
    }

    /// Reallocate every intermediate target at the new size, then resize
    /// every stage.
    fn on_output_size_changed(
        &mut self,
        gpu: &mut dyn GpuApi,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        if width == 0 || height == 0 {
            debug!(graph = self.name, width, height, "zero-area output, keeping targets");
            return Ok(());
        }
        if self.output_size == (width, height) && self.targets_ready() {
            return Ok(());
        }

        self.release_targets(gpu);
        self.output_size = (width, height);
        for _ in 1..self.stages.len() {
            match gpu.create_render_target(width, height) {
                Ok(target) => self.targets.push(target),
                Err(err) => {
                    self.release_targets(gpu);
                    return Err(err.context(format!("resizing {} to {width}x{height}", self.name)));
                }
            }
        }
        for stage in &mut self.stages {
            stage.on_output_size_changed(gpu, width, height);
        }

        debug!(graph = self.name, width, height, targets = self.targets.len(), "graph resized");
        Ok(())
    }

    fn draw(&mut self, gpu: &mut dyn GpuApi, input: &FrameInput, target: &DrawTarget) {
        if self.destroyed {
            return;
        }
        debug_assert!(
            self.targets.iter().all(|t| t.size() == self.output_size),
            "intermediate targets out of date"
        );
        if !self.targets_ready() {
            warn!(graph = self.name, "intermediate targets not allocated, skipping draw");
            return;
        }

        let last = self.stages.len() - 1;
        let mut frame = *input;
        for (i, stage) in self.stages.iter_mut().enumerate() {
            if i == last {
                stage.draw(gpu, &frame, target);
            } else {
                let intermediate = &self.targets[i];
                stage.draw(gpu, &frame, &DrawTarget::offscreen(intermediate));
                frame = FrameInput {
                    texture: intermediate.texture,
                    tex_coords: TEX_COORDS_UPRIGHT,
                };
            }
        }
    }

    fn set_param(&mut self, gpu: &mut dyn GpuApi, name: &str, value: f32) -> bool {
        let mut declared = false;
        for stage in &mut self.stages {
            declared |= stage.set_param(gpu, name, value);
        }
        declared
    }

    fn stage_mut(&mut self, id: StageId) -> Option<&mut FilterStage> {
        self.stages.iter_mut().find(|stage| stage.id() == id)
    }

    fn for_each_stage_mut(&mut self, f: &mut dyn FnMut(&mut FilterStage)) {
        for stage in &mut self.stages {
            f(stage);
        }
    }

    fn destroy(&mut self, gpu: &mut dyn GpuApi) {
        if self.destroyed {
            return;
        }
        for stage in &mut self.stages {
            stage.destroy(gpu);
        }
        self.release_targets(gpu);
        self.destroyed = true;
        debug!(graph = self.name, "graph destroyed");
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FilterDescriptor, ShaderSource, SizeUnits};
    use crate::shaders;
    use crate::testing::{MemoryLoader, RecordedUploads};
    use filter_core::geometry::{FULL_QUAD, TEX_COORDS_TOP_DOWN};
    use filter_core::recording::RecordingGpu;
    use filter_core::{ParamInfo, TextureId};

    fn sharpen_like() -> FilterDescriptor {
        FilterDescriptor::new("sharpen", ShaderSource::Embedded(shaders::SHARPEN_FRAGMENT))
            .with_vertex(ShaderSource::Embedded(shaders::SHARPEN_VERTEX))
            .with_size_uniforms("imageWidthFactor", "imageHeightFactor", SizeUnits::Texel)
            .with_param(ParamInfo::new("sharpness", 0.0, -4.0, 4.0))
    }

    fn graph(n: usize) -> FilterGraph {
        let loader = MemoryLoader::new();
        let stages = (0..n)
            .map(|_| FilterStage::new(&sharpen_like(), &loader).unwrap())
            .collect();
        FilterGraph::new("chain", stages).unwrap()
    }

    fn initialized(gpu: &mut RecordingGpu, n: usize) -> FilterGraph {
        let mut graph = graph(n);
        graph.init(gpu).unwrap();
        graph.on_initialized(&RecordedUploads::default());
        graph
    }

    fn screen(width: u32, height: u32) -> DrawTarget {
        DrawTarget {
            framebuffer: None,
            width,
            height,
            positions: FULL_QUAD,
            clear_color: Some([0.0, 0.0, 0.0, 1.0]),
        }
    }

    #[test]
    fn resize_propagates_to_every_target_and_stage() {
        let mut gpu = RecordingGpu::new();
        let mut graph = initialized(&mut gpu, 3);

        for (w, h) in [(320, 240), (1080, 1920)] {
            graph.on_output_size_changed(&mut gpu, w, h).unwrap();
            assert_eq!(graph.targets().len(), 2);
            assert!(graph.targets().iter().all(|t| t.size() == (w, h)));
            assert!(graph.stages().iter().all(|s| s.output_size() == (w, h)));
        }
        assert_eq!(gpu.live_framebuffer_count(), 2);

        let program = graph.stages()[2].program().unwrap();
        assert_eq!(gpu.uniform_f32(program, "imageWidthFactor"), Some(1.0 / 1080.0));
    }

    #[test]
    fn repeated_size_keeps_targets() {
        let mut gpu = RecordingGpu::new();
        let mut graph = initialized(&mut gpu, 2);
        graph.on_output_size_changed(&mut gpu, 64, 64).unwrap();
        let fb = graph.targets()[0].framebuffer;

        graph.on_output_size_changed(&mut gpu, 64, 64).unwrap();
        assert_eq!(graph.targets()[0].framebuffer, fb);
    }

    #[test]
    fn draw_chains_stage_outputs() {
        let mut gpu = RecordingGpu::new();
        let mut graph = initialized(&mut gpu, 3);
        graph.on_output_size_changed(&mut gpu, 100, 50).unwrap();
        let input = FrameInput {
            texture: TextureId(4242),
            tex_coords: TEX_COORDS_TOP_DOWN,
        };

        graph.draw(&mut gpu, &input, &screen(100, 50));

        let draws: Vec<_> = gpu.draws().cloned().collect();
        assert_eq!(draws.len(), 3);
        let targets = graph.targets();
        assert_eq!(draws[0].framebuffer, Some(targets[0].framebuffer));
        assert_eq!(draws[0].bindings[0].1, TextureId(4242));
        assert_eq!(draws[1].framebuffer, Some(targets[1].framebuffer));
        assert_eq!(draws[1].bindings[0].1, targets[0].texture);
        assert_eq!(draws[1].quad.tex_coords, TEX_COORDS_UPRIGHT);
        assert_eq!(draws[2].framebuffer, None);
        assert_eq!(draws[2].bindings[0].1, targets[1].texture);
    }

    #[test]
    fn params_reach_every_declaring_stage() {
        let mut gpu = RecordingGpu::new();
        let mut graph = initialized(&mut gpu, 2);

        assert!(graph.set_param(&mut gpu, "sharpness", 2.0));
        assert!(graph.stages().iter().all(|s| s.param("sharpness") == Some(2.0)));
        assert!(!graph.set_param(&mut gpu, "hueAdjust", 1.0));
    }

    #[test]
    fn destroy_releases_targets_once() {
        let mut gpu = RecordingGpu::new();
        let mut graph = initialized(&mut gpu, 3);
        graph.on_output_size_changed(&mut gpu, 10, 10).unwrap();

        graph.destroy(&mut gpu);
        graph.destroy(&mut gpu);
        assert!(graph.is_destroyed());
        assert!(graph.stages().iter().all(|s| s.is_destroyed()));
        assert_eq!(gpu.live_framebuffer_count(), 0);
        assert_eq!(gpu.live_program_count(), 0);

        gpu.clear_calls();
        graph.draw(
            &mut gpu,
            &FrameInput {
                texture: TextureId(1),
                tex_coords: TEX_COORDS_TOP_DOWN,
            },
            &screen(10, 10),
        );
        assert_eq!(gpu.draw_count(), 0);
    }

    #[test]
    fn zero_size_keeps_targets() {
        let mut gpu = RecordingGpu::new();
        let mut graph = initialized(&mut gpu, 3);
        graph.on_output_size_changed(&mut gpu, 64, 48).unwrap();
        let before: Vec<_> = graph.targets().iter().map(|t| t.framebuffer).collect();

        graph.on_output_size_changed(&mut gpu, 0, 0).unwrap();
        graph.on_output_size_changed(&mut gpu, 64, 0).unwrap();

        let after: Vec<_> = graph.targets().iter().map(|t| t.framebuffer).collect();
        assert_eq!(after, before);
        assert_eq!(graph.output_size(), (64, 48));
        assert_eq!(gpu.live_framebuffer_count(), 2);
    }

    #[test]
    fn failed_allocation_is_retried_by_the_next_resize() {
        let mut gpu = RecordingGpu::new();
        let mut graph = initialized(&mut gpu, 3);
        gpu.fail_render_targets(1);

        assert!(graph.on_output_size_changed(&mut gpu, 32, 32).is_err());
        assert!(graph.targets().is_empty());
        assert_eq!(gpu.live_framebuffer_count(), 0);

        graph.on_output_size_changed(&mut gpu, 32, 32).unwrap();
        assert_eq!(graph.targets().len(), 2);
        assert!(!graph.is_destroyed());
    }

    #[test]
    fn empty_graph_is_rejected() {
        assert!(FilterGraph::new("empty", Vec::new()).is_err());
    }
}
