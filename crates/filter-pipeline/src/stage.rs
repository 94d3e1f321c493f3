//! [`FilterStage`]: one shader program plus its auxiliary textures.
//!
//! Lifecycle:
//!
//! 1. [`FilterStage::new`] resolves shader text (any thread).
//! 2. [`FilterStage::init`] links the program and resolves uniform locations.
//! 3. [`FilterStage::on_initialized`] schedules texture uploads on the draw
//!    queue; the queued task calls [`FilterStage::load_textures`].
//! 4. [`FilterStage::draw`] brackets the quad draw with
//!    [`on_draw_arrays_pre`](FilterStage::on_draw_arrays_pre) and
//!    [`on_draw_arrays_after`](FilterStage::on_draw_arrays_after).
//! 5. [`FilterStage::destroy`] releases everything, once.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{ensure, Context, Result};
use filter_core::{
    AttribLocation, GpuApi, GpuTexture, ParamInfo, PixelBuffer, ProgramId, QuadDraw,
    ResourceLoader, TextureSlot, TextureSource, TextureUnit, UniformLocation,
};
use tracing::{debug, trace, warn};

use crate::descriptor::{FilterDescriptor, SizeUniforms};
use crate::filter::{DrawTarget, Filter, FrameInput, TextureUploads};
use crate::shaders;

static NEXT_STAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a stage across the draw queue, so a queued upload can find
/// (or fail to find) its stage when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageId(u64);

impl StageId {
    fn next() -> Self {
        StageId(NEXT_STAGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Created,
    /// Program linked, uniforms resolved.
    Initialized,
    /// Every auxiliary texture uploaded.
    ResourcesLoaded,
    /// Drawn at least once with its textures loaded.
    Active,
    Destroyed,
}

#[derive(Debug)]
struct AuxBinding {
    uniform: String,
    source: TextureSource,
    location: Option<UniformLocation>,
    slot: TextureSlot,
}

#[derive(Debug)]
struct ParamBinding {
    info: ParamInfo,
    location: Option<UniformLocation>,
    value: f32,
}

#[derive(Debug, Default)]
struct SizeLocations {
    width: Option<UniformLocation>,
    height: Option<UniformLocation>,
}

#[derive(Debug)]
pub struct FilterStage {
    id: StageId,
    name: &'static str,
    vertex_source: Cow<'static, str>,
    fragment_source: Cow<'static, str>,
    program: Option<ProgramId>,
    position: Option<AttribLocation>,
    tex_coord: Option<AttribLocation>,
    input_location: Option<UniformLocation>,
    aux: Vec<AuxBinding>,
    size_uniforms: Option<SizeUniforms>,
    size_locations: SizeLocations,
    params: Vec<ParamBinding>,
    output_size: (u32, u32),
    bound_units: Vec<TextureUnit>,
    state: StageState,
}

impl FilterStage {
    /// Build a stage from a descriptor, loading any shader text it references.
    pub fn new(desc: &FilterDescriptor, loader: &dyn ResourceLoader) -> Result<Self> {
        let vertex = desc.vertex.resolve(loader)?;
        let fragment = desc.fragment.resolve(loader)?;
        Ok(Self::with_sources(desc, vertex, fragment))
    }

    /// The pass-through stage drawn when no filter is selected.
    pub fn passthrough() -> Self {
        Self::with_sources(
            &FilterDescriptor::passthrough(),
            Cow::Borrowed(shaders::VERTEX),
            Cow::Borrowed(shaders::PASSTHROUGH_FRAGMENT),
        )
    }

    fn with_sources(
        desc: &FilterDescriptor,
        vertex_source: Cow<'static, str>,
        fragment_source: Cow<'static, str>,
    ) -> Self {
        let aux = desc
            .aux_textures
            .iter()
            .map(|tex| AuxBinding {
                uniform: tex.uniform.clone(),
                source: tex.source.clone(),
                location: None,
                slot: TextureSlot::Pending,
            })
            .collect();
        let params = desc
            .params
            .iter()
            .map(|info| ParamBinding {
                info: info.clone(),
                location: None,
                value: info.default,
            })
            .collect();

        Self {
            id: StageId::next(),
            name: desc.name,
            vertex_source,
            fragment_source,
            program: None,
            position: None,
            tex_coord: None,
            input_location: None,
            aux,
            size_uniforms: desc.size_uniforms.clone(),
            size_locations: SizeLocations::default(),
            params,
            output_size: (0, 0),
            bound_units: Vec::new(),
            state: StageState::Created,
        }
    }

    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn output_size(&self) -> (u32, u32) {
        self.output_size
    }

    pub fn aux_count(&self) -> usize {
        self.aux.len()
    }

    pub fn loaded_texture_count(&self) -> usize {
        self.aux.iter().filter(|aux| aux.slot.is_loaded()).count()
    }

    /// Current value of a declared parameter.
    pub fn param(&self, name: &str) -> Option<f32> {
        self.params
            .iter()
            .find(|p| p.info.name == name)
            .map(|p| p.value)
    }

    pub fn declares_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.info.name == name)
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == StageState::Destroyed
    }

    /// Link the program and resolve every uniform the stage uses.
    ///
    /// Uniforms the shader does not declare resolve to nothing and are
    /// skipped at bind time.
    pub fn init(&mut self, gpu: &mut dyn GpuApi) -> Result<()> {
        ensure!(
            self.state == StageState::Created,
            "{} ({}) initialized twice",
            self.name,
            self.id
        );

        let program = gpu
            .create_program(&self.vertex_source, &self.fragment_source)
            .with_context(|| format!("building program for {}", self.name))?;
        self.program = Some(program);

        self.position = gpu.attrib_location(program, "position");
        self.tex_coord = gpu.attrib_location(program, "inputTextureCoordinate");
        ensure!(
            self.position.is_some(),
            "{} vertex shader has no `position` attribute",
            self.name
        );
        self.input_location = gpu.uniform_location(program, "inputImageTexture");

        for aux in &mut self.aux {
            aux.location = gpu.uniform_location(program, &aux.uniform);
            if aux.location.is_none() {
                debug!(stage = %self.id, uniform = %aux.uniform, "sampler uniform not found, binds skipped");
            }
        }

        if let Some(size) = &self.size_uniforms {
            self.size_locations = SizeLocations {
                width: gpu.uniform_location(program, size.width),
                height: gpu.uniform_location(program, size.height),
            };
        }

        gpu.use_program(program);
        for param in &mut self.params {
            param.location = gpu.uniform_location(program, param.info.name);
            match param.location {
                Some(location) => gpu.set_uniform_f32(location, param.value),
                None => {
                    debug!(stage = %self.id, param = param.info.name, "parameter uniform not found")
                }
            }
        }

        self.state = StageState::Initialized;
        debug!(stage = %self.id, name = self.name, program = program.0, "stage initialized");
        Ok(())
    }

    /// Schedule the auxiliary texture upload. Stages without auxiliary
    /// textures are ready immediately.
    pub fn on_initialized(&mut self, uploads: &dyn TextureUploads) {
        if self.state != StageState::Initialized {
            return;
        }
        if self.aux.is_empty() {
            self.state = StageState::ResourcesLoaded;
        } else {
            uploads.schedule(self.id);
        }
    }

    /// Upload every auxiliary texture still pending. Runs inside a draw-queue
    /// task; a stage destroyed in the meantime allocates nothing.
    ///
    /// `Mask` slots are filled from `mask` when one is available and stay
    /// pending otherwise. Returns the number of textures uploaded.
    pub fn load_textures(
        &mut self,
        gpu: &mut dyn GpuApi,
        loader: &dyn ResourceLoader,
        mask: Option<&PixelBuffer>,
    ) -> usize {
        if self.is_destroyed() {
            debug!(stage = %self.id, "stage destroyed before its textures loaded, skipping upload");
            return 0;
        }

        let mut uploaded = 0;
        for aux in &mut self.aux {
            if aux.slot.is_loaded() {
                continue;
            }
            let loaded;
            let pixels = match &aux.source {
                TextureSource::Asset(path) => match loader.load_texture(path) {
                    Ok(pixels) => {
                        loaded = pixels;
                        &loaded
                    }
                    Err(err) => {
                        warn!(stage = %self.id, path = %path, "texture failed to load: {err:#}");
                        continue;
                    }
                },
                TextureSource::Pixels(pixels) => pixels.as_ref(),
                TextureSource::Mask => match mask {
                    Some(mask) => mask,
                    None => continue,
                },
            };
            match GpuTexture::upload(gpu, pixels) {
                Ok(texture) => {
                    aux.slot.fill(gpu, texture);
                    uploaded += 1;
                }
                Err(err) => warn!(stage = %self.id, uniform = %aux.uniform, "texture upload failed: {err:#}"),
            }
        }

        self.mark_loaded_if_complete();
        let pending = self.aux.len() - self.loaded_texture_count();
        debug!(stage = %self.id, uploaded, pending, "auxiliary textures loaded");
        uploaded
    }

    fn mark_loaded_if_complete(&mut self) {
        if self.state == StageState::Initialized && self.aux.iter().all(|aux| aux.slot.is_loaded()) {
            self.state = StageState::ResourcesLoaded;
        }
    }

    /// Replace the contents of every `Mask` slot with `mask`.
    pub fn replace_mask(&mut self, gpu: &mut dyn GpuApi, mask: &PixelBuffer) {
        if self.is_destroyed() || self.program.is_none() {
            return;
        }
        for aux in &mut self.aux {
            if !matches!(aux.source, TextureSource::Mask) {
                continue;
            }
            match GpuTexture::upload(gpu, mask) {
                Ok(texture) => aux.slot.fill(gpu, texture),
                Err(err) => warn!(stage = %self.id, "mask upload failed: {err:#}"),
            }
        }
        self.mark_loaded_if_complete();
    }

    /// Update size-dependent uniforms. A repeated size is a no-op.
    pub fn on_output_size_changed(&mut self, gpu: &mut dyn GpuApi, width: u32, height: u32) {
        if self.output_size == (width, height) || self.is_destroyed() {
            return;
        }
        self.output_size = (width, height);

        let (Some(program), Some(size)) = (self.program, &self.size_uniforms) else {
            return;
        };
        gpu.use_program(program);
        if let Some(location) = self.size_locations.width {
            gpu.set_uniform_f32(location, size.units.value(width));
        }
        if let Some(location) = self.size_locations.height {
            gpu.set_uniform_f32(location, size.units.value(height));
        }
        trace!(stage = %self.id, width, height, "size uniforms updated");
    }

    /// Set a declared parameter, clamped to its range. Returns `false` when
    /// the stage has no such parameter.
    pub fn set_param(&mut self, gpu: &mut dyn GpuApi, name: &str, value: f32) -> bool {
        let Some(param) = self.params.iter_mut().find(|p| p.info.name == name) else {
            return false;
        };
        param.value = param.info.clamp(value);

        if let (Some(program), Some(location)) = (self.program, param.location) {
            if self.state != StageState::Destroyed {
                gpu.use_program(program);
                gpu.set_uniform_f32(location, param.value);
            }
        }
        true
    }

    /// Draw `input` into `target` with this stage's program.
    pub fn draw(&mut self, gpu: &mut dyn GpuApi, input: &FrameInput, target: &DrawTarget) {
        let (Some(program), Some(position)) = (self.program, self.position) else {
            return;
        };
        if self.is_destroyed() {
            return;
        }

        gpu.bind_framebuffer(target.framebuffer);
        gpu.viewport(target.width, target.height);
        if let Some(color) = target.clear_color {
            gpu.clear(color);
        }
        gpu.use_program(program);

        gpu.active_texture(TextureUnit::PRIMARY);
        gpu.bind_texture(Some(input.texture));
        if let Some(location) = self.input_location {
            gpu.set_uniform_i32(location, TextureUnit::PRIMARY.sampler_index());
        }

        self.on_draw_arrays_pre(gpu);
        gpu.draw_quad(&QuadDraw {
            position,
            tex_coord: self.tex_coord,
            positions: target.positions,
            tex_coords: input.tex_coords,
        });
        self.on_draw_arrays_after(gpu);

        gpu.bind_texture(None);

        if self.state == StageState::ResourcesLoaded {
            self.state = StageState::Active;
        }
    }

    /// Bind every loaded auxiliary texture whose sampler resolved, each to
    /// its own unit starting at [`TextureUnit::AUX_OFFSET`].
    pub fn on_draw_arrays_pre(&mut self, gpu: &mut dyn GpuApi) {
        for (index, aux) in self.aux.iter().enumerate() {
            let (Some(texture), Some(location)) = (aux.slot.texture(), aux.location) else {
                continue;
            };
            let unit = TextureUnit::auxiliary(index);
            gpu.active_texture(unit);
            gpu.bind_texture(Some(texture.id()));
            gpu.set_uniform_i32(location, unit.sampler_index());
            self.bound_units.push(unit);
        }
    }

    /// Unbind what [`on_draw_arrays_pre`](Self::on_draw_arrays_pre) bound and
    /// make the primary unit active again.
    pub fn on_draw_arrays_after(&mut self, gpu: &mut dyn GpuApi) {
        for unit in self.bound_units.drain(..) {
            gpu.active_texture(unit);
            gpu.bind_texture(None);
        }
        gpu.active_texture(TextureUnit::PRIMARY);
    }

    /// Release the program and every auxiliary texture. Idempotent, and safe
    /// whether or not the textures ever finished loading.
    pub fn destroy(&mut self, gpu: &mut dyn GpuApi) {
        if self.is_destroyed() {
            return;
        }
        for aux in &mut self.aux {
            aux.slot.release(gpu);
        }
        if let Some(program) = self.program.take() {
            gpu.delete_program(program);
        }
        self.bound_units.clear();
        self.state = StageState::Destroyed;
        debug!(stage = %self.id, name = self.name, "stage destroyed");
    }
}

impl Filter for FilterStage {
    fn filter_name(&self) -> &str {
        self.name
    }

    fn init(&mut self, gpu: &mut dyn GpuApi) -> Result<()> {
        FilterStage::init(self, gpu)
    }

    fn on_initialized(&mut self, uploads: &dyn TextureUploads) {
        FilterStage::on_initialized(self, uploads)
    }

    fn on_output_size_changed(
        &mut self,
        gpu: &mut dyn GpuApi,
        width: u32,
        height: u32,
    ) -> Result<()> {
        FilterStage::on_output_size_changed(self, gpu, width, height);
        Ok(())
    }

    fn draw(&mut self, gpu: &mut dyn GpuApi, input: &FrameInput, target: &DrawTarget) {
        FilterStage::draw(self, gpu, input, target)
    }

    fn set_param(&mut self, gpu: &mut dyn GpuApi, name: &str, value: f32) -> bool {
        FilterStage::set_param(self, gpu, name, value)
    }

    fn stage_mut(&mut self, id: StageId) -> Option<&mut FilterStage> {
        (self.id == id).then_some(self)
    }

    fn for_each_stage_mut(&mut self, f: &mut dyn FnMut(&mut FilterStage)) {
        f(self)
    }

    fn destroy(&mut self, gpu: &mut dyn GpuApi) {
        FilterStage::destroy(self, gpu)
    }

    fn is_destroyed(&self) -> bool {
        FilterStage::is_destroyed(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ShaderSource, SizeUnits};
    use crate::testing::{MemoryLoader, RecordedUploads, TWO_SAMPLER_FRAGMENT};
    use filter_core::geometry::{FULL_QUAD, TEX_COORDS_TOP_DOWN};
    use filter_core::recording::RecordingGpu;
    use filter_core::TextureId;

    const ONE_SAMPLER_FRAGMENT: &str = "varying highp vec2 textureCoordinate;\n\
        uniform sampler2D inputImageTexture;\n\
        uniform sampler2D inputImageTexture2;\n\
        void main() { gl_FragColor = texture2D(inputImageTexture2, textureCoordinate); }";

    fn two_texture_desc(fragment: &'static str) -> FilterDescriptor {
        FilterDescriptor::new("two", ShaderSource::Embedded(fragment))
            .with_assets(["filter/a.png", "filter/b.png"])
    }

    fn loader() -> MemoryLoader {
        MemoryLoader::new()
            .with_texture("filter/a.png", 2, 2)
            .with_texture("filter/b.png", 4, 4)
    }

    fn frame() -> FrameInput {
        FrameInput {
            texture: TextureId(9999),
            tex_coords: TEX_COORDS_TOP_DOWN,
        }
    }

    fn screen(width: u32, height: u32) -> DrawTarget {
        DrawTarget {
            framebuffer: None,
            width,
            height,
            positions: FULL_QUAD,
            clear_color: None,
        }
    }

    fn loaded_stage(gpu: &mut RecordingGpu, fragment: &'static str) -> FilterStage {
        let loader = loader();
        let mut stage = FilterStage::new(&two_texture_desc(fragment), &loader).unwrap();
        stage.init(gpu).unwrap();
        let uploads = RecordedUploads::default();
        stage.on_initialized(&uploads);
        assert_eq!(uploads.scheduled(), [stage.id()]);
        assert_eq!(stage.load_textures(gpu, &loader, None), 2);
        stage
    }

    #[test]
    fn destroy_twice_matches_destroy_once() {
        let mut gpu = RecordingGpu::new();
        let mut stage = loaded_stage(&mut gpu, TWO_SAMPLER_FRAGMENT);
        assert_eq!(gpu.live_texture_count(), 2);

        stage.destroy(&mut gpu);
        let calls_after_first = gpu.calls().len();
        assert_eq!(stage.state(), StageState::Destroyed);
        assert_eq!(gpu.live_texture_count(), 0);
        assert_eq!(gpu.live_program_count(), 0);

        stage.destroy(&mut gpu);
        assert_eq!(gpu.calls().len(), calls_after_first);
        assert_eq!(gpu.deleted_texture_count(), 2);
        assert_eq!(stage.loaded_texture_count(), 0);
    }

    #[test]
    fn draw_binds_at_most_k_units_and_unbinds_them() {
        let mut gpu = RecordingGpu::new();
        let mut stage = loaded_stage(&mut gpu, TWO_SAMPLER_FRAGMENT);

        stage.draw(&mut gpu, &frame(), &screen(64, 64));

        let draw = gpu.last_draw().unwrap();
        let aux_units: Vec<_> = draw
            .bindings
            .iter()
            .map(|(unit, _)| *unit)
            .filter(|unit| unit.0 >= TextureUnit::AUX_OFFSET)
            .collect();
        assert_eq!(aux_units, [TextureUnit(3), TextureUnit(4)]);
        assert!(aux_units.len() <= stage.aux_count());

        assert_eq!(gpu.bound_unit_count(), 0);
        assert_eq!(gpu.active_unit(), TextureUnit::PRIMARY);
        let program = stage.program().unwrap();
        assert_eq!(gpu.uniform_i32(program, "inputImageTexture3"), Some(4));
        assert_eq!(stage.state(), StageState::Active);
    }

    #[test]
    fn draw_before_upload_binds_nothing_auxiliary() {
        let mut gpu = RecordingGpu::new();
        let mut stage = FilterStage::new(&two_texture_desc(TWO_SAMPLER_FRAGMENT), &loader()).unwrap();
        stage.init(&mut gpu).unwrap();

        stage.draw(&mut gpu, &frame(), &screen(8, 8));

        let draw = gpu.last_draw().unwrap();
        assert_eq!(draw.bindings, [(TextureUnit::PRIMARY, TextureId(9999))]);
        assert_eq!(stage.state(), StageState::Initialized);
    }

    #[test]
    fn destroy_before_upload_task_skips_allocation() {
        let mut gpu = RecordingGpu::new();
        let loader = loader();
        let mut stage = FilterStage::new(&two_texture_desc(TWO_SAMPLER_FRAGMENT), &loader).unwrap();
        stage.init(&mut gpu).unwrap();
        let uploads = RecordedUploads::default();
        stage.on_initialized(&uploads);

        stage.destroy(&mut gpu);
        assert_eq!(stage.load_textures(&mut gpu, &loader, None), 0);

        assert_eq!(gpu.upload_count(), 0);
        assert_eq!(gpu.live_texture_count(), 0);
        assert_eq!(loader.texture_loads(), 0);
    }

    #[test]
    fn missing_sampler_uniform_binds_only_the_resolved_one() {
        let mut gpu = RecordingGpu::new();
        let mut stage = loaded_stage(&mut gpu, ONE_SAMPLER_FRAGMENT);
        assert_eq!(stage.loaded_texture_count(), 2);

        stage.draw(&mut gpu, &frame(), &screen(16, 16));

        assert_eq!(gpu.draw_count(), 1);
        let draw = gpu.last_draw().unwrap();
        let aux: Vec<_> = draw
            .bindings
            .iter()
            .filter(|(unit, _)| unit.0 >= TextureUnit::AUX_OFFSET)
            .collect();
        assert_eq!(aux.len(), 1);
        assert_eq!(aux[0].0, TextureUnit(3));
        assert_eq!(gpu.bound_unit_count(), 0);
    }

    #[test]
    fn size_uniforms_follow_output_size() {
        let mut gpu = RecordingGpu::new();
        let fragment = "uniform sampler2D inputImageTexture;\n\
            uniform float inputImageTextureWidth;\n\
            uniform float inputImageTextureHeight;\n\
            void main() {}";
        let desc = FilterDescriptor::new("sized", ShaderSource::Embedded(fragment)).with_size_uniforms(
            "inputImageTextureWidth",
            "inputImageTextureHeight",
            SizeUnits::Pixels,
        );
        let mut stage = FilterStage::new(&desc, &MemoryLoader::new()).unwrap();
        stage.init(&mut gpu).unwrap();

        stage.on_output_size_changed(&mut gpu, 640, 480);
        let program = stage.program().unwrap();
        assert_eq!(gpu.uniform_f32(program, "inputImageTextureWidth"), Some(640.0));
        assert_eq!(gpu.uniform_f32(program, "inputImageTextureHeight"), Some(480.0));

        gpu.clear_calls();
        stage.on_output_size_changed(&mut gpu, 640, 480);
        assert!(gpu.calls().is_empty());
        assert_eq!(stage.output_size(), (640, 480));
    }

    #[test]
    fn params_start_at_default_and_clamp() {
        let mut gpu = RecordingGpu::new();
        let desc = FilterDescriptor::new(
            "brightness",
            ShaderSource::Embedded(shaders::BRIGHTNESS_FRAGMENT),
        )
        .with_param(ParamInfo::new("brightness", 0.0, -1.0, 1.0));
        let mut stage = FilterStage::new(&desc, &MemoryLoader::new()).unwrap();
        stage.init(&mut gpu).unwrap();
        let program = stage.program().unwrap();
        assert_eq!(gpu.uniform_f32(program, "brightness"), Some(0.0));

        assert!(stage.set_param(&mut gpu, "brightness", 5.0));
        assert_eq!(gpu.uniform_f32(program, "brightness"), Some(1.0));
        assert_eq!(stage.param("brightness"), Some(1.0));
        assert!(!stage.set_param(&mut gpu, "contrast", 1.0));
    }

    #[test]
    fn mask_slots_wait_for_a_mask() {
        let mut gpu = RecordingGpu::new();
        let fragment = "uniform sampler2D inputImageTexture;\n\
            uniform sampler2D skinMaskTexture;\n\
            void main() {}";
        let desc = FilterDescriptor::new("masked", ShaderSource::Embedded(fragment))
            .with_texture("skinMaskTexture", TextureSource::Mask);
        let loader = MemoryLoader::new();
        let mut stage = FilterStage::new(&desc, &loader).unwrap();
        stage.init(&mut gpu).unwrap();

        assert_eq!(stage.load_textures(&mut gpu, &loader, None), 0);
        assert_eq!(stage.loaded_texture_count(), 0);
        assert_eq!(stage.state(), StageState::Initialized);

        let mask = PixelBuffer::new(2, 2, 1, vec![255; 4]).unwrap();
        stage.replace_mask(&mut gpu, &mask);
        assert_eq!(stage.loaded_texture_count(), 1);
        assert_eq!(stage.state(), StageState::ResourcesLoaded);
        stage.replace_mask(&mut gpu, &mask);
        assert_eq!(gpu.live_texture_count(), 1);
        assert_eq!(gpu.deleted_texture_count(), 1);
    }

    #[test]
    fn missing_asset_keeps_stage_waiting_for_resources() {
        let mut gpu = RecordingGpu::new();
        let partial = MemoryLoader::new().with_texture("filter/a.png", 2, 2);
        let mut stage =
            FilterStage::new(&two_texture_desc(TWO_SAMPLER_FRAGMENT), &partial).unwrap();
        stage.init(&mut gpu).unwrap();

        assert_eq!(stage.load_textures(&mut gpu, &partial, None), 1);
        assert_eq!(stage.state(), StageState::Initialized);
        stage.draw(&mut gpu, &frame(), &screen(8, 8));
        assert_eq!(stage.state(), StageState::Initialized);

        let complete = loader();
        assert_eq!(stage.load_textures(&mut gpu, &complete, None), 1);
        assert_eq!(stage.state(), StageState::ResourcesLoaded);
        assert_eq!(gpu.live_texture_count(), 2);
    }

    #[test]
    fn compile_failure_leaves_stage_uninitialized() {
        let mut gpu = RecordingGpu::new();
        gpu.fail_next_compile();
        let mut stage = FilterStage::passthrough();
        assert!(stage.init(&mut gpu).is_err());
        assert_eq!(stage.state(), StageState::Created);

        stage.destroy(&mut gpu);
        assert!(stage.is_destroyed());
        assert_eq!(gpu.live_program_count(), 0);
    }
}
