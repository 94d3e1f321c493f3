//! An in-memory [`GpuApi`] that records every command.
//!
//! Used by unit tests here and, through the `test-utils` feature, by the
//! pipeline crate. Programs are "compiled" by scanning the sources for
//! `uniform` and `attribute` declarations, so uniform lookups behave like a
//! real driver for names a shader does or does not declare.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{bail, Result};

use crate::gpu::{
    AttribLocation, FramebufferId, GpuApi, ProgramId, QuadDraw, RenderTarget, TextureId,
    TextureUnit, UniformLocation,
};
use crate::texture::PixelBuffer;

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(ProgramId),
    SetUniformI32(UniformLocation, i32),
    SetUniformF32(UniformLocation, f32),
    ActiveTexture(TextureUnit),
    BindTexture(TextureUnit, Option<TextureId>),
    UploadTexture {
        texture: TextureId,
        width: u32,
        height: u32,
    },
    UpdateTexture(TextureId),
    DeleteTexture(TextureId),
    CreateRenderTarget(FramebufferId, u32, u32),
    DeleteRenderTarget(FramebufferId),
    BindFramebuffer(Option<FramebufferId>),
    Viewport(u32, u32),
    Clear([f32; 4]),
    Draw(DrawRecord),
    ResetState,
}

/// State captured at a quad draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: Option<ProgramId>,
    pub framebuffer: Option<FramebufferId>,
    pub viewport: (u32, u32),
    /// Non-empty texture bindings, ordered by unit.
    pub bindings: Vec<(TextureUnit, TextureId)>,
    pub quad: QuadDraw,
}

#[derive(Debug, Default)]
struct ProgramInfo {
    uniforms: HashMap<String, UniformLocation>,
    attribs: HashMap<String, AttribLocation>,
}

#[derive(Debug, Default)]
pub struct RecordingGpu {
    next_name: u32,
    calls: Vec<GpuCall>,
    programs: HashMap<ProgramId, ProgramInfo>,
    textures: HashSet<TextureId>,
    framebuffers: HashMap<FramebufferId, TextureId>,
    bindings: BTreeMap<TextureUnit, TextureId>,
    active_unit: TextureUnit,
    current_program: Option<ProgramId>,
    current_framebuffer: Option<FramebufferId>,
    viewport: (u32, u32),
    uniform_values: HashMap<UniformLocation, UniformValue>,
    uploads: usize,
    updates: usize,
    deleted_textures: usize,
    draws: usize,
    fail_next_compile: bool,
    failing_render_targets: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum UniformValue {
    Int(i32),
    Float(f32),
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create_program` fail as a compile error would.
    pub fn fail_next_compile(&mut self) {
        self.fail_next_compile = true;
    }

    /// Make the next `count` render target allocations fail.
    pub fn fail_render_targets(&mut self, count: usize) {
        self.failing_render_targets = count;
    }

    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Every draw recorded so far, oldest first.
    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.calls.iter().filter_map(|call| match call {
            GpuCall::Draw(record) => Some(record),
            _ => None,
        })
    }

    pub fn last_draw(&self) -> Option<&DrawRecord> {
        self.draws().last()
    }

    pub fn draw_count(&self) -> usize {
        self.draws
    }

    /// Live textures created through `upload_texture`. Render target
    /// attachments are counted by [`live_framebuffer_count`](Self::live_framebuffer_count).
    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn is_texture_live(&self, texture: TextureId) -> bool {
        self.textures.contains(&texture)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    /// In-place updates through `update_texture`.
    pub fn update_count(&self) -> usize {
        self.updates
    }

    pub fn deleted_texture_count(&self) -> usize {
        self.deleted_textures
    }

    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn live_framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn bound_texture(&self, unit: TextureUnit) -> Option<TextureId> {
        self.bindings.get(&unit).copied()
    }

    /// Number of units with a texture bound right now.
    pub fn bound_unit_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn active_unit(&self) -> TextureUnit {
        self.active_unit
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    pub fn current_framebuffer(&self) -> Option<FramebufferId> {
        self.current_framebuffer
    }

    /// Last integer written to `name` in `program`.
    pub fn uniform_i32(&self, program: ProgramId, name: &str) -> Option<i32> {
        match self.uniform_value(program, name)? {
            UniformValue::Int(value) => Some(value),
            UniformValue::Float(_) => None,
        }
    }

    /// Last float written to `name` in `program`.
    pub fn uniform_f32(&self, program: ProgramId, name: &str) -> Option<f32> {
        match self.uniform_value(program, name)? {
            UniformValue::Float(value) => Some(value),
            UniformValue::Int(_) => None,
        }
    }

    fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        let location = self.programs.get(&program)?.uniforms.get(name)?;
        self.uniform_values.get(location).copied()
    }

    fn next_name(&mut self) -> u32 {
        self.next_name += 1;
        self.next_name
    }
}

impl GpuApi for RecordingGpu {
    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId> {
        if std::mem::take(&mut self.fail_next_compile) {
            bail!("fragment shader failed to compile");
        }
        let program = ProgramId(self.next_name());
        let mut info = ProgramInfo::default();
        for source in [vertex, fragment] {
            for name in declared_names(source, "uniform") {
                if !info.uniforms.contains_key(&name) {
                    let location = UniformLocation(self.next_name() as i32);
                    info.uniforms.insert(name, location);
                }
            }
        }
        for (index, name) in declared_names(vertex, "attribute").into_iter().enumerate() {
            info.attribs.insert(name, AttribLocation(index as u32));
        }
        self.programs.insert(program, info);
        self.calls.push(GpuCall::CreateProgram(program));
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.calls.push(GpuCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current_program = Some(program);
        self.calls.push(GpuCall::UseProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.programs.get(&program)?.uniforms.get(name).copied()
    }

    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        self.programs.get(&program)?.attribs.get(name).copied()
    }

    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32) {
        self.uniform_values.insert(location, UniformValue::Int(value));
        self.calls.push(GpuCall::SetUniformI32(location, value));
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        self.uniform_values
            .insert(location, UniformValue::Float(value));
        self.calls.push(GpuCall::SetUniformF32(location, value));
    }

    fn active_texture(&mut self, unit: TextureUnit) {
        self.active_unit = unit;
        self.calls.push(GpuCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        match texture {
            Some(id) => self.bindings.insert(self.active_unit, id),
            None => self.bindings.remove(&self.active_unit),
        };
        self.calls.push(GpuCall::BindTexture(self.active_unit, texture));
    }

    fn upload_texture(&mut self, pixels: &PixelBuffer) -> Result<TextureId> {
        let texture = TextureId(self.next_name());
        self.textures.insert(texture);
        self.uploads += 1;
        self.calls.push(GpuCall::UploadTexture {
            texture,
            width: pixels.width(),
            height: pixels.height(),
        });
        Ok(texture)
    }

    fn update_texture(&mut self, texture: TextureId, _pixels: &PixelBuffer) -> Result<()> {
        if !self.textures.contains(&texture) {
            bail!("texture {} is not live", texture.0);
        }
        self.updates += 1;
        self.calls.push(GpuCall::UpdateTexture(texture));
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture) {
            self.deleted_textures += 1;
        }
        self.bindings.retain(|_, bound| *bound != texture);
        self.calls.push(GpuCall::DeleteTexture(texture));
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> Result<RenderTarget> {
        if width == 0 || height == 0 {
            bail!("render target {width}x{height} is empty");
        }
        if self.failing_render_targets > 0 {
            self.failing_render_targets -= 1;
            bail!("framebuffer {width}x{height} incomplete");
        }
        let framebuffer = FramebufferId(self.next_name());
        let texture = TextureId(self.next_name());
        self.framebuffers.insert(framebuffer, texture);
        self.calls
            .push(GpuCall::CreateRenderTarget(framebuffer, width, height));
        Ok(RenderTarget {
            framebuffer,
            texture,
            width,
            height,
        })
    }

    fn delete_render_target(&mut self, target: RenderTarget) {
        self.framebuffers.remove(&target.framebuffer);
        self.bindings.retain(|_, bound| *bound != target.texture);
        if self.current_framebuffer == Some(target.framebuffer) {
            self.current_framebuffer = None;
        }
        self.calls.push(GpuCall::DeleteRenderTarget(target.framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.current_framebuffer = framebuffer;
        self.calls.push(GpuCall::BindFramebuffer(framebuffer));
    }

    fn viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.calls.push(GpuCall::Viewport(width, height));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(GpuCall::Clear(color));
    }

    fn draw_quad(&mut self, quad: &QuadDraw) {
        self.draws += 1;
        let record = DrawRecord {
            program: self.current_program,
            framebuffer: self.current_framebuffer,
            viewport: self.viewport,
            bindings: self.bindings.iter().map(|(u, t)| (*u, *t)).collect(),
            quad: quad.clone(),
        };
        self.calls.push(GpuCall::Draw(record));
    }

    fn reset_state(&mut self) {
        self.bindings.clear();
        self.active_unit = TextureUnit::PRIMARY;
        self.current_program = None;
        self.current_framebuffer = None;
        self.calls.push(GpuCall::ResetState);
    }
}

/// Names declared with `qualifier` (e.g. `uniform`) in a GLSL source.
fn declared_names(source: &str, qualifier: &str) -> Vec<String> {
    let code: String = source
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default())
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    code.split(';')
        .filter_map(|statement| {
            let statement = statement
                .rsplit(|c| c == '{' || c == '}')
                .next()
                .unwrap_or(statement);
            let mut tokens = statement.split_whitespace();
            if tokens.next()? != qualifier {
                return None;
            }
            let name = tokens.last()?;
            Some(name.split('[').next().unwrap_or(name).to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "attribute vec4 position;\n\
        attribute vec4 inputTextureCoordinate;\n\
        varying vec2 textureCoordinate;\n\
        void main() { gl_Position = position; }";

    const FRAGMENT: &str = "precision mediump float;\n\
        #define STRENGTH 1.0\n\
        uniform sampler2D inputImageTexture; // primary\n\
        uniform lowp float brightness;\n\
        uniform vec2 offsets[4];\n\
        void main() { gl_FragColor = vec4(brightness); }";

    #[test]
    fn parses_declarations() {
        assert_eq!(
            declared_names(FRAGMENT, "uniform"),
            ["inputImageTexture", "brightness", "offsets"]
        );
        assert_eq!(
            declared_names(VERTEX, "attribute"),
            ["position", "inputTextureCoordinate"]
        );
    }

    #[test]
    fn resolves_only_declared_uniforms() {
        let mut gpu = RecordingGpu::new();
        let program = gpu.create_program(VERTEX, FRAGMENT).unwrap();
        assert!(gpu.uniform_location(program, "brightness").is_some());
        assert!(gpu.uniform_location(program, "contrast").is_none());
        assert_eq!(
            gpu.attrib_location(program, "position"),
            Some(AttribLocation(0))
        );

        let location = gpu.uniform_location(program, "brightness").unwrap();
        gpu.use_program(program);
        gpu.set_uniform_f32(location, 0.5);
        assert_eq!(gpu.uniform_f32(program, "brightness"), Some(0.5));
    }

    #[test]
    fn tracks_bindings_per_unit() {
        let mut gpu = RecordingGpu::new();
        let pixels = PixelBuffer::rgba(1, 1, vec![0; 4]).unwrap();
        let texture = gpu.upload_texture(&pixels).unwrap();
        gpu.active_texture(TextureUnit(3));
        gpu.bind_texture(Some(texture));
        assert_eq!(gpu.bound_texture(TextureUnit(3)), Some(texture));
        assert_eq!(gpu.bound_unit_count(), 1);

        gpu.delete_texture(texture);
        assert_eq!(gpu.bound_texture(TextureUnit(3)), None);
        assert_eq!(gpu.deleted_texture_count(), 1);
    }

    #[test]
    fn compile_failure_is_one_shot() {
        let mut gpu = RecordingGpu::new();
        gpu.fail_next_compile();
        assert!(gpu.create_program(VERTEX, FRAGMENT).is_err());
        assert!(gpu.create_program(VERTEX, FRAGMENT).is_ok());
        assert_eq!(gpu.live_program_count(), 1);
    }
}
