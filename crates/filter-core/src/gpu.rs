//! The GPU command surface every filter draws through.
//!
//! [`GpuApi`] is deliberately close to the GL calls a filter pipeline issues:
//! programs, uniform lookups, texture units, framebuffers and a quad draw.
//! Implementations must only be driven from the rendering thread that owns
//! the GPU context; the pipeline guarantees this by routing every mutation
//! through the draw queue.

use anyhow::Result;

use crate::texture::PixelBuffer;

/// Linked shader program name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Texture object name. Copyable because it is only a name; ownership of the
/// underlying allocation lives in [`GpuTexture`](crate::texture::GpuTexture)
/// or [`RenderTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Framebuffer object name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u32);

/// A resolved uniform location. Unresolved names never produce one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// A resolved vertex attribute location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttribLocation(pub u32);

/// A texture image unit.
///
/// Units `0..AUX_OFFSET` belong to the primary frame chain; auxiliary
/// textures of a stage occupy `AUX_OFFSET + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextureUnit(pub u32);

impl TextureUnit {
    pub const PRIMARY: TextureUnit = TextureUnit(0);
    pub const AUX_OFFSET: u32 = 3;

    /// Unit for the `index`-th auxiliary texture of a stage.
    pub fn auxiliary(index: usize) -> Self {
        TextureUnit(Self::AUX_OFFSET + index as u32)
    }

    /// Value to store in a `sampler2D` uniform.
    pub fn sampler_index(self) -> i32 {
        self.0 as i32
    }
}

/// An offscreen color target: one framebuffer with one texture attachment.
///
/// Not `Clone`: exactly one owner is responsible for handing it back through
/// [`GpuApi::delete_render_target`].
#[derive(Debug, PartialEq, Eq)]
pub struct RenderTarget {
    pub framebuffer: FramebufferId,
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// One full-screen (or placed) quad draw as a 4-vertex triangle strip.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadDraw {
    pub position: AttribLocation,
    pub tex_coord: Option<AttribLocation>,
    pub positions: [f32; 8],
    pub tex_coords: [f32; 8],
}

/// GPU commands used by the filter pipeline.
pub trait GpuApi {
    /// Compile and link a vertex + fragment program.
    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId>;

    fn delete_program(&mut self, program: ProgramId);

    fn use_program(&mut self, program: ProgramId);

    /// Look up a uniform. `None` when the program does not declare it (or the
    /// compiler optimised it away).
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation>;

    /// Set an integer uniform on the program currently in use.
    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32);

    /// Set a float uniform on the program currently in use.
    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32);

    fn active_texture(&mut self, unit: TextureUnit);

    /// Bind a 2D texture on the active unit; `None` unbinds.
    fn bind_texture(&mut self, texture: Option<TextureId>);

    /// Allocate a texture and upload `pixels` into it.
    fn upload_texture(&mut self, pixels: &PixelBuffer) -> Result<TextureId>;

    /// Overwrite the contents of `texture`, which has the same size and
    /// channel count as `pixels`.
    fn update_texture(&mut self, texture: TextureId, pixels: &PixelBuffer) -> Result<()>;

    fn delete_texture(&mut self, texture: TextureId);

    /// Allocate an RGBA framebuffer-backed render target.
    fn create_render_target(&mut self, width: u32, height: u32) -> Result<RenderTarget>;

    fn delete_render_target(&mut self, target: RenderTarget);

    /// Bind a framebuffer for drawing; `None` selects the presentation surface.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    fn viewport(&mut self, width: u32, height: u32);

    /// The presentation surface changed size.
    fn surface_resized(&mut self, _width: u32, _height: u32) {}

    fn clear(&mut self, color: [f32; 4]);

    /// Draw with the program currently in use.
    fn draw_quad(&mut self, quad: &QuadDraw);

    /// Drop every binding back to defaults (no program, no textures on any
    /// unit, unit 0 active, presentation framebuffer bound).
    fn reset_state(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auxiliary_units_start_after_primary_chain() {
        assert_eq!(TextureUnit::auxiliary(0), TextureUnit(3));
        assert_eq!(TextureUnit::auxiliary(4).sampler_index(), 7);
        assert!(TextureUnit::auxiliary(0) > TextureUnit::PRIMARY);
    }
}
