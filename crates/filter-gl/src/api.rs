//! [`GlesApi`]: the OpenGL implementation of [`GpuApi`].

use std::borrow::Cow;
use std::ffi::CString;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use anyhow::{anyhow, bail, Context as _, Result};
use filter_core::{
    AttribLocation, FramebufferId, GpuApi, PixelBuffer, ProgramId, QuadDraw, RenderTarget,
    TextureId, TextureUnit, UniformLocation,
};
use gl::types::{GLchar, GLenum, GLint, GLsizei, GLsizeiptr, GLuint};
use glium::backend::Context;
use glium::CapabilitiesSource;
use tracing::{debug, trace};

use crate::gl_backend::RawGlBackend;
use crate::glsl::{self, GlslVersion, ShaderStage};
use crate::reset;

/// Issues filter pipeline commands on the current GL context.
///
/// Lives on the rendering thread for as long as the surface's context does.
/// A glium context wraps the same GL context for capability probing.
pub struct GlesApi {
    ctx: Rc<Context>,
    backend: Rc<RawGlBackend>,
    glsl: GlslVersion,
    host_framebuffer: GLuint,
    quad_buffer: GLuint,
    vertex_array: GLuint,
}

impl Debug for GlesApi {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlesApi")
            .field("glsl", &self.glsl)
            .field("host_framebuffer", &self.host_framebuffer)
            .finish_non_exhaustive()
    }
}

impl GlesApi {
    /// Wrap the GL context current on this thread.
    ///
    /// `host_framebuffer` is the framebuffer that presents to the surface
    /// (0 for the default framebuffer).
    ///
    /// # Safety
    ///
    /// A GL context must be current on the calling thread and stay current
    /// for every later call on the returned value.
    pub unsafe fn new(size: (u32, u32), host_framebuffer: u32) -> Result<Self> {
        let backend = Rc::new(RawGlBackend::new(size));

        debug!("BACKEND: {backend:?}");

        let ctx = Context::new(
            backend.clone(),
            false,
            glium::debug::DebugCallbackBehavior::Ignore,
        )
        .map_err(|err| anyhow!("incompatible OpenGL context: {err}"))?;

        let valid_versions = &ctx.get_capabilities().supported_glsl_versions;
        debug!("VALID VERSIONS: {valid_versions:?}");
        debug!("OPENGL_VERSION {}", ctx.get_opengl_version_string());

        let glsl = glsl::get_best_target(&*ctx).context("no supported GLSL dialect")?;

        let mut quad_buffer = 0;
        gl::GenBuffers(1, &mut quad_buffer);
        let mut vertex_array = 0;
        if gl::GenVertexArrays::is_loaded() {
            gl::GenVertexArrays(1, &mut vertex_array);
        }

        Ok(Self {
            ctx,
            backend,
            glsl,
            host_framebuffer,
            quad_buffer,
            vertex_array,
        })
    }

    pub fn glsl_version(&self) -> GlslVersion {
        self.glsl
    }

    pub fn opengl_version(&self) -> &str {
        self.ctx.get_opengl_version_string()
    }

    /// Record a new surface size.
    pub fn resize(&self, size: (u32, u32)) {
        glium::backend::Backend::resize(&*self.backend, size);
    }
}

impl Drop for GlesApi {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteBuffers(1, &self.quad_buffer);
            if self.vertex_array != 0 {
                gl::DeleteVertexArrays(1, &self.vertex_array);
            }
        }
    }
}

impl GpuApi for GlesApi {
    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId> {
        let vertex = glsl::adapt_source(vertex, self.glsl, ShaderStage::Vertex);
        let fragment = glsl::adapt_source(fragment, self.glsl, ShaderStage::Fragment);

        unsafe {
            let vs = compile_shader(gl::VERTEX_SHADER, &vertex)
                .context("vertex shader compilation failed")?;
            let fs = match compile_shader(gl::FRAGMENT_SHADER, &fragment) {
                Ok(fs) => fs,
                Err(err) => {
                    gl::DeleteShader(vs);
                    return Err(err.context("fragment shader compilation failed"));
                }
            };

            let program = gl::CreateProgram();
            gl::AttachShader(program, vs);
            gl::AttachShader(program, fs);
            gl::LinkProgram(program);
            gl::DeleteShader(vs);
            gl::DeleteShader(fs);

            let mut status = 0;
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);
            if status == 0 {
                let log = program_info_log(program);
                gl::DeleteProgram(program);
                bail!("shader program linking failed: {log}");
            }

            trace!(program, "program linked");
            Ok(ProgramId(program))
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        unsafe { gl::DeleteProgram(program.0) }
    }

    fn use_program(&mut self, program: ProgramId) {
        unsafe { gl::UseProgram(program.0) }
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetUniformLocation(program.0, name.as_ptr()) };
        (location >= 0).then_some(UniformLocation(location))
    }

    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetAttribLocation(program.0, name.as_ptr()) };
        (location >= 0).then_some(AttribLocation(location as u32))
    }

    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32) {
        unsafe { gl::Uniform1i(location.0, value) }
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        unsafe { gl::Uniform1f(location.0, value) }
    }

    fn active_texture(&mut self, unit: TextureUnit) {
        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit.0) }
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        unsafe { gl::BindTexture(gl::TEXTURE_2D, texture.map_or(0, |t| t.0)) }
    }

    fn upload_texture(&mut self, pixels: &PixelBuffer) -> Result<TextureId> {
        let pixels = expand_luminance(pixels);
        let (internal, format) = match pixels.channels() {
            3 => (gl::RGB as GLint, gl::RGB),
            _ => (gl::RGBA as GLint, gl::RGBA),
        };

        unsafe {
            let mut texture = 0;
            gl::GenTextures(1, &mut texture);
            if texture == 0 {
                bail!("failed to create texture");
            }
            gl::BindTexture(gl::TEXTURE_2D, texture);
            set_sampling(gl::LINEAR);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                internal,
                pixels.width() as GLsizei,
                pixels.height() as GLsizei,
                0,
                format,
                gl::UNSIGNED_BYTE,
                pixels.bytes().as_ptr().cast(),
            );
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 4);
            gl::BindTexture(gl::TEXTURE_2D, 0);
            Ok(TextureId(texture))
        }
    }

    fn update_texture(&mut self, texture: TextureId, pixels: &PixelBuffer) -> Result<()> {
        let pixels = expand_luminance(pixels);
        let format = match pixels.channels() {
            3 => gl::RGB,
            _ => gl::RGBA,
        };

        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, texture.0);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexSubImage2D(
                gl::TEXTURE_2D,
                0,
                0,
                0,
                pixels.width() as GLsizei,
                pixels.height() as GLsizei,
                format,
                gl::UNSIGNED_BYTE,
                pixels.bytes().as_ptr().cast(),
            );
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 4);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureId) {
        unsafe { gl::DeleteTextures(1, &texture.0) }
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> Result<RenderTarget> {
        if width == 0 || height == 0 {
            bail!("render target {width}x{height} is empty");
        }

        unsafe {
            let mut texture = 0;
            gl::GenTextures(1, &mut texture);
            gl::BindTexture(gl::TEXTURE_2D, texture);
            set_sampling(gl::LINEAR);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as GLint,
                width as GLsizei,
                height as GLsizei,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                std::ptr::null(),
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);

            let mut framebuffer = 0;
            gl::GenFramebuffers(1, &mut framebuffer);
            gl::BindFramebuffer(gl::FRAMEBUFFER, framebuffer);
            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::TEXTURE_2D,
                texture,
                0,
            );
            let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
            gl::BindFramebuffer(gl::FRAMEBUFFER, self.host_framebuffer);

            if status != gl::FRAMEBUFFER_COMPLETE {
                gl::DeleteFramebuffers(1, &framebuffer);
                gl::DeleteTextures(1, &texture);
                bail!("framebuffer {width}x{height} incomplete: status {status:#x}");
            }

            Ok(RenderTarget {
                framebuffer: FramebufferId(framebuffer),
                texture: TextureId(texture),
                width,
                height,
            })
        }
    }

    fn delete_render_target(&mut self, target: RenderTarget) {
        unsafe {
            gl::DeleteFramebuffers(1, &target.framebuffer.0);
            gl::DeleteTextures(1, &target.texture.0);
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        let name = framebuffer.map_or(self.host_framebuffer, |fb| fb.0);
        unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, name) }
    }

    fn viewport(&mut self, width: u32, height: u32) {
        unsafe { gl::Viewport(0, 0, width as GLsizei, height as GLsizei) }
    }

    fn surface_resized(&mut self, width: u32, height: u32) {
        self.resize((width, height));
    }

    fn clear(&mut self, [r, g, b, a]: [f32; 4]) {
        unsafe {
            gl::ClearColor(r, g, b, a);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    fn draw_quad(&mut self, quad: &QuadDraw) {
        let mut vertices = [0f32; 16];
        vertices[..8].copy_from_slice(&quad.positions);
        vertices[8..].copy_from_slice(&quad.tex_coords);

        unsafe {
            if self.vertex_array != 0 {
                gl::BindVertexArray(self.vertex_array);
            }
            gl::BindBuffer(gl::ARRAY_BUFFER, self.quad_buffer);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(&vertices) as GLsizeiptr,
                vertices.as_ptr().cast(),
                gl::STREAM_DRAW,
            );

            gl::EnableVertexAttribArray(quad.position.0);
            gl::VertexAttribPointer(quad.position.0, 2, gl::FLOAT, gl::FALSE, 0, std::ptr::null());
            if let Some(tex_coord) = quad.tex_coord {
                gl::EnableVertexAttribArray(tex_coord.0);
                gl::VertexAttribPointer(
                    tex_coord.0,
                    2,
                    gl::FLOAT,
                    gl::FALSE,
                    0,
                    std::mem::size_of::<[f32; 8]>() as *const _,
                );
            }

            gl::DrawArrays(gl::TRIANGLE_STRIP, 0, 4);

            gl::DisableVertexAttribArray(quad.position.0);
            if let Some(tex_coord) = quad.tex_coord {
                gl::DisableVertexAttribArray(tex_coord.0);
            }
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
        }
    }

    fn reset_state(&mut self) {
        unsafe { reset::gl_reset(self.host_framebuffer) }
    }
}

unsafe fn set_sampling(filter: GLenum) {
    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter as GLint);
    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter as GLint);
    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
}

unsafe fn compile_shader(kind: GLenum, source: &str) -> Result<GLuint> {
    let source = CString::new(source).context("shader source contains a NUL byte")?;
    let shader = gl::CreateShader(kind);
    if shader == 0 {
        bail!("failed to create shader object");
    }
    gl::ShaderSource(shader, 1, &source.as_ptr(), std::ptr::null());
    gl::CompileShader(shader);

    let mut status = 0;
    gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
    if status == 0 {
        let log = shader_info_log(shader);
        gl::DeleteShader(shader);
        bail!("{log}");
    }
    Ok(shader)
}

unsafe fn shader_info_log(shader: GLuint) -> String {
    let mut len = 0;
    gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
    let mut buf = vec![0u8; len.max(1) as usize];
    let mut written = 0;
    gl::GetShaderInfoLog(
        shader,
        buf.len() as GLsizei,
        &mut written,
        buf.as_mut_ptr() as *mut GLchar,
    );
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

unsafe fn program_info_log(program: GLuint) -> String {
    let mut len = 0;
    gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
    let mut buf = vec![0u8; len.max(1) as usize];
    let mut written = 0;
    gl::GetProgramInfoLog(
        program,
        buf.len() as GLsizei,
        &mut written,
        buf.as_mut_ptr() as *mut GLchar,
    );
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Expand gray (and gray + alpha) pixels to RGBA so single-channel masks
/// sample the same on desktop GL and GLES.
fn expand_luminance(pixels: &PixelBuffer) -> Cow<'_, PixelBuffer> {
    let expanded: Vec<u8> = match pixels.channels() {
        1 => pixels.bytes().iter().flat_map(|&l| [l, l, l, 255]).collect(),
        2 => pixels
            .bytes()
            .chunks_exact(2)
            .flat_map(|la| [la[0], la[0], la[0], la[1]])
            .collect(),
        _ => return Cow::Borrowed(pixels),
    };
    match PixelBuffer::rgba(pixels.width(), pixels.height(), expanded) {
        Ok(rgba) => Cow::Owned(rgba),
        Err(_) => Cow::Borrowed(pixels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_expands_to_rgba() {
        let gray = PixelBuffer::new(2, 1, 1, vec![10, 200]).unwrap();
        let rgba = expand_luminance(&gray);
        assert_eq!(rgba.channels(), 4);
        assert_eq!(rgba.bytes(), &[10, 10, 10, 255, 200, 200, 200, 255]);

        let gray_alpha = PixelBuffer::new(1, 1, 2, vec![7, 9]).unwrap();
        assert_eq!(expand_luminance(&gray_alpha).bytes(), &[7, 7, 7, 9]);
    }

    #[test]
    fn color_pixels_are_borrowed() {
        let rgb = PixelBuffer::new(1, 1, 3, vec![1, 2, 3]).unwrap();
        assert!(matches!(expand_luminance(&rgb), Cow::Borrowed(_)));
    }
}
