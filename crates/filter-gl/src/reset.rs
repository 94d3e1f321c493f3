//! Reset the OpenGL state between filters and on surface teardown.

/// Reset OpenGL state back to defaults.
///
/// Unbinds the program, every 2D texture unit, buffers and the VAO, disables
/// blending and binds `framebuffer` (the presentation surface).
///
/// # Safety
///
/// Must be called with a valid OpenGL context current.
pub unsafe fn gl_reset(framebuffer: u32) {
    gl::UseProgram(0);

    let mut num_samplers = 0;
    gl::GetIntegerv(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, &mut num_samplers);

    for sampler in 0..num_samplers.max(0) as u32 {
        gl::ActiveTexture(gl::TEXTURE0 + sampler);
        gl::BindTexture(gl::TEXTURE_2D, 0);
    }

    gl::ActiveTexture(gl::TEXTURE0);

    gl::BindBuffer(gl::ARRAY_BUFFER, 0);
    if gl::BindVertexArray::is_loaded() {
        gl::BindVertexArray(0);
    }
    gl::Disable(gl::BLEND);
    gl::BlendFunc(gl::ONE, gl::ZERO);

    gl::BindFramebuffer(gl::FRAMEBUFFER, framebuffer);
}
