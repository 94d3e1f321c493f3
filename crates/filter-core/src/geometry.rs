//! Quad vertex data shared by every stage.
//!
//! Vertex order is the triangle strip bottom-left, bottom-right, top-left,
//! top-right.

/// Clip-space positions covering the whole target.
pub const FULL_QUAD: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

/// Texture coordinates for images uploaded from memory (row 0 is the top).
pub const TEX_COORDS_TOP_DOWN: [f32; 8] = [0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];

/// Texture coordinates for textures rendered into by a framebuffer.
pub const TEX_COORDS_UPRIGHT: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];

/// Mirror texture coordinates horizontally.
pub fn mirrored(coords: [f32; 8]) -> [f32; 8] {
    let mut out = coords;
    for s in out.iter_mut().step_by(2) {
        *s = 1.0 - *s;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirroring_flips_s_only() {
        assert_eq!(
            mirrored(TEX_COORDS_TOP_DOWN),
            [1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(mirrored(mirrored(TEX_COORDS_UPRIGHT)), TEX_COORDS_UPRIGHT);
    }
}
