//! Render configuration.

use crate::placement::FillMode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    pub fill_mode: FillMode,
    /// Color behind letterboxed content.
    pub clear_color: [f32; 4],
    /// Flip the primary frame horizontally (front cameras).
    pub mirror: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            mirror: false,
        }
    }
}
