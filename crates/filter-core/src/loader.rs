//! Resource loading: shader text and texture pixels.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::texture::PixelBuffer;

/// Supplies shader sources and texture pixels.
///
/// Calls are synchronous. The pipeline makes both of them inside draw-queue
/// tasks on the rendering thread: shader text while a selected filter is
/// built, pixels while its textures upload.
pub trait ResourceLoader: Send + Sync {
    fn load_shader_source(&self, id: &str) -> Result<String>;

    fn load_texture(&self, path: &str) -> Result<PixelBuffer>;
}

/// Loads resources from a directory tree.
///
/// Shader `id` resolves to `<root>/shaders/<id>.glsl`; texture paths resolve
/// relative to `<root>` and are decoded to RGBA8.
#[derive(Debug, Clone)]
pub struct AssetDirLoader {
    root: PathBuf,
}

impl AssetDirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLoader for AssetDirLoader {
    fn load_shader_source(&self, id: &str) -> Result<String> {
        let path = self.root.join("shaders").join(format!("{id}.glsl"));
        fs::read_to_string(&path)
            .with_context(|| format!("reading shader {id} from {}", path.display()))
    }

    fn load_texture(&self, path: &str) -> Result<PixelBuffer> {
        let full = self.root.join(path);
        let image = image::open(&full)
            .with_context(|| format!("decoding texture {}", full.display()))?;
        Ok(PixelBuffer::from_image(image))
    }
}
