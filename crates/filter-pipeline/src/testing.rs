//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use filter_core::{PixelBuffer, ResourceLoader};

use crate::filter::TextureUploads;
use crate::stage::StageId;

pub const TWO_SAMPLER_FRAGMENT: &str = "varying highp vec2 textureCoordinate;\n\
    uniform sampler2D inputImageTexture;\n\
    uniform sampler2D inputImageTexture2;\n\
    uniform sampler2D inputImageTexture3;\n\
    void main() { gl_FragColor = texture2D(inputImageTexture3, textureCoordinate); }";

/// A loader serving every catalog shader with a two-sampler fragment.
pub fn catalog_loader() -> MemoryLoader {
    ["freud", "nashville", "lomo", "toaster2_filter_shader", "skin_smooth"]
        .into_iter()
        .fold(MemoryLoader::new(), |loader, id| {
            loader.with_shader(id, TWO_SAMPLER_FRAGMENT)
        })
}

/// Serves shader text and solid-color textures from memory.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    shaders: HashMap<String, String>,
    textures: HashMap<String, (u32, u32)>,
    shader_loads: AtomicUsize,
    texture_loads: AtomicUsize,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shader(mut self, id: &str, text: &str) -> Self {
        self.shaders.insert(id.to_string(), text.to_string());
        self
    }

    pub fn with_texture(mut self, path: &str, width: u32, height: u32) -> Self {
        self.textures.insert(path.to_string(), (width, height));
        self
    }

    pub fn shader_loads(&self) -> usize {
        self.shader_loads.load(Ordering::SeqCst)
    }

    pub fn texture_loads(&self) -> usize {
        self.texture_loads.load(Ordering::SeqCst)
    }
}

impl ResourceLoader for MemoryLoader {
    fn load_shader_source(&self, id: &str) -> Result<String> {
        self.shader_loads.fetch_add(1, Ordering::SeqCst);
        self.shaders
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("no shader {id}"))
    }

    fn load_texture(&self, path: &str) -> Result<PixelBuffer> {
        self.texture_loads.fetch_add(1, Ordering::SeqCst);
        let (width, height) = *self
            .textures
            .get(path)
            .ok_or_else(|| anyhow!("no texture {path}"))?;
        PixelBuffer::rgba(width, height, vec![128; (width * height * 4) as usize])
    }
}

/// Records scheduled uploads instead of queueing them.
#[derive(Debug, Default)]
pub struct RecordedUploads(RefCell<Vec<StageId>>);

impl RecordedUploads {
    pub fn scheduled(&self) -> Vec<StageId> {
        self.0.borrow().clone()
    }
}

impl TextureUploads for RecordedUploads {
    fn schedule(&self, stage: StageId) {
        self.0.borrow_mut().push(stage);
    }
}
