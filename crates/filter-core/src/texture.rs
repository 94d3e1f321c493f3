//! Pixel buffers, texture sources and owned GPU textures.

use std::fmt;
use std::sync::Arc;

use anyhow::{ensure, Result};
use tracing::trace;

use crate::gpu::{GpuApi, TextureId};

/// Tightly packed 8-bit pixels, rows top to bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, channels: u8, bytes: Vec<u8>) -> Result<Self> {
        ensure!(
            (1..=4).contains(&channels),
            "unsupported channel count {channels}"
        );
        ensure!(width > 0 && height > 0, "empty pixel buffer {width}x{height}");
        let expected = width as usize * height as usize * channels as usize;
        ensure!(
            bytes.len() == expected,
            "pixel buffer is {} bytes, expected {expected} for {width}x{height}x{channels}",
            bytes.len()
        );
        Ok(Self {
            width,
            height,
            channels,
            bytes,
        })
    }

    pub fn rgba(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self> {
        Self::new(width, height, 4, bytes)
    }

    /// Convert a decoded image to RGBA8.
    pub fn from_image(image: image::DynamicImage) -> Self {
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            channels: 4,
            bytes: rgba.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

/// Where an auxiliary texture's pixels come from.
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Asset path handed to the resource loader, e.g. `filter/lomomap_new.png`.
    Asset(String),
    /// Pixels supplied up front.
    Pixels(Arc<PixelBuffer>),
    /// Filled at runtime by the external mask producer.
    Mask,
}

impl TextureSource {
    pub fn asset(path: impl Into<String>) -> Self {
        TextureSource::Asset(path.into())
    }
}

/// A live GPU texture. Owns its handle exclusively.
///
/// There is no `Drop` release: the handle can only be freed on the rendering
/// thread, so the owner calls [`GpuTexture::release`] explicitly.
#[derive(Debug, PartialEq, Eq)]
pub struct GpuTexture {
    id: TextureId,
    width: u32,
    height: u32,
    channels: u8,
}

impl GpuTexture {
    pub fn upload(gpu: &mut dyn GpuApi, pixels: &PixelBuffer) -> Result<Self> {
        let id = gpu.upload_texture(pixels)?;
        trace!(texture = id.0, width = pixels.width(), height = pixels.height(), "texture uploaded");
        Ok(Self {
            id,
            width: pixels.width(),
            height: pixels.height(),
            channels: pixels.channels(),
        })
    }

    /// Whether `pixels` can be written into this texture in place.
    pub fn matches(&self, pixels: &PixelBuffer) -> bool {
        self.size() == pixels.size() && self.channels == pixels.channels()
    }

    /// Overwrite the texture contents, keeping the handle.
    pub fn update(&mut self, gpu: &mut dyn GpuApi, pixels: &PixelBuffer) -> Result<()> {
        ensure!(
            self.matches(pixels),
            "texture {} is {}x{}x{}, cannot update with {}x{}x{}",
            self.id.0,
            self.width,
            self.height,
            self.channels,
            pixels.width(),
            pixels.height(),
            pixels.channels()
        );
        gpu.update_texture(self.id, pixels)?;
        trace!(texture = self.id.0, "texture updated in place");
        Ok(())
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn release(self, gpu: &mut dyn GpuApi) {
        trace!(texture = self.id.0, "texture released");
        gpu.delete_texture(self.id);
    }
}

/// A texture that may still be loading.
#[derive(Debug, Default)]
pub enum TextureSlot {
    #[default]
    Pending,
    Loaded(GpuTexture),
}

impl TextureSlot {
    pub fn is_loaded(&self) -> bool {
        matches!(self, TextureSlot::Loaded(_))
    }

    pub fn texture(&self) -> Option<&GpuTexture> {
        match self {
            TextureSlot::Loaded(texture) => Some(texture),
            TextureSlot::Pending => None,
        }
    }

    /// Store `texture`, releasing whatever the slot held before.
    pub fn fill(&mut self, gpu: &mut dyn GpuApi, texture: GpuTexture) {
        self.release(gpu);
        *self = TextureSlot::Loaded(texture);
    }

    /// Release the held texture, if any. The slot reads `Pending` afterwards,
    /// so calling this again is a no-op.
    pub fn release(&mut self, gpu: &mut dyn GpuApi) {
        if let TextureSlot::Loaded(texture) = std::mem::take(self) {
            texture.release(gpu);
        }
    }
}
