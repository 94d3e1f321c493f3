//! Declarative filter descriptions.
//!
//! A [`FilterDescriptor`] is everything a [`FilterStage`](crate::FilterStage)
//! needs to know about one filter: its shaders, its auxiliary textures and
//! the uniforms it exposes. Concrete filters are data, not types.

use std::borrow::Cow;

use anyhow::{Context, Result};
use filter_core::{ParamInfo, ResourceLoader, TextureSource};

use crate::shaders;

/// Where a shader's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    /// Compiled into the binary.
    Embedded(&'static str),
    /// Loaded by identifier through the [`ResourceLoader`].
    Resource(&'static str),
}

impl ShaderSource {
    pub fn resolve(&self, loader: &dyn ResourceLoader) -> Result<Cow<'static, str>> {
        match self {
            ShaderSource::Embedded(text) => Ok(Cow::Borrowed(text)),
            ShaderSource::Resource(id) => loader
                .load_shader_source(id)
                .map(Cow::Owned)
                .with_context(|| format!("loading shader {id}")),
        }
    }
}

/// An auxiliary texture and the sampler uniform it binds to.
#[derive(Debug, Clone)]
pub struct AuxTexture {
    pub uniform: String,
    pub source: TextureSource,
}

/// How size uniforms are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnits {
    /// Output size in pixels.
    Pixels,
    /// One texel step, `1 / size`.
    Texel,
}

impl SizeUnits {
    pub fn value(self, size: u32) -> f32 {
        match self {
            SizeUnits::Pixels => size as f32,
            SizeUnits::Texel if size == 0 => 0.0,
            SizeUnits::Texel => 1.0 / size as f32,
        }
    }
}

/// Uniforms updated whenever the output size changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeUniforms {
    pub width: &'static str,
    pub height: &'static str,
    pub units: SizeUnits,
}

#[derive(Debug, Clone)]
pub struct FilterDescriptor {
    pub name: &'static str,
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
    /// Bound in order to texture units 3, 4, ...
    pub aux_textures: Vec<AuxTexture>,
    pub size_uniforms: Option<SizeUniforms>,
    pub params: Vec<ParamInfo>,
}

impl FilterDescriptor {
    /// A descriptor using the default vertex shader.
    pub fn new(name: &'static str, fragment: ShaderSource) -> Self {
        Self {
            name,
            vertex: ShaderSource::Embedded(shaders::VERTEX),
            fragment,
            aux_textures: Vec::new(),
            size_uniforms: None,
            params: Vec::new(),
        }
    }

    pub fn passthrough() -> Self {
        Self::new(
            "passthrough",
            ShaderSource::Embedded(shaders::PASSTHROUGH_FRAGMENT),
        )
    }

    pub fn with_vertex(mut self, vertex: ShaderSource) -> Self {
        self.vertex = vertex;
        self
    }

    pub fn with_texture(mut self, uniform: impl Into<String>, source: TextureSource) -> Self {
        self.aux_textures.push(AuxTexture {
            uniform: uniform.into(),
            source,
        });
        self
    }

    /// Add asset textures bound to `inputImageTexture2`, `inputImageTexture3`, ...
    /// continuing after any textures already declared.
    pub fn with_assets<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        for path in paths {
            let uniform = format!("inputImageTexture{}", self.aux_textures.len() + 2);
            self = self.with_texture(uniform, TextureSource::asset(path));
        }
        self
    }

    pub fn with_size_uniforms(
        mut self,
        width: &'static str,
        height: &'static str,
        units: SizeUnits,
    ) -> Self {
        self.size_uniforms = Some(SizeUniforms {
            width,
            height,
            units,
        });
        self
    }

    pub fn with_param(mut self, param: ParamInfo) -> Self {
        self.params.push(param);
        self
    }
}
