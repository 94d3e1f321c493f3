//! GLSL dialect detection and source adaptation.
//!
//! Filter shaders are written in the GLSL ES 1.00 dialect (`attribute`,
//! `varying`, `texture2D`, `gl_FragColor`, precision qualifiers). Desktop
//! contexts get a `#version` header plus compatibility macros so the same
//! text compiles everywhere.

use glium::CapabilitiesSource;

/// Supported GLSL targets, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslVersion {
    Glsl140,
    Glsl120,
    GlslEs100,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Pick the best GLSL target the context supports.
pub fn get_best_target(ctx: &impl CapabilitiesSource) -> Option<GlslVersion> {
    select_target(&ctx.get_capabilities().supported_glsl_versions)
}

/// Pick the best target out of a list of supported GLSL versions.
///
/// Returns `Glsl140` if supported, otherwise `Glsl120`, otherwise
/// `GlslEs100`, or `None` if none of them is available.
pub fn select_target(versions: &[glium::Version]) -> Option<GlslVersion> {
    let has = |api: glium::Api, major: u8, minor: u8| {
        versions
            .iter()
            .any(|v| *v == glium::Version(api, major, minor))
    };

    if has(glium::Api::Gl, 1, 4) {
        Some(GlslVersion::Glsl140)
    } else if has(glium::Api::Gl, 1, 2) {
        Some(GlslVersion::Glsl120)
    } else if has(glium::Api::GlEs, 1, 0) {
        Some(GlslVersion::GlslEs100)
    } else {
        None
    }
}

/// Rewrite a GLSL ES 1.00 style source for `version`.
///
/// Sources that already declare a `#version` are returned unchanged.
pub fn adapt_source(source: &str, version: GlslVersion, stage: ShaderStage) -> String {
    if source.trim_start().starts_with("#version") {
        return source.to_string();
    }

    let mut out = String::with_capacity(source.len() + 256);
    match version {
        GlslVersion::Glsl140 => {
            out.push_str("#version 140\n");
            match stage {
                ShaderStage::Vertex => {
                    out.push_str("#define attribute in\n#define varying out\n");
                }
                ShaderStage::Fragment => {
                    out.push_str("#define varying in\n#define texture2D texture\n");
                    out.push_str("out vec4 fragColor;\n#define gl_FragColor fragColor\n");
                }
            }
            out.push_str(source);
        }
        GlslVersion::Glsl120 => {
            out.push_str("#version 120\n#define lowp\n#define mediump\n#define highp\n");
            for line in source.lines() {
                if !is_precision_statement(line) {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        GlslVersion::GlslEs100 => {
            out.push_str("#version 100\n");
            if stage == ShaderStage::Fragment && !source.lines().any(is_precision_statement) {
                out.push_str("precision mediump float;\n");
            }
            out.push_str(source);
        }
    }
    out
}

fn is_precision_statement(line: &str) -> bool {
    line.trim_start().starts_with("precision ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use glium::{Api, Version};

    const FRAGMENT: &str = "precision mediump float;\n\
        varying vec2 textureCoordinate;\n\
        uniform sampler2D inputImageTexture;\n\
        void main() { gl_FragColor = texture2D(inputImageTexture, textureCoordinate); }\n";

    #[test]
    fn prefers_newest_desktop_dialect() {
        let all = [
            Version(Api::Gl, 1, 1),
            Version(Api::Gl, 1, 2),
            Version(Api::Gl, 1, 4),
        ];
        assert_eq!(select_target(&all), Some(GlslVersion::Glsl140));
        assert_eq!(select_target(&all[..2]), Some(GlslVersion::Glsl120));
        assert_eq!(
            select_target(&[Version(Api::GlEs, 1, 0)]),
            Some(GlslVersion::GlslEs100)
        );
        assert_eq!(select_target(&[Version(Api::Gl, 1, 1)]), None);
    }

    #[test]
    fn glsl140_maps_legacy_keywords() {
        let out = adapt_source(FRAGMENT, GlslVersion::Glsl140, ShaderStage::Fragment);
        assert!(out.starts_with("#version 140\n"));
        assert!(out.contains("#define gl_FragColor fragColor"));
        assert!(out.contains("#define varying in"));

        let vertex = adapt_source("attribute vec4 position;", GlslVersion::Glsl140, ShaderStage::Vertex);
        assert!(vertex.contains("#define attribute in"));
        assert!(vertex.contains("#define varying out"));
    }

    #[test]
    fn glsl120_strips_precision_statements() {
        let out = adapt_source(FRAGMENT, GlslVersion::Glsl120, ShaderStage::Fragment);
        assert!(out.starts_with("#version 120\n"));
        assert!(!out.contains("precision mediump float;"));
        assert!(out.contains("#define lowp"));
        assert!(out.contains("uniform sampler2D inputImageTexture;"));
    }

    #[test]
    fn es100_adds_default_precision_once() {
        let bare = "void main() { gl_FragColor = vec4(1.0); }";
        let out = adapt_source(bare, GlslVersion::GlslEs100, ShaderStage::Fragment);
        assert!(out.contains("precision mediump float;"));

        let out = adapt_source(FRAGMENT, GlslVersion::GlslEs100, ShaderStage::Fragment);
        assert_eq!(out.matches("precision mediump float;").count(), 1);
    }

    #[test]
    fn versioned_sources_pass_through() {
        let src = "#version 330 core\nvoid main() {}";
        assert_eq!(
            adapt_source(src, GlslVersion::Glsl120, ShaderStage::Vertex),
            src
        );
    }
}
