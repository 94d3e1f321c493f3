//! Descriptors for every built-in [`FilterType`].

use anyhow::Result;
use filter_core::{FilterType, ParamInfo, ResourceLoader, TextureSource};

use crate::descriptor::{FilterDescriptor, ShaderSource, SizeUnits};
use crate::filter::Filter;
use crate::graph::FilterGraph;
use crate::shaders;
use crate::stage::FilterStage;

pub const BRIGHTNESS: ParamInfo = ParamInfo::new("brightness", 0.0, -1.0, 1.0);
pub const CONTRAST: ParamInfo = ParamInfo::new("contrast", 1.0, 0.0, 4.0);
pub const EXPOSURE: ParamInfo = ParamInfo::new("exposure", 0.0, -10.0, 10.0);
pub const HUE: ParamInfo = ParamInfo::new("hueAdjust", 0.0, 0.0, std::f32::consts::TAU);
pub const SATURATION: ParamInfo = ParamInfo::new("saturation", 1.0, 0.0, 2.0);
pub const SHARPNESS: ParamInfo = ParamInfo::new("sharpness", 0.0, -4.0, 4.0);
pub const SMOOTHING: ParamInfo = ParamInfo::new("smoothing", 0.5, 0.0, 1.0);

/// Filters drawn, in order, by [`FilterType::ImageAdjust`].
pub const IMAGE_ADJUST_STAGES: [FilterType; 6] = [
    FilterType::Contrast,
    FilterType::Brightness,
    FilterType::Exposure,
    FilterType::Hue,
    FilterType::Saturation,
    FilterType::Sharpen,
];

/// The descriptor of a single-stage filter. `None` for the pass-through
/// type and for graphs.
pub fn descriptor(ty: FilterType) -> Option<FilterDescriptor> {
    let desc = match ty {
        FilterType::None | FilterType::ImageAdjust => return None,
        FilterType::Freud => FilterDescriptor::new("freud", ShaderSource::Resource("freud"))
            .with_assets(["filter/freud_rand.png"])
            .with_size_uniforms(
                "inputImageTextureWidth",
                "inputImageTextureHeight",
                SizeUnits::Pixels,
            ),
        FilterType::Nashville => {
            FilterDescriptor::new("nashville", ShaderSource::Resource("nashville"))
                .with_assets(["filter/nashvillemap.png"])
        }
        FilterType::Lomo => FilterDescriptor::new("lomo", ShaderSource::Resource("lomo"))
            .with_assets(["filter/lomomap_new.png", "filter/vignette_map.png"]),
        FilterType::Toaster2 => FilterDescriptor::new(
            "toaster2",
            ShaderSource::Resource("toaster2_filter_shader"),
        )
        .with_assets([
            "filter/toastermetal.png",
            "filter/toastersoftlight.png",
            "filter/toastercurves.png",
            "filter/toasteroverlaymapwarm.png",
            "filter/toastercolorshift.png",
        ]),
        FilterType::SkinSmooth => {
            FilterDescriptor::new("skin_smooth", ShaderSource::Resource("skin_smooth"))
                .with_texture("skinMaskTexture", TextureSource::Mask)
                .with_param(SMOOTHING)
        }
        FilterType::Brightness => adjustment("brightness", shaders::BRIGHTNESS_FRAGMENT, BRIGHTNESS),
        FilterType::Contrast => adjustment("contrast", shaders::CONTRAST_FRAGMENT, CONTRAST),
        FilterType::Exposure => adjustment("exposure", shaders::EXPOSURE_FRAGMENT, EXPOSURE),
        FilterType::Hue => adjustment("hue", shaders::HUE_FRAGMENT, HUE),
        FilterType::Saturation => adjustment("saturation", shaders::SATURATION_FRAGMENT, SATURATION),
        FilterType::Sharpen => adjustment("sharpen", shaders::SHARPEN_FRAGMENT, SHARPNESS)
            .with_vertex(ShaderSource::Embedded(shaders::SHARPEN_VERTEX))
            .with_size_uniforms("imageWidthFactor", "imageHeightFactor", SizeUnits::Texel),
    };
    Some(desc)
}

fn adjustment(name: &'static str, fragment: &'static str, param: ParamInfo) -> FilterDescriptor {
    FilterDescriptor::new(name, ShaderSource::Embedded(fragment)).with_param(param)
}

/// Construct the filter for `ty`. The pass-through type has no filter.
pub fn build(ty: FilterType, loader: &dyn ResourceLoader) -> Result<Option<Box<dyn Filter>>> {
    if ty == FilterType::ImageAdjust {
        let stages = IMAGE_ADJUST_STAGES
            .iter()
            .filter_map(|member| descriptor(*member))
            .map(|desc| FilterStage::new(&desc, loader))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Some(Box::new(FilterGraph::new("image_adjust", stages)?)));
    }

    match descriptor(ty) {
        Some(desc) => Ok(Some(Box::new(FilterStage::new(&desc, loader)?))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auxiliary_texture_counts() {
        let count = |ty| descriptor(ty).map(|d| d.aux_textures.len());
        assert_eq!(count(FilterType::Freud), Some(1));
        assert_eq!(count(FilterType::Nashville), Some(1));
        assert_eq!(count(FilterType::Lomo), Some(2));
        assert_eq!(count(FilterType::Toaster2), Some(5));
        assert_eq!(count(FilterType::SkinSmooth), Some(1));
        assert_eq!(count(FilterType::Brightness), Some(0));
        assert_eq!(count(FilterType::None), None);
    }

    #[test]
    fn toaster_uniforms_are_contiguous() {
        let desc = descriptor(FilterType::Toaster2).unwrap();
        let names: Vec<_> = desc.aux_textures.iter().map(|t| t.uniform.clone()).collect();
        assert_eq!(
            names,
            [
                "inputImageTexture2",
                "inputImageTexture3",
                "inputImageTexture4",
                "inputImageTexture5",
                "inputImageTexture6",
            ]
        );
    }

    #[test]
    fn every_param_default_is_in_range() {
        for ty in FilterType::ALL {
            let Some(desc) = descriptor(ty) else { continue };
            for param in &desc.params {
                assert_eq!(param.clamp(param.default), param.default, "{ty}");
            }
        }
    }
}
