//! The closed set of selectable filters.

use std::fmt;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Stable filter identifiers. The numeric values are what selection surfaces
/// exchange and must never be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, FromPrimitive)]
#[repr(u32)]
pub enum FilterType {
    /// Pass-through, no filter.
    #[default]
    None = 0,
    Freud = 1,
    Nashville = 2,
    Lomo = 3,
    Toaster2 = 4,
    SkinSmooth = 5,
    Brightness = 100,
    Contrast = 101,
    Exposure = 102,
    Hue = 103,
    Saturation = 104,
    Sharpen = 105,
    ImageAdjust = 106,
}

impl FilterType {
    pub const ALL: [FilterType; 13] = [
        FilterType::None,
        FilterType::Freud,
        FilterType::Nashville,
        FilterType::Lomo,
        FilterType::Toaster2,
        FilterType::SkinSmooth,
        FilterType::Brightness,
        FilterType::Contrast,
        FilterType::Exposure,
        FilterType::Hue,
        FilterType::Saturation,
        FilterType::Sharpen,
        FilterType::ImageAdjust,
    ];

    /// `None` for identifiers outside the enumeration.
    pub fn from_id(id: u32) -> Option<Self> {
        Self::from_u32(id)
    }

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterType::None => "none",
            FilterType::Freud => "freud",
            FilterType::Nashville => "nashville",
            FilterType::Lomo => "lomo",
            FilterType::Toaster2 => "toaster2",
            FilterType::SkinSmooth => "skin_smooth",
            FilterType::Brightness => "brightness",
            FilterType::Contrast => "contrast",
            FilterType::Exposure => "exposure",
            FilterType::Hue => "hue",
            FilterType::Saturation => "saturation",
            FilterType::Sharpen => "sharpen",
            FilterType::ImageAdjust => "image_adjust",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
