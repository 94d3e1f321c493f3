//! Scalar filter parameters.
//!
//! A parameter is a named float uniform with a default and an inclusive
//! range. Values coming from a host are clamped, never rejected.

/// Describes one scalar parameter of a filter stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    /// Uniform name in the fragment or vertex shader.
    pub name: &'static str,
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

impl ParamInfo {
    pub const fn new(name: &'static str, default: f32, min: f32, max: f32) -> Self {
        Self {
            name,
            default,
            min,
            max,
        }
    }

    /// Clamp `value` into range. NaN falls back to the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        num::clamp(value, self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_into_range() {
        let info = ParamInfo::new("brightness", 0.0, -1.0, 1.0);
        assert_eq!(info.clamp(0.25), 0.25);
        assert_eq!(info.clamp(3.0), 1.0);
        assert_eq!(info.clamp(-3.0), -1.0);
        assert_eq!(info.clamp(f32::NAN), 0.0);
    }
}
