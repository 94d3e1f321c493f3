//! Content placement inside the presentation surface.

/// How frame content is fitted to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    /// Scale to the view, ignoring aspect ratio.
    Stretch,
    /// Fit inside the view, letterboxed.
    #[default]
    PreserveAspectRatio,
    /// Cover the view, cropping overflow.
    PreserveAspectRatioAndFill,
}

/// Content rectangle in view pixels. May extend past the view when filling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ContentRect {
    /// Map a view-space point to normalized content coordinates, `None` when
    /// it falls outside the content.
    pub fn normalize(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let u = (x - self.x) / self.width;
        let v = (y - self.y) / self.height;
        ((0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v)).then_some((u, v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Quad scale in normalized device coordinates.
    pub scale: (f32, f32),
    /// Triangle-strip positions for the scaled quad.
    pub vertices: [f32; 8],
    pub content_rect: ContentRect,
}

impl Placement {
    pub fn compute(mode: FillMode, content: (u32, u32), view: (u32, u32)) -> Self {
        let (vw, vh) = (view.0 as f32, view.1 as f32);
        let scale = scale_factors(mode, content, view);
        let (sx, sy) = scale;
        let (width, height) = (sx * vw, sy * vh);

        Self {
            scale,
            vertices: [-sx, -sy, sx, -sy, -sx, sy, sx, sy],
            content_rect: ContentRect {
                x: (vw - width) / 2.0,
                y: (vh - height) / 2.0,
                width,
                height,
            },
        }
    }
}

fn scale_factors(mode: FillMode, (cw, ch): (u32, u32), (vw, vh): (u32, u32)) -> (f32, f32) {
    if cw == 0 || ch == 0 || vw == 0 || vh == 0 {
        return (1.0, 1.0);
    }
    let (cw, ch, vw, vh) = (cw as f32, ch as f32, vw as f32, vh as f32);

    // Largest rect with the content's aspect ratio that fits the view.
    let (inset_w, inset_h) = if cw / ch > vw / vh {
        (vw, vw * ch / cw)
    } else {
        (vh * cw / ch, vh)
    };

    match mode {
        FillMode::Stretch => (1.0, 1.0),
        FillMode::PreserveAspectRatio => (inset_w / vw, inset_h / vh),
        FillMode::PreserveAspectRatioAndFill => (vh / inset_h, vw / inset_w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn preserve_letterboxes_wide_content() {
        let p = Placement::compute(FillMode::PreserveAspectRatio, (1920, 1080), (1080, 1080));
        assert_relative_eq!(p.scale.0, 1.0);
        assert_relative_eq!(p.scale.1, 0.5625);
        assert_relative_eq!(p.content_rect.height, 607.5);
        assert_relative_eq!(p.content_rect.y, 236.25);
        assert_relative_eq!(p.content_rect.x, 0.0);
    }

    #[test]
    fn fill_covers_the_view() {
        let p = Placement::compute(
            FillMode::PreserveAspectRatioAndFill,
            (200, 100),
            (100, 100),
        );
        assert_relative_eq!(p.scale.0, 2.0);
        assert_relative_eq!(p.scale.1, 1.0);
        assert_relative_eq!(p.content_rect.x, -50.0);
        assert_eq!(p.vertices, [-2.0, -1.0, 2.0, -1.0, -2.0, 1.0, 2.0, 1.0]);

        let tall = Placement::compute(
            FillMode::PreserveAspectRatioAndFill,
            (100, 200),
            (100, 100),
        );
        assert_relative_eq!(tall.scale.0, 1.0);
        assert_relative_eq!(tall.scale.1, 2.0);
    }

    #[test]
    fn stretch_and_degenerate_sizes_use_unit_scale() {
        let p = Placement::compute(FillMode::Stretch, (640, 480), (100, 300));
        assert_eq!(p.scale, (1.0, 1.0));
        let p = Placement::compute(FillMode::PreserveAspectRatio, (0, 480), (100, 300));
        assert_eq!(p.scale, (1.0, 1.0));
    }

    #[test]
    fn normalize_maps_view_points_into_content() {
        let p = Placement::compute(FillMode::PreserveAspectRatio, (100, 50), (100, 100));
        assert_eq!(p.content_rect.normalize(50.0, 50.0), Some((0.5, 0.5)));
        assert_eq!(p.content_rect.normalize(50.0, 10.0), None);
    }
}
