//! Page-open transform construction
//!
//! Builds the page-to-device matrix for a freshly opened page: flip the
//! vertical axis (PDF puts the origin at the bottom-left), compensate for
//! the media box offset, apply the combined page + user rotation, shift
//! rotated content back into the positive quadrant, then scale by
//! `zoom * dpi / 72`. Mapping the media box through the finished matrix
//! yields the full rendered-page pixel size.

use crate::geometry::{IRect, Matrix, Rect};

/// Zoom policy for a page
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoomSpec {
    /// Largest zoom at which the whole page fits the surface
    Fit,
    /// Fit the rotated page width to the surface width
    FitWidth,
    /// Fit the rotated page height to the surface height
    FitHeight,
    /// Literal zoom factor (1.0 = 100%)
    Factor(f32),
}

/// Resolved geometry for an open page
#[derive(Clone, Copy, Debug)]
pub struct PageLayout {
    /// Page-space to device-pixel transform
    pub matrix: Matrix,
    /// Full rendered page size in device pixels, the scrollable-range basis
    pub page_size: IRect,
    /// The zoom factor after resolving fit modes
    pub zoom: f32,
}

impl PageLayout {
    /// Compute the layout for a page with the given media `bounds` and
    /// intrinsic rotation, viewed rotated by `user_rotation` degrees on a
    /// surface of `surface` pixels at `dpi` dots per inch.
    #[must_use]
    pub fn compute(
        bounds: Rect,
        page_rotation: i32,
        user_rotation: i32,
        zoom: ZoomSpec,
        dpi: (i32, i32),
        surface: (u32, u32),
    ) -> Self {
        let rotation = (page_rotation + user_rotation).rem_euclid(360);
        let width = bounds.width();
        let height = bounds.height();

        // Mirror on the x axis, then move the mirrored content down so the
        // page's top-left lands at the origin.
        let mut matrix = Matrix::scale(1.0, -1.0)
            .post_translate(-bounds.x0, bounds.y1)
            .post_rotate(rotation as f32);

        // Rotated content ends up in a negative quadrant; translate back.
        matrix = match rotation {
            90 => matrix.post_translate(height, 0.0),
            180 => matrix.post_translate(width, height),
            270 => matrix.post_translate(0.0, width),
            _ => matrix,
        };

        let (rotated_width, rotated_height) = match rotation {
            90 | 270 => (height, width),
            _ => (width, height),
        };

        let zoom_width = surface.0 as f32 * 72.0 / rotated_width / dpi.0 as f32;
        let zoom_height = surface.1 as f32 * 72.0 / rotated_height / dpi.1 as f32;
        let factor = match zoom {
            ZoomSpec::Fit => zoom_width.min(zoom_height),
            ZoomSpec::FitWidth => zoom_width,
            ZoomSpec::FitHeight => zoom_height,
            ZoomSpec::Factor(factor) => factor,
        };
        let factor = if factor.is_finite() { factor } else { 1.0 };

        let matrix = matrix.post_scale(
            factor * dpi.0 as f32 / 72.0,
            factor * dpi.1 as f32 / 72.0,
        );

        Self {
            matrix,
            page_size: matrix.transform_rect(bounds).round(),
            zoom: factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    const LETTER: Rect = Rect::new(0.0, 0.0, 612.0, 792.0);

    #[test]
    fn upright_letter_page_at_identity_zoom() {
        let layout = PageLayout::compute(LETTER, 0, 0, ZoomSpec::Factor(1.0), (72, 72), (600, 800));

        assert_eq!(layout.page_size, IRect::new(0, 0, 612, 792));

        // bottom-left page corner maps to the device origin
        let p = layout.matrix.transform_point(Point::new(0.0, 792.0));
        assert_eq!((p.x, p.y), (0.0, 0.0));
        let p = layout.matrix.transform_point(Point::new(612.0, 0.0));
        assert_eq!((p.x, p.y), (612.0, 792.0));
    }

    #[test]
    fn rotated_letter_page_swaps_extents() {
        let layout = PageLayout::compute(LETTER, 0, 90, ZoomSpec::Factor(1.0), (72, 72), (600, 800));
        assert_eq!(layout.page_size, IRect::new(0, 0, 792, 612));
    }

    #[test]
    fn fit_width_on_rotated_page() {
        let layout = PageLayout::compute(LETTER, 0, 90, ZoomSpec::FitWidth, (72, 72), (792, 600));
        assert!((layout.zoom - 1.0).abs() < 1e-6);
        assert_eq!(layout.page_size.width(), 792);
    }

    #[test]
    fn fit_picks_smaller_factor() {
        // 612x792 page on a 612x396 surface: width fits at 1.0, height at 0.5
        let layout = PageLayout::compute(LETTER, 0, 0, ZoomSpec::Fit, (72, 72), (612, 396));
        assert!((layout.zoom - 0.5).abs() < 1e-6);
        assert_eq!(layout.page_size, IRect::new(0, 0, 306, 396));
    }

    #[test]
    fn page_rotation_combines_with_user_rotation() {
        let layout = PageLayout::compute(LETTER, 270, 90, ZoomSpec::Factor(1.0), (72, 72), (600, 800));
        // 270 + 90 = 360: upright again
        assert_eq!(layout.page_size, IRect::new(0, 0, 612, 792));
    }

    #[test]
    fn media_box_offset_is_compensated() {
        let bounds = Rect::new(10.0, 20.0, 622.0, 812.0);
        let layout = PageLayout::compute(bounds, 0, 0, ZoomSpec::Factor(1.0), (72, 72), (600, 800));
        assert_eq!(layout.page_size, IRect::new(0, 0, 612, 792));

        let p = layout.matrix.transform_point(Point::new(10.0, 812.0));
        assert_eq!((p.x, p.y), (0.0, 0.0));
    }

    #[test]
    fn dpi_scales_both_axes_independently() {
        let layout =
            PageLayout::compute(LETTER, 0, 0, ZoomSpec::Factor(1.0), (144, 72), (600, 800));
        assert_eq!(layout.page_size, IRect::new(0, 0, 1224, 792));
    }

    #[test]
    fn rotation_180_stays_in_positive_quadrant() {
        let layout = PageLayout::compute(LETTER, 0, 180, ZoomSpec::Factor(1.0), (72, 72), (600, 800));
        assert_eq!(layout.page_size, IRect::new(0, 0, 612, 792));

        // top-left in page space maps to bottom-right on the device
        let p = layout.matrix.transform_point(Point::new(0.0, 792.0));
        assert_eq!((p.x, p.y), (612.0, 792.0));
    }
}
