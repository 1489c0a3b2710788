use crate::common::config::{GapSettings, InnerGaps, OuterGaps};
use crate::model::Rect;

/// The area left for tiling once the outer gaps are taken off the screen.
pub fn compute_tiling_area(screen: Rect<i32>, gaps: &GapSettings) -> Rect<i32> {
    let outer: &OuterGaps = &gaps.outer;
    if outer.top == 0 && outer.left == 0 && outer.bottom == 0 && outer.right == 0 {
        return screen;
    }

    Rect::new(
        screen.x + outer.left,
        screen.y + outer.top,
        (screen.width - outer.left - outer.right).max(0),
        (screen.height - outer.top - outer.bottom).max(0),
    )
}

/// Shrinks a window by the inner gap on every side. An axis that is not
/// larger than twice the gap is left alone, so degenerate windows never end
/// up with a negative size.
pub fn apply_inner_gaps(rect: Rect<i32>, inner: &InnerGaps) -> Rect<i32> {
    let mut result = rect;

    if rect.width > 2 * inner.horizontal {
        result.x += inner.horizontal;
        result.width -= 2 * inner.horizontal;
    }

    if rect.height > 2 * inner.vertical {
        result.y += inner.vertical;
        result.height -= 2 * inner.vertical;
    }

    result
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn gaps(outer: i32, inner: i32) -> GapSettings {
        GapSettings {
            outer: OuterGaps { top: outer, left: outer, bottom: outer, right: outer },
            inner: InnerGaps { horizontal: inner, vertical: inner },
        }
    }

    #[test]
    fn tiling_area_without_gaps_is_the_screen() {
        let screen = Rect::new(0, 25, 1920, 1055);
        assert_eq!(compute_tiling_area(screen, &gaps(0, 8)), screen);
    }

    #[test]
    fn tiling_area_is_clamped() {
        assert_eq!(
            compute_tiling_area(Rect::new(0, 0, 1920, 1080), &gaps(10, 0)),
            Rect::new(10, 10, 1900, 1060)
        );
        assert_eq!(
            compute_tiling_area(Rect::new(0, 0, 15, 15), &gaps(10, 0)),
            Rect::new(10, 10, 0, 0)
        );
    }

    #[test]
    fn inner_gaps_skip_degenerate_axes() {
        let inner = InnerGaps { horizontal: 5, vertical: 5 };
        assert_eq!(apply_inner_gaps(Rect::new(0, 0, 100, 100), &inner), Rect::new(5, 5, 90, 90));
        assert_eq!(apply_inner_gaps(Rect::new(0, 0, 10, 100), &inner), Rect::new(0, 5, 10, 90));
        assert_eq!(apply_inner_gaps(Rect::new(0, 0, 100, 0), &inner), Rect::new(5, 0, 90, 0));
        assert_eq!(apply_inner_gaps(Rect::new(0, 0, -20, -20), &inner), Rect::new(0, 0, -20, -20));
    }
}
