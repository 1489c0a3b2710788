use std::any::Any;
use std::sync::Arc;

use tracing::debug;

use crate::common::config::{GapSettings, InnerGaps, OuterGaps};
use crate::layout_engine::utils::{apply_inner_gaps, compute_tiling_area};
use crate::layout_engine::{
    Direction, LayoutEngine, LayoutEngineCustomAction, LayoutEngineIdentity, LayoutEngineRef,
    ProxyLayoutEngine,
};
use crate::model::{Monitor, Point, Rect, Window, WindowState};

/// Leaves space around the screen edges and between the windows of the
/// wrapped engine.
#[derive(Clone, Debug)]
pub struct GapsLayoutEngine {
    gaps: GapSettings,
    inner: LayoutEngineRef,
}

impl GapsLayoutEngine {
    pub fn new(gaps: GapSettings, inner: LayoutEngineRef) -> Self { Self { gaps, inner } }

    pub fn gaps(&self) -> &GapSettings { &self.gaps }

    pub fn with_gaps(&self, gaps: GapSettings) -> Self { Self { gaps, inner: self.inner.clone() } }
}

/// Gaps in pixels for the given monitor.
fn scaled_gaps(gaps: &GapSettings, monitor: &Monitor) -> GapSettings {
    GapSettings {
        outer: OuterGaps {
            top: monitor.scale(gaps.outer.top),
            left: monitor.scale(gaps.outer.left),
            bottom: monitor.scale(gaps.outer.bottom),
            right: monitor.scale(gaps.outer.right),
        },
        inner: InnerGaps {
            horizontal: monitor.scale(gaps.inner.horizontal),
            vertical: monitor.scale(gaps.inner.vertical),
        },
    }
}

impl ProxyLayoutEngine for GapsLayoutEngine {
    fn inner_engine(&self) -> &LayoutEngineRef { &self.inner }

    fn with_inner(&self, inner: LayoutEngineRef) -> Self { Self { gaps: self.gaps.clone(), inner } }
}

impl LayoutEngine for GapsLayoutEngine {
    fn name(&self) -> &str { self.inner.name() }

    fn identity(&self) -> LayoutEngineIdentity { self.inner.identity() }

    fn count(&self) -> usize { self.inner.count() }

    fn add_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        let inner = self.inner.clone().add_window(window);
        self.update_inner(inner)
    }

    fn remove_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        let inner = self.inner.clone().remove_window(window);
        self.update_inner(inner)
    }

    fn move_window_to_point(self: Arc<Self>, window: &Window, point: Point<f64>) -> LayoutEngineRef {
        let inner = self.inner.clone().move_window_to_point(window, point);
        self.update_inner(inner)
    }

    fn move_window_edges_in_direction(
        self: Arc<Self>,
        edges: Direction,
        deltas: Point<f64>,
        window: &Window,
    ) -> LayoutEngineRef {
        let inner = self.inner.clone().move_window_edges_in_direction(edges, deltas, window);
        self.update_inner(inner)
    }

    fn minimize_window_start(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        let inner = self.inner.clone().minimize_window_start(window);
        self.update_inner(inner)
    }

    fn minimize_window_end(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        let inner = self.inner.clone().minimize_window_end(window);
        self.update_inner(inner)
    }

    fn focus_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef {
        let inner = self.inner.clone().focus_window_in_direction(direction, window);
        self.update_inner(inner)
    }

    fn swap_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef {
        let inner = self.inner.clone().swap_window_in_direction(direction, window);
        self.update_inner(inner)
    }

    fn perform_custom_action(self: Arc<Self>, action: &LayoutEngineCustomAction) -> LayoutEngineRef {
        let inner = self.inner.clone().perform_custom_action(action);
        self.update_inner(inner)
    }

    fn contains_window(&self, window: &Window) -> bool { self.inner.contains_window(window) }

    fn first_window(&self) -> Option<Window> { self.inner.first_window() }

    fn do_layout(&self, rect: Rect<i32>, monitor: &Monitor) -> Vec<WindowState> {
        let gaps = scaled_gaps(&self.gaps, monitor);
        debug!(?gaps, %rect, "Applying gaps");

        let area = compute_tiling_area(rect, &gaps);
        let mut states = self.inner.do_layout(area, monitor);
        for state in &mut states {
            state.rect = apply_inner_gaps(state.rect, &gaps.inner);
        }
        states
    }

    fn as_any(&self) -> &dyn Any { self }

    fn inner(&self) -> Option<&LayoutEngineRef> { Some(&self.inner) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::layout_engine::ColumnLayoutEngine;
    use crate::layout_engine::engine::testing::*;
    use crate::model::window::testing::windows;

    fn gaps(outer: i32, inner: i32) -> GapSettings {
        GapSettings {
            outer: OuterGaps { top: outer, left: outer, bottom: outer, right: outer },
            inner: InnerGaps { horizontal: inner, vertical: inner },
        }
    }

    fn gapped_column(outer: i32, inner: i32) -> LayoutEngineRef {
        let column: LayoutEngineRef = Arc::new(ColumnLayoutEngine::new(LayoutEngineIdentity::new(), true));
        Arc::new(GapsLayoutEngine::new(gaps(outer, inner), column))
    }

    #[test]
    fn test_two_columns_with_gaps() {
        let w = windows(2);
        let engine = add_all(gapped_column(10, 5), &w);
        let states = layout(&engine, 1920, 1080);
        assert_eq!(rect_of(&states, &w[0]), Some(Rect::new(15, 15, 940, 1050)));
        assert_eq!(rect_of(&states, &w[1]), Some(Rect::new(965, 15, 940, 1050)));
    }

    #[test]
    fn test_gaps_scale_with_monitor() {
        let w = windows(1);
        let engine = add_all(gapped_column(10, 5), &w);
        let monitor = monitor(1920, 1080).with_scale_factor(150);
        let states = engine.do_layout(Rect::new(0, 0, 1920, 1080), &monitor);
        assert_eq!(rect_of(&states, &w[0]), Some(Rect::new(22, 22, 1876, 1036)));
    }

    #[test]
    fn test_degenerate_axes_pass_through() {
        let w = windows(1);
        let engine = add_all(gapped_column(0, 10), &w);
        let states = engine.do_layout(Rect::new(0, 0, 15, 400), &monitor(15, 400));
        assert_eq!(rect_of(&states, &w[0]), Some(Rect::new(0, 10, 15, 380)));
    }

    #[test]
    fn test_delegates_and_keeps_identity() {
        let w = windows(2);
        let engine = add_all(gapped_column(10, 5), &w[..1]);
        assert_eq!(engine.count(), 1);
        assert_eq!(engine.proxy_depth(), 1);
        assert!(engine.find_layout_engine::<ColumnLayoutEngine>().is_some());

        assert!(same(&engine.clone().add_window(&w[0]), &engine));
        assert!(same(&engine.clone().remove_window(&w[1]), &engine));

        let inner = engine.inner().unwrap().clone();
        assert!(engine.contains_equal(&inner));

        let added = engine.clone().add_window(&w[1]);
        assert!(!same(&added, &engine));
        assert_eq!(added.identity(), engine.identity());
        assert!(!added.contains_equal(&inner));
        assert_eq!(engine.count(), 1);
    }
}
