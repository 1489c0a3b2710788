use std::any::Any;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::layout_engine::context::LayoutContextRef;
use crate::layout_engine::{
    Direction, LayoutEngine, LayoutEngineCustomAction, LayoutEngineIdentity, LayoutEngineRef,
};
use crate::model::{Monitor, Point, Rect, Window, WindowState};

/// Unit-square rectangles of floating windows, relative to the working area of
/// the monitor they sit on.
pub type FloatingRects = im::HashMap<Window, Rect<f64>>;

/// The window's OS rectangle, normalised against the monitor containing its
/// centre. `None` when the window has no rectangle or is on no monitor.
pub(crate) fn normalized_window_rect(ctx: &LayoutContextRef, window: &Window) -> Option<Rect<f64>> {
    let Some(rect) = window.rect() else {
        warn!(%window, "Window has no rectangle");
        return None;
    };
    let Some(monitor) = ctx.monitor_at_point(rect.center()) else {
        warn!(%window, %rect, "No monitor contains the window");
        return None;
    };
    Some(monitor.working_area.normalize(rect))
}

/// Stores the window's current rectangle in `rects`. `None` means nothing
/// changed or the rectangle is unavailable.
pub(crate) fn update_window_rect(
    ctx: &LayoutContextRef,
    rects: &FloatingRects,
    window: &Window,
) -> Option<FloatingRects> {
    let rect = normalized_window_rect(ctx, window)?;
    if rects.get(window) == Some(&rect) {
        return None;
    }
    Some(rects.update(window.clone(), rect))
}

/// Windows in a stable order for layout.
pub(crate) fn sorted_rects(rects: &FloatingRects) -> Vec<(&Window, &Rect<f64>)> {
    let mut sorted: Vec<_> = rects.iter().collect();
    sorted.sort_by_key(|(window, _)| window.id());
    sorted
}

/// Every window stays where the user put it.
#[derive(Clone, Debug)]
pub struct FloatingLayoutEngine {
    ctx: LayoutContextRef,
    identity: LayoutEngineIdentity,
    name: String,
    rects: FloatingRects,
}

impl FloatingLayoutEngine {
    pub fn new(ctx: LayoutContextRef, identity: LayoutEngineIdentity) -> Self {
        Self {
            ctx,
            identity,
            name: "Floating".to_string(),
            rects: FloatingRects::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn rect_of(&self, window: &Window) -> Option<Rect<f64>> { self.rects.get(window).copied() }

    fn update_rect(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        match update_window_rect(&self.ctx, &self.rects, window) {
            Some(rects) => Arc::new(Self { rects, ..(*self).clone() }),
            None => self,
        }
    }
}

impl LayoutEngine for FloatingLayoutEngine {
    fn name(&self) -> &str { &self.name }

    fn identity(&self) -> LayoutEngineIdentity { self.identity }

    fn count(&self) -> usize { self.rects.len() }

    fn add_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, "Adding window");
        self.update_rect(window)
    }

    fn remove_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, "Removing window");
        if !self.rects.contains_key(window) {
            return self;
        }
        Arc::new(Self { rects: self.rects.without(window), ..(*self).clone() })
    }

    fn move_window_to_point(self: Arc<Self>, window: &Window, _point: Point<f64>) -> LayoutEngineRef {
        self.update_rect(window)
    }

    fn move_window_edges_in_direction(
        self: Arc<Self>,
        _edges: Direction,
        _deltas: Point<f64>,
        window: &Window,
    ) -> LayoutEngineRef {
        self.update_rect(window)
    }

    fn minimize_window_start(self: Arc<Self>, _window: &Window) -> LayoutEngineRef { self }

    fn minimize_window_end(self: Arc<Self>, _window: &Window) -> LayoutEngineRef { self }

    fn focus_window_in_direction(self: Arc<Self>, _direction: Direction, _window: &Window) -> LayoutEngineRef {
        self
    }

    fn swap_window_in_direction(self: Arc<Self>, _direction: Direction, _window: &Window) -> LayoutEngineRef {
        self
    }

    fn perform_custom_action(self: Arc<Self>, _action: &LayoutEngineCustomAction) -> LayoutEngineRef { self }

    fn contains_window(&self, window: &Window) -> bool { self.rects.contains_key(window) }

    fn first_window(&self) -> Option<Window> {
        self.rects.keys().min_by_key(|window| window.id()).cloned()
    }

    fn do_layout(&self, _rect: Rect<i32>, monitor: &Monitor) -> Vec<WindowState> {
        debug!(engine = %self.name, "Doing floating layout");
        sorted_rects(&self.rects)
            .into_iter()
            .map(|(window, loc)| {
                WindowState::new(window.clone(), monitor.working_area.to_monitor(*loc), window.size())
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any { self }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::layout_engine::context::testing::context;
    use crate::layout_engine::engine::testing::*;
    use crate::model::WindowSize;
    use crate::model::window::testing::virtual_window;

    fn floating() -> LayoutEngineRef {
        Arc::new(FloatingLayoutEngine::new(context(None), LayoutEngineIdentity::new()))
    }

    #[test]
    fn test_unchanged_rect_returns_same_engine() {
        let handle = virtual_window(1);
        handle.native().set_rect(Some(Rect::new(192, 108, 960, 540)));

        let engine = floating().add_window(handle.window());
        assert_eq!(engine.count(), 1);
        assert!(same(&engine.clone().add_window(handle.window()), &engine));

        handle.native().set_rect(Some(Rect::new(0, 0, 960, 540)));
        let moved = engine.clone().move_window_to_point(handle.window(), Point::new(0.0, 0.0));
        assert!(!same(&moved, &engine));

        let floating = moved.find_layout_engine::<FloatingLayoutEngine>().unwrap();
        assert_eq!(floating.rect_of(handle.window()), Some(Rect::new(0.0, 0.0, 0.5, 0.5)));
        let original = engine.find_layout_engine::<FloatingLayoutEngine>().unwrap();
        assert_eq!(original.rect_of(handle.window()), Some(Rect::new(0.1, 0.1, 0.5, 0.5)));
    }

    #[test]
    fn test_window_without_rect_is_ignored() {
        let handle = virtual_window(1);
        handle.native().set_rect(None);
        let engine = floating();
        assert!(same(&engine.clone().add_window(handle.window()), &engine));
    }

    #[test]
    fn test_layout_uses_working_area() {
        let a = virtual_window(1);
        let b = virtual_window(2);
        a.native().set_rect(Some(Rect::new(192, 108, 960, 540)));
        b.native().set_rect(Some(Rect::new(0, 0, 480, 270)));
        b.native().set_maximized(true);

        let engine = floating().add_window(b.window()).add_window(a.window());
        assert_eq!(engine.first_window(), Some(a.window().clone()));

        let monitor = monitor(1920, 1080).with_working_area(Rect::new(0, 40, 1920, 1040));
        let states = engine.do_layout(Rect::new(0, 0, 100, 100), &monitor);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].window, *a.window());
        assert_eq!(states[0].rect, Rect::new(192, 144, 960, 520));
        assert_eq!(states[1].size, WindowSize::Maximized);
    }

    #[test]
    fn test_remove_window() {
        let handle = virtual_window(1);
        handle.native().set_rect(Some(Rect::new(10, 10, 100, 100)));
        let engine = floating().add_window(handle.window());

        let removed = engine.clone().remove_window(handle.window());
        assert_eq!(removed.count(), 0);
        assert!(same(&removed.clone().remove_window(handle.window()), &removed));
        assert!(engine.contains_window(handle.window()));
    }
}
