use std::any::Any;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::layout_engine::context::LayoutContextRef;
use crate::layout_engine::floating::{FloatingRects, normalized_window_rect, sorted_rects, update_window_rect};
use crate::layout_engine::{
    Direction, LayoutEngine, LayoutEngineCustomAction, LayoutEngineIdentity, LayoutEngineRef,
    ProxyLayoutEngine,
};
use crate::model::{Monitor, Point, Rect, Window, WindowSize, WindowState};

/// Takes the action's window out of the inner engine and floats it.
pub const MARK_FLOATING_ACTION: &str = "floating.mark";
/// Hands the action's floating window back to the inner engine.
pub const DOCK_ACTION: &str = "floating.dock";
pub const TOGGLE_FLOATING_ACTION: &str = "floating.toggle";

/// Lets chosen windows float above the wrapped engine's layout.
#[derive(Clone, Debug)]
pub struct ProxyFloatingLayoutEngine {
    ctx: LayoutContextRef,
    inner: LayoutEngineRef,
    floating: FloatingRects,
    minimized: FloatingRects,
}

impl ProxyFloatingLayoutEngine {
    pub fn new(ctx: LayoutContextRef, inner: LayoutEngineRef) -> Self {
        Self {
            ctx,
            inner,
            floating: FloatingRects::new(),
            minimized: FloatingRects::new(),
        }
    }

    pub fn is_floating(&self, window: &Window) -> bool {
        self.floating.contains_key(window) || self.minimized.contains_key(window)
    }

    pub fn floating_rect(&self, window: &Window) -> Option<Rect<f64>> {
        self.floating.get(window).or_else(|| self.minimized.get(window)).copied()
    }

    fn with_floating(&self, floating: FloatingRects) -> Self { Self { floating, ..self.clone() } }

    fn update_rect(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        match update_window_rect(&self.ctx, &self.floating, window) {
            Some(floating) => Arc::new(self.with_floating(floating)),
            None => self,
        }
    }

    fn mark(&self, window: &Window) -> Option<Self> {
        if self.is_floating(window) {
            return None;
        }
        let rect = normalized_window_rect(&self.ctx, window)?;
        debug!(%window, %rect, "Marking window as floating");

        Some(Self {
            inner: self.inner.clone().remove_window(window),
            floating: self.floating.update(window.clone(), rect),
            ..self.clone()
        })
    }

    fn dock(&self, window: &Window) -> Option<Self> {
        if !self.is_floating(window) {
            return None;
        }
        debug!(%window, "Docking floating window");

        Some(Self {
            inner: self.inner.clone().add_window(window),
            floating: self.floating.without(window),
            minimized: self.minimized.without(window),
            ..self.clone()
        })
    }
}

impl ProxyLayoutEngine for ProxyFloatingLayoutEngine {
    fn inner_engine(&self) -> &LayoutEngineRef { &self.inner }

    fn with_inner(&self, inner: LayoutEngineRef) -> Self { Self { inner, ..self.clone() } }
}

impl LayoutEngine for ProxyFloatingLayoutEngine {
    fn name(&self) -> &str { self.inner.name() }

    fn identity(&self) -> LayoutEngineIdentity { self.inner.identity() }

    fn count(&self) -> usize { self.inner.count() + self.floating.len() + self.minimized.len() }

    fn add_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        if self.floating.contains_key(window) {
            return self.update_rect(window);
        }
        if self.minimized.contains_key(window) {
            return self;
        }
        let inner = self.inner.clone().add_window(window);
        self.update_inner(inner)
    }

    fn remove_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        if self.is_floating(window) {
            debug!(%window, "Removing floating window");
            return Arc::new(Self {
                floating: self.floating.without(window),
                minimized: self.minimized.without(window),
                ..(*self).clone()
            });
        }
        let inner = self.inner.clone().remove_window(window);
        self.update_inner(inner)
    }

    fn move_window_to_point(self: Arc<Self>, window: &Window, point: Point<f64>) -> LayoutEngineRef {
        if self.floating.contains_key(window) {
            return self.update_rect(window);
        }
        let inner = self.inner.clone().move_window_to_point(window, point);
        self.update_inner(inner)
    }

    fn move_window_edges_in_direction(
        self: Arc<Self>,
        edges: Direction,
        deltas: Point<f64>,
        window: &Window,
    ) -> LayoutEngineRef {
        if self.floating.contains_key(window) {
            return self.update_rect(window);
        }
        let inner = self.inner.clone().move_window_edges_in_direction(edges, deltas, window);
        self.update_inner(inner)
    }

    fn minimize_window_start(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        if let Some(rect) = self.floating.get(window).copied() {
            return Arc::new(Self {
                floating: self.floating.without(window),
                minimized: self.minimized.update(window.clone(), rect),
                ..(*self).clone()
            });
        }
        if self.minimized.contains_key(window) {
            return self;
        }
        let inner = self.inner.clone().minimize_window_start(window);
        self.update_inner(inner)
    }

    fn minimize_window_end(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        if let Some(rect) = self.minimized.get(window).copied() {
            return Arc::new(Self {
                floating: self.floating.update(window.clone(), rect),
                minimized: self.minimized.without(window),
                ..(*self).clone()
            });
        }
        if self.floating.contains_key(window) {
            return self;
        }
        let inner = self.inner.clone().minimize_window_end(window);
        self.update_inner(inner)
    }

    fn focus_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef {
        if self.is_floating(window) {
            // Floating windows have no neighbours, fall back to the tiled layout.
            if let Some(first) = self.inner.first_window() {
                first.focus();
            }
            return self;
        }
        let inner = self.inner.clone().focus_window_in_direction(direction, window);
        self.update_inner(inner)
    }

    fn swap_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef {
        if self.is_floating(window) {
            return self;
        }
        let inner = self.inner.clone().swap_window_in_direction(direction, window);
        self.update_inner(inner)
    }

    fn perform_custom_action(self: Arc<Self>, action: &LayoutEngineCustomAction) -> LayoutEngineRef {
        let target = action.window.as_ref();
        let updated = match (action.name.as_str(), target) {
            (MARK_FLOATING_ACTION, Some(window)) => self.mark(window),
            (DOCK_ACTION, Some(window)) => self.dock(window),
            (TOGGLE_FLOATING_ACTION, Some(window)) => {
                if self.is_floating(window) { self.dock(window) } else { self.mark(window) }
            }
            (MARK_FLOATING_ACTION | DOCK_ACTION | TOGGLE_FLOATING_ACTION, None) => {
                warn!(action = %action.name, "Floating action without a window");
                None
            }
            (_, Some(window)) if self.is_floating(window) => None,
            _ => {
                let inner = self.inner.clone().perform_custom_action(action);
                return self.update_inner(inner);
            }
        };

        match updated {
            Some(engine) => Arc::new(engine),
            None => self,
        }
    }

    fn contains_window(&self, window: &Window) -> bool {
        self.is_floating(window) || self.inner.contains_window(window)
    }

    fn first_window(&self) -> Option<Window> {
        self.inner
            .first_window()
            .or_else(|| sorted_rects(&self.floating).first().map(|(window, _)| (*window).clone()))
    }

    fn do_layout(&self, rect: Rect<i32>, monitor: &Monitor) -> Vec<WindowState> {
        let floating = sorted_rects(&self.floating)
            .into_iter()
            .map(|(window, loc)| WindowState::new(window.clone(), rect.to_monitor(*loc), WindowSize::Normal));
        let minimized = sorted_rects(&self.minimized)
            .into_iter()
            .map(|(window, loc)| WindowState::new(window.clone(), rect.to_monitor(*loc), WindowSize::Minimized));

        floating.chain(minimized).chain(self.inner.do_layout(rect, monitor)).collect()
    }

    fn as_any(&self) -> &dyn Any { self }

    fn inner(&self) -> Option<&LayoutEngineRef> { Some(&self.inner) }
}
