use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::model::{Monitor, Point, Rect, Window};

/// What engines may ask about the world outside their own state.
pub trait LayoutContext: fmt::Debug + Send + Sync {
    fn last_focused_window(&self) -> Option<Window>;

    fn active_monitor(&self) -> Option<Monitor>;

    fn monitor_at_point(&self, point: Point<i32>) -> Option<Monitor>;
}

pub type LayoutContextRef = Arc<dyn LayoutContext>;

/// Plain copy of the facts engines care about.
#[derive(Clone, Debug, Default)]
pub struct LayoutSnapshot {
    pub last_focused_window: Option<Window>,
    pub active_monitor: Option<Monitor>,
    pub monitors: Vec<Monitor>,
}

impl LayoutSnapshot {
    fn monitor_at_point(&self, point: Point<i32>) -> Option<Monitor> {
        self.monitors.iter().find(|m| m.bounds.contains(point)).cloned()
    }
}

/// A [`LayoutContext`] backed by a snapshot that the store replaces after
/// every successful dispatch.
#[derive(Debug, Default)]
pub struct SharedLayoutContext {
    snapshot: RwLock<LayoutSnapshot>,
}

impl SharedLayoutContext {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn with_snapshot(snapshot: LayoutSnapshot) -> Arc<Self> {
        Arc::new(Self { snapshot: RwLock::new(snapshot) })
    }

    pub fn update(&self, snapshot: LayoutSnapshot) { *self.snapshot.write() = snapshot; }

    pub fn snapshot(&self) -> LayoutSnapshot { self.snapshot.read().clone() }
}

impl LayoutContext for SharedLayoutContext {
    fn last_focused_window(&self) -> Option<Window> {
        self.snapshot.read().last_focused_window.clone()
    }

    fn active_monitor(&self) -> Option<Monitor> { self.snapshot.read().active_monitor.clone() }

    fn monitor_at_point(&self, point: Point<i32>) -> Option<Monitor> {
        self.snapshot.read().monitor_at_point(point)
    }
}

/// Fallback working area for engines that need pixel distances but run
/// without an active monitor.
pub(crate) const FALLBACK_AREA: Rect<i32> = Rect::new(0, 0, 1920, 1080);

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Context with a single 1920x1080 monitor and an optional focused window.
    pub(crate) fn context(last_focused: Option<Window>) -> Arc<SharedLayoutContext> {
        let monitor = Monitor::new(1, FALLBACK_AREA);
        SharedLayoutContext::with_snapshot(LayoutSnapshot {
            last_focused_window: last_focused,
            active_monitor: Some(monitor.clone()),
            monitors: vec![monitor],
        })
    }
}
