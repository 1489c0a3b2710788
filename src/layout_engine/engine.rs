use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

use crate::layout_engine::Direction;
use crate::model::{Monitor, Point, Rect, Window, WindowState};

pub type LayoutEngineRef = Arc<dyn LayoutEngine>;

/// Builds a leaf engine for a workspace slot.
pub type CreateLeafLayoutEngine = Arc<dyn Fn(LayoutEngineIdentity) -> LayoutEngineRef + Send + Sync>;

/// Wraps an engine in a proxy (gaps, floating windows, ...).
pub type CreateProxyLayoutEngine = Arc<dyn Fn(LayoutEngineRef) -> LayoutEngineRef + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("windows can only be added left, right, up or down, not {0:?}")]
    InvalidAddDirection(Direction),
}

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Token shared by every version of one logical engine. Engines are immutable,
/// so this is what ties an updated engine back to the slot it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutEngineIdentity(u64);

impl LayoutEngineIdentity {
    pub fn new() -> Self { Self(NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)) }
}

impl Default for LayoutEngineIdentity {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for LayoutEngineIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "engine-{}", self.0) }
}

/// A named, engine-specific operation. Engines that do not recognise the name
/// return themselves unchanged.
#[derive(Clone)]
pub struct LayoutEngineCustomAction {
    pub name: String,
    pub window: Option<Window>,
    pub payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl LayoutEngineCustomAction {
    pub fn new(name: impl Into<String>, window: Option<Window>) -> Self {
        Self { name: name.into(), window, payload: None }
    }

    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    pub fn payload<T: Any>(&self) -> Option<&T> { self.payload.as_ref()?.downcast_ref::<T>() }
}

impl fmt::Debug for LayoutEngineCustomAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutEngineCustomAction")
            .field("name", &self.name)
            .field("window", &self.window)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

/// An immutable layout. Every mutating method consumes an `Arc` of the engine
/// and hands back the engine to use from then on: the same `Arc` when nothing
/// changed, a new value otherwise.
pub trait LayoutEngine: fmt::Debug + Send + Sync + 'static {
    fn name(&self) -> &str;

    fn identity(&self) -> LayoutEngineIdentity;

    /// Number of windows tracked, minimized ones included.
    fn count(&self) -> usize;

    fn add_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef;

    fn remove_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef;

    /// Moves (or adds) `window` to the point, given in the unit square.
    fn move_window_to_point(self: Arc<Self>, window: &Window, point: Point<f64>) -> LayoutEngineRef;

    /// Moves the given edges of the window by `deltas`, given in the unit square.
    fn move_window_edges_in_direction(
        self: Arc<Self>,
        edges: Direction,
        deltas: Point<f64>,
        window: &Window,
    ) -> LayoutEngineRef;

    fn minimize_window_start(self: Arc<Self>, window: &Window) -> LayoutEngineRef;

    fn minimize_window_end(self: Arc<Self>, window: &Window) -> LayoutEngineRef;

    fn focus_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef;

    fn swap_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef;

    fn perform_custom_action(self: Arc<Self>, action: &LayoutEngineCustomAction) -> LayoutEngineRef;

    fn contains_window(&self, window: &Window) -> bool;

    fn first_window(&self) -> Option<Window>;

    /// Places every window inside `rect`. Pure: the same engine and inputs
    /// always give the same placements.
    fn do_layout(&self, rect: Rect<i32>, monitor: &Monitor) -> Vec<WindowState>;

    fn as_any(&self) -> &dyn Any;

    /// The wrapped engine, for proxies.
    fn inner(&self) -> Option<&LayoutEngineRef> { None }
}

assert_impl_all!(LayoutEngineRef: Send, Sync);
assert_impl_all!(LayoutEngineCustomAction: Send, Sync);

impl dyn LayoutEngine {
    /// Finds the first engine of type `T` in the proxy chain, starting with
    /// this one.
    pub fn find_layout_engine<T: LayoutEngine>(&self) -> Option<&T> {
        if let Some(engine) = self.as_any().downcast_ref::<T>() {
            return Some(engine);
        }
        self.inner()?.find_layout_engine::<T>()
    }

    /// Whether `other` is this very engine value or one wrapped by it.
    pub fn contains_equal(&self, other: &LayoutEngineRef) -> bool {
        if std::ptr::addr_eq(self as *const dyn LayoutEngine, Arc::as_ptr(other)) {
            return true;
        }
        self.inner().is_some_and(|inner| inner.contains_equal(other))
    }

    /// Depth of the proxy chain below this engine.
    pub fn proxy_depth(&self) -> usize { self.inner().map_or(0, |inner| 1 + inner.proxy_depth()) }
}

/// An engine that wraps another one. Implementors only describe how to swap
/// the inner engine; [`ProxyLayoutEngine::update_inner`] keeps the "same
/// `Arc` when nothing changed" contract.
pub trait ProxyLayoutEngine: LayoutEngine + Sized {
    fn inner_engine(&self) -> &LayoutEngineRef;

    fn with_inner(&self, inner: LayoutEngineRef) -> Self;

    fn update_inner(self: Arc<Self>, inner: LayoutEngineRef) -> LayoutEngineRef {
        if Arc::ptr_eq(self.inner_engine(), &inner) {
            self
        } else {
            Arc::new(self.with_inner(inner))
        }
    }
}
