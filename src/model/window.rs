use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::model::geometry::Rect;

/// Stable handle of a window on the host system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn new(raw: u64) -> Self { Self(raw) }

    pub fn as_u64(self) -> u64 { self.0 }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:#x}", self.0) }
}

/// What the core needs from a real window. Implemented by the embedding
/// application; [`VirtualWindow`] is a headless implementation.
pub trait NativeWindow: Send + Sync {
    fn id(&self) -> WindowId;

    fn title(&self) -> String { String::new() }

    fn is_minimized(&self) -> bool;

    fn is_maximized(&self) -> bool;

    /// The rectangle the OS reports for the window, in pixels.
    fn rect(&self) -> Option<Rect<i32>>;

    fn focus(&self);

    fn hide(&self);
}

/// Cheaply cloneable reference to a window. Equality and hashing only look at
/// the handle.
#[derive(Clone)]
pub struct Window(Arc<dyn NativeWindow>);

impl Window {
    pub fn new(native: impl NativeWindow + 'static) -> Self { Self(Arc::new(native)) }

    pub fn from_arc(native: Arc<dyn NativeWindow>) -> Self { Self(native) }

    pub fn id(&self) -> WindowId { self.0.id() }

    pub fn title(&self) -> String { self.0.title() }

    pub fn is_minimized(&self) -> bool { self.0.is_minimized() }

    pub fn is_maximized(&self) -> bool { self.0.is_maximized() }

    pub fn rect(&self) -> Option<Rect<i32>> { self.0.rect() }

    pub fn focus(&self) { self.0.focus() }

    pub fn hide(&self) { self.0.hide() }

    /// The size a layout should report for this window, based on its OS state.
    pub fn size(&self) -> WindowSize {
        if self.is_maximized() {
            WindowSize::Maximized
        } else if self.is_minimized() {
            WindowSize::Minimized
        } else {
            WindowSize::Normal
        }
    }
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool { self.id() == other.id() }
}

impl Eq for Window {}

impl Hash for Window {
    fn hash<H: Hasher>(&self, state: &mut H) { self.id().hash(state) }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Window").field(&self.id()).finish()
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Window({})", self.id()) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSize {
    #[default]
    Normal,
    Minimized,
    Maximized,
}

/// One placement produced by a layout pass.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowState {
    pub window: Window,
    pub rect: Rect<i32>,
    pub size: WindowSize,
}

impl WindowState {
    pub fn new(window: Window, rect: Rect<i32>, size: WindowSize) -> Self {
        Self { window, rect, size }
    }
}

#[derive(Debug, Default)]
struct VirtualWindowState {
    rect: Option<Rect<i32>>,
    minimized: bool,
    maximized: bool,
    hidden: bool,
}

/// A window with no OS behind it. Used by the simulator and by tests; focus
/// and hide requests are counted so callers can observe them.
#[derive(Debug)]
pub struct VirtualWindow {
    id: WindowId,
    title: String,
    state: Mutex<VirtualWindowState>,
    focus_count: AtomicUsize,
}

impl VirtualWindow {
    pub fn new(id: u64) -> Self {
        Self {
            id: WindowId::new(id),
            title: format!("Window {id}"),
            state: Mutex::new(VirtualWindowState::default()),
            focus_count: AtomicUsize::new(0),
        }
    }

    pub fn with_rect(self, rect: Rect<i32>) -> Self {
        self.state.lock().rect = Some(rect);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn set_rect(&self, rect: Option<Rect<i32>>) { self.state.lock().rect = rect; }

    pub fn set_minimized(&self, minimized: bool) { self.state.lock().minimized = minimized; }

    pub fn set_maximized(&self, maximized: bool) { self.state.lock().maximized = maximized; }

    pub fn is_hidden(&self) -> bool { self.state.lock().hidden }

    pub fn focus_count(&self) -> usize { self.focus_count.load(Ordering::Relaxed) }
}

impl NativeWindow for VirtualWindow {
    fn id(&self) -> WindowId { self.id }

    fn title(&self) -> String { self.title.clone() }

    fn is_minimized(&self) -> bool { self.state.lock().minimized }

    fn is_maximized(&self) -> bool { self.state.lock().maximized }

    fn rect(&self) -> Option<Rect<i32>> { self.state.lock().rect }

    fn focus(&self) {
        self.focus_count.fetch_add(1, Ordering::Relaxed);
        self.state.lock().hidden = false;
    }

    fn hide(&self) { self.state.lock().hidden = true; }
}

/// Keeps a typed handle to a [`VirtualWindow`] next to the type-erased
/// [`Window`], so tests and the simulator can poke at its state.
#[derive(Clone)]
pub struct VirtualWindowHandle {
    native: Arc<VirtualWindow>,
    window: Window,
}

impl VirtualWindowHandle {
    pub fn new(native: VirtualWindow) -> Self {
        let native = Arc::new(native);
        let window = Window::from_arc(native.clone());
        Self { native, window }
    }

    pub fn window(&self) -> &Window { &self.window }

    pub fn native(&self) -> &VirtualWindow { &self.native }
}

impl fmt::Debug for VirtualWindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.window.fmt(f) }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub(crate) fn window(id: u64) -> Window { Window::new(VirtualWindow::new(id)) }

    pub(crate) fn virtual_window(id: u64) -> VirtualWindowHandle {
        VirtualWindowHandle::new(VirtualWindow::new(id))
    }

    pub(crate) fn windows(count: u64) -> Vec<Window> { (0..count).map(window).collect() }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::testing::*;
    use super::*;

    #[test]
    fn equality_uses_handle_only() {
        let a = Window::new(VirtualWindow::new(7).with_title("a"));
        let b = Window::new(VirtualWindow::new(7).with_title("b"));
        assert_eq!(a, b);
        assert_ne!(a, window(8));
    }

    #[test]
    fn size_follows_native_state() {
        let handle = virtual_window(1);
        assert_eq!(handle.window().size(), WindowSize::Normal);

        handle.native().set_minimized(true);
        assert_eq!(handle.window().size(), WindowSize::Minimized);

        handle.native().set_maximized(true);
        assert_eq!(handle.window().size(), WindowSize::Maximized);
    }

    #[test]
    fn focus_is_counted_and_unhides() {
        let handle = virtual_window(3);
        handle.window().hide();
        assert!(handle.native().is_hidden());

        handle.window().focus();
        assert_eq!(handle.native().focus_count(), 1);
        assert!(!handle.native().is_hidden());
    }
}
