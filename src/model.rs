pub mod geometry;
pub mod monitor;
pub mod saved_state;
pub mod window;

pub use geometry::{Point, Rect};
pub use monitor::{Monitor, MonitorId};
pub use saved_state::{SavedState, SavedWindow, SavedWorkspace};
pub use window::{
    NativeWindow, VirtualWindow, VirtualWindowHandle, Window, WindowId, WindowSize, WindowState,
};
