//! Headless core of a tiling window manager: layout engines that place
//! windows inside a monitor, and a store that tracks monitors, workspaces
//! and windows.

pub mod common;
pub mod layout_engine;
pub mod model;
pub mod store;
