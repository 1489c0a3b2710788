use im::OrdMap;
use tracing::{debug, info, warn};

use crate::layout_engine::Direction;
use crate::model::{Point, Rect, Window, WindowId};
use crate::store::map::{
    ActivateWorkspaceTransform, MoveWindowToPointTransform, RouterOptions, pick_monitor_by_workspace,
    pick_workspace_by_monitor, pick_workspace_by_window,
};
use crate::store::monitor::pick_monitor_at_point;
use crate::store::workspace::{
    AddWindowToWorkspaceTransform, MinimizeWindowEndTransform, MinimizeWindowStartTransform,
    MoveWindowEdgesInDirectionTransform, RemoveWindowFromWorkspaceTransform, WorkspaceId,
    pick_active_workspace_id, pick_window_position,
};
use crate::store::{MapEvent, RootSector, Sector, StoreError, Transform, WindowEvent};

#[derive(Clone, Debug, Default)]
pub struct WindowSector {
    pub(crate) windows: OrdMap<WindowId, Window>,
    /// Set between a move start and its end.
    pub(crate) is_moving: bool,
    events: Vec<WindowEvent>,
}

impl WindowSector {
    pub fn windows(&self) -> &OrdMap<WindowId, Window> { &self.windows }

    pub fn is_moving(&self) -> bool { self.is_moving }
}

impl Sector for WindowSector {
    type Event = WindowEvent;

    fn initialize(&mut self) {
        info!(windows = self.windows.len(), "Initializing window sector");
    }

    fn queue_event(&mut self, event: WindowEvent) { self.events.push(event); }

    fn take_events(&mut self) -> Vec<WindowEvent> { std::mem::take(&mut self.events) }
}

pub fn pick_window_by_handle(handle: WindowId) -> impl FnOnce(&RootSector) -> Result<Window, StoreError> {
    move |root| root.windows.windows.get(&handle).cloned().ok_or(StoreError::WindowNotFound(handle))
}

pub fn pick_all_windows() -> impl FnOnce(&RootSector) -> Vec<Window> {
    |root| root.windows.windows.values().cloned().collect()
}

/// The workspace a new window belongs in. Falls back to the active workspace
/// when the preferred one cannot be found.
fn route(root: &RootSector, window: &Window, router: RouterOptions) -> Result<WorkspaceId, StoreError> {
    let preferred = match router {
        RouterOptions::RouteToActiveWorkspace => None,
        RouterOptions::RouteToLastTrackedActiveWorkspace => root
            .monitors
            .last_active_monitor
            .and_then(|monitor| pick_workspace_by_monitor(monitor)(root).ok()),
        RouterOptions::RouteToLaunchedWorkspace => window
            .rect()
            .and_then(|rect| pick_monitor_at_point(rect.center(), false)(root).ok())
            .and_then(|monitor| pick_workspace_by_monitor(monitor.id)(root).ok()),
    };
    match preferred {
        Some(workspace) => Ok(workspace.id),
        None => pick_active_workspace_id()(root),
    }
}

/// Starts tracking a window and routes it to a workspace. Adding a window
/// that is already tracked does nothing.
#[derive(Clone, Debug)]
pub struct WindowAddedTransform {
    pub window: Window,
    /// Overrides the store's router for this window.
    pub router_options: Option<RouterOptions>,
}

impl WindowAddedTransform {
    pub fn new(window: Window) -> Self { Self { window, router_options: None } }

    pub fn with_router_options(mut self, router_options: RouterOptions) -> Self {
        self.router_options = Some(router_options);
        self
    }
}

impl Transform for WindowAddedTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let window = self.window;
        let handle = window.id();
        if root.windows.windows.contains_key(&handle) {
            debug!(%window, "Window is already tracked");
            return Ok(());
        }

        let router = self.router_options.unwrap_or(root.maps.router_options);
        let workspace = route(root, &window, router)?;
        debug!(%window, ?workspace, %router, "Routing new window");

        root.windows.windows.insert(handle, window.clone());
        root.maps.window_workspaces.insert(handle, workspace);
        root.dispatch(AddWindowToWorkspaceTransform::new(workspace, window.clone()))?;
        if window.is_minimized() {
            root.dispatch(MinimizeWindowStartTransform { workspace, window: handle })?;
        } else {
            root.workspaces.window_to_focus = Some(handle);
        }

        root.maps.queue_event(MapEvent::WindowRouted {
            window: window.clone(),
            previous: None,
            current: Some(workspace),
        });
        root.windows.queue_event(WindowEvent::WindowAdded { window });
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct WindowRemovedTransform {
    pub window: WindowId,
}

impl Transform for WindowRemovedTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let window = pick_window_by_handle(self.window)(root)?;
        let workspace = pick_workspace_by_window(self.window)(root).ok();

        root.windows.windows.remove(&self.window);
        root.maps.window_workspaces.remove(&self.window);
        if root.workspaces.window_to_focus == Some(self.window) {
            root.workspaces.window_to_focus = None;
        }

        if let Some(workspace) = workspace {
            root.dispatch(RemoveWindowFromWorkspaceTransform::new(workspace.id, window.clone()))?;
            root.maps.queue_event(MapEvent::WindowRouted {
                window: window.clone(),
                previous: Some(workspace.id),
                current: None,
            });
        }
        root.windows.queue_event(WindowEvent::WindowRemoved { window });
        Ok(())
    }
}

/// The host focused a window (or nothing, or a window the store does not
/// track). Tracked windows make their monitor active, and their workspace
/// is shown if it was hidden.
#[derive(Clone, Debug)]
pub struct WindowFocusedTransform {
    pub window: Option<WindowId>,
}

impl Transform for WindowFocusedTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let window = self.window.and_then(|handle| root.windows.windows.get(&handle).cloned());
        let Some(window) = window else {
            root.windows.queue_event(WindowEvent::WindowFocused { window: None });
            return Ok(());
        };

        let handle = window.id();
        if let Ok(workspace) = pick_workspace_by_window(handle)(root) {
            if let Some(slot) = root.workspaces.workspaces.get_mut(workspace.id) {
                slot.last_focused_window = Some(handle);
            }

            if pick_monitor_by_workspace(workspace.id)(root).is_err() {
                debug!(%window, %workspace, "Focused window is in a hidden workspace");
                let pending = root.workspaces.window_to_focus;
                root.dispatch(ActivateWorkspaceTransform::new(workspace.id))?;
                root.workspaces.window_to_focus = pending;
            }

            if let Ok(monitor) = pick_monitor_by_workspace(workspace.id)(root) {
                root.monitors.active_monitor = Some(monitor.id);
                root.monitors.last_active_monitor = Some(monitor.id);
            }
        }

        root.windows.queue_event(WindowEvent::WindowFocused { window: Some(window) });
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct WindowMinimizeStartedTransform {
    pub window: WindowId,
}

impl Transform for WindowMinimizeStartedTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let window = pick_window_by_handle(self.window)(root)?;
        let workspace = pick_workspace_by_window(self.window)(root)?;
        root.dispatch(MinimizeWindowStartTransform { workspace: workspace.id, window: self.window })?;
        root.windows.queue_event(WindowEvent::WindowMinimizeStarted { window });
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct WindowMinimizeEndedTransform {
    pub window: WindowId,
}

impl Transform for WindowMinimizeEndedTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let window = pick_window_by_handle(self.window)(root)?;
        let workspace = pick_workspace_by_window(self.window)(root)?;
        root.dispatch(MinimizeWindowEndTransform { workspace: workspace.id, window: self.window })?;
        root.workspaces.window_to_focus = Some(self.window);
        root.windows.queue_event(WindowEvent::WindowMinimizeEnded { window });
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct WindowMoveStartedTransform {
    pub window: WindowId,
    pub cursor: Option<Point<i32>>,
}

impl Transform for WindowMoveStartedTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let window = pick_window_by_handle(self.window)(root)?;
        root.windows.is_moving = true;
        root.windows.queue_event(WindowEvent::WindowMoveStarted { window, cursor: self.cursor });
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct WindowMovedTransform {
    pub window: WindowId,
    pub cursor: Option<Point<i32>>,
}

impl Transform for WindowMovedTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let window = pick_window_by_handle(self.window)(root)?;
        if !root.windows.is_moving {
            return Ok(());
        }
        root.windows.queue_event(WindowEvent::WindowMoved { window, cursor: self.cursor });
        Ok(())
    }
}

/// Ends a drag. A drag that moved one edge per axis resizes the window in its
/// layout; any other drag drops the window at the cursor.
#[derive(Clone, Debug)]
pub struct WindowMoveEndedTransform {
    pub window: WindowId,
    pub cursor: Option<Point<i32>>,
}

impl Transform for WindowMoveEndedTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let window = pick_window_by_handle(self.window)(root)?;
        if !root.windows.is_moving {
            debug!(%window, "Ignoring move end without a move start");
            return Ok(());
        }
        root.windows.is_moving = false;

        let last = pick_window_position(self.window)(root).ok().map(|p| p.rect);
        let moved = last.zip(window.rect()).and_then(|(last, current)| moved_edges(last, current));

        match (moved, self.cursor) {
            (Some((edges, pixel_deltas)), _) => {
                let workspace = pick_workspace_by_window(self.window)(root)?;
                root.dispatch(MoveWindowEdgesInDirectionTransform {
                    workspace: Some(workspace.id),
                    window: Some(self.window),
                    edges,
                    pixel_deltas,
                })?;
            }
            (None, Some(cursor)) => {
                root.dispatch(MoveWindowToPointTransform { window: self.window, point: cursor })?;
            }
            (None, None) => warn!(%window, "Move ended without a cursor position"),
        }

        root.windows.queue_event(WindowEvent::WindowMoveEnded {
            window,
            moved_edges: moved.map(|(edges, _)| edges),
        });
        Ok(())
    }
}

/// The edges that moved between `last` and `current`, with how far they
/// moved. `None` unless at most one edge moved on each axis (the window was
/// resized rather than dragged).
fn moved_edges(last: Rect<i32>, current: Rect<i32>) -> Option<(Direction, Point<i32>)> {
    let mut edges = Direction::empty();
    let mut deltas = Point::new(0, 0);
    let (mut count_x, mut count_y) = (0, 0);

    if current.x != last.x {
        edges |= Direction::LEFT;
        deltas.x = current.x - last.x;
        count_x += 1;
    }
    if current.x + current.width != last.x + last.width {
        edges |= Direction::RIGHT;
        deltas.x = current.x + current.width - (last.x + last.width);
        count_x += 1;
    }
    if current.y != last.y {
        edges |= Direction::UP;
        deltas.y = current.y - last.y;
        count_y += 1;
    }
    if current.y + current.height != last.y + last.height {
        edges |= Direction::DOWN;
        deltas.y = current.y + current.height - (last.y + last.height);
        count_y += 1;
    }

    if edges.is_empty() || count_x > 1 || count_y > 1 {
        return None;
    }
    Some((edges, deltas))
}
