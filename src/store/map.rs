//! Relations between windows, workspaces and monitors.

use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::layout_engine::LayoutEngineRef;
use crate::model::{Monitor, MonitorId, Point, WindowId};
use crate::store::monitor::{pick_adjacent_monitor, pick_monitor_at_point, pick_monitor_by_handle};
use crate::store::window::pick_window_by_handle;
use crate::store::workspace::{
    AddWindowToWorkspaceTransform, FocusWorkspaceTransform, MoveWindowToPointInWorkspaceTransform,
    RemoveWindowFromWorkspaceTransform, Workspace, WorkspaceId, pick_active_workspace_id,
    pick_last_focused_window_handle, pick_workspace_by_id,
};
use crate::store::{MapEvent, RootSector, Sector, StoreError, Transform};

/// Where a newly added window goes.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RouterOptions {
    /// The workspace on the monitor the window opened on.
    #[default]
    RouteToLaunchedWorkspace,
    RouteToActiveWorkspace,
    /// The workspace on the monitor of the last window the store tracked.
    RouteToLastTrackedActiveWorkspace,
}

#[derive(Clone, Debug, Default)]
pub struct MapSector {
    pub(crate) window_workspaces: OrdMap<WindowId, WorkspaceId>,
    pub(crate) monitor_workspaces: OrdMap<MonitorId, WorkspaceId>,
    pub(crate) workspace_last_monitor: OrdMap<WorkspaceId, MonitorId>,
    pub(crate) sticky_workspace_monitor_indices: OrdMap<WorkspaceId, Vector<usize>>,
    pub(crate) router_options: RouterOptions,
    events: Vec<MapEvent>,
}

impl MapSector {
    pub fn router_options(&self) -> RouterOptions { self.router_options }

    pub fn monitor_of_workspace(&self, workspace: WorkspaceId) -> Option<MonitorId> {
        self.monitor_workspaces
            .iter()
            .find(|(_, id)| **id == workspace)
            .map(|(monitor, _)| *monitor)
    }

    /// Drops every reference to a workspace that no longer exists.
    pub(crate) fn forget_workspace(&mut self, workspace: WorkspaceId) {
        self.monitor_workspaces = self.monitor_workspaces.iter().filter(|(_, id)| **id != workspace).map(|(k, v)| (*k, *v)).collect();
        self.window_workspaces = self.window_workspaces.iter().filter(|(_, id)| **id != workspace).map(|(k, v)| (*k, *v)).collect();
        self.workspace_last_monitor.remove(&workspace);
        self.sticky_workspace_monitor_indices.remove(&workspace);
    }
}

impl Sector for MapSector {
    type Event = MapEvent;

    fn initialize(&mut self) {
        info!(router = %self.router_options, "Initializing map sector");
    }

    fn queue_event(&mut self, event: MapEvent) { self.events.push(event); }

    fn take_events(&mut self) -> Vec<MapEvent> { std::mem::take(&mut self.events) }
}

/// Workspaces shown on a monitor, in monitor order.
pub fn pick_all_active_workspaces() -> impl FnOnce(&RootSector) -> Vec<Workspace> {
    |root| {
        root.monitors
            .monitors
            .iter()
            .filter_map(|m| root.maps.monitor_workspaces.get(&m.id))
            .filter_map(|id| root.workspaces.workspaces.get(*id))
            .cloned()
            .collect()
    }
}

pub fn pick_workspace_by_monitor(monitor: MonitorId) -> impl FnOnce(&RootSector) -> Result<Workspace, StoreError> {
    move |root| {
        let id = root.maps.monitor_workspaces.get(&monitor).ok_or(StoreError::MonitorNotFound(monitor))?;
        pick_workspace_by_id(*id)(root)
    }
}

pub fn pick_workspace_by_window(window: WindowId) -> impl FnOnce(&RootSector) -> Result<Workspace, StoreError> {
    move |root| {
        let id = root.maps.window_workspaces.get(&window).ok_or(StoreError::WindowNotFound(window))?;
        pick_workspace_by_id(*id)(root)
    }
}

pub fn pick_monitor_by_workspace(workspace: WorkspaceId) -> impl FnOnce(&RootSector) -> Result<Monitor, StoreError> {
    move |root| {
        let monitor = root
            .maps
            .monitor_of_workspace(workspace)
            .ok_or(StoreError::NoMonitorForWorkspace(workspace))?;
        pick_monitor_by_handle(monitor)(root)
    }
}

pub fn pick_monitor_by_window(window: WindowId) -> impl FnOnce(&RootSector) -> Result<Monitor, StoreError> {
    move |root| {
        let workspace = root.maps.window_workspaces.get(&window).ok_or(StoreError::NoMonitorForWindow(window))?;
        pick_monitor_by_workspace(*workspace)(root)
    }
}

pub fn pick_active_layout_engine_by_monitor(
    monitor: MonitorId,
) -> impl FnOnce(&RootSector) -> Result<LayoutEngineRef, StoreError> {
    move |root| Ok(pick_workspace_by_monitor(monitor)(root)?.active_layout_engine().clone())
}

/// The workspace after (or before) the given one in creation order, wrapping
/// around. With `skip_active`, workspaces shown on a monitor are passed over.
pub fn pick_adjacent_workspace(
    workspace: WorkspaceId,
    reverse: bool,
    skip_active: bool,
) -> impl FnOnce(&RootSector) -> Result<Workspace, StoreError> {
    move |root| {
        let order = &root.workspaces.workspace_order;
        let index = order.index_of(&workspace).ok_or(StoreError::WorkspaceNotFound(workspace))?;
        let len = order.len();
        let step = |i: usize| if reverse { (i + len - 1) % len } else { (i + 1) % len };

        let mut next = step(index);
        while next != index {
            let candidate = order[next];
            let visible = root.maps.monitor_of_workspace(candidate).is_some();
            if !skip_active || !visible {
                return pick_workspace_by_id(candidate)(root);
            }
            next = step(next);
        }
        Err(StoreError::NoAdjacentWorkspace(workspace))
    }
}

/// The sticky monitor indices set for the workspace. Empty when the workspace
/// may go anywhere.
pub fn pick_explicit_sticky_monitor_indices_by_workspace(
    workspace: WorkspaceId,
) -> impl FnOnce(&RootSector) -> Result<Vec<usize>, StoreError> {
    move |root| {
        pick_workspace_by_id(workspace)(root)?;
        Ok(root
            .maps
            .sticky_workspace_monitor_indices
            .get(&workspace)
            .map(|indices| indices.iter().copied().collect())
            .unwrap_or_default())
    }
}

/// Monitors the workspace may be shown on. A workspace without sticky
/// monitors, or whose sticky monitors are all gone, may use any monitor.
pub fn pick_sticky_monitors_by_workspace(
    workspace: WorkspaceId,
) -> impl FnOnce(&RootSector) -> Result<Vec<MonitorId>, StoreError> {
    move |root| {
        let indices = pick_explicit_sticky_monitor_indices_by_workspace(workspace)(root)?;
        let monitors = &root.monitors.monitors;
        let sticky: Vec<MonitorId> = indices.iter().filter_map(|i| monitors.get(*i)).map(|m| m.id).collect();
        if sticky.is_empty() {
            return Ok(monitors.iter().map(|m| m.id).collect());
        }
        Ok(sticky)
    }
}

/// The monitor to show the workspace on: `target` (or the active monitor)
/// when allowed, else the monitor it was last shown on, else the first
/// allowed monitor.
pub fn pick_valid_monitor_by_workspace(
    workspace: WorkspaceId,
    target: Option<MonitorId>,
) -> impl FnOnce(&RootSector) -> Result<MonitorId, StoreError> {
    move |root| {
        let valid = pick_sticky_monitors_by_workspace(workspace)(root)?;
        let target = target.or(root.monitors.active_monitor);
        let last = root.maps.workspace_last_monitor.get(&workspace).copied();

        [target, last]
            .into_iter()
            .flatten()
            .find(|id| valid.contains(id))
            .or_else(|| valid.first().copied())
            .ok_or(StoreError::NoValidMonitor(workspace))
    }
}

/// The given window, or the last focused window of the active workspace.
pub(crate) fn window_or_last_focused(root: &RootSector, window: Option<WindowId>) -> Result<WindowId, StoreError> {
    match window {
        Some(window) => Ok(window),
        None => pick_last_focused_window_handle(None)(root).map_err(|_| StoreError::NoValidWindow),
    }
}

/// Shows a workspace on a monitor (the active one by default). A workspace
/// already shown elsewhere swaps places with the one it replaces.
#[derive(Clone, Debug)]
pub struct ActivateWorkspaceTransform {
    pub workspace: WorkspaceId,
    pub monitor: Option<MonitorId>,
    /// Focus the workspace's own window rather than the active workspace's.
    pub focus_workspace_window: bool,
}

impl ActivateWorkspaceTransform {
    pub fn new(workspace: WorkspaceId) -> Self {
        Self { workspace, monitor: None, focus_workspace_window: true }
    }

    pub fn on_monitor(mut self, monitor: MonitorId) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn without_focus(mut self) -> Self {
        self.focus_workspace_window = false;
        self
    }
}

impl Transform for ActivateWorkspaceTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let workspace = pick_workspace_by_id(self.workspace)(root)?;
        let target = pick_valid_monitor_by_workspace(workspace.id, self.monitor)(root)?;
        let target = pick_monitor_by_handle(target)(root)?;

        let maps = &mut root.maps;
        maps.workspace_last_monitor.insert(workspace.id, target.id);
        let previous = maps.monitor_workspaces.get(&target.id).copied();
        let loser = maps.monitor_of_workspace(workspace.id);
        if loser == Some(target.id) {
            debug!(%workspace, %target, "Workspace is already active");
            return Ok(());
        }

        maps.monitor_workspaces.insert(target.id, workspace.id);
        match (loser, previous) {
            (Some(loser), Some(previous)) => {
                debug!(%workspace, %loser, "Swapping workspaces between monitors");
                maps.monitor_workspaces.insert(loser, previous);
                maps.queue_event(MapEvent::MonitorWorkspaceChanged {
                    monitor: loser,
                    previous: Some(workspace.id),
                    current: previous,
                });
                root.workspaces.workspaces_to_layout.insert(previous);
            }
            (Some(loser), None) => {
                maps.monitor_workspaces.remove(&loser);
            }
            (None, Some(previous)) => {
                root.dispatch(DeactivateWorkspaceTransform { workspace: previous })?;
            }
            (None, None) => {}
        }

        root.workspaces.workspaces_to_layout.insert(workspace.id);
        let focus = if self.focus_workspace_window {
            Some(workspace.id)
        } else {
            pick_active_workspace_id()(root).ok()
        };
        if let Some(focus) = focus {
            root.dispatch(FocusWorkspaceTransform { workspace: focus })?;
        }

        root.maps.queue_event(MapEvent::MonitorWorkspaceChanged {
            monitor: target.id,
            previous,
            current: workspace.id,
        });
        Ok(())
    }
}

/// Activates the workspace next to the one on `monitor` (the active monitor
/// by default).
#[derive(Clone, Debug, Default)]
pub struct ActivateAdjacentWorkspaceTransform {
    pub monitor: Option<MonitorId>,
    pub reverse: bool,
    pub skip_active: bool,
}

impl Transform for ActivateAdjacentWorkspaceTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let monitor = self.monitor.or(root.monitors.active_monitor).ok_or(StoreError::NoMonitors)?;
        let current = pick_workspace_by_monitor(monitor)(root)?;
        let next = pick_adjacent_workspace(current.id, self.reverse, self.skip_active)(root)?;
        root.dispatch(ActivateWorkspaceTransform::new(next.id).on_monitor(monitor))
    }
}

/// Hides the windows of a workspace that just left its monitor.
#[derive(Clone, Debug)]
pub struct DeactivateWorkspaceTransform {
    pub workspace: WorkspaceId,
}

impl Transform for DeactivateWorkspaceTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let workspace = pick_workspace_by_id(self.workspace)(root)?;
        debug!(%workspace, "Deactivating workspace");
        for id in workspace.windows() {
            if let Some(window) = root.windows.windows.get(&id) {
                window.hide();
            }
        }
        root.workspaces.workspaces_to_layout.remove(&workspace.id);
        Ok(())
    }
}

/// Moves a window (the focused one by default) to another workspace.
#[derive(Clone, Debug)]
pub struct MoveWindowToWorkspaceTransform {
    pub workspace: WorkspaceId,
    pub window: Option<WindowId>,
}

impl Transform for MoveWindowToWorkspaceTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let target = pick_workspace_by_id(self.workspace)(root)?;
        let handle = window_or_last_focused(root, self.window)?;
        let window = pick_window_by_handle(handle)(root)?;
        let source = pick_workspace_by_window(handle)(root)?;
        if source.id == target.id {
            debug!(%window, %target, "Window is already in the workspace");
            return Ok(());
        }

        debug!(%window, %source, %target, "Moving window to workspace");
        root.maps.window_workspaces.insert(handle, target.id);
        root.dispatch(RemoveWindowFromWorkspaceTransform {
            workspace: source.id,
            window: window.clone(),
            skip_layout: true,
        })?;
        root.dispatch(AddWindowToWorkspaceTransform {
            workspace: target.id,
            window: window.clone(),
            skip_layout: true,
        })?;

        let visible = |id| root.maps.monitor_of_workspace(id).is_some();
        if visible(source.id) && visible(target.id) {
            root.workspaces.workspaces_to_layout.insert(source.id);
            root.workspaces.workspaces_to_layout.insert(target.id);
        } else {
            root.dispatch(ActivateWorkspaceTransform::new(target.id))?;
        }

        root.workspaces.window_to_focus = Some(handle);
        root.maps.queue_event(MapEvent::WindowRouted {
            window,
            previous: Some(source.id),
            current: Some(target.id),
        });
        Ok(())
    }
}

/// Moves a window to the workspace shown on `monitor`.
#[derive(Clone, Debug)]
pub struct MoveWindowToMonitorTransform {
    pub monitor: MonitorId,
    pub window: Option<WindowId>,
}

impl Transform for MoveWindowToMonitorTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let handle = window_or_last_focused(root, self.window)?;
        pick_window_by_handle(handle)(root)?;
        if pick_monitor_by_window(handle)(root).is_ok_and(|m| m.id == self.monitor) {
            debug!(%handle, monitor = %self.monitor, "Window is already on the monitor");
            return Ok(());
        }

        let target = pick_workspace_by_monitor(self.monitor)(root)?;
        root.dispatch(MoveWindowToWorkspaceTransform { workspace: target.id, window: Some(handle) })
    }
}

#[derive(Clone, Debug, Default)]
pub struct MoveWindowToAdjacentMonitorTransform {
    pub window: Option<WindowId>,
    pub reverse: bool,
}

impl Transform for MoveWindowToAdjacentMonitorTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let handle = window_or_last_focused(root, self.window)?;
        let current = pick_monitor_by_window(handle)(root)?;
        let next = pick_adjacent_monitor(Some(current.id), self.reverse, true)(root)?;
        root.dispatch(MoveWindowToMonitorTransform { monitor: next.id, window: Some(handle) })
    }
}

#[derive(Clone, Debug, Default)]
pub struct MoveWindowToAdjacentWorkspaceTransform {
    pub window: Option<WindowId>,
    pub reverse: bool,
    pub skip_active: bool,
}

impl Transform for MoveWindowToAdjacentWorkspaceTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let handle = window_or_last_focused(root, self.window)?;
        let current = pick_workspace_by_window(handle)(root)?;
        let next = pick_adjacent_workspace(current.id, self.reverse, self.skip_active)(root)?;
        root.dispatch(MoveWindowToWorkspaceTransform { workspace: next.id, window: Some(handle) })
    }
}

/// Drops a window at a desktop point: into the workspace of the monitor under
/// the point, at the matching spot of its layout.
#[derive(Clone, Debug)]
pub struct MoveWindowToPointTransform {
    pub window: WindowId,
    pub point: Point<i32>,
}

impl Transform for MoveWindowToPointTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let window = pick_window_by_handle(self.window)(root)?;
        let monitor = pick_monitor_at_point(self.point, false)(root)?;
        let target = pick_workspace_by_monitor(monitor.id)(root)?;
        let source = pick_workspace_by_window(self.window)(root).ok().map(|w| w.id);

        if let Some(source) = source.filter(|id| *id != target.id) {
            root.dispatch(RemoveWindowFromWorkspaceTransform::new(source, window.clone()))?;
        }
        root.maps.window_workspaces.insert(self.window, target.id);

        let point = monitor.working_area.to_unit_point(self.point);
        debug!(%window, %target, %point, "Moving window to point");
        root.dispatch(MoveWindowToPointInWorkspaceTransform { workspace: target.id, window: window.clone(), point })?;

        root.monitors.active_monitor = Some(monitor.id);
        root.workspaces.window_to_focus = Some(self.window);
        if source != Some(target.id) {
            root.maps.queue_event(MapEvent::WindowRouted { window, previous: source, current: Some(target.id) });
        }
        Ok(())
    }
}

/// Restricts a workspace to the monitors at the given indices. An empty list
/// lifts the restriction. A workspace shown on a monitor it may no longer use
/// is moved to one it may.
#[derive(Clone, Debug)]
pub struct SetStickyMonitorsTransform {
    pub workspace: WorkspaceId,
    pub monitor_indices: Vec<usize>,
}

impl Transform for SetStickyMonitorsTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let workspace = pick_workspace_by_id(self.workspace)(root)?;
        if self.monitor_indices.is_empty() {
            root.maps.sticky_workspace_monitor_indices.remove(&workspace.id);
        } else {
            root.maps
                .sticky_workspace_monitor_indices
                .insert(workspace.id, self.monitor_indices.into_iter().collect());
        }

        let Some(current) = root.maps.monitor_of_workspace(workspace.id) else {
            return Ok(());
        };
        let valid = pick_sticky_monitors_by_workspace(workspace.id)(root)?;
        if valid.contains(&current) {
            return Ok(());
        }

        debug!(%workspace, %current, "Workspace is no longer allowed on its monitor");
        let target = valid.first().copied().ok_or(StoreError::NoValidMonitor(workspace.id))?;
        root.dispatch(ActivateWorkspaceTransform::new(workspace.id).on_monitor(target))
    }
}

/// Moves every window of `source` into `target`, keeping their order.
#[derive(Clone, Debug)]
pub struct MergeWorkspaceWindowsTransform {
    pub source: WorkspaceId,
    pub target: WorkspaceId,
}

impl Transform for MergeWorkspaceWindowsTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let source = pick_workspace_by_id(self.source)(root)?;
        pick_workspace_by_id(self.target)(root)?;
        if source.id == self.target {
            return Ok(());
        }

        for handle in source.windows() {
            let window = pick_window_by_handle(handle)(root)?;
            root.dispatch(RemoveWindowFromWorkspaceTransform {
                workspace: source.id,
                window: window.clone(),
                skip_layout: true,
            })?;
            root.dispatch(AddWindowToWorkspaceTransform {
                workspace: self.target,
                window: window.clone(),
                skip_layout: true,
            })?;
            root.maps.window_workspaces.insert(handle, self.target);
            root.maps.queue_event(MapEvent::WindowRouted {
                window,
                previous: Some(source.id),
                current: Some(self.target),
            });
        }
        root.workspaces.workspaces_to_layout.insert(self.target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::model::Window;
    use crate::store::testing::*;
    use crate::store::window::WindowAddedTransform;
    use crate::store::workspace::pick_all_workspaces;
    use crate::store::{Store, StoreEvent};

    fn ids(store: &Store) -> Vec<WorkspaceId> {
        store.pick(pick_all_workspaces()).iter().map(|w| w.id).collect()
    }

    fn add_window(store: &mut Store, id: u64, monitor: usize) -> Window {
        let monitor = monitors(monitor as u64 + 1).remove(monitor);
        let window = window_on(id, &monitor).window().clone();
        store.dispatch(WindowAddedTransform::new(window.clone())).unwrap();
        window
    }

    fn monitor_ids() -> Vec<MonitorId> { monitors(3).iter().map(|m| m.id).collect() }

    #[test]
    fn workspaces_are_spread_over_monitors() {
        let store = initialized(2, 3);
        let ids = ids(&store);
        let m = monitor_ids();
        assert_eq!(store.pick(pick_workspace_by_monitor(m[0])).unwrap().id, ids[0]);
        assert_eq!(store.pick(pick_workspace_by_monitor(m[1])).unwrap().id, ids[1]);
        assert_eq!(store.pick(pick_monitor_by_workspace(ids[1])).unwrap().id, m[1]);
        assert_eq!(
            store.pick(pick_monitor_by_workspace(ids[2])).unwrap_err(),
            StoreError::NoMonitorForWorkspace(ids[2])
        );
        let active: Vec<_> = store.pick(pick_all_active_workspaces()).iter().map(|w| w.id).collect();
        assert_eq!(active, vec![ids[0], ids[1]]);
    }

    #[test]
    fn adjacent_workspace_wraps_and_skips_visible() {
        let store = initialized(2, 3);
        let ids = ids(&store);
        assert_eq!(store.pick(pick_adjacent_workspace(ids[2], false, false)).unwrap().id, ids[0]);
        assert_eq!(store.pick(pick_adjacent_workspace(ids[0], true, false)).unwrap().id, ids[2]);
        assert_eq!(store.pick(pick_adjacent_workspace(ids[0], false, true)).unwrap().id, ids[2]);
        assert_eq!(
            store.pick(pick_adjacent_workspace(ids[2], false, true)).unwrap_err(),
            StoreError::NoAdjacentWorkspace(ids[2])
        );
    }

    #[test]
    fn sticky_monitors_fall_back_to_all_monitors() {
        let mut store = initialized(3, 3);
        let ids = ids(&store);
        let m = monitor_ids();
        assert_eq!(store.pick(pick_sticky_monitors_by_workspace(ids[0])), Ok(m.clone()));
        assert_eq!(store.pick(pick_explicit_sticky_monitor_indices_by_workspace(ids[0])), Ok(vec![]));

        store.dispatch(SetStickyMonitorsTransform { workspace: ids[2], monitor_indices: vec![2, 7] }).unwrap();
        assert_eq!(store.pick(pick_sticky_monitors_by_workspace(ids[2])), Ok(vec![m[2]]));
        assert_eq!(store.pick(pick_explicit_sticky_monitor_indices_by_workspace(ids[2])), Ok(vec![2, 7]));

        store.dispatch(SetStickyMonitorsTransform { workspace: ids[1], monitor_indices: vec![5] }).unwrap();
        assert_eq!(store.pick(pick_sticky_monitors_by_workspace(ids[1])), Ok(m));
    }

    #[test]
    fn valid_monitor_prefers_target_then_last_then_first() {
        let mut store = initialized(2, 3);
        let ids = ids(&store);
        let m = monitor_ids();

        assert_eq!(store.pick(pick_valid_monitor_by_workspace(ids[2], Some(m[1]))), Ok(m[1]));
        // Defaults to the active monitor.
        assert_eq!(store.pick(pick_valid_monitor_by_workspace(ids[2], None)), Ok(m[0]));

        // ids[1] was last shown on the second monitor.
        store.dispatch(SetStickyMonitorsTransform { workspace: ids[1], monitor_indices: vec![1] }).unwrap();
        assert_eq!(store.pick(pick_valid_monitor_by_workspace(ids[1], Some(m[0]))), Ok(m[1]));

        store.dispatch(SetStickyMonitorsTransform { workspace: ids[2], monitor_indices: vec![1] }).unwrap();
        assert_eq!(store.pick(pick_valid_monitor_by_workspace(ids[2], Some(m[0]))), Ok(m[1]));
    }

    #[test]
    fn setting_sticky_monitors_moves_a_misplaced_workspace() {
        let mut store = initialized(2, 2);
        let ids = ids(&store);
        let m = monitor_ids();

        store.dispatch(SetStickyMonitorsTransform { workspace: ids[0], monitor_indices: vec![1] }).unwrap();
        assert_eq!(store.pick(pick_monitor_by_workspace(ids[0])).unwrap().id, m[1]);
        assert_eq!(store.pick(pick_monitor_by_workspace(ids[1])).unwrap().id, m[0]);
    }

    #[test]
    fn activating_a_hidden_workspace_hides_the_old_one() {
        let mut store = initialized(1, 2);
        let ids = ids(&store);
        let monitor = monitors(1).remove(0);
        let handle = window_on(1, &monitor);
        store.dispatch(WindowAddedTransform::new(handle.window().clone())).unwrap();
        let events = record_events(&mut store);

        store.dispatch(ActivateWorkspaceTransform::new(ids[1])).unwrap();
        assert_eq!(store.pick(pick_active_workspace_id()), Ok(ids[1]));
        assert!(handle.native().is_hidden());
        assert!(events.lock().contains(&StoreEvent::Map(MapEvent::MonitorWorkspaceChanged {
            monitor: monitor.id,
            previous: Some(ids[0]),
            current: ids[1],
        })));
    }

    #[test]
    fn activating_a_visible_workspace_swaps_monitors() {
        let mut store = initialized(2, 2);
        let ids = ids(&store);
        let m = monitor_ids();
        let events = record_events(&mut store);

        store.dispatch(ActivateWorkspaceTransform::new(ids[1]).on_monitor(m[0])).unwrap();
        assert_eq!(store.pick(pick_workspace_by_monitor(m[0])).unwrap().id, ids[1]);
        assert_eq!(store.pick(pick_workspace_by_monitor(m[1])).unwrap().id, ids[0]);

        let changes = events
            .lock()
            .iter()
            .filter(|e| matches!(e, StoreEvent::Map(MapEvent::MonitorWorkspaceChanged { .. })))
            .count();
        assert_eq!(changes, 2);

        let events_before = events.lock().len();
        store.dispatch(ActivateWorkspaceTransform::new(ids[1]).on_monitor(m[0])).unwrap();
        assert_eq!(events.lock().len(), events_before);
    }

    #[test]
    fn activate_adjacent_workspace() {
        let mut store = initialized(1, 3);
        let ids = ids(&store);
        store.dispatch(ActivateAdjacentWorkspaceTransform { reverse: true, ..Default::default() }).unwrap();
        assert_eq!(store.pick(pick_active_workspace_id()), Ok(ids[2]));
        store.dispatch(ActivateAdjacentWorkspaceTransform::default()).unwrap();
        assert_eq!(store.pick(pick_active_workspace_id()), Ok(ids[0]));
    }

    #[test]
    fn move_window_to_hidden_workspace_activates_it() {
        let mut store = initialized(1, 2);
        let ids = ids(&store);
        let window = add_window(&mut store, 1, 0);
        let events = record_events(&mut store);

        store.dispatch(MoveWindowToWorkspaceTransform { workspace: ids[1], window: None }).unwrap();

        assert_eq!(store.pick(pick_workspace_by_window(window.id())).unwrap().id, ids[1]);
        assert_eq!(store.pick(pick_active_workspace_id()), Ok(ids[1]));
        assert!(!store.pick(pick_workspace_by_id(ids[0])).unwrap().contains_window(window.id()));
        assert!(events.lock().contains(&StoreEvent::Map(MapEvent::WindowRouted {
            window: window.clone(),
            previous: Some(ids[0]),
            current: Some(ids[1]),
        })));
    }

    #[test]
    fn move_window_between_visible_workspaces() {
        let mut store = initialized(2, 2);
        let ids = ids(&store);
        let m = monitor_ids();
        let window = add_window(&mut store, 1, 0);

        store.dispatch(MoveWindowToMonitorTransform { monitor: m[1], window: Some(window.id()) }).unwrap();
        assert_eq!(store.pick(pick_monitor_by_window(window.id())).unwrap().id, m[1]);
        assert_eq!(store.pick(pick_workspace_by_monitor(m[0])).unwrap().id, ids[0]);

        let position = store.pick(crate::store::workspace::pick_window_position(window.id())).unwrap();
        assert_eq!(position.rect.x, 1920);
    }

    #[test]
    fn move_window_to_adjacent_monitor_wraps() {
        let mut store = initialized(2, 2);
        let m = monitor_ids();
        let window = add_window(&mut store, 1, 1);

        store.dispatch(MoveWindowToAdjacentMonitorTransform { window: Some(window.id()), reverse: false }).unwrap();
        assert_eq!(store.pick(pick_monitor_by_window(window.id())).unwrap().id, m[0]);
    }

    #[test]
    fn move_window_needs_a_window() {
        let mut store = initialized(1, 2);
        let ids = ids(&store);
        assert_eq!(
            store.dispatch(MoveWindowToWorkspaceTransform { workspace: ids[1], window: None }).unwrap_err(),
            StoreError::NoValidWindow
        );
    }

    #[test]
    fn move_window_to_point_crosses_monitors() {
        let mut store = initialized(2, 2);
        let ids = ids(&store);
        let first = add_window(&mut store, 1, 0);
        let second = add_window(&mut store, 2, 0);

        store.dispatch(MoveWindowToPointTransform { window: second.id(), point: Point::new(2000, 500) }).unwrap();
        assert_eq!(store.pick(pick_workspace_by_window(second.id())).unwrap().id, ids[1]);
        assert_eq!(store.pick(pick_workspace_by_window(first.id())).unwrap().id, ids[0]);

        assert!(matches!(
            store.dispatch(MoveWindowToPointTransform { window: second.id(), point: Point::new(-5, -5) }),
            Err(StoreError::NoMonitorAtPoint(_))
        ));
    }

    #[test]
    fn merge_keeps_window_order() {
        let mut store = initialized(1, 2);
        let ids = ids(&store);
        let windows: Vec<_> = (1..=3).map(|id| add_window(&mut store, id, 0)).collect();

        store.dispatch(MergeWorkspaceWindowsTransform { source: ids[0], target: ids[1] }).unwrap();
        let target = store.pick(pick_workspace_by_id(ids[1])).unwrap();
        assert_eq!(target.windows().collect::<Vec<_>>(), windows.iter().map(|w| w.id()).collect::<Vec<_>>());
        assert_eq!(store.pick(pick_workspace_by_id(ids[0])).unwrap().windows().count(), 0);
    }
}
