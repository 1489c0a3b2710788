use std::fmt;
use std::sync::Arc;

use im::{OrdMap, OrdSet, Vector};
use slotmap::{SlotMap, new_key_type};
use tracing::{debug, error, info};

use crate::layout_engine::{CreateLeafLayoutEngine, CreateProxyLayoutEngine, LayoutEngineRef};
use crate::model::{Rect, Window, WindowId, WindowSize};
use crate::store::map::{pick_monitor_by_workspace, pick_workspace_by_window};
use crate::store::window::{WindowFocusedTransform, pick_window_by_handle};
use crate::store::{RootSector, Sector, StoreError, WorkspaceEvent};

mod transforms;

pub use transforms::*;

new_key_type! {
    pub struct WorkspaceId;
}

/// Where a window was put by the last layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowPosition {
    pub size: WindowSize,
    pub rect: Rect<i32>,
}

/// A named set of windows and the layout engines that can arrange them. Only
/// the active engine is laid out, but every engine tracks every window.
#[derive(Clone, Debug)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub layout_engines: Vector<LayoutEngineRef>,
    pub active_layout_engine_index: usize,
    pub previous_layout_engine_index: usize,
    pub last_focused_window: Option<WindowId>,
    pub window_positions: OrdMap<WindowId, WindowPosition>,
}

impl Workspace {
    pub fn active_layout_engine(&self) -> &LayoutEngineRef {
        &self.layout_engines[self.active_layout_engine_index]
    }

    pub fn windows(&self) -> impl Iterator<Item = WindowId> + '_ { self.window_positions.keys().copied() }

    pub fn contains_window(&self, window: WindowId) -> bool { self.window_positions.contains_key(&window) }

    /// Applies `f` to every engine. `None` when no engine changed.
    pub(crate) fn map_engines(
        &self,
        f: impl Fn(LayoutEngineRef) -> LayoutEngineRef,
    ) -> Option<Vector<LayoutEngineRef>> {
        let mut changed = false;
        let engines = self
            .layout_engines
            .iter()
            .map(|engine| {
                let next = f(engine.clone());
                changed |= !Arc::ptr_eq(&next, engine);
                next
            })
            .collect();
        changed.then_some(engines)
    }

    fn is_same(&self, other: &Workspace) -> bool {
        self.name == other.name
            && self.active_layout_engine_index == other.active_layout_engine_index
            && self.previous_layout_engine_index == other.previous_layout_engine_index
            && self.last_focused_window == other.last_focused_window
            && self.window_positions == other.window_positions
            && self.layout_engines.len() == other.layout_engines.len()
            && self.layout_engines.iter().zip(&other.layout_engines).all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} ({:?})", self.name, self.id) }
}

#[derive(Clone, Default)]
pub struct WorkspaceSector {
    pub(crate) has_initialized: bool,
    /// Workspaces requested before initialization.
    pub(crate) workspaces_to_create: Vec<AddWorkspaceTransform>,
    pub(crate) workspaces_to_layout: OrdSet<WorkspaceId>,
    pub(crate) window_to_focus: Option<WindowId>,
    pub(crate) workspace_order: Vector<WorkspaceId>,
    pub(crate) workspaces: SlotMap<WorkspaceId, Workspace>,
    pub(crate) create_layout_engines: Vec<CreateLeafLayoutEngine>,
    pub(crate) proxy_layout_engine_creators: Vec<CreateProxyLayoutEngine>,
    events: Vec<WorkspaceEvent>,
}

impl WorkspaceSector {
    pub fn has_initialized(&self) -> bool { self.has_initialized }

    pub fn workspace_order(&self) -> &Vector<WorkspaceId> { &self.workspace_order }

    pub fn get(&self, id: WorkspaceId) -> Option<&Workspace> { self.workspaces.get(id) }
}

impl fmt::Debug for WorkspaceSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceSector")
            .field("has_initialized", &self.has_initialized)
            .field("workspaces_to_create", &self.workspaces_to_create.len())
            .field("workspaces_to_layout", &self.workspaces_to_layout)
            .field("window_to_focus", &self.window_to_focus)
            .field("workspace_order", &self.workspace_order)
            .field("create_layout_engines", &self.create_layout_engines.len())
            .field("proxy_layout_engine_creators", &self.proxy_layout_engine_creators.len())
            .finish_non_exhaustive()
    }
}

impl Sector for WorkspaceSector {
    type Event = WorkspaceEvent;

    fn initialize(&mut self) {
        info!(pending = self.workspaces_to_create.len(), "Initializing workspace sector");
    }

    fn queue_event(&mut self, event: WorkspaceEvent) { self.events.push(event); }

    fn take_events(&mut self) -> Vec<WorkspaceEvent> { std::mem::take(&mut self.events) }
}

/// `None` stands for the active workspace.
fn resolve(root: &RootSector, id: Option<WorkspaceId>) -> Result<&Workspace, StoreError> {
    let id = match id {
        Some(id) => id,
        None => pick_active_workspace_id()(root)?,
    };
    root.workspaces.workspaces.get(id).ok_or(StoreError::WorkspaceNotFound(id))
}

pub fn pick_workspace_by_id(id: WorkspaceId) -> impl FnOnce(&RootSector) -> Result<Workspace, StoreError> {
    move |root| resolve(root, Some(id)).cloned()
}

pub fn pick_workspace_by_name(name: &str) -> impl FnOnce(&RootSector) -> Result<Workspace, StoreError> + '_ {
    move |root| {
        root.workspaces
            .workspaces
            .values()
            .find(|w| w.name == name)
            .cloned()
            .ok_or_else(|| StoreError::WorkspaceNameNotFound(name.to_string()))
    }
}

/// Every workspace, in creation order.
pub fn pick_all_workspaces() -> impl FnOnce(&RootSector) -> Vec<Workspace> {
    |root| {
        root.workspaces
            .workspace_order
            .iter()
            .filter_map(|id| root.workspaces.workspaces.get(*id))
            .cloned()
            .collect()
    }
}

/// The workspace shown on the active monitor.
pub fn pick_active_workspace_id() -> impl FnOnce(&RootSector) -> Result<WorkspaceId, StoreError> {
    |root| {
        let monitor = root.monitors.active_monitor.ok_or(StoreError::NoActiveWorkspace)?;
        root.maps.monitor_workspaces.get(&monitor).copied().ok_or(StoreError::NoActiveWorkspace)
    }
}

pub fn pick_active_workspace() -> impl FnOnce(&RootSector) -> Result<Workspace, StoreError> {
    |root| resolve(root, None).cloned()
}

pub fn pick_active_layout_engine(
    id: Option<WorkspaceId>,
) -> impl FnOnce(&RootSector) -> Result<LayoutEngineRef, StoreError> {
    move |root| Ok(resolve(root, id)?.active_layout_engine().clone())
}

pub fn pick_workspace_windows(id: Option<WorkspaceId>) -> impl FnOnce(&RootSector) -> Result<Vec<Window>, StoreError> {
    move |root| {
        let workspace = resolve(root, id)?;
        Ok(workspace
            .windows()
            .filter_map(|window| root.windows.windows.get(&window).cloned())
            .collect())
    }
}

pub fn pick_last_focused_window_handle(
    id: Option<WorkspaceId>,
) -> impl FnOnce(&RootSector) -> Result<WindowId, StoreError> {
    move |root| resolve(root, id)?.last_focused_window.ok_or(StoreError::NoValidWindow)
}

pub fn pick_last_focused_window(id: Option<WorkspaceId>) -> impl FnOnce(&RootSector) -> Result<Window, StoreError> {
    move |root| {
        let handle = pick_last_focused_window_handle(id)(root)?;
        pick_window_by_handle(handle)(root)
    }
}

pub fn pick_window_position_in_workspace(
    id: WorkspaceId,
    window: WindowId,
) -> impl FnOnce(&RootSector) -> Result<WindowPosition, StoreError> {
    move |root| {
        resolve(root, Some(id))?
            .window_positions
            .get(&window)
            .copied()
            .ok_or(StoreError::WindowNotInWorkspace { window, workspace: id })
    }
}

/// Position of a window in whichever workspace holds it.
pub fn pick_window_position(window: WindowId) -> impl FnOnce(&RootSector) -> Result<WindowPosition, StoreError> {
    move |root| {
        let workspace = pick_workspace_by_window(window)(root)?;
        pick_window_position_in_workspace(workspace.id, window)(root)
    }
}

pub fn pick_create_leaf_layout_engines() -> impl FnOnce(&RootSector) -> Vec<CreateLeafLayoutEngine> {
    |root| root.workspaces.create_layout_engines.clone()
}

/// Resolves the workspace, lets `op` build its next version and stores it.
/// Returns whether anything changed. Changed workspaces are queued for layout
/// unless `skip_layout`.
pub(crate) fn update_workspace(
    root: &mut RootSector,
    id: Option<WorkspaceId>,
    skip_layout: bool,
    op: impl FnOnce(&mut RootSector, Workspace) -> Result<Workspace, StoreError>,
) -> Result<bool, StoreError> {
    let workspace = resolve(root, id)?.clone();
    let id = workspace.id;
    let updated = op(root, workspace.clone())?;
    if updated.is_same(&workspace) {
        return Ok(false);
    }

    match root.workspaces.workspaces.get_mut(id) {
        Some(slot) => *slot = updated,
        None => return Err(StoreError::WorkspaceNotFound(id)),
    }
    if !skip_layout {
        root.workspaces.workspaces_to_layout.insert(id);
    }
    Ok(true)
}

/// The deferred part of a dispatch: restore the window about to be focused,
/// lay out every queued workspace, then focus.
pub(crate) fn layout_pending(root: &mut RootSector) {
    if let Some(window) = root.workspaces.window_to_focus {
        if let Ok(workspace) = root.pick(pick_workspace_by_window(window)) {
            root.workspaces.workspaces_to_layout.insert(workspace.id);
            let restore = MinimizeWindowEndTransform { workspace: workspace.id, window };
            if let Err(err) = root.dispatch(restore) {
                debug!(%window, %err, "Could not restore window before focusing it");
            }
        }
    }

    layout_all(root);
    focus_pending_window(root);
    // Focusing may have activated another workspace.
    layout_all(root);
}

fn layout_all(root: &mut RootSector) {
    let pending = std::mem::take(&mut root.workspaces.workspaces_to_layout);
    for id in pending {
        layout_workspace(root, id);
    }
}

fn layout_workspace(root: &mut RootSector, id: WorkspaceId) {
    let Some(workspace) = root.workspaces.workspaces.get(id).cloned() else {
        error!(?id, "Could not find workspace to lay out");
        return;
    };
    let Ok(monitor) = root.pick(pick_monitor_by_workspace(id)) else {
        debug!(%workspace, "Workspace is not visible, skipping layout");
        return;
    };

    debug!(%workspace, %monitor, "Laying out workspace");
    root.workspaces.queue_event(WorkspaceEvent::WorkspaceLayoutStarted { workspace: id });

    let mut positions = workspace.window_positions.clone();
    for state in workspace.active_layout_engine().do_layout(monitor.working_area, &monitor) {
        debug!(window = %state.window, rect = %state.rect, size = ?state.size, "Placed window");
        positions.insert(state.window.id(), WindowPosition { size: state.size, rect: state.rect });
    }
    if let Some(slot) = root.workspaces.workspaces.get_mut(id) {
        slot.window_positions = positions;
    }

    root.workspaces.queue_event(WorkspaceEvent::WorkspaceLayoutCompleted { workspace: id });
}

fn focus_pending_window(root: &mut RootSector) {
    let Some(handle) = root.workspaces.window_to_focus.take() else {
        return;
    };
    match root.pick(pick_window_by_handle(handle)) {
        Ok(window) => window.focus(),
        Err(_) => debug!(%handle, "Window to focus is not tracked"),
    }
    if let Err(err) = root.dispatch(WindowFocusedTransform { window: Some(handle) }) {
        debug!(%handle, %err, "Could not record focus");
    }
}
