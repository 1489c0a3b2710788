use im::Vector;
use tracing::debug;

use super::{Workspace, WorkspaceId, WindowPosition, resolve, update_workspace};
use crate::layout_engine::{
    CreateLeafLayoutEngine, Direction, LayoutEngineCustomAction, LayoutEngineIdentity,
    LayoutEngineRef,
};
use crate::model::{Point, Window, WindowId, WindowSize};
use crate::store::map::{ActivateWorkspaceTransform, MergeWorkspaceWindowsTransform, pick_monitor_by_workspace};
use crate::store::window::pick_window_by_handle;
use crate::store::{RootSector, Sector, StoreError, Transform, WorkspaceEvent};

/// Creates a workspace. Before the store is initialized the request is queued
/// and `None` is returned.
#[derive(Clone, Default)]
pub struct AddWorkspaceTransform {
    pub name: Option<String>,
    /// Overrides the store's default engine creators.
    pub create_layout_engines: Option<Vec<CreateLeafLayoutEngine>>,
    /// Indices of the monitors the workspace may be shown on.
    pub monitor_indices: Option<Vec<usize>>,
}

impl AddWorkspaceTransform {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    pub fn with_layout_engines(mut self, creators: Vec<CreateLeafLayoutEngine>) -> Self {
        self.create_layout_engines = Some(creators);
        self
    }

    pub fn with_monitor_indices(mut self, indices: Vec<usize>) -> Self {
        self.monitor_indices = Some(indices);
        self
    }
}

impl Transform for AddWorkspaceTransform {
    type Output = Option<WorkspaceId>;

    fn execute(self, root: &mut RootSector) -> Result<Option<WorkspaceId>, StoreError> {
        let sector = &mut root.workspaces;
        if !sector.has_initialized {
            debug!(name = ?self.name, "Deferring workspace creation until initialization");
            sector.workspaces_to_create.push(self);
            return Ok(None);
        }

        let creators = self.create_layout_engines.unwrap_or_else(|| sector.create_layout_engines.clone());
        if creators.is_empty() {
            return Err(StoreError::NoLayoutEngineCreators);
        }

        let layout_engines: Vector<LayoutEngineRef> = creators
            .iter()
            .map(|create| {
                let engine = create(LayoutEngineIdentity::new());
                sector
                    .proxy_layout_engine_creators
                    .iter()
                    .fold(engine, |engine, wrap| wrap(engine))
            })
            .collect();

        let name = self.name.unwrap_or_else(|| format!("Workspace {}", sector.workspaces.len() + 1));
        let id = sector.workspaces.insert_with_key(|id| Workspace {
            id,
            name: name.clone(),
            layout_engines,
            active_layout_engine_index: 0,
            previous_layout_engine_index: 0,
            last_focused_window: None,
            window_positions: Default::default(),
        });
        sector.workspace_order.push_back(id);
        debug!(?id, %name, "Added workspace");
        sector.queue_event(WorkspaceEvent::WorkspaceAdded { workspace: id, name });

        if let Some(indices) = self.monitor_indices {
            root.maps.sticky_workspace_monitor_indices.insert(id, indices.into_iter().collect());
        }
        Ok(Some(id))
    }
}

/// Removes a workspace and moves its windows to the last remaining one.
/// Fails when fewer workspaces than monitors would be left.
#[derive(Clone, Debug)]
pub enum RemoveWorkspaceTransform {
    ById(WorkspaceId),
    ByName(String),
}

impl Transform for RemoveWorkspaceTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        if root.workspaces.workspaces.len() < root.monitors.monitors.len() + 1 {
            return Err(StoreError::NotEnoughWorkspaces);
        }

        let removed = match &self {
            RemoveWorkspaceTransform::ById(id) => root.workspaces.workspaces.get(*id),
            RemoveWorkspaceTransform::ByName(name) => {
                root.workspaces.workspaces.values().find(|w| &w.name == name)
            }
        };
        let Some(removed) = removed.cloned() else {
            return Err(match self {
                RemoveWorkspaceTransform::ById(id) => StoreError::WorkspaceNotFound(id),
                RemoveWorkspaceTransform::ByName(name) => StoreError::WorkspaceNameNotFound(name),
            });
        };

        let target = root
            .workspaces
            .workspace_order
            .iter()
            .rev()
            .find(|id| **id != removed.id)
            .copied()
            .ok_or(StoreError::NotEnoughWorkspaces)?;
        let monitor = root.maps.monitor_of_workspace(removed.id);

        root.dispatch(MergeWorkspaceWindowsTransform { source: removed.id, target })?;

        let sector = &mut root.workspaces;
        sector.workspaces.remove(removed.id);
        sector.workspace_order.retain(|id| *id != removed.id);
        sector.workspaces_to_layout.remove(&removed.id);
        root.maps.forget_workspace(removed.id);

        if let Some(monitor) = monitor {
            root.dispatch(ActivateWorkspaceTransform::new(target).on_monitor(monitor))?;
        }

        debug!(workspace = %removed, ?target, "Removed workspace");
        root.workspaces.queue_event(WorkspaceEvent::WorkspaceRemoved {
            workspace: removed.id,
            name: removed.name,
        });
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct RenameWorkspaceTransform {
    pub workspace: WorkspaceId,
    pub name: String,
}

impl Transform for RenameWorkspaceTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let taken = root
            .workspaces
            .workspaces
            .values()
            .any(|w| w.name == self.name && w.id != self.workspace);
        if taken {
            return Err(StoreError::WorkspaceNameTaken(self.name));
        }

        let name = self.name;
        update_workspace(root, Some(self.workspace), true, |root, mut workspace| {
            if workspace.name != name {
                root.workspaces.queue_event(WorkspaceEvent::WorkspaceRenamed {
                    workspace: workspace.id,
                    previous_name: std::mem::replace(&mut workspace.name, name),
                    name: workspace.name.clone(),
                });
            }
            Ok(workspace)
        })?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutEngineSelector {
    Index(usize),
    Name(String),
    Previous,
}

/// Switches the engine a workspace is laid out with.
#[derive(Clone, Debug)]
pub struct ActivateLayoutEngineTransform {
    pub workspace: Option<WorkspaceId>,
    pub engine: LayoutEngineSelector,
}

impl Transform for ActivateLayoutEngineTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        update_workspace(root, self.workspace, false, |root, workspace| {
            let index = match &self.engine {
                LayoutEngineSelector::Index(index) => (*index < workspace.layout_engines.len()).then_some(*index),
                LayoutEngineSelector::Name(name) => workspace.layout_engines.iter().position(|e| e.name() == name),
                LayoutEngineSelector::Previous => Some(workspace.previous_layout_engine_index),
            };
            let index = index.ok_or(StoreError::LayoutEngineNotFound(workspace.id))?;
            Ok(set_active_layout_engine(root, workspace, index))
        })?;
        Ok(())
    }
}

/// Activates the next (or previous) engine, wrapping around.
#[derive(Clone, Debug)]
pub struct CycleLayoutEngineTransform {
    pub workspace: Option<WorkspaceId>,
    pub reverse: bool,
}

impl Transform for CycleLayoutEngineTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        update_workspace(root, self.workspace, false, |root, workspace| {
            let len = workspace.layout_engines.len();
            let current = workspace.active_layout_engine_index;
            let index = if self.reverse { (current + len - 1) % len } else { (current + 1) % len };
            Ok(set_active_layout_engine(root, workspace, index))
        })?;
        Ok(())
    }
}

fn set_active_layout_engine(root: &mut RootSector, mut workspace: Workspace, index: usize) -> Workspace {
    let previous = workspace.active_layout_engine_index;
    if previous == index {
        return workspace;
    }

    workspace.previous_layout_engine_index = previous;
    workspace.active_layout_engine_index = index;
    root.workspaces.queue_event(WorkspaceEvent::ActiveLayoutEngineChanged {
        workspace: workspace.id,
        previous: workspace.layout_engines[previous].name().to_string(),
        current: workspace.layout_engines[index].name().to_string(),
    });
    if let Some(window) = workspace.last_focused_window {
        root.workspaces.window_to_focus = Some(window);
    }
    workspace
}

/// Offers a custom action to every engine of the workspace.
#[derive(Clone, Debug)]
pub struct LayoutEngineActionTransform {
    pub workspace: Option<WorkspaceId>,
    pub action: LayoutEngineCustomAction,
}

impl Transform for LayoutEngineActionTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let action = self.action;
        update_workspace(root, self.workspace, false, |_, mut workspace| {
            match workspace.map_engines(|engine| engine.perform_custom_action(&action)) {
                Some(engines) => workspace.layout_engines = engines,
                None => debug!(action = %action.name, "No layout engine handled the action"),
            }
            Ok(workspace)
        })?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct AddWindowToWorkspaceTransform {
    pub workspace: WorkspaceId,
    pub window: Window,
    pub skip_layout: bool,
}

impl AddWindowToWorkspaceTransform {
    pub fn new(workspace: WorkspaceId, window: Window) -> Self {
        Self { workspace, window, skip_layout: false }
    }
}

impl Transform for AddWindowToWorkspaceTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let window = self.window;
        update_workspace(root, Some(self.workspace), self.skip_layout, |_, mut workspace| {
            if workspace.contains_window(window.id()) {
                return Ok(workspace);
            }
            workspace.window_positions.insert(window.id(), WindowPosition::default());
            if let Some(engines) = workspace.map_engines(|engine| engine.add_window(&window)) {
                workspace.layout_engines = engines;
            }
            Ok(workspace)
        })?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct RemoveWindowFromWorkspaceTransform {
    pub workspace: WorkspaceId,
    pub window: Window,
    pub skip_layout: bool,
}

impl RemoveWindowFromWorkspaceTransform {
    pub fn new(workspace: WorkspaceId, window: Window) -> Self {
        Self { workspace, window, skip_layout: false }
    }
}

impl Transform for RemoveWindowFromWorkspaceTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let window = self.window;
        update_workspace(root, Some(self.workspace), self.skip_layout, |_, mut workspace| {
            if workspace.window_positions.remove(&window.id()).is_none() {
                return Ok(workspace);
            }
            if workspace.last_focused_window == Some(window.id()) {
                workspace.last_focused_window = workspace
                    .window_positions
                    .iter()
                    .find(|(_, position)| position.size != WindowSize::Minimized)
                    .map(|(id, _)| *id);
            }
            if let Some(engines) = workspace.map_engines(|engine| engine.remove_window(&window)) {
                workspace.layout_engines = engines;
            }
            Ok(workspace)
        })?;
        Ok(())
    }
}

/// Moves (or adds) a window to a point in the workspace, given in the unit
/// square of the monitor.
#[derive(Clone, Debug)]
pub struct MoveWindowToPointInWorkspaceTransform {
    pub workspace: WorkspaceId,
    pub window: Window,
    pub point: Point<f64>,
}

impl Transform for MoveWindowToPointInWorkspaceTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let (window, point) = (self.window, self.point);
        update_workspace(root, Some(self.workspace), false, |_, mut workspace| {
            if !workspace.contains_window(window.id()) {
                workspace.window_positions.insert(window.id(), WindowPosition::default());
            }
            if let Some(engines) = workspace.map_engines(|engine| engine.move_window_to_point(&window, point)) {
                workspace.layout_engines = engines;
            }
            Ok(workspace)
        })?;
        Ok(())
    }
}

/// The window an operation applies to: the given one, or the workspace's
/// last focused window.
fn workspace_window(root: &RootSector, workspace: &Workspace, window: Option<WindowId>) -> Result<Window, StoreError> {
    let handle = window.or(workspace.last_focused_window).ok_or(StoreError::NoValidWindow)?;
    if !workspace.contains_window(handle) {
        return Err(StoreError::WindowNotInWorkspace { window: handle, workspace: workspace.id });
    }
    pick_window_by_handle(handle)(root)
}

/// Replaces the active engine with `f(active engine)`.
fn update_active_engine(workspace: &mut Workspace, f: impl FnOnce(LayoutEngineRef) -> LayoutEngineRef) {
    let index = workspace.active_layout_engine_index;
    let engine = f(workspace.layout_engines[index].clone());
    workspace.layout_engines.set(index, engine);
}

#[derive(Clone, Debug)]
pub struct FocusWindowInDirectionTransform {
    pub workspace: Option<WorkspaceId>,
    pub window: Option<WindowId>,
    pub direction: Direction,
}

impl Transform for FocusWindowInDirectionTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        update_workspace(root, self.workspace, false, |root, mut workspace| {
            let window = workspace_window(root, &workspace, self.window)?;
            update_active_engine(&mut workspace, |engine| {
                engine.focus_window_in_direction(self.direction, &window)
            });
            Ok(workspace)
        })?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SwapWindowInDirectionTransform {
    pub workspace: Option<WorkspaceId>,
    pub window: Option<WindowId>,
    pub direction: Direction,
}

impl Transform for SwapWindowInDirectionTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        update_workspace(root, self.workspace, false, |root, mut workspace| {
            let window = workspace_window(root, &workspace, self.window)?;
            update_active_engine(&mut workspace, |engine| {
                engine.swap_window_in_direction(self.direction, &window)
            });
            Ok(workspace)
        })?;
        Ok(())
    }
}

/// Moves window edges by a pixel delta, converted to the unit square of the
/// monitor showing the workspace.
#[derive(Clone, Debug)]
pub struct MoveWindowEdgesInDirectionTransform {
    pub workspace: Option<WorkspaceId>,
    pub window: Option<WindowId>,
    pub edges: Direction,
    pub pixel_deltas: Point<i32>,
}

impl Transform for MoveWindowEdgesInDirectionTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        update_workspace(root, self.workspace, false, |root, mut workspace| {
            let window = workspace_window(root, &workspace, self.window)?;
            let monitor = pick_monitor_by_workspace(workspace.id)(root)?;
            let area = monitor.working_area;
            if area.width == 0 || area.height == 0 {
                return Ok(workspace);
            }

            let deltas = Point::new(
                self.pixel_deltas.x as f64 / area.width as f64,
                self.pixel_deltas.y as f64 / area.height as f64,
            );
            update_active_engine(&mut workspace, |engine| {
                engine.move_window_edges_in_direction(self.edges, deltas, &window)
            });
            Ok(workspace)
        })?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct MinimizeWindowStartTransform {
    pub workspace: WorkspaceId,
    pub window: WindowId,
}

impl Transform for MinimizeWindowStartTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        update_workspace(root, Some(self.workspace), false, |root, mut workspace| {
            let window = workspace_window(root, &workspace, Some(self.window))?;
            if let Some(engines) = workspace.map_engines(|engine| engine.minimize_window_start(&window)) {
                workspace.layout_engines = engines;
            }
            if let Some(position) = workspace.window_positions.get_mut(&window.id()) {
                position.size = WindowSize::Minimized;
            }
            Ok(workspace)
        })?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct MinimizeWindowEndTransform {
    pub workspace: WorkspaceId,
    pub window: WindowId,
}

impl Transform for MinimizeWindowEndTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        update_workspace(root, Some(self.workspace), false, |root, mut workspace| {
            let window = workspace_window(root, &workspace, Some(self.window))?;
            if let Some(engines) = workspace.map_engines(|engine| engine.minimize_window_end(&window)) {
                workspace.layout_engines = engines;
            }
            if let Some(position) = workspace.window_positions.get_mut(&window.id()) {
                if position.size == WindowSize::Minimized {
                    position.size = WindowSize::Normal;
                }
            }
            Ok(workspace)
        })?;
        Ok(())
    }
}

/// Focuses the last focused window of the workspace, or its first window.
#[derive(Clone, Debug)]
pub struct FocusWorkspaceTransform {
    pub workspace: WorkspaceId,
}

impl Transform for FocusWorkspaceTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let workspace = resolve(root, Some(self.workspace))?;
        let window = workspace
            .last_focused_window
            .or_else(|| workspace.active_layout_engine().first_window().map(|w| w.id()));
        match window {
            Some(window) => root.workspaces.window_to_focus = Some(window),
            None => debug!(workspace = %workspace, "Workspace has no window to focus"),
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct DoWorkspaceLayoutTransform {
    pub workspace: WorkspaceId,
}

impl Transform for DoWorkspaceLayoutTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        resolve(root, Some(self.workspace))?;
        root.workspaces.workspaces_to_layout.insert(self.workspace);
        Ok(())
    }
}
