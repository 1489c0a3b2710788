use tracing::{debug, info, warn};

use crate::model::{MonitorId, SavedState, SavedWindow, SavedWorkspace, Window};
use crate::store::map::{
    ActivateWorkspaceTransform, RouterOptions, pick_sticky_monitors_by_workspace,
    pick_valid_monitor_by_workspace,
};
use crate::store::monitor::pick_monitor_by_handle;
use crate::store::window::WindowAddedTransform;
use crate::store::workspace::{
    AddWorkspaceTransform, MoveWindowToPointInWorkspaceTransform, WorkspaceId, pick_workspace_by_name,
};
use crate::store::{MapEvent, RootSector, Sector, StoreError, Transform, WindowEvent};

/// Brings the store up: creates the workspaces requested so far, shows one
/// on every monitor and adopts the windows that already exist. Windows found
/// in the saved state go back to their workspace and spot; the rest are
/// routed to the monitor they are on.
#[derive(Clone, Debug, Default)]
pub struct InitializeTransform {
    pub windows: Vec<Window>,
    pub saved_state: Option<SavedState>,
}

impl Transform for InitializeTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        root.workspaces.has_initialized = true;
        for add in std::mem::take(&mut root.workspaces.workspaces_to_create) {
            root.dispatch(add)?;
        }

        let monitors: Vec<MonitorId> = root.monitors.monitors.iter().map(|m| m.id).collect();
        for monitor in monitors {
            if root.maps.monitor_workspaces.contains_key(&monitor) {
                continue;
            }
            let workspace = match hidden_workspace_for(root, monitor) {
                Some(workspace) => workspace,
                None => root
                    .dispatch(AddWorkspaceTransform::default())?
                    .ok_or(StoreError::NoActiveWorkspace)?,
            };
            root.dispatch(ActivateWorkspaceTransform::new(workspace).on_monitor(monitor).without_focus())?;
        }
        info!(
            workspaces = root.workspaces.workspaces.len(),
            monitors = root.monitors.monitors.len(),
            "Workspaces initialized"
        );

        let mut windows = self.windows;
        if let Some(saved) = self.saved_state {
            restore_saved_windows(root, saved, &mut windows);
        }
        for window in windows {
            let add = WindowAddedTransform::new(window.clone())
                .with_router_options(RouterOptions::RouteToLaunchedWorkspace);
            if let Err(err) = root.dispatch(add) {
                warn!(%window, %err, "Could not add existing window");
            }
        }
        Ok(())
    }
}

/// The first hidden workspace allowed on `monitor`.
fn hidden_workspace_for(root: &RootSector, monitor: MonitorId) -> Option<WorkspaceId> {
    root.workspaces.workspace_order.iter().copied().find(|id| {
        root.maps.monitor_of_workspace(*id).is_none()
            && pick_sticky_monitors_by_workspace(*id)(root).is_ok_and(|valid| valid.contains(&monitor))
    })
}

/// Moves the windows named in `saved` out of `windows` and back into their
/// saved workspace. Workspaces that no longer exist are skipped.
fn restore_saved_windows(root: &mut RootSector, saved: SavedState, windows: &mut Vec<Window>) {
    for saved_workspace in saved.workspaces {
        let Ok(workspace) = pick_workspace_by_name(&saved_workspace.name)(root) else {
            debug!(name = %saved_workspace.name, "Saved workspace no longer exists");
            continue;
        };

        for saved_window in saved_workspace.windows {
            let Some(index) = windows.iter().position(|w| w.id() == saved_window.handle) else {
                continue;
            };
            let window = windows.remove(index);
            let handle = window.id();

            root.windows.windows.insert(handle, window.clone());
            root.maps.window_workspaces.insert(handle, workspace.id);
            let restore = MoveWindowToPointInWorkspaceTransform {
                workspace: workspace.id,
                window: window.clone(),
                point: saved_window.center(),
            };
            if let Err(err) = root.dispatch(restore) {
                warn!(%window, %err, "Could not restore saved window");
                root.windows.windows.remove(&handle);
                root.maps.window_workspaces.remove(&handle);
                windows.push(window);
                continue;
            }

            debug!(%window, %workspace, "Restored saved window");
            root.maps.queue_event(MapEvent::WindowRouted {
                window: window.clone(),
                previous: None,
                current: Some(workspace.id),
            });
            root.windows.queue_event(WindowEvent::WindowAdded { window });
        }
    }
}

/// Where every tracked window was last placed, relative to the working area
/// of its workspace's monitor. Hidden workspaces use the monitor they would
/// be shown on.
pub fn pick_saved_state() -> impl FnOnce(&RootSector) -> SavedState {
    |root| {
        let workspaces = root
            .workspaces
            .workspace_order
            .iter()
            .filter_map(|&id| {
                let workspace = root.workspaces.workspaces.get(id)?;
                let monitor = match root.maps.monitor_of_workspace(id) {
                    Some(monitor) => monitor,
                    None => pick_valid_monitor_by_workspace(id, None)(root).ok()?,
                };
                let area = pick_monitor_by_handle(monitor)(root).ok()?.working_area;
                let windows = workspace
                    .window_positions
                    .iter()
                    .map(|(&handle, position)| SavedWindow { handle, rect: area.normalize(position.rect) })
                    .collect();
                Some(SavedWorkspace { name: workspace.name.clone(), windows })
            })
            .collect();
        SavedState { workspaces }
    }
}
