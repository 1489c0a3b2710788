use thiserror::Error;

use crate::model::{MonitorId, Point, WindowId};
use crate::store::WorkspaceId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("workspace {0:?} not found")]
    WorkspaceNotFound(WorkspaceId),
    #[error("no workspace is named {0:?}")]
    WorkspaceNameNotFound(String),
    #[error("a workspace named {0:?} already exists")]
    WorkspaceNameTaken(String),
    #[error("no workspace is active")]
    NoActiveWorkspace,
    #[error("there must be a workspace for each monitor")]
    NotEnoughWorkspaces,
    #[error("no workspace adjacent to {0:?} was found")]
    NoAdjacentWorkspace(WorkspaceId),
    #[error("no layout engine creators were provided")]
    NoLayoutEngineCreators,
    #[error("workspace {0:?} has no matching layout engine")]
    LayoutEngineNotFound(WorkspaceId),
    #[error("window {0} not found")]
    WindowNotFound(WindowId),
    #[error("window {window} is not in workspace {workspace:?}")]
    WindowNotInWorkspace { window: WindowId, workspace: WorkspaceId },
    #[error("no window was given and the workspace has no focused window")]
    NoValidWindow,
    #[error("monitor {0} not found")]
    MonitorNotFound(MonitorId),
    #[error("no monitor at index {0}")]
    InvalidMonitorIndex(usize),
    #[error("no monitor contains {0}")]
    NoMonitorAtPoint(Point<i32>),
    #[error("no monitor shows workspace {0:?}")]
    NoMonitorForWorkspace(WorkspaceId),
    #[error("no monitor shows the workspace of window {0}")]
    NoMonitorForWindow(WindowId),
    #[error("no valid monitor found for workspace {0:?}")]
    NoValidMonitor(WorkspaceId),
    #[error("no monitors are connected")]
    NoMonitors,
}
