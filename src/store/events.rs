use crate::layout_engine::Direction;
use crate::model::{Monitor, MonitorId, Point, Window};
use crate::store::WorkspaceId;

#[derive(Clone, Debug, PartialEq)]
pub enum MonitorEvent {
    MonitorsChanged {
        added: Vec<Monitor>,
        removed: Vec<Monitor>,
        unchanged: Vec<Monitor>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum WorkspaceEvent {
    WorkspaceAdded { workspace: WorkspaceId, name: String },
    WorkspaceRemoved { workspace: WorkspaceId, name: String },
    WorkspaceRenamed { workspace: WorkspaceId, previous_name: String, name: String },
    ActiveLayoutEngineChanged { workspace: WorkspaceId, previous: String, current: String },
    WorkspaceLayoutStarted { workspace: WorkspaceId },
    WorkspaceLayoutCompleted { workspace: WorkspaceId },
}

#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    MonitorWorkspaceChanged {
        monitor: MonitorId,
        previous: Option<WorkspaceId>,
        current: WorkspaceId,
    },
    /// A window entered, left or changed workspace. `None` on either side
    /// means the window was not tracked there.
    WindowRouted {
        window: Window,
        previous: Option<WorkspaceId>,
        current: Option<WorkspaceId>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum WindowEvent {
    WindowAdded { window: Window },
    WindowFocused { window: Option<Window> },
    WindowRemoved { window: Window },
    WindowMinimizeStarted { window: Window },
    WindowMinimizeEnded { window: Window },
    WindowMoveStarted { window: Window, cursor: Option<Point<i32>> },
    WindowMoved { window: Window, cursor: Option<Point<i32>> },
    WindowMoveEnded { window: Window, moved_edges: Option<Direction> },
}

/// Every event the store emits, tagged with the sector that queued it.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    Monitor(MonitorEvent),
    Workspace(WorkspaceEvent),
    Map(MapEvent),
    Window(WindowEvent),
}

impl From<MonitorEvent> for StoreEvent {
    fn from(event: MonitorEvent) -> Self { StoreEvent::Monitor(event) }
}

impl From<WorkspaceEvent> for StoreEvent {
    fn from(event: WorkspaceEvent) -> Self { StoreEvent::Workspace(event) }
}

impl From<MapEvent> for StoreEvent {
    fn from(event: MapEvent) -> Self { StoreEvent::Map(event) }
}

impl From<WindowEvent> for StoreEvent {
    fn from(event: WindowEvent) -> Self { StoreEvent::Window(event) }
}
