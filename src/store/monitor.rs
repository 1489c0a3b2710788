use im::Vector;
use tracing::{debug, info};

use crate::model::{Monitor, MonitorId, Point};
use crate::store::map::{ActivateWorkspaceTransform, DeactivateWorkspaceTransform};
use crate::store::workspace::AddWorkspaceTransform;
use crate::store::{MonitorEvent, RootSector, Sector, StoreError, Transform};

#[derive(Clone, Debug, Default)]
pub struct MonitorSector {
    pub(crate) monitors: Vector<Monitor>,
    pub(crate) active_monitor: Option<MonitorId>,
    pub(crate) primary_monitor: Option<MonitorId>,
    /// Monitor of the last focused window the store tracks.
    pub(crate) last_active_monitor: Option<MonitorId>,
    events: Vec<MonitorEvent>,
}

impl MonitorSector {
    pub fn monitors(&self) -> &Vector<Monitor> { &self.monitors }

    pub(crate) fn set_monitors(&mut self, monitors: Vec<Monitor>) {
        self.monitors = monitors.into_iter().collect();
        self.primary_monitor = self.find_primary();

        let present = |id: &Option<MonitorId>| id.is_some_and(|id| self.position(id).is_some());
        let active_present = present(&self.active_monitor);
        let last_active_present = present(&self.last_active_monitor);
        if !active_present {
            self.active_monitor = self.primary_monitor;
        }
        if !last_active_present {
            self.last_active_monitor = self.primary_monitor;
        }
    }

    pub(crate) fn position(&self, id: MonitorId) -> Option<usize> {
        self.monitors.iter().position(|m| m.id == id)
    }

    /// The monitor holding the desktop origin, else the first one.
    fn find_primary(&self) -> Option<MonitorId> {
        self.monitors
            .iter()
            .find(|m| m.bounds.contains(Point::new(0, 0)))
            .or_else(|| self.monitors.front())
            .map(|m| m.id)
    }
}

impl Sector for MonitorSector {
    type Event = MonitorEvent;

    fn initialize(&mut self) {
        info!(monitors = self.monitors.len(), "Initializing monitor sector");
        if self.primary_monitor.is_none() {
            self.primary_monitor = self.find_primary();
        }
    }

    fn queue_event(&mut self, event: MonitorEvent) { self.events.push(event); }

    fn take_events(&mut self) -> Vec<MonitorEvent> { std::mem::take(&mut self.events) }
}

pub fn pick_monitor_by_handle(id: MonitorId) -> impl FnOnce(&RootSector) -> Result<Monitor, StoreError> {
    move |root| {
        root.monitors
            .monitors
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(StoreError::MonitorNotFound(id))
    }
}

pub fn pick_active_monitor() -> impl FnOnce(&RootSector) -> Result<Monitor, StoreError> {
    |root| {
        let id = root.monitors.active_monitor.ok_or(StoreError::NoMonitors)?;
        pick_monitor_by_handle(id)(root)
    }
}

pub fn pick_primary_monitor() -> impl FnOnce(&RootSector) -> Result<Monitor, StoreError> {
    |root| {
        let id = root.monitors.primary_monitor.ok_or(StoreError::NoMonitors)?;
        pick_monitor_by_handle(id)(root)
    }
}

pub fn pick_last_active_monitor() -> impl FnOnce(&RootSector) -> Result<Monitor, StoreError> {
    |root| {
        let id = root.monitors.last_active_monitor.ok_or(StoreError::NoMonitors)?;
        pick_monitor_by_handle(id)(root)
    }
}

pub fn pick_all_monitors() -> impl FnOnce(&RootSector) -> Vec<Monitor> {
    |root| root.monitors.monitors.iter().cloned().collect()
}

/// The monitor after (or before, when `reverse`) the given one, wrapping
/// around. `None` means the active monitor. With `get_first`, an unknown
/// monitor yields the first one instead of an error.
pub fn pick_adjacent_monitor(
    id: Option<MonitorId>,
    reverse: bool,
    get_first: bool,
) -> impl FnOnce(&RootSector) -> Result<Monitor, StoreError> {
    move |root| {
        let monitors = &root.monitors.monitors;
        let first = || monitors.front().cloned().ok_or(StoreError::NoMonitors);

        let Some(id) = id.or(root.monitors.active_monitor) else {
            return if get_first { first() } else { Err(StoreError::NoMonitors) };
        };
        let Some(index) = root.monitors.position(id) else {
            return if get_first { first() } else { Err(StoreError::MonitorNotFound(id)) };
        };

        let len = monitors.len();
        let next = if reverse { (index + len - 1) % len } else { (index + 1) % len };
        Ok(monitors[next].clone())
    }
}

pub fn pick_monitor_by_index(index: usize) -> impl FnOnce(&RootSector) -> Result<Monitor, StoreError> {
    move |root| {
        root.monitors
            .monitors
            .get(index)
            .cloned()
            .ok_or(StoreError::InvalidMonitorIndex(index))
    }
}

pub fn pick_monitor_at_point(
    point: Point<i32>,
    get_first: bool,
) -> impl FnOnce(&RootSector) -> Result<Monitor, StoreError> {
    move |root| {
        let monitors = &root.monitors.monitors;
        if let Some(monitor) = monitors.iter().find(|m| m.bounds.contains(point)) {
            return Ok(monitor.clone());
        }
        match monitors.front() {
            Some(first) if get_first => Ok(first.clone()),
            _ => Err(StoreError::NoMonitorAtPoint(point)),
        }
    }
}

/// The host reported a new set of monitors. Removed monitors lose their
/// workspace, added ones get a workspace no monitor shows (a new one when
/// every workspace is visible).
#[derive(Clone, Debug)]
pub struct MonitorsChangedTransform {
    pub monitors: Vec<Monitor>,
}

impl Transform for MonitorsChangedTransform {
    type Output = ();

    fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
        let previous = root.monitors.monitors.clone();
        let mut added = Vec::new();
        let mut unchanged = Vec::new();
        for monitor in &self.monitors {
            if previous.iter().any(|m| m.id == monitor.id) {
                unchanged.push(monitor.clone());
            } else {
                added.push(monitor.clone());
            }
        }
        let removed: Vec<Monitor> = previous
            .iter()
            .filter(|m| !self.monitors.iter().any(|n| n.id == m.id))
            .cloned()
            .collect();
        debug!(added = added.len(), removed = removed.len(), unchanged = unchanged.len(), "Monitors changed");

        root.monitors.set_monitors(self.monitors);

        if root.workspaces.has_initialized {
            for monitor in &removed {
                if let Some(workspace) = root.maps.monitor_workspaces.remove(&monitor.id) {
                    root.dispatch(DeactivateWorkspaceTransform { workspace })?;
                }
            }

            for monitor in &added {
                let free = root
                    .workspaces
                    .workspace_order
                    .iter()
                    .copied()
                    .find(|id| root.maps.monitor_of_workspace(*id).is_none());
                let workspace = match free {
                    Some(workspace) => workspace,
                    None => root
                        .dispatch(AddWorkspaceTransform::default())?
                        .ok_or(StoreError::NoActiveWorkspace)?,
                };
                root.dispatch(
                    ActivateWorkspaceTransform::new(workspace)
                        .on_monitor(monitor.id)
                        .without_focus(),
                )?;
            }

            let visible: Vec<_> = root.maps.monitor_workspaces.values().copied().collect();
            for workspace in visible {
                root.workspaces.workspaces_to_layout.insert(workspace);
            }
        }

        root.monitors.queue_event(MonitorEvent::MonitorsChanged { added, removed, unchanged });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::model::Rect;
    use crate::store::StoreEvent;
    use crate::store::map::pick_workspace_by_monitor;
    use crate::store::testing::*;
    use crate::store::workspace::pick_all_workspaces;

    #[test]
    fn primary_monitor_holds_the_origin() {
        let right = Monitor::new(1, Rect::new(1920, 0, 1920, 1080));
        let left = Monitor::new(2, Rect::new(0, 0, 1920, 1080));
        let store = store(0).with_monitors(vec![right, left.clone()]);

        assert_eq!(store.pick(pick_primary_monitor()).unwrap().id, left.id);
        assert_eq!(store.pick(pick_active_monitor()).unwrap().id, left.id);
        assert_eq!(store.pick(pick_last_active_monitor()).unwrap().id, left.id);
    }

    #[test]
    fn adjacent_monitor_wraps() {
        let store = store(3);
        let ids: Vec<_> = monitors(3).iter().map(|m| m.id).collect();

        assert_eq!(store.pick(pick_adjacent_monitor(Some(ids[2]), false, false)).unwrap().id, ids[0]);
        assert_eq!(store.pick(pick_adjacent_monitor(Some(ids[0]), true, false)).unwrap().id, ids[2]);
        assert_eq!(store.pick(pick_adjacent_monitor(None, false, false)).unwrap().id, ids[1]);

        let unknown = MonitorId::new(99);
        assert_eq!(
            store.pick(pick_adjacent_monitor(Some(unknown), false, false)),
            Err(StoreError::MonitorNotFound(unknown))
        );
        assert_eq!(store.pick(pick_adjacent_monitor(Some(unknown), false, true)).unwrap().id, ids[0]);
    }

    #[test]
    fn monitor_by_index_and_point() {
        let store = store(2);
        assert_eq!(store.pick(pick_monitor_by_index(1)).unwrap().id, MonitorId::new(2));
        assert_eq!(store.pick(pick_monitor_by_index(2)), Err(StoreError::InvalidMonitorIndex(2)));

        let point = Point::new(2000, 10);
        assert_eq!(store.pick(pick_monitor_at_point(point, false)).unwrap().id, MonitorId::new(2));

        let outside = Point::new(-5, -5);
        assert_eq!(store.pick(pick_monitor_at_point(outside, false)), Err(StoreError::NoMonitorAtPoint(outside)));
        assert_eq!(store.pick(pick_monitor_at_point(outside, true)).unwrap().id, MonitorId::new(1));
    }

    #[test]
    fn removed_monitor_releases_its_workspace() {
        let mut store = initialized(3, 3);
        let events = record_events(&mut store);
        let third = monitors(3)[2].id;
        let hidden = store.pick(pick_workspace_by_monitor(third)).unwrap().id;

        store.dispatch(MonitorsChangedTransform { monitors: monitors(2) }).unwrap();

        assert_eq!(store.root().monitors.monitors().len(), 2);
        assert!(store.root().maps.monitor_of_workspace(hidden).is_none());
        assert_eq!(store.root().maps.monitor_workspaces.len(), 2);

        let changed = events
            .lock()
            .iter()
            .find_map(|event| match event {
                StoreEvent::Monitor(MonitorEvent::MonitorsChanged { added, removed, unchanged }) => {
                    Some((added.len(), removed.len(), unchanged.len()))
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(changed, (0, 1, 2));
    }

    #[test]
    fn added_monitor_gets_a_hidden_workspace() {
        let mut store = initialized(1, 2);
        let hidden = store.pick(pick_all_workspaces())[1].id;

        store.dispatch(MonitorsChangedTransform { monitors: monitors(2) }).unwrap();
        let second = monitors(2)[1].id;
        assert_eq!(store.pick(pick_workspace_by_monitor(second)).unwrap().id, hidden);
    }

    #[test]
    fn added_monitor_creates_a_workspace_when_all_are_visible() {
        let mut store = initialized(1, 1);
        store.dispatch(MonitorsChangedTransform { monitors: monitors(2) }).unwrap();

        assert_eq!(store.pick(pick_all_workspaces()).len(), 2);
        let second = monitors(2)[1].id;
        assert!(store.pick(pick_workspace_by_monitor(second)).is_ok());
    }

    #[test]
    fn active_monitor_falls_back_to_primary() {
        let mut store = initialized(2, 2);
        let second = monitors(2)[1].clone();
        let window = window_on(5, &second);
        store
            .dispatch(crate::store::window::WindowAddedTransform::new(window.window().clone()))
            .unwrap();
        assert_eq!(store.pick(pick_active_monitor()).unwrap().id, second.id);

        store.dispatch(MonitorsChangedTransform { monitors: monitors(1) }).unwrap();
        assert_eq!(store.pick(pick_active_monitor()).unwrap().id, monitors(1)[0].id);
    }
}
