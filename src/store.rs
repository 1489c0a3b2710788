//! The single mutable root of the window manager.
//!
//! State lives in four sectors (monitors, workspaces, maps, windows) that are
//! only ever changed through [`Transform`]s and only read through
//! [`Picker`]s. Each dispatch is atomic: a failing transform leaves the root
//! exactly as it was and its queued events are dropped.

use std::sync::Arc;

use tracing::{debug, trace};

pub mod error;
pub mod events;
pub mod initialize;
pub mod map;
pub mod monitor;
pub mod window;
pub mod workspace;

pub use error::StoreError;
pub use events::{MapEvent, MonitorEvent, StoreEvent, WindowEvent, WorkspaceEvent};
pub use initialize::{InitializeTransform, pick_saved_state};
pub use map::{MapSector, RouterOptions};
pub use monitor::MonitorSector;
pub use window::WindowSector;
pub use workspace::{WindowPosition, Workspace, WorkspaceId, WorkspaceSector};

use crate::layout_engine::{
    CreateLeafLayoutEngine, CreateProxyLayoutEngine, LayoutContextRef, LayoutSnapshot,
    SharedLayoutContext,
};
use crate::model::{Monitor, SavedState, Window};

/// A state change. Transforms may dispatch further transforms against the
/// root they were given; everything they queue joins the same batch.
pub trait Transform {
    type Output;

    fn execute(self, root: &mut RootSector) -> Result<Self::Output, StoreError>;
}

/// A read-only query. Any `FnOnce(&RootSector) -> T` is a picker.
pub trait Picker {
    type Output;

    fn pick(self, root: &RootSector) -> Self::Output;
}

impl<F, T> Picker for F
where
    F: FnOnce(&RootSector) -> T,
{
    type Output = T;

    fn pick(self, root: &RootSector) -> T { self(root) }
}

/// Shared shape of the sectors: an append-only event buffer drained after
/// each dispatch.
pub trait Sector {
    type Event: Into<StoreEvent>;

    fn initialize(&mut self);

    fn queue_event(&mut self, event: Self::Event);

    fn take_events(&mut self) -> Vec<Self::Event>;
}

#[derive(Clone, Debug)]
pub struct RootSector {
    pub monitors: MonitorSector,
    pub workspaces: WorkspaceSector,
    pub maps: MapSector,
    pub windows: WindowSector,
    ctx: Arc<SharedLayoutContext>,
}

impl RootSector {
    fn new(ctx: Arc<SharedLayoutContext>) -> Self {
        Self {
            monitors: MonitorSector::default(),
            workspaces: WorkspaceSector::default(),
            maps: MapSector::default(),
            windows: WindowSector::default(),
            ctx,
        }
    }

    /// Runs `transform` atomically: on error the root is restored to the
    /// state it had before the call.
    pub fn dispatch<T: Transform>(&mut self, transform: T) -> Result<T::Output, StoreError> {
        let snapshot = self.clone();
        let result = transform.execute(self);
        if let Err(err) = &result {
            debug!(transform = short_type_name::<T>(), %err, "Transform failed, rolling back");
            *self = snapshot;
        }
        self.refresh_context();
        result
    }

    pub fn pick<P: Picker>(&self, picker: P) -> P::Output { picker.pick(self) }

    pub fn layout_context(&self) -> LayoutContextRef { self.ctx.clone() }

    /// Publishes the facts engines read while they run.
    fn refresh_context(&self) {
        let last_focused_window = self
            .pick(workspace::pick_last_focused_window(None))
            .ok();
        self.ctx.update(LayoutSnapshot {
            last_focused_window,
            active_monitor: self.pick(monitor::pick_active_monitor()).ok(),
            monitors: self.monitors.monitors().iter().cloned().collect(),
        });
    }
}

type Listener = Box<dyn FnMut(&StoreEvent) + Send>;

/// Owns the root sector. `dispatch` needs `&mut self`, so there is only ever
/// one writer.
pub struct Store {
    root: RootSector,
    listeners: Vec<Listener>,
}

impl Store {
    pub fn new(ctx: Arc<SharedLayoutContext>) -> Self {
        let root = RootSector::new(ctx);
        root.refresh_context();
        Self { root, listeners: Vec::new() }
    }

    pub fn with_monitors(mut self, monitors: Vec<Monitor>) -> Self {
        self.root.monitors.set_monitors(monitors);
        self.root.refresh_context();
        self
    }

    pub fn with_layout_engine_creators(mut self, creators: Vec<CreateLeafLayoutEngine>) -> Self {
        self.root.workspaces.create_layout_engines = creators;
        self
    }

    pub fn with_proxy_layout_engine_creators(mut self, creators: Vec<CreateProxyLayoutEngine>) -> Self {
        self.root.workspaces.proxy_layout_engine_creators = creators;
        self
    }

    pub fn with_router_options(mut self, router_options: RouterOptions) -> Self {
        self.root.maps.router_options = router_options;
        self
    }

    pub fn root(&self) -> &RootSector { &self.root }

    pub fn layout_context(&self) -> LayoutContextRef { self.root.layout_context() }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Creates the workspaces queued so far, gives each monitor one, and
    /// routes the given windows (saved ones back to where they were).
    pub fn initialize(
        &mut self,
        windows: Vec<Window>,
        saved_state: Option<SavedState>,
    ) -> Result<(), StoreError> {
        debug!(windows = windows.len(), "Initializing store");
        self.root.monitors.initialize();
        self.root.workspaces.initialize();
        self.root.maps.initialize();
        self.root.windows.initialize();
        self.dispatch(InitializeTransform { windows, saved_state })
    }

    pub fn dispatch<T: Transform>(&mut self, transform: T) -> Result<T::Output, StoreError> {
        trace!(transform = short_type_name::<T>(), "Dispatching");
        let result = self.root.dispatch(transform);
        if result.is_ok() {
            workspace::layout_pending(&mut self.root);
        }
        self.dispatch_events();
        result
    }

    pub fn pick<P: Picker>(&self, picker: P) -> P::Output { self.root.pick(picker) }

    fn dispatch_events(&mut self) {
        let mut events: Vec<StoreEvent> = Vec::new();
        events.extend(self.root.monitors.take_events().into_iter().map(Into::into));
        events.extend(self.root.workspaces.take_events().into_iter().map(Into::into));
        events.extend(self.root.maps.take_events().into_iter().map(Into::into));
        events.extend(self.root.windows.take_events().into_iter().map(Into::into));

        for event in &events {
            trace!(?event, "Dispatching event");
            for listener in &mut self.listeners {
                listener(event);
            }
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::layout_engine::{
        ColumnLayoutEngine, Direction, LayoutEngineIdentity, LayoutEngineRef, SliceLayoutEngine,
        TreeLayoutEngine, WindowInsertionType,
    };
    use crate::model::{Rect, VirtualWindow, VirtualWindowHandle};

    pub(crate) fn column_creator() -> CreateLeafLayoutEngine {
        Arc::new(|identity: LayoutEngineIdentity| -> LayoutEngineRef {
            Arc::new(ColumnLayoutEngine::new(identity, true))
        })
    }

    pub(crate) fn row_creator() -> CreateLeafLayoutEngine {
        Arc::new(|identity: LayoutEngineIdentity| -> LayoutEngineRef {
            Arc::new(ColumnLayoutEngine::new(identity, false))
        })
    }

    pub(crate) fn primary_stack_creator() -> CreateLeafLayoutEngine {
        Arc::new(|identity: LayoutEngineIdentity| -> LayoutEngineRef {
            Arc::new(SliceLayoutEngine::primary_stack(identity, WindowInsertionType::Swap))
        })
    }

    pub(crate) fn tree_creator(ctx: LayoutContextRef) -> CreateLeafLayoutEngine {
        Arc::new(move |identity: LayoutEngineIdentity| -> LayoutEngineRef {
            match TreeLayoutEngine::new(ctx.clone(), identity, Direction::RIGHT) {
                Ok(engine) => Arc::new(engine),
                Err(err) => panic!("{err}"),
            }
        })
    }

    /// Monitors laid out left to right, 1920x1080 each.
    pub(crate) fn monitors(count: u64) -> Vec<Monitor> {
        (0..count)
            .map(|i| Monitor::new(i + 1, Rect::new(i as i32 * 1920, 0, 1920, 1080)))
            .collect()
    }

    pub(crate) fn store(monitor_count: u64) -> Store {
        Store::new(SharedLayoutContext::new())
            .with_monitors(monitors(monitor_count))
            .with_layout_engine_creators(vec![column_creator(), row_creator()])
    }

    /// Window whose OS rectangle sits on the given monitor.
    pub(crate) fn window_on(id: u64, monitor: &Monitor) -> VirtualWindowHandle {
        let area = monitor.working_area;
        VirtualWindowHandle::new(
            VirtualWindow::new(id).with_rect(Rect::new(area.x + 10, area.y + 10, 400, 300)),
        )
    }

    /// Initialized store with `workspaces` named workspaces and one window per
    /// monitor.
    pub(crate) fn initialized(monitor_count: u64, workspaces: usize) -> Store {
        let mut store = store(monitor_count);
        for i in 0..workspaces {
            store
                .dispatch(workspace::AddWorkspaceTransform::named(format!("ws{}", i + 1)))
                .unwrap();
        }
        store.initialize(Vec::new(), None).unwrap();
        store
    }

    pub(crate) fn record_events(store: &mut Store) -> Arc<Mutex<Vec<StoreEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |event| sink.lock().push(event.clone()));
        events
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::testing::*;
    use super::*;
    use crate::layout_engine::LayoutContext;
    use crate::store::map::ActivateWorkspaceTransform;
    use crate::store::window::WindowAddedTransform;
    use crate::store::workspace::{
        AddWorkspaceTransform, RemoveWorkspaceTransform, pick_all_workspaces,
    };

    #[test]
    fn failed_transform_leaves_root_untouched() {
        let mut store = initialized(2, 2);
        let events = record_events(&mut store);
        let before: Vec<_> = store.pick(pick_all_workspaces()).iter().map(|w| w.id).collect();

        let first = before[0];
        let err = store.dispatch(RemoveWorkspaceTransform::ById(first)).unwrap_err();
        assert_eq!(err, StoreError::NotEnoughWorkspaces);

        let after: Vec<_> = store.pick(pick_all_workspaces()).iter().map(|w| w.id).collect();
        assert_eq!(before, after);
        assert!(events.lock().is_empty());
    }

    #[test]
    fn nested_failure_rolls_back_partial_work() {
        struct AddThenFail;

        impl Transform for AddThenFail {
            type Output = ();

            fn execute(self, root: &mut RootSector) -> Result<(), StoreError> {
                root.dispatch(AddWorkspaceTransform::named("doomed"))?;
                Err(StoreError::NoValidWindow)
            }
        }

        let mut store = initialized(1, 1);
        let events = record_events(&mut store);
        assert!(store.dispatch(AddThenFail).is_err());
        assert_eq!(store.pick(pick_all_workspaces()).len(), 1);
        assert!(events.lock().is_empty());
    }

    #[test]
    fn events_are_drained_in_sector_order() {
        let mut store = initialized(1, 2);
        let monitor = monitors(1).remove(0);
        let events = record_events(&mut store);

        let window = window_on(1, &monitor);
        store.dispatch(WindowAddedTransform::new(window.window().clone())).unwrap();

        let order: Vec<u8> = events
            .lock()
            .iter()
            .map(|event| match event {
                StoreEvent::Monitor(_) => 0,
                StoreEvent::Workspace(_) => 1,
                StoreEvent::Map(_) => 2,
                StoreEvent::Window(_) => 3,
            })
            .collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert!(order.contains(&2));
        assert!(order.contains(&3));
    }

    #[test]
    fn context_follows_the_root() {
        let mut store = initialized(2, 2);
        let ctx = store.layout_context();
        assert_eq!(ctx.active_monitor().map(|m| m.id), Some(monitors(2)[0].id));

        let monitor = monitors(2).remove(1);
        let window = window_on(7, &monitor);
        store.dispatch(WindowAddedTransform::new(window.window().clone())).unwrap();
        assert_eq!(ctx.last_focused_window(), Some(window.window().clone()));
        assert_eq!(ctx.active_monitor().map(|m| m.id), Some(monitor.id));
    }

    #[test]
    fn pickers_have_no_side_effects() {
        let mut store = initialized(1, 2);
        let events = record_events(&mut store);
        let ids: Vec<_> = store.pick(pick_all_workspaces()).iter().map(|w| w.id).collect();
        let _ = store.pick(map::pick_monitor_by_workspace(ids[1]));
        assert!(events.lock().is_empty());

        store.dispatch(ActivateWorkspaceTransform::new(ids[1])).unwrap();
        assert!(!events.lock().is_empty());
    }
}
