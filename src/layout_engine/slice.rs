//! Layouts that cut the screen into areas, each holding a slice of an ordered
//! window list.

mod area;
mod layouts;

use std::any::Any;
use std::sync::Arc;

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub use self::area::{Area, AreaChild, AreaLayout, CompiledArea, OverflowArea, ParentArea, SliceArea, WindowArea};
pub use self::layouts::{
    column_area, multi_column_area, primary_stack_area, row_area, secondary_primary_area,
};
use crate::layout_engine::{
    Direction, LayoutEngine, LayoutEngineCustomAction, LayoutEngineIdentity, LayoutEngineRef,
};
use crate::model::{Monitor, Point, Rect, Window, WindowSize, WindowState};

/// Moves the action's window to the last slot of the previous area.
pub const PROMOTE_ACTION: &str = "slice.promote";
/// Moves the action's window to the first slot of the next area.
pub const DEMOTE_ACTION: &str = "slice.demote";
pub const PROMOTE_FOCUS_ACTION: &str = "slice.promote_focus";
pub const DEMOTE_FOCUS_ACTION: &str = "slice.demote_focus";

/// Side of the square used to find windows by position.
const PROBE_SCALE: i32 = 10_000;

/// What happens to the window already at the target index when a window is
/// moved there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowInsertionType {
    /// The two windows trade places.
    #[default]
    Swap,
    /// The moved window is taken out and reinserted, shifting the windows in
    /// between.
    Rotate,
}

#[derive(Clone, Debug)]
pub struct SliceLayoutEngine {
    identity: LayoutEngineIdentity,
    name: String,
    insertion_type: WindowInsertionType,
    area: Arc<CompiledArea>,
    windows: Vector<Window>,
    minimized: Vector<Window>,
}

impl SliceLayoutEngine {
    pub fn new(
        identity: LayoutEngineIdentity,
        root: ParentArea,
        insertion_type: WindowInsertionType,
    ) -> Self {
        Self {
            identity,
            name: "Slice".to_string(),
            insertion_type,
            area: Arc::new(CompiledArea::compile(root)),
            windows: Vector::new(),
            minimized: Vector::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn primary_stack(identity: LayoutEngineIdentity, insertion_type: WindowInsertionType) -> Self {
        Self::new(identity, primary_stack_area(), insertion_type).with_name("Primary stack")
    }

    pub fn multi_column(
        identity: LayoutEngineIdentity,
        insertion_type: WindowInsertionType,
        capacities: &[usize],
    ) -> Self {
        Self::new(identity, multi_column_area(capacities), insertion_type).with_name("Multi-column")
    }

    pub fn secondary_primary(
        identity: LayoutEngineIdentity,
        insertion_type: WindowInsertionType,
        primary_capacity: usize,
        secondary_capacity: usize,
    ) -> Self {
        Self::new(
            identity,
            secondary_primary_area(primary_capacity, secondary_capacity),
            insertion_type,
        )
        .with_name("Secondary primary")
    }

    pub fn column(identity: LayoutEngineIdentity, insertion_type: WindowInsertionType) -> Self {
        Self::new(identity, column_area(), insertion_type).with_name("Column")
    }

    pub fn row(identity: LayoutEngineIdentity, insertion_type: WindowInsertionType) -> Self {
        Self::new(identity, row_area(), insertion_type).with_name("Row")
    }

    pub fn insertion_type(&self) -> WindowInsertionType { self.insertion_type }

    pub fn area(&self) -> &CompiledArea { &self.area }

    pub fn windows(&self) -> &Vector<Window> { &self.windows }

    fn with_windows(&self, windows: Vector<Window>) -> Self { Self { windows, ..self.clone() } }

    fn into_ref(self: Arc<Self>, updated: Option<Self>) -> LayoutEngineRef {
        match updated {
            Some(engine) => Arc::new(engine),
            None => self,
        }
    }

    fn probe_layout(&self) -> Vec<(usize, Rect<i32>)> {
        self.area.layout(Rect::new(0, 0, PROBE_SCALE, PROBE_SCALE), self.windows.len())
    }

    fn index_at_probe(&self, point: Point<i32>) -> Option<usize> {
        self.probe_layout().into_iter().find(|(_, rect)| rect.contains(point)).map(|(index, _)| index)
    }

    fn index_in_direction(&self, direction: Direction, window: &Window) -> Option<usize> {
        let index = self.windows.index_of(window)?;
        let rects = self.probe_layout();
        let (_, rect) = rects.iter().find(|(i, _)| *i == index)?;

        let mut probe = rect.origin();
        if direction.contains(Direction::LEFT) {
            probe.x -= 1;
        } else if direction.contains(Direction::RIGHT) {
            probe.x += rect.width;
        }
        if direction.contains(Direction::UP) {
            probe.y -= 1;
        } else if direction.contains(Direction::DOWN) {
            probe.y += rect.height;
        }

        let found = rects.iter().find(|(_, r)| r.contains(probe)).map(|(i, _)| *i);
        if found.is_none() {
            debug!(%window, ?direction, %probe, "No window in direction");
        }
        found
    }

    fn index_at_point(&self, point: Point<f64>) -> Option<usize> {
        let scale = f64::from(PROBE_SCALE);
        self.index_at_probe(Point::new((point.x * scale) as i32, (point.y * scale) as i32))
    }

    fn move_to_index(&self, windows: &Vector<Window>, current: usize, target: usize) -> Option<Self> {
        if current == target || target >= windows.len() {
            return None;
        }

        let mut windows = windows.clone();
        match self.insertion_type {
            WindowInsertionType::Swap => windows.swap(current, target),
            WindowInsertionType::Rotate => {
                let window = windows.remove(current);
                windows.insert(target, window);
            }
        }
        Some(self.with_windows(windows))
    }

    /// Index the window at `index` would move to when promoted or demoted.
    fn rank_target(&self, index: usize, promote: bool) -> Option<usize> {
        let areas = self.area.window_areas();
        let current = self.area.area_index_of(index)?;

        let target = if promote {
            areas[..current]
                .iter()
                .rev()
                .find_map(|area| area.capacity.filter(|&c| c > 0).map(|c| area.start + c - 1))
        } else {
            areas[current + 1..]
                .iter()
                .find(|area| area.capacity != Some(0))
                .map(|area| area.start)
        }?;

        (target < self.windows.len()).then_some(target)
    }

    fn change_rank(&self, window: &Window, promote: bool) -> Option<Self> {
        let Some(index) = self.windows.index_of(window) else {
            error!(%window, engine = %self.name, "Window not found");
            return None;
        };
        let target = self.rank_target(index, promote)?;
        debug!(%window, index, target, promote, "Changing window rank");
        self.move_to_index(&self.windows, index, target)
    }

    fn focus_rank(&self, window: &Window, promote: bool) {
        let Some(index) = self.windows.index_of(window) else {
            error!(%window, engine = %self.name, "Window not found");
            return;
        };
        if let Some(target) = self.rank_target(index, promote) {
            self.windows[target].focus();
        }
    }
}

impl LayoutEngine for SliceLayoutEngine {
    fn name(&self) -> &str { &self.name }

    fn identity(&self) -> LayoutEngineIdentity { self.identity }

    fn count(&self) -> usize { self.windows.len() + self.minimized.len() }

    fn add_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, "Adding window");
        if self.contains_window(window) {
            return self;
        }

        let mut windows = self.windows.clone();
        windows.push_back(window.clone());
        Arc::new(self.with_windows(windows))
    }

    fn remove_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, "Removing window");
        if let Some(index) = self.minimized.index_of(window) {
            let mut minimized = self.minimized.clone();
            minimized.remove(index);
            return Arc::new(Self { minimized, ..(*self).clone() });
        }

        let Some(index) = self.windows.index_of(window) else {
            return self;
        };
        let mut windows = self.windows.clone();
        windows.remove(index);
        Arc::new(self.with_windows(windows))
    }

    fn move_window_to_point(self: Arc<Self>, window: &Window, point: Point<f64>) -> LayoutEngineRef {
        debug!(%window, %point, engine = %self.name, "Moving window to point");
        let target = self.index_at_point(point);

        let mut windows = self.windows.clone();
        let current = match windows.index_of(window) {
            Some(index) => index,
            None => {
                windows.push_back(window.clone());
                windows.len() - 1
            }
        };

        // A new window with no window under the point stays at the end.
        let updated = target
            .and_then(|target| self.move_to_index(&windows, current, target))
            .or_else(|| (windows.len() != self.windows.len()).then(|| self.with_windows(windows)));
        self.into_ref(updated)
    }

    fn move_window_edges_in_direction(
        self: Arc<Self>,
        _edges: Direction,
        _deltas: Point<f64>,
        _window: &Window,
    ) -> LayoutEngineRef {
        self
    }

    fn minimize_window_start(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, "Minimizing window");
        let Some(index) = self.windows.index_of(window) else {
            return self;
        };

        let mut engine = (*self).clone();
        engine.windows.remove(index);
        engine.minimized.push_back(window.clone());
        Arc::new(engine)
    }

    fn minimize_window_end(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, "Restoring window");
        let Some(index) = self.minimized.index_of(window) else {
            return self;
        };

        let mut engine = (*self).clone();
        engine.minimized.remove(index);
        engine.windows.push_back(window.clone());
        Arc::new(engine)
    }

    fn focus_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef {
        debug!(%window, ?direction, engine = %self.name, "Focusing window in direction");
        if let Some(index) = self.index_in_direction(direction, window) {
            self.windows[index].focus();
        }
        self
    }

    fn swap_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef {
        debug!(%window, ?direction, engine = %self.name, "Swapping window in direction");
        let Some(current) = self.windows.index_of(window) else {
            error!(%window, engine = %self.name, "Window not found");
            return self;
        };

        let updated = self
            .index_in_direction(direction, window)
            .and_then(|target| self.move_to_index(&self.windows, current, target));
        self.into_ref(updated)
    }

    fn perform_custom_action(self: Arc<Self>, action: &LayoutEngineCustomAction) -> LayoutEngineRef {
        let Some(window) = action.window.as_ref() else {
            return self;
        };

        let updated = match action.name.as_str() {
            PROMOTE_ACTION => self.change_rank(window, true),
            DEMOTE_ACTION => self.change_rank(window, false),
            PROMOTE_FOCUS_ACTION => {
                self.focus_rank(window, true);
                None
            }
            DEMOTE_FOCUS_ACTION => {
                self.focus_rank(window, false);
                None
            }
            _ => None,
        };
        self.into_ref(updated)
    }

    fn contains_window(&self, window: &Window) -> bool {
        self.windows.contains(window) || self.minimized.contains(window)
    }

    fn first_window(&self) -> Option<Window> { self.windows.front().cloned() }

    fn do_layout(&self, rect: Rect<i32>, _monitor: &Monitor) -> Vec<WindowState> {
        debug!(engine = %self.name, %rect, "Doing slice layout");
        let mut states: Vec<WindowState> = self
            .area
            .layout(rect, self.windows.len())
            .into_iter()
            .filter_map(|(index, rect)| {
                let window = self.windows.get(index)?;
                Some(WindowState::new(window.clone(), rect, WindowSize::Normal))
            })
            .collect();

        states.extend(
            self.minimized
                .iter()
                .map(|w| WindowState::new(w.clone(), Rect::new(0, 0, 1, 1), WindowSize::Minimized)),
        );
        states
    }

    fn as_any(&self) -> &dyn Any { self }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::layout_engine::engine::testing::*;
    use crate::model::window::testing::{virtual_window, windows};

    fn primary_stack(insertion: WindowInsertionType) -> LayoutEngineRef {
        Arc::new(SliceLayoutEngine::primary_stack(LayoutEngineIdentity::new(), insertion))
    }

    fn order(engine: &LayoutEngineRef) -> Vec<Window> {
        engine.find_layout_engine::<SliceLayoutEngine>().unwrap().windows().iter().cloned().collect()
    }

    #[test]
    fn test_move_to_point_adds_to_empty_engine() {
        let w = windows(1);
        let empty = primary_stack(WindowInsertionType::Swap);
        let engine = empty.clone().move_window_to_point(&w[0], Point::new(0.5, 0.5));
        assert!(!Arc::ptr_eq(&empty, &engine));
        assert_eq!(engine.count(), 1);
        assert_eq!(rect_of(&layout(&engine, 1920, 1080), &w[0]), Some(Rect::new(0, 0, 1920, 1080)));
    }

    #[test]
    fn test_move_to_point_outside_area_appends() {
        let w = windows(3);
        let engine = add_all(primary_stack(WindowInsertionType::Swap), &w[..2]);
        let engine = engine.move_window_to_point(&w[2], Point::new(1.5, 1.5));
        assert_eq!(order(&engine), w);

        // Already present and nothing under the point: unchanged.
        let same = engine.clone().move_window_to_point(&w[0], Point::new(-1.0, 2.0));
        assert!(Arc::ptr_eq(&engine, &same));
    }

    #[test]
    fn test_single_window_fills_area() {
        let w = windows(1);
        let engine = add_all(primary_stack(WindowInsertionType::Swap), &w);
        assert_eq!(engine.name(), "Primary stack");
        assert_eq!(rect_of(&layout(&engine, 1920, 1080), &w[0]), Some(Rect::new(0, 0, 1920, 1080)));
    }

    #[test]
    fn test_primary_stack_layout() {
        let w = windows(3);
        let engine = add_all(primary_stack(WindowInsertionType::Swap), &w);
        let states = layout(&engine, 1920, 1080);
        assert_eq!(states.len(), 3);
        assert_eq!(rect_of(&states, &w[0]), Some(Rect::new(0, 0, 960, 1080)));
        assert_eq!(rect_of(&states, &w[1]), Some(Rect::new(960, 0, 960, 540)));
        assert_eq!(rect_of(&states, &w[2]), Some(Rect::new(960, 540, 960, 540)));
    }

    #[test]
    fn test_multi_column_layout() {
        let w = windows(5);
        let engine: LayoutEngineRef = Arc::new(SliceLayoutEngine::multi_column(
            LayoutEngineIdentity::new(),
            WindowInsertionType::Swap,
            &[2, 1, 0],
        ));
        let states = layout(&add_all(engine, &w), 300, 100);
        assert_eq!(rect_of(&states, &w[0]), Some(Rect::new(0, 0, 100, 50)));
        assert_eq!(rect_of(&states, &w[1]), Some(Rect::new(0, 50, 100, 50)));
        assert_eq!(rect_of(&states, &w[2]), Some(Rect::new(100, 0, 100, 100)));
        assert_eq!(rect_of(&states, &w[3]), Some(Rect::new(200, 0, 100, 50)));
        assert_eq!(rect_of(&states, &w[4]), Some(Rect::new(200, 50, 100, 50)));
    }

    #[test]
    fn test_secondary_primary_layout() {
        let w = windows(4);
        let engine: LayoutEngineRef = Arc::new(SliceLayoutEngine::secondary_primary(
            LayoutEngineIdentity::new(),
            WindowInsertionType::Swap,
            1,
            2,
        ));
        let states = layout(&add_all(engine, &w), 400, 100);
        assert_eq!(rect_of(&states, &w[0]), Some(Rect::new(100, 0, 200, 100)));
        assert_eq!(rect_of(&states, &w[1]), Some(Rect::new(0, 0, 100, 50)));
        assert_eq!(rect_of(&states, &w[2]), Some(Rect::new(0, 50, 100, 50)));
        assert_eq!(rect_of(&states, &w[3]), Some(Rect::new(300, 0, 100, 100)));
    }

    #[test]
    fn test_noops_return_same_engine() {
        let w = windows(3);
        let engine = add_all(primary_stack(WindowInsertionType::Swap), &w[..2]);
        assert!(same(&engine.clone().add_window(&w[0]), &engine));
        assert!(same(&engine.clone().remove_window(&w[2]), &engine));
        assert!(same(&engine.clone().swap_window_in_direction(Direction::LEFT, &w[0]), &engine));
        assert!(same(
            &engine.clone().move_window_edges_in_direction(Direction::RIGHT, Point::new(0.1, 0.0), &w[0]),
            &engine
        ));
        let promote = LayoutEngineCustomAction::new(PROMOTE_ACTION, Some(w[0].clone()));
        assert!(same(&engine.clone().perform_custom_action(&promote), &engine));
    }

    #[test]
    fn test_swap_in_direction() {
        let w = windows(3);
        let engine = add_all(primary_stack(WindowInsertionType::Swap), &w);
        let swapped = engine.swap_window_in_direction(Direction::LEFT, &w[2]);
        assert_eq!(order(&swapped), vec![w[2].clone(), w[1].clone(), w[0].clone()]);
    }

    #[test]
    fn test_rotate_shifts_windows_between() {
        let w = windows(3);
        let engine = add_all(primary_stack(WindowInsertionType::Rotate), &w);
        let rotated = engine.swap_window_in_direction(Direction::LEFT, &w[2]);
        assert_eq!(order(&rotated), vec![w[2].clone(), w[0].clone(), w[1].clone()]);

        let back = rotated.move_window_to_point(&w[2], Point::new(0.75, 0.75));
        assert_eq!(order(&back), vec![w[0].clone(), w[1].clone(), w[2].clone()]);
    }

    #[test]
    fn test_focus_in_direction() {
        let handles: Vec<_> = (0..3).map(virtual_window).collect();
        let w: Vec<_> = handles.iter().map(|h| h.window().clone()).collect();
        let engine = add_all(primary_stack(WindowInsertionType::Swap), &w);

        let result = engine.clone().focus_window_in_direction(Direction::DOWN, &w[1]);
        assert!(same(&result, &engine));
        assert_eq!(handles[2].native().focus_count(), 1);

        engine.clone().focus_window_in_direction(Direction::LEFT, &w[2]);
        assert_eq!(handles[0].native().focus_count(), 1);

        engine.focus_window_in_direction(Direction::UP, &w[1]);
        assert_eq!(handles.iter().map(|h| h.native().focus_count()).sum::<usize>(), 2);
    }

    #[test]
    fn test_move_window_to_point() {
        let w = windows(4);
        let engine = add_all(primary_stack(WindowInsertionType::Swap), &w[..3]);
        let moved = engine.clone().move_window_to_point(&w[2], Point::new(0.2, 0.5));
        assert_eq!(order(&moved), vec![w[2].clone(), w[1].clone(), w[0].clone()]);

        let added = engine.clone().move_window_to_point(&w[3], Point::new(0.2, 0.5));
        assert_eq!(order(&added), vec![w[3].clone(), w[1].clone(), w[2].clone(), w[0].clone()]);

        assert!(same(&engine.clone().move_window_to_point(&w[0], Point::new(1.5, 0.5)), &engine));
    }

    #[test]
    fn test_promote_and_demote() {
        let w = windows(4);
        let engine = add_all(primary_stack(WindowInsertionType::Swap), &w);

        let promoted = engine
            .clone()
            .perform_custom_action(&LayoutEngineCustomAction::new(PROMOTE_ACTION, Some(w[2].clone())));
        assert_eq!(order(&promoted)[0], w[2]);

        let demoted = engine
            .clone()
            .perform_custom_action(&LayoutEngineCustomAction::new(DEMOTE_ACTION, Some(w[0].clone())));
        assert_eq!(order(&demoted), vec![w[1].clone(), w[0].clone(), w[2].clone(), w[3].clone()]);

        let overflow_demote = LayoutEngineCustomAction::new(DEMOTE_ACTION, Some(w[3].clone()));
        assert!(same(&engine.clone().perform_custom_action(&overflow_demote), &engine));
    }

    #[test]
    fn test_promote_focus() {
        let handles: Vec<_> = (0..3).map(virtual_window).collect();
        let w: Vec<_> = handles.iter().map(|h| h.window().clone()).collect();
        let engine = add_all(primary_stack(WindowInsertionType::Swap), &w);

        let action = LayoutEngineCustomAction::new(PROMOTE_FOCUS_ACTION, Some(w[2].clone()));
        assert!(same(&engine.clone().perform_custom_action(&action), &engine));
        assert_eq!(handles[0].native().focus_count(), 1);

        let action = LayoutEngineCustomAction::new(DEMOTE_FOCUS_ACTION, Some(w[0].clone()));
        engine.perform_custom_action(&action);
        assert_eq!(handles[1].native().focus_count(), 1);
    }

    #[test]
    fn test_minimize_round_trip() {
        let w = windows(2);
        let engine = add_all(primary_stack(WindowInsertionType::Swap), &w).minimize_window_start(&w[0]);
        assert_eq!(engine.count(), 2);
        assert!(engine.contains_window(&w[0]));

        let states = layout(&engine, 100, 100);
        assert_eq!(rect_of(&states, &w[1]), Some(Rect::new(0, 0, 100, 100)));
        assert_eq!(states[1].size, WindowSize::Minimized);

        let restored = engine.minimize_window_end(&w[0]);
        assert_eq!(order(&restored), vec![w[1].clone(), w[0].clone()]);
        assert!(same(&restored.clone().minimize_window_end(&w[0]), &restored));
    }
}
