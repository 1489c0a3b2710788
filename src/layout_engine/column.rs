use std::any::Any;
use std::sync::Arc;

use im::Vector;
use tracing::{debug, error};

use crate::layout_engine::{
    Direction, LayoutEngine, LayoutEngineCustomAction, LayoutEngineIdentity, LayoutEngineRef,
};
use crate::model::{Monitor, Point, Rect, Window, WindowSize, WindowState};

/// Windows side by side in equal-width columns.
#[derive(Clone, Debug)]
pub struct ColumnLayoutEngine {
    identity: LayoutEngineIdentity,
    name: String,
    left_to_right: bool,
    stack: Vector<Window>,
}

impl ColumnLayoutEngine {
    pub fn new(identity: LayoutEngineIdentity, left_to_right: bool) -> Self {
        let name = if left_to_right { "Column" } else { "Right to left" };
        Self {
            identity,
            name: name.to_string(),
            left_to_right,
            stack: Vector::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn left_to_right(&self) -> bool { self.left_to_right }

    fn with_stack(&self, stack: Vector<Window>) -> LayoutEngineRef {
        Arc::new(Self { stack, ..self.clone() })
    }

    fn index_of(&self, window: &Window) -> Option<usize> { self.stack.index_of(window) }

    /// Index of the neighbour of `index` in `direction`, wrapping around.
    fn adjacent_index(&self, index: usize, direction: Direction) -> Option<usize> {
        let forward = match direction {
            d if d == Direction::LEFT => !self.left_to_right,
            d if d == Direction::RIGHT => self.left_to_right,
            _ => return None,
        };

        let len = self.stack.len();
        Some(if forward { (index + 1) % len } else { (index + len - 1) % len })
    }
}

impl LayoutEngine for ColumnLayoutEngine {
    fn name(&self) -> &str { &self.name }

    fn identity(&self) -> LayoutEngineIdentity { self.identity }

    fn count(&self) -> usize { self.stack.len() }

    fn add_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, "Adding window");
        if self.contains_window(window) {
            return self;
        }

        let mut stack = self.stack.clone();
        stack.push_back(window.clone());
        self.with_stack(stack)
    }

    fn remove_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, "Removing window");
        let Some(index) = self.index_of(window) else {
            return self;
        };

        let mut stack = self.stack.clone();
        stack.remove(index);
        self.with_stack(stack)
    }

    fn move_window_to_point(self: Arc<Self>, window: &Window, point: Point<f64>) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, %point, "Moving window to point");

        let current = self.index_of(window);
        let mut stack = self.stack.clone();
        if let Some(index) = current {
            stack.remove(index);
        }

        let len = stack.len();
        let mut index = ((point.x * len as f64).round().max(0.0) as usize).min(len);
        if !self.left_to_right {
            index = len - index;
        }
        if current == Some(index) {
            return self;
        }

        stack.insert(index, window.clone());
        self.with_stack(stack)
    }

    fn move_window_edges_in_direction(
        self: Arc<Self>,
        _edges: Direction,
        _deltas: Point<f64>,
        _window: &Window,
    ) -> LayoutEngineRef {
        self
    }

    fn minimize_window_start(self: Arc<Self>, _window: &Window) -> LayoutEngineRef { self }

    fn minimize_window_end(self: Arc<Self>, _window: &Window) -> LayoutEngineRef { self }

    fn focus_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef {
        let Some(index) = self.index_of(window) else {
            error!(%window, engine = %self.name, "Window not found");
            return self;
        };

        if let Some(adjacent) = self.adjacent_index(index, direction) {
            self.stack[adjacent].focus();
        }
        self
    }

    fn swap_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, ?direction, "Swapping window");
        let Some(index) = self.index_of(window) else {
            error!(%window, engine = %self.name, "Window not found");
            return self;
        };
        let Some(adjacent) = self.adjacent_index(index, direction) else {
            return self;
        };
        if adjacent == index {
            return self;
        }

        let mut stack = self.stack.clone();
        stack.swap(index, adjacent);
        self.with_stack(stack)
    }

    fn perform_custom_action(self: Arc<Self>, _action: &LayoutEngineCustomAction) -> LayoutEngineRef { self }

    fn contains_window(&self, window: &Window) -> bool { self.stack.contains(window) }

    fn first_window(&self) -> Option<Window> { self.stack.front().cloned() }

    fn do_layout(&self, rect: Rect<i32>, _monitor: &Monitor) -> Vec<WindowState> {
        debug!(engine = %self.name, left_to_right = self.left_to_right, "Performing column layout");
        if self.stack.is_empty() {
            return Vec::new();
        }

        let width = rect.width / self.stack.len() as i32;
        let (mut x, step) = if self.left_to_right {
            (rect.x, width)
        } else {
            (rect.x + rect.width - width, -width)
        };

        let mut states = Vec::with_capacity(self.stack.len());
        for window in &self.stack {
            states.push(WindowState::new(
                window.clone(),
                Rect::new(x, rect.y, width, rect.height),
                WindowSize::Normal,
            ));
            x += step;
        }
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

    fn column(left_to_right: bool) -> LayoutEngineRef {
        Arc::new(ColumnLayoutEngine::new(LayoutEngineIdentity::new(), left_to_right))
    }

    fn rects(states: &[WindowState]) -> Vec<Rect<i32>> { states.iter().map(|s| s.rect).collect() }

    #[test]
    fn it_lays_out_left_to_right() {
        let engine = add_all(column(true), &windows(2));
        assert_eq!(
            rects(&layout(&engine, 1920, 1080)),
            vec![Rect::new(0, 0, 960, 1080), Rect::new(960, 0, 960, 1080)]
        );
    }

    #[test]
    fn it_lays_out_right_to_left() {
        let engine = add_all(column(false), &windows(3));
        assert_eq!(
            rects(&layout(&engine, 300, 100)),
            vec![
                Rect::new(200, 0, 100, 100),
                Rect::new(100, 0, 100, 100),
                Rect::new(0, 0, 100, 100)
            ]
        );
    }

    #[test]
    fn test_noops_return_same_engine() {
        let w = windows(2);
        let engine = add_all(column(true), &w[..1]);

        assert!(same(&engine.clone().add_window(&w[0]), &engine));
        assert!(same(&engine.clone().remove_window(&w[1]), &engine));
        assert!(same(&engine.clone().swap_window_in_direction(Direction::UP, &w[0]), &engine));
    }

    #[test]
    fn test_add_remove_restores_count() {
        let w = windows(3);
        let engine = add_all(column(true), &w[..2]);
        let added = engine.clone().add_window(&w[2]);
        assert_eq!(added.count(), 3);
        assert_eq!(engine.count(), 2);

        let removed = added.remove_window(&w[2]);
        assert_eq!(removed.count(), 2);
        assert!(!removed.contains_window(&w[2]));
        assert_eq!(removed.first_window(), Some(w[0].clone()));
    }

    #[test]
    fn test_swap_wraps_around() {
        let w = windows(3);
        let engine = add_all(column(true), &w).swap_window_in_direction(Direction::LEFT, &w[0]);
        let states = layout(&engine, 300, 100);
        assert_eq!(rect_of(&states, &w[0]), Some(Rect::new(200, 0, 100, 100)));
        assert_eq!(rect_of(&states, &w[2]), Some(Rect::new(0, 0, 100, 100)));
    }

    #[test]
    fn test_focus_wraps_around() {
        let handles: Vec<_> = (0..3).map(virtual_window).collect();
        let w: Vec<_> = handles.iter().map(|h| h.window().clone()).collect();
        let engine = add_all(column(true), &w);

        let result = engine.clone().focus_window_in_direction(Direction::RIGHT, &w[2]);
        assert!(same(&result, &engine));
        assert_eq!(handles[0].native().focus_count(), 1);

        engine.focus_window_in_direction(Direction::UP, &w[2]);
        assert_eq!(handles[0].native().focus_count(), 1);
    }

    #[test]
    fn test_move_window_to_point() {
        let w = windows(3);
        let engine = add_all(column(true), &w[..2]).move_window_to_point(&w[2], Point::new(0.4, 0.5));
        let states = layout(&engine, 300, 100);
        assert_eq!(rect_of(&states, &w[2]), Some(Rect::new(100, 0, 100, 100)));

        let engine = add_all(column(false), &w[..2]).move_window_to_point(&w[2], Point::new(0.0, 0.5));
        let states = layout(&engine, 300, 100);
        assert_eq!(rect_of(&states, &w[2]), Some(Rect::new(0, 0, 100, 100)));
    }

    #[test]
    fn test_move_to_current_slot_returns_same_engine() {
        let w = windows(3);
        for left_to_right in [true, false] {
            let engine = add_all(column(left_to_right), &w);
            let moved = engine.clone().move_window_to_point(&w[1], Point::new(0.5, 0.5));
            assert!(same(&moved, &engine));
        }

        let engine = add_all(column(true), &w);
        let moved = engine.clone().move_window_to_point(&w[0], Point::new(0.9, 0.5));
        assert!(!same(&moved, &engine));
        assert_eq!(rect_of(&layout(&moved, 300, 100), &w[0]), Some(Rect::new(200, 0, 100, 100)));
    }
}
