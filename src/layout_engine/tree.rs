//! Arbitrary nested split layouts.
//!
//! The tree is immutable: every change rebuilds the splits from the changed
//! node up to the root and shares everything else with the previous version.
//! Windows are found through a map from window to [`NodePath`].

mod helpers;
mod node;

use std::any::Any;
use std::sync::Arc;

use im::Vector;
use tracing::{debug, error, warn};

pub use self::helpers::{NodePath, WindowPaths};
use self::helpers::{
    adjacent_leaf, last_common_ancestor_index, leaf_containing_point, leaf_rects, leftmost_leaf,
    node_at_path, rebuild, rightmost_leaf, updated_paths,
};
pub use self::node::{LeafNode, Node, SplitNode};
use crate::layout_engine::context::{FALLBACK_AREA, LayoutContextRef};
use crate::layout_engine::{
    CardinalDirection, Direction, LayoutEngine, LayoutEngineCustomAction, LayoutEngineIdentity,
    LayoutEngineRef, LayoutError,
};
use crate::model::{Monitor, Point, Rect, Window, WindowSize, WindowState};

/// Payload: a [`Direction`] or [`CardinalDirection`].
pub const SET_ADD_DIRECTION_ACTION: &str = "tree.set_add_direction";
/// Adds the action's window as a phantom leaf.
pub const ADD_PHANTOM_ACTION: &str = "tree.add_phantom";
/// Toggles equal weights on the parent of the action's window.
pub const TOGGLE_EQUAL_WEIGHT_ACTION: &str = "tree.toggle_equal_weight";
pub const HIDE_PHANTOM_WINDOWS_ACTION: &str = "tree.hide_phantom_windows";

#[derive(Clone, Debug)]
pub struct TreeLayoutEngine {
    ctx: LayoutContextRef,
    identity: LayoutEngineIdentity,
    name: String,
    add_node_direction: Direction,
    root: Option<Node>,
    windows: WindowPaths,
    minimized: Vector<Window>,
}

impl TreeLayoutEngine {
    pub fn new(
        ctx: LayoutContextRef,
        identity: LayoutEngineIdentity,
        add_node_direction: Direction,
    ) -> Result<Self, LayoutError> {
        if !add_node_direction.is_cardinal() {
            return Err(LayoutError::InvalidAddDirection(add_node_direction));
        }

        Ok(Self::empty(ctx, identity, add_node_direction))
    }

    /// A tree adding windows in a direction that is cardinal by construction.
    pub fn cardinal(
        ctx: LayoutContextRef,
        identity: LayoutEngineIdentity,
        add_node_direction: CardinalDirection,
    ) -> Self {
        Self::empty(ctx, identity, add_node_direction.into())
    }

    fn empty(ctx: LayoutContextRef, identity: LayoutEngineIdentity, add_node_direction: Direction) -> Self {
        Self {
            ctx,
            identity,
            name: "Tree".to_string(),
            add_node_direction,
            root: None,
            windows: WindowPaths::new(),
            minimized: Vector::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn add_node_direction(&self) -> Direction { self.add_node_direction }

    pub fn root(&self) -> Option<&Node> { self.root.as_ref() }

    pub fn path_of(&self, window: &Window) -> Option<&NodePath> { self.windows.get(window) }

    fn with_tree(&self, root: Option<Node>, windows: WindowPaths) -> Self {
        Self { root, windows, ..self.clone() }
    }

    fn single_leaf(&self, leaf: LeafNode) -> Self {
        let windows = WindowPaths::unit(leaf.window().clone(), NodePath::new());
        self.with_tree(Some(Node::Leaf(leaf)), windows)
    }

    /// Replaces the node at `path` with `new_node` and rebuilds everything
    /// above it.
    fn create_new_engine(
        &self,
        ancestors: &[Arc<SplitNode>],
        path: &[usize],
        windows: WindowPaths,
        new_node: Node,
    ) -> Option<Self> {
        let Some(root) = rebuild(ancestors, path, new_node) else {
            error!(?path, "Failed to rebuild tree");
            return None;
        };
        let windows = updated_paths(&windows, path, &root);
        Some(self.with_tree(Some(root), windows))
    }

    fn working_area(&self) -> Rect<i32> {
        self.ctx.active_monitor().map_or(FALLBACK_AREA, |m| m.working_area)
    }

    fn new_leaf(window: &Window, phantom: bool) -> LeafNode {
        if phantom {
            LeafNode::Phantom(window.clone())
        } else {
            LeafNode::Window(window.clone())
        }
    }

    /// Adds a leaf next to the last focused window, or the right-most leaf.
    fn add_leaf(&self, leaf: LeafNode) -> Option<Self> {
        match &self.root {
            None | Some(Node::Leaf(LeafNode::Phantom(_))) => Some(self.single_leaf(leaf)),
            Some(Node::Leaf(root_leaf @ LeafNode::Window(_))) => {
                let root = SplitNode::new(
                    Node::Leaf(root_leaf.clone()),
                    Node::Leaf(leaf),
                    self.add_node_direction,
                );
                let root = Node::from(root);
                let windows = updated_paths(&WindowPaths::new(), &[], &root);
                Some(self.with_tree(Some(root), windows))
            }
            Some(Node::Split(root)) => {
                let focused = self
                    .ctx
                    .last_focused_window()
                    .and_then(|window| self.windows.get(&window).cloned())
                    .and_then(|path| {
                        let state = node_at_path(&Node::Split(root.clone()), &path)?;
                        state.node.as_leaf()?;
                        Some((state.ancestors, path))
                    });

                let (ancestors, path) = match focused {
                    Some(found) => found,
                    None => {
                        let (_, ancestors, path) = rightmost_leaf(root)?;
                        (ancestors, path)
                    }
                };

                let (&index, parent_path) = path.split_last()?;
                let parent = ancestors.last()?;
                let new_parent =
                    parent.add(index, Node::Leaf(leaf), self.add_node_direction.insert_after())?;
                self.create_new_engine(&ancestors, parent_path, self.windows.clone(), new_parent.into())
            }
        }
    }

    fn add_leaf_at_point(&self, leaf: LeafNode, point: Point<f64>) -> Option<Self> {
        match &self.root {
            None | Some(Node::Leaf(LeafNode::Phantom(_))) => Some(self.single_leaf(leaf)),
            Some(Node::Leaf(root_leaf @ LeafNode::Window(_))) => {
                let direction = Rect::UNIT.direction_to_point(point);
                let root = Node::from(SplitNode::new(
                    Node::Leaf(root_leaf.clone()),
                    Node::Leaf(leaf),
                    direction,
                ));
                let windows = updated_paths(&WindowPaths::new(), &[], &root);
                Some(self.with_tree(Some(root), windows))
            }
            Some(root @ Node::Split(_)) => {
                let Some(found) = leaf_containing_point(root, point) else {
                    debug!(%point, "No leaf contains point");
                    return None;
                };

                let (&index, parent_path) = found.path.split_last()?;
                let parent = found.ancestors.last()?;
                let new_parent = if parent.is_horizontal() == found.direction.is_horizontal() {
                    parent.add(index, Node::Leaf(leaf), found.direction.insert_after())?
                } else {
                    let replacement =
                        SplitNode::new(Node::Leaf(found.leaf), Node::Leaf(leaf), found.direction);
                    parent.replace(index, replacement.into())?
                };
                self.create_new_engine(
                    &found.ancestors,
                    parent_path,
                    self.windows.clone(),
                    new_parent.into(),
                )
            }
        }
    }

    fn remove_from_tree(&self, window: &Window) -> Option<Self> {
        let root = match &self.root {
            None => {
                error!(%window, "Tree is empty, cannot remove window");
                return None;
            }
            Some(Node::Leaf(leaf)) => {
                if leaf.window() != window {
                    error!(%window, "Window is not the root leaf");
                    return None;
                }
                return Some(self.with_tree(None, WindowPaths::new()));
            }
            Some(root) => root,
        };

        let Some(path) = self.windows.get(window) else {
            error!(%window, engine = %self.name, "Window not found");
            return None;
        };
        let state = node_at_path(root, path)?;
        let (&index, parent_path) = path.split_last()?;
        let parent = state.ancestors.last()?;
        let windows = self.windows.without(window);

        if parent.len() != 2 {
            let new_parent = parent.remove(index)?;
            return self.create_new_engine(&state.ancestors, parent_path, windows, new_parent.into());
        }

        let other = parent.children()[1 - index].clone();
        if let (true, Node::Leaf(other_leaf)) = (parent_path.is_empty(), &other) {
            return Some(self.single_leaf(other_leaf.clone()));
        }
        self.create_new_engine(&state.ancestors, parent_path, windows, other)
    }

    /// Window leaf state plus the split root, for operations that need a
    /// neighbour.
    fn non_root_state(&self, window: &Window) -> Option<(Node, NodePath, helpers::NodeState)> {
        let root = self.root.as_ref().filter(|root| root.as_split().is_some())?;
        let Some(path) = self.windows.get(window) else {
            error!(%window, engine = %self.name, "Window not found");
            return None;
        };
        let state = node_at_path(root, path)?;
        Some((root.clone(), path.clone(), state))
    }

    fn swap_in_direction(&self, direction: Direction, window: &Window) -> Option<Self> {
        let (root, path, state) = self.non_root_state(window)?;
        let Some(adjacent) = adjacent_leaf(&root, state.rect, direction, self.working_area()) else {
            debug!(%window, ?direction, "No adjacent node to swap with");
            return None;
        };

        let (&index, parent_path) = path.split_last()?;
        let (&adjacent_index, adjacent_parent_path) = adjacent.path.split_last()?;
        let parent = state.ancestors.last()?;
        let adjacent_parent = adjacent.ancestors.last()?;

        if Arc::ptr_eq(parent, adjacent_parent) {
            let new_parent = parent.swap(index, adjacent_index)?;
            return self.create_new_engine(
                &state.ancestors,
                parent_path,
                self.windows.clone(),
                new_parent.into(),
            );
        }

        let new_parent = parent.replace(index, Node::Leaf(adjacent.leaf.clone()))?;
        let first = self.create_new_engine(
            &state.ancestors,
            parent_path,
            self.windows.clone(),
            new_parent.into(),
        )?;

        let first_root = first.root.as_ref()?;
        let adjacent_state = node_at_path(first_root, &adjacent.path)?;
        let new_adjacent_parent =
            adjacent_state.ancestors.last()?.replace(adjacent_index, state.node.clone())?;
        first.create_new_engine(
            &adjacent_state.ancestors,
            adjacent_parent_path,
            first.windows.clone(),
            new_adjacent_parent.into(),
        )
    }

    fn move_edges(&self, edges: Direction, deltas: Point<f64>, window: &Window) -> Option<Self> {
        let (root, path, state) = self.non_root_state(window)?;
        let area = self.working_area();

        // A positive delta grows the focused node towards the moved edge.
        let x_adjacent = if edges.contains(Direction::LEFT) {
            adjacent_leaf(&root, state.rect, Direction::LEFT, area).map(|adj| (adj, -deltas.x))
        } else if edges.contains(Direction::RIGHT) {
            adjacent_leaf(&root, state.rect, Direction::RIGHT, area).map(|adj| (adj, deltas.x))
        } else {
            None
        };

        let y_adjacent = if edges.contains(Direction::UP) {
            adjacent_leaf(&root, state.rect, Direction::UP, area).map(|adj| (adj, -deltas.y))
        } else if edges.contains(Direction::DOWN) {
            adjacent_leaf(&root, state.rect, Direction::DOWN, area).map(|adj| (adj, deltas.y))
        } else {
            None
        };

        if x_adjacent.is_none() && y_adjacent.is_none() {
            debug!(%window, ?edges, "No adjacent node to resize against");
            return None;
        }

        let mut engine: Option<Self> = None;
        for (adjacent, delta, is_x) in [
            x_adjacent.map(|(adj, d)| (adj, d, true)),
            y_adjacent.map(|(adj, d)| (adj, d, false)),
        ]
        .into_iter()
        .flatten()
        {
            let current = engine.as_ref().unwrap_or(self);
            let moved = current.move_single_edge(
                delta,
                is_x,
                &state.ancestors,
                &path,
                &adjacent.ancestors,
                &adjacent.path,
            );
            if moved.is_some() {
                engine = moved;
            }
        }
        engine
    }

    fn move_single_edge(
        &self,
        delta: f64,
        is_x: bool,
        focused_ancestors: &[Arc<SplitNode>],
        focused_path: &[usize],
        adjacent_ancestors: &[Arc<SplitNode>],
        adjacent_path: &[usize],
    ) -> Option<Self> {
        let Some(depth) = last_common_ancestor_index(focused_ancestors, adjacent_ancestors) else {
            error!("Focused and adjacent nodes have no common parent");
            return None;
        };

        let parent_path = &focused_path[..depth];
        let parent_state = node_at_path(self.root.as_ref()?, parent_path)?;
        let Some(parent) = parent_state.node.as_split() else {
            error!(?parent_path, "Common parent is not a split node");
            return None;
        };

        let size = if is_x { parent_state.rect.width } else { parent_state.rect.height };
        let relative_delta = delta / size;

        let new_parent = parent
            .adjust_child_weight(*focused_path.get(depth)?, relative_delta)?
            .adjust_child_weight(*adjacent_path.get(depth)?, -relative_delta)?;

        self.create_new_engine(
            &parent_state.ancestors,
            parent_path,
            self.windows.clone(),
            new_parent.into(),
        )
    }

    fn toggle_equal_weight(&self, window: &Window) -> Option<Self> {
        let (_, path, state) = self.non_root_state(window)?;
        let (_, parent_path) = path.split_last()?;
        let parent = state.ancestors.last()?;
        let ancestors = &state.ancestors[..state.ancestors.len() - 1];
        self.create_new_engine(
            ancestors,
            parent_path,
            self.windows.clone(),
            parent.toggle_equal_weight().into(),
        )
    }

    fn set_add_direction(&self, direction: Direction) -> Option<Self> {
        if !direction.is_cardinal() {
            warn!(?direction, "Ignoring non-cardinal add direction");
            return None;
        }
        if direction == self.add_node_direction {
            return None;
        }
        Some(Self { add_node_direction: direction, ..self.clone() })
    }

    /// Hides every window held by a phantom leaf.
    pub fn hide_phantom_windows(&self) {
        for window in self.windows.keys() {
            let is_phantom = self
                .windows
                .get(window)
                .and_then(|path| node_at_path(self.root.as_ref()?, path))
                .is_some_and(|state| state.node.as_leaf().is_some_and(LeafNode::is_phantom));
            if is_phantom {
                window.hide();
            }
        }
    }

    /// Renders the tree for debugging.
    pub fn draw_tree(&self) -> String {
        fn ascii(node: &Node, weight: Option<f64>) -> ascii_tree::Tree {
            let weight = weight.map(|w| format!(" {w:.2}")).unwrap_or_default();
            match node {
                Node::Leaf(LeafNode::Window(window)) => {
                    ascii_tree::Tree::Leaf(vec![format!("{window}{weight}")])
                }
                Node::Leaf(LeafNode::Phantom(window)) => {
                    ascii_tree::Tree::Leaf(vec![format!("phantom {window}{weight}")])
                }
                Node::Split(split) => {
                    let orientation = if split.is_horizontal() { "horizontal" } else { "vertical" };
                    let equal = if split.equal_weight() { " equal" } else { "" };
                    let children = split.iter().map(|(w, child)| ascii(child, Some(w))).collect();
                    ascii_tree::Tree::Node(format!("{orientation}{equal}{weight}"), children)
                }
            }
        }

        let Some(root) = &self.root else {
            return String::from("(empty)\n");
        };
        let mut out = String::new();
        if let Err(err) = ascii_tree::write_tree(&mut out, &ascii(root, None)) {
            error!(?err, "Failed to draw tree");
        }
        out
    }

    fn into_ref(self: Arc<Self>, updated: Option<Self>) -> LayoutEngineRef {
        match updated {
            Some(engine) => Arc::new(engine),
            None => self,
        }
    }
}

impl LayoutEngine for TreeLayoutEngine {
    fn name(&self) -> &str { &self.name }

    fn identity(&self) -> LayoutEngineIdentity { self.identity }

    fn count(&self) -> usize { self.windows.len() + self.minimized.len() }

    fn add_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, "Adding window");
        if self.contains_window(window) {
            return self;
        }
        let updated = self.add_leaf(Self::new_leaf(window, false));
        self.into_ref(updated)
    }

    fn remove_window(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, "Removing window");
        if let Some(index) = self.minimized.index_of(window) {
            let mut minimized = self.minimized.clone();
            minimized.remove(index);
            return Arc::new(Self { minimized, ..(*self).clone() });
        }
        if !self.windows.contains_key(window) {
            return self;
        }
        let updated = self.remove_from_tree(window);
        self.into_ref(updated)
    }

    fn move_window_to_point(self: Arc<Self>, window: &Window, point: Point<f64>) -> LayoutEngineRef {
        debug!(%window, %point, engine = %self.name, "Moving window to point");

        let phantom = self
            .windows
            .get(window)
            .and_then(|path| node_at_path(self.root.as_ref()?, path))
            .is_some_and(|state| state.node.as_leaf().is_some_and(LeafNode::is_phantom));

        let present = self.windows.contains_key(window);
        let base = if present {
            match self.remove_from_tree(window) {
                Some(engine) => engine,
                None => return self,
            }
        } else {
            let mut engine = (*self).clone();
            if let Some(index) = engine.minimized.index_of(window) {
                engine.minimized.remove(index);
            }
            engine
        };

        let leaf = Self::new_leaf(window, phantom);
        let updated = match base.add_leaf_at_point(leaf.clone(), point) {
            Some(engine) => Some(engine),
            // A new window still has to land somewhere.
            None if !present => base.add_leaf(leaf),
            None => None,
        };
        self.into_ref(updated)
    }

    fn move_window_edges_in_direction(
        self: Arc<Self>,
        edges: Direction,
        deltas: Point<f64>,
        window: &Window,
    ) -> LayoutEngineRef {
        debug!(%window, ?edges, %deltas, engine = %self.name, "Moving window edges");
        let updated = self.move_edges(edges, deltas, window);
        self.into_ref(updated)
    }

    fn minimize_window_start(self: Arc<Self>, window: &Window) -> LayoutEngineRef {
        debug!(%window, engine = %self.name, "Minimizing window");
        if self.minimized.contains(window) {
            return self;
        }

        let mut engine = if self.windows.contains_key(window) {
            match self.remove_from_tree(window) {
                Some(engine) => engine,
                None => return self,
            }
        } else {
            (*self).clone()
        };
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
        let updated = engine.add_leaf(Self::new_leaf(window, false)).unwrap_or(engine);
        Arc::new(updated)
    }

    fn focus_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef {
        debug!(%window, ?direction, engine = %self.name, "Focusing window in direction");
        if let Some((root, _, state)) = self.non_root_state(window) {
            if let Some(adjacent) = adjacent_leaf(&root, state.rect, direction, self.working_area()) {
                adjacent.leaf.focus();
            }
        }
        self
    }

    fn swap_window_in_direction(self: Arc<Self>, direction: Direction, window: &Window) -> LayoutEngineRef {
        debug!(%window, ?direction, engine = %self.name, "Swapping window in direction");
        let updated = self.swap_in_direction(direction, window);
        self.into_ref(updated)
    }

    fn perform_custom_action(self: Arc<Self>, action: &LayoutEngineCustomAction) -> LayoutEngineRef {
        let updated = match action.name.as_str() {
            SET_ADD_DIRECTION_ACTION => {
                let direction = action
                    .payload::<Direction>()
                    .copied()
                    .or_else(|| action.payload::<CardinalDirection>().map(|&d| d.into()));
                direction.and_then(|d| self.set_add_direction(d))
            }
            ADD_PHANTOM_ACTION => action
                .window
                .as_ref()
                .filter(|window| !self.contains_window(window))
                .and_then(|window| self.add_leaf(Self::new_leaf(window, true))),
            TOGGLE_EQUAL_WEIGHT_ACTION => {
                action.window.as_ref().and_then(|window| self.toggle_equal_weight(window))
            }
            HIDE_PHANTOM_WINDOWS_ACTION => {
                self.hide_phantom_windows();
                None
            }
            _ => None,
        };
        self.into_ref(updated)
    }

    fn contains_window(&self, window: &Window) -> bool {
        self.windows.contains_key(window) || self.minimized.contains(window)
    }

    fn first_window(&self) -> Option<Window> {
        match self.root.as_ref()? {
            Node::Leaf(LeafNode::Phantom(_)) => None,
            root => leftmost_leaf(root).map(|leaf| leaf.window().clone()),
        }
    }

    fn do_layout(&self, rect: Rect<i32>, _monitor: &Monitor) -> Vec<WindowState> {
        debug!(engine = %self.name, "Doing tree layout");
        let mut leaves = Vec::with_capacity(self.windows.len());
        if let Some(root) = &self.root {
            leaf_rects(root, rect, &mut leaves);
        }

        let mut states: Vec<WindowState> = leaves
            .into_iter()
            .map(|(leaf, rect)| WindowState::new(leaf.window().clone(), rect, WindowSize::Normal))
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
