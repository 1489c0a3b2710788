use std::sync::Arc;

use tracing::error;

use super::node::{LeafNode, Node, SplitNode};
use crate::layout_engine::Direction;
use crate::model::geometry::round_half_even;
use crate::model::{Point, Rect, Window};

/// Child indexes from the root down to a node. The root itself has the
/// empty path.
pub type NodePath = Vec<usize>;

pub type WindowPaths = im::HashMap<Window, NodePath>;

/// A node with the splits above it and its rectangle in the unit square.
#[derive(Clone, Debug)]
pub struct NodeState {
    pub node: Node,
    pub ancestors: Vec<Arc<SplitNode>>,
    pub rect: Rect<f64>,
}

/// The leaf found under a point.
#[derive(Clone, Debug)]
pub struct LeafAtPoint {
    pub leaf: LeafNode,
    pub ancestors: Vec<Arc<SplitNode>>,
    pub path: NodePath,
    /// Where the point sits inside the leaf, by diagonal.
    pub direction: Direction,
}

fn child_rect(parent: &SplitNode, rect: Rect<f64>, index: usize) -> Rect<f64> {
    let weight = parent.weight(index);
    let preceding = parent.preceding_weight(index);
    let mut child = rect;
    if parent.is_horizontal() {
        child.x += preceding * rect.width;
        child.width = weight * rect.width;
    } else {
        child.y += preceding * rect.height;
        child.height = weight * rect.height;
    }
    child
}

/// Follows `path` from `root`, collecting the splits passed on the way.
pub fn node_at_path(root: &Node, path: &[usize]) -> Option<NodeState> {
    let mut rect = Rect::UNIT;
    let mut ancestors = Vec::with_capacity(path.len());
    let mut current = root.clone();

    for (depth, &index) in path.iter().enumerate() {
        let Node::Split(split) = &current else {
            error!(?path, depth, "Expected a split node along path");
            return None;
        };
        let Some(child) = split.children().get(index).cloned() else {
            error!(?path, depth, "Path index out of range");
            return None;
        };

        rect = child_rect(split, rect, index);
        ancestors.push(split.clone());
        current = child;
    }

    Some(NodeState { node: current, ancestors, rect })
}

/// Descends from the root to the leaf whose rectangle contains `point`.
pub fn leaf_containing_point(root: &Node, point: Point<f64>) -> Option<LeafAtPoint> {
    let mut rect = Rect::UNIT;
    if !rect.contains(point) {
        return None;
    }

    let mut ancestors = Vec::new();
    let mut path = Vec::new();
    let mut current = root.clone();

    loop {
        let split = match current {
            Node::Leaf(leaf) => {
                return Some(LeafAtPoint {
                    leaf,
                    ancestors,
                    path,
                    direction: rect.direction_to_point(point),
                });
            }
            Node::Split(split) => split,
        };

        let found = (0..split.len())
            .map(|index| (index, child_rect(&split, rect, index)))
            .find(|(_, child)| child.contains(point));

        let Some((index, child)) = found else {
            error!(%point, "Split contains the point but none of its children do");
            return None;
        };

        path.push(index);
        rect = child;
        current = split.children()[index].clone();
        ancestors.push(split);
    }
}

/// Finds the leaf next to `rect` in `direction`, by probing one pixel outside
/// of it. `area` supplies the pixel size.
pub fn adjacent_leaf(
    root: &Node,
    rect: Rect<f64>,
    direction: Direction,
    area: Rect<i32>,
) -> Option<LeafAtPoint> {
    if !matches!(root, Node::Split(_)) {
        return None;
    }

    let pixel_width = 1.0 / f64::from(area.width.max(1));
    let pixel_height = 1.0 / f64::from(area.height.max(1));

    let mut x = rect.x;
    let mut y = rect.y;

    if direction.contains(Direction::LEFT) {
        x -= pixel_width;
    } else if direction.contains(Direction::RIGHT) {
        x += rect.width + pixel_width;
    }

    if direction.contains(Direction::UP) {
        y -= pixel_height;
    } else if direction.contains(Direction::DOWN) {
        y += rect.height + pixel_height;
    }

    leaf_containing_point(root, Point::new(x, y))
}

/// Index of the deepest split shared by two ancestor chains.
pub fn last_common_ancestor_index(a: &[Arc<SplitNode>], b: &[Arc<SplitNode>]) -> Option<usize> {
    a.iter().zip(b).take_while(|(a, b)| Arc::ptr_eq(a, b)).count().checked_sub(1)
}

/// Rebuilds the tree bottom-up after the node at `path` was replaced by
/// `new_node`. `ancestors` are the splits along `path` in the old tree.
pub fn rebuild(ancestors: &[Arc<SplitNode>], path: &[usize], new_node: Node) -> Option<Node> {
    let mut current = new_node;
    for depth in (0..path.len()).rev() {
        let parent = ancestors.get(depth)?;
        current = Node::from(parent.replace(path[depth], current)?);
    }
    Some(current)
}

/// Recomputes the path of every window below `changed`.
pub fn updated_paths(paths: &WindowPaths, changed: &[usize], root: &Node) -> WindowPaths {
    let mut node = root;
    for (depth, &index) in changed.iter().enumerate() {
        match node.as_split().and_then(|split| split.children().get(index)) {
            Some(child) => node = child,
            None => {
                error!(?changed, depth, "Changed path does not resolve");
                return paths.clone();
            }
        }
    }

    let mut updated = paths.clone();
    let mut stack = vec![(node, changed.to_vec())];
    while let Some((current, path)) = stack.pop() {
        match current {
            Node::Leaf(leaf) => {
                updated.insert(leaf.window().clone(), path);
            }
            Node::Split(split) => {
                for (index, child) in split.children().iter().enumerate().rev() {
                    let mut child_path = path.clone();
                    child_path.push(index);
                    stack.push((child, child_path));
                }
            }
        }
    }
    updated
}

/// Every leaf with its rectangle in pixels, in order.
pub fn leaf_rects(node: &Node, rect: Rect<i32>, out: &mut Vec<(LeafNode, Rect<i32>)>) {
    match node {
        Node::Leaf(leaf) => out.push((leaf.clone(), rect)),
        Node::Split(split) => {
            let mut preceding = 0.0;
            for (weight, child) in split.iter() {
                let mut child_rect = rect;
                if split.is_horizontal() {
                    child_rect.x += round_half_even(preceding * f64::from(rect.width));
                    child_rect.width = round_half_even(weight * f64::from(rect.width));
                } else {
                    child_rect.y += round_half_even(preceding * f64::from(rect.height));
                    child_rect.height = round_half_even(weight * f64::from(rect.height));
                }
                leaf_rects(child, child_rect, out);
                preceding += weight;
            }
        }
    }
}

/// The right-most leaf below `split`, its ancestors and its path.
pub fn rightmost_leaf(split: &Arc<SplitNode>) -> Option<(LeafNode, Vec<Arc<SplitNode>>, NodePath)> {
    let mut ancestors = Vec::new();
    let mut path = Vec::new();
    let mut current = split.clone();

    loop {
        let index = current.len().checked_sub(1)?;
        let child = current.children()[index].clone();
        path.push(index);
        ancestors.push(current);
        match child {
            Node::Leaf(leaf) => return Some((leaf, ancestors, path)),
            Node::Split(next) => current = next,
        }
    }
}

pub fn leftmost_leaf(node: &Node) -> Option<&LeafNode> {
    match node {
        Node::Leaf(leaf) => Some(leaf),
        Node::Split(split) => leftmost_leaf(split.children().front()?),
    }
}
