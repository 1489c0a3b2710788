use std::sync::Arc;

use im::Vector;
use tracing::{error, trace};

use crate::layout_engine::Direction;
use crate::model::Window;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeafNode {
    Window(Window),
    /// Placeholder that holds space for a window that is not really tiled,
    /// such as a drag target.
    Phantom(Window),
}

impl LeafNode {
    pub fn window(&self) -> &Window {
        match self {
            LeafNode::Window(window) | LeafNode::Phantom(window) => window,
        }
    }

    pub fn is_phantom(&self) -> bool { matches!(self, LeafNode::Phantom(_)) }

    pub fn focus(&self) { self.window().focus() }
}

#[derive(Clone, Debug)]
pub enum Node {
    Leaf(LeafNode),
    Split(Arc<SplitNode>),
}

impl Node {
    pub fn as_split(&self) -> Option<&Arc<SplitNode>> {
        match self {
            Node::Split(split) => Some(split),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Split(_) => None,
        }
    }

    /// Pointer identity for splits, value equality for leaves.
    pub fn same_as(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Leaf(a), Node::Leaf(b)) => a == b,
            (Node::Split(a), Node::Split(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<LeafNode> for Node {
    fn from(leaf: LeafNode) -> Self { Node::Leaf(leaf) }
}

impl From<SplitNode> for Node {
    fn from(split: SplitNode) -> Self { Node::Split(Arc::new(split)) }
}

/// An immutable split of its area between ordered children.
///
/// When `equal_weight` is set every child gets `1 / n` of the area and the
/// stored weights are ignored.
#[derive(Clone, Debug)]
pub struct SplitNode {
    children: Vector<Node>,
    weights: Vector<f64>,
    equal_weight: bool,
    is_horizontal: bool,
}

impl SplitNode {
    /// Splits the space of `focused` between it and `new_node`. The new node
    /// goes after the focused one when `direction` is right or down.
    pub fn new(focused: Node, new_node: Node, direction: Direction) -> Self {
        let children = if direction.insert_after() {
            Vector::from(vec![focused, new_node])
        } else {
            Vector::from(vec![new_node, focused])
        };

        Self {
            children,
            weights: Vector::from(vec![0.5, 0.5]),
            equal_weight: true,
            is_horizontal: direction.is_horizontal(),
        }
    }

    pub fn from_parts(
        equal_weight: bool,
        is_horizontal: bool,
        children: Vector<Node>,
        weights: Vector<f64>,
    ) -> Self {
        Self { children, weights, equal_weight, is_horizontal }
    }

    pub fn children(&self) -> &Vector<Node> { &self.children }

    pub fn weights(&self) -> &Vector<f64> { &self.weights }

    pub fn len(&self) -> usize { self.children.len() }

    pub fn is_empty(&self) -> bool { self.children.is_empty() }

    pub fn equal_weight(&self) -> bool { self.equal_weight }

    pub fn is_horizontal(&self) -> bool { self.is_horizontal }

    /// The weight actually used for the child at `index`.
    pub fn weight(&self, index: usize) -> f64 {
        if self.equal_weight {
            1.0 / self.children.len() as f64
        } else {
            self.weights.get(index).copied().unwrap_or(0.0)
        }
    }

    /// Sum of the effective weights of the children before `index`.
    pub fn preceding_weight(&self, index: usize) -> f64 {
        if self.equal_weight {
            index as f64 / self.children.len() as f64
        } else {
            self.weights.iter().take(index).sum()
        }
    }

    /// Children paired with their effective weights.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &Node)> + '_ {
        self.children.iter().enumerate().map(move |(idx, child)| (self.weight(idx), child))
    }

    fn check_index(&self, index: usize) -> Option<()> {
        if index < self.children.len() {
            Some(())
        } else {
            error!(index, len = self.children.len(), "Index out of range for split node");
            None
        }
    }

    /// Inserts `new_node` before or after the child at `focused_index`. When
    /// weights are in use the last child gives up half of its weight.
    pub fn add(&self, focused_index: usize, new_node: Node, insert_after: bool) -> Option<SplitNode> {
        trace!(focused_index, insert_after, "Adding node to split");
        self.check_index(focused_index)?;

        let index = (focused_index + usize::from(insert_after)).min(self.children.len());
        let mut children = self.children.clone();
        children.insert(index, new_node);

        let mut weights = self.weights.clone();
        if self.equal_weight || weights.is_empty() {
            weights.push_back(1.0);
        } else {
            let last = weights.len() - 1;
            let half = weights[last] / 2.0;
            weights.set(last, half);
            weights.push_back(half);
        }

        Some(Self::from_parts(self.equal_weight, self.is_horizontal, children, weights))
    }

    /// Drops the child at `index`. Without equal weights its weight goes to
    /// the last remaining child.
    pub fn remove(&self, index: usize) -> Option<SplitNode> {
        trace!(index, "Removing node from split");
        self.check_index(index)?;

        let mut children = self.children.clone();
        children.remove(index);

        let mut weights = self.weights.clone();
        let donated = weights.remove(index);
        if !self.equal_weight && !weights.is_empty() {
            let last = weights.len() - 1;
            weights.set(last, weights[last] + donated);
        }

        Some(Self::from_parts(self.equal_weight, self.is_horizontal, children, weights))
    }

    pub fn replace(&self, index: usize, new_node: Node) -> Option<SplitNode> {
        self.check_index(index)?;

        let mut children = self.children.clone();
        children.set(index, new_node);
        Some(Self::from_parts(self.equal_weight, self.is_horizontal, children, self.weights.clone()))
    }

    pub fn swap(&self, a: usize, b: usize) -> Option<SplitNode> {
        self.check_index(a)?;
        self.check_index(b)?;

        let mut children = self.children.clone();
        children.swap(a, b);
        Some(Self::from_parts(self.equal_weight, self.is_horizontal, children, self.weights.clone()))
    }

    /// Changes the weight of one child by `delta`, leaving the others alone.
    /// The node stops using equal weights.
    pub fn adjust_child_weight(&self, index: usize, delta: f64) -> Option<SplitNode> {
        self.check_index(index)?;

        let mut weights = if self.equal_weight { self.distributed_weights() } else { self.weights.clone() };
        weights.set(index, weights[index] + delta);
        Some(Self::from_parts(false, self.is_horizontal, self.children.clone(), weights))
    }

    pub fn toggle_equal_weight(&self) -> SplitNode {
        trace!(equal_weight = !self.equal_weight, "Toggling equal weight");
        Self::from_parts(
            !self.equal_weight,
            self.is_horizontal,
            self.children.clone(),
            self.distributed_weights(),
        )
    }

    fn distributed_weights(&self) -> Vector<f64> {
        let weight = 1.0 / self.children.len() as f64;
        std::iter::repeat_n(weight, self.children.len()).collect()
    }

    pub fn index_of(&self, node: &Node) -> Option<usize> {
        self.children.iter().position(|child| child.same_as(node))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::model::window::testing::window;

    fn leaf(id: u64) -> Node { Node::Leaf(LeafNode::Window(window(id))) }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn new_respects_direction() {
        let split = SplitNode::new(leaf(1), leaf(2), Direction::LEFT);
        assert!(split.is_horizontal());
        assert!(split.equal_weight());
        assert!(split.children()[0].same_as(&leaf(2)));

        let split = SplitNode::new(leaf(1), leaf(2), Direction::DOWN);
        assert!(!split.is_horizontal());
        assert!(split.children()[0].same_as(&leaf(1)));
    }

    #[test]
    fn add_to_equal_weight_split() {
        let split = SplitNode::new(leaf(1), leaf(2), Direction::RIGHT);
        let split = split.add(0, leaf(3), true).unwrap();
        assert_eq!(split.len(), 3);
        assert!(split.children()[1].same_as(&leaf(3)));
        assert_close(split.weight(2), 1.0 / 3.0);
        assert_close(split.preceding_weight(2), 2.0 / 3.0);
    }

    #[test]
    fn add_halves_last_weight() {
        let split = SplitNode::new(leaf(1), leaf(2), Direction::RIGHT)
            .adjust_child_weight(0, 0.1)
            .unwrap();
        let split = split.add(1, leaf(3), false).unwrap();
        assert!(split.children()[1].same_as(&leaf(3)));
        assert_close(split.weights()[0], 0.6);
        assert_close(split.weights()[1], 0.25);
        assert_close(split.weights()[2], 0.25);
    }

    #[test]
    fn remove_donates_weight_to_last_child() {
        let split = SplitNode::new(leaf(1), leaf(2), Direction::RIGHT)
            .add(1, leaf(3), true)
            .unwrap()
            .adjust_child_weight(0, 0.1)
            .unwrap();
        let total: f64 = split.weights().iter().sum();

        let removed = split.remove(0).unwrap();
        assert_eq!(removed.len(), 2);
        assert_close(removed.weights().iter().sum(), total);
        assert_close(removed.weights()[1], 1.0 / 3.0 + 1.0 / 3.0 + 0.1);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let split = SplitNode::new(leaf(1), leaf(2), Direction::RIGHT);
        assert!(split.remove(2).is_none());
        assert!(split.replace(5, leaf(3)).is_none());
        assert!(split.swap(0, 2).is_none());
        assert!(split.adjust_child_weight(2, 0.1).is_none());
        assert!(split.add(2, leaf(3), true).is_none());
    }

    #[test]
    fn adjust_and_toggle_weights() {
        let split = SplitNode::new(leaf(1), leaf(2), Direction::RIGHT);
        let adjusted = split.adjust_child_weight(0, 0.2).unwrap();
        assert!(!adjusted.equal_weight());
        assert_close(adjusted.weight(0), 0.7);
        assert_close(adjusted.weight(1), 0.5);

        let toggled = adjusted.toggle_equal_weight();
        assert!(toggled.equal_weight());
        assert_close(toggled.weights()[0], 0.5);
        assert!(!toggled.toggle_equal_weight().equal_weight());
    }

    #[test]
    fn swap_exchanges_children() {
        let split = SplitNode::new(leaf(1), leaf(2), Direction::RIGHT).swap(0, 1).unwrap();
        assert!(split.children()[0].same_as(&leaf(2)));
        assert_eq!(split.index_of(&leaf(1)), Some(1));
    }
}
