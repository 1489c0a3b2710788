use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::model::Rect;
use crate::model::geometry::round_half_even;

/// A window index paired with its rectangle.
pub type SliceItem = (usize, Rect<i32>);

#[enum_dispatch]
pub trait AreaLayout {
    fn is_row(&self) -> bool;

    /// Places the windows this area is responsible for, out of `window_count`.
    fn layout(&self, rect: Rect<i32>, window_count: usize, items: &mut Vec<SliceItem>);
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[enum_dispatch(AreaLayout)]
pub enum Area {
    Parent(ParentArea),
    Slice(SliceArea),
    Overflow(OverflowArea),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaChild {
    pub weight: f64,
    pub area: Area,
}

/// Splits its rectangle between weighted children, along a row or a column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentArea {
    #[serde(default)]
    pub is_row: bool,
    pub children: Vec<AreaChild>,
}

/// Holds up to `max_children` windows. Slices are filled in ascending `order`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliceArea {
    pub order: usize,
    pub max_children: usize,
    #[serde(default)]
    pub is_row: bool,
    #[serde(skip)]
    start_index: usize,
}

/// Takes every window the slices have no room for.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverflowArea {
    #[serde(default)]
    pub is_row: bool,
    #[serde(skip)]
    start_index: usize,
}

impl ParentArea {
    pub fn new(is_row: bool, children: impl IntoIterator<Item = (f64, Area)>) -> Self {
        Self {
            is_row,
            children: children.into_iter().map(|(weight, area)| AreaChild { weight, area }).collect(),
        }
    }

    /// Drops the areas that would hold no window for `window_count` windows.
    /// Their weight is shared equally by the remaining siblings.
    pub fn prune(&self, window_count: usize) -> ParentArea {
        let mut children = Vec::with_capacity(self.children.len());
        let mut ignored_weight = 0.0;

        for child in &self.children {
            let kept = match &child.area {
                Area::Parent(parent) => {
                    let pruned = parent.prune(window_count);
                    (!pruned.children.is_empty()).then(|| Area::Parent(pruned))
                }
                Area::Slice(slice) => (slice.start_index < window_count && slice.max_children > 0)
                    .then(|| child.area.clone()),
                Area::Overflow(overflow) => {
                    (overflow.start_index < window_count).then(|| child.area.clone())
                }
            };

            match kept {
                Some(area) => children.push(AreaChild { weight: child.weight, area }),
                None => ignored_weight += child.weight,
            }
        }

        if ignored_weight > 0.0 && !children.is_empty() {
            let share = ignored_weight / children.len() as f64;
            for child in &mut children {
                child.weight += share;
            }
        }

        ParentArea { is_row: self.is_row, children }
    }
}

impl AreaLayout for ParentArea {
    fn is_row(&self) -> bool { self.is_row }

    fn layout(&self, rect: Rect<i32>, window_count: usize, items: &mut Vec<SliceItem>) {
        let mut x = rect.x;
        let mut y = rect.y;

        for child in &self.children {
            let mut child_rect = Rect::new(x, y, rect.width, rect.height);
            if self.is_row {
                child_rect.width = round_half_even(f64::from(rect.width) * child.weight);
                x += child_rect.width;
            } else {
                child_rect.height = round_half_even(f64::from(rect.height) * child.weight);
                y += child_rect.height;
            }
            child.area.layout(child_rect, window_count, items);
        }
    }
}

impl SliceArea {
    pub fn new(order: usize, max_children: usize) -> Self {
        Self { order, max_children, is_row: false, start_index: 0 }
    }

    pub fn with_row(mut self, is_row: bool) -> Self {
        self.is_row = is_row;
        self
    }

    pub fn start_index(&self) -> usize { self.start_index }
}

impl AreaLayout for SliceArea {
    fn is_row(&self) -> bool { self.is_row }

    fn layout(&self, rect: Rect<i32>, window_count: usize, items: &mut Vec<SliceItem>) {
        let count = window_count.saturating_sub(self.start_index).min(self.max_children);
        stack_layout(self.is_row, self.start_index, count, rect, items);
    }
}

impl OverflowArea {
    pub fn new(is_row: bool) -> Self { Self { is_row, start_index: 0 } }

    pub fn start_index(&self) -> usize { self.start_index }
}

impl AreaLayout for OverflowArea {
    fn is_row(&self) -> bool { self.is_row }

    fn layout(&self, rect: Rect<i32>, window_count: usize, items: &mut Vec<SliceItem>) {
        let count = window_count.saturating_sub(self.start_index);
        stack_layout(self.is_row, self.start_index, count, rect, items);
    }
}

fn stack_layout(is_row: bool, start: usize, count: usize, rect: Rect<i32>, items: &mut Vec<SliceItem>) {
    let Ok(divisor) = i32::try_from(count) else {
        error!(count, "Too many windows for one area");
        return;
    };
    if divisor == 0 {
        return;
    }

    let mut item = rect;
    if is_row {
        item.width = rect.width / divisor;
    } else {
        item.height = rect.height / divisor;
    }

    for index in start..start + count {
        items.push((index, item));
        if is_row {
            item.x += item.width;
        } else {
            item.y += item.height;
        }
    }
}

/// The index range of one area that directly holds windows. The overflow
/// area has no capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowArea {
    pub start: usize,
    pub capacity: Option<usize>,
}

impl WindowArea {
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && self.capacity.is_none_or(|capacity| index < self.start + capacity)
    }
}

/// A parent area with start indexes assigned.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledArea {
    root: ParentArea,
    window_areas: Vec<WindowArea>,
}

impl CompiledArea {
    /// Assigns start indexes by ascending slice order, with the overflow area
    /// after the last slice. When there is no overflow area the last slice is
    /// turned into one.
    pub fn compile(mut root: ParentArea) -> CompiledArea {
        if root.children.is_empty() {
            error!("Slice layout has no areas, using a single overflow area");
            root = ParentArea::new(true, [(1.0, OverflowArea::new(true).into())]);
        }

        let mut slices = Vec::new();
        let mut overflows = Vec::new();
        collect_paths(&root, &mut Vec::new(), &mut slices, &mut overflows);
        slices.sort_by_key(|(_, order)| *order);

        for extra in overflows.iter().skip(1) {
            error!(path = ?extra, "Found multiple overflow areas, ignoring");
            if let Some(area) = area_at_mut(&mut root, extra) {
                *area = SliceArea::new(0, 0).into();
            }
        }

        let overflow = match overflows.into_iter().next() {
            Some(path) => path,
            None => {
                let Some((path, _)) = slices.pop() else {
                    error!("Slice layout has no slice areas, using a single overflow area");
                    return Self::compile(ParentArea::default());
                };
                error!(?path, "No overflow area found, replacing the last slice");
                if let Some(area) = area_at_mut(&mut root, &path) {
                    *area = OverflowArea::new(area.is_row()).into();
                }
                path
            }
        };

        let mut start = 0;
        let mut window_areas = Vec::with_capacity(slices.len() + 1);
        for (path, _) in &slices {
            if let Some(Area::Slice(slice)) = area_at_mut(&mut root, path) {
                slice.start_index = start;
                window_areas.push(WindowArea { start, capacity: Some(slice.max_children) });
                start += slice.max_children;
            }
        }

        if let Some(Area::Overflow(area)) = area_at_mut(&mut root, &overflow) {
            area.start_index = start;
        }
        window_areas.push(WindowArea { start, capacity: None });

        CompiledArea { root, window_areas }
    }

    pub fn root(&self) -> &ParentArea { &self.root }

    /// The areas holding windows, in fill order. The overflow area is last.
    pub fn window_areas(&self) -> &[WindowArea] { &self.window_areas }

    pub fn area_index_of(&self, window_index: usize) -> Option<usize> {
        self.window_areas.iter().position(|area| area.contains(window_index))
    }

    /// Every window index with its rectangle, ordered by index.
    pub fn layout(&self, rect: Rect<i32>, window_count: usize) -> Vec<SliceItem> {
        if window_count == 0 {
            return Vec::new();
        }

        let mut items = Vec::with_capacity(window_count);
        self.root.prune(window_count).layout(rect, window_count, &mut items);
        items.sort_by_key(|(index, _)| *index);
        items
    }
}

fn collect_paths(
    parent: &ParentArea,
    path: &mut Vec<usize>,
    slices: &mut Vec<(Vec<usize>, usize)>,
    overflows: &mut Vec<Vec<usize>>,
) {
    for (index, child) in parent.children.iter().enumerate() {
        path.push(index);
        match &child.area {
            Area::Parent(parent) => collect_paths(parent, path, slices, overflows),
            Area::Slice(slice) => slices.push((path.clone(), slice.order)),
            Area::Overflow(_) => overflows.push(path.clone()),
        }
        path.pop();
    }
}

fn area_at_mut<'a>(root: &'a mut ParentArea, path: &[usize]) -> Option<&'a mut Area> {
    let (&first, rest) = path.split_first()?;
    let mut area = &mut root.children.get_mut(first)?.area;
    for &index in rest {
        let Area::Parent(parent) = area else {
            return None;
        };
        area = &mut parent.children.get_mut(index)?.area;
    }
    Some(area)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    fn slice(order: usize, max_children: usize) -> Area { SliceArea::new(order, max_children).into() }

    fn overflow() -> Area { OverflowArea::new(false).into() }

    fn starts(compiled: &CompiledArea) -> Vec<(usize, Option<usize>)> {
        compiled.window_areas().iter().map(|a| (a.start, a.capacity)).collect()
    }

    #[test]
    fn start_indexes_follow_order() {
        let root = ParentArea::new(true, [(0.25, slice(1, 2)), (0.5, slice(0, 1)), (0.25, overflow())]);
        let compiled = CompiledArea::compile(root);
        assert_eq!(starts(&compiled), vec![(0, Some(1)), (1, Some(2)), (3, None)]);
        assert_eq!(compiled.area_index_of(0), Some(0));
        assert_eq!(compiled.area_index_of(2), Some(1));
        assert_eq!(compiled.area_index_of(17), Some(2));
    }

    #[test]
    fn missing_overflow_replaces_last_slice() {
        let root = ParentArea::new(true, [(0.5, slice(0, 1)), (0.5, slice(1, 3))]);
        let compiled = CompiledArea::compile(root);
        assert_eq!(starts(&compiled), vec![(0, Some(1)), (1, None)]);
        assert!(matches!(compiled.root().children[1].area, Area::Overflow(_)));
    }

    #[test]
    fn empty_root_becomes_single_overflow() {
        let compiled = CompiledArea::compile(ParentArea::default());
        assert_eq!(starts(&compiled), vec![(0, None)]);

        let items = compiled.layout(Rect::new(0, 0, 300, 100), 3);
        assert_eq!(items[2], (2, Rect::new(200, 0, 100, 100)));
    }

    #[test]
    fn extra_overflow_areas_are_ignored() {
        let root = ParentArea::new(true, [(0.5, overflow()), (0.5, overflow())]);
        let compiled = CompiledArea::compile(root);
        assert_eq!(starts(&compiled), vec![(0, None)]);

        let items = compiled.layout(Rect::new(0, 0, 100, 100), 2);
        assert_eq!(items, vec![(0, Rect::new(0, 0, 100, 50)), (1, Rect::new(0, 50, 100, 50))]);
    }

    #[test]
    fn prune_shares_weight_of_empty_areas() {
        let root = ParentArea::new(true, [(0.25, slice(1, 2)), (0.5, slice(0, 1)), (0.25, overflow())]);
        let compiled = CompiledArea::compile(root);

        let pruned = compiled.root().prune(1);
        assert_eq!(pruned.children.len(), 1);
        assert_eq!(pruned.children[0].weight, 1.0);

        let pruned = compiled.root().prune(2);
        let weights: Vec<_> = pruned.children.iter().map(|c| c.weight).collect();
        assert_eq!(weights, vec![0.375, 0.625]);
    }

    #[test]
    fn nested_parent_layout() {
        let column = ParentArea::new(false, [(0.5, slice(1, 1)), (0.5, overflow())]);
        let root = ParentArea::new(true, [(0.5, slice(0, 1)), (0.5, Area::Parent(column))]);
        let compiled = CompiledArea::compile(root);

        let items = compiled.layout(Rect::new(0, 0, 200, 100), 4);
        assert_eq!(
            items,
            vec![
                (0, Rect::new(0, 0, 100, 100)),
                (1, Rect::new(100, 0, 100, 50)),
                (2, Rect::new(100, 50, 100, 25)),
                (3, Rect::new(100, 75, 100, 25)),
            ]
        );
    }

    #[test]
    fn areas_deserialize_from_toml() {
        let toml = r#"
            is_row = true

            [[children]]
            weight = 0.6
            area = { kind = "slice", order = 0, max_children = 1 }

            [[children]]
            weight = 0.4
            area = { kind = "overflow" }
        "#;
        let root: ParentArea = toml::from_str(toml).unwrap();
        assert!(root.is_row);
        assert_eq!(root.children[0].area, slice(0, 1));
        assert_eq!(root.children[1].area, overflow());
    }
}
