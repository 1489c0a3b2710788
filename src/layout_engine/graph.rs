use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

bitflags! {
    /// A direction on screen. Diagonals are combinations of one horizontal and
    /// one vertical flag.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Direction: u8 {
        const LEFT = 1;
        const RIGHT = 1 << 1;
        const UP = 1 << 2;
        const DOWN = 1 << 3;

        const LEFT_UP = Self::LEFT.bits() | Self::UP.bits();
        const LEFT_DOWN = Self::LEFT.bits() | Self::DOWN.bits();
        const RIGHT_UP = Self::RIGHT.bits() | Self::UP.bits();
        const RIGHT_DOWN = Self::RIGHT.bits() | Self::DOWN.bits();
    }
}

impl Direction {
    /// Exactly one of left, right, up or down.
    pub fn is_cardinal(self) -> bool {
        self == Direction::LEFT
            || self == Direction::RIGHT
            || self == Direction::UP
            || self == Direction::DOWN
    }

    pub fn is_horizontal(self) -> bool {
        self.intersects(Direction::LEFT | Direction::RIGHT)
            && !self.intersects(Direction::UP | Direction::DOWN)
    }

    /// Whether a node added in this direction goes after its sibling.
    pub fn insert_after(self) -> bool { self.intersects(Direction::RIGHT | Direction::DOWN) }

    pub fn orientation(self) -> Orientation {
        if self.is_horizontal() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    pub fn opposite(self) -> Direction {
        let mut opposite = Direction::empty();
        if self.contains(Direction::LEFT) {
            opposite |= Direction::RIGHT;
        }
        if self.contains(Direction::RIGHT) {
            opposite |= Direction::LEFT;
        }
        if self.contains(Direction::UP) {
            opposite |= Direction::DOWN;
        }
        if self.contains(Direction::DOWN) {
            opposite |= Direction::UP;
        }
        opposite
    }
}

/// The four directions a window can be added in, as they appear in configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardinalDirection {
    Left,
    #[default]
    Right,
    Up,
    Down,
}

impl From<CardinalDirection> for Direction {
    fn from(direction: CardinalDirection) -> Self {
        match direction {
            CardinalDirection::Left => Direction::LEFT,
            CardinalDirection::Right => Direction::RIGHT,
            CardinalDirection::Up => Direction::UP,
            CardinalDirection::Down => Direction::DOWN,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn cardinal_directions() {
        assert!(Direction::LEFT.is_cardinal());
        assert!(Direction::DOWN.is_cardinal());
        assert!(!Direction::LEFT_UP.is_cardinal());
        assert!(!Direction::empty().is_cardinal());
        assert!(!(Direction::LEFT | Direction::RIGHT).is_cardinal());
    }

    #[test]
    fn insert_after_and_orientation() {
        assert!(Direction::RIGHT.insert_after());
        assert!(Direction::DOWN.insert_after());
        assert!(!Direction::LEFT.insert_after());
        assert!(!Direction::UP.insert_after());

        assert_eq!(Direction::LEFT.orientation(), Orientation::Horizontal);
        assert_eq!(Direction::UP.orientation(), Orientation::Vertical);
        assert!(!Direction::RIGHT_DOWN.is_horizontal());
    }

    #[test]
    fn opposite_flips_each_axis() {
        assert_eq!(Direction::LEFT.opposite(), Direction::RIGHT);
        assert_eq!(Direction::RIGHT_UP.opposite(), Direction::LEFT_DOWN);
    }
}
