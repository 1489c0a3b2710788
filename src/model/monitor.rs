use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::geometry::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorId(u64);

impl MonitorId {
    pub const fn new(raw: u64) -> Self { Self(raw) }

    pub fn as_u64(self) -> u64 { self.0 }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "monitor-{}", self.0) }
}

/// A display as seen by the core: a working area (bounds minus docks and bars)
/// and a scale factor in percent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Monitor {
    pub id: MonitorId,
    pub name: String,
    pub bounds: Rect<i32>,
    pub working_area: Rect<i32>,
    /// Percent, `100` means unscaled.
    pub scale_factor: i32,
}

impl Monitor {
    pub fn new(id: u64, bounds: Rect<i32>) -> Self {
        Self {
            id: MonitorId::new(id),
            name: format!("Monitor {id}"),
            bounds,
            working_area: bounds,
            scale_factor: 100,
        }
    }

    pub fn with_working_area(mut self, working_area: Rect<i32>) -> Self {
        self.working_area = working_area;
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: i32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Scales a pixel distance by this monitor's scale factor.
    pub fn scale(&self, value: i32) -> i32 { value * self.scale_factor / 100 }
}

impl fmt::Display for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}", self.name, self.id, self.working_area)
    }
}
