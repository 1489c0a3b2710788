pub mod column;
pub mod context;
pub mod engine;
pub mod floating;
pub mod gaps;
pub(crate) mod graph;
pub mod proxy_floating;
pub mod slice;
pub mod tree;
pub mod utils;

pub use column::ColumnLayoutEngine;
pub use context::{LayoutContext, LayoutContextRef, LayoutSnapshot, SharedLayoutContext};
pub use engine::{
    CreateLeafLayoutEngine, CreateProxyLayoutEngine, LayoutEngine, LayoutEngineCustomAction,
    LayoutEngineIdentity, LayoutEngineRef, LayoutError, ProxyLayoutEngine,
};
pub use floating::FloatingLayoutEngine;
pub use gaps::GapsLayoutEngine;
pub use graph::{CardinalDirection, Direction, Orientation};
pub use proxy_floating::ProxyFloatingLayoutEngine;
pub use slice::{SliceLayoutEngine, WindowInsertionType};
pub use tree::TreeLayoutEngine;
