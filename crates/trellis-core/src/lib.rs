pub mod canvas;
pub mod config;
pub mod hit;
pub mod id;
pub mod selectable;
pub mod snap;

pub use canvas::{CanvasTransform, Transition, ViewMode, ViewProperties};
pub use config::{ConfigError, InteractionConfig};
pub use hit::{hit_test, hit_test_rect};
pub use id::{CompositionId, ItemId};
pub use selectable::{ItemKind, Selectable, union_bounds};
pub use snap::{
    NodeSnapSlots, PointSnap, SnapCandidate, SnapResult, SnapSource, ValueSnapAttractor,
    ValueSnapHandler, check_for_snap, snap_to_neighbors,
};

// Re-export geometry types so downstream crates share one definition
pub use kurbo::{Point, Rect, Size, Vec2};
