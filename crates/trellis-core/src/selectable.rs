//! The capability every visual item must provide to take part in selection,
//! dragging and snapping.
//!
//! Graph nodes, composition pins and keyframe markers implement this trait
//! independently. Keyframes use only the x axis of their position (time).

use crate::id::ItemId;
use kurbo::{Point, Rect, Size};
use std::any::Any;

/// What kind of visual item a `Selectable` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Node,
    InputPin,
    OutputPin,
    Keyframe,
}

/// An item that can be selected and moved on a canvas.
pub trait Selectable {
    fn id(&self) -> ItemId;

    fn kind(&self) -> ItemKind;

    /// Top-left corner in canvas space.
    fn position(&self) -> Point;

    fn set_position(&mut self, position: Point);

    /// Extent in canvas space. Zero for point-like items.
    fn size(&self) -> Size;

    fn is_selected(&self) -> bool;

    fn set_selected(&mut self, selected: bool);

    /// Access to the concrete type, for capability-filtered selection views.
    fn as_any(&self) -> &dyn Any;

    /// Canvas-space bounds (`position` + `size`).
    fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position(), self.size())
    }
}

/// Bounding box of a set of items, or `None` if the set is empty.
pub fn union_bounds<'a>(items: impl IntoIterator<Item = &'a dyn Selectable>) -> Option<Rect> {
    items
        .into_iter()
        .map(|item| item.bounds())
        .reduce(|acc, b| acc.union(b))
}
