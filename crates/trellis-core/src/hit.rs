//! Hit testing: canvas point/rectangle → item lookup.
//!
//! Items are given in draw order (first painted = bottom), so point hits
//! walk them in reverse to find the topmost one.

use crate::id::ItemId;
use crate::selectable::Selectable;
use kurbo::{Point, Rect};

/// Find the topmost item containing `point` (canvas space).
/// Returns `None` if nothing is hit (background).
pub fn hit_test<'a, I>(items: I, point: Point) -> Option<ItemId>
where
    I: IntoIterator<Item = &'a dyn Selectable>,
    I::IntoIter: DoubleEndedIterator,
{
    items
        .into_iter()
        .rev()
        .find(|item| contains(item.bounds(), point))
        .map(|item| item.id())
}

/// Find all items touched by `area` (canvas space).
/// Used for fence (rubber-band) selection.
pub fn hit_test_rect<'a>(
    items: impl IntoIterator<Item = &'a dyn Selectable>,
    area: Rect,
) -> Vec<ItemId> {
    let area = area.abs();
    items
        .into_iter()
        .filter(|item| touches(item.bounds(), area))
        .map(|item| item.id())
        .collect()
}

fn contains(bounds: Rect, p: Point) -> bool {
    p.x >= bounds.x0 && p.x <= bounds.x1 && p.y >= bounds.y0 && p.y <= bounds.y1
}

/// AABB overlap; point-like items count when their position is inside.
pub fn touches(bounds: Rect, area: Rect) -> bool {
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return contains(area, bounds.origin());
    }
    bounds.x0 < area.x1 && bounds.x1 > area.x0 && bounds.y0 < area.y1 && bounds.y1 > area.y0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectable::ItemKind;
    use kurbo::Size;
    use std::any::Any;

    struct Block {
        id: ItemId,
        bounds: Rect,
    }

    impl Selectable for Block {
        fn id(&self) -> ItemId {
            self.id
        }
        fn kind(&self) -> ItemKind {
            ItemKind::Node
        }
        fn position(&self) -> Point {
            self.bounds.origin()
        }
        fn set_position(&mut self, position: Point) {
            self.bounds = self.bounds.with_origin(position);
        }
        fn size(&self) -> Size {
            self.bounds.size()
        }
        fn is_selected(&self) -> bool {
            false
        }
        fn set_selected(&mut self, _selected: bool) {}
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn blocks() -> Vec<Block> {
        vec![
            Block {
                id: ItemId::intern("bottom"),
                bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
            },
            Block {
                id: ItemId::intern("top"),
                bounds: Rect::new(50.0, 50.0, 150.0, 150.0),
            },
            Block {
                id: ItemId::intern("dot"),
                bounds: Rect::from_origin_size((300.0, 300.0), Size::ZERO),
            },
        ]
    }

    #[test]
    fn topmost_item_wins() {
        let items = blocks();
        let refs: Vec<&dyn Selectable> = items.iter().map(|b| b as &dyn Selectable).collect();
        assert_eq!(
            hit_test(refs.iter().copied(), Point::new(75.0, 75.0)),
            Some(ItemId::intern("top"))
        );
        assert_eq!(
            hit_test(refs.iter().copied(), Point::new(10.0, 10.0)),
            Some(ItemId::intern("bottom"))
        );
        assert_eq!(hit_test(refs.iter().copied(), Point::new(500.0, 10.0)), None);
    }

    #[test]
    fn rect_collects_overlaps_and_points() {
        let items = blocks();
        let refs: Vec<&dyn Selectable> = items.iter().map(|b| b as &dyn Selectable).collect();

        // Dragged from bottom-right to top-left: normalized internally.
        let hits = hit_test_rect(refs.iter().copied(), Rect::new(320.0, 320.0, 120.0, 120.0));
        assert_eq!(hits, vec![ItemId::intern("top"), ItemId::intern("dot")]);

        let hits = hit_test_rect(refs.iter().copied(), Rect::new(200.0, 0.0, 250.0, 50.0));
        assert!(hits.is_empty());
    }
}
