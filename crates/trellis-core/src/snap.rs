//! Snap resolution.
//!
//! Every candidate gets a force `max(0, threshold - distance)`. The strongest
//! candidate wins; on equal force the first one encountered is kept. The
//! same scoring drives keyframe times (1D) and node placement (2D).

use crate::id::ItemId;
use kurbo::{Point, Rect, Size, Vec2};
use smallvec::SmallVec;

/// Candidates closer than this are treated as the target itself.
pub const SELF_SNAP_EPSILON: f64 = 0.001;

/// Where a snap anchor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapSource {
    Item(ItemId),
    Playhead,
    Guide,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCandidate {
    pub value: f64,
    pub source: SnapSource,
}

impl SnapCandidate {
    pub fn new(value: f64, source: SnapSource) -> Self {
        Self { value, source }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    pub value: f64,
    pub force: f64,
    pub source: SnapSource,
}

/// Find the strongest snap for `target` among `candidates`.
///
/// `threshold` is in the same units as the values (convert screen pixels
/// through the canvas first).
pub fn check_for_snap(
    target: f64,
    candidates: impl IntoIterator<Item = SnapCandidate>,
    threshold: f64,
) -> Option<SnapResult> {
    let mut best: Option<SnapResult> = None;
    for candidate in candidates {
        let distance = (candidate.value - target).abs();
        if !distance.is_finite() || distance < SELF_SNAP_EPSILON {
            continue;
        }
        let force = (threshold - distance).max(0.0);
        if force <= best.map_or(0.0, |b| b.force) {
            continue;
        }
        best = Some(SnapResult {
            value: candidate.value,
            force,
            source: candidate.source,
        });
    }
    best
}

/// Anything that can offer 1D snap targets (keyframes, playhead, guides).
pub trait ValueSnapAttractor {
    fn check_for_snap(&self, target: f64, threshold: f64) -> Option<SnapResult>;
}

impl ValueSnapAttractor for Vec<SnapCandidate> {
    fn check_for_snap(&self, target: f64, threshold: f64) -> Option<SnapResult> {
        check_for_snap(target, self.iter().copied(), threshold)
    }
}

/// Combines several attractors and remembers the last snap for display.
#[derive(Debug, Default)]
pub struct ValueSnapHandler {
    last_snap: Option<SnapResult>,
}

impl ValueSnapHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `value` with the strongest snap across `attractors`.
    /// Returns `true` if the value was snapped.
    pub fn check_for_snapping(
        &mut self,
        value: &mut f64,
        threshold: f64,
        attractors: &[&dyn ValueSnapAttractor],
    ) -> bool {
        let mut best: Option<SnapResult> = None;
        for attractor in attractors {
            let Some(result) = attractor.check_for_snap(*value, threshold) else {
                continue;
            };
            if result.force > best.map_or(0.0, |b| b.force) {
                best = Some(result);
            }
        }

        self.last_snap = best;
        match best {
            Some(result) => {
                log::trace!("snapped {value} -> {} ({:?})", result.value, result.source);
                *value = result.value;
                true
            }
            None => false,
        }
    }

    /// The snap applied by the most recent `check_for_snapping` call.
    pub fn last_snap(&self) -> Option<SnapResult> {
        self.last_snap
    }
}

// ─── 2D neighbor slots ───────────────────────────────────────────────────

/// One place a dragged node may dock relative to a neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapSlot {
    pub offset: Vec2,
    /// Multiple of the neighbor's height added to the offset, so vertical
    /// slots clear the neighbor instead of overlapping it.
    pub height_factor: f64,
}

/// The offset slots used for node placement: right of, left of, below and
/// above a neighbor.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapSlots {
    slots: SmallVec<[SnapSlot; 4]>,
}

impl NodeSnapSlots {
    pub fn new(default_size: Size, padding: Vec2) -> Self {
        let horizontal = default_size.width + padding.x;
        let slots = [
            SnapSlot {
                offset: Vec2::new(horizontal, 0.0),
                height_factor: 0.0,
            },
            SnapSlot {
                offset: Vec2::new(-horizontal, 0.0),
                height_factor: 0.0,
            },
            SnapSlot {
                offset: Vec2::new(0.0, padding.y),
                height_factor: 1.0,
            },
            SnapSlot {
                offset: Vec2::new(0.0, -padding.y),
                height_factor: -1.0,
            },
        ];
        Self {
            slots: SmallVec::from_buf(slots),
        }
    }

    pub fn slots(&self) -> &[SnapSlot] {
        &self.slots
    }

    /// Where `slot` puts a node docked to `neighbor`.
    pub fn slot_position(slot: &SnapSlot, neighbor: Rect) -> Point {
        neighbor.origin() + slot.offset + Vec2::new(0.0, neighbor.height() * slot.height_factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSnap {
    pub position: Point,
    pub force: f64,
}

/// Find the slot position closest to `target` across all `neighbors`.
///
/// Slots are visited in order and neighbors within each slot; a later
/// position must be strictly closer to win. Nothing is returned unless the
/// winner lies within `threshold`.
pub fn snap_to_neighbors(
    target: Point,
    neighbors: &[Rect],
    slots: &NodeSnapSlots,
    threshold: f64,
) -> Option<PointSnap> {
    let mut best: Option<(Point, f64)> = None;
    for slot in slots.slots() {
        for neighbor in neighbors {
            let position = NodeSnapSlots::slot_position(slot, *neighbor);
            let distance = position.distance(target);
            if !(distance < best.map_or(f64::INFINITY, |(_, d)| d)) {
                continue;
            }
            best = Some((position, distance));
        }
    }

    let (position, distance) = best?;
    (distance < threshold).then_some(PointSnap {
        position,
        force: threshold - distance,
    })
}
