//! Dope sheet: keyframes of animated parameters laid out in rows on a
//! time axis, with click/drag editing, snapping and area selection.
//!
//! Only the x axis of the canvas is used (time). Layers are stacked rows of
//! `LAYER_HEIGHT` screen pixels from the top of the viewport.

use crate::commands::{ChangeSelectableCommand, CommandTarget, History, TimePosition};
use crate::drag::{DragOutcome, DragSession};
use crate::error::EditorError;
use crate::frame::FrameContext;
use crate::graph::{FenceState, SelectionFence};
use crate::input::{EditorAction, FrameInput};
use crate::selection::{SelectMode, SelectableScope, SelectionRegistry};
use std::any::Any;
use trellis_core::{
    CanvasTransform, CompositionId, InteractionConfig, ItemId, ItemKind, Point, Rect, Selectable,
    Size, SnapCandidate, SnapResult, SnapSource, Transition, ValueSnapAttractor, ValueSnapHandler,
    Vec2, check_for_snap,
};

/// Keys closer than this are "at the same time".
pub const KEY_TIME_TOLERANCE: f64 = 1.0 / 120.0;

/// Screen height of one layer row.
pub const LAYER_HEIGHT: f64 = 25.0;

/// Screen width of a keyframe's clickable area.
pub const KEYFRAME_HIT_WIDTH: f64 = 10.0;

const PLAYBACK_STOPPED_EPSILON: f64 = 0.001;

// ─── Document ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub id: ItemId,
    pub time: f64,
    pub value: f64,
    pub selected: bool,
}

impl Keyframe {
    pub fn new(id: ItemId, time: f64, value: f64) -> Self {
        Self {
            id,
            time,
            value,
            selected: false,
        }
    }

    /// A key with a freshly generated id.
    pub fn at(time: f64, value: f64) -> Self {
        Self::new(ItemId::fresh("key"), time, value)
    }
}

impl Selectable for Keyframe {
    fn id(&self) -> ItemId {
        self.id
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Keyframe
    }

    fn position(&self) -> Point {
        Point::new(self.time, 0.0)
    }

    fn set_position(&mut self, position: Point) {
        self.time = position.x;
    }

    fn size(&self) -> Size {
        Size::ZERO
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One animated scalar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Curve {
    pub keys: Vec<Keyframe>,
}

impl Curve {
    pub fn new(keys: Vec<Keyframe>) -> Self {
        let mut curve = Self { keys };
        curve.sort();
        curve
    }

    pub fn sort(&mut self) {
        self.keys.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// The first key within `KEY_TIME_TOLERANCE` of `time`.
    pub fn key_near(&self, time: f64) -> Option<&Keyframe> {
        self.keys
            .iter()
            .find(|k| (k.time - time).abs() < KEY_TIME_TOLERANCE)
    }

    /// Linear interpolation between the surrounding keys, held constant
    /// before the first and after the last.
    pub fn sampled_value(&self, time: f64) -> Option<f64> {
        let before = self
            .keys
            .iter()
            .filter(|k| k.time <= time)
            .max_by(|a, b| a.time.total_cmp(&b.time));
        let after = self
            .keys
            .iter()
            .filter(|k| k.time >= time)
            .min_by(|a, b| a.time.total_cmp(&b.time));
        match (before, after) {
            (Some(a), Some(b)) if b.time > a.time => {
                let t = (time - a.time) / (b.time - a.time);
                Some(a.value + (b.value - a.value) * t)
            }
            (Some(k), _) | (None, Some(k)) => Some(k.value),
            (None, None) => None,
        }
    }
}

/// An animated parameter: one row of the dope sheet, one curve per
/// component.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationLayer {
    pub name: String,
    pub curves: Vec<Curve>,
}

impl AnimationLayer {
    pub fn new(name: impl Into<String>, curves: Vec<Curve>) -> Self {
        Self {
            name: name.into(),
            curves,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &Keyframe> {
        self.curves.iter().flat_map(|c| c.keys.iter())
    }

    /// The keys of every curve at `time`, at most one per curve.
    pub fn keys_at(&self, time: f64) -> Vec<ItemId> {
        self.curves
            .iter()
            .filter_map(|c| c.key_near(time))
            .map(|k| k.id)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DopeSheet {
    id: CompositionId,
    pub layers: Vec<AnimationLayer>,
}

impl DopeSheet {
    pub fn new(id: CompositionId) -> Self {
        Self {
            id,
            layers: Vec::new(),
        }
    }

    /// The context id commands on this sheet are recorded under.
    pub fn id(&self) -> CompositionId {
        self.id
    }

    pub fn add_layer(&mut self, layer: AnimationLayer) {
        self.layers.push(layer);
    }

    pub fn keys(&self) -> impl Iterator<Item = &Keyframe> {
        self.layers.iter().flat_map(|l| l.keys())
    }

    fn keys_mut(&mut self) -> impl Iterator<Item = &mut Keyframe> {
        self.layers
            .iter_mut()
            .flat_map(|l| l.curves.iter_mut())
            .flat_map(|c| c.keys.iter_mut())
    }

    pub fn key(&self, id: ItemId) -> Option<&Keyframe> {
        self.keys().find(|k| k.id == id)
    }

    pub fn key_mut(&mut self, id: ItemId) -> Option<&mut Keyframe> {
        self.keys_mut().find(|k| k.id == id)
    }

    /// Index of the layer holding `key`.
    pub fn layer_of(&self, key: ItemId) -> Option<usize> {
        self.layers
            .iter()
            .position(|l| l.keys().any(|k| k.id == key))
    }

    /// Restore time order after keys were moved.
    pub fn sort_curves(&mut self) {
        for curve in self.layers.iter_mut().flat_map(|l| l.curves.iter_mut()) {
            curve.sort();
        }
    }

    pub fn remove_keys(&mut self, ids: &[ItemId]) -> usize {
        let mut removed = 0;
        for curve in self.layers.iter_mut().flat_map(|l| l.curves.iter_mut()) {
            let before = curve.keys.len();
            curve.keys.retain(|k| !ids.contains(&k.id));
            removed += before - curve.keys.len();
        }
        removed
    }

    /// Earliest and latest key times.
    pub fn time_range<'a>(keys: impl IntoIterator<Item = &'a Keyframe>) -> Option<(f64, f64)> {
        keys.into_iter().fold(None, |range, k| match range {
            None => Some((k.time, k.time)),
            Some((min, max)) => Some((f64::min(min, k.time), f64::max(max, k.time))),
        })
    }
}

impl SelectableScope for DopeSheet {
    fn item(&self, id: ItemId) -> Option<&dyn Selectable> {
        self.key(id).map(|k| k as &dyn Selectable)
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut dyn Selectable> {
        self.key_mut(id).map(|k| k as &mut dyn Selectable)
    }

    fn items(&self) -> Vec<&dyn Selectable> {
        self.keys().map(|k| k as &dyn Selectable).collect()
    }
}

impl CommandTarget for DopeSheet {
    fn scope(&self, context: CompositionId) -> Option<&dyn SelectableScope> {
        (context == self.id).then_some(self as &dyn SelectableScope)
    }

    fn scope_mut(&mut self, context: CompositionId) -> Option<&mut dyn SelectableScope> {
        if context != self.id {
            return None;
        }
        Some(self)
    }
}

/// Unselected keys attract dragged ones.
impl ValueSnapAttractor for DopeSheet {
    fn check_for_snap(&self, target: f64, threshold: f64) -> Option<SnapResult> {
        let candidates = self
            .keys()
            .filter(|k| !k.selected)
            .map(|k| SnapCandidate::new(k.time, SnapSource::Item(k.id)));
        check_for_snap(target, candidates, threshold)
    }
}

/// Current time and playback state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Playhead {
    pub time: f64,
    pub playback_speed: f64,
}

impl Playhead {
    pub fn is_playing(&self) -> bool {
        self.playback_speed.abs() >= PLAYBACK_STOPPED_EPSILON
    }
}

impl ValueSnapAttractor for Playhead {
    fn check_for_snap(&self, target: f64, threshold: f64) -> Option<SnapResult> {
        check_for_snap(
            target,
            [SnapCandidate::new(self.time, SnapSource::Playhead)],
            threshold,
        )
    }
}

// ─── Editor ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct DopeSheetEditor {
    canvas: CanvasTransform,
    selection: SelectionRegistry,
    session: DragSession,
    snap: ValueSnapHandler,
    active_key: Option<ItemId>,
    fence: SelectionFence,
    fence_rect: Option<Rect>,
    config: InteractionConfig,
}

impl DopeSheetEditor {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            canvas: CanvasTransform::new(&config),
            selection: SelectionRegistry::new(),
            session: DragSession::new(),
            snap: ValueSnapHandler::new(),
            active_key: None,
            fence: SelectionFence::default(),
            fence_rect: None,
            config,
        }
    }

    pub fn canvas(&self) -> &CanvasTransform {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut CanvasTransform {
        &mut self.canvas
    }

    pub fn set_viewport(&mut self, origin: Point, size: Size) {
        self.canvas.set_viewport(origin, size);
    }

    pub fn selection(&self) -> &SelectionRegistry {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionRegistry {
        &mut self.selection
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_dragging()
    }

    /// The snap applied in the latest drag frame, for drawing a marker.
    pub fn last_snap(&self) -> Option<SnapResult> {
        self.snap.last_snap()
    }

    pub fn fence_rect(&self) -> Option<Rect> {
        self.fence_rect
    }

    /// Screen rectangle of layer row `index`.
    pub fn layer_row(&self, index: usize) -> Rect {
        let viewport = self.canvas.viewport();
        let top = viewport.y0 + index as f64 * LAYER_HEIGHT;
        Rect::new(viewport.x0, top, viewport.x1, top + LAYER_HEIGHT)
    }

    /// The keyframe whose marker is under `screen`.
    pub fn key_at(&self, sheet: &DopeSheet, screen: Point) -> Option<ItemId> {
        let half = KEYFRAME_HIT_WIDTH / 2.0;
        sheet.layers.iter().enumerate().find_map(|(index, layer)| {
            let row = self.layer_row(index);
            if screen.y < row.y0 || screen.y >= row.y1 {
                return None;
            }
            layer
                .keys()
                .find(|k| (self.canvas.transform_x(k.time) - screen.x).abs() <= half)
                .map(|k| k.id)
        })
    }

    /// Apply `mode` to the keys inside a screen rectangle: the rectangle's
    /// x extent is a time range, its y extent picks layer rows.
    pub fn update_selection_for_area(&mut self, sheet: &mut DopeSheet, screen: Rect, mode: SelectMode) {
        let screen = screen.abs();
        let start = self.canvas.inverse_transform_x(screen.x0);
        let end = self.canvas.inverse_transform_x(screen.x1);
        let top = self.canvas.viewport().y0;
        let first_row = (screen.y0 - top) / LAYER_HEIGHT - 1.0;
        let last_row = (screen.y1 - top) / LAYER_HEIGHT;

        let matches: Vec<ItemId> = sheet
            .layers
            .iter()
            .enumerate()
            .filter(|(index, _)| {
                let index = *index as f64;
                index >= first_row && index <= last_row
            })
            .flat_map(|(_, layer)| layer.keys())
            .filter(|k| k.time >= start && k.time <= end)
            .map(|k| k.id)
            .collect();
        log::debug!("key fence {mode:?} over {start:.3}..{end:.3}: {} keys", matches.len());
        self.selection.apply_area_matches(sheet, &matches, mode);
    }

    /// Remove the selected keys. Not recorded in the history.
    pub fn delete_selected_keyframes(&mut self, sheet: &mut DopeSheet) -> usize {
        let ids = self.selection.selected_ids().to_vec();
        let removed = sheet.remove_keys(&ids);
        self.selection.forget();
        log::debug!("deleted {removed} keyframes");
        removed
    }

    /// Smoothly fit the time range of the selected keys, or of all keys.
    pub fn view_all_or_selected(&mut self, sheet: &DopeSheet) {
        let range = if self.selection.is_anything_selected() {
            DopeSheet::time_range(
                self.selection
                    .selected_nodes::<Keyframe, _>(sheet)
                    .into_iter(),
            )
        } else {
            DopeSheet::time_range(sheet.keys())
        };
        let Some((min, max)) = range else {
            log::trace!("no keys to view");
            return;
        };
        let (min, max) = if max - min < 1e-6 {
            (min - 0.5, max + 0.5)
        } else {
            let pad = (max - min) * 0.1;
            (min - pad, max + pad)
        };
        let width = self.canvas.viewport().width();
        if width <= 0.0 {
            return;
        }
        let scale = Vec2::new(width / (max - min), self.canvas.scale_target().y);
        let scroll = Vec2::new((min + max) / 2.0, self.canvas.scroll_target().y);
        let anchor = self.canvas.viewport_center();
        self.canvas
            .set_area_with_transition(scale, scroll, anchor, Transition::Smooth);
    }

    /// Process one frame of input and advance view animations by `dt`.
    pub fn update(
        &mut self,
        sheet: &mut DopeSheet,
        history: &mut History<DopeSheet>,
        playhead: &mut Playhead,
        input: &FrameInput,
        dt: f64,
    ) -> Result<(), EditorError> {
        FrameContext::new(
            &mut self.canvas,
            &mut self.selection,
            input,
            &self.config,
        )
        .update_canvas();

        self.handle_actions(sheet, history, input);

        if input.hovered && input.primary.clicked && self.active_key.is_none() && !self.fence.is_active() {
            self.active_key = self.key_at(sheet, input.pointer);
        }

        match self.active_key {
            Some(key) => {
                self.handle_key(sheet, history, playhead, input, key)?;
                if !input.primary.down {
                    self.active_key = None;
                }
            }
            None => {
                self.fence_rect = None;
                match self.fence.track(input) {
                    FenceState::Updated(rect) => self.fence_rect = Some(rect),
                    FenceState::Completed(rect) => {
                        let mode = SelectMode::from_modifiers(input.modifiers);
                        self.update_selection_for_area(sheet, rect, mode);
                    }
                    FenceState::Clicked if !input.modifiers.shift => self.selection.clear(sheet),
                    _ => {}
                }
            }
        }

        self.canvas.advance(dt);
        Ok(())
    }

    fn handle_actions(
        &mut self,
        sheet: &mut DopeSheet,
        history: &mut History<DopeSheet>,
        input: &FrameInput,
    ) {
        for action in &input.triggered {
            match action {
                EditorAction::FocusSelection => self.view_all_or_selected(sheet),
                _ if self.session.is_dragging() => {
                    log::debug!("{action:?} ignored while dragging");
                }
                EditorAction::Undo => {
                    history.undo(sheet);
                    sheet.sort_curves();
                }
                EditorAction::Redo => {
                    history.redo(sheet);
                    sheet.sort_curves();
                }
                EditorAction::SelectAll => self.selection.select_all(sheet),
                EditorAction::DeleteSelection => {
                    self.delete_selected_keyframes(sheet);
                }
            }
        }
        self.selection.retain_existing(&*sheet);
    }

    /// One frame of interaction with the pressed keyframe `key`.
    fn handle_key(
        &mut self,
        sheet: &mut DopeSheet,
        history: &mut History<DopeSheet>,
        playhead: &mut Playhead,
        input: &FrameInput,
        key: ItemId,
    ) -> Result<(), EditorError> {
        let (Some(layer), Some(key_time)) = (sheet.layer_of(key), sheet.key(key).map(|k| k.time))
        else {
            self.active_key = None;
            return Ok(());
        };

        let held = input.primary.down
            && input.primary.drag_delta.hypot() >= self.config.drag_threshold_px;
        if held {
            if input.modifiers.command() {
                // Deselect the whole column, no dragging.
                if self.selection.is_selected(key) {
                    for id in sheet.layers[layer].keys_at(key_time) {
                        self.selection.remove_element(sheet, id);
                    }
                }
            } else {
                if !self.selection.is_selected(key) {
                    if !input.modifiers.shift {
                        self.selection.clear(sheet);
                    }
                    for id in sheet.layers[layer].keys_at(key_time) {
                        self.selection.add_element(sheet, id);
                    }
                }
                // Keys follow the pointer only once it left the press point.
                if !self.session.is_dragging() && input.primary.drag_delta != Vec2::ZERO {
                    let command = ChangeSelectableCommand::<TimePosition>::new(
                        "Move keyframes",
                        sheet.id(),
                        &*sheet,
                        self.selection.selected_ids().iter().copied(),
                    );
                    self.session.start(history, command, key, Vec2::ZERO)?;
                }
                if self.session.is_dragging() {
                    self.drag_keys(sheet, playhead, input, key_time);
                }
            }
        }

        if input.primary.released {
            let delta = input.primary.drag_delta;
            let just_clicked = delta.hypot2() < 1.0;
            if just_clicked && !playhead.is_playing() {
                if let Some(k) = sheet.key(key) {
                    playhead.time = k.time;
                }
            }
            if self.session.finish(history, sheet) == DragOutcome::Committed {
                log::debug!("moved {} keyframes", self.selection.len());
            }
            sheet.sort_curves();
        }
        Ok(())
    }

    fn drag_keys(&mut self, sheet: &mut DopeSheet, playhead: &Playhead, input: &FrameInput, key_time: f64) {
        let mut time = self.canvas.inverse_transform_x(input.pointer.x);
        let threshold = self
            .canvas
            .inverse_transform_direction(Vec2::new(self.config.keyframe_snap_distance_px, 0.0))
            .x
            .abs();
        self.snap
            .check_for_snapping(&mut time, threshold, &[&*sheet, playhead]);

        let dt = time - key_time;
        if dt == 0.0 {
            return;
        }
        for id in self.selection.selected_ids() {
            if let Some(k) = sheet.key_mut(*id) {
                k.time += dt;
            }
        }
    }
}
