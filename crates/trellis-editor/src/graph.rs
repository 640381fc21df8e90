//! Node graph editing: nested compositions of nodes and pins, navigation
//! between them, node dragging with neighbor snapping and fence selection.

use crate::commands::{CanvasPosition, ChangeSelectableCommand, CommandTarget, History};
use crate::drag::{DragOutcome, DragSession};
use crate::error::EditorError;
use crate::frame::FrameContext;
use crate::input::{EditorAction, FrameInput, PointerButton};
use crate::selection::{SelectMode, SelectableScope, SelectionRegistry};
use std::any::Any;
use std::collections::HashMap;
use trellis_core::{
    CanvasTransform, CompositionId, InteractionConfig, ItemId, ItemKind, NodeSnapSlots, Point,
    PointSnap, Rect, Selectable, Size, Transition, Vec2, ViewProperties, hit_test, snap_to_neighbors,
    union_bounds,
};

// ─── Document ────────────────────────────────────────────────────────────

/// A node placed in a composition. A node whose id is also a composition
/// id represents that nested composition.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeItem {
    pub id: ItemId,
    pub position: Point,
    pub size: Size,
    pub selected: bool,
}

impl NodeItem {
    pub fn new(id: ItemId, position: Point, size: Size) -> Self {
        Self {
            id,
            position,
            size,
            selected: false,
        }
    }
}

impl Selectable for NodeItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn kind(&self) -> ItemKind {
        ItemKind::Node
    }

    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn size(&self) -> Size {
        self.size
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

/// An input or output of a composition, drawn at the canvas edges.
#[derive(Debug, Clone, PartialEq)]
pub struct PinItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub position: Point,
    pub size: Size,
    pub selected: bool,
}

impl PinItem {
    pub fn input(id: ItemId, position: Point, size: Size) -> Self {
        Self {
            id,
            kind: ItemKind::InputPin,
            position,
            size,
            selected: false,
        }
    }

    pub fn output(id: ItemId, position: Point, size: Size) -> Self {
        Self {
            kind: ItemKind::OutputPin,
            ..Self::input(id, position, size)
        }
    }
}

impl Selectable for PinItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn kind(&self) -> ItemKind {
        self.kind
    }

    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn size(&self) -> Size {
        self.size
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

#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub id: CompositionId,
    pub parent: Option<CompositionId>,
    pub nodes: Vec<NodeItem>,
    pub inputs: Vec<PinItem>,
    pub outputs: Vec<PinItem>,
}

impl Composition {
    pub fn new(id: CompositionId, parent: Option<CompositionId>) -> Self {
        Self {
            id,
            parent,
            nodes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn node(&self, id: ItemId) -> Option<&NodeItem> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: ItemId) -> Option<&mut NodeItem> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn remove_node(&mut self, id: ItemId) -> Option<NodeItem> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        Some(self.nodes.remove(index))
    }

    /// Bounds of every node and pin.
    pub fn content_bounds(&self) -> Option<Rect> {
        union_bounds(self.items())
    }
}

impl SelectableScope for Composition {
    fn item(&self, id: ItemId) -> Option<&dyn Selectable> {
        if let Some(node) = self.node(id) {
            return Some(node);
        }
        self.inputs
            .iter()
            .chain(&self.outputs)
            .find(|p| p.id == id)
            .map(|p| p as &dyn Selectable)
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut dyn Selectable> {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
            return Some(node);
        }
        self.inputs
            .iter_mut()
            .chain(&mut self.outputs)
            .find(|p| p.id == id)
            .map(|p| p as &mut dyn Selectable)
    }

    fn items(&self) -> Vec<&dyn Selectable> {
        self.nodes
            .iter()
            .map(|n| n as &dyn Selectable)
            .chain(self.inputs.iter().map(|p| p as &dyn Selectable))
            .chain(self.outputs.iter().map(|p| p as &dyn Selectable))
            .collect()
    }
}

/// A tree of compositions rooted at `root`.
#[derive(Debug, Clone)]
pub struct GraphDocument {
    root: CompositionId,
    compositions: HashMap<CompositionId, Composition>,
}

impl GraphDocument {
    pub fn new(root: CompositionId) -> Self {
        let mut compositions = HashMap::new();
        compositions.insert(root, Composition::new(root, None));
        Self { root, compositions }
    }

    pub fn root(&self) -> CompositionId {
        self.root
    }

    pub fn composition(&self, id: CompositionId) -> Option<&Composition> {
        self.compositions.get(&id)
    }

    pub fn composition_mut(&mut self, id: CompositionId) -> Option<&mut Composition> {
        self.compositions.get_mut(&id)
    }

    pub fn add_node(&mut self, composition: CompositionId, node: NodeItem) -> Result<(), EditorError> {
        self.composition_mut(composition)
            .ok_or(EditorError::UnknownComposition(composition))?
            .nodes
            .push(node);
        Ok(())
    }

    /// Add `node` to `parent` and open a nested composition behind it.
    pub fn add_child_composition(
        &mut self,
        parent: CompositionId,
        node: NodeItem,
    ) -> Result<CompositionId, EditorError> {
        let id = node.id;
        self.add_node(parent, node)?;
        self.compositions.insert(id, Composition::new(id, Some(parent)));
        Ok(id)
    }

    /// Remove a composition, its descendants and the node representing it.
    pub fn remove_composition(&mut self, id: CompositionId) -> Option<Composition> {
        let removed = self.compositions.remove(&id)?;
        if let Some(parent) = removed.parent.and_then(|p| self.compositions.get_mut(&p)) {
            parent.remove_node(id);
        }
        let children: Vec<CompositionId> = self
            .compositions
            .values()
            .filter(|c| c.parent == Some(id))
            .map(|c| c.id)
            .collect();
        for child in children {
            self.remove_composition(child);
        }
        Some(removed)
    }

    /// Remove nodes from a composition, together with the compositions
    /// they represent.
    pub fn remove_nodes(&mut self, composition: CompositionId, ids: &[ItemId]) -> usize {
        let mut removed = 0;
        for &id in ids {
            let is_child = self
                .compositions
                .get(&id)
                .is_some_and(|c| c.parent == Some(composition));
            if is_child {
                self.remove_composition(id);
                removed += 1;
            } else if let Some(c) = self.composition_mut(composition) {
                removed += usize::from(c.remove_node(id).is_some());
            }
        }
        removed
    }

    /// Check that `path` starts anywhere and descends one child at a time.
    pub fn validate_path(&self, path: &[CompositionId]) -> Result<(), EditorError> {
        let first = *path.first().ok_or(EditorError::EmptyPath)?;
        if !self.compositions.contains_key(&first) {
            return Err(EditorError::UnknownComposition(first));
        }
        for pair in path.windows(2) {
            let child = self
                .composition(pair[1])
                .ok_or(EditorError::UnknownComposition(pair[1]))?;
            if child.parent != Some(pair[0]) {
                return Err(EditorError::NotAChild {
                    child: pair[1],
                    composition: pair[0],
                });
            }
        }
        Ok(())
    }
}

impl CommandTarget for GraphDocument {
    fn scope(&self, context: CompositionId) -> Option<&dyn SelectableScope> {
        self.composition(context).map(|c| c as &dyn SelectableScope)
    }

    fn scope_mut(&mut self, context: CompositionId) -> Option<&mut dyn SelectableScope> {
        self.composition_mut(context)
            .map(|c| c as &mut dyn SelectableScope)
    }
}

// ─── Node dragging ───────────────────────────────────────────────────────

/// Click selection and dragging for one item under the pointer.
#[derive(Debug, Clone)]
pub struct NodeDragHandler {
    session: DragSession,
    slots: NodeSnapSlots,
    last_snap: Option<PointSnap>,
    /// Where the grabbed item would be. It is not moved itself when a
    /// modifier press took it out of the selection.
    grab_position: Option<Point>,
}

impl NodeDragHandler {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            session: DragSession::new(),
            slots: NodeSnapSlots::new(config.default_node_size, config.snap_padding),
            last_snap: None,
            grab_position: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_dragging()
    }

    /// The snap applied in the latest drag frame, for drawing a guide.
    pub fn last_snap(&self) -> Option<PointSnap> {
        self.last_snap
    }

    /// One frame of interaction with `item`, which was pressed earlier.
    pub fn update(
        &mut self,
        cx: &mut FrameContext<'_>,
        doc: &mut GraphDocument,
        history: &mut History<GraphDocument>,
        context: CompositionId,
        item: ItemId,
    ) -> Result<(), EditorError> {
        let input = cx.input;
        if input.primary.clicked {
            if let Some(composition) = doc.composition_mut(context) {
                cx.selection.handle_click(composition, item, input.modifiers);
            }
        }

        if !self.session.is_dragging()
            && input.is_dragging(PointerButton::Primary, cx.config.drag_threshold_px)
        {
            self.start(cx, doc, history, context, item)?;
        }

        if self.session.is_dragging() && input.primary.down {
            self.drag(cx, doc, context, item);
        }

        if input.primary.released {
            if self.session.finish(history, doc) == DragOutcome::Committed {
                log::debug!("moved {} nodes", cx.selection.len());
            }
            self.last_snap = None;
            self.grab_position = None;
        }
        Ok(())
    }

    fn start(
        &mut self,
        cx: &mut FrameContext<'_>,
        doc: &mut GraphDocument,
        history: &mut History<GraphDocument>,
        context: CompositionId,
        item: ItemId,
    ) -> Result<(), EditorError> {
        let Some(composition) = doc.composition(context) else {
            return Ok(());
        };
        let Some(anchor) = composition.item(item).map(|i| i.position()) else {
            return Ok(());
        };

        let command = ChangeSelectableCommand::<CanvasPosition>::new(
            "Move nodes",
            context,
            &*composition,
            cx.selection.selected_ids().iter().copied(),
        );
        let press = cx.input.pointer - cx.input.primary.drag_delta;
        let start_delta = press - cx.canvas.transform_position(anchor);
        self.session.start(history, command, item, start_delta)?;
        self.grab_position = Some(anchor);
        Ok(())
    }

    fn drag(
        &mut self,
        cx: &mut FrameContext<'_>,
        doc: &mut GraphDocument,
        context: CompositionId,
        item: ItemId,
    ) {
        let (Some(start_delta), Some(anchor)) = (self.session.start_delta(), self.grab_position)
        else {
            return;
        };
        let Some(composition) = doc.composition_mut(context) else {
            return;
        };

        let mut target = cx
            .canvas
            .inverse_transform_position(cx.input.pointer - start_delta);
        let neighbors: Vec<Rect> = composition
            .items()
            .into_iter()
            .filter(|i| !i.is_selected() && i.id() != item)
            .map(|i| i.bounds())
            .collect();
        let threshold = cx.screen_distance_on_canvas(cx.config.node_snap_distance_px);
        self.last_snap = snap_to_neighbors(target, &neighbors, &self.slots, threshold);
        if let Some(snap) = self.last_snap {
            target = snap.position;
        }

        let delta = target - anchor;
        if delta == Vec2::ZERO {
            return;
        }
        self.grab_position = Some(target);
        for id in cx.selection.selected_ids() {
            if let Some(selected) = composition.item_mut(*id) {
                let position = selected.position();
                selected.set_position(position + delta);
            }
        }
    }
}

// ─── Fence selection ─────────────────────────────────────────────────────

/// Progress of a rubber-band drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FenceState {
    Inactive,
    /// Pointer still down; the screen rectangle to draw.
    Updated(Rect),
    /// Released this frame over a non-empty screen rectangle.
    Completed(Rect),
    /// Released without moving: a click on the background.
    Clicked,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionFence {
    start: Option<Point>,
}

impl SelectionFence {
    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }

    pub fn reset(&mut self) {
        self.start = None;
    }

    /// Track the gesture geometry only.
    pub fn track(&mut self, input: &FrameInput) -> FenceState {
        if input.primary.clicked && input.hovered {
            self.start = Some(input.pointer - input.primary.drag_delta);
        }
        let Some(start) = self.start else {
            return FenceState::Inactive;
        };
        let rect = Rect::from_points(start, input.pointer);
        if input.primary.released || !input.primary.down {
            self.start = None;
            if rect.width() == 0.0 && rect.height() == 0.0 {
                return FenceState::Clicked;
            }
            return FenceState::Completed(rect);
        }
        FenceState::Updated(rect)
    }

    /// Track the gesture and apply it to `scope` on release.
    pub fn update<S: SelectableScope + ?Sized>(
        &mut self,
        cx: &mut FrameContext<'_>,
        scope: &mut S,
    ) -> FenceState {
        let state = self.track(cx.input);
        match state {
            FenceState::Completed(rect) => {
                let mode = SelectMode::from_modifiers(cx.input.modifiers);
                cx.selection
                    .update_selection_for_area(scope, cx.canvas, rect, mode);
            }
            FenceState::Clicked if !cx.input.modifiers.shift => cx.selection.clear(scope),
            _ => {}
        }
        state
    }
}

// ─── Canvas ──────────────────────────────────────────────────────────────

/// The interactive view of one composition of a `GraphDocument`.
#[derive(Debug)]
pub struct GraphCanvas {
    canvas: CanvasTransform,
    selection: SelectionRegistry,
    /// Root → current composition.
    path: Vec<CompositionId>,
    view_settings: HashMap<CompositionId, ViewProperties>,
    node_drag: NodeDragHandler,
    fence: SelectionFence,
    fence_rect: Option<Rect>,
    active_item: Option<ItemId>,
    config: InteractionConfig,
}

impl GraphCanvas {
    /// A canvas showing the root composition of `doc`.
    pub fn new(doc: &GraphDocument, config: InteractionConfig) -> Self {
        Self {
            canvas: CanvasTransform::new(&config),
            selection: SelectionRegistry::new(),
            path: vec![doc.root()],
            view_settings: HashMap::new(),
            node_drag: NodeDragHandler::new(&config),
            fence: SelectionFence::default(),
            fence_rect: None,
            active_item: None,
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

    pub fn path(&self) -> &[CompositionId] {
        &self.path
    }

    pub fn current_composition(&self) -> CompositionId {
        // `path` is never empty
        self.path[self.path.len() - 1]
    }

    /// Compositions above the current one, root first.
    pub fn parents(&self) -> &[CompositionId] {
        &self.path[..self.path.len() - 1]
    }

    pub fn is_dragging(&self) -> bool {
        self.node_drag.is_dragging()
    }

    pub fn last_snap(&self) -> Option<PointSnap> {
        self.node_drag.last_snap()
    }

    /// The fence rectangle to draw, in screen space.
    pub fn fence_rect(&self) -> Option<Rect> {
        self.fence_rect
    }

    /// The view remembered for `composition`, if it was ever left.
    pub fn remembered_view(&self, composition: CompositionId) -> Option<ViewProperties> {
        self.view_settings.get(&composition).copied()
    }

    // ─── Navigation ──────────────────────────────────────────────────────

    /// Show the composition at the end of `path`.
    pub fn set_composition(
        &mut self,
        doc: &mut GraphDocument,
        history: &mut History<GraphDocument>,
        path: Vec<CompositionId>,
        transition: Transition,
    ) -> Result<(), EditorError> {
        doc.validate_path(&path)?;

        if self.node_drag.is_dragging() {
            self.node_drag.session.finish(history, doc);
            self.node_drag.grab_position = None;
        }
        self.active_item = None;
        self.fence.reset();
        self.fence_rect = None;

        let previous = std::mem::replace(&mut self.path, path);
        let old = previous[previous.len() - 1];
        self.view_settings.insert(old, self.canvas.view_properties());
        match doc.composition_mut(old) {
            Some(composition) => self.selection.clear(composition),
            None => self.selection.forget(),
        }

        let anchor = self
            .transition_anchor(doc, &previous)
            .unwrap_or_else(|| self.canvas.viewport_center());
        let current = self.current_composition();
        let view = match self.view_settings.get(&current) {
            Some(view) => *view,
            None => self.guess_view(doc),
        };
        log::debug!("composition {old} -> {current} ({transition:?})");
        self.canvas
            .set_area_with_transition(view.scale, view.scroll, anchor, transition);
        Ok(())
    }

    /// Screen position of the node linking the previous and the new
    /// composition, under the view being left.
    fn transition_anchor(&self, doc: &GraphDocument, previous: &[CompositionId]) -> Option<Point> {
        let (outer, inner) = if self.path.len() > previous.len() {
            (previous, &self.path[..])
        } else {
            (&self.path[..], previous)
        };
        if inner.len() <= outer.len() || !inner.starts_with(outer) {
            return None;
        }
        let node = doc
            .composition(outer[outer.len() - 1])?
            .node(inner[outer.len()])?;
        Some(self.canvas.transform_position(node.bounds().center()))
    }

    /// Fit all items of the current composition with padding.
    fn guess_view(&self, doc: &GraphDocument) -> ViewProperties {
        let Some(bounds) = doc
            .composition(self.current_composition())
            .and_then(|c| c.content_bounds())
        else {
            return ViewProperties::default();
        };
        let mut probe = self.canvas.clone();
        probe.set_area_with_transition(
            Vec2::new(1.0, 1.0),
            bounds.center().to_vec2(),
            probe.viewport_center(),
            Transition::Instant,
        );
        let padding = self.config.focus_padding;
        probe.fit_area_on_canvas(bounds.inflate(padding, padding));
        probe.view_properties()
    }

    /// Open the nested composition `child` of the current composition.
    pub fn enter_child(
        &mut self,
        doc: &mut GraphDocument,
        history: &mut History<GraphDocument>,
        child: CompositionId,
    ) -> Result<(), EditorError> {
        let current = self.current_composition();
        let is_child = doc
            .composition(child)
            .is_some_and(|c| c.parent == Some(current));
        if !is_child {
            return Err(EditorError::NotAChild {
                child,
                composition: current,
            });
        }
        let mut path = self.path.clone();
        path.push(child);
        self.set_composition(doc, history, path, Transition::JumpIn)
    }

    /// Return to `ancestor`, selecting the node we came out of.
    pub fn leave_to_parent(
        &mut self,
        doc: &mut GraphDocument,
        history: &mut History<GraphDocument>,
        ancestor: CompositionId,
    ) -> Result<(), EditorError> {
        let current = self.current_composition();
        let Some(index) = self.parents().iter().position(|c| *c == ancestor) else {
            return Err(EditorError::NotAParent {
                ancestor,
                composition: current,
            });
        };
        let came_from = self.path[index + 1];
        let path = self.path[..=index].to_vec();
        self.set_composition(doc, history, path, Transition::JumpOut)?;
        if let Some(composition) = doc.composition_mut(ancestor) {
            self.selection.set_element(composition, came_from);
        }
        Ok(())
    }

    pub fn parent_of_current(&self, doc: &GraphDocument) -> Result<CompositionId, EditorError> {
        let current = self.current_composition();
        doc.composition(current)
            .and_then(|c| c.parent)
            .ok_or(EditorError::NoParent(current))
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn selection_bounds(&self, doc: &GraphDocument) -> Option<Rect> {
        let composition = doc.composition(self.current_composition())?;
        union_bounds(self.selection.selected_items(composition))
    }

    /// Smoothly fit the selection, or everything if nothing is selected.
    pub fn focus_view_to_selection(&mut self, doc: &GraphDocument) {
        let bounds = self.selection_bounds(doc).or_else(|| {
            doc.composition(self.current_composition())
                .and_then(|c| c.content_bounds())
        });
        let Some(bounds) = bounds else {
            log::trace!("nothing to focus");
            return;
        };
        let padding = self.config.focus_padding;
        self.canvas
            .fit_area_with_transition(bounds.inflate(padding, padding), Transition::Smooth);
    }

    // ─── Frame ───────────────────────────────────────────────────────────

    /// Process one frame of input and advance view animations by `dt`.
    pub fn update(
        &mut self,
        doc: &mut GraphDocument,
        history: &mut History<GraphDocument>,
        input: &FrameInput,
        dt: f64,
    ) -> Result<(), EditorError> {
        let context = self.current_composition();

        FrameContext::new(
            &mut self.canvas,
            &mut self.selection,
            input,
            &self.config,
        )
        .update_canvas();
        if let Some(content) = doc.composition(context).and_then(|c| c.content_bounds()) {
            let padding = self.config.focus_padding;
            self.canvas.fit_content(content.inflate(padding, padding));
        }

        self.handle_actions(doc, history, input);

        let Some(composition) = doc.composition(context) else {
            log::warn!("current composition {context} no longer exists");
            self.selection.forget();
            self.canvas.advance(dt);
            return Ok(());
        };

        if input.hovered && input.primary.clicked && self.active_item.is_none() && !self.fence.is_active() {
            let pointer = self.canvas.inverse_transform_position(input.pointer);
            self.active_item = hit_test(composition.items(), pointer);
        }

        match self.active_item {
            Some(item) => {
                self.handle_item_interaction(doc, history, input, item)?;
                if !input.primary.down {
                    self.active_item = None;
                }
            }
            None => self.handle_fence(doc, input),
        }

        self.canvas.advance(dt);
        Ok(())
    }

    /// One frame of click selection and dragging for `item` in the current
    /// composition.
    pub fn handle_item_interaction(
        &mut self,
        doc: &mut GraphDocument,
        history: &mut History<GraphDocument>,
        input: &FrameInput,
        item: ItemId,
    ) -> Result<(), EditorError> {
        let context = self.current_composition();
        let mut cx = FrameContext::new(
            &mut self.canvas,
            &mut self.selection,
            input,
            &self.config,
        );
        self.node_drag.update(&mut cx, doc, history, context, item)
    }

    /// Rubber-band selection while the background is dragged.
    pub fn handle_fence(&mut self, doc: &mut GraphDocument, input: &FrameInput) {
        let context = self.current_composition();
        let Some(composition) = doc.composition_mut(context) else {
            return;
        };
        let mut cx = FrameContext::new(
            &mut self.canvas,
            &mut self.selection,
            input,
            &self.config,
        );
        self.fence_rect = match self.fence.update(&mut cx, composition) {
            FenceState::Updated(rect) => Some(rect),
            _ => None,
        };
    }

    fn handle_actions(
        &mut self,
        doc: &mut GraphDocument,
        history: &mut History<GraphDocument>,
        input: &FrameInput,
    ) {
        let context = self.current_composition();
        for action in &input.triggered {
            match action {
                EditorAction::FocusSelection => self.focus_view_to_selection(doc),
                EditorAction::Undo | EditorAction::Redo if self.node_drag.is_dragging() => {
                    log::debug!("{action:?} ignored while dragging");
                }
                EditorAction::Undo => {
                    history.undo(doc);
                }
                EditorAction::Redo => {
                    history.redo(doc);
                }
                EditorAction::SelectAll => {
                    if let Some(composition) = doc.composition_mut(context) {
                        self.selection.select_all(composition);
                    }
                }
                EditorAction::DeleteSelection => {
                    if self.node_drag.is_dragging() {
                        continue;
                    }
                    let ids = self.selection.selected_ids().to_vec();
                    let removed = doc.remove_nodes(context, &ids);
                    log::debug!("deleted {removed} nodes");
                }
            }
        }
        if let Some(composition) = doc.composition(context) {
            self.selection.retain_existing(composition);
        }
    }
}
