//! Undo/Redo history.
//!
//! Every mutation is wrapped in a reversible `Command`. Commands are pushed
//! to a stack; undo pops and reverts, redo pops the redo stack and executes
//! again.
//!
//! Drag gestures use the three-phase lifecycle: `begin()` captures the
//! "before" values, the caller mutates items live while the pointer moves,
//! and `commit()` captures the "after" values and pushes a single entry
//! (or nothing, when the gesture ended where it started).

use crate::error::{CommandError, EditorError};
use crate::selection::SelectableScope;
use std::fmt;
use std::marker::PhantomData;
use trellis_core::{CompositionId, ItemId, Point, Selectable};

/// A reversible mutation of a document `D`.
pub trait Command<D: ?Sized> {
    fn name(&self) -> &str;

    fn execute(&mut self, doc: &mut D) -> Result<(), CommandError>;

    fn undo(&mut self, doc: &mut D) -> Result<(), CommandError>;

    /// Capture the document's current values as the command's result.
    fn store_current_values(&mut self, doc: &D);

    /// Whether executing would change anything.
    fn has_changes(&self) -> bool;
}

/// A document whose items are grouped into scopes addressed by a context id
/// (compositions in the graph, the sheet itself in the dope sheet).
pub trait CommandTarget {
    fn scope(&self, context: CompositionId) -> Option<&dyn SelectableScope>;

    fn scope_mut(&mut self, context: CompositionId) -> Option<&mut dyn SelectableScope>;
}

// ─── Payloads ────────────────────────────────────────────────────────────

/// The property of a `Selectable` a `ChangeSelectableCommand` records.
pub trait Payload {
    type Value: Copy + PartialEq + fmt::Debug;

    fn capture(item: &dyn Selectable) -> Self::Value;

    fn apply(item: &mut dyn Selectable, value: Self::Value);
}

/// Node placement: the full canvas position.
#[derive(Debug, Clone, Copy)]
pub struct CanvasPosition;

impl Payload for CanvasPosition {
    type Value = Point;

    fn capture(item: &dyn Selectable) -> Point {
        item.position()
    }

    fn apply(item: &mut dyn Selectable, value: Point) {
        item.set_position(value);
    }
}

/// Keyframe time: the x axis only.
#[derive(Debug, Clone, Copy)]
pub struct TimePosition;

impl Payload for TimePosition {
    type Value = f64;

    fn capture(item: &dyn Selectable) -> f64 {
        item.position().x
    }

    fn apply(item: &mut dyn Selectable, value: f64) {
        let y = item.position().y;
        item.set_position(Point::new(value, y));
    }
}

// ─── ChangeSelectableCommand ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct ChangeEntry<V> {
    id: ItemId,
    before: V,
    after: V,
}

/// Records one property of a set of items before and after a change.
pub struct ChangeSelectableCommand<P: Payload> {
    name: String,
    context: CompositionId,
    entries: Vec<ChangeEntry<P::Value>>,
    _payload: PhantomData<fn() -> P>,
}

impl<P: Payload> ChangeSelectableCommand<P> {
    /// Capture the current values of `ids` in `scope`. Items missing from
    /// the scope are skipped.
    pub fn new(
        name: impl Into<String>,
        context: CompositionId,
        scope: &dyn SelectableScope,
        ids: impl IntoIterator<Item = ItemId>,
    ) -> Self {
        let entries = ids
            .into_iter()
            .filter_map(|id| {
                let value = P::capture(scope.item(id)?);
                Some(ChangeEntry {
                    id,
                    before: value,
                    after: value,
                })
            })
            .collect();
        Self {
            name: name.into(),
            context,
            entries,
            _payload: PhantomData,
        }
    }

    pub fn context(&self) -> CompositionId {
        self.context
    }

    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn before(&self, id: ItemId) -> Option<P::Value> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.before)
    }

    pub fn after(&self, id: ItemId) -> Option<P::Value> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.after)
    }

    fn apply<D: CommandTarget + ?Sized>(
        &self,
        doc: &mut D,
        pick: fn(&ChangeEntry<P::Value>) -> P::Value,
    ) -> Result<(), CommandError> {
        let scope = doc
            .scope_mut(self.context)
            .ok_or(CommandError::MissingContext(self.context))?;
        let mut missing = None;
        for entry in &self.entries {
            match scope.item_mut(entry.id) {
                Some(item) => P::apply(item, pick(entry)),
                None => {
                    missing.get_or_insert(entry.id);
                }
            }
        }
        match missing {
            Some(item) => Err(CommandError::MissingItem {
                context: self.context,
                item,
            }),
            None => Ok(()),
        }
    }
}

impl<P: Payload> fmt::Debug for ChangeSelectableCommand<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSelectableCommand")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("entries", &self.entries)
            .finish()
    }
}

impl<P: Payload, D: CommandTarget + ?Sized> Command<D> for ChangeSelectableCommand<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, doc: &mut D) -> Result<(), CommandError> {
        self.apply(doc, |e| e.after)
    }

    fn undo(&mut self, doc: &mut D) -> Result<(), CommandError> {
        self.apply(doc, |e| e.before)
    }

    fn store_current_values(&mut self, doc: &D) {
        let Some(scope) = doc.scope(self.context) else {
            log::debug!("context {} vanished before commit", self.context);
            return;
        };
        for entry in &mut self.entries {
            if let Some(item) = scope.item(entry.id) {
                entry.after = P::capture(item);
            }
        }
    }

    fn has_changes(&self) -> bool {
        self.entries.iter().any(|e| e.before != e.after)
    }
}

// ─── History ─────────────────────────────────────────────────────────────

/// Manages undo/redo stacks and the command in flight during a gesture.
pub struct History<D: ?Sized> {
    undo_stack: Vec<Box<dyn Command<D>>>,
    redo_stack: Vec<Box<dyn Command<D>>>,
    /// Maximum undo depth.
    max_depth: usize,
    in_flight: Option<Box<dyn Command<D>>>,
}

impl<D: ?Sized> Default for History<D> {
    fn default() -> Self {
        Self::new(100)
    }
}

impl<D: ?Sized> History<D> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            in_flight: None,
        }
    }

    /// Push an already-applied command.
    pub fn add(&mut self, command: impl Command<D> + 'static) {
        self.push(Box::new(command));
    }

    /// Execute `command` and push it. A command that fails to execute is
    /// logged and not recorded.
    pub fn add_and_execute(&mut self, mut command: impl Command<D> + 'static, doc: &mut D) -> bool {
        if let Err(err) = command.execute(doc) {
            log::warn!("`{}` failed: {err}", command.name());
            return false;
        }
        self.push(Box::new(command));
        true
    }

    fn push(&mut self, command: Box<dyn Command<D>>) {
        log::debug!("history push `{}`", command.name());
        self.undo_stack.push(command);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }

        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    // ─── Gesture lifecycle ───────────────────────────────────────────────

    /// Start a gesture. `command` must already hold the "before" values.
    pub fn begin(&mut self, command: impl Command<D> + 'static) -> Result<(), EditorError> {
        if let Some(in_flight) = &self.in_flight {
            return Err(EditorError::CommandInFlight {
                in_flight: in_flight.name().to_string(),
                started: command.name().to_string(),
            });
        }
        log::debug!("begin `{}`", command.name());
        self.in_flight = Some(Box::new(command));
        Ok(())
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight_name(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|c| c.name())
    }

    /// Finish the gesture: capture the current values and push the command
    /// if anything changed. Returns whether an entry was pushed.
    pub fn commit(&mut self, doc: &D) -> bool {
        let Some(mut command) = self.in_flight.take() else {
            log::trace!("commit without a command in flight");
            return false;
        };
        command.store_current_values(doc);
        if !command.has_changes() {
            log::debug!("discarding `{}`: nothing changed", command.name());
            return false;
        }
        self.push(command);
        true
    }

    /// Drop the in-flight command without recording it.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(command) => {
                log::debug!("cancel `{}`", command.name());
                true
            }
            None => false,
        }
    }

    // ─── Undo / Redo ─────────────────────────────────────────────────────

    /// Undo the last command. Returns its name.
    pub fn undo(&mut self, doc: &mut D) -> Option<String> {
        if self.in_flight.is_some() {
            log::debug!("undo ignored while a gesture is in flight");
            return None;
        }
        let mut command = self.undo_stack.pop()?;
        if let Err(err) = command.undo(doc) {
            log::warn!("undo `{}`: {err}", command.name());
        }
        let name = command.name().to_string();
        self.redo_stack.push(command);
        Some(name)
    }

    /// Redo the last undone command. Returns its name.
    pub fn redo(&mut self, doc: &mut D) -> Option<String> {
        if self.in_flight.is_some() {
            log::debug!("redo ignored while a gesture is in flight");
            return None;
        }
        let mut command = self.redo_stack.pop()?;
        if let Err(err) = command.execute(doc) {
            log::warn!("redo `{}`: {err}", command.name());
        }
        let name = command.name().to_string();
        self.undo_stack.push(command);
        Some(name)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Name of the command `undo()` would revert.
    pub fn undo_name(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.name())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::collections::HashMap;
    use trellis_core::{ItemKind, Size};

    // ─── Stack semantics ─────────────────────────────────────────────────

    struct Push(i32);

    impl Command<Vec<i32>> for Push {
        fn name(&self) -> &str {
            "push"
        }
        fn execute(&mut self, doc: &mut Vec<i32>) -> Result<(), CommandError> {
            doc.push(self.0);
            Ok(())
        }
        fn undo(&mut self, doc: &mut Vec<i32>) -> Result<(), CommandError> {
            doc.pop();
            Ok(())
        }
        fn store_current_values(&mut self, _doc: &Vec<i32>) {}
        fn has_changes(&self) -> bool {
            true
        }
    }

    #[test]
    fn undo_redo_roundtrip() {
        let mut doc: Vec<i32> = Vec::new();
        let mut history: History<Vec<i32>> = History::new(10);
        history.add_and_execute(Push(1), &mut doc);
        history.add_and_execute(Push(2), &mut doc);
        assert_eq!(doc, vec![1, 2]);

        assert_eq!(history.undo(&mut doc).as_deref(), Some("push"));
        assert_eq!(doc, vec![1]);
        assert!(history.can_redo());

        history.redo(&mut doc);
        assert_eq!(doc, vec![1, 2]);
        assert!(!history.can_redo());
    }

    #[test]
    fn redo_clears_on_new_action() {
        let mut doc: Vec<i32> = Vec::new();
        let mut history: History<Vec<i32>> = History::new(10);
        history.add_and_execute(Push(1), &mut doc);
        history.undo(&mut doc);
        assert!(history.can_redo());

        history.add_and_execute(Push(2), &mut doc);
        assert!(!history.can_redo());
        assert_eq!(doc, vec![2]);
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut doc: Vec<i32> = Vec::new();
        let mut history: History<Vec<i32>> = History::new(3);
        for i in 0..5 {
            history.add_and_execute(Push(i), &mut doc);
        }
        assert_eq!(history.undo_len(), 3);
        while history.undo(&mut doc).is_some() {}
        assert_eq!(doc, vec![0, 1]);
    }

    #[test]
    fn empty_stacks_are_noops() {
        let mut doc = vec![7];
        let mut history: History<Vec<i32>> = History::new(10);
        assert_eq!(history.undo(&mut doc), None);
        assert_eq!(history.redo(&mut doc), None);
        assert_eq!(doc, vec![7]);
        assert!(!history.can_undo() && !history.can_redo());
    }

    #[test]
    fn second_begin_is_rejected() {
        let mut history: History<Vec<i32>> = History::new(10);
        history.begin(Push(1)).unwrap();
        let err = history.begin(Push(2)).unwrap_err();
        assert!(matches!(err, EditorError::CommandInFlight { .. }));
        assert!(history.cancel());
        assert!(history.begin(Push(3)).is_ok());
    }

    // ─── ChangeSelectableCommand ─────────────────────────────────────────

    struct Pin {
        id: ItemId,
        position: Point,
        selected: bool,
    }

    impl Selectable for Pin {
        fn id(&self) -> ItemId {
            self.id
        }
        fn kind(&self) -> ItemKind {
            ItemKind::InputPin
        }
        fn position(&self) -> Point {
            self.position
        }
        fn set_position(&mut self, position: Point) {
            self.position = position;
        }
        fn size(&self) -> Size {
            Size::new(10.0, 10.0)
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

    #[derive(Default)]
    struct Group {
        pins: Vec<Pin>,
    }

    impl SelectableScope for Group {
        fn item(&self, id: ItemId) -> Option<&dyn Selectable> {
            self.pins
                .iter()
                .find(|p| p.id == id)
                .map(|p| p as &dyn Selectable)
        }
        fn item_mut(&mut self, id: ItemId) -> Option<&mut dyn Selectable> {
            self.pins
                .iter_mut()
                .find(|p| p.id == id)
                .map(|p| p as &mut dyn Selectable)
        }
        fn items(&self) -> Vec<&dyn Selectable> {
            self.pins.iter().map(|p| p as &dyn Selectable).collect()
        }
    }

    #[derive(Default)]
    struct Doc {
        groups: HashMap<CompositionId, Group>,
    }

    impl CommandTarget for Doc {
        fn scope(&self, context: CompositionId) -> Option<&dyn SelectableScope> {
            self.groups
                .get(&context)
                .map(|g| g as &dyn SelectableScope)
        }
        fn scope_mut(&mut self, context: CompositionId) -> Option<&mut dyn SelectableScope> {
            self.groups
                .get_mut(&context)
                .map(|g| g as &mut dyn SelectableScope)
        }
    }

    fn doc() -> (Doc, CompositionId, ItemId) {
        let context = CompositionId::intern("cmd_ctx");
        let pin = ItemId::intern("cmd_pin");
        let mut doc = Doc::default();
        doc.groups.insert(
            context,
            Group {
                pins: vec![Pin {
                    id: pin,
                    position: Point::new(10.0, 20.0),
                    selected: false,
                }],
            },
        );
        (doc, context, pin)
    }

    fn move_pin(doc: &mut Doc, context: CompositionId, pin: ItemId, to: Point) {
        let scope = doc.scope_mut(context).unwrap();
        scope.item_mut(pin).unwrap().set_position(to);
    }

    fn pin_position(doc: &Doc, context: CompositionId, pin: ItemId) -> Point {
        doc.scope(context).unwrap().item(pin).unwrap().position()
    }

    #[test]
    fn gesture_commits_single_entry() {
        let (mut doc, context, pin) = doc();
        let mut history: History<Doc> = History::new(10);

        let command = ChangeSelectableCommand::<CanvasPosition>::new(
            "Move",
            context,
            doc.scope(context).unwrap(),
            [pin],
        );
        history.begin(command).unwrap();
        for x in [15.0, 30.0, 45.0] {
            move_pin(&mut doc, context, pin, Point::new(x, 20.0));
        }
        assert!(history.commit(&doc));
        assert_eq!(history.undo_len(), 1);

        history.undo(&mut doc);
        assert_eq!(pin_position(&doc, context, pin), Point::new(10.0, 20.0));
        history.redo(&mut doc);
        assert_eq!(pin_position(&doc, context, pin), Point::new(45.0, 20.0));
    }

    #[test]
    fn unchanged_gesture_is_discarded() {
        let (mut doc, context, pin) = doc();
        let mut history: History<Doc> = History::new(10);
        let command = ChangeSelectableCommand::<CanvasPosition>::new(
            "Move",
            context,
            doc.scope(context).unwrap(),
            [pin],
        );
        history.begin(command).unwrap();
        move_pin(&mut doc, context, pin, Point::new(99.0, 20.0));
        move_pin(&mut doc, context, pin, Point::new(10.0, 20.0));
        assert!(!history.commit(&doc));
        assert!(!history.can_undo());
        assert!(!history.is_in_flight());
    }

    #[test]
    fn time_payload_keeps_y() {
        let (mut doc, context, pin) = doc();
        let mut command = ChangeSelectableCommand::<TimePosition>::new(
            "Move keys",
            context,
            doc.scope(context).unwrap(),
            [pin],
        );
        move_pin(&mut doc, context, pin, Point::new(50.0, 20.0));
        command.store_current_values(&doc);
        assert_eq!(command.after(pin), Some(50.0));

        move_pin(&mut doc, context, pin, Point::new(10.0, 99.0));
        command.execute(&mut doc).unwrap();
        assert_eq!(pin_position(&doc, context, pin), Point::new(50.0, 99.0));
    }

    #[test]
    fn missing_context_still_moves_entry() {
        let (mut doc, context, pin) = doc();
        let mut history: History<Doc> = History::new(10);
        let command = ChangeSelectableCommand::<CanvasPosition>::new(
            "Move",
            context,
            doc.scope(context).unwrap(),
            [pin],
        );
        history.begin(command).unwrap();
        move_pin(&mut doc, context, pin, Point::new(30.0, 20.0));
        history.commit(&doc);

        doc.groups.clear();
        assert_eq!(history.undo(&mut doc).as_deref(), Some("Move"));
        assert!(!history.can_undo());
        assert!(history.can_redo());
    }
}
