//! Selection registry.
//!
//! Holds the IDs of the selected items and keeps each item's
//! `is_selected` flag in sync with set membership: after every operation,
//! an item reports selected if and only if its ID is in the registry.

use crate::input::Modifiers;
use smallvec::SmallVec;
use trellis_core::{CanvasTransform, ItemId, Rect, Selectable, hit_test_rect};

/// The collection of selectable items an editor owns (a composition's
/// nodes and pins, a dope sheet's keyframes).
pub trait SelectableScope {
    fn item(&self, id: ItemId) -> Option<&dyn Selectable>;

    fn item_mut(&mut self, id: ItemId) -> Option<&mut dyn Selectable>;

    /// All items in draw order (bottom first).
    fn items(&self) -> Vec<&dyn Selectable>;
}

/// How an area selection combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    Replace,
    Add,
    Remove,
}

impl SelectMode {
    /// Shift adds, Ctrl/⌘ removes, otherwise replace.
    pub fn from_modifiers(modifiers: Modifiers) -> Self {
        if modifiers.shift {
            SelectMode::Add
        } else if modifiers.command() {
            SelectMode::Remove
        } else {
            SelectMode::Replace
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionRegistry {
    selected: SmallVec<[ItemId; 8]>,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_anything_selected(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected IDs, in the order they were added.
    pub fn selected_ids(&self) -> &[ItemId] {
        &self.selected
    }

    /// Replace the selection with a single item.
    pub fn set_element<S: SelectableScope + ?Sized>(&mut self, scope: &mut S, id: ItemId) {
        self.clear(scope);
        self.add_element(scope, id);
    }

    /// Add an item. Returns `false` if it was already selected or does not
    /// exist in `scope`.
    pub fn add_element<S: SelectableScope + ?Sized>(&mut self, scope: &mut S, id: ItemId) -> bool {
        let Some(item) = scope.item_mut(id) else {
            log::trace!("cannot select missing item {id}");
            return false;
        };
        item.set_selected(true);
        if self.selected.contains(&id) {
            return false;
        }
        self.selected.push(id);
        true
    }

    /// Remove an item. Returns `false` if it was not selected.
    pub fn remove_element<S: SelectableScope + ?Sized>(
        &mut self,
        scope: &mut S,
        id: ItemId,
    ) -> bool {
        if let Some(item) = scope.item_mut(id) {
            item.set_selected(false);
        }
        let Some(index) = self.selected.iter().position(|s| *s == id) else {
            return false;
        };
        self.selected.remove(index);
        true
    }

    pub fn toggle_element<S: SelectableScope + ?Sized>(&mut self, scope: &mut S, id: ItemId) {
        if self.is_selected(id) {
            self.remove_element(scope, id);
        } else {
            self.add_element(scope, id);
        }
    }

    /// Deselect everything. Also clears stray flags on items that were
    /// never registered.
    pub fn clear<S: SelectableScope + ?Sized>(&mut self, scope: &mut S) {
        let flagged: Vec<ItemId> = scope
            .items()
            .into_iter()
            .filter(|item| item.is_selected())
            .map(|item| item.id())
            .collect();
        for id in self.selected.drain(..).chain(flagged) {
            if let Some(item) = scope.item_mut(id) {
                item.set_selected(false);
            }
        }
    }

    /// Forget the selection without touching any item. Used when the scope
    /// the selection belonged to no longer exists.
    pub fn forget(&mut self) {
        self.selected.clear();
    }

    pub fn select_all<S: SelectableScope + ?Sized>(&mut self, scope: &mut S) {
        let ids: Vec<ItemId> = scope.items().into_iter().map(|item| item.id()).collect();
        for id in ids {
            self.add_element(scope, id);
        }
    }

    /// Drop IDs whose items no longer exist in `scope`.
    pub fn retain_existing<S: SelectableScope + ?Sized>(&mut self, scope: &S) {
        self.selected.retain(|id| scope.item(*id).is_some());
    }

    /// Pointer press on an item.
    ///
    /// Plain click on an unselected item replaces the selection, Shift adds
    /// it. Shift or Ctrl on a selected item removes it. A plain click on a
    /// selected item keeps the selection so the whole group can be dragged.
    /// Ctrl on an unselected item leaves the selection alone.
    pub fn handle_click<S: SelectableScope + ?Sized>(
        &mut self,
        scope: &mut S,
        id: ItemId,
        modifiers: Modifiers,
    ) {
        let removing = modifiers.shift || modifiers.command();
        match (self.is_selected(id), removing) {
            (true, true) => {
                self.remove_element(scope, id);
            }
            (true, false) => {}
            (false, _) if modifiers.shift => {
                self.add_element(scope, id);
            }
            (false, _) if modifiers.command() => {}
            (false, _) => self.set_element(scope, id),
        }
    }

    /// Fence selection: apply `mode` to every item touched by `screen_area`.
    pub fn update_selection_for_area<S: SelectableScope + ?Sized>(
        &mut self,
        scope: &mut S,
        canvas: &CanvasTransform,
        screen_area: Rect,
        mode: SelectMode,
    ) {
        let area = canvas.inverse_transform_rect(screen_area);
        let matches = hit_test_rect(scope.items(), area);
        log::debug!("fence {mode:?} over {area:?}: {} items", matches.len());
        self.apply_area_matches(scope, &matches, mode);
    }

    /// Apply `mode` to items a domain matched itself (e.g. by time range).
    pub fn apply_area_matches<S: SelectableScope + ?Sized>(
        &mut self,
        scope: &mut S,
        matches: &[ItemId],
        mode: SelectMode,
    ) {
        if mode == SelectMode::Replace {
            self.clear(scope);
        }
        for &id in matches {
            match mode {
                SelectMode::Replace | SelectMode::Add => {
                    self.add_element(scope, id);
                }
                SelectMode::Remove => {
                    self.remove_element(scope, id);
                }
            }
        }
    }

    /// The selected items, resolved against `scope`.
    pub fn selected_items<'s, S: SelectableScope + ?Sized>(
        &self,
        scope: &'s S,
    ) -> Vec<&'s dyn Selectable> {
        self.selected
            .iter()
            .filter_map(|id| scope.item(*id))
            .collect()
    }

    /// The selected items of concrete type `T` (e.g. only graph nodes).
    pub fn selected_nodes<'s, T: 'static, S: SelectableScope + ?Sized>(
        &self,
        scope: &'s S,
    ) -> Vec<&'s T> {
        self.selected
            .iter()
            .filter_map(|id| scope.item(*id))
            .filter_map(|item| item.as_any().downcast_ref::<T>())
            .collect()
    }
}
