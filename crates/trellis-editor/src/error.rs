use trellis_core::{CompositionId, ItemId};

/// Logic errors in the calling editor. These surface to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("cannot begin `{started}`: `{in_flight}` is still in flight")]
    CommandInFlight { in_flight: String, started: String },

    #[error("{child} is not a child of composition {composition}")]
    NotAChild {
        child: ItemId,
        composition: CompositionId,
    },

    #[error("{ancestor} is not a parent of composition {composition}")]
    NotAParent {
        ancestor: CompositionId,
        composition: CompositionId,
    },

    #[error("composition {0} has no parent")]
    NoParent(CompositionId),

    #[error("unknown composition {0}")]
    UnknownComposition(CompositionId),

    #[error("composition path is empty")]
    EmptyPath,
}

/// A command could not be applied because the state it refers to is gone.
/// The history absorbs these and logs a warning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("composition {0} no longer exists")]
    MissingContext(CompositionId),

    #[error("item {item} no longer exists in {context}")]
    MissingItem {
        context: CompositionId,
        item: ItemId,
    },
}
