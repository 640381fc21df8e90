pub mod commands;
pub mod drag;
pub mod error;
pub mod frame;
pub mod graph;
pub mod input;
pub mod selection;
pub mod timeline;

pub use commands::{
    CanvasPosition, ChangeSelectableCommand, Command, CommandTarget, History, Payload, TimePosition,
};
pub use drag::{DragOutcome, DragPhase, DragSession};
pub use error::{CommandError, EditorError};
pub use frame::FrameContext;
pub use graph::{
    Composition, FenceState, GraphCanvas, GraphDocument, NodeDragHandler, NodeItem, PinItem,
    SelectionFence,
};
pub use input::{
    ButtonState, EditorAction, FrameInput, InputEvent, InputTracker, Modifiers, PointerButton,
};
pub use selection::{SelectMode, SelectableScope, SelectionRegistry};
pub use timeline::{AnimationLayer, Curve, DopeSheet, DopeSheetEditor, Keyframe, Playhead};
