//! Input abstraction layer.
//!
//! Hosts feed raw pointer/keyboard events into an `InputTracker`, which
//! folds them into one `FrameInput` snapshot per frame. Editors only ever
//! poll the snapshot: "is the button down", "was it released this frame",
//! "how far has it been dragged since the press".

use smallvec::SmallVec;
use trellis_core::{Point, Vec2};

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    /// Platform command key: ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Editor commands resolved from the host's shortcut bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    FocusSelection,
    Undo,
    Redo,
    SelectAll,
    DeleteSelection,
}

/// A raw event from the host.
#[derive(Debug, Clone)]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    PointerUp {
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
    },
    /// Wheel notches; positive zooms in.
    Wheel { steps: f64 },
    /// Whether the pointer is over the canvas viewport.
    Hover(bool),
    /// A shortcut fired.
    Action(EditorAction),
}

impl InputEvent {
    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. } => Some(Point::new(*x, *y)),
            _ => None,
        }
    }
}

/// State of one pointer button for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ButtonState {
    pub down: bool,
    /// Pressed during this frame.
    pub clicked: bool,
    /// Released during this frame.
    pub released: bool,
    /// Pointer travel since the press. Still valid on the release frame.
    pub drag_delta: Vec2,
}

/// Per-frame snapshot of pointer and keyboard state.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub pointer: Point,
    /// Pointer movement since the previous frame.
    pub pointer_delta: Vec2,
    pub wheel: f64,
    pub primary: ButtonState,
    pub secondary: ButtonState,
    pub middle: ButtonState,
    pub modifiers: Modifiers,
    /// Pointer is over the viewport.
    pub hovered: bool,
    pub triggered: SmallVec<[EditorAction; 4]>,
}

impl FrameInput {
    pub fn button(&self, button: PointerButton) -> &ButtonState {
        match button {
            PointerButton::Primary => &self.primary,
            PointerButton::Secondary => &self.secondary,
            PointerButton::Middle => &self.middle,
        }
    }

    /// Held down and moved further than `threshold` pixels since the press.
    pub fn is_dragging(&self, button: PointerButton, threshold: f64) -> bool {
        let state = self.button(button);
        state.down && state.drag_delta.hypot() > threshold
    }

    /// Whether a shortcut fired this frame.
    pub fn triggered(&self, action: EditorAction) -> bool {
        self.triggered.contains(&action)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ButtonTrack {
    down: bool,
    press_position: Point,
    clicked: bool,
    released: bool,
    release_delta: Vec2,
}

/// Folds raw events into per-frame `FrameInput` snapshots.
#[derive(Debug, Default)]
pub struct InputTracker {
    pointer: Point,
    previous_pointer: Point,
    wheel: f64,
    buttons: [ButtonTrack; 3],
    modifiers: Modifiers,
    hovered: bool,
    triggered: SmallVec<[EditorAction; 4]>,
}

impl InputTracker {
    pub fn new() -> Self {
        Self {
            hovered: true,
            ..Self::default()
        }
    }

    pub fn handle(&mut self, event: &InputEvent) {
        if let Some(position) = event.position() {
            self.pointer = position;
        }
        match event {
            InputEvent::PointerDown {
                button, modifiers, ..
            } => {
                self.modifiers = *modifiers;
                let track = &mut self.buttons[slot(*button)];
                track.down = true;
                track.clicked = true;
                track.press_position = self.pointer;
            }
            InputEvent::PointerMove { modifiers, .. } => {
                self.modifiers = *modifiers;
            }
            InputEvent::PointerUp {
                button, modifiers, ..
            } => {
                self.modifiers = *modifiers;
                let pointer = self.pointer;
                let track = &mut self.buttons[slot(*button)];
                if track.down {
                    track.down = false;
                    track.released = true;
                    track.release_delta = pointer - track.press_position;
                }
            }
            InputEvent::Wheel { steps } => self.wheel += steps,
            InputEvent::Hover(hovered) => self.hovered = *hovered,
            InputEvent::Action(action) => self.triggered.push(*action),
        }
    }

    /// Produce the snapshot for this frame and reset per-frame state.
    pub fn next_frame(&mut self) -> FrameInput {
        let state = |track: &ButtonTrack, pointer: Point| ButtonState {
            down: track.down,
            clicked: track.clicked,
            released: track.released,
            drag_delta: if track.down {
                pointer - track.press_position
            } else if track.released {
                track.release_delta
            } else {
                Vec2::ZERO
            },
        };

        let frame = FrameInput {
            pointer: self.pointer,
            pointer_delta: self.pointer - self.previous_pointer,
            wheel: self.wheel,
            primary: state(&self.buttons[0], self.pointer),
            secondary: state(&self.buttons[1], self.pointer),
            middle: state(&self.buttons[2], self.pointer),
            modifiers: self.modifiers,
            hovered: self.hovered,
            triggered: std::mem::take(&mut self.triggered),
        };

        self.previous_pointer = self.pointer;
        self.wheel = 0.0;
        for track in &mut self.buttons {
            track.clicked = false;
            track.released = false;
        }
        frame
    }
}

fn slot(button: PointerButton) -> usize {
    match button {
        PointerButton::Primary => 0,
        PointerButton::Secondary => 1,
        PointerButton::Middle => 2,
    }
}
