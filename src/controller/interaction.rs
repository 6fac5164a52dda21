// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-object interaction state machine.
//!
//! Each placed object gets one `Interaction`. The canvas feeds it pointer
//! events for the part under the pointer and acts on the returned
//! `Outcome`: a committed move or a confirmed delete must be persisted by
//! the caller, live drag moves must not.

use crate::models::layer::Layer;
use crate::models::scene::{ObjectId, ObjectKind, Part, SceneObject};
use crate::util::geometry::{snap_to_grid, Point, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Other,
}

/// Pointer input routed to one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectEvent {
    PointerDown(PointerButton),
    /// A drag gesture began on the object. `middle_held` marks a pan chord.
    DragStart { middle_held: bool },
    /// Pointer moved by a delta in layer units while dragging.
    DragMove { dx: f64, dy: f64 },
    /// Drag released at `pointer` (layer space), when the pointer
    /// position is still known.
    DragEnd { pointer: Option<Point> },
    PointerEnter,
    PointerLeave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Draggable(Part),
    Dragging(Part),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    Default,
    Move,
}

/// What handling an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Cursor(CursorStyle),
    /// The object took over the drag gesture.
    Grabbed,
    /// A drag or delete was abandoned.
    Cancelled,
    /// Live move; nothing to persist yet.
    Moved,
    /// Drag finished; the layer must be saved.
    Committed,
    /// The user confirmed deletion; the caller removes the object.
    Deleted,
}

/// Asks the user a yes/no question. Anything but an explicit yes is a no.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

/// Where a dragged object ends up when released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropRule {
    /// Snap the release point down to the grid cell containing it.
    SnapToGrid(Size),
    /// Keep wherever the drag left it.
    Free,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    kind: ObjectKind,
    state: DragState,
    rule: DropRule,
}

impl Interaction {
    /// Interaction for a placed object. Grid lines get none.
    pub fn for_object(object: &SceneObject, cell_size: Size) -> Option<Self> {
        let rule = match object {
            SceneObject::GridLine(_) => return None,
            SceneObject::MapImage(_) => DropRule::SnapToGrid(cell_size),
            _ => DropRule::Free,
        };

        Some(Self {
            kind: object.kind(),
            state: DragState::Idle,
            rule,
        })
    }

    /// Whether `part` can be dragged at all. Arrow bodies only follow
    /// their handles.
    pub fn is_draggable(&self, part: Part) -> bool {
        !(self.kind == ObjectKind::Arrow && part == Part::Body)
    }

    /// Advance the state machine for an event on `part` of `object`.
    pub fn handle(
        &mut self,
        part: Part,
        event: ObjectEvent,
        object: &mut SceneObject,
        confirm: &mut dyn Confirm,
    ) -> Outcome {
        match event {
            ObjectEvent::PointerDown(PointerButton::Primary) => {
                if self.is_draggable(part) {
                    self.state = DragState::Draggable(part);
                }
                Outcome::Ignored
            }
            ObjectEvent::PointerDown(PointerButton::Secondary) => {
                self.state = DragState::Idle;
                let message = format!("Delete {}?", self.kind.label());
                if confirm.confirm(&message) {
                    Outcome::Deleted
                } else {
                    Outcome::Cancelled
                }
            }
            ObjectEvent::PointerDown(_) => {
                self.state = DragState::Idle;
                Outcome::Ignored
            }
            ObjectEvent::DragStart { middle_held: true } => {
                // pan chord, the stage takes the gesture
                self.state = DragState::Idle;
                Outcome::Cancelled
            }
            ObjectEvent::DragStart { middle_held: false } => match self.state {
                DragState::Draggable(grabbed) => {
                    self.state = DragState::Dragging(grabbed);
                    Outcome::Grabbed
                }
                _ => Outcome::Ignored,
            },
            ObjectEvent::DragMove { dx, dy } => match self.state {
                DragState::Dragging(grabbed) => {
                    object.translate(grabbed, dx, dy);
                    Outcome::Moved
                }
                _ => Outcome::Ignored,
            },
            ObjectEvent::DragEnd { pointer } => match self.state {
                DragState::Dragging(grabbed) => {
                    if let DropRule::SnapToGrid(cell) = self.rule {
                        let anchor = pointer.unwrap_or_else(|| object.position());
                        object.set_position(snap_to_grid(anchor, cell));
                    }
                    self.state = DragState::Draggable(grabbed);
                    Outcome::Committed
                }
                _ => Outcome::Ignored,
            },
            ObjectEvent::PointerEnter if self.is_draggable(part) => {
                Outcome::Cursor(CursorStyle::Move)
            }
            ObjectEvent::PointerEnter => Outcome::Ignored,
            ObjectEvent::PointerLeave => Outcome::Cursor(CursorStyle::Default),
        }
    }
}

/// Wire a fresh interaction to a placed object. Returns false for
/// objects that take no input or unknown ids.
pub fn attach_interaction(layer: &mut Layer, id: ObjectId, cell_size: Size) -> bool {
    let interaction = match layer.get(id).and_then(|object| Interaction::for_object(object, cell_size)) {
        Some(interaction) => interaction,
        None => return false,
    };
    layer.attach(id, interaction)
}

#[cfg(test)]
pub mod testing {
    use super::Confirm;

    /// Confirmation stub that answers with a fixed reply and records prompts.
    #[derive(Debug, Default)]
    pub struct ScriptedConfirm {
        pub reply: bool,
        pub prompts: Vec<String>,
    }

    impl ScriptedConfirm {
        pub fn answering(reply: bool) -> Self {
            Self {
                reply,
                prompts: Vec::new(),
            }
        }
    }

    impl Confirm for ScriptedConfirm {
        fn confirm(&mut self, message: &str) -> bool {
            self.prompts.push(message.to_string());
            self.reply
        }
    }
}
