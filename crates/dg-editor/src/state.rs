//! Interaction state shared by every route.
//!
//! One instance lives as long as the canvas. Guards read it, effects mutate
//! it, and the dispatcher stamps the pointer snapshot into it before each
//! route scan. Mode flags are plain booleans: mutual exclusion between the
//! drag modes is a property of the route guards, not of this type.

use crate::input::{Buttons, Modifiers, PointerEvent};
use dg_core::{AnchorKind, Point, ShapeId};
use serde::Serialize;
use smallvec::SmallVec;

/// Non-owning handle of one anchor on one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnchorHandle {
    pub shape: ShapeId,
    pub kind: AnchorKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InteractionState {
    pub last_position: Point,
    pub current_position: Point,
    pub current_buttons: Buttons,
    pub current_modifiers: Modifiers,

    pub dragging_surface: bool,
    pub dragging_shapes: bool,
    pub dragging_anchor: bool,
    pub dragging_selection_box: bool,
    /// Suppresses hover routes. No shipped route sets it.
    pub selecting_shapes: bool,

    /// Shapes moved since the last release cleared it.
    pub dragging_occurred: bool,
    /// The surface moved since the surface drag started.
    pub dragging_surface_occurred: bool,

    /// Shape currently showing its anchors.
    pub hover_shape: Option<ShapeId>,
    /// Anchor being dragged.
    pub selected_anchor: Option<AnchorHandle>,
    /// Transient rubber-band shape created by the router.
    pub selection_box: Option<ShapeId>,
    pub start_selection_position: Point,
    /// Shapes added to the multi-selection by the current release.
    pub just_added_shapes: SmallVec<[ShapeId; 4]>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the pointer snapshot of `event` before a route scan.
    pub fn begin(&mut self, event: &PointerEvent) {
        self.current_position = event.position;
        self.current_buttons = event.buttons;
        self.current_modifiers = event.modifiers;
    }

    /// Close a route scan.
    pub fn end(&mut self) {
        self.last_position = self.current_position;
    }

    /// Pointer movement since the previous event.
    pub fn pointer_delta(&self) -> dg_core::Vector {
        self.current_position.delta(self.last_position)
    }

    /// How many of the four drag modes are active. Anything above one is an
    /// overlap the guards failed to exclude.
    pub fn active_drag_modes(&self) -> usize {
        [
            self.dragging_surface,
            self.dragging_shapes,
            self.dragging_anchor,
            self.dragging_selection_box,
        ]
        .into_iter()
        .filter(|&on| on)
        .count()
    }

    /// Hover routes only run while the pointer is idle over the canvas.
    pub fn hover_enabled(&self) -> bool {
        !self.dragging_surface && !self.dragging_shapes && !self.selecting_shapes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::EventKind;
    use dg_core::Vector;

    #[test]
    fn begin_and_end_track_positions() {
        let mut state = InteractionState::new();
        let event = PointerEvent {
            kind: EventKind::Move,
            position: Point::new(8.0, 5.0),
            buttons: Buttons::Primary,
            modifiers: Modifiers::NONE,
        };
        state.begin(&event);
        assert_eq!(state.pointer_delta(), Vector::new(8.0, 5.0));
        assert_eq!(state.current_buttons, Buttons::Primary);
        state.end();
        assert_eq!(state.last_position, Point::new(8.0, 5.0));
        assert_eq!(state.pointer_delta(), Vector::ZERO);
    }

    #[test]
    fn counts_overlapping_drag_modes() {
        let mut state = InteractionState::new();
        assert_eq!(state.active_drag_modes(), 0);
        state.dragging_shapes = true;
        state.dragging_anchor = true;
        assert_eq!(state.active_drag_modes(), 2);
    }
}
