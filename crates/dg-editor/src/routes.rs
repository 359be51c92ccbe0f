//! The mouse route table.
//!
//! Each row pairs a trigger with a guard and an effect. For one event the
//! dispatcher walks every row whose trigger matches, in table order, and
//! re-evaluates each guard against state already mutated by earlier rows of
//! the same pass. Row order is therefore part of the behavior; the
//! dependencies are noted beside the rows and pinned by the tests below.

use crate::actions::*;
use crate::controller::CanvasController;
use crate::input::EventKind;
use crate::state::InteractionState;
use serde::Serialize;
use std::fmt;

pub type Guard = fn(&InteractionState, &dyn CanvasController) -> bool;
pub type Effect = fn(&mut InteractionState, &mut dyn CanvasController);

/// What happens when a row's guard rejects the event.
#[derive(Clone, Copy)]
pub enum Unmatched {
    Ignore,
    Run(Effect),
}

/// Outcome of evaluating one guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    Matched,
    Unmatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RouteName {
    CanvasFocus,
    StartDragSurface,
    EndDragSurfaceWithDeselect,
    EndDragSurface,
    DragSurface,
    StartShapeDrag,
    StartAnchorDrag,
    EndShapeDrag,
    DragShapes,
    DragAnchor,
    ShowAnchors,
    ChangeAnchors,
    HideAnchors,
    ShowAnchorCursor,
    ClearAnchorCursor,
    SelectSingleShapeDown,
    SelectSingleGroupedShape,
    SelectSingleShapeUp,
    AddSelectedShape,
    RemoveSelectedShape,
    StartSelectionBox,
    EndSelectionBox,
    DragSelectionBox,
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub struct Route {
    /// Position in [`ROUTES`].
    pub order: usize,
    pub name: RouteName,
    pub trigger: EventKind,
    pub guard: Guard,
    pub effect: Effect,
    pub unmatched: Unmatched,
}

impl Route {
    pub fn evaluate(&self, state: &InteractionState, canvas: &dyn CanvasController) -> Match {
        if (self.guard)(state, canvas) {
            Match::Matched
        } else {
            Match::Unmatched
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("order", &self.order)
            .field("name", &self.name)
            .field("trigger", &self.trigger)
            .field("fallback", &matches!(self.unmatched, Unmatched::Run(_)))
            .finish()
    }
}

const fn route(
    order: usize,
    name: RouteName,
    trigger: EventKind,
    guard: Guard,
    effect: Effect,
) -> Route {
    Route {
        order,
        name,
        trigger,
        guard,
        effect,
        unmatched: Unmatched::Ignore,
    }
}

pub const ROUTE_COUNT: usize = 23;

use EventKind::{Down, Move, Up};
use RouteName::*;

pub static ROUTES: [Route; ROUTE_COUNT] = [
    // 0
    route(0, CanvasFocus, Down, always, focus_canvas),
    // 1..=4: surface panning
    route(1, StartDragSurface, Down, can_start_surface_drag, start_surface_drag),
    // 2 before 3: the click case reads the flags before 3 clears them.
    route(2, EndDragSurfaceWithDeselect, Up, is_surface_click, end_surface_click),
    route(3, EndDragSurface, Up, is_surface_drag_end, end_surface_drag),
    route(4, DragSurface, Move, is_dragging_surface, drag_surface),
    // 5..=9: shapes and anchors
    route(5, StartShapeDrag, Down, can_start_shape_drag, start_shape_drag),
    route(6, StartAnchorDrag, Down, can_start_anchor_drag, start_anchor_drag),
    route(7, EndShapeDrag, Up, is_dragging_shape_or_anchor, end_shape_drag),
    route(8, DragShapes, Move, can_drag_shapes, drag_shapes),
    route(9, DragAnchor, Move, can_drag_anchor, drag_anchor),
    // 10..=14: hover. 10 and 12 run before the cursor rows so those see the
    // hover shape as it stands after this move.
    route(10, ShowAnchors, Move, should_show_anchors, show_anchors),
    route(11, ChangeAnchors, Move, should_change_anchors, change_anchors),
    route(12, HideAnchors, Move, should_hide_anchors, hide_anchors),
    route(13, ShowAnchorCursor, Move, is_over_hover_anchor, show_anchor_cursor),
    route(14, ClearAnchorCursor, Move, is_off_hover_anchor, clear_anchor_cursor),
    // 15..=19: selection
    route(15, SelectSingleShapeDown, Down, can_select_root_on_down, select_single_root),
    route(16, SelectSingleGroupedShape, Down, can_select_child, select_single_child),
    // 17 before 19: 19's fallback clears `dragging_occurred`.
    route(17, SelectSingleShapeUp, Up, can_select_root_on_up, select_single_root),
    // 18 before 19: a shape added here must not be removed again on the same
    // release.
    route(18, AddSelectedShape, Up, can_add_to_selection, add_to_selection),
    Route {
        order: 19,
        name: RemoveSelectedShape,
        trigger: Up,
        guard: can_remove_from_selection,
        effect: remove_from_selection,
        unmatched: Unmatched::Run(forget_click),
    },
    // 20..=22: rubber band. 21 runs after 17..=19, which read
    // `dragging_selection_box` before it is cleared.
    route(20, StartSelectionBox, Down, can_start_selection_box, start_selection_box),
    route(21, EndSelectionBox, Up, is_dragging_selection_box, end_selection_box),
    route(22, DragSelectionBox, Move, is_dragging_selection_box, drag_selection_box),
];

/// Routes triggered by `kind`, in table order.
pub fn routes_for(kind: EventKind) -> impl Iterator<Item = &'static Route> {
    ROUTES.iter().filter(move |r| r.trigger == kind)
}

/// Table position of `name`.
pub fn position(name: RouteName) -> Option<usize> {
    ROUTES.iter().position(|r| r.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pos(name: RouteName) -> usize {
        position(name).unwrap()
    }

    #[test]
    fn rows_are_numbered_in_order() {
        for (i, r) in ROUTES.iter().enumerate() {
            assert_eq!(r.order, i, "{}", r.name);
        }
    }

    #[test]
    fn names_are_unique() {
        let names: Vec<_> = ROUTES.iter().map(|r| r.name).collect();
        for name in &names {
            assert_eq!(ROUTES.iter().filter(|r| r.name == *name).count(), 1);
        }
    }

    #[test]
    fn only_remove_selected_shape_has_a_fallback() {
        let with_fallback: Vec<_> = ROUTES
            .iter()
            .filter(|r| matches!(r.unmatched, Unmatched::Run(_)))
            .map(|r| r.name)
            .collect();
        assert_eq!(with_fallback, vec![RemoveSelectedShape]);
    }

    #[test]
    fn release_selection_rows_precede_remove_and_box_end() {
        assert!(pos(SelectSingleShapeUp) < pos(RemoveSelectedShape));
        assert!(pos(AddSelectedShape) < pos(RemoveSelectedShape));
        for reader in [SelectSingleShapeUp, AddSelectedShape, RemoveSelectedShape] {
            assert!(pos(reader) < pos(EndSelectionBox), "{reader}");
        }
    }

    #[test]
    fn hover_rows_precede_cursor_rows() {
        for hover in [ShowAnchors, HideAnchors] {
            for cursor in [ShowAnchorCursor, ClearAnchorCursor] {
                assert!(pos(hover) < pos(cursor), "{hover} / {cursor}");
            }
        }
    }

    #[test]
    fn surface_click_precedes_surface_drag_end() {
        assert!(pos(EndDragSurfaceWithDeselect) < pos(EndDragSurface));
    }

    #[test]
    fn triggers_partition_the_table() {
        let count = |kind| routes_for(kind).count();
        assert_eq!(count(Down), 7);
        assert_eq!(count(Up), 7);
        assert_eq!(count(Move), 9);
        let up: Vec<_> = routes_for(Up).map(|r| r.name).collect();
        assert_eq!(
            up,
            vec![
                EndDragSurfaceWithDeselect,
                EndDragSurface,
                EndShapeDrag,
                SelectSingleShapeUp,
                AddSelectedShape,
                RemoveSelectedShape,
                EndSelectionBox,
            ]
        );
    }
}
