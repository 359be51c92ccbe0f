//! Guards and effects named by the route table.
//!
//! Every guard is a plain function over shared references, so it cannot
//! mutate anything; every effect receives the state and the controller
//! explicitly. An effect may rely on the preconditions its paired guard
//! checked (e.g. that a shape lies under the pointer). Preconditions the
//! guard does not check degrade to a logged no-op.

use crate::controller::CanvasController;
use crate::input::Buttons;
use crate::state::{AnchorHandle, InteractionState};
use dg_core::{Anchor, CursorGlyph, Rect, Shape, ShapeId};

// ─── Shared queries ──────────────────────────────────────────────────────

fn root_at(state: &InteractionState, canvas: &dyn CanvasController) -> Option<ShapeId> {
    canvas.root_shape_at(state.current_position)
}

fn child_at(state: &InteractionState, canvas: &dyn CanvasController) -> Option<ShapeId> {
    canvas.child_shape_at(state.current_position)
}

fn over_root(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    canvas.is_root_shape_selectable(state.current_position)
}

fn over_child(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    canvas.is_child_shape_selectable(state.current_position)
}

fn multi_select(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    canvas.is_multi_select(state.current_modifiers)
}

/// Anchor of the top-level shape under the pointer that the pointer is near.
fn root_anchor(state: &InteractionState, canvas: &dyn CanvasController) -> Option<Anchor> {
    root_at(state, canvas).and_then(|shape| canvas.anchor_near(shape, state.current_position))
}

/// Anchor of the hover shape that the pointer is near.
fn hover_anchor(state: &InteractionState, canvas: &dyn CanvasController) -> Option<Anchor> {
    state
        .hover_shape
        .and_then(|shape| canvas.anchor_near(shape, state.current_position))
}

// ─── Guards ──────────────────────────────────────────────────────────────

pub fn always(_: &InteractionState, _: &dyn CanvasController) -> bool {
    true
}

pub fn can_start_surface_drag(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    !over_root(state, canvas) && state.current_buttons == Buttons::Primary
}

pub fn is_surface_click(state: &InteractionState, _: &dyn CanvasController) -> bool {
    state.dragging_surface && !state.dragging_surface_occurred
}

pub fn is_surface_drag_end(state: &InteractionState, _: &dyn CanvasController) -> bool {
    state.dragging_surface && state.dragging_surface_occurred
}

pub fn is_dragging_surface(state: &InteractionState, _: &dyn CanvasController) -> bool {
    state.dragging_surface
}

/// Grouped shapes cannot be dragged on their own.
pub fn can_start_shape_drag(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    over_root(state, canvas)
        && state.current_buttons == Buttons::Primary
        && root_anchor(state, canvas).is_none()
        && !over_child(state, canvas)
}

pub fn can_start_anchor_drag(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    over_root(state, canvas)
        && state.current_buttons == Buttons::Primary
        && root_anchor(state, canvas).is_some()
}

pub fn is_dragging_shape_or_anchor(state: &InteractionState, _: &dyn CanvasController) -> bool {
    state.dragging_shapes || state.dragging_anchor
}

pub fn can_drag_shapes(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    state.dragging_shapes && state.hover_shape.is_some() && hover_anchor(state, canvas).is_none()
}

pub fn can_drag_anchor(state: &InteractionState, _: &dyn CanvasController) -> bool {
    state.hover_shape.is_some() && state.dragging_anchor
}

/// Shape that should start showing anchors: an ungrouped top-level shape
/// under an idle pointer.
fn hover_candidate(state: &InteractionState, canvas: &dyn CanvasController) -> Option<ShapeId> {
    if !state.hover_enabled() || state.current_buttons != Buttons::None {
        return None;
    }
    root_at(state, canvas).filter(|&shape| canvas.parent_of(shape).is_none())
}

pub fn should_show_anchors(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    state.hover_shape.is_none() && hover_candidate(state, canvas).is_some()
}

pub fn should_change_anchors(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    match (state.hover_shape, hover_candidate(state, canvas)) {
        (Some(current), Some(candidate)) => current != candidate,
        _ => false,
    }
}

pub fn should_hide_anchors(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    state.hover_enabled()
        && state.hover_shape.is_some()
        && state.current_buttons == Buttons::None
        && !over_root(state, canvas)
}

pub fn is_over_hover_anchor(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    state.hover_enabled() && !state.dragging_anchor && hover_anchor(state, canvas).is_some()
}

pub fn is_off_hover_anchor(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    state.hover_enabled() && state.hover_shape.is_some() && hover_anchor(state, canvas).is_none()
}

pub fn can_select_root_on_down(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    over_root(state, canvas)
        && !over_child(state, canvas)
        && !multi_select(state, canvas)
        && root_at(state, canvas).is_some_and(|shape| !canvas.is_selected(shape))
}

pub fn can_select_child(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    !multi_select(state, canvas)
        && child_at(state, canvas).is_some_and(|shape| !canvas.is_selected(shape))
}

/// Releasing over a grouped member must not select its group.
pub fn can_select_root_on_up(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    over_root(state, canvas)
        && !over_child(state, canvas)
        && !multi_select(state, canvas)
        && !state.dragging_occurred
        && !state.dragging_selection_box
}

pub fn can_add_to_selection(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    multi_select(state, canvas)
        && !state.dragging_selection_box
        && root_at(state, canvas).is_some_and(|shape| !canvas.is_selected(shape))
}

pub fn can_remove_from_selection(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    multi_select(state, canvas)
        && !state.dragging_selection_box
        && !state.dragging_occurred
        && root_at(state, canvas).is_some_and(|shape| {
            canvas.is_selected(shape) && !state.just_added_shapes.contains(&shape)
        })
}

pub fn can_start_selection_box(state: &InteractionState, canvas: &dyn CanvasController) -> bool {
    !over_root(state, canvas) && state.current_buttons == Buttons::Secondary
}

pub fn is_dragging_selection_box(state: &InteractionState, _: &dyn CanvasController) -> bool {
    state.dragging_selection_box
}

// ─── Effects: surface ────────────────────────────────────────────────────

/// Keyboard handling on the canvas needs focus.
pub fn focus_canvas(_: &mut InteractionState, canvas: &mut dyn CanvasController) {
    canvas.focus();
}

pub fn start_surface_drag(state: &mut InteractionState, _: &mut dyn CanvasController) {
    state.dragging_surface = true;
    state.dragging_surface_occurred = false;
}

pub fn end_surface_click(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    canvas.deselect_all();
    state.dragging_surface = false;
    canvas.set_cursor(CursorGlyph::Arrow);
}

pub fn end_surface_drag(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    state.dragging_surface = false;
    state.dragging_surface_occurred = false;
    canvas.set_cursor(CursorGlyph::Arrow);
}

/// Panning moves every shape; the background grid stays put.
pub fn drag_surface(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    state.dragging_surface_occurred = true;
    canvas.set_cursor(CursorGlyph::SizeAll);
    canvas.translate_all(state.pointer_delta());
}

// ─── Effects: shapes & anchors ───────────────────────────────────────────

pub fn start_shape_drag(state: &mut InteractionState, _: &mut dyn CanvasController) {
    state.dragging_shapes = true;
}

/// The anchor is taken from the hover shape, which the guard does not check.
pub fn start_anchor_drag(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    state.dragging_anchor = true;
    state.selected_anchor = state.hover_shape.and_then(|shape| {
        canvas
            .anchor_near(shape, state.current_position)
            .map(|anchor| AnchorHandle {
                shape,
                kind: anchor.kind,
            })
    });
    match state.selected_anchor {
        Some(anchor) => log::debug!("anchor drag {:?} on {}", anchor.kind, anchor.shape),
        None => log::warn!(
            "anchor drag started at {:?} without a hover anchor",
            state.current_position
        ),
    }
}

pub fn end_shape_drag(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    canvas.hide_connection_points();
    state.dragging_shapes = false;
    // `dragging_occurred` stays set: the selection routes on this release
    // still need it and the remove-from-selection fallback clears it.
    state.dragging_anchor = false;
    state.selected_anchor = None;
    canvas.set_cursor(CursorGlyph::Arrow);
}

pub fn drag_shapes(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    canvas.translate_selected(state.pointer_delta());
    canvas.set_cursor(CursorGlyph::SizeAll);
    state.dragging_occurred = true;
}

/// Snap the dragged anchor; when it lands nowhere, detach whatever it was
/// attached to.
pub fn drag_anchor(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    let Some(anchor) = state.selected_anchor else {
        log::warn!("anchor drag without a selected anchor");
        return;
    };
    let attached = canvas.snap_anchor(anchor.shape, anchor.kind, state.pointer_delta());
    if !attached && canvas.connection_at(anchor.shape, anchor.kind).is_some() {
        canvas.disconnect(anchor.shape, anchor.kind);
    }
}

// ─── Effects: hover ──────────────────────────────────────────────────────

pub fn show_anchors(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    let Some(shape) = canvas.root_shape_at(state.current_position) else {
        return;
    };
    canvas.set_anchors_visible(shape, true);
    canvas.redraw(shape);
    state.hover_shape = Some(shape);
    canvas.set_anchor_cursor(shape, state.current_position);
}

pub fn change_anchors(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    if let Some(previous) = state.hover_shape {
        canvas.set_anchors_visible(previous, false);
        canvas.redraw(previous);
    }
    state.hover_shape = canvas.root_shape_at(state.current_position);
    if let Some(shape) = state.hover_shape {
        canvas.set_anchors_visible(shape, true);
        canvas.redraw(shape);
        canvas.set_anchor_cursor(shape, state.current_position);
    }
}

pub fn hide_anchors(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    if let Some(shape) = state.hover_shape.take() {
        canvas.set_anchors_visible(shape, false);
        canvas.redraw(shape);
    }
    canvas.set_cursor(CursorGlyph::Arrow);
}

pub fn show_anchor_cursor(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    // The hover shape may have changed on the way to a connector's anchor.
    if let Some(anchor) = hover_anchor(state, canvas) {
        canvas.set_cursor(anchor.cursor);
    }
}

pub fn clear_anchor_cursor(_: &mut InteractionState, canvas: &mut dyn CanvasController) {
    canvas.set_cursor(CursorGlyph::Arrow);
}

// ─── Effects: selection ──────────────────────────────────────────────────

pub fn select_single_root(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    canvas.deselect_all();
    if let Some(shape) = canvas.root_shape_at(state.current_position) {
        canvas.select(shape);
    }
}

pub fn select_single_child(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    canvas.deselect_all();
    if let Some(shape) = canvas.child_shape_at(state.current_position) {
        canvas.select(shape);
    }
}

pub fn add_to_selection(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    canvas.deselect_grouped();
    if let Some(shape) = canvas.root_shape_at(state.current_position) {
        canvas.select(shape);
        state.just_added_shapes.push(shape);
    }
}

pub fn remove_from_selection(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    if let Some(shape) = canvas.root_shape_at(state.current_position) {
        canvas.deselect(shape);
    }
}

/// Fallback of remove-from-selection: end of the click cycle.
pub fn forget_click(state: &mut InteractionState, _: &mut dyn CanvasController) {
    state.just_added_shapes.clear();
    state.dragging_occurred = false;
}

// ─── Effects: selection box ──────────────────────────────────────────────

pub fn start_selection_box(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    // A second secondary press before the release replaces the box.
    if let Some(stale) = state.selection_box.take() {
        log::debug!("replacing unfinished selection box {stale}");
        canvas.delete_shape(stale);
    }
    state.dragging_selection_box = true;
    state.start_selection_position = state.current_position;
    let origin = state.start_selection_position;
    let rubber_band = Shape::selection_box(Rect::new(origin.x, origin.y, 1.0, 1.0));
    state.selection_box = Some(canvas.insert(rubber_band));
}

/// Replace the selection with every top-level shape the box touches.
pub fn end_selection_box(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    state.dragging_selection_box = false;
    let Some(rubber_band) = state.selection_box.take() else {
        log::warn!("selection box ended without a box shape");
        return;
    };
    let area = canvas.bounds_of(rubber_band);
    canvas.delete_shape(rubber_band);
    let hits = area.map_or_else(Vec::new, |area| canvas.shapes_intersecting(area));
    log::debug!("selection box {area:?} picked {} shapes", hits.len());
    canvas.deselect_all();
    canvas.select_many(&hits);
    canvas.invalidate();
}

pub fn drag_selection_box(state: &mut InteractionState, canvas: &mut dyn CanvasController) {
    let area = Rect::from_corners(state.start_selection_position, state.current_position);
    if let Some(rubber_band) = state.selection_box {
        canvas.update_display_rect(rubber_band, area, state.pointer_delta());
    }
}
