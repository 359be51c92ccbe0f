//! The collaborator every route talks to.
//!
//! A `CanvasController` owns the shapes, answers spatial queries, keeps the
//! selection set, and drives the host surface (focus, cursor, repaint). The
//! router never touches shapes directly; it only holds [`ShapeId`] handles
//! and calls through this trait. The trait is object-safe so the static
//! route table can be written against `&dyn CanvasController`.

use crate::input::Modifiers;
use dg_core::{Anchor, AnchorKind, CursorGlyph, Point, Rect, Shape, ShapeId, Vector};

pub trait CanvasController {
    // ─── Spatial queries ─────────────────────────────────────────────────

    /// Topmost selectable top-level shape under `p`.
    fn root_shape_at(&self, p: Point) -> Option<ShapeId>;

    /// Selectable grouped shape under `p`.
    fn child_shape_at(&self, p: Point) -> Option<ShapeId>;

    fn is_root_shape_selectable(&self, p: Point) -> bool {
        self.root_shape_at(p).is_some()
    }

    fn is_child_shape_selectable(&self, p: Point) -> bool {
        self.child_shape_at(p).is_some()
    }

    /// Whether `modifiers` request adding to / removing from the selection.
    fn is_multi_select(&self, modifiers: Modifiers) -> bool;

    fn parent_of(&self, shape: ShapeId) -> Option<ShapeId>;

    /// Anchor of `shape` near `p`, if any.
    fn anchor_near(&self, shape: ShapeId, p: Point) -> Option<Anchor>;

    /// Top-level shapes whose bounds intersect `rect`.
    fn shapes_intersecting(&self, rect: Rect) -> Vec<ShapeId>;

    /// Current display rectangle of `shape`.
    fn bounds_of(&self, shape: ShapeId) -> Option<Rect>;

    // ─── Selection ───────────────────────────────────────────────────────

    fn selected(&self) -> &[ShapeId];

    fn is_selected(&self, shape: ShapeId) -> bool {
        self.selected().contains(&shape)
    }

    fn select(&mut self, shape: ShapeId);

    fn select_many(&mut self, shapes: &[ShapeId]) {
        for &shape in shapes {
            self.select(shape);
        }
    }

    fn deselect(&mut self, shape: ShapeId);

    fn deselect_all(&mut self);

    /// Deselect every selected shape that belongs to a group.
    fn deselect_grouped(&mut self);

    // ─── Shapes ──────────────────────────────────────────────────────────

    fn translate_all(&mut self, delta: Vector);

    fn translate_selected(&mut self, delta: Vector);

    /// Insert a shape on top of the collection.
    fn insert(&mut self, shape: Shape) -> ShapeId;

    fn delete_shape(&mut self, shape: ShapeId);

    /// Give `shape` the display rectangle `rect`; `delta` is the pointer
    /// movement that produced it.
    fn update_display_rect(&mut self, shape: ShapeId, rect: Rect, delta: Vector);

    fn set_anchors_visible(&mut self, shape: ShapeId, visible: bool);

    /// Request a repaint of one shape.
    fn redraw(&mut self, shape: ShapeId);

    /// Cursor for the anchor context of `shape` at `p`: the glyph of the
    /// anchor under the pointer, or the default arrow.
    fn set_anchor_cursor(&mut self, shape: ShapeId, p: Point) {
        let glyph = self
            .anchor_near(shape, p)
            .map_or(CursorGlyph::Arrow, |anchor| anchor.cursor);
        self.set_cursor(glyph);
    }

    fn hide_connection_points(&mut self);

    /// Move `anchor` of `shape` by `delta`, snapping onto a nearby compatible
    /// connection point. Returns whether the anchor is now attached.
    fn snap_anchor(&mut self, shape: ShapeId, anchor: AnchorKind, delta: Vector) -> bool;

    /// Shape attached at `anchor` of `shape`.
    fn connection_at(&self, shape: ShapeId, anchor: AnchorKind) -> Option<ShapeId>;

    /// Detach whatever is attached at `anchor` of `shape`.
    fn disconnect(&mut self, shape: ShapeId, anchor: AnchorKind);

    // ─── Surface ─────────────────────────────────────────────────────────

    fn focus(&mut self);

    fn set_cursor(&mut self, glyph: CursorGlyph);

    /// Repaint the whole canvas.
    fn invalidate(&mut self);
}

/// The host surface behind a controller: keyboard focus, pointer glyph, and
/// repaint requests.
pub trait CanvasSurface {
    fn focus(&mut self);

    fn set_cursor(&mut self, glyph: CursorGlyph);

    /// Mark `area` (or the whole canvas for `None`) as needing a repaint.
    fn invalidate(&mut self, area: Option<Rect>);
}

/// Surface for headless hosts and tests: records what a window would show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessSurface {
    pub focused: bool,
    pub cursor: CursorGlyph,
    pub repaints: usize,
}

impl CanvasSurface for HeadlessSurface {
    fn focus(&mut self) {
        self.focused = true;
    }

    fn set_cursor(&mut self, glyph: CursorGlyph) {
        self.cursor = glyph;
    }

    fn invalidate(&mut self, _area: Option<Rect>) {
        self.repaints += 1;
    }
}
