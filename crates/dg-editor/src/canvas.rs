//! Reference [`CanvasController`] over a [`Diagram`].
//!
//! Spatial queries go through `dg_core::hit`, mutations through the
//! diagram store, and focus/cursor/repaint through a [`CanvasSurface`].
//! Calls naming a shape the diagram does not hold are logged and ignored.

use crate::config::InteractionConfig;
use crate::controller::{CanvasController, CanvasSurface, HeadlessSurface};
use crate::input::Modifiers;
use crate::router::MouseRouter;
use dg_core::{
    Anchor, AnchorKind, CursorGlyph, Diagram, DiagramError, Point, Rect, Shape, ShapeId, Vector,
    hit,
};

#[derive(Debug, Clone, Default)]
pub struct DiagramController<S: CanvasSurface = HeadlessSurface> {
    pub diagram: Diagram,
    pub config: InteractionConfig,
    pub surface: S,
}

impl DiagramController<HeadlessSurface> {
    pub fn new(diagram: Diagram) -> Self {
        Self::with_surface(diagram, InteractionConfig::default(), HeadlessSurface::default())
    }
}

impl<S: CanvasSurface> DiagramController<S> {
    pub fn with_surface(diagram: Diagram, config: InteractionConfig, surface: S) -> Self {
        Self {
            diagram,
            config,
            surface,
        }
    }

    fn repaint(&mut self, shape: ShapeId) {
        match self.diagram.get(shape) {
            Some(s) => {
                let area = s.bounds.inflated(self.config.anchor_size);
                self.surface.invalidate(Some(area));
            }
            None => log::debug!("repaint of unknown shape {shape}"),
        }
    }
}

impl<S: CanvasSurface> CanvasController for DiagramController<S> {
    fn root_shape_at(&self, p: Point) -> Option<ShapeId> {
        hit::root_shape_at(&self.diagram, p, self.config.hit_tolerance)
    }

    fn child_shape_at(&self, p: Point) -> Option<ShapeId> {
        hit::child_shape_at(&self.diagram, p, self.config.hit_tolerance)
    }

    fn is_multi_select(&self, modifiers: Modifiers) -> bool {
        self.config.multi_select.held(modifiers)
    }

    fn parent_of(&self, shape: ShapeId) -> Option<ShapeId> {
        self.diagram.parent_of(shape)
    }

    fn anchor_near(&self, shape: ShapeId, p: Point) -> Option<Anchor> {
        let shape = self.diagram.get(shape)?;
        shape
            .anchors(self.config.anchor_size)
            .into_iter()
            .find(|a| a.near(p, self.config.anchor_tolerance))
    }

    fn shapes_intersecting(&self, rect: Rect) -> Vec<ShapeId> {
        hit::shapes_intersecting(&self.diagram, &rect)
    }

    fn bounds_of(&self, shape: ShapeId) -> Option<Rect> {
        self.diagram.get(shape).map(|s| s.bounds)
    }

    fn selected(&self) -> &[ShapeId] {
        self.diagram.selected()
    }

    fn select(&mut self, shape: ShapeId) {
        if !self.diagram.contains(shape) {
            log::warn!("select of unknown shape {shape}");
            return;
        }
        self.diagram.select(shape);
        self.repaint(shape);
    }

    fn deselect(&mut self, shape: ShapeId) {
        self.diagram.deselect(shape);
        self.repaint(shape);
    }

    fn deselect_all(&mut self) {
        if !self.diagram.selected().is_empty() {
            self.diagram.deselect_all();
            self.surface.invalidate(None);
        }
    }

    fn deselect_grouped(&mut self) {
        self.diagram.deselect_grouped();
    }

    fn translate_all(&mut self, delta: Vector) {
        self.diagram.translate_all(delta);
        self.surface.invalidate(None);
    }

    fn translate_selected(&mut self, delta: Vector) {
        self.diagram.translate_selected(delta);
        self.surface.invalidate(None);
    }

    fn insert(&mut self, shape: Shape) -> ShapeId {
        let id = self.diagram.add(shape);
        self.repaint(id);
        id
    }

    fn delete_shape(&mut self, shape: ShapeId) {
        match self.diagram.remove(shape) {
            Some(removed) => self.surface.invalidate(Some(removed.bounds)),
            None => log::warn!("delete of unknown shape {shape}"),
        }
    }

    fn update_display_rect(&mut self, shape: ShapeId, rect: Rect, _delta: Vector) {
        let old = self.diagram.get(shape).map(|s| s.bounds);
        if !self.diagram.set_bounds(shape, rect) {
            log::warn!("resize of unknown shape {shape}");
            return;
        }
        let dirty = old.map_or(rect, |old| old.union(&rect));
        self.surface.invalidate(Some(dirty));
    }

    fn set_anchors_visible(&mut self, shape: ShapeId, visible: bool) {
        if !self.diagram.set_anchors_visible(shape, visible) {
            log::debug!("anchors of unknown shape {shape}");
        }
    }

    fn redraw(&mut self, shape: ShapeId) {
        self.repaint(shape);
    }

    fn hide_connection_points(&mut self) {
        self.diagram.hide_connection_points();
        self.surface.invalidate(None);
    }

    fn snap_anchor(&mut self, shape: ShapeId, anchor: AnchorKind, delta: Vector) -> bool {
        let attached = self.diagram.snap_anchor(
            shape,
            anchor,
            delta,
            self.config.snap_tolerance,
            self.config.min_shape_size,
        );
        self.surface.invalidate(None);
        attached
    }

    fn connection_at(&self, shape: ShapeId, anchor: AnchorKind) -> Option<ShapeId> {
        self.diagram.connection_at(shape, anchor)
    }

    fn disconnect(&mut self, shape: ShapeId, anchor: AnchorKind) {
        self.diagram.disconnect(shape, anchor);
    }

    fn focus(&mut self) {
        self.surface.focus();
    }

    fn set_cursor(&mut self, glyph: CursorGlyph) {
        self.surface.set_cursor(glyph);
    }

    fn invalidate(&mut self) {
        self.surface.invalidate(None);
    }
}

// ─── Structural edits ────────────────────────────────────────────────────

/// Host-side edits that must keep the router's handles in step with the
/// diagram.
impl<S: CanvasSurface> MouseRouter<DiagramController<S>> {
    /// Remove a shape with everything nested under it. Returns `false` when
    /// the diagram holds no such shape.
    pub fn remove_shape(&mut self, id: ShapeId) -> bool {
        let removed = self.canvas().diagram.subtree(id);
        if self.canvas_mut().diagram.remove(id).is_none() {
            return false;
        }
        for shape in removed {
            self.notify_shape_removed(shape);
        }
        self.canvas_mut().invalidate();
        true
    }

    /// Wrap top-level `members` into a new group.
    pub fn group_shapes(&mut self, members: &[ShapeId]) -> Result<ShapeId, DiagramError> {
        let group = self.canvas_mut().diagram.group(members)?;
        self.notify_shapes_grouped(members);
        self.canvas_mut().invalidate();
        Ok(group)
    }
}
