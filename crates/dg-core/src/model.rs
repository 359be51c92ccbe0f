//! Shape model for diagrams.
//!
//! A shape is a box-like figure (box, ellipse, diamond, text), a group that
//! owns other shapes, a connector between two endpoints, or the transient
//! selection box drawn during a rubber-band drag. Shapes expose *anchors*
//! (resize corners or connector endpoints) and *connection points* (where a
//! connector endpoint may attach).

use crate::geom::{Point, Rect, Vector};
use crate::id::ShapeId;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

// ─── Colors & Style ──────────────────────────────────────────────────────

/// RGBA color, 4 × f32 in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const GRAY: Color = Color::rgba(0.5, 0.5, 0.5, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let bytes = hex.strip_prefix('#').unwrap_or(hex).as_bytes();
        if bytes.len() != 6 && bytes.len() != 8 {
            return None;
        }
        let mut channels = [255u8; 4];
        for (i, pair) in bytes.chunks(2).enumerate() {
            channels[i] = hex_digit(pair[0])? << 4 | hex_digit(pair[1])?;
        }
        let [r, g, b, a] = channels.map(|c| c as f32 / 255.0);
        Some(Self::rgba(r, g, b, a))
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = [self.r, self.g, self.b, self.a].map(|c| (c * 255.0).round() as u8);
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub border: Color,
    pub fill: Color,
    pub border_width: f32,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            border: Color::BLACK,
            fill: Color::WHITE,
            border_width: 1.0,
        }
    }
}

// ─── Anchors ─────────────────────────────────────────────────────────────

/// Pointer glyph shown by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorGlyph {
    #[default]
    Arrow,
    SizeAll,
    /// Diagonal resize, top-left ↔ bottom-right.
    SizeNwse,
    /// Diagonal resize, top-right ↔ bottom-left.
    SizeNesw,
    Crosshair,
}

impl CursorGlyph {
    /// CSS `cursor` keyword.
    pub fn css_name(self) -> &'static str {
        match self {
            CursorGlyph::Arrow => "default",
            CursorGlyph::SizeAll => "move",
            CursorGlyph::SizeNwse => "nwse-resize",
            CursorGlyph::SizeNesw => "nesw-resize",
            CursorGlyph::Crosshair => "crosshair",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorKind {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Connector start point.
    Start,
    /// Connector end point.
    End,
}

impl AnchorKind {
    pub fn cursor(self) -> CursorGlyph {
        match self {
            AnchorKind::TopLeft | AnchorKind::BottomRight => CursorGlyph::SizeNwse,
            AnchorKind::TopRight | AnchorKind::BottomLeft => CursorGlyph::SizeNesw,
            AnchorKind::Start | AnchorKind::End => CursorGlyph::Crosshair,
        }
    }

    pub fn is_endpoint(self) -> bool {
        matches!(self, AnchorKind::Start | AnchorKind::End)
    }
}

/// A grip on a shape: a small square around a corner or endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub kind: AnchorKind,
    pub rect: Rect,
    pub cursor: CursorGlyph,
}

impl Anchor {
    pub fn new(kind: AnchorKind, at: Point, size: f32) -> Self {
        Self {
            kind,
            rect: Rect::around(at, size),
            cursor: kind.cursor(),
        }
    }

    /// Whether `p` lies on the grip or within `tolerance` of it.
    pub fn near(&self, p: Point, tolerance: f32) -> bool {
        self.rect.inflated(tolerance).contains(p)
    }
}

// ─── Shapes ──────────────────────────────────────────────────────────────

/// Endpoints of a connector.
///
/// While an endpoint is being dragged it keeps a *free* position that
/// accumulates the raw pointer deltas; the drawn position may differ from it
/// because it is snapped onto a connection point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub start: Point,
    pub end: Point,
    #[serde(skip)]
    free_start: Option<Point>,
    #[serde(skip)]
    free_end: Option<Point>,
}

impl Connector {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            free_start: None,
            free_end: None,
        }
    }

    pub fn endpoint(&self, anchor: AnchorKind) -> Option<Point> {
        match anchor {
            AnchorKind::Start => Some(self.start),
            AnchorKind::End => Some(self.end),
            _ => None,
        }
    }

    pub fn free_endpoint(&self, anchor: AnchorKind) -> Option<Point> {
        match anchor {
            AnchorKind::Start => Some(self.free_start.unwrap_or(self.start)),
            AnchorKind::End => Some(self.free_end.unwrap_or(self.end)),
            _ => None,
        }
    }

    /// Place an endpoint, remembering the unsnapped position it came from.
    pub fn place_endpoint(&mut self, anchor: AnchorKind, drawn: Point, free: Point) {
        match anchor {
            AnchorKind::Start => {
                self.start = drawn;
                self.free_start = Some(free);
            }
            AnchorKind::End => {
                self.end = drawn;
                self.free_end = Some(free);
            }
            _ => {}
        }
    }

    pub fn move_endpoint(&mut self, anchor: AnchorKind, by: Vector) {
        match anchor {
            AnchorKind::Start => self.start += by,
            AnchorKind::End => self.end += by,
            _ => {}
        }
    }

    /// Forget the free positions once a drag is over.
    pub fn settle(&mut self) {
        self.free_start = None;
        self.free_end = None;
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_corners(self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Box,
    Ellipse,
    Diamond,
    Text { content: String },
    /// Owns the shapes it contains; its bounds enclose them.
    Group,
    Connector(Connector),
    /// Transient rubber-band rectangle.
    SelectionBox,
}

impl ShapeKind {
    fn id_prefix(&self) -> &'static str {
        match self {
            ShapeKind::Box => "box",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Diamond => "diamond",
            ShapeKind::Text { .. } => "text",
            ShapeKind::Group => "group",
            ShapeKind::Connector(_) => "connector",
            ShapeKind::SelectionBox => "selection_box",
        }
    }

    /// Box-like shapes resize from their corners and accept connectors.
    pub fn is_box_like(&self) -> bool {
        matches!(
            self,
            ShapeKind::Box | ShapeKind::Ellipse | ShapeKind::Diamond | ShapeKind::Text { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub bounds: Rect,
    /// Non-selectable shapes are invisible to hit testing.
    pub selectable: bool,
    pub show_anchors: bool,
    pub show_connection_points: bool,
    pub style: ShapeStyle,
}

impl Shape {
    pub fn new(id: ShapeId, kind: ShapeKind, bounds: Rect) -> Self {
        let bounds = match &kind {
            ShapeKind::Connector(c) => c.bounds(),
            _ => bounds,
        };
        Self {
            id,
            kind,
            bounds,
            selectable: true,
            show_anchors: false,
            show_connection_points: false,
            style: ShapeStyle::default(),
        }
    }

    /// Shape with a freshly generated id.
    pub fn with_kind(kind: ShapeKind, bounds: Rect) -> Self {
        let id = ShapeId::fresh(kind.id_prefix());
        Self::new(id, kind, bounds)
    }

    pub fn boxed(bounds: Rect) -> Self {
        Self::with_kind(ShapeKind::Box, bounds)
    }

    pub fn connector(start: Point, end: Point) -> Self {
        Self::with_kind(
            ShapeKind::Connector(Connector::new(start, end)),
            Rect::default(),
        )
    }

    /// Gray, hollow, non-selectable rubber band.
    pub fn selection_box(bounds: Rect) -> Self {
        let mut shape = Self::with_kind(ShapeKind::SelectionBox, bounds);
        shape.selectable = false;
        shape.style = ShapeStyle {
            border: Color::GRAY,
            fill: Color::TRANSPARENT,
            border_width: 1.0,
        };
        shape
    }

    pub fn as_connector(&self) -> Option<&Connector> {
        match &self.kind {
            ShapeKind::Connector(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_connector_mut(&mut self) -> Option<&mut Connector> {
        match &mut self.kind {
            ShapeKind::Connector(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_connector(&self) -> bool {
        self.as_connector().is_some()
    }

    /// Grips of size `size` for this shape.
    pub fn anchors(&self, size: f32) -> SmallVec<[Anchor; 4]> {
        match &self.kind {
            ShapeKind::Connector(c) => smallvec![
                Anchor::new(AnchorKind::Start, c.start, size),
                Anchor::new(AnchorKind::End, c.end, size),
            ],
            kind if kind.is_box_like() => {
                let b = &self.bounds;
                smallvec![
                    Anchor::new(AnchorKind::TopLeft, b.top_left(), size),
                    Anchor::new(AnchorKind::TopRight, b.top_right(), size),
                    Anchor::new(AnchorKind::BottomLeft, b.bottom_left(), size),
                    Anchor::new(AnchorKind::BottomRight, b.bottom_right(), size),
                ]
            }
            _ => SmallVec::new(),
        }
    }

    /// Edge mid-points a connector endpoint can attach to.
    pub fn connection_points(&self) -> SmallVec<[Point; 4]> {
        if !self.kind.is_box_like() {
            return SmallVec::new();
        }
        let b = &self.bounds;
        let c = b.center();
        smallvec![
            Point::new(c.x, b.top()),
            Point::new(b.right(), c.y),
            Point::new(c.x, b.bottom()),
            Point::new(b.left(), c.y),
        ]
    }

    /// Geometric hit test of this shape alone; groups are resolved by the
    /// diagram through their children.
    pub fn hit(&self, p: Point, tolerance: f32) -> bool {
        match &self.kind {
            ShapeKind::Connector(c) => p.distance_to_segment(c.start, c.end) <= tolerance,
            _ => self.bounds.inflated(tolerance).contains(p),
        }
    }

    pub fn translate(&mut self, by: Vector) {
        if let ShapeKind::Connector(c) = &mut self.kind {
            c.move_endpoint(AnchorKind::Start, by);
            c.move_endpoint(AnchorKind::End, by);
            c.settle();
        }
        self.bounds = self.bounds.translated(by);
    }

    /// Drag one corner of a box-like shape by `by`, keeping the opposite
    /// corner fixed and each side at least `min_size`.
    pub fn resize_from(&mut self, anchor: AnchorKind, by: Vector, min_size: f32) {
        if !self.kind.is_box_like() {
            return;
        }
        let b = self.bounds;
        let (mut left, mut top, mut right, mut bottom) = (b.left(), b.top(), b.right(), b.bottom());
        match anchor {
            AnchorKind::TopLeft => {
                left = (left + by.dx).min(right - min_size);
                top = (top + by.dy).min(bottom - min_size);
            }
            AnchorKind::TopRight => {
                right = (right + by.dx).max(left + min_size);
                top = (top + by.dy).min(bottom - min_size);
            }
            AnchorKind::BottomLeft => {
                left = (left + by.dx).min(right - min_size);
                bottom = (bottom + by.dy).max(top + min_size);
            }
            AnchorKind::BottomRight => {
                right = (right + by.dx).max(left + min_size);
                bottom = (bottom + by.dy).max(top + min_size);
            }
            AnchorKind::Start | AnchorKind::End => return,
        }
        self.bounds = Rect::new(left, top, right - left, bottom - top);
    }

    /// Recompute cached bounds after connector endpoints moved.
    pub fn refresh_bounds(&mut self) {
        if let ShapeKind::Connector(c) = &self.kind {
            self.bounds = c.bounds();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#336699").unwrap();
        assert_eq!(c.to_hex(), "#336699");
        assert_eq!(Color::from_hex("80808080").unwrap().to_hex(), "#80808080");
        assert!(Color::from_hex("#12").is_none());
        assert!(Color::from_hex("#GG0000").is_none());
    }

    #[test]
    fn box_anchors_sit_on_corners_with_diagonal_cursors() {
        let shape = Shape::boxed(Rect::new(10.0, 20.0, 100.0, 50.0));
        let anchors = shape.anchors(6.0);
        assert_eq!(anchors.len(), 4);
        assert_eq!(anchors[0].rect.center(), Point::new(10.0, 20.0));
        assert_eq!(anchors[3].rect.center(), Point::new(110.0, 70.0));
        assert_eq!(anchors[0].cursor, CursorGlyph::SizeNwse);
        assert_eq!(anchors[1].cursor, CursorGlyph::SizeNesw);
    }

    #[test]
    fn anchor_near_honours_tolerance() {
        let anchor = Anchor::new(AnchorKind::TopLeft, Point::new(0.0, 0.0), 6.0);
        assert!(anchor.near(Point::new(2.0, 2.0), 0.0));
        assert!(!anchor.near(Point::new(5.0, 0.0), 0.0));
        assert!(anchor.near(Point::new(5.0, 0.0), 3.0));
    }

    #[test]
    fn connector_anchors_are_endpoints() {
        let shape = Shape::connector(Point::new(0.0, 0.0), Point::new(40.0, 30.0));
        let kinds: Vec<_> = shape.anchors(6.0).iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AnchorKind::Start, AnchorKind::End]);
        assert_eq!(shape.bounds, Rect::new(0.0, 0.0, 40.0, 30.0));
        assert!(shape.connection_points().is_empty());
    }

    #[test]
    fn connector_hit_follows_the_segment() {
        let shape = Shape::connector(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        assert!(shape.hit(Point::new(50.0, 52.0), 4.0));
        assert!(!shape.hit(Point::new(90.0, 10.0), 4.0));
    }

    #[test]
    fn resize_keeps_opposite_corner_and_min_size() {
        let mut shape = Shape::boxed(Rect::new(0.0, 0.0, 100.0, 100.0));
        shape.resize_from(AnchorKind::BottomRight, Vector::new(20.0, -10.0), 10.0);
        assert_eq!(shape.bounds, Rect::new(0.0, 0.0, 120.0, 90.0));

        shape.resize_from(AnchorKind::TopLeft, Vector::new(500.0, 0.0), 10.0);
        assert_eq!(shape.bounds, Rect::new(110.0, 0.0, 10.0, 90.0));
    }

    #[test]
    fn selection_box_is_not_selectable() {
        let shape = Shape::selection_box(Rect::new(1.0, 1.0, 1.0, 1.0));
        assert!(!shape.selectable);
        assert!(shape.anchors(6.0).is_empty());
        assert!(shape.id.as_str().starts_with("selection_box_"));
    }
}
