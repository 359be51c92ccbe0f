//! Canvas2D painter for a [`Diagram`].
//!
//! Paints top-level shapes back to front, group members after their group,
//! then the interaction overlays: selection outlines, anchors, connection
//! points. The transient selection box is painted like any other shape.

use dg_core::{Diagram, Point, Rect, Shape, ShapeKind};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const BACKGROUND: &str = "#FAFAFA";
const SELECTION: &str = "#1E88E5";
const ANCHOR_FILL: &str = "#FFFFFF";
const CONNECTION_POINT: &str = "#43A047";
const ARROW_HEAD: f64 = 9.0;

pub struct PaintOptions {
    pub width: f64,
    pub height: f64,
    pub anchor_size: f32,
}

/// Clear the canvas and paint the whole diagram.
pub fn paint_diagram(ctx: &CanvasRenderingContext2d, diagram: &Diagram, options: &PaintOptions) {
    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, options.width, options.height);

    for &id in diagram.roots() {
        paint_tree(ctx, diagram, id, options);
    }
}

fn paint_tree(
    ctx: &CanvasRenderingContext2d,
    diagram: &Diagram,
    id: dg_core::ShapeId,
    options: &PaintOptions,
) {
    let Some(shape) = diagram.get(id) else {
        return;
    };
    paint_shape(ctx, shape);
    for child in diagram.children_of(id) {
        paint_tree(ctx, diagram, child, options);
    }

    if diagram.is_selected(id) {
        paint_selection(ctx, shape);
    }
    if shape.show_connection_points {
        paint_connection_points(ctx, shape);
    }
    if shape.show_anchors {
        paint_anchors(ctx, shape, options.anchor_size);
    }
}

// ─── Shapes ──────────────────────────────────────────────────────────────

fn paint_shape(ctx: &CanvasRenderingContext2d, shape: &Shape) {
    let b = &shape.bounds;
    let style = &shape.style;
    ctx.save();
    ctx.set_fill_style_str(&style.fill.to_hex());
    ctx.set_stroke_style_str(&style.border.to_hex());
    ctx.set_line_width(style.border_width as f64);

    match &shape.kind {
        ShapeKind::Box => {
            ctx.fill_rect(b.x as f64, b.y as f64, b.width as f64, b.height as f64);
            ctx.stroke_rect(b.x as f64, b.y as f64, b.width as f64, b.height as f64);
        }
        ShapeKind::Ellipse => {
            let c = b.center();
            ctx.begin_path();
            let _ = ctx.ellipse(
                c.x as f64,
                c.y as f64,
                b.width as f64 / 2.0,
                b.height as f64 / 2.0,
                0.0,
                0.0,
                std::f64::consts::TAU,
            );
            ctx.fill();
            ctx.stroke();
        }
        ShapeKind::Diamond => {
            polygon_path(ctx, &diamond_points(b));
            ctx.fill();
            ctx.stroke();
        }
        ShapeKind::Text { content } => {
            ctx.set_fill_style_str(&style.border.to_hex());
            ctx.set_font("14px sans-serif");
            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            let c = b.center();
            let _ = ctx.fill_text(content, c.x as f64, c.y as f64);
        }
        // Groups have no body of their own.
        ShapeKind::Group => {}
        ShapeKind::Connector(c) => {
            ctx.begin_path();
            ctx.move_to(c.start.x as f64, c.start.y as f64);
            ctx.line_to(c.end.x as f64, c.end.y as f64);
            ctx.stroke();
            ctx.set_fill_style_str(&style.border.to_hex());
            polygon_path(ctx, &arrow_head(c.start, c.end, ARROW_HEAD));
            ctx.fill();
        }
        ShapeKind::SelectionBox => {
            set_dash(ctx, &[4.0, 3.0]);
            ctx.stroke_rect(b.x as f64, b.y as f64, b.width as f64, b.height as f64);
        }
    }
    ctx.restore();
}

fn polygon_path(ctx: &CanvasRenderingContext2d, points: &[(f64, f64)]) {
    let Some((&(x0, y0), rest)) = points.split_first() else {
        return;
    };
    ctx.begin_path();
    ctx.move_to(x0, y0);
    for &(x, y) in rest {
        ctx.line_to(x, y);
    }
    ctx.close_path();
}

fn set_dash(ctx: &CanvasRenderingContext2d, segments: &[f64]) {
    let dash = js_sys::Array::new();
    for &s in segments {
        dash.push(&JsValue::from_f64(s));
    }
    if let Err(e) = ctx.set_line_dash(&dash) {
        log::debug!("set_line_dash failed: {e:?}");
    }
}

/// Corners of the diamond inscribed in `b`: top, right, bottom, left.
pub(crate) fn diamond_points(b: &Rect) -> [(f64, f64); 4] {
    let c = b.center();
    [
        (c.x as f64, b.top() as f64),
        (b.right() as f64, c.y as f64),
        (c.x as f64, b.bottom() as f64),
        (b.left() as f64, c.y as f64),
    ]
}

/// Triangle at `tip` pointing away from `from`.
pub(crate) fn arrow_head(from: Point, tip: Point, size: f64) -> [(f64, f64); 3] {
    let (tx, ty) = (tip.x as f64, tip.y as f64);
    let (dx, dy) = (tx - from.x as f64, ty - from.y as f64);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return [(tx, ty); 3];
    }
    let (ux, uy) = (dx / len, dy / len);
    let (bx, by) = (tx - ux * size, ty - uy * size);
    let half = size / 2.0;
    [(tx, ty), (bx - uy * half, by + ux * half), (bx + uy * half, by - ux * half)]
}

// ─── Overlays ────────────────────────────────────────────────────────────

fn paint_selection(ctx: &CanvasRenderingContext2d, shape: &Shape) {
    let b = shape.bounds.inflated(2.0);
    ctx.save();
    ctx.set_stroke_style_str(SELECTION);
    ctx.set_line_width(1.5);
    if matches!(shape.kind, ShapeKind::Group) {
        set_dash(ctx, &[6.0, 4.0]);
    }
    ctx.stroke_rect(b.x as f64, b.y as f64, b.width as f64, b.height as f64);
    ctx.restore();
}

fn paint_anchors(ctx: &CanvasRenderingContext2d, shape: &Shape, size: f32) {
    ctx.save();
    ctx.set_fill_style_str(ANCHOR_FILL);
    ctx.set_stroke_style_str(SELECTION);
    ctx.set_line_width(1.0);
    for anchor in shape.anchors(size) {
        let r = anchor.rect;
        ctx.fill_rect(r.x as f64, r.y as f64, r.width as f64, r.height as f64);
        ctx.stroke_rect(r.x as f64, r.y as f64, r.width as f64, r.height as f64);
    }
    ctx.restore();
}

fn paint_connection_points(ctx: &CanvasRenderingContext2d, shape: &Shape) {
    ctx.save();
    ctx.set_fill_style_str(CONNECTION_POINT);
    for p in shape.connection_points() {
        ctx.begin_path();
        let _ = ctx.arc(p.x as f64, p.y as f64, 3.5, 0.0, std::f64::consts::TAU);
        ctx.fill();
    }
    ctx.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn diamond_touches_edge_midpoints() {
        let points = diamond_points(&Rect::new(0.0, 0.0, 40.0, 20.0));
        assert_eq!(points, [(20.0, 0.0), (40.0, 10.0), (20.0, 20.0), (0.0, 10.0)]);
    }

    #[test]
    fn arrow_head_points_along_the_line() {
        let [tip, left, right] = arrow_head(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 4.0);
        assert_eq!(tip, (10.0, 0.0));
        assert_eq!(left, (6.0, 2.0));
        assert_eq!(right, (6.0, -2.0));
    }

    #[test]
    fn degenerate_arrow_collapses_to_the_tip() {
        let head = arrow_head(Point::new(3.0, 3.0), Point::new(3.0, 3.0), 4.0);
        assert_eq!(head, [(3.0, 3.0); 3]);
    }
}
