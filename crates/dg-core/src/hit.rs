//! Hit testing: point → shape lookup.
//!
//! Walks the top-level z-order front to back. A group is hit when one of its
//! members is hit; non-selectable shapes (the transient selection box) are
//! never hit.

use crate::diagram::Diagram;
use crate::geom::{Point, Rect};
use crate::id::ShapeId;
use crate::model::ShapeKind;

/// Topmost selectable top-level shape under `p`.
pub fn root_shape_at(diagram: &Diagram, p: Point, tolerance: f32) -> Option<ShapeId> {
    diagram
        .roots()
        .iter()
        .rev()
        .copied()
        .find(|&id| shape_hit(diagram, id, p, tolerance))
}

/// Innermost selectable group member under `p`, looking only inside the
/// topmost top-level shape there. `None` when that shape is not a group.
pub fn child_shape_at(diagram: &Diagram, p: Point, tolerance: f32) -> Option<ShapeId> {
    let root = root_shape_at(diagram, p, tolerance)?;
    member_at(diagram, root, p, tolerance)
}

fn member_at(diagram: &Diagram, group: ShapeId, p: Point, tolerance: f32) -> Option<ShapeId> {
    // Members in reverse (last added = topmost).
    for child in diagram.children_of(group).into_iter().rev() {
        if !shape_hit(diagram, child, p, tolerance) {
            continue;
        }
        return member_at(diagram, child, p, tolerance).or(Some(child));
    }
    None
}

fn shape_hit(diagram: &Diagram, id: ShapeId, p: Point, tolerance: f32) -> bool {
    let Some(shape) = diagram.get(id) else {
        return false;
    };
    if !shape.selectable {
        return false;
    }
    match shape.kind {
        ShapeKind::Group => diagram
            .children_of(id)
            .into_iter()
            .any(|child| shape_hit(diagram, child, p, tolerance)),
        _ => shape.hit(p, tolerance),
    }
}

/// Selectable top-level shapes whose bounds overlap `rect`, back to front.
/// Used to resolve a rubber-band selection.
pub fn shapes_intersecting(diagram: &Diagram, rect: &Rect) -> Vec<ShapeId> {
    diagram
        .roots()
        .iter()
        .copied()
        .filter(|&id| {
            diagram
                .get(id)
                .is_some_and(|s| s.selectable && s.bounds.intersects(rect))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Shape;
    use pretty_assertions::assert_eq;

    #[test]
    fn front_shape_wins_overlap() {
        let mut d = Diagram::new();
        let back = d.add(Shape::boxed(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let front = d.add(Shape::boxed(Rect::new(50.0, 50.0, 100.0, 100.0)));
        assert_eq!(root_shape_at(&d, Point::new(75.0, 75.0), 0.0), Some(front));
        assert_eq!(root_shape_at(&d, Point::new(10.0, 10.0), 0.0), Some(back));
        assert_eq!(root_shape_at(&d, Point::new(300.0, 300.0), 0.0), None);
    }

    #[test]
    fn selection_box_is_transparent_to_hits() {
        let mut d = Diagram::new();
        let under = d.add(Shape::boxed(Rect::new(0.0, 0.0, 100.0, 100.0)));
        d.add(Shape::selection_box(Rect::new(0.0, 0.0, 200.0, 200.0)));
        assert_eq!(root_shape_at(&d, Point::new(10.0, 10.0), 0.0), Some(under));
        assert_eq!(
            shapes_intersecting(&d, &Rect::new(0.0, 0.0, 300.0, 300.0)),
            vec![under]
        );
    }

    #[test]
    fn group_hit_resolves_through_members() {
        let mut d = Diagram::new();
        let a = d.add(Shape::boxed(Rect::new(0.0, 0.0, 40.0, 40.0)));
        let b = d.add(Shape::boxed(Rect::new(100.0, 0.0, 40.0, 40.0)));
        let g = d.group(&[a, b]).unwrap();

        assert_eq!(root_shape_at(&d, Point::new(110.0, 10.0), 0.0), Some(g));
        assert_eq!(child_shape_at(&d, Point::new(110.0, 10.0), 0.0), Some(b));
        // Inside the group's bounds but between members.
        assert_eq!(root_shape_at(&d, Point::new(70.0, 10.0), 0.0), None);
        assert_eq!(child_shape_at(&d, Point::new(70.0, 10.0), 0.0), None);
    }

    #[test]
    fn ungrouped_shape_has_no_child_hit() {
        let mut d = Diagram::new();
        d.add(Shape::boxed(Rect::new(0.0, 0.0, 40.0, 40.0)));
        assert_eq!(child_shape_at(&d, Point::new(10.0, 10.0), 0.0), None);
    }

    #[test]
    fn intersection_ignores_grouped_members() {
        let mut d = Diagram::new();
        let a = d.add(Shape::boxed(Rect::new(0.0, 0.0, 40.0, 40.0)));
        let lone = d.add(Shape::boxed(Rect::new(200.0, 0.0, 40.0, 40.0)));
        let g = d.group(&[a]).unwrap();
        let hits = shapes_intersecting(&d, &Rect::new(-10.0, -10.0, 300.0, 60.0));
        assert_eq!(hits, vec![lone, g]);
    }
}
