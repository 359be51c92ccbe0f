//! The diagram store: every shape, group containment, connector attachments,
//! top-level z-order, and the selection set.
//!
//! Shapes live as nodes of a `StableDiGraph`. Two kinds of edges exist:
//! `Link::Contains` (group → member) and `Link::Attached` (connector →
//! target shape, labelled with the connector endpoint and the target's
//! connection point index). Stable indices keep `ShapeId → NodeIndex`
//! lookups valid across removals.

use crate::error::DiagramError;
use crate::geom::{Point, Rect, Vector};
use crate::id::ShapeId;
use crate::model::{AnchorKind, Color, Shape, ShapeKind};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Contains,
    Attached { anchor: AnchorKind, point: usize },
}

#[derive(Debug, Clone, Default)]
pub struct Diagram {
    pub graph: StableDiGraph<Shape, Link>,
    index: HashMap<ShapeId, NodeIndex>,
    /// Top-level shapes, back to front.
    order: Vec<ShapeId>,
    /// Selected shapes in selection order.
    selection: Vec<ShapeId>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.index.get(&id).map(|&idx| &self.graph[idx])
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        let idx = *self.index.get(&id)?;
        self.graph.node_weight_mut(idx)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.graph.node_weights()
    }

    /// Top-level shapes, back to front.
    pub fn roots(&self) -> &[ShapeId] {
        &self.order
    }

    /// Add a top-level shape in front of every other shape. A shape whose id
    /// is already present replaces the old one in place.
    pub fn add(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id;
        if let Some(&idx) = self.index.get(&id) {
            log::warn!("replacing existing shape {id}");
            self.graph[idx] = shape;
            return id;
        }
        let idx = self.graph.add_node(shape);
        self.index.insert(id, idx);
        self.order.push(id);
        id
    }

    /// Wrap top-level `members` into a new group placed in front.
    pub fn group(&mut self, members: &[ShapeId]) -> Result<ShapeId, DiagramError> {
        let (first, rest) = members.split_first().ok_or(DiagramError::EmptyGroup)?;
        let mut bounds = self.get(*first).ok_or(DiagramError::UnknownShape(*first))?.bounds;
        for &member in members {
            let shape = self.get(member).ok_or(DiagramError::UnknownShape(member))?;
            if self.parent_of(member).is_some() {
                return Err(DiagramError::AlreadyGrouped(member));
            }
            bounds = bounds.union(&shape.bounds);
        }
        log::debug!("grouping {} shapes behind {first}", rest.len() + 1);

        let group = Shape::with_kind(ShapeKind::Group, bounds);
        let group_id = group.id;
        let group_idx = self.graph.add_node(group);
        self.index.insert(group_id, group_idx);
        for &member in members {
            let idx = self.index[&member];
            self.graph.add_edge(group_idx, idx, Link::Contains);
        }
        self.order.retain(|id| !members.contains(id));
        self.order.push(group_id);
        Ok(group_id)
    }

    /// Remove a shape (and, for groups, everything it contains). Attachments
    /// to and from the shape disappear with it.
    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let idx = *self.index.get(&id)?;
        for child in self.children_of(id) {
            self.remove(child);
        }
        let parent = self.parent_of(id);
        self.index.remove(&id);
        self.order.retain(|&r| r != id);
        self.selection.retain(|&s| s != id);
        let shape = self.graph.remove_node(idx);
        if let Some(parent) = parent {
            self.refresh_group_bounds(parent);
        }
        shape
    }

    // ─── Structure ───────────────────────────────────────────────────────

    pub fn parent_of(&self, id: ShapeId) -> Option<ShapeId> {
        let idx = *self.index.get(&id)?;
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .find(|e| *e.weight() == Link::Contains)
            .map(|e| self.graph[e.source()].id)
    }

    /// Members of a group in insertion order.
    ///
    /// Sorted by `NodeIndex` so the order does not depend on how petgraph
    /// walks its adjacency lists.
    pub fn children_of(&self, id: ShapeId) -> Vec<ShapeId> {
        let Some(&idx) = self.index.get(&id) else {
            return Vec::new();
        };
        let mut children: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| *e.weight() == Link::Contains)
            .map(|e| e.target())
            .collect();
        children.sort();
        children.into_iter().map(|c| self.graph[c].id).collect()
    }

    /// Set a shape's fill and border from hex color strings.
    pub fn restyle(&mut self, id: ShapeId, fill: &str, border: &str) -> Result<(), DiagramError> {
        let parse =
            |hex: &str| Color::from_hex(hex).ok_or_else(|| DiagramError::InvalidColor(hex.into()));
        let (fill, border) = (parse(fill)?, parse(border)?);
        let shape = self.get_mut(id).ok_or(DiagramError::UnknownShape(id))?;
        shape.style.fill = fill;
        shape.style.border = border;
        Ok(())
    }

    /// `id` followed by everything nested under it, depth first.
    pub fn subtree(&self, id: ShapeId) -> Vec<ShapeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut out = vec![id];
        for child in self.children_of(id) {
            out.extend(self.subtree(child));
        }
        out
    }

    fn collect_with_descendants(&self, id: ShapeId, out: &mut HashSet<ShapeId>) {
        if out.insert(id) {
            for child in self.children_of(id) {
                self.collect_with_descendants(child, out);
            }
        }
    }

    fn refresh_group_bounds(&mut self, group: ShapeId) {
        let children = self.children_of(group);
        let Some(bounds) = children
            .iter()
            .filter_map(|&c| self.get(c).map(|s| s.bounds))
            .reduce(|a, b| a.union(&b))
        else {
            return;
        };
        if let Some(shape) = self.get_mut(group) {
            shape.bounds = bounds;
        }
        if let Some(parent) = self.parent_of(group) {
            self.refresh_group_bounds(parent);
        }
    }

    // ─── Movement ────────────────────────────────────────────────────────

    /// Move every shape by `by`.
    pub fn translate_all(&mut self, by: Vector) {
        let all: Vec<NodeIndex> = self.graph.node_indices().collect();
        for idx in all {
            self.graph[idx].translate(by);
        }
    }

    /// Move the selected shapes (and their group members) by `by`.
    pub fn translate_selected(&mut self, by: Vector) {
        let selected = self.selection.clone();
        self.translate_shapes(&selected, by);
    }

    /// Move `ids` and their group members; endpoints of connectors attached
    /// to moved shapes follow unless the connector moves too.
    pub fn translate_shapes(&mut self, ids: &[ShapeId], by: Vector) {
        let mut moving = HashSet::new();
        for &id in ids {
            if self.contains(id) {
                self.collect_with_descendants(id, &mut moving);
            }
        }
        for &id in &moving {
            if let Some(shape) = self.get_mut(id) {
                shape.translate(by);
            }
        }
        for &id in &moving {
            self.reattach_endpoints(id, &moving);
            if let Some(parent) = self.parent_of(id)
                && !moving.contains(&parent)
            {
                self.refresh_group_bounds(parent);
            }
        }
    }

    /// Replace a shape's display rectangle.
    pub fn set_bounds(&mut self, id: ShapeId, bounds: Rect) -> bool {
        let Some(shape) = self.get_mut(id) else {
            return false;
        };
        shape.bounds = bounds;
        self.reattach_endpoints(id, &HashSet::new());
        true
    }

    /// Pull attached connector endpoints back onto the connection points of
    /// `target`, skipping connectors listed in `frozen`.
    fn reattach_endpoints(&mut self, target: ShapeId, frozen: &HashSet<ShapeId>) {
        let Some(&target_idx) = self.index.get(&target) else {
            return;
        };
        let points = self.graph[target_idx].connection_points();
        let attached: Vec<(NodeIndex, AnchorKind, usize)> = self
            .graph
            .edges_directed(target_idx, Direction::Incoming)
            .filter_map(|e| match *e.weight() {
                Link::Attached { anchor, point } => Some((e.source(), anchor, point)),
                Link::Contains => None,
            })
            .collect();
        for (source, anchor, point) in attached {
            let connector = &mut self.graph[source];
            if frozen.contains(&connector.id) {
                continue;
            }
            let Some(&at) = points.get(point) else {
                continue;
            };
            if let Some(c) = connector.as_connector_mut()
                && let Some(current) = c.endpoint(anchor)
            {
                c.move_endpoint(anchor, at.delta(current));
            }
            connector.refresh_bounds();
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selected(&self) -> &[ShapeId] {
        &self.selection
    }

    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.selection.contains(&id)
    }

    pub fn select(&mut self, id: ShapeId) {
        if self.contains(id) && !self.is_selected(id) {
            self.selection.push(id);
        }
    }

    pub fn select_many(&mut self, ids: &[ShapeId]) {
        for &id in ids {
            self.select(id);
        }
    }

    pub fn deselect(&mut self, id: ShapeId) {
        self.selection.retain(|&s| s != id);
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    /// Drop every selected shape that lives inside a group.
    pub fn deselect_grouped(&mut self) {
        let grouped: Vec<ShapeId> = self
            .selection
            .iter()
            .copied()
            .filter(|&id| self.parent_of(id).is_some())
            .collect();
        self.selection.retain(|id| !grouped.contains(id));
    }

    // ─── Anchors & connections ───────────────────────────────────────────

    pub fn set_anchors_visible(&mut self, id: ShapeId, visible: bool) -> bool {
        match self.get_mut(id) {
            Some(shape) => {
                shape.show_anchors = visible;
                true
            }
            None => false,
        }
    }

    /// Hide every connection-point indicator and settle connector endpoints
    /// at their drawn positions.
    pub fn hide_connection_points(&mut self) {
        for shape in self.graph.node_weights_mut() {
            shape.show_connection_points = false;
            if let Some(c) = shape.as_connector_mut() {
                c.settle();
            }
        }
    }

    /// Shape attached to `connector` at `anchor`, if any.
    pub fn connection_at(&self, connector: ShapeId, anchor: AnchorKind) -> Option<ShapeId> {
        self.attachment_edge(connector, anchor)
            .map(|(_, target, _)| self.graph[target].id)
    }

    fn attachment_edge(
        &self,
        connector: ShapeId,
        anchor: AnchorKind,
    ) -> Option<(petgraph::stable_graph::EdgeIndex, NodeIndex, usize)> {
        let idx = *self.index.get(&connector)?;
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .find_map(|e| match *e.weight() {
                Link::Attached { anchor: a, point } if a == anchor => {
                    Some((e.id(), e.target(), point))
                }
                _ => None,
            })
    }

    /// Attach `anchor` of `connector` to connection point `point` of
    /// `target`, replacing any previous attachment at that endpoint.
    pub fn connect(
        &mut self,
        connector: ShapeId,
        anchor: AnchorKind,
        target: ShapeId,
        point: usize,
    ) -> Result<(), DiagramError> {
        let &source_idx = self
            .index
            .get(&connector)
            .ok_or(DiagramError::UnknownShape(connector))?;
        let &target_idx = self
            .index
            .get(&target)
            .ok_or(DiagramError::UnknownShape(target))?;
        if !self.graph[source_idx].is_connector() || !anchor.is_endpoint() {
            return Err(DiagramError::NotAConnector(connector));
        }
        let at = *self.graph[target_idx]
            .connection_points()
            .get(point)
            .ok_or(DiagramError::NoSuchConnectionPoint {
                shape: target,
                point,
            })?;

        if let Some((edge, _, _)) = self.attachment_edge(connector, anchor) {
            self.graph.remove_edge(edge);
        }
        self.graph
            .add_edge(source_idx, target_idx, Link::Attached { anchor, point });

        let shape = &mut self.graph[source_idx];
        if let Some(c) = shape.as_connector_mut() {
            c.place_endpoint(anchor, at, at);
            c.settle();
        }
        shape.refresh_bounds();
        Ok(())
    }

    /// Detach `anchor` of `connector`, returning the shape it was attached to.
    pub fn disconnect(&mut self, connector: ShapeId, anchor: AnchorKind) -> Option<ShapeId> {
        let (edge, target, _) = self.attachment_edge(connector, anchor)?;
        self.graph.remove_edge(edge);
        let target = self.graph[target].id;
        log::debug!("detached {connector} {anchor:?} from {target}");
        Some(target)
    }

    /// Drag `anchor` of `id` by `by`.
    ///
    /// For a connector endpoint, snaps onto the nearest connection point of
    /// another selectable top-level shape within `snap_tolerance` of the
    /// endpoint's free position, attaching to it; returns whether it snapped.
    /// For a box-like shape, resizes from that corner and returns `false`.
    pub fn snap_anchor(
        &mut self,
        id: ShapeId,
        anchor: AnchorKind,
        by: Vector,
        snap_tolerance: f32,
        min_size: f32,
    ) -> bool {
        let Some(shape) = self.get(id) else {
            return false;
        };
        if shape.kind.is_box_like() {
            if let Some(shape) = self.get_mut(id) {
                shape.resize_from(anchor, by, min_size);
            }
            self.reattach_endpoints(id, &HashSet::new());
            if let Some(parent) = self.parent_of(id) {
                self.refresh_group_bounds(parent);
            }
            return false;
        }
        let Some(free) = shape
            .as_connector()
            .and_then(|c| c.free_endpoint(anchor))
            .map(|p| p + by)
        else {
            return false;
        };

        let target = self.nearest_connection_point(id, free, snap_tolerance);
        let drawn = target.map_or(free, |(_, _, at)| at);
        if let Some(shape) = self.get_mut(id) {
            if let Some(c) = shape.as_connector_mut() {
                c.place_endpoint(anchor, drawn, free);
            }
            shape.refresh_bounds();
        }

        let Some((target, point, _)) = target else {
            return false;
        };
        let current = self
            .attachment_edge(id, anchor)
            .map(|(_, t, p)| (self.graph[t].id, p));
        if current != Some((target, point)) {
            if let Some((edge, _, _)) = self.attachment_edge(id, anchor) {
                self.graph.remove_edge(edge);
            }
            let (source_idx, target_idx) = (self.index[&id], self.index[&target]);
            self.graph
                .add_edge(source_idx, target_idx, Link::Attached { anchor, point });
            log::debug!("snapped {id} {anchor:?} onto {target} point {point}");
        }
        if let Some(target) = self.get_mut(target) {
            target.show_connection_points = true;
        }
        true
    }

    fn nearest_connection_point(
        &self,
        exclude: ShapeId,
        near: Point,
        tolerance: f32,
    ) -> Option<(ShapeId, usize, Point)> {
        self.order
            .iter()
            .filter(|&&id| id != exclude)
            .filter_map(|&id| self.get(id))
            .filter(|s| s.selectable && !s.is_connector())
            .flat_map(|s| {
                s.connection_points()
                    .into_iter()
                    .enumerate()
                    .map(move |(i, p)| (s.id, i, p))
            })
            .map(|(id, i, p)| (id, i, p, p.distance(near)))
            .filter(|&(_, _, _, d)| d <= tolerance)
            .min_by(|a, b| a.3.total_cmp(&b.3))
            .map(|(id, i, p, _)| (id, i, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_boxes() -> (Diagram, ShapeId, ShapeId) {
        let mut d = Diagram::new();
        let a = d.add(Shape::boxed(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let b = d.add(Shape::boxed(Rect::new(100.0, 0.0, 50.0, 50.0)));
        (d, a, b)
    }

    #[test]
    fn restyle_parses_hex_colors() {
        let (mut d, a, _) = two_boxes();
        d.restyle(a, "#FFEE00", "#33669980").unwrap();
        let style = d.get(a).unwrap().style;
        assert_eq!(style.fill.to_hex(), "#FFEE00");
        assert_eq!(style.border.to_hex(), "#33669980");

        assert_eq!(
            d.restyle(a, "yellow", "#000000"),
            Err(DiagramError::InvalidColor("yellow".into()))
        );
        let ghost = ShapeId::named("ghost");
        assert_eq!(
            d.restyle(ghost, "#000000", "#000000"),
            Err(DiagramError::UnknownShape(ghost))
        );
        assert_eq!(d.get(a).unwrap().style, style);
    }

    #[test]
    fn subtree_lists_each_member_after_its_group() {
        let (mut d, a, b) = two_boxes();
        let inner = d.group(&[a]).unwrap();
        let outer = d.group(&[inner, b]).unwrap();
        assert_eq!(d.subtree(outer), vec![outer, b, inner, a]);
        assert!(d.subtree(ShapeId::named("ghost")).is_empty());
    }

    #[test]
    fn group_moves_members_out_of_top_level() {
        let (mut d, a, b) = two_boxes();
        let g = d.group(&[a, b]).unwrap();
        assert_eq!(d.roots(), &[g]);
        assert_eq!(d.children_of(g), vec![a, b]);
        assert_eq!(d.parent_of(a), Some(g));
        assert_eq!(d.get(g).unwrap().bounds, Rect::new(0.0, 0.0, 150.0, 50.0));
    }

    #[test]
    fn grouping_rejects_bad_members() {
        let (mut d, a, b) = two_boxes();
        assert_eq!(d.group(&[]), Err(DiagramError::EmptyGroup));
        let ghost = ShapeId::named("ghost");
        assert_eq!(d.group(&[a, ghost]), Err(DiagramError::UnknownShape(ghost)));
        d.group(&[a]).unwrap();
        assert_eq!(d.group(&[a, b]), Err(DiagramError::AlreadyGrouped(a)));
    }

    #[test]
    fn removing_a_group_removes_members_and_selection() {
        let (mut d, a, b) = two_boxes();
        let g = d.group(&[a]).unwrap();
        d.select_many(&[a, b]);
        d.remove(g);
        assert!(!d.contains(a));
        assert_eq!(d.selected(), &[b]);
        assert_eq!(d.roots(), &[b]);
    }

    #[test]
    fn translating_a_group_moves_members() {
        let (mut d, a, b) = two_boxes();
        let g = d.group(&[a, b]).unwrap();
        d.select(g);
        d.translate_selected(Vector::new(5.0, 7.0));
        assert_eq!(d.get(a).unwrap().bounds.origin(), Point::new(5.0, 7.0));
        assert_eq!(d.get(b).unwrap().bounds.origin(), Point::new(105.0, 7.0));
        assert_eq!(d.get(g).unwrap().bounds.origin(), Point::new(5.0, 7.0));
    }

    #[test]
    fn attached_endpoint_follows_moved_box() {
        let (mut d, _, b) = two_boxes();
        let c = d.add(Shape::connector(Point::new(50.0, 25.0), Point::new(100.0, 25.0)));
        d.connect(c, AnchorKind::End, b, 3).unwrap();
        d.select(b);
        d.translate_selected(Vector::new(10.0, 10.0));
        let conn = d.get(c).unwrap().as_connector().unwrap();
        assert_eq!(conn.end, Point::new(110.0, 35.0));
        assert_eq!(conn.start, Point::new(50.0, 25.0));
        assert_eq!(d.connection_at(c, AnchorKind::End), Some(b));
        assert_eq!(d.connection_at(c, AnchorKind::Start), None);
    }

    #[test]
    fn connect_validates_arguments() {
        let (mut d, a, b) = two_boxes();
        assert_eq!(
            d.connect(a, AnchorKind::End, b, 0),
            Err(DiagramError::NotAConnector(a))
        );
        let c = d.add(Shape::connector(Point::ORIGIN, Point::new(1.0, 1.0)));
        assert_eq!(
            d.connect(c, AnchorKind::End, b, 9),
            Err(DiagramError::NoSuchConnectionPoint { shape: b, point: 9 })
        );
    }

    #[test]
    fn snap_attaches_within_tolerance_and_releases_beyond() {
        let (mut d, _, b) = two_boxes();
        let c = d.add(Shape::connector(Point::new(0.0, 100.0), Point::new(60.0, 30.0)));

        // Left-edge midpoint of `b` is (100, 25).
        assert!(d.snap_anchor(c, AnchorKind::End, Vector::new(37.0, -3.0), 8.0, 10.0));
        assert_eq!(d.connection_at(c, AnchorKind::End), Some(b));
        assert_eq!(
            d.get(c).unwrap().as_connector().unwrap().end,
            Point::new(100.0, 25.0)
        );
        assert!(d.get(b).unwrap().show_connection_points);

        // Free position is now (97, 27); moving 30 further escapes the snap.
        assert!(!d.snap_anchor(c, AnchorKind::End, Vector::new(-30.0, 0.0), 8.0, 10.0));
        assert_eq!(
            d.get(c).unwrap().as_connector().unwrap().end,
            Point::new(67.0, 27.0)
        );
        // Snapping failure leaves detaching to the caller.
        assert_eq!(d.connection_at(c, AnchorKind::End), Some(b));
        assert_eq!(d.disconnect(c, AnchorKind::End), Some(b));
        assert_eq!(d.disconnect(c, AnchorKind::End), None);
    }

    #[test]
    fn box_anchor_drag_resizes_and_never_snaps() {
        let (mut d, a, _) = two_boxes();
        assert!(!d.snap_anchor(a, AnchorKind::BottomRight, Vector::new(10.0, 5.0), 8.0, 10.0));
        assert_eq!(d.get(a).unwrap().bounds, Rect::new(0.0, 0.0, 60.0, 55.0));
    }

    #[test]
    fn deselect_grouped_keeps_top_level_selection() {
        let (mut d, a, b) = two_boxes();
        d.group(&[a]).unwrap();
        d.select_many(&[a, b]);
        d.deselect_grouped();
        assert_eq!(d.selected(), &[b]);
    }
}
