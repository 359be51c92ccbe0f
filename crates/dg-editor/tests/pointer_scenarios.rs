//! Integration tests: full pointer gestures through the router (dg-editor).
//!
//! Drives a `MouseRouter` over the reference `DiagramController` with raw
//! events and checks the resulting diagram, selection, and surface.

use dg_core::{AnchorKind, CursorGlyph, Diagram, Point, Rect, Shape, ShapeId};
use dg_editor::{
    CanvasController, DiagramController, EventKind, InteractionConfig, Modifiers, MouseRouter,
    PointerEventSource, PointerHandler, RawPointerEvent, RouteName, hook_events,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Board {
    router: MouseRouter<DiagramController>,
    left: ShapeId,
    right: ShapeId,
    link: ShapeId,
}

fn board(config: InteractionConfig) -> Board {
    init_logging();
    let mut diagram = Diagram::new();
    let left = diagram.add(Shape::boxed(Rect::new(100.0, 100.0, 100.0, 60.0)));
    let right = diagram.add(Shape::boxed(Rect::new(300.0, 100.0, 100.0, 60.0)));
    let link = diagram.add(Shape::connector(
        Point::new(20.0, 300.0),
        Point::new(80.0, 300.0),
    ));
    let mut canvas = DiagramController::new(diagram);
    canvas.config = config;
    Board {
        router: MouseRouter::new(canvas),
        left,
        right,
        link,
    }
}

fn press(
    router: &mut MouseRouter<DiagramController>,
    x: f32,
    y: f32,
    buttons: u16,
    modifiers: Modifiers,
) {
    router.dispatch(RawPointerEvent::Down {
        x,
        y,
        buttons,
        modifiers,
    });
}

fn release(router: &mut MouseRouter<DiagramController>, x: f32, y: f32, modifiers: Modifiers) {
    router.dispatch(RawPointerEvent::Up {
        x,
        y,
        buttons: 0,
        modifiers,
    });
}

fn hover(router: &mut MouseRouter<DiagramController>, x: f32, y: f32, buttons: u16) {
    router.dispatch(RawPointerEvent::Move {
        x,
        y,
        buttons,
        modifiers: Modifiers::NONE,
    });
}

fn link_end(router: &MouseRouter<DiagramController>, link: ShapeId) -> Point {
    router
        .canvas()
        .diagram
        .get(link)
        .and_then(|s| s.as_connector())
        .map(|c| c.end)
        .unwrap()
}

// ─── Connectors ──────────────────────────────────────────────────────────

#[test]
fn attached_connector_follows_the_dragged_box() {
    let Board {
        mut router,
        left,
        link,
        ..
    } = board(InteractionConfig::default());

    // Grab the connector end and drop it next to the left box's west side.
    hover(&mut router, 60.0, 300.0, 0);
    hover(&mut router, 80.0, 300.0, 0);
    press(&mut router, 80.0, 300.0, 1, Modifiers::NONE);
    hover(&mut router, 97.0, 131.0, 1);
    assert!(router.canvas().diagram.get(left).unwrap().show_connection_points);
    release(&mut router, 97.0, 131.0, Modifiers::NONE);

    assert_eq!(router.canvas().connection_at(link, AnchorKind::End), Some(left));
    assert_eq!(link_end(&router, link), Point::new(100.0, 130.0));
    assert!(!router.canvas().diagram.get(left).unwrap().show_connection_points);

    // Drag the box down; the attached end comes along.
    hover(&mut router, 150.0, 130.0, 0);
    assert_eq!(router.state().hover_shape, Some(left));
    press(&mut router, 150.0, 130.0, 1, Modifiers::NONE);
    hover(&mut router, 150.0, 150.0, 1);
    release(&mut router, 150.0, 150.0, Modifiers::NONE);

    assert_eq!(
        router.canvas().bounds_of(left),
        Some(Rect::new(100.0, 120.0, 100.0, 60.0))
    );
    assert_eq!(link_end(&router, link), Point::new(100.0, 150.0));
    assert_eq!(router.canvas().selected(), &[left]);
}

#[test]
fn snapped_end_escapes_once_dragged_out_of_range() {
    let Board {
        mut router,
        left,
        link,
        ..
    } = board(InteractionConfig::default());

    hover(&mut router, 60.0, 300.0, 0);
    hover(&mut router, 80.0, 300.0, 0);
    press(&mut router, 80.0, 300.0, 1, Modifiers::NONE);
    hover(&mut router, 97.0, 131.0, 1);
    assert_eq!(router.canvas().connection_at(link, AnchorKind::End), Some(left));

    hover(&mut router, 60.0, 131.0, 1);
    assert_eq!(router.canvas().connection_at(link, AnchorKind::End), None);
    assert_eq!(link_end(&router, link), Point::new(60.0, 131.0));
    release(&mut router, 60.0, 131.0, Modifiers::NONE);
    assert_eq!(router.canvas().surface.cursor, CursorGlyph::Arrow);
}

// ─── Selection ───────────────────────────────────────────────────────────

#[test]
fn configured_multi_select_key_is_honoured() {
    let config = InteractionConfig::from_json(r#"{"multi_select": "shift"}"#).unwrap();
    let Board {
        mut router,
        left,
        right,
        ..
    } = board(config);
    let shift = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    press(&mut router, 150.0, 130.0, 1, Modifiers::NONE);
    release(&mut router, 150.0, 130.0, Modifiers::NONE);
    press(&mut router, 350.0, 130.0, 1, shift);
    release(&mut router, 350.0, 130.0, shift);
    assert_eq!(router.canvas().selected(), &[left, right]);

    // Ctrl is an ordinary click under this config.
    press(&mut router, 150.0, 130.0, 1, Modifiers::CTRL);
    release(&mut router, 150.0, 130.0, Modifiers::CTRL);
    assert_eq!(router.canvas().selected(), &[left]);
}

#[test]
fn rubber_band_in_every_direction_selects_the_same_shapes() {
    let corners = [
        ((90.0, 90.0), (410.0, 170.0)),
        ((410.0, 170.0), (90.0, 90.0)),
        ((90.0, 170.0), (410.0, 90.0)),
        ((410.0, 90.0), (90.0, 170.0)),
    ];
    for ((sx, sy), (ex, ey)) in corners {
        let Board {
            mut router,
            left,
            right,
            ..
        } = board(InteractionConfig::default());
        press(&mut router, sx, sy, 2, Modifiers::NONE);
        let rubber_band = router.state().selection_box.unwrap();
        hover(&mut router, ex, ey, 2);
        assert_eq!(
            router.canvas().bounds_of(rubber_band),
            Some(Rect::new(90.0, 90.0, 320.0, 80.0))
        );
        release(&mut router, ex, ey, Modifiers::NONE);
        assert_eq!(router.canvas().selected(), &[left, right]);
        assert!(!router.canvas().diagram.contains(rubber_band));
    }
}

#[test]
fn panning_moves_everything_and_keeps_selection() {
    let Board {
        mut router,
        left,
        link,
        ..
    } = board(InteractionConfig::default());
    router.canvas_mut().select(left);

    press(&mut router, 250.0, 400.0, 1, Modifiers::NONE);
    hover(&mut router, 230.0, 380.0, 1);
    assert_eq!(router.canvas().surface.cursor, CursorGlyph::SizeAll);
    release(&mut router, 230.0, 380.0, Modifiers::NONE);

    assert_eq!(
        router.canvas().bounds_of(left),
        Some(Rect::new(80.0, 80.0, 100.0, 60.0))
    );
    assert_eq!(link_end(&router, link), Point::new(60.0, 280.0));
    assert_eq!(router.canvas().selected(), &[left]);
    assert_eq!(router.canvas().surface.cursor, CursorGlyph::Arrow);
}

#[test]
fn release_outside_the_canvas_ends_the_pan() {
    let Board {
        mut router, left, ..
    } = board(InteractionConfig::default());

    press(&mut router, 250.0, 400.0, 1, Modifiers::NONE);
    hover(&mut router, 240.0, 400.0, 1);
    // Released past the left edge of the canvas.
    release(&mut router, -30.0, 400.0, Modifiers::NONE);
    let panned = router.canvas().bounds_of(left);

    let report = router.dispatch(RawPointerEvent::Move {
        x: 200.0,
        y: 400.0,
        buttons: 0,
        modifiers: Modifiers::NONE,
    });
    assert!(!report.has_fired(RouteName::DragSurface));
    assert_eq!(router.canvas().bounds_of(left), panned);
    assert!(!router.state().dragging_surface);
}

// ─── Hooking ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingSource {
    handlers: Vec<(EventKind, PointerHandler)>,
}

impl PointerEventSource for RecordingSource {
    fn subscribe(&mut self, kind: EventKind, handler: PointerHandler) {
        self.handlers.push((kind, handler));
    }
}

impl RecordingSource {
    fn fire(&mut self, raw: RawPointerEvent) {
        for (kind, handler) in &mut self.handlers {
            if *kind == raw.kind() {
                handler(raw);
            }
        }
    }
}

#[test]
fn hooked_events_drive_the_shared_router() {
    let Board { router, right, .. } = board(InteractionConfig::default());
    let router = Rc::new(RefCell::new(router));
    let mut source = RecordingSource::default();
    hook_events(&router, &mut source);

    let kinds: Vec<_> = source.handlers.iter().map(|(k, _)| *k).collect();
    assert_eq!(kinds, vec![EventKind::Down, EventKind::Up, EventKind::Move]);

    source.fire(RawPointerEvent::Move {
        x: 350.0,
        y: 130.0,
        buttons: 0,
        modifiers: Modifiers::NONE,
    });
    source.fire(RawPointerEvent::Down {
        x: 350.0,
        y: 130.0,
        buttons: 1,
        modifiers: Modifiers::NONE,
    });
    source.fire(RawPointerEvent::Up {
        x: 350.0,
        y: 130.0,
        buttons: 0,
        modifiers: Modifiers::NONE,
    });

    let router = router.borrow();
    assert_eq!(router.state().hover_shape, Some(right));
    assert_eq!(router.canvas().selected(), &[right]);
    assert!(router.canvas().surface.focused);
}

#[test]
fn route_names_render_for_logs() {
    assert_eq!(RouteName::RemoveSelectedShape.to_string(), "RemoveSelectedShape");
}
