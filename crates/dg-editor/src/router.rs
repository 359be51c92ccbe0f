//! The dispatcher: one [`MouseRouter`] per canvas.
//!
//! ```text
//!  host ──RawPointerEvent──▶ dispatch ──▶ normalize ──▶ scan ROUTES ──▶ DispatchReport
//!                                                        │      ▲
//!                                                        ▼      │
//!                                               InteractionState + CanvasController
//! ```

use crate::controller::CanvasController;
use crate::input::{EventKind, RawPointerEvent};
use crate::routes::{Match, Route, RouteName, Unmatched, routes_for};
use crate::state::InteractionState;
use dg_core::{CursorGlyph, ShapeId};
use serde::Serialize;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// What one route did during a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RouteOutcome {
    /// Guard held; the effect ran.
    Fired,
    /// Guard failed; the route's fallback ran.
    Fallback,
    /// Guard failed; nothing ran.
    Skipped,
}

/// Every route evaluated for one event, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub kind: EventKind,
    pub routes: SmallVec<[(RouteName, RouteOutcome); 9]>,
}

impl DispatchReport {
    /// Names of the routes whose effect ran.
    pub fn fired(&self) -> Vec<RouteName> {
        self.routes
            .iter()
            .filter(|(_, outcome)| *outcome == RouteOutcome::Fired)
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn outcome(&self, name: RouteName) -> Option<RouteOutcome> {
        self.routes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, outcome)| *outcome)
    }

    pub fn has_fired(&self, name: RouteName) -> bool {
        self.outcome(name) == Some(RouteOutcome::Fired)
    }
}

/// Routes pointer events for one canvas through the route table.
#[derive(Debug)]
pub struct MouseRouter<C: CanvasController> {
    state: InteractionState,
    canvas: C,
}

impl<C: CanvasController> MouseRouter<C> {
    pub fn new(canvas: C) -> Self {
        Self {
            state: InteractionState::new(),
            canvas,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }

    /// Run every route triggered by `raw`, in table order, to completion.
    pub fn dispatch(&mut self, raw: RawPointerEvent) -> DispatchReport {
        let event = raw.normalize();
        self.state.begin(&event);
        let mut report = DispatchReport {
            kind: event.kind,
            routes: SmallVec::new(),
        };
        for route in routes_for(event.kind) {
            let outcome = self.run(route);
            report.routes.push((route.name, outcome));
        }
        self.state.end();
        report
    }

    fn run(&mut self, route: &Route) -> RouteOutcome {
        match route.evaluate(&self.state, &self.canvas) {
            Match::Matched => {
                log::trace!("route {:?}", route.name);
                (route.effect)(&mut self.state, &mut self.canvas);
                RouteOutcome::Fired
            }
            Match::Unmatched => match route.unmatched {
                Unmatched::Run(fallback) => {
                    fallback(&mut self.state, &mut self.canvas);
                    RouteOutcome::Fallback
                }
                Unmatched::Ignore => RouteOutcome::Skipped,
            },
        }
    }

    /// Drop every handle the state holds on a shape the host just removed.
    pub fn notify_shape_removed(&mut self, shape: ShapeId) {
        self.release_hover(shape);
        let state = &mut self.state;
        if state.selected_anchor.is_some_and(|a| a.shape == shape) {
            log::debug!("abandoning anchor drag on removed shape {shape}");
            state.dragging_anchor = false;
            state.selected_anchor = None;
        }
        state.just_added_shapes.retain(|s| *s != shape);
        if state.selection_box == Some(shape) {
            log::debug!("abandoning selection box {shape}");
            state.selection_box = None;
            state.dragging_selection_box = false;
        }
    }

    /// `members` were just wrapped into a group. Grouped shapes never hover,
    /// so a hovered member loses its anchors.
    pub fn notify_shapes_grouped(&mut self, members: &[ShapeId]) {
        if let Some(hovered) = self.state.hover_shape.filter(|h| members.contains(h)) {
            self.release_hover(hovered);
        }
    }

    fn release_hover(&mut self, shape: ShapeId) {
        if self.state.hover_shape == Some(shape) {
            self.canvas.set_anchors_visible(shape, false);
            self.canvas.set_cursor(CursorGlyph::Arrow);
            self.state.hover_shape = None;
        }
    }
}

// ─── Event hooking ───────────────────────────────────────────────────────

pub type PointerHandler = Box<dyn FnMut(RawPointerEvent)>;

/// Something that reports pointer events of one kind to a subscribed handler.
pub trait PointerEventSource {
    fn subscribe(&mut self, kind: EventKind, handler: PointerHandler);
}

/// Subscribe `router` to down, up, and move events of `source`.
///
/// Handlers hold the router weakly; once the host drops it they do nothing.
/// An event raised while a dispatch is already running is rejected.
pub fn hook_events<C>(router: &Rc<RefCell<MouseRouter<C>>>, source: &mut dyn PointerEventSource)
where
    C: CanvasController + 'static,
{
    for kind in [EventKind::Down, EventKind::Up, EventKind::Move] {
        let router: Weak<RefCell<MouseRouter<C>>> = Rc::downgrade(router);
        source.subscribe(
            kind,
            Box::new(move |raw| {
                let Some(router) = router.upgrade() else {
                    return;
                };
                if raw.kind() != kind {
                    log::warn!("{:?} event delivered to the {kind:?} handler", raw.kind());
                }
                match router.try_borrow_mut() {
                    Ok(mut router) => {
                        router.dispatch(raw);
                    }
                    Err(_) => log::error!("rejected reentrant {kind:?} dispatch"),
                }
            }),
        );
    }
}
