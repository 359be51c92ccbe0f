//! WASM bridge for DG: exposes the pointer router to a browser `<canvas>`.
//!
//! Compiled via `wasm-pack build --target web`. JavaScript creates a
//! [`DgCanvas`] over a canvas element, adds shapes, calls `attach()` to route
//! the element's mouse events, and calls `render()` whenever
//! `needs_repaint()` reports damage.

mod render2d;

use dg_core::{AnchorKind, CursorGlyph, Point, Rect, Shape, ShapeId, ShapeKind};
use dg_editor::{
    CanvasSurface, DiagramController, EventKind, InteractionConfig, Modifiers, MouseRouter,
    PointerEventSource, PointerHandler, RawPointerEvent, hook_events,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, EventTarget, HtmlCanvasElement, MouseEvent};

type Router = MouseRouter<DiagramController<WebSurface>>;

// ─── Surface ─────────────────────────────────────────────────────────────

/// Focus, cursor, and damage tracking for a canvas element.
pub struct WebSurface {
    canvas: HtmlCanvasElement,
    dirty: bool,
}

impl CanvasSurface for WebSurface {
    fn focus(&mut self) {
        if let Err(e) = self.canvas.focus() {
            log::debug!("canvas focus failed: {e:?}");
        }
    }

    fn set_cursor(&mut self, glyph: CursorGlyph) {
        if let Err(e) = self.canvas.style().set_property("cursor", glyph.css_name()) {
            log::debug!("cursor update failed: {e:?}");
        }
    }

    fn invalidate(&mut self, _area: Option<Rect>) {
        self.dirty = true;
    }
}

// ─── DOM events ──────────────────────────────────────────────────────────

type Listener = Closure<dyn FnMut(MouseEvent)>;

/// Where a DOM listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Canvas,
    /// Releases outside the canvas must still end a drag.
    Window,
}

/// DOM event name and listener scope for each pointer event kind.
fn binding(kind: EventKind) -> (&'static str, Scope) {
    match kind {
        EventKind::Down => ("mousedown", Scope::Canvas),
        EventKind::Up => ("mouseup", Scope::Window),
        EventKind::Move => ("mousemove", Scope::Canvas),
    }
}

/// Mouse listeners for one canvas; removed again on drop.
struct CanvasEvents {
    canvas: HtmlCanvasElement,
    listeners: Vec<(EventTarget, &'static str, Listener)>,
}

impl CanvasEvents {
    fn new(canvas: HtmlCanvasElement) -> Self {
        Self {
            canvas,
            listeners: Vec::new(),
        }
    }

    fn target(&self, scope: Scope) -> Option<EventTarget> {
        match scope {
            Scope::Canvas => Some(self.canvas.clone().into()),
            Scope::Window => web_sys::window().map(Into::into),
        }
    }

    fn listen(&mut self, scope: Scope, event: &'static str, listener: Listener) {
        let Some(target) = self.target(scope) else {
            log::error!("no {scope:?} to listen for {event} on");
            return;
        };
        if let Err(e) =
            target.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
        {
            log::error!("cannot listen for {event}: {e:?}");
            return;
        }
        self.listeners.push((target, event, listener));
    }

    /// The secondary button draws the selection box, not a context menu.
    fn suppress_context_menu(&mut self) {
        self.listen(
            Scope::Canvas,
            "contextmenu",
            Closure::new(|e: MouseEvent| e.prevent_default()),
        );
    }
}

impl PointerEventSource for CanvasEvents {
    fn subscribe(&mut self, kind: EventKind, mut handler: PointerHandler) {
        let (event, scope) = binding(kind);
        let canvas = self.canvas.clone();
        self.listen(
            scope,
            event,
            Closure::new(move |e: MouseEvent| handler(raw_event(kind, &canvas, &e))),
        );
    }
}

impl Drop for CanvasEvents {
    fn drop(&mut self) {
        for (target, event, listener) in &self.listeners {
            let _ = target
                .remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref());
        }
    }
}

/// Canvas-relative position, valid for events targeting any element.
fn raw_event(kind: EventKind, canvas: &HtmlCanvasElement, e: &MouseEvent) -> RawPointerEvent {
    let origin = canvas.get_bounding_client_rect();
    let x = (e.client_x() as f64 - origin.left()) as f32;
    let y = (e.client_y() as f64 - origin.top()) as f32;
    let buttons = e.buttons();
    let modifiers = Modifiers {
        shift: e.shift_key(),
        ctrl: e.ctrl_key(),
        alt: e.alt_key(),
        meta: e.meta_key(),
    };
    match kind {
        EventKind::Down => RawPointerEvent::Down {
            x,
            y,
            buttons,
            modifiers,
        },
        EventKind::Up => RawPointerEvent::Up {
            x,
            y,
            buttons,
            modifiers,
        },
        EventKind::Move => RawPointerEvent::Move {
            x,
            y,
            buttons,
            modifiers,
        },
    }
}

// ─── Canvas ──────────────────────────────────────────────────────────────

/// A diagram bound to one canvas element.
#[wasm_bindgen]
pub struct DgCanvas {
    router: Rc<RefCell<Router>>,
    events: Option<CanvasEvents>,
    canvas: HtmlCanvasElement,
}

#[wasm_bindgen]
impl DgCanvas {
    /// Create an empty diagram over `canvas`. `config` is an optional JSON
    /// object of interaction settings.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config: Option<String>) -> Result<DgCanvas, JsValue> {
        console_error_panic_hook_setup();
        init_logging();

        let config = match config {
            Some(json) => InteractionConfig::from_json(&json).map_err(to_js)?,
            None => InteractionConfig::default(),
        };
        // Focus requires a tab index on a canvas.
        canvas.set_tab_index(0);
        let surface = WebSurface {
            canvas: canvas.clone(),
            dirty: true,
        };
        let controller = DiagramController::with_surface(Default::default(), config, surface);
        Ok(Self {
            router: Rc::new(RefCell::new(MouseRouter::new(controller))),
            events: None,
            canvas,
        })
    }

    /// Start routing the canvas's mouse events. Calling it twice is a no-op.
    pub fn attach(&mut self) {
        if self.events.is_some() {
            return;
        }
        let mut events = CanvasEvents::new(self.canvas.clone());
        hook_events(&self.router, &mut events);
        events.suppress_context_menu();
        self.events = Some(events);
    }

    /// Stop routing mouse events.
    pub fn detach(&mut self) {
        self.events = None;
    }

    pub fn add_box(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<String, JsValue> {
        self.add(Shape::boxed(Rect::new(x, y, width, height)))
    }

    pub fn add_ellipse(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<String, JsValue> {
        let bounds = Rect::new(x, y, width, height);
        self.add(Shape::with_kind(ShapeKind::Ellipse, bounds))
    }

    pub fn add_diamond(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<String, JsValue> {
        let bounds = Rect::new(x, y, width, height);
        self.add(Shape::with_kind(ShapeKind::Diamond, bounds))
    }

    pub fn add_text(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        content: String,
    ) -> Result<String, JsValue> {
        self.add(Shape::with_kind(
            ShapeKind::Text { content },
            Rect::new(x, y, width, height),
        ))
    }

    pub fn add_connector(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    ) -> Result<String, JsValue> {
        self.add(Shape::connector(Point::new(x1, y1), Point::new(x2, y2)))
    }

    /// Group the listed top-level shapes; returns the group id.
    pub fn group(&mut self, ids: Vec<String>) -> Result<String, JsValue> {
        let members: Vec<ShapeId> = ids.iter().map(|id| ShapeId::named(id)).collect();
        self.with_router(|router| {
            let group = router.group_shapes(&members).map_err(to_js)?;
            Ok(group.to_string())
        })?
    }

    /// Attach one end of a connector to connection point `point` (0 top,
    /// 1 right, 2 bottom, 3 left) of `target`.
    pub fn connect(
        &mut self,
        connector: &str,
        at_end: bool,
        target: &str,
        point: usize,
    ) -> Result<(), JsValue> {
        let anchor = if at_end {
            AnchorKind::End
        } else {
            AnchorKind::Start
        };
        let (connector, target) = (ShapeId::named(connector), ShapeId::named(target));
        self.with_router(|router| {
            let controller = router.canvas_mut();
            controller
                .diagram
                .connect(connector, anchor, target, point)
                .map_err(to_js)?;
            controller.surface.dirty = true;
            Ok(())
        })?
    }

    /// Set a shape's fill and border, as `#RRGGBB` or `#RRGGBBAA`.
    pub fn set_colors(&mut self, id: &str, fill: &str, border: &str) -> Result<(), JsValue> {
        let id = ShapeId::named(id);
        self.with_router(|router| {
            let controller = router.canvas_mut();
            controller.diagram.restyle(id, fill, border).map_err(to_js)?;
            controller.surface.dirty = true;
            Ok(())
        })?
    }

    /// Remove a shape, its group members, and every handle the router holds
    /// on them.
    pub fn remove_shape(&mut self, id: &str) -> Result<bool, JsValue> {
        let id = ShapeId::named(id);
        self.with_router(|router| router.remove_shape(id))
    }

    /// Paint the diagram and clear the damage flag.
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
        let (width, height) = (self.canvas.width() as f64, self.canvas.height() as f64);
        self.with_router(|router| {
            let controller = router.canvas_mut();
            let options = render2d::PaintOptions {
                width,
                height,
                anchor_size: controller.config.anchor_size,
            };
            render2d::paint_diagram(ctx, &controller.diagram, &options);
            controller.surface.dirty = false;
        })
    }

    pub fn needs_repaint(&self) -> bool {
        self.router
            .try_borrow()
            .is_ok_and(|router| router.canvas().surface.dirty)
    }

    pub fn selected_ids(&self) -> Result<js_sys::Array, JsValue> {
        let router = self.router.try_borrow().map_err(to_js)?;
        Ok(router
            .canvas()
            .diagram
            .selected()
            .iter()
            .map(|id| JsValue::from_str(id.as_str()))
            .collect())
    }

    /// Interaction state as JSON, for debugging overlays.
    pub fn interaction_json(&self) -> Result<String, JsValue> {
        let router = self.router.try_borrow().map_err(to_js)?;
        serde_json::to_string(router.state()).map_err(to_js)
    }
}

impl DgCanvas {
    fn add(&mut self, shape: Shape) -> Result<String, JsValue> {
        self.with_router(|router| {
            let controller = router.canvas_mut();
            let id = controller.diagram.add(shape);
            controller.surface.dirty = true;
            id.to_string()
        })
    }

    fn with_router<R>(&self, f: impl FnOnce(&mut Router) -> R) -> Result<R, JsValue> {
        let mut router = self.router.try_borrow_mut().map_err(to_js)?;
        Ok(f(&mut router))
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ─── Logging ─────────────────────────────────────────────────────────────

struct ConsoleLog;

impl log::Log for ConsoleLog {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static CONSOLE_LOG: ConsoleLog = ConsoleLog;

fn init_logging() {
    if log::set_logger(&CONSOLE_LOG).is_ok() {
        log::set_max_level(log::LevelFilter::Warn);
    }
}

/// Set the console log level: `error`, `warn`, `info`, `debug`, or `trace`.
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> bool {
    match level.parse::<log::LevelFilter>() {
        Ok(filter) => {
            log::set_max_level(filter);
            true
        }
        Err(_) => false,
    }
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("DG WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn releases_are_heard_outside_the_canvas() {
        assert_eq!(binding(EventKind::Up), ("mouseup", Scope::Window));
        assert_eq!(binding(EventKind::Down), ("mousedown", Scope::Canvas));
        assert_eq!(binding(EventKind::Move), ("mousemove", Scope::Canvas));
    }

    #[test]
    fn log_levels_parse_case_insensitively() {
        assert!(set_log_level("TRACE"));
        assert!(set_log_level("warn"));
        assert!(!set_log_level("loud"));
        assert_eq!(log::max_level(), log::LevelFilter::Warn);
    }
}
