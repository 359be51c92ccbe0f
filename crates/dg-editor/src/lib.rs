pub mod actions;
pub mod canvas;
pub mod config;
pub mod controller;
pub mod input;
pub mod router;
pub mod routes;
pub mod state;

pub use canvas::DiagramController;
pub use config::{ConfigError, InteractionConfig, MultiSelectKey};
pub use controller::{CanvasController, CanvasSurface, HeadlessSurface};
pub use input::{Buttons, EventKind, Modifiers, PointerEvent, RawPointerEvent};
pub use router::{
    DispatchReport, MouseRouter, PointerEventSource, PointerHandler, RouteOutcome, hook_events,
};
pub use routes::{ROUTES, Route, RouteName};
pub use state::{AnchorHandle, InteractionState};
