pub mod bridge;
pub mod config;
pub mod dnd;
pub mod editor;
pub mod headless;
pub mod history;
pub mod layers;
pub mod renderer;
pub mod selection;
pub mod session;
pub mod shortcuts;

pub use bridge::{EventOutcome, ReconcileReport, RendererBridge, coalesce};
pub use config::EditorConfig;
pub use dnd::{ComponentDrag, DragPayload, ViewTransform};
pub use editor::{DispatchOutcome, Editor};
pub use headless::{HeadlessSurface, ObjectHandle, SurfaceOp};
pub use history::{History, Snapshot};
pub use layers::{LayerDropTarget, LayerRow, layer_rows};
pub use renderer::{
    DisplayBody, DisplayDelta, DisplaySpec, GesturePhase, Interactivity, Primitive, PrimitiveKind,
    RenderError, RenderResult, Renderer, SurfaceEvent, SurfaceEventKind,
};
pub use selection::Selection;
pub use session::Session;
pub use shortcuts::{Direction, InputContext, KeyEvent, Modifiers, ShortcutAction, ShortcutMap};
