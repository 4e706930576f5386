//! The rendering surface collaborator.
//!
//! A [`Renderer`] owns native display objects (whatever the drawing library
//! calls them) and reports user interaction on them as [`SurfaceEvent`]s.
//! It is a derived cache of the document: the bridge tells it what to
//! create, update and destroy, and can always rebuild it from scratch.

use card_core::{Color, EditorMode, Geometry, GeometryPatch, Node, NodeId, NodeProps, NodeType};
use smallvec::{SmallVec, smallvec};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// Result type for surface operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors a surface can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// The surface cannot draw this node type.
    #[error("unsupported node type: {0}")]
    Unsupported(NodeType),

    /// The handle does not name a live display object.
    #[error("unknown display object")]
    UnknownHandle,

    /// The surface has not finished initializing.
    #[error("surface is not ready")]
    NotReady,

    /// Anything the native library reports.
    #[error("backend error: {0}")]
    Backend(String),
}

// ─── Display specs ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Rect,
    Ellipse,
    Text,
    Image,
    Icon,
    Line,
}

/// One native shape. It fills the frame of the display object it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    pub corner_radius: f32,
    /// Text content, icon name or image source, depending on `kind`.
    pub content: Option<String>,
    pub font_size: f32,
}

impl Primitive {
    fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            corner_radius: 0.0,
            content: None,
            font_size: 0.0,
        }
    }

    fn fill(mut self, color: Option<Color>) -> Self {
        self.fill = color;
        self
    }

    fn stroke(mut self, color: Option<Color>, width: f32) -> Self {
        self.stroke = color;
        self.stroke_width = width;
        self
    }

    fn radius(mut self, r: f32) -> Self {
        self.corner_radius = r;
        self
    }

    fn content(mut self, content: &str, font_size: f32) -> Self {
        self.content = Some(content.to_string());
        self.font_size = font_size;
        self
    }
}

/// A single primitive, or several primitives under one container.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayBody {
    Single(Primitive),
    /// Drawn bottom to top. Parts are never interactive on their own.
    Composite(SmallVec<[Primitive; 2]>),
}

impl DisplayBody {
    pub fn primitive_count(&self) -> usize {
        match self {
            DisplayBody::Single(_) => 1,
            DisplayBody::Composite(parts) => parts.len(),
        }
    }
}

/// Everything a surface needs to materialize one node.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySpec {
    /// Back-reference stored on the outer display object.
    pub node: NodeId,
    pub node_type: NodeType,
    pub geometry: Geometry,
    pub body: DisplayBody,
}

impl DisplaySpec {
    pub fn from_node(node: &Node) -> Self {
        use PrimitiveKind as K;

        let body = match &node.props {
            NodeProps::Text(p) | NodeProps::Heading(p) | NodeProps::Paragraph(p) => {
                DisplayBody::Single(Primitive::new(K::Text).fill(Some(p.color)).content(&p.text, p.font_size))
            }
            NodeProps::Image(p) => DisplayBody::Single(
                Primitive::new(K::Image)
                    .radius(p.corner_radius)
                    .content(&p.src, 0.0),
            ),
            NodeProps::Rectangle(p) => DisplayBody::Single(
                Primitive::new(K::Rect)
                    .fill(Some(p.fill))
                    .stroke(p.stroke, p.stroke_width)
                    .radius(p.corner_radius),
            ),
            NodeProps::Circle(p) => DisplayBody::Single(
                Primitive::new(K::Ellipse)
                    .fill(Some(p.fill))
                    .stroke(p.stroke, p.stroke_width),
            ),
            NodeProps::Button(p) | NodeProps::Badge(p) => DisplayBody::Composite(smallvec![
                Primitive::new(K::Rect)
                    .fill(Some(p.background))
                    .radius(p.corner_radius),
                Primitive::new(K::Text)
                    .fill(Some(p.text_color))
                    .content(&p.label, p.font_size),
            ]),
            NodeProps::Icon(p) => {
                DisplayBody::Single(Primitive::new(K::Icon).fill(Some(p.color)).content(&p.name, 0.0))
            }
            NodeProps::Divider(p) => {
                DisplayBody::Single(Primitive::new(K::Line).stroke(Some(p.color), p.thickness))
            }
            NodeProps::Container(p) => DisplayBody::Single(
                Primitive::new(K::Rect)
                    .fill(p.background)
                    .stroke(p.border, if p.border.is_some() { 1.0 } else { 0.0 })
                    .radius(p.corner_radius),
            ),
            // invisible frames: only their bounds are interactive
            NodeProps::Spacer(_) | NodeProps::Group(_) => DisplayBody::Single(Primitive::new(K::Rect)),
        };

        Self {
            node: node.id,
            node_type: node.node_type(),
            geometry: *node.geometry(),
            body,
        }
    }

    /// What changed between `self` (last applied) and `next`. `None` when
    /// nothing did.
    pub fn diff(&self, next: &DisplaySpec) -> Option<DisplayDelta> {
        let g = &next.geometry;
        let geometry = GeometryPatch {
            x: Some(g.x),
            y: Some(g.y),
            width: Some(g.width),
            height: Some(g.height),
            rotation: Some(g.rotation),
        }
        .diff_against(&self.geometry);
        let body = (self.body != next.body).then(|| next.body.clone());
        if geometry.is_empty() && body.is_none() {
            return None;
        }
        Some(DisplayDelta { geometry, body })
    }
}

/// Partial update of a live display object. Only touched fields are set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayDelta {
    pub geometry: GeometryPatch,
    /// Replacement appearance, when anything besides geometry changed.
    pub body: Option<DisplayBody>,
}

/// What the user may do to a display object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interactivity {
    pub selectable: bool,
    pub movable: bool,
    pub resizable: bool,
    pub rotatable: bool,
}

impl Interactivity {
    pub const NONE: Interactivity = Interactivity {
        selectable: false,
        movable: false,
        resizable: false,
        rotatable: false,
    };

    /// Everything is locked in preview; in edit mode resizing follows the
    /// node's permission flag.
    pub fn for_node(node: &Node, mode: EditorMode) -> Self {
        match mode {
            EditorMode::Preview => Self::NONE,
            EditorMode::Edit => Self {
                selectable: true,
                movable: true,
                resizable: node.is_resizable,
                rotatable: true,
            },
        }
    }
}

// ─── Surface events ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEventKind {
    Moved { x: f32, y: f32 },
    Scaled { x: f32, y: f32, width: f32, height: f32 },
    Rotated { rotation: f32 },
    Selected { additive: bool },
    Deselected,
}

impl SurfaceEventKind {
    /// Whether two events of these kinds can be merged (same variant).
    pub fn same_kind(&self, other: &SurfaceEventKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Continuous gestures stream `Update`s and finish with one `End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Update,
    End,
}

/// Interaction on a display object, with the surface's new values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceEvent<H> {
    pub handle: H,
    pub kind: SurfaceEventKind,
    pub phase: GesturePhase,
}

impl<H> SurfaceEvent<H> {
    pub fn new(handle: H, kind: SurfaceEventKind, phase: GesturePhase) -> Self {
        Self {
            handle,
            kind,
            phase,
        }
    }
}

// ─── The collaborator ────────────────────────────────────────────────────

/// A native, interactive drawing surface.
pub trait Renderer {
    /// Opaque reference to one display object.
    type Handle: Copy + Eq + Hash + fmt::Debug;

    /// Materialize a node. Composite bodies become one container whose parts
    /// are not independently interactive; the back-reference (`spec.node`)
    /// is attached to the container only.
    fn create_display_object(&mut self, spec: &DisplaySpec) -> RenderResult<Self::Handle>;

    fn update_display_object(&mut self, handle: Self::Handle, delta: &DisplayDelta) -> RenderResult<()>;

    fn destroy_display_object(&mut self, handle: Self::Handle);

    fn set_interactivity(&mut self, handle: Self::Handle, interactivity: Interactivity) -> RenderResult<()>;

    /// Restack so that `handles` paint bottom to top in this order.
    fn set_stack_order(&mut self, handles: &[Self::Handle]) -> RenderResult<()>;

    /// The node a display object stands for.
    fn node_ref(&self, handle: Self::Handle) -> Option<NodeId>;

    /// False while async initialization (fonts, images) is still running.
    fn is_ready(&self) -> bool {
        true
    }

    /// Release every native resource and event listener.
    fn dispose(&mut self);
}
