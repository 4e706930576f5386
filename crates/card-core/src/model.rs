//! Document data model.
//!
//! A node is a tagged union over its type: every variant carries its own
//! strongly-typed property struct, and all of them share the flattened
//! [`Geometry`] sub-struct. On the wire a node looks like
//!
//! ```json
//! { "id": "t1", "displayName": "Title", "type": "text",
//!   "props": { "x": 10, "y": 10, "width": 100, "height": 20, "rotation": 0, "text": "hi" },
//!   "parentId": "group_3", "isResizable": true, "isDeletable": true }
//! ```

use crate::error::{EditorError, EditorResult, Permission};
use crate::geometry::{Bounds, Geometry, GeometryPatch};
use crate::id::NodeId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0]; serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_val(c: u8) -> Option<u8> {
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

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from 8-bit channels. Survives a hex round-trip exactly.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<f32> {
            let v = (hex_val(bytes[i])? << 4) | hex_val(bytes[i + 1])?;
            Some(v as f32 / 255.0)
        };

        match bytes.len() {
            3 => {
                let short = |i: usize| -> Option<f32> { Some((hex_val(bytes[i])? * 17) as f32 / 255.0) };
                Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0))
            }
            6 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, 1.0)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (byte(self.r), byte(self.g), byte(self.b), byte(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color `{s}`")))
    }
}

// ─── Node types ──────────────────────────────────────────────────────────

/// Closed set of node type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Text,
    Image,
    Rectangle,
    Circle,
    Button,
    Badge,
    Heading,
    Paragraph,
    Icon,
    Divider,
    Container,
    Spacer,
    Group,
}

impl NodeType {
    pub const ALL: [NodeType; 13] = [
        NodeType::Text,
        NodeType::Image,
        NodeType::Rectangle,
        NodeType::Circle,
        NodeType::Button,
        NodeType::Badge,
        NodeType::Heading,
        NodeType::Paragraph,
        NodeType::Icon,
        NodeType::Divider,
        NodeType::Container,
        NodeType::Spacer,
        NodeType::Group,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Text => "text",
            NodeType::Image => "image",
            NodeType::Rectangle => "rectangle",
            NodeType::Circle => "circle",
            NodeType::Button => "button",
            NodeType::Badge => "badge",
            NodeType::Heading => "heading",
            NodeType::Paragraph => "paragraph",
            NodeType::Icon => "icon",
            NodeType::Divider => "divider",
            NodeType::Container => "container",
            NodeType::Spacer => "spacer",
            NodeType::Group => "group",
        }
    }

    /// Types that may act as a parent of other nodes.
    pub fn is_canvas(&self) -> bool {
        matches!(self, NodeType::Group | NodeType::Container)
    }

    /// Types drawn as several native primitives under one container.
    pub fn is_composite(&self) -> bool {
        matches!(self, NodeType::Button | NodeType::Badge)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EditorError::Parse(format!("unknown node type `{s}`")))
    }
}

// ─── Per-type properties ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Text, heading and paragraph nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProps {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub text: String,
    pub font_size: f32,
    pub font_family: String,
    pub font_weight: u16,
    pub color: Color,
    pub align: TextAlign,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            geometry: Geometry::new(0.0, 0.0, 200.0, 24.0),
            text: String::new(),
            font_size: 16.0,
            font_family: "Inter".into(),
            font_weight: 400,
            color: Color::BLACK,
            align: TextAlign::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProps {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub src: String,
    pub alt: String,
    pub corner_radius: f32,
}

impl Default for ImageProps {
    fn default() -> Self {
        Self {
            geometry: Geometry::new(0.0, 0.0, 160.0, 120.0),
            src: String::new(),
            alt: String::new(),
            corner_radius: 0.0,
        }
    }
}

/// Rectangle and circle nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeProps {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub fill: Color,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    pub corner_radius: f32,
}

impl Default for ShapeProps {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            fill: Color::rgb8(217, 217, 217),
            stroke: None,
            stroke_width: 0.0,
            corner_radius: 0.0,
        }
    }
}

/// Button and badge nodes: a background shape with a centered label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelProps {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub label: String,
    pub background: Color,
    pub text_color: Color,
    pub font_size: f32,
    pub corner_radius: f32,
}

impl Default for LabelProps {
    fn default() -> Self {
        Self {
            geometry: Geometry::new(0.0, 0.0, 120.0, 40.0),
            label: String::new(),
            background: Color::BLACK,
            text_color: Color::WHITE,
            font_size: 14.0,
            corner_radius: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IconProps {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub name: String,
    pub color: Color,
}

impl Default for IconProps {
    fn default() -> Self {
        Self {
            geometry: Geometry::new(0.0, 0.0, 24.0, 24.0),
            name: "star".into(),
            color: Color::BLACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DividerProps {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub color: Color,
    pub thickness: f32,
}

impl Default for DividerProps {
    fn default() -> Self {
        Self {
            geometry: Geometry::new(0.0, 0.0, 200.0, 1.0),
            color: Color::rgb8(204, 204, 204),
            thickness: 1.0,
        }
    }
}

/// A visible, canvas-capable box. Keeps its own declared geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerProps {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub background: Option<Color>,
    pub border: Option<Color>,
    pub corner_radius: f32,
    pub padding: f32,
}

impl Default for ContainerProps {
    fn default() -> Self {
        Self {
            geometry: Geometry::new(0.0, 0.0, 300.0, 200.0),
            background: Some(Color::WHITE),
            border: None,
            corner_radius: 0.0,
            padding: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacerProps {
    #[serde(flatten)]
    pub geometry: Geometry,
}

/// Group geometry is derived: it always covers its children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupProps {
    #[serde(flatten)]
    pub geometry: Geometry,
}

/// Type tag plus typed properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "props", rename_all = "lowercase")]
pub enum NodeProps {
    Text(TextProps),
    Image(ImageProps),
    Rectangle(ShapeProps),
    Circle(ShapeProps),
    Button(LabelProps),
    Badge(LabelProps),
    Heading(TextProps),
    Paragraph(TextProps),
    Icon(IconProps),
    Divider(DividerProps),
    Container(ContainerProps),
    Spacer(SpacerProps),
    Group(GroupProps),
}

const GEOMETRY_KEYS: [&str; 5] = ["x", "y", "width", "height", "rotation"];

impl NodeProps {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeProps::Text(_) => NodeType::Text,
            NodeProps::Image(_) => NodeType::Image,
            NodeProps::Rectangle(_) => NodeType::Rectangle,
            NodeProps::Circle(_) => NodeType::Circle,
            NodeProps::Button(_) => NodeType::Button,
            NodeProps::Badge(_) => NodeType::Badge,
            NodeProps::Heading(_) => NodeType::Heading,
            NodeProps::Paragraph(_) => NodeType::Paragraph,
            NodeProps::Icon(_) => NodeType::Icon,
            NodeProps::Divider(_) => NodeType::Divider,
            NodeProps::Container(_) => NodeType::Container,
            NodeProps::Spacer(_) => NodeType::Spacer,
            NodeProps::Group(_) => NodeType::Group,
        }
    }

    /// Default properties for a type.
    pub fn default_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Text => NodeProps::Text(TextProps {
                text: "Text".into(),
                ..Default::default()
            }),
            NodeType::Heading => NodeProps::Heading(TextProps {
                geometry: Geometry::new(0.0, 0.0, 280.0, 36.0),
                text: "Heading".into(),
                font_size: 28.0,
                font_weight: 700,
                ..Default::default()
            }),
            NodeType::Paragraph => NodeProps::Paragraph(TextProps {
                geometry: Geometry::new(0.0, 0.0, 280.0, 72.0),
                text: "Paragraph text".into(),
                font_size: 14.0,
                ..Default::default()
            }),
            NodeType::Image => NodeProps::Image(ImageProps::default()),
            NodeType::Rectangle => NodeProps::Rectangle(ShapeProps::default()),
            NodeType::Circle => NodeProps::Circle(ShapeProps {
                geometry: Geometry::new(0.0, 0.0, 80.0, 80.0),
                ..Default::default()
            }),
            NodeType::Button => NodeProps::Button(LabelProps {
                label: "Button".into(),
                ..Default::default()
            }),
            NodeType::Badge => NodeProps::Badge(LabelProps {
                geometry: Geometry::new(0.0, 0.0, 64.0, 24.0),
                label: "New".into(),
                background: Color::rgb8(51, 102, 255),
                font_size: 12.0,
                corner_radius: 12.0,
                ..Default::default()
            }),
            NodeType::Icon => NodeProps::Icon(IconProps::default()),
            NodeType::Divider => NodeProps::Divider(DividerProps::default()),
            NodeType::Container => NodeProps::Container(ContainerProps::default()),
            NodeType::Spacer => NodeProps::Spacer(SpacerProps {
                geometry: Geometry::new(0.0, 0.0, 200.0, 24.0),
            }),
            NodeType::Group => NodeProps::Group(GroupProps::default()),
        }
    }

    pub fn geometry(&self) -> &Geometry {
        match self {
            NodeProps::Text(p) | NodeProps::Heading(p) | NodeProps::Paragraph(p) => &p.geometry,
            NodeProps::Image(p) => &p.geometry,
            NodeProps::Rectangle(p) | NodeProps::Circle(p) => &p.geometry,
            NodeProps::Button(p) | NodeProps::Badge(p) => &p.geometry,
            NodeProps::Icon(p) => &p.geometry,
            NodeProps::Divider(p) => &p.geometry,
            NodeProps::Container(p) => &p.geometry,
            NodeProps::Spacer(p) => &p.geometry,
            NodeProps::Group(p) => &p.geometry,
        }
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        match self {
            NodeProps::Text(p) | NodeProps::Heading(p) | NodeProps::Paragraph(p) => {
                &mut p.geometry
            }
            NodeProps::Image(p) => &mut p.geometry,
            NodeProps::Rectangle(p) | NodeProps::Circle(p) => &mut p.geometry,
            NodeProps::Button(p) | NodeProps::Badge(p) => &mut p.geometry,
            NodeProps::Icon(p) => &mut p.geometry,
            NodeProps::Divider(p) => &mut p.geometry,
            NodeProps::Container(p) => &mut p.geometry,
            NodeProps::Spacer(p) => &mut p.geometry,
            NodeProps::Group(p) => &mut p.geometry,
        }
    }

    /// Merge type-specific fields (everything but geometry) by name.
    ///
    /// Unknown keys and ill-typed values are rejected and `self` is left
    /// unchanged.
    pub fn merge_fields(&mut self, fields: &Map<String, Value>) -> EditorResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let node_type = self.node_type();
        let invalid = |key: &str, reason: String| EditorError::InvalidProperty {
            node_type,
            key: key.to_string(),
            reason,
        };

        let mut value = serde_json::to_value(&*self)?;
        let props = value
            .get_mut("props")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| invalid("props", "properties did not serialize as an object".into()))?;

        for (key, v) in fields {
            if GEOMETRY_KEYS.contains(&key.as_str()) {
                return Err(invalid(key, "geometry is patched through GeometryPatch".into()));
            }
            match props.get_mut(key) {
                Some(slot) => *slot = v.clone(),
                None => return Err(invalid(key, "unknown field".into())),
            }
        }

        let merged: NodeProps = serde_json::from_value(value).map_err(|e| {
            let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
            invalid(&keys.join(","), e.to_string())
        })?;
        *self = merged;
        Ok(())
    }
}

// ─── Node ────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

/// One document element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub display_name: String,
    #[serde(flatten)]
    pub props: NodeProps,
    /// Containing group or container; `None` for root-level nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default = "default_true")]
    pub is_resizable: bool,
    #[serde(default = "default_true")]
    pub is_deletable: bool,
}

impl Node {
    pub fn new(id: NodeId, display_name: impl Into<String>, props: NodeProps) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            props,
            parent_id: None,
            is_resizable: true,
            is_deletable: true,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        *self.props.geometry_mut() = geometry;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, is_resizable: bool, is_deletable: bool) -> Self {
        self.is_resizable = is_resizable;
        self.is_deletable = is_deletable;
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.props.node_type()
    }

    pub fn geometry(&self) -> &Geometry {
        self.props.geometry()
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        self.props.geometry_mut()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::of(self.geometry())
    }

    pub fn is_canvas(&self) -> bool {
        self.node_type().is_canvas()
    }

    /// Apply a patch in place. Size changes on a non-resizable node are
    /// rejected before anything is written.
    pub fn apply_patch(&mut self, patch: &NodePatch) -> EditorResult<()> {
        if !self.is_resizable && patch.geometry.changes_size(self.geometry()) {
            return Err(EditorError::Permission {
                node: self.id,
                operation: Permission::Resize,
            });
        }
        // Fields first: it is the only step that can still fail.
        self.props.merge_fields(&patch.fields)?;
        patch.geometry.apply(self.props.geometry_mut());
        if let Some(name) = &patch.display_name {
            self.display_name.clone_from(name);
        }
        if let Some(resizable) = patch.is_resizable {
            self.is_resizable = resizable;
        }
        if let Some(deletable) = patch.is_deletable {
            self.is_deletable = deletable;
        }
        Ok(())
    }
}

// ─── Patches ─────────────────────────────────────────────────────────────

/// Partial node update: geometry, label, permission overrides, and
/// type-specific fields by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub geometry: GeometryPatch,
    pub display_name: Option<String>,
    pub is_resizable: Option<bool>,
    pub is_deletable: Option<bool>,
    pub fields: Map<String, Value>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_geometry(geometry: GeometryPatch) -> Self {
        Self {
            geometry,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn x(mut self, x: f32) -> Self {
        self.geometry.x = Some(x);
        self
    }

    #[must_use]
    pub fn y(mut self, y: f32) -> Self {
        self.geometry.y = Some(y);
        self
    }

    #[must_use]
    pub fn position(self, x: f32, y: f32) -> Self {
        self.x(x).y(y)
    }

    #[must_use]
    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.geometry.width = Some(width);
        self.geometry.height = Some(height);
        self
    }

    #[must_use]
    pub fn rotation(mut self, degrees: f32) -> Self {
        self.geometry.rotation = Some(degrees);
        self
    }

    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn resizable(mut self, value: bool) -> Self {
        self.is_resizable = Some(value);
        self
    }

    #[must_use]
    pub fn deletable(mut self, value: bool) -> Self {
        self.is_deletable = Some(value);
        self
    }

    /// Set a type-specific field, e.g. `field("text", "Hello")`.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
            && self.display_name.is_none()
            && self.is_resizable.is_none()
            && self.is_deletable.is_none()
            && self.fields.is_empty()
    }

    /// Build a patch from a property-panel style JSON object such as
    /// `{"x": 50, "text": "hi"}`. Geometry and flag keys are routed to their
    /// typed slots; everything else becomes a type-specific field.
    pub fn from_value(value: &Value) -> EditorResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| EditorError::Parse("patch must be a JSON object".into()))?;
        let number = |key: &str, v: &Value| -> EditorResult<f32> {
            v.as_f64()
                .map(|n| n as f32)
                .ok_or_else(|| EditorError::Parse(format!("`{key}` must be a number")))
        };
        let boolean = |key: &str, v: &Value| -> EditorResult<bool> {
            v.as_bool()
                .ok_or_else(|| EditorError::Parse(format!("`{key}` must be a boolean")))
        };

        let mut patch = NodePatch::new();
        for (key, v) in object {
            match key.as_str() {
                "x" => patch.geometry.x = Some(number(key, v)?),
                "y" => patch.geometry.y = Some(number(key, v)?),
                "width" => patch.geometry.width = Some(number(key, v)?),
                "height" => patch.geometry.height = Some(number(key, v)?),
                "rotation" => patch.geometry.rotation = Some(number(key, v)?),
                "displayName" => {
                    let name = v.as_str().ok_or_else(|| {
                        EditorError::Parse("`displayName` must be a string".into())
                    })?;
                    patch.display_name = Some(name.to_string());
                }
                "isResizable" => patch.is_resizable = Some(boolean(key, v)?),
                "isDeletable" => patch.is_deletable = Some(boolean(key, v)?),
                _ => {
                    patch.fields.insert(key.clone(), v.clone());
                }
            }
        }
        Ok(patch)
    }
}

/// Editing vs. presentation mode of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Edit,
    Preview,
}
