//! Drag-and-drop payloads and the viewport transform.
//!
//! Two payload shapes cross the drag boundary as JSON:
//!
//! - palette → canvas: `{"dragType": "component", "type", "displayName", "defaultProps"}`
//! - layers list reorder: `{"nodeId": "..."}` (a `"dragType": "node"` tag is accepted too)

use card_core::{
    ComponentConfig, ComponentRegistry, EditorError, EditorResult, Node, NodeId, NodeType,
    props_with_overrides,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a palette item carries while dragged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDrag {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub display_name: String,
    #[serde(default)]
    pub default_props: Map<String, Value>,
}

impl ComponentDrag {
    pub fn from_config(config: &ComponentConfig) -> Self {
        Self {
            node_type: config.node_type,
            display_name: config.display_name.clone(),
            default_props: config.default_props.clone(),
        }
    }

    /// Build the node this drop creates, positioned at document `(x, y)`.
    /// Permission flags come from the registry entry for the type, if any.
    pub fn build_node(
        &self,
        id: NodeId,
        registry: &ComponentRegistry,
        x: f32,
        y: f32,
    ) -> EditorResult<Node> {
        let props = props_with_overrides(self.node_type, &self.default_props)?;
        let mut node = Node::new(id, self.display_name.clone(), props);
        if let Some(config) = registry.get(self.node_type) {
            node.is_resizable = config.is_resizable;
            node.is_deletable = config.is_deletable;
        }
        let g = node.geometry_mut();
        g.x = x;
        g.y = y;
        Ok(node)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragPayload {
    Component(ComponentDrag),
    Node(NodeId),
}

impl DragPayload {
    pub fn to_value(&self) -> EditorResult<Value> {
        match self {
            DragPayload::Component(drag) => {
                let mut value = serde_json::to_value(drag)?;
                if let Some(obj) = value.as_object_mut() {
                    obj.insert("dragType".into(), Value::from("component"));
                }
                Ok(value)
            }
            DragPayload::Node(id) => Ok(serde_json::json!({ "nodeId": id })),
        }
    }

    pub fn to_json(&self) -> EditorResult<String> {
        Ok(self.to_value()?.to_string())
    }

    pub fn from_json(text: &str) -> EditorResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        let drag_type = value.get("dragType").and_then(Value::as_str);
        match drag_type {
            Some("component") => Ok(DragPayload::Component(serde_json::from_value(value)?)),
            Some("node") | None => value
                .get("nodeId")
                .and_then(Value::as_str)
                .map(|id| DragPayload::Node(NodeId::intern(id)))
                .ok_or_else(|| EditorError::Parse("drag payload has no `nodeId`".into())),
            Some(other) => Err(EditorError::Parse(format!("unknown drag type `{other}`"))),
        }
    }
}

/// Viewport ↔ document mapping. `zoom` is a percentage (100 = 1:1) and
/// `origin` is where document (0, 0) sits in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f32,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 100.0,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

impl ViewTransform {
    pub fn scale(&self) -> f32 {
        self.zoom / 100.0
    }

    pub fn to_document(&self, vx: f32, vy: f32) -> (f32, f32) {
        let s = self.scale();
        ((vx - self.origin_x) / s, (vy - self.origin_y) / s)
    }

    pub fn to_viewport(&self, x: f32, y: f32) -> (f32, f32) {
        let s = self.scale();
        (x * s + self.origin_x, y * s + self.origin_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drop_point_inverts_zoom_and_origin() {
        let view = ViewTransform {
            zoom: 50.0,
            ..Default::default()
        };
        assert_eq!(view.to_document(200.0, 150.0), (400.0, 300.0));

        let panned = ViewTransform {
            zoom: 200.0,
            origin_x: 40.0,
            origin_y: 20.0,
        };
        assert_eq!(panned.to_document(240.0, 220.0), (100.0, 100.0));
        assert_eq!(panned.to_viewport(100.0, 100.0), (240.0, 220.0));
    }

    #[test]
    fn component_payload_roundtrip() {
        let registry = ComponentRegistry::builtin();
        let config = registry.get(NodeType::Rectangle).unwrap();
        let payload = DragPayload::Component(ComponentDrag::from_config(config));

        let text = payload.to_json().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["dragType"], "component");
        assert_eq!(value["type"], "rectangle");
        assert_eq!(DragPayload::from_json(&text).unwrap(), payload);
    }

    #[test]
    fn node_payload_accepts_bare_id() {
        assert_eq!(
            DragPayload::from_json(r#"{"nodeId": "d_node"}"#).unwrap(),
            DragPayload::Node(NodeId::intern("d_node"))
        );
        assert!(DragPayload::from_json(r#"{"dragType": "file"}"#).is_err());
        assert!(DragPayload::from_json(r#"{"dragType": "node"}"#).is_err());
    }

    #[test]
    fn build_node_uses_registry_flags() {
        let mut registry = ComponentRegistry::builtin();
        registry
            .register(ComponentConfig::new(NodeType::Divider, "Rule").with_flags(false, true))
            .unwrap();
        let drag = ComponentDrag {
            node_type: NodeType::Divider,
            display_name: "Rule".into(),
            default_props: Map::new(),
        };
        let node = drag
            .build_node(NodeId::intern("d_rule"), &registry, 12.0, 34.0)
            .unwrap();
        assert!(!node.is_resizable);
        assert_eq!((node.geometry().x, node.geometry().y), (12.0, 34.0));
    }
}
