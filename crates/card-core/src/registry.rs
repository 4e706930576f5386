//! Component Registry: the catalog of creatable node types.
//!
//! Pure configuration state. Populated once at startup (usually from
//! [`ComponentRegistry::builtin`] or a JSON catalog) and only read afterwards.

use crate::error::{EditorError, EditorResult};
use crate::id::NodeId;
use crate::model::{Node, NodePatch, NodeProps, NodeType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_true() -> bool {
    true
}

/// Type descriptor: `{type, displayName, defaultProps, isCanvas?, isResizable, isDeletable}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub display_name: String,
    /// Overrides on top of the type's built-in defaults, geometry included.
    #[serde(default)]
    pub default_props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_canvas: Option<bool>,
    #[serde(default = "default_true")]
    pub is_resizable: bool,
    #[serde(default = "default_true")]
    pub is_deletable: bool,
}

impl ComponentConfig {
    pub fn new(node_type: NodeType, display_name: impl Into<String>) -> Self {
        Self {
            node_type,
            display_name: display_name.into(),
            default_props: Map::new(),
            is_canvas: None,
            is_resizable: true,
            is_deletable: true,
        }
    }

    #[must_use]
    pub fn with_default(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.default_props.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_flags(mut self, is_resizable: bool, is_deletable: bool) -> Self {
        self.is_resizable = is_resizable;
        self.is_deletable = is_deletable;
        self
    }

    pub fn is_canvas(&self) -> bool {
        self.is_canvas.unwrap_or_else(|| self.node_type.is_canvas())
    }

    /// Typed default properties: the type's built-ins with `defaultProps`
    /// merged on top.
    pub fn props(&self) -> EditorResult<NodeProps> {
        props_with_overrides(self.node_type, &self.default_props)
    }

    /// Build a fresh root-level node of this component.
    pub fn instantiate(&self, id: NodeId) -> EditorResult<Node> {
        let mut node = Node::new(id, self.display_name.clone(), self.props()?);
        node.is_resizable = self.is_resizable;
        node.is_deletable = self.is_deletable;
        Ok(node)
    }

    fn check(&self) -> EditorResult<()> {
        if self.is_canvas() != self.node_type.is_canvas() {
            return Err(EditorError::InvalidProperty {
                node_type: self.node_type,
                key: "isCanvas".into(),
                reason: "only group and container can hold children".into(),
            });
        }
        self.props().map(|_| ())
    }
}

/// Built-in defaults for `node_type` with an open override map applied.
pub fn props_with_overrides(
    node_type: NodeType,
    overrides: &Map<String, Value>,
) -> EditorResult<NodeProps> {
    let mut props = NodeProps::default_for(node_type);
    if overrides.is_empty() {
        return Ok(props);
    }
    let patch = NodePatch::from_value(&Value::Object(overrides.clone()))?;
    props.merge_fields(&patch.fields)?;
    patch.geometry.apply(props.geometry_mut());
    Ok(props)
}

/// Ordered catalog of component descriptors, at most one per type.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    entries: Vec<ComponentConfig>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The 13 built-in node types in palette order.
    pub fn builtin() -> Self {
        let entries = vec![
            ComponentConfig::new(NodeType::Heading, "Heading"),
            ComponentConfig::new(NodeType::Text, "Text"),
            ComponentConfig::new(NodeType::Paragraph, "Paragraph"),
            ComponentConfig::new(NodeType::Image, "Image"),
            ComponentConfig::new(NodeType::Rectangle, "Rectangle"),
            ComponentConfig::new(NodeType::Circle, "Circle"),
            ComponentConfig::new(NodeType::Button, "Button"),
            ComponentConfig::new(NodeType::Badge, "Badge"),
            ComponentConfig::new(NodeType::Icon, "Icon"),
            ComponentConfig::new(NodeType::Divider, "Divider"),
            ComponentConfig::new(NodeType::Container, "Container"),
            ComponentConfig::new(NodeType::Spacer, "Spacer"),
            ComponentConfig::new(NodeType::Group, "Group"),
        ];
        Self { entries }
    }

    /// Load a catalog from a JSON array of descriptors.
    pub fn from_json(text: &str) -> EditorResult<Self> {
        let configs: Vec<ComponentConfig> = serde_json::from_str(text)?;
        let mut registry = Self::new();
        for config in configs {
            registry.register(config)?;
        }
        Ok(registry)
    }

    /// Add a descriptor. A later registration for the same type replaces
    /// the former one in place, keeping its catalog position.
    pub fn register(&mut self, config: ComponentConfig) -> EditorResult<()> {
        config.check()?;
        match self
            .entries
            .iter_mut()
            .find(|c| c.node_type == config.node_type)
        {
            Some(slot) => *slot = config,
            None => self.entries.push(config),
        }
        Ok(())
    }

    pub fn get(&self, node_type: NodeType) -> Option<&ComponentConfig> {
        self.entries.iter().find(|c| c.node_type == node_type)
    }

    pub fn all(&self) -> &[ComponentConfig] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
