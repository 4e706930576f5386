//! In-memory rendering surface.
//!
//! Keeps display objects in plain maps and logs every call it receives.
//! Used by headless hosts (export workers, servers) and by tests to observe
//! exactly what the bridge asked the surface to do.

use card_core::{NodeId, NodeType};
use std::collections::{BTreeMap, HashSet};

use crate::renderer::{
    DisplayBody, DisplayDelta, DisplaySpec, Interactivity, RenderError, RenderResult, Renderer,
};

/// Handle of a headless display object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u32);

/// One call received by the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Create(NodeId),
    Update(NodeId, DisplayDelta),
    Destroy(NodeId),
    SetInteractivity(NodeId, Interactivity),
    Restack(usize),
    Dispose,
}

/// A part inside a composite container.
#[derive(Debug, Clone, PartialEq)]
pub struct PartObject {
    pub interactive: bool,
    /// Always `None`: only the container points back at the node.
    pub node_ref: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessObject {
    pub node_ref: Option<NodeId>,
    pub spec: DisplaySpec,
    pub interactivity: Interactivity,
    pub parts: Vec<PartObject>,
}

pub struct HeadlessSurface {
    objects: BTreeMap<ObjectHandle, HeadlessObject>,
    stack: Vec<ObjectHandle>,
    next_handle: u32,
    ops: Vec<SurfaceOp>,
    rejected: HashSet<NodeType>,
    ready: bool,
    disposed: bool,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            stack: Vec::new(),
            next_handle: 1,
            ops: Vec::new(),
            rejected: HashSet::new(),
            ready: true,
            disposed: false,
        }
    }

    /// Make creation fail for `node_type`, as a backend without support
    /// for it would.
    #[must_use]
    pub fn rejecting(mut self, node_type: NodeType) -> Self {
        self.rejected.insert(node_type);
        self
    }

    pub fn accept(&mut self, node_type: NodeType) {
        self.rejected.remove(&node_type);
    }

    /// Simulate async initialization still running (or finished).
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&HeadlessObject> {
        self.objects.get(&handle)
    }

    /// Reverse lookup through the stored back-references.
    pub fn handle_for(&self, node: NodeId) -> Option<ObjectHandle> {
        self.objects
            .iter()
            .find(|(_, o)| o.node_ref == Some(node))
            .map(|(h, _)| *h)
    }

    /// Node ids bottom to top, as currently stacked.
    pub fn stacked_nodes(&self) -> Vec<NodeId> {
        self.stack
            .iter()
            .filter_map(|h| self.objects.get(h).and_then(|o| o.node_ref))
            .collect()
    }

    fn node_of(&self, handle: ObjectHandle) -> RenderResult<NodeId> {
        self.objects
            .get(&handle)
            .and_then(|o| o.node_ref)
            .ok_or(RenderError::UnknownHandle)
    }
}

impl Renderer for HeadlessSurface {
    type Handle = ObjectHandle;

    fn create_display_object(&mut self, spec: &DisplaySpec) -> RenderResult<ObjectHandle> {
        if !self.ready {
            return Err(RenderError::NotReady);
        }
        if self.rejected.contains(&spec.node_type) {
            return Err(RenderError::Unsupported(spec.node_type));
        }
        let parts = match &spec.body {
            DisplayBody::Single(_) => Vec::new(),
            DisplayBody::Composite(prims) => prims
                .iter()
                .map(|_| PartObject {
                    interactive: false,
                    node_ref: None,
                })
                .collect(),
        };
        let handle = ObjectHandle(self.next_handle);
        self.next_handle += 1;
        self.objects.insert(
            handle,
            HeadlessObject {
                node_ref: Some(spec.node),
                spec: spec.clone(),
                interactivity: Interactivity::NONE,
                parts,
            },
        );
        self.stack.push(handle);
        self.ops.push(SurfaceOp::Create(spec.node));
        Ok(handle)
    }

    fn update_display_object(&mut self, handle: ObjectHandle, delta: &DisplayDelta) -> RenderResult<()> {
        let node = self.node_of(handle)?;
        let object = self
            .objects
            .get_mut(&handle)
            .ok_or(RenderError::UnknownHandle)?;
        delta.geometry.apply(&mut object.spec.geometry);
        if let Some(body) = &delta.body {
            object.spec.body = body.clone();
        }
        self.ops.push(SurfaceOp::Update(node, delta.clone()));
        Ok(())
    }

    fn destroy_display_object(&mut self, handle: ObjectHandle) {
        if let Some(object) = self.objects.remove(&handle) {
            self.stack.retain(|h| *h != handle);
            if let Some(node) = object.node_ref {
                self.ops.push(SurfaceOp::Destroy(node));
            }
        }
    }

    fn set_interactivity(&mut self, handle: ObjectHandle, interactivity: Interactivity) -> RenderResult<()> {
        let node = self.node_of(handle)?;
        if let Some(object) = self.objects.get_mut(&handle) {
            // parts of a composite stay inert whatever the container allows
            object.interactivity = interactivity;
        }
        self.ops.push(SurfaceOp::SetInteractivity(node, interactivity));
        Ok(())
    }

    fn set_stack_order(&mut self, handles: &[ObjectHandle]) -> RenderResult<()> {
        if let Some(unknown) = handles.iter().find(|h| !self.objects.contains_key(h)) {
            log::warn!("restack names unknown object {unknown:?}");
            return Err(RenderError::UnknownHandle);
        }
        self.stack = handles.to_vec();
        self.ops.push(SurfaceOp::Restack(handles.len()));
        Ok(())
    }

    fn node_ref(&self, handle: ObjectHandle) -> Option<NodeId> {
        self.objects.get(&handle).and_then(|o| o.node_ref)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn dispose(&mut self) {
        self.objects.clear();
        self.stack.clear();
        self.disposed = true;
        self.ops.push(SurfaceOp::Dispose);
        log::info!("headless surface disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_core::{Node, NodeProps};

    fn spec(id: &str, t: NodeType) -> DisplaySpec {
        DisplaySpec::from_node(&Node::new(NodeId::intern(id), id, NodeProps::default_for(t)))
    }

    #[test]
    fn composite_parts_are_inert_and_unreferenced() {
        let mut surface = HeadlessSurface::new();
        let h = surface
            .create_display_object(&spec("hs_badge", NodeType::Badge))
            .unwrap();
        let object = surface.object(h).unwrap();
        assert_eq!(object.node_ref, Some(NodeId::intern("hs_badge")));
        assert_eq!(object.parts.len(), 2);
        assert!(object.parts.iter().all(|p| !p.interactive && p.node_ref.is_none()));
    }

    #[test]
    fn rejected_types_and_readiness() {
        let mut surface = HeadlessSurface::new().rejecting(NodeType::Image);
        assert_eq!(
            surface.create_display_object(&spec("hs_img", NodeType::Image)),
            Err(RenderError::Unsupported(NodeType::Image))
        );
        surface.set_ready(false);
        assert_eq!(
            surface.create_display_object(&spec("hs_txt", NodeType::Text)),
            Err(RenderError::NotReady)
        );
        assert!(surface.is_empty());
    }

    #[test]
    fn dispose_drops_everything() {
        let mut surface = HeadlessSurface::new();
        surface
            .create_display_object(&spec("hs_r", NodeType::Rectangle))
            .unwrap();
        surface.dispose();
        assert!(surface.is_empty());
        assert!(surface.is_disposed());
        assert_eq!(surface.ops().last(), Some(&SurfaceOp::Dispose));
    }
}
