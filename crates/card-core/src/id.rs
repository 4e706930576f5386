//! Node identifiers.
//!
//! Ids are interned once per process in a `lasso` rodeo, so a `NodeId` is a
//! 4-byte key that copies freely and compares without touching the string.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Suffix source for generated ids; never rewinds within a process.
static NEXT_SUFFIX: AtomicU64 = AtomicU64::new(0);

/// Identifier of a document node. Serialized as its plain string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct NodeId(Spur);

impl NodeId {
    pub fn intern(name: &str) -> Self {
        NodeId(NAMES.get_or_intern(name))
    }

    pub fn as_str(&self) -> &str {
        NAMES.resolve(&self.0)
    }

    /// Next `{prefix}_{n}` id for which `taken` is false.
    pub fn fresh(prefix: &str, mut taken: impl FnMut(NodeId) -> bool) -> Self {
        loop {
            let n = NEXT_SUFFIX.fetch_add(1, Ordering::Relaxed);
            let id = Self::intern(&format!("{prefix}_{n}"));
            if !taken(id) {
                return id;
            }
        }
    }
}

impl From<String> for NodeId {
    fn from(name: String) -> Self {
        NodeId::intern(&name)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.as_str().to_owned()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
