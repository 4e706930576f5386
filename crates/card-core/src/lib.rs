pub mod error;
pub mod geometry;
pub mod grouping;
pub mod id;
pub mod model;
pub mod persist;
pub mod registry;
pub mod store;
pub mod validate;

pub use error::{EditorError, EditorResult, Permission};
pub use geometry::{Bounds, Geometry, GeometryPatch, normalize_rotation};
pub use id::NodeId;
pub use model::*;
pub use persist::{CanvasSize, DocumentFile, FORMAT_VERSION, ViewSettings};
pub use registry::{ComponentConfig, ComponentRegistry, props_with_overrides};
pub use store::{ChildMap, Document};
pub use validate::{Violation, validate_document};
