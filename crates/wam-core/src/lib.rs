pub mod document;
pub mod error;
pub mod geometry;
pub mod id;
pub mod model;
pub mod property;
pub mod scene;
pub mod template;

pub use document::{DEFAULT_TITLE, DiagramDocument};
pub use error::{FactoryError, FieldError, ImportError, SceneError, ValidationError};
pub use geometry::{Bounds, Point, Size};
pub use id::EntityId;
pub use model::*;
pub use property::{CellData, FileRef, PropertyDescriptor, PropertyKind, PropertyValue};
pub use scene::{CellRecord, GraphEvent, SceneGraph, SceneSnapshot};
pub use template::{LinkTemplate, ShapeFactory, ShapeTemplate, TemplateRegistry};
