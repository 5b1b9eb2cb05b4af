pub mod document;
pub mod error;
pub mod geometry;
pub mod id;
pub mod model;
pub mod paint;
pub mod patch;
pub mod persist;
pub mod rules;
pub mod text;

pub use document::{DUPLICATE_OFFSET, DesignDocument, ReorderDirection, Selection};
pub use error::{DocumentError, PersistError};
pub use geometry::{Aabb, Transform, Vec2};
pub use id::LayerId;
pub use model::*;
pub use paint::*;
pub use patch::LayerPatch;
pub use rules::ranges::{PROPERTY_RANGES, Property, PropertyRange, clamp_to_range};
pub use rules::validate::{Severity, ValidationContext, Violation, resolve_background, validate_design};
pub use text::{ApproximateMeasurer, TextMeasurer, TextMetrics, fit_text_height};
