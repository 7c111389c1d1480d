// ABOUTME: Widget module: definitions loaded from YAML/JSON, validation and editing sessions
// ABOUTME: Exports the widget data structures, validator and session types

pub mod definition;
pub mod error;
pub mod session;
pub mod transform;
pub mod validation;

pub use definition::{ParamOption, Parameter, ParameterType, WidgetDefinition, WidgetFormat, WidgetParser};
pub use error::{Result, ValidationError, WidgetError};
pub use session::EditSession;
pub use transform::Transform;
pub use validation::{ValidationReport, WidgetValidator};
