// ABOUTME: Main library module for the widgetkit widget definition engine
// ABOUTME: Exports the binding, expression, template and widget modules and the public API

pub mod binding;
pub mod cli;
pub mod dom;
pub mod expr;
pub mod pattern;
pub mod template;
pub mod value;
pub mod widget;

// Re-export commonly used types
pub use binding::{Binding, BindingFactory, BindingSpec};
pub use cli::{App, Args, Config};
pub use dom::{Element, Fragment};
pub use expr::{evaluate, Scope};
pub use pattern::CapturePattern;
pub use template::{TemplateContext, TemplateEngine, Translations};
pub use value::{cast_value, CastKind, Value};
pub use widget::{EditSession, WidgetDefinition, WidgetParser, WidgetValidator};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
