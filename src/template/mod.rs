// ABOUTME: Template macro interpreter for widget templates
// ABOUTME: Expands {{ }} macros against a context, translations and locale, then substitutes through Handlebars

pub mod ast;
pub mod context;
pub mod engine;
pub mod error;
pub mod helpers;
pub mod i18n;
pub mod page;
pub mod parser;
pub mod tags;

pub use ast::{Node, Template};
pub use context::TemplateContext;
pub use engine::TemplateEngine;
pub use error::{RenderError, Result};
pub use i18n::Translations;
pub use page::{PageData, PreviewPage};
