// ABOUTME: Error types for template compilation and rendering
// ABOUTME: Separates macro syntax errors, expression failures and runaway loops from Handlebars failures

use thiserror::Error;

use crate::expr::EvalError;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },

    #[error("Expression error: {0}")]
    Eval(#[from] EvalError),

    #[error("Loop exceeded {limit} iterations")]
    LoopLimit { limit: usize },

    #[error("Handlebars render error: {0}")]
    Handlebars(#[from] handlebars::RenderError),

    #[error("Handlebars template error: {0}")]
    HandlebarsTemplate(#[from] handlebars::TemplateError),
}

impl RenderError {
    pub fn syntax(message: impl Into<String>, offset: usize) -> Self {
        RenderError::Syntax {
            message: message.into(),
            offset,
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
