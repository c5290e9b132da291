//! Template rendering errors

use css_inline::InlineError;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when rendering an email template
#[derive(Debug, Error)]
pub enum RenderError {
    /// No template is registered under this name
    #[error("template `{0}` is not registered")]
    TemplateNotFound(String),

    /// The template engine failed, e.g. on an unresolved variable
    #[error("failed to render template `{template}`")]
    Failed {
        /// The template being rendered
        template: String,

        /// The engine's error
        #[source]
        source: anyhow::Error,
    },

    /// The rendered HTML could not have its CSS inlined
    #[error("failed to inline CSS: {0}")]
    Inline(String),
}

impl From<InlineError> for RenderError {
    fn from(err: InlineError) -> Self {
        debug!("InlineError -> RenderError");

        RenderError::Inline(err.to_string())
    }
}
