//! Email templates

mod errors;

use std::{fmt, str::FromStr};

#[cfg(test)]
use mockall::mock;
use serde::Serialize;
use serde_json::{Map, Value};

pub use errors::RenderError;

/// The templates known to the application
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmailTemplate {
    /// Sent when an account needs activating
    AccountActivation,

    /// Sent once an account is active
    Welcome,
}

impl EmailTemplate {
    /// Every known template
    pub const ALL: [EmailTemplate; 2] = [Self::AccountActivation, Self::Welcome];

    /// The template's resource name
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountActivation => "account-activation",
            Self::Welcome => "welcome",
        }
    }
}

impl fmt::Display for EmailTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmailTemplate {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|template| template.name() == s)
            .ok_or_else(|| RenderError::TemplateNotFound(s.to_string()))
    }
}

/// Variables available to a template while it renders.
///
/// The values are passed to the renderer as-is.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariableBindings(Map<String, Value>);

impl VariableBindings {
    /// Create an empty set of bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Builder form of [`VariableBindings::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// The value bound to `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The number of bound variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for VariableBindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Renders HTML from templates
pub trait Renderer: Send + Sync + 'static {
    /// Render `template` with `bindings`
    ///
    /// # Returns
    /// The rendered markup, or a [`RenderError`] if the template is unknown
    /// or fails to render.
    fn render(
        &self,
        template: EmailTemplate,
        bindings: &VariableBindings,
    ) -> Result<String, RenderError>;
}

#[cfg(test)]
mock! {
    pub Renderer {}

    impl Renderer for Renderer {
        fn render(
            &self,
            template: EmailTemplate,
            bindings: &VariableBindings,
        ) -> Result<String, RenderError>;
    }
}
