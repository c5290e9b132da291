//! Handlebars template renderer

use std::fmt;

use handlebars::Handlebars;
use tracing::{info, warn};

use crate::{
    domain::communication::templates::{EmailTemplate, RenderError, Renderer, VariableBindings},
    infrastructure::config::{ConfigError, TemplateConfig},
};

/// File extension of template files
pub const TEMPLATE_EXTENSION: &str = "html";

/// Renders [`EmailTemplate`]s from `<template_dir>/<name>.html`.
///
/// Rendering is strict: a variable the template uses but the bindings do
/// not provide is an error.
pub struct HandlebarsRenderer {
    handlebars: Handlebars<'static>,
}

impl HandlebarsRenderer {
    /// Load every known template from the configured directory.
    ///
    /// A template whose file is missing is skipped with a warning and fails
    /// when it is rendered. A missing directory or a template that does not
    /// compile is a [`ConfigError`].
    pub fn new(config: &TemplateConfig) -> Result<Self, ConfigError> {
        if !config.template_dir.is_dir() {
            return Err(ConfigError::TemplateDirectory(config.template_dir.clone()));
        }

        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.set_dev_mode(config.template_dev_mode);

        for template in EmailTemplate::ALL {
            let path = config
                .template_dir
                .join(format!("{}.{}", template.name(), TEMPLATE_EXTENSION));

            if !path.is_file() {
                warn!(%template, path = %path.display(), "email template not found");
                continue;
            }

            handlebars
                .register_template_file(template.name(), &path)
                .map_err(|source| ConfigError::Template {
                    name: template.name().to_string(),
                    source,
                })?;
        }

        info!(
            dir = %config.template_dir.display(),
            templates = handlebars.get_templates().len(),
            "email templates loaded"
        );

        Ok(Self { handlebars })
    }
}

impl fmt::Debug for HandlebarsRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut templates = self.handlebars.get_templates().keys().collect::<Vec<_>>();
        templates.sort();

        f.debug_struct("HandlebarsRenderer")
            .field("templates", &templates)
            .finish()
    }
}

impl Renderer for HandlebarsRenderer {
    fn render(
        &self,
        template: EmailTemplate,
        bindings: &VariableBindings,
    ) -> Result<String, RenderError> {
        let name = template.name();

        if !self.handlebars.has_template(name) {
            return Err(RenderError::TemplateNotFound(name.to_string()));
        }

        self.handlebars
            .render(name, bindings)
            .map_err(|err| RenderError::Failed {
                template: name.to_string(),
                source: err.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use tempfile::TempDir;
    use testresult::TestResult;

    use super::*;

    fn config(dir: &Path) -> TemplateConfig {
        TemplateConfig {
            template_dir: dir.to_path_buf(),
            template_dev_mode: false,
        }
    }

    fn write_template(dir: &Path, template: EmailTemplate, content: &str) -> TestResult {
        fs::write(
            dir.join(format!("{}.{}", template.name(), TEMPLATE_EXTENSION)),
            content,
        )?;

        Ok(())
    }

    #[test]
    fn test_render_template() -> TestResult {
        let dir = TempDir::new()?;
        write_template(dir.path(), EmailTemplate::Welcome, "<p>Hello {{name}}</p>")?;

        let renderer = HandlebarsRenderer::new(&config(dir.path()))?;
        let html = renderer.render(
            EmailTemplate::Welcome,
            &VariableBindings::new().with("name", "Ada"),
        )?;

        assert_eq!(html, "<p>Hello Ada</p>");

        Ok(())
    }

    #[test]
    fn test_render_escapes_html() -> TestResult {
        let dir = TempDir::new()?;
        write_template(dir.path(), EmailTemplate::Welcome, "<p>{{name}}</p>")?;

        let renderer = HandlebarsRenderer::new(&config(dir.path()))?;
        let html = renderer.render(
            EmailTemplate::Welcome,
            &VariableBindings::new().with("name", "<script>"),
        )?;

        assert_eq!(html, "<p>&lt;script&gt;</p>");

        Ok(())
    }

    #[test]
    fn test_unresolved_variable_fails() -> TestResult {
        let dir = TempDir::new()?;
        write_template(dir.path(), EmailTemplate::Welcome, "<p>Hello {{name}}</p>")?;

        let renderer = HandlebarsRenderer::new(&config(dir.path()))?;
        let result = renderer.render(EmailTemplate::Welcome, &VariableBindings::new());

        assert!(matches!(
            result,
            Err(RenderError::Failed { template, .. }) if template == "welcome"
        ));

        Ok(())
    }

    #[test]
    fn test_missing_template_file_fails_on_render() -> TestResult {
        let dir = TempDir::new()?;
        write_template(dir.path(), EmailTemplate::Welcome, "<p>Hello</p>")?;

        let renderer = HandlebarsRenderer::new(&config(dir.path()))?;
        let result = renderer.render(EmailTemplate::AccountActivation, &VariableBindings::new());

        assert!(matches!(
            result,
            Err(RenderError::TemplateNotFound(name)) if name == "account-activation"
        ));

        Ok(())
    }

    #[test]
    fn test_missing_directory_is_a_config_error() -> TestResult {
        let dir = TempDir::new()?;

        let result = HandlebarsRenderer::new(&config(&dir.path().join("nope")));

        assert!(matches!(result, Err(ConfigError::TemplateDirectory(_))));

        Ok(())
    }

    #[test]
    fn test_invalid_template_is_a_config_error() -> TestResult {
        let dir = TempDir::new()?;
        write_template(dir.path(), EmailTemplate::Welcome, "<p>{{#if name}}</p>")?;

        let result = HandlebarsRenderer::new(&config(dir.path()));

        assert!(matches!(result, Err(ConfigError::Template { name, .. }) if name == "welcome"));

        Ok(())
    }

    #[test]
    fn test_shipped_templates_render() -> TestResult {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates/email");
        let renderer = HandlebarsRenderer::new(&config(&dir))?;

        let bindings = VariableBindings::new()
            .with("name", "Ada")
            .with("activation_link", "https://example.com/activate?token=abc");

        let activation = renderer.render(EmailTemplate::AccountActivation, &bindings)?;
        let welcome = renderer.render(EmailTemplate::Welcome, &bindings)?;

        assert!(activation.contains("Ada"));
        assert!(activation.contains("https://example.com/activate"));
        assert!(welcome.contains("Ada"));

        Ok(())
    }
}
