//! Mail service

use std::{path::Path, sync::Arc};

use tracing::{debug, error, info};

use crate::domain::communication::{
    errors::MailError,
    mailer::{composer, Importance, Mailer, Message},
    templates::{EmailTemplate, RenderError, Renderer, VariableBindings},
};

/// Subject of templated account activation emails
pub const ACCOUNT_ACTIVATION_SUBJECT: &str = "Account activation";

/// Composes emails and hands them to a [`Mailer`].
///
/// Every operation is a single blocking attempt. Required arguments are
/// checked before anything is rendered or sent, and any failure after that
/// is reported as [`MailError::SendFailed`].
#[derive(Debug)]
pub struct MailService<M, R>
where
    M: Mailer,
    R: Renderer,
{
    mailer: Arc<M>,
    renderer: Arc<R>,
}

impl<M, R> Clone for MailService<M, R>
where
    M: Mailer,
    R: Renderer,
{
    fn clone(&self) -> Self {
        Self {
            mailer: Arc::clone(&self.mailer),
            renderer: Arc::clone(&self.renderer),
        }
    }
}

impl<M, R> MailService<M, R>
where
    M: Mailer,
    R: Renderer,
{
    /// Creates a new mail service.
    pub fn new(mailer: Arc<M>, renderer: Arc<R>) -> Self {
        Self { mailer, renderer }
    }

    /// Sends a plain-text email.
    ///
    /// The message carries an `Importance` header for `importance` and an
    /// `X-Custom-Header` identifying this library.
    pub fn send_simple_text(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        text: &str,
        importance: Importance,
    ) -> Result<(), MailError> {
        let message = composer::simple_text(from, to, subject, text, importance)?;

        self.dispatch(&message)
    }

    /// Sends an email with text and HTML versions of the same content.
    pub fn send_multipart(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), MailError> {
        let message = composer::multipart(to, subject, text, html)?;

        self.dispatch(&message)
    }

    /// Sends an HTML email from `from`.
    pub fn send_html(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), MailError> {
        let message = composer::html(Some(from), to, subject, html)?;

        self.dispatch(&message)
    }

    /// Renders `template` with `bindings` and sends it as an account activation email.
    ///
    /// # Returns
    /// - [`MailError::Validation`] if `to` is blank; nothing is rendered.
    /// - [`MailError::SendFailed`] wrapping a [`RenderError`] if the template is
    ///   unknown or fails to render; nothing is sent.
    pub fn send_templated_activation(
        &self,
        to: &str,
        template: EmailTemplate,
        bindings: &VariableBindings,
    ) -> Result<(), MailError> {
        composer::recipient(to)?;

        let html = self.render(template, bindings)?;
        let message = composer::html(None, to, ACCOUNT_ACTIVATION_SUBJECT, &html)?;

        self.dispatch(&message)
    }

    /// Sends an HTML email with the file at `attachment`.
    ///
    /// If the file does not exist the email is sent without it.
    pub fn send_with_attachment(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        attachment: &Path,
    ) -> Result<(), MailError> {
        let message = composer::with_attachment(to, subject, html, attachment)?;

        self.dispatch(&message)
    }

    fn render(
        &self,
        template: EmailTemplate,
        bindings: &VariableBindings,
    ) -> Result<String, RenderError> {
        let html = self.renderer.render(template, bindings)?;

        Ok(css_inline::inline(&html)?)
    }

    fn dispatch(&self, message: &Message) -> Result<(), MailError> {
        debug!(
            subject = %message.subject,
            to = %message.to,
            "attempting to send email"
        );

        match self.mailer.send(message) {
            Ok(()) => {
                info!(subject = %message.subject, to = %message.to, "email sent");

                Ok(())
            }
            Err(err) => {
                error!(
                    subject = %message.subject,
                    to = %message.to,
                    error = %err,
                    "failed to send email"
                );

                Err(err.into())
            }
        }
    }
}
