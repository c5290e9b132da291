//! Error types for the communication module

use thiserror::Error;
use tracing::debug;

use crate::domain::communication::{mailer::MailerError, templates::RenderError};

/// A required send argument was absent
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// No sender address
    #[error("sender email address cannot be empty")]
    MissingSender,

    /// No recipient address
    #[error("recipient email address cannot be empty")]
    MissingRecipient,

    /// No subject
    #[error("email subject cannot be empty")]
    MissingSubject,

    /// No body content
    #[error("email content cannot be empty")]
    MissingBody,

    /// No attachment path
    #[error("attachment path cannot be empty")]
    MissingAttachment,
}

/// Errors returned when sending an email
#[derive(Debug, Error)]
pub enum MailError {
    /// A required argument was missing and nothing was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The email could not be rendered, assembled or delivered.
    ///
    /// The original error is kept as the source.
    #[error("failed to send email")]
    SendFailed(#[source] anyhow::Error),
}

impl MailError {
    /// The underlying cause of a [`MailError::SendFailed`]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            MailError::SendFailed(cause) => Some(cause),
            MailError::Validation(_) => None,
        }
    }
}

impl From<MailerError> for MailError {
    fn from(err: MailerError) -> Self {
        debug!("MailerError -> MailError");

        MailError::SendFailed(err.into())
    }
}

impl From<RenderError> for MailError {
    fn from(err: RenderError) -> Self {
        debug!("RenderError -> MailError");

        MailError::SendFailed(err.into())
    }
}

impl From<std::io::Error> for MailError {
    fn from(err: std::io::Error) -> Self {
        debug!("io::Error -> MailError");

        MailError::SendFailed(err.into())
    }
}
