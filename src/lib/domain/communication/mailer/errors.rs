//! Mailer errors

use lettre::address::AddressError;
use thiserror::Error;

/// Mailer errors
#[derive(Debug, Error)]
pub enum MailerError {
    /// An address could not be parsed
    #[error("Invalid email address")]
    InvalidEmail(#[from] AddressError),

    /// The message could not be assembled
    #[error("Could not build the email message")]
    InvalidMessage(#[source] anyhow::Error),

    /// The transport failed to deliver the message
    #[error("An error occurred while sending the email")]
    Transport(#[source] anyhow::Error),
}

impl From<lettre::error::Error> for MailerError {
    fn from(err: lettre::error::Error) -> Self {
        MailerError::InvalidMessage(err.into())
    }
}
