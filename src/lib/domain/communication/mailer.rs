//! Mail transport contract

pub mod composer;
mod errors;
mod message;

#[cfg(test)]
use mockall::mock;

pub use errors::MailerError;
pub use message::{
    Attachment, Body, BodyPart, Importance, Message, MultipartLayout, ParseImportanceError,
    CONTENT_TYPE_TEXT_HTML,
};

/// Delivers composed messages
pub trait Mailer: Send + Sync + 'static {
    /// Send an email
    ///
    /// # Arguments
    /// * `message` - The composed [`Message`] to deliver.
    ///
    /// # Returns
    /// [`Ok`] once the transport has accepted the whole message, otherwise
    /// a [`MailerError`]. Nothing is retried or queued.
    fn send(&self, message: &Message) -> Result<(), MailerError>;
}

#[cfg(test)]
mock! {
    pub Mailer {}

    impl Mailer for Mailer {
        fn send(&self, message: &Message) -> Result<(), MailerError>;
    }
}
