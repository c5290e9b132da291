//! Message composition.
//!
//! Each function checks its required arguments and builds a [`Message`]
//! whose body layout matches the content it was given:
//!
//! | content              | body                          |
//! |----------------------|-------------------------------|
//! | text                 | single part, `text/plain`     |
//! | HTML                 | single part, `text/html`      |
//! | text and HTML        | `multipart/alternative`       |
//! | HTML and attachment  | `multipart/mixed`             |
//!
//! Nothing here touches the network. The only I/O is reading the attachment.

use std::{fs, path::Path};

use tracing::{debug, warn};

use super::{Attachment, Body, BodyPart, Importance, Message, MultipartLayout};
use crate::domain::communication::{
    email_address::EmailAddress,
    errors::{MailError, ValidationError},
};

/// Value of the `X-Custom-Header` set on plain-text messages
pub const CUSTOM_HEADER_VALUE: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION")
);

/// Compose a plain-text message with `Importance` and `X-Custom-Header` headers
pub fn simple_text(
    from: &str,
    to: &str,
    subject: &str,
    text: &str,
    importance: Importance,
) -> Result<Message, ValidationError> {
    let from = sender(from)?;
    let to = recipient(to)?;
    let subject = required(subject, ValidationError::MissingSubject)?;
    let text = required(text, ValidationError::MissingBody)?;

    Ok(Message {
        from: Some(from),
        to,
        subject,
        body: Body::Single(BodyPart::Text(text)),
        importance: Some(importance),
        custom_header: Some(CUSTOM_HEADER_VALUE.to_string()),
    })
}

/// Compose a `multipart/alternative` message with a text part followed by an HTML part
pub fn multipart(
    to: &str,
    subject: &str,
    text: &str,
    html: &str,
) -> Result<Message, ValidationError> {
    let to = recipient(to)?;
    let subject = required(subject, ValidationError::MissingSubject)?;
    let text = required(text, ValidationError::MissingBody)?;
    let html = required(html, ValidationError::MissingBody)?;

    Ok(Message {
        from: None,
        to,
        subject,
        body: Body::Multipart {
            layout: MultipartLayout::Alternative,
            parts: vec![BodyPart::Text(text), BodyPart::Html(html)],
        },
        importance: None,
        custom_header: None,
    })
}

/// Compose a single-part HTML message.
///
/// Without `from` the transport's default sender is used.
pub fn html(
    from: Option<&str>,
    to: &str,
    subject: &str,
    html: &str,
) -> Result<Message, ValidationError> {
    let from = from.map(sender).transpose()?;
    let to = recipient(to)?;
    let subject = required(subject, ValidationError::MissingSubject)?;
    let html = required(html, ValidationError::MissingBody)?;

    Ok(Message {
        from,
        to,
        subject,
        body: Body::Single(BodyPart::Html(html)),
        importance: None,
        custom_header: None,
    })
}

/// Compose a `multipart/mixed` message with an HTML part followed by the file at `attachment`.
///
/// A file that does not exist is left out and the message goes out with
/// the HTML part only. A file that exists but cannot be read fails the send.
pub fn with_attachment(
    to: &str,
    subject: &str,
    html: &str,
    attachment: &Path,
) -> Result<Message, MailError> {
    let to = recipient(to)?;
    let subject = required(subject, ValidationError::MissingSubject)?;
    let html = required(html, ValidationError::MissingBody)?;

    if attachment.as_os_str().is_empty() {
        return Err(ValidationError::MissingAttachment.into());
    }

    let mut parts = vec![BodyPart::Html(html)];

    if attachment.exists() {
        parts.push(BodyPart::Attachment(read_attachment(attachment)?));
    } else {
        warn!(path = %attachment.display(), "attachment not found, sending without it");
    }

    Ok(Message {
        from: None,
        to,
        subject,
        body: Body::Multipart {
            layout: MultipartLayout::Mixed,
            parts,
        },
        importance: None,
        custom_header: None,
    })
}

/// Check a recipient address is present
pub fn recipient(raw: &str) -> Result<EmailAddress, ValidationError> {
    EmailAddress::new(raw).ok_or(ValidationError::MissingRecipient)
}

fn sender(raw: &str) -> Result<EmailAddress, ValidationError> {
    EmailAddress::new(raw).ok_or(ValidationError::MissingSender)
}

fn required(value: &str, err: ValidationError) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(err);
    }

    Ok(value.to_string())
}

fn read_attachment(path: &Path) -> Result<Attachment, std::io::Error> {
    let content = fs::read(path)?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    debug!(%filename, %content_type, size = content.len(), "attachment read");

    Ok(Attachment {
        filename,
        content_type,
        content,
    })
}
