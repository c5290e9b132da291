//! Email message

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::domain::communication::email_address::EmailAddress;

/// Content type of HTML body parts
pub const CONTENT_TYPE_TEXT_HTML: &str = "text/html; charset=utf-8";

/// Importance of a message, sent in the `Importance` header
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Importance {
    /// High importance
    High,

    /// Normal importance
    #[default]
    Normal,

    /// Low importance
    Low,
}

impl Importance {
    /// The header value for this importance
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Normal => "Normal",
            Self::Low => "Low",
        }
    }

    /// The matching `X-Priority` value
    pub fn priority(&self) -> u8 {
        match self {
            Self::High => 1,
            Self::Normal => 3,
            Self::Low => 5,
        }
    }

    /// The importance for an `X-Priority` value
    pub fn from_priority(priority: u8) -> Option<Self> {
        match priority {
            1 | 2 => Some(Self::High),
            3 => Some(Self::Normal),
            4 | 5 => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An importance value that is not `high`, `normal` or `low`
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown importance `{0}`")]
pub struct ParseImportanceError(String);

impl FromStr for Importance {
    type Err = ParseImportanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "normal" => Ok(Self::Normal),
            "low" => Ok(Self::Low),
            _ => Err(ParseImportanceError(s.to_string())),
        }
    }
}

/// How the parts of a multipart body relate to each other
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultipartLayout {
    /// Renderings of the same content; the reader picks the richest one
    Alternative,

    /// Distinct items that all belong to the message
    Mixed,
}

impl MultipartLayout {
    /// The MIME subtype, as in `multipart/<subtype>`
    pub fn subtype(&self) -> &'static str {
        match self {
            Self::Alternative => "alternative",
            Self::Mixed => "mixed",
        }
    }
}

/// A file attached to a message
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// The file name shown to the recipient
    pub filename: String,

    /// The MIME type of the content
    pub content_type: String,

    /// The raw file content
    pub content: Vec<u8>,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.content.len())
            .finish()
    }
}

/// A single part of a message body
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodyPart {
    /// Plain text
    Text(String),

    /// HTML, sent as [`CONTENT_TYPE_TEXT_HTML`]
    Html(String),

    /// A file attachment
    Attachment(Attachment),
}

/// The body of a message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    /// A single-part body
    Single(BodyPart),

    /// A multipart body, parts kept in order
    Multipart {
        /// How the parts relate
        layout: MultipartLayout,

        /// The parts, in the order they are sent
        parts: Vec<BodyPart>,
    },
}

impl Body {
    /// The body parts in order
    pub fn parts(&self) -> &[BodyPart] {
        match self {
            Self::Single(part) => std::slice::from_ref(part),
            Self::Multipart { parts, .. } => parts,
        }
    }

    /// The multipart layout, or `None` for a single-part body
    pub fn layout(&self) -> Option<MultipartLayout> {
        match self {
            Self::Single(_) => None,
            Self::Multipart { layout, .. } => Some(*layout),
        }
    }
}

/// Email message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// The sender of the email, or the configured default sender if `None`
    pub from: Option<EmailAddress>,

    /// The recipient of the email
    pub to: EmailAddress,

    /// The subject of the email
    pub subject: String,

    /// The body of the email
    pub body: Body,

    /// The `Importance` header, if any
    pub importance: Option<Importance>,

    /// The `X-Custom-Header` value, if any
    pub custom_header: Option<String>,
}
