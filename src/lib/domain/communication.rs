//! Email composition and dispatch.
//!
//! Callers go through [`service::MailService`], which composes a
//! [`mailer::Message`] for the requested send mode and hands it to a
//! [`mailer::Mailer`]. HTML bodies can be rendered from an
//! [`templates::EmailTemplate`] by a [`templates::Renderer`].

pub mod email_address;
pub mod errors;
pub mod mailer;
pub mod service;
pub mod templates;
