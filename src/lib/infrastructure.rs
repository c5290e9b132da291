//! Infrastructure: configuration, SMTP delivery and template rendering

pub mod config;
pub mod email;
pub mod templates;
