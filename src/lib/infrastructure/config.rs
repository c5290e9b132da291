//! Application configuration.
//!
//! Every setting is a command-line flag that falls back to an environment
//! variable. The SMTP properties map onto the variables like so:
//!
//! | property        | variable          |
//! |-----------------|-------------------|
//! | `smtp.username` | `SMTP_USERNAME`   |
//! | `smtp.password` | `SMTP_PASSWORD`   |
//! | host            | `SMTP_HOST`       |
//! | port            | `SMTP_PORT`       |
//! | security        | `SMTP_SECURITY`   |
//! | default sender  | `SMTP_SENDER`     |

use std::path::PathBuf;

use clap::Parser;
use lettre::address::AddressError;
use thiserror::Error;

use crate::infrastructure::email::smtp::SmtpConfig;

/// Errors that stop the application from starting
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The default sender is not a valid address
    #[error("invalid default sender address")]
    Sender(#[source] AddressError),

    /// The template directory does not exist
    #[error("template directory `{0}` does not exist")]
    TemplateDirectory(PathBuf),

    /// A template failed to compile
    #[error("failed to load template `{name}`")]
    Template {
        /// The template's name
        name: String,

        /// The engine's error
        #[source]
        source: handlebars::TemplateError,
    },

    /// The SMTP transport could not be configured
    #[error("failed to configure SMTP transport")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Template configuration
#[derive(Clone, Debug, Parser)]
pub struct TemplateConfig {
    /// Directory holding the email templates
    #[clap(long, env = "TEMPLATE_DIR", default_value = "templates/email")]
    pub template_dir: PathBuf,

    /// Re-read templates from disk on every render
    #[clap(long, env = "TEMPLATE_DEV_MODE", default_value = "false")]
    pub template_dev_mode: bool,
}

/// Mail configuration
#[derive(Clone, Debug, Parser)]
pub struct MailConfig {
    /// SMTP connection and credentials
    #[clap(flatten)]
    pub smtp: SmtpConfig,

    /// Template loading
    #[clap(flatten)]
    pub templates: TemplateConfig,
}
