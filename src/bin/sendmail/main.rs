#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Command-line front end for sending email over SMTP

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use mail_dispatch::{
    domain::communication::{
        mailer::Importance,
        service::MailService,
        templates::{EmailTemplate, VariableBindings},
    },
    infrastructure::{
        config::MailConfig, email::smtp::SmtpMailer, templates::HandlebarsRenderer,
    },
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
#[command(name = "sendmail", about = "Compose and send email over SMTP")]
pub struct Args {
    /// The mail configuration
    #[clap(flatten)]
    pub config: MailConfig,

    /// What to send
    #[command(subcommand)]
    pub command: Command,
}

/// Send modes
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a plain-text email
    Text {
        /// Sender address
        #[arg(long)]
        from: String,

        /// Recipient address
        #[arg(long)]
        to: String,

        /// Subject line
        #[arg(long)]
        subject: String,

        /// Message body
        #[arg(long)]
        text: String,

        /// high, normal or low
        #[arg(long, default_value = "normal")]
        importance: Importance,
    },

    /// Send text and HTML versions of the same message
    Multipart {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Subject line
        #[arg(long)]
        subject: String,

        /// Plain-text body
        #[arg(long)]
        text: String,

        /// HTML body
        #[arg(long)]
        html: String,
    },

    /// Send an HTML email
    Html {
        /// Sender address
        #[arg(long)]
        from: String,

        /// Recipient address
        #[arg(long)]
        to: String,

        /// Subject line
        #[arg(long)]
        subject: String,

        /// HTML body
        #[arg(long)]
        html: String,
    },

    /// Send an account activation email rendered from a template
    Activation {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Template name
        #[arg(long, default_value = "account-activation")]
        template: EmailTemplate,

        /// Template variable as `name=value`; repeatable
        #[arg(long = "var", value_parser = parse_binding)]
        vars: Vec<(String, String)>,
    },

    /// Send an HTML email with a file attached
    Attachment {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Subject line
        #[arg(long)]
        subject: String,

        /// HTML body
        #[arg(long)]
        html: String,

        /// File to attach; skipped if it does not exist
        #[arg(long)]
        attachment: PathBuf,
    },
}

fn parse_binding(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected `name=value`, got `{raw}`"))?;

    if name.trim().is_empty() {
        return Err(anyhow!("variable name cannot be empty"));
    }

    Ok((name.trim().to_string(), value.to_string()))
}

#[mutants::skip]
fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    info!(
        host = %args.config.smtp.host,
        port = args.config.smtp.port(),
        security = ?args.config.smtp.security,
        "mail configuration loaded"
    );

    let mailer = SmtpMailer::new(args.config.smtp)?;
    let renderer = HandlebarsRenderer::new(&args.config.templates)?;
    let service = MailService::new(Arc::new(mailer), Arc::new(renderer));

    match args.command {
        Command::Text {
            from,
            to,
            subject,
            text,
            importance,
        } => service.send_simple_text(&from, &to, &subject, &text, importance)?,
        Command::Multipart {
            to,
            subject,
            text,
            html,
        } => service.send_multipart(&to, &subject, &text, &html)?,
        Command::Html {
            from,
            to,
            subject,
            html,
        } => service.send_html(&from, &to, &subject, &html)?,
        Command::Activation { to, template, vars } => {
            let bindings = vars.into_iter().collect::<VariableBindings>();

            service.send_templated_activation(&to, template, &bindings)?
        }
        Command::Attachment {
            to,
            subject,
            html,
            attachment,
        } => service.send_with_attachment(&to, &subject, &html, &attachment)?,
    }

    Ok(())
}
