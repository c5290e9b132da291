//! SMTP email service implementation

use std::{error::Error as StdError, fmt};

use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use lettre::{
    message::{
        header::{ContentType, Header, HeaderName, HeaderValue},
        Attachment as AttachmentPart, Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::{
        self,
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    Message as Email, SmtpTransport, Transport,
};
use tracing::debug;

use crate::{
    domain::communication::mailer::{
        Body, BodyPart, Importance, Mailer, MailerError, Message, MultipartLayout,
    },
    infrastructure::config::ConfigError,
};

/// How the connection to the SMTP server is secured
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SmtpSecurity {
    /// Upgrade a plaintext connection with STARTTLS
    #[default]
    Starttls,

    /// Connect over TLS from the start
    Tls,

    /// No encryption; only for local relays
    None,
}

impl SmtpSecurity {
    /// The port used when none is configured
    pub fn default_port(self) -> u16 {
        match self {
            SmtpSecurity::Starttls => 587,
            SmtpSecurity::Tls => 465,
            SmtpSecurity::None => 25,
        }
    }
}

/// SMTP configuration
#[derive(Clone, Parser)]
pub struct SmtpConfig {
    /// The SMTP host
    #[clap(long = "smtp-host", env = "SMTP_HOST")]
    pub host: String,

    /// The SMTP port; defaults to 587, 465 or 25 depending on `--smtp-security`
    #[clap(long = "smtp-port", env = "SMTP_PORT")]
    pub port: Option<u16>,

    /// The SMTP username
    #[clap(long = "smtp-username", env = "SMTP_USERNAME")]
    pub username: String,

    /// The SMTP password
    #[clap(long = "smtp-password", env = "SMTP_PASSWORD")]
    pub password: String,

    /// The sender used when a message has none
    #[clap(long = "smtp-sender", env = "SMTP_SENDER")]
    pub sender: String,

    /// How the connection is secured
    #[clap(
        long = "smtp-security",
        env = "SMTP_SECURITY",
        value_enum,
        default_value = "starttls"
    )]
    pub security: SmtpSecurity,

    /// Verify the TLS certificate
    #[clap(
        long = "smtp-verify-tls",
        env = "SMTP_VERIFY_TLS",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub verify_tls: bool,
}

impl SmtpConfig {
    /// The configured port, or the usual port for the security mode
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.security.default_port())
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port())
            .field("username", &self.username)
            .field("password", &"********")
            .field("sender", &self.sender)
            .field("security", &self.security)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

/// SMTP mailer
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: SmtpConfig,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Create a new SMTP mailer, checking the sender and TLS settings up front
    pub fn new(config: SmtpConfig) -> Result<Self, ConfigError> {
        let sender = config
            .sender
            .parse::<Mailbox>()
            .map_err(ConfigError::Sender)?;

        let mailer = Self { config, sender };
        mailer.transport()?;

        Ok(mailer)
    }

    /// Build a transport for a single send.
    ///
    /// No connection is made until a message is sent.
    pub fn transport(&self) -> Result<SmtpTransport, smtp::Error> {
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let relay = match self.config.security {
            SmtpSecurity::Starttls => SmtpTransport::starttls_relay(&self.config.host)?
                .tls(Tls::Required(self.tls_parameters()?)),
            SmtpSecurity::Tls => {
                SmtpTransport::relay(&self.config.host)?.tls(Tls::Wrapper(self.tls_parameters()?))
            }
            SmtpSecurity::None => SmtpTransport::builder_dangerous(&self.config.host),
        };

        Ok(relay.credentials(creds).port(self.config.port()).build())
    }

    fn tls_parameters(&self) -> Result<TlsParameters, smtp::Error> {
        TlsParameters::builder(self.config.host.to_string())
            .dangerous_accept_invalid_certs(!self.config.verify_tls)
            .build()
    }

    /// Assemble the wire message for `message`
    pub fn build_email(&self, message: &Message) -> Result<Email, MailerError> {
        let from = match &message.from {
            Some(from) => from.as_str().parse::<Mailbox>()?,
            None => self.sender.clone(),
        };

        let mut builder = Email::builder()
            .from(from)
            .to(message.to.as_str().parse::<Mailbox>()?)
            .subject(message.subject.clone());

        if let Some(importance) = message.importance {
            builder = builder
                .header(ImportanceHeader(importance))
                .header(XPriority(importance));
        }

        if let Some(value) = &message.custom_header {
            builder = builder.header(XCustomHeader(value.clone()));
        }

        let email = match &message.body {
            Body::Single(part) => builder.singlepart(single_part(part)?)?,
            Body::Multipart { layout, parts } => builder.multipart(multi_part(*layout, parts)?)?,
        };

        Ok(email)
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, message: &Message) -> Result<(), MailerError> {
        let email = self.build_email(message)?;

        let transport = self
            .transport()
            .map_err(|e| MailerError::Transport(e.into()))?;

        match transport.send(&email) {
            Ok(response) => {
                debug!(code = %response.code(), "SMTP server accepted email");

                Ok(())
            }
            Err(e) => {
                log_failure(&email, &e);

                Err(MailerError::Transport(e.into()))
            }
        }
    }
}

fn log_failure(email: &Email, err: &smtp::Error) {
    match email.headers().get_raw("Subject") {
        Some(subject) => debug!(
            subject,
            recipients = ?email.envelope().to(),
            error = %err,
            "SMTP transport rejected email"
        ),
        None => debug!(
            error = %err,
            "SMTP transport rejected email; message details unavailable"
        ),
    }
}

fn single_part(part: &BodyPart) -> Result<SinglePart, MailerError> {
    Ok(match part {
        BodyPart::Text(text) => SinglePart::plain(text.clone()),
        BodyPart::Html(html) => SinglePart::html(html.clone()),
        BodyPart::Attachment(attachment) => {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| MailerError::InvalidMessage(e.into()))?;

            AttachmentPart::new(attachment.filename.clone())
                .body(attachment.content.clone(), content_type)
        }
    })
}

fn multi_part(layout: MultipartLayout, parts: &[BodyPart]) -> Result<MultiPart, MailerError> {
    let (first, rest) = parts
        .split_first()
        .ok_or_else(|| MailerError::InvalidMessage(anyhow!("multipart body has no parts")))?;

    let builder = match layout {
        MultipartLayout::Alternative => MultiPart::alternative(),
        MultipartLayout::Mixed => MultiPart::mixed(),
    };

    let mut multipart = builder.singlepart(single_part(first)?);

    for part in rest {
        multipart = multipart.singlepart(single_part(part)?);
    }

    Ok(multipart)
}

/// The `Importance` header
#[derive(Clone, Debug, PartialEq, Eq)]
struct ImportanceHeader(Importance);

impl Header for ImportanceHeader {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Importance")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        Ok(Self(s.parse()?))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.to_string())
    }
}

/// The `X-Priority` header
#[derive(Clone, Debug, PartialEq, Eq)]
struct XPriority(Importance);

impl Header for XPriority {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Priority")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let priority: u8 = s.trim().parse()?;

        Importance::from_priority(priority)
            .map(Self)
            .ok_or_else(|| format!("X-Priority out of range: {priority}").into())
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.priority().to_string())
    }
}

/// The `X-Custom-Header` header
#[derive(Clone, Debug, PartialEq, Eq)]
struct XCustomHeader(String);

impl Header for XCustomHeader {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Custom-Header")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::{net::TcpListener, sync::Arc};

    use testresult::TestResult;

    use super::*;
    use crate::domain::communication::{
        email_address::EmailAddress,
        errors::MailError,
        mailer::{composer, Attachment},
        service::MailService,
        templates::tests::MockRenderer,
    };

    fn config(security: SmtpSecurity) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: None,
            username: "mailer".to_string(),
            password: "hunter2".to_string(),
            sender: "noreply@example.com".to_string(),
            security,
            verify_tls: true,
        }
    }

    /// A mailer pointed at a local port nothing listens on
    fn unreachable_mailer() -> TestResult<SmtpMailer> {
        let port = TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();

        let mut config = config(SmtpSecurity::None);
        config.host = "127.0.0.1".to_string();
        config.port = Some(port);

        Ok(SmtpMailer::new(config)?)
    }

    fn formatted(email: &Email) -> String {
        String::from_utf8_lossy(&email.formatted()).into_owned()
    }

    #[test]
    fn test_new_rejects_invalid_sender() {
        let mut config = config(SmtpSecurity::None);
        config.sender = "not an address".to_string();

        assert!(matches!(SmtpMailer::new(config), Err(ConfigError::Sender(_))));
    }

    #[test]
    fn test_transport_builds_for_every_security_mode() -> TestResult {
        for security in [SmtpSecurity::Starttls, SmtpSecurity::Tls, SmtpSecurity::None] {
            SmtpMailer::new(config(security))?.transport()?;
        }

        Ok(())
    }

    #[test]
    fn test_simple_text_email_headers() -> TestResult {
        let mailer = SmtpMailer::new(config(SmtpSecurity::None))?;
        let message = composer::simple_text(
            "sender@example.com",
            "recipient@example.com",
            "Hello",
            "Plain body",
            Importance::High,
        )?;

        let email = formatted(&mailer.build_email(&message)?);

        assert!(email.contains("From: sender@example.com"));
        assert!(email.contains("To: recipient@example.com"));
        assert!(email.contains("Subject: Hello"));
        assert!(email.contains("Importance: High"));
        assert!(email.contains("X-Priority: 1"));
        assert!(email.contains("X-Custom-Header: "));
        assert!(email.contains("Content-Type: text/plain; charset=utf-8"));
        assert!(!email.contains("multipart/"));

        Ok(())
    }

    #[test]
    fn test_missing_from_uses_configured_sender() -> TestResult {
        let mailer = SmtpMailer::new(config(SmtpSecurity::None))?;
        let message = composer::html(None, "recipient@example.com", "Hello", "<p>Hi</p>")?;

        let email = formatted(&mailer.build_email(&message)?);

        assert!(email.contains("From: noreply@example.com"));
        assert!(email.contains("Content-Type: text/html; charset=utf-8"));

        Ok(())
    }

    #[test]
    fn test_multipart_email_is_alternative() -> TestResult {
        let mailer = SmtpMailer::new(config(SmtpSecurity::None))?;
        let message =
            composer::multipart("recipient@example.com", "Hello", "Plain", "<p>Rich</p>")?;

        let email = formatted(&mailer.build_email(&message)?);

        assert!(email.contains("multipart/alternative"));

        let text = email.find("text/plain");
        let html = email.find("text/html");
        assert!(text.is_some() && html.is_some());
        assert!(text < html);

        Ok(())
    }

    #[test]
    fn test_attachment_email_is_mixed() -> TestResult {
        let mailer = SmtpMailer::new(config(SmtpSecurity::None))?;
        let message = Message {
            from: None,
            to: EmailAddress::new_unchecked("recipient@example.com"),
            subject: "Report".to_string(),
            body: Body::Multipart {
                layout: MultipartLayout::Mixed,
                parts: vec![
                    BodyPart::Html("<p>Report</p>".to_string()),
                    BodyPart::Attachment(Attachment {
                        filename: "report.csv".to_string(),
                        content_type: "text/csv".to_string(),
                        content: b"a,b\n1,2\n".to_vec(),
                    }),
                ],
            },
            importance: None,
            custom_header: None,
        };

        let email = formatted(&mailer.build_email(&message)?);

        assert!(email.contains("multipart/mixed"));
        assert!(email.contains("Content-Disposition: attachment"));
        assert!(email.contains("report.csv"));
        assert!(!email.contains("Importance:"));

        Ok(())
    }

    #[test]
    fn test_invalid_recipient_is_rejected() -> TestResult {
        let mailer = SmtpMailer::new(config(SmtpSecurity::None))?;
        let message = composer::html(None, "not an address", "Hello", "<p>Hi</p>")?;

        let result = mailer.build_email(&message);

        assert!(matches!(result, Err(MailerError::InvalidEmail(_))));

        Ok(())
    }

    #[test]
    fn test_invalid_attachment_content_type_is_rejected() -> TestResult {
        let mailer = SmtpMailer::new(config(SmtpSecurity::None))?;
        let mut message = composer::html(None, "recipient@example.com", "Hello", "<p>Hi</p>")?;
        message.body = Body::Multipart {
            layout: MultipartLayout::Mixed,
            parts: vec![BodyPart::Attachment(Attachment {
                filename: "x".to_string(),
                content_type: "not a mime type".to_string(),
                content: Vec::new(),
            })],
        };

        assert!(matches!(
            mailer.build_email(&message),
            Err(MailerError::InvalidMessage(_))
        ));

        Ok(())
    }

    #[test]
    fn test_priority_header_parse() {
        assert!(matches!(XPriority::parse("1"), Ok(XPriority(Importance::High))));
        assert!(XPriority::parse("7").is_err());
        assert!(matches!(
            ImportanceHeader::parse("low"),
            Ok(ImportanceHeader(Importance::Low))
        ));
    }

    #[test]
    fn test_port_defaults_to_security_mode() {
        assert_eq!(config(SmtpSecurity::Starttls).port(), 587);
        assert_eq!(config(SmtpSecurity::Tls).port(), 465);
        assert_eq!(config(SmtpSecurity::None).port(), 25);

        let mut explicit = config(SmtpSecurity::Tls);
        explicit.port = Some(2525);
        assert_eq!(explicit.port(), 2525);
    }

    #[test]
    fn test_send_to_closed_port_is_transport_error() -> TestResult {
        let mailer = unreachable_mailer()?;
        let message = composer::html(None, "recipient@example.com", "Hello", "<p>Hi</p>")?;

        let result = mailer.send(&message);

        assert!(matches!(result, Err(MailerError::Transport(_))));

        Ok(())
    }

    #[test]
    fn test_service_reports_transport_error_as_send_failed() -> TestResult {
        let mut renderer = MockRenderer::new();
        renderer.expect_render().times(0);

        let service = MailService::new(Arc::new(unreachable_mailer()?), Arc::new(renderer));

        let result = service.send_html(
            "sender@example.com",
            "recipient@example.com",
            "Hello",
            "<p>Hi</p>",
        );

        let Err(err) = result else {
            panic!("expected the send to fail");
        };

        assert!(matches!(err, MailError::SendFailed(_)));
        assert!(matches!(
            err.cause()
                .and_then(|cause| cause.downcast_ref::<MailerError>()),
            Some(MailerError::Transport(_))
        ));

        Ok(())
    }
}
