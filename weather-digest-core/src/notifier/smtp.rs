use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

use crate::{config::EmailSettings, error::SendError, model::EmailMessage};

use super::Notifier;

const STARTTLS_PORT: u16 = 587;

/// SMTP delivery through an authenticated relay.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    username: String,
    password: SecretString,
    from: String,
    smtp_host: String,
    smtp_port: Option<u16>,
}

impl SmtpNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        Self {
            username: settings.username,
            password: settings.password,
            from: settings.from,
            smtp_host: settings.smtp_host,
            smtp_port: settings.smtp_port,
        }
    }

    fn transport(&self) -> Result<SmtpTransport, SendError> {
        let relay = match self.smtp_port {
            Some(STARTTLS_PORT) => SmtpTransport::starttls_relay(&self.smtp_host),
            _ => SmtpTransport::relay(&self.smtp_host),
        }
        .map_err(|source| SendError::Relay { host: self.smtp_host.clone(), source })?;

        let creds =
            Credentials::new(self.username.clone(), self.password.expose_secret().to_string());

        let mut builder = relay.credentials(creds);
        if let Some(port) = self.smtp_port {
            builder = builder.port(port);
        }

        Ok(builder.build())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, SendError> {
    address
        .trim()
        .parse()
        .map_err(|source| SendError::InvalidAddress { address: address.to_string(), source })
}

/// Build the plain-text MIME message for `message`.
pub fn build_message(from: &str, message: &EmailMessage) -> Result<Message, SendError> {
    if message.recipients.is_empty() {
        return Err(SendError::NoRecipients);
    }

    let mut builder = Message::builder()
        .from(parse_mailbox(from)?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN);

    for recipient in &message.recipients {
        builder = builder.to(parse_mailbox(recipient)?);
    }

    Ok(builder.body(message.body.clone())?)
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip(self, message), fields(host = %self.smtp_host, recipients = message.recipients.len()))]
    async fn send(&self, message: &EmailMessage) -> Result<(), SendError> {
        let email = build_message(&self.from, message)?;
        let transport = self.transport()?;

        info!("Sending email");

        // lettre's SmtpTransport is blocking
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await?
            .map_err(SendError::Transport)?;

        info!("Email sent");
        Ok(())
    }
}
