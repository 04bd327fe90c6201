use async_trait::async_trait;
use std::fmt::Debug;

use crate::{config::EmailSettings, error::SendError, model::EmailMessage, notifier::smtp::SmtpNotifier};

pub mod smtp;

/// Delivers a composed email to its recipients.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    async fn send(&self, message: &EmailMessage) -> Result<(), SendError>;
}

pub fn notifier_from_settings(settings: &EmailSettings) -> Box<dyn Notifier> {
    Box::new(SmtpNotifier::new(settings.clone()))
}
