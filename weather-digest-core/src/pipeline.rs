//! Runs fetch → summarize → format → send once, in order.

use std::error::Error as StdError;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, instrument};

use crate::{
    config::Settings,
    error::{DigestError, Stage},
    format::format_email,
    model::{EmailMessage, Location},
    notifier::{Notifier, notifier_from_settings},
    provider::{ForecastProvider, provider_from_settings},
    summarizer::{Summarizer, summarizer_from_settings},
};

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub records: usize,
    pub message: EmailMessage,
    /// False when the run was a dry run and nothing was sent.
    pub sent: bool,
}

/// Result of [`Pipeline::run_logged`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Sent,
    DryRun(EmailMessage),
    Failed(Stage),
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed(_))
    }
}

#[derive(Debug)]
pub struct Pipeline {
    location: Location,
    recipients: Vec<String>,
    provider: Box<dyn ForecastProvider>,
    summarizer: Box<dyn Summarizer>,
    notifier: Box<dyn Notifier>,
    dry_run: bool,
    today: Option<NaiveDate>,
}

impl Pipeline {
    pub fn new(
        location: Location,
        recipients: Vec<String>,
        provider: Box<dyn ForecastProvider>,
        summarizer: Box<dyn Summarizer>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self { location, recipients, provider, summarizer, notifier, dry_run: false, today: None }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.weather.location.clone(),
            settings.email.recipients.clone(),
            provider_from_settings(&settings.weather),
            summarizer_from_settings(&settings.summary),
            notifier_from_settings(&settings.email),
        )
    }

    /// Stop after formatting and return the message instead of sending it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Stamp the subject with `date` instead of today's local date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.today = Some(date);
        self
    }

    #[instrument(skip(self), fields(location = %self.location.zip_query(), dry_run = self.dry_run))]
    pub async fn run(&self) -> Result<RunReport, DigestError> {
        info!("Fetching forecast");
        let forecast = self.provider.fetch_hourly_forecast(&self.location).await?;
        for record in &forecast {
            debug!(?record, "forecast record");
        }

        info!("Generating summary");
        let summary = self.summarizer.summarize(&forecast).await?;
        debug!(%summary, "summary text");

        info!("Formatting email");
        let body = format_email(&summary, &forecast);
        debug!(%body, "email body");

        let date = self.today.unwrap_or_else(|| Local::now().date_naive());
        let message = EmailMessage::new(body, self.recipients.clone(), date);

        if self.dry_run {
            info!("Dry run, not sending email");
        } else {
            info!(recipients = message.recipients.len(), "Sending email");
            self.notifier.send(&message).await?;
        }

        Ok(RunReport { records: forecast.len(), message, sent: !self.dry_run })
    }

    /// Run once and log the outcome; failures are reported, never propagated.
    pub async fn run_logged(&self) -> RunOutcome {
        match self.run().await {
            Ok(report) if report.sent => {
                info!(records = report.records, subject = %report.message.subject, "Weather summary sent");
                RunOutcome::Sent
            }
            Ok(report) => RunOutcome::DryRun(report.message),
            Err(err) => {
                error!(stage = %err.stage(), error = %error_chain(&err), "Weather digest run failed");
                RunOutcome::Failed(err.stage())
            }
        }
    }
}

/// Render an error and all of its sources as "a: b: c".
pub fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // thiserror messages often already embed their source
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}
