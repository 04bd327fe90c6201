//! Error types for each pipeline stage.
//!
//! Every stage returns its own error; [`DigestError`] joins them at the
//! orchestrator boundary.

use std::path::PathBuf;

use reqwest::StatusCode;

/// Failure while fetching or normalizing the forecast.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Built with [`FetchError::request`] so the URL (and its `appid`) is dropped.
    #[error("failed to send request to OpenWeather: {0}")]
    Request(#[source] reqwest::Error),

    #[error("OpenWeather forecast request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to parse OpenWeather forecast JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("forecast entry at {dt} has no weather condition")]
    MissingCondition { dt: i64 },

    #[error("forecast entry has an out-of-range timestamp: {0}")]
    InvalidTimestamp(i64),
}

impl FetchError {
    /// Wrap a transport error without the request URL, which carries the API key.
    pub fn request(err: reqwest::Error) -> Self {
        Self::Request(err.without_url())
    }
}

/// Failure while asking the text-generation service for a summary.
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("failed to send request to the completion service: {0}")]
    Request(#[source] reqwest::Error),

    #[error("completion service rejected the API key ({0})")]
    Unauthorized(StatusCode),

    #[error("completion request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to parse completion response JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("completion response contained no text")]
    EmptyCompletion,
}

impl SummarizeError {
    pub fn request(err: reqwest::Error) -> Self {
        Self::Request(err.without_url())
    }
}

/// Failure while building or delivering the email.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("invalid email address '{address}': {source}")]
    InvalidAddress {
        address: String,
        source: lettre::address::AddressError,
    },

    #[error("no recipients to send to")]
    NoRecipients,

    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP relay error for {host}: {source}")]
    Relay {
        host: String,
        source: lettre::transport::smtp::Error,
    },

    #[error("SMTP send failed: {0}")]
    Transport(#[source] lettre::transport::smtp::Error),

    #[error("SMTP worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration loading or validation error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to access config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize configuration to TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine platform config directory")]
    NoConfigDir,
}

impl ConfigError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingRequired {
            key: key.into(),
            hint: "Hint: run `weather-digest configure` or set the matching environment variable."
                .to_string(),
        }
    }
}

/// Pipeline stage that produced a [`DigestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Summarize,
    Send,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Summarize => "summarize",
            Stage::Send => "send",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any stage failure, as seen by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("forecast fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("summarization failed: {0}")]
    Summarize(#[from] SummarizeError),

    #[error("sending email failed: {0}")]
    Send(#[from] SendError),
}

impl DigestError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fetch(_) => Stage::Fetch,
            Self::Summarize(_) => Stage::Summarize,
            Self::Send(_) => Stage::Send,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_error_reports_stage() {
        let err = DigestError::from(SummarizeError::EmptyCompletion);
        assert_eq!(err.stage(), Stage::Summarize);
        assert!(err.to_string().starts_with("summarization failed"));

        let err = DigestError::from(SendError::NoRecipients);
        assert_eq!(err.stage(), Stage::Send);
        assert_eq!(err.stage().to_string(), "send");
    }

    #[test]
    fn missing_config_carries_hint() {
        let err = ConfigError::missing("email.password");
        let msg = err.to_string();
        assert!(msg.contains("email.password"));
        assert!(msg.contains("weather-digest configure"));
    }
}
