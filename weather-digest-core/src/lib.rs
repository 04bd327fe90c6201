//! Core library for the `weather-digest` tool.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The forecast provider, summarizer and notifier stages
//! - Email body formatting
//! - The pipeline that runs the stages once, in order
//!
//! It is used by `weather-digest-cli`, but can also be driven by other binaries or schedulers.

pub mod config;
pub mod error;
pub mod format;
mod http;
pub mod model;
pub mod notifier;
pub mod pipeline;
pub mod provider;
pub mod summarizer;

pub use config::{Config, Settings};
pub use error::{ConfigError, DigestError, FetchError, SendError, Stage, SummarizeError};
pub use format::{format_email, weather_emoji};
pub use model::{EmailMessage, ForecastRecord, Location, UnitSystem};
pub use notifier::Notifier;
pub use pipeline::{Pipeline, RunOutcome, RunReport};
pub use provider::ForecastProvider;
pub use summarizer::Summarizer;
