use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    config::SummarySettings, error::SummarizeError, model::ForecastRecord,
    summarizer::openai::OpenAiSummarizer,
};

pub mod openai;

/// Hours whose conditions are listed separately for the commute sentences.
pub const COMMUTE_HOURS: [u32; 4] = [6, 7, 17, 18];

/// Produces a short narrative for a day's forecast.
#[async_trait]
pub trait Summarizer: Send + Sync + Debug {
    async fn summarize(&self, forecast: &[ForecastRecord]) -> Result<String, SummarizeError>;
}

pub fn summarizer_from_settings(settings: &SummarySettings) -> Box<dyn Summarizer> {
    Box::new(OpenAiSummarizer::new(settings.clone()))
}

/// Every record as `"<time>: <temp>, <pop> rain, <description>"`.
pub fn hourly_lines(forecast: &[ForecastRecord]) -> String {
    forecast
        .iter()
        .map(|f| {
            format!(
                "{}: {}, {} rain, {}",
                f.time, f.temperature, f.precipitation_probability, f.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Commute-hour records as `"<time>: <description>, <temp>, <pop> rain"`.
pub fn commute_lines(forecast: &[ForecastRecord]) -> String {
    forecast
        .iter()
        .filter(|f| COMMUTE_HOURS.contains(&f.hour_of_day))
        .map(|f| {
            format!(
                "{}: {}, {}, {} rain",
                f.time, f.description, f.temperature, f.precipitation_probability
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(location_label: &str, forecast: &[ForecastRecord]) -> String {
    format!(
        "Summarize this weather forecast for {location_label} in 4 sentences:\n\
         1. Overall weather trend\n\
         2. Best time for outdoor activities\n\
         3. Morning commute (6:30-8am) conditions\n\
         4. Evening commute (5-7pm) conditions\n\
         \n\
         Forecast:\n\
         {}\n\
         \n\
         Commute hours:\n\
         {}",
        hourly_lines(forecast),
        commute_lines(forecast),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn record(hour: u32, temp: &str, pop: &str, description: &str) -> ForecastRecord {
        let timestamp =
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(hour, 0, 0).unwrap();
        ForecastRecord {
            time: timestamp.format("%-I %p").to_string(),
            temperature: temp.to_string(),
            precipitation_probability: pop.to_string(),
            description: description.to_string(),
            hour_of_day: hour,
            timestamp,
        }
    }

    fn day() -> Vec<ForecastRecord> {
        vec![
            record(6, "61°F", "0%", "clear sky"),
            record(9, "68°F", "10%", "few clouds"),
            record(18, "75°F", "60%", "light rain"),
        ]
    }

    #[test]
    fn hourly_lines_cover_every_record() {
        assert_eq!(
            hourly_lines(&day()),
            "6 AM: 61°F, 0% rain, clear sky\n\
             9 AM: 68°F, 10% rain, few clouds\n\
             6 PM: 75°F, 60% rain, light rain"
        );
    }

    #[test]
    fn commute_lines_only_include_commute_hours() {
        assert_eq!(
            commute_lines(&day()),
            "6 AM: clear sky, 61°F, 0% rain\n6 PM: light rain, 75°F, 60% rain"
        );
    }

    #[test]
    fn prompt_embeds_both_blocks() {
        let prompt = build_prompt("Atlanta (30308)", &day());

        assert!(prompt.starts_with("Summarize this weather forecast for Atlanta (30308) in 4 sentences:"));
        assert!(prompt.contains("3. Morning commute (6:30-8am) conditions"));
        assert!(prompt.contains("Forecast:\n6 AM: 61°F, 0% rain, clear sky\n"));
        assert!(prompt.ends_with("Commute hours:\n6 AM: clear sky, 61°F, 0% rain\n6 PM: light rain, 75°F, 60% rain"));
    }

    #[test]
    fn empty_forecast_gives_empty_blocks() {
        let prompt = build_prompt("x", &[]);
        assert!(prompt.contains("Forecast:\n\n\nCommute hours:\n"));
    }
}
