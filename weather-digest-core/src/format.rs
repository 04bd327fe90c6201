//! Email body rendering.

use crate::model::ForecastRecord;

/// Keyword rules checked in order; the first substring hit wins.
const EMOJI_RULES: &[(&[&str], &str)] = &[
    (&["clear"], "☀️"),
    (&["cloud"], "☁️"),
    (&["rain"], "🌧️"),
    (&["storm"], "⛈️"),
    (&["snow"], "❄️"),
    (&["fog", "mist"], "🌫️"),
];

const DEFAULT_EMOJI: &str = "🌡️";

/// Pick an emoji for a condition description, ignoring case.
pub fn weather_emoji(description: &str) -> &'static str {
    let desc = description.to_lowercase();

    EMOJI_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| desc.contains(*k)))
        .map(|(_, emoji)| *emoji)
        .unwrap_or(DEFAULT_EMOJI)
}

/// One bullet line per record, in input order.
pub fn bullet_lines(forecast: &[ForecastRecord]) -> String {
    forecast
        .iter()
        .map(|f| {
            format!(
                "- **{}**: {}, {} chance of rain {}, {}",
                f.time,
                f.temperature,
                f.precipitation_probability,
                weather_emoji(&f.description),
                f.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Narrative, separator, header, then the hourly bullets.
pub fn format_email(summary: &str, forecast: &[ForecastRecord]) -> String {
    format!(
        "{summary}\n\n---\n\n**Hourly Forecast (6 AM – 9 PM):**\n\n{}\n",
        bullet_lines(forecast)
    )
}
