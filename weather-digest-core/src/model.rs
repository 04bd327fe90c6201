use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
    Standard,
}

impl UnitSystem {
    /// Value of the OpenWeather `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "imperial",
            UnitSystem::Metric => "metric",
            UnitSystem::Standard => "standard",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "°F",
            UnitSystem::Metric => "°C",
            UnitSystem::Standard => "K",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "imperial" => Ok(UnitSystem::Imperial),
            "metric" => Ok(UnitSystem::Metric),
            "standard" => Ok(UnitSystem::Standard),
            _ => Err(format!(
                "unknown unit system '{value}'. Supported: imperial, metric, standard."
            )),
        }
    }
}

/// Postal code plus country, as OpenWeather's `zip` parameter expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub code: String,
    pub country: String,
}

impl Location {
    pub const DEFAULT_CODE: &'static str = "30308";
    pub const DEFAULT_COUNTRY: &'static str = "us";

    pub fn new(code: impl Into<String>, country: impl Into<String>) -> Self {
        Self { code: code.into(), country: country.into() }
    }

    pub fn zip_query(&self) -> String {
        format!("{},{}", self.code, self.country)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CODE, Self::DEFAULT_COUNTRY)
    }
}

/// One retained hourly sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// Hour label such as "6 AM".
    pub time: String,
    /// Rounded temperature with unit, e.g. "69°F".
    pub temperature: String,
    /// Chance of precipitation, e.g. "42%".
    pub precipitation_probability: String,
    pub description: String,
    pub hour_of_day: u32,
    pub timestamp: NaiveDateTime,
}

/// Composed email, ready for a [`Notifier`](crate::notifier::Notifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

impl EmailMessage {
    /// Build a message whose subject is stamped with `date`.
    pub fn new(body: String, recipients: Vec<String>, date: NaiveDate) -> Self {
        Self { subject: email_subject(date), body, recipients }
    }
}

/// Subject line stamped with a long-form date, e.g. "Weather Update June 01, 2024".
pub fn email_subject(date: NaiveDate) -> String {
    format!("Weather Update {}", date.format("%B %d, %Y"))
}
