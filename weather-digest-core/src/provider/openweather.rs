use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{FixedOffset, Local, TimeZone, Timelike};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::{
    config::{OPENWEATHER_BASE_URL, WeatherSettings},
    error::FetchError,
    http::{endpoint, truncate_body},
    model::{ForecastRecord, Location, UnitSystem},
    provider::in_forecast_window,
};

use super::ForecastProvider;

/// OpenWeather 5 day / 3 hour forecast client.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: SecretString,
    units: UnitSystem,
    base_url: String,
    /// Zone used to read entry hours; `None` means the host's local zone.
    utc_offset: Option<FixedOffset>,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(settings: WeatherSettings) -> Self {
        Self {
            api_key: settings.api_key,
            units: settings.units,
            base_url: settings.base_url,
            utc_offset: None,
            http: Client::new(),
        }
    }

    pub fn with_api_key(api_key: SecretString, units: UnitSystem) -> Self {
        Self {
            api_key,
            units,
            base_url: OPENWEATHER_BASE_URL.to_string(),
            utc_offset: None,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read entry hours in a fixed offset instead of the host zone.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    #[instrument(skip(self), fields(zip = %location.zip_query(), units = %self.units))]
    async fn fetch(&self, location: &Location) -> Result<Vec<ForecastRecord>, FetchError> {
        let url = endpoint(&self.base_url, "data/2.5/forecast");
        let zip = location.zip_query();

        info!("Fetching weather data");

        let res = self
            .http
            .get(url)
            .query(&[
                ("zip", zip.as_str()),
                ("appid", self.api_key.expose_secret()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .map_err(FetchError::request)?;

        let status = res.status();
        let body = res.text().await.map_err(FetchError::request)?;

        if !status.is_success() {
            return Err(FetchError::Status { status, body: truncate_body(&body) });
        }

        let parsed: OwForecastResponse = serde_json::from_str(&body)?;
        debug!(entries = parsed.list.len(), "Weather data fetched");

        let records = match self.utc_offset {
            Some(offset) => normalize_entries(&parsed.list, self.units, &offset)?,
            None => normalize_entries(&parsed.list, self.units, &Local)?,
        };

        info!(records = records.len(), "Forecast data processed");
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    /// Probability of precipitation, 0.0..=1.0.
    #[serde(default)]
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Turn raw entries into daytime records, one per hour of day.
///
/// An hour seen earlier in the response wins over the same hour on a
/// later day.
pub(crate) fn normalize_entries<Tz: TimeZone>(
    entries: &[OwForecastEntry],
    units: UnitSystem,
    tz: &Tz,
) -> Result<Vec<ForecastRecord>, FetchError> {
    let mut seen_hours = HashSet::new();
    let mut records = Vec::new();

    for entry in entries {
        let local = tz
            .timestamp_opt(entry.dt, 0)
            .single()
            .ok_or(FetchError::InvalidTimestamp(entry.dt))?
            .naive_local();
        let hour = local.hour();
        let date_str = local.format("%Y-%m-%d %H:%M");

        if !in_forecast_window(hour) {
            debug!("Skipping {date_str} - outside 6 AM to 9 PM range");
            continue;
        }

        if !seen_hours.insert(hour) {
            debug!("Skipping {date_str} - duplicate hour");
            continue;
        }

        let description = entry
            .weather
            .first()
            .map(|w| w.description.clone())
            .ok_or(FetchError::MissingCondition { dt: entry.dt })?;

        let record = ForecastRecord {
            time: local.format("%-I %p").to_string(),
            temperature: format_temperature(entry.main.temp, units),
            precipitation_probability: format_probability(entry.pop),
            description,
            hour_of_day: hour,
            timestamp: local,
        };

        debug!(
            "Added forecast for {date_str}: {}, {}, {} chance of rain, {}",
            record.time, record.temperature, record.precipitation_probability, record.description
        );
        records.push(record);
    }

    records.sort_by_key(|r| r.hour_of_day);
    Ok(records)
}

fn format_temperature(temp: f64, units: UnitSystem) -> String {
    // halves go to the even neighbour: 68.5 -> 68, 69.5 -> 70
    format!("{}{}", temp.round_ties_even() as i64, units.temperature_suffix())
}

fn format_probability(pop: Option<f64>) -> String {
    // truncation, not rounding
    let pct = (pop.unwrap_or(0.0) * 100.0) as u32;
    format!("{}%", pct.min(100))
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn fetch_hourly_forecast(
        &self,
        location: &Location,
    ) -> Result<Vec<ForecastRecord>, FetchError> {
        self.fetch(location).await
    }
}
