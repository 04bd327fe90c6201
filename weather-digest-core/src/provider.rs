use crate::{
    config::WeatherSettings,
    error::FetchError,
    model::{ForecastRecord, Location},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Earliest hour of day kept in the forecast.
pub const FIRST_HOUR: u32 = 6;
/// Latest hour of day kept in the forecast (inclusive).
pub const LAST_HOUR: u32 = 21;

pub fn in_forecast_window(hour: u32) -> bool {
    (FIRST_HOUR..=LAST_HOUR).contains(&hour)
}

/// Source of hourly forecast records.
///
/// Implementations return records filtered to the daytime window, with at
/// most one record per hour of day, sorted by hour.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_hourly_forecast(
        &self,
        location: &Location,
    ) -> Result<Vec<ForecastRecord>, FetchError>;
}

/// Construct the forecast provider from validated settings.
pub fn provider_from_settings(settings: &WeatherSettings) -> Box<dyn ForecastProvider> {
    Box::new(OpenWeatherProvider::new(settings.clone()))
}
