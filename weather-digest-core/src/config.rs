use directories::ProjectDirs;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::ConfigError,
    model::{Location, UnitSystem},
};

pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// `[weather]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    /// Postal code; defaults to 30308.
    pub location: Option<String>,
    /// Country code paired with `location`; defaults to "us".
    pub country: Option<String>,
    pub units: Option<UnitSystem>,
    pub base_url: Option<String>,
}

/// `[summary]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SummaryConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Place name used in the prompt, e.g. "Atlanta (30308)".
    pub location_label: Option<String>,
}

/// `[email]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmailConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub recipients: Vec<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
/// location = "30308"
///
/// [email]
/// username = "me@example.com"
/// recipients = ["me@example.com", "you@example.com"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherConfig,
    pub summary: SummaryConfig,
    pub email: EmailConfig,
}

/// Validated settings for the weather provider.
#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub api_key: SecretString,
    pub location: Location,
    pub units: UnitSystem,
    pub base_url: String,
}

/// Validated settings for the completion service.
#[derive(Debug, Clone)]
pub struct SummarySettings {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    pub location_label: String,
}

/// Validated settings for the SMTP notifier.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub username: String,
    pub password: SecretString,
    pub from: String,
    pub recipients: Vec<String>,
    pub smtp_host: String,
    pub smtp_port: Option<u16>,
}

/// Everything one run needs, with every credential present.
#[derive(Debug, Clone)]
pub struct Settings {
    pub weather: WeatherSettings,
    pub summary: SummarySettings,
    pub email: EmailSettings,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;

        toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::Io { path: parent.to_path_buf(), source })?;
        }

        let toml = toml::to_string_pretty(self)?;

        fs::write(path, toml).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("dev", "weather-digest", "weather-digest")
            .ok_or(ConfigError::NoConfigDir)?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`; empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENWEATHER_API_KEY") {
            self.weather.api_key = Some(v);
        }
        if let Some(v) = get("WEATHER_DIGEST_LOCATION") {
            self.weather.location = Some(v);
        }
        if let Some(v) = get("WEATHER_DIGEST_UNITS") {
            let units = UnitSystem::try_from(v.as_str()).map_err(|message| {
                ConfigError::InvalidValue { key: "WEATHER_DIGEST_UNITS".into(), message }
            })?;
            self.weather.units = Some(units);
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.summary.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.summary.model = Some(v);
        }
        if let Some(v) = get("EMAIL_USER") {
            self.email.username = Some(v);
        }
        if let Some(v) = get("EMAIL_PASSWORD") {
            self.email.password = Some(v);
        }
        if let Some(v) = get("EMAIL_RECIPIENTS") {
            self.email.recipients = parse_recipients(&v);
        }
        if let Some(v) = get("EMAIL_SMTP_HOST") {
            self.email.smtp_host = Some(v);
        }
        if let Some(v) = get("EMAIL_SMTP_PORT") {
            let port = v.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "EMAIL_SMTP_PORT".into(),
                message: e.to_string(),
            })?;
            self.email.smtp_port = Some(port);
        }

        Ok(())
    }

    /// Validate and turn the raw config into [`Settings`].
    ///
    /// Credentials have no fallback values: each missing one is an error.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let weather_key = required(&self.weather.api_key, "weather.api_key (OPENWEATHER_API_KEY)")?;
        let summary_key = required(&self.summary.api_key, "summary.api_key (OPENAI_API_KEY)")?;
        let username = required(&self.email.username, "email.username (EMAIL_USER)")?;
        let password = required(&self.email.password, "email.password (EMAIL_PASSWORD)")?;

        let recipients: Vec<String> = self
            .email
            .recipients
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if recipients.is_empty() {
            return Err(ConfigError::missing("email.recipients (EMAIL_RECIPIENTS)"));
        }

        let location = Location::new(
            non_empty(&self.weather.location).unwrap_or(Location::DEFAULT_CODE),
            non_empty(&self.weather.country).unwrap_or(Location::DEFAULT_COUNTRY),
        );

        let location_label = non_empty(&self.summary.location_label)
            .map(str::to_string)
            .unwrap_or_else(|| location.code.clone());

        Ok(Settings {
            weather: WeatherSettings {
                api_key: SecretString::from(weather_key),
                location,
                units: self.weather.units.unwrap_or_default(),
                base_url: non_empty(&self.weather.base_url)
                    .unwrap_or(OPENWEATHER_BASE_URL)
                    .to_string(),
            },
            summary: SummarySettings {
                api_key: SecretString::from(summary_key),
                model: non_empty(&self.summary.model).unwrap_or(DEFAULT_MODEL).to_string(),
                base_url: non_empty(&self.summary.base_url).unwrap_or(OPENAI_BASE_URL).to_string(),
                location_label,
            },
            email: EmailSettings {
                from: non_empty(&self.email.from).unwrap_or(username.as_str()).to_string(),
                username,
                password: SecretString::from(password),
                recipients,
                smtp_host: non_empty(&self.email.smtp_host)
                    .unwrap_or(DEFAULT_SMTP_HOST)
                    .to_string(),
                smtp_port: self.email.smtp_port,
            },
        })
    }

    /// Names of the credentials that are still unset, for display.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if non_empty(&self.weather.api_key).is_none() {
            missing.push("weather.api_key");
        }
        if non_empty(&self.summary.api_key).is_none() {
            missing.push("summary.api_key");
        }
        if non_empty(&self.email.username).is_none() {
            missing.push("email.username");
        }
        if non_empty(&self.email.password).is_none() {
            missing.push("email.password");
        }
        if self.email.recipients.iter().all(|r| r.trim().is_empty()) {
            missing.push("email.recipients");
        }
        missing
    }
}

/// Split a comma-separated recipient list, dropping blanks.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required(value: &Option<String>, key: &str) -> Result<String, ConfigError> {
    non_empty(value).map(str::to_string).ok_or_else(|| ConfigError::missing(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn complete() -> Config {
        let mut cfg = Config::default();
        cfg.weather.api_key = Some("OW_KEY".into());
        cfg.summary.api_key = Some("AI_KEY".into());
        cfg.email.username = Some("me@example.com".into());
        cfg.email.password = Some("app-password".into());
        cfg.email.recipients = vec!["me@example.com".into()];
        cfg
    }

    #[test]
    fn resolve_errors_when_credentials_missing() {
        let err = Config::default().resolve().unwrap_err();
        assert!(err.to_string().contains("weather.api_key"));

        let mut cfg = complete();
        cfg.email.password = None;
        let err = cfg.resolve().unwrap_err();
        assert!(err.to_string().contains("email.password"));
    }

    #[test]
    fn resolve_rejects_blank_recipients() {
        let mut cfg = complete();
        cfg.email.recipients = vec!["  ".into(), String::new()];
        let err = cfg.resolve().unwrap_err();
        assert!(err.to_string().contains("email.recipients"));
    }

    #[test]
    fn resolve_applies_non_secret_defaults() {
        let settings = complete().resolve().expect("complete config must resolve");

        assert_eq!(settings.weather.location, Location::default());
        assert_eq!(settings.weather.units, UnitSystem::Imperial);
        assert_eq!(settings.weather.base_url, OPENWEATHER_BASE_URL);
        assert_eq!(settings.summary.model, DEFAULT_MODEL);
        assert_eq!(settings.summary.location_label, "30308");
        assert_eq!(settings.email.from, "me@example.com");
        assert_eq!(settings.email.smtp_host, DEFAULT_SMTP_HOST);
        assert_eq!(settings.weather.api_key.expose_secret(), "OW_KEY");
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OPENWEATHER_API_KEY", "ENV_KEY"),
            ("WEATHER_DIGEST_UNITS", "metric"),
            ("EMAIL_RECIPIENTS", "a@example.com, b@example.com,,"),
            ("EMAIL_SMTP_PORT", "587"),
            ("OPENAI_MODEL", ""),
        ]);

        let mut cfg = complete();
        cfg.summary.model = Some("gpt-4o-mini".into());
        cfg.apply_env_with(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(cfg.weather.api_key.as_deref(), Some("ENV_KEY"));
        assert_eq!(cfg.weather.units, Some(UnitSystem::Metric));
        assert_eq!(cfg.email.recipients, vec!["a@example.com", "b@example.com"]);
        assert_eq!(cfg.email.smtp_port, Some(587));
        // empty env value leaves the file value alone
        assert_eq!(cfg.summary.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn env_rejects_bad_port() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_with(|k| (k == "EMAIL_SMTP_PORT").then(|| "smtp".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = complete();
        cfg.weather.units = Some(UnitSystem::Metric);
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.weather.api_key.as_deref(), Some("OW_KEY"));
        assert_eq!(loaded.weather.units, Some(UnitSystem::Metric));
        assert_eq!(loaded.email.recipients, vec!["me@example.com"]);
    }

    #[test]
    fn load_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.missing_keys().len(), 5);
    }

    #[test]
    fn parse_recipients_trims_and_drops_blanks() {
        assert_eq!(parse_recipients(" a@x.com ,b@y.org,, "), vec!["a@x.com", "b@y.org"]);
        assert!(parse_recipients("").is_empty());
    }
}
