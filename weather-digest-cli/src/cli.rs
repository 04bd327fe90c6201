use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use weather_digest_core::{Config, Pipeline, RunOutcome, UnitSystem, config::parse_recipients};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-digest", version, about = "Daily weather summary by email")]
pub struct Cli {
    /// Defaults to `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, summarize and email today's forecast.
    Run {
        /// Postal code; overrides the configured location.
        #[arg(long)]
        location: Option<String>,

        /// Country code paired with --location.
        #[arg(long)]
        country: Option<String>,

        /// Print the email instead of sending it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Interactively set API keys, SMTP credentials and recipients.
    Configure,

    /// Show the config file path and which settings are missing.
    ShowConfig,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Run { location: None, country: None, dry_run: false })
        {
            Command::Run { location, country, dry_run } => run_digest(location, country, dry_run).await,
            Command::Configure => configure(),
            Command::ShowConfig => show_config(),
        }
    }
}

async fn run_digest(
    location: Option<String>,
    country: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    config.apply_env()?;

    if location.is_some() {
        config.weather.location = location;
    }
    if country.is_some() {
        config.weather.country = country;
    }

    let settings = config.resolve()?;
    let pipeline = Pipeline::from_settings(&settings).dry_run(dry_run);

    match pipeline.run_logged().await {
        RunOutcome::DryRun(message) => {
            println!("To: {}", message.recipients.join(", "));
            println!("Subject: {}", message.subject);
            println!();
            println!("{}", message.body);
        }
        RunOutcome::Sent => println!("✅ Weather summary sent!"),
        // already logged by the pipeline
        RunOutcome::Failed(_) => {}
    }

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    if let Some(key) = prompt_secret("OpenWeather API key:", &config.weather.api_key)? {
        config.weather.api_key = Some(key);
    }

    let location = Text::new("Postal code:")
        .with_default(config.weather.location.as_deref().unwrap_or("30308"))
        .prompt()?;
    config.weather.location = Some(location);

    let country = Text::new("Country code:")
        .with_default(config.weather.country.as_deref().unwrap_or("us"))
        .prompt()?;
    config.weather.country = Some(country);

    let units = Select::new(
        "Units:",
        vec![UnitSystem::Imperial, UnitSystem::Metric, UnitSystem::Standard],
    )
    .with_starting_cursor(match config.weather.units.unwrap_or_default() {
        UnitSystem::Imperial => 0,
        UnitSystem::Metric => 1,
        UnitSystem::Standard => 2,
    })
    .prompt()?;
    config.weather.units = Some(units);

    let label = Text::new("Location name for the summary (blank for postal code):")
        .with_default(config.summary.location_label.as_deref().unwrap_or(""))
        .prompt()?;
    config.summary.location_label = Some(label).filter(|l| !l.trim().is_empty());

    if let Some(key) = prompt_secret("OpenAI API key:", &config.summary.api_key)? {
        config.summary.api_key = Some(key);
    }

    let username = Text::new("SMTP username (sender address):")
        .with_default(config.email.username.as_deref().unwrap_or(""))
        .prompt()?;
    config.email.username = Some(username).filter(|u| !u.trim().is_empty());

    if let Some(password) = prompt_secret("SMTP password:", &config.email.password)? {
        config.email.password = Some(password);
    }

    let recipients = Text::new("Recipients (comma-separated):")
        .with_default(&config.email.recipients.join(","))
        .prompt()?;
    config.email.recipients = parse_recipients(&recipients);

    let path = config.save().context("Failed to save configuration")?;
    println!("Configuration saved to {}", path.display());

    let missing = config.missing_keys();
    if !missing.is_empty() {
        println!("Still missing: {}", missing.join(", "));
    }

    Ok(())
}

/// Ask for a secret; blank input keeps the existing value.
fn prompt_secret(message: &str, existing: &Option<String>) -> anyhow::Result<Option<String>> {
    let mut prompt = Password::new(message)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked);
    if existing.is_some() {
        prompt = prompt.with_help_message("Leave blank to keep the current value");
    }

    let value = prompt.prompt()?;

    Ok(Some(value).filter(|v| !v.trim().is_empty()))
}

fn show_config() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load()?;
    config.apply_env()?;

    println!("Config file: {}", path.display());
    println!(
        "Location: {},{}",
        config.weather.location.as_deref().unwrap_or("30308"),
        config.weather.country.as_deref().unwrap_or("us")
    );
    println!("Units: {}", config.weather.units.unwrap_or_default());
    println!("Recipients: {}", config.email.recipients.len());

    let missing = config.missing_keys();
    if missing.is_empty() {
        println!("All credentials are set.");
    } else {
        println!("Missing: {}", missing.join(", "));
        println!("Hint: run `weather-digest configure` or set the matching environment variables.");
    }

    Ok(())
}
