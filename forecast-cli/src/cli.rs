use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use forecast_core::{Config, Coordinates, ExcludeOptions, ForecastClient, ForecastSession};
use inquire::{Confirm, Password, PasswordDisplayMode, Text};

use crate::render::{Limits, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Weather forecast for a location")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key, excluded data blocks and default location.
    Configure,

    /// Fetch and show the forecast for a location.
    Show {
        /// Coordinates as `<lat>,<lon>`; defaults to the configured location.
        #[arg(allow_hyphen_values = true)]
        location: Option<Coordinates>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Decode a saved provider payload without touching the network.
    Parse {
        /// Path to a JSON payload.
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, clap::Args)]
pub struct OutputArgs {
    /// Print the decoded forecast as JSON.
    #[arg(long)]
    json: bool,

    /// Number of hourly entries to show.
    #[arg(long, default_value_t = 12)]
    hours: usize,

    /// Number of daily entries to show.
    #[arg(long, default_value_t = 7)]
    days: usize,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { location, output } => {
                let config = Config::load()?;
                let coordinates = location.or(config.default_location).ok_or_else(|| {
                    anyhow!(
                        "No location given.\n\
                         Hint: pass `<lat>,<lon>` or run `forecast configure` to set a default location."
                    )
                })?;

                tracing::debug!(%coordinates, "requesting forecast");
                let session = ForecastSession::new(ForecastClient::from_config(&config)?);
                let forecast = session
                    .refresh(coordinates)
                    .await
                    .map_err(|e| {
                        let message = e.user_message();
                        anyhow::Error::new(e).context(message)
                    })?;

                print(&forecast, &output)
            }
            Command::Parse { file, output } => {
                let raw = std::fs::read(&file)
                    .with_context(|| format!("Failed to read payload: {}", file.display()))?;
                let forecast = forecast_core::parse(&raw)
                    .with_context(|| format!("Failed to decode payload: {}", file.display()))?;

                print(&forecast, &output)
            }
        }
    }
}

fn print(forecast: &forecast_core::ForecastResponse, output: &OutputArgs) -> anyhow::Result<()> {
    if output.json {
        let json = serde_json::to_string_pretty(forecast).context("Failed to serialize forecast")?;
        println!("{json}");
    } else {
        let limits = Limits { hours: output.hours, days: output.days };
        print!("{}", render(forecast, limits));
    }
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    let minutely = Confirm::new("Exclude minute-level data?")
        .with_default(config.exclude.minutely)
        .prompt()?;
    let flags = Confirm::new("Exclude provider metadata (flags)?")
        .with_default(config.exclude.flags)
        .prompt()?;
    config.exclude = ExcludeOptions { minutely, flags };

    let current = config.default_location.map(|c| c.to_string()).unwrap_or_default();
    let location = Text::new("Default location (<lat>,<lon>):")
        .with_initial_value(&current)
        .with_help_message("Leave empty for none")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                return Ok(inquire::validator::Validation::Valid);
            }
            Ok(match input.parse::<Coordinates>() {
                Ok(_) => inquire::validator::Validation::Valid,
                Err(e) => inquire::validator::Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()?;
    config.default_location = if location.trim().is_empty() {
        None
    } else {
        Some(location.parse()?)
    };

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
