use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use inquire::validator::Validation;
use tokio::io::{AsyncBufReadExt, BufReader};
use weatherview_core::{
    CityName, Config, Coordinates, DisabledGeolocator, FileStore, FixedGeolocator,
    GeolocationError, Geolocator, IpGeolocator, View, ViewModelOptions, WeatherViewModel,
    client_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weatherview",
    version,
    about = "Current weather card for a city or your location"
)]
pub struct Cli {
    /// OpenWeather API key; overrides the config file.
    #[arg(long, global = true, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key and default location.
    Configure,

    /// Print the weather card once.
    Show {
        /// City to look up. Without it: last known position, else the default
        /// location refined by geolocation.
        city: Vec<String>,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Keep the card on screen and search by typing city names.
    Interactive {
        #[command(flatten)]
        location: LocationArgs,
    },
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Latitude to use instead of an IP lookup.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to use instead of an IP lookup.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Skip geolocation entirely.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub no_locate: bool,
}

impl LocationArgs {
    fn geolocator(&self) -> Arc<dyn Geolocator> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Arc::new(FixedGeolocator(Coordinates::new(lat, lon))),
            _ if self.no_locate => Arc::new(DisabledGeolocator),
            _ => ip_or_disabled(IpGeolocator::new()),
        }
    }
}

/// Geolocation problems never stop the card from showing.
fn ip_or_disabled(geolocator: Result<IpGeolocator, GeolocationError>) -> Arc<dyn Geolocator> {
    match geolocator {
        Ok(geolocator) => Arc::new(geolocator),
        Err(e) => {
            tracing::warn!("IP geolocation unavailable, using default location only: {e}");
            Arc::new(DisabledGeolocator)
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, location } => {
                let vm = build_view_model(self.api_key, &location)?;

                if city.is_empty() {
                    vm.initialize().await;
                } else {
                    vm.search(&city.join(" ")).await?;
                }

                let state = vm.state();
                if let View::Unavailable { error: Some(message) } = state.view() {
                    bail!("{message}");
                }
                print!("{}", render::render(&state, Local::now()));
                Ok(())
            }
            Command::Interactive { location } => {
                let vm = build_view_model(self.api_key, &location)?;
                interactive(vm).await
            }
        }
    }
}

fn build_view_model(
    api_key: Option<String>,
    location: &LocationArgs,
) -> anyhow::Result<WeatherViewModel> {
    let mut config = Config::load()?;
    if let Some(key) = api_key {
        config.set_api_key(key);
    }

    let client = client_from_config(&config)?;
    let store = FileStore::default_location()?;
    tracing::debug!(path = %store.path().display(), "coordinate store");

    Ok(WeatherViewModel::new(
        client,
        Arc::new(store),
        location.geolocator(),
        config.default_location_query()?,
        ViewModelOptions {
            ordering: config.ordering,
            ..ViewModelOptions::default()
        },
    ))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let default_location = inquire::Text::new("Default location:")
        .with_default(&config.default_location)
        .with_validator(|input: &str| {
            Ok(match CityName::parse(input) {
                Ok(_) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()
        .context("Failed to read default location")?;

    config.set_api_key(api_key);
    config.default_location = default_location;
    config.save()?;

    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn interactive(vm: WeatherViewModel) -> anyhow::Result<()> {
    let mut rx = vm.subscribe();
    let renderer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let frame = {
                let state = rx.borrow_and_update();
                render::render(&state, Local::now())
            };
            println!("{frame}");
        }
    });

    vm.initialize().await;
    println!("Type a city name and press Enter. Ctrl-D quits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        // Rejections are already on screen through the state.
        if let Err(e) = vm.search(&line).await {
            tracing::debug!("search rejected: {e}");
        }
    }

    renderer.abort();
    Ok(())
}
