use crate::{
    Config, FetchError, LocationQuery, WeatherSnapshot,
    provider::openweather::OpenWeatherClient,
};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Source of current weather. One call is one request; implementations never retry.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError>;
}

/// Construct the OpenWeather client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherClient>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `weatherview configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    let client = match config.base_url.as_deref() {
        Some(base) => OpenWeatherClient::with_base_url(api_key.to_owned(), base),
        None => OpenWeatherClient::new(api_key.to_owned()),
    }
    .context("Failed to build OpenWeather client")?;

    Ok(Arc::new(client))
}
