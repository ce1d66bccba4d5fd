use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::{
    error::FetchError,
    model::{Condition, LocationQuery, WeatherSnapshot},
};

use super::WeatherClient;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Current-weather client for the OpenWeather `/weather` endpoint, metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    weather_url: Url,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Result<Self, FetchError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at another host serving the same API (proxies, tests).
    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, FetchError> {
        let weather_url = Url::parse(&format!("{}/weather", base_url.trim_end_matches('/')))?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_key,
            weather_url,
            http,
        })
    }

    /// Request URL for `query`. Name and coordinate forms never mix.
    pub fn endpoint_url(&self, query: &LocationQuery) -> Url {
        let mut url = self.weather_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            match query {
                LocationQuery::Name(city) => {
                    pairs.append_pair("q", city.as_str());
                }
                LocationQuery::Coordinates(coords) => {
                    pairs.append_pair("lat", &coords.latitude.to_string());
                    pairs.append_pair("lon", &coords.longitude.to_string());
                }
            }
            pairs.append_pair("appid", &self.api_key);
            pairs.append_pair("units", "metric");
        }
        url
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn fetch(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
        tracing::debug!(%query, "requesting current weather from OpenWeather");

        let res = self.http.get(self.endpoint_url(query)).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %truncate_body(&body),
                "OpenWeather request failed"
            );
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_snapshot(Utc::now()))
    }
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    sys: OwSys,
    #[serde(default)]
    weather: Vec<OwWeather>,
    main: OwMain,
    visibility: Option<u32>,
    #[serde(default)]
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_snapshot(self, fetched_at: DateTime<Utc>) -> WeatherSnapshot {
        let (condition_label, description) = self
            .weather
            .into_iter()
            .next()
            .map(|w| (w.main, w.description))
            .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

        WeatherSnapshot {
            place: self.name,
            country: self.sys.country.unwrap_or_default(),
            condition: Condition::from_main(&condition_label),
            condition_label,
            description,
            temperature_c: self.main.temp,
            feels_like_c: self.main.feels_like,
            humidity_pct: self.main.humidity,
            visibility_m: self.visibility,
            wind_speed_mps: self.wind.speed,
            fetched_at,
        }
    }
}

/// Best-effort `message` field from an error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
