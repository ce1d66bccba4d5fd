//! One-shot position lookup.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{error::GeolocationError, model::Coordinates};

pub const IP_API_URL: &str = "http://ip-api.com/json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Approximate position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    http: Client,
}

impl IpGeolocator {
    pub fn new() -> Result<Self, GeolocationError> {
        Self::with_url(IP_API_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Result<Self, GeolocationError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GeolocationError::Lookup(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| GeolocationError::Lookup(e.to_string()))?;

        if !res.status().is_success() {
            return Err(GeolocationError::Lookup(format!(
                "lookup returned status {}",
                res.status()
            )));
        }

        let body: IpApiResponse = res
            .json()
            .await
            .map_err(|e| GeolocationError::Lookup(e.to_string()))?;

        match body {
            IpApiResponse {
                status,
                lat: Some(lat),
                lon: Some(lon),
                ..
            } if status == "success" => {
                tracing::debug!(lat, lon, "resolved position from IP address");
                Ok(Coordinates::new(lat, lon))
            }
            IpApiResponse { message, .. } => Err(GeolocationError::Lookup(
                message.unwrap_or_else(|| "no position in response".to_string()),
            )),
        }
    }
}

/// Position supplied by the user.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Geolocation turned off; behaves like a denied permission prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeolocator;

#[async_trait]
impl Geolocator for DisabledGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Denied)
    }
}
