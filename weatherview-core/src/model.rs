use std::{fmt, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

static CITY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L} ]+$").expect("valid city name regex"));

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Place name that passed search validation: letters and spaces only.
///
/// Stored exactly as typed, so the outbound `q=` parameter is the user's input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CityName(String);

impl CityName {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if CITY_NAME_RE.is_match(input) {
            Ok(Self(input.to_owned()))
        } else {
            Err(ValidationError::InvalidCityName)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to ask the provider for: a place name or a coordinate pair.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Name(CityName),
    Coordinates(Coordinates),
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::Name(name) => write!(f, "{name}"),
            LocationQuery::Coordinates(coords) => write!(f, "({coords})"),
        }
    }
}

impl From<CityName> for LocationQuery {
    fn from(name: CityName) -> Self {
        LocationQuery::Name(name)
    }
}

impl From<Coordinates> for LocationQuery {
    fn from(coords: Coordinates) -> Self {
        LocationQuery::Coordinates(coords)
    }
}

/// Primary condition label reported by the provider (`weather[0].main`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Condition {
    Clouds,
    Haze,
    Rain,
    Clear,
    Drizzle,
    Snow,
    Thunderstorm,
    #[default]
    Unknown,
}

impl Condition {
    pub fn from_main(main: &str) -> Self {
        match main {
            "Clouds" => Self::Clouds,
            "Haze" => Self::Haze,
            "Rain" => Self::Rain,
            "Clear" => Self::Clear,
            "Drizzle" => Self::Drizzle,
            "Snow" => Self::Snow,
            "Thunderstorm" => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    pub fn icon(&self) -> Icon {
        match self {
            Self::Clouds => Icon::Cloud,
            Self::Haze => Icon::Haze,
            Self::Rain => Icon::Rain,
            Self::Clear => Icon::Sun,
            Self::Drizzle => Icon::Drizzle,
            Self::Snow => Icon::Snow,
            Self::Thunderstorm => Icon::Thunderstorm,
            Self::Unknown => Icon::Unavailable,
        }
    }
}

/// Presentation category for the condition icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Cloud,
    Haze,
    Rain,
    Sun,
    Drizzle,
    Snow,
    Thunderstorm,
    Unavailable,
}

impl Icon {
    pub const fn all() -> &'static [Icon] {
        &[
            Icon::Cloud,
            Icon::Haze,
            Icon::Rain,
            Icon::Sun,
            Icon::Drizzle,
            Icon::Snow,
            Icon::Thunderstorm,
            Icon::Unavailable,
        ]
    }
}

/// Icon for a raw `weather[0].main` label.
pub fn icon_for(main: &str) -> Icon {
    Condition::from_main(main).icon()
}

/// Result of the most recent successful fetch. Replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub place: String,
    pub country: String,
    pub condition: Condition,
    /// Label as the provider sent it, kept for display when `condition` is `Unknown`.
    pub condition_label: String,
    pub description: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub visibility_m: Option<u32>,
    pub wind_speed_mps: f64,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn icon(&self) -> Icon {
        self.condition.icon()
    }

    /// Visibility in kilometres; `None` when the provider sent none (or zero).
    pub fn visibility_km(&self) -> Option<f64> {
        self.visibility_m
            .filter(|m| *m > 0)
            .map(|m| f64::from(m) / 1000.0)
    }

    pub fn temperature_rounded(&self) -> i64 {
        self.temperature_c.round() as i64
    }

    pub fn feels_like_rounded(&self) -> i64 {
        self.feels_like_c.round() as i64
    }
}
