//! Core library for the `weatherview` weather card.
//!
//! This crate defines:
//! - The view-model that owns request status and the last weather snapshot
//! - Abstraction over the weather provider (OpenWeather)
//! - Location handling: search validation, persisted coordinates, geolocation
//! - Configuration on disk
//!
//! It is used by `weatherview-cli`, but any other front end can drive the
//! view-model and subscribe to its state.

pub mod config;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod storage;
pub mod view_model;

pub use config::Config;
pub use error::{FetchError, GeolocationError, ValidationError};
pub use geolocation::{DisabledGeolocator, FixedGeolocator, Geolocator, IpGeolocator};
pub use model::{CityName, Condition, Coordinates, Icon, LocationQuery, WeatherSnapshot, icon_for};
pub use provider::{WeatherClient, client_from_config, openweather::OpenWeatherClient};
pub use storage::{CoordinateStore, FileStore, MemoryStore};
pub use view_model::{
    FetchOutcome, RequestStatus, ResponseOrdering, View, ViewModelOptions, ViewState,
    WeatherViewModel,
};
