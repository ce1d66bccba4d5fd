//! Weather view-model: owns the render state and every transition on it.
//!
//! The presentation layer only reads, through [`WeatherViewModel::subscribe`]
//! or [`WeatherViewModel::state`]. All writes go through the transition
//! methods on `Inner`, which hold the bookkeeping lock while they update the
//! watch channel so sequence checks and state changes happen together.

use serde::{Deserialize, Serialize};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::sync::watch;

use crate::{
    error::{FetchError, ValidationError},
    geolocation::Geolocator,
    model::{CityName, LocationQuery, WeatherSnapshot},
    provider::WeatherClient,
    storage::{CoordinateStore, load_coordinates, save_coordinates},
};

pub const ERROR_TTL: Duration = Duration::from_secs(3);
pub const SHAKE_DURATION: Duration = Duration::from_secs(1);

/// Which response wins when two fetches overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseOrdering {
    /// Only the most recently issued request may update state; older
    /// completions are discarded.
    #[default]
    LastIssued,
    /// Every completion is applied in the order it arrives.
    LastCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Error(String),
}

/// Everything the presentation layer needs to draw a frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub status: RequestStatus,
    pub snapshot: Option<Arc<WeatherSnapshot>>,
    /// Location of the most recently issued request.
    pub location: Option<LocationQuery>,
    /// Search box shake signal after rejected input.
    pub shaking: bool,
}

/// What to draw. A snapshot is never paired with the loading indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View<'a> {
    Loading,
    Card {
        snapshot: &'a WeatherSnapshot,
        error: Option<&'a str>,
    },
    Unavailable {
        error: Option<&'a str>,
    },
}

impl ViewState {
    pub fn view(&self) -> View<'_> {
        match (&self.status, self.snapshot.as_deref()) {
            (RequestStatus::Loading, _) => View::Loading,
            (_, Some(snapshot)) => View::Card {
                snapshot,
                error: self.error(),
            },
            (_, None) => View::Unavailable {
                error: self.error(),
            },
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            RequestStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == RequestStatus::Loading
    }
}

/// What happened to one `fetch_weather` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Updated,
    Failed(String),
    /// A newer request was issued before this one finished.
    Discarded,
}

#[derive(Debug, Clone, Copy)]
pub struct ViewModelOptions {
    pub error_ttl: Duration,
    pub shake_duration: Duration,
    pub ordering: ResponseOrdering,
}

impl Default for ViewModelOptions {
    fn default() -> Self {
        Self {
            error_ttl: ERROR_TTL,
            shake_duration: SHAKE_DURATION,
            ordering: ResponseOrdering::default(),
        }
    }
}

#[derive(Debug, Default)]
struct Bookkeeping {
    issued: u64,
    /// Request whose result the state is still waiting for.
    awaiting: Option<u64>,
    error_epoch: u64,
    shake_epoch: u64,
}

#[derive(Debug)]
struct Inner {
    client: Arc<dyn WeatherClient>,
    store: Arc<dyn CoordinateStore>,
    geolocator: Arc<dyn Geolocator>,
    default_location: LocationQuery,
    options: ViewModelOptions,
    state: watch::Sender<ViewState>,
    book: Mutex<Bookkeeping>,
}

/// Cheap to clone; clones share one state.
#[derive(Debug, Clone)]
pub struct WeatherViewModel {
    inner: Arc<Inner>,
}

impl WeatherViewModel {
    pub fn new(
        client: Arc<dyn WeatherClient>,
        store: Arc<dyn CoordinateStore>,
        geolocator: Arc<dyn Geolocator>,
        default_location: LocationQuery,
        options: ViewModelOptions,
    ) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            inner: Arc::new(Inner {
                client,
                store,
                geolocator,
                default_location,
                options,
                state,
                book: Mutex::new(Bookkeeping::default()),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> ViewState {
        self.inner.state.borrow().clone()
    }

    /// Startup: persisted coordinates if any; otherwise the default location,
    /// racing a position lookup that re-fetches (and persists) on success.
    pub async fn initialize(&self) {
        if let Some(coords) = load_coordinates(self.inner.store.as_ref()) {
            tracing::info!(%coords, "using persisted coordinates");
            self.fetch_weather(coords.into()).await;
            return;
        }

        let default = self.fetch_weather(self.inner.default_location.clone());
        let located = async {
            match self.inner.geolocator.locate().await {
                Ok(coords) => {
                    tracing::info!(%coords, "geolocation resolved");
                    if let Err(e) = save_coordinates(self.inner.store.as_ref(), coords) {
                        tracing::warn!("Failed to persist coordinates: {e:#}");
                    }
                    self.fetch_weather(coords.into()).await;
                }
                Err(e) => {
                    tracing::debug!("geolocation failed, keeping default location: {e}");
                }
            }
        };

        tokio::join!(default, located);
    }

    /// Validate `input` and fetch it by name. Rejected input sets the error
    /// and shake signal and issues no request.
    pub async fn search(&self, input: &str) -> Result<FetchOutcome, ValidationError> {
        match CityName::parse(input) {
            Ok(name) => Ok(self.fetch_weather(LocationQuery::Name(name)).await),
            Err(e) => {
                tracing::debug!(input, "rejected search input");
                self.inner.reject_input(&e);
                Err(e)
            }
        }
    }

    /// Issue exactly one request for `query` and apply its result.
    pub async fn fetch_weather(&self, query: LocationQuery) -> FetchOutcome {
        let seq = self.inner.begin_request(&query);
        let result = self.inner.client.fetch(&query).await;
        self.inner.complete_request(seq, &query, result)
    }
}

impl Inner {
    fn book(&self) -> MutexGuard<'_, Bookkeeping> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Idle/Error -> Loading.
    fn begin_request(&self, query: &LocationQuery) -> u64 {
        let mut book = self.book();
        book.issued += 1;
        book.error_epoch += 1;
        let seq = book.issued;
        book.awaiting = Some(seq);

        self.state.send_modify(|s| {
            s.status = RequestStatus::Loading;
            s.location = Some(query.clone());
        });
        tracing::debug!(seq, %query, "fetch issued");
        seq
    }

    /// Loading -> Idle with a new snapshot, or Loading -> Error.
    fn complete_request(
        self: &Arc<Self>,
        seq: u64,
        query: &LocationQuery,
        result: Result<WeatherSnapshot, FetchError>,
    ) -> FetchOutcome {
        let mut book = self.book();

        if self.options.ordering == ResponseOrdering::LastIssued && seq != book.issued {
            tracing::debug!(seq, latest = book.issued, %query, "discarding stale response");
            return FetchOutcome::Discarded;
        }
        book.awaiting = None;

        match result {
            Ok(snapshot) => {
                tracing::info!(
                    %query,
                    place = %snapshot.place,
                    condition = ?snapshot.condition,
                    "weather updated"
                );
                self.state.send_modify(|s| {
                    s.status = RequestStatus::Idle;
                    s.snapshot = Some(Arc::new(snapshot));
                });
                FetchOutcome::Updated
            }
            Err(e) => {
                tracing::warn!(%query, "weather fetch failed: {e}");
                let message = e.user_message();
                let epoch = self.raise_error(&mut book, message.clone());
                drop(book);
                self.schedule_error_clear(epoch);
                FetchOutcome::Failed(message)
            }
        }
    }

    fn reject_input(self: &Arc<Self>, error: &ValidationError) {
        let mut book = self.book();
        let error_epoch = self.raise_error(&mut book, error.to_string());
        book.shake_epoch += 1;
        let shake_epoch = book.shake_epoch;
        self.state.send_modify(|s| s.shaking = true);
        drop(book);

        self.schedule_error_clear(error_epoch);
        self.schedule_shake_reset(shake_epoch);
    }

    fn raise_error(&self, book: &mut Bookkeeping, message: String) -> u64 {
        book.error_epoch += 1;
        self.state
            .send_modify(|s| s.status = RequestStatus::Error(message));
        book.error_epoch
    }

    /// Error -> Idle, unless something newer happened since `epoch`.
    /// Back to Loading instead if a rejected search interrupted a fetch.
    fn clear_error(&self, epoch: u64) {
        let book = self.book();
        if book.error_epoch != epoch {
            return;
        }
        let next = match book.awaiting {
            Some(_) => RequestStatus::Loading,
            None => RequestStatus::Idle,
        };
        self.state.send_if_modified(|s| {
            if matches!(s.status, RequestStatus::Error(_)) {
                s.status = next;
                true
            } else {
                false
            }
        });
    }

    fn reset_shake(&self, epoch: u64) {
        let book = self.book();
        if book.shake_epoch != epoch {
            return;
        }
        self.state.send_if_modified(|s| std::mem::replace(&mut s.shaking, false));
    }

    fn schedule_error_clear(self: &Arc<Self>, epoch: u64) {
        let ttl = self.options.error_ttl;
        schedule(Arc::downgrade(self), ttl, move |inner| inner.clear_error(epoch));
    }

    fn schedule_shake_reset(self: &Arc<Self>, epoch: u64) {
        let duration = self.options.shake_duration;
        schedule(Arc::downgrade(self), duration, move |inner| {
            inner.reset_shake(epoch)
        });
    }
}

/// Fire-once timer; a no-op if the view-model is gone by then.
fn schedule<F>(inner: Weak<Inner>, after: Duration, f: F)
where
    F: FnOnce(&Inner) + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        if let Some(inner) = inner.upgrade() {
            f(&inner);
        }
    });
}
