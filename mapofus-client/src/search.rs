//! Debounced place search.
//!
//! Keystrokes restart an 800 ms timer; only when typing pauses is the
//! geocoder queried. Responses are applied in arrival order, so a slow
//! response for an older query can overwrite a newer one.

use async_trait::async_trait;
use mapofus_types::PlaceCandidate;
use parking_lot::Mutex;
use reqwest::header::ACCEPT_LANGUAGE;
use std::sync::Arc;
use std::time::Duration;

use crate::surface::{DEFAULT_ZOOM, Viewport};
use crate::timer::CancellableTimer;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(800);
/// How long results stay visible after the input loses focus, so a click on
/// a result still lands.
pub const BLUR_GRACE: Duration = Duration::from_millis(200);
pub const MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Debouncing,
    Querying,
    Results(Vec<PlaceCandidate>),
    Empty,
    Error(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("geocoder returned HTTP {0}")]
    Status(u16),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, GeocodeError>;
}

pub struct NominatimGeocoder {
    http: reqwest::Client,
    host: String,
    language: String,
}

impl NominatimGeocoder {
    pub const DEFAULT_HOST: &'static str = "https://nominatim.openstreetmap.org";

    pub fn new(language: &str) -> Self {
        Self::with_host(Self::DEFAULT_HOST, language)
    }

    pub fn with_host(host: &str, language: &str) -> Self {
        Self {
            http: supabase_client::http::shared_client().clone(),
            host: host.trim_end_matches('/').to_string(),
            language: language.to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, GeocodeError> {
        let limit = MAX_RESULTS.to_string();
        let response = self
            .http
            .get(format!("{}/search", self.host))
            .query(&[("q", query), ("format", "json"), ("limit", limit.as_str())])
            .header(ACCEPT_LANGUAGE, &self.language)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}

struct SearchInner {
    query: String,
    state: SearchState,
    results_visible: bool,
}

pub struct PlaceSearch {
    geocoder: Arc<dyn Geocoder>,
    viewport: Arc<dyn Viewport>,
    inner: Arc<Mutex<SearchInner>>,
    debounce: CancellableTimer,
    blur: CancellableTimer,
}

impl PlaceSearch {
    pub fn new(geocoder: Arc<dyn Geocoder>, viewport: Arc<dyn Viewport>) -> Self {
        Self {
            geocoder,
            viewport,
            inner: Arc::new(Mutex::new(SearchInner {
                query: String::new(),
                state: SearchState::Idle,
                results_visible: false,
            })),
            debounce: CancellableTimer::new(),
            blur: CancellableTimer::new(),
        }
    }

    pub fn query(&self) -> String {
        self.inner.lock().query.clone()
    }

    pub fn state(&self) -> SearchState {
        self.inner.lock().state.clone()
    }

    /// Candidates to render, if the list is open and has any.
    pub fn visible_results(&self) -> Vec<PlaceCandidate> {
        let inner = self.inner.lock();
        match (&inner.state, inner.results_visible) {
            (SearchState::Results(results), true) => results.clone(),
            _ => Vec::new(),
        }
    }

    pub fn input(&self, text: &str) {
        {
            let mut inner = self.inner.lock();
            inner.query = text.to_string();
            if text.trim().is_empty() {
                inner.state = SearchState::Idle;
                drop(inner);
                self.debounce.cancel();
                return;
            }
            inner.state = SearchState::Debouncing;
            inner.results_visible = true;
        }

        let geocoder = self.geocoder.clone();
        let inner = self.inner.clone();
        let query = text.to_string();
        self.debounce.restart(SEARCH_DEBOUNCE, async move {
            inner.lock().state = SearchState::Querying;
            log::debug!("[SEARCH] Querying geocoder for '{}'", query);

            let next = match geocoder.search(&query).await {
                Ok(results) if results.is_empty() => SearchState::Empty,
                Ok(results) => {
                    SearchState::Results(results.into_iter().take(MAX_RESULTS).collect())
                }
                Err(e) => {
                    log::warn!("[SEARCH] Error searching location '{}': {}", query, e);
                    SearchState::Error(e.to_string())
                }
            };
            inner.lock().state = next;
        });
    }

    /// Recenter on the chosen result and reset the search box. Returns the
    /// candidate, or `None` when the index is stale or its coordinates do
    /// not parse.
    pub fn select(&self, index: usize) -> Option<PlaceCandidate> {
        let candidate = match &self.inner.lock().state {
            SearchState::Results(results) => results.get(index).cloned(),
            _ => None,
        }?;

        let Some(center) = candidate.coordinates() else {
            log::warn!(
                "[SEARCH] Ignoring result with unparsable coordinates: {}",
                candidate.display_name
            );
            return None;
        };

        self.viewport.set_view(center, DEFAULT_ZOOM);
        self.debounce.cancel();
        self.blur.cancel();
        let mut inner = self.inner.lock();
        inner.query.clear();
        inner.state = SearchState::Idle;
        inner.results_visible = false;
        Some(candidate)
    }

    pub fn blur(&self) {
        let inner = self.inner.clone();
        self.blur.restart(BLUR_GRACE, async move {
            inner.lock().results_visible = false;
        });
    }

    pub fn focus(&self) {
        self.blur.cancel();
        self.inner.lock().results_visible = true;
    }

    /// Cancel pending timers. In-flight geocoder requests finish on their own.
    pub fn teardown(&self) {
        self.debounce.cancel();
        self.blur.cancel();
    }
}
