//! The map page: initial centering, markers, click-to-add and the random
//! memory button.

use mapofus_types::{Coordinates, MemoryRecord, PlaceCandidate};
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::geolocation::GeolocationResolver;
use crate::memory_store::{ImageAttachment, MemoryStoreClient, SubmitError};
use crate::session::{AuthClient, SessionTracker};
use crate::surface::{AUTH_PATH, DEFAULT_ZOOM, Navigator, Notifier, ROOT_PATH, Viewport};

pub const SAVE_FAILED_MESSAGE: &str = "Failed to save memory. Check console for details.";
pub const NO_MEMORIES_MESSAGE: &str = "No memories available yet!";
/// Length of the success animation before the form closes.
pub const SUCCESS_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPhase {
    Locating,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Closed,
    Editing,
    Saving,
    Saved,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    RedirectedToAuth,
    PendingMarkerPlaced(Coordinates),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPreview {
    pub id: String,
    pub coordinates: Coordinates,
    pub image_url: Option<String>,
    pub content: String,
    pub date_label: String,
}

impl From<&MemoryRecord> for MarkerPreview {
    fn from(record: &MemoryRecord) -> Self {
        Self {
            id: record.id.clone(),
            coordinates: record.coordinates(),
            image_url: record.image_url.clone(),
            content: record.content.clone(),
            date_label: record.formatted_date(),
        }
    }
}

/// Renderer hooks the map view drives.
pub struct MapSurfaces {
    pub viewport: Arc<dyn Viewport>,
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
}

struct MapState {
    phase: MapPhase,
    center: Option<Coordinates>,
    markers: Vec<MemoryRecord>,
    pending: Option<Coordinates>,
    form: FormPhase,
}

pub struct MapViewController {
    geolocation: GeolocationResolver,
    store: MemoryStoreClient,
    session: Arc<SessionTracker>,
    auth: Option<Arc<AuthClient>>,
    surfaces: MapSurfaces,
    interactive: bool,
    state: Mutex<MapState>,
}

impl MapViewController {
    pub fn new(
        geolocation: GeolocationResolver,
        store: MemoryStoreClient,
        session: Arc<SessionTracker>,
        surfaces: MapSurfaces,
    ) -> Self {
        Self {
            geolocation,
            store,
            session,
            auth: None,
            surfaces,
            interactive: true,
            state: Mutex::new(MapState {
                phase: MapPhase::Locating,
                center: None,
                markers: Vec::new(),
                pending: None,
                form: FormPhase::Closed,
            }),
        }
    }

    /// A non-interactive map ignores clicks (used for previews).
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_auth_client(mut self, auth: Arc<AuthClient>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn phase(&self) -> MapPhase {
        self.state.lock().phase
    }

    pub fn center(&self) -> Option<Coordinates> {
        self.state.lock().center
    }

    pub fn pending(&self) -> Option<Coordinates> {
        self.state.lock().pending
    }

    pub fn form_phase(&self) -> FormPhase {
        self.state.lock().form
    }

    pub async fn start(&self) {
        let (location, markers) = tokio::join!(self.geolocation.resolve(), self.store.fetch_all());
        log::info!(
            "[MAP] Ready at ({}, {}) with {} memories",
            location.latitude,
            location.longitude,
            markers.len()
        );
        {
            let mut state = self.state.lock();
            state.markers = markers;
            state.phase = MapPhase::Ready;
        }
        self.recenter(location);
    }

    fn recenter(&self, center: Coordinates) {
        self.state.lock().center = Some(center);
        self.surfaces.viewport.set_view(center, DEFAULT_ZOOM);
    }

    pub fn handle_map_click(&self, at: Coordinates) -> ClickOutcome {
        if !self.interactive || self.phase() != MapPhase::Ready {
            return ClickOutcome::Ignored;
        }
        if !self.session.is_signed_in() {
            self.surfaces.navigator.push(AUTH_PATH);
            return ClickOutcome::RedirectedToAuth;
        }

        let mut state = self.state.lock();
        state.pending = Some(at);
        state.form = FormPhase::Editing;
        ClickOutcome::PendingMarkerPlaced(at)
    }

    pub fn marker_previews(&self) -> Vec<MarkerPreview> {
        self.state.lock().markers.iter().map(MarkerPreview::from).collect()
    }

    pub fn random_available(&self) -> bool {
        !self.state.lock().markers.is_empty()
    }

    pub fn handle_random_memory(&self) -> Option<MemoryRecord> {
        self.handle_random_memory_with(&mut rand::thread_rng())
    }

    pub fn handle_random_memory_with<R: Rng>(&self, rng: &mut R) -> Option<MemoryRecord> {
        let picked = {
            let state = self.state.lock();
            if state.markers.is_empty() {
                None
            } else {
                let index = rng.gen_range(0..state.markers.len());
                Some(state.markers[index].clone())
            }
        };

        match picked {
            Some(record) => {
                self.recenter(record.coordinates());
                Some(record)
            }
            None => {
                self.surfaces.notifier.alert(NO_MEMORIES_MESSAGE);
                None
            }
        }
    }

    pub async fn submit_memory(
        &self,
        content: &str,
        image: Option<ImageAttachment>,
    ) -> Result<(), SubmitError> {
        let location = {
            let mut state = self.state.lock();
            let location = state.pending.ok_or(SubmitError::NoPendingLocation)?;
            state.form = FormPhase::Saving;
            location
        };

        let token = self.session.access_token();
        if let Err(e) = self
            .store
            .submit(content, image, location, token.as_deref())
            .await
        {
            log::error!("[MAP] Error saving memory: {}", e);
            self.state.lock().form = FormPhase::Editing;
            self.surfaces.notifier.alert(SAVE_FAILED_MESSAGE);
            return Err(e);
        }

        self.state.lock().form = FormPhase::Saved;
        tokio::time::sleep(SUCCESS_DELAY).await;
        {
            let mut state = self.state.lock();
            state.pending = None;
            state.form = FormPhase::Closed;
        }
        self.refresh_markers().await;
        Ok(())
    }

    pub async fn refresh_markers(&self) {
        let markers = self.store.fetch_all().await;
        self.state.lock().markers = markers;
    }

    pub fn cancel_pending(&self) {
        let mut state = self.state.lock();
        state.pending = None;
        state.form = FormPhase::Closed;
    }

    /// Recenter on a search result. Returns false if its coordinates do not
    /// parse.
    pub fn select_place(&self, candidate: &PlaceCandidate) -> bool {
        match candidate.coordinates() {
            Some(center) => {
                self.recenter(center);
                true
            }
            None => false,
        }
    }

    pub async fn sign_out(&self) {
        if let Some(auth) = &self.auth {
            auth.sign_out().await;
        }
        self.surfaces.navigator.reload(ROOT_PATH);
    }
}
