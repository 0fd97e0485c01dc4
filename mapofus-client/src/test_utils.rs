//! Fakes for the controller tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mapofus_types::{
    ApiResponse, AuthUser, Coordinates, CredentialsRequest, MemoryRecord, NewMemory,
    PlaceCandidate, Session, SessionTokens,
};
use parking_lot::Mutex;
use std::sync::Arc;
use supabase_client::{AuthApi, MemoryTable, ObjectStorage, SupabaseError};

use crate::auth_routes::{AuthRoutes, RouteError, RouteResponse};
use crate::search::{GeocodeError, Geocoder};
use crate::surface::{Navigator, Notifier, Viewport};

/// Let spawned listener tasks catch up.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

pub fn session_for(email: &str) -> Session {
    Session {
        access_token: format!("access-{}", email),
        refresh_token: format!("refresh-{}", email),
        expires_at: None,
        user: AuthUser {
            id: "user-1".to_string(),
            email: Some(email.to_string()),
        },
    }
}

pub fn memory(id: &str, latitude: f64, longitude: f64) -> MemoryRecord {
    MemoryRecord {
        id: id.to_string(),
        latitude,
        longitude,
        content: format!("memory {}", id),
        image_url: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap(),
    }
}

pub fn place(name: &str, lat: &str, lon: &str) -> PlaceCandidate {
    PlaceCandidate {
        display_name: name.to_string(),
        lat: lat.to_string(),
        lon: lon.to_string(),
    }
}

fn server_error(body: &str) -> SupabaseError {
    SupabaseError::from_response(500, body)
}

/// Call order shared between collaborator fakes.
pub type CallLog = Arc<Mutex<Vec<String>>>;

// ── collaborator ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockTable {
    records: Mutex<Vec<MemoryRecord>>,
    inserted: Mutex<Vec<NewMemory>>,
    tokens: Mutex<Vec<Option<String>>>,
    fail_select: Mutex<bool>,
    fail_insert: Mutex<bool>,
    log: CallLog,
}

impl MockTable {
    pub fn with_records(records: Vec<MemoryRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn logging_to(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn fail_select(&self, fail: bool) {
        *self.fail_select.lock() = fail;
    }

    pub fn fail_insert(&self, fail: bool) {
        *self.fail_insert.lock() = fail;
    }

    pub fn inserted(&self) -> Vec<NewMemory> {
        self.inserted.lock().clone()
    }

    pub fn tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().clone()
    }
}

#[async_trait]
impl MemoryTable for MockTable {
    async fn select_all(&self) -> Result<Vec<MemoryRecord>, SupabaseError> {
        if *self.fail_select.lock() {
            return Err(server_error(r#"{"message":"select failed"}"#));
        }
        Ok(self.records.lock().clone())
    }

    async fn insert(
        &self,
        memory: &NewMemory,
        access_token: Option<&str>,
    ) -> Result<(), SupabaseError> {
        self.log.lock().push("insert".to_string());
        if *self.fail_insert.lock() {
            return Err(server_error(r#"{"message":"insert failed"}"#));
        }
        self.inserted.lock().push(memory.clone());
        self.tokens.lock().push(access_token.map(str::to_string));

        let mut records = self.records.lock();
        let id = (records.len() + 1).to_string();
        records.push(MemoryRecord {
            id,
            latitude: memory.latitude,
            longitude: memory.longitude,
            content: memory.content.clone(),
            image_url: memory.image_url.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct MockStorage {
    uploads: Mutex<Vec<String>>,
    fail_upload: Mutex<bool>,
    log: CallLog,
}

impl MockStorage {
    pub fn logging_to(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn fail_upload(&self, fail: bool) {
        *self.fail_upload.lock() = fail;
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn upload(
        &self,
        object_name: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
        _access_token: Option<&str>,
    ) -> Result<(), SupabaseError> {
        self.log.lock().push("upload".to_string());
        if *self.fail_upload.lock() {
            return Err(server_error(r#"{"error":"upload failed"}"#));
        }
        self.uploads.lock().push(object_name.to_string());
        Ok(())
    }

    fn public_url(&self, object_name: &str) -> String {
        format!("https://storage.test/{}", object_name)
    }
}

#[derive(Default)]
pub struct MockAuthApi {
    calls: Mutex<Vec<String>>,
    fail_sign_out: Mutex<bool>,
}

impl MockAuthApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn fail_sign_out(&self, fail: bool) {
        *self.fail_sign_out.lock() = fail;
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn sign_in_with_password(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<Session, SupabaseError> {
        self.record(format!("sign_in:{}", email));
        Ok(session_for(email))
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _email_redirect_to: Option<&str>,
    ) -> Result<(), SupabaseError> {
        self.record(format!("sign_up:{}", email));
        Ok(())
    }

    async fn resend_signup(
        &self,
        email: &str,
        _email_redirect_to: Option<&str>,
    ) -> Result<(), SupabaseError> {
        self.record(format!("resend:{}", email));
        Ok(())
    }

    async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        _code_verifier: &str,
    ) -> Result<Session, SupabaseError> {
        self.record(format!("exchange:{}", auth_code));
        Ok(session_for("oauth@example.com"))
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        self.record(format!("get_user:{}", access_token));
        Ok(AuthUser {
            id: "user-1".to_string(),
            email: None,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        self.record(format!("sign_out:{}", access_token));
        if *self.fail_sign_out.lock() {
            return Err(server_error(r#"{"msg":"logout failed"}"#));
        }
        Ok(())
    }

    fn authorize_url(&self, provider: &str, _redirect_to: &str, _code_challenge: &str) -> String {
        format!("https://auth.test/authorize?provider={}", provider)
    }
}

// ── backend routes ───────────────────────────────────────────────

/// Succeeds with session tokens by default; responses can be scripted.
#[derive(Default)]
pub struct MockAuthRoutes {
    calls: Mutex<Vec<String>>,
    scripted: Mutex<Option<(u16, ApiResponse)>>,
    fail_transport: Mutex<bool>,
    session: Mutex<Option<Session>>,
}

/// An unparsable URL is the simplest real reqwest::Error.
fn transport_error() -> RouteError {
    let err = reqwest::Client::new()
        .get("http://[::1")
        .build()
        .unwrap_err();
    RouteError::Transport(err)
}

impl MockAuthRoutes {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn respond_with(&self, status: u16, body: ApiResponse) {
        *self.scripted.lock() = Some((status, body));
    }

    pub fn fail_transport(&self, fail: bool) {
        *self.fail_transport.lock() = fail;
    }

    /// Session reported by the cookie lookup.
    pub fn set_session(&self, session: Option<Session>) {
        *self.session.lock() = session;
    }

    fn answer(&self, call: String, email: &str) -> Result<RouteResponse, RouteError> {
        self.calls.lock().push(call);
        if *self.fail_transport.lock() {
            return Err(transport_error());
        }
        let (status, body) = self
            .scripted
            .lock()
            .clone()
            .unwrap_or((200, ApiResponse::ok()));
        let tokens = (status == 200).then(|| SessionTokens {
            access_token: format!("access-{}", email),
            refresh_token: format!("refresh-{}", email),
        });
        Ok(RouteResponse {
            status,
            body,
            tokens,
        })
    }
}

#[async_trait]
impl AuthRoutes for MockAuthRoutes {
    async fn login(&self, credentials: &CredentialsRequest) -> Result<RouteResponse, RouteError> {
        self.answer(format!("login:{}", credentials.email), &credentials.email)
    }

    async fn register(
        &self,
        credentials: &CredentialsRequest,
    ) -> Result<RouteResponse, RouteError> {
        self.answer(format!("register:{}", credentials.email), &credentials.email)
    }

    async fn session(&self) -> Result<Option<Session>, RouteError> {
        self.calls.lock().push("session".to_string());
        if *self.fail_transport.lock() {
            return Err(transport_error());
        }
        Ok(self.session.lock().clone())
    }
}

// ── geocoder ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockGeocoder {
    results: Vec<PlaceCandidate>,
    queries: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

impl MockGeocoder {
    pub fn with_results(results: Vec<PlaceCandidate>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn fail(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, GeocodeError> {
        self.queries.lock().push(query.to_string());
        if *self.fail.lock() {
            return Err(GeocodeError::Status(503));
        }
        Ok(self.results.clone())
    }
}

// ── renderer ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingViewport {
    views: Mutex<Vec<(Coordinates, u8)>>,
}

impl RecordingViewport {
    pub fn views(&self) -> Vec<(Coordinates, u8)> {
        self.views.lock().clone()
    }
}

impl Viewport for RecordingViewport {
    fn set_view(&self, center: Coordinates, zoom: u8) {
        self.views.lock().push((center, zoom));
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pushes: Mutex<Vec<String>>,
    reloads: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().clone()
    }

    pub fn reloads(&self) -> Vec<String> {
        self.reloads.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, path: &str) {
        self.pushes.lock().push(path.to_string());
    }

    fn reload(&self, path: &str) {
        self.reloads.lock().push(path.to_string());
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().push(message.to_string());
    }
}
