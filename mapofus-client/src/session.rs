//! Auth session state on the client.
//!
//! [`SessionStore`] holds the current session and fans changes out to
//! subscribers. [`SessionTracker`] is what a view mounts: it reads the session
//! once, follows changes until unmounted, and exposes the signed-in user.
//! [`AuthClient`] drives sign-in/out against the collaborator and publishes
//! the result to the store.

use async_trait::async_trait;
use dashmap::DashMap;
use mapofus_types::{AuthUser, Session, SessionTokens};
use parking_lot::RwLock;
use std::sync::Arc;
use supabase_client::{AuthApi, SupabaseError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::auth_routes::AuthRoutes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeEvent {
    /// A session carried over from before the page load.
    InitialSession,
    SignedIn,
    SignedOut,
}

#[derive(Debug, Clone)]
pub struct AuthChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn get_session(&self) -> Option<Session>;
    /// Register a listener; returns its id and the change stream.
    fn subscribe(&self) -> (String, mpsc::UnboundedReceiver<AuthChange>);
    fn unsubscribe(&self, subscription_id: &str);
}

#[derive(Default)]
pub struct SessionStore {
    current: RwLock<Option<Session>>,
    listeners: DashMap<String, mpsc::UnboundedSender<AuthChange>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    /// Replace the session and notify every listener.
    pub fn set_session(&self, event: AuthChangeEvent, session: Option<Session>) {
        *self.current.write() = session.clone();

        let change = AuthChange { event, session };
        let mut closed = Vec::new();
        for entry in self.listeners.iter() {
            if entry.value().send(change.clone()).is_err() {
                closed.push(entry.key().clone());
            }
        }
        for id in closed {
            self.listeners.remove(&id);
        }
        log::debug!("[SESSION] {:?} delivered to {} listeners", event, self.listeners.len());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[async_trait]
impl SessionSource for SessionStore {
    async fn get_session(&self) -> Option<Session> {
        self.current()
    }

    fn subscribe(&self) -> (String, mpsc::UnboundedReceiver<AuthChange>) {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.insert(id.clone(), tx);
        (id, rx)
    }

    fn unsubscribe(&self, subscription_id: &str) {
        self.listeners.remove(subscription_id);
    }
}

/// Signed-in state for one mounted view.
pub struct SessionTracker {
    session: Arc<RwLock<Option<Session>>>,
    source: Arc<dyn SessionSource>,
    subscription_id: String,
    cancel: CancellationToken,
}

impl SessionTracker {
    pub async fn mount(source: Arc<dyn SessionSource>) -> Self {
        // Subscribe before the initial read so a change landing in between
        // is applied after it rather than lost.
        let (subscription_id, mut changes) = source.subscribe();
        let session = Arc::new(RwLock::new(source.get_session().await));
        let cancel = CancellationToken::new();

        let shared = session.clone();
        let token = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    change = changes.recv() => match change {
                        Some(change) => *shared.write() = change.session,
                        None => break,
                    },
                }
            }
        });

        Self {
            session,
            source,
            subscription_id,
            cancel,
        }
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.session.read().as_ref().map(|s| s.user.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.read().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.access_token.clone())
    }

    /// Stop following changes. Safe to call more than once.
    pub fn unmount(&self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            self.source.unsubscribe(&self.subscription_id);
        }
    }
}

impl Drop for SessionTracker {
    fn drop(&mut self) {
        self.unmount();
    }
}

pub struct AuthClient {
    api: Arc<dyn AuthApi>,
    store: Arc<SessionStore>,
}

impl AuthClient {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<SessionStore>) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> Arc<SessionStore> {
        self.store.clone()
    }

    /// Turn tokens issued by the login route into a published session.
    pub async fn adopt_tokens(&self, tokens: SessionTokens) -> Result<AuthUser, SupabaseError> {
        let user = self.api.get_user(&tokens.access_token).await?;
        self.store.set_session(
            AuthChangeEvent::SignedIn,
            Some(Session {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                expires_at: None,
                user: user.clone(),
            }),
        );
        Ok(user)
    }

    /// Seed the store from the page's auth cookies. Call before mounting
    /// trackers so a session set by the OAuth callback, or one that survived
    /// a reload, is observed. Lookup failures leave the store signed out.
    pub async fn restore(&self, routes: &dyn AuthRoutes) -> Option<AuthUser> {
        match routes.session().await {
            Ok(Some(session)) => {
                let user = session.user.clone();
                self.store
                    .set_session(AuthChangeEvent::InitialSession, Some(session));
                Some(user)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("[SESSION] Could not restore session: {}", e);
                None
            }
        }
    }

    /// Revoke the session at the collaborator and clear it locally. The local
    /// session is cleared even when revocation fails.
    pub async fn sign_out(&self) {
        if let Some(session) = self.store.current() {
            if let Err(e) = self.api.sign_out(&session.access_token).await {
                log::warn!("[SESSION] Sign-out request failed: {}", e);
            }
        }
        self.store.set_session(AuthChangeEvent::SignedOut, None);
    }
}
