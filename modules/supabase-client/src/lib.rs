//! REST client for the Supabase-style backend the map delegates to.
//!
//! Three surfaces are covered, each behind its own trait so callers can swap
//! in fakes:
//! - [`AuthApi`]: GoTrue password sign-in, sign-up, resend, PKCE exchange,
//!   user lookup and logout
//! - [`MemoryTable`]: PostgREST select/insert on the `memories` table
//! - [`ObjectStorage`]: uploads to the `memories` bucket and public URLs

mod auth;
mod client;
mod error;
pub mod http;
pub mod pkce;
mod rest;
mod storage;

pub use auth::AuthApi;
pub use client::{SupabaseClient, SupabaseConfig};
pub use error::SupabaseError;
pub use rest::MemoryTable;
pub use storage::ObjectStorage;
