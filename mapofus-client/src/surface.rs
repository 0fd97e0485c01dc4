//! What the controllers need from the renderer.

use mapofus_types::Coordinates;

/// Zoom level used for every recenter.
pub const DEFAULT_ZOOM: u8 = 13;

pub const ROOT_PATH: &str = "/";
pub const AUTH_PATH: &str = "/auth";

pub trait Viewport: Send + Sync {
    fn set_view(&self, center: Coordinates, zoom: u8);
}

pub trait Navigator: Send + Sync {
    /// Client-side navigation.
    fn push(&self, path: &str);
    /// Full page load; all transient UI state is discarded.
    fn reload(&self, path: &str);
}

pub trait Notifier: Send + Sync {
    /// Blocking user-facing message.
    fn alert(&self, message: &str);
}
