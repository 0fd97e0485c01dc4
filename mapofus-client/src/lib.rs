//! Headless controllers for the Map of Us client.
//!
//! Everything a page does apart from drawing lives here: locating the user,
//! loading and saving memories, following the auth session, debounced place
//! search, the map's click/submit/random flows and the sign-in form. Drawing
//! is left to whoever implements the [`surface`] traits.

pub mod auth_form;
pub mod auth_routes;
pub mod geolocation;
pub mod map_view;
pub mod memory_store;
pub mod search;
pub mod session;
pub mod surface;
pub mod timer;

#[cfg(test)]
mod test_utils;

pub use auth_form::{AuthFormController, AuthMode, FormStatus};
pub use auth_routes::{AuthRoutes, HttpAuthRoutes};
pub use geolocation::{FixedGeolocator, GeolocationResolver, Geolocator, IpGeolocator};
pub use map_view::{ClickOutcome, FormPhase, MapPhase, MapViewController, MarkerPreview};
pub use memory_store::{ImageAttachment, MemoryStoreClient, SubmitError};
pub use search::{Geocoder, NominatimGeocoder, PlaceSearch, SearchState};
pub use session::{AuthChange, AuthChangeEvent, AuthClient, SessionSource, SessionStore, SessionTracker};
pub use surface::{Navigator, Notifier, Viewport};
