//! Shared types for the Map of Us backend, its collaborator client and the
//! headless map client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =====================================================
// Geography
// =====================================================

/// A point on the map in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Fallback position used when the device location is unavailable.
    pub const JAKARTA: Coordinates = Coordinates {
        latitude: -6.2088,
        longitude: 106.8456,
    };

    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

// =====================================================
// Memories
// =====================================================

/// A row of the `memories` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Long-form date shown under a marker preview, e.g. "October 18, 2026".
    pub fn formatted_date(&self) -> String {
        self.created_at.format("%B %-d, %Y").to_string()
    }
}

/// Insert payload for a new memory. The id and timestamp are assigned by the
/// collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemory {
    pub content: String,
    pub image_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewMemory {
    pub fn validate(&self) -> Result<(), String> {
        if self.content.trim().is_empty() {
            return Err("Memory content must not be empty".to_string());
        }
        if !Coordinates::new(self.latitude, self.longitude).is_valid() {
            return Err(format!(
                "Coordinates out of range: ({}, {})",
                self.latitude, self.longitude
            ));
        }
        Ok(())
    }
}

// =====================================================
// Sessions
// =====================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A collaborator-issued session. Observed by the application, never minted
/// by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// Access/refresh token pair handed back by the auth routes as cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Cookie names shared by the backend (writer) and the client (reader).
pub const ACCESS_TOKEN_COOKIE: &str = "mapofus-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "mapofus-refresh-token";
pub const CODE_VERIFIER_COOKIE: &str = "mapofus-code-verifier";

// =====================================================
// Place search
// =====================================================

/// A geocoding hit. Latitude and longitude arrive as decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

impl PlaceCandidate {
    pub fn coordinates(&self) -> Option<Coordinates> {
        let latitude = self.lat.trim().parse().ok()?;
        let longitude = self.lon.trim().parse().ok()?;
        let coords = Coordinates::new(latitude, longitude);
        coords.is_valid().then_some(coords)
    }
}

// =====================================================
// Auth route bodies
// =====================================================

/// Body of `POST /api/login` and `POST /api/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Response body of the auth routes: `{success:true[, message]}` or
/// `{error}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_coordinates_range() {
        assert!(Coordinates::JAKARTA.is_valid());
        assert!(Coordinates::new(90.0, -180.0).is_valid());
        assert!(!Coordinates::new(90.5, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, 181.0).is_valid());
    }

    #[test]
    fn test_new_memory_validation() {
        let mut memory = NewMemory {
            content: "First date here".to_string(),
            image_url: None,
            latitude: 48.8566,
            longitude: 2.3522,
        };
        assert!(memory.validate().is_ok());

        memory.content = "   ".to_string();
        assert!(memory.validate().unwrap_err().contains("empty"));

        memory.content = "ok".to_string();
        memory.latitude = -91.0;
        assert!(memory.validate().unwrap_err().contains("out of range"));
    }

    #[test]
    fn test_formatted_date() {
        let record = MemoryRecord {
            id: "a".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            content: "hi".to_string(),
            image_url: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 7, 15, 30, 0).unwrap(),
        };
        assert_eq!(record.formatted_date(), "March 7, 2026");
    }

    #[test]
    fn test_memory_record_from_postgrest_row() {
        let row = json!({
            "id": "4f0c9a52-3b1e-4d0a-9c55-0d3f5b8f2a11",
            "latitude": -6.2,
            "longitude": 106.8,
            "content": "Rainy night in Kemang",
            "image_url": null,
            "created_at": "2025-01-02T03:04:05.123456+00:00"
        });
        let record: MemoryRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.image_url, None);
        assert_eq!(record.coordinates(), Coordinates::new(-6.2, 106.8));
    }

    #[test]
    fn test_place_candidate_coordinates() {
        let paris = PlaceCandidate {
            display_name: "Paris, Île-de-France, France".to_string(),
            lat: "48.8588897".to_string(),
            lon: "2.3200410".to_string(),
        };
        let coords = paris.coordinates().unwrap();
        assert!((coords.latitude - 48.8588897).abs() < 1e-9);

        let broken = PlaceCandidate {
            display_name: "?".to_string(),
            lat: "north".to_string(),
            lon: "2.0".to_string(),
        };
        assert!(broken.coordinates().is_none());
    }

    #[test]
    fn test_api_response_shapes() {
        assert_eq!(serde_json::to_value(ApiResponse::ok()).unwrap(), json!({"success": true}));
        assert_eq!(
            serde_json::to_value(ApiResponse::ok_with_message("Check your email")).unwrap(),
            json!({"success": true, "message": "Check your email"})
        );
        assert_eq!(
            serde_json::to_value(ApiResponse::err("nope")).unwrap(),
            json!({"error": "nope"})
        );
    }
}
