//! Errors returned by the collaborator client.

use serde_json::Value;

/// GoTrue's error code for a sign-up against an existing account.
const USER_ALREADY_EXISTS_CODE: &str = "user_already_exists";
const USER_ALREADY_REGISTERED_MSG: &str = "User already registered";

#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    /// The collaborator answered with a non-success status.
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// A success response whose body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl SupabaseError {
    /// Build an `Api` error from a status and raw response body.
    ///
    /// GoTrue, PostgREST and Storage each spell the message differently
    /// (`msg`, `error_description`, `message`, `error`); the first present
    /// field wins, falling back to the raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();

        let message = parsed
            .as_ref()
            .and_then(|v| {
                ["msg", "error_description", "message", "error"]
                    .iter()
                    .find_map(|key| v.get(*key).and_then(Value::as_str))
            })
            .map(str::to_string)
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("Request failed with status {}", status)
                } else {
                    trimmed.to_string()
                }
            });

        let code = parsed
            .as_ref()
            .and_then(|v| v.get("error_code").or_else(|| v.get("code")))
            .and_then(|c| match c {
                Value::String(s) => Some(s.clone()),
                _ => None,
            });

        SupabaseError::Api {
            status,
            code,
            message,
        }
    }

    /// User-facing text. Collaborator messages pass through verbatim.
    pub fn message(&self) -> String {
        match self {
            SupabaseError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            SupabaseError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a sign-up failed because the account already exists.
    pub fn is_already_registered(&self) -> bool {
        match self {
            SupabaseError::Api { code, message, .. } => {
                code.as_deref() == Some(USER_ALREADY_EXISTS_CODE)
                    || message.contains(USER_ALREADY_REGISTERED_MSG)
            }
            _ => false,
        }
    }
}
