//! Browser capabilities the ordering app leans on: speech recognition for
//! voice search, and installability.
//!
//! The browser does the capturing; this side only interprets what it
//! reports and serves the manifest.

use axum::{http::header, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::{notice::Notice, state::AppState};

pub const APP_NAME: &str = "Hotel Anandam";
pub const THEME_COLOR: &str = "#f97316";

/// A browser feature that may simply not exist on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability<T> {
    Supported(T),
    Unsupported,
}

/// One-shot speech recognition result as reported by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum VoiceReport {
    Transcript { transcript: String },
    Error { error: String },
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    NotAllowed,
    NoSpeech,
    Other(String),
}

impl From<VoiceReport> for Capability<Result<String, RecognitionError>> {
    fn from(report: VoiceReport) -> Self {
        match report {
            VoiceReport::Transcript { transcript } => Capability::Supported(Ok(transcript)),
            VoiceReport::Error { error } => Capability::Supported(Err(match error.as_str() {
                "not-allowed" => RecognitionError::NotAllowed,
                "no-speech" => RecognitionError::NoSpeech,
                _ => RecognitionError::Other(error),
            })),
            VoiceReport::Unsupported => Capability::Unsupported,
        }
    }
}

/// What the app does with a recognition outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum VoiceAction {
    /// Use the transcript as the menu search query.
    Search { query: String },
    Notify { notice: Notice },
    /// Minor recognition errors are only logged.
    Nothing,
}

pub fn interpret(recognition: Capability<Result<String, RecognitionError>>) -> VoiceAction {
    match recognition {
        Capability::Unsupported => VoiceAction::Notify {
            notice: Notice::error("Voice search not supported on this browser"),
        },
        Capability::Supported(Ok(transcript)) => {
            debug!(%transcript, "voice search transcript");
            VoiceAction::Search { query: transcript.trim().to_string() }
        }
        Capability::Supported(Err(RecognitionError::NotAllowed)) => VoiceAction::Notify {
            notice: Notice::error("Mic access denied. Enable permissions in settings."),
        },
        Capability::Supported(Err(RecognitionError::NoSpeech)) => VoiceAction::Notify {
            notice: Notice::info("No speech detected. Please try again."),
        },
        Capability::Supported(Err(RecognitionError::Other(code))) => {
            warn!(%code, "speech recognition error");
            VoiceAction::Nothing
        }
    }
}

pub fn manifest() -> serde_json::Value {
    json!({
        "name": APP_NAME,
        "short_name": "Anandam",
        "description": "Order from Hotel Anandam and track it to your door.",
        "start_url": "/",
        "scope": "/",
        "display": "standalone",
        "orientation": "portrait",
        "background_color": "#ffffff",
        "theme_color": THEME_COLOR,
        "icons": [
            { "src": "/icons/icon-192.png", "sizes": "192x192", "type": "image/png" },
            { "src": "/icons/icon-512.png", "sizes": "512x512", "type": "image/png", "purpose": "any maskable" }
        ]
    })
}

async fn get_manifest() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/manifest+json")], Json(manifest()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/manifest.webmanifest", get(get_manifest))
}
