use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::provider::{PublicUser, Session};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for sign-up. Every field is required.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for password sign-in.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for the flows that only need an address.
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthRequest {
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct OAuthRedirect {
    pub url: String,
}

/// Response for sign-up and sign-in. `session` is absent while an account
/// still waits for email confirmation.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub session: Option<Session>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub type MeResponse = PublicUser;
