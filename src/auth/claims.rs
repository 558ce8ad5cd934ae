use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access-token payload issued by the hosted auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,                 // user ID
    pub exp: usize,                // expires at (unix timestamp)
    #[serde(default)]
    pub iat: Option<usize>,        // issued at
    pub aud: String,               // audience, "authenticated" for signed-in users
    #[serde(default)]
    pub iss: Option<String>,       // issuer
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}
