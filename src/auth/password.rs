//! Staff PIN gate for menu management and the kitchen dashboard.
//!
//! This only keeps customers from wandering into staff screens. It is not
//! authentication: staff routes still require a signed-in [`AuthUser`].

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use super::jwt::AuthUser;
use crate::state::AppState;

pub const STAFF_PIN_HEADER: &str = "x-staff-pin";

pub fn hash_pin(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_pin(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Signed-in user who also entered the staff PIN.
pub struct StaffAccess(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for StaffAccess {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let pin = parts
            .headers
            .get(STAFF_PIN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::FORBIDDEN, "Staff PIN required".to_string()))?;

        match verify_pin(pin, &state.staff_pin_hash) {
            Ok(true) => Ok(StaffAccess(user)),
            Ok(false) => {
                warn!(user_id = %user.id, "wrong staff pin");
                Err((StatusCode::FORBIDDEN, "Incorrect PIN".to_string()))
            }
            Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::bearer_for;
    use uuid::Uuid;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_pin("4321").expect("hashing should succeed");
        assert!(verify_pin("4321", &hash).expect("verify should succeed"));
        assert!(!verify_pin("1234", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_pin("1234", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    fn parts(pin: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder()
            .uri("/api/v1/staff/kitchen/orders")
            .header(
                axum::http::header::AUTHORIZATION,
                format!("Bearer {}", bearer_for(Uuid::new_v4(), "cook@x.in")),
            );
        if let Some(pin) = pin {
            builder = builder.header(STAFF_PIN_HEADER, pin);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn staff_access_checks_pin_after_sign_in() {
        let (state, _) = AppState::fake();
        assert!(StaffAccess::from_request_parts(&mut parts(Some("1234")), &state).await.is_ok());

        let err = StaffAccess::from_request_parts(&mut parts(Some("0000")), &state).await.err().unwrap();
        assert_eq!(err, (StatusCode::FORBIDDEN, "Incorrect PIN".to_string()));

        let err = StaffAccess::from_request_parts(&mut parts(None), &state).await.err().unwrap();
        assert_eq!(err.1, "Staff PIN required");
    }
}
