use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            is_valid_email, AuthResponse, CredentialsRequest, EmailRequest, MeResponse,
            MessageResponse, OAuthRedirect, OAuthRequest, SignUpRequest,
        },
        failure::AuthFailure,
        jwt::AuthUser,
        password::StaffAccess,
        provider::{Profile, SignUpOutcome},
    },
    state::AppState,
};

const FILL_ALL_FIELDS: &str = "Please fill in all fields.";
const ENTER_EMAIL: &str = "Please enter your email address.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/oauth", post(oauth))
        .route("/auth/recover", post(recover))
        .route("/auth/resend", post(resend))
        .route("/auth/sign-out", post(sign_out))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub fn staff_routes() -> Router<AppState> {
    Router::new().route("/staff/unlock", post(unlock_staff))
}

fn credentials(payload: CredentialsRequest) -> Result<(String, String), (StatusCode, String)> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AuthFailure::MissingFields(FILL_ALL_FIELDS).rejection());
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    Ok((email, payload.password))
}

fn email_only(payload: EmailRequest) -> Result<String, (StatusCode, String)> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AuthFailure::MissingFields(ENTER_EMAIL).rejection());
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    Ok(email)
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let full_name = payload.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(AuthFailure::MissingFields(FILL_ALL_FIELDS).rejection());
    }
    let (email, password) = credentials(CredentialsRequest { email: payload.email, password: payload.password })?;
    let profile = Profile::for_new_account(&full_name, &email);
    let outcome = state.auth.sign_up(&email, &password, &profile).await.map_err(|f| f.rejection())?;

    let response = match outcome {
        SignUpOutcome::SignedIn(session) => {
            info!(user_id = %session.user.id, "user registered and signed in");
            AuthResponse {
                message: "Registration successful! Logging you in...".into(),
                session: Some(session),
            }
        }
        SignUpOutcome::ConfirmationSent => {
            info!(%email, "confirmation email sent");
            AuthResponse {
                message: format!(
                    "Confirmation email sent to {email}. You must click the link in that email to activate your account."
                ),
                session: None,
            }
        }
    };
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let (email, password) = credentials(payload)?;
    let session = state.auth.sign_in(&email, &password).await.map_err(|f| f.rejection())?;

    info!(user_id = %session.user.id, "user signed in");
    Ok(Json(AuthResponse {
        message: "Welcome back to Hotel Anandam!".into(),
        session: Some(session),
    }))
}

#[instrument(skip(state))]
pub async fn oauth(
    State(state): State<AppState>,
    Json(payload): Json<OAuthRequest>,
) -> Result<Json<OAuthRedirect>, (StatusCode, String)> {
    let url = state.auth.oauth_url(payload.provider.trim()).map_err(|f| f.rejection())?;
    Ok(Json(OAuthRedirect { url }))
}

#[instrument(skip(state, payload))]
pub async fn recover(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let email = email_only(payload)?;
    state.auth.send_password_reset(&email).await.map_err(|f| f.rejection())?;
    Ok(Json(MessageResponse { message: "Password reset link sent to your email.".into() }))
}

#[instrument(skip(state, payload))]
pub async fn resend(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let email = email_only(payload)?;
    state.auth.resend_confirmation(&email).await.map_err(|f| f.rejection())?;
    Ok(Json(MessageResponse {
        message: "Verification email resent! Please check your spam folder too.".into(),
    }))
}

/// Ends the hosted session and drops the cart held for this user.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn sign_out(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    if let Err(e) = state.auth.sign_out(&user.access_token).await {
        warn!(error = %e, "remote sign-out failed; dropping local session anyway");
    }
    state.sessions.end(user.id);
    info!("user signed out");
    Ok(Json(MessageResponse { message: "Signed out".into() }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MeResponse>, (StatusCode, String)> {
    let me = state
        .auth
        .current_user(&user.access_token)
        .await
        .map_err(|f| f.rejection())?;
    Ok(Json(me))
}

/// Checks the staff PIN so the client can open the staff screens.
#[instrument(skip(staff), fields(user_id = %staff.0.id))]
pub async fn unlock_staff(staff: StaffAccess) -> Json<MessageResponse> {
    info!("staff screens unlocked");
    Json(MessageResponse { message: "Access granted".into() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::provider::FakeAuth, menu::model::default_items};
    use uuid::Uuid;

    fn creds(email: &str, password: &str) -> Json<CredentialsRequest> {
        Json(CredentialsRequest { email: email.into(), password: password.into() })
    }

    fn sign_up_form(full_name: &str, email: &str, password: &str) -> Json<SignUpRequest> {
        Json(SignUpRequest { full_name: full_name.into(), email: email.into(), password: password.into() })
    }

    fn user(id: Uuid) -> AuthUser {
        AuthUser { id, email: "guest@x.in".into(), access_token: "token".into() }
    }

    #[tokio::test]
    async fn empty_fields_are_rejected_before_calling_the_provider() {
        let (state, _) = AppState::fake();
        let err = sign_in(State(state.clone()), creds("a@b.in", "")).await.unwrap_err();
        assert_eq!(err, (StatusCode::BAD_REQUEST, FILL_ALL_FIELDS.to_string()));

        let err = recover(State(state), Json(EmailRequest { email: "  ".into() })).await.unwrap_err();
        assert_eq!(err.1, ENTER_EMAIL);
    }

    #[tokio::test]
    async fn sign_up_without_session_asks_for_confirmation() {
        let (state, _) = AppState::fake();
        let Json(resp) = sign_up(State(state), sign_up_form("Asha K", "New@Guest.in", "secret1")).await.unwrap();
        assert!(resp.message.starts_with("Confirmation email sent to new@guest.in."));
        assert!(resp.session.is_none());
    }

    #[tokio::test]
    async fn wrong_password_gets_friendly_copy() {
        let (state, _) = AppState::fake();
        let err = sign_in(State(state), creds("guest@x.in", FakeAuth::WRONG_PASSWORD)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
        assert_eq!(err.1, "Incorrect email or password. Please try again.");
    }

    #[tokio::test]
    async fn sign_in_welcomes_back() {
        let (state, _) = AppState::fake();
        let Json(resp) = sign_in(State(state), creds("guest@x.in", "pw")).await.unwrap();
        assert_eq!(resp.message, "Welcome back to Hotel Anandam!");
        assert_eq!(resp.session.unwrap().user.email, "guest@x.in");
    }

    #[tokio::test]
    async fn sign_out_drops_the_cart() {
        let (state, _) = AppState::fake();
        let id = Uuid::new_v4();
        state.sessions.with(id, |s| s.add(&default_items()[0])).unwrap();

        sign_out(State(state.clone()), user(id)).await.unwrap();
        assert!(state.sessions.snapshot(id).cart.is_empty());
    }

    #[tokio::test]
    async fn sign_up_needs_a_name() {
        let (state, _) = AppState::fake();
        let err = sign_up(State(state), sign_up_form("   ", "new@guest.in", "secret1")).await.unwrap_err();
        assert_eq!(err, (StatusCode::BAD_REQUEST, FILL_ALL_FIELDS.to_string()));
    }

    #[tokio::test]
    async fn me_serves_the_profile() {
        let (state, _) = AppState::fake();
        let Json(me) = get_me(State(state), user(Uuid::new_v4())).await.unwrap();
        assert_eq!(me.profile.full_name.as_deref(), Some("Guest"));
        assert_eq!(me.profile.avatar_url.as_deref(), Some("https://i.pravatar.cc/150?u=guest@x.in"));
    }
}
