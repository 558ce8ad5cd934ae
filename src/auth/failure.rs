use axum::http::StatusCode;
use thiserror::Error;
use tracing::warn;

/// Which auth flow produced a failure; rate-limit copy differs per flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOp {
    SignIn,
    SignUp,
    Recover,
    Resend,
    OAuth,
    SignOut,
    Session,
}

impl AuthOp {
    fn rate_limit_copy(self) -> &'static str {
        match self {
            AuthOp::SignIn => "Too many login attempts. Please try again in 5 minutes.",
            _ => "Rate limit exceeded. Please wait a few minutes before trying again.",
        }
    }
}

/// Auth errors as users see them. Unrecognised provider messages pass
/// through verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Incorrect email or password. Please try again.")]
    InvalidCredentials,
    #[error("Your email is not confirmed yet. Check your inbox for the link we sent earlier.")]
    EmailNotConfirmed,
    #[error("{}", .0.rate_limit_copy())]
    RateLimited(AuthOp),
    #[error("Network error: Unable to connect. Please check your internet connection.")]
    Network,
    #[error("{0}")]
    MissingFields(&'static str),
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

impl AuthFailure {
    /// Sorts a provider error response into a known failure.
    pub fn classify(op: AuthOp, status: u16, message: &str) -> Self {
        if message.contains("confirm your email") || message.contains("Email not confirmed") {
            return AuthFailure::EmailNotConfirmed;
        }
        if message.contains("Invalid login credentials") {
            return AuthFailure::InvalidCredentials;
        }
        if status == 429 {
            return AuthFailure::RateLimited(op);
        }
        if message == "Load failed" || message == "Failed to fetch" {
            return AuthFailure::Network;
        }
        warn!(?op, status, message, "unexpected auth error");
        AuthFailure::Rejected {
            status,
            message: if message.is_empty() { "An unexpected error occurred.".into() } else { message.to_string() },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthFailure::InvalidCredentials | AuthFailure::EmailNotConfirmed => StatusCode::UNAUTHORIZED,
            AuthFailure::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AuthFailure::Network => StatusCode::BAD_GATEWAY,
            AuthFailure::MissingFields(_) => StatusCode::BAD_REQUEST,
            AuthFailure::Rejected { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }

    pub fn rejection(&self) -> (StatusCode, String) {
        (self.status(), self.to_string())
    }
}
