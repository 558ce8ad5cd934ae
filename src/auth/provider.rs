//! Client for the hosted auth service (GoTrue-style REST API).
//!
//! Sign-up, sign-in and the email flows are forwarded as-is; this service
//! never stores credentials. Access tokens are verified locally by
//! [`super::jwt::AuthUser`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::failure::{AuthFailure, AuthOp};
use crate::config::AuthConfig;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const AVATAR_BASE: &str = "https://i.pravatar.cc/150";

/// Display details kept in the auth service's user metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Profile for a fresh account: the given name and a generated avatar.
    pub fn for_new_account(full_name: &str, email: &str) -> Self {
        Self {
            full_name: Some(full_name.to_string()),
            avatar_url: Some(format!("{AVATAR_BASE}?u={email}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    #[serde(default, alias = "user_metadata")]
    pub profile: Profile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: PublicUser,
}

#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// Auto-confirmed accounts are signed in straight away.
    SignedIn(Session),
    /// A confirmation email went out; the account is inactive until clicked.
    ConfirmationSent,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, profile: &Profile) -> Result<SignUpOutcome, AuthFailure>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthFailure>;
    /// Where to send the browser for a third-party sign-in.
    fn oauth_url(&self, provider: &str) -> Result<String, AuthFailure>;
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthFailure>;
    async fn resend_confirmation(&self, email: &str) -> Result<(), AuthFailure>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthFailure>;
    async fn current_user(&self, access_token: &str) -> Result<PublicUser, AuthFailure>;
}

pub struct HostedAuth {
    client: Client,
    base: String,
    anon_key: String,
    site_url: String,
}

impl HostedAuth {
    pub fn new(cfg: &AuthConfig, site_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base: normalize_base_url(&cfg.url),
            anon_key: cfg.anon_key.clone(),
            site_url: site_url.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/auth/v1{}", self.base, path))
            .header("apikey", &self.anon_key)
    }

    async fn send(&self, op: AuthOp, req: RequestBuilder) -> Result<Value, AuthFailure> {
        let resp = req.send().await.map_err(|e| {
            warn!(?op, error = %e, "auth service unreachable");
            AuthFailure::Network
        })?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let json = serde_json::from_str::<Value>(&body).unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(json);
        }
        Err(AuthFailure::classify(op, status.as_u16(), &error_message(&json, &body)))
    }
}

pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    while url.ends_with('/') {
        url.pop();
    }
    if url.ends_with("/auth/v1") {
        url.truncate(url.len() - "/auth/v1".len());
    }
    url
}

/// Pulls the human-readable message out of the auth service's error shapes.
fn error_message(json: &Value, raw: &str) -> String {
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|k| json.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| raw.trim().to_string())
}

fn signup_body(email: &str, password: &str, profile: &Profile) -> Value {
    json!({ "email": email, "password": password, "data": profile })
}

fn parse_session(op: AuthOp, json: Value) -> Result<Session, AuthFailure> {
    serde_json::from_value::<Session>(json).map_err(|e| AuthFailure::Rejected {
        status: 502,
        message: format!("unexpected {op:?} response: {e}"),
    })
}

#[async_trait]
impl AuthProvider for HostedAuth {
    async fn sign_up(&self, email: &str, password: &str, profile: &Profile) -> Result<SignUpOutcome, AuthFailure> {
        let req = self
            .request(Method::POST, "/signup")
            .query(&[("redirect_to", self.site_url.as_str())])
            .json(&signup_body(email, password, profile));
        let json = self.send(AuthOp::SignUp, req).await?;
        if json.get("access_token").and_then(Value::as_str).is_some() {
            info!(%email, "sign-up auto-confirmed");
            return parse_session(AuthOp::SignUp, json).map(SignUpOutcome::SignedIn);
        }
        info!(%email, "sign-up pending email confirmation");
        Ok(SignUpOutcome::ConfirmationSent)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthFailure> {
        let req = self
            .request(Method::POST, "/token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let json = self.send(AuthOp::SignIn, req).await?;
        parse_session(AuthOp::SignIn, json)
    }

    fn oauth_url(&self, provider: &str) -> Result<String, AuthFailure> {
        if provider.is_empty() || !provider.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AuthFailure::Rejected {
                status: 400,
                message: format!("Unsupported sign-in provider `{provider}`"),
            });
        }
        let url = Url::parse_with_params(
            &format!("{}/auth/v1/authorize", self.base),
            &[("provider", provider), ("redirect_to", self.site_url.as_str())],
        )
        .map_err(|e| AuthFailure::Rejected { status: 500, message: e.to_string() })?;
        Ok(url.to_string())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthFailure> {
        let req = self
            .request(Method::POST, "/recover")
            .query(&[("redirect_to", self.site_url.as_str())])
            .json(&json!({ "email": email }));
        self.send(AuthOp::Recover, req).await.map(|_| ())
    }

    async fn resend_confirmation(&self, email: &str) -> Result<(), AuthFailure> {
        let req = self
            .request(Method::POST, "/resend")
            .json(&json!({ "type": "signup", "email": email }));
        self.send(AuthOp::Resend, req).await.map(|_| ())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthFailure> {
        let req = self.request(Method::POST, "/logout").bearer_auth(access_token);
        self.send(AuthOp::SignOut, req).await.map(|_| ())
    }

    async fn current_user(&self, access_token: &str) -> Result<PublicUser, AuthFailure> {
        let req = self.request(Method::GET, "/user").bearer_auth(access_token);
        let json = self.send(AuthOp::Session, req).await?;
        serde_json::from_value::<PublicUser>(json).map_err(|e| AuthFailure::Rejected {
            status: 502,
            message: format!("unexpected user response: {e}"),
        })
    }
}

/// Scripted provider for tests: every call succeeds except a sign-in with
/// [`FakeAuth::WRONG_PASSWORD`].
#[cfg(test)]
pub(crate) struct FakeAuth;

#[cfg(test)]
impl FakeAuth {
    pub(crate) const WRONG_PASSWORD: &'static str = "wrong-password";

    fn session(email: &str) -> Session {
        Session {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_in: Some(3600),
            user: PublicUser {
                id: Uuid::new_v4(),
                email: email.into(),
                profile: Profile::for_new_account("Guest", email),
            },
        }
    }
}

#[cfg(test)]
#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_up(&self, _email: &str, _password: &str, _profile: &Profile) -> Result<SignUpOutcome, AuthFailure> {
        Ok(SignUpOutcome::ConfirmationSent)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthFailure> {
        if password == Self::WRONG_PASSWORD {
            return Err(AuthFailure::classify(AuthOp::SignIn, 400, "Invalid login credentials"));
        }
        Ok(Self::session(email))
    }

    fn oauth_url(&self, provider: &str) -> Result<String, AuthFailure> {
        Ok(format!("https://auth.local/auth/v1/authorize?provider={provider}"))
    }

    async fn send_password_reset(&self, _email: &str) -> Result<(), AuthFailure> {
        Ok(())
    }

    async fn resend_confirmation(&self, _email: &str) -> Result<(), AuthFailure> {
        Ok(())
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthFailure> {
        Err(AuthFailure::Network)
    }

    async fn current_user(&self, _access_token: &str) -> Result<PublicUser, AuthFailure> {
        Ok(Self::session("guest@x.in").user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HostedAuth {
        HostedAuth::new(
            &AuthConfig {
                url: "https://project.auth.example/auth/v1/".into(),
                anon_key: "anon".into(),
                jwt_secret: "secret".into(),
                audience: "authenticated".into(),
                issuer: None,
            },
            "https://anandam.example/app",
        )
        .unwrap()
    }

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(normalize_base_url("https://x.example/"), "https://x.example");
        assert_eq!(normalize_base_url(" https://x.example/auth/v1 "), "https://x.example");
    }

    #[test]
    fn oauth_url_carries_provider_and_redirect() {
        let url = client().oauth_url("google").unwrap();
        assert!(url.starts_with("https://project.auth.example/auth/v1/authorize?"));
        assert!(url.contains("provider=google"));
        assert!(url.contains("redirect_to=https%3A%2F%2Fanandam.example%2Fapp"));
        assert!(client().oauth_url("evil&x=1").is_err());
    }

    #[test]
    fn error_message_prefers_known_fields() {
        let v = json!({"code": 400, "error_code": "invalid_credentials", "msg": "Invalid login credentials"});
        assert_eq!(error_message(&v, ""), "Invalid login credentials");
        let v = json!({"error": "invalid_grant", "error_description": "Email not confirmed"});
        assert_eq!(error_message(&v, ""), "Email not confirmed");
        assert_eq!(error_message(&Value::Null, " Bad Gateway "), "Bad Gateway");
    }

    #[test]
    fn session_parses_from_token_response() {
        let id = Uuid::new_v4();
        let v = json!({
            "access_token": "a", "token_type": "bearer", "expires_in": 3600,
            "refresh_token": "r", "user": {"id": id, "email": "a@x.in", "role": "authenticated"}
        });
        let s = parse_session(AuthOp::SignIn, v).unwrap();
        assert_eq!(s.user.id, id);
        assert_eq!(s.expires_in, Some(3600));
        assert_eq!(s.user.profile, Profile::default());
    }

    #[test]
    fn signup_sends_name_and_avatar_as_metadata() {
        let profile = Profile::for_new_account("Asha K", "asha@x.in");
        let body = signup_body("asha@x.in", "pw", &profile);
        assert_eq!(body["data"]["full_name"], "Asha K");
        assert_eq!(body["data"]["avatar_url"], "https://i.pravatar.cc/150?u=asha@x.in");
    }

    #[test]
    fn user_metadata_becomes_the_profile() {
        let v = json!({
            "id": Uuid::new_v4(), "email": "asha@x.in",
            "user_metadata": {"full_name": "Asha K", "avatar_url": "https://i.pravatar.cc/150?u=asha@x.in"}
        });
        let user: PublicUser = serde_json::from_value(v).unwrap();
        assert_eq!(user.profile.full_name.as_deref(), Some("Asha K"));
        assert_eq!(serde_json::to_value(&user).unwrap()["profile"]["full_name"], "Asha K");
    }
}
