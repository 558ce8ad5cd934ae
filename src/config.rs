use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Hosted auth service: where to send sign-in traffic and how to verify the
/// access tokens it hands out.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub url: String,
    pub anon_key: String,
    pub jwt_secret: String,
    pub audience: String,
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub run_migrations: bool,
    pub auth: AuthConfig,
    pub site_url: String,
    pub staff_pin: String,
    pub kitchen_poll_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("STORE")
            .unwrap_or_else(|_| "postgres".into())
            .to_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            "postgres" => StoreBackend::Postgres,
            other => anyhow::bail!("unknown STORE backend `{other}`"),
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORE=postgres");
        }

        let auth = AuthConfig {
            url: std::env::var("AUTH_URL").context("AUTH_URL")?,
            anon_key: std::env::var("AUTH_ANON_KEY").context("AUTH_ANON_KEY")?,
            jwt_secret: std::env::var("AUTH_JWT_SECRET").context("AUTH_JWT_SECRET")?,
            audience: std::env::var("AUTH_JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".into()),
            issuer: std::env::var("AUTH_JWT_ISSUER").ok().filter(|s| !s.is_empty()),
        };

        Ok(Self {
            store,
            database_url,
            run_migrations: std::env::var("RUN_MIGRATIONS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            auth,
            site_url: std::env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:5173".into()),
            staff_pin: std::env::var("STAFF_PIN").unwrap_or_else(|_| "1234".into()),
            kitchen_poll_secs: std::env::var("KITCHEN_POLL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(30),
        })
    }
}
