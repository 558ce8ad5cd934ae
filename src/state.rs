use crate::auth::password::hash_pin;
use crate::auth::provider::{AuthProvider, HostedAuth};
use crate::cart::session::Sessions;
use crate::config::{AppConfig, StoreBackend};
use crate::kitchen::board::KitchenBoard;
use crate::menu::catalog::Catalog;
use crate::store::{memory::MemoryStore, postgres::PgStore, ChangeFeed, OrderStore, ProductStore};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub orders: Arc<dyn OrderStore>,
    pub feed: Arc<dyn ChangeFeed>,
    pub catalog: Arc<Catalog>,
    pub sessions: Arc<Sessions>,
    pub kitchen: Arc<KitchenBoard>,
    pub auth: Arc<dyn AuthProvider>,
    pub staff_pin_hash: Arc<str>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let auth = Arc::new(HostedAuth::new(&config.auth, &config.site_url)?) as Arc<dyn AuthProvider>;

        match config.store {
            StoreBackend::Postgres => {
                let url = config.database_url.as_deref().context("DATABASE_URL")?;
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await?;

                if config.run_migrations {
                    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                        warn!(error = %e, "migrations folder not found or migration failed; continuing");
                    }
                }

                let store = Arc::new(PgStore::new(db));
                store.spawn_listener();
                info!("using postgres store");
                Self::from_parts(config, store.clone(), store.clone(), store, auth)
            }
            StoreBackend::Memory => {
                let store = Arc::new(MemoryStore::new());
                info!("using in-memory store; data is lost on restart");
                Self::from_parts(config, store.clone(), store.clone(), store, auth)
            }
        }
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
        feed: Arc<dyn ChangeFeed>,
        auth: Arc<dyn AuthProvider>,
    ) -> anyhow::Result<Self> {
        let staff_pin_hash: Arc<str> = hash_pin(&config.staff_pin)?.into();
        Ok(Self {
            catalog: Arc::new(Catalog::new(products)),
            kitchen: Arc::new(KitchenBoard::new(orders.clone())),
            sessions: Arc::new(Sessions::default()),
            config,
            orders,
            feed,
            auth,
            staff_pin_hash,
        })
    }

    /// Memory-backed state with a scripted auth provider. The store handle
    /// is returned so tests can seed rows and inject failures.
    #[cfg(test)]
    pub fn fake() -> (Self, Arc<MemoryStore>) {
        use crate::auth::{jwt::tests::TEST_SECRET, provider::FakeAuth};
        use crate::config::AuthConfig;

        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            run_migrations: false,
            auth: AuthConfig {
                url: "http://auth.local".into(),
                anon_key: "anon".into(),
                jwt_secret: TEST_SECRET.into(),
                audience: "authenticated".into(),
                issuer: None,
            },
            site_url: "http://localhost:5173".into(),
            staff_pin: "1234".into(),
            kitchen_poll_secs: 30,
        });

        let store = Arc::new(MemoryStore::new());
        let state = Self::from_parts(config, store.clone(), store.clone(), store.clone(), Arc::new(FakeAuth))
            .expect("fake state");
        (state, store)
    }
}
