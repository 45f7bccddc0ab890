use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    auth::{
        jwt::JwtKeys,
        memory::MemoryUserStore,
        repo::{PgUserStore, UserStore},
    },
    config::AppConfig,
};

/// Everything a handler may touch: the store, the startup configuration and
/// the signing keys derived from it. Built once and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
}

impl AppState {
    /// Connects to Postgres and applies the embedded migrations.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run database migrations")?;

        let store = Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>;
        Ok(Self::from_parts(store, Arc::new(config)))
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        Self {
            store,
            config,
            keys,
        }
    }

    /// State backed by a fresh `MemoryUserStore`.
    pub fn in_memory(secret: &str) -> (Self, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let state = Self::from_parts(
            store.clone() as Arc<dyn UserStore>,
            Arc::new(AppConfig::local(secret)),
        );
        (state, store)
    }
}
