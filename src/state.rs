use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::{jwt::JwtKeys, AuthService};
use crate::config::AppConfig;
use crate::store::PgUserStore;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let auth = AuthService::new(
            Arc::new(PgUserStore::new(db.clone())),
            JwtKeys::new(&config.jwt),
        );

        Ok(Self { db, config, auth })
    }
}
