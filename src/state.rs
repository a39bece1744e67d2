use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    auth::JwtKeys,
    config::AppConfig,
    tutor::{HttpTextGenerator, TextGenerator},
    users::{MemoryUserStore, PgUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub tutor: Option<Arc<dyn TextGenerator>>,
}

impl AppState {
    /// Connects to Postgres, applies migrations and wires the configured
    /// collaborators. Fails when the database is unreachable.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let tutor = match &config.tutor {
            Some(tc) => {
                let generator = HttpTextGenerator::new(tc.clone())?;
                tracing::info!(endpoint = %tc.endpoint, "tutor generator enabled");
                Some(Arc::new(generator) as Arc<dyn TextGenerator>)
            }
            None => None,
        };

        let users = Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>;
        Ok(Self::from_parts(users, Arc::new(config), tutor))
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        config: Arc<AppConfig>,
        tutor: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self {
            users,
            config,
            keys,
            tutor,
        }
    }

    /// State backed by [`MemoryUserStore`], without a tutor.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(Arc::new(MemoryUserStore::new()), Arc::new(config), None)
    }

    pub fn with_tutor(mut self, tutor: Arc<dyn TextGenerator>) -> Self {
        self.tutor = Some(tutor);
        self
    }
}
