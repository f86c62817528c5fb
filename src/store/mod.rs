//! Last-used connection and experiment settings, kept across restarts.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::console::model::{ConnectionConfig, ExperimentConfig};

const CONNECTION_KEY: &str = "connection_config";
const EXPERIMENT_KEY: &str = "experiment_config";

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> StoreResult<()>;
    async fn delete(&self, key: &str) -> StoreResult<()>;

    fn backend(&self) -> &'static str;
}

// POSTGRES

pub struct PgBlobStore {
    db: PgPool,
}

impl PgBlobStore {
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let db = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;
        Ok(Self { db })
    }
}

#[async_trait]
impl BlobStore for PgBlobStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let row: Option<Json<Value>> = sqlx::query_scalar(
            r#"
            SELECT value FROM console_settings
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|Json(value)| value))
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO console_settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(Json(value))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            DELETE FROM console_settings
            WHERE key = $1
            "#,
        )
        .bind(key)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

// IN-MEMORY

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Value>>,
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.blobs.lock().ok().and_then(|b| b.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(key.to_string(), value);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.remove(key);
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// CONFIG STORE

/// Typed view over a `BlobStore`. Never fails: anything that cannot be read
/// back is treated as never saved.
#[derive(Clone)]
pub struct ConfigStore {
    blobs: Arc<dyn BlobStore>,
    experiment_default: ExperimentConfig,
}

impl ConfigStore {
    pub fn new(blobs: Arc<dyn BlobStore>, experiment_default: ExperimentConfig) -> Self {
        Self {
            blobs,
            experiment_default,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBlobStore::default()), ExperimentConfig::default())
    }

    pub fn backend(&self) -> &'static str {
        self.blobs.backend()
    }

    pub async fn load_connection(&self) -> ConnectionConfig {
        self.load(CONNECTION_KEY).await.unwrap_or_default()
    }

    pub async fn save_connection(&self, config: &ConnectionConfig) {
        self.save(CONNECTION_KEY, config).await;
    }

    pub async fn clear_connection(&self) -> ConnectionConfig {
        self.clear(CONNECTION_KEY).await;
        ConnectionConfig::default()
    }

    pub async fn load_experiment(&self) -> ExperimentConfig {
        self.load(EXPERIMENT_KEY)
            .await
            .unwrap_or_else(|| self.experiment_default.clone())
    }

    pub async fn save_experiment(&self, config: &ExperimentConfig) {
        self.save(EXPERIMENT_KEY, config).await;
    }

    pub async fn clear_experiment(&self) -> ExperimentConfig {
        self.clear(EXPERIMENT_KEY).await;
        self.experiment_default.clone()
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let blob = match self.blobs.get(key).await {
            Ok(blob) => blob?,
            Err(e) => {
                tracing::warn!(key, "failed to load saved settings: {:?}", e);
                return None;
            }
        };

        match serde_json::from_value(blob) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, "saved settings are unreadable, ignoring: {}", e);
                None
            }
        }
    }

    async fn save<T: Serialize>(&self, key: &str, value: &T) {
        let blob = match serde_json::to_value(value) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!(key, "failed to encode settings: {}", e);
                return;
            }
        };

        if let Err(e) = self.blobs.set(key, blob).await {
            tracing::warn!(key, "failed to save settings: {:?}", e);
        }
    }

    async fn clear(&self, key: &str) {
        if let Err(e) = self.blobs.delete(key).await {
            tracing::warn!(key, "failed to clear settings: {:?}", e);
        }
    }
}
