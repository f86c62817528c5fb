//! Collaborators the console talks to: the analytics ingestion API and the
//! experimentation server. Both sit behind traits so the session never holds a
//! concrete client and tests can swap in fakes.

pub mod analytics;
pub mod experiment;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::console::model::{AnalyticsEvent, AnalyticsPayload, FlagMetadata, UserContext};

pub use analytics::HttpAnalytics;
pub use experiment::{RemoteExperimentProvider, StubExperimentProvider};

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("analytics SDK is not initialized")]
    NotInitialized,
    #[error("API key cannot be empty")]
    EmptyApiKey,
    #[error("deployment key cannot be empty")]
    EmptyDeploymentKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Rejected(String),
}

/// Why a dispatch did not succeed. `response` keeps whatever body the server sent.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub message: String,
    pub response: Option<Value>,
}

impl DispatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: None,
        }
    }
}

#[async_trait]
pub trait AnalyticsSdk: Send + Sync {
    /// Bind the SDK to an API key. Fails on a key the SDK cannot use.
    async fn init(&self, api_key: &str, user_id: &str) -> Result<(), SdkError>;

    /// Drop the key given to `init`; tracking fails until the next `init`.
    async fn reset(&self);

    /// Record a tracking event with the key given to `init`.
    async fn track(&self, event: AnalyticsEvent) -> Result<(), SdkError>;

    /// Send a full ingestion payload and return the server's JSON body.
    async fn dispatch(&self, payload: &AnalyticsPayload) -> Result<Value, DispatchError>;
}

#[derive(Debug, Clone)]
pub struct ExperimentOptions {
    pub server_url: String,
    pub debug: bool,
    pub source: String,
}

impl ExperimentOptions {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            debug: true,
            source: "experiment-console".to_string(),
        }
    }
}

/// A variant as returned by the experimentation server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub metadata: Option<FlagMetadata>,
}

impl Variant {
    /// The assigned variant name. An empty name counts as no assignment.
    pub fn name(&self) -> Option<&str> {
        self.key
            .as_deref()
            .filter(|k| !k.is_empty())
            .or(self.value.as_deref().filter(|v| !v.is_empty()))
    }
}

pub type Variants = HashMap<String, Variant>;

pub trait ExperimentProvider: Send + Sync {
    fn initialize(
        &self,
        deployment_key: &str,
        options: ExperimentOptions,
    ) -> Result<Arc<dyn ExperimentClient>, SdkError>;
}

#[async_trait]
pub trait ExperimentClient: Send + Sync {
    fn set_user(&self, user: &UserContext);

    async fn start(&self) -> Result<(), SdkError>;

    /// Every assignment the server holds for the current user.
    async fn all(&self) -> Result<Variants, SdkError>;
}
