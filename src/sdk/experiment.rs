use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{ExperimentClient, ExperimentOptions, ExperimentProvider, SdkError, Variants};
use crate::console::model::UserContext;

/// Provider backed by the experimentation server's variant endpoint.
pub struct RemoteExperimentProvider {
    http: reqwest::Client,
}

impl RemoteExperimentProvider {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for RemoteExperimentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentProvider for RemoteExperimentProvider {
    fn initialize(
        &self,
        deployment_key: &str,
        options: ExperimentOptions,
    ) -> Result<Arc<dyn ExperimentClient>, SdkError> {
        if deployment_key.trim().is_empty() {
            return Err(SdkError::EmptyDeploymentKey);
        }

        if options.debug {
            tracing::debug!(
                server_url = %options.server_url,
                source = %options.source,
                "initializing experiment client"
            );
        }

        Ok(Arc::new(RemoteExperimentClient {
            http: self.http.clone(),
            deployment_key: deployment_key.trim().to_string(),
            endpoint: format!("{}/sdk/vardata", options.server_url.trim_end_matches('/')),
            user: Mutex::new(UserContext::default()),
        }))
    }
}

pub struct RemoteExperimentClient {
    http: reqwest::Client,
    deployment_key: String,
    endpoint: String,
    user: Mutex<UserContext>,
}

impl RemoteExperimentClient {
    async fn fetch(&self) -> Result<Variants, SdkError> {
        let user = self.user.lock().map(|u| u.clone()).unwrap_or_default();

        let response = self
            .http
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Api-Key {}", self.deployment_key),
            )
            .json(&user)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SdkError::Rejected(format!(
                "variant fetch failed with HTTP {}",
                status.as_u16()
            )));
        }

        Ok(response.json::<Variants>().await?)
    }
}

#[async_trait]
impl ExperimentClient for RemoteExperimentClient {
    fn set_user(&self, user: &UserContext) {
        if let Ok(mut slot) = self.user.lock() {
            *slot = user.clone();
        }
    }

    async fn start(&self) -> Result<(), SdkError> {
        let variants = self.fetch().await?;
        tracing::debug!(count = variants.len(), "experiment client started");
        Ok(())
    }

    async fn all(&self) -> Result<Variants, SdkError> {
        self.fetch().await
    }
}

/// Fallback provider for when no experimentation server is reachable: it holds
/// no assignments, so every flag resolves to the default variant.
#[derive(Default)]
pub struct StubExperimentProvider;

impl ExperimentProvider for StubExperimentProvider {
    fn initialize(
        &self,
        deployment_key: &str,
        _options: ExperimentOptions,
    ) -> Result<Arc<dyn ExperimentClient>, SdkError> {
        if deployment_key.trim().is_empty() {
            return Err(SdkError::EmptyDeploymentKey);
        }
        Ok(Arc::new(StubExperimentClient))
    }
}

pub struct StubExperimentClient;

#[async_trait]
impl ExperimentClient for StubExperimentClient {
    fn set_user(&self, _user: &UserContext) {}

    async fn start(&self) -> Result<(), SdkError> {
        Ok(())
    }

    async fn all(&self) -> Result<Variants, SdkError> {
        Ok(Variants::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn variant_server() -> String {
        async fn vardata(headers: HeaderMap, Json(user): Json<Value>) -> (StatusCode, Json<Value>) {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if auth != "Api-Key client-abc" {
                return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
            }

            let variant = if user["user_id"] == "vip" { "treatment" } else { "control" };
            (
                StatusCode::OK,
                Json(json!({
                    "theme-test": {
                        "key": variant,
                        "payload": {"theme": "dark"},
                        "metadata": {"flagType": "experiment", "deployed": true, "segmentName": "All Users"}
                    },
                    "legacy": {"value": "on"}
                })),
            )
        }

        let app = Router::new().route("/sdk/vardata", post(vardata));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_remote_client_reads_variants_for_current_user() {
        let server = variant_server().await;
        let client = RemoteExperimentProvider::new()
            .initialize("client-abc", ExperimentOptions::new(server))
            .unwrap();

        client.start().await.unwrap();
        let variants = client.all().await.unwrap();
        assert_eq!(variants["theme-test"].name(), Some("control"));
        assert_eq!(variants["legacy"].name(), Some("on"));
        assert_eq!(
            variants["theme-test"].metadata.as_ref().unwrap().segment_name.as_deref(),
            Some("All Users")
        );

        client.set_user(&UserContext {
            user_id: "vip".to_string(),
            ..UserContext::default()
        });
        let variants = client.all().await.unwrap();
        assert_eq!(variants["theme-test"].name(), Some("treatment"));
    }

    #[tokio::test]
    async fn test_remote_client_surfaces_rejection() {
        let server = variant_server().await;
        let client = RemoteExperimentProvider::new()
            .initialize("client-wrong", ExperimentOptions::new(server))
            .unwrap();

        let err = client.start().await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_blank_deployment_key_rejected() {
        let opts = ExperimentOptions::new("http://localhost");
        assert!(RemoteExperimentProvider::new().initialize(" ", opts.clone()).is_err());
        assert!(StubExperimentProvider.initialize("", opts).is_err());
    }

    #[tokio::test]
    async fn test_stub_client_has_no_assignments() {
        let client = StubExperimentProvider
            .initialize("client-abc", ExperimentOptions::new("http://localhost"))
            .unwrap();
        client.start().await.unwrap();
        assert!(client.all().await.unwrap().is_empty());
    }
}
