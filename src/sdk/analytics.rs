use async_trait::async_trait;
use serde_json::Value;
use std::sync::RwLock;

use super::{AnalyticsSdk, DispatchError, SdkError};
use crate::console::model::{AnalyticsEvent, AnalyticsPayload};

/// Analytics over the HTTP ingestion API.
pub struct HttpAnalytics {
    client: reqwest::Client,
    endpoint: String,
    api_key: RwLock<Option<String>>,
}

impl HttpAnalytics {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: RwLock::new(None),
        }
    }

    fn current_key(&self) -> Option<String> {
        self.api_key.read().ok().and_then(|k| k.clone())
    }
}

#[async_trait]
impl AnalyticsSdk for HttpAnalytics {
    async fn init(&self, api_key: &str, user_id: &str) -> Result<(), SdkError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(SdkError::EmptyApiKey);
        }

        if let Ok(mut slot) = self.api_key.write() {
            *slot = Some(api_key.to_string());
        }
        tracing::debug!(user_id, "analytics SDK bound to new API key");
        Ok(())
    }

    async fn reset(&self) {
        if let Ok(mut slot) = self.api_key.write() {
            *slot = None;
        }
    }

    async fn track(&self, event: AnalyticsEvent) -> Result<(), SdkError> {
        let api_key = self.current_key().ok_or(SdkError::NotInitialized)?;
        let payload = AnalyticsPayload {
            api_key,
            events: vec![event],
        };

        self.dispatch(&payload)
            .await
            .map(|_| ())
            .map_err(|e| SdkError::Rejected(e.message))
    }

    async fn dispatch(&self, payload: &AnalyticsPayload) -> Result<Value, DispatchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| DispatchError::new(e.to_string()))?;

        let status = response.status();
        let body: Option<Value> = response.json().await.ok();

        if status.is_success() {
            return body.ok_or_else(|| DispatchError::new("Response body was not valid JSON"));
        }

        let message = body
            .as_ref()
            .and_then(|b| b.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        Err(DispatchError {
            message,
            response: body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    async fn ingestion_server() -> String {
        async fn ingest(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            match body["api_key"].as_str() {
                Some("good-key") => (
                    StatusCode::OK,
                    Json(json!({"code": 200, "events_ingested": body["events"].as_array().map(|e| e.len())})),
                ),
                _ => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"code": 400, "error": "Invalid API key"})),
                ),
            }
        }

        let app = Router::new()
            .route("/2/httpapi", post(ingest))
            .route("/plain", post(|| async { "not json" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn payload(api_key: &str) -> AnalyticsPayload {
        AnalyticsPayload {
            api_key: api_key.to_string(),
            events: vec![AnalyticsEvent::new("click")],
        }
    }

    #[tokio::test]
    async fn test_init_rejects_blank_key() {
        let sdk = HttpAnalytics::new("http://127.0.0.1:9");
        assert!(matches!(sdk.init("  ", "u").await, Err(SdkError::EmptyApiKey)));
        assert!(sdk.init("key", "u").await.is_ok());
    }

    #[tokio::test]
    async fn test_track_requires_init() {
        let sdk = HttpAnalytics::new("http://127.0.0.1:9");
        let result = sdk.track(AnalyticsEvent::new("$exposure")).await;
        assert!(matches!(result, Err(SdkError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_reset_unbinds_key() {
        let sdk = HttpAnalytics::new("http://127.0.0.1:9");
        sdk.init("key", "u").await.unwrap();
        assert_eq!(sdk.current_key().as_deref(), Some("key"));

        sdk.reset().await;
        assert!(sdk.current_key().is_none());
        let result = sdk.track(AnalyticsEvent::new("$exposure")).await;
        assert!(matches!(result, Err(SdkError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_dispatch_success_passes_body_through() {
        let base = ingestion_server().await;
        let sdk = HttpAnalytics::new(format!("{}/2/httpapi", base));

        let body = sdk.dispatch(&payload("good-key")).await.unwrap();
        assert_eq!(body, json!({"code": 200, "events_ingested": 1}));
    }

    #[tokio::test]
    async fn test_dispatch_error_uses_body_message() {
        let base = ingestion_server().await;
        let sdk = HttpAnalytics::new(format!("{}/2/httpapi", base));

        let err = sdk.dispatch(&payload("bad-key")).await.unwrap_err();
        assert_eq!(err.message, "Invalid API key");
        assert_eq!(err.response.unwrap()["code"], json!(400));
    }

    #[tokio::test]
    async fn test_dispatch_non_json_success_is_failure() {
        let base = ingestion_server().await;
        let sdk = HttpAnalytics::new(format!("{}/plain", base));

        let err = sdk.dispatch(&payload("good-key")).await.unwrap_err();
        assert!(err.message.contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_dispatch_status_without_body() {
        let base = ingestion_server().await;
        let sdk = HttpAnalytics::new(format!("{}/missing", base));

        let err = sdk.dispatch(&payload("good-key")).await.unwrap_err();
        assert_eq!(err.message, "HTTP 404");
        assert!(err.response.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sdk = HttpAnalytics::new(format!("http://{}/2/httpapi", addr));
        let err = sdk.dispatch(&payload("good-key")).await.unwrap_err();
        assert!(!err.message.is_empty());
        assert!(err.response.is_none());
    }
}
