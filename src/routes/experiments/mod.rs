pub mod routes;

use serde::{Deserialize, Serialize};

use crate::console::model::{Environment, ExperimentConfig};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDraftRequest {
    pub deployment_key: Option<String>,
    pub server_url: Option<String>,
    pub environment: Option<Environment>,
}

#[derive(Debug, Deserialize)]
pub struct FlagKeyRequest {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct FlagKeyResponse {
    pub changed: bool,
    pub draft: ExperimentConfig,
}

// Checks the server url looks like something reqwest can reach
pub fn validate_server_url(url: &str) -> Result<(), String> {
    let url = url.trim();
    if url.is_empty() {
        return Err("Server URL cannot be empty".to_string());
    }

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err("Server URL must start with http:// or https://".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_server_url() {
        assert!(validate_server_url("https://api.lab.amplitude.com").is_ok());
        assert!(validate_server_url("http://localhost:8080").is_ok());
        assert!(validate_server_url("").is_err());
        assert!(validate_server_url("ftp://example.com").is_err());
    }
}
