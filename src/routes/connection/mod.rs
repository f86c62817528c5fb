pub mod routes;

use serde::Deserialize;

use crate::console::model::ConnectionConfig;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub api_key: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub device_id: String,
}

impl From<ConnectionRequest> for ConnectionConfig {
    fn from(req: ConnectionRequest) -> Self {
        ConnectionConfig {
            api_key: req.api_key.trim().to_string(),
            user_id: req.user_id.trim().to_string(),
            device_id: req.device_id.trim().to_string(),
        }
    }
}
