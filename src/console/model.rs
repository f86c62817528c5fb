use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::DEFAULT_EXPERIMENT_SERVER_URL;

pub type PropertyBag = Map<String, Value>;

// CONNECTION

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub device_id: String,
}

// EXPERIMENT CONFIGURATION

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Insertion-ordered set of flag keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FlagKeys(Vec<String>);

impl FlagKeys {
    /// Appends a trimmed key. Blank keys and keys already present are refused.
    pub fn insert(&mut self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() || self.contains(key) {
            return false;
        }
        self.0.push(key.to_string());
        true
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|k| k != key);
        self.0.len() != before
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for FlagKeys {
    fn from(keys: Vec<String>) -> Self {
        let mut set = FlagKeys::default();
        for key in keys {
            set.insert(&key);
        }
        set
    }
}

impl From<FlagKeys> for Vec<String> {
    fn from(keys: FlagKeys) -> Self {
        keys.0
    }
}

fn default_server_url() -> String {
    DEFAULT_EXPERIMENT_SERVER_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentConfig {
    #[serde(default)]
    pub deployment_key: String,
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub flag_keys: FlagKeys,
    #[serde(default)]
    pub environment: Environment,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            deployment_key: String::new(),
            server_url: default_server_url(),
            flag_keys: FlagKeys::default(),
            environment: Environment::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn with_server_url(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// A config can be submitted once it names a deployment and at least one flag.
    pub fn validate(&self) -> Result<(), String> {
        if self.deployment_key.trim().is_empty() {
            return Err("Deployment key is required".to_string());
        }
        if self.flag_keys.is_empty() {
            return Err("At least one flag key is required".to_string());
        }
        Ok(())
    }
}

// USER CONTEXT

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub user_properties: PropertyBag,
    #[serde(default)]
    pub groups: PropertyBag,
}

// FLAGS

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentFlag {
    pub key: String,
    pub variant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FlagMetadata>,
}

/// Variants a tester may pin by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualVariant {
    Control,
    Treatment,
}

impl ManualVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManualVariant::Control => "control",
            ManualVariant::Treatment => "treatment",
        }
    }

    pub fn theme(&self) -> &'static str {
        match self {
            ManualVariant::Control => "light",
            ManualVariant::Treatment => "dark",
        }
    }
}

// EVENTS

/// One event in the HTTP ingestion format. Fields the console does not touch
/// are carried through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_properties: Option<PropertyBag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_properties: Option<PropertyBag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<PropertyBag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<String>,
    #[serde(flatten)]
    pub extra: PropertyBag,
}

impl AnalyticsEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsPayload {
    pub api_key: String,
    pub events: Vec<AnalyticsEvent>,
}

// RESULTS

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub timestamp: i64,
    pub experiment_flags: Vec<ExperimentFlag>,
    pub event: AnalyticsEvent,
    pub user_context: UserContext,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flag_keys_reject_duplicates() {
        let mut keys = FlagKeys::default();
        assert!(keys.insert("a"));
        assert!(!keys.insert("a"));
        assert!(!keys.insert("  a "));
        assert!(!keys.insert("   "));
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_flag_keys_deserialize_keeps_first_occurrence() {
        let keys: FlagKeys = serde_json::from_value(json!(["b", "a", "b", "c"])).unwrap();
        let keys: Vec<String> = keys.into();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_experiment_config_defaults() {
        let config: ExperimentConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.server_url, DEFAULT_EXPERIMENT_SERVER_URL);
        assert_eq!(config.environment, Environment::Development);
        assert!(config.flag_keys.is_empty());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_event_extra_fields_pass_through() {
        let event: AnalyticsEvent = serde_json::from_value(json!({
            "event_type": "purchase",
            "price": 9.99,
            "platform": "web"
        }))
        .unwrap();
        assert_eq!(event.extra.get("platform"), Some(&json!("web")));

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["price"], json!(9.99));
        assert!(back.get("user_id").is_none());
    }
}
