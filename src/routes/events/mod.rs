pub mod routes;

use serde::{Deserialize, Serialize};
use crate::console::model::{AnalyticsEvent, PropertyBag, TestResult};
use crate::console::results::ResultSummary;
use crate::routes::parse_property_bag;

/// An event as typed into the console. Property fields are raw JSON text; any
/// other ingestion field is passed through as-is.
#[derive(Debug, Deserialize)]
pub struct EventForm {
    pub event_type: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub event_properties: String,
    #[serde(default)]
    pub user_properties: String,
    #[serde(default)]
    pub groups: Option<PropertyBag>,
    #[serde(default)]
    pub insert_id: Option<String>,
    #[serde(flatten)]
    pub extra: PropertyBag,
}

impl EventForm {
    pub fn into_event(self, now: i64) -> Result<AnalyticsEvent, String> {
        if self.event_type.trim().is_empty() {
            return Err("Event type is required".to_string());
        }

        let event_properties = parse_property_bag(&self.event_properties)
            .map_err(|e| format!("Invalid JSON in event_properties: {}", e))?;
        let user_properties = parse_property_bag(&self.user_properties)
            .map_err(|e| format!("Invalid JSON in user_properties: {}", e))?;

        let extra = self.extra.into_iter().filter(|(_, v)| !v.is_null()).collect();

        Ok(AnalyticsEvent {
            event_type: self.event_type.trim().to_string(),
            user_id: self.user_id,
            device_id: self.device_id,
            time: Some(self.time.filter(|t| *t > 0).unwrap_or(now)),
            event_properties: Some(event_properties),
            user_properties: Some(user_properties),
            groups: self.groups,
            insert_id: self.insert_id.filter(|id| !id.is_empty()),
            extra,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub summary: ResultSummary,
    pub results: Vec<TestResult>,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub cleared: bool,
}
