use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::model::{AnalyticsEvent, ExperimentFlag, FlagMetadata, ManualVariant, UserContext};
use crate::sdk::Variants;

pub const DEFAULT_VARIANT: &str = "control";
pub const MANUAL_FLAG_TYPE: &str = "manual_assignment";
pub const EXPOSURE_EVENT: &str = "$exposure";
pub const ASSIGNMENT_EVENT: &str = "[Experiment] Assignment";

/// Map each configured key, in order, onto the server's assignment for it.
/// Keys the server knows nothing about fall back to "control".
pub fn resolve<'a, I>(flag_keys: I, variants: &Variants) -> Vec<ExperimentFlag>
where
    I: IntoIterator<Item = &'a str>,
{
    flag_keys
        .into_iter()
        .map(|key| match variants.get(key) {
            Some(variant) => ExperimentFlag {
                key: key.to_string(),
                variant: variant.name().unwrap_or(DEFAULT_VARIANT).to_string(),
                payload: variant.payload.clone().filter(|p| !p.is_null()),
                metadata: variant.metadata.clone(),
            },
            None => ExperimentFlag {
                key: key.to_string(),
                variant: DEFAULT_VARIANT.to_string(),
                payload: None,
                metadata: None,
            },
        })
        .collect()
}

/// Whether a manual assignment updated an existing entry or added one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Updated,
    Appended,
}

/// Pin `key` to `variant`. An existing entry keeps its position; a new one
/// goes to the end. Returns the entry as it now stands.
pub fn manual_assign(
    flags: &mut Vec<ExperimentFlag>,
    key: &str,
    variant: ManualVariant,
) -> (Assignment, ExperimentFlag) {
    let assigned = ExperimentFlag {
        key: key.to_string(),
        variant: variant.as_str().to_string(),
        payload: Some(json!({ "theme": variant.theme() })),
        metadata: Some(FlagMetadata {
            flag_type: Some(MANUAL_FLAG_TYPE.to_string()),
            ..FlagMetadata::default()
        }),
    };

    match flags.iter_mut().find(|f| f.key == key) {
        Some(existing) => {
            *existing = assigned.clone();
            (Assignment::Updated, assigned)
        }
        None => {
            flags.push(assigned.clone());
            (Assignment::Appended, assigned)
        }
    }
}

pub fn exposure_event(flag: &ExperimentFlag, context: &UserContext) -> AnalyticsEvent {
    let mut props = Map::new();
    props.insert("flag_key".to_string(), Value::String(flag.key.clone()));
    props.insert("variant".to_string(), Value::String(flag.variant.clone()));
    tracking_event(EXPOSURE_EVENT, props, context)
}

pub fn assignment_event(key: &str, variant: ManualVariant, context: &UserContext) -> AnalyticsEvent {
    let mut props = Map::new();
    props.insert("flag_key".to_string(), Value::String(key.to_string()));
    props.insert("variant".to_string(), Value::String(variant.as_str().to_string()));
    props.insert("source".to_string(), Value::String("manual".to_string()));
    tracking_event(ASSIGNMENT_EVENT, props, context)
}

fn tracking_event(event_type: &str, props: Map<String, Value>, context: &UserContext) -> AnalyticsEvent {
    AnalyticsEvent {
        user_id: Some(context.user_id.clone()).filter(|id| !id.is_empty()),
        device_id: Some(context.device_id.clone()).filter(|id| !id.is_empty()),
        time: Some(chrono::Utc::now().timestamp_millis()),
        event_properties: Some(props),
        insert_id: Some(Uuid::new_v4().to_string()),
        ..AnalyticsEvent::new(event_type)
    }
}
