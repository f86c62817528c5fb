use serde_json::Value;

use super::model::{AnalyticsEvent, AnalyticsPayload, ExperimentFlag, TestResult, UserContext};
use crate::sdk::DispatchError;

const EXPERIMENT_PREFIX: &str = "[Experiment]";

/// Build the event that goes on the wire from what the user typed.
pub fn assemble(draft: AnalyticsEvent, context: &UserContext, flags: &[ExperimentFlag]) -> AnalyticsEvent {
    let mut event = fill_identity(draft, context);
    inject_experiment_properties(&mut event, flags);
    event
}

/// Draft ids win; blank ones are taken from the user context.
fn fill_identity(mut event: AnalyticsEvent, context: &UserContext) -> AnalyticsEvent {
    event.user_id = pick_id(event.user_id.take(), &context.user_id);
    event.device_id = pick_id(event.device_id.take(), &context.device_id);
    event
}

fn pick_id(draft: Option<String>, fallback: &str) -> Option<String> {
    draft
        .filter(|id| !id.is_empty())
        .or_else(|| Some(fallback.to_string()).filter(|id| !id.is_empty()))
}

/// Flag-derived keys overwrite user-supplied ones of the same name.
fn inject_experiment_properties(event: &mut AnalyticsEvent, flags: &[ExperimentFlag]) {
    if flags.is_empty() {
        return;
    }

    let props = event.event_properties.get_or_insert_with(Default::default);
    for flag in flags {
        props.insert(
            format!("{} {}", EXPERIMENT_PREFIX, flag.key),
            Value::String(flag.variant.clone()),
        );

        if let Some(Value::Object(payload)) = &flag.payload {
            for (field, value) in payload {
                props.insert(
                    format!("{} {}.{}", EXPERIMENT_PREFIX, flag.key, field),
                    value.clone(),
                );
            }
        }
    }
}

pub fn wrap(api_key: &str, event: AnalyticsEvent) -> AnalyticsPayload {
    AnalyticsPayload {
        api_key: api_key.to_string(),
        events: vec![event],
    }
}

/// Everything captured at send time, before the request goes out.
#[derive(Debug, Clone)]
pub struct SendSnapshot {
    pub event: AnalyticsEvent,
    pub flags: Vec<ExperimentFlag>,
    pub context: UserContext,
}

impl SendSnapshot {
    pub fn into_result(self, timestamp: i64, outcome: Result<Value, DispatchError>) -> TestResult {
        let (success, response_data, error) = match outcome {
            Ok(body) => (true, Some(body), None),
            Err(e) => {
                let message = if e.message.trim().is_empty() {
                    "Unknown error".to_string()
                } else {
                    e.message
                };
                (false, e.response, Some(message))
            }
        };

        TestResult {
            timestamp,
            experiment_flags: self.flags,
            event: self.event,
            user_context: self.context,
            success,
            response_data,
            error,
        }
    }
}
