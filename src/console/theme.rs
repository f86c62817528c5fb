use serde_json::Value;

use super::model::{ExperimentFlag, UserContext};

const THEME_KEY_MARKERS: [&str; 3] = ["theme", "dark", "color"];

/// Decide whether the console renders dark.
///
/// Any single matching signal wins; nothing can force the light theme back once
/// one of them matches.
pub fn is_dark_theme(context: &UserContext, flags: &[ExperimentFlag]) -> bool {
    prefers_dark(context) || flags.iter().any(flag_forces_dark)
}

fn prefers_dark(context: &UserContext) -> bool {
    let props = &context.user_properties;

    let preference = props.get("theme_preference").and_then(Value::as_str) == Some("dark");
    let dark_mode_enabled = props
        .get("feature_flags")
        .and_then(|f| f.get("dark_mode_enabled"))
        .and_then(Value::as_bool)
        == Some(true);

    preference || dark_mode_enabled
}

fn flag_forces_dark(flag: &ExperimentFlag) -> bool {
    let themed_key = THEME_KEY_MARKERS.iter().any(|m| flag.key.contains(m));
    let dark_variant = flag.variant == "dark" || flag.variant == "treatment";

    let dark_payload = flag
        .payload
        .as_ref()
        .and_then(|p| p.get("theme"))
        .and_then(Value::as_str)
        == Some("dark");

    let manual_treatment = flag.variant == "treatment"
        && flag
            .metadata
            .as_ref()
            .and_then(|m| m.flag_type.as_deref())
            == Some("manual_assignment");

    (themed_key && dark_variant) || dark_payload || manual_treatment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::model::FlagMetadata;
    use serde_json::json;

    fn flag(key: &str, variant: &str) -> ExperimentFlag {
        ExperimentFlag {
            key: key.to_string(),
            variant: variant.to_string(),
            payload: None,
            metadata: None,
        }
    }

    fn context_with(props: Value) -> UserContext {
        UserContext {
            user_properties: props.as_object().cloned().unwrap_or_default(),
            ..UserContext::default()
        }
    }

    #[test]
    fn test_empty_inputs_are_light() {
        assert!(!is_dark_theme(&UserContext::default(), &[]));
    }

    #[test]
    fn test_theme_preference_property() {
        assert!(is_dark_theme(&context_with(json!({"theme_preference": "dark"})), &[]));
        assert!(!is_dark_theme(&context_with(json!({"theme_preference": "light"})), &[]));
    }

    #[test]
    fn test_dark_mode_feature_flag_property() {
        let ctx = context_with(json!({"feature_flags": {"dark_mode_enabled": true}}));
        assert!(is_dark_theme(&ctx, &[]));

        // only a literal boolean counts
        let ctx = context_with(json!({"feature_flags": {"dark_mode_enabled": "true"}}));
        assert!(!is_dark_theme(&ctx, &[]));
    }

    #[test]
    fn test_payload_theme_dark() {
        let mut f = flag("theme-test", "treatment");
        f.payload = Some(json!({"theme": "dark"}));
        assert!(is_dark_theme(&UserContext::default(), &[f]));

        let mut f = flag("checkout", "control");
        f.payload = Some(json!({"theme": "dark"}));
        assert!(is_dark_theme(&UserContext::default(), &[f]));
    }

    #[test]
    fn test_themed_key_needs_dark_variant() {
        let ctx = UserContext::default();
        assert!(is_dark_theme(&ctx, &[flag("new-color-scheme", "dark")]));
        assert!(is_dark_theme(&ctx, &[flag("dark-launch", "treatment")]));
        assert!(!is_dark_theme(&ctx, &[flag("theme-toggle", "control")]));
        assert!(!is_dark_theme(&ctx, &[flag("checkout", "treatment")]));
    }

    #[test]
    fn test_manual_treatment_on_any_key() {
        let mut f = flag("checkout", "treatment");
        f.metadata = Some(FlagMetadata {
            flag_type: Some("manual_assignment".to_string()),
            ..FlagMetadata::default()
        });
        assert!(is_dark_theme(&UserContext::default(), &[f]));
    }

    #[test]
    fn test_light_preference_cannot_override_flag() {
        let ctx = context_with(json!({"theme_preference": "light"}));
        assert!(is_dark_theme(&ctx, &[flag("theme-test", "treatment")]));
    }

    #[test]
    fn test_pure_and_non_mutating() {
        let ctx = context_with(json!({"country": "US"}));
        let flags = vec![flag("theme-test", "control"), flag("other", "treatment")];
        let (ctx_before, flags_before) = (ctx.clone(), flags.clone());

        let first = is_dark_theme(&ctx, &flags);
        let second = is_dark_theme(&ctx, &flags);

        assert_eq!(first, second);
        assert_eq!(ctx, ctx_before);
        assert_eq!(flags, flags_before);
    }
}
