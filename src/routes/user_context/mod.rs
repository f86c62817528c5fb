pub mod routes;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::console::model::{PropertyBag, UserContext};
use crate::routes::parse_property_bag;

/// User context as typed into the console: the property fields are raw JSON text.
#[derive(Debug, Deserialize)]
pub struct UserContextForm {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub user_properties: String,
    #[serde(default)]
    pub groups: String,
}

impl UserContextForm {
    pub fn parse(self) -> Result<UserContext, String> {
        let user_properties = parse_property_bag(&self.user_properties)
            .map_err(|e| format!("Invalid JSON in user_properties: {}", e))?;
        let groups = parse_property_bag(&self.groups)
            .map_err(|e| format!("Invalid JSON in groups: {}", e))?;

        Ok(UserContext {
            user_id: self.user_id.trim().to_string(),
            device_id: self.device_id.trim().to_string(),
            user_properties,
            groups,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ThemePresets {
    pub dark: PropertyBag,
    pub light: PropertyBag,
}

fn preset(theme: &str, tier: &str, country: &str, dark_mode: bool) -> PropertyBag {
    let value = json!({
        "theme_preference": theme,
        "subscription_tier": tier,
        "country": country,
        "feature_flags": { "dark_mode_enabled": dark_mode }
    });
    value.as_object().cloned().unwrap_or_default()
}

pub fn theme_presets() -> ThemePresets {
    ThemePresets {
        dark: preset("dark", "premium", "US", true),
        light: preset("light", "free", "CA", false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::theme::is_dark_theme;

    fn form(props: &str, groups: &str) -> UserContextForm {
        UserContextForm {
            user_id: " alice ".to_string(),
            device_id: String::new(),
            user_properties: props.to_string(),
            groups: groups.to_string(),
        }
    }

    #[test]
    fn test_empty_fields_are_empty_bags() {
        let ctx = form("", "  ").parse().unwrap();
        assert_eq!(ctx.user_id, "alice");
        assert!(ctx.user_properties.is_empty());
        assert!(ctx.groups.is_empty());
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = form("{not json", "{}").parse().unwrap_err();
        assert!(err.contains("user_properties"));

        let err = form("{}", "[1, 2]").parse().unwrap_err();
        assert!(err.contains("groups"));
    }

    #[test]
    fn test_presets_drive_theme() {
        let presets = theme_presets();
        let dark = UserContext {
            user_properties: presets.dark,
            ..UserContext::default()
        };
        let light = UserContext {
            user_properties: presets.light,
            ..UserContext::default()
        };
        assert!(is_dark_theme(&dark, &[]));
        assert!(!is_dark_theme(&light, &[]));
    }
}
