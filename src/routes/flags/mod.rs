pub mod routes;

use serde::{Deserialize, Serialize};

use crate::console::model::{ExperimentFlag, ManualVariant};

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub variant: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsResponse {
    pub active_flags: Vec<ExperimentFlag>,
    pub is_dark_theme: bool,
}

// Only control and treatment can be pinned by hand
pub fn parse_variant(variant: &str) -> Result<ManualVariant, String> {
    match variant.trim().to_ascii_lowercase().as_str() {
        "control" => Ok(ManualVariant::Control),
        "treatment" => Ok(ManualVariant::Treatment),
        other => Err(format!("Variant must be control or treatment, got '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variant() {
        assert_eq!(parse_variant("Treatment"), Ok(ManualVariant::Treatment));
        assert_eq!(parse_variant(" control"), Ok(ManualVariant::Control));
        assert!(parse_variant("dark").is_err());
    }
}
