//! Prompt and response schema for part lookups.

use partscout_models::NOT_FOUND;
use serde_json::{json, Value};

/// Natural-language instruction for one part on one vendor website.
pub fn build_prompt(part: &str, website: &str) -> String {
    format!(
        r#"Find information for the electronic component part number "{part}" on the website "{website}".

You must find:
1. The direct product page URL on {website}.
2. The current lifecycle status (e.g., Active, Obsolete, NRND, EOL). If not explicitly found, look for "In Stock" or "Discontinued" cues.
3. The direct URL to the technical datasheet for this specific part.

If any information is not found, use "{NOT_FOUND}" as the value.
Return the result strictly in JSON format with the fields "link", "lifecycle" and "datasheet"."#
    )
}

/// Structured-output schema: three required string fields.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "link": {
                "type": "STRING",
                "description": format!("The product page URL address link. Use '{}' if unavailable.", NOT_FOUND)
            },
            "lifecycle": {
                "type": "STRING",
                "description": format!("The lifecycle status word found on the page. Use '{}' if unavailable.", NOT_FOUND)
            },
            "datasheet": {
                "type": "STRING",
                "description": format!("The datasheet URL address link. Use '{}' if unavailable.", NOT_FOUND)
            }
        },
        "required": ["link", "lifecycle", "datasheet"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_part_and_website() {
        let prompt = build_prompt("LM317T", "ti.com");
        assert!(prompt.contains("\"LM317T\""));
        assert!(prompt.contains("product page URL on ti.com"));
        assert!(prompt.contains("\"Not found\""));
        assert!(prompt.contains("datasheet"));
    }

    #[test]
    fn test_schema_requires_three_strings() {
        let schema = response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["link", "lifecycle", "datasheet"]);
        for field in required {
            assert_eq!(schema["properties"][field]["type"], "STRING");
        }
    }
}
