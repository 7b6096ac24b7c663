use crate::error::{Error, Result};
use serde_json::Value;

pub const FORBIDDEN_TERMS: [&str; 3] = ["delete", "drop", "format disk"];

/// Fails when `data` lacks any of `required` at the top level.
pub fn validate_data_keys(data: &Value, required: &[String]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|k| data.get(k.as_str()).is_none())
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::validation(format!("Missing required keys: {:?}", missing)))
    }
}

pub fn safety_check_instructions(instructions: &str) -> Result<()> {
    let lowered = instructions.to_lowercase();
    match FORBIDDEN_TERMS.iter().find(|t| lowered.contains(*t)) {
        Some(term) => Err(Error::validation(format!(
            "Unsafe term detected in instructions: {}",
            term
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_missing_keys() {
        let required = vec!["date".to_string(), "region".to_string(), "items".to_string()];
        assert!(validate_data_keys(&json!({"date": "x", "region": "W", "items": []}), &required).is_ok());
        let err = validate_data_keys(&json!({"date": "x"}), &required).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: Missing required keys: [\"region\", \"items\"]"
        );
    }

    #[test]
    fn blocks_destructive_instructions() {
        assert!(safety_check_instructions("watermark then compress").is_ok());
        let err = safety_check_instructions("Then DROP the old files").unwrap_err();
        assert!(err.to_string().ends_with("Unsafe term detected in instructions: drop"));
    }
}
