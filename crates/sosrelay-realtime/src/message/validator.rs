//! Message validation rules.

use serde_json::Value;

use sosrelay_core::error::AppError;

/// Validates raw inbound frame size and content.
pub fn validate_inbound(raw: &str, max_size: usize) -> Result<(), AppError> {
    if raw.len() > max_size {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {max_size} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Normalizes an identifier given as a JSON string or number.
///
/// Blank strings and other JSON types count as missing.
pub fn identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Like [`identifier`], failing with `message` when absent.
pub fn require_identifier(value: Option<&Value>, message: &str) -> Result<String, AppError> {
    identifier(value).ok_or_else(|| AppError::validation(message))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_validate_inbound_limits() {
        assert!(validate_inbound("{}", 16).is_ok());
        assert!(validate_inbound("   ", 16).is_err());
        assert!(validate_inbound(&"x".repeat(17), 16).is_err());
    }

    #[test]
    fn test_identifier_accepts_string_and_number() {
        assert_eq!(identifier(Some(&json!("abc"))), Some("abc".to_string()));
        assert_eq!(identifier(Some(&json!(12))), Some("12".to_string()));
        assert_eq!(identifier(Some(&json!("  "))), None);
        assert_eq!(identifier(Some(&json!(null))), None);
        assert_eq!(identifier(None), None);
    }

    #[test]
    fn test_require_identifier_message() {
        let err = require_identifier(None, "Room ID is required").expect_err("missing");
        assert_eq!(err.message, "Room ID is required");
    }
}
