//! Human-readable validation and extraction feedback.

use jsonschema::Validator;
use serde_json::Value;

/// Maximum number of characters kept by [`preview`].
pub const PREVIEW_CHARS: usize = 500;

/// Collect all validation errors for `instance`, each prefixed with its instance path.
///
/// Uses `iter_errors()` so every failure is reported, not just the first.
///
/// # Examples
///
/// ```
/// use rig_guard_structured::collect_validation_errors;
/// use serde_json::json;
///
/// let schema = json!({
///     "type": "object",
///     "properties": {"name": {"type": "string"}},
///     "required": ["name"]
/// });
/// let validator = jsonschema::Validator::new(&schema).unwrap();
/// let errors = collect_validation_errors(&validator, &json!({"name": 7}));
/// assert_eq!(errors.len(), 1);
/// assert!(errors[0].starts_with("At path '/name'"));
/// ```
#[must_use]
pub fn collect_validation_errors(validator: &Validator, instance: &Value) -> Vec<String> {
    validator
        .iter_errors(instance)
        .map(|error| {
            let path = error.instance_path.to_string();
            let path = if path.is_empty() { "/".to_string() } else { path };
            format!("At path '{path}': {error}")
        })
        .collect()
}

/// Truncate `text` to [`PREVIEW_CHARS`] characters for error messages and logs.
///
/// Counts characters rather than bytes so multi-byte text never splits.
#[must_use]
pub fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let truncated: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}
