use super::result::ResolveError;
use crate::backend::Backend;
use lodestar_common::protocol::ElementDescriptor;
use serde_json::Value;
use tracing::debug;

/// Snapshot every visible interactive element, shadow roots included.
///
/// Either the whole snapshot is returned or the call fails; malformed rows
/// are not skipped.
pub async fn extract(backend: &mut dyn Backend) -> Result<Vec<ElementDescriptor>, ResolveError> {
    let value = backend
        .evaluate(lodestar_scanner::EXTRACT_JS)
        .await
        .map_err(|e| ResolveError::QueryFailure(e.to_string()))?;

    let elements = parse_snapshot(value)?;
    debug!(
        "Extracted {} elements ({} inside shadow roots)",
        elements.len(),
        elements.iter().filter(|e| e.in_shadow_root()).count()
    );
    Ok(elements)
}

pub fn parse_snapshot(value: Value) -> Result<Vec<ElementDescriptor>, ResolveError> {
    if !value.is_array() {
        return Err(ResolveError::QueryFailure(format!(
            "extraction returned {} instead of an array",
            type_name(&value)
        )));
    }
    let mut elements: Vec<ElementDescriptor> = serde_json::from_value(value)
        .map_err(|e| ResolveError::QueryFailure(format!("malformed element snapshot: {}", e)))?;
    for element in &mut elements {
        element.tag = element.tag.to_lowercase();
    }
    Ok(elements)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_snapshot() {
        let value = json!([
            {"tag": "INPUT", "name": "username", "rect": {"x": 0, "y": 0, "width": 100, "height": 20}},
            {"tag": "button", "text": "Login", "shadowDepth": 2}
        ]);
        let elements = parse_snapshot(value).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].tag, "input");
        assert_eq!(elements[1].shadow_depth, 2);
    }

    #[test]
    fn test_non_array_is_query_failure() {
        let err = parse_snapshot(json!(null)).unwrap_err();
        assert!(matches!(err, ResolveError::QueryFailure(_)));
    }

    #[test]
    fn test_malformed_row_fails_whole_snapshot() {
        let err = parse_snapshot(json!([{"tag": "a"}, {"text": "no tag"}])).unwrap_err();
        assert!(matches!(err, ResolveError::QueryFailure(_)));
    }
}
