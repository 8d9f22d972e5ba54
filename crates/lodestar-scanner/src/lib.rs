use serde_json::Value;

/// Extraction script: walks the document and every open shadow root and
/// returns one descriptor per visible interactive element.
/// Evaluates to a JSON array when injected by a backend.
pub const EXTRACT_JS: &str = include_str!("extract.js");

/// Probe script: a function of `(kind, query)` where `kind` is `"css"` or
/// `"xpath"`. Returns `[{visible, enabled}]` for every match.
pub const PROBE_JS: &str = include_str!("probe.js");

/// Build an expression that applies a script function to JSON arguments.
pub fn invoke(script: &str, args: &[Value]) -> String {
    let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
    format!("({})({})", script.trim(), rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    #[allow(clippy::const_is_empty)]
    fn scripts_are_embedded() {
        assert!(!EXTRACT_JS.is_empty());
        assert!(EXTRACT_JS.contains("shadowRoot"));
        assert!(PROBE_JS.contains("XPathResult"));
    }

    #[test]
    fn invoke_quotes_arguments() {
        let expr = invoke("(a, b) => a + b", &[json!("css"), json!("[id=\"x\"]")]);
        assert_eq!(expr, r#"((a, b) => a + b)("css", "[id=\"x\"]")"#);
    }
}
