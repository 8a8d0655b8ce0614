use serde::Serialize;

/// Pretty JSON for log output. Serialization failures are rendered inline
/// instead of being propagated.
pub fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"))
}

pub fn with_pretty_json_debug<T, F>(value: &T, log_action: F)
where
    T: Serialize,
    F: FnOnce(&str),
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let pretty_json = pretty_json(value);
    log_action(pretty_json.as_str());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pretty_json_is_indented() {
        let rendered = pretty_json(&json!({ "database": "helldivers_stats" }));
        assert_eq!(rendered, "{\n  \"database\": \"helldivers_stats\"\n}");
    }
}
