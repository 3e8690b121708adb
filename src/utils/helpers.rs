/// Small formatting and parsing helpers shared by the TUI and CLI

/// Truncate string with ellipsis, counting characters rather than bytes
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Split a `key=value` command-line argument. The value may contain `=`.
pub fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", arg)),
    }
}

/// Validate an http(s) base URL (basic check)
pub fn is_valid_base_url(url: &str) -> bool {
    let rest = match url.strip_prefix("http://").or_else(|| url.strip_prefix("https://")) {
        Some(rest) => rest,
        None => return false,
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    !host.is_empty() && !host.contains(char::is_whitespace)
}

/// Parse a record id typed by the user: integers stay numeric, anything else is a string
pub fn parse_record_id(raw: &str) -> serde_json::Value {
    let raw = raw.trim();
    match raw.parse::<u64>() {
        Ok(n) => serde_json::Value::from(n),
        Err(_) => serde_json::Value::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("aarch64-unknown-linux", 10), "aarch64...");
        assert_eq!(truncate_string("ééééé", 4), "é...");
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("code=x86_64"), Ok(("code".into(), "x86_64".into())));
        assert_eq!(parse_assignment("note=a=b"), Ok(("note".into(), "a=b".into())));
        assert_eq!(parse_assignment("code="), Ok(("code".into(), String::new())));
        assert!(parse_assignment("code").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_is_valid_base_url() {
        assert!(is_valid_base_url("http://localhost:8080"));
        assert!(is_valid_base_url("https://api.example.com/admin"));
        assert!(!is_valid_base_url("localhost:8080"));
        assert!(!is_valid_base_url("http://"));
        assert!(!is_valid_base_url("ftp://example.com"));
    }

    #[test]
    fn test_parse_record_id() {
        assert_eq!(parse_record_id("42"), json!(42));
        assert_eq!(parse_record_id(" 7 "), json!(7));
        assert_eq!(parse_record_id("a1b2"), json!("a1b2"));
    }
}
