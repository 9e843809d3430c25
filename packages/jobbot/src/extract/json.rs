//! Loose-JSON handling for LLM responses.
//!
//! The extraction service is prompted for pure JSON but routinely wraps it
//! in prose or code fences. Every caller goes through this gate before
//! trusting the shape.

/// Pull the outermost JSON object out of loose LLM output: first `{` to
/// last `}`. Returns None when no object is present.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Truncate on a char boundary. Prompt budgets are in characters, and a
/// byte-index slice would panic inside multi-byte content.
pub fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_fenced_response() {
        let raw = "Here you go:\n```json\n{\"jobs\": []}\n```\nLet me know!";
        assert_eq!(extract_json_object(raw), Some("{\"jobs\": []}"));
    }

    #[test]
    fn returns_none_without_object() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn clip_respects_char_boundaries() {
        assert_eq!(clip("hello", 10), "hello");
        assert_eq!(clip("hello", 3), "hel");
        assert_eq!(clip("héllo", 2), "hé");
    }
}
