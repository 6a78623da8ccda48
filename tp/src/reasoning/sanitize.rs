//! Model output sanitization
//!
//! Raw generation output is messy: reasoning models prefix a thinking
//! block, chat models wrap JSON in markdown fences or prose. This strips
//! all of that down to the JSON object, if there is one.

/// Isolate the JSON object in raw model output
///
/// Strips a `<think>...</think>` prefix and markdown code fences, then
/// slices from the first `{` to the last `}`. Returns `None` when no
/// object remains.
pub fn extract_json(raw: &str) -> Option<&str> {
    let mut text = raw.trim();

    if let Some(end) = text.find("</think>") {
        text = text[end + "</think>".len()..].trim_start();
    }

    if let Some(stripped) = text.strip_prefix("```json") {
        text = stripped;
    } else if let Some(stripped) = text.strip_prefix("```") {
        text = stripped;
    }
    if let Some(stripped) = text.trim_end().strip_suffix("```") {
        text = stripped;
    }
    text = text.trim();

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json_passes_through() {
        assert_eq!(extract_json(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_strips_thinking_block() {
        let raw = "<think>hmm, let me consider the task</think>\n{\"a\": 1}";
        assert_eq!(extract_json(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_strips_markdown_fences() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(raw), Some("{\"a\": 1}"));

        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extracts_object_from_surrounding_prose() {
        let raw = "Here is the analysis you asked for:\n{\"a\": {\"b\": 2}}\nHope that helps!";
        assert_eq!(extract_json(raw), Some(r#"{"a": {"b": 2}}"#));
    }

    #[test]
    fn test_garbage_yields_none() {
        assert_eq!(extract_json("I cannot help with that."), None);
        assert_eq!(extract_json(""), None);
        assert_eq!(extract_json("} backwards {"), None);
    }
}
