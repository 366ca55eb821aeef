//! Balanced-span JSON extraction from free text
//!
//! Model output routinely wraps JSON in prose, emits several objects back to
//! back, or truncates a block halfway. The scanner walks the text once per
//! candidate start, tracking bracket nesting and string escapes, and hands each
//! balanced span to `serde_json` independently. A span that does not parse is
//! skipped, and scanning resumes just after its opening bracket so a valid
//! block nested in or adjacent to garbage is still recovered.

use serde_json::Value;
use tracing::{debug, warn};

/// Returns the byte length of the balanced `{...}` / `[...]` span starting at
/// `start`, or `None` if the brackets never balance or are mismatched.
fn balanced_span_len(text: &str, start: usize) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// Finds every balanced span that parses as JSON, in text order.
pub fn find_json_blocks(text: &str) -> Vec<Value> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let Some(rel) = text[cursor..].find(|c| c == '{' || c == '[') else {
            break;
        };
        let start = cursor + rel;

        match balanced_span_len(text, start) {
            Some(len) => {
                let span = &text[start..start + len];
                match serde_json::from_str::<Value>(span) {
                    Ok(value) => {
                        blocks.push(value);
                        cursor = start + len;
                    }
                    Err(e) => {
                        debug!(
                            "Skipping unparseable span at byte {}: {} ({})",
                            start,
                            span.chars().take(60).collect::<String>(),
                            e
                        );
                        cursor = start + 1;
                    }
                }
            }
            None => cursor = start + 1,
        }
    }

    blocks
}

/// Extracts candidate edit objects from normalized model output.
///
/// Objects contribute themselves; arrays contribute each element, in order.
/// Scalars at the top level are ignored. An empty result is logged, never
/// raised.
pub fn extract_candidates(normalized: &str) -> Vec<Value> {
    let mut candidates = Vec::new();

    for block in find_json_blocks(normalized) {
        match block {
            Value::Array(items) => candidates.extend(items),
            Value::Object(_) => candidates.push(block),
            other => debug!("Ignoring non-container JSON value: {}", other),
        }
    }

    if candidates.is_empty() {
        warn!(
            "No parseable JSON found in response ({} chars)",
            normalized.len()
        );
    } else {
        debug!("Extracted {} candidate(s)", candidates.len());
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_object_in_prose() {
        let text = r#"Sure! {"part": "block", "unit": "mm"} Hope that helps."#;
        let result = extract_candidates(text);
        assert_eq!(result, vec![json!({"part": "block", "unit": "mm"})]);
    }

    #[test]
    fn test_array_is_flattened_in_order() {
        let text = r#"[{"n": 1}, {"n": 2}, {"n": 3}]"#;
        let result = extract_candidates(text);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0]["n"], 1);
        assert_eq!(result[2]["n"], 3);
    }

    #[test]
    fn test_objects_and_arrays_share_one_ordered_list() {
        let text = r#"{"n": 0} then [{"n": 1}, {"n": 2}] and {"n": 3}"#;
        let ns: Vec<i64> = extract_candidates(text)
            .iter()
            .map(|v| v["n"].as_i64().unwrap())
            .collect();
        assert_eq!(ns, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_valid_block_next_to_malformed_fragment() {
        let text = r#"{"part": "block", oops} {"part": "cylinder"}"#;
        let result = extract_candidates(text);
        assert_eq!(result, vec![json!({"part": "cylinder"})]);
    }

    #[test]
    fn test_valid_object_inside_broken_array() {
        let text = r#"[{"part": "block"}, {"part": ]"#;
        let result = extract_candidates(text);
        assert_eq!(result, vec![json!({"part": "block"})]);
    }

    #[test]
    fn test_truncated_block_is_skipped() {
        let text = r#"{"part": "block"} {"part": "cyl"#;
        assert_eq!(extract_candidates(text).len(), 1);
    }

    #[test]
    fn test_braces_inside_strings_do_not_split_spans() {
        let text = r#"{"part": "odd } name", "note": "has \" quote {"}"#;
        let result = extract_candidates(text);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["part"], "odd } name");
    }

    #[test]
    fn test_nested_values_stay_inside_their_record() {
        let text = r#"{"part": "block", "meta": {"source": "x"}}"#;
        let result = extract_candidates(text);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["meta"]["source"], "x");
    }

    #[test]
    fn test_no_json_gives_empty_list() {
        assert!(extract_candidates("nothing structured here").is_empty());
        assert!(extract_candidates("").is_empty());
        assert!(extract_candidates("[see manual]").is_empty());
    }

    #[test]
    fn test_multibyte_text_around_blocks() {
        let text = "✅ résultat: {\"part\": \"bloc\"} ✔";
        assert_eq!(extract_candidates(text), vec![json!({"part": "bloc"})]);
    }
}
