//! Markdown fence stripping for raw completion text

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Removes markdown JSON fence markers from a model response.
///
/// Removal repeats until nothing changes, so the result never contains a
/// fence marker and normalizing twice equals normalizing once.
pub fn normalize_response(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    loop {
        let stripped = text.replace(JSON_FENCE, "").replace(FENCE, "");
        let stripped = stripped.trim().to_string();
        if stripped == text {
            return text;
        }
        text = stripped;
    }
}
