//! Rendering of retrieved exemplars into prompt context

use crate::retrieval::store::Exemplar;
use serde_json::Value;
use std::fmt::Write;

/// Context text used when retrieval produced nothing
pub const NO_EXAMPLES_PLACEHOLDER: &str = "No relevant examples found.";

/// Default per-exemplar code bound, in characters
pub const DEFAULT_MAX_EXEMPLAR_CHARS: usize = 4000;

const TRUNCATION_MARKER: &str = "# ... (truncated)";

#[derive(Debug, Clone, Copy)]
pub struct RetrievalContextFormatter {
    max_examples: usize,
    max_code_chars: usize,
}

impl RetrievalContextFormatter {
    pub fn new(max_examples: usize, max_code_chars: usize) -> Self {
        Self {
            max_examples,
            max_code_chars,
        }
    }

    pub fn format(&self, exemplars: &[Exemplar]) -> String {
        let blocks: Vec<String> = exemplars
            .iter()
            .take(self.max_examples)
            .enumerate()
            .map(|(i, exemplar)| self.format_one(i + 1, exemplar))
            .collect();

        if blocks.is_empty() {
            NO_EXAMPLES_PLACEHOLDER.to_string()
        } else {
            blocks.join("\n")
        }
    }

    fn format_one(&self, number: usize, exemplar: &Exemplar) -> String {
        let mut block = String::new();
        let _ = writeln!(block, "Example {}:", number);
        let _ = writeln!(
            block,
            "Title: {}",
            exemplar.title.as_deref().unwrap_or("Unknown")
        );
        let _ = writeln!(
            block,
            "Description: {}",
            exemplar.description.as_deref().unwrap_or("No description")
        );
        let _ = writeln!(
            block,
            "Category: {}",
            exemplar.category.as_deref().unwrap_or("Unknown")
        );
        let _ = writeln!(block, "Tags: {}", render_tags(&exemplar.tags));
        let _ = writeln!(block, "Parameters: {}", render_parameters(exemplar));
        match exemplar.distance {
            Some(distance) => {
                let _ = writeln!(block, "Distance: {:.3}", distance);
            }
            None => {
                let _ = writeln!(block, "Distance: Unknown");
            }
        }
        let _ = writeln!(block);
        let _ = writeln!(block, "Code:");
        let _ = writeln!(block, "```python");
        let _ = writeln!(block, "{}", truncate_code(&exemplar.code, self.max_code_chars));
        let _ = writeln!(block, "```");
        block
    }
}

impl Default for RetrievalContextFormatter {
    fn default() -> Self {
        Self::new(5, DEFAULT_MAX_EXEMPLAR_CHARS)
    }
}

fn render_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        "No tags".to_string()
    } else {
        tags.join(", ")
    }
}

fn render_parameters(exemplar: &Exemplar) -> String {
    if exemplar.parameters.is_empty() {
        return "None".to_string();
    }
    let map: serde_json::Map<String, Value> = exemplar
        .parameters
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(map).to_string()
}

/// Cuts `code` to at most `max_chars` characters, never inside a char.
fn truncate_code(code: &str, max_chars: usize) -> String {
    let code = code.trim_end();
    match code.char_indices().nth(max_chars) {
        None => code.to_string(),
        Some((byte_index, _)) => format!("{}\n{}", &code[..byte_index], TRUNCATION_MARKER),
    }
}
