//! Structural normalization of generated add-in code
//!
//! The host loads a script by importing its API modules and calling
//! `run(context)`; it calls `stop(context)` on unload. Refinement guarantees
//! the import preamble and the teardown function are present, and strips any
//! markdown wrapping the model put around the code.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

pub const IMPORT_PREAMBLE: &str = "import adsk.core, adsk.fusion, traceback";
const IMPORT_MARKER: &str = "import adsk";
const PREAMBLE_WINDOW: usize = 5;

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"```(?:[A-Za-z0-9_+-]*[ \t]*\r?\n)?([\s\S]*?)(?:```|\z)")
            .expect("valid regex")
    })
}

fn entrypoint_regex() -> &'static Regex {
    static RUN: OnceLock<Regex> = OnceLock::new();
    RUN.get_or_init(|| Regex::new(r"(?m)^\s*def\s+run\s*\(").expect("valid regex"))
}

fn teardown_regex() -> &'static Regex {
    static STOP: OnceLock<Regex> = OnceLock::new();
    STOP.get_or_init(|| Regex::new(r"(?m)^\s*def\s+stop\s*\(").expect("valid regex"))
}

/// Refined code plus the structural facts about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    pub code: String,
    /// `def run(context)` is defined
    pub has_entrypoint: bool,
    /// `def stop(context)` is defined
    pub has_teardown: bool,
}

impl GeneratedArtifact {
    fn inspect(code: String) -> Self {
        Self {
            has_entrypoint: entrypoint_regex().is_match(&code),
            has_teardown: teardown_regex().is_match(&code),
            code,
        }
    }
}

/// Returns the body of the first fenced block, or the whole text when
/// there is none. An unclosed fence runs to the end of the text.
pub fn strip_fences(raw: &str) -> &str {
    match fence_regex().captures(raw).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str(),
        None => raw,
    }
}

/// Normalizes generated code. `refine(&refine(x).code) == refine(x)`.
pub fn refine(raw: &str) -> GeneratedArtifact {
    let body = strip_fences(raw).trim();
    let mut lines: Vec<&str> = body.lines().collect();

    let has_preamble = lines
        .iter()
        .take(PREAMBLE_WINDOW)
        .any(|line| line.contains(IMPORT_MARKER));
    if !has_preamble {
        debug!("Adding import preamble to generated code");
        lines.splice(0..0, [IMPORT_PREAMBLE, ""]);
    }

    let mut code = lines.join("\n");
    if !teardown_regex().is_match(&code) {
        debug!("Adding teardown function to generated code");
        code.push_str("\n\ndef stop(context):\n    pass");
    }

    let artifact = GeneratedArtifact::inspect(code);
    if !artifact.has_entrypoint {
        debug!("Generated code defines no run(context) entrypoint");
    }
    artifact
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "import adsk.core, adsk.fusion, traceback\n\n\
                        def run(context):\n    pass\n\n\
                        def stop(context):\n    pass";

    #[test]
    fn test_complete_code_unchanged() {
        let artifact = refine(FULL);
        assert_eq!(artifact.code, FULL);
        assert!(artifact.has_entrypoint);
        assert!(artifact.has_teardown);
    }

    #[test]
    fn test_fenced_block_extracted() {
        let raw = format!("Here is the code:\n```python\n{}\n```\nEnjoy!", FULL);
        assert_eq!(refine(&raw).code, FULL);
    }

    #[test]
    fn test_untagged_and_unclosed_fences() {
        assert_eq!(strip_fences("```\nx = 1\n```"), "x = 1\n");
        assert_eq!(strip_fences("intro\n```py\nx = 1\n"), "x = 1\n");
        assert_eq!(strip_fences("no fences"), "no fences");
    }

    #[test]
    fn test_only_first_block_taken() {
        let raw = "```python\nfirst = 1\n```\n```python\nsecond = 2\n```";
        let artifact = refine(raw);
        assert!(artifact.code.contains("first = 1"));
        assert!(!artifact.code.contains("second"));
    }

    #[test]
    fn test_missing_preamble_and_teardown_added() {
        let artifact = refine("def run(context):\n    ui = None");
        assert_eq!(
            artifact.code,
            "import adsk.core, adsk.fusion, traceback\n\n\
             def run(context):\n    ui = None\n\n\
             def stop(context):\n    pass"
        );
        assert!(artifact.has_entrypoint);
        assert!(artifact.has_teardown);
    }

    #[test]
    fn test_preamble_beyond_window_is_missing() {
        let raw = "a = 1\nb = 2\nc = 3\nd = 4\ne = 5\nimport adsk.core\n";
        let artifact = refine(raw);
        assert!(artifact.code.starts_with(IMPORT_PREAMBLE));
    }

    #[test]
    fn test_missing_entrypoint_flagged() {
        let artifact = refine("x = 1");
        assert!(!artifact.has_entrypoint);
        assert!(artifact.has_teardown);
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            "",
            "x = 1",
            FULL,
            "```python\ndef run(context):\n    pass\n```",
            "```\nunclosed",
            "   \n\n  def stop(context):\n    pass\n\n",
        ] {
            let once = refine(raw);
            let twice = refine(&once.code);
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }
}
