//! Prompt building and post-processing around the text-generation calls

pub mod prompt;
pub mod refine;

pub use prompt::{code_prompt, conversion_prompt, task_summary, CAD_UNIT_SCALE};
pub use refine::{refine, strip_fences, GeneratedArtifact, IMPORT_PREAMBLE};
