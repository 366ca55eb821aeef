//! Shared fixtures for integration tests
#![allow(dead_code)]

use paramforge::llm::{MockResponse, MockTextGenerator};
use paramforge::pipeline::{OperatorInput, PipelineOrchestrator, PipelineSettings};
use paramforge::retrieval::{Exemplar, ExemplarStore};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub const BLOCK_INSTRUCTION: &str = "Make a rectangular block 50x30x20mm";

/// A well-formed edit object
pub fn edit(parameter: &str, new_value: f64, confidence: f64) -> Value {
    json!({
        "part": "block",
        "feature": "Extrude1",
        "parameter": parameter,
        "new_value": new_value,
        "unit": "mm",
        "confidence": confidence,
    })
}

/// Conversion output for the 50x30x20mm block, wrapped the way models do
pub fn block_conversion_response() -> String {
    let records = json!([
        edit("Length", 50.0, 0.95),
        edit("Width", 30.0, 0.95),
        edit("Height", 20.0, 0.9),
    ]);
    format!(
        "Here are the edits:\n```json\n{}\n```\nLet me know if you need anything else.",
        serde_json::to_string_pretty(&records).unwrap()
    )
}

pub fn generated_script() -> &'static str {
    "```python\nimport adsk.core, adsk.fusion, traceback\n\n\
     def run(context):\n    app = adsk.core.Application.get()\n    \
     design = adsk.fusion.Design.cast(app.activeProduct)\n```"
}

pub fn sample_exemplars() -> Vec<Exemplar> {
    vec![
        Exemplar::new("box-01", "def run(context):\n    pass\n")
            .with_title("Simple box")
            .with_category("solids")
            .with_tags(["extrude", "block"])
            .with_parameter("length", json!(50))
            .with_distance(0.12),
        Exemplar::new("cyl-02", "def run(context):\n    pass\n")
            .with_title("Cylinder")
            .with_category("solids")
            .with_distance(0.48),
    ]
}

pub fn scripted_generator(responses: Vec<MockResponse>) -> Arc<MockTextGenerator> {
    let generator = Arc::new(MockTextGenerator::new());
    generator.add_responses(responses);
    generator
}

pub fn orchestrator(
    generator: Arc<MockTextGenerator>,
    store: Arc<dyn ExemplarStore>,
    operator: Arc<dyn OperatorInput>,
) -> PipelineOrchestrator {
    let settings = PipelineSettings {
        operator_timeout: Duration::from_secs(5),
        ..PipelineSettings::default()
    };
    PipelineOrchestrator::new(generator, store, operator).with_settings(settings)
}
