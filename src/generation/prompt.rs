//! Prompt construction for the conversion and code-generation calls

use crate::edit::{EditBatch, EditValue};

/// Dimensions reach the CAD host in centimetres; records carry millimetres.
pub const CAD_UNIT_SCALE: f64 = 10.0;

const INSTRUCTION_SLOT: &str = "{instruction}";

const CONVERSION_TEMPLATE: &str = r#"You are an assistant that converts CAD instructions into structured JSON.
IMPORTANT: For multi-dimensional objects (like "50x40x20"), you MUST output multiple JSON objects - one for each dimension.

Use ONLY this schema:

{
  "part": "<string>",
  "feature": "<see allowed features below>",
  "parameter": "<Length, Width, Diameter, etc.>",
  "new_value": <numeric_value>,
  "unit": "mm",
  "confidence": <float between 0 and 1>
}

For a relative change ("make it 5mm longer"), use "delta" with a signed number instead of "new_value". Never output both.
If the instruction cannot be converted, output {"error": "<reason>"}.

For instructions with multiple dimensions (like "50x40x20"), output an ARRAY of JSON objects:
[
  {"part": "block", "feature": "Extrude1", "parameter": "Length", "new_value": 50, "unit": "mm", "confidence": 0.95},
  {"part": "block", "feature": "Extrude1", "parameter": "Width", "new_value": 40, "unit": "mm", "confidence": 0.95},
  {"part": "block", "feature": "Extrude1", "parameter": "Height", "new_value": 20, "unit": "mm", "confidence": 0.95}
]

PART AND FEATURE MAPPING:
- "cylinder", "tube", "pipe", "rod", "shaft" -> part "cylinder", feature "Extrude1"
- "block", "box", "cube", "rectangle", "rectangular" -> part "block", feature "Extrude1"
- "hollow cylinder", "tube", "pipe" -> part "hollow cylinder", feature "Extrude1"
- "sphere", "ball" -> part "sphere", feature "Revolve1"

DIMENSION MAPPING FOR BLOCKS:
- First number (50 in "50x40x20") = Length
- Second number (40 in "50x40x20") = Width
- Third number (20 in "50x40x20") = Height

RULES:
- Single dimension: output a single JSON object
- Multiple dimensions (XxYxZ): output an ARRAY, one object per dimension
- "parameter" must be: Length, Width, Height, Diameter, Radius, Thickness, or Angle
- "confidence" is a float between 0 and 1
- "feature" must be one of: {features}
- "new_value" and "delta" must be numbers
- "unit" must be "mm"

EXAMPLES:

Instruction: "Change the cylinder diameter to 35 mm."
Output:
{"part": "cylinder", "feature": "Extrude1", "parameter": "Diameter", "new_value": 35, "unit": "mm", "confidence": 0.95}

Instruction: "Make a rectangular block 50x30x20mm."
Output:
[
  {"part": "block", "feature": "Extrude1", "parameter": "Length", "new_value": 50, "unit": "mm", "confidence": 0.95},
  {"part": "block", "feature": "Extrude1", "parameter": "Width", "new_value": 30, "unit": "mm", "confidence": 0.95},
  {"part": "block", "feature": "Extrude1", "parameter": "Height", "new_value": 20, "unit": "mm", "confidence": 0.95}
]

Instruction: "Make a cylinder diameter 40mm height 60mm."
Output:
[
  {"part": "cylinder", "feature": "Extrude1", "parameter": "Diameter", "new_value": 40, "unit": "mm", "confidence": 0.92},
  {"part": "cylinder", "feature": "Extrude1", "parameter": "Height", "new_value": 60, "unit": "mm", "confidence": 0.92}
]

Instruction: "{instruction}"
Output:
"#;

/// Builds the prompt asking the model to turn an instruction into edit records.
pub fn conversion_prompt(instruction: &str) -> String {
    let features = crate::edit::FeatureKind::all_ids().join(", ");
    CONVERSION_TEMPLATE
        .replace("{features}", &features)
        .replace(INSTRUCTION_SLOT, instruction.trim())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let text = format!("{:.4}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// One-line summary of what the batch asks for, e.g.
/// `Create block with Length: 50mm, Width: 30mm`.
pub fn task_summary(batch: &EditBatch) -> String {
    let main_part = match batch.first().part.trim() {
        "" => "object",
        part => part,
    };

    let changes: Vec<String> = batch
        .iter()
        .map(|record| match record.value {
            EditValue::NewValue(v) => {
                format!("{}: {}{}", record.parameter, format_number(v), record.unit)
            }
            EditValue::Delta(d) => format!(
                "{}: change by {}{}{}",
                record.parameter,
                if d >= 0.0 { "+" } else { "" },
                format_number(d),
                record.unit
            ),
        })
        .collect();

    format!("Create {} with {}", main_part, changes.join(", "))
}

/// Dimension lines in host units, one per distinct parameter.
///
/// A parameter named twice keeps its first position and its last value.
pub fn scaled_dimensions(batch: &EditBatch) -> Vec<(String, String)> {
    let mut dimensions: Vec<(String, String)> = Vec::new();

    for record in batch.iter() {
        let key = record.parameter.trim().to_lowercase();
        let scaled = format_number(record.value.amount() / CAD_UNIT_SCALE);
        let rendered = if record.value.is_delta() {
            format!("change by {}", scaled)
        } else {
            scaled
        };

        match dimensions.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = rendered,
            None => dimensions.push((key, rendered)),
        }
    }

    dimensions
}

/// Builds the code-generation prompt from the whole batch and the
/// retrieval context.
pub fn code_prompt(batch: &EditBatch, context: &str) -> String {
    let dimensions: Vec<String> = scaled_dimensions(batch)
        .into_iter()
        .map(|(name, value)| format!("- {}: {}", name, value))
        .collect();

    format!(
        "Generate Fusion 360 Python code for this task:\n\
         \n\
         TASK: {summary}\n\
         \n\
         DIMENSIONS TO USE (ALREADY DIVIDED BY 10 FOR FUSION SCALING):\n\
         {dimensions}\n\
         \n\
         CRITICAL REQUIREMENTS:\n\
         - Use the EXACT values specified above (already scaled for Fusion)\n\
         - Do NOT ask user for any input - use hardcoded values\n\
         - Do NOT include any unit conversion code\n\
         - Do NOT set units manager or defaultLengthUnits\n\
         \n\
         EXAMPLES FROM DATABASE:\n\
         {context}\n\
         \n\
         Generate working Fusion 360 Python code with:\n\
         - import adsk.core, adsk.fusion, traceback\n\
         - def run(context): with try/except\n\
         - def stop(context): pass\n\
         - NO units management code\n\
         - Use the exact scaled values shown above\n\
         - Create complete geometry as specified\n\
         \n\
         Code only, no explanations:",
        summary = task_summary(batch),
        dimensions = dimensions.join("\n"),
        context = context,
    )
}
