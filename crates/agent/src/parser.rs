//! Turning raw model text into a [`ReactStep`].
//!
//! Parsing never fails: whatever the model says becomes a step, and a
//! response with no recognizable structure is treated as a final answer.

use aifoundation_core::agent::{FINAL_ACTION, ReactStep};
use serde_json::{Map, Value};

/// Strategy for reading one model response.
pub trait ResponseParser: Send + Sync {
    /// `step_number` is 1-based.
    fn parse(&self, response: &str, step_number: usize) -> ReactStep;
}

/// Action values that mean "no tool, this is the answer".
const FINAL_SENTINELS: [&str; 4] = ["none", "final", "finish", "final_answer"];

/// Reads `Thought:` / `Action:` / `Action Input:` lines.
///
/// - Only lines containing `:` are considered, split at the first colon.
/// - Keys are matched case-insensitively.
/// - The last `Thought` wins; without one the whole response is the thought.
/// - A missing `Action` line makes the step final.
/// - `Action Input` must be a JSON object, anything else becomes `{}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredParser;

impl ResponseParser for StructuredParser {
    fn parse(&self, response: &str, step_number: usize) -> ReactStep {
        let mut thought = String::new();
        let mut action = None;
        let mut action_input = None;
        let mut is_final = false;
        let mut saw_action = false;

        for line in response.trim().lines() {
            let Some((key, value)) = line.trim().split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "thought" => thought = value.to_string(),
                "action" => {
                    saw_action = true;
                    let name = value.to_lowercase();
                    if name.is_empty() || FINAL_SENTINELS.contains(&name.as_str()) {
                        is_final = true;
                        action = Some(FINAL_ACTION.to_string());
                    } else {
                        action = Some(name);
                    }
                }
                "action input" => action_input = Some(json_object(value)),
                _ => {}
            }
        }

        if thought.is_empty() {
            thought = response.trim().to_string();
        }

        if !saw_action {
            is_final = true;
            action = Some(FINAL_ACTION.to_string());
        }

        ReactStep {
            step_number,
            thought,
            action,
            action_input,
            observation: None,
            is_final,
        }
    }
}

fn json_object(raw: &str) -> Map<String, Value> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Finality markers recognized by [`KeywordParser`].
const FINALITY_MARKERS: [&str; 2] = ["final answer", "答案是"];

/// Treats the whole response as a thought and looks for a finality marker.
///
/// Never requests a tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordParser;

impl ResponseParser for KeywordParser {
    fn parse(&self, response: &str, step_number: usize) -> ReactStep {
        let thought = response.trim().to_string();
        let lowered = thought.to_lowercase();
        let is_final = FINALITY_MARKERS.iter().any(|m| lowered.contains(m));

        ReactStep {
            step_number,
            thought,
            action: None,
            action_input: None,
            observation: None,
            is_final,
        }
    }
}
