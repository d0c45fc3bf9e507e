//! Job-graph templating with simple `{{placeholder}}` substitution.
//!
//! Given a JSON `template` and an `inputs` object, recursively walks the
//! template and replaces any string values of the form `{{ key }}` with
//! `inputs[key]`, returning a constructed JSON value. Replacement keeps the
//! input's JSON type, so `"{{seed}}"` can become a number.
use serde_json::Value;
use crate::error::{AppResult, AppError};

#[derive(Debug, Default, Clone, Copy)]
pub struct PromptConstructor;

impl PromptConstructor {
    pub fn new() -> Self {
        PromptConstructor
    }

    /// Construct a job graph by substituting placeholders inside `template`
    /// with corresponding values from `inputs`.
    pub fn construct_prompt(&self, template: &Value, inputs: &Value) -> AppResult<Value> {
        self.validate_template(template)?;
        self.validate_inputs(inputs)?;

        let mut constructed = template.clone();
        self.replace_placeholders(&mut constructed, inputs)?;

        Ok(constructed)
    }

    /// A template must be a map of node id to `{class_type, inputs}`.
    fn validate_template(&self, template: &Value) -> AppResult<()> {
        let nodes = template
            .as_object()
            .ok_or_else(|| AppError::PromptConstruction("template must be a JSON object".to_string()))?;
        if nodes.is_empty() {
            return Err(AppError::PromptConstruction("template has no nodes".to_string()));
        }
        for (id, node) in nodes {
            if node.get("class_type").and_then(|v| v.as_str()).is_none() {
                return Err(AppError::PromptConstruction(format!("node '{}' has no class_type", id)));
            }
        }
        Ok(())
    }

    fn validate_inputs(&self, inputs: &Value) -> AppResult<()> {
        if inputs.is_object() {
            Ok(())
        } else {
            Err(AppError::PromptConstruction("inputs must be a JSON object".to_string()))
        }
    }

    /// Recursively replace `{{key}}` strings with `inputs[key]`.
    fn replace_placeholders(&self, value: &mut Value, inputs: &Value) -> AppResult<()> {
        match value {
            Value::Object(map) => {
                for (_, v) in map.iter_mut() {
                    self.replace_placeholders(v, inputs)?;
                }
            }
            Value::Array(arr) => {
                for v in arr.iter_mut() {
                    self.replace_placeholders(v, inputs)?;
                }
            }
            Value::String(s) => {
                if s.starts_with("{{") && s.ends_with("}}") {
                    let key = s.trim_start_matches("{{").trim_end_matches("}}").trim();
                    if let Some(replacement) = inputs.get(key) {
                        *value = replacement.clone();
                    } else {
                        return Err(AppError::PromptConstruction(format!("Missing input for placeholder: {}", key)));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}
