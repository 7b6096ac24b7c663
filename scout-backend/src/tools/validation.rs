use crate::error::{Error, Result};
use jsonschema::Validator;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Validates tool arguments against the tool's JSON Schema.
///
/// Only declared properties survive validation. A schema without
/// `properties` passes the argument object through untouched.
pub struct ParamValidator {
    tool: String,
    validator: Validator,
    declared: Option<HashSet<String>>,
}

impl ParamValidator {
    pub fn new(tool: &str, schema: &Value) -> Result<Self> {
        if !schema.is_object() {
            return Err(Error::tool_spec(format!(
                "{}: parameters must be a JSON Schema object",
                tool
            )));
        }
        let validator = jsonschema::validator_for(schema).map_err(|e| {
            Error::tool_spec(format!("{}: invalid parameter schema: {}", tool, e))
        })?;
        let declared = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect());

        Ok(Self {
            tool: tool.to_string(),
            validator,
            declared,
        })
    }

    pub fn validate(&self, args: Value) -> Result<Value> {
        let object = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(Error::validation(format!(
                    "Invalid arguments for tool '{}': expected a JSON object, got {}",
                    self.tool,
                    json_type(&other)
                )));
            }
        };

        let filtered: Map<String, Value> = match &self.declared {
            Some(declared) => object
                .into_iter()
                .filter(|(k, _)| declared.contains(k))
                .collect(),
            None => object,
        };
        let instance = Value::Object(filtered);

        let problems: Vec<String> = self
            .validator
            .iter_errors(&instance)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{} at {}", e, path)
                }
            })
            .collect();

        if !problems.is_empty() {
            return Err(Error::validation(format!(
                "Invalid arguments for tool '{}': {}",
                self.tool,
                problems.join("; ")
            )));
        }

        Ok(instance)
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
