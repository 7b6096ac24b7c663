use crate::ai::strip_code_fences;
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const DEFAULT_WATERMARK: &str = "CONFIDENTIAL";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanStep {
    Generate {
        template: Option<String>,
    },
    InsertImage {
        image_path: Option<String>,
        position: Option<Value>,
        size: Option<Value>,
    },
    Merge {
        pdfs: Vec<PathBuf>,
    },
    Watermark {
        text: String,
    },
    Compress,
}

impl PlanStep {
    pub fn action(&self) -> &'static str {
        match self {
            PlanStep::Generate { .. } => "generate",
            PlanStep::InsertImage { .. } => "insert_image",
            PlanStep::Merge { .. } => "merge",
            PlanStep::Watermark { .. } => "watermark",
            PlanStep::Compress => "compress",
        }
    }

    /// Read one step. Fields may sit next to `action` or inside a
    /// `parameters` object.
    fn from_value(index: usize, value: &Value) -> Result<Self> {
        let Value::Object(step) = value else {
            return Err(Error::validation(format!("Step {} is not an object", index)));
        };
        let mut fields: Map<String, Value> = match step.get("parameters") {
            Some(Value::Object(params)) => params.clone(),
            _ => Map::new(),
        };
        for (k, v) in step {
            if k != "parameters" {
                fields.insert(k.clone(), v.clone());
            }
        }
        let text = |key: &str| fields.get(key).and_then(|v| v.as_str()).map(String::from);

        let action = text("action").unwrap_or_default();
        let step = match action.trim().to_lowercase().as_str() {
            "generate" => PlanStep::Generate {
                template: text("template"),
            },
            "insert_image" => PlanStep::InsertImage {
                image_path: text("image_path"),
                position: fields.get("position").cloned(),
                size: fields.get("size").cloned(),
            },
            "merge" => PlanStep::Merge {
                pdfs: fields
                    .get("pdfs")
                    .and_then(|v| v.as_array())
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|p| p.as_str())
                            .map(PathBuf::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            "watermark" => PlanStep::Watermark {
                text: text("text")
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_WATERMARK.to_string()),
            },
            "compress" => PlanStep::Compress,
            _ => return Err(Error::validation(format!("Unknown action: {}", action))),
        };
        Ok(step)
    }
}

/// Parse planner output: `{"steps": [...]}` or a bare array, optionally fenced.
pub fn parse_plan(text: &str) -> Result<Vec<PlanStep>> {
    let value: Value = serde_json::from_str(&strip_code_fences(text))
        .map_err(|e| Error::validation(format!("Plan is not valid JSON: {}", e)))?;
    let steps = match &value {
        Value::Array(steps) => steps,
        Value::Object(map) => match map.get("steps") {
            Some(Value::Array(steps)) => steps,
            _ => return Err(Error::validation("Plan has no 'steps' list")),
        },
        _ => return Err(Error::validation("Plan must be a JSON array or object")),
    };
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| PlanStep::from_value(i, step))
        .collect()
}

/// Reject plans that touch a PDF before one exists.
pub fn check_order(steps: &[PlanStep]) -> Result<()> {
    let mut have_pdf = false;
    for step in steps {
        match step {
            PlanStep::Generate { .. } => have_pdf = true,
            PlanStep::Merge { .. } if !have_pdf => {
                return Err(Error::validation("PDF must be generated before merging"));
            }
            PlanStep::InsertImage { .. } if !have_pdf => {
                return Err(Error::validation("PDF must be generated before inserting images"));
            }
            PlanStep::Watermark { .. } if !have_pdf => {
                return Err(Error::validation("PDF must be generated before watermarking"));
            }
            PlanStep::Compress if !have_pdf => {
                return Err(Error::validation("PDF must be generated before compressing"));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps_object_with_defaults() {
        let plan = parse_plan(
            r#"{"steps": [
                {"action": "generate", "template": "report_template.docx"},
                {"action": "insert_image", "parameters": {"image_path": "logo.png", "position": [100, 200]}},
                {"action": "watermark"},
                {"action": "Compress"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            plan[0],
            PlanStep::Generate {
                template: Some("report_template.docx".into())
            }
        );
        match &plan[1] {
            PlanStep::InsertImage { image_path, position, size } => {
                assert_eq!(image_path.as_deref(), Some("logo.png"));
                assert_eq!(position.as_ref().unwrap()[1], 200);
                assert!(size.is_none());
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(plan[2], PlanStep::Watermark { text: "CONFIDENTIAL".into() });
        assert_eq!(plan[3], PlanStep::Compress);
        assert!(check_order(&plan).is_ok());
    }

    #[test]
    fn accepts_fenced_bare_array() {
        let plan = parse_plan("```json\n[{\"action\": \"merge\", \"pdfs\": [\"a.pdf\", \"b.pdf\"]}]\n```").unwrap();
        assert_eq!(
            plan,
            vec![PlanStep::Merge {
                pdfs: vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]
            }]
        );
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = parse_plan(r#"[{"action": "shred"}]"#).unwrap_err();
        assert_eq!(err.to_string(), "validation error: Unknown action: shred");
        assert!(parse_plan("not json").is_err());
        assert!(parse_plan(r#"{"plan": []}"#).is_err());
    }

    #[test]
    fn order_requires_a_pdf_first() {
        let err = check_order(&[PlanStep::Watermark { text: "X".into() }]).unwrap_err();
        assert!(err.to_string().contains("PDF must be generated before watermarking"));
        let err = check_order(&[PlanStep::Compress]).unwrap_err();
        assert!(err.to_string().contains("before compressing"));
        let err = check_order(&[PlanStep::Merge { pdfs: vec![PathBuf::from("a.pdf")] }]).unwrap_err();
        assert!(err.to_string().contains("before merging"));
        assert!(check_order(&[
            PlanStep::Generate { template: None },
            PlanStep::Merge { pdfs: vec![] },
            PlanStep::Compress
        ])
        .is_ok());
    }
}
