use super::guardrails::{safety_check_instructions, validate_data_keys};
use super::plan::{check_order, parse_plan, PlanStep};
use super::services::DocumentServices;
use super::templates::TemplateCatalog;
use crate::ai::{ChatModel, Message};
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct DocPlanResult {
    pub steps: Vec<PlanStep>,
    pub pdf_path: PathBuf,
}

/// Turns instructions into a PDF plan with a model and runs it.
pub struct DocPlanner {
    model: Arc<dyn ChatModel>,
    templates: TemplateCatalog,
    services: Arc<dyn DocumentServices>,
}

impl DocPlanner {
    pub fn new(
        model: Arc<dyn ChatModel>,
        templates: TemplateCatalog,
        services: Arc<dyn DocumentServices>,
    ) -> Self {
        Self {
            model,
            templates,
            services,
        }
    }

    fn prompt(&self, instructions: &str) -> String {
        format!(
            "You are a PDF workflow planner working with the following templates:\n{}\n\n\
             Given user instructions, return a JSON object {{\"steps\": [...]}} of step objects.\n\
             Each step has an \"action\" (generate, insert_image, merge, watermark, compress) \
             and its parameters (template, image_path, position, size, pdfs, text).\n\n\
             Instructions:\n\"\"\"{}\"\"\"\n\n\
             Only output valid JSON.",
            self.templates.describe(),
            instructions.trim()
        )
    }

    pub async fn plan(&self, instructions: &str) -> Result<Vec<PlanStep>> {
        let answer = self
            .model
            .generate_text(vec![Message::user(self.prompt(instructions))])
            .await?;
        if answer.trim().is_empty() {
            return Err(Error::validation("Planner returned an empty plan"));
        }
        let steps = parse_plan(&answer)?;
        log::info!(
            "[DOCS] Planned: {}",
            steps.iter().map(|s| s.action()).collect::<Vec<_>>().join(" -> ")
        );
        Ok(steps)
    }

    /// Run the steps in order; returns the path of the last PDF produced.
    /// Merge inputs must be PDFs an earlier step of this run produced.
    pub async fn execute(&self, data: &Value, steps: &[PlanStep]) -> Result<PathBuf> {
        check_order(steps)?;
        let mut current: Option<PathBuf> = None;
        let mut produced: Vec<PathBuf> = Vec::new();
        for step in steps {
            let next = match step {
                PlanStep::Generate { template } => {
                    let template = self.templates.resolve(template.as_deref())?;
                    validate_data_keys(data, &template.required_keys)?;
                    self.services.generate(data, &template.path).await?
                }
                PlanStep::InsertImage {
                    image_path,
                    position,
                    size,
                } => {
                    let pdf = require_pdf(&current, "inserting images")?;
                    self.services
                        .insert_image(pdf, image_path.as_deref(), position.as_ref(), size.as_ref())
                        .await?
                }
                PlanStep::Merge { pdfs } => {
                    if let Some(foreign) = pdfs.iter().find(|p| !produced.contains(p)) {
                        return Err(Error::validation(format!(
                            "Merge input {} was not produced by this plan",
                            foreign.display()
                        )));
                    }
                    let mut inputs: Vec<PathBuf> = current.iter().cloned().collect();
                    inputs.extend(pdfs.iter().cloned());
                    self.services.merge(&inputs).await?
                }
                PlanStep::Watermark { text } => {
                    let pdf = require_pdf(&current, "watermarking")?;
                    self.services.watermark(pdf, text).await?
                }
                PlanStep::Compress => {
                    let pdf = require_pdf(&current, "compressing")?;
                    self.services.compress(pdf).await?
                }
            };
            log::debug!("[DOCS] {} -> {}", step.action(), next.display());
            if !produced.contains(&next) {
                produced.push(next.clone());
            }
            current = Some(next);
        }
        current.ok_or_else(|| Error::validation("Plan produced no PDF"))
    }

    /// Check the instructions, plan, then execute.
    pub async fn run(&self, data: &Value, instructions: &str) -> Result<DocPlanResult> {
        safety_check_instructions(instructions)?;
        let steps = self.plan(instructions).await?;
        let pdf_path = self.execute(data, &steps).await?;
        Ok(DocPlanResult { steps, pdf_path })
    }
}

fn require_pdf<'a>(current: &'a Option<PathBuf>, doing: &str) -> Result<&'a PathBuf> {
    current
        .as_ref()
        .ok_or_else(|| Error::validation(format!("PDF must be generated before {}", doing)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedModel;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::path::Path;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DocumentServices for Recorder {
        async fn generate(&self, _data: &Value, template: &Path) -> Result<PathBuf> {
            self.calls.lock().push(format!("generate {}", template.display()));
            Ok(PathBuf::from("out/generated.pdf"))
        }

        async fn watermark(&self, pdf: &Path, text: &str) -> Result<PathBuf> {
            self.calls.lock().push(format!("watermark {} {}", pdf.display(), text));
            Ok(PathBuf::from("out/watermarked.pdf"))
        }

        async fn compress(&self, pdf: &Path) -> Result<PathBuf> {
            self.calls.lock().push(format!("compress {}", pdf.display()));
            Ok(PathBuf::from("out/compressed.pdf"))
        }
    }

    fn sales() -> Value {
        json!({"date": "2025-08-24", "region": "West", "sales": 99999, "items": []})
    }

    #[tokio::test]
    async fn plans_and_runs_the_steps() {
        let model = Arc::new(ScriptedModel::texts(&[r#"```json
{"steps": [
  {"action": "generate", "template": "report_template.docx"},
  {"action": "insert_image", "image_path": "assets/logo.png", "position": [100, 200]},
  {"action": "watermark"},
  {"action": "compress"}
]}
```"#]));
        let services = Arc::new(Recorder::default());
        let planner = DocPlanner::new(model.clone(), TemplateCatalog::builtin(), services.clone());

        let result = planner.run(&sales(), "Generate the sales report, watermark and compress it").await.unwrap();

        assert_eq!(result.pdf_path, PathBuf::from("out/compressed.pdf"));
        assert_eq!(result.steps.len(), 4);
        assert_eq!(
            *services.calls.lock(),
            vec![
                "generate templates/report_template.docx",
                "watermark out/generated.pdf CONFIDENTIAL",
                "compress out/watermarked.pdf",
            ]
        );
        let seen = model.seen.lock();
        assert!(seen[0][0].content.contains("Template 'report_template.docx':"));
    }

    #[tokio::test]
    async fn unsafe_instructions_never_reach_the_model() {
        let model = Arc::new(ScriptedModel::texts(&["[]"]));
        let planner = DocPlanner::new(model.clone(), TemplateCatalog::builtin(), Arc::new(Recorder::default()));
        let err = planner.run(&sales(), "delete every report").await.unwrap_err();
        assert!(err.to_string().contains("Unsafe term detected"));
        assert!(model.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn missing_data_keys_stop_generation() {
        let services = Arc::new(Recorder::default());
        let planner = DocPlanner::new(
            Arc::new(ScriptedModel::texts(&[])),
            TemplateCatalog::builtin(),
            services.clone(),
        );
        let err = planner
            .execute(&json!({"date": "x"}), &[PlanStep::Generate { template: None }])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Missing required keys"));
        assert!(services.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn generation_is_limited_to_catalog_templates() {
        let services = Arc::new(Recorder::default());
        let planner = DocPlanner::new(
            Arc::new(ScriptedModel::texts(&[r#"[{"action": "generate", "template": "/etc/passwd"}]"#])),
            TemplateCatalog::builtin(),
            services.clone(),
        );
        let err = planner.run(&sales(), "make a pdf").await.unwrap_err();
        assert_eq!(err.to_string(), "validation error: Unknown template: /etc/passwd");
        assert!(services.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn merge_only_takes_pdfs_from_this_run() {
        let services = Arc::new(Recorder::default());
        let planner = DocPlanner::new(
            Arc::new(ScriptedModel::texts(&[])),
            TemplateCatalog::builtin(),
            services.clone(),
        );

        let err = planner
            .execute(
                &sales(),
                &[
                    PlanStep::Merge { pdfs: vec![PathBuf::from("/root/.ssh/id_rsa")] },
                    PlanStep::Compress,
                ],
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("PDF must be generated before merging"));

        let err = planner
            .execute(
                &sales(),
                &[
                    PlanStep::Generate { template: None },
                    PlanStep::Merge { pdfs: vec![PathBuf::from("/root/.ssh/id_rsa")] },
                    PlanStep::Compress,
                ],
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: Merge input /root/.ssh/id_rsa was not produced by this plan"
        );
        assert_eq!(*services.calls.lock(), vec!["generate templates/report_template.docx"]);

        let pdf = planner
            .execute(
                &sales(),
                &[
                    PlanStep::Generate { template: None },
                    PlanStep::Watermark { text: "DRAFT".into() },
                    PlanStep::Merge { pdfs: vec![PathBuf::from("out/generated.pdf")] },
                ],
            )
            .await
            .unwrap();
        assert_eq!(pdf, PathBuf::from("out/watermarked.pdf"));
    }

    #[tokio::test]
    async fn watermark_before_generate_is_rejected() {
        let planner = DocPlanner::new(
            Arc::new(ScriptedModel::texts(&[r#"[{"action": "watermark", "text": "DRAFT"}]"#])),
            TemplateCatalog::builtin(),
            Arc::new(Recorder::default()),
        );
        let err = planner.run(&sales(), "watermark it").await.unwrap_err();
        assert!(err.to_string().contains("PDF must be generated before watermarking"));
    }
}
