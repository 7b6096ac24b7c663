//! Document templates the planner may use.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    /// Name the planner refers to, e.g. `report_template.docx`
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub description: String,
    /// Top-level keys the document data must carry
    #[serde(default)]
    pub required_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateCatalog {
    #[serde(default, rename = "template")]
    pub templates: Vec<TemplateInfo>,
}

impl TemplateCatalog {
    /// Parse a catalog from a TOML file of `[[template]]` tables.
    /// Relative template paths resolve against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut catalog = Self::from_str(&content)?;
        if let Some(base) = path.parent() {
            for template in &mut catalog.templates {
                if template.path.is_relative() {
                    template.path = base.join(&template.path);
                }
            }
        }
        Ok(catalog)
    }

    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse template catalog: {}", e)))
    }

    /// Sales report and invoice templates under `templates/`.
    pub fn builtin() -> Self {
        let field = |s: &str| s.to_string();
        Self {
            templates: vec![
                TemplateInfo {
                    name: field("report_template.docx"),
                    path: PathBuf::from("templates/report_template.docx"),
                    description: field(
                        "Template fields:\n\
                         - date: string (e.g., 2025-08-24)\n\
                         - region: string (e.g., West)\n\
                         - sales: number (total sales amount)\n\
                         - items: list of objects with fields:\n\
                         \x20   - name: string\n\
                         \x20   - units: integer\n\
                         \x20   - revenue: number",
                    ),
                    required_keys: ["date", "region", "sales", "items"].map(field).to_vec(),
                },
                TemplateInfo {
                    name: field("invoice_template.docx"),
                    path: PathBuf::from("templates/invoice_template.docx"),
                    description: field(
                        "Template fields:\n\
                         - invoice_number: string\n\
                         - date: string\n\
                         - customer_name: string\n\
                         - items: list of objects with:\n\
                         \x20   - description: string\n\
                         \x20   - quantity: integer\n\
                         \x20   - price: number\n\
                         - total: number",
                    ),
                    required_keys: ["invoice_number", "date", "customer_name", "items", "total"]
                        .map(field)
                        .to_vec(),
                },
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&TemplateInfo> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// First template; used when a generate step names none.
    pub fn default_template(&self) -> Option<&TemplateInfo> {
        self.templates.first()
    }

    /// Catalog template by name or configured path. Anything else is
    /// rejected so a plan cannot point generation at arbitrary files.
    pub fn resolve(&self, name: Option<&str>) -> Result<TemplateInfo> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => self
                .default_template()
                .cloned()
                .ok_or_else(|| Error::config("No document templates configured")),
            Some(name) => self
                .get(name)
                .or_else(|| self.templates.iter().find(|t| t.path == Path::new(name)))
                .cloned()
                .ok_or_else(|| Error::validation(format!("Unknown template: {}", name))),
        }
    }

    /// `Template '<name>':\n<description>` blocks for the planner prompt.
    pub fn describe(&self) -> String {
        self.templates
            .iter()
            .map(|t| format!("Template '{}':\n{}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
