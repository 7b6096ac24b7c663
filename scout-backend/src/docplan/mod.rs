//! PDF workflows: a model plans generate/image/merge/watermark/compress
//! steps and document services carry them out.

pub mod guardrails;
pub mod plan;
pub mod planner;
pub mod services;
pub mod templates;

pub use guardrails::{safety_check_instructions, validate_data_keys};
pub use plan::{check_order, parse_plan, PlanStep, DEFAULT_WATERMARK};
pub use planner::{DocPlanResult, DocPlanner};
pub use services::{DocumentServices, HttpDocumentServices};
pub use templates::{TemplateCatalog, TemplateInfo};
