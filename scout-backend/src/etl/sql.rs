use super::intent::is_sql;
use crate::ai::{strip_code_fences, ChatModel, Message};
use crate::error::{Error, Result};
use scout_types::ColumnInfo;
use std::sync::Arc;

/// Turns a natural-language request into one SQLite `SELECT`.
pub struct SqlGenerator {
    model: Arc<dyn ChatModel>,
}

impl SqlGenerator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    fn schema_text(tables: &[String], table: &str, columns: &[ColumnInfo]) -> String {
        let cols: Vec<String> = columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.column_type))
            .collect();
        format!(
            "Tables: {}\nSchema for {}: {}",
            tables.join(", "),
            table,
            cols.join(", ")
        )
    }

    pub async fn generate(
        &self,
        request: &str,
        tables: &[String],
        table: &str,
        columns: &[ColumnInfo],
    ) -> Result<String> {
        let system = format!(
            "Generate exactly one valid SQLite SELECT that answers the user request.\n\
             Use only the table {} and its columns.\n\
             - No commentary or code fences; return SQL only.",
            table
        );
        let prompt = format!(
            "{}\nUser request: {}\nSQL:",
            Self::schema_text(tables, table, columns),
            request
        );
        let answer = self
            .model
            .generate_text(vec![Message::system(system), Message::user(prompt)])
            .await?;
        let sql = strip_code_fences(&answer);
        if !is_sql(&sql) {
            return Err(Error::validation(format!("Model did not return a SELECT: {}", sql)));
        }
        log::debug!("[ETL] {} generated: {}", self.model.model_name(), sql);
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedModel;

    fn columns() -> Vec<ColumnInfo> {
        vec![ColumnInfo {
            cid: 0,
            name: "status".into(),
            column_type: "TEXT".into(),
            notnull: false,
            dflt_value: None,
            pk: false,
        }]
    }

    #[tokio::test]
    async fn strips_fences_and_includes_schema() {
        let model = Arc::new(ScriptedModel::texts(&["```sql\nSELECT count(*) FROM t_ab12cd34\n```"]));
        let generator = SqlGenerator::new(model.clone());
        let sql = generator
            .generate("how many?", &["t_ab12cd34".into()], "t_ab12cd34", &columns())
            .await
            .unwrap();
        assert_eq!(sql, "SELECT count(*) FROM t_ab12cd34");
        let seen = model.seen.lock();
        assert!(seen[0][1].content.contains("Schema for t_ab12cd34: status TEXT"));
    }

    #[tokio::test]
    async fn rejects_non_select_answers() {
        let generator = SqlGenerator::new(Arc::new(ScriptedModel::texts(&["I cannot answer that"])));
        let err = generator
            .generate("drop it", &[], "t_x", &columns())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("did not return a SELECT"));
    }
}
