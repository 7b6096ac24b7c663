//! PDF generation and post-processing backends.

use crate::config::DocumentServicesConfig;
use crate::error::{Error, Result};
use crate::http::shared_client;
use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, RequestBuilder};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

#[async_trait]
pub trait DocumentServices: Send + Sync {
    /// Render `template` with `data` into a new PDF.
    async fn generate(&self, data: &Value, template: &Path) -> Result<PathBuf>;

    async fn watermark(&self, pdf: &Path, text: &str) -> Result<PathBuf>;

    async fn compress(&self, pdf: &Path) -> Result<PathBuf>;

    /// Not supported by the remote API; the PDF is returned unchanged.
    async fn insert_image(
        &self,
        pdf: &Path,
        image: Option<&str>,
        position: Option<&Value>,
        size: Option<&Value>,
    ) -> Result<PathBuf> {
        log::info!(
            "[DOCS] Image {} at {:?} size {:?} into {} (pass-through)",
            image.unwrap_or("<none>"),
            position,
            size,
            pdf.display()
        );
        Ok(pdf.to_path_buf())
    }

    /// Not supported by the remote API; the first PDF stands in for the merge.
    async fn merge(&self, pdfs: &[PathBuf]) -> Result<PathBuf> {
        log::info!("[DOCS] Merging {:?} (pass-through)", pdfs);
        pdfs.first()
            .cloned()
            .ok_or_else(|| Error::validation("merge needs at least one PDF"))
    }
}

/// Document generation and PDF services over HTTP, authenticated with
/// `client_id`/`client_secret` headers.
pub struct HttpDocumentServices {
    client: Client,
    config: DocumentServicesConfig,
}

impl HttpDocumentServices {
    pub fn new(config: DocumentServicesConfig) -> Self {
        Self {
            client: shared_client().clone(),
            config,
        }
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("client_id", &self.config.client_id)
            .header("client_secret", &self.config.client_secret)
    }

    fn pdf_services_url(&self, op: &str) -> Result<String> {
        let base = self.config.pdf_services_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(Error::config("FOXIT_PDF_SERVICES_URL is not configured"));
        }
        Ok(format!("{}/{}", base, op))
    }

    async fn write_output(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let path = self.config.output_dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        log::info!("[DOCS] Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    async fn upload(&self, op: &str, pdf: &Path, extra: Option<(&str, &str)>) -> Result<Vec<u8>> {
        let url = self.pdf_services_url(op)?;
        let bytes = tokio::fs::read(pdf).await?;
        let part = Part::bytes(bytes)
            .file_name("file.pdf")
            .mime_str("application/pdf")?;
        let mut form = Form::new().part("file", part);
        if let Some((key, value)) = extra {
            form = form.text(key.to_string(), value.to_string());
        }

        log::debug!("[DOCS] POST {}", url);
        let response = self.authed(self.client.post(&url)).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl DocumentServices for HttpDocumentServices {
    async fn generate(&self, data: &Value, template: &Path) -> Result<PathBuf> {
        if self.config.docgen_url.trim().is_empty() {
            return Err(Error::config("FOXIT_DOCGEN_URL is not configured"));
        }
        let engine = base64::engine::general_purpose::STANDARD;
        let template_bytes = tokio::fs::read(template).await.map_err(|e| {
            Error::not_found(format!("Template {} could not be read: {}", template.display(), e))
        })?;
        let payload = json!({
            "outputFormat": "pdf",
            "documentValues": data,
            "base64FileString": engine.encode(template_bytes),
        });

        let response = self
            .authed(self.client.post(&self.config.docgen_url))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        let body: Value = response.json().await?;
        let document = body
            .get("document")
            .and_then(|d| d.as_str())
            .ok_or_else(|| Error::validation("Document generation response has no 'document'"))?;
        let pdf = engine
            .decode(document)
            .map_err(|e| Error::validation(format!("Generated document is not base64: {}", e)))?;
        self.write_output("generated_report.pdf", &pdf).await
    }

    async fn watermark(&self, pdf: &Path, text: &str) -> Result<PathBuf> {
        let bytes = self.upload("watermark", pdf, Some(("text", text))).await?;
        self.write_output("watermarked_report.pdf", &bytes).await
    }

    async fn compress(&self, pdf: &Path) -> Result<PathBuf> {
        let bytes = self.upload("compress", pdf, None).await?;
        self.write_output("compressed_report.pdf", &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Bytes, http::HeaderMap, routing::post, Json, Router};

    async fn docgen(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        let engine = base64::engine::general_purpose::STANDARD;
        let template = engine.decode(body["base64FileString"].as_str().unwrap()).unwrap();
        let pdf = format!(
            "%PDF {} {} {}",
            headers.get("client_id").unwrap().to_str().unwrap(),
            String::from_utf8_lossy(&template),
            body["documentValues"]["region"].as_str().unwrap()
        );
        Json(json!({"document": engine.encode(pdf)}))
    }

    async fn echo_upload(body: Bytes) -> Vec<u8> {
        body.to_vec()
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/docgen", post(docgen))
            .route("/pdf/watermark", post(echo_upload))
            .route("/pdf/compress", post(|| async { "small" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn services(base: &str, out: &Path) -> HttpDocumentServices {
        HttpDocumentServices::new(DocumentServicesConfig {
            docgen_url: format!("{}/docgen", base),
            pdf_services_url: format!("{}/pdf/", base),
            client_id: "cid".into(),
            client_secret: "secret".into(),
            output_dir: out.to_path_buf(),
            templates_file: None,
        })
    }

    #[tokio::test]
    async fn generates_watermarks_and_compresses() {
        let base = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("t.docx");
        std::fs::write(&template, "TEMPLATE").unwrap();
        let svc = services(&base, &dir.path().join("out"));

        let pdf = svc.generate(&json!({"region": "West"}), &template).await.unwrap();
        assert_eq!(std::fs::read_to_string(&pdf).unwrap(), "%PDF cid TEMPLATE West");

        let marked = svc.watermark(&pdf, "CONFIDENTIAL").await.unwrap();
        let uploaded = std::fs::read_to_string(&marked).unwrap();
        assert!(uploaded.contains("filename=\"file.pdf\""));
        assert!(uploaded.contains("%PDF cid TEMPLATE West"));
        assert!(uploaded.contains("CONFIDENTIAL"));

        let small = svc.compress(&marked).await.unwrap();
        assert_eq!(std::fs::read_to_string(small).unwrap(), "small");
    }

    #[tokio::test]
    async fn unconfigured_urls_and_missing_templates_fail() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services("", dir.path());
        let mut unconfigured = svc.config.clone();
        unconfigured.docgen_url = String::new();
        unconfigured.pdf_services_url = String::new();
        let svc_none = HttpDocumentServices::new(unconfigured);

        assert!(matches!(
            svc_none.generate(&json!({}), Path::new("t.docx")).await,
            Err(Error::Config(_))
        ));
        assert!(matches!(
            svc_none.compress(Path::new("x.pdf")).await,
            Err(Error::Config(_))
        ));
        assert!(matches!(
            svc.generate(&json!({}), &dir.path().join("missing.docx")).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn pass_through_steps() {
        let dir = tempfile::tempdir().unwrap();
        let svc = services("http://unused", dir.path());
        let pdf = PathBuf::from("a.pdf");
        assert_eq!(svc.insert_image(&pdf, Some("logo.png"), None, None).await.unwrap(), pdf);
        assert_eq!(
            svc.merge(&[PathBuf::from("b.pdf"), PathBuf::from("c.pdf")]).await.unwrap(),
            PathBuf::from("b.pdf")
        );
        assert!(svc.merge(&[]).await.is_err());
    }
}
