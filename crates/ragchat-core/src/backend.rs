use std::path::Path;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response, multipart};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub use_rag: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub use_rerank: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub model_type: String,
    pub model_name: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
}

/// Body returned by `/upload_document`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: String,
    pub file_path: Option<String>,
    /// FastAPI puts a string here for handler errors and an array for
    /// validation errors, so keep it untyped.
    pub detail: Option<Value>,
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    pub fn detail_text(&self) -> Option<String> {
        match &self.detail {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// HTTP client for the chat backend's REST endpoints.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<String> {
        tracing::debug!(use_rag = request.use_rag, use_rerank = request.use_rerank, "POST /chat");

        let response = self
            .client
            .post(self.url("chat"))
            .json(request)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let chat_response: ChatResponse = response
            .json()
            .await
            .context("invalid chat response")?;
        Ok(chat_response.response)
    }

    pub async fn update_config(&self, config: &ModelConfig) -> Result<()> {
        tracing::debug!(model_type = %config.model_type, model_name = %config.model_name, "POST /update_config");

        let response = self
            .client
            .post(self.url("update_config"))
            .json(config)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    pub async fn build_embeddings(&self) -> Result<String> {
        self.post_for_status("build_embeddings").await
    }

    pub async fn rebuild_index(&self) -> Result<String> {
        self.post_for_status("rebuild_index").await
    }

    async fn post_for_status(&self, path: &str) -> Result<String> {
        tracing::debug!("POST /{}", path);

        let response = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let status_response: StatusResponse = response
            .json()
            .await
            .with_context(|| format!("invalid {} response", path))?;
        Ok(status_response.status)
    }

    /// Upload a document as multipart field `file`.
    ///
    /// The JSON body is interpreted whatever the HTTP status, since the
    /// backend reports failures through `status`/`detail`.
    pub async fn upload_document(&self, path: &Path) -> Result<UploadResponse> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;

        tracing::debug!(file = %file_name, size = bytes.len(), "POST /upload_document");

        let part = multipart::Part::bytes(bytes).file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("upload_document"))
            .multipart(form)
            .send()
            .await?;

        let upload_response: UploadResponse = response
            .json()
            .await
            .context("invalid upload response")?;
        Ok(upload_response)
    }
}

/// Turn a non-2xx response into an error, preferring the backend's `detail`.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .map(|body| match body.detail {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or(text);

    if detail.is_empty() {
        Err(anyhow!("backend returned {}", status))
    } else {
        Err(anyhow!("backend returned {}: {}", status, detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_omits_rerank_when_off() {
        let request = ChatRequest {
            message: "hello".to_string(),
            use_rag: false,
            use_rerank: false,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"message": "hello", "use_rag": false})
        );
    }

    #[test]
    fn test_chat_request_includes_rerank_when_on() {
        let request = ChatRequest {
            message: "q".to_string(),
            use_rag: true,
            use_rerank: true,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"message": "q", "use_rag": true, "use_rerank": true})
        );
    }

    #[test]
    fn test_upload_detail_text() {
        let resp: UploadResponse = serde_json::from_value(json!({"status": "fail"})).unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.detail_text(), None);

        let resp: UploadResponse =
            serde_json::from_value(json!({"status": "fail", "detail": "disk full"})).unwrap();
        assert_eq!(resp.detail_text().as_deref(), Some("disk full"));

        let resp: UploadResponse =
            serde_json::from_value(json!({"detail": [{"msg": "field required"}]})).unwrap();
        assert_eq!(resp.status, "");
        assert_eq!(resp.detail_text().as_deref(), Some(r#"[{"msg":"field required"}]"#));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackendClient::new("http://localhost:8000/");
        assert_eq!(client.url("chat"), "http://localhost:8000/chat");
    }
}
