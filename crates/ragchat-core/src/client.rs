//! Chat client operations.
//!
//! Every operation is split in two. The synchronous half runs on the UI
//! thread: it reads controls, applies optimistic updates and in-progress
//! statuses, and returns a [`PendingAction`]. Awaiting that future performs
//! the single HTTP round trip; its [`Completion`] is then handed back to
//! [`ChatClient::complete`] on the UI thread. Pending actions are independent
//! of each other, and completions are applied in whatever order they arrive.

use anyhow::Result;
use futures_util::future::{BoxFuture, FutureExt};

use crate::backend::{BackendClient, ChatRequest, ModelConfig, UploadResponse};
use crate::render::{AmmoniaSanitizer, CommonMarkParser, MarkdownParser, Sanitizer, UntrustedRenderer};
use crate::state::{ChatMessage, ChatRole, Transcript};
use crate::view::ChatView;

pub const EMBEDDINGS_IN_PROGRESS: &str = "Generating embeddings... this may take a while";
pub const INDEX_REBUILD_IN_PROGRESS: &str = "Rebuilding index... this may take a while";
pub const NO_FILE_SELECTED: &str = "Please select a file";
pub const UPLOAD_IN_PROGRESS: &str = "Uploading...";
pub const CONFIG_UPDATED: &str = "Configuration updated successfully!";
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Network half of an operation.
pub type PendingAction = BoxFuture<'static, Completion>;

/// Outcome of a finished request, waiting to be applied to the view.
#[derive(Debug)]
pub enum Completion {
    Chat { seq: u64, result: Result<String> },
    ConfigUpdated { config: ModelConfig, result: Result<()> },
    EmbeddingsBuilt { result: Result<String> },
    IndexRebuilt { result: Result<String> },
    DocumentUploaded { result: Result<UploadResponse> },
}

impl Completion {
    /// The model selection the backend accepted, if this is a successful
    /// config update.
    pub fn accepted_config(&self) -> Option<&ModelConfig> {
        match self {
            Completion::ConfigUpdated { config, result: Ok(()) } => Some(config),
            _ => None,
        }
    }
}

pub struct ChatClient<P = CommonMarkParser, S = AmmoniaSanitizer> {
    backend: BackendClient,
    renderer: UntrustedRenderer<P, S>,
    transcript: Transcript,
    next_seq: u64,
}

impl ChatClient {
    pub fn new(backend: BackendClient) -> Self {
        Self::with_renderer(backend, UntrustedRenderer::new())
    }
}

impl<P: MarkdownParser, S: Sanitizer> ChatClient<P, S> {
    pub fn with_renderer(backend: BackendClient, renderer: UntrustedRenderer<P, S>) -> Self {
        Self {
            backend,
            renderer,
            transcript: Transcript::new(),
            next_seq: 0,
        }
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Called once the view is bound and ready.
    pub fn on_ready<V: ChatView>(&self, view: &mut V) {
        view.scroll_history_to_bottom();
    }

    /// Render one entry into the history and record it in the transcript.
    pub fn add_message<V: ChatView>(&mut self, view: &mut V, role: ChatRole, content: &str) {
        let rendered = self.renderer.render(role, content);
        view.append_history(role, rendered);
        view.scroll_history_to_bottom();
        self.transcript.push(ChatMessage::new(role, content));
    }

    pub fn send_message<V: ChatView>(&mut self, view: &mut V) -> Option<PendingAction> {
        let input = view.user_input();
        let message = input.trim();
        if message.is_empty() {
            return None;
        }
        let message = message.to_string();

        let request = ChatRequest {
            message: message.clone(),
            use_rag: view.use_rag(),
            use_rerank: view.use_rerank(),
        };

        self.add_message(view, ChatRole::User, &message);
        view.clear_user_input();

        self.next_seq += 1;
        let seq = self.next_seq;
        tracing::info!(seq, use_rag = request.use_rag, "sending chat message");

        let backend = self.backend.clone();
        Some(
            async move {
                let result = backend.chat(&request).await;
                Completion::Chat { seq, result }
            }
            .boxed(),
        )
    }

    pub fn update_config<V: ChatView>(&self, view: &mut V) -> PendingAction {
        let config = ModelConfig {
            model_type: view.model_type(),
            model_name: view.model_name(),
        };
        tracing::info!(model_type = %config.model_type, model_name = %config.model_name, "updating model config");

        let backend = self.backend.clone();
        async move {
            let result = backend.update_config(&config).await;
            Completion::ConfigUpdated { config, result }
        }
        .boxed()
    }

    pub fn build_embeddings<V: ChatView>(&self, view: &mut V) -> PendingAction {
        view.set_embedding_status(EMBEDDINGS_IN_PROGRESS);
        tracing::info!("requesting embedding build");

        let backend = self.backend.clone();
        async move {
            let result = backend.build_embeddings().await;
            Completion::EmbeddingsBuilt { result }
        }
        .boxed()
    }

    pub fn rebuild_index<V: ChatView>(&self, view: &mut V) -> PendingAction {
        view.set_embedding_status(INDEX_REBUILD_IN_PROGRESS);
        tracing::info!("requesting index rebuild");

        let backend = self.backend.clone();
        async move {
            let result = backend.rebuild_index().await;
            Completion::IndexRebuilt { result }
        }
        .boxed()
    }

    pub fn upload_document<V: ChatView>(&self, view: &mut V) -> Option<PendingAction> {
        let Some(path) = view.selected_document() else {
            view.set_upload_status(NO_FILE_SELECTED);
            return None;
        };

        view.set_upload_status(UPLOAD_IN_PROGRESS);
        tracing::info!(path = %path.display(), "uploading document");

        let backend = self.backend.clone();
        Some(
            async move {
                let result = backend.upload_document(&path).await;
                Completion::DocumentUploaded { result }
            }
            .boxed(),
        )
    }

    /// Apply a finished request to the transcript and view.
    pub fn complete<V: ChatView>(&mut self, view: &mut V, completion: Completion) {
        match completion {
            Completion::Chat { seq, result } => match result {
                Ok(reply) => {
                    tracing::debug!(seq, "chat reply received");
                    self.add_message(view, ChatRole::Ai, &reply);
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    tracing::warn!(seq, error = %reason, "chat request failed");
                    self.add_message(view, ChatRole::Ai, &format!("Error: {}", reason));
                }
            },
            Completion::ConfigUpdated { result, .. } => match result {
                Ok(()) => view.notify(CONFIG_UPDATED),
                Err(e) => {
                    let reason = format!("{:#}", e);
                    tracing::warn!(error = %reason, "config update failed");
                    view.notify(&format!("Update failed: {}", reason));
                }
            },
            Completion::EmbeddingsBuilt { result } => match result {
                Ok(status) => view.set_embedding_status(&status),
                Err(e) => {
                    let reason = format!("{:#}", e);
                    tracing::warn!(error = %reason, "embedding build failed");
                    view.set_embedding_status(&format!("Embedding build failed: {}", reason));
                }
            },
            Completion::IndexRebuilt { result } => match result {
                Ok(status) => view.set_embedding_status(&status),
                Err(e) => {
                    let reason = format!("{:#}", e);
                    tracing::warn!(error = %reason, "index rebuild failed");
                    view.set_embedding_status(&format!("Index rebuild failed: {}", reason));
                }
            },
            Completion::DocumentUploaded { result } => match result {
                Ok(response) if response.is_success() => {
                    let path = response.file_path.unwrap_or_default();
                    view.set_upload_status(&format!("Upload succeeded: {}", path));
                    view.clear_document_selection();
                }
                Ok(response) => {
                    let reason = response
                        .detail_text()
                        .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                    tracing::warn!(status = %response.status, reason = %reason, "upload rejected");
                    view.set_upload_status(&format!("Upload failed: {}", reason));
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    tracing::warn!(error = %reason, "upload request failed");
                    view.set_upload_status(&format!("Upload error: {}", reason));
                }
            },
        }
    }

    /// Await a pending action and apply its result.
    pub async fn settle<V: ChatView>(&mut self, view: &mut V, pending: Option<PendingAction>) {
        if let Some(pending) = pending {
            let completion = pending.await;
            self.complete(view, completion);
        }
    }
}
