//! The controls a chat front end must provide.
//!
//! Each method corresponds to one element of the chat page: `user-input`,
//! `use-rag`, `model-type`, `model-name`, `embedding-status`,
//! `document-file`, `upload-status` and `chat-history`. A front end binds
//! these once and passes the binding into every [`crate::ChatClient`]
//! operation.

use std::path::PathBuf;

use crate::render::RenderedContent;
use crate::state::ChatRole;

pub trait ChatView {
    /// Current text of `user-input`, untrimmed.
    fn user_input(&self) -> String;
    fn clear_user_input(&mut self);

    /// State of the `use-rag` checkbox.
    fn use_rag(&self) -> bool;

    /// Whether reranking of retrieved chunks is requested.
    fn use_rerank(&self) -> bool {
        false
    }

    fn model_type(&self) -> String;
    fn model_name(&self) -> String;

    fn set_embedding_status(&mut self, status: &str);

    /// File chosen in `document-file`, if any.
    fn selected_document(&self) -> Option<PathBuf>;
    fn clear_document_selection(&mut self);

    fn set_upload_status(&mut self, status: &str);

    /// Add one block to `chat-history`.
    fn append_history(&mut self, role: ChatRole, content: RenderedContent);
    fn scroll_history_to_bottom(&mut self);

    /// Show a transient acknowledgment to the user.
    fn notify(&mut self, message: &str);
}
