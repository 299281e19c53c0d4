use std::path::PathBuf;

use ragchat_core::{
    BackendClient, ChatClient, ChatRole, ChatView, Completion, Config, ModelType, PendingAction,
    RenderedContent,
};
use ratatui::text::Line;

use crate::input::TextInput;
use crate::markup;

/// Focusable controls, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    UserInput,
    ModelType,
    ModelName,
    DocumentFile,
}

impl Field {
    const ORDER: [Field; 4] = [
        Field::UserInput,
        Field::ModelType,
        Field::ModelName,
        Field::DocumentFile,
    ];

    /// Element id on the chat page this control stands in for.
    pub fn id(&self) -> &'static str {
        match self {
            Field::UserInput => "user-input",
            Field::ModelType => "model-type",
            Field::ModelName => "model-name",
            Field::DocumentFile => "document-file",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// One rendered block of `chat-history`.
#[derive(Debug, Clone)]
pub struct HistoryBlock {
    pub role: ChatRole,
    pub lines: Vec<Line<'static>>,
}

/// Everything visible on screen. This is the binding the chat client reads
/// and writes through [`ChatView`].
pub struct ChatScreen {
    pub focus: Field,
    pub user_input: TextInput,
    pub use_rag: bool,
    pub use_rerank: bool,
    pub model_type: TextInput,
    pub model_name: TextInput,
    pub document_file: TextInput,
    pub embedding_status: String,
    pub upload_status: String,
    pub notice: Option<String>,

    pub history: Vec<HistoryBlock>,
    pub history_scroll: u16,
    pub follow_history: bool,
    // Inner size of the history pane, updated during render
    pub history_height: u16,
    pub history_width: u16,
}

impl ChatScreen {
    pub fn new(config: &Config) -> Self {
        Self {
            focus: Field::UserInput,
            user_input: TextInput::default(),
            use_rag: config.use_rag,
            use_rerank: config.use_rerank,
            model_type: TextInput::new(&config.model_type),
            model_name: TextInput::new(&config.model_name),
            document_file: TextInput::default(),
            embedding_status: String::new(),
            upload_status: String::new(),
            notice: None,

            history: Vec::new(),
            history_scroll: 0,
            follow_history: true,
            history_height: 0,
            history_width: 0,
        }
    }

    pub fn focused_input(&mut self) -> &mut TextInput {
        match self.focus {
            Field::UserInput => &mut self.user_input,
            Field::ModelType => &mut self.model_type,
            Field::ModelName => &mut self.model_name,
            Field::DocumentFile => &mut self.document_file,
        }
    }

    pub fn scroll_history_up(&mut self, lines: u16) {
        self.follow_history = false;
        self.history_scroll = self.history_scroll.saturating_sub(lines);
    }

    pub fn scroll_history_down(&mut self, lines: u16) {
        self.history_scroll = self.history_scroll.saturating_add(lines);
    }
}

impl ChatView for ChatScreen {
    fn user_input(&self) -> String {
        self.user_input.value().to_string()
    }

    fn clear_user_input(&mut self) {
        self.user_input.clear();
    }

    fn use_rag(&self) -> bool {
        self.use_rag
    }

    fn use_rerank(&self) -> bool {
        self.use_rerank
    }

    fn model_type(&self) -> String {
        self.model_type.value().to_string()
    }

    fn model_name(&self) -> String {
        self.model_name.value().to_string()
    }

    fn set_embedding_status(&mut self, status: &str) {
        self.embedding_status = status.to_string();
    }

    fn selected_document(&self) -> Option<PathBuf> {
        let path = self.document_file.value().trim();
        if path.is_empty() {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }

    fn clear_document_selection(&mut self) {
        self.document_file.clear();
    }

    fn set_upload_status(&mut self, status: &str) {
        self.upload_status = status.to_string();
    }

    fn append_history(&mut self, role: ChatRole, content: RenderedContent) {
        self.history.push(HistoryBlock {
            role,
            lines: markup::content_to_lines(&content),
        });
    }

    fn scroll_history_to_bottom(&mut self) {
        // Actual offset is computed at render time once the pane size is known
        self.follow_history = true;
    }

    fn notify(&mut self, message: &str) {
        self.notice = Some(message.to_string());
    }
}

pub struct App {
    pub should_quit: bool,
    pub client: ChatClient,
    pub view: ChatScreen,
    pub backend_url: String,

    // Requests spawned but not yet completed
    pub chats_in_flight: usize,
    pub requests_in_flight: usize,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: &Config) -> Self {
        let backend = BackendClient::new(config.base_url());
        let backend_url = backend.base_url().to_string();
        let client = ChatClient::new(backend);
        let mut view = ChatScreen::new(config);
        client.on_ready(&mut view);

        Self {
            should_quit: false,
            client,
            view,
            backend_url,
            chats_in_flight: 0,
            requests_in_flight: 0,
            animation_frame: 0,
        }
    }

    pub fn send_message(&mut self) -> Option<PendingAction> {
        let pending = self.client.send_message(&mut self.view)?;
        self.chats_in_flight += 1;
        Some(self.track(pending))
    }

    pub fn update_config(&mut self) -> Option<PendingAction> {
        let pending = self.client.update_config(&mut self.view);
        Some(self.track(pending))
    }

    pub fn build_embeddings(&mut self) -> Option<PendingAction> {
        let pending = self.client.build_embeddings(&mut self.view);
        Some(self.track(pending))
    }

    pub fn rebuild_index(&mut self) -> Option<PendingAction> {
        let pending = self.client.rebuild_index(&mut self.view);
        Some(self.track(pending))
    }

    pub fn upload_document(&mut self) -> Option<PendingAction> {
        let pending = self.client.upload_document(&mut self.view)?;
        Some(self.track(pending))
    }

    fn track(&mut self, pending: PendingAction) -> PendingAction {
        self.requests_in_flight += 1;
        pending
    }

    /// Apply a finished request on the UI loop.
    pub fn apply_completion(&mut self, completion: Completion) {
        self.requests_in_flight = self.requests_in_flight.saturating_sub(1);
        if matches!(completion, Completion::Chat { .. }) {
            self.chats_in_flight = self.chats_in_flight.saturating_sub(1);
        }

        if let Some(accepted) = completion.accepted_config() {
            if let Err(e) = Config::save_model(&accepted.model_type, &accepted.model_name) {
                tracing::warn!(error = %e, "could not persist model selection");
            }
        }

        self.client.complete(&mut self.view, completion);
    }

    pub fn toggle_rag(&mut self) {
        self.view.use_rag = !self.view.use_rag;
    }

    pub fn toggle_rerank(&mut self) {
        self.view.use_rerank = !self.view.use_rerank;
    }

    pub fn cycle_model_type(&mut self) {
        let next = ModelType::cycle(self.view.model_type.value());
        self.view.model_type.set(next.as_str());
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chats_in_flight > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(&Config::new())
    }

    #[test]
    fn test_field_cycle() {
        assert_eq!(Field::UserInput.next(), Field::ModelType);
        assert_eq!(Field::DocumentFile.next(), Field::UserInput);
        assert_eq!(Field::UserInput.prev(), Field::DocumentFile);
        assert_eq!(Field::ModelName.id(), "model-name");
    }

    #[test]
    fn test_new_app_starts_from_config() {
        let mut config = Config::new();
        config.backend_url = "http://example.test:8000/".to_string();
        config.use_rag = true;
        let app = App::new(&config);

        assert_eq!(app.backend_url, "http://example.test:8000");
        assert!(app.view.use_rag);
        assert_eq!(app.view.model_type.value(), "ollama");
        assert!(app.view.follow_history);
    }

    #[test]
    fn test_blank_send_is_not_tracked() {
        let mut app = app();
        app.view.user_input.set("   ");
        assert!(app.send_message().is_none());
        assert_eq!(app.chats_in_flight, 0);
        assert!(app.view.history.is_empty());
    }

    #[test]
    fn test_send_appends_user_block_immediately() {
        let mut app = app();
        app.view.user_input.set("hello");
        assert!(app.send_message().is_some());

        assert_eq!(app.chats_in_flight, 1);
        assert_eq!(app.view.user_input.value(), "");
        assert_eq!(app.view.history.len(), 1);
        assert_eq!(app.view.history[0].role, ChatRole::User);
        assert_eq!(app.client.transcript().len(), 1);
    }

    #[test]
    fn test_chat_completion_renders_reply() {
        let mut app = app();
        app.view.user_input.set("hello");
        let _pending = app.send_message();

        app.apply_completion(Completion::Chat {
            seq: 1,
            result: Ok("**hi** there".to_string()),
        });

        assert_eq!(app.chats_in_flight, 0);
        assert_eq!(app.requests_in_flight, 0);
        let reply = &app.view.history[1];
        assert_eq!(reply.role, ChatRole::Ai);
        let text: String = reply.lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "hi there");
    }

    #[test]
    fn test_upload_without_path_sets_status() {
        let mut app = app();
        app.view.document_file.set("  ");
        assert!(app.upload_document().is_none());
        assert_eq!(app.view.upload_status, "Please select a file");
        assert_eq!(app.requests_in_flight, 0);
    }

    #[test]
    fn test_cycle_model_type() {
        let mut app = app();
        app.cycle_model_type();
        assert_eq!(app.view.model_type.value(), "openai");
        app.cycle_model_type();
        assert_eq!(app.view.model_type.value(), "ollama");
    }
}
