pub mod backend;
pub mod client;
pub mod config;
pub mod model;
pub mod render;
pub mod state;
pub mod view;

// Re-export main types for convenience
pub use backend::{BackendClient, ChatRequest, ModelConfig, UploadResponse};
pub use client::{ChatClient, Completion, PendingAction};
pub use config::Config;
pub use model::ModelType;
pub use render::{RenderedContent, SafeMarkup, UntrustedRenderer};
pub use state::{ChatMessage, ChatRole, Transcript};
pub use view::ChatView;
