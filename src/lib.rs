/// VidChat - chat with a video through its transcript
///
/// Matches questions against transcript segments, composes brief or detailed
/// answers (remote generation when configured, templates otherwise) and keeps
/// per-video chat history.

pub mod chat;
pub mod config;
pub mod error;
pub mod format;
pub mod llm;
pub mod service;
pub mod store;
pub mod types;
pub mod video;

// Re-export main types for easy access
pub use crate::chat::{ComposedResponse, ResponseComposer, ResponseTemplates, VideoContextHolder};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{ChatError, StorageError, VideoError};
pub use crate::format::format_timestamp;
pub use crate::llm::{LLMConfig, LLMProvider, RemoteGenerator};
pub use crate::service::ChatService;
pub use crate::store::{ConversationStore, FileStorage, KeyValueStorage, MemoryStorage};
pub use crate::types::{
    ChatMessage, ChatRole, ChatSession, ResponseMode, TranscriptSegment, VideoChatSummary,
    VideoContext, VideoInfo,
};
