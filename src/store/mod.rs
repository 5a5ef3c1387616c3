//! Persistence of chat sessions behind a small key-value interface

pub mod conversations;
pub mod storage;

pub use conversations::{ConversationStore, VideoChatIndex, INDEX_KEY};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
