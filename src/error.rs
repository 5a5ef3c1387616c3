//! Error types for video lookup, persistence and chat flows

/// Result type for video metadata and transcription
pub type VideoResult<T> = std::result::Result<T, VideoError>;

/// Result type for key-value persistence
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type for chat service operations
pub type ChatResult<T> = std::result::Result<T, ChatError>;

/// Failures while resolving a video link to metadata and a transcript
#[derive(thiserror::Error, Debug)]
pub enum VideoError {
    #[error("Invalid video link: {0}")]
    InvalidInput(String),

    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Video API quota exceeded, try again later")]
    QuotaExceeded,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the key-value backend
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Failures surfaced by [`crate::service::ChatService`]
#[derive(thiserror::Error, Debug)]
pub enum ChatError {
    #[error(transparent)]
    Video(#[from] VideoError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("No video is open")]
    NoActiveVideo,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Chat session not found: {0}")]
    SessionNotFound(String),

    #[error("The last chat of a video cannot be deleted")]
    LastSession,

    #[error("Invalid response templates: {0}")]
    Templates(String),
}

impl VideoError {
    /// Troubleshooting hint shown next to the error
    pub fn guidance(&self) -> &'static str {
        match self {
            VideoError::InvalidInput(_) => {
                "Paste a YouTube link such as https://www.youtube.com/watch?v=VIDEO_ID \
                 or https://youtu.be/VIDEO_ID"
            }
            VideoError::NotFound(_) => "Check that the video is public and the link is complete",
            VideoError::QuotaExceeded => "The daily API quota is used up, try again tomorrow",
            VideoError::Provider(_) | VideoError::Http(_) | VideoError::Json(_) => {
                "Check your network connection and API key, then try again"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_wraps_video_error() {
        let err: ChatError = VideoError::InvalidInput("not a link".to_string()).into();
        assert_eq!(err.to_string(), "Invalid video link: not a link");
        assert!(matches!(err, ChatError::Video(VideoError::InvalidInput(_))));
    }

    #[test]
    fn test_guidance() {
        assert!(VideoError::InvalidInput(String::new()).guidance().contains("youtu.be"));
        assert!(VideoError::QuotaExceeded.guidance().contains("quota"));
    }
}
