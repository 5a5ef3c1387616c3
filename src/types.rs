//! Shared data model: transcript segments, video context and chat history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A timestamped slice of transcript text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Length in seconds
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Everything the responder knows about the video currently open
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VideoContext {
    pub transcript: String,
    pub segments: Vec<TranscriptSegment>,
    pub title: String,
    pub url: String,
}

impl VideoContext {
    pub fn new(title: String, url: String, segments: Vec<TranscriptSegment>) -> Self {
        let transcript = segments
            .iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            transcript,
            segments,
            title,
            url,
        }
    }
}

/// Video metadata returned by a metadata provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub description: String,

    /// Duration in seconds
    pub duration: f64,
    pub thumbnail: String,
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
}

/// Output of a transcription provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionResult {
    pub segments: Vec<TranscriptSegment>,
    pub full_text: String,
    pub language: String,
    pub confidence: f64,
}

/// Response verbosity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Brief,
    Detailed,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Brief => "brief",
            ResponseMode::Detailed => "detailed",
        }
    }
}

impl std::str::FromStr for ResponseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brief" => Ok(ResponseMode::Brief),
            "detailed" => Ok(ResponseMode::Detailed),
            other => Err(format!("unknown response mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single message in a chat session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,

    /// `M:SS` pointer into the video the answer refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_timestamp: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content.into(), None)
    }

    pub fn assistant(content: impl Into<String>, relevant_timestamp: Option<String>) -> Self {
        Self::new(ChatRole::Assistant, content.into(), relevant_timestamp)
    }

    fn new(role: ChatRole, content: String, relevant_timestamp: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: Utc::now(),
            relevant_timestamp,
        }
    }
}

/// One conversation thread about one video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub video_id: String,
    pub video_title: String,
}

impl ChatSession {
    /// Title given to sessions before their first question
    pub const DEFAULT_TITLE: &'static str = "New Chat";

    /// Create a session seeded with the assistant greeting
    pub fn new(video_id: &str, video_title: &str, greeting: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: Self::DEFAULT_TITLE.to_string(),
            messages: vec![ChatMessage::assistant(greeting, None)],
            created_at: Utc::now(),
            video_id: video_id.to_string(),
            video_title: video_title.to_string(),
        }
    }

    /// Instant of the most recent message, or creation time
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.messages
            .iter()
            .map(|m| m.timestamp)
            .max()
            .unwrap_or(self.created_at)
    }

    /// Messages exchanged after the greeting
    pub fn exchanged_messages(&self) -> usize {
        self.messages.len().saturating_sub(1)
    }
}

/// Per-video overview row for the history listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoChatSummary {
    pub video_id: String,
    pub video_title: String,
    pub session_count: usize,
    pub last_activity: DateTime<Utc>,
    pub total_message_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_context_joins_transcript() {
        let ctx = VideoContext::new(
            "Title".to_string(),
            "https://youtu.be/dQw4w9WgXcQ".to_string(),
            vec![
                TranscriptSegment::new(" Hello there ", 0.0, 2.0),
                TranscriptSegment::new("general kenobi", 2.0, 3.0),
            ],
        );

        assert_eq!(ctx.transcript, "Hello there general kenobi");
        assert_eq!(ctx.segments[1].end(), 5.0);
    }

    #[test]
    fn test_new_session_has_greeting() {
        let session = ChatSession::new("abc", "A video", "Hi!".to_string());

        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, ChatRole::Assistant);
        assert_eq!(session.exchanged_messages(), 0);
        assert_eq!(session.title, ChatSession::DEFAULT_TITLE);
    }

    #[test]
    fn test_message_serialization_uses_camel_case() {
        let msg = ChatMessage::assistant("answer", Some("1:35".to_string()));
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["relevantTimestamp"], "1:35");
        assert_eq!(json["role"], "assistant");

        let user = serde_json::to_value(ChatMessage::user("q")).unwrap();
        assert!(user.get("relevantTimestamp").is_none());
    }

    #[test]
    fn test_response_mode_parsing() {
        assert_eq!("Brief".parse::<ResponseMode>(), Ok(ResponseMode::Brief));
        assert_eq!("detailed".parse::<ResponseMode>(), Ok(ResponseMode::Detailed));
        assert!("verbose".parse::<ResponseMode>().is_err());
    }
}
