//! Headless chat flows: open a video, talk about it, manage its sessions

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::chat::{ResponseComposer, ResponseTemplates, VideoContextHolder};
use crate::config::{Config, StorageBackend};
use crate::error::{ChatError, ChatResult};
use crate::llm::create_generator;
use crate::store::{ConversationStore, FileStorage, KeyValueStorage, MemoryStorage};
use crate::types::{
    ChatMessage, ChatRole, ChatSession, ResponseMode, VideoChatSummary, VideoContext, VideoInfo,
};
use crate::video::{
    watch_url, MetadataProvider, SimulatedMetadataProvider, SimulatedTranscriber,
    TranscriptionProvider, YouTubeMetadataProvider,
};

/// Characters of the first question kept as a session title
const SESSION_TITLE_CHARS: usize = 40;

/// Title for a session derived from its first question
pub fn session_title(question: &str) -> String {
    let question = question.trim();
    if question.chars().count() <= SESSION_TITLE_CHARS {
        return question.to_string();
    }
    let cut: String = question.chars().take(SESSION_TITLE_CHARS).collect();
    format!("{}…", cut.trim_end())
}

/// The video currently open together with its chat sessions
struct OpenVideo {
    info: VideoInfo,
    sessions: Vec<ChatSession>,
    active: usize,
}

pub struct ChatService {
    metadata: Arc<dyn MetadataProvider>,
    transcriber: Arc<dyn TranscriptionProvider>,
    composer: ResponseComposer,
    store: ConversationStore,
    context: VideoContextHolder,
    open: Option<OpenVideo>,
    delay: Duration,
}

impl ChatService {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        transcriber: Arc<dyn TranscriptionProvider>,
        composer: ResponseComposer,
        store: ConversationStore,
    ) -> Self {
        Self {
            metadata,
            transcriber,
            composer,
            store,
            context: VideoContextHolder::new(),
            open: None,
            delay: Duration::ZERO,
        }
    }

    /// Pause inserted before the metadata and transcription steps
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Wire providers, storage and templates from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage: Arc<dyn KeyValueStorage> = match config.storage.backend {
            StorageBackend::File => Arc::new(FileStorage::new(&config.storage.data_dir)?),
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        };

        let metadata: Arc<dyn MetadataProvider> = match &config.video.youtube_api_key {
            Some(key) if !key.trim().is_empty() => Arc::new(YouTubeMetadataProvider::new(
                key.clone(),
                Duration::from_secs(config.video.request_timeout_seconds),
            )?),
            _ => Arc::new(SimulatedMetadataProvider),
        };

        let templates = Self::load_templates(config)?;
        let mut composer = match config.chat.seed {
            Some(seed) => ResponseComposer::new(templates).with_seed(seed),
            None => ResponseComposer::new(templates),
        };

        let remote = create_generator(&config.llm)?;
        if remote.is_configured() {
            info!("🤖 Remote generation enabled ({:?})", config.llm.provider);
            composer = composer.with_remote(remote);
        } else {
            debug!("Remote generation not configured, using templates only");
        }

        Ok(Self::new(
            metadata,
            Arc::new(SimulatedTranscriber),
            composer,
            ConversationStore::new(storage),
        )
        .with_delay(Duration::from_millis(config.video.simulated_delay_ms)))
    }

    /// Built-in templates, or the configured override file
    pub fn load_templates(config: &Config) -> ChatResult<ResponseTemplates> {
        match &config.chat.templates_file {
            Some(path) => ResponseTemplates::from_file(path)
                .map_err(|e| ChatError::Templates(format!("{:#}", e))),
            None => Ok(ResponseTemplates::default()),
        }
    }

    async fn simulated_latency(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Resolve a link, load its transcript and make it the current video.
    /// Existing sessions for the video are restored, otherwise a greeting
    /// session is created.
    pub async fn open_video(&mut self, url: &str) -> ChatResult<VideoInfo> {
        self.simulated_latency().await;
        let info = self.metadata.get_video_info(url).await?;

        self.simulated_latency().await;
        let transcription = self.transcriber.transcribe(&info).await?;

        self.context.replace(VideoContext::new(
            info.title.clone(),
            watch_url(&info.id),
            transcription.segments,
        ));

        let mut sessions = self.store.get_sessions(&info.id);
        if sessions.is_empty() {
            sessions.push(self.greeting_session(&info));
            self.persist_sessions(&info.id, &sessions);
        } else {
            info!("💬 Restored {} chats for \"{}\"", sessions.len(), info.title);
        }

        self.open = Some(OpenVideo {
            info: info.clone(),
            sessions,
            active: 0,
        });
        Ok(info)
    }

    fn greeting_session(&self, info: &VideoInfo) -> ChatSession {
        let greeting = self.composer.templates().greeting_for(&info.title);
        info!("✨ New chat for \"{}\"", info.title);
        ChatSession::new(&info.id, &info.title, greeting)
    }

    /// Store writes never fail the chat flow
    fn persist_sessions(&self, video_id: &str, sessions: &[ChatSession]) {
        if let Err(e) = self.store.save_sessions(video_id, sessions) {
            warn!("Failed to save chat history for {}: {}", video_id, e);
        }
    }

    fn persist(&self) {
        if let Some(open) = &self.open {
            self.persist_sessions(&open.info.id, &open.sessions);
        }
    }

    /// Ask a question in the active session, returning the assistant reply
    pub async fn send_message(&mut self, text: &str, mode: ResponseMode) -> ChatResult<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let context = self.context.current().ok_or(ChatError::NoActiveVideo)?;
        {
            let open = self.open.as_mut().ok_or(ChatError::NoActiveVideo)?;
            let session = open
                .sessions
                .get_mut(open.active)
                .ok_or(ChatError::NoActiveVideo)?;

            let first_question = !session.messages.iter().any(|m| m.role == ChatRole::User);
            session.messages.push(ChatMessage::user(text));
            if first_question && session.title == ChatSession::DEFAULT_TITLE {
                session.title = session_title(text);
            }
        }

        let response = self.composer.generate(text, &context, mode).await;
        debug!(
            "Composed {} answer (related: {}, confidence {:.2})",
            mode.as_str(),
            response.is_video_related,
            response.confidence
        );

        let reply = ChatMessage::assistant(response.content, response.timestamp);
        if let Some(open) = self.open.as_mut() {
            if let Some(session) = open.sessions.get_mut(open.active) {
                session.messages.push(reply.clone());
            }
        }

        self.persist();
        Ok(reply)
    }

    /// Start a fresh session for the current video and make it active
    pub fn new_chat(&mut self) -> ChatResult<ChatSession> {
        let info = self
            .open
            .as_ref()
            .map(|open| open.info.clone())
            .ok_or(ChatError::NoActiveVideo)?;
        let session = self.greeting_session(&info);

        let open = self.open.as_mut().ok_or(ChatError::NoActiveVideo)?;
        open.sessions.insert(0, session.clone());
        open.active = 0;

        self.persist();
        Ok(session)
    }

    /// Make another session of the current video active
    pub fn switch_session(&mut self, session_id: &str) -> ChatResult<()> {
        let open = self.open.as_mut().ok_or(ChatError::NoActiveVideo)?;
        let index = open
            .sessions
            .iter()
            .position(|s| s.id == session_id)
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))?;
        open.active = index;
        Ok(())
    }

    /// Delete a session. The last remaining session cannot be deleted.
    pub fn delete_session(&mut self, session_id: &str) -> ChatResult<()> {
        let open = self.open.as_mut().ok_or(ChatError::NoActiveVideo)?;
        let index = open
            .sessions
            .iter()
            .position(|s| s.id == session_id)
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))?;

        if open.sessions.len() == 1 {
            return Err(ChatError::LastSession);
        }

        let active_id = open.sessions[open.active].id.clone();
        open.sessions.remove(index);
        open.active = open
            .sessions
            .iter()
            .position(|s| s.id == active_id)
            .unwrap_or(0);

        let video_id = open.info.id.clone();
        if let Err(e) = self.store.delete_session(&video_id, session_id) {
            warn!("Failed to delete chat {}: {}", session_id, e);
        }
        Ok(())
    }

    /// Forget the current video's chats and start over with a greeting
    pub fn clear_video_history(&mut self) -> ChatResult<()> {
        let info = self
            .open
            .as_ref()
            .map(|open| open.info.clone())
            .ok_or(ChatError::NoActiveVideo)?;

        if let Err(e) = self.store.clear_video(&info.id) {
            warn!("Failed to clear chat history for {}: {}", info.id, e);
        }

        let session = self.greeting_session(&info);
        if let Some(open) = self.open.as_mut() {
            open.sessions = vec![session];
            open.active = 0;
        }
        self.persist();
        Ok(())
    }

    /// Clear chats of a video that need not be open
    pub fn clear_history_for(&mut self, video_id: &str) -> ChatResult<()> {
        if self.open.as_ref().map(|o| o.info.id == video_id).unwrap_or(false) {
            return self.clear_video_history();
        }
        if let Err(e) = self.store.clear_video(video_id) {
            warn!("Failed to clear chat history for {}: {}", video_id, e);
        }
        Ok(())
    }

    /// Every video with stored chats, most recently active first
    pub fn history(&self) -> Vec<VideoChatSummary> {
        self.store.list_videos_with_chats()
    }

    /// Forget all chats. An open video keeps a fresh greeting session.
    pub fn clear_all_history(&mut self) -> ChatResult<()> {
        if let Err(e) = self.store.clear_all() {
            warn!("Failed to clear chat history: {}", e);
        }
        if self.open.is_some() {
            self.clear_video_history()?;
        }
        Ok(())
    }

    pub fn current_video(&self) -> Option<&VideoInfo> {
        self.open.as_ref().map(|open| &open.info)
    }

    pub fn context(&self) -> Option<Arc<VideoContext>> {
        self.context.current()
    }

    /// Sessions of the current video, in display order
    pub fn sessions(&self) -> &[ChatSession] {
        self.open
            .as_ref()
            .map(|open| open.sessions.as_slice())
            .unwrap_or(&[])
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        self.open
            .as_ref()
            .and_then(|open| open.sessions.get(open.active))
    }
}
