use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::fs;

use vidchat::chat::templates::ResponseTemplates;
use vidchat::llm::{LLMError, Result as LLMResult};
use vidchat::video::metadata::MetadataProvider;
use vidchat::video::transcription::SimulatedTranscriber;
use vidchat::video::extract_video_id;
use vidchat::error::VideoResult;
use vidchat::{
    ChatRole, ChatService, ConfigBuilder, ConversationStore, FileStorage, MemoryStorage,
    RemoteGenerator, ResponseComposer, ResponseMode, VideoInfo,
};

/// Fixed ten minute video, whatever the link
struct FixedMetadata;

#[async_trait]
impl MetadataProvider for FixedMetadata {
    async fn get_video_info(&self, url: &str) -> VideoResult<VideoInfo> {
        Ok(VideoInfo {
            id: extract_video_id(url)?,
            title: "Rust Ownership Deep Dive".to_string(),
            description: String::new(),
            duration: 600.0,
            thumbnail: String::new(),
            channel_title: "Systems Weekly".to_string(),
            published_at: Utc::now(),
        })
    }
}

struct FailingRemote {
    calls: AtomicUsize,
}

#[async_trait]
impl RemoteGenerator for FailingRemote {
    fn is_configured(&self) -> bool {
        true
    }

    async fn generate(&self, _prompt: &str, _mode: ResponseMode) -> LLMResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LLMError::Api {
            status: 429,
            body: "rate limited".to_string(),
        })
    }
}

struct ScriptedRemote;

#[async_trait]
impl RemoteGenerator for ScriptedRemote {
    fn is_configured(&self) -> bool {
        true
    }

    async fn generate(&self, prompt: &str, mode: ResponseMode) -> LLMResult<String> {
        assert!(prompt.contains("Rust Ownership Deep Dive"));
        Ok(match mode {
            ResponseMode::Brief => {
                "Ownership is covered early on. A key example follows. Then more detail.".to_string()
            }
            ResponseMode::Detailed => "A long remote answer. With several sentences.".to_string(),
        })
    }
}

struct UnconfiguredRemote;

#[async_trait]
impl RemoteGenerator for UnconfiguredRemote {
    fn is_configured(&self) -> bool {
        false
    }

    async fn generate(&self, _prompt: &str, _mode: ResponseMode) -> LLMResult<String> {
        panic!("an unconfigured generator must not be called");
    }
}

fn service_with(composer: ResponseComposer, store: ConversationStore) -> ChatService {
    ChatService::new(
        Arc::new(FixedMetadata),
        Arc::new(SimulatedTranscriber),
        composer,
        store,
    )
}

fn memory_store() -> ConversationStore {
    ConversationStore::new(Arc::new(MemoryStorage::new()))
}

#[tokio::test]
async fn test_history_survives_restart_with_file_storage() {
    let temp_dir = TempDir::new().unwrap();

    let session_id = {
        let store = ConversationStore::new(Arc::new(FileStorage::new(temp_dir.path()).unwrap()));
        let mut service = service_with(ResponseComposer::new(ResponseTemplates::default()), store);
        service.open_video("https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        service
            .send_message("What is the main idea?", ResponseMode::Brief)
            .await
            .unwrap();
        service.active_session().unwrap().id.clone()
    };

    let store = ConversationStore::new(Arc::new(FileStorage::new(temp_dir.path()).unwrap()));
    let mut service = service_with(ResponseComposer::new(ResponseTemplates::default()), store);
    service.open_video("dQw4w9WgXcQ").await.unwrap();

    let session = service.active_session().unwrap();
    assert_eq!(session.id, session_id);
    assert_eq!(session.messages.len(), 3);
    assert_eq!(session.messages[1].role, ChatRole::User);
    assert_eq!(session.title, "What is the main idea?");

    let history = service.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].video_title, "Rust Ownership Deep Dive");
    assert_eq!(history[0].total_message_count, 2);
}

#[tokio::test]
async fn test_failing_remote_falls_back_once() {
    let remote = Arc::new(FailingRemote {
        calls: AtomicUsize::new(0),
    });
    let composer = ResponseComposer::new(ResponseTemplates::default())
        .with_seed(5)
        .with_remote(remote.clone());
    let mut service = service_with(composer, memory_store());
    service.open_video("dQw4w9WgXcQ").await.unwrap();

    let reply = service
        .send_message("What is the main idea?", ResponseMode::Detailed)
        .await
        .unwrap();

    assert!(!reply.content.trim().is_empty());
    assert!(reply.relevant_timestamp.is_some());
    // one attempt, no retries
    assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_remote_answer_used_and_condensed() {
    let composer =
        ResponseComposer::new(ResponseTemplates::default()).with_remote(Arc::new(ScriptedRemote));
    let mut service = service_with(composer, memory_store());
    service.open_video("dQw4w9WgXcQ").await.unwrap();

    let brief = service
        .send_message("What is the main idea?", ResponseMode::Brief)
        .await
        .unwrap();
    assert_eq!(
        brief.content,
        "Ownership is covered early on. A key example follows."
    );

    let detailed = service
        .send_message("What is the main idea?", ResponseMode::Detailed)
        .await
        .unwrap();
    assert_eq!(detailed.content, "A long remote answer. With several sentences.");
}

#[tokio::test]
async fn test_unconfigured_remote_always_answers() {
    let composer = ResponseComposer::new(ResponseTemplates::default())
        .with_seed(3)
        .with_remote(Arc::new(UnconfiguredRemote));
    let mut service = service_with(composer, memory_store());
    service.open_video("dQw4w9WgXcQ").await.unwrap();

    let questions = [
        "Can you summarize the video?",
        "What's the capital of France?",
        "how do I grow revenue for a startup",
        "???",
        "zzzz qqqq",
    ];

    for question in questions {
        for mode in [ResponseMode::Brief, ResponseMode::Detailed] {
            let reply = service.send_message(question, mode).await.unwrap();
            assert!(!reply.content.trim().is_empty(), "question: {}", question);
        }
    }
}

#[tokio::test]
async fn test_sessions_are_scoped_per_video() {
    let mut service = service_with(
        ResponseComposer::new(ResponseTemplates::default()),
        memory_store(),
    );

    service.open_video("aaaaaaaaaaa").await.unwrap();
    service.new_chat().unwrap();
    assert_eq!(service.sessions().len(), 2);

    service.open_video("bbbbbbbbbbb").await.unwrap();
    assert_eq!(service.sessions().len(), 1);
    service
        .send_message("Explain the process", ResponseMode::Brief)
        .await
        .unwrap();

    // the most recently active video comes first
    let history = service.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].video_id, "bbbbbbbbbbb");
    assert_eq!(history[1].session_count, 2);

    service.open_video("aaaaaaaaaaa").await.unwrap();
    assert_eq!(service.sessions().len(), 2);
}

#[tokio::test]
async fn test_service_from_config_with_template_override() {
    let temp_dir = TempDir::new().unwrap();
    let templates_path = temp_dir.path().join("templates.toml");
    fs::write(&templates_path, "greeting = \"Ready to talk about {title}.\"\n")
        .await
        .unwrap();

    let config = ConfigBuilder::new()
        .with_seed(1)
        .with_simulated_delay_ms(0)
        .with_data_dir(temp_dir.path().join("data"))
        .with_templates_file(templates_path)
        .build();

    let mut service = ChatService::from_config(&config).unwrap();
    let video = service.open_video("https://youtu.be/dQw4w9WgXcQ").await.unwrap();

    let greeting = &service.active_session().unwrap().messages[0].content;
    assert_eq!(greeting, &format!("Ready to talk about {}.", video.title));
    assert!(temp_dir.path().join("data").join("video_chats.json").exists());
}

#[tokio::test]
async fn test_broken_template_file_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let templates_path = temp_dir.path().join("templates.toml");
    fs::write(&templates_path, "not_found = []\n").await.unwrap();

    let config = ConfigBuilder::new()
        .with_memory_storage()
        .with_templates_file(templates_path)
        .build();

    assert!(matches!(
        ChatService::load_templates(&config),
        Err(vidchat::ChatError::Templates(_))
    ));
}
