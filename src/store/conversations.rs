//! Multi-session chat history keyed by video id

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::storage::KeyValueStorage;
use crate::error::StorageResult;
use crate::types::{ChatSession, VideoChatSummary};

/// Storage key holding the whole video → sessions index
pub const INDEX_KEY: &str = "video_chats";

/// Video id → sessions, in creation order
pub type VideoChatIndex = BTreeMap<String, Vec<ChatSession>>;

/// Owns the persisted [`VideoChatIndex`]. Every call reads through to
/// storage so writes are visible immediately.
#[derive(Clone)]
pub struct ConversationStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl ConversationStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Load the index. Absent or unreadable data is treated as empty.
    pub fn load_index(&self) -> VideoChatIndex {
        let raw = match self.storage.get(INDEX_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return VideoChatIndex::new(),
            Err(e) => {
                warn!("Failed to read chat history: {}", e);
                return VideoChatIndex::new();
            }
        };

        match serde_json::from_str::<VideoChatIndex>(&raw) {
            Ok(mut index) => {
                // key presence implies a non-empty list
                index.retain(|_, sessions| !sessions.is_empty());
                index
            }
            Err(e) => {
                warn!("Ignoring malformed chat history: {}", e);
                VideoChatIndex::new()
            }
        }
    }

    fn write_index(&self, index: &VideoChatIndex) -> StorageResult<()> {
        if index.is_empty() {
            return self.storage.remove(INDEX_KEY);
        }
        let json = serde_json::to_string(index)?;
        self.storage.set(INDEX_KEY, &json)
    }

    /// Sessions for a video, empty if none
    pub fn get_sessions(&self, video_id: &str) -> Vec<ChatSession> {
        self.load_index().remove(video_id).unwrap_or_default()
    }

    /// Replace the session list of a video. An empty list removes the video.
    pub fn save_sessions(&self, video_id: &str, sessions: &[ChatSession]) -> StorageResult<()> {
        let mut index = self.load_index();
        if sessions.is_empty() {
            index.remove(video_id);
        } else {
            index.insert(video_id.to_string(), sessions.to_vec());
        }
        debug!("Saving {} sessions for video {}", sessions.len(), video_id);
        self.write_index(&index)
    }

    /// Remove one session, and the video key once nothing is left
    pub fn delete_session(&self, video_id: &str, session_id: &str) -> StorageResult<()> {
        let mut index = self.load_index();
        let Some(sessions) = index.get_mut(video_id) else {
            return Ok(());
        };

        sessions.retain(|s| s.id != session_id);
        if sessions.is_empty() {
            index.remove(video_id);
            info!("🗑️  Removed last chat for video {}", video_id);
        }
        self.write_index(&index)
    }

    /// Forget every session of one video
    pub fn clear_video(&self, video_id: &str) -> StorageResult<()> {
        let mut index = self.load_index();
        if index.remove(video_id).is_some() {
            info!("🧹 Cleared chat history for video {}", video_id);
        }
        self.write_index(&index)
    }

    /// Forget everything
    pub fn clear_all(&self) -> StorageResult<()> {
        info!("🧹 Cleared all chat history");
        self.storage.remove(INDEX_KEY)
    }

    /// One summary row per video, most recently active first
    pub fn list_videos_with_chats(&self) -> Vec<VideoChatSummary> {
        let mut summaries: Vec<VideoChatSummary> = self
            .load_index()
            .into_iter()
            .filter_map(|(video_id, sessions)| {
                let first = sessions.first()?;
                let last_activity = sessions.iter().map(ChatSession::last_activity).max()?;
                Some(VideoChatSummary {
                    video_title: first.video_title.clone(),
                    session_count: sessions.len(),
                    last_activity,
                    total_message_count: sessions
                        .iter()
                        .map(ChatSession::exchanged_messages)
                        .sum(),
                    video_id,
                })
            })
            .collect();

        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::storage::MemoryStorage;
    use crate::types::ChatMessage;
    use chrono::{Duration, Utc};

    fn store() -> (ConversationStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (ConversationStore::new(storage.clone()), storage)
    }

    fn session(video_id: &str) -> ChatSession {
        ChatSession::new(video_id, &format!("Video {}", video_id), "Hello!".to_string())
    }

    #[test]
    fn test_save_then_get_round_trip() {
        let (store, _) = store();
        let mut first = session("abc");
        first.messages.push(ChatMessage::user("What is this about?"));
        let sessions = vec![first, session("abc")];

        store.save_sessions("abc", &sessions).unwrap();
        assert_eq!(store.get_sessions("abc"), sessions);
        assert!(store.get_sessions("other").is_empty());
    }

    #[test]
    fn test_saving_empty_list_removes_key() {
        let (store, storage) = store();
        store.save_sessions("abc", &[session("abc")]).unwrap();
        store.save_sessions("abc", &[]).unwrap();

        assert!(store.list_videos_with_chats().is_empty());
        assert_eq!(storage.get(INDEX_KEY).unwrap(), None);
    }

    #[test]
    fn test_delete_only_session_removes_video() {
        let (store, _) = store();
        let only = session("abc");
        store.save_sessions("abc", &[only.clone()]).unwrap();
        store.save_sessions("xyz", &[session("xyz")]).unwrap();

        store.delete_session("abc", &only.id).unwrap();

        let videos: Vec<String> = store
            .list_videos_with_chats()
            .into_iter()
            .map(|s| s.video_id)
            .collect();
        assert_eq!(videos, vec!["xyz"]);
    }

    #[test]
    fn test_delete_one_of_many() {
        let (store, _) = store();
        let keep = session("abc");
        let drop = session("abc");
        store.save_sessions("abc", &[keep.clone(), drop.clone()]).unwrap();

        store.delete_session("abc", &drop.id).unwrap();
        assert_eq!(store.get_sessions("abc"), vec![keep]);

        // unknown ids are a no-op
        store.delete_session("abc", "missing").unwrap();
        store.delete_session("nope", "missing").unwrap();
        assert_eq!(store.get_sessions("abc").len(), 1);
    }

    #[test]
    fn test_clear_video_and_clear_all() {
        let (store, _) = store();
        store.save_sessions("abc", &[session("abc")]).unwrap();
        store.save_sessions("xyz", &[session("xyz")]).unwrap();

        store.clear_video("abc").unwrap();
        assert!(store.get_sessions("abc").is_empty());
        assert_eq!(store.get_sessions("xyz").len(), 1);

        store.clear_all().unwrap();
        assert!(store.list_videos_with_chats().is_empty());
    }

    #[test]
    fn test_malformed_json_reads_as_empty() {
        let (store, storage) = store();
        storage.set(INDEX_KEY, "{not json").unwrap();

        assert!(store.get_sessions("abc").is_empty());
        assert!(store.list_videos_with_chats().is_empty());

        // a write replaces the garbage
        store.save_sessions("abc", &[session("abc")]).unwrap();
        assert_eq!(store.get_sessions("abc").len(), 1);
    }

    #[test]
    fn test_listing_summaries_and_order() {
        let (store, _) = store();
        let now = Utc::now();

        let mut a = session("aaa");
        a.messages[0].timestamp = now - Duration::hours(2);
        let mut a2 = session("aaa");
        a2.messages[0].timestamp = now - Duration::hours(3);
        a2.messages.push(ChatMessage::user("q1"));
        a2.messages.push(ChatMessage::assistant("a1", Some("0:10".to_string())));
        a2.messages[1].timestamp = now - Duration::hours(3);
        a2.messages[2].timestamp = now - Duration::hours(3);

        let mut b = session("bbb");
        b.messages[0].timestamp = now - Duration::hours(1);

        store.save_sessions("aaa", &[a.clone(), a2]).unwrap();
        store.save_sessions("bbb", &[b]).unwrap();

        let listing = store.list_videos_with_chats();
        assert_eq!(listing[0].video_id, "bbb");
        assert_eq!(listing[1].video_id, "aaa");
        assert_eq!(listing[1].video_title, "Video aaa");
        assert_eq!(listing[1].session_count, 2);
        assert_eq!(listing[1].total_message_count, 2);

        // newer activity on aaa moves it to the front
        a.messages.push(ChatMessage::user("later question"));
        let mut sessions = store.get_sessions("aaa");
        sessions[0] = a;
        store.save_sessions("aaa", &sessions).unwrap();

        let listing = store.list_videos_with_chats();
        assert_eq!(listing[0].video_id, "aaa");
        assert!(listing
            .windows(2)
            .all(|w| w[0].last_activity >= w[1].last_activity));
    }
}
