//! Chat-session persistence.
//!
//! One pretty-printed JSON file per session in the chat-history directory.
//! Every session is loaded into memory at startup and each mutation rewrites
//! its file in full. Single-user, single-process by design.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

const TITLE_FROM_NAME_LEN: usize = 30;
const TITLE_FROM_MESSAGE_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    pub document_name: String,
    pub doc_id: String,
    pub created_at: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
}

/// In-memory session map backed by one JSON file per session.
pub struct SessionStore {
    dir: PathBuf,
    sessions: RwLock<HashMap<String, ChatSession>>,
}

impl SessionStore {
    /// Opens the store and eagerly loads every `*.json` session file.
    /// Unreadable files are logged and skipped.
    pub fn new(dir: PathBuf) -> Result<Self, ApiError> {
        fs::create_dir_all(&dir).map_err(ApiError::internal)?;
        let sessions = load_all(&dir);
        Ok(Self {
            dir,
            sessions: RwLock::new(sessions),
        })
    }

    pub fn create_session(&self, document_name: &str, doc_id: &str) -> Result<String, ApiError> {
        let now = Utc::now();
        let session_id = now.format("%Y%m%d_%H%M%S_%f").to_string();

        let name_prefix: String = document_name.chars().take(TITLE_FROM_NAME_LEN).collect();
        let session = ChatSession {
            session_id: session_id.clone(),
            document_name: document_name.to_string(),
            doc_id: doc_id.to_string(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Micros, true),
            title: format!("Chat about {}...", name_prefix),
            messages: Vec::new(),
        };

        self.persist(&session)?;
        self.sessions
            .write()
            .unwrap()
            .insert(session_id.clone(), session);

        Ok(session_id)
    }

    /// Appends a message and rewrites the session file. The first user
    /// message becomes the session title, truncated to 50 characters.
    pub fn add_message(
        &self,
        session_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), ApiError> {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", session_id)))?;

        session.messages.push(ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        });

        if role == "user" && session.messages.len() == 1 {
            session.title = derive_title(content);
        }

        let snapshot = session.clone();
        drop(sessions);
        self.persist(&snapshot)
    }

    pub fn get_session(&self, session_id: &str) -> Option<ChatSession> {
        self.sessions.read().unwrap().get(session_id).cloned()
    }

    /// All sessions, most recently created first.
    pub fn list_sessions(&self) -> Vec<ChatSession> {
        let mut sessions: Vec<ChatSession> =
            self.sessions.read().unwrap().values().cloned().collect();
        sessions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.session_id.cmp(&a.session_id))
        });
        sessions
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    /// Removes the session from memory and disk. Returns whether anything
    /// was deleted.
    pub fn delete_session(&self, session_id: &str) -> Result<bool, ApiError> {
        let removed = self
            .sessions
            .write()
            .unwrap()
            .remove(session_id)
            .is_some();

        let path = self.session_path(session_id);
        if path.exists() {
            fs::remove_file(&path).map_err(ApiError::internal)?;
            return Ok(true);
        }

        Ok(removed)
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", session_id))
    }

    fn persist(&self, session: &ChatSession) -> Result<(), ApiError> {
        let json = serde_json::to_string_pretty(session).map_err(ApiError::internal)?;
        fs::write(self.session_path(&session.session_id), json).map_err(ApiError::internal)
    }
}

fn load_all(dir: &PathBuf) -> HashMap<String, ChatSession> {
    let mut sessions = HashMap::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::error!("Failed to read chat history dir {}: {}", dir.display(), err);
            return sessions;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        match fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<ChatSession>(&raw).map_err(|e| e.to_string()))
        {
            Ok(session) => {
                sessions.insert(session.session_id.clone(), session);
            }
            Err(err) => {
                tracing::error!("Skipping unreadable session {}: {}", path.display(), err);
            }
        }
    }

    sessions
}

fn derive_title(first_message: &str) -> String {
    if first_message.chars().count() > TITLE_FROM_MESSAGE_LEN {
        let truncated: String = first_message.chars().take(TITLE_FROM_MESSAGE_LEN).collect();
        format!("{}...", truncated)
    } else {
        first_message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn open_store(dir: &std::path::Path) -> SessionStore {
        SessionStore::new(dir.to_path_buf()).unwrap()
    }

    #[test]
    fn session_round_trips_through_persistence() {
        let tmp = tempfile::tempdir().unwrap();

        let saved = {
            let store = open_store(tmp.path());
            let id = store.create_session("attention.pdf", "abc123").unwrap();
            store.add_message(&id, "user", "What is attention?").unwrap();
            store.add_message(&id, "assistant", "A weighting mechanism.").unwrap();
            store.get_session(&id).unwrap()
        };

        // Fresh store over the same directory sees identical fields.
        let store = open_store(tmp.path());
        let loaded = store.get_session(&saved.session_id).unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.document_name, "attention.pdf");
        assert_eq!(loaded.doc_id, "abc123");
    }

    #[test]
    fn first_user_message_becomes_the_title() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        let id = store.create_session("a-very-long-paper-name-from-arxiv.pdf", "d").unwrap();
        let session = store.get_session(&id).unwrap();
        assert_eq!(session.title, "Chat about a-very-long-paper-name-from-ar...");

        store.add_message(&id, "user", "short question").unwrap();
        assert_eq!(store.get_session(&id).unwrap().title, "short question");

        // Later messages leave the title alone.
        store.add_message(&id, "assistant", "answer").unwrap();
        store.add_message(&id, "user", "second question").unwrap();
        assert_eq!(store.get_session(&id).unwrap().title, "short question");
    }

    #[test]
    fn long_first_message_is_truncated_with_ellipsis() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        let id = store.create_session("paper.pdf", "d").unwrap();
        let long = "x".repeat(80);
        store.add_message(&id, "user", &long).unwrap();

        let title = store.get_session(&id).unwrap().title;
        assert_eq!(title, format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn delete_removes_memory_and_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        let id = store.create_session("paper.pdf", "d").unwrap();
        let path = tmp.path().join(format!("{}.json", id));
        assert!(path.exists());

        assert!(store.delete_session(&id).unwrap());
        assert!(store.get_session(&id).is_none());
        assert!(!path.exists());

        // Gone for a fresh store as well.
        let reopened = open_store(tmp.path());
        assert!(reopened.get_session(&id).is_none());
        assert!(!reopened.delete_session(&id).unwrap());
    }

    #[test]
    fn sessions_list_most_recent_first() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        let first = store.create_session("one.pdf", "d1").unwrap();
        sleep(Duration::from_millis(5));
        let second = store.create_session("two.pdf", "d2").unwrap();
        sleep(Duration::from_millis(5));
        let third = store.create_session("three.pdf", "d3").unwrap();

        let ids: Vec<String> = store
            .list_sessions()
            .into_iter()
            .map(|s| s.session_id)
            .collect();
        assert_eq!(ids, vec![third, second, first]);
    }

    #[test]
    fn unreadable_session_files_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = open_store(tmp.path());
            store.create_session("paper.pdf", "d").unwrap();
        }
        fs::write(tmp.path().join("broken.json"), "{ not json").unwrap();

        let store = open_store(tmp.path());
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn add_message_to_unknown_session_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        let err = store.add_message("missing", "user", "hi").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
