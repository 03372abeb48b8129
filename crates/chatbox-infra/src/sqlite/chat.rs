//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `chatbox-core` using sqlx with split
//! read/write pools. A session's history lives in one JSON TEXT column; turns
//! are appended inside a writer transaction that re-reads the stored history,
//! so two turns on the same session never overwrite each other.

use chatbox_core::chat::repository::ChatRepository;
use chatbox_types::chat::{
    ChatSession, Message, SessionSummary, TurnCommit, display_name_from,
};
use chatbox_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
#[derive(Clone)]
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain ChatSession.
struct ChatSessionRow {
    id: String,
    owner_id: Option<i64>,
    persona_id: Option<i64>,
    model_version: Option<String>,
    system_prompt: Option<String>,
    display_name: Option<String>,
    history: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            persona_id: row.try_get("persona_id")?,
            model_version: row.try_get("model_version")?,
            system_prompt: row.try_get("system_prompt")?,
            display_name: row.try_get("display_name")?,
            history: row.try_get("history")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;

        Ok(ChatSession {
            id,
            owner_id: self.owner_id,
            persona_id: self.persona_id,
            model_version: self.model_version,
            system_prompt: self.system_prompt,
            display_name: self.display_name,
            history: parse_history(&self.history)?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Internal row type for the per-user session listing.
struct SessionSummaryRow {
    id: String,
    updated_at: String,
    display_name: Option<String>,
}

impl SessionSummaryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            updated_at: row.try_get("updated_at")?,
            display_name: row.try_get("display_name")?,
        })
    }

    fn into_summary(self) -> Result<SessionSummary, RepositoryError> {
        Ok(SessionSummary {
            session_id: Uuid::parse_str(&self.id)
                .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?,
            updated_at: parse_datetime(&self.updated_at)?,
            title: self.display_name,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_history(json: &str) -> Result<Vec<Message>, RepositoryError> {
    serde_json::from_str(json)
        .map_err(|e| RepositoryError::Query(format!("invalid history: {e}")))
}

fn format_history(history: &[Message]) -> Result<String, RepositoryError> {
    serde_json::to_string(history)
        .map_err(|e| RepositoryError::Query(format!("history serialization: {e}")))
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, owner_id, persona_id, model_version, system_prompt,
                   display_name, history, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.owner_id)
        .bind(session.persona_id)
        .bind(&session.model_version)
        .bind(&session.system_prompt)
        .bind(&session.display_name)
        .bind(format_history(&session.history)?)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_user_sessions(&self, owner_id: i64) -> Result<Vec<SessionSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT id, updated_at, display_name FROM chat_sessions
               WHERE owner_id = ? AND display_name IS NOT NULL
               ORDER BY updated_at DESC"#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                SessionSummaryRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_summary()
            })
            .collect()
    }

    async fn commit_turn(
        &self,
        session_id: &Uuid,
        turn: &TurnCommit,
    ) -> Result<ChatSession, RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;
        let mut session = ChatSessionRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_session()?;

        if session.history.is_empty() && session.display_name.is_none() {
            session.display_name = Some(display_name_from(&turn.user_message.content));
        }
        session.history.push(turn.user_message.clone());
        session.history.push(turn.model_message.clone());
        if let Some(persona_id) = turn.persona_id {
            session.persona_id = Some(persona_id);
        }
        if let Some(model_version) = &turn.model_version {
            session.model_version = Some(model_version.clone());
        }
        session.updated_at = Utc::now();

        sqlx::query(
            r#"UPDATE chat_sessions
               SET history = ?, display_name = ?, persona_id = ?, model_version = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(format_history(&session.history)?)
        .bind(&session.display_name)
        .bind(session.persona_id)
        .bind(&session.model_version)
        .bind(format_datetime(&session.updated_at))
        .bind(session_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chatbox_core::audio::cache::{AudioCache, AudioCacheOptions};
    use chatbox_core::audio::speech::SpeechSynthesizer;
    use chatbox_core::audio::store::ObjectStore;
    use chatbox_core::chat::service::{ChatService, ChatSettings};
    use chatbox_core::llm::provider::LlmProvider;
    use chatbox_types::audio::{SpeechError, StoreError, TextType, Voice};
    use chatbox_types::chat::{Role, SendMessageRequest, StartSessionRequest};
    use chatbox_types::config::ChatboxConfig;
    use chatbox_types::llm::{
        CompletionRequest, CompletionResponse, FinishReason, LlmError, TokenCount, Usage,
    };

    use crate::crypto::hash::Sha256ContentHasher;
    use crate::sqlite::persona::SqlitePersonaRepository;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_session(owner_id: Option<i64>) -> ChatSession {
        let now = Utc::now();
        ChatSession {
            id: Uuid::now_v7(),
            owner_id,
            persona_id: None,
            model_version: None,
            system_prompt: Some("Be kind.".to_string()),
            display_name: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn turn(user: &str, reply: &str) -> TurnCommit {
        TurnCommit {
            user_message: Message::user(user),
            model_message: Message::model(reply),
            persona_id: None,
            model_version: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let session = make_session(Some(3));

        repo.create_session(&session).await.unwrap();
        let fetched = repo.get_session(&session.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, session.id);
        assert_eq!(fetched.owner_id, Some(3));
        assert_eq!(fetched.system_prompt.as_deref(), Some("Be kind."));
        assert!(fetched.history.is_empty());
        assert!(repo.get_session(&Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_turn_appends_and_names_once() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let session = make_session(None);
        repo.create_session(&session).await.unwrap();

        let first = repo.commit_turn(&session.id, &turn("Hello there", "Hi!")).await.unwrap();
        assert_eq!(first.display_name.as_deref(), Some("Hello there"));

        let second = repo
            .commit_turn(&session.id, &turn("Different words", "Sure."))
            .await
            .unwrap();
        assert_eq!(second.display_name.as_deref(), Some("Hello there"));
        assert_eq!(second.history.len(), 4);

        let stored = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.history, second.history);
        assert!(stored.updated_at >= session.updated_at);
    }

    #[tokio::test]
    async fn test_commit_turn_keeps_markup_and_audio() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let session = make_session(None);
        repo.create_session(&session).await.unwrap();
        let mut t = turn("Hi", "Hello");
        t.model_message.markup = Some("<speak>Hello</speak>".to_string());
        t.model_message.audio_ref = Some("https://audio.test/abc.mp3".to_string());
        t.model_version = Some("gemini-2.0-flash".to_string());

        repo.commit_turn(&session.id, &t).await.unwrap();

        let stored = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.history[1], t.model_message);
        assert_eq!(stored.model_version.as_deref(), Some("gemini-2.0-flash"));
    }

    #[tokio::test]
    async fn test_commit_turn_missing_session() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let err = repo
            .commit_turn(&Uuid::now_v7(), &turn("Hi", "Hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_history_untouched() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let session = make_session(None);
        repo.create_session(&session).await.unwrap();
        let mut t = turn("Hi", "Hello");
        t.persona_id = Some(404);

        // The persona does not exist, so the foreign key rejects the update.
        assert!(repo.commit_turn(&session.id, &t).await.is_err());

        let stored = repo.get_session(&session.id).await.unwrap().unwrap();
        assert!(stored.history.is_empty());
        assert!(stored.display_name.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_turns_do_not_lose_messages() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let session = make_session(None);
        repo.create_session(&session).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..5 {
            let repo = repo.clone();
            let id = session.id;
            handles.push(tokio::spawn(async move {
                repo.commit_turn(&id, &turn(&format!("q{i}"), &format!("a{i}")))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.history.len(), 10);
    }

    #[tokio::test]
    async fn test_list_user_sessions() {
        let repo = SqliteChatRepository::new(test_pool().await);
        let older = make_session(Some(1));
        let newer = make_session(Some(1));
        let unnamed = make_session(Some(1));
        let other_user = make_session(Some(2));
        for s in [&older, &newer, &unnamed, &other_user] {
            repo.create_session(s).await.unwrap();
        }
        repo.commit_turn(&older.id, &turn("First", "ok")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        repo.commit_turn(&newer.id, &turn("Second", "ok")).await.unwrap();
        repo.commit_turn(&other_user.id, &turn("Elsewhere", "ok")).await.unwrap();

        let list = repo.list_user_sessions(1).await.unwrap();

        let titles: Vec<&str> = list.iter().filter_map(|s| s.title.as_deref()).collect();
        assert_eq!(titles, ["Second", "First"]);
        assert_eq!(list[0].session_id, newer.id);
    }

    // --- End-to-end turn over SQLite with fake providers ---

    struct EchoLlm;

    impl LlmProvider for EchoLlm {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(CompletionResponse {
                content: format!("[DISPLAY_TEXT]\nYou said: {last}\n[SSML_TEXT]\n<speak>You said: {last}</speak>"),
                model: request.model.clone(),
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
            })
        }

        async fn count_tokens(&self, _model: &str, messages: &[Message]) -> Result<TokenCount, LlmError> {
            Ok(TokenCount {
                total_tokens: messages.len() as u32,
            })
        }
    }

    #[derive(Default)]
    struct CountingSpeech {
        calls: AtomicUsize,
    }

    impl SpeechSynthesizer for CountingSpeech {
        async fn synthesize(&self, text: &str, _t: TextType, _voice: &str) -> Result<Vec<u8>, SpeechError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.as_bytes().to_vec())
        }

        async fn list_voices(&self) -> Result<Vec<Voice>, SpeechError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct NullStore;

    impl ObjectStore for NullStore {
        async fn exists(&self, _key: &str) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn put(&self, _key: &str, _bytes: Vec<u8>, _ct: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn presign(&self, key: &str, _ttl: u64) -> Result<String, StoreError> {
            Ok(format!("https://bucket.test/{key}"))
        }
    }

    #[tokio::test]
    async fn test_two_message_turns_end_to_end() {
        let pool = test_pool().await;
        let service = ChatService::new(
            SqliteChatRepository::new(pool.clone()),
            SqlitePersonaRepository::new(pool.clone()),
            EchoLlm,
            Some(AudioCache::new(
                CountingSpeech::default(),
                NullStore,
                Sha256ContentHasher::new(),
                AudioCacheOptions {
                    url_ttl_secs: 60,
                    timeout: Duration::from_secs(5),
                },
            )),
            ChatSettings::from_config(&ChatboxConfig::default()),
        );

        let session = service
            .start_session(StartSessionRequest {
                user_id: Some(11),
                ..Default::default()
            })
            .await
            .unwrap();
        for message in ["Hi", "What's up"] {
            service
                .send_message(
                    &session.id,
                    SendMessageRequest {
                        message: message.to_string(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let stored = service.get_session(&session.id).await.unwrap();
        assert_eq!(stored.display_name.as_deref(), Some("Hi"));
        let roles: Vec<Role> = stored.history.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Model, Role::User, Role::Model]);
        assert_eq!(stored.history[2].content, "What's up");
        assert_eq!(stored.history[3].content, "You said: What's up");
        assert_eq!(
            stored.history[3].markup.as_deref(),
            Some("<speak>You said: What's up</speak>")
        );
        assert!(
            stored.history[3]
                .audio_ref
                .as_deref()
                .unwrap()
                .ends_with(".mp3")
        );

        let listed = service.list_user_sessions(11).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title.as_deref(), Some("Hi"));
    }
}
