//! Chat service orchestrating session lifecycle and message turns.
//!
//! A message turn performs every remote call first (token counting, model
//! completion, audio resolution) and only then commits the new messages in
//! one short repository transaction. A failure before the commit leaves the
//! stored history untouched.

use std::time::Duration;

use chatbox_types::audio::AudioKind;
use chatbox_types::chat::{
    ChatSession, Message, SendMessageRequest, SessionSummary, StartSessionRequest, TurnCommit,
};
use chatbox_types::config::ChatboxConfig;
use chatbox_types::error::{ChatError, RepositoryError};
use chatbox_types::llm::{CompletionRequest, GenerationSettings, LlmError};
use chatbox_types::persona::Persona;
use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audio::cache::AudioCache;
use crate::audio::speech::SpeechSynthesizer;
use crate::audio::store::ObjectStore;
use crate::chat::reply::{ParsedReply, parse_reply};
use crate::chat::repository::ChatRepository;
use crate::chat::window::ConversationWindow;
use crate::llm::provider::LlmProvider;
use crate::llm::token_counter::ModelTokenCounter;
use crate::persona::prompt::PersonaPromptBuilder;
use crate::persona::repository::PersonaRepository;
use crate::service::hash::ContentHasher;

/// Turn-level settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Model used when neither the request nor the session names one.
    pub default_model: String,
    /// Token budget for the conversation window.
    pub max_conversation_tokens: u32,
    /// Generation defaults beneath per-request overrides.
    pub generation: GenerationSettings,
    /// Voice used when the persona has none.
    pub default_voice: String,
    /// Bound for each model call.
    pub remote_timeout: Duration,
}

impl ChatSettings {
    pub fn from_config(config: &ChatboxConfig) -> Self {
        Self {
            default_model: config.model.default_version.clone(),
            max_conversation_tokens: config.model.max_conversation_tokens,
            generation: config.model.generation.clone(),
            default_voice: config.audio.default_voice.clone(),
            remote_timeout: Duration::from_secs(config.remote_timeout_secs),
        }
    }
}

/// Result of a message turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The session as committed, including both new messages.
    pub session: ChatSession,
    /// Model version that produced the reply.
    pub model_version: String,
}

/// Orchestrates chat sessions and message turns.
///
/// Generic over the repositories and providers to maintain clean
/// architecture (chatbox-core never depends on chatbox-infra). Audio is
/// optional; without it turns are stored with no `audio_ref`.
pub struct ChatService<C, P, L, S, O, H>
where
    C: ChatRepository,
    P: PersonaRepository,
    L: LlmProvider,
    S: SpeechSynthesizer,
    O: ObjectStore,
    H: ContentHasher,
{
    chat_repo: C,
    persona_repo: P,
    llm: L,
    audio: Option<AudioCache<S, O, H>>,
    settings: ChatSettings,
}

impl<C, P, L, S, O, H> ChatService<C, P, L, S, O, H>
where
    C: ChatRepository,
    P: PersonaRepository,
    L: LlmProvider,
    S: SpeechSynthesizer,
    O: ObjectStore,
    H: ContentHasher,
{
    pub fn new(
        chat_repo: C,
        persona_repo: P,
        llm: L,
        audio: Option<AudioCache<S, O, H>>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            chat_repo,
            persona_repo,
            llm,
            audio,
            settings,
        }
    }

    /// Access the chat repository.
    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// Whether replies get synthesized audio.
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    // --- Session lifecycle ---

    /// Open a new, empty session.
    ///
    /// A named persona must exist; the session keeps a reference to it.
    pub async fn start_session(
        &self,
        request: StartSessionRequest,
    ) -> Result<ChatSession, ChatError> {
        if let Some(persona_id) = request.persona_id {
            self.persona_repo
                .get(persona_id)
                .await
                .map_err(storage)?
                .ok_or(ChatError::PersonaNotFound(persona_id))?;
        }

        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::now_v7(),
            owner_id: request.user_id,
            persona_id: request.persona_id,
            model_version: non_blank(request.bot_version),
            system_prompt: non_blank(request.system_prompt),
            display_name: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let session = self
            .chat_repo
            .create_session(&session)
            .await
            .map_err(storage)?;

        info!(
            session_id = %session.id,
            owner_id = ?session.owner_id,
            persona_id = ?session.persona_id,
            "chat session started"
        );
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &Uuid) -> Result<ChatSession, ChatError> {
        self.chat_repo
            .get_session(session_id)
            .await
            .map_err(storage)?
            .ok_or(ChatError::SessionNotFound)
    }

    /// Named sessions of a user, most recently updated first.
    pub async fn list_user_sessions(&self, owner_id: i64) -> Result<Vec<SessionSummary>, ChatError> {
        self.chat_repo
            .list_user_sessions(owner_id)
            .await
            .map_err(storage)
    }

    // --- Message turn ---

    /// Run one message turn and commit it.
    ///
    /// Precedence rules:
    /// - model: request `bot_version`, then the session's model, then the
    ///   configured default
    /// - system instruction: request `config.system_instruction`, then the
    ///   session's system prompt, then the persona prompt
    /// - generation settings: request `config`, then configured defaults
    pub async fn send_message(
        &self,
        session_id: &Uuid,
        request: SendMessageRequest,
    ) -> Result<TurnOutcome, ChatError> {
        if request.message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let session = self.get_session(session_id).await?;
        let requested_model = non_blank(request.bot_version);
        let model_version = requested_model
            .clone()
            .or_else(|| session.model_version.clone())
            .unwrap_or_else(|| self.settings.default_model.clone());

        let persona = self.resolve_persona(&session, request.persona_id).await?;
        let overrides = request.config.as_ref();
        let system = overrides
            .and_then(|c| non_blank(c.system_instruction.clone()))
            .or_else(|| session.system_prompt.clone())
            .or_else(|| PersonaPromptBuilder::system_prompt(persona.as_ref()));

        let user_message = Message::user(request.message);
        let mut window = ConversationWindow::from_history(session.history);
        window
            .append(user_message.clone())
            .map_err(|_| ChatError::EmptyMessage)?;

        let counter = ModelTokenCounter::new(&self.llm, &model_version, self.settings.remote_timeout);
        let fit = window
            .fit(&counter, self.settings.max_conversation_tokens)
            .await
            .map_err(|e| llm_failure(e, &model_version))?;
        if fit.dropped > 0 || !fit.within_budget {
            info!(
                session_id = %session_id,
                tokens = fit.tokens,
                dropped = fit.dropped,
                within_budget = fit.within_budget,
                "conversation window truncated"
            );
        }

        let completion = CompletionRequest {
            model: model_version.clone(),
            messages: window.into_messages(),
            system,
            settings: self.settings.generation.overlay(overrides),
        };
        let response = match tokio::time::timeout(
            self.settings.remote_timeout,
            self.llm.complete(&completion),
        )
        .await
        {
            Ok(result) => result.map_err(|e| llm_failure(e, &model_version))?,
            Err(_) => {
                return Err(llm_failure(
                    LlmError::Timeout(self.settings.remote_timeout.as_secs()),
                    &model_version,
                ));
            }
        };
        debug!(
            session_id = %session_id,
            model = %response.model,
            finish_reason = %response.finish_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model replied"
        );
        if response.content.trim().is_empty() {
            return Err(llm_failure(
                LlmError::EmptyResponse(response.finish_reason.to_string()),
                &model_version,
            ));
        }

        let parsed = parse_reply(&response.content);
        let audio_ref = self.resolve_audio(&parsed, persona.as_ref()).await;
        let model_message = Message {
            audio_ref,
            markup: parsed.markup,
            ..Message::model(parsed.display_text)
        };

        let turn = TurnCommit {
            user_message,
            model_message,
            persona_id: request.persona_id,
            model_version: requested_model,
        };
        let session = self
            .chat_repo
            .commit_turn(session_id, &turn)
            .await
            .map_err(|e| {
                // Log the generated reply so it can be recovered by hand.
                error!(
                    session_id = %session_id,
                    user_message = %turn.user_message.content,
                    reply = %turn.model_message.content,
                    markup = ?turn.model_message.markup,
                    error = %e,
                    "reply generated but not persisted"
                );
                match e {
                    RepositoryError::NotFound => ChatError::SessionNotFound,
                    other => ChatError::Persistence(other.to_string()),
                }
            })?;

        info!(
            session_id = %session_id,
            model = %model_version,
            messages = session.history.len(),
            "message turn committed"
        );
        Ok(TurnOutcome {
            session,
            model_version,
        })
    }

    /// The persona for this turn: the requested one, else the session's.
    ///
    /// A requested persona must exist. A stale session reference falls back
    /// to no persona.
    async fn resolve_persona(
        &self,
        session: &ChatSession,
        requested: Option<i64>,
    ) -> Result<Option<Persona>, ChatError> {
        if let Some(id) = requested {
            let persona = self
                .persona_repo
                .get(id)
                .await
                .map_err(storage)?
                .ok_or(ChatError::PersonaNotFound(id))?;
            return Ok(Some(persona));
        }

        let Some(id) = session.persona_id else {
            return Ok(None);
        };
        let persona = self.persona_repo.get(id).await.map_err(storage)?;
        if persona.is_none() {
            warn!(
                session_id = %session.id,
                persona_id = id,
                "session persona no longer exists, using default prompt"
            );
        }
        Ok(persona)
    }

    /// Best-effort audio for a reply: markup when the model produced it,
    /// display text otherwise.
    async fn resolve_audio(&self, reply: &ParsedReply, persona: Option<&Persona>) -> Option<String> {
        let audio = self.audio.as_ref()?;
        let voice = persona
            .and_then(|p| p.voice_id.as_deref())
            .unwrap_or(&self.settings.default_voice);

        match &reply.markup {
            Some(markup) => audio.resolve(markup, voice, AudioKind::Markup).await,
            None => audio.resolve(&reply.display_text, voice, AudioKind::Plain).await,
        }
    }
}

fn storage(err: RepositoryError) -> ChatError {
    ChatError::Persistence(err.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Map a provider failure onto the chat error taxonomy.
fn llm_failure(err: LlmError, model: &str) -> ChatError {
    match err {
        LlmError::ModelNotFound(_) => ChatError::InvalidModel(model.to_string()),
        LlmError::InvalidRequest(msg) => ChatError::InvalidRequest(msg),
        other => {
            warn!(model, error = %other, "model provider unavailable");
            ChatError::UpstreamUnavailable(other.to_string())
        }
    }
}
