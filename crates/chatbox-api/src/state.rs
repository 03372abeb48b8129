//! Application state wiring all services together.
//!
//! Services are generic over repository and provider traits; AppState pins
//! them to the concrete infra implementations and shares them via `Arc`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;
use tracing::{info, warn};

use chatbox_core::audio::cache::{AudioCache, AudioCacheOptions};
use chatbox_core::chat::service::{ChatService, ChatSettings};
use chatbox_core::persona::service::PersonaService;
use chatbox_infra::aws::{AwsSigner, PollySynthesizer, S3ObjectStore};
use chatbox_infra::config::{self, Credentials};
use chatbox_infra::crypto::hash::Sha256ContentHasher;
use chatbox_infra::llm::GeminiProvider;
use chatbox_infra::sqlite::chat::SqliteChatRepository;
use chatbox_infra::sqlite::persona::SqlitePersonaRepository;
use chatbox_infra::sqlite::pool::DatabasePool;
use chatbox_types::config::ChatboxConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAudioCache = AudioCache<PollySynthesizer, S3ObjectStore, Sha256ContentHasher>;

pub type ConcreteChatService = ChatService<
    SqliteChatRepository,
    SqlitePersonaRepository,
    GeminiProvider,
    PollySynthesizer,
    S3ObjectStore,
    Sha256ContentHasher,
>;

pub type ConcretePersonaService = PersonaService<SqlitePersonaRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub persona_service: Arc<ConcretePersonaService>,
    /// Voice catalogue; `None` when AWS credentials are missing.
    pub speech: Option<Arc<PollySynthesizer>>,
    pub db_pool: DatabasePool,
}

/// Configuration, credentials and data directory resolved at startup.
pub struct Environment {
    pub data_dir: PathBuf,
    pub config: ChatboxConfig,
    pub database_url: String,
    pub gemini_api_key: Option<SecretString>,
    /// Request signer; `None` when AWS credentials are missing.
    pub signer: Option<Arc<AwsSigner>>,
}

impl Environment {
    /// Resolve the data dir, read `config.toml`, and overlay the process environment.
    pub async fn load() -> anyhow::Result<Self> {
        let data_dir = config::resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let lookup = |key: &str| std::env::var(key).ok();
        let mut cfg = config::load_config(&data_dir).await;
        config::apply_env_overrides(&mut cfg, lookup);
        let database_url = config::database_url(&data_dir, lookup);

        let Credentials {
            gemini_api_key,
            aws,
        } = Credentials::from_env();
        let signer = aws.map(|creds| Arc::new(AwsSigner::new(creds, cfg.audio.region.clone())));

        Ok(Self {
            data_dir,
            config: cfg,
            database_url,
            gemini_api_key,
            signer,
        })
    }

    fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.config.remote_timeout_secs)
    }

    /// Polly client, if AWS credentials are configured.
    pub fn speech(&self) -> anyhow::Result<Option<PollySynthesizer>> {
        match &self.signer {
            Some(signer) => Ok(Some(PollySynthesizer::new(signer.clone(), self.remote_timeout())?)),
            None => Ok(None),
        }
    }

    /// Audio cache, if audio is enabled and AWS credentials plus a bucket are configured.
    fn audio_cache(&self) -> anyhow::Result<Option<ConcreteAudioCache>> {
        if !self.config.audio.enabled {
            info!("audio disabled by configuration");
            return Ok(None);
        }
        let (Some(signer), Some(bucket)) = (&self.signer, self.config.audio.bucket.as_deref())
        else {
            warn!("AWS credentials or S3 bucket not configured; replies will have no audio");
            return Ok(None);
        };

        let timeout = self.remote_timeout();
        Ok(Some(AudioCache::new(
            PollySynthesizer::new(signer.clone(), timeout)?,
            S3ObjectStore::new(signer.clone(), bucket, timeout)?,
            Sha256ContentHasher::new(),
            AudioCacheOptions {
                url_ttl_secs: self.config.audio.url_ttl_secs,
                timeout,
            },
        )))
    }
}

impl AppState {
    /// Connect to the database and wire every service.
    pub async fn init(mut env: Environment) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&env.database_url)
            .await
            .with_context(|| format!("failed to open database {}", env.database_url))?;

        let api_key = env
            .gemini_api_key
            .take()
            .context("GEMINI_API_KEY is not set")?;
        let llm = GeminiProvider::new(api_key, env.remote_timeout())?;

        let chat_service = ChatService::new(
            SqliteChatRepository::new(db_pool.clone()),
            SqlitePersonaRepository::new(db_pool.clone()),
            llm,
            env.audio_cache()?,
            ChatSettings::from_config(&env.config),
        );
        let persona_service = PersonaService::new(SqlitePersonaRepository::new(db_pool.clone()));
        let speech = env.speech()?.map(Arc::new);

        info!(
            data_dir = %env.data_dir.display(),
            model = %env.config.model.default_version,
            audio = chat_service.has_audio(),
            "application state initialized"
        );

        Ok(Self {
            chat_service: Arc::new(chat_service),
            persona_service: Arc::new(persona_service),
            speech,
            db_pool,
        })
    }
}
