//! Content-addressed, write-through audio cache.
//!
//! Audio for a (text, voice) pair is stored once under a key derived from its
//! content and reused by every later request for the same pair. Resolution is
//! best effort: any failure yields `None` and is only logged.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use chatbox_types::audio::{AUDIO_CONTENT_TYPE, AudioKind};
use tracing::{debug, info, warn};

use crate::audio::speech::SpeechSynthesizer;
use crate::audio::ssml::sanitize_ssml;
use crate::audio::store::ObjectStore;
use crate::service::hash::ContentHasher;

/// Extension of every stored audio object.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Cache tuning.
#[derive(Debug, Clone, Copy)]
pub struct AudioCacheOptions {
    /// Lifetime of issued URLs.
    pub url_ttl_secs: u64,
    /// Bound for each remote call.
    pub timeout: Duration,
}

/// Write-through cache in front of a speech synthesizer and an object store.
///
/// There is no locking: two concurrent misses for the same pair both
/// synthesize and both upload, and the second upload overwrites the first
/// with equivalent audio.
pub struct AudioCache<S: SpeechSynthesizer, O: ObjectStore, H: ContentHasher> {
    speech: S,
    store: O,
    hasher: H,
    options: AudioCacheOptions,
}

impl<S: SpeechSynthesizer, O: ObjectStore, H: ContentHasher> AudioCache<S, O, H> {
    pub fn new(speech: S, store: O, hasher: H, options: AudioCacheOptions) -> Self {
        Self {
            speech,
            store,
            hasher,
            options,
        }
    }

    /// Access the speech synthesizer (used for voice listing).
    pub fn speech(&self) -> &S {
        &self.speech
    }

    /// Object key for a (text, voice) pair.
    ///
    /// The synthesis kind is not part of the key: plain and markup synthesis
    /// of identical text share one entry.
    pub fn fingerprint(&self, text: &str, voice_id: &str) -> String {
        let digest = self.hasher.compute_hash(&format!("{text}{voice_id}"));
        format!("{digest}.{AUDIO_EXTENSION}")
    }

    /// Resolve a playable URL for `text` spoken by `voice_id`.
    ///
    /// Blank text returns `None` without touching any backend. On a miss the
    /// audio is synthesized and stored before a URL is issued, so a returned
    /// URL always points at a stored object.
    pub async fn resolve(&self, text: &str, voice_id: &str, kind: AudioKind) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let key = self.fingerprint(text, voice_id);

        let exists = self.bounded("exists", &key, self.store.exists(&key)).await?;
        if exists {
            debug!(key = %key, "audio cache hit");
        } else {
            info!(key = %key, voice_id, ?kind, "audio cache miss, synthesizing");
            let input = match kind {
                AudioKind::Markup => sanitize_ssml(text),
                AudioKind::Plain => text.into(),
            };
            let audio = self
                .bounded(
                    "synthesize",
                    &key,
                    self.speech.synthesize(&input, kind.text_type(), voice_id),
                )
                .await?;
            self.bounded(
                "put",
                &key,
                self.store.put(&key, audio, AUDIO_CONTENT_TYPE),
            )
            .await?;
        }

        self.bounded(
            "presign",
            &key,
            self.store.presign(&key, self.options.url_ttl_secs),
        )
        .await
    }

    /// Run one remote call under the configured timeout, logging failures.
    async fn bounded<T, E: Display>(
        &self,
        op: &'static str,
        key: &str,
        call: impl Future<Output = Result<T, E>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.options.timeout, call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(op, key = %key, error = %e, "audio unavailable");
                None
            }
            Err(_) => {
                warn!(
                    op,
                    key = %key,
                    timeout_secs = self.options.timeout.as_secs(),
                    "audio unavailable: timed out"
                );
                None
            }
        }
    }
}
