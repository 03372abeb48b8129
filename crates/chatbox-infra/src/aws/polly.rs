//! PollySynthesizer -- concrete [`SpeechSynthesizer`] for Amazon Polly.
//!
//! Uses the Polly REST API directly: `POST /v1/speech` for neural MP3
//! synthesis and `GET /v1/voices?Engine=neural` for the voice catalogue.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use chatbox_core::audio::speech::SpeechSynthesizer;
use chatbox_types::audio::{SpeechError, TextType, Voice};

use super::sigv4::{AwsSigner, SignableRequest};
use crate::crypto::hash::sha256_hex;

const SERVICE: &str = "polly";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SynthesizeSpeechRequest<'a> {
    engine: &'a str,
    output_format: &'a str,
    text: &'a str,
    text_type: TextType,
    voice_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeVoicesResponse {
    #[serde(default)]
    voices: Vec<PollyVoice>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PollyVoice {
    id: String,
    name: String,
    #[serde(default)]
    gender: String,
    language_code: String,
    #[serde(default)]
    language_name: String,
}

impl From<PollyVoice> for Voice {
    fn from(v: PollyVoice) -> Self {
        Voice {
            id: v.id,
            name: v.name,
            gender: v.gender,
            language_code: v.language_code,
            language_name: v.language_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PollyErrorBody {
    #[serde(default, alias = "Message")]
    message: String,
}

/// Amazon Polly speech synthesizer (neural engine, MP3 output).
pub struct PollySynthesizer {
    client: reqwest::Client,
    signer: Arc<AwsSigner>,
    host: String,
}

impl PollySynthesizer {
    pub fn new(signer: Arc<AwsSigner>, timeout: Duration) -> Result<Self, SpeechError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpeechError::Provider(format!("failed to build HTTP client: {e}")))?;
        let host = format!("polly.{}.amazonaws.com", signer.region());

        Ok(Self {
            client,
            signer,
            host,
        })
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, SpeechError> {
        let payload = body.unwrap_or_default();
        let payload_hash = sha256_hex(&payload);
        let content_headers: &[(&str, &str)] = if payload.is_empty() {
            &[]
        } else {
            &[("content-type", "application/json")]
        };

        let headers = self.signer.sign(
            SERVICE,
            &SignableRequest {
                method: method.as_str(),
                host: &self.host,
                path,
                query,
                headers: content_headers,
                payload_hash: &payload_hash,
            },
            Utc::now(),
        )
        .map_err(|e| SpeechError::Provider(format!("failed to sign request: {e}")))?;

        let mut builder = self
            .client
            .request(method, format!("https://{}{}", self.host, path))
            .query(query);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !payload.is_empty() {
            builder = builder.body(payload);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SpeechError::Provider(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), &body));
        }
        Ok(response)
    }
}

/// Polly answers malformed text or SSML with 400.
fn map_status(status: u16, body: &str) -> SpeechError {
    let message = serde_json::from_str::<PollyErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string());
    match status {
        400 => SpeechError::InvalidInput(message),
        _ => SpeechError::Provider(format!("HTTP {status}: {message}")),
    }
}

impl SpeechSynthesizer for PollySynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        text_type: TextType,
        voice_id: &str,
    ) -> Result<Vec<u8>, SpeechError> {
        let body = serde_json::to_vec(&SynthesizeSpeechRequest {
            engine: "neural",
            output_format: "mp3",
            text,
            text_type,
            voice_id,
        })
        .map_err(|e| SpeechError::InvalidInput(e.to_string()))?;

        let response = self
            .send(reqwest::Method::POST, "/v1/speech", &[], Some(body))
            .await?;
        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Provider(format!("failed to read audio stream: {e}")))?;

        debug!(voice_id, %text_type, bytes = audio.len(), "polly synthesized speech");
        Ok(audio.to_vec())
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let mut voices = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut query = vec![("Engine", "neural")];
            if let Some(token) = next_token.as_deref() {
                query.push(("NextToken", token));
            }

            let page: DescribeVoicesResponse = self
                .send(reqwest::Method::GET, "/v1/voices", &query, None)
                .await?
                .json()
                .await
                .map_err(|e| SpeechError::Provider(format!("failed to parse voices: {e}")))?;

            voices.extend(page.voices.into_iter().map(Voice::from));
            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(voices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesize_body() {
        let body = serde_json::to_value(SynthesizeSpeechRequest {
            engine: "neural",
            output_format: "mp3",
            text: "<speak>Hi</speak>",
            text_type: TextType::Ssml,
            voice_id: "Joanna",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "Engine": "neural",
                "OutputFormat": "mp3",
                "Text": "<speak>Hi</speak>",
                "TextType": "ssml",
                "VoiceId": "Joanna",
            })
        );
    }

    #[test]
    fn test_voice_page_parsing() {
        let raw = r#"{
            "Voices": [
                {"Gender": "Female", "Id": "Joanna", "LanguageCode": "en-US",
                 "LanguageName": "US English", "Name": "Joanna",
                 "SupportedEngines": ["neural", "standard"]}
            ],
            "NextToken": "abc"
        }"#;
        let page: DescribeVoicesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(page.next_token.as_deref(), Some("abc"));
        let voice = Voice::from(page.voices.into_iter().next().unwrap());
        assert_eq!(voice.id, "Joanna");
        assert_eq!(voice.language_name, "US English");
        assert!(voice.is_english());
    }

    #[test]
    fn test_status_mapping() {
        let err = map_status(400, r#"{"message": "Invalid SSML request"}"#);
        assert!(matches!(err, SpeechError::InvalidInput(m) if m == "Invalid SSML request"));
        let err = map_status(500, "boom");
        assert!(matches!(err, SpeechError::Provider(m) if m == "HTTP 500: boom"));
    }
}
