//! Hosted synthesis backends
//!
//! Each backend turns text into MP3 bytes with a caller-supplied key, so
//! credential rotation stays in the dispatcher and the backends stay
//! stateless.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::lang::Language;
use crate::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Voice selection by presentation rather than provider-specific ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    #[default]
    Female,
    Male,
}

/// One synthesis call, provider-agnostic
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub gender: Gender,
    pub language: Language,
    pub speed: f32,
}

/// A hosted text-to-speech provider
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Synthesize the request into MP3 bytes using the given credential
    ///
    /// Must return [`Error::AuthOrQuota`] for rejections that should rotate
    /// to the next credential (quota exhausted or key revoked) and any
    /// other error for failures that should fail over to the next tier.
    async fn synthesize(&self, request: &SynthesisRequest, api_key: &str) -> Result<Vec<u8>>;
}

fn classify_status(provider: &str, status: StatusCode, body: String) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::UNAUTHORIZED {
        Error::AuthOrQuota {
            provider: provider.to_string(),
            status: status.as_u16(),
        }
    } else {
        Error::Tts(format!("{provider} error {status}: {body}"))
    }
}

/// ElevenLabs, the primary voice tier
pub struct ElevenLabs {
    client: reqwest::Client,
}

impl ElevenLabs {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    const fn voice_id(gender: Gender) -> &'static str {
        match gender {
            Gender::Female => "EXAVITQu4vr4xnSDxMaL",
            Gender::Male => "TxGEqnHWrfWFTfGW9XjX",
        }
    }

    const fn model_id(language: Language) -> &'static str {
        match language {
            Language::Hindi => "eleven_multilingual_v2",
            Language::English => "eleven_monolingual_v1",
        }
    }
}

#[async_trait]
impl SynthesisBackend for ElevenLabs {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    async fn synthesize(&self, request: &SynthesisRequest, api_key: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct VoiceSettings {
            stability: f32,
            similarity_boost: f32,
        }

        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
            voice_settings: VoiceSettings,
        }

        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}",
            Self::voice_id(request.gender)
        );

        let body = TtsRequest {
            text: &request.text,
            model_id: Self::model_id(request.language),
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(self.name(), status, text));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Groq `PlayAI`, the secondary voice tier
pub struct GroqPlayAi {
    client: reqwest::Client,
}

impl GroqPlayAi {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    const fn voice(gender: Gender) -> &'static str {
        match gender {
            Gender::Female => "Ruby-PlayAI",
            Gender::Male => "Mason-PlayAI",
        }
    }
}

#[async_trait]
impl SynthesisBackend for GroqPlayAi {
    fn name(&self) -> &'static str {
        "groq-playai"
    }

    async fn synthesize(&self, request: &SynthesisRequest, api_key: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            response_format: &'a str,
            speed: f32,
        }

        let body = TtsRequest {
            model: "playai-tts",
            input: &request.text,
            voice: Self::voice(request.gender),
            response_format: "mp3",
            speed: request.speed,
        };

        let response = self
            .client
            .post("https://api.groq.com/openai/v1/audio/speech")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(self.name(), status, text));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
