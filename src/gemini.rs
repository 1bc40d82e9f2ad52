//! `LanguageOracle` backed by the Gemini `generateContent` REST endpoint.

use crate::config::Config;
use crate::error::{OracleError, OracleResult, RemoteCallError};
use crate::i18n::LanguageRegistry;
use crate::models::{Difficulty, QuizSet, SpeechChallenge, SpeechEvaluation, TranslationResult};
use crate::oracle::LanguageOracle;
use crate::{prompts, schema};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const SPEECH_SYNTHESIS: &str = "speech synthesis";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateRequest {
    fn text(prompt: String, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt),
                    inline_data: None,
                }],
            }],
            generation_config,
        }
    }

    fn json(prompt: String, response_schema: Value) -> Self {
        Self::text(
            prompt,
            GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(response_schema),
                ..Default::default()
            },
        )
    }

    fn speech(prompt: String, voice: &str) -> Self {
        Self::text(
            prompt,
            GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                }),
                ..Default::default()
            },
        )
    }
}

impl GenerateResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Concatenated text of the first candidate, if it has any.
    fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Audio payload of the first candidate's first part.
    fn audio_data(&self) -> Option<&InlineData> {
        self.first_parts()
            .first()
            .and_then(|p| p.inline_data.as_ref())
            .filter(|d| !d.data.is_empty())
    }
}

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    tts_model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, RemoteCallError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            tts_model: config.gemini_tts_model.clone(),
            base_url: config.gemini_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client with explicit settings, used when no environment config exists.
    pub fn with_settings(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        tts_model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteCallError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            tts_model: tts_model.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn generate(
        &self,
        model: &str,
        operation: &'static str,
        request: &GenerateRequest,
    ) -> OracleResult<GenerateResponse> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(RemoteCallError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(RemoteCallError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body = response.text().await.map_err(RemoteCallError::from)?;
        debug!("{} reply: {} bytes", operation, body.len());

        serde_json::from_str(&body)
            .map_err(|e| OracleError::malformed(operation, format!("invalid envelope: {}", e)))
    }

    /// Run a JSON-mode request and return the reply text for parsing.
    async fn generate_json(
        &self,
        operation: &'static str,
        prompt: String,
        response_schema: Value,
    ) -> OracleResult<String> {
        let request = GenerateRequest::json(prompt, response_schema);
        let response = self.generate(&self.model, operation, &request).await?;

        response
            .text()
            .ok_or_else(|| OracleError::malformed(operation, "reply contained no candidate text"))
    }
}

#[async_trait]
impl LanguageOracle for GeminiClient {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> OracleResult<TranslationResult> {
        if text.trim().is_empty() {
            return Err(OracleError::EmptyInput);
        }

        info!("Translating {} chars {} -> {}", text.len(), source_lang, target_lang);
        let registry = LanguageRegistry::get();
        let prompt = prompts::translation_prompt(
            text,
            registry.display_name(source_lang),
            registry.display_name(target_lang),
        );

        let reply = self
            .generate_json(schema::TRANSLATION, prompt, schema::translation_schema())
            .await?;
        schema::parse_translation(&reply)
    }

    async fn generate_quiz(
        &self,
        language: &str,
        topic: &str,
        difficulty: Difficulty,
    ) -> OracleResult<QuizSet> {
        info!("Generating {} {} quiz on '{}'", difficulty, language, topic);
        let prompt = prompts::quiz_prompt(language, topic, difficulty);

        let reply = self
            .generate_json(schema::QUIZ, prompt, schema::quiz_schema(language))
            .await?;
        schema::parse_quiz(&reply, difficulty)
    }

    async fn generate_speech_challenge(
        &self,
        language: &str,
        difficulty: Difficulty,
    ) -> OracleResult<SpeechChallenge> {
        info!("Generating {} speech challenge in {}", difficulty, language);
        let prompt = prompts::speech_challenge_prompt(language, difficulty);

        let reply = self
            .generate_json(
                schema::SPEECH_CHALLENGE,
                prompt,
                schema::speech_challenge_schema(),
            )
            .await?;
        schema::parse_speech_challenge(&reply)
    }

    async fn evaluate_speech(
        &self,
        expected: &str,
        transcript: &str,
        language: &str,
    ) -> OracleResult<SpeechEvaluation> {
        info!("Evaluating {} speech attempt", language);
        let prompt = prompts::speech_evaluation_prompt(expected, transcript, language);

        let reply = self
            .generate_json(
                schema::SPEECH_EVALUATION,
                prompt,
                schema::speech_evaluation_schema(),
            )
            .await?;
        schema::parse_speech_evaluation(&reply)
    }

    async fn synthesize_speech(&self, text: &str, voice: &str) -> OracleResult<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(OracleError::EmptyInput);
        }

        info!("Synthesizing {} chars with voice {}", text.len(), voice);
        let request = GenerateRequest::speech(prompts::speech_synthesis_prompt(text), voice);
        let response = self
            .generate(&self.tts_model, SPEECH_SYNTHESIS, &request)
            .await?;

        let audio = response.audio_data().ok_or(OracleError::NoAudioData)?;
        debug!(
            "Received {} audio ({} base64 chars)",
            audio.mime_type.as_deref().unwrap_or("unknown"),
            audio.data.len()
        );
        base64::engine::general_purpose::STANDARD
            .decode(&audio.data)
            .map_err(|e| {
                OracleError::malformed(SPEECH_SYNTHESIS, format!("invalid base64 audio: {}", e))
            })
    }
}
