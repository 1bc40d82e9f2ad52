use crate::i18n::Language;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Gemini
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_tts_model: String,
    pub gemini_api_url: String,
    pub request_timeout: Duration,

    // Persistence
    pub data_dir: PathBuf,

    // Defaults for a fresh session
    pub default_source_lang: Language,
    pub default_target_lang: Language,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Gemini
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .context("GEMINI_API_KEY not set")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
            gemini_tts_model: std::env::var("GEMINI_TTS_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash-preview-tts".to_string()),
            gemini_api_url: std::env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),

            // Persistence
            data_dir: std::env::var("LINGUIST_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".linguist")),

            default_source_lang: language_var("DEFAULT_SOURCE_LANG", "en")?,
            default_target_lang: language_var("DEFAULT_TARGET_LANG", "es")?,
        })
    }
}

fn language_var(name: &str, default: &str) -> Result<Language> {
    let code = std::env::var(name).unwrap_or_else(|_| default.to_string());
    Language::from_code(&code).with_context(|| format!("{} is not a supported language", name))
}
