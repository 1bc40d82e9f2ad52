//! Supported languages with their playback voices and recognition locales.
//!
//! Built once on first access and immutable afterwards.

use std::sync::OnceLock;

/// Prebuilt voice used when a language has no dedicated one.
pub const DEFAULT_VOICE: &str = "Kore";

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "es", "ja")
    pub code: &'static str,

    /// English name of the language, used when instructing the model
    pub name: &'static str,

    /// Native name of the language (e.g., "Español", "日本語")
    pub native_name: &'static str,

    /// Prebuilt TTS voice for native playback
    pub voice: &'static str,
}

impl LanguageConfig {
    /// Locale handed to the speech recognizer.
    ///
    /// English is pinned to `en-US`; every other language uses its bare code.
    pub fn recognition_locale(&self) -> &'static str {
        if self.code == "en" {
            "en-US"
        } else {
            self.code
        }
    }
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// All languages, in display order.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// English name for a code, or the code itself when it is not registered.
    pub fn display_name<'a>(&self, code: &'a str) -> &'a str {
        match self.get_by_code(code) {
            Some(config) => config.name,
            None => code,
        }
    }

    /// Prebuilt TTS voice for a code, falling back to [`DEFAULT_VOICE`].
    pub fn voice_for(&self, code: &str) -> &'static str {
        self.get_by_code(code)
            .map(|lang| lang.voice)
            .unwrap_or(DEFAULT_VOICE)
    }
}

fn lang(
    code: &'static str,
    name: &'static str,
    native_name: &'static str,
    voice: &'static str,
) -> LanguageConfig {
    LanguageConfig {
        code,
        name,
        native_name,
        voice,
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    vec![
        lang("en", "English", "English", DEFAULT_VOICE),
        lang("es", "Spanish", "Español", "Puck"),
        lang("fr", "French", "Français", "Charon"),
        lang("de", "German", "Deutsch", "Fenrir"),
        lang("it", "Italian", "Italiano", "Zephyr"),
        lang("pt", "Portuguese", "Português", "Zephyr"),
        lang("hi", "Hindi", "हिन्दी", "Kore"),
        lang("te", "Telugu", "తెలుగు", "Puck"),
        lang("ta", "Tamil", "தமிழ்", "Charon"),
        lang("ar", "Arabic", "العربية", "Fenrir"),
        lang("ja", "Japanese", "日本語", "Kore"),
        lang("ko", "Korean", "한국어", "Puck"),
        lang("zh", "Chinese", "中文", "Zephyr"),
    ]
}
