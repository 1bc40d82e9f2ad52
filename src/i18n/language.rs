//! Language type: validated handle into the registry.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated language.
///
/// Only codes present in the registry can be turned into a `Language`.
/// Serializes as its bare code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "es")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };

    pub const SPANISH: Language = Language { code: "es" };

    /// Look up a registered code such as "hi" or "zh".
    pub fn from_code(code: &str) -> Result<Language> {
        match LanguageRegistry::get().get_by_code(code) {
            Some(config) => Ok(Language { code: config.code }),
            None => bail!("Unknown language code: '{}' (see `linguist languages`)", code),
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Registry entry for this language.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// English name of the language (e.g., "Spanish").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Prebuilt TTS voice for this language.
    pub fn voice(&self) -> &'static str {
        LanguageRegistry::get().voice_for(self.code)
    }

    pub fn recognition_locale(&self) -> &'static str {
        self.config().recognition_locale()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Language::from_code(&code).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== from_code Tests ====================

    #[test]
    fn test_from_code_spanish() {
        let language = Language::from_code("es").expect("Should succeed");
        assert_eq!(language, Language::SPANISH);
        assert_eq!(language.name(), "Spanish");
    }

    #[test]
    fn test_from_code_invalid() {
        let result = Language::from_code("xx");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown"));
    }

    #[test]
    fn test_from_code_empty() {
        assert!(Language::from_code("").is_err());
    }

    #[test]
    fn test_constants_are_registered() {
        assert_eq!(Language::from_code("en").unwrap(), Language::ENGLISH);
        assert_eq!(Language::SPANISH.config().code, "es");
    }

    // ==================== Accessor Tests ====================

    #[test]
    fn test_voice_and_locale() {
        let tamil = Language::from_code("ta").unwrap();
        assert_eq!(tamil.voice(), "Charon");
        assert_eq!(tamil.recognition_locale(), "ta");
        assert_eq!(Language::ENGLISH.recognition_locale(), "en-US");
    }

    #[test]
    fn test_display_uses_english_name() {
        let arabic = Language::from_code("ar").unwrap();
        assert_eq!(arabic.to_string(), "Arabic");
        assert_eq!(arabic.native_name(), "العربية");
    }

    // ==================== Serde Tests ====================

    #[test]
    fn test_serializes_as_code() {
        let json = serde_json::to_string(&Language::SPANISH).unwrap();
        assert_eq!(json, "\"es\"");
    }

    #[test]
    fn test_deserialize_validates_code() {
        let lang: Language = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(lang.code(), "fr");

        let err = serde_json::from_str::<Language>("\"klingon\"");
        assert!(err.is_err());
    }
}
