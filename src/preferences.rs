//! Learner preferences persisted alongside history.

use crate::error::StorageError;
use crate::i18n::Language;
use crate::models::Difficulty;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const PREFERENCES_KEY: &str = "linguist_settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub source_lang: Language,
    pub target_lang: Language,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Preferences {
    pub fn new(source_lang: Language, target_lang: Language) -> Self {
        Self {
            source_lang,
            target_lang,
            difficulty: Difficulty::default(),
        }
    }

    /// Load saved preferences, or `fallback` when none are saved or they
    /// cannot be read.
    pub fn load_or(store: &dyn KeyValueStore, fallback: Preferences) -> Self {
        let raw = match store.get(PREFERENCES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return fallback,
            Err(e) => {
                warn!("Ignoring unreadable preferences: {}", e);
                return fallback;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("Ignoring corrupt preferences: {}", e);
                fallback
            }
        }
    }

    /// Apply the choices given on the command line. Returns `true` when
    /// anything changed and the preferences need saving.
    pub fn override_with(
        &mut self,
        source_lang: Option<Language>,
        target_lang: Option<Language>,
        difficulty: Option<Difficulty>,
    ) -> bool {
        let before = *self;
        if let Some(lang) = source_lang {
            self.source_lang = lang;
        }
        if let Some(lang) = target_lang {
            self.target_lang = lang;
        }
        if let Some(level) = difficulty {
            self.difficulty = level;
        }
        *self != before
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(self).map_err(|e| StorageError::Serialize(e.to_string()))?;
        store.set(PREFERENCES_KEY, &json)
    }
}
