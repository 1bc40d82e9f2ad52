//! Value objects exchanged with the oracle and owned by the mode state machines.
//!
//! Field names serialize in camelCase, which is both the oracle's JSON
//! contract and the persisted history format.

use crate::i18n::Language;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of questions every generated quiz must contain.
pub const QUIZ_QUESTION_COUNT: usize = 5;

/// Built-in quiz topics. The first entry is the default selection.
pub const QUIZ_TOPICS: [&str; 6] = [
    "Greetings & Basic Phrases",
    "Ordering Food & Drinks",
    "Travel & Directions",
    "Numbers & Telling Time",
    "Common Verbs & Grammar",
    "Shopping & Money",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarPoint {
    pub rule: String,
    pub explanation: String,
    pub example: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub usage: String,
}

/// Translation plus the linguistic insight shown to the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<String>,
    pub grammar_points: Vec<GrammarPoint>,
    pub native_tips: String,
    pub vocabulary: Vec<VocabularyItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// One multiple-choice question.
///
/// `options` and `options_transliteration` are parallel and
/// `correct_answer_index` always indexes into `options`; the quiz parser
/// refuses to build a question that breaks either rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Question text, always in English
    pub question: String,
    pub question_transliteration: String,
    /// Options in the target language's native script
    pub options: Vec<String>,
    /// Romanized rendering of each option
    pub options_transliteration: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_answer_index
    }

    /// Option text in native script, or romanized when `romanized` is set.
    pub fn option_label(&self, index: usize, romanized: bool) -> Option<&str> {
        let source = if romanized {
            &self.options_transliteration
        } else {
            &self.options
        };
        source.get(index).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSet {
    pub topic: String,
    pub language: String,
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechChallenge {
    pub phrase_to_speak: String,
    pub translation: String,
    pub target_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechEvaluation {
    /// Always within 0..=100
    pub score: u8,
    pub accuracy_feedback: String,
    pub pronunciation_tips: String,
    pub naturalness: String,
}

/// A past translation kept in session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub source_text: String,
    pub target_text: String,
    pub source_lang: Language,
    pub target_lang: Language,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub result: TranslationResult,
}

impl HistoryItem {
    /// Build a fresh entry for a translation that just succeeded.
    pub fn new(
        source_text: impl Into<String>,
        source_lang: Language,
        target_lang: Language,
        result: TranslationResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source_text: source_text.into(),
            target_text: result.translated_text.clone(),
            source_lang,
            target_lang,
            timestamp: Utc::now().timestamp_millis(),
            result,
        }
    }
}
