//! Natural-language instructions sent to the model for each operation.

use crate::models::{Difficulty, QUIZ_QUESTION_COUNT};

/// Build the translate-and-explain instruction
pub fn translation_prompt(text: &str, source_language: &str, target_language: &str) -> String {
    format!(
        "Translate this text from {} to {} and provide a detailed linguistic explanation for a language learner: \"{}\"",
        source_language, target_language, text
    )
}

/// Build the quiz instruction.
///
/// Questions and explanations stay in English whatever the difficulty;
/// every option carries a Romanized twin.
pub fn quiz_prompt(language: &str, topic: &str, difficulty: Difficulty) -> String {
    format!(
        r#"Generate a NEW and UNIQUE {count}-question multiple choice quiz for a student learning {language}.
Difficulty: {difficulty}. Topic: {topic}.
Each question must have exactly 4 options.
CRITICAL: The QUESTION itself must ALWAYS be in English.
For every OPTION, provide BOTH the version in the native {language} script AND its Romanized transliteration (using English letters/Latin script).
The explanation must be in English."#,
        count = QUIZ_QUESTION_COUNT,
        language = language,
        difficulty = difficulty,
        topic = topic,
    )
}

pub fn speech_challenge_prompt(language: &str, difficulty: Difficulty) -> String {
    format!(
        "Provide a common and useful sentence in {} for a student at {} level to practice speaking. Also provide the English translation.",
        language, difficulty
    )
}

pub fn speech_evaluation_prompt(expected: &str, transcript: &str, language: &str) -> String {
    format!(
        r#"As a language coach, evaluate how well a student said a phrase.
Expected phrase in {language}: "{expected}"
What the student actually said (transcribed): "{transcript}"
Evaluate accuracy, pronunciation, and flow. Provide an integer score from 0-100."#,
        language = language,
        expected = expected,
        transcript = transcript,
    )
}

pub fn speech_synthesis_prompt(text: &str) -> String {
    format!("Say clearly: {}", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_prompt_quotes_text() {
        let prompt = translation_prompt("how are you?", "English", "Spanish");
        assert!(prompt.contains("from English to Spanish"));
        assert!(prompt.ends_with("\"how are you?\""));
    }

    #[test]
    fn test_quiz_prompt_contract() {
        let prompt = quiz_prompt("Japanese", "Travel & Directions", Difficulty::Advanced);
        assert!(prompt.contains("5-question"));
        assert!(prompt.contains("NEW and UNIQUE"));
        assert!(prompt.contains("Difficulty: advanced"));
        assert!(prompt.contains("Topic: Travel & Directions"));
        assert!(prompt.contains("must ALWAYS be in English"));
        assert!(prompt.contains("native Japanese script"));
        assert!(prompt.contains("Romanized transliteration"));
    }

    #[test]
    fn test_speech_challenge_prompt() {
        let prompt = speech_challenge_prompt("Korean", Difficulty::Beginner);
        assert!(prompt.contains("sentence in Korean"));
        assert!(prompt.contains("at beginner level"));
    }

    #[test]
    fn test_speech_evaluation_prompt_includes_both_phrases() {
        let prompt = speech_evaluation_prompt("Bonjour", "bon jour", "French");
        assert!(prompt.contains("Expected phrase in French: \"Bonjour\""));
        assert!(prompt.contains("(transcribed): \"bon jour\""));
        assert!(prompt.contains("0-100"));
    }

    #[test]
    fn test_speech_synthesis_prompt() {
        assert_eq!(speech_synthesis_prompt("Hola"), "Say clearly: Hola");
    }
}
