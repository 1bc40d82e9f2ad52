//! Declared output schemas and the typed parser for each response kind.
//!
//! The schema is sent with the request so the model answers in JSON; the
//! parser then checks the reply independently and refuses to construct a
//! domain value from anything that does not fit. Unknown fields are ignored.

use crate::error::{OracleError, OracleResult};
use crate::models::{
    Difficulty, QuizQuestion, QuizSet, SpeechChallenge, SpeechEvaluation, TranslationResult,
    QUIZ_QUESTION_COUNT,
};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Number, Value};
use std::sync::OnceLock;

pub const TRANSLATION: &str = "translation";
pub const QUIZ: &str = "quiz";
pub const SPEECH_CHALLENGE: &str = "speech challenge";
pub const SPEECH_EVALUATION: &str = "speech evaluation";

// ==================== Declared Schemas ====================

pub fn translation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "translatedText": { "type": "STRING" },
            "transliteration": {
                "type": "STRING",
                "description": "Phonetic pronunciation if the script is different"
            },
            "grammarPoints": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "rule": { "type": "STRING" },
                        "explanation": { "type": "STRING" },
                        "example": { "type": "STRING" }
                    },
                    "required": ["rule", "explanation", "example"]
                }
            },
            "nativeTips": {
                "type": "STRING",
                "description": "Nuance or phrasing tips to sound more natural"
            },
            "vocabulary": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "word": { "type": "STRING" },
                        "meaning": { "type": "STRING" },
                        "usage": { "type": "STRING" }
                    }
                }
            },
            "culturalNote": { "type": "STRING" }
        },
        "required": ["translatedText", "grammarPoints", "nativeTips", "vocabulary"]
    })
}

pub fn quiz_schema(language: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "topic": { "type": "STRING" },
            "language": { "type": "STRING" },
            "difficulty": { "type": "STRING" },
            "questions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": { "type": "STRING", "description": "The question in English" },
                        "questionTransliteration": {
                            "type": "STRING",
                            "description": "Same as the English question"
                        },
                        "options": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": format!("Options in native {} script", language)
                        },
                        "optionsTransliteration": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": "Options in English letters (Romanized)"
                        },
                        "correctAnswerIndex": { "type": "INTEGER" },
                        "explanation": { "type": "STRING" }
                    },
                    "required": [
                        "question",
                        "questionTransliteration",
                        "options",
                        "optionsTransliteration",
                        "correctAnswerIndex",
                        "explanation"
                    ]
                }
            }
        },
        "required": ["topic", "language", "questions"]
    })
}

pub fn speech_challenge_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "phraseToSpeak": { "type": "STRING" },
            "translation": { "type": "STRING" },
            "targetLanguage": { "type": "STRING" }
        },
        "required": ["phraseToSpeak", "translation", "targetLanguage"]
    })
}

pub fn speech_evaluation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "INTEGER", "description": "Score from 0 to 100" },
            "accuracyFeedback": { "type": "STRING" },
            "pronunciationTips": { "type": "STRING" },
            "naturalness": { "type": "STRING" }
        },
        "required": ["score", "accuracyFeedback", "pronunciationTips", "naturalness"]
    })
}

// ==================== Wire Shapes ====================

#[derive(Debug, Deserialize)]
struct QuizWire {
    topic: String,
    language: String,
    #[serde(default)]
    difficulty: Option<String>,
    questions: Vec<QuestionWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionWire {
    question: String,
    question_transliteration: String,
    options: Vec<String>,
    options_transliteration: Vec<String>,
    correct_answer_index: Number,
    explanation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluationWire {
    score: Number,
    accuracy_feedback: String,
    pronunciation_tips: String,
    naturalness: String,
}

// ==================== Parsers ====================

/// Strip a surrounding Markdown code fence, if any.
pub fn unwrap_fenced(text: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("Invalid fence regex")
    });

    match fence.captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str(),
        None => text.trim(),
    }
}

fn decode<T: DeserializeOwned>(operation: &'static str, text: &str) -> OracleResult<T> {
    let body = unwrap_fenced(text);
    if body.is_empty() {
        return Err(OracleError::malformed(operation, "empty reply"));
    }
    serde_json::from_str(body).map_err(|e| OracleError::malformed(operation, e.to_string()))
}

/// Integer value of a JSON number, accepting floats with no fractional part.
fn whole_number(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.as_u64().is_some() {
        return None;
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn parse_translation(text: &str) -> OracleResult<TranslationResult> {
    decode(TRANSLATION, text)
}

/// Parse a quiz reply, enforcing question count and per-question invariants.
///
/// When the reply omits `difficulty`, `requested` is used.
pub fn parse_quiz(text: &str, requested: Difficulty) -> OracleResult<QuizSet> {
    let wire: QuizWire = decode(QUIZ, text)?;

    if wire.questions.len() != QUIZ_QUESTION_COUNT {
        return Err(OracleError::malformed(
            QUIZ,
            format!(
                "expected {} questions, got {}",
                QUIZ_QUESTION_COUNT,
                wire.questions.len()
            ),
        ));
    }

    let difficulty = match wire.difficulty.as_deref() {
        None => requested,
        Some(raw) => raw
            .parse()
            .map_err(|e: String| OracleError::malformed(QUIZ, e))?,
    };

    let questions = wire
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| validate_question(i, q))
        .collect::<OracleResult<Vec<_>>>()?;

    Ok(QuizSet {
        topic: wire.topic,
        language: wire.language,
        difficulty,
        questions,
    })
}

fn validate_question(position: usize, q: QuestionWire) -> OracleResult<QuizQuestion> {
    let invalid = |reason: String| {
        OracleError::malformed(QUIZ, format!("question {}: {}", position + 1, reason))
    };

    if q.options.is_empty() {
        return Err(invalid("no options".to_string()));
    }
    if q.options.len() != q.options_transliteration.len() {
        return Err(invalid(format!(
            "{} options but {} transliterations",
            q.options.len(),
            q.options_transliteration.len()
        )));
    }

    let index = whole_number(&q.correct_answer_index)
        .filter(|i| *i >= 0 && (*i as usize) < q.options.len())
        .ok_or_else(|| {
            invalid(format!(
                "correctAnswerIndex {} is not a valid option index",
                q.correct_answer_index
            ))
        })?;

    Ok(QuizQuestion {
        question: q.question,
        question_transliteration: q.question_transliteration,
        options: q.options,
        options_transliteration: q.options_transliteration,
        correct_answer_index: index as usize,
        explanation: q.explanation,
    })
}

pub fn parse_speech_challenge(text: &str) -> OracleResult<SpeechChallenge> {
    decode(SPEECH_CHALLENGE, text)
}

/// Parse an evaluation reply. Scores outside 0..=100 or with a fractional
/// part are rejected, never clamped.
pub fn parse_speech_evaluation(text: &str) -> OracleResult<SpeechEvaluation> {
    let wire: EvaluationWire = decode(SPEECH_EVALUATION, text)?;

    let score = whole_number(&wire.score)
        .filter(|s| (0..=100).contains(s))
        .ok_or_else(|| {
            OracleError::malformed(
                SPEECH_EVALUATION,
                format!("score {} is not an integer in 0..=100", wire.score),
            )
        })?;

    Ok(SpeechEvaluation {
        score: score as u8,
        accuracy_feedback: wire.accuracy_feedback,
        pronunciation_tips: wire.pronunciation_tips,
        naturalness: wire.naturalness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question_json(options: usize, translits: usize, correct: Value) -> Value {
        json!({
            "question": "Which word means 'water'?",
            "questionTransliteration": "Which word means 'water'?",
            "options": (0..options).map(|i| format!("opt{}", i)).collect::<Vec<_>>(),
            "optionsTransliteration": (0..translits)
                .map(|i| format!("rom{}", i))
                .collect::<Vec<_>>(),
            "correctAnswerIndex": correct,
            "explanation": "Agua is water."
        })
    }

    fn quiz_json(questions: Vec<Value>) -> String {
        json!({
            "topic": "Ordering Food & Drinks",
            "language": "Spanish",
            "questions": questions
        })
        .to_string()
    }

    fn valid_questions() -> Vec<Value> {
        (0..5).map(|_| question_json(4, 4, json!(2))).collect()
    }

    fn evaluation_json(score: Value) -> String {
        json!({
            "score": score,
            "accuracyFeedback": "Clear.",
            "pronunciationTips": "Roll the r.",
            "naturalness": "Natural."
        })
        .to_string()
    }

    // ==================== Fence Tests ====================

    #[test]
    fn test_unwrap_fenced_json_block() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(unwrap_fenced(text), "{\"a\": 1}");
    }

    #[test]
    fn test_unwrap_fenced_plain_text_untouched() {
        assert_eq!(unwrap_fenced("  {\"a\": 1} \n"), "{\"a\": 1}");
    }

    // ==================== Translation Tests ====================

    #[test]
    fn test_parse_translation_minimal() {
        let text = json!({
            "translatedText": "hola",
            "grammarPoints": [],
            "nativeTips": "...",
            "vocabulary": []
        })
        .to_string();
        let result = parse_translation(&text).expect("Should parse");
        assert_eq!(result.translated_text, "hola");
        assert!(result.transliteration.is_none());
        assert!(result.cultural_note.is_none());
    }

    #[test]
    fn test_parse_translation_preserves_order_and_ignores_unknown() {
        let text = json!({
            "translatedText": "こんにちは",
            "transliteration": "konnichiwa",
            "grammarPoints": [
                {"rule": "first", "explanation": "e1", "example": "x1"},
                {"rule": "second", "explanation": "e2", "example": "x2"}
            ],
            "nativeTips": "Bow slightly.",
            "vocabulary": [{"word": "konnichiwa"}],
            "culturalNote": "Used during the day.",
            "confidence": 0.9
        })
        .to_string();

        let result = parse_translation(&text).expect("Should parse");
        assert_eq!(result.grammar_points[0].rule, "first");
        assert_eq!(result.grammar_points[1].rule, "second");
        assert_eq!(result.vocabulary[0].word, "konnichiwa");
        assert_eq!(result.vocabulary[0].meaning, "");
        assert_eq!(result.transliteration.as_deref(), Some("konnichiwa"));
    }

    #[test]
    fn test_parse_translation_missing_required_field() {
        let text = r#"{"translatedText":"hola","grammarPoints":[],"vocabulary":[]}"#;
        let err = parse_translation(text).unwrap_err();
        match err {
            OracleError::MalformedResponse { operation, reason } => {
                assert_eq!(operation, TRANSLATION);
                assert!(reason.contains("nativeTips"));
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_translation_wrong_type() {
        let text = r#"{"translatedText":42,"grammarPoints":[],"nativeTips":"","vocabulary":[]}"#;
        assert!(matches!(
            parse_translation(text),
            Err(OracleError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_parse_translation_empty_reply() {
        assert!(matches!(
            parse_translation("   "),
            Err(OracleError::MalformedResponse { .. })
        ));
    }

    // ==================== Quiz Tests ====================

    #[test]
    fn test_parse_quiz_valid_uses_requested_difficulty() {
        let quiz = parse_quiz(&quiz_json(valid_questions()), Difficulty::Advanced)
            .expect("Should parse");
        assert_eq!(quiz.questions.len(), 5);
        assert_eq!(quiz.difficulty, Difficulty::Advanced);
        assert_eq!(quiz.questions[0].correct_answer_index, 2);
    }

    #[test]
    fn test_parse_quiz_reply_difficulty_wins() {
        let text = json!({
            "topic": "t",
            "language": "Spanish",
            "difficulty": "Intermediate",
            "questions": valid_questions()
        })
        .to_string();
        let quiz = parse_quiz(&text, Difficulty::Beginner).unwrap();
        assert_eq!(quiz.difficulty, Difficulty::Intermediate);
    }

    #[test]
    fn test_parse_quiz_unknown_difficulty_rejected() {
        let text = json!({
            "topic": "t",
            "language": "Spanish",
            "difficulty": "expert",
            "questions": valid_questions()
        })
        .to_string();
        assert!(parse_quiz(&text, Difficulty::Beginner).is_err());
    }

    #[test]
    fn test_parse_quiz_wrong_question_count() {
        let questions: Vec<Value> = (0..4).map(|_| question_json(4, 4, json!(0))).collect();
        let err = parse_quiz(&quiz_json(questions), Difficulty::Beginner).unwrap_err();
        assert!(err.to_string().contains("expected 5 questions, got 4"));
    }

    #[test]
    fn test_parse_quiz_mismatched_transliterations() {
        let mut questions = valid_questions();
        questions[3] = question_json(4, 3, json!(0));
        let err = parse_quiz(&quiz_json(questions), Difficulty::Beginner).unwrap_err();
        assert!(err.to_string().contains("question 4"));
        assert!(err.to_string().contains("4 options but 3 transliterations"));
    }

    #[test]
    fn test_parse_quiz_index_out_of_range() {
        let mut questions = valid_questions();
        questions[0] = question_json(4, 4, json!(4));
        assert!(parse_quiz(&quiz_json(questions), Difficulty::Beginner).is_err());
    }

    #[test]
    fn test_parse_quiz_negative_or_fractional_index() {
        let mut questions = valid_questions();
        questions[1] = question_json(4, 4, json!(-1));
        assert!(parse_quiz(&quiz_json(questions), Difficulty::Beginner).is_err());

        let mut questions = valid_questions();
        questions[1] = question_json(4, 4, json!(1.5));
        assert!(parse_quiz(&quiz_json(questions), Difficulty::Beginner).is_err());
    }

    #[test]
    fn test_parse_quiz_whole_float_index_accepted() {
        let mut questions = valid_questions();
        questions[2] = question_json(4, 4, json!(3.0));
        let quiz = parse_quiz(&quiz_json(questions), Difficulty::Beginner).unwrap();
        assert_eq!(quiz.questions[2].correct_answer_index, 3);
    }

    #[test]
    fn test_parse_quiz_empty_options_rejected() {
        let mut questions = valid_questions();
        questions[0] = question_json(0, 0, json!(0));
        assert!(parse_quiz(&quiz_json(questions), Difficulty::Beginner).is_err());
    }

    // ==================== Speech Tests ====================

    #[test]
    fn test_parse_speech_challenge() {
        let text = json!({
            "phraseToSpeak": "¿Dónde está la estación?",
            "translation": "Where is the station?",
            "targetLanguage": "Spanish"
        })
        .to_string();
        let challenge = parse_speech_challenge(&text).unwrap();
        assert_eq!(challenge.translation, "Where is the station?");
    }

    #[test]
    fn test_parse_speech_challenge_missing_translation() {
        let text = r#"{"phraseToSpeak":"Hola","targetLanguage":"Spanish"}"#;
        assert!(parse_speech_challenge(text).is_err());
    }

    #[test]
    fn test_parse_evaluation_accepts_bounds() {
        assert_eq!(parse_speech_evaluation(&evaluation_json(json!(0))).unwrap().score, 0);
        assert_eq!(parse_speech_evaluation(&evaluation_json(json!(100))).unwrap().score, 100);
        assert_eq!(parse_speech_evaluation(&evaluation_json(json!(85.0))).unwrap().score, 85);
    }

    #[test]
    fn test_parse_evaluation_rejects_out_of_range() {
        for score in [json!(-1), json!(101), json!(1000), json!(85.5)] {
            let err = parse_speech_evaluation(&evaluation_json(score.clone())).unwrap_err();
            assert!(
                matches!(err, OracleError::MalformedResponse { .. }),
                "score {} should be rejected",
                score
            );
        }
    }

    #[test]
    fn test_parse_evaluation_rejects_non_numeric() {
        assert!(parse_speech_evaluation(&evaluation_json(json!("85"))).is_err());
        assert!(parse_speech_evaluation(&evaluation_json(Value::Null)).is_err());
    }

    // ==================== Schema Declaration Tests ====================

    #[test]
    fn test_translation_schema_required_fields() {
        let schema = translation_schema();
        let required: Vec<_> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            required,
            vec!["translatedText", "grammarPoints", "nativeTips", "vocabulary"]
        );
    }

    #[test]
    fn test_quiz_schema_mentions_language() {
        let schema = quiz_schema("Hindi");
        let item = &schema["properties"]["questions"]["items"];
        assert_eq!(item["properties"]["options"]["description"], "Options in native Hindi script");
    }

    #[test]
    fn test_evaluation_schema_requires_score() {
        let schema = speech_evaluation_schema();
        assert!(schema["required"]
            .as_array()
            .unwrap()
            .contains(&json!("score")));
    }
}
