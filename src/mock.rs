//! Deterministic collaborators for testing the modes without network,
//! microphone or speakers.
//!
//! # Example
//!
//! ```ignore
//! use linguist_ai::mock::MockOracle;
//!
//! let oracle = MockOracle::new();
//! oracle.push_translation(Ok(MockOracle::translation("hola")));
//! let result = oracle.translate("hello", "en", "es").await?;
//! assert_eq!(result.translated_text, "hola");
//! ```

use crate::audio::AudioPlayer;
use crate::error::{OracleError, OracleResult, SpeechError};
use crate::models::{
    Difficulty, QuizQuestion, QuizSet, SpeechChallenge, SpeechEvaluation, TranslationResult,
    QUIZ_QUESTION_COUNT,
};
use crate::oracle::LanguageOracle;
use crate::speech::{EventSink, RecognitionEvent, RecognitionOptions, SpeechRecognizer};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// A call received by [`MockOracle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleCall {
    Translate {
        text: String,
        source_lang: String,
        target_lang: String,
    },
    GenerateQuiz {
        language: String,
        topic: String,
        difficulty: Difficulty,
    },
    GenerateSpeechChallenge {
        language: String,
        difficulty: Difficulty,
    },
    EvaluateSpeech {
        expected: String,
        transcript: String,
        language: String,
    },
    SynthesizeSpeech {
        text: String,
        voice: String,
    },
}

/// Oracle that replays queued replies and otherwise answers with canned
/// values derived from the request.
#[derive(Debug, Default)]
pub struct MockOracle {
    translations: Mutex<VecDeque<OracleResult<TranslationResult>>>,
    quizzes: Mutex<VecDeque<OracleResult<QuizSet>>>,
    challenges: Mutex<VecDeque<OracleResult<SpeechChallenge>>>,
    evaluations: Mutex<VecDeque<OracleResult<SpeechEvaluation>>>,
    audio: Mutex<VecDeque<OracleResult<Vec<u8>>>>,
    calls: Mutex<Vec<OracleCall>>,
    delay: Duration,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate network latency on every call.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn push_translation(&self, reply: OracleResult<TranslationResult>) {
        lock(&self.translations).push_back(reply);
    }

    pub fn push_quiz(&self, reply: OracleResult<QuizSet>) {
        lock(&self.quizzes).push_back(reply);
    }

    pub fn push_challenge(&self, reply: OracleResult<SpeechChallenge>) {
        lock(&self.challenges).push_back(reply);
    }

    pub fn push_evaluation(&self, reply: OracleResult<SpeechEvaluation>) {
        lock(&self.evaluations).push_back(reply);
    }

    pub fn push_audio(&self, reply: OracleResult<Vec<u8>>) {
        lock(&self.audio).push_back(reply);
    }

    pub fn calls(&self) -> Vec<OracleCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: OracleCall) {
        lock(&self.calls).push(call);
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Minimal translation result.
    pub fn translation(translated_text: &str) -> TranslationResult {
        TranslationResult {
            translated_text: translated_text.to_string(),
            transliteration: None,
            grammar_points: vec![],
            native_tips: "...".to_string(),
            vocabulary: vec![],
            cultural_note: None,
        }
    }

    /// Five four-option questions; question `i` has correct answer `i % 4`.
    pub fn quiz(language: &str, topic: &str, difficulty: Difficulty) -> QuizSet {
        let questions = (0..QUIZ_QUESTION_COUNT)
            .map(|i| QuizQuestion {
                question: format!("Question {}?", i + 1),
                question_transliteration: format!("Question {}?", i + 1),
                options: (0..4).map(|o| format!("option-{}-{}", i, o)).collect(),
                options_transliteration: (0..4).map(|o| format!("roman-{}-{}", i, o)).collect(),
                correct_answer_index: i % 4,
                explanation: format!("Explanation {}", i + 1),
            })
            .collect();

        QuizSet {
            topic: topic.to_string(),
            language: language.to_string(),
            difficulty,
            questions,
        }
    }

    pub fn challenge(phrase: &str, language: &str) -> SpeechChallenge {
        SpeechChallenge {
            phrase_to_speak: phrase.to_string(),
            translation: format!("Translation of {}", phrase),
            target_language: language.to_string(),
        }
    }

    pub fn evaluation(score: u8) -> SpeechEvaluation {
        SpeechEvaluation {
            score,
            accuracy_feedback: "Mostly accurate.".to_string(),
            pronunciation_tips: "Slow down a little.".to_string(),
            naturalness: "Sounds natural.".to_string(),
        }
    }
}

#[async_trait]
impl LanguageOracle for MockOracle {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> OracleResult<TranslationResult> {
        self.record(OracleCall::Translate {
            text: text.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        });
        self.pause().await;

        if text.trim().is_empty() {
            return Err(OracleError::EmptyInput);
        }
        let queued = lock(&self.translations).pop_front();
        queued.unwrap_or_else(|| Ok(Self::translation(&format!("{} ({})", text, target_lang))))
    }

    async fn generate_quiz(
        &self,
        language: &str,
        topic: &str,
        difficulty: Difficulty,
    ) -> OracleResult<QuizSet> {
        self.record(OracleCall::GenerateQuiz {
            language: language.to_string(),
            topic: topic.to_string(),
            difficulty,
        });
        self.pause().await;

        let queued = lock(&self.quizzes).pop_front();
        queued.unwrap_or_else(|| Ok(Self::quiz(language, topic, difficulty)))
    }

    async fn generate_speech_challenge(
        &self,
        language: &str,
        difficulty: Difficulty,
    ) -> OracleResult<SpeechChallenge> {
        self.record(OracleCall::GenerateSpeechChallenge {
            language: language.to_string(),
            difficulty,
        });
        self.pause().await;

        let queued = lock(&self.challenges).pop_front();
        queued.unwrap_or_else(|| Ok(Self::challenge("Buenos días", language)))
    }

    async fn evaluate_speech(
        &self,
        expected: &str,
        transcript: &str,
        language: &str,
    ) -> OracleResult<SpeechEvaluation> {
        self.record(OracleCall::EvaluateSpeech {
            expected: expected.to_string(),
            transcript: transcript.to_string(),
            language: language.to_string(),
        });
        self.pause().await;

        let queued = lock(&self.evaluations).pop_front();
        queued.unwrap_or_else(|| {
            let score = if expected.eq_ignore_ascii_case(transcript) { 100 } else { 60 };
            Ok(Self::evaluation(score))
        })
    }

    async fn synthesize_speech(&self, text: &str, voice: &str) -> OracleResult<Vec<u8>> {
        self.record(OracleCall::SynthesizeSpeech {
            text: text.to_string(),
            voice: voice.to_string(),
        });
        self.pause().await;

        let queued = lock(&self.audio).pop_front();
        queued.unwrap_or_else(|| Ok(vec![0u8; 480]))
    }
}

/// Recognizer that replays a fixed event script.
#[derive(Debug)]
pub struct MockRecognizer {
    available: bool,
    script: Vec<RecognitionEvent>,
    /// Keep the sink open and never send, so captures only end on abort
    silent: bool,
    held_sink: Mutex<Option<EventSink>>,
    last_options: Mutex<Option<RecognitionOptions>>,
    starts: AtomicUsize,
    aborts: AtomicUsize,
}

impl MockRecognizer {
    pub fn scripted(script: Vec<RecognitionEvent>) -> Self {
        Self {
            available: true,
            script,
            silent: false,
            held_sink: Mutex::new(None),
            last_options: Mutex::new(None),
            starts: AtomicUsize::new(0),
            aborts: AtomicUsize::new(0),
        }
    }

    pub fn transcript(text: &str) -> Self {
        Self::scripted(vec![
            RecognitionEvent::Start,
            RecognitionEvent::Result(text.to_string()),
            RecognitionEvent::End,
        ])
    }

    pub fn failing(reason: &str) -> Self {
        Self::scripted(vec![
            RecognitionEvent::Start,
            RecognitionEvent::Error(reason.to_string()),
            RecognitionEvent::End,
        ])
    }

    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::scripted(vec![RecognitionEvent::Start])
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::scripted(vec![])
        }
    }

    pub fn last_options(&self) -> Option<RecognitionOptions> {
        lock(&self.last_options).clone()
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn abort_count(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&self, options: &RecognitionOptions, events: EventSink) -> Result<(), SpeechError> {
        if !self.available {
            return Err(SpeechError::CapabilityUnavailable);
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_options) = Some(options.clone());

        for event in &self.script {
            // The receiver may already be gone; nothing to deliver to then
            let _ = events.send(event.clone());
        }
        if self.silent {
            *lock(&self.held_sink) = Some(events);
        }
        Ok(())
    }

    fn abort(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        lock(&self.held_sink).take();
    }
}

/// Player that records what it was asked to play.
#[derive(Debug, Default)]
pub struct MockPlayer {
    played: Mutex<Vec<Vec<u8>>>,
    fail_with: Option<String>,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            played: Mutex::new(Vec::new()),
            fail_with: Some(reason.to_string()),
        }
    }

    pub fn played(&self) -> Vec<Vec<u8>> {
        lock(&self.played).clone()
    }
}

#[async_trait]
impl AudioPlayer for MockPlayer {
    async fn play(&self, pcm: &[u8]) -> Result<(), SpeechError> {
        if let Some(reason) = &self.fail_with {
            return Err(SpeechError::Playback(reason.clone()));
        }
        lock(&self.played).push(pcm.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_reply_then_canned() {
        let oracle = MockOracle::new();
        oracle.push_translation(Err(OracleError::NoAudioData));

        assert!(oracle.translate("hi", "en", "fr").await.is_err());
        let canned = oracle.translate("hi", "en", "fr").await.unwrap();
        assert_eq!(canned.translated_text, "hi (fr)");
        assert_eq!(oracle.calls().len(), 2);
    }

    #[test]
    fn test_canned_quiz_shape() {
        let quiz = MockOracle::quiz("Spanish", "Travel & Directions", Difficulty::Beginner);
        assert_eq!(quiz.questions.len(), QUIZ_QUESTION_COUNT);
        for q in &quiz.questions {
            assert_eq!(q.options.len(), q.options_transliteration.len());
            assert!(q.correct_answer_index < q.options.len());
        }
    }

    #[tokio::test]
    async fn test_mock_player_records() {
        let player = MockPlayer::new();
        player.play(&[1, 2]).await.unwrap();
        assert_eq!(player.played(), vec![vec![1, 2]]);

        let broken = MockPlayer::failing("no device");
        assert!(broken.play(&[1]).await.is_err());
    }
}
