//! The remote language oracle capability.
//!
//! Every operation is one request/response round trip: no retry, no cache,
//! no partial result. A reply either parses into the typed value or the call
//! fails with an [`OracleError`].

use crate::error::OracleResult;
use crate::models::{Difficulty, QuizSet, SpeechChallenge, SpeechEvaluation, TranslationResult};
use async_trait::async_trait;

#[async_trait]
pub trait LanguageOracle: Send + Sync {
    /// Translate `text` and explain it for a learner.
    ///
    /// Language arguments are ISO 639-1 codes. Fails with
    /// [`OracleError::EmptyInput`](crate::error::OracleError::EmptyInput)
    /// for blank text.
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> OracleResult<TranslationResult>;

    /// Generate a five-question multiple choice quiz.
    async fn generate_quiz(
        &self,
        language: &str,
        topic: &str,
        difficulty: Difficulty,
    ) -> OracleResult<QuizSet>;

    async fn generate_speech_challenge(
        &self,
        language: &str,
        difficulty: Difficulty,
    ) -> OracleResult<SpeechChallenge>;

    /// Score how closely `transcript` matches `expected`.
    async fn evaluate_speech(
        &self,
        expected: &str,
        transcript: &str,
        language: &str,
    ) -> OracleResult<SpeechEvaluation>;

    /// Synthesize `text` with a prebuilt voice.
    ///
    /// Returns raw 16-bit little-endian mono PCM.
    async fn synthesize_speech(&self, text: &str, voice: &str) -> OracleResult<Vec<u8>>;
}
