//! Translate mode: input -> request -> insight panel.

use crate::audio::AudioPlayer;
use crate::error::{ModeError, OracleResult, SpeechError, StorageError};
use crate::history::HistoryStore;
use crate::i18n::Language;
use crate::models::{HistoryItem, TranslationResult};
use crate::modes::{Outcome, PlaybackRequest, Sequence};
use crate::oracle::LanguageOracle;
use crate::speech::{capture_once, Capture, RecognitionOptions, SpeechRecognizer};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateState {
    /// Waiting for input; carries the message of the last failure, if any
    Idle { error: Option<String> },
    Loading,
    Ready(TranslationResult),
}

/// A translation request issued by [`TranslateMode::begin_translate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    seq: u64,
    pub text: String,
    pub source_lang: Language,
    pub target_lang: Language,
}

pub struct TranslateMode {
    input: String,
    source_lang: Language,
    target_lang: Language,
    state: TranslateState,
    history: HistoryStore,
    requests: Sequence,
    playback: Sequence,
    speaking: bool,
    listening: bool,
}

impl TranslateMode {
    pub fn new(history: HistoryStore, source_lang: Language, target_lang: Language) -> Self {
        Self {
            input: String::new(),
            source_lang,
            target_lang,
            state: TranslateState::Idle { error: None },
            history,
            requests: Sequence::default(),
            playback: Sequence::default(),
            speaking: false,
            listening: false,
        }
    }

    // ==================== Accessors ====================

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn source_lang(&self) -> Language {
        self.source_lang
    }

    pub fn target_lang(&self) -> Language {
        self.target_lang
    }

    pub fn set_languages(&mut self, source_lang: Language, target_lang: Language) {
        self.source_lang = source_lang;
        self.target_lang = target_lang;
    }

    pub fn state(&self) -> &TranslateState {
        &self.state
    }

    pub fn result(&self) -> Option<&TranslationResult> {
        match &self.state {
            TranslateState::Ready(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            TranslateState::Idle { error } => error.as_deref(),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == TranslateState::Loading
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    // ==================== Translation ====================

    /// Move to `Loading` for the current input.
    pub fn begin_translate(&mut self) -> Result<TranslateRequest, ModeError> {
        if self.is_loading() {
            return Err(ModeError::Busy);
        }
        let text = self.input.trim();
        if text.is_empty() {
            return Err(ModeError::EmptyInput);
        }

        let request = TranslateRequest {
            seq: self.requests.advance(),
            text: text.to_string(),
            source_lang: self.source_lang,
            target_lang: self.target_lang,
        };
        self.state = TranslateState::Loading;
        Ok(request)
    }

    /// Apply the oracle's reply to `request`.
    ///
    /// A success is recorded in history before the result is shown.
    pub fn complete_translate(
        &mut self,
        request: TranslateRequest,
        reply: OracleResult<TranslationResult>,
    ) -> Outcome {
        if !self.requests.is_current(request.seq) || !self.is_loading() {
            debug!("Discarding stale translation reply #{}", request.seq);
            return Outcome::Stale;
        }

        match reply {
            Ok(result) => {
                let item = HistoryItem::new(
                    request.text,
                    request.source_lang,
                    request.target_lang,
                    result.clone(),
                );
                if let Err(e) = self.history.append(item) {
                    warn!("Failed to persist history: {}", e);
                }
                self.state = TranslateState::Ready(result);
            }
            Err(e) => {
                warn!("Translation error: {}", e);
                self.state = TranslateState::Idle {
                    error: Some(format!(
                        "Something went wrong with the translation. Please try again. ({})",
                        e
                    )),
                };
            }
        }
        Outcome::Applied
    }

    /// Abandon an in-flight translation; its reply will be discarded.
    pub fn cancel(&mut self) {
        if self.is_loading() {
            self.requests.advance();
            self.state = TranslateState::Idle { error: None };
        }
    }

    /// Translate the current input with a single oracle call.
    pub async fn translate(&mut self, oracle: &dyn LanguageOracle) -> Result<Outcome, ModeError> {
        let request = self.begin_translate()?;
        info!(
            "Translating from {} to {}",
            request.source_lang.code(),
            request.target_lang.code()
        );
        let reply = oracle
            .translate(
                &request.text,
                request.source_lang.code(),
                request.target_lang.code(),
            )
            .await;
        Ok(self.complete_translate(request, reply))
    }

    // ==================== History ====================

    /// Restore a past translation without a remote call.
    ///
    /// Returns `false` if `id` is not in history.
    pub fn select_history(&mut self, id: &str) -> bool {
        let Some(item) = self.history.get(id).cloned() else {
            return false;
        };

        self.requests.advance();
        self.input = item.source_text;
        self.source_lang = item.source_lang;
        self.target_lang = item.target_lang;
        self.state = TranslateState::Ready(item.result);
        true
    }

    pub fn clear_history(&mut self) -> Result<(), StorageError> {
        self.history.clear()
    }

    // ==================== Playback ====================

    /// Mark the mode speaking and hand back the translated text to play.
    pub fn begin_speaking(&mut self) -> Result<PlaybackRequest, ModeError> {
        if self.speaking || self.listening {
            return Err(ModeError::AudioBusy);
        }
        let text = match self.result() {
            Some(result) if !result.translated_text.trim().is_empty() => {
                result.translated_text.clone()
            }
            _ => return Err(ModeError::NothingToSpeak),
        };

        self.speaking = true;
        Ok(PlaybackRequest {
            seq: self.playback.advance(),
            text,
            voice: self.target_lang.voice(),
        })
    }

    pub fn finish_speaking(&mut self, request: &PlaybackRequest) {
        if self.playback.is_current(request.seq) {
            self.speaking = false;
        }
    }

    /// Synthesize the translated text and play it.
    pub async fn speak(
        &mut self,
        oracle: &dyn LanguageOracle,
        player: &dyn AudioPlayer,
    ) -> Result<(), ModeError> {
        let request = self.begin_speaking()?;
        let played = async {
            let pcm = oracle.synthesize_speech(&request.text, request.voice).await?;
            player.play(&pcm).await?;
            Ok::<(), ModeError>(())
        }
        .await;
        self.finish_speaking(&request);

        if let Err(e) = &played {
            warn!("Speech error: {}", e);
        }
        played
    }

    // ==================== Dictation ====================

    /// Start listening for one utterance in the source language.
    ///
    /// The mode reports [`is_listening`](Self::is_listening) until the
    /// capture's result is handed to [`finish_dictation`](Self::finish_dictation).
    pub fn begin_dictation(
        &mut self,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> Result<Capture, ModeError> {
        if self.speaking || self.listening {
            return Err(ModeError::AudioBusy);
        }

        let options = RecognitionOptions::single_shot(self.source_lang.recognition_locale());
        let capture = capture_once(recognizer, options)?;
        self.listening = true;
        Ok(capture)
    }

    /// Stop listening and fill the input from the transcript.
    ///
    /// A cancelled capture leaves the input as it was.
    pub fn finish_dictation(
        &mut self,
        transcript: Result<String, SpeechError>,
    ) -> Result<(), ModeError> {
        self.listening = false;

        match transcript {
            Ok(text) => {
                self.input = text;
                Ok(())
            }
            Err(SpeechError::Cancelled) => Ok(()),
            Err(e) => {
                warn!("Dictation failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Fill the input from one spoken utterance in the source language.
    pub async fn dictate(
        &mut self,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> Result<(), ModeError> {
        let capture = self.begin_dictation(recognizer)?;
        let transcript = capture.wait().await;
        self.finish_dictation(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::history::HISTORY_LIMIT;
    use crate::mock::{MockOracle, MockPlayer, MockRecognizer, OracleCall};
    use crate::storage::{KeyValueStore, MemoryStore};

    fn create_mode() -> TranslateMode {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        TranslateMode::new(HistoryStore::load(store), Language::ENGLISH, Language::SPANISH)
    }

    // ==================== Translate Tests ====================

    #[tokio::test]
    async fn test_hello_hola_scenario() {
        let mut mode = create_mode();
        let oracle = MockOracle::new();
        oracle.push_translation(Ok(MockOracle::translation("hola")));
        mode.set_input("hello");

        let outcome = mode.translate(&oracle).await.unwrap();

        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(mode.result().unwrap().translated_text, "hola");
        assert_eq!(mode.history().len(), 1);
        assert_eq!(mode.history().items()[0].source_text, "hello");
        assert_eq!(
            oracle.calls(),
            vec![OracleCall::Translate {
                text: "hello".to_string(),
                source_lang: "en".to_string(),
                target_lang: "es".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut mode = create_mode();
        mode.set_input("   \n");

        assert_eq!(mode.begin_translate(), Err(ModeError::EmptyInput));
        assert_eq!(mode.state(), &TranslateState::Idle { error: None });
    }

    #[test]
    fn test_resubmit_while_loading_is_busy() {
        let mut mode = create_mode();
        mode.set_input("hello");

        mode.begin_translate().unwrap();
        assert!(mode.is_loading());
        assert_eq!(mode.begin_translate(), Err(ModeError::Busy));
    }

    #[test]
    fn test_failure_returns_to_idle_with_error() {
        let mut mode = create_mode();
        mode.set_input("hello");
        let request = mode.begin_translate().unwrap();

        let outcome = mode.complete_translate(
            request,
            Err(OracleError::MalformedResponse {
                operation: "translation",
                reason: "missing field `nativeTips`".to_string(),
            }),
        );

        assert_eq!(outcome, Outcome::Applied);
        assert!(mode.error().unwrap().contains("Please try again"));
        assert!(mode.history().is_empty());
        assert!(mode.begin_translate().is_ok(), "User can re-submit after failure");
    }

    #[test]
    fn test_cancelled_request_reply_is_stale() {
        let mut mode = create_mode();
        mode.set_input("hello");
        let request = mode.begin_translate().unwrap();

        mode.cancel();
        let outcome = mode.complete_translate(request, Ok(MockOracle::translation("hola")));

        assert_eq!(outcome, Outcome::Stale);
        assert_eq!(mode.state(), &TranslateState::Idle { error: None });
        assert!(mode.history().is_empty());
    }

    #[test]
    fn test_old_reply_after_new_request_is_stale() {
        let mut mode = create_mode();
        mode.set_input("one");
        let first = mode.begin_translate().unwrap();
        mode.cancel();
        mode.set_input("two");
        let second = mode.begin_translate().unwrap();

        assert_eq!(
            mode.complete_translate(first, Ok(MockOracle::translation("uno"))),
            Outcome::Stale
        );
        assert_eq!(
            mode.complete_translate(second, Ok(MockOracle::translation("dos"))),
            Outcome::Applied
        );
        assert_eq!(mode.result().unwrap().translated_text, "dos");
        assert_eq!(mode.history().len(), 1);
    }

    #[test]
    fn test_request_trims_input() {
        let mut mode = create_mode();
        mode.set_input("  good night  ");
        let request = mode.begin_translate().unwrap();
        assert_eq!(request.text, "good night");
    }

    #[tokio::test]
    async fn test_history_capped_across_many_translations() {
        let mut mode = create_mode();
        let oracle = MockOracle::new();

        for i in 0..15 {
            mode.set_input(format!("phrase {}", i));
            mode.translate(&oracle).await.unwrap();
        }

        assert_eq!(mode.history().len(), HISTORY_LIMIT);
        assert_eq!(mode.history().items()[0].source_text, "phrase 14");
    }

    // ==================== History Recall Tests ====================

    #[tokio::test]
    async fn test_select_history_restores_translation() {
        let mut mode = create_mode();
        let oracle = MockOracle::new();
        mode.set_input("thank you");
        mode.translate(&oracle).await.unwrap();
        let id = mode.history().items()[0].id.clone();

        mode.set_input("something else");
        mode.set_languages(Language::SPANISH, Language::ENGLISH);
        assert!(mode.select_history(&id));

        assert_eq!(mode.input(), "thank you");
        assert_eq!(mode.source_lang(), Language::ENGLISH);
        assert_eq!(mode.target_lang(), Language::SPANISH);
        assert_eq!(mode.result().unwrap().translated_text, "thank you (es)");
        assert_eq!(oracle.calls().len(), 1);
        assert!(!mode.select_history("missing"));
    }

    #[tokio::test]
    async fn test_clear_history() {
        let mut mode = create_mode();
        mode.set_input("hello");
        mode.translate(&MockOracle::new()).await.unwrap();

        mode.clear_history().unwrap();
        assert!(mode.history().is_empty());
    }

    // ==================== Playback Tests ====================

    #[tokio::test]
    async fn test_speak_uses_target_voice() {
        let mut mode = create_mode();
        let oracle = MockOracle::new();
        let player = MockPlayer::new();
        mode.set_input("hello");
        mode.translate(&oracle).await.unwrap();

        mode.speak(&oracle, &player).await.unwrap();

        assert!(!mode.is_speaking());
        assert_eq!(player.played().len(), 1);
        assert!(oracle.calls().contains(&OracleCall::SynthesizeSpeech {
            text: "hello (es)".to_string(),
            voice: "Puck".to_string(),
        }));
    }

    #[test]
    fn test_speak_requires_result() {
        let mut mode = create_mode();
        assert_eq!(mode.begin_speaking(), Err(ModeError::NothingToSpeak));
    }

    #[tokio::test]
    async fn test_speak_reentry_rejected() {
        let mut mode = create_mode();
        mode.set_input("hello");
        mode.translate(&MockOracle::new()).await.unwrap();

        let request = mode.begin_speaking().unwrap();
        assert_eq!(mode.begin_speaking(), Err(ModeError::AudioBusy));
        mode.finish_speaking(&request);
        assert!(mode.begin_speaking().is_ok());
    }

    #[tokio::test]
    async fn test_speak_no_audio_resets_flag() {
        let mut mode = create_mode();
        let oracle = MockOracle::new();
        mode.set_input("hello");
        mode.translate(&oracle).await.unwrap();
        oracle.push_audio(Err(OracleError::NoAudioData));

        let err = mode.speak(&oracle, &MockPlayer::new()).await.unwrap_err();
        assert_eq!(err, ModeError::Oracle(OracleError::NoAudioData));
        assert!(!mode.is_speaking());
    }

    // ==================== Dictation Tests ====================

    #[tokio::test]
    async fn test_dictate_fills_input_with_source_locale() {
        let mut mode = create_mode();
        let recognizer = Arc::new(MockRecognizer::transcript("where is the library"));

        mode.dictate(recognizer.clone()).await.unwrap();

        assert_eq!(mode.input(), "where is the library");
        assert_eq!(recognizer.last_options().unwrap().locale, "en-US");
        assert!(!mode.is_listening());
    }

    #[tokio::test]
    async fn test_dictate_unavailable() {
        let mut mode = create_mode();
        let err = mode
            .dictate(Arc::new(MockRecognizer::unavailable()))
            .await
            .unwrap_err();

        assert_eq!(err, ModeError::Speech(SpeechError::CapabilityUnavailable));
        assert!(!mode.is_listening());
    }

    #[tokio::test]
    async fn test_dictate_while_speaking_rejected() {
        let mut mode = create_mode();
        mode.set_input("hello");
        mode.translate(&MockOracle::new()).await.unwrap();
        let _playback = mode.begin_speaking().unwrap();

        let err = mode
            .dictate(Arc::new(MockRecognizer::transcript("hi")))
            .await
            .unwrap_err();
        assert_eq!(err, ModeError::AudioBusy);
    }

    #[tokio::test]
    async fn test_listening_blocks_playback_until_finished() {
        let mut mode = create_mode();
        mode.set_input("hello");
        mode.translate(&MockOracle::new()).await.unwrap();
        let recognizer = Arc::new(MockRecognizer::transcript("good evening"));

        let capture = mode.begin_dictation(recognizer.clone()).unwrap();
        assert!(mode.is_listening());
        assert_eq!(mode.begin_speaking().unwrap_err(), ModeError::AudioBusy);
        assert!(matches!(
            mode.begin_dictation(recognizer.clone()),
            Err(ModeError::AudioBusy)
        ));

        mode.finish_dictation(capture.wait().await).unwrap();
        assert!(!mode.is_listening());
        assert_eq!(mode.input(), "good evening");
        assert_eq!(recognizer.start_count(), 1);
        assert!(mode.begin_speaking().is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_dictation_keeps_input() {
        let mut mode = create_mode();
        mode.set_input("typed text");

        let capture = mode
            .begin_dictation(Arc::new(MockRecognizer::silent()))
            .unwrap();
        capture.abort_handle().abort();

        mode.finish_dictation(capture.wait().await).unwrap();
        assert!(!mode.is_listening());
        assert_eq!(mode.input(), "typed text");
    }
}
