//! Speech mode: get a phrase, hear it, say it, get scored.
//!
//! ```text
//! NoChallenge -> Loading -> ChallengeReady -> Listening -> Evaluating -> Evaluated
//!                   ^            |  ^             |            |
//!                   |            |  +-------------+------------+  (failure)
//!                   +------------+  (new challenge, from any state)
//! ```

use crate::audio::AudioPlayer;
use crate::error::{ModeError, OracleResult, SpeechError};
use crate::i18n::Language;
use crate::models::{Difficulty, SpeechChallenge, SpeechEvaluation};
use crate::modes::{Outcome, PlaybackRequest, Sequence};
use crate::oracle::LanguageOracle;
use crate::speech::{capture_once, Capture, RecognitionOptions, SpeechRecognizer};
use futures::future::AbortHandle;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechState {
    NoChallenge {
        error: Option<String>,
    },
    Loading,
    /// `transcript` is set once a capture succeeded but evaluating it failed
    ChallengeReady {
        challenge: SpeechChallenge,
        transcript: Option<String>,
        error: Option<String>,
    },
    Listening {
        challenge: SpeechChallenge,
    },
    Evaluating {
        challenge: SpeechChallenge,
        transcript: String,
    },
    Evaluated {
        challenge: SpeechChallenge,
        transcript: String,
        evaluation: SpeechEvaluation,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    seq: u64,
    pub language: Language,
    pub difficulty: Difficulty,
}

/// Identifies the capture started by [`SpeechMode::start_listening`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTicket {
    seq: u64,
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    seq: u64,
    pub expected: String,
    pub transcript: String,
    pub language: Language,
}

pub struct SpeechMode {
    language: Language,
    difficulty: Difficulty,
    /// Language the current challenge was generated for
    active_language: Language,
    state: SpeechState,
    requests: Sequence,
    playback: Sequence,
    speaking: bool,
    capture_abort: Option<AbortHandle>,
}

impl SpeechMode {
    pub fn new(language: Language, difficulty: Difficulty) -> Self {
        Self {
            language,
            difficulty,
            active_language: language,
            state: SpeechState::NoChallenge { error: None },
            requests: Sequence::default(),
            playback: Sequence::default(),
            speaking: false,
            capture_abort: None,
        }
    }

    pub fn state(&self) -> &SpeechState {
        &self.state
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Applies to the next challenge.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.state, SpeechState::Listening { .. })
    }

    pub fn challenge(&self) -> Option<&SpeechChallenge> {
        match &self.state {
            SpeechState::NoChallenge { .. } | SpeechState::Loading => None,
            SpeechState::ChallengeReady { challenge, .. }
            | SpeechState::Listening { challenge }
            | SpeechState::Evaluating { challenge, .. }
            | SpeechState::Evaluated { challenge, .. } => Some(challenge),
        }
    }

    pub fn transcript(&self) -> Option<&str> {
        match &self.state {
            SpeechState::ChallengeReady { transcript, .. } => transcript.as_deref(),
            SpeechState::Evaluating { transcript, .. }
            | SpeechState::Evaluated { transcript, .. } => Some(transcript),
            _ => None,
        }
    }

    pub fn evaluation(&self) -> Option<&SpeechEvaluation> {
        match &self.state {
            SpeechState::Evaluated { evaluation, .. } => Some(evaluation),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SpeechState::NoChallenge { error } | SpeechState::ChallengeReady { error, .. } => {
                error.as_deref()
            }
            _ => None,
        }
    }

    // ==================== Challenge ====================

    /// Request a new challenge, discarding whatever the mode was doing.
    pub fn begin_challenge(&mut self) -> ChallengeRequest {
        self.abort_capture();

        let request = ChallengeRequest {
            seq: self.requests.advance(),
            language: self.language,
            difficulty: self.difficulty,
        };
        self.state = SpeechState::Loading;
        request
    }

    pub fn complete_challenge(
        &mut self,
        request: ChallengeRequest,
        reply: OracleResult<SpeechChallenge>,
    ) -> Outcome {
        if !self.requests.is_current(request.seq) || self.state != SpeechState::Loading {
            debug!("Discarding stale challenge reply #{}", request.seq);
            return Outcome::Stale;
        }

        match reply {
            Ok(challenge) => {
                info!("New challenge: '{}'", challenge.phrase_to_speak);
                self.active_language = request.language;
                self.state = SpeechState::ChallengeReady {
                    challenge,
                    transcript: None,
                    error: None,
                };
            }
            Err(e) => {
                warn!("Challenge generation failed: {}", e);
                self.state = SpeechState::NoChallenge {
                    error: Some(format!("Could not create a challenge. Please try again. ({})", e)),
                };
            }
        }
        Outcome::Applied
    }

    pub async fn new_challenge(&mut self, oracle: &dyn LanguageOracle) -> Outcome {
        let request = self.begin_challenge();
        let reply = oracle
            .generate_speech_challenge(request.language.name(), request.difficulty)
            .await;
        self.complete_challenge(request, reply)
    }

    // ==================== Capture ====================

    /// Start the single capture allowed for the current challenge.
    ///
    /// On any error the state is left unchanged.
    pub fn start_listening(
        &mut self,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> Result<(CaptureTicket, Capture), ModeError> {
        let challenge = match &self.state {
            SpeechState::ChallengeReady {
                challenge,
                transcript: None,
                ..
            } => challenge.clone(),
            SpeechState::NoChallenge { .. } | SpeechState::Loading => {
                return Err(ModeError::NoChallenge)
            }
            SpeechState::Listening { .. } | SpeechState::Evaluating { .. } => {
                return Err(ModeError::Busy)
            }
            SpeechState::ChallengeReady { .. } | SpeechState::Evaluated { .. } => {
                return Err(ModeError::AlreadyCaptured)
            }
        };
        if self.speaking {
            return Err(ModeError::AudioBusy);
        }

        let locale = self.active_language.recognition_locale().to_string();
        let capture = capture_once(recognizer, RecognitionOptions::single_shot(locale.clone()))?;

        self.capture_abort = Some(capture.abort_handle());
        self.state = SpeechState::Listening { challenge };
        Ok((
            CaptureTicket {
                seq: self.requests.current(),
                locale,
            },
            capture,
        ))
    }

    /// Cancel the running capture; the challenge stays ready to record.
    pub fn stop_listening(&mut self) {
        self.abort_capture();
    }

    /// Apply the end of a capture.
    ///
    /// A transcript moves the mode to `Evaluating` and yields the request
    /// to send. Stale captures and failures yield `None`.
    pub fn finish_listening(
        &mut self,
        ticket: CaptureTicket,
        result: Result<String, SpeechError>,
    ) -> Option<EvaluationRequest> {
        if !self.requests.is_current(ticket.seq) || !self.is_listening() {
            debug!("Discarding stale capture #{}", ticket.seq);
            return None;
        }
        self.capture_abort = None;

        let SpeechState::Listening { challenge } =
            std::mem::replace(&mut self.state, SpeechState::Loading)
        else {
            return None;
        };

        match result {
            Ok(transcript) => {
                info!("Heard: '{}'", transcript);
                let request = EvaluationRequest {
                    seq: self.requests.advance(),
                    expected: challenge.phrase_to_speak.clone(),
                    transcript: transcript.clone(),
                    language: self.active_language,
                };
                self.state = SpeechState::Evaluating {
                    challenge,
                    transcript,
                };
                Some(request)
            }
            Err(e) => {
                let error = match e {
                    SpeechError::Cancelled => None,
                    other => {
                        warn!("Capture failed: {}", other);
                        Some(other.to_string())
                    }
                };
                self.state = SpeechState::ChallengeReady {
                    challenge,
                    transcript: None,
                    error,
                };
                None
            }
        }
    }

    fn abort_capture(&mut self) {
        if let Some(handle) = self.capture_abort.take() {
            handle.abort();
        }
    }

    // ==================== Evaluation ====================

    /// Re-send a transcript whose evaluation failed.
    pub fn begin_evaluation(&mut self) -> Result<EvaluationRequest, ModeError> {
        let (challenge, transcript) = match &self.state {
            SpeechState::ChallengeReady {
                challenge,
                transcript: Some(transcript),
                ..
            } => (challenge.clone(), transcript.clone()),
            SpeechState::NoChallenge { .. } | SpeechState::Loading => {
                return Err(ModeError::NoChallenge)
            }
            SpeechState::Listening { .. } | SpeechState::Evaluating { .. } => {
                return Err(ModeError::Busy)
            }
            SpeechState::ChallengeReady { .. } | SpeechState::Evaluated { .. } => {
                return Err(ModeError::NoTranscript)
            }
        };

        let request = EvaluationRequest {
            seq: self.requests.advance(),
            expected: challenge.phrase_to_speak.clone(),
            transcript: transcript.clone(),
            language: self.active_language,
        };
        self.state = SpeechState::Evaluating {
            challenge,
            transcript,
        };
        Ok(request)
    }

    pub fn complete_evaluation(
        &mut self,
        request: EvaluationRequest,
        reply: OracleResult<SpeechEvaluation>,
    ) -> Outcome {
        if !self.requests.is_current(request.seq)
            || !matches!(self.state, SpeechState::Evaluating { .. })
        {
            debug!("Discarding stale evaluation reply #{}", request.seq);
            return Outcome::Stale;
        }
        let SpeechState::Evaluating {
            challenge,
            transcript,
        } = std::mem::replace(&mut self.state, SpeechState::Loading)
        else {
            return Outcome::Stale;
        };

        self.state = match reply {
            Ok(evaluation) => {
                info!("Pronunciation score: {}", evaluation.score);
                SpeechState::Evaluated {
                    challenge,
                    transcript,
                    evaluation,
                }
            }
            Err(e) => {
                warn!("Evaluation failed: {}", e);
                SpeechState::ChallengeReady {
                    challenge,
                    transcript: Some(transcript),
                    error: Some(format!("Could not evaluate your speech. ({})", e)),
                }
            }
        };
        Outcome::Applied
    }

    async fn send_evaluation(
        &mut self,
        oracle: &dyn LanguageOracle,
        request: EvaluationRequest,
    ) -> Outcome {
        let reply = oracle
            .evaluate_speech(&request.expected, &request.transcript, request.language.name())
            .await;
        self.complete_evaluation(request, reply)
    }

    /// Capture one utterance and have it scored.
    pub async fn record(
        &mut self,
        recognizer: Arc<dyn SpeechRecognizer>,
        oracle: &dyn LanguageOracle,
    ) -> Result<Outcome, ModeError> {
        let (ticket, capture) = self.start_listening(recognizer)?;
        let heard = capture.wait().await;

        if !self.requests.is_current(ticket.seq) {
            return Ok(Outcome::Stale);
        }
        let failure = heard.as_ref().err().cloned();
        match self.finish_listening(ticket, heard) {
            Some(request) => Ok(self.send_evaluation(oracle, request).await),
            None => match failure {
                Some(SpeechError::Cancelled) | None => Ok(Outcome::Applied),
                Some(e) => Err(e.into()),
            },
        }
    }

    /// Retry a failed evaluation with the transcript already captured.
    pub async fn evaluate(&mut self, oracle: &dyn LanguageOracle) -> Result<Outcome, ModeError> {
        let request = self.begin_evaluation()?;
        Ok(self.send_evaluation(oracle, request).await)
    }

    // ==================== Playback ====================

    /// Hear the phrase in the challenge language's voice.
    pub fn begin_playback(&mut self) -> Result<PlaybackRequest, ModeError> {
        let text = match self.challenge() {
            Some(challenge) => challenge.phrase_to_speak.clone(),
            None => return Err(ModeError::NoChallenge),
        };
        if self.speaking || self.is_listening() {
            return Err(ModeError::AudioBusy);
        }

        self.speaking = true;
        Ok(PlaybackRequest {
            seq: self.playback.advance(),
            text,
            voice: self.active_language.voice(),
        })
    }

    pub fn finish_playback(&mut self, request: &PlaybackRequest) {
        if self.playback.is_current(request.seq) {
            self.speaking = false;
        }
    }

    pub async fn play_native(
        &mut self,
        oracle: &dyn LanguageOracle,
        player: &dyn AudioPlayer,
    ) -> Result<(), ModeError> {
        let request = self.begin_playback()?;
        let played = async {
            let pcm = oracle.synthesize_speech(&request.text, request.voice).await?;
            player.play(&pcm).await?;
            Ok::<(), ModeError>(())
        }
        .await;
        self.finish_playback(&request);

        if let Err(e) = &played {
            warn!("Playback failed: {}", e);
        }
        played
    }
}
