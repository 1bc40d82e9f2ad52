//! Error taxonomy shared by the oracle client, the speech collaborators,
//! persistence and the mode state machines.

use thiserror::Error;

/// Transport-level failure talking to the remote model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteCallError {
    /// Connection, DNS, TLS or body-read failure
    #[error("request failed: {0}")]
    Transport(String),

    /// The bounded wait for a reply elapsed
    #[error("request timed out")]
    Timeout,

    /// The API answered with a non-2xx status
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },
}

impl From<reqwest::Error> for RemoteCallError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteCallError::Timeout
        } else {
            RemoteCallError::Transport(e.to_string())
        }
    }
}

/// Failure of a single oracle operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error(transparent)]
    RemoteCall(#[from] RemoteCallError),

    /// The reply did not satisfy the declared schema
    #[error("malformed {operation} response: {reason}")]
    MalformedResponse {
        operation: &'static str,
        reason: String,
    },

    /// Speech synthesis succeeded but carried no audio payload
    #[error("no audio data received from TTS model")]
    NoAudioData,

    /// Text precondition violated before any request was made
    #[error("input text is empty")]
    EmptyInput,
}

impl OracleError {
    pub(crate) fn malformed(operation: &'static str, reason: impl Into<String>) -> Self {
        OracleError::MalformedResponse {
            operation,
            reason: reason.into(),
        }
    }
}

/// Speech capture and playback failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// The host has no speech-recognition capability
    #[error("speech recognition is not supported in this environment")]
    CapabilityUnavailable,

    #[error("speech recognition failed: {0}")]
    Recognition(String),

    /// Capture ended without producing a transcript
    #[error("no speech was detected")]
    NoSpeech,

    #[error("speech capture was cancelled")]
    Cancelled,

    #[error("audio playback failed: {0}")]
    Playback(String),
}

/// Persistence failures of the key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted value exists but cannot be decoded
    #[error("persisted state under '{key}' is corrupt: {reason}")]
    CorruptPersistedState { key: String, reason: String },

    #[error("failed to serialize state: {0}")]
    Serialize(String),
}

/// Rejected state-machine transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    /// A request is already in flight for this mode
    #[error("a request is already in progress")]
    Busy,

    #[error("nothing to translate")]
    EmptyInput,

    #[error("no quiz is in progress")]
    NoActiveQuiz,

    #[error("select an answer before moving on")]
    AnswerNotRevealed,

    #[error("option {index} is out of range ({count} options)")]
    InvalidOption { index: usize, count: usize },

    #[error("no speech challenge is active")]
    NoChallenge,

    /// The single transcript for this challenge was already captured
    #[error("this challenge already has a recording")]
    AlreadyCaptured,

    /// Playback and capture are mutually exclusive
    #[error("audio is busy")]
    AudioBusy,

    #[error("there is nothing to speak")]
    NothingToSpeak,

    /// Evaluation requested before any transcript was captured
    #[error("record the phrase before asking for an evaluation")]
    NoTranscript,

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Speech(#[from] SpeechError),
}

pub type OracleResult<T> = Result<T, OracleError>;
