//! Speech-to-text boundary.
//!
//! Host recognizers are event driven (start, result, error, end). A
//! [`SpeechRecognizer`] pushes those events into a channel and
//! [`capture_once`] folds them into one awaitable, abortable capture that
//! yields either a transcript or an error.

use crate::error::SpeechError;
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Recognizer settings for a single capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    /// BCP 47 locale, e.g. "en-US" or "ja"
    pub locale: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl RecognitionOptions {
    /// One utterance, final results only.
    pub fn single_shot(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            continuous: false,
            interim_results: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Start,
    Result(String),
    Error(String),
    End,
}

pub type EventSink = mpsc::UnboundedSender<RecognitionEvent>;

pub trait SpeechRecognizer: Send + Sync {
    /// Whether the host can recognize speech at all.
    fn is_available(&self) -> bool;

    /// Begin listening; events are delivered to `events` until `End`.
    fn start(&self, options: &RecognitionOptions, events: EventSink) -> Result<(), SpeechError>;

    /// Stop listening without delivering a result.
    fn abort(&self);
}

/// Recognizer for hosts with no speech capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRecognizer;

impl SpeechRecognizer for UnavailableRecognizer {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&self, _options: &RecognitionOptions, _events: EventSink) -> Result<(), SpeechError> {
        Err(SpeechError::CapabilityUnavailable)
    }

    fn abort(&self) {}
}

/// An in-flight single-shot capture.
pub struct Capture {
    recognizer: Arc<dyn SpeechRecognizer>,
    events: mpsc::UnboundedReceiver<RecognitionEvent>,
    abort_handle: AbortHandle,
    registration: AbortRegistration,
}

/// Start a single-shot capture.
///
/// Fails immediately with [`SpeechError::CapabilityUnavailable`] when the
/// recognizer is unavailable.
pub fn capture_once(
    recognizer: Arc<dyn SpeechRecognizer>,
    options: RecognitionOptions,
) -> Result<Capture, SpeechError> {
    if !recognizer.is_available() {
        return Err(SpeechError::CapabilityUnavailable);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    recognizer.start(&options, tx)?;
    debug!("Speech capture started ({})", options.locale);

    let (abort_handle, registration) = AbortHandle::new_pair();
    Ok(Capture {
        recognizer,
        events: rx,
        abort_handle,
        registration,
    })
}

impl Capture {
    /// Handle that cancels this capture from elsewhere.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Wait for the transcript.
    ///
    /// Resolves to [`SpeechError::Cancelled`] if aborted, in which case the
    /// recognizer is told to stop.
    pub async fn wait(self) -> Result<String, SpeechError> {
        let Capture {
            recognizer,
            events,
            registration,
            ..
        } = self;

        match Abortable::new(collect_transcript(events), registration).await {
            Ok(result) => result,
            Err(_aborted) => {
                debug!("Speech capture aborted");
                recognizer.abort();
                Err(SpeechError::Cancelled)
            }
        }
    }
}

async fn collect_transcript(
    mut events: mpsc::UnboundedReceiver<RecognitionEvent>,
) -> Result<String, SpeechError> {
    let mut transcript: Option<String> = None;

    while let Some(event) = events.recv().await {
        match event {
            RecognitionEvent::Start => debug!("Recognizer is listening"),
            RecognitionEvent::Result(text) => {
                // Single shot: the first final result wins
                if transcript.is_none() {
                    transcript = Some(text);
                }
            }
            RecognitionEvent::Error(reason) => return Err(SpeechError::Recognition(reason)),
            RecognitionEvent::End => break,
        }
    }

    transcript
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(SpeechError::NoSpeech)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRecognizer;
    use std::time::Duration;

    fn options() -> RecognitionOptions {
        RecognitionOptions::single_shot("es")
    }

    #[test]
    fn test_single_shot_options() {
        let opts = RecognitionOptions::single_shot("en-US");
        assert_eq!(opts.locale, "en-US");
        assert!(!opts.continuous);
        assert!(!opts.interim_results);
    }

    #[test]
    fn test_unavailable_recognizer_fails_immediately() {
        let result = capture_once(Arc::new(UnavailableRecognizer), options());
        assert!(matches!(result, Err(SpeechError::CapabilityUnavailable)));
    }

    #[tokio::test]
    async fn test_capture_returns_transcript() {
        let recognizer = Arc::new(MockRecognizer::transcript("  hola mundo "));
        let capture = capture_once(recognizer.clone(), options()).unwrap();

        assert_eq!(capture.wait().await, Ok("hola mundo".to_string()));
        assert_eq!(recognizer.last_options(), Some(options()));
    }

    #[tokio::test]
    async fn test_capture_first_result_wins() {
        let recognizer = Arc::new(MockRecognizer::scripted(vec![
            RecognitionEvent::Start,
            RecognitionEvent::Result("uno".to_string()),
            RecognitionEvent::Result("dos".to_string()),
            RecognitionEvent::End,
        ]));
        let capture = capture_once(recognizer, options()).unwrap();
        assert_eq!(capture.wait().await, Ok("uno".to_string()));
    }

    #[tokio::test]
    async fn test_capture_error_event() {
        let recognizer = Arc::new(MockRecognizer::failing("not-allowed"));
        let capture = capture_once(recognizer, options()).unwrap();
        assert_eq!(
            capture.wait().await,
            Err(SpeechError::Recognition("not-allowed".to_string()))
        );
    }

    #[tokio::test]
    async fn test_capture_end_without_result_is_no_speech() {
        let recognizer = Arc::new(MockRecognizer::scripted(vec![
            RecognitionEvent::Start,
            RecognitionEvent::End,
        ]));
        let capture = capture_once(recognizer, options()).unwrap();
        assert_eq!(capture.wait().await, Err(SpeechError::NoSpeech));
    }

    #[tokio::test]
    async fn test_capture_can_be_aborted() {
        let recognizer = Arc::new(MockRecognizer::silent());
        let capture = capture_once(recognizer.clone(), options()).unwrap();
        let handle = capture.abort_handle();

        let waiter = tokio::spawn(capture.wait());
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.abort();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("Abort should resolve the capture")
            .unwrap();
        assert_eq!(result, Err(SpeechError::Cancelled));
        assert_eq!(recognizer.abort_count(), 1);
    }
}
