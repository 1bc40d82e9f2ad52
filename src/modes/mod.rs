//! Client-side state machines for the three learning modes.
//!
//! Each mode owns its state outright. Remote work is split into a
//! `begin_*` transition that hands back a ticket and a `complete_*`
//! transition that applies the reply. Tickets carry the mode's request
//! sequence at the time they were issued; a reply whose ticket is no longer
//! current is dropped, so late replies for abandoned requests never
//! overwrite newer state. The `async` helpers on each mode run both halves
//! around a single oracle call.

pub mod quiz;
pub mod speech;
pub mod translate;

pub use quiz::{AnswerFeedback, QuizMode, QuizRequest, QuizSession, QuizState, QuizSummary};
pub use speech::{
    CaptureTicket, ChallengeRequest, EvaluationRequest, SpeechMode, SpeechState,
};
pub use translate::{TranslateMode, TranslateRequest, TranslateState};

/// Whether a completion was applied or discarded as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Stale,
}

/// Text to synthesize and play, issued while the mode is marked speaking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    seq: u64,
    pub text: String,
    pub voice: &'static str,
}

/// Monotonic request counter.
#[derive(Debug, Default)]
pub(crate) struct Sequence(u64);

impl Sequence {
    /// Advance, invalidating every ticket issued so far.
    pub(crate) fn advance(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub(crate) fn current(&self) -> u64 {
        self.0
    }

    pub(crate) fn is_current(&self, seq: u64) -> bool {
        self.0 == seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_advance_invalidates_previous() {
        let mut seq = Sequence::default();
        let first = seq.advance();
        assert!(seq.is_current(first));

        let second = seq.advance();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        assert_eq!(seq.current(), second);
    }
}
