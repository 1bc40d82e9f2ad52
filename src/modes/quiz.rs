//! Quiz mode: configure, play five questions, see the summary.

use crate::error::{ModeError, OracleResult};
use crate::i18n::Language;
use crate::models::{Difficulty, QuizQuestion, QuizSet, QUIZ_TOPICS};
use crate::modes::{Outcome, Sequence};
use crate::oracle::LanguageOracle;
use tracing::{debug, info, warn};

/// A quiz being played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    quiz: QuizSet,
    current: usize,
    selected: Option<usize>,
    score: usize,
    romanized: bool,
}

impl QuizSession {
    fn new(quiz: QuizSet) -> Self {
        Self {
            quiz,
            current: 0,
            selected: None,
            score: 0,
            romanized: false,
        }
    }

    pub fn quiz(&self) -> &QuizSet {
        &self.quiz
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn current_question(&self) -> &QuizQuestion {
        &self.quiz.questions[self.current]
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// An answer has been chosen for the current question.
    pub fn is_revealed(&self) -> bool {
        self.selected.is_some()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn is_last_question(&self) -> bool {
        self.current + 1 >= self.total()
    }

    pub fn is_romanized(&self) -> bool {
        self.romanized
    }

    /// Display label for option `index` of the current question.
    pub fn option_label(&self, index: usize) -> Option<&str> {
        self.current_question().option_label(index, self.romanized)
    }

    /// Question text for the current display mode.
    pub fn question_label(&self) -> &str {
        let question = self.current_question();
        if self.romanized && !question.question_transliteration.is_empty() {
            &question.question_transliteration
        } else {
            &question.question
        }
    }

    pub fn toggle_romanized(&mut self) {
        self.romanized = !self.romanized;
    }
}

/// Final result of a played quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    pub topic: String,
    pub language: String,
    pub difficulty: Difficulty,
    pub score: usize,
    pub total: usize,
}

impl QuizSummary {
    /// Percentage of correct answers, rounded down.
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.score * 100 / self.total
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    Configuring { error: Option<String> },
    Loading,
    InProgress(QuizSession),
    Completed(QuizSummary),
}

/// A quiz request issued by [`QuizMode::begin_quiz`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    seq: u64,
    pub language: Language,
    pub topic: String,
    pub difficulty: Difficulty,
}

/// What the learner sees right after choosing an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_index: usize,
    pub explanation: String,
}

pub struct QuizMode {
    language: Language,
    topic: String,
    difficulty: Difficulty,
    state: QuizState,
    requests: Sequence,
}

impl QuizMode {
    pub fn new(language: Language, difficulty: Difficulty) -> Self {
        Self {
            language,
            topic: QUIZ_TOPICS[0].to_string(),
            difficulty,
            state: QuizState::Configuring { error: None },
            requests: Sequence::default(),
        }
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn session(&self) -> Option<&QuizSession> {
        match &self.state {
            QuizState::InProgress(session) => Some(session),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<&QuizSummary> {
        match &self.state {
            QuizState::Completed(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            QuizState::Configuring { error } => error.as_deref(),
            _ => None,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    // ==================== Generation ====================

    pub fn begin_quiz(&mut self) -> Result<QuizRequest, ModeError> {
        if self.state == QuizState::Loading {
            return Err(ModeError::Busy);
        }

        let request = QuizRequest {
            seq: self.requests.advance(),
            language: self.language,
            topic: self.topic.clone(),
            difficulty: self.difficulty,
        };
        self.state = QuizState::Loading;
        Ok(request)
    }

    pub fn complete_quiz(&mut self, request: QuizRequest, reply: OracleResult<QuizSet>) -> Outcome {
        if !self.requests.is_current(request.seq) || self.state != QuizState::Loading {
            debug!("Discarding stale quiz reply #{}", request.seq);
            return Outcome::Stale;
        }

        match reply {
            Ok(quiz) if quiz.questions.is_empty() => {
                warn!("Quiz reply had no questions");
                self.state = QuizState::Configuring {
                    error: Some("The quiz came back empty. Please try again.".to_string()),
                };
            }
            Ok(quiz) => {
                info!(
                    "Quiz ready: {} questions on '{}'",
                    quiz.questions.len(),
                    quiz.topic
                );
                self.state = QuizState::InProgress(QuizSession::new(quiz));
            }
            Err(e) => {
                warn!("Quiz generation failed: {}", e);
                self.state = QuizState::Configuring {
                    error: Some(format!("Failed to generate quiz. Please try again. ({})", e)),
                };
            }
        }
        Outcome::Applied
    }

    /// Generate a quiz for the current configuration and start playing it.
    pub async fn start(&mut self, oracle: &dyn LanguageOracle) -> Result<Outcome, ModeError> {
        let request = self.begin_quiz()?;
        let reply = oracle
            .generate_quiz(request.language.name(), &request.topic, request.difficulty)
            .await;
        Ok(self.complete_quiz(request, reply))
    }

    // ==================== Playing ====================

    /// Choose an answer for the current question.
    ///
    /// Only the first choice counts; later calls for the same question
    /// return `Ok(None)` and leave the score untouched.
    pub fn select_option(&mut self, index: usize) -> Result<Option<AnswerFeedback>, ModeError> {
        let QuizState::InProgress(session) = &mut self.state else {
            return Err(ModeError::NoActiveQuiz);
        };
        if session.is_revealed() {
            return Ok(None);
        }

        let question = session.current_question();
        let count = question.options.len();
        if index >= count {
            return Err(ModeError::InvalidOption { index, count });
        }

        let feedback = AnswerFeedback {
            correct: question.is_correct(index),
            correct_index: question.correct_answer_index,
            explanation: question.explanation.clone(),
        };
        if feedback.correct {
            session.score += 1;
        }
        session.selected = Some(index);
        Ok(Some(feedback))
    }

    /// Advance past a revealed question, finishing after the last one.
    pub fn next_question(&mut self) -> Result<(), ModeError> {
        let QuizState::InProgress(session) = &mut self.state else {
            return Err(ModeError::NoActiveQuiz);
        };
        if !session.is_revealed() {
            return Err(ModeError::AnswerNotRevealed);
        }

        if session.is_last_question() {
            let summary = QuizSummary {
                topic: session.quiz.topic.clone(),
                language: session.quiz.language.clone(),
                difficulty: session.quiz.difficulty,
                score: session.score,
                total: session.total(),
            };
            info!("Quiz finished: {}/{}", summary.score, summary.total);
            self.state = QuizState::Completed(summary);
        } else {
            session.current += 1;
            session.selected = None;
        }
        Ok(())
    }

    pub fn toggle_romanized(&mut self) -> Result<(), ModeError> {
        match &mut self.state {
            QuizState::InProgress(session) => {
                session.toggle_romanized();
                Ok(())
            }
            _ => Err(ModeError::NoActiveQuiz),
        }
    }

    /// Back to configuration, keeping the chosen settings.
    pub fn restart(&mut self) {
        self.requests.advance();
        self.state = QuizState::Configuring { error: None };
    }

    /// Abandon an in-flight generation.
    pub fn cancel(&mut self) {
        if self.state == QuizState::Loading {
            self.restart();
        }
    }

    /// Generate a fresh quiz with the same settings after finishing one.
    pub async fn try_again(&mut self, oracle: &dyn LanguageOracle) -> Result<Outcome, ModeError> {
        if self.summary().is_none() {
            return Err(ModeError::NoActiveQuiz);
        }
        self.start(oracle).await
    }
}
