//! Language-learning client: translations with grammar insight, generated
//! quizzes and pronunciation practice, all backed by a remote generative
//! model.

pub mod audio;
pub mod config;
pub mod error;
pub mod gemini;
pub mod history;
pub mod i18n;
pub mod mock;
pub mod models;
pub mod modes;
pub mod oracle;
pub mod preferences;
pub mod prompts;
pub mod schema;
pub mod speech;
pub mod storage;
