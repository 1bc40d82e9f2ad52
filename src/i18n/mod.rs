//! Supported languages for translation, quizzes and speech practice.
//!
//! - `registry`: Every supported language with its
//!   prebuilt TTS voice and its speech-recognition locale
//! - `language`: Validated, copyable `Language` handle
//!
//! # Example
//!
//! ```rust,ignore
//! use linguist_ai::i18n::{Language, LanguageRegistry};
//!
//! let spanish = Language::from_code("es")?;
//! assert_eq!(spanish.voice(), "Puck");
//!
//! let languages = LanguageRegistry::get().list_all();
//! ```

mod language;
mod registry;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry, DEFAULT_VOICE};
