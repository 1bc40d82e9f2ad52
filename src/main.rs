//! Terminal front end.
//!
//! Usage:
//!   linguist translate "good morning" --to ja --speak
//!   linguist history [--clear]
//!   linguist quiz --language fr --topic "Travel & Directions" --difficulty intermediate
//!   linguist practice --language es
//!   linguist languages
//!
//! Synthesized audio is written as WAV files under `$LINGUIST_DATA_DIR/audio`.
//! Typing stands in for the microphone when a mode asks you to speak.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use linguist_ai::audio::WavFilePlayer;
use linguist_ai::config::Config;
use linguist_ai::gemini::GeminiClient;
use linguist_ai::history::HistoryStore;
use linguist_ai::i18n::{Language, LanguageRegistry};
use linguist_ai::models::{Difficulty, TranslationResult, QUIZ_TOPICS};
use linguist_ai::modes::{Outcome, QuizMode, QuizState, SpeechMode, TranslateMode};
use linguist_ai::preferences::Preferences;
use linguist_ai::speech::{EventSink, RecognitionEvent, RecognitionOptions, SpeechRecognizer};
use linguist_ai::storage::{FileStore, KeyValueStore};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "linguist", version, about = "Practice a language with an AI tutor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate text and explain it
    Translate {
        text: String,
        #[arg(long, value_parser = parse_language)]
        from: Option<Language>,
        #[arg(long, value_parser = parse_language)]
        to: Option<Language>,
        /// Also synthesize the translation
        #[arg(long)]
        speak: bool,
    },
    /// Show recent translations
    History {
        #[arg(long)]
        clear: bool,
        /// Show the full breakdown of one entry
        #[arg(long)]
        show: Option<String>,
    },
    /// Take a five-question quiz
    Quiz {
        #[arg(long, value_parser = parse_language)]
        language: Option<Language>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },
    /// Pronunciation practice
    Practice {
        #[arg(long, value_parser = parse_language)]
        language: Option<Language>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },
    /// List supported languages
    Languages,
}

fn parse_language(code: &str) -> Result<Language, String> {
    Language::from_code(code).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("linguist_ai=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Command::Languages = cli.command {
        print_languages();
        return Ok(());
    }

    let config = Config::from_env()?;
    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&config.data_dir)
            .with_context(|| format!("Failed to open {}", config.data_dir.display()))?,
    );
    let defaults = Preferences::new(config.default_source_lang, config.default_target_lang);
    let mut prefs = Preferences::load_or(store.as_ref(), defaults);
    let oracle = GeminiClient::new(&config).context("Failed to build HTTP client")?;
    let player = WavFilePlayer::new(config.data_dir.join("audio"));
    info!("Using data directory {}", config.data_dir.display());

    match cli.command {
        Command::Translate {
            text,
            from,
            to,
            speak,
        } => {
            if prefs.override_with(from, to, None) {
                prefs.save(store.as_ref())?;
            }

            let history = HistoryStore::load(store.clone());
            let mut mode = TranslateMode::new(history, prefs.source_lang, prefs.target_lang);
            mode.set_input(text);
            mode.translate(&oracle).await?;

            if let Some(error) = mode.error() {
                return Err(anyhow!("{}", error));
            }
            if let Some(result) = mode.result() {
                print_translation(result);
            }
            if speak {
                let path = player.next_path();
                mode.speak(&oracle, &player).await?;
                println!("\nAudio: {}", path.display());
            }
        }
        Command::History { clear, show } => {
            let mut history = HistoryStore::load(store.clone());
            if clear {
                history.clear()?;
                println!("History cleared.");
            } else if let Some(id) = show {
                let item = history
                    .get(&id)
                    .ok_or_else(|| anyhow!("No history entry with id {}", id))?;
                println!("{} -> {}: {}\n", item.source_lang, item.target_lang, item.source_text);
                print_translation(&item.result);
            } else if history.is_empty() {
                println!("No translations yet.");
            } else {
                for item in history.items() {
                    let when = chrono::DateTime::from_timestamp_millis(item.timestamp)
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!(
                        "{}  [{} -> {}]  {} => {}\n    id: {}",
                        when,
                        item.source_lang.code(),
                        item.target_lang.code(),
                        item.source_text,
                        item.target_text,
                        item.id
                    );
                }
            }
        }
        Command::Quiz {
            language,
            topic,
            difficulty,
        } => {
            if prefs.override_with(None, language, difficulty) {
                prefs.save(store.as_ref())?;
            }
            let mut mode = QuizMode::new(prefs.target_lang, prefs.difficulty);
            if let Some(topic) = topic {
                mode.set_topic(topic);
            }
            run_quiz(&mut mode, &oracle).await?;
        }
        Command::Practice {
            language,
            difficulty,
        } => {
            if prefs.override_with(None, language, difficulty) {
                prefs.save(store.as_ref())?;
            }
            let mut mode = SpeechMode::new(prefs.target_lang, prefs.difficulty);
            run_practice(&mut mode, &oracle, &player).await?;
        }
        Command::Languages => print_languages(),
    }

    Ok(())
}

fn print_languages() {
    for lang in LanguageRegistry::get().list_all() {
        println!(
            "{:<4} {:<12} {:<12} voice: {}",
            lang.code, lang.name, lang.native_name, lang.voice
        );
    }
}

fn print_translation(result: &TranslationResult) {
    println!("{}", result.translated_text);
    if let Some(roman) = &result.transliteration {
        println!("  ({})", roman);
    }

    if !result.grammar_points.is_empty() {
        println!("\nGrammar");
        for point in &result.grammar_points {
            println!("  * {}: {}", point.rule, point.explanation);
            println!("    e.g. {}", point.example);
        }
    }

    if !result.vocabulary.is_empty() {
        println!("\nVocabulary");
        for item in &result.vocabulary {
            println!("  * {} = {} ({})", item.word, item.meaning, item.usage);
        }
    }

    println!("\nNative tips\n  {}", result.native_tips);
    if let Some(note) = &result.cultural_note {
        println!("\nCultural note\n  {}", note);
    }
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn run_quiz(mode: &mut QuizMode, oracle: &GeminiClient) -> Result<()> {
    loop {
        println!(
            "Generating a {} {} quiz on '{}'...",
            mode.difficulty(),
            mode.language(),
            mode.topic()
        );
        mode.start(oracle).await?;
        if let Some(error) = mode.error() {
            return Err(anyhow!("{}", error));
        }

        while let Some(session) = mode.session() {
            let question = session.current_question();
            println!(
                "\nQuestion {}/{}: {}",
                session.current_index() + 1,
                session.total(),
                session.question_label()
            );
            for i in 0..question.options.len() {
                println!("  {}) {}", i + 1, session.option_label(i).unwrap_or_default());
            }

            let answer = prompt_line("Answer (number, or r to toggle romanization): ")?;
            if answer.eq_ignore_ascii_case("r") {
                mode.toggle_romanized()?;
                continue;
            }
            let Some(index) = answer.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
                println!("Please type an option number.");
                continue;
            };

            match mode.select_option(index) {
                Ok(Some(feedback)) => {
                    if feedback.correct {
                        println!("Correct!");
                    } else {
                        println!(
                            "Not quite. The answer was option {}.",
                            feedback.correct_index + 1
                        );
                    }
                    println!("{}", feedback.explanation);
                    mode.next_question()?;
                }
                Ok(None) => mode.next_question()?,
                Err(e) => println!("{}", e),
            }
        }

        if let QuizState::Completed(summary) = mode.state() {
            println!(
                "\nYou scored {}/{} ({}%) on '{}'.",
                summary.score,
                summary.total,
                summary.percent(),
                summary.topic
            );
        }

        let again = prompt_line("Try again? [y/N] ")?;
        if !again.eq_ignore_ascii_case("y") {
            return Ok(());
        }
        mode.restart();
        let topic = prompt_line(&format!(
            "Topic (enter for '{}', or 1-{}): ",
            mode.topic(),
            QUIZ_TOPICS.len()
        ))?;
        let preset = topic
            .parse::<usize>()
            .ok()
            .and_then(|n| QUIZ_TOPICS.get(n.wrapping_sub(1)));
        if let Some(t) = preset {
            mode.set_topic(*t);
        } else if !topic.is_empty() {
            mode.set_topic(topic);
        }
    }
}

/// Reads one line from the terminal in place of a microphone.
struct TypedRecognizer;

impl SpeechRecognizer for TypedRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    fn start(
        &self,
        options: &RecognitionOptions,
        events: EventSink,
    ) -> Result<(), linguist_ai::error::SpeechError> {
        print!("Say it ({}) > ", options.locale);
        let _ = std::io::stdout().flush();

        std::thread::spawn(move || {
            let _ = events.send(RecognitionEvent::Start);
            let mut line = String::new();
            match std::io::stdin().lock().read_line(&mut line) {
                Ok(_) => {
                    let _ = events.send(RecognitionEvent::Result(line));
                }
                Err(e) => {
                    let _ = events.send(RecognitionEvent::Error(e.to_string()));
                }
            }
            let _ = events.send(RecognitionEvent::End);
        });
        Ok(())
    }

    fn abort(&self) {}
}

async fn run_practice(
    mode: &mut SpeechMode,
    oracle: &GeminiClient,
    player: &WavFilePlayer,
) -> Result<()> {
    let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(TypedRecognizer);

    loop {
        if mode.new_challenge(oracle).await == Outcome::Applied {
            if let Some(error) = mode.error() {
                return Err(anyhow!("{}", error));
            }
        }
        let Some(challenge) = mode.challenge() else {
            return Ok(());
        };
        println!("\n{}\n  ({})", challenge.phrase_to_speak, challenge.translation);

        let path = player.next_path();
        match mode.play_native(oracle, player).await {
            Ok(()) => println!("Native audio: {}", path.display()),
            Err(e) => println!("Could not synthesize audio: {}", e),
        }

        if let Err(e) = mode.record(recognizer.clone(), oracle).await {
            println!("{}", e);
        }
        while mode.evaluation().is_none() && mode.transcript().is_some() {
            if let Some(error) = mode.error() {
                println!("{}", error);
            }
            if !prompt_line("Retry evaluation? [Y/n] ")?.eq_ignore_ascii_case("n") {
                mode.evaluate(oracle).await?;
            } else {
                break;
            }
        }

        if let Some(evaluation) = mode.evaluation() {
            println!("\nScore: {}/100", evaluation.score);
            println!("Accuracy: {}", evaluation.accuracy_feedback);
            println!("Pronunciation: {}", evaluation.pronunciation_tips);
            println!("Naturalness: {}", evaluation.naturalness);
        }

        if !prompt_line("\nAnother phrase? [y/N] ")?.eq_ignore_ascii_case("y") {
            return Ok(());
        }
    }
}
