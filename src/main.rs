use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kindred_companion::{
    intent, Config, Dispatcher, Grounding, Journal, Session, SpeakOptions, SqliteStore,
};

/// Kindred - a living AI companion
#[derive(Parser)]
#[command(name = "kindred", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable spoken replies (text only)
    #[arg(long, env = "KINDRED_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat with the companion (default)
    Chat,
    /// Test TTS output through the tier chain
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Show the detected language for a piece of text
    DetectLang {
        /// Text to classify
        text: String,
    },
    /// List pending tasks
    Tasks,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,kindred_companion=info",
        1 => "info,kindred_companion=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if cli.disable_voice {
        config.voice.enabled = false;
    }

    match cli.command {
        Some(Command::TestTts { text }) => test_tts(&config, &text).await,
        Some(Command::DetectLang { text }) => {
            println!("{}", kindred_companion::detect(&text).as_str());
            Ok(())
        }
        Some(Command::Tasks) => list_tasks(&config),
        Some(Command::Chat) | None => chat(config).await,
    }
}

fn open_journal(config: &Config) -> anyhow::Result<Journal> {
    let store = SqliteStore::open(config.data_dir.join("kindred.db"))?;
    Ok(Journal::new(Arc::new(store)))
}

async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::from_config(config)?;
    let outcome = dispatcher.speak(text, SpeakOptions::default()).await?;
    tracing::info!(?outcome, "test utterance finished");
    Ok(())
}

fn list_tasks(config: &Config) -> anyhow::Result<()> {
    let journal = open_journal(config)?;
    let pending = journal.pending_tasks()?;
    if pending.is_empty() {
        println!("No pending tasks.");
        return Ok(());
    }
    for task in pending {
        let mut line = format!("• {}", task.text);
        if let Some(time) = &task.time {
            line.push_str(&format!(" at {time}"));
        }
        if let Some(date) = &task.date {
            line.push_str(&format!(" on {date}"));
        }
        if let Some(recurrence) = &task.recurrence {
            line.push_str(&format!(" ({recurrence})"));
        }
        println!("{line}");
    }
    Ok(())
}

async fn chat(config: Config) -> anyhow::Result<()> {
    let journal = open_journal(&config)?;
    let mut session = Session::from_config(&config, Utc::now())?;
    let dispatcher = if config.voice.enabled {
        Some(Dispatcher::from_config(&config)?)
    } else {
        None
    };

    println!("Kindred is listening. Type 'quit' to leave.");
    let stdin = std::io::stdin();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "quit" || message == "exit" {
            break;
        }

        let now = Utc::now();
        let pending = journal.pending_tasks()?;
        let today = journal.activities_today(now)?;

        let intent = intent::extract(message, &pending, &today);
        let reply = match intent::apply(intent, &journal, now)? {
            Some(reply) => reply,
            None => {
                let grounding = Grounding::collect(&journal, now)?.render(now);
                session.respond(message, &grounding, now).await
            }
        };

        println!("kindred> {reply}");

        if let Some(dispatcher) = &dispatcher {
            let spoken = dispatcher.speak(&reply, SpeakOptions::default()).await;
            if let Err(e) = spoken {
                tracing::warn!(error = %e, "spoken reply failed");
            }
        }
    }

    Ok(())
}
