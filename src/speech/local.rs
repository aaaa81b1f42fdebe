//! Offline speech via an installed system synthesizer
//!
//! The last voice tier needs no network and no credentials. It shells out
//! to whichever supported synthesizer is on PATH and blocks until the
//! utterance finishes, matching the hosted tiers' play-to-completion
//! behavior.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::lang::Language;
use crate::{Error, Result};

/// Baseline words-per-minute a speed multiplier of 1.0 maps to
const BASE_RATE_WPM: f32 = 175.0;

/// Shape of one offline utterance
#[derive(Debug, Clone)]
pub struct LocalParams {
    pub text: String,
    pub language: Language,
    /// Speed multiplier, 1.0 is normal
    pub speed: f32,
}

/// An offline synthesizer that speaks directly to the speakers
#[async_trait]
pub trait LocalEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Speak the utterance, returning once audio has finished
    async fn speak(&self, params: &LocalParams) -> Result<()>;
}

/// Supported system synthesizer commands, in preference order
const CANDIDATES: &[&str] = &["say", "espeak-ng", "espeak", "spd-say"];

/// Offline synthesis through a system speech command
pub struct SystemSpeech {
    binary: PathBuf,
    kind: EngineKind,
}

#[derive(Debug, Clone, Copy)]
enum EngineKind {
    /// macOS `say`
    Say,
    /// `espeak` or `espeak-ng`
    Espeak,
    /// speech-dispatcher's `spd-say`
    SpeechDispatcher,
}

impl SystemSpeech {
    /// Find a usable synthesizer on PATH
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedInput`] when no supported command is
    /// installed
    pub fn discover() -> Result<Self> {
        for candidate in CANDIDATES {
            if let Some(binary) = find_on_path(candidate) {
                let kind = match *candidate {
                    "say" => EngineKind::Say,
                    "spd-say" => EngineKind::SpeechDispatcher,
                    _ => EngineKind::Espeak,
                };
                tracing::debug!(binary = %binary.display(), "system synthesizer found");
                return Ok(Self { binary, kind });
            }
        }
        Err(Error::UnsupportedInput(
            "no system speech synthesizer installed (tried say, espeak-ng, espeak, spd-say)"
                .to_string(),
        ))
    }

    fn args(&self, params: &LocalParams) -> Vec<String> {
        let rate_wpm = (BASE_RATE_WPM * params.speed).round();
        match self.kind {
            EngineKind::Say => vec![
                "-r".to_string(),
                format!("{rate_wpm}"),
                params.text.clone(),
            ],
            EngineKind::Espeak => vec![
                "-s".to_string(),
                format!("{rate_wpm}"),
                "-v".to_string(),
                espeak_voice(params.language).to_string(),
                params.text.clone(),
            ],
            EngineKind::SpeechDispatcher => vec![
                "-w".to_string(),
                "-l".to_string(),
                params.language.locale().to_string(),
                params.text.clone(),
            ],
        }
    }
}

#[async_trait]
impl LocalEngine for SystemSpeech {
    fn name(&self) -> &'static str {
        "system-speech"
    }

    async fn speak(&self, params: &LocalParams) -> Result<()> {
        let args = self.args(params);
        let status = Command::new(&self.binary).args(&args).status().await?;
        if !status.success() {
            return Err(Error::Tts(format!(
                "{} exited with {status}",
                self.binary.display()
            )));
        }
        Ok(())
    }
}

const fn espeak_voice(language: Language) -> &'static str {
    match language {
        Language::English => "en-us",
        Language::Hindi => "hi",
    }
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn espeak_args_carry_rate_and_voice() {
        let engine = SystemSpeech {
            binary: PathBuf::from("/usr/bin/espeak-ng"),
            kind: EngineKind::Espeak,
        };
        let args = engine.args(&LocalParams {
            text: "hello".to_string(),
            language: Language::Hindi,
            speed: 1.0,
        });
        assert_eq!(args, vec!["-s", "175", "-v", "hi", "hello"]);
    }

    #[test]
    fn spd_say_waits_for_completion() {
        let engine = SystemSpeech {
            binary: PathBuf::from("/usr/bin/spd-say"),
            kind: EngineKind::SpeechDispatcher,
        };
        let args = engine.args(&LocalParams {
            text: "hello".to_string(),
            language: Language::English,
            speed: 1.2,
        });
        assert_eq!(args[0], "-w");
    }
}
