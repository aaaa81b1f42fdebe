//! Shared test doubles for the speech tier chain

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use kindred_companion::speech::{
    AudioSink, LocalEngine, LocalParams, SynthesisBackend, SynthesisRequest,
};
use kindred_companion::{Error, Result};

/// How a scripted backend answers every call
#[derive(Debug, Clone, Copy)]
pub enum BackendMode {
    /// Return MP3-ish bytes
    Ok,
    /// Reject the credential with a 429
    RateLimited,
    /// Fail with a non-rotatable server error
    ServerError,
    /// 429 the first n calls, then return audio
    RecoversAfter(usize),
}

/// Backend that records every credential it was handed
pub struct ScriptedBackend {
    name: &'static str,
    mode: BackendMode,
    calls: AtomicUsize,
    keys_seen: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBackend {
    pub fn new(name: &'static str, mode: BackendMode) -> (Self, Arc<Mutex<Vec<String>>>) {
        let keys_seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                name,
                mode,
                calls: AtomicUsize::new(0),
                keys_seen: Arc::clone(&keys_seen),
            },
            keys_seen,
        )
    }
}

#[async_trait]
impl SynthesisBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn synthesize(&self, _request: &SynthesisRequest, api_key: &str) -> Result<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys_seen.lock().unwrap().push(api_key.to_string());
        match self.mode {
            BackendMode::Ok => Ok(vec![0u8; 16]),
            BackendMode::RecoversAfter(n) if call >= n => Ok(vec![0u8; 16]),
            BackendMode::RateLimited | BackendMode::RecoversAfter(_) => Err(Error::AuthOrQuota {
                provider: self.name.to_string(),
                status: 429,
            }),
            BackendMode::ServerError => Err(Error::Tts(format!("{} error 500: boom", self.name))),
        }
    }
}

/// Sink that counts plays instead of touching audio hardware
pub struct CountingSink {
    plays: AtomicUsize,
    /// Simulated playback duration
    delay: Duration,
}

impl CountingSink {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            plays: AtomicUsize::new(0),
            delay,
        }
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioSink for CountingSink {
    async fn play_mp3(&self, _mp3_data: Vec<u8>) -> Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }

    fn stop(&self) {}
}

/// Offline engine that records what it was asked to speak
pub struct RecordingLocalEngine {
    utterances: Arc<Mutex<Vec<String>>>,
}

impl RecordingLocalEngine {
    pub fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let utterances = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                utterances: Arc::clone(&utterances),
            },
            utterances,
        )
    }
}

#[async_trait]
impl LocalEngine for RecordingLocalEngine {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn speak(&self, params: &LocalParams) -> Result<()> {
        self.utterances.lock().unwrap().push(params.text.clone());
        Ok(())
    }
}
