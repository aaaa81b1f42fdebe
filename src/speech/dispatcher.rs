//! Tiered speech dispatch with credential rotation and interruption
//!
//! One utterance walks the hosted tiers in order. Within a tier every
//! credential is tried before failing over; a credential rejection advances
//! the pool cursor and a success resets it. When every hosted tier is out,
//! the offline engine speaks instead. At most one utterance is in flight;
//! a new one with different text interrupts the old one, identical text is
//! dropped as a duplicate.

use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use uuid::Uuid;

use crate::config::Config;
use crate::lang::{self, Language};
use crate::{Error, Result};

use super::keys::KeyPool;
use super::local::{LocalEngine, LocalParams, SystemSpeech};
use super::playback::{AudioSink, CpalSink};
use super::providers::{ElevenLabs, Gender, GroqPlayAi, SynthesisBackend, SynthesisRequest};

/// Fired when audio actually starts and when the utterance is over
type Callback = Box<dyn FnOnce() + Send>;

/// Per-utterance options; defaults speak female, auto-detect language
pub struct SpeakOptions {
    pub gender: Gender,
    /// Overrides auto-detection when set
    pub language: Option<Language>,
    /// Overrides the configured speed when set
    pub speed: Option<f32>,
    /// Fired once when audio begins
    pub on_start: Option<Callback>,
    /// Fired exactly once when the utterance completes, fails, or is
    /// interrupted
    pub on_end: Option<Callback>,
}

impl Default for SpeakOptions {
    fn default() -> Self {
        Self {
            gender: Gender::Female,
            language: None,
            speed: None,
            on_start: None,
            on_end: None,
        }
    }
}

impl std::fmt::Debug for SpeakOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeakOptions")
            .field("gender", &self.gender)
            .field("language", &self.language)
            .field("speed", &self.speed)
            .finish_non_exhaustive()
    }
}

/// How an utterance ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Played to the end on some tier
    Completed,
    /// Interrupted by a newer utterance, or dropped as a duplicate
    Cancelled,
    /// Every tier failed
    Failed,
}

/// One hosted tier with its credential pool
struct Tier {
    backend: Box<dyn SynthesisBackend>,
    pool: std::sync::Mutex<KeyPool>,
}

struct Inner {
    tiers: Vec<Tier>,
    local: Option<Box<dyn LocalEngine>>,
    sink: Arc<dyn AudioSink>,
    default_speed: f32,
}

struct ActiveRequest {
    id: Uuid,
    text: String,
    cancel: oneshot::Sender<()>,
}

/// Speaks text through the tier chain; cheap to clone
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
    active: Arc<Mutex<Option<ActiveRequest>>>,
}

impl Dispatcher {
    /// Assemble a dispatcher from explicit parts
    ///
    /// Tiers with an empty credential pool are dropped up front so the
    /// dispatch loop never visits them.
    #[must_use]
    pub fn new(
        tiers: Vec<(Box<dyn SynthesisBackend>, KeyPool)>,
        local: Option<Box<dyn LocalEngine>>,
        sink: Arc<dyn AudioSink>,
        default_speed: f32,
    ) -> Self {
        let tiers = tiers
            .into_iter()
            .filter(|(backend, pool)| {
                if pool.is_empty() {
                    tracing::debug!(provider = backend.name(), "tier has no credentials, skipped");
                    false
                } else {
                    true
                }
            })
            .map(|(backend, pool)| Tier {
                backend,
                pool: std::sync::Mutex::new(pool),
            })
            .collect();

        Self {
            inner: Arc::new(Inner {
                tiers,
                local,
                sink,
                default_speed,
            }),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Assemble the production tier chain from configuration
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let tiers: Vec<(Box<dyn SynthesisBackend>, KeyPool)> = vec![
            (
                Box::new(ElevenLabs::new()?),
                KeyPool::new(config.api_keys.primary_voice.clone()),
            ),
            (
                Box::new(GroqPlayAi::new()?),
                KeyPool::new(config.api_keys.secondary_voice.clone()),
            ),
        ];

        let local: Option<Box<dyn LocalEngine>> = match SystemSpeech::discover() {
            Ok(engine) => Some(Box::new(engine)),
            Err(e) => {
                tracing::warn!(error = %e, "offline speech unavailable");
                None
            }
        };

        Ok(Self::new(
            tiers,
            local,
            Arc::new(CpalSink::new()),
            config.voice.speed,
        ))
    }

    /// Speak `text`, interrupting any different in-flight utterance
    ///
    /// Identical in-flight text makes this call a duplicate: it is dropped
    /// without touching the current playback and without firing its own
    /// callbacks. Returns once the utterance has finished, failed, or been
    /// interrupted.
    ///
    /// # Errors
    ///
    /// Returns error if the dispatch task panics
    pub async fn speak(&self, text: &str, mut options: SpeakOptions) -> Result<SpeechOutcome> {
        let id = Uuid::new_v4();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        {
            let mut guard = self.active.lock().await;
            if let Some(previous) = guard.take() {
                if previous.text == text {
                    tracing::debug!(request = %id, "duplicate utterance dropped");
                    *guard = Some(previous);
                    return Ok(SpeechOutcome::Cancelled);
                }
                tracing::debug!(request = %previous.id, "interrupting for new utterance");
                let _ = previous.cancel.send(());
                self.inner.sink.stop();
            }
            *guard = Some(ActiveRequest {
                id,
                text: text.to_string(),
                cancel: cancel_tx,
            });
        }

        let language = options
            .language
            .unwrap_or_else(|| lang::detect(text));
        let request = SynthesisRequest {
            text: text.to_string(),
            gender: options.gender,
            language,
            speed: options.speed.unwrap_or(self.inner.default_speed),
        };

        let inner = Arc::clone(&self.inner);
        let mut on_start = options.on_start.take();
        let mut on_end = options.on_end.take();

        let task = tokio::spawn(async move {
            let run = run_tiers(&inner, &request, &mut on_start);
            tokio::pin!(run);

            let outcome = tokio::select! {
                outcome = &mut run => outcome,
                _ = cancel_rx => SpeechOutcome::Cancelled,
            };

            if let Some(callback) = on_end.take() {
                callback();
            }
            outcome
        });

        let outcome = task
            .await
            .map_err(|e| Error::Tts(format!("dispatch task failed: {e}")))?;

        let mut guard = self.active.lock().await;
        if guard.as_ref().is_some_and(|active| active.id == id) {
            *guard = None;
        }

        Ok(outcome)
    }

    /// Interrupt the in-flight utterance, if any
    pub async fn stop(&self) {
        let mut guard = self.active.lock().await;
        if let Some(active) = guard.take() {
            tracing::debug!(request = %active.id, "stop requested");
            let _ = active.cancel.send(());
            self.inner.sink.stop();
        }
    }
}

/// Walk the hosted tiers, then the offline engine
async fn run_tiers(
    inner: &Inner,
    request: &SynthesisRequest,
    on_start: &mut Option<Callback>,
) -> SpeechOutcome {
    for tier in &inner.tiers {
        loop {
            let key = {
                let mut pool = tier.pool.lock().expect("pool lock");
                match pool.current().map(String::from) {
                    Some(key) => key,
                    None => {
                        // Exhaustion only lasts for this utterance; the next
                        // one retries the tier from the first key
                        pool.reset();
                        tracing::info!(
                            provider = tier.backend.name(),
                            "credentials exhausted, failing over"
                        );
                        break;
                    }
                }
            };

            match tier.backend.synthesize(request, &key).await {
                Ok(audio) => {
                    tier.pool.lock().expect("pool lock").reset();
                    tracing::debug!(
                        provider = tier.backend.name(),
                        bytes = audio.len(),
                        language = request.language.as_str(),
                        "synthesis succeeded"
                    );
                    if let Some(callback) = on_start.take() {
                        callback();
                    }
                    return match inner.sink.play_mp3(audio).await {
                        Ok(()) => SpeechOutcome::Completed,
                        Err(e) => {
                            tracing::error!(error = %e, "playback failed");
                            SpeechOutcome::Failed
                        }
                    };
                }
                Err(e) if e.is_rotatable() => {
                    tracing::warn!(
                        provider = tier.backend.name(),
                        error = %e,
                        "credential rejected, rotating"
                    );
                    tier.pool.lock().expect("pool lock").advance();
                }
                Err(e) => {
                    tracing::warn!(
                        provider = tier.backend.name(),
                        error = %e,
                        "tier failed, falling over"
                    );
                    break;
                }
            }
        }
    }

    if let Some(local) = &inner.local {
        if let Some(callback) = on_start.take() {
            callback();
        }
        let params = LocalParams {
            text: request.text.clone(),
            language: request.language,
            speed: request.speed,
        };
        return match local.speak(&params).await {
            Ok(()) => SpeechOutcome::Completed,
            Err(e) => {
                tracing::error!(engine = local.name(), error = %e, "offline speech failed");
                SpeechOutcome::Failed
            }
        };
    }

    tracing::error!("all speech tiers failed");
    SpeechOutcome::Failed
}
