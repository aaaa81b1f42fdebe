//! Tiered text-to-speech: hosted providers with credential rotation,
//! falling back to an offline system synthesizer

pub mod dispatcher;
pub mod keys;
pub mod local;
pub mod playback;
pub mod providers;

pub use dispatcher::{Dispatcher, SpeakOptions, SpeechOutcome};
pub use keys::KeyPool;
pub use local::{LocalEngine, LocalParams, SystemSpeech};
pub use playback::{AudioSink, CpalSink};
pub use providers::{ElevenLabs, Gender, GroqPlayAi, SynthesisBackend, SynthesisRequest};
