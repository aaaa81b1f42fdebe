//! Kindred - a living AI companion engine
//!
//! This library provides the core functionality for the Kindred companion:
//! - Tiered text-to-speech with credential rotation and offline fallback
//! - Language detection for bilingual (English/Hindi) voice output
//! - Intent extraction from free-text utterances (tasks, completions,
//!   activities)
//! - Journal persistence for tasks, activities, and the weekly routine
//! - A grounded conversational session over a generative model
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Utterance                         │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   Intent pipeline: add-task │ completion │ activity  │
//! │            (falls through to conversation)           │
//! └──────────┬──────────────────────────────┬───────────┘
//!            │ mutation + reply             │ no intent
//! ┌──────────▼───────────┐    ┌─────────────▼───────────┐
//! │  Journal (kv store)  │    │  Session + grounding     │
//! └──────────────────────┘    └─────────────┬───────────┘
//!                                           │ reply text
//! ┌─────────────────────────────────────────▼───────────┐
//! │  Speech dispatcher: ElevenLabs → Groq → offline      │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod intent;
pub mod journal;
pub mod lang;
pub mod persona;
pub mod session;
pub mod speech;
pub mod store;

pub use config::Config;
pub use context::Grounding;
pub use error::{Error, Result};
pub use intent::Intent;
pub use journal::{Activity, Category, Journal, Recurrence, RoutineSlot, Task};
pub use lang::{detect, Language};
pub use persona::{Mood, Relationship};
pub use session::{Session, SessionState};
pub use speech::{Dispatcher, Gender, SpeakOptions, SpeechOutcome};
pub use store::{MemoryStore, SqliteStore, Store};
