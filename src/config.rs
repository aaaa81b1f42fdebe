//! Configuration management for the companion engine

use std::path::PathBuf;

use crate::{Error, Result};

/// Maximum number of primary-tier (ElevenLabs) voice keys
const PRIMARY_VOICE_KEY_SLOTS: usize = 5;

/// Maximum number of secondary-tier (Groq) keys; the same pool also serves
/// the generative model
const GROQ_KEY_SLOTS: usize = 3;

/// Companion engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (key-value store)
    pub data_dir: PathBuf,

    /// API key pools per provider
    pub api_keys: ApiKeys,

    /// Voice synthesis configuration
    pub voice: VoiceConfig,

    /// LLM model identifier for chat completions
    pub llm_model: String,

    /// Display name the companion uses for the user
    pub user_name: String,
}

/// Ordered API key pools, one per provider tier
///
/// Absent or empty environment slots are filtered out; an empty pool causes
/// that tier to be skipped entirely.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Primary cloud voice tier (ElevenLabs), up to 5 keys
    pub primary_voice: Vec<String>,

    /// Secondary cloud voice tier (Groq PlayAI), up to 3 keys
    pub secondary_voice: Vec<String>,

    /// Generative model (Groq chat completions), up to 3 keys
    pub generative: Vec<String>,
}

/// Voice synthesis configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable audible output
    pub enabled: bool,

    /// Playback speed multiplier for the secondary tier
    pub speed: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 1.0,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Key pools come from numbered variables (`KINDRED_ELEVENLABS_API_KEY_1`
    /// through `_5`, `KINDRED_GROQ_API_KEY_1` through `_3`); missing slots
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if no data directory can be determined
    pub fn from_env() -> Result<Self> {
        let groq_keys = numbered_keys("KINDRED_GROQ_API_KEY", GROQ_KEY_SLOTS);

        let api_keys = ApiKeys {
            primary_voice: numbered_keys("KINDRED_ELEVENLABS_API_KEY", PRIMARY_VOICE_KEY_SLOTS),
            secondary_voice: groq_keys.clone(),
            generative: groq_keys,
        };

        tracing::debug!(
            primary = api_keys.primary_voice.len(),
            secondary = api_keys.secondary_voice.len(),
            generative = api_keys.generative.len(),
            "credential pools loaded"
        );

        let data_dir = match std::env::var("KINDRED_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => directories::ProjectDirs::from("dev", "kindred", "kindred")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| Error::Config("cannot determine data directory".to_string()))?,
        };

        let llm_model = std::env::var("KINDRED_LLM_MODEL")
            .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string());

        let user_name =
            std::env::var("KINDRED_USER_NAME").unwrap_or_else(|_| "friend".to_string());

        Ok(Self {
            data_dir,
            api_keys,
            voice: VoiceConfig::default(),
            llm_model,
            user_name,
        })
    }
}

/// Collect `{prefix}_1` .. `{prefix}_{slots}` from the environment,
/// dropping absent or empty values
fn numbered_keys(prefix: &str, slots: usize) -> Vec<String> {
    (1..=slots)
        .filter_map(|i| std::env::var(format!("{prefix}_{i}")).ok())
        .filter(|key| !key.trim().is_empty())
        .collect()
}
