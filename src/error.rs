//! Error types for the companion engine

use thiserror::Error;

/// Result type alias for companion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the companion engine
///
/// Ambiguous intent extraction is deliberately *not* represented here; an
/// unclear completion request resolves to a clarification reply, which is a
/// normal return value, not a fault.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/HTTP failure reaching a provider
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 401/429 from a provider; triggers credential rotation
    #[error("auth or quota error from {provider}: HTTP {status}")]
    AuthOrQuota { provider: String, status: u16 },

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Local audio/speech engine failure after a successful synthesis
    #[error("playback error: {0}")]
    Playback(String),

    /// Capability missing in the runtime (e.g. no local speech engine)
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// Generative completion error
    #[error("llm error: {0}")]
    Llm(String),

    /// Key-value store error
    #[error("store error: {0}")]
    Store(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error should advance the credential cursor and retry
    /// with the next key in the same tier.
    #[must_use]
    pub const fn is_rotatable(&self) -> bool {
        matches!(self, Self::AuthOrQuota { .. })
    }
}
