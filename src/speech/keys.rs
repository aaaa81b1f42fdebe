//! Credential rotation for rate-limited providers

/// Position within a credential pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Index of the credential to try next
    Active(usize),
    /// Every credential has been rejected since the last reset
    Exhausted,
}

/// An ordered pool of API keys with a rotation cursor
///
/// Keys are tried in order. A rejected key advances the cursor; a
/// successful call resets it so the next request starts from the first
/// key again.
#[derive(Debug, Clone)]
pub struct KeyPool {
    keys: Vec<String>,
    cursor: Cursor,
}

impl KeyPool {
    /// Build a pool from configured keys, dropping empty entries
    #[must_use]
    pub fn new(keys: Vec<String>) -> Self {
        let keys: Vec<String> = keys.into_iter().filter(|k| !k.trim().is_empty()).collect();
        let cursor = if keys.is_empty() {
            Cursor::Exhausted
        } else {
            Cursor::Active(0)
        };
        Self { keys, cursor }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// The key the next attempt should use, if any remain
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        match self.cursor {
            Cursor::Active(i) => self.keys.get(i).map(String::as_str),
            Cursor::Exhausted => None,
        }
    }

    /// Move past the current key after a rejection; the pool becomes
    /// exhausted once the last key is passed
    pub fn advance(&mut self) {
        if let Cursor::Active(i) = self.cursor {
            self.cursor = if i + 1 < self.keys.len() {
                Cursor::Active(i + 1)
            } else {
                Cursor::Exhausted
            };
        }
    }

    /// Move to the next key, wrapping around instead of exhausting
    pub fn advance_wrapping(&mut self) {
        if let Cursor::Active(i) = self.cursor
            && !self.keys.is_empty()
        {
            self.cursor = Cursor::Active((i + 1) % self.keys.len());
        }
    }

    /// Restart from the first key after a successful call
    pub fn reset(&mut self) {
        if !self.keys.is_empty() {
            self.cursor = Cursor::Active(0);
        }
    }
}
