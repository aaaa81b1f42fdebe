//! Language detection for voice selection
//!
//! Classifies free text as English or Hindi. Devanagari script is an
//! immediate Hindi signal; romanized Hindi (Hinglish) is detected by
//! intersecting the text against a fixed lexicon of common function words.

use std::sync::LazyLock;

use regex::Regex;

/// Detected utterance language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Hindi,
}

impl Language {
    /// BCP 47-ish locale tag for local speech engines
    #[must_use]
    pub const fn locale(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::Hindi => "hi-IN",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Hindi => "hindi",
        }
    }
}

/// Hinglish ratio above which text is classified as Hindi
const HINGLISH_RATIO_THRESHOLD: f64 = 0.15;

/// Absolute match count at or above which text is classified as Hindi
const HINGLISH_MATCH_FLOOR: usize = 2;

/// Romanized Hindi function words: pronouns, common verbs, question words,
/// postpositions, discourse particles
const HINGLISH_LEXICON: &[&str] = &[
    // question words
    "kya", "kaise", "kahan", "kab", "kyun", "kyunki", "kaun", "kisko",
    // common verbs
    "hai", "hoon", "ho", "hain", "kar", "karna", "karo", "kare", "karta", "karti",
    "raha", "rahe", "rahi", "tha", "thi", "the",
    "gaya", "gayi", "gaye", "diya", "liya", "kiya", "dekha", "suna",
    "aaya", "aayi", "aaye", "jaana", "aana", "dena", "lena",
    // pronouns
    "main", "mein", "hum", "tum", "aap", "yeh", "ye", "woh", "wo", "koi", "kuch",
    "inka", "unka", "mera", "tera", "uska", "apna",
    // common words
    "nahi", "nahin", "mat", "haan", "ji", "theek", "thik", "sahi",
    "achha", "accha", "acha", "badhiya", "badiya",
    "abhi", "ab", "phir", "fir", "bhi", "aur", "ya", "lekin", "par",
    // postpositions
    "ki", "ke", "ko", "ka", "ne", "se", "pe", "me",
    // time and place
    "kal", "aaj", "raat", "din", "subah", "sham", "dopahar",
    "samay", "baad", "pehle", "pahle", "sabhi", "sab",
    // casual
    "arre", "are", "yaar", "dost", "bhai", "bas", "chal", "chalo",
    "hota", "hoti", "hote",
    "mujhe", "tumhe", "usse", "isse", "unhe", "inhe",
    "bahut", "bohot", "thoda", "jyada", "zyada", "kam", "sabse",
];

static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("valid regex"));

/// Detect whether text is English or Hindi
///
/// Devanagari code points classify as Hindi immediately. Otherwise the text
/// is tokenized on word boundaries (case-insensitive) and matched against the
/// romanized lexicon: Hindi when the match ratio exceeds 0.15 or at least two
/// words match. Empty text defaults to English.
#[must_use]
pub fn detect(text: &str) -> Language {
    if text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
        return Language::Hindi;
    }

    let lower = text.to_lowercase();
    let words: Vec<&str> = WORD_REGEX.find_iter(&lower).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return Language::English;
    }

    let matches = words
        .iter()
        .filter(|w| HINGLISH_LEXICON.contains(w))
        .count();

    #[allow(clippy::cast_precision_loss)]
    let ratio = matches as f64 / words.len() as f64;

    if ratio > HINGLISH_RATIO_THRESHOLD || matches >= HINGLISH_MATCH_FLOOR {
        Language::Hindi
    } else {
        Language::English
    }
}
