//! Completion detection: match an utterance against pending tasks
//!
//! Matching is fuzzy by design; the scoring constants were chosen
//! empirically and are preserved for behavioral parity. Treat them as
//! tunable, not meaningful.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::journal::Task;

/// Score for exact substring containment in either direction
const SCORE_EXACT: u32 = 100;

/// Score per task word (length > 2) found in the message
const SCORE_WORD: u32 = 10;

/// Extra score per important task word (length > 4, or the task text is
/// capitalized like a name) found in the message
const SCORE_IMPORTANT_WORD: u32 = 20;

/// Score when a name following a contact verb in the task appears in the
/// message
const SCORE_CONTACT_NAME: u32 = 30;

/// Minimum score required to complete a task without asking
const MATCH_THRESHOLD: u32 = 10;

/// Words that signal the user finished something
const COMPLETION_TRIGGERS: &[&str] = &[
    "done", "completed", "finished", "called", "bought", "sent", "emailed", "made", "wrote",
    "read", "mark", "tick",
];

static LEADING_COMPLETION_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(i\s+)?(just\s+)?(have\s+)?(did|done|completed|finished|called|made|bought|sent|wrote|read)\s+")
        .expect("valid regex")
});

static FILLER_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(task|it|that|this|now|already)\s*").expect("valid regex"));

static BARE_DONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(i\s+)?(done|completed|finished)(\s+it)?$").expect("valid regex")
});

static CONTACT_VERB_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:call|email|message|text|meet|visit)\s+(\w+)").expect("valid regex")
});

/// Outcome of completion matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Complete every pending task
    All,
    /// Complete one confidently matched task
    Task { id: Uuid, reply: String },
    /// No confident match; reply asks the user which task they meant.
    /// This path never mutates state.
    Ambiguous { reply: String },
}

/// Whether the message contains a completion trigger word
#[must_use]
pub fn has_completion_word(lower: &str) -> bool {
    COMPLETION_TRIGGERS.iter().any(|w| lower.contains(w))
}

/// Resolve a completion utterance against the pending task list
///
/// Returns `None` when the message carries no completion trigger or there
/// are no pending tasks, letting extraction fall through to the next rule.
#[must_use]
pub fn resolve(message: &str, pending: &[Task]) -> Option<Resolution> {
    let lower = message.to_lowercase();
    if !has_completion_word(&lower) || pending.is_empty() {
        return None;
    }

    if lower.contains("all") && (lower.contains("done") || lower.contains("complete")) {
        return Some(Resolution::All);
    }

    let cleaned = clean_message(&lower);

    let mut best: Option<&Task> = None;
    let mut highest = 0;
    for task in pending {
        let score = score_task(task, &cleaned);
        if score > highest {
            highest = score;
            best = Some(task);
        }
    }

    if let Some(task) = best
        && highest >= MATCH_THRESHOLD
    {
        return Some(Resolution::Task {
            id: task.id,
            reply: completed_reply(&task.text),
        });
    }

    // A bare "done" with nothing else completes the oldest pending task
    if BARE_DONE.is_match(lower.trim()) {
        let task = &pending[0];
        return Some(Resolution::Task {
            id: task.id,
            reply: completed_reply(&task.text),
        });
    }

    let reply = match pending.len() {
        1 => format!(
            "Did you complete \"{}\"? Say \"yes\" to mark it done! 📋",
            pending[0].text
        ),
        2 | 3 => {
            let list = pending
                .iter()
                .map(|t| format!("\"{}\"", t.text))
                .collect::<Vec<_>>()
                .join(", ");
            format!("Which task did you complete? You have: {list} 📋")
        }
        n => format!("You have {n} pending tasks. Which one did you complete? 📋"),
    };
    Some(Resolution::Ambiguous { reply })
}

fn completed_reply(text: &str) -> String {
    format!("Great job! I've marked \"{text}\" as completed! 🎉 Keep it up!")
}

/// Strip the completion verb and filler words so only content remains
fn clean_message(lower: &str) -> String {
    let cleaned = LEADING_COMPLETION_VERB.replace(lower, "");
    let cleaned = FILLER_WORDS.replace_all(&cleaned, " ");
    cleaned.trim().to_string()
}

fn score_task(task: &Task, cleaned: &str) -> u32 {
    let task_text = task.text.to_lowercase();
    let mut score = 0;

    if cleaned.contains(&task_text) || task_text.contains(cleaned) {
        score += SCORE_EXACT;
    }

    let task_words: Vec<&str> = task_text.split_whitespace().filter(|w| w.len() > 2).collect();
    for word in &task_words {
        if cleaned.contains(word) {
            score += SCORE_WORD;
        }
    }

    let task_is_capitalized = task.text.chars().next().is_some_and(char::is_uppercase);
    for word in task_words
        .iter()
        .filter(|w| w.len() > 4 || task_is_capitalized)
    {
        if cleaned.contains(&word.to_lowercase()) {
            score += SCORE_IMPORTANT_WORD;
        }
    }

    if let Some(caps) = CONTACT_VERB_NAME.captures(&task_text)
        && let Some(name) = caps.get(1)
        && cleaned.contains(name.as_str())
    {
        score += SCORE_CONTACT_NAME;
    }

    score
}
