//! Add-task detection and schedule token extraction

use std::sync::LazyLock;

use chrono::Weekday;
use regex::Regex;

use crate::journal::Recurrence;

/// Parsed add-task request before it becomes a stored task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Remaining display text after trigger/schedule tokens are stripped;
    /// may be empty for malformed input
    pub text: String,
    pub time: Option<String>,
    pub date: Option<String>,
    pub recurrence: Option<Recurrence>,
}

/// Trigger phrases that signal the user wants a task added
const ADD_TRIGGERS: &[&str] = &[
    "remind me",
    "add task",
    "add a task",
    "add reminder",
    "add a reminder",
    "set a reminder",
    "create task",
    "new task",
    "todo",
    "need to",
];

static REMEMBER_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(remember|don't forget)\b.*\bto\b").expect("valid regex"));

/// Interrogative phrasings that mean the user is asking about tasks,
/// not adding one
static ASKING_FORWARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(what|tell me|show|list|view|see|display|check)\b.*\b(reminder|task|todo)")
        .expect("valid regex")
});

static ASKING_REVERSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(reminder|task|todo).*\b(what|tell me|show|list|view|see|display|check)\b")
        .expect("valid regex")
});

const ASKING_PHRASES: &[&str] = &["tell me about", "what are my", "do i have any", "show me"];

static TRIGGER_STRIP: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(please\s+)?remind me\s*(to\s+)?",
        r"(?i)^(please\s+)?add (a\s+)?(task|reminder|todo)\s*(to\s+)?",
        r"(?i)^(i\s+)?(need|have) to\s*",
        r"(?i)^todo:?\s*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static TIME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)at\s+(\d{1,2}(?::\d{2})?\s*(?:am|pm))",
        r"at\s+(\d{1,2}:\d{2})",
        r"(?i)(\d{1,2}\s*(?:am|pm))",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)on\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)",
        r"(?i)on\s+(tomorrow|today)",
        r"(?i)on\s+(\d{1,2}(?:st|nd|rd|th)?(?:\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*)?(?:\s+\d{4})?)",
        r"(?i)(tomorrow|today)",
        r"(\d{1,2}/\d{1,2}(?:/\d{2,4})?)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static EVERY_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)every\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)")
        .expect("valid regex")
});

static RECURRENCE_PATTERNS: LazyLock<Vec<(Regex, Recurrence)>> = LazyLock::new(|| {
    [
        (r"(?i)every\s+day|daily", Recurrence::Daily),
        (r"(?i)every\s+week|weekly", Recurrence::Weekly),
        (r"(?i)every\s+month|monthly", Recurrence::Monthly),
        (r"(?i)weekdays?", Recurrence::Weekdays),
        (r"(?i)weekends?", Recurrence::Weekends),
    ]
    .iter()
    .map(|(p, r)| (Regex::new(p).expect("valid regex"), *r))
    .collect()
});

static LEADING_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(to\s+)?").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Whether the message asks about existing tasks rather than creating one
#[must_use]
pub fn is_asking_about(lower: &str) -> bool {
    ASKING_FORWARD.is_match(lower)
        || ASKING_REVERSE.is_match(lower)
        || ASKING_PHRASES.iter().any(|p| lower.contains(p))
}

/// Whether the message contains an add-task trigger phrase
#[must_use]
pub fn wants_to_add(lower: &str) -> bool {
    ADD_TRIGGERS.iter().any(|t| lower.contains(t)) || REMEMBER_TO.is_match(lower)
}

/// Parse an add-task utterance into a draft
///
/// Returns `None` when the message is not an add-task request (no trigger,
/// or interrogative phrasing). The returned draft may still carry an empty
/// `text` for malformed input; the caller maps that to no action.
#[must_use]
pub fn parse(message: &str) -> Option<TaskDraft> {
    let lower = message.to_lowercase();
    if !wants_to_add(&lower) || is_asking_about(&lower) {
        return None;
    }

    let mut cleaned = message.trim().to_string();
    for strip in TRIGGER_STRIP.iter() {
        cleaned = strip.replace(&cleaned, "").trim().to_string();
    }

    let time = extract_first(&TIME_PATTERNS, &mut cleaned);
    let date = extract_first(&DATE_PATTERNS, &mut cleaned);
    let recurrence = extract_recurrence(&mut cleaned);

    let text = LEADING_TO.replace(&cleaned, "");
    let text = WHITESPACE.replace_all(&text, " ").trim().to_string();

    Some(TaskDraft {
        text,
        time,
        date,
        recurrence,
    })
}

/// Try each pattern in order; on the first hit, remove the whole match from
/// the text and return the captured token
fn extract_first(patterns: &[Regex], text: &mut String) -> Option<String> {
    for pattern in patterns {
        let found = pattern.captures(text).and_then(|caps| {
            let token = caps.get(1)?.as_str().trim().to_string();
            Some((token, caps.get(0)?.range()))
        });
        if let Some((token, range)) = found {
            text.replace_range(range, "");
            *text = text.trim().to_string();
            return Some(token);
        }
    }
    None
}

fn extract_recurrence(text: &mut String) -> Option<Recurrence> {
    // "every <weekday>" takes precedence so it is not swallowed by the
    // generic weekly pattern
    let weekday = EVERY_WEEKDAY.captures(text).and_then(|caps| {
        let day = caps.get(1)?.as_str().parse::<Weekday>().ok()?;
        Some((day, caps.get(0)?.range()))
    });
    if let Some((day, range)) = weekday {
        text.replace_range(range, "");
        *text = text.trim().to_string();
        return Some(Recurrence::WeeklyOn(day));
    }

    for (pattern, recurrence) in RECURRENCE_PATTERNS.iter() {
        if let Some(range) = pattern.find(text).map(|m| m.range()) {
            text.replace_range(range, "");
            *text = text.trim().to_string();
            return Some(*recurrence);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_reminder() {
        let draft = parse("remind me to buy milk").unwrap();
        assert_eq!(draft.text, "buy milk");
        assert_eq!(draft.time, None);
        assert_eq!(draft.date, None);
        assert_eq!(draft.recurrence, None);
    }

    #[test]
    fn time_and_date_extraction() {
        let draft = parse("remind me to buy milk at 5pm tomorrow").unwrap();
        assert_eq!(draft.text, "buy milk");
        assert_eq!(draft.time.as_deref(), Some("5pm"));
        assert_eq!(draft.date.as_deref(), Some("tomorrow"));
        assert_eq!(draft.recurrence, None);
    }

    #[test]
    fn twenty_four_hour_time() {
        let draft = parse("remind me to join the standup at 9:30").unwrap();
        assert_eq!(draft.time.as_deref(), Some("9:30"));
        assert_eq!(draft.text, "join the standup");
    }

    #[test]
    fn weekday_date() {
        let draft = parse("add task to call the dentist on monday").unwrap();
        assert_eq!(draft.date.as_deref(), Some("monday"));
        assert_eq!(draft.text, "call the dentist");
    }

    #[test]
    fn daily_recurrence() {
        let draft = parse("remind me to take vitamins daily").unwrap();
        assert_eq!(draft.recurrence, Some(Recurrence::Daily));
        assert_eq!(draft.text, "take vitamins");
    }

    #[test]
    fn every_weekday_is_parametrized_weekly() {
        let draft = parse("remind me to water the plants every friday").unwrap();
        assert_eq!(
            draft.recurrence,
            Some(Recurrence::WeeklyOn(chrono::Weekday::Fri))
        );
        assert_eq!(draft.text, "water the plants");
    }

    #[test]
    fn need_to_trigger() {
        let draft = parse("I need to finish the report").unwrap();
        assert_eq!(draft.text, "finish the report");
    }

    #[test]
    fn asking_about_is_not_adding() {
        assert!(parse("what are my tasks").is_none());
        assert!(parse("show me my reminders").is_none());
        assert!(parse("do i have any todo items").is_none());
    }

    #[test]
    fn unrelated_message_is_none() {
        assert!(parse("good morning, how are you").is_none());
    }

    #[test]
    fn empty_task_text_survives_as_empty_draft() {
        let draft = parse("remind me").unwrap();
        assert!(draft.text.is_empty());
    }
}
