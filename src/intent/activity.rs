//! Activity detection: logging new activities and closing the open one

use std::sync::LazyLock;

use regex::Regex;

/// Ordered capture patterns; the first matching remainder wins
static ACTIVITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)i\s+just\s+(.+)",
        r"(?i)i\s+did\s+(.+)",
        r"(?i)i\s+am\s+(.+)",
        r"(?i)i'm\s+(.+)",
        r"(?i)doing\s+(.+)",
        r"(?i)finished\s+(.+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Trigger phrases gating activity detection
const ACTIVITY_TRIGGERS: &[&str] = &["i just", "i did", "i am", "i'm", "doing"];

static FINISHING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(i\s+)?(just\s+)?(finished|done|completed)").expect("valid regex")
});

/// What an activity-shaped utterance means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityAction {
    /// Start logging a new activity (closing any open one first)
    Log { description: String },
    /// The utterance only announces finishing; close the open activity
    /// without starting a new one
    Finish,
}

/// Whether the message contains an activity trigger phrase
#[must_use]
pub fn has_activity_trigger(lower: &str) -> bool {
    ACTIVITY_TRIGGERS.iter().any(|t| lower.contains(t))
}

/// Parse an activity utterance
///
/// `has_open_activity` decides whether a finishing phrase closes the open
/// record or simply logs its remainder as a new activity.
#[must_use]
pub fn parse(message: &str, has_open_activity: bool) -> Option<ActivityAction> {
    let lower = message.to_lowercase();
    if !has_activity_trigger(&lower) {
        return None;
    }

    let description = ACTIVITY_PATTERNS
        .iter()
        .find_map(|p| p.captures(message))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())?;

    if description.is_empty() {
        return None;
    }

    if has_open_activity && FINISHING_PREFIX.is_match(message.trim()) {
        return Some(ActivityAction::Finish);
    }

    Some(ActivityAction::Log { description })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i_just_captures_remainder() {
        assert_eq!(
            parse("I just watered the plants", false),
            Some(ActivityAction::Log {
                description: "watered the plants".to_string()
            })
        );
    }

    #[test]
    fn i_am_captures_remainder() {
        assert_eq!(
            parse("I am studying for the exam", false),
            Some(ActivityAction::Log {
                description: "studying for the exam".to_string()
            })
        );
    }

    #[test]
    fn contraction_form() {
        assert_eq!(
            parse("i'm cooking dinner", false),
            Some(ActivityAction::Log {
                description: "cooking dinner".to_string()
            })
        );
    }

    #[test]
    fn finishing_with_open_activity_closes_it() {
        assert_eq!(
            parse("I just finished my workout", true),
            Some(ActivityAction::Finish)
        );
    }

    #[test]
    fn finishing_without_open_activity_logs_remainder() {
        assert_eq!(
            parse("I just finished my workout", false),
            Some(ActivityAction::Log {
                description: "finished my workout".to_string()
            })
        );
    }

    #[test]
    fn no_trigger_is_none() {
        assert_eq!(parse("the weather is nice", false), None);
        assert_eq!(parse("finished", true), None);
    }
}
