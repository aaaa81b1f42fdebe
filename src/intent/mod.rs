//! Intent extraction from free-text utterances
//!
//! An utterance runs through an ordered pipeline of pure matchers:
//! add-task, then completion, then activity. The order is a deliberate
//! precedence policy — "I'm done with my workout task" must resolve the
//! same way every time — so do not reorder the rules.

pub mod activity;
pub mod completion;
pub mod task;

pub use activity::ActivityAction;
pub use completion::Resolution;
pub use task::TaskDraft;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::journal::{format_duration, Activity, Journal, Task};
use crate::Result;

/// Structured action extracted from an utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Create a task from the draft
    AddTask(TaskDraft),
    /// Mark one confidently matched task completed
    CompleteTask { task_id: Uuid, reply: String },
    /// Mark every pending task completed
    CompleteAll,
    /// Completion was requested but no task matched confidently; the reply
    /// asks for clarification and nothing is mutated
    Clarify { reply: String },
    /// Open a new activity (closing any open one first)
    LogActivity { description: String },
    /// Close the open activity without starting a new one
    EndActivity { activity_id: Uuid },
    /// No actionable intent; the reply falls through to conversation
    None,
}

/// Extract a structured intent from an utterance
///
/// Pure function over the utterance and current state; mutation happens in
/// [`apply`]. `today_activities` supplies the open-activity check for the
/// activity rule.
#[must_use]
pub fn extract(utterance: &str, pending_tasks: &[Task], today_activities: &[Activity]) -> Intent {
    // Rule 1: add-task. A matched trigger commits to this rule; empty
    // remaining text means malformed input, not fall-through.
    if let Some(draft) = task::parse(utterance) {
        if draft.text.is_empty() {
            return Intent::None;
        }
        return Intent::AddTask(draft);
    }

    // Rule 2: completion
    if let Some(resolution) = completion::resolve(utterance, pending_tasks) {
        return match resolution {
            Resolution::All => Intent::CompleteAll,
            Resolution::Task { id, reply } => Intent::CompleteTask { task_id: id, reply },
            Resolution::Ambiguous { reply } => Intent::Clarify { reply },
        };
    }

    // Rule 3: activity
    let open = today_activities.iter().find(|a| a.is_open());
    if let Some(action) = activity::parse(utterance, open.is_some()) {
        return match action {
            ActivityAction::Finish => open.map_or(Intent::None, |a| Intent::EndActivity {
                activity_id: a.id,
            }),
            ActivityAction::Log { description } => Intent::LogActivity { description },
        };
    }

    Intent::None
}

/// Apply an extracted intent to the journal
///
/// Returns the user-facing confirmation text, or `None` for
/// [`Intent::None`] (the caller falls through to a conversational reply).
///
/// # Errors
///
/// Returns error if the store fails
pub fn apply(intent: Intent, journal: &Journal, now: DateTime<Utc>) -> Result<Option<String>> {
    match intent {
        Intent::AddTask(draft) => {
            let mut task = Task::new(draft.text.clone(), now);
            task.time = draft.time.clone();
            task.date = draft.date.clone();
            task.recurrence = draft.recurrence;
            journal.add_task(task)?;

            let mut reply = format!("Got it! I've added \"{}\" to your tasks. ✅", draft.text);
            if let Some(time) = &draft.time {
                reply.push_str(&format!(" Time: {time}"));
            }
            if let Some(date) = &draft.date {
                reply.push_str(&format!(" Date: {date}"));
            }
            if let Some(recurrence) = &draft.recurrence {
                reply.push_str(&format!(" ({recurrence})"));
            }
            Ok(Some(reply))
        }
        Intent::CompleteTask { task_id, reply } => {
            journal.complete_task(task_id)?;
            Ok(Some(reply))
        }
        Intent::CompleteAll => {
            let count = journal.complete_all()?;
            Ok(Some(format!(
                "Awesome! I've marked all {count} tasks as completed! 🎉✨"
            )))
        }
        Intent::Clarify { reply } => Ok(Some(reply)),
        Intent::LogActivity { description } => {
            let (activity, closed) = journal.start_activity(&description, now)?;
            let reply = closed.map_or_else(
                || {
                    format!(
                        "Started logging: {}. I'll track the time for you! ⏱️",
                        activity.description
                    )
                },
                |prev| {
                    format!(
                        "Ended \"{}\" ({}). Now logging: {}. Keep going! 💪",
                        prev.description,
                        format_duration(prev.duration_minutes.unwrap_or(0)),
                        activity.description
                    )
                },
            );
            Ok(Some(reply))
        }
        Intent::EndActivity { activity_id } => {
            let closed = journal.close_open_activity(now)?;
            match closed {
                Some(activity) if activity.id == activity_id => {
                    let spent = format_duration(activity.duration_minutes.unwrap_or(0));
                    Ok(Some(format!(
                        "Great! I've logged that you finished {}. You spent {spent} on it! 📝✨",
                        activity.description
                    )))
                }
                // The open activity changed between extract and apply;
                // nothing sensible to confirm.
                _ => Ok(None),
            }
        }
        Intent::None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn priority_add_beats_completion() {
        // "done" appears, but the add trigger wins
        let pending = vec![Task::new("workout", Utc::now())];
        let intent = extract("remind me to get the done report signed", &pending, &[]);
        assert!(matches!(intent, Intent::AddTask(_)));
    }

    #[test]
    fn priority_completion_beats_activity() {
        let pending = vec![Task::new("workout", Utc::now())];
        let open = Activity::open("Workout", Utc::now());
        let intent = extract("I'm done with my workout task", &pending, &[open]);
        assert!(
            matches!(intent, Intent::CompleteTask { .. }),
            "completion must outrank activity closure: {intent:?}"
        );
    }

    #[test]
    fn asking_about_tasks_does_not_add() {
        let pending = vec![
            Task::new("one", Utc::now()),
            Task::new("two", Utc::now()),
            Task::new("three", Utc::now()),
        ];
        let intent = extract("what are my tasks", &pending, &[]);
        assert!(
            !matches!(intent, Intent::AddTask(_)),
            "interrogative must not create a task: {intent:?}"
        );
    }

    #[test]
    fn empty_task_text_is_none() {
        assert_eq!(extract("remind me", &[], &[]), Intent::None);
    }

    #[test]
    fn finishing_phrase_with_open_activity_ends_it() {
        let open = Activity::open("Workout", Utc::now());
        let id = open.id;
        let intent = extract("I just finished my workout", &[], &[open]);
        assert_eq!(intent, Intent::EndActivity { activity_id: id });
    }

    #[test]
    fn activity_logging_when_nothing_open() {
        let intent = extract("I am reading a book", &[], &[]);
        assert_eq!(
            intent,
            Intent::LogActivity {
                description: "reading a book".to_string()
            }
        );
    }

    #[test]
    fn small_talk_is_none() {
        assert_eq!(extract("how are you feeling", &[], &[]), Intent::None);
    }

    #[test]
    fn apply_end_activity_reports_duration() {
        use crate::store::MemoryStore;
        use std::sync::Arc;

        let journal = Journal::new(Arc::new(MemoryStore::new()));
        let start = Utc::now() - Duration::minutes(45);
        // Seed an open activity that started 45 minutes ago
        let (opened, _) = journal.start_activity("Workout", start).unwrap();

        let now = Utc::now();
        let reply = apply(
            Intent::EndActivity {
                activity_id: opened.id,
            },
            &journal,
            now,
        )
        .unwrap()
        .unwrap();

        assert!(reply.contains("45 min"), "reply: {reply}");
        assert!(journal.open_activity(now).unwrap().is_none());
    }
}
