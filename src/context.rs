//! Grounding context assembled from the journal for the generative layer
//!
//! The rendered block is prepended to the user message so replies can refer
//! to what the user is actually doing right now. The routine comes first so
//! the model weights it highest. An empty journal renders to an empty
//! string and adds nothing to the prompt.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::journal::{day_name, Activity, Journal, RoutineSlot, Task};
use crate::Result;

/// How far ahead a routine slot counts as "coming up", in minutes
const UPCOMING_WINDOW_MINUTES: u32 = 60;

/// Most recent activities included in the rendered block
const MAX_ACTIVITIES: usize = 5;

/// Pending tasks included in the rendered block
const MAX_TASKS: usize = 5;

/// Snapshot of journal and user state feeding one prompt
#[derive(Debug, Clone, Default)]
pub struct Grounding {
    pub routine: Vec<RoutineSlot>,
    pub activities: Vec<Activity>,
    pub pending_tasks: Vec<Task>,
    /// Coarse daypart label, see [`time_of_day`]
    pub time_of_day: Option<String>,
    /// User's self-reported mood, when known
    pub mood: Option<String>,
    /// User's self-reported energy percentage, when known
    pub energy: Option<u8>,
}

impl Grounding {
    /// Collect today's journal state
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn collect(journal: &Journal, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            routine: journal.routine_today(now)?,
            activities: journal.activities_today(now)?,
            pending_tasks: journal.pending_tasks()?,
            time_of_day: Some(time_of_day(now.hour()).to_string()),
            mood: None,
            energy: None,
        })
    }

    /// Render the grounding block, or an empty string when there is nothing
    /// worth saying
    #[must_use]
    pub fn render(&self, now: DateTime<Utc>) -> String {
        let minute_of_day = now.hour() * 60 + now.minute();
        let mut parts: Vec<String> = Vec::new();

        if !self.routine.is_empty() {
            let slots = self
                .routine
                .iter()
                .map(|slot| {
                    format!(
                        "{} ({}-{}){}",
                        slot.text,
                        slot.start,
                        slot.end,
                        slot_status(slot, minute_of_day)
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            let day = day_name(now.weekday()).to_uppercase();
            parts.push(format!("📅 **{day}'S ROUTINE**: {slots}"));
            parts.push(format!(
                "⏰ Current time: {}:{:02}",
                now.hour(),
                now.minute()
            ));
        }

        if !self.activities.is_empty() {
            // Last five, kept in chronological order
            let recent = self
                .activities
                .iter()
                .skip(self.activities.len().saturating_sub(MAX_ACTIVITIES))
                .map(|a| format!("{} ({})", a.description, a.category))
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("📋 Today's activities: {recent}"));
        }

        if !self.pending_tasks.is_empty() {
            let listed = self
                .pending_tasks
                .iter()
                .take(MAX_TASKS)
                .map(|t| t.text.clone())
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!(
                "✅ Pending tasks ({}): {listed}",
                self.pending_tasks.len()
            ));
        }

        if let Some(label) = &self.time_of_day {
            parts.push(format!("🕐 Time: {label}"));
        }
        if let Some(mood) = &self.mood {
            parts.push(format!("User's mood: {mood}"));
        }
        if let Some(energy) = self.energy {
            parts.push(format!("User's energy: {energy}%"));
        }

        if parts.is_empty() {
            return String::new();
        }
        format!("CURRENT USER CONTEXT:\n{}", parts.join("\n"))
    }
}

/// Coarse daypart label used by the persona prompt
#[must_use]
pub const fn time_of_day(hour: u32) -> &'static str {
    match hour {
        0..=5 => "late night",
        6..=11 => "morning",
        12..=16 => "afternoon",
        17..=20 => "evening",
        _ => "night",
    }
}

/// Status annotation for one routine slot; end of slot is inclusive
fn slot_status(slot: &RoutineSlot, minute_of_day: u32) -> &'static str {
    let (Some(start), Some(end)) = (parse_minutes(&slot.start), parse_minutes(&slot.end)) else {
        return "";
    };
    if minute_of_day >= start && minute_of_day <= end {
        " ⏰ HAPPENING NOW"
    } else if minute_of_day < start && start - minute_of_day <= UPCOMING_WINDOW_MINUTES {
        " 🔜 COMING UP SOON"
    } else {
        ""
    }
}

/// Parse "HH:MM" into minutes since midnight
fn parse_minutes(clock: &str) -> Option<u32> {
    let (h, m) = clock.split_once(':')?;
    let hours: u32 = h.trim().parse().ok()?;
    let minutes: u32 = m.trim().parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}
