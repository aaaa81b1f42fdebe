//! Task, activity, and routine records over the key-value store
//!
//! The journal is the single mutation point for user state. The
//! one-open-activity invariant is enforced inside [`Journal::start_activity`]
//! so a close and a subsequent open can never interleave.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::store::Store;
use crate::Result;

const TASKS_KEY: &str = "tasks";
const ACTIVITIES_KEY: &str = "activities";
const ROUTINE_KEY: &str = "routine";

/// Activity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Work,
    Study,
    Exercise,
    Meal,
    Sleep,
    Leisure,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Study => "Study",
            Self::Exercise => "Exercise",
            Self::Meal => "Meal",
            Self::Sleep => "Sleep",
            Self::Leisure => "Leisure",
        }
    }

    /// Keyword-based category detection, tested in fixed order; first match
    /// wins. Shared by the activity log and the intent extractor.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        let contains_any =
            |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if contains_any(&["work", "meeting", "email", "call", "project"]) {
            Self::Work
        } else if contains_any(&["study", "learn", "read", "course", "homework"]) {
            Self::Study
        } else if contains_any(&["gym", "workout", "exercise", "run", "jog", "yoga"]) {
            Self::Exercise
        } else if contains_any(&["breakfast", "lunch", "dinner", "eat", "meal", "food"]) {
            Self::Meal
        } else if contains_any(&["sleep", "nap", "rest", "bed"]) {
            Self::Sleep
        } else {
            Self::Leisure
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a task repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    Weekdays,
    Weekends,
    WeeklyOn(Weekday),
}

/// Lowercase full day name, used as the routine map key
#[must_use]
pub const fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("daily"),
            Self::Weekly => f.write_str("weekly"),
            Self::Monthly => f.write_str("monthly"),
            Self::Weekdays => f.write_str("weekdays"),
            Self::Weekends => f.write_str("weekends"),
            Self::WeeklyOn(day) => write!(f, "weekly on {}", day_name(*day)),
        }
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "weekdays" => Ok(Self::Weekdays),
            "weekends" => Ok(Self::Weekends),
            other => other
                .strip_prefix("weekly on ")
                .and_then(|day| day.parse::<Weekday>().ok())
                .map(Self::WeeklyOn)
                .ok_or_else(|| format!("unknown recurrence: {other}")),
        }
    }
}

impl Serialize for Recurrence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Recurrence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A user task or reminder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Due time as spoken, e.g. "5pm" or "15:30"
    pub time: Option<String>,
    /// Due date as spoken, e.g. "tomorrow" or "monday"
    pub date: Option<String>,
    pub recurrence: Option<Recurrence>,
}

impl Task {
    /// Create a pending task with no schedule attached
    #[must_use]
    pub fn new(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            completed: false,
            created_at: now,
            time: None,
            date: None,
            recurrence: None,
        }
    }
}

/// A logged activity; `ended_at == None` means the activity is still open
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub description: String,
    pub category: Category,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
}

impl Activity {
    /// Open a new activity; category is auto-detected from the description
    #[must_use]
    pub fn open(description: impl Into<String>, now: DateTime<Utc>) -> Self {
        let description = description.into();
        Self {
            id: Uuid::new_v4(),
            category: Category::detect(&description),
            description,
            started_at: now,
            ended_at: None,
            duration_minutes: None,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    fn close(&mut self, now: DateTime<Utc>) {
        self.ended_at = Some(now);
        self.duration_minutes = Some(duration_minutes(self.started_at, now));
    }
}

/// Whole minutes between two instants, rounded to nearest
#[must_use]
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    #[allow(clippy::cast_precision_loss)]
    let secs = (end - start).num_seconds() as f64;
    #[allow(clippy::cast_possible_truncation)]
    {
        (secs / 60.0).round() as i64
    }
}

/// Human-readable duration, e.g. "45 min" or "1h 20min"
#[must_use]
pub fn format_duration(minutes: i64) -> String {
    if minutes < 1 {
        return "less than a minute".to_string();
    }
    if minutes < 60 {
        return format!("{minutes} min");
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if mins == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {mins}min")
    }
}

/// One descriptive slot in the weekly routine, local wall-clock times
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineSlot {
    pub text: String,
    /// "HH:MM"
    pub start: String,
    /// "HH:MM"
    pub end: String,
}

/// Typed task/activity/routine access over the key-value store
#[derive(Clone)]
pub struct Journal {
    store: Arc<dyn Store>,
}

impl Journal {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.store.get_raw(key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(T::default()),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.store.put_raw(key, &serde_json::to_string(value)?)
    }

    /// All tasks, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn tasks(&self) -> Result<Vec<Task>> {
        self.load(TASKS_KEY)
    }

    /// Tasks not yet completed
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn pending_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.tasks()?.into_iter().filter(|t| !t.completed).collect())
    }

    /// Append a task
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn add_task(&self, task: Task) -> Result<()> {
        let mut tasks = self.tasks()?;
        tracing::info!(task = %task.text, "task added");
        tasks.push(task);
        self.save(TASKS_KEY, &tasks)
    }

    /// Mark a single task completed; unknown ids are ignored
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn complete_task(&self, id: Uuid) -> Result<()> {
        let mut tasks = self.tasks()?;
        if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
            task.completed = true;
            tracing::info!(task = %task.text, "task completed");
        }
        self.save(TASKS_KEY, &tasks)
    }

    /// Mark every pending task completed, returning how many changed
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn complete_all(&self) -> Result<usize> {
        let mut tasks = self.tasks()?;
        let mut count = 0;
        for task in tasks.iter_mut().filter(|t| !t.completed) {
            task.completed = true;
            count += 1;
        }
        self.save(TASKS_KEY, &tasks)?;
        tracing::info!(count, "all pending tasks completed");
        Ok(count)
    }

    /// All activities, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn activities(&self) -> Result<Vec<Activity>> {
        self.load(ACTIVITIES_KEY)
    }

    /// Activities started on the same calendar day (UTC) as `now`
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn activities_today(&self, now: DateTime<Utc>) -> Result<Vec<Activity>> {
        Ok(self
            .activities()?
            .into_iter()
            .filter(|a| a.started_at.date_naive() == now.date_naive())
            .collect())
    }

    /// The currently open activity from today, if any
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn open_activity(&self, now: DateTime<Utc>) -> Result<Option<Activity>> {
        Ok(self
            .activities_today(now)?
            .into_iter()
            .find(Activity::is_open))
    }

    /// Start a new activity, closing any open one first
    ///
    /// The close and open happen within a single load/save cycle so the
    /// single-open-activity invariant cannot be violated by interleaving.
    /// Returns the new activity and the one that was closed, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn start_activity(
        &self,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<(Activity, Option<Activity>)> {
        let mut activities = self.activities()?;

        let closed = activities
            .iter_mut()
            .filter(|a| a.started_at.date_naive() == now.date_naive())
            .find(|a| a.is_open())
            .map(|open| {
                open.close(now);
                open.clone()
            });

        let activity = Activity::open(description, now);
        tracing::info!(
            description = %activity.description,
            category = %activity.category,
            closed_previous = closed.is_some(),
            "activity started"
        );
        activities.push(activity.clone());
        self.save(ACTIVITIES_KEY, &activities)?;
        Ok((activity, closed))
    }

    /// Close the open activity without starting a new one
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn close_open_activity(&self, now: DateTime<Utc>) -> Result<Option<Activity>> {
        let mut activities = self.activities()?;
        let closed = activities
            .iter_mut()
            .filter(|a| a.started_at.date_naive() == now.date_naive())
            .find(|a| a.is_open())
            .map(|open| {
                open.close(now);
                open.clone()
            });
        if let Some(activity) = &closed {
            tracing::info!(description = %activity.description, "activity closed");
            self.save(ACTIVITIES_KEY, &activities)?;
        }
        Ok(closed)
    }

    /// Routine slots for a day, sorted by start time
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn routine_for(&self, day: Weekday) -> Result<Vec<RoutineSlot>> {
        let routine: HashMap<String, Vec<RoutineSlot>> = self.load(ROUTINE_KEY)?;
        let mut slots = routine.get(day_name(day)).cloned().unwrap_or_default();
        slots.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(slots)
    }

    /// Routine slots for the day containing `now`
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn routine_today(&self, now: DateTime<Utc>) -> Result<Vec<RoutineSlot>> {
        self.routine_for(now.weekday())
    }

    /// Replace the routine for a day
    ///
    /// # Errors
    ///
    /// Returns error if the store fails
    pub fn set_routine(&self, day: Weekday, slots: Vec<RoutineSlot>) -> Result<()> {
        let mut routine: HashMap<String, Vec<RoutineSlot>> = self.load(ROUTINE_KEY)?;
        routine.insert(day_name(day).to_string(), slots);
        self.save(ROUTINE_KEY, &routine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn journal() -> Journal {
        Journal::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn category_detection_order() {
        assert_eq!(Category::detect("team meeting"), Category::Work);
        assert_eq!(Category::detect("read a course book"), Category::Study);
        assert_eq!(Category::detect("morning yoga"), Category::Exercise);
        assert_eq!(Category::detect("lunch with mom"), Category::Meal);
        assert_eq!(Category::detect("short nap"), Category::Sleep);
        assert_eq!(Category::detect("watching a movie"), Category::Leisure);
        // "work" outranks "gym" because categories are tested in fixed order
        assert_eq!(Category::detect("work at the gym"), Category::Work);
        // Substring matching: "workout" contains "work", so Work also
        // claims it
        assert_eq!(Category::detect("gym workout"), Category::Work);
    }

    #[test]
    fn recurrence_string_roundtrip() {
        for rec in [
            Recurrence::Daily,
            Recurrence::Weekly,
            Recurrence::Monthly,
            Recurrence::Weekdays,
            Recurrence::Weekends,
            Recurrence::WeeklyOn(Weekday::Mon),
        ] {
            let s = rec.to_string();
            assert_eq!(s.parse::<Recurrence>().unwrap(), rec);
        }
        assert_eq!(
            Recurrence::WeeklyOn(Weekday::Mon).to_string(),
            "weekly on monday"
        );
    }

    #[test]
    fn task_lifecycle() {
        let journal = journal();
        let now = Utc::now();
        let task = Task::new("buy milk", now);
        let id = task.id;
        journal.add_task(task).unwrap();

        assert_eq!(journal.pending_tasks().unwrap().len(), 1);
        journal.complete_task(id).unwrap();
        assert!(journal.pending_tasks().unwrap().is_empty());
        assert!(journal.tasks().unwrap()[0].completed);
    }

    #[test]
    fn complete_all_counts_only_pending() {
        let journal = journal();
        let now = Utc::now();
        journal.add_task(Task::new("one", now)).unwrap();
        journal.add_task(Task::new("two", now)).unwrap();
        let mut done = Task::new("three", now);
        done.completed = true;
        journal.add_task(done).unwrap();

        assert_eq!(journal.complete_all().unwrap(), 2);
        assert!(journal.pending_tasks().unwrap().is_empty());
    }

    #[test]
    fn starting_activity_closes_open_one() {
        let journal = journal();
        let start = Utc::now();
        let (first, closed) = journal.start_activity("reading", start).unwrap();
        assert!(closed.is_none());
        assert!(first.is_open());

        let later = start + Duration::minutes(30);
        let (second, closed) = journal.start_activity("gym session", later).unwrap();
        let closed = closed.unwrap();
        assert_eq!(closed.id, first.id);
        assert_eq!(closed.duration_minutes, Some(30));
        assert!(closed.ended_at.is_some());
        assert!(second.is_open());
        assert_eq!(second.category, Category::Exercise);

        // Only one activity can be open
        let open: Vec<_> = journal
            .activities()
            .unwrap()
            .into_iter()
            .filter(Activity::is_open)
            .collect();
        assert_eq!(open.len(), 1);
    }

    #[test]
    fn close_without_new_activity() {
        let journal = journal();
        let start = Utc::now();
        journal.start_activity("workout", start).unwrap();

        let later = start + Duration::minutes(45);
        let closed = journal.close_open_activity(later).unwrap().unwrap();
        assert_eq!(closed.duration_minutes, Some(45));
        assert!(journal.open_activity(later).unwrap().is_none());
    }

    #[test]
    fn duration_rounds_to_nearest_minute() {
        let start = Utc::now();
        assert_eq!(duration_minutes(start, start + Duration::seconds(89)), 1);
        assert_eq!(duration_minutes(start, start + Duration::seconds(91)), 2);
        assert_eq!(duration_minutes(start, start + Duration::seconds(10)), 0);
    }

    #[test]
    fn format_duration_variants() {
        assert_eq!(format_duration(0), "less than a minute");
        assert_eq!(format_duration(45), "45 min");
        assert_eq!(format_duration(60), "1h");
        assert_eq!(format_duration(80), "1h 20min");
    }

    #[test]
    fn routine_sorted_by_start() {
        let journal = journal();
        journal
            .set_routine(
                Weekday::Mon,
                vec![
                    RoutineSlot {
                        text: "Evening Walk".to_string(),
                        start: "18:00".to_string(),
                        end: "19:00".to_string(),
                    },
                    RoutineSlot {
                        text: "Morning Workout".to_string(),
                        start: "07:00".to_string(),
                        end: "08:00".to_string(),
                    },
                ],
            )
            .unwrap();

        let slots = journal.routine_for(Weekday::Mon).unwrap();
        assert_eq!(slots[0].text, "Morning Workout");
        assert_eq!(slots[1].text, "Evening Walk");
    }
}
