//! Conversation session: history, companion state, and the generative call
//!
//! The session owns everything the old hidden globals used to hold. State
//! is explicit and the model client sits behind a trait so tests can run
//! without a network.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::journal::{Activity, Category, Task};
use crate::persona::{self, Mood, Relationship};
use crate::speech::KeyPool;
use crate::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Conversation turns sent to the model alongside the system prompt
const HISTORY_WINDOW: usize = 10;

/// Energy gained when the user brings good news
const ENERGY_BOOST: u8 = 5;

/// Canned replies when every generative attempt fails
const FALLBACK_REPLIES: &[&str] = &[
    "I'm here with you! 💫 Tell me more!",
    "Hmm, interesting! How does that make you feel? 🤔",
    "I'm listening! What's on your mind? 😊",
    "You've got my full attention! 👂",
    "I care about this - keep going! 💙",
    "That's really cool! Want to talk more about it? 😄",
    "I'm your companion through this! What else? 🥰",
];

/// Steering prompts for proactive check-ins, one picked at random
const THOUGHT_PROMPTS: &[&str] = &[
    "Notice something interesting about the user's day and comment on it playfully",
    "Ask a thoughtful question about how they're feeling",
    "Suggest a helpful action based on their patterns",
    "Share a playful observation or make a friendly joke",
    "Check in on their energy level and suggest a break if needed",
    "Celebrate a small win you noticed",
    "Remind them of something they might have forgotten in a caring way",
    "Make a cute observation about their work style",
    "Suggest something fun they could do",
    "Express excitement about their progress",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in the outbound completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Sampling parameters for one completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Sampling {
    /// Conversational replies and reflections
    pub const REPLY: Self = Self {
        temperature: 0.8,
        max_tokens: 200,
    };

    /// Proactive check-in thoughts: shorter and a little hotter
    pub const THOUGHT: Self = Self {
        temperature: 0.9,
        max_tokens: 100,
    };
}

/// One remembered exchange half
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A chat-completion provider
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Run one completion with the given credential
    ///
    /// Must return [`Error::AuthOrQuota`] for 401/429 so the session can
    /// rotate credentials.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        sampling: Sampling,
        api_key: &str,
    ) -> Result<String>;
}

/// Groq's OpenAI-compatible chat endpoint
pub struct GroqChat {
    client: reqwest::Client,
    model: String,
}

impl GroqChat {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            model: model.into(),
        })
    }
}

#[async_trait]
impl GenerativeClient for GroqChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        sampling: Sampling,
        api_key: &str,
    ) -> Result<String> {
        #[derive(Serialize)]
        struct CompletionRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct CompletionResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMessage,
        }

        #[derive(Deserialize)]
        struct ChoiceMessage {
            content: String,
        }

        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };

        let response = self
            .client
            .post("https://api.groq.com/openai/v1/chat/completions")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(Error::AuthOrQuota {
                provider: "groq".to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("groq error {status}: {text}")));
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Llm("empty completion".to_string()))
    }
}

/// User emotion read from an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emotion {
    Happy,
    Excited,
    Sad,
    Stressed,
    Angry,
    Neutral,
}

static EMOTION_PATTERNS: LazyLock<Vec<(Regex, Emotion)>> = LazyLock::new(|| {
    [
        (
            r"(?i)(happy|great|awesome|amazing|wonderful|excellent)",
            Emotion::Happy,
        ),
        (r"(?i)(excited|pumped|thrilled|can't wait)", Emotion::Excited),
        (r"(?i)(sad|depressed|down|unhappy|bad day)", Emotion::Sad),
        (
            r"(?i)(stressed|anxious|worried|overwhelmed|tired)",
            Emotion::Stressed,
        ),
        (r"(?i)(angry|frustrated|annoyed|upset)", Emotion::Angry),
    ]
    .iter()
    .map(|(p, e)| (Regex::new(p).expect("valid regex"), *e))
    .collect()
});

/// Classify the user's emotion; first matching pattern wins
#[must_use]
pub fn detect_emotion(message: &str) -> Emotion {
    EMOTION_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(message))
        .map_or(Emotion::Neutral, |(_, emotion)| *emotion)
}

/// Everything the companion knows about this conversation
#[derive(Debug, Clone)]
pub struct SessionState {
    pub mood: Mood,
    /// 0 to 100
    pub energy: u8,
    pub relationship: Relationship,
    pub user_name: String,
    pub last_interaction: DateTime<Utc>,
    pub history: Vec<ConversationTurn>,
}

impl SessionState {
    #[must_use]
    pub fn new(user_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            mood: Mood::default(),
            energy: 100,
            relationship: Relationship::default(),
            user_name: user_name.into(),
            last_interaction: now,
            history: Vec::new(),
        }
    }

    /// Completed exchanges so far (one user turn plus one reply)
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.history.len() / 2
    }

    /// Shift mood, energy, and relationship after one exchange
    pub fn update_from_interaction(&mut self, user_message: &str, now: DateTime<Utc>) {
        self.last_interaction = now;

        match detect_emotion(user_message) {
            Emotion::Happy | Emotion::Excited => {
                self.mood = Mood::Playful;
                self.energy = self.energy.saturating_add(ENERGY_BOOST).min(100);
            }
            Emotion::Sad | Emotion::Stressed => {
                self.mood = Mood::Caring;
            }
            Emotion::Angry | Emotion::Neutral => {}
        }

        self.relationship = Relationship::for_interactions(self.interaction_count());
    }
}

/// Chance of a proactive check-in after this much silence
#[must_use]
pub fn initiate_probability(minutes_idle: i64) -> f64 {
    if minutes_idle > 45 {
        0.8
    } else if minutes_idle > 30 {
        0.5
    } else if minutes_idle > 15 {
        0.2
    } else if minutes_idle > 5 {
        0.05
    } else {
        0.0
    }
}

/// A conversation with credential rotation on the generative tier
pub struct Session {
    pub state: SessionState,
    client: Box<dyn GenerativeClient>,
    pool: KeyPool,
}

impl Session {
    #[must_use]
    pub fn new(state: SessionState, client: Box<dyn GenerativeClient>, pool: KeyPool) -> Self {
        Self {
            state,
            client,
            pool,
        }
    }

    /// Build the production session from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &Config, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self::new(
            SessionState::new(config.user_name.clone(), now),
            Box::new(GroqChat::new(config.llm_model.clone())?),
            KeyPool::new(config.api_keys.generative.clone()),
        ))
    }

    /// Generate a reply to `message`, grounded by the rendered journal
    /// context
    ///
    /// Rotation never exhausts here: each rejected key moves the cursor
    /// with wraparound and at most one full cycle of keys is attempted
    /// before falling back to a canned reply. The fallback path still
    /// records the exchange so state keeps evolving offline.
    pub async fn respond(&mut self, message: &str, grounding: &str, now: DateTime<Utc>) -> String {
        let reply = match self.generate(message, grounding).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "generative reply failed, using fallback");
                fallback_reply()
            }
        };

        self.state.history.push(ConversationTurn {
            role: Role::User,
            content: message.to_string(),
            timestamp: now,
        });
        self.state.history.push(ConversationTurn {
            role: Role::Assistant,
            content: reply.clone(),
            timestamp: now,
        });
        self.state.update_from_interaction(message, now);

        reply
    }

    /// Whether the companion should speak up on its own
    #[must_use]
    pub fn should_initiate(&self, now: DateTime<Utc>) -> bool {
        let minutes_idle = (now - self.state.last_interaction).num_minutes();
        let probability = initiate_probability(minutes_idle);
        probability > 0.0 && rand::thread_rng().gen_bool(probability)
    }

    /// Generate a proactive check-in line and record it as an assistant
    /// turn so later replies remember what was said
    ///
    /// Returns `None` when every generative attempt fails; a check-in is
    /// optional, so there is no canned fallback on this path.
    pub async fn spontaneous_thought(
        &mut self,
        grounding: &str,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let prompt = THOUGHT_PROMPTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(THOUGHT_PROMPTS[0]);

        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: format!(
                    "{}\n\nTask: {prompt}. Be brief (1-2 sentences), natural, \
                     and warm like a friend checking in.",
                    self.persona_prompt()
                ),
            },
            ChatMessage {
                role: Role::User,
                content: if grounding.is_empty() {
                    "The user is working on their day.".to_string()
                } else {
                    grounding.to_string()
                },
            },
        ];

        match self.call_with_rotation(&messages, Sampling::THOUGHT).await {
            Ok(thought) => {
                self.state.history.push(ConversationTurn {
                    role: Role::Assistant,
                    content: thought.clone(),
                    timestamp: now,
                });
                Some(thought)
            }
            Err(e) => {
                tracing::warn!(error = %e, "spontaneous thought failed");
                None
            }
        }
    }

    /// End-of-day reflection on what was tracked
    ///
    /// Falls back to a simple tally when every generative attempt fails, so
    /// the day always gets a closing word.
    pub async fn reflect(&mut self, activities: &[Activity], tasks: &[Task]) -> String {
        let summary = daily_summary(activities, tasks);
        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: format!(
                    "{}\n\nGive a warm, caring end-of-day reflection. Be \
                     personal and encouraging.",
                    self.persona_prompt()
                ),
            },
            ChatMessage {
                role: Role::User,
                content: format!(
                    "Today's summary:\n{summary}\nMood: {}\nEnergy: {}%\n\n\
                     Reflect on my day like a caring friend would.",
                    self.state.mood, self.state.energy
                ),
            },
        ];

        match self.call_with_rotation(&messages, Sampling::REPLY).await {
            Ok(reflection) => reflection,
            Err(e) => {
                tracing::warn!(error = %e, "reflection failed, using tally");
                basic_reflection(activities, tasks)
            }
        }
    }

    async fn generate(&mut self, message: &str, grounding: &str) -> Result<String> {
        let messages = self.build_messages(message, grounding);
        self.call_with_rotation(&messages, Sampling::REPLY).await
    }

    async fn call_with_rotation(
        &mut self,
        messages: &[ChatMessage],
        sampling: Sampling,
    ) -> Result<String> {
        let attempts = self.pool.len().max(1);
        let mut last_error = Error::Llm("no generative credentials configured".to_string());

        for _ in 0..attempts {
            let Some(key) = self.pool.current().map(String::from) else {
                break;
            };
            match self.client.complete(messages, sampling, &key).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_rotatable() => {
                    tracing::warn!(error = %e, "generative credential rejected, rotating");
                    self.pool.advance_wrapping();
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }

    fn persona_prompt(&self) -> String {
        persona::system_prompt(
            &self.state.user_name,
            self.state.mood,
            self.state.relationship,
            self.state.energy,
            Local::now(),
        )
    }

    fn build_messages(&self, message: &str, grounding: &str) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: Role::System,
            content: self.persona_prompt(),
        }];

        let tail = self
            .state
            .history
            .iter()
            .skip(self.state.history.len().saturating_sub(HISTORY_WINDOW));
        messages.extend(tail.map(|turn| ChatMessage {
            role: turn.role,
            content: turn.content.clone(),
        }));

        let content = if grounding.is_empty() {
            message.to_string()
        } else {
            format!("{grounding}\n\nUser: {message}")
        };
        messages.push(ChatMessage {
            role: Role::User,
            content,
        });

        messages
    }
}

/// Tally lines describing the tracked day, fed to the reflection prompt
fn daily_summary(activities: &[Activity], tasks: &[Task]) -> String {
    let completed = tasks.iter().filter(|t| t.completed).count();

    let mut categories: Vec<(Category, usize)> = Vec::new();
    let mut total_minutes: i64 = 0;
    for activity in activities {
        total_minutes += activity.duration_minutes.unwrap_or(0);
        match categories
            .iter_mut()
            .find(|(category, _)| *category == activity.category)
        {
            Some((_, count)) => *count += 1,
            None => categories.push((activity.category, 1)),
        }
    }
    let breakdown = categories
        .iter()
        .map(|(category, count)| format!("{category} ({count})"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Activities: {} tracked\nTotal time: {total_minutes} minutes\n\
         Categories: {breakdown}\nTasks: {completed}/{} completed",
        activities.len(),
        tasks.len()
    )
}

fn basic_reflection(activities: &[Activity], tasks: &[Task]) -> String {
    let completed = tasks.iter().filter(|t| t.completed).count();
    format!(
        "What a day! You tracked {} activities and completed {completed} \
         tasks. You showed up, you tried, and that's what matters. Rest \
         well, you amazing human! 💫",
        activities.len()
    )
}

fn fallback_reply() -> String {
    FALLBACK_REPLIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_REPLIES[0])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_detection() {
        assert_eq!(detect_emotion("I had a great day"), Emotion::Happy);
        assert_eq!(detect_emotion("so pumped for tomorrow"), Emotion::Excited);
        assert_eq!(detect_emotion("feeling pretty down"), Emotion::Sad);
        assert_eq!(detect_emotion("I'm overwhelmed with work"), Emotion::Stressed);
        assert_eq!(detect_emotion("I'm so frustrated right now"), Emotion::Angry);
        assert_eq!(detect_emotion("what's for lunch"), Emotion::Neutral);
    }

    #[test]
    fn good_news_lifts_mood_and_energy() {
        let now = Utc::now();
        let mut state = SessionState::new("friend", now);
        state.mood = Mood::Calm;
        state.energy = 97;

        state.update_from_interaction("that was awesome", now);
        assert_eq!(state.mood, Mood::Playful);
        // Capped at 100
        assert_eq!(state.energy, 100);
    }

    #[test]
    fn bad_news_turns_caring() {
        let now = Utc::now();
        let mut state = SessionState::new("friend", now);
        state.update_from_interaction("I'm really stressed", now);
        assert_eq!(state.mood, Mood::Caring);
    }

    #[test]
    fn relationship_grows_with_history() {
        let now = Utc::now();
        let mut state = SessionState::new("friend", now);
        for i in 0..22 {
            state.history.push(ConversationTurn {
                role: Role::User,
                content: format!("message {i}"),
                timestamp: now,
            });
            state.history.push(ConversationTurn {
                role: Role::Assistant,
                content: "reply".to_string(),
                timestamp: now,
            });
        }
        state.update_from_interaction("hello", now);
        assert_eq!(state.relationship, Relationship::Close);
    }

    #[test]
    fn initiation_ladder() {
        assert_eq!(initiate_probability(3), 0.0);
        assert_eq!(initiate_probability(10), 0.05);
        assert_eq!(initiate_probability(20), 0.2);
        assert_eq!(initiate_probability(40), 0.5);
        assert_eq!(initiate_probability(90), 0.8);
    }

    #[test]
    fn fallback_reply_is_nonempty() {
        assert!(!fallback_reply().is_empty());
    }

    #[test]
    fn daily_summary_tallies_the_day() {
        let now = Utc::now();
        let mut workout = Activity::open("gym session", now);
        workout.duration_minutes = Some(30);
        let mut meeting = Activity::open("team meeting", now);
        meeting.duration_minutes = Some(45);

        let mut done = Task::new("buy milk", now);
        done.completed = true;
        let tasks = vec![done, Task::new("write report", now)];

        let summary = daily_summary(&[workout, meeting], &tasks);
        assert!(summary.contains("Activities: 2 tracked"));
        assert!(summary.contains("Total time: 75 minutes"));
        assert!(summary.contains("Exercise (1)"));
        assert!(summary.contains("Work (1)"));
        assert!(summary.contains("Tasks: 1/2 completed"));
    }

    #[test]
    fn basic_reflection_counts_progress() {
        let now = Utc::now();
        let mut done = Task::new("buy milk", now);
        done.completed = true;
        let text = basic_reflection(&[Activity::open("reading", now)], &[done]);
        assert!(text.contains("1 activities"));
        assert!(text.contains("completed 1 tasks"));
    }
}
