//! Session behavior: credential rotation, fallback replies, prompt shape

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use kindred_companion::session::{
    ChatMessage, GenerativeClient, Role, Sampling, Session, SessionState,
};
use kindred_companion::speech::KeyPool;
use kindred_companion::{Activity, Error, Result, Task};

/// One accepted completion call: the messages sent and the sampling used
type Recorded = (Vec<ChatMessage>, Sampling);

/// Rejects the first `rejections` credentials, then replies
struct FlakyClient {
    rejections: usize,
    keys_seen: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FlakyClient {
    fn new(rejections: usize) -> (Self, Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<Recorded>>>) {
        let keys_seen = Arc::new(Mutex::new(Vec::new()));
        let requests = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                rejections,
                keys_seen: Arc::clone(&keys_seen),
                requests: Arc::clone(&requests),
            },
            keys_seen,
            requests,
        )
    }
}

#[async_trait]
impl GenerativeClient for FlakyClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        sampling: Sampling,
        api_key: &str,
    ) -> Result<String> {
        let mut seen = self.keys_seen.lock().unwrap();
        seen.push(api_key.to_string());
        if seen.len() <= self.rejections {
            return Err(Error::AuthOrQuota {
                provider: "mock".to_string(),
                status: 429,
            });
        }
        self.requests
            .lock()
            .unwrap()
            .push((messages.to_vec(), sampling));
        Ok("Sounds great! 😄".to_string())
    }
}

fn pool(n: usize) -> KeyPool {
    KeyPool::new((0..n).map(|i| format!("g-{i}")).collect())
}

#[tokio::test]
async fn rotation_walks_keys_until_one_works() {
    let (client, keys_seen, _) = FlakyClient::new(2);
    let now = Utc::now();
    let mut session = Session::new(
        SessionState::new("friend", now),
        Box::new(client),
        pool(3),
    );

    let reply = session.respond("hello!", "", now).await;
    assert_eq!(reply, "Sounds great! 😄");
    assert_eq!(
        keys_seen.lock().unwrap().as_slice(),
        ["g-0", "g-1", "g-2"],
        "each credential tried once in order"
    );
}

#[tokio::test]
async fn exhausted_keys_fall_back_but_history_still_grows() {
    let (client, keys_seen, _) = FlakyClient::new(usize::MAX);
    let now = Utc::now();
    let mut session = Session::new(
        SessionState::new("friend", now),
        Box::new(client),
        pool(3),
    );

    let reply = session.respond("hello!", "", now).await;
    assert!(!reply.is_empty());
    // One full cycle, no more
    assert_eq!(keys_seen.lock().unwrap().len(), 3);
    // Both halves of the exchange recorded
    assert_eq!(session.state.history.len(), 2);
}

#[tokio::test]
async fn grounding_is_prepended_to_the_user_message() {
    let (client, _, requests) = FlakyClient::new(0);
    let now = Utc::now();
    let mut session = Session::new(
        SessionState::new("friend", now),
        Box::new(client),
        pool(1),
    );

    session
        .respond("what should I do", "CURRENT USER CONTEXT:\nPending tasks (1): buy milk", now)
        .await;

    let requests = requests.lock().unwrap();
    let (messages, sampling) = &requests[0];
    assert_eq!(*sampling, Sampling::REPLY);
    assert_eq!(messages[0].role, Role::System);
    let last = messages.last().unwrap();
    assert_eq!(last.role, Role::User);
    assert!(last.content.starts_with("CURRENT USER CONTEXT:"));
    assert!(last.content.ends_with("User: what should I do"));
}

#[tokio::test]
async fn spontaneous_thought_is_remembered() {
    let (client, _, requests) = FlakyClient::new(0);
    let now = Utc::now();
    let mut session = Session::new(
        SessionState::new("friend", now),
        Box::new(client),
        pool(1),
    );

    let thought = session.spontaneous_thought("", now).await;
    assert_eq!(thought.as_deref(), Some("Sounds great! 😄"));
    // Recorded so later replies remember what was said
    assert_eq!(session.state.history.len(), 1);
    assert_eq!(session.state.history[0].role, Role::Assistant);

    let requests = requests.lock().unwrap();
    let (messages, sampling) = &requests[0];
    // Check-ins run shorter and hotter than replies
    assert_eq!(*sampling, Sampling::THOUGHT);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "The user is working on their day.");
}

#[tokio::test]
async fn reflection_summarizes_the_day() {
    let (client, _, requests) = FlakyClient::new(0);
    let now = Utc::now();
    let mut session = Session::new(
        SessionState::new("friend", now),
        Box::new(client),
        pool(1),
    );

    let mut workout = Activity::open("gym session", now);
    workout.duration_minutes = Some(30);
    let mut done = Task::new("buy milk", now);
    done.completed = true;

    let reflection = session.reflect(&[workout], &[done]).await;
    assert_eq!(reflection, "Sounds great! 😄");

    let requests = requests.lock().unwrap();
    let (messages, sampling) = &requests[0];
    assert_eq!(*sampling, Sampling::REPLY);
    let user = messages.last().unwrap();
    assert!(user.content.contains("Activities: 1 tracked"));
    assert!(user.content.contains("Tasks: 1/1 completed"));
}

#[tokio::test]
async fn reflection_falls_back_to_a_tally() {
    let (client, _, _) = FlakyClient::new(usize::MAX);
    let now = Utc::now();
    let mut session = Session::new(
        SessionState::new("friend", now),
        Box::new(client),
        pool(1),
    );

    let reflection = session.reflect(&[], &[]).await;
    assert!(reflection.contains("You tracked 0 activities"));
}

#[tokio::test]
async fn history_window_is_capped_at_ten_turns() {
    let (client, _, requests) = FlakyClient::new(0);
    let now = Utc::now();
    let mut session = Session::new(
        SessionState::new("friend", now),
        Box::new(client),
        pool(1),
    );

    for i in 0..12 {
        session.respond(&format!("message {i}"), "", now).await;
    }

    let requests = requests.lock().unwrap();
    let (last_request, _) = requests.last().unwrap();
    // System prompt + 10 history turns + the new user message
    assert_eq!(last_request.len(), 12);
}
