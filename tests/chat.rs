//! End-to-end tests of the chat startup sequence and loop, against an
//! in-memory connector.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use compa::chat::{
    ChatConfig, Connector, Conversation, ExitStatus, InputEvent, LineSource, Reply, run,
};
use compa::{Credentials, Error, GenerationConfig, PlainTextRenderer, Renderer, Result};

#[derive(Default)]
struct Log {
    opened: Vec<String>,
    sent: Vec<(String, GenerationConfig)>,
    primed: Vec<String>,
}

#[derive(Default)]
struct FakeConnector {
    log: Arc<Mutex<Log>>,
    refuse: bool,
    fail_on: Option<String>,
}

struct FakeSession {
    log: Arc<Mutex<Log>>,
    fail_on: Option<String>,
}

#[async_trait::async_trait]
impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn open_session(&self, credentials: &Credentials) -> Result<FakeSession> {
        if self.refuse {
            return Err(Error::not_found("model not found", None));
        }
        self.log
            .lock()
            .unwrap()
            .opened
            .push(credentials.model().id().to_string());
        Ok(FakeSession {
            log: Arc::clone(&self.log),
            fail_on: self.fail_on.clone(),
        })
    }
}

#[async_trait::async_trait]
impl Conversation for FakeSession {
    async fn send_message(
        &mut self,
        text: &str,
        config: &GenerationConfig,
        _: &mut dyn Renderer,
    ) -> Result<Reply> {
        self.log
            .lock()
            .unwrap()
            .sent
            .push((text.to_string(), *config));
        if self.fail_on.as_deref() == Some(text) {
            return Err(Error::service_unavailable("overloaded", None));
        }
        Ok(Reply::batched(format!("You said {text}")))
    }

    fn prime(&mut self, context: &str) {
        self.log.lock().unwrap().primed.push(context.to_string());
    }
}

struct Script(VecDeque<InputEvent>);

impl Script {
    fn lines(lines: &[&str]) -> Self {
        Self(
            lines
                .iter()
                .map(|line| InputEvent::Line(line.to_string()))
                .collect(),
        )
    }
}

impl LineSource for Script {
    fn read_line(&mut self, _: &str) -> Result<InputEvent> {
        Ok(self.0.pop_front().unwrap_or(InputEvent::Eof))
    }
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

fn good_env() -> impl Fn(&str) -> Option<String> {
    env(&[("API_KEY", "test-key"), ("MODEL_NAME", "gemini-2.0-flash")])
}

fn temp_file(contents: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let path = std::env::temp_dir().join(format!(
        "compa-chat-test-{}-{}.json",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

fn sampling_file() -> PathBuf {
    temp_file(r#"{"temperature": 0.5, "max_tokens": 64, "top_k": 10, "top_p": 0.8}"#)
}

async fn chat(
    connector: &FakeConnector,
    config: &ChatConfig,
    env: impl Fn(&str) -> Option<String>,
    lines: &[&str],
) -> (ExitStatus, String, String) {
    let mut input = Script::lines(lines);
    let mut renderer = PlainTextRenderer::with_writers(Vec::new(), Vec::new(), false);
    let status = run(connector, config, env, &mut input, &mut renderer).await;
    let (out, err) = renderer.into_writers();
    (
        status,
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[tokio::test]
async fn hello_then_exit() {
    let connector = FakeConnector::default();
    let config = ChatConfig::new().with_config_path(sampling_file());
    let (status, out, err) = chat(&connector, &config, good_env(), &["hello", "!exit"]).await;

    assert_eq!(status, ExitStatus::Success);
    assert_eq!(err, "");
    let log = connector.log.lock().unwrap();
    assert_eq!(log.opened, vec!["gemini-2.0-flash"]);
    assert_eq!(log.sent.len(), 1);
    assert_eq!(log.sent[0].0, "hello");
    assert_eq!(
        log.sent[0].1,
        GenerationConfig {
            temperature: 0.5,
            max_tokens: 64,
            top_k: 10,
            top_p: 0.8,
        }
    );
    assert!(out.contains("Hi, how can I assist you today?"));
    assert!(out.contains("│ You said hello"));
    assert!(out.ends_with("Goodbye!\n"));
}

#[tokio::test]
async fn missing_api_key_never_opens_a_session() {
    let connector = FakeConnector::default();
    let config = ChatConfig::new().with_config_path(sampling_file());
    let (status, _, err) = chat(
        &connector,
        &config,
        env(&[("MODEL_NAME", "gemini-2.0-flash")]),
        &["hello"],
    )
    .await;

    assert_eq!(status, ExitStatus::Failure);
    assert!(err.starts_with("Error loading configuration: "));
    assert!(err.contains("API_KEY"));
    let log = connector.log.lock().unwrap();
    assert!(log.opened.is_empty());
    assert!(log.sent.is_empty());
}

#[tokio::test]
async fn invalid_sampling_file_never_opens_a_session() {
    let connector = FakeConnector::default();
    let path = temp_file(r#"{"temperature": 2.0, "max_tokens": 64, "top_k": 10, "top_p": 0.8}"#);
    let config = ChatConfig::new().with_config_path(path);
    let (status, _, err) = chat(&connector, &config, good_env(), &["hello"]).await;

    assert_eq!(status, ExitStatus::Failure);
    assert!(err.contains("temperature"));
    assert!(connector.log.lock().unwrap().opened.is_empty());
}

#[tokio::test]
async fn missing_sampling_file_uses_defaults() {
    let connector = FakeConnector::default();
    let config = ChatConfig::new().with_config_path("/nonexistent/compa/config.json");
    let (status, _, err) = chat(&connector, &config, good_env(), &["hi"]).await;

    assert_eq!(status, ExitStatus::Success);
    assert!(err.contains("Configuration file not found. Using default values."));
    let log = connector.log.lock().unwrap();
    assert_eq!(log.sent[0].1, GenerationConfig::default());
}

#[tokio::test]
async fn refused_session_is_fatal() {
    let connector = FakeConnector {
        refuse: true,
        ..FakeConnector::default()
    };
    let config = ChatConfig::new().with_config_path(sampling_file());
    let (status, out, err) = chat(&connector, &config, good_env(), &["hello"]).await;

    assert_eq!(status, ExitStatus::Failure);
    assert!(err.starts_with("Error starting chat session: "));
    assert!(!out.contains("Hi, how can I assist you today?"));
    assert!(connector.log.lock().unwrap().sent.is_empty());
}

#[tokio::test]
async fn failed_exchange_does_not_end_the_chat() {
    let connector = FakeConnector {
        fail_on: Some("first".to_string()),
        ..FakeConnector::default()
    };
    let config = ChatConfig::new().with_config_path(sampling_file());
    let (status, out, err) =
        chat(&connector, &config, good_env(), &["first", "second", "!exit"]).await;

    assert_eq!(status, ExitStatus::Success);
    assert!(err.starts_with("Error during chat interaction: "));
    assert!(out.contains("You said second"));
    let log = connector.log.lock().unwrap();
    let sent: Vec<&str> = log.sent.iter().map(|(text, _)| text.as_str()).collect();
    assert_eq!(sent, vec!["first", "second"]);
}

#[tokio::test]
async fn end_of_input_exits_cleanly() {
    let connector = FakeConnector::default();
    let config = ChatConfig::new().with_config_path(sampling_file());
    let (status, out, _) = chat(&connector, &config, good_env(), &["", "   "]).await;

    assert_eq!(status, ExitStatus::Success);
    assert!(out.ends_with("Goodbye!\n"));
    assert!(connector.log.lock().unwrap().sent.is_empty());
}

#[tokio::test]
async fn chosen_persona_is_primed() {
    let connector = FakeConnector::default();
    let personas = temp_file(
        r#"[{"name": "Tutor", "context": "Teach gently."}, {"name": "Pirate", "context": "Talk like a pirate."}]"#,
    );
    let config = ChatConfig::new()
        .with_config_path(sampling_file())
        .with_contexts_path(Some(personas));
    let (status, out, err) =
        chat(&connector, &config, good_env(), &["9", "2", "ahoy", "!exit"]).await;

    assert_eq!(status, ExitStatus::Success);
    assert!(out.contains("Who do you want to chat with?\n1. Tutor\n2. Pirate\n"));
    assert!(err.contains("Invalid context index. Please try again."));
    let log = connector.log.lock().unwrap();
    assert_eq!(log.primed, vec!["Talk like a pirate."]);
    assert_eq!(log.sent.len(), 1);
}

#[tokio::test]
async fn unreadable_personas_are_skipped() {
    let connector = FakeConnector::default();
    let config = ChatConfig::new()
        .with_config_path(sampling_file())
        .with_contexts_path(Some(PathBuf::from("/nonexistent/compa/contexts.json")));
    let (status, out, err) = chat(&connector, &config, good_env(), &["!exit"]).await;

    assert_eq!(status, ExitStatus::Success);
    assert!(err.contains("Ignoring contexts file"));
    assert!(!out.contains("Who do you want to chat with?"));
    assert!(connector.log.lock().unwrap().primed.is_empty());
}
