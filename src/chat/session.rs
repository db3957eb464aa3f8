//! Chat sessions.
//!
//! A [`Connector`] opens a session for a set of [`Credentials`]; the
//! resulting [`Conversation`] sends one message at a time.  The Gemini REST
//! API is stateless, so [`GeminiSession`] keeps the turns of the current
//! conversation in memory and replays them with every request.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::chat::config::ChatConfig;
use crate::client::{Gemini, ResponseStream};
use crate::client_logger::ClientLogger;
use crate::config::{Credentials, GenerationConfig};
use crate::error::{Error, Result};
use crate::observability::{
    CHAT_CANDIDATE_TOKENS, CHAT_PROMPT_TOKENS, SESSIONS_CLOSED, SESSIONS_OPENED,
};
use crate::render::Renderer;
use crate::types::{Content, GenerateContentRequest, Model, UsageMetadata};

/// The outcome of one successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The complete response text.
    pub text: String,
    /// True when the text was already printed while it streamed in.
    pub streamed: bool,
    /// Token usage reported by the provider.
    pub usage: Option<UsageMetadata>,
}

impl Reply {
    /// A reply that still has to be printed.
    pub fn batched(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            streamed: false,
            usage: None,
        }
    }
}

/// An open conversation with a model.
#[async_trait::async_trait]
pub trait Conversation: Send {
    /// Sends `text` as the next user turn and waits for the answer.
    ///
    /// On failure the conversation is left as it was before the call.
    async fn send_message(
        &mut self,
        text: &str,
        config: &GenerationConfig,
        renderer: &mut dyn Renderer,
    ) -> Result<Reply>;

    /// Seeds the conversation with an opening user turn without contacting
    /// the model.
    fn prime(&mut self, context: &str);
}

/// Opens conversations.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// The conversation type this connector produces.
    type Session: Conversation;

    /// Opens a session for the model named in `credentials`.
    async fn open_session(&self, credentials: &Credentials) -> Result<Self::Session>;
}

///////////////////////////////////////////// Connector ////////////////////////////////////////////

/// Opens [`GeminiSession`]s.
#[derive(Clone, Default)]
pub struct GeminiConnector {
    base_url: Option<String>,
    timeout: Option<Duration>,
    streaming: bool,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl GeminiConnector {
    /// A connector for the public endpoint, in batched mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API root.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Streams responses instead of waiting for the whole answer.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Passes every request and response to `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }
}

impl From<&ChatConfig> for GeminiConnector {
    fn from(config: &ChatConfig) -> Self {
        Self::new()
            .with_base_url(config.base_url.clone())
            .with_streaming(config.streaming)
    }
}

impl std::fmt::Debug for GeminiConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConnector")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("streaming", &self.streaming)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

#[async_trait::async_trait]
impl Connector for GeminiConnector {
    type Session = GeminiSession;

    async fn open_session(&self, credentials: &Credentials) -> Result<GeminiSession> {
        let mut client = Gemini::with_options(
            credentials.api_key(),
            self.base_url.as_deref(),
            self.timeout,
        )?;
        if let Some(logger) = &self.logger {
            client = client.with_logger(Arc::clone(logger));
        }
        let model = credentials.model().clone();
        let info = client.get_model(&model).await?;
        if !info.supports_generate_content() {
            return Err(Error::bad_request(
                format!("model {model} does not support generateContent"),
                None,
            ));
        }
        Ok(GeminiSession::new(client, model, self.streaming))
    }
}

////////////////////////////////////////////// Session /////////////////////////////////////////////

/// A conversation with a Gemini model.
#[derive(Debug)]
pub struct GeminiSession {
    client: Gemini,
    model: Model,
    streaming: bool,
    history: Vec<Content>,
    usage: UsageMetadata,
}

impl GeminiSession {
    /// Wraps an already verified client and model.
    pub fn new(client: Gemini, model: Model, streaming: bool) -> Self {
        SESSIONS_OPENED.click();
        Self {
            client,
            model,
            streaming,
            history: Vec::new(),
            usage: UsageMetadata::default(),
        }
    }

    /// The model this session talks to.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The turns exchanged so far.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Total token usage over the session.
    pub fn usage(&self) -> UsageMetadata {
        self.usage
    }

    /// Whether responses are streamed.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    async fn generate_batched(
        &self,
        request: &GenerateContentRequest,
        renderer: &mut dyn Renderer,
    ) -> Result<Reply> {
        renderer.start_waiting();
        let result = self.client.generate(&self.model, request).await;
        renderer.stop_waiting();
        let response = result?;
        let text = response.text()?;
        Ok(Reply {
            text,
            streamed: false,
            usage: response.usage_metadata,
        })
    }

    async fn generate_streamed(
        &self,
        request: &GenerateContentRequest,
        renderer: &mut dyn Renderer,
    ) -> Result<Reply> {
        renderer.start_waiting();
        let stream = match self.client.stream_generate(&self.model, request).await {
            Ok(stream) => stream,
            Err(err) => {
                renderer.stop_waiting();
                return Err(err);
            }
        };
        let mut text = String::new();
        let result = read_stream(stream, renderer, &mut text).await;
        if text.is_empty() {
            renderer.stop_waiting();
        } else if result.is_err() {
            renderer.finish_response();
        }
        let usage = result?;
        Ok(Reply {
            text,
            streamed: true,
            usage,
        })
    }
}

/// Prints chunks as they arrive, accumulating them into `text`.
async fn read_stream(
    mut stream: ResponseStream,
    renderer: &mut dyn Renderer,
    text: &mut String,
) -> Result<Option<UsageMetadata>> {
    let mut usage = None;
    let mut last = None;
    while let Some(event) = stream.next().await {
        let event = event?;
        event.check_prompt_feedback()?;
        let chunk = event.chunk_text();
        if !chunk.is_empty() {
            if text.is_empty() {
                renderer.stop_waiting();
            }
            renderer.print_text(&chunk);
            text.push_str(&chunk);
        }
        if event.usage_metadata.is_some() {
            usage = event.usage_metadata;
        }
        last = Some(event);
    }
    if text.is_empty() {
        return Err(match last {
            Some(event) => match event.text() {
                Err(err) => err,
                Ok(_) => Error::empty_response("no text in the response"),
            },
            None => Error::empty_response("the stream ended without any events"),
        });
    }
    Ok(usage)
}

#[async_trait::async_trait]
impl Conversation for GeminiSession {
    async fn send_message(
        &mut self,
        text: &str,
        config: &GenerationConfig,
        renderer: &mut dyn Renderer,
    ) -> Result<Reply> {
        let turn_start = self.history.len();
        self.history.push(Content::user(text));
        let request = GenerateContentRequest::new(self.history.clone(), config);
        let result = if self.streaming {
            self.generate_streamed(&request, renderer).await
        } else {
            self.generate_batched(&request, renderer).await
        };
        match result {
            Ok(reply) => {
                self.history.push(Content::model(reply.text.clone()));
                if let Some(usage) = reply.usage {
                    CHAT_PROMPT_TOKENS.count(usage.prompt_token_count as u64);
                    CHAT_CANDIDATE_TOKENS.count(usage.candidates_token_count as u64);
                    self.usage = self.usage + usage;
                }
                Ok(reply)
            }
            Err(err) => {
                self.history.truncate(turn_start);
                Err(err)
            }
        }
    }

    fn prime(&mut self, context: &str) {
        self.history.push(Content::user(context));
    }
}

impl Drop for GeminiSession {
    fn drop(&mut self) {
        SESSIONS_CLOSED.click();
    }
}
