use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("compa.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("compa.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("compa.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("compa.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("compa.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("compa.stream.bytes");

pub(crate) static SESSIONS_OPENED: Counter = Counter::new("compa.chat.sessions_opened");
pub(crate) static SESSIONS_CLOSED: Counter = Counter::new("compa.chat.sessions_closed");
pub(crate) static CHAT_TURNS: Counter = Counter::new("compa.chat.turns");
pub(crate) static CHAT_TURN_ERRORS: Counter = Counter::new("compa.chat.turn_errors");
pub(crate) static CHAT_PROMPT_TOKENS: Counter = Counter::new("compa.chat.prompt_tokens");
pub(crate) static CHAT_CANDIDATE_TOKENS: Counter = Counter::new("compa.chat.candidate_tokens");
pub(crate) static CHAT_TURN_DURATION: Moments = Moments::new("compa.chat.turn_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&SESSIONS_OPENED);
    collector.register_counter(&SESSIONS_CLOSED);
    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_TURN_ERRORS);
    collector.register_counter(&CHAT_PROMPT_TOKENS);
    collector.register_counter(&CHAT_CANDIDATE_TOKENS);
    collector.register_moments(&CHAT_TURN_DURATION);
}
