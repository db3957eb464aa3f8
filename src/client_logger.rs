//! Logging trait for Gemini client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`Gemini`](crate::Gemini)
//! client, and [`JsonLinesLogger`], which appends them to a file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use serde_json::json;

use crate::error::{Error, Result};
use crate::types::{GenerateContentRequest, GenerateContentResponse, Model};

/// A trait for logging Gemini client operations.
///
/// Implementations never see the API key: it travels in a header the client
/// adds after the request body has been logged.
pub trait ClientLogger: Send + Sync {
    /// Log a request body just before it is sent.
    fn log_request(&self, model: &Model, request: &GenerateContentRequest);

    /// Log a complete response from a non-streaming `generate` call.
    fn log_response(&self, response: &GenerateContentResponse);

    /// Log an individual streaming event.
    fn log_stream_event(&self, event: &GenerateContentResponse);
}

/// Appends one JSON object per line for every request, response and event.
pub struct JsonLinesLogger {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesLogger {
    /// Opens (or creates) `path` for appending.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| Error::io(format!("failed to open {}", path.display()), err))?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn write_line(&self, line: serde_json::Value) {
        // A broken log must never interrupt the chat.
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{line}");
            let _ = writer.flush();
        }
    }
}

impl ClientLogger for JsonLinesLogger {
    fn log_request(&self, model: &Model, request: &GenerateContentRequest) {
        self.write_line(json!({"kind": "request", "model": model.id(), "body": request}));
    }

    fn log_response(&self, response: &GenerateContentResponse) {
        self.write_line(json!({"kind": "response", "body": response}));
    }

    fn log_stream_event(&self, event: &GenerateContentResponse) {
        self.write_line(json!({"kind": "stream_event", "body": event}));
    }
}
