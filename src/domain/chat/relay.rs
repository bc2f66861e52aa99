use super::dto::{Caller, ChatCompletionChunk};
use crate::domain::usage::{UsageServiceApi, UsageSnapshot};
use crate::infrastructure::repositories::ChatByteStream;
use bytes::Bytes;
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub const USAGE_UPDATE_START: &str = "__USAGE_UPDATE__";
pub const USAGE_UPDATE_END: &str = "__END_USAGE__";

const RELAY_BUFFER: usize = 32;

/// Body stream handed to the HTTP response
pub type RelayStream = ReceiverStream<Result<Bytes, Infallible>>;

/// Something the decoder found in the upstream stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Content(String),
    Finished,
}

/// Incremental decoder for an OpenAI-style server-sent event stream.
///
/// Bytes are buffered until a full line is available, so frames split across
/// network chunks decode the same as frames that arrive whole.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RelayEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            events.extend(decode_line(&line));
        }
        events
    }

    /// Decode whatever is left once the upstream ends without a trailing newline
    pub fn finish(&mut self) -> Vec<RelayEvent> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(line: &[u8]) -> Vec<RelayEvent> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');

    let Some(data) = line.strip_prefix("data:") else {
        return Vec::new();
    };
    let data = data.strip_prefix(' ').unwrap_or(data);

    if data.trim() == "[DONE]" {
        return vec![RelayEvent::Finished];
    }

    let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::debug!(error = %e, "Skipping undecodable stream event");
            return Vec::new();
        }
    };

    let mut events = Vec::new();
    if let Some(choice) = chunk.choices.into_iter().next() {
        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            events.push(RelayEvent::Content(content));
        }
        if choice.finish_reason.as_deref() == Some("stop") {
            events.push(RelayEvent::Finished);
        }
    }
    events
}

/// Frame appended after the generated content carrying the caller's refreshed quota
pub fn usage_marker(snapshot: &UsageSnapshot) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(snapshot)?;
    Ok(Bytes::from(format!(
        "{}{}{}",
        USAGE_UPDATE_START, json, USAGE_UPDATE_END
    )))
}

/// Forwards upstream content to the caller and accounts for the generation once it ends.
pub struct StreamingUsageRelay {
    usage_service: Arc<dyn UsageServiceApi>,
}

impl StreamingUsageRelay {
    pub fn new(usage_service: Arc<dyn UsageServiceApi>) -> Self {
        Self { usage_service }
    }

    /// Start relaying `upstream` on a background task and return the caller-facing stream
    pub fn relay(&self, upstream: ChatByteStream, caller: Caller) -> RelayStream {
        let (tx, rx) = mpsc::channel(RELAY_BUFFER);
        let usage_service = self.usage_service.clone();

        tokio::spawn(async move {
            run_relay(usage_service, upstream, caller, tx).await;
        });

        ReceiverStream::new(rx)
    }
}

async fn run_relay(
    usage_service: Arc<dyn UsageServiceApi>,
    mut upstream: ChatByteStream,
    caller: Caller,
    tx: mpsc::Sender<Result<Bytes, Infallible>>,
) {
    let mut decoder = SseDecoder::default();
    let mut finished = false;

    while !finished {
        let events = match upstream.next().await {
            Some(Ok(chunk)) => decoder.push(&chunk),
            Some(Err(e)) => {
                tracing::error!(error = %e, caller = %caller, "Upstream stream failed");
                return;
            }
            None => {
                // Exhaustion also counts as completion
                finished = true;
                decoder.finish()
            }
        };

        for event in events {
            match event {
                RelayEvent::Content(text) => {
                    if tx.send(Ok(Bytes::from(text))).await.is_err() {
                        tracing::info!(caller = %caller, "Caller disconnected, dropping generation");
                        return;
                    }
                }
                RelayEvent::Finished => {
                    finished = true;
                    break;
                }
            }
        }
    }

    complete(usage_service.as_ref(), &caller, &tx).await;
}

async fn complete(
    usage_service: &dyn UsageServiceApi,
    caller: &Caller,
    tx: &mpsc::Sender<Result<Bytes, Infallible>>,
) {
    let ip = Some(caller.ip_address.as_str());

    if let Err(e) = usage_service.record_usage(caller.user_id, ip).await {
        tracing::error!(error = %e, caller = %caller, "Failed to record usage");
        return;
    }

    let snapshot = match usage_service.get_usage_snapshot(caller.user_id, ip).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!(error = %e, caller = %caller, "Failed to load usage snapshot");
            return;
        }
    };

    match usage_marker(&snapshot) {
        Ok(frame) => {
            if tx.send(Ok(frame)).await.is_err() {
                tracing::debug!(caller = %caller, "Caller left before usage update");
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to encode usage update"),
    }
}
