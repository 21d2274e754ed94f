//! Incremental decoder for the generation event stream
//!
//! The body is UTF-8 text made of records separated by a blank line. A
//! record whose text starts with `data:` carries one JSON event; anything
//! else (keep-alives, comments) is ignored. Records are only decoded once
//! their separator has arrived, so chunk boundaries may fall anywhere,
//! including inside a multi-byte character.

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use super::ApiError;
use crate::domain::PlanEvent;

/// Separator between complete records
const RECORD_SEPARATOR: &[u8] = b"\n\n";

/// Prefix of records that carry an event payload
const DATA_PREFIX: &str = "data:";

/// Where the decoder is in its read cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    /// Waiting for the next chunk
    #[default]
    AwaitingChunk,
    /// Splitting buffered bytes into complete records
    Framing,
    /// End of stream observed; further chunks are ignored
    Closed,
}

/// Result of decoding one complete record
enum Record {
    Event(PlanEvent),
    Ignored,
    Malformed,
}

/// Byte-level framing state machine for the event stream
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    state: DecoderState,
    decoded: usize,
    skipped: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Bytes held back waiting for a separator
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Events decoded so far
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Malformed `data:` records skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Feed one chunk and return the events completed by it, in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<PlanEvent> {
        debug!(chunk_len = chunk.len(), buffered = self.buffer.len(), "push: called");
        if self.state == DecoderState::Closed {
            warn!(chunk_len = chunk.len(), "push: chunk after close ignored");
            return Vec::new();
        }
        self.state = DecoderState::Framing;

        // Leftover bytes hold no complete separator, but one may straddle the boundary
        let mut search_from = self.buffer.len().saturating_sub(RECORD_SEPARATOR.len() - 1);
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut skipped = 0;
        let mut consumed = 0;
        while let Some(offset) = find_separator(&self.buffer[search_from..]) {
            let end = search_from + offset;
            match decode_record(&self.buffer[consumed..end]) {
                Record::Event(event) => events.push(event),
                Record::Ignored => {}
                Record::Malformed => skipped += 1,
            }
            consumed = end + RECORD_SEPARATOR.len();
            search_from = consumed;
        }
        self.buffer.drain(..consumed);

        self.decoded += events.len();
        self.skipped += skipped;
        self.state = DecoderState::AwaitingChunk;
        debug!(events = events.len(), buffered = self.buffer.len(), "push: framed");
        events
    }

    /// Close the decoder, discarding any trailing partial record
    ///
    /// Returns the number of bytes discarded.
    pub fn finish(&mut self) -> usize {
        debug!(buffered = self.buffer.len(), "finish: called");
        let discarded = self.buffer.len();
        if discarded > 0 {
            warn!(discarded, "finish: discarding incomplete trailing record");
        }
        self.buffer.clear();
        self.state = DecoderState::Closed;
        discarded
    }
}

fn find_separator(haystack: &[u8]) -> Option<usize> {
    haystack.windows(RECORD_SEPARATOR.len()).position(|w| w == RECORD_SEPARATOR)
}

fn decode_record(record: &[u8]) -> Record {
    let text = String::from_utf8_lossy(record);
    let Some(payload) = text.strip_prefix(DATA_PREFIX) else {
        debug!(record_len = record.len(), "decode_record: non-data record ignored");
        return Record::Ignored;
    };

    match serde_json::from_str::<PlanEvent>(payload.trim_start()) {
        Ok(event) => {
            debug!(kind = event.kind(), "decode_record: event decoded");
            Record::Event(event)
        }
        Err(e) => {
            let preview: String = payload.chars().take(100).collect();
            warn!(error = %e, %preview, "decode_record: malformed event skipped");
            Record::Malformed
        }
    }
}

/// Counters reported once a stream has been fully consumed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Events handed to the callback
    pub events: usize,
    /// Malformed records skipped
    pub skipped: usize,
    /// Trailing bytes discarded at end of stream
    pub discarded_bytes: usize,
}

/// Decode a body stream, invoking `on_event` for each event in arrival order
///
/// Resolves when the transport signals end-of-stream. A transport error
/// aborts the loop and is returned; events delivered before it stand.
pub async fn consume_stream<S, F>(mut stream: S, mut on_event: F) -> Result<StreamSummary, ApiError>
where
    S: Stream<Item = Result<Vec<u8>, ApiError>> + Unpin,
    F: FnMut(PlanEvent),
{
    debug!("consume_stream: called");
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, decoded = decoder.decoded(), "consume_stream: transport failed mid-stream");
                return Err(e);
            }
        };
        for event in decoder.push(&chunk) {
            on_event(event);
        }
    }

    let discarded_bytes = decoder.finish();
    let summary = StreamSummary {
        events: decoder.decoded(),
        skipped: decoder.skipped(),
        discarded_bytes,
    };
    info!(?summary, "consume_stream: stream closed");
    Ok(summary)
}
