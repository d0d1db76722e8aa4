//! Streaming Reasoning Decoder
//!
//! Reasoning-capable models interleave a thinking span with the final
//! answer by wrapping it in `<think>` / `</think>` markers. Responses
//! arrive as arbitrary fragments, so a marker can be split across two
//! fragments. This decoder buffers a short trailing window and emits
//! unified events separating the reasoning channel from the answer
//! channel.
//!
//! A close marker seen without a prior open is emitted as ordinary answer
//! content; the decoder only reacts to markers as encountered and never
//! reclassifies content retroactively.

use serde::{Deserialize, Serialize};

const OPEN_MARKER: &str = "<think>";
const CLOSE_MARKER: &str = "</think>";

/// Unified streaming event produced by the decoder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Answer content delta
    AnswerDelta { content: String },

    /// Start of a reasoning span
    ReasoningStart,

    /// Reasoning content delta
    ReasoningDelta { content: String },

    /// End of a reasoning span
    ReasoningEnd,
}

/// State for marker parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Normal,
    InReasoning,
}

/// Incremental decoder splitting a fragment stream into reasoning and
/// answer channels.
pub struct ReasoningDecoder {
    state: DecodeState,
    /// Buffer for marker detection across fragment boundaries
    buffer: String,
}

impl Default for ReasoningDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReasoningDecoder {
    pub fn new() -> Self {
        Self {
            state: DecodeState::Normal,
            buffer: String::new(),
        }
    }

    /// Feed one fragment and return the events it unlocked.
    pub fn push(&mut self, fragment: &str) -> Vec<StreamEvent> {
        if fragment.is_empty() {
            return vec![];
        }
        self.buffer.push_str(fragment);
        self.process_buffer()
    }

    /// Flush any buffered tail and close an unterminated reasoning span.
    ///
    /// Call once after the last fragment; a held partial marker that never
    /// completed is emitted verbatim on the current channel.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = self.process_buffer();

        let tail = std::mem::take(&mut self.buffer);
        if !tail.is_empty() {
            events.push(match self.state {
                DecodeState::Normal => StreamEvent::AnswerDelta { content: tail },
                DecodeState::InReasoning => StreamEvent::ReasoningDelta { content: tail },
            });
        }

        if self.state == DecodeState::InReasoning {
            events.push(StreamEvent::ReasoningEnd);
            self.state = DecodeState::Normal;
        }

        events
    }

    /// Reset decoder state for a new stream.
    pub fn reset(&mut self) {
        self.state = DecodeState::Normal;
        self.buffer.clear();
    }

    /// Drain the buffer, holding back only a trailing window that could be
    /// the start of a marker split across fragments.
    fn process_buffer(&mut self) -> Vec<StreamEvent> {
        let mut events = vec![];

        while !self.buffer.is_empty() {
            match self.state {
                DecodeState::Normal => {
                    if let Some(start_pos) = self.buffer.find(OPEN_MARKER) {
                        if start_pos > 0 {
                            let text = self.buffer[..start_pos].to_string();
                            events.push(StreamEvent::AnswerDelta { content: text });
                        }
                        self.buffer = self.buffer[start_pos + OPEN_MARKER.len()..].to_string();
                        self.state = DecodeState::InReasoning;
                        events.push(StreamEvent::ReasoningStart);
                    } else if holds_partial_marker(&self.buffer, OPEN_MARKER) {
                        break;
                    } else {
                        let text = std::mem::take(&mut self.buffer);
                        events.push(StreamEvent::AnswerDelta { content: text });
                        break;
                    }
                }
                DecodeState::InReasoning => {
                    if let Some(end_pos) = self.buffer.find(CLOSE_MARKER) {
                        if end_pos > 0 {
                            let thinking = self.buffer[..end_pos].to_string();
                            events.push(StreamEvent::ReasoningDelta { content: thinking });
                        }
                        self.buffer = self.buffer[end_pos + CLOSE_MARKER.len()..].to_string();
                        self.state = DecodeState::Normal;
                        events.push(StreamEvent::ReasoningEnd);
                    } else if holds_partial_marker(&self.buffer, CLOSE_MARKER) {
                        break;
                    } else {
                        let thinking = std::mem::take(&mut self.buffer);
                        events.push(StreamEvent::ReasoningDelta { content: thinking });
                        break;
                    }
                }
            }
        }

        events
    }
}

/// True when the buffer ends with a proper prefix of `marker`, meaning the
/// rest of the marker may still arrive in the next fragment.
fn holds_partial_marker(buffer: &str, marker: &str) -> bool {
    (1..marker.len()).rev().any(|n| buffer.ends_with(&marker[..n]))
}

/// Collected output of a fully decoded stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitResponse {
    /// Concatenated answer-channel content
    pub answer: String,
    /// Concatenated reasoning-channel content
    pub reasoning: String,
}

/// Run a complete fragment sequence through the decoder and collect both
/// channels.
pub fn split_channels<I, S>(fragments: I) -> SplitResponse
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut decoder = ReasoningDecoder::new();
    let mut out = SplitResponse::default();

    let collect = |events: Vec<StreamEvent>, out: &mut SplitResponse| {
        for event in events {
            match event {
                StreamEvent::AnswerDelta { content } => out.answer.push_str(&content),
                StreamEvent::ReasoningDelta { content } => out.reasoning.push_str(&content),
                StreamEvent::ReasoningStart | StreamEvent::ReasoningEnd => {}
            }
        }
    };

    for fragment in fragments {
        let events = decoder.push(fragment.as_ref());
        collect(events, &mut out);
    }
    let events = decoder.finish();
    collect(events, &mut out);

    out
}
