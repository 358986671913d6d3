//! Streaming push tokenizer core.
//!
//! The tokenizer is an explicit state machine over a compacting window of the
//! input. One byte of lookahead is never required: handlers either consume the
//! current byte or flag it for reconsumption in the next state, so the machine
//! is resumable at any chunk boundary.
//!
//! Invariants:
//! - `section_start <= index` whenever a section is open; the bytes before
//!   `section_start` are never read again and are eligible for compaction.
//! - A callback that consumes a section receives exactly
//!   `buffer[section_start..index]` at call time, as a borrowed slice.
//! - All dispatch bytes are ASCII, so byte-wise stepping is UTF-8 safe:
//!   multi-byte scalars only ever appear inside sections, never at section
//!   boundaries.
//! - While a special tag's contents are open, only closing-tag recognition
//!   and literal text are possible; character references are not decoded.

mod buffer;
mod charref;
mod special;
mod states;
#[cfg(test)]
mod tests;

use crate::sink::{EventSink, TokenizerError};
use self::states::{State, is_whitespace};

/// Configuration for the tokenizer.
#[derive(Clone, Debug, Default)]
pub struct TokenizerConfig {
    /// Restrict named references to the XML map, disable legacy
    /// (semicolon-less) references and never treat tag names as special.
    pub xml_mode: bool,
    /// Decode character references in text and attribute values.
    pub decode_entities: bool,
    /// Extra tag names whose contents are opaque until the matching close
    /// tag, in addition to the always-present `script` and `style`. Names
    /// must be at least two characters; matching is ASCII case-insensitive.
    pub special_tags: Vec<String>,
}

/// Minimal tokenizer instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub chunks_written: u64,
    pub bytes_compacted: u64,
    pub peak_buffered: usize,
}

/// Streaming HTML/XML push tokenizer.
///
/// Feed decoded text with [`write`](Self::write) (or raw bytes with
/// [`write_bytes`](Self::write_bytes)), then finish with
/// [`end`](Self::end). Events are delivered synchronously to the owned
/// [`EventSink`].
pub struct Tokenizer<S: EventSink> {
    state: State,
    /// State to return to once a character reference completes. Always one
    /// of `Text` or an attribute-value state.
    base_state: State,
    buffer: String,
    carry: tools::utf8::Utf8Carry,
    /// Bytes discarded by compaction; `buffer_offset + index` is the
    /// absolute cursor position.
    buffer_offset: usize,
    index: usize,
    /// Start of the currently accumulating section, `None` after a section
    /// has been handed out but before the next one opens.
    section_start: Option<usize>,
    /// Set by a handler to re-dispatch the current byte in the new state.
    reconsume: bool,
    /// Index into `special_tags` while inside an opaque-content element.
    special: Option<usize>,
    match_set: Vec<usize>,
    match_depth: usize,
    running: bool,
    ended: bool,
    xml_mode: bool,
    decode_entities: bool,
    special_tags: Vec<String>,
    stats: TokenizerStats,
    sink: S,
}

impl<S: EventSink> Tokenizer<S> {
    pub fn new(config: TokenizerConfig, sink: S) -> Self {
        let special_tags = special::build_table(&config.special_tags);
        Self {
            state: State::Text,
            base_state: State::Text,
            buffer: String::new(),
            carry: tools::utf8::Utf8Carry::new(),
            buffer_offset: 0,
            index: 0,
            section_start: Some(0),
            reconsume: false,
            special: None,
            match_set: Vec::new(),
            match_depth: 0,
            running: true,
            ended: false,
            xml_mode: config.xml_mode,
            decode_entities: config.decode_entities,
            special_tags,
            stats: TokenizerStats::default(),
            sink,
        }
    }

    /// Append a chunk of document text and process as much as possible.
    ///
    /// After `end` this reports [`TokenizerError::WriteAfterEnd`] and drops
    /// the chunk.
    pub fn write(&mut self, chunk: &str) {
        if self.ended {
            self.sink.on_error(TokenizerError::WriteAfterEnd);
            return;
        }
        self.append(chunk);
        self.drive();
        self.cleanup();
    }

    /// Append a chunk of raw bytes, decoding UTF-8 incrementally.
    ///
    /// Multi-byte scalars split across chunk boundaries are carried over;
    /// invalid sequences decode to U+FFFD.
    pub fn write_bytes(&mut self, chunk: &[u8]) {
        if self.ended {
            self.sink.on_error(TokenizerError::WriteAfterEnd);
            return;
        }
        self.stats.chunks_written += 1;
        self.carry.push_chunk(&mut self.buffer, chunk);
        self.stats.peak_buffered = self.stats.peak_buffered.max(self.buffer.len());
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "markup.tokenizer",
            "write_bytes: +{} bytes (buffered={})",
            chunk.len(),
            self.buffer.len()
        );
        self.drive();
        self.cleanup();
    }

    /// Declare end-of-input and, unless paused, finalise.
    ///
    /// A second call reports [`TokenizerError::EndAfterEnd`].
    pub fn end(&mut self) {
        if self.ended {
            self.sink.on_error(TokenizerError::EndAfterEnd);
            return;
        }
        self.flush_carry();
        self.ended = true;
        if self.running {
            self.finalize();
        }
    }

    /// Write one final chunk, then end.
    pub fn end_with(&mut self, chunk: &str) {
        if self.ended {
            self.sink.on_error(TokenizerError::EndAfterEnd);
            return;
        }
        self.flush_carry();
        self.append(chunk);
        self.drive();
        self.cleanup();
        self.ended = true;
        if self.running {
            self.finalize();
        }
    }

    /// Suspend processing at the next byte boundary. Chunks written while
    /// paused are buffered, not processed.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resume processing; drains buffered input and, if `end` was already
    /// called, finalises.
    pub fn resume(&mut self) {
        self.running = true;
        if self.index < self.buffer.len() {
            self.drive();
            self.cleanup();
        }
        if self.ended {
            self.finalize();
        }
    }

    /// Restore constructor defaults, keeping the sink and options.
    pub fn reset(&mut self) {
        self.state = State::Text;
        self.base_state = State::Text;
        self.buffer.clear();
        self.carry.clear();
        self.buffer_offset = 0;
        self.index = 0;
        self.section_start = Some(0);
        self.reconsume = false;
        self.special = None;
        self.match_set.clear();
        self.match_depth = 0;
        self.running = true;
        self.ended = false;
        self.stats = TokenizerStats::default();
    }

    /// Current instrumentation counters.
    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn append(&mut self, chunk: &str) {
        self.stats.chunks_written += 1;
        self.buffer.push_str(chunk);
        self.stats.peak_buffered = self.stats.peak_buffered.max(self.buffer.len());
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "markup.tokenizer",
            "write: +{} bytes (buffered={})",
            chunk.len(),
            self.buffer.len()
        );
    }

    fn flush_carry(&mut self) {
        if !self.carry.is_empty() {
            self.carry.finish(&mut self.buffer);
            self.drive();
            self.cleanup();
        }
    }

    /// Per-byte driver loop. Exits when the buffer is exhausted or the
    /// tokenizer was paused; every handler completes before suspension.
    fn drive(&mut self) {
        while self.running && self.index < self.buffer.len() {
            if self.state == State::Text {
                // Fast-forward over plain character data to the next
                // markup-significant byte.
                let rest = &self.buffer.as_bytes()[self.index..];
                let next = if self.decode_entities && self.special.is_none() {
                    memchr::memchr2(b'<', b'&', rest)
                } else {
                    memchr::memchr(b'<', rest)
                };
                match next {
                    Some(skip) => self.index += skip,
                    None => {
                        self.index = self.buffer.len();
                        break;
                    }
                }
            }
            let c = self.buffer.as_bytes()[self.index];
            self.step(c);
            if self.reconsume {
                self.reconsume = false;
            } else {
                self.index += 1;
            }
        }
    }

    fn step(&mut self, c: u8) {
        match self.state {
            State::Text => self.step_text(c),
            State::BeforeTagName => self.step_before_tag_name(c),
            State::InTagName => self.step_in_tag_name(c),
            State::BeforeClosingTagName => self.step_before_closing_tag_name(c),
            State::InClosingTagName => self.step_in_closing_tag_name(c),
            State::AfterClosingTagName => self.step_after_closing_tag_name(c),
            State::InSelfClosingTag => self.step_in_self_closing_tag(c),
            State::BeforeSpecial => self.step_before_special(c),
            State::BeforeSpecialEnd => self.step_before_special_end(c),
            State::BeforeAttributeName => self.step_before_attribute_name(c),
            State::InAttributeName => self.step_in_attribute_name(c),
            State::AfterAttributeName => self.step_after_attribute_name(c),
            State::BeforeAttributeValue => self.step_before_attribute_value(c),
            State::InAttributeValueDq => self.step_in_attribute_value_quoted(c, b'"'),
            State::InAttributeValueSq => self.step_in_attribute_value_quoted(c, b'\''),
            State::InAttributeValueNq => self.step_in_attribute_value_nq(c),
            State::BeforeDeclaration => self.step_before_declaration(c),
            State::InDeclaration => self.step_in_declaration(c),
            State::InProcessingInstruction => self.step_in_processing_instruction(c),
            State::BeforeComment => self.step_before_comment(c),
            State::InComment => self.step_in_comment(c),
            State::AfterComment1 => self.step_after_comment1(c),
            State::AfterComment2 => self.step_after_comment2(c),
            State::BeforeCdata1 => self.step_cdata_prefix(c, b'C', State::BeforeCdata2),
            State::BeforeCdata2 => self.step_cdata_prefix(c, b'D', State::BeforeCdata3),
            State::BeforeCdata3 => self.step_cdata_prefix(c, b'A', State::BeforeCdata4),
            State::BeforeCdata4 => self.step_cdata_prefix(c, b'T', State::BeforeCdata5),
            State::BeforeCdata5 => self.step_cdata_prefix(c, b'A', State::BeforeCdata6),
            State::BeforeCdata6 => self.step_before_cdata6(c),
            State::InCdata => self.step_in_cdata(c),
            State::AfterCdata1 => self.step_after_cdata1(c),
            State::AfterCdata2 => self.step_after_cdata2(c),
            State::BeforeEntity => self.step_before_entity(c),
            State::BeforeNumericEntity => self.step_before_numeric_entity(c),
            State::InNamedEntity => self.step_in_named_entity(c),
            State::InNumericEntity => self.step_in_numeric_entity(c),
            State::InHexEntity => self.step_in_hex_entity(c),
        }
    }

    // --- text and tag dispatch ---

    fn step_text(&mut self, c: u8) {
        if c == b'<' {
            self.flush_text();
            self.state = State::BeforeTagName;
            self.section_start = Some(self.index);
        } else if c == b'&' && self.decode_entities && self.special.is_none() {
            self.flush_text();
            self.base_state = State::Text;
            self.state = State::BeforeEntity;
            self.section_start = Some(self.index);
        }
    }

    fn flush_text(&mut self) {
        if let Some(start) = self.section_start
            && self.index > start
        {
            let data = &self.buffer[start..self.index];
            self.sink.on_text(data);
        }
    }

    fn step_before_tag_name(&mut self, c: u8) {
        if c == b'/' {
            self.state = State::BeforeClosingTagName;
        } else if c == b'<' {
            let data = buffer::section_slice(&self.buffer, self.section_start, self.index);
            self.sink.on_text(data);
            self.section_start = Some(self.index);
        } else if c == b'>' || self.special.is_some() || is_whitespace(c) {
            self.state = State::Text;
        } else if c == b'!' {
            self.state = State::BeforeDeclaration;
            self.section_start = Some(self.index + 1);
        } else if c == b'?' {
            self.state = State::InProcessingInstruction;
            self.section_start = Some(self.index + 1);
        } else {
            self.state = if !self.xml_mode && self.begin_special_match(c) {
                State::BeforeSpecial
            } else {
                State::InTagName
            };
            self.section_start = Some(self.index);
        }
    }

    fn step_in_tag_name(&mut self, c: u8) {
        if c == b'/' || c == b'>' || is_whitespace(c) {
            let name = buffer::section_slice(&self.buffer, self.section_start, self.index);
            self.sink.on_open_tag_name(name);
            self.section_start = None;
            self.state = State::BeforeAttributeName;
            self.reconsume = true;
        }
    }

    fn step_before_closing_tag_name(&mut self, c: u8) {
        if is_whitespace(c) {
            return;
        }
        if c == b'>' {
            self.state = State::Text;
        } else if self.special.is_some() {
            // Re-arm the closing matcher; anything but an outright mismatch
            // moves on to BeforeSpecialEnd, even the (unreachable in
            // practice) zero-length complete match.
            self.match_depth = 0;
            if self.match_special_close(c) == special::CloseMatch::NoMatch {
                self.state = State::Text;
                self.reconsume = true;
            } else {
                self.state = State::BeforeSpecialEnd;
            }
        } else {
            self.state = State::InClosingTagName;
            self.section_start = Some(self.index);
        }
    }

    fn step_in_closing_tag_name(&mut self, c: u8) {
        if c == b'>' || is_whitespace(c) {
            let name = buffer::section_slice(&self.buffer, self.section_start, self.index);
            self.sink.on_close_tag(name);
            self.section_start = None;
            self.state = State::AfterClosingTagName;
            self.reconsume = true;
        }
    }

    fn step_after_closing_tag_name(&mut self, c: u8) {
        // Skip everything until the tag closes.
        if c == b'>' {
            self.state = State::Text;
            self.section_start = Some(self.index + 1);
        }
    }

    fn step_in_self_closing_tag(&mut self, c: u8) {
        if c == b'>' {
            self.sink.on_self_closing_tag();
            self.state = State::Text;
            self.section_start = Some(self.index + 1);
        } else if !is_whitespace(c) {
            self.state = State::BeforeAttributeName;
            self.reconsume = true;
        }
    }

    // --- attributes ---

    fn step_before_attribute_name(&mut self, c: u8) {
        if c == b'>' {
            self.sink.on_open_tag_end();
            self.state = State::Text;
            self.section_start = Some(self.index + 1);
        } else if c == b'/' {
            self.state = State::InSelfClosingTag;
        } else if !is_whitespace(c) {
            self.state = State::InAttributeName;
            self.section_start = Some(self.index);
        }
    }

    fn step_in_attribute_name(&mut self, c: u8) {
        if c == b'=' || c == b'/' || c == b'>' || is_whitespace(c) {
            let name = buffer::section_slice(&self.buffer, self.section_start, self.index);
            self.sink.on_attrib_name(name);
            self.section_start = None;
            self.state = State::AfterAttributeName;
            self.reconsume = true;
        }
    }

    fn step_after_attribute_name(&mut self, c: u8) {
        if c == b'=' {
            self.state = State::BeforeAttributeValue;
        } else if c == b'/' || c == b'>' {
            self.sink.on_attrib_end();
            self.state = State::BeforeAttributeName;
            self.reconsume = true;
        } else if !is_whitespace(c) {
            // A bare attribute followed by the start of the next name.
            self.sink.on_attrib_end();
            self.state = State::InAttributeName;
            self.section_start = Some(self.index);
        }
    }

    fn step_before_attribute_value(&mut self, c: u8) {
        if c == b'"' {
            self.state = State::InAttributeValueDq;
            self.section_start = Some(self.index + 1);
        } else if c == b'\'' {
            self.state = State::InAttributeValueSq;
            self.section_start = Some(self.index + 1);
        } else if !is_whitespace(c) {
            self.state = State::InAttributeValueNq;
            self.section_start = Some(self.index);
            self.reconsume = true;
        }
    }

    fn step_in_attribute_value_quoted(&mut self, c: u8, quote: u8) {
        if c == quote {
            self.emit_attrib_data();
            self.sink.on_attrib_end();
            self.state = State::BeforeAttributeName;
        } else if c == b'&' && self.decode_entities {
            self.emit_attrib_data();
            self.base_state = self.state;
            self.state = State::BeforeEntity;
            self.section_start = Some(self.index);
        }
    }

    fn step_in_attribute_value_nq(&mut self, c: u8) {
        if c == b'>' || is_whitespace(c) {
            self.emit_attrib_data();
            self.sink.on_attrib_end();
            self.state = State::BeforeAttributeName;
            self.reconsume = true;
        } else if c == b'&' && self.decode_entities {
            self.emit_attrib_data();
            self.base_state = self.state;
            self.state = State::BeforeEntity;
            self.section_start = Some(self.index);
        }
    }

    fn emit_attrib_data(&mut self) {
        let data = buffer::section_slice(&self.buffer, self.section_start, self.index);
        self.sink.on_attrib_data(data);
        self.section_start = None;
    }

    // --- declarations, comments, CDATA, processing instructions ---

    fn step_before_declaration(&mut self, c: u8) {
        self.state = match c {
            b'[' => State::BeforeCdata1,
            b'-' => State::BeforeComment,
            _ => State::InDeclaration,
        };
    }

    fn step_in_declaration(&mut self, c: u8) {
        if c == b'>' {
            let data = buffer::section_slice(&self.buffer, self.section_start, self.index);
            self.sink.on_declaration(data);
            self.state = State::Text;
            self.section_start = Some(self.index + 1);
        }
    }

    fn step_in_processing_instruction(&mut self, c: u8) {
        if c == b'>' {
            let data = buffer::section_slice(&self.buffer, self.section_start, self.index);
            self.sink.on_processing_instruction(data);
            self.state = State::Text;
            self.section_start = Some(self.index + 1);
        }
    }

    fn step_before_comment(&mut self, c: u8) {
        if c == b'-' {
            self.state = State::InComment;
            self.section_start = Some(self.index + 1);
        } else {
            self.state = State::InDeclaration;
        }
    }

    fn step_in_comment(&mut self, c: u8) {
        if c == b'-' {
            self.state = State::AfterComment1;
        }
    }

    fn step_after_comment1(&mut self, c: u8) {
        if c == b'-' {
            self.state = State::AfterComment2;
        } else {
            self.state = State::InComment;
        }
    }

    fn step_after_comment2(&mut self, c: u8) {
        if c == b'>' {
            // Drop the two trailing dashes from the body.
            let data = buffer::section_slice(&self.buffer, self.section_start, self.index - 2);
            self.sink.on_comment(data);
            self.state = State::Text;
            self.section_start = Some(self.index + 1);
        } else if c != b'-' {
            // `--->` keeps waiting on `-`; anything else reopens the body.
            self.state = State::InComment;
        }
    }

    fn step_cdata_prefix(&mut self, c: u8, expected: u8, next: State) {
        if c == expected {
            self.state = next;
        } else {
            self.state = State::InDeclaration;
            self.reconsume = true;
        }
    }

    fn step_before_cdata6(&mut self, c: u8) {
        if c == b'[' {
            self.state = State::InCdata;
            self.section_start = Some(self.index + 1);
        } else {
            self.state = State::InDeclaration;
            self.reconsume = true;
        }
    }

    fn step_in_cdata(&mut self, c: u8) {
        if c == b']' {
            self.state = State::AfterCdata1;
        }
    }

    fn step_after_cdata1(&mut self, c: u8) {
        if c == b']' {
            self.state = State::AfterCdata2;
        } else {
            self.state = State::InCdata;
        }
    }

    fn step_after_cdata2(&mut self, c: u8) {
        if c == b'>' {
            // Drop the two trailing brackets from the body.
            let data = buffer::section_slice(&self.buffer, self.section_start, self.index - 2);
            self.sink.on_cdata(data);
            self.state = State::Text;
            self.section_start = Some(self.index + 1);
        } else if c != b']' {
            // `]]]>` keeps waiting on `]`; anything else reopens the body.
            self.state = State::InCdata;
        }
    }

    // --- finalisation ---

    fn finalize(&mut self) {
        if self.section_start.is_some_and(|start| start < self.index) {
            self.handle_trailing_data();
        }
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "markup.tokenizer",
            "end of input (absolute index {})",
            self.absolute_index()
        );
        self.sink.on_end();
    }

    /// Salvage whatever section is still open at end-of-input.
    fn handle_trailing_data(&mut self) {
        match self.state {
            State::InCdata | State::AfterCdata1 | State::AfterCdata2 => {
                let data = buffer::section_slice(&self.buffer, self.section_start, self.index);
                self.sink.on_cdata(data);
            }
            State::InComment | State::AfterComment1 | State::AfterComment2 => {
                let data = buffer::section_slice(&self.buffer, self.section_start, self.index);
                self.sink.on_comment(data);
            }
            State::InNamedEntity if !self.xml_mode => {
                self.parse_legacy_entity();
                if self.section_start.is_some_and(|start| start < self.index) {
                    self.state = self.base_state;
                    self.handle_trailing_data();
                }
            }
            State::InNumericEntity if !self.xml_mode => {
                self.decode_numeric_entity(2, 10);
                if self.section_start.is_some_and(|start| start < self.index) {
                    self.state = self.base_state;
                    self.handle_trailing_data();
                }
            }
            State::InHexEntity if !self.xml_mode => {
                self.decode_numeric_entity(3, 16);
                if self.section_start.is_some_and(|start| start < self.index) {
                    self.state = self.base_state;
                    self.handle_trailing_data();
                }
            }
            // Data inside an unterminated tag structure is dropped.
            State::InTagName
            | State::InClosingTagName
            | State::BeforeAttributeName
            | State::InAttributeName
            | State::AfterAttributeName
            | State::BeforeAttributeValue
            | State::InAttributeValueDq
            | State::InAttributeValueSq
            | State::InAttributeValueNq => {}
            _ => {
                let data = buffer::section_slice(&self.buffer, self.section_start, self.index);
                self.sink.on_text(data);
            }
        }
    }
}
