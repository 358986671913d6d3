//! Shared helpers for tokenizer tests.

use crate::{EventSink, Tokenizer, TokenizerConfig, TokenizerError};

/// One recorded sink callback, with owned payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Text(String),
    OpenTagName(String),
    OpenTagEnd,
    SelfClosingTag,
    CloseTag(String),
    AttribName(String),
    AttribData(String),
    AttribEnd,
    Comment(String),
    Cdata(String),
    Declaration(String),
    ProcessingInstruction(String),
    Error(TokenizerError),
    End,
}

/// Sink that records every event in order.
#[derive(Debug, Default)]
pub(crate) struct Collector {
    pub(crate) events: Vec<Event>,
}

impl EventSink for Collector {
    fn on_text(&mut self, data: &str) {
        self.events.push(Event::Text(data.to_owned()));
    }

    fn on_open_tag_name(&mut self, name: &str) {
        self.events.push(Event::OpenTagName(name.to_owned()));
    }

    fn on_open_tag_end(&mut self) {
        self.events.push(Event::OpenTagEnd);
    }

    fn on_self_closing_tag(&mut self) {
        self.events.push(Event::SelfClosingTag);
    }

    fn on_close_tag(&mut self, name: &str) {
        self.events.push(Event::CloseTag(name.to_owned()));
    }

    fn on_attrib_name(&mut self, name: &str) {
        self.events.push(Event::AttribName(name.to_owned()));
    }

    fn on_attrib_data(&mut self, data: &str) {
        self.events.push(Event::AttribData(data.to_owned()));
    }

    fn on_attrib_end(&mut self) {
        self.events.push(Event::AttribEnd);
    }

    fn on_comment(&mut self, data: &str) {
        self.events.push(Event::Comment(data.to_owned()));
    }

    fn on_cdata(&mut self, data: &str) {
        self.events.push(Event::Cdata(data.to_owned()));
    }

    fn on_declaration(&mut self, data: &str) {
        self.events.push(Event::Declaration(data.to_owned()));
    }

    fn on_processing_instruction(&mut self, data: &str) {
        self.events.push(Event::ProcessingInstruction(data.to_owned()));
    }

    fn on_error(&mut self, error: TokenizerError) {
        self.events.push(Event::Error(error));
    }

    fn on_end(&mut self) {
        self.events.push(Event::End);
    }
}

/// Merge adjacent text and attribute-value fragments.
///
/// Text runs may legitimately split at chunk boundaries and around decoded
/// references; the observable stream is the concatenation.
pub(crate) fn normalize(events: &[Event]) -> Vec<Event> {
    let mut out: Vec<Event> = Vec::new();
    for event in events {
        match (out.last_mut(), event) {
            (Some(Event::Text(acc)), Event::Text(next)) => acc.push_str(next),
            (Some(Event::AttribData(acc)), Event::AttribData(next)) => acc.push_str(next),
            _ => out.push(event.clone()),
        }
    }
    out
}

/// Feed `chunks` through a fresh tokenizer and return the raw event stream.
pub(crate) fn tokenize_chunks(config: TokenizerConfig, chunks: &[&str]) -> Vec<Event> {
    let mut tokenizer = Tokenizer::new(config, Collector::default());
    for chunk in chunks {
        tokenizer.write(chunk);
    }
    tokenizer.end();
    tokenizer.into_sink().events
}

/// Like [`tokenize_chunks`], with adjacent fragments merged.
pub(crate) fn tokenize_normalized(config: TokenizerConfig, chunks: &[&str]) -> Vec<Event> {
    normalize(&tokenize_chunks(config, chunks))
}
