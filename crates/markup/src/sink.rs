//! Event sink trait and misuse errors.

/// Caller misuse detected by the driver API.
///
/// Malformed markup is never an error; unterminated constructs are salvaged
/// at end-of-input instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenizerError {
    /// `write` was called after `end`. The chunk is dropped.
    WriteAfterEnd,
    /// `end` was called more than once.
    EndAfterEnd,
}

/// Receiver for tokenizer events.
///
/// The tokenizer owns its sink and calls it synchronously from the driver
/// loop. String payloads borrow the tokenizer's internal buffer and are only
/// valid for the duration of the call; copy them if they need to outlive it.
///
/// Every method has a no-op default so consumers implement only the events
/// they care about.
pub trait EventSink {
    /// A run of literal character data, or a decoded character reference
    /// whose base state is text. Runs may be split at chunk boundaries;
    /// adjacent fragments concatenate into the full run.
    fn on_text(&mut self, _data: &str) {}

    /// An opening tag name, before any attributes.
    fn on_open_tag_name(&mut self, _name: &str) {}

    /// The `>` terminating an opening tag.
    fn on_open_tag_end(&mut self) {}

    /// The `/>` terminating a self-closing tag.
    fn on_self_closing_tag(&mut self) {}

    /// A closing tag name.
    fn on_close_tag(&mut self, _name: &str) {}

    /// An attribute name.
    fn on_attrib_name(&mut self, _name: &str) {}

    /// An attribute-value fragment. One or more fire per valued attribute;
    /// concatenate on the receiver side.
    fn on_attrib_data(&mut self, _data: &str) {}

    /// The current attribute is complete.
    fn on_attrib_end(&mut self) {}

    /// A comment body, excluding the trailing `--`.
    fn on_comment(&mut self, _data: &str) {}

    /// A CDATA body, excluding the trailing `]]`.
    fn on_cdata(&mut self, _data: &str) {}

    /// A `<!…>` declaration, excluding the `!` and the `>`.
    fn on_declaration(&mut self, _data: &str) {}

    /// A `<?…>` processing instruction, excluding the `?` and the `>`.
    fn on_processing_instruction(&mut self, _data: &str) {}

    /// Driver API misuse. Parsing of already-buffered input continues.
    fn on_error(&mut self, _error: TokenizerError) {}

    /// Terminal event, fired once finalisation completes.
    fn on_end(&mut self) {}
}
