//! Buffer window management.
//!
//! The buffer holds a contiguous window of the logical stream. After every
//! driver pass the window is compacted: bytes below the open section (or
//! below the cursor when no section is open) are discarded and accounted for
//! in `buffer_offset`, so absolute positions survive compaction.

use super::Tokenizer;
use super::states::State;
use crate::sink::EventSink;

/// The open section as a slice, empty when there is no section or it has no
/// content yet.
pub(super) fn section_slice(buffer: &str, start: Option<usize>, end: usize) -> &str {
    match start {
        Some(start) if start < end => &buffer[start..end],
        _ => "",
    }
}

impl<S: EventSink> Tokenizer<S> {
    /// Absolute position over the logical stream of the next byte to be
    /// examined. Non-decreasing for the lifetime of the tokenizer.
    pub fn absolute_index(&self) -> usize {
        self.buffer_offset + self.index
    }

    /// Compact the buffer after a driver pass.
    ///
    /// Never discards unprocessed input: when paused mid-buffer, only the
    /// fully consumed prefix below the cursor is eligible.
    pub(super) fn cleanup(&mut self) {
        match self.section_start {
            None => {
                self.discard_to(self.index);
            }
            Some(start) if self.running => {
                if self.state == State::Text {
                    // Hand out the pending text run so the whole consumed
                    // prefix can go.
                    self.flush_text();
                    self.discard_to(self.index);
                    self.section_start = Some(0);
                } else if start == self.index {
                    // The section just opened; nothing is in flight.
                    self.discard_to(self.index);
                    self.section_start = Some(0);
                } else {
                    self.discard_to(start);
                    self.section_start = Some(0);
                }
            }
            Some(_) => {}
        }
    }

    fn discard_to(&mut self, upto: usize) {
        if upto == 0 {
            return;
        }
        debug_assert!(
            self.buffer.is_char_boundary(upto),
            "compaction point must be a UTF-8 boundary (upto={}, len={})",
            upto,
            self.buffer.len()
        );
        self.buffer.drain(..upto);
        self.buffer_offset += upto;
        self.index -= upto;
        self.stats.bytes_compacted += upto as u64;
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "markup.tokenizer",
            "compacted {} bytes (absolute offset {})",
            upto,
            self.buffer_offset
        );
    }
}
