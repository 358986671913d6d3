//! Special-tag recognition.
//!
//! Special tags (`script`, `style` and any configured extras) contain opaque
//! text: once one opens, nothing but its own closing tag is markup. The
//! opening side runs a candidate set over all configured names in parallel;
//! the closing side matches the single active name byte-by-byte. The table
//! is pre-lowercased and input bytes are case-folded before comparison.

use super::Tokenizer;
use super::states::{State, is_whitespace};
use crate::sink::EventSink;

/// Result of feeding one byte to the closing-tag matcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CloseMatch {
    /// Still a prefix of the active tag name.
    Matching,
    /// Past the last character with a valid terminator.
    Matched,
    NoMatch,
}

/// Normalise and validate the configured special-tag names.
///
/// `script` and `style` are always present; extras are lowercased and
/// deduplicated. A single-character name can never be matched (the opening
/// matcher consumes a first character and then needs at least one more to
/// distinguish a terminator), so it is rejected as a contract violation.
pub(super) fn build_table(extra: &[String]) -> Vec<String> {
    let mut table = vec!["script".to_owned(), "style".to_owned()];
    for name in extra {
        assert!(
            name.len() >= 2,
            "special tag names must be at least two characters, got {name:?}"
        );
        let name = name.to_ascii_lowercase();
        if !table.contains(&name) {
            table.push(name);
        }
    }
    table
}

impl<S: EventSink> Tokenizer<S> {
    /// Seed the opening candidate set with every configured tag whose first
    /// character matches. Returns false when nothing can match.
    pub(super) fn begin_special_match(&mut self, c: u8) -> bool {
        let lower = c.to_ascii_lowercase();
        self.match_set.clear();
        for (idx, name) in self.special_tags.iter().enumerate() {
            if name.as_bytes()[0] == lower {
                self.match_set.push(idx);
            }
        }
        if self.match_set.is_empty() {
            return false;
        }
        self.match_depth = 1;
        true
    }

    pub(super) fn step_before_special(&mut self, c: u8) {
        if c == b'/' || c == b'>' || is_whitespace(c) {
            // A tag-name terminator completes whichever candidate has been
            // matched in full; InTagName then re-consumes it and emits the
            // name normally.
            for &idx in &self.match_set {
                if self.match_depth == self.special_tags[idx].len() {
                    self.special = Some(idx);
                    break;
                }
            }
            self.state = State::InTagName;
            self.reconsume = true;
            return;
        }
        let lower = c.to_ascii_lowercase();
        let depth = self.match_depth;
        let tags = &self.special_tags;
        self.match_set.retain(|&idx| {
            let name = tags[idx].as_bytes();
            depth < name.len() && name[depth] == lower
        });
        if self.match_set.is_empty() {
            self.state = State::InTagName;
            self.reconsume = true;
        } else {
            self.match_depth += 1;
        }
    }

    /// Feed one byte of a candidate `</…` closing tag while inside special
    /// contents.
    pub(super) fn match_special_close(&mut self, c: u8) -> CloseMatch {
        let Some(idx) = self.special else {
            return CloseMatch::NoMatch;
        };
        let name = self.special_tags[idx].as_bytes();
        if self.match_depth == name.len() {
            if c == b'>' || is_whitespace(c) {
                CloseMatch::Matched
            } else {
                CloseMatch::NoMatch
            }
        } else if name[self.match_depth] == c.to_ascii_lowercase() {
            self.match_depth += 1;
            CloseMatch::Matching
        } else {
            CloseMatch::NoMatch
        }
    }

    pub(super) fn step_before_special_end(&mut self, c: u8) {
        match self.match_special_close(c) {
            CloseMatch::Matching => {}
            CloseMatch::Matched => {
                // Rewind the section over the matched name so
                // InClosingTagName re-emits it.
                let len = self
                    .special
                    .take()
                    .map_or(0, |idx| self.special_tags[idx].len());
                self.section_start = Some(self.index - len);
                self.state = State::InClosingTagName;
                self.reconsume = true;
            }
            CloseMatch::NoMatch => {
                self.state = State::Text;
                self.reconsume = true;
            }
        }
    }
}
