//! Character reference states.
//!
//! The entity region starts one byte after the section start (the `&`), plus
//! one more for `#` and another for `x`/`X`. Decoded replacements are routed
//! by the base state: text references emit through `on_text`, attribute-value
//! references through `on_attrib_data`.

use super::Tokenizer;
use super::states::State;
use crate::entities;
use crate::sink::EventSink;

impl<S: EventSink> Tokenizer<S> {
    pub(super) fn step_before_entity(&mut self, c: u8) {
        if c == b'#' {
            self.state = State::BeforeNumericEntity;
        } else {
            self.state = State::InNamedEntity;
            self.reconsume = true;
        }
    }

    pub(super) fn step_before_numeric_entity(&mut self, c: u8) {
        if c == b'x' || c == b'X' {
            self.state = State::InHexEntity;
        } else {
            self.state = State::InNumericEntity;
            self.reconsume = true;
        }
    }

    pub(super) fn step_in_named_entity(&mut self, c: u8) {
        if c == b';' {
            if self.parse_named_entity_strict() {
                // The semicolon belongs to the reference; the next section
                // starts after it.
                self.section_start = Some(self.index + 1);
            } else if !self.xml_mode && self.section_start.is_some_and(|s| s + 1 < self.index) {
                // Strict lookup missed and the section still spans the name;
                // fall back to the legacy rules outside XML.
                self.parse_legacy_entity();
            }
            self.state = self.base_state;
        } else if !c.is_ascii_alphanumeric() {
            if self.xml_mode || self.section_start.is_some_and(|s| s + 1 == self.index) {
                // No name, or XML without a terminating semicolon: leave the
                // section to the base state untouched.
            } else if self.base_state != State::Text {
                // Attribute values decode semicolon-less references via the
                // strict map, except before `=` so query strings survive.
                if c != b'=' {
                    self.parse_named_entity_strict();
                }
            } else {
                self.parse_legacy_entity();
            }
            self.state = self.base_state;
            self.reconsume = true;
        }
    }

    pub(super) fn step_in_numeric_entity(&mut self, c: u8) {
        if c == b';' {
            let had_digits = self.section_start.is_some_and(|s| s + 2 != self.index);
            self.decode_numeric_entity(2, 10);
            if had_digits {
                self.section_start = Some(self.index + 1);
            }
        } else if !c.is_ascii_digit() {
            if !self.xml_mode {
                self.decode_numeric_entity(2, 10);
            } else {
                self.state = self.base_state;
            }
            self.reconsume = true;
        }
    }

    pub(super) fn step_in_hex_entity(&mut self, c: u8) {
        if c == b';' {
            let had_digits = self.section_start.is_some_and(|s| s + 3 != self.index);
            self.decode_numeric_entity(3, 16);
            if had_digits {
                self.section_start = Some(self.index + 1);
            }
        } else if !c.is_ascii_hexdigit() {
            if !self.xml_mode {
                self.decode_numeric_entity(3, 16);
            } else {
                self.state = self.base_state;
            }
            self.reconsume = true;
        }
    }

    /// Look the full name up in the strict map (XML map in XML mode) and, on
    /// a hit, emit the replacement and advance the section past the name.
    ///
    /// The terminator stays in-section: a reconsumed data byte must survive
    /// into the next fragment, so only the `;` caller skips it.
    pub(super) fn parse_named_entity_strict(&mut self) -> bool {
        let Some(start) = self.section_start else {
            return false;
        };
        if start + 1 >= self.index {
            return false;
        }
        let name = &self.buffer[start + 1..self.index];
        let decoded = if self.xml_mode {
            entities::xml_entity(name)
        } else {
            entities::html_entity(name)
        };
        match decoded {
            Some(value) => {
                self.emit_partial(value);
                self.section_start = Some(self.index);
                true
            }
            None => false,
        }
    }

    /// Try name prefixes of length min(6, available) down to 2 against the
    /// legacy map; emit the longest hit and advance the section past it.
    pub(super) fn parse_legacy_entity(&mut self) {
        let Some(start) = self.section_start else {
            return;
        };
        let name_start = start + 1;
        let mut limit = (self.index - name_start).min(6);
        while limit >= 2 {
            let name = &self.buffer[name_start..name_start + limit];
            if let Some(value) = entities::legacy_entity(name) {
                self.emit_partial(value);
                self.section_start = Some(name_start + limit);
                return;
            }
            limit -= 1;
        }
    }

    /// Decode the digits between the entity prefix and the cursor. With no
    /// digits at all nothing is emitted and the section is left alone, so
    /// the raw bytes flow through as ordinary data.
    pub(super) fn decode_numeric_entity(&mut self, offset: usize, radix: u32) {
        let Some(start) = self.section_start else {
            return;
        };
        let digits_start = start + offset;
        if digits_start != self.index {
            let decoded = entities::decode_numeric(&self.buffer[digits_start..self.index], radix);
            let mut utf8 = [0u8; 4];
            self.emit_partial(decoded.encode_utf8(&mut utf8));
            self.section_start = Some(self.index);
        }
        self.state = self.base_state;
    }

    fn emit_partial(&mut self, data: &str) {
        if self.base_state == State::Text {
            self.sink.on_text(data);
        } else {
            self.sink.on_attrib_data(data);
        }
    }
}
