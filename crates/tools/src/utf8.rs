//! Incremental UTF-8 decoding for streaming byte sources.
//!
//! A [`Utf8Carry`] holds the incomplete multi-byte suffix of the previous
//! chunk so that scalar values split across chunk boundaries are reassembled
//! instead of being replaced. Invalid sequences decode to U+FFFD and decoding
//! always makes forward progress.

/// Carry state for a byte stream decoded chunk-by-chunk into a `String`.
///
/// Invariant: at most 3 bytes are pending, and the pending bytes are always a
/// prefix of a plausible UTF-8 sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct Utf8Carry {
    pending: [u8; 4],
    len: u8,
}

impl Utf8Carry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Clear any pending suffix without emitting it.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Decode `bytes` into `out`, resolving a pending suffix first.
    pub fn push_chunk(&mut self, out: &mut String, bytes: &[u8]) {
        let mut rest = bytes;
        while self.len > 0 && !rest.is_empty() {
            let have = self.len as usize;
            let want = match sequence_len(self.pending[0]) {
                Some(want) => want,
                None => {
                    out.push('\u{FFFD}');
                    self.pending.copy_within(1..have, 0);
                    self.len -= 1;
                    continue;
                }
            };
            let take = (want - have).min(rest.len());
            self.pending[have..have + take].copy_from_slice(&rest[..take]);
            self.len += take as u8;
            rest = &rest[take..];
            if (self.len as usize) < want {
                // Still incomplete; wait for the next chunk.
                return;
            }
            let seq = self.pending;
            self.len = 0;
            match std::str::from_utf8(&seq[..want]) {
                Ok(s) => out.push_str(s),
                Err(err) => {
                    // The continuation bytes did not extend the pending
                    // sequence; replace its maximal subpart and re-feed the
                    // remainder so no byte is silently dropped.
                    let skip = err.error_len().unwrap_or(want).max(1);
                    out.push('\u{FFFD}');
                    if skip < want {
                        self.push_chunk(out, &seq[skip..want]);
                    }
                }
            }
        }
        self.decode_into(out, rest);
    }

    /// Flush a pending incomplete suffix (lossily) so end-of-stream never
    /// silently truncates input.
    pub fn finish(&mut self, out: &mut String) {
        if self.len > 0 {
            out.push_str(&String::from_utf8_lossy(&self.pending[..self.len as usize]));
            self.len = 0;
        }
    }

    fn decode_into(&mut self, out: &mut String, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            match std::str::from_utf8(bytes) {
                Ok(s) => {
                    out.push_str(s);
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if valid > 0 {
                        out.push_str(std::str::from_utf8(&bytes[..valid]).expect("validated prefix"));
                    }
                    match err.error_len() {
                        Some(bad) => {
                            out.push('\u{FFFD}');
                            bytes = &bytes[valid + bad..];
                        }
                        None => {
                            // Incomplete trailing sequence; carry it.
                            let tail = &bytes[valid..];
                            self.pending[..tail.len()].copy_from_slice(tail);
                            self.len = tail.len() as u8;
                            return;
                        }
                    }
                }
            }
        }
    }
}

fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(chunks: &[&[u8]]) -> String {
        let mut out = String::new();
        let mut carry = Utf8Carry::new();
        for chunk in chunks {
            carry.push_chunk(&mut out, chunk);
        }
        carry.finish(&mut out);
        out
    }

    #[test]
    fn split_multibyte_across_chunks() {
        assert_eq!(decode(&[&[0xC3], &[0x97]]), "\u{00D7}");
    }

    #[test]
    fn resolves_carry_and_decodes_remaining_bytes() {
        // First two bytes of 😀 (F0 9F 98 80), then the rest plus ASCII.
        assert_eq!(decode(&[&[0xF0, 0x9F], &[0x98, 0x80, b'!']]), "😀!");
    }

    #[test]
    fn carry_can_be_recreated_from_trailing_incomplete_sequence() {
        let mut out = String::new();
        let mut carry = Utf8Carry::new();
        carry.push_chunk(&mut out, &[0xE2]);
        assert_eq!(out, "");
        assert!(!carry.is_empty());
        carry.push_chunk(&mut out, &[0x82, 0xAC, 0xE2]);
        assert_eq!(out, "€");
        assert!(!carry.is_empty());
        carry.finish(&mut out);
        assert_eq!(out, "€\u{FFFD}");
    }

    #[test]
    fn invalid_bytes_make_progress() {
        assert_eq!(decode(&[&[0xFF, b'f']]), "\u{FFFD}f");
    }

    #[test]
    fn mismatched_continuation_replaces_maximal_subpart() {
        // E2 expects two continuation bytes; 'a' is not one.
        assert_eq!(decode(&[&[0xE2], &[b'a', b'b']]), "\u{FFFD}ab");
        // F0 9F is a valid prefix pair that never completes.
        assert_eq!(decode(&[&[0xF0, 0x9F], &[b'a', b'b']]), "\u{FFFD}ab");
    }

    #[test]
    fn incomplete_suffix_is_flushed_on_finish() {
        assert_eq!(decode(&[&[0xE2, 0x82]]), "\u{FFFD}");
    }

    #[test]
    fn one_byte_at_a_time() {
        let text = "aé€😀b";
        let bytes = text.as_bytes();
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode(&chunks), text);
    }
}
