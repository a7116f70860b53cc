// src/io/serial/lines.rs
//
// Line-feed framing and lossy UTF-8 decoding for the scrollback.

const LINE_FEED: u8 = 0x0A;

/// Largest fragment held between reads while reassembling
const MAX_PENDING: usize = 64 * 1024;

/// Splits incoming bytes into display lines.
///
/// With `carry_partial` unset, every `feed` call stands alone: a trailing
/// fragment without a line feed is emitted as its own line. With it set, the
/// fragment is held until the next line feed or `flush`, unless it grows past
/// `MAX_PENDING`, in which case it is emitted as-is.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    carry_partial: bool,
}

impl LineDecoder {
    pub fn new(carry_partial: bool) -> Self {
        LineDecoder {
            buffer: Vec::new(),
            carry_partial,
        }
    }

    pub fn feed(&mut self, data: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in data {
            if byte == LINE_FEED {
                lines.push(decode_line(&std::mem::take(&mut self.buffer)));
                continue;
            }

            self.buffer.push(byte);
        }

        if !self.carry_partial || self.buffer.len() > MAX_PENDING {
            if let Some(line) = self.flush() {
                lines.push(line);
            }
        }

        lines
    }

    /// Emit any held fragment
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(decode_line(&std::mem::take(&mut self.buffer)))
    }
}

/// Undecodable sequences become U+FFFD; trailing whitespace (including CR) is dropped.
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim_end().to_string()
}
