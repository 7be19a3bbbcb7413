use std::fmt;
use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

/// Longest text record accepted by default, terminator excluded.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024;

/// One newline-terminated record from a text feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Line(String),
    /// A record that cannot be handed on; already consumed from the stream.
    Malformed(Malformed),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    NotUtf8 { len: usize },
    TooLong { len: usize },
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotUtf8 { len } => write!(f, "{len}-byte record is not valid UTF-8"),
            Self::TooLong { len } => write!(f, "record of {len} bytes exceeds the line limit"),
        }
    }
}

/// Splits a text feed on `\n`, stripping a trailing `\r`.
///
/// Unlike `LinesCodec`, bad records are yielded as [`Record::Malformed`]
/// instead of errors, so `FramedRead` keeps going. Only I/O errors end the
/// stream. A record longer than `max_length` is discarded up to its newline.
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_length: usize,
    next_index: usize,
    discarded: Option<usize>,
}

impl LineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarded: None,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl Decoder for LineCodec {
    type Item = Record;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Record>> {
        if let Some(skipped) = self.discarded {
            return Ok(match find_newline(src, 0) {
                Some(end) => {
                    src.advance(end + 1);
                    self.discarded = None;
                    Some(Record::Malformed(Malformed::TooLong { len: skipped + end }))
                }
                None => {
                    self.discarded = Some(skipped + src.len());
                    src.clear();
                    None
                }
            });
        }

        let limit = src.len().min(self.max_length + 1);
        match find_newline(&src[..limit], self.next_index) {
            Some(end) => {
                self.next_index = 0;
                let line = src.split_to(end + 1);
                Ok(Some(to_record(&line[..end])))
            }
            None if src.len() > self.max_length => {
                self.next_index = 0;
                self.discarded = Some(0);
                self.decode(src)
            }
            None => {
                self.next_index = limit;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<Record>> {
        if let Some(record) = self.decode(src)? {
            return Ok(Some(record));
        }
        if let Some(skipped) = self.discarded.take() {
            return Ok(Some(Record::Malformed(Malformed::TooLong { len: skipped })));
        }
        if src.is_empty() {
            return Ok(None);
        }
        self.next_index = 0;
        let line = src.split_to(src.len());
        Ok(Some(to_record(&line)))
    }
}

fn find_newline(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..]
        .iter()
        .position(|b| *b == b'\n')
        .map(|offset| from + offset)
}

fn to_record(bytes: &[u8]) -> Record {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(line) => Record::Line(line.to_string()),
        Err(_) => Record::Malformed(Malformed::NotUtf8 { len: bytes.len() }),
    }
}
