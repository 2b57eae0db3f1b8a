//! Uniform byte-level input with line/column tracking, over either a
//! seekable in-memory buffer or a streaming reader.
//!
//! BOM sniffing and UTF-8/UTF-16/UTF-32 decoding to `char`, exposed behind a
//! small trait instead of being baked into the parser struct, so the
//! lexer's buffer management stays independent of where bytes actually come
//! from.

use std::collections::VecDeque;
use std::io::BufRead;

use crate::error::ReaderError;

/// A position in the source: byte index, 1-based line, 1-based column.
///
/// Columns are counted in bytes, not Unicode scalar values or grapheme
/// clusters — multi-byte UTF-8 sequences advance the column once per byte
/// consumed from the normalized `char` stream.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Mark {
    pub index: u64,
    pub line: u64,
    pub column: u64,
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// Input encoding. `Any` means "sniff the BOM, default to UTF-8".
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum Encoding {
    #[default]
    Any,
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

const BOM_UTF8: &[u8] = b"\xEF\xBB\xBF";
const BOM_UTF16LE: &[u8] = b"\xFF\xFE";
const BOM_UTF16BE: &[u8] = b"\xFE\xFF";
const BOM_UTF32LE: &[u8] = b"\xFF\xFE\x00\x00";
const BOM_UTF32BE: &[u8] = b"\x00\x00\xFE\xFF";

/// Contract every lexer input source implements.
///
/// The source never allocates per-token; callers append bytes of interest
/// into the lexer's own reusable buffer instead of holding on to slices
/// returned here.
pub trait ByteSource {
    /// Look at the character `offset` positions ahead without consuming it.
    /// `None` means end of input.
    fn peek(&mut self, offset: usize) -> Result<Option<char>, ReaderError>;

    /// Consume `n` characters (CR, LF, and CRLF each count as exactly one
    /// line break and reset the column to 0).
    fn advance(&mut self, n: usize) -> Result<(), ReaderError>;

    fn mark(&self) -> Mark;

    /// The full text of the line currently being scanned, for error
    /// reporting (no trailing line break).
    fn current_line_text(&self) -> String;
}

fn is_break(ch: char) -> bool {
    matches!(ch, '\r' | '\n' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}

fn is_printable(ch: char) -> bool {
    matches!(ch,
        '\t' | '\n' | '\x20'..='\x7e'
        | '\u{0085}'
        | '\u{00a0}'..='\u{d7ff}'
        | '\u{e000}'..='\u{fffd}'
        | '\u{10000}'..='\u{10ffff}'
    )
}

/// Shared decode-and-track-position logic used by both `ByteSource` impls.
struct Decoded {
    /// Decoded characters not yet consumed by the lexer.
    buffer: VecDeque<char>,
    mark: Mark,
    /// The text of the current line, rebuilt as characters are consumed.
    line_buf: String,
    eof: bool,
}

impl Decoded {
    fn new() -> Self {
        Decoded {
            buffer: VecDeque::new(),
            mark: Mark::default(),
            line_buf: String::new(),
            eof: false,
        }
    }

    fn push_char(&mut self, ch: char) -> Result<(), ReaderError> {
        if !is_printable(ch) {
            return Err(ReaderError::Problem {
                problem: "control characters are not allowed",
                offset: self.mark.index,
                value: ch as i64,
            });
        }
        self.buffer.push_back(ch);
        Ok(())
    }

    fn advance_one(&mut self) {
        let Some(ch) = self.buffer.pop_front() else {
            return;
        };
        self.mark.index += ch.len_utf8() as u64;
        if is_break(ch) {
            self.mark.line += 1;
            self.mark.column = 0;
            self.line_buf.clear();
        } else {
            self.mark.column += 1;
            self.line_buf.push(ch);
        }
    }
}

fn decode_utf8(raw: &mut VecDeque<u8>, offset: u64) -> Result<Option<char>, ReaderError> {
    let Some(&first) = raw.front() else {
        return Ok(None);
    };
    let width = if first & 0x80 == 0 {
        1
    } else if first & 0xE0 == 0xC0 {
        2
    } else if first & 0xF0 == 0xE0 {
        3
    } else if first & 0xF8 == 0xF0 {
        4
    } else {
        return Err(ReaderError::InvalidUtf8 {
            offset,
            value: first,
        });
    };
    if raw.len() < width {
        return Ok(None);
    }
    let bytes: Vec<u8> = raw.iter().take(width).copied().collect();
    let s = std::str::from_utf8(&bytes).map_err(|_| ReaderError::InvalidUtf8 {
        offset,
        value: first,
    })?;
    let ch = s.chars().next().expect("non-empty utf8 sequence");
    raw.drain(..width);
    Ok(Some(ch))
}

fn decode_utf16(
    raw: &mut VecDeque<u8>,
    big_endian: bool,
    offset: u64,
) -> Result<Option<char>, ReaderError> {
    if raw.len() < 2 {
        return Ok(None);
    }
    let unit = |b: [u8; 2]| -> u16 {
        if big_endian {
            u16::from_be_bytes(b)
        } else {
            u16::from_le_bytes(b)
        }
    };
    let first = unit([raw[0], raw[1]]);
    if (0xDC00..=0xDFFF).contains(&first) {
        return Err(ReaderError::InvalidUtf16 {
            offset,
            value: first,
        });
    }
    if (0xD800..=0xDBFF).contains(&first) {
        if raw.len() < 4 {
            return Ok(None);
        }
        let second = unit([raw[2], raw[3]]);
        if !(0xDC00..=0xDFFF).contains(&second) {
            return Err(ReaderError::InvalidUtf16 {
                offset,
                value: second,
            });
        }
        let value = 0x10000 + ((first as u32 - 0xD800) << 10) + (second as u32 - 0xDC00);
        let ch = char::from_u32(value).ok_or(ReaderError::InvalidUtf16 {
            offset,
            value: first,
        })?;
        raw.drain(..4);
        Ok(Some(ch))
    } else {
        let ch = char::from_u32(first as u32).ok_or(ReaderError::InvalidUtf16 {
            offset,
            value: first,
        })?;
        raw.drain(..2);
        Ok(Some(ch))
    }
}

fn decode_utf32(
    raw: &mut VecDeque<u8>,
    big_endian: bool,
    offset: u64,
) -> Result<Option<char>, ReaderError> {
    if raw.len() < 4 {
        return Ok(None);
    }
    let bytes = [raw[0], raw[1], raw[2], raw[3]];
    let value = if big_endian {
        u32::from_be_bytes(bytes)
    } else {
        u32::from_le_bytes(bytes)
    };
    let ch = char::from_u32(value).ok_or(ReaderError::InvalidUtf32 { offset, value })?;
    raw.drain(..4);
    Ok(Some(ch))
}

fn sniff_bom(raw: &VecDeque<u8>) -> (Encoding, usize) {
    let head: Vec<u8> = raw.iter().take(4).copied().collect();
    if head.starts_with(BOM_UTF32LE) {
        (Encoding::Utf32Le, 4)
    } else if head.starts_with(BOM_UTF32BE) {
        (Encoding::Utf32Be, 4)
    } else if head.starts_with(BOM_UTF16LE) {
        (Encoding::Utf16Le, 2)
    } else if head.starts_with(BOM_UTF16BE) {
        (Encoding::Utf16Be, 2)
    } else if head.starts_with(BOM_UTF8) {
        (Encoding::Utf8, 3)
    } else {
        (Encoding::Utf8, 0)
    }
}

/// A seekable in-memory source over a byte slice, transcoded once up front.
pub struct SliceSource {
    decoded: Decoded,
}

impl SliceSource {
    pub fn new(bytes: &[u8]) -> Result<Self, ReaderError> {
        Self::with_encoding(bytes, Encoding::Any)
    }

    pub fn with_encoding(bytes: &[u8], encoding: Encoding) -> Result<Self, ReaderError> {
        let mut raw: VecDeque<u8> = bytes.iter().copied().collect();
        let (encoding, bom_len) = if matches!(encoding, Encoding::Any) {
            sniff_bom(&raw)
        } else {
            (encoding, 0)
        };
        raw.drain(..bom_len);
        let mut decoded = Decoded::new();
        decoded.mark.index = bom_len as u64;
        loop {
            let next = match encoding {
                Encoding::Utf8 | Encoding::Any => decode_utf8(&mut raw, decoded.mark.index)?,
                Encoding::Utf16Le => decode_utf16(&mut raw, false, decoded.mark.index)?,
                Encoding::Utf16Be => decode_utf16(&mut raw, true, decoded.mark.index)?,
                Encoding::Utf32Le => decode_utf32(&mut raw, false, decoded.mark.index)?,
                Encoding::Utf32Be => decode_utf32(&mut raw, true, decoded.mark.index)?,
            };
            match next {
                Some(ch) => decoded.push_char(ch)?,
                None if raw.is_empty() => break,
                None => {
                    return Err(ReaderError::Problem {
                        problem: "incomplete multi-byte sequence at end of input",
                        offset: decoded.mark.index,
                        value: -1,
                    })
                }
            }
        }
        decoded.eof = true;
        Ok(SliceSource { decoded })
    }
}

impl ByteSource for SliceSource {
    fn peek(&mut self, offset: usize) -> Result<Option<char>, ReaderError> {
        Ok(self.decoded.buffer.get(offset).copied())
    }

    fn advance(&mut self, n: usize) -> Result<(), ReaderError> {
        for _ in 0..n {
            self.decoded.advance_one();
        }
        Ok(())
    }

    fn mark(&self) -> Mark {
        self.decoded.mark
    }

    fn current_line_text(&self) -> String {
        let mut s = self.decoded.line_buf.clone();
        for &ch in self.decoded.buffer.iter() {
            if is_break(ch) {
                break;
            }
            s.push(ch);
        }
        s
    }
}

/// A streaming source reading from any [`BufRead`], with bounded look-ahead.
pub struct ReaderSource<R> {
    reader: R,
    raw: VecDeque<u8>,
    decoded: Decoded,
    encoding: Encoding,
    want_encoding: Encoding,
    source_eof: bool,
}

const RAW_CHUNK: usize = 4096;
/// Keep enough decoded look-ahead for the longest lexer peek (plain-scalar
/// boundary scanning, `---`/`...` detection) without re-filling per byte.
const LOOKAHEAD: usize = 256;

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_encoding(reader, Encoding::Any)
    }

    pub fn with_encoding(reader: R, encoding: Encoding) -> Self {
        ReaderSource {
            reader,
            raw: VecDeque::new(),
            decoded: Decoded::new(),
            encoding: Encoding::Any,
            want_encoding: encoding,
            source_eof: false,
        }
    }

    fn fill_raw(&mut self) -> Result<(), ReaderError> {
        if self.source_eof {
            return Ok(());
        }
        let mut chunk = vec![0u8; RAW_CHUNK];
        let n = std::io::Read::read(&mut self.reader, &mut chunk)?;
        if n == 0 {
            self.source_eof = true;
        } else {
            self.raw.extend(&chunk[..n]);
        }
        Ok(())
    }

    fn ensure_decoded(&mut self, want: usize) -> Result<(), ReaderError> {
        if !matches!(self.want_encoding, Encoding::Any) {
            self.encoding = self.want_encoding;
        } else if matches!(self.encoding, Encoding::Any) {
            while self.raw.len() < 4 && !self.source_eof {
                self.fill_raw()?;
            }
            let (enc, bom_len) = sniff_bom(&self.raw);
            self.encoding = enc;
            self.raw.drain(..bom_len);
            self.decoded.mark.index += bom_len as u64;
        }

        while self.decoded.buffer.len() < want {
            if self.raw.is_empty() && self.source_eof {
                self.decoded.eof = true;
                return Ok(());
            }
            let next = match self.encoding {
                Encoding::Utf8 | Encoding::Any => decode_utf8(&mut self.raw, self.decoded.mark.index)?,
                Encoding::Utf16Le => decode_utf16(&mut self.raw, false, self.decoded.mark.index)?,
                Encoding::Utf16Be => decode_utf16(&mut self.raw, true, self.decoded.mark.index)?,
                Encoding::Utf32Le => decode_utf32(&mut self.raw, false, self.decoded.mark.index)?,
                Encoding::Utf32Be => decode_utf32(&mut self.raw, true, self.decoded.mark.index)?,
            };
            match next {
                Some(ch) => self.decoded.push_char(ch)?,
                None => self.fill_raw()?,
            }
        }
        Ok(())
    }
}

impl<R: BufRead> ByteSource for ReaderSource<R> {
    fn peek(&mut self, offset: usize) -> Result<Option<char>, ReaderError> {
        self.ensure_decoded((offset + 1).max(LOOKAHEAD))?;
        Ok(self.decoded.buffer.get(offset).copied())
    }

    fn advance(&mut self, n: usize) -> Result<(), ReaderError> {
        self.ensure_decoded(n)?;
        for _ in 0..n {
            self.decoded.advance_one();
        }
        Ok(())
    }

    fn mark(&self) -> Mark {
        self.decoded.mark
    }

    fn current_line_text(&self) -> String {
        let mut s = self.decoded.line_buf.clone();
        for &ch in self.decoded.buffer.iter() {
            if is_break(ch) {
                break;
            }
            s.push(ch);
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_line_and_column() {
        let mut src = SliceSource::new(b"ab\ncd").unwrap();
        assert_eq!(src.mark(), Mark { index: 0, line: 0, column: 0 });
        src.advance(3).unwrap();
        assert_eq!(src.mark().line, 1);
        assert_eq!(src.mark().column, 0);
    }

    #[test]
    fn strips_utf8_bom() {
        let mut bytes = BOM_UTF8.to_vec();
        bytes.extend_from_slice(b"x");
        let mut src = SliceSource::new(&bytes).unwrap();
        assert_eq!(src.peek(0).unwrap(), Some('x'));
    }

    #[test]
    fn current_line_text_excludes_break() {
        let mut src = SliceSource::new(b"hello\nworld").unwrap();
        src.advance(2).unwrap();
        assert_eq!(src.current_line_text(), "hello");
    }
}
