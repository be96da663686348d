//! Chunk-size lines and the post-chunk CRLF.
//!
//! ```not_rust
//! chunk          = chunk-size [ chunk-ext ] CRLF chunk-data CRLF
//! chunk-size     = 1*HEXDIG
//! chunk-ext      = *( BWS ";" BWS chunk-ext-name [ BWS "=" BWS chunk-ext-val ] )
//! chunk-ext-val  = token / quoted-string
//! ```
//!
//! The size line is parsed bytewise and consumed only once its terminator is
//! in the buffer, so partial feeds re-scan from the line start and every
//! violation is detected at the same byte no matter how the stream arrived.
//! Extension content is validated and discarded.

use super::{Parser, State, Step};
use crate::error::ParseError;
use crate::log::trace;
use crate::matches;

/// Any u64 chunk size fits in 16 hex digits; the cap keeps the digit run
/// finite when no terminator is in sight.
const MAX_SIZE_DIGITS: usize = 16;

#[derive(Clone, Copy)]
enum Ext {
    /// After the digits or a finished extension: BWS, `;`, or terminator.
    Lead,
    /// After `;`: BWS, then the extension name.
    Semi,
    /// Inside the extension name.
    Name,
    /// After the name: BWS, `=`, `;`, or terminator.
    AfterName,
    /// After `=`: BWS, then a token or quoted-string value.
    AfterEq,
    /// Inside a token value.
    Value,
    /// Inside a quoted-string value.
    Quoted,
    /// After a backslash inside a quoted-string.
    QuotedEsc,
}

impl Parser {
    pub(super) fn drive_chunk_size(&mut self, data: &[u8]) -> Step {
        // ===== chunk-size =====

        let mut size: u64 = 0;
        let mut i = 0;
        loop {
            match data.get(i) {
                None => return Step::Pending,
                Some(&b) if matches::is_hexdig(b) => {
                    let d = matches::hexval(b) as u64;
                    if size > (u64::MAX - d) / 16 {
                        return Step::Fail(ParseError::ChunkSizeOverflow, i);
                    }
                    if i == MAX_SIZE_DIGITS {
                        return Step::Fail(ParseError::InvalidChunkSize, i);
                    }
                    size = size * 16 + d;
                    i += 1;
                }
                Some(_) => break,
            }
        }
        if i == 0 {
            return Step::Fail(ParseError::InvalidChunkSize, 0);
        }

        // ===== chunk-ext, terminator =====

        let ext_start = i;
        let max_ext = self.config.max_chunk_ext_len;
        let strict = self.config.strict_crlf;
        let mut ext = Ext::Lead;
        let mut seen_ext = false;

        let term_end = loop {
            let b = match data.get(i) {
                Some(&b) => b,
                None => return Step::Pending,
            };

            if matches!(b, b'\r' | b'\n') && !matches!(ext, Ext::Quoted | Ext::QuotedEsc) {
                let junk_err = if seen_ext {
                    ParseError::InvalidChunkExt
                } else {
                    ParseError::InvalidChunkSize
                };
                if !matches!(ext, Ext::Lead | Ext::Name | Ext::AfterName | Ext::Value) {
                    // a dangling `;` or `=` cannot end the line
                    return Step::Fail(ParseError::InvalidChunkExt, i);
                }
                if b == b'\n' {
                    if strict {
                        return Step::Fail(junk_err, i);
                    }
                    break i + 1;
                }
                match data.get(i + 1) {
                    None => return Step::Pending,
                    Some(b'\n') => break i + 2,
                    Some(_) => return Step::Fail(junk_err, i),
                }
            }

            // everything between the digits and the terminator draws from
            // the extension budget, BWS included
            if i - ext_start >= max_ext {
                return Step::Fail(ParseError::ChunkExtTooLong, i);
            }

            ext = match ext {
                Ext::Lead => match b {
                    b' ' | b'\t' => Ext::Lead,
                    b';' => {
                        seen_ext = true;
                        Ext::Semi
                    }
                    _ => {
                        let err = if seen_ext {
                            ParseError::InvalidChunkExt
                        } else {
                            ParseError::InvalidChunkSize
                        };
                        return Step::Fail(err, i);
                    }
                },
                Ext::Semi => match b {
                    b' ' | b'\t' => Ext::Semi,
                    _ if matches::is_tchar(b) => Ext::Name,
                    _ => return Step::Fail(ParseError::InvalidChunkExt, i),
                },
                Ext::Name => match b {
                    _ if matches::is_tchar(b) => Ext::Name,
                    b' ' | b'\t' => Ext::AfterName,
                    b'=' => Ext::AfterEq,
                    b';' => Ext::Semi,
                    _ => return Step::Fail(ParseError::InvalidChunkExt, i),
                },
                Ext::AfterName => match b {
                    b' ' | b'\t' => Ext::AfterName,
                    b'=' => Ext::AfterEq,
                    b';' => Ext::Semi,
                    _ => return Step::Fail(ParseError::InvalidChunkExt, i),
                },
                Ext::AfterEq => match b {
                    b' ' | b'\t' => Ext::AfterEq,
                    b'"' => Ext::Quoted,
                    _ if matches::is_tchar(b) => Ext::Value,
                    _ => return Step::Fail(ParseError::InvalidChunkExt, i),
                },
                Ext::Value => match b {
                    _ if matches::is_tchar(b) => Ext::Value,
                    b' ' | b'\t' => Ext::Lead,
                    b';' => Ext::Semi,
                    _ => return Step::Fail(ParseError::InvalidChunkExt, i),
                },
                Ext::Quoted => match b {
                    b'"' => Ext::Lead,
                    b'\\' => Ext::QuotedEsc,
                    b'\t' => Ext::Quoted,
                    _ if b >= 0x20 && b != 0x7F => Ext::Quoted,
                    _ => return Step::Fail(ParseError::InvalidChunkExt, i),
                },
                Ext::QuotedEsc => match b {
                    b'\t' => Ext::Quoted,
                    _ if b >= 0x20 && b != 0x7F => Ext::Quoted,
                    _ => return Step::Fail(ParseError::InvalidChunkExt, i),
                },
            };
            i += 1;
        };

        // ===== commit =====

        if size == 0 {
            trace!("last chunk, entering trailers");
            self.state = State::Trailers;
            return Step::Advance(term_end);
        }
        if self.total_body_read.saturating_add(size) > self.config.max_body_size {
            return Step::Fail(ParseError::BodyTooLarge, 0);
        }
        self.body_remaining = size;
        self.state = State::BodyChunkedData;
        trace!("chunk of {size} bytes");
        Step::Advance(term_end)
    }

    pub(super) fn drive_chunk_crlf(&mut self, data: &[u8]) -> Step {
        match data {
            [] => Step::Pending,
            [b'\n', ..] if !self.config.strict_crlf => {
                self.state = State::BodyChunkedSize;
                Step::Advance(1)
            }
            [b'\r'] => Step::Pending,
            [b'\r', b'\n', ..] => {
                self.state = State::BodyChunkedSize;
                Step::Advance(2)
            }
            [b'\r', ..] => Step::Fail(ParseError::InvalidChunkData, 1),
            _ => Step::Fail(ParseError::InvalidChunkData, 0),
        }
    }
}
