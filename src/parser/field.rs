//! Header and trailer field lines.
//!
//! ```not_rust
//! field-line = field-name ":" OWS field-value OWS
//! field-name = token
//! ```
//!
//! One field line per step. The empty line ends the section: for headers it
//! runs the finalize pass and enters the body state, for trailers it
//! completes the request.

use super::{Parser, State, Step};
use crate::error::ParseError;
use crate::log::trace;
use crate::matches;
use crate::request::{BodyType, Header, KNOWN_HEADER_NAMES};
use crate::span::Span;

/// Which budget a field line crossed first: the per-line cap or what is
/// left of the section cap. The smaller threshold decides, so the outcome
/// does not depend on how the stream was chunked.
fn field_limit(line_limit: usize, size_remaining: usize) -> (ParseError, usize) {
    if size_remaining < line_limit {
        (ParseError::HeadersTooLarge, size_remaining)
    } else {
        (ParseError::HeaderLineTooLong, line_limit)
    }
}

impl Parser {
    pub(super) fn drive_fields(&mut self, data: &[u8], base_off: usize, trailer: bool) -> Step {
        if data.is_empty() {
            return Step::Pending;
        }

        let line_limit = self.config.max_header_line_len;
        let size_remaining = self.config.max_headers_size.saturating_sub(self.headers_size);

        let (line_len, term) = match self.find_line_end(data) {
            Some(found) => found,
            None => {
                // a 2-byte window may still turn out to be the blank line
                let threshold = line_limit.min(size_remaining).max(2);
                if data.len() >= threshold {
                    let (err, off) = field_limit(line_limit, size_remaining);
                    return Step::Fail(err, off);
                }
                return Step::Pending;
            }
        };
        let line_total = line_len + term;

        // ===== empty line: end of section =====

        if line_len == 0 {
            if trailer {
                trace!("trailer section done");
                self.state = State::Complete;
                return Step::Advance(term);
            }
            return match self.finalize() {
                Ok(()) => {
                    self.enter_body();
                    Step::Advance(term)
                }
                Err(err) => Step::Fail(err, 0),
            };
        }

        if line_total > line_limit.min(size_remaining) {
            let (err, off) = field_limit(line_limit, size_remaining);
            return Step::Fail(err, off);
        }

        let line = &data[..line_len];

        // ===== obs-fold =====

        if matches::is_ows(line[0]) {
            let stored = if trailer {
                self.request.trailers.len()
            } else {
                self.request.headers.len()
            };
            if stored == 0 {
                return Step::Fail(ParseError::LeadingWhitespace, 0);
            }
            if self.config.reject_obs_fold {
                return Step::Fail(ParseError::ObsFoldRejected, 0);
            }
            self.headers_size += line_total;
            trace!("skipped obs-fold continuation");
            return Step::Advance(line_total);
        }

        // ===== name =====

        let name_err = if trailer {
            ParseError::InvalidTrailer
        } else {
            ParseError::InvalidHeaderName
        };
        let value_err = if trailer {
            ParseError::InvalidTrailer
        } else {
            ParseError::InvalidHeaderValue
        };

        let mut i = 0;
        while i < line.len() && line[i] != b':' {
            if !matches::is_tchar(line[i]) {
                return Step::Fail(name_err, i);
            }
            i += 1;
        }
        if i == 0 || i == line.len() {
            // colon first, or no colon at all
            return Step::Fail(name_err, i);
        }
        let name_end = i;

        // ===== value =====

        let mut vs = name_end + 1;
        while vs < line.len() && matches::is_ows(line[vs]) {
            vs += 1;
        }
        let mut ve = line.len();
        while ve > vs && matches::is_ows(line[ve - 1]) {
            ve -= 1;
        }
        for (k, &b) in line[vs..ve].iter().enumerate() {
            if !matches::is_field_value(b, self.config.allow_obs_text) {
                return Step::Fail(value_err, vs + k);
            }
        }

        // ===== accumulate =====

        let stored = if trailer {
            self.request.trailers.len()
        } else {
            self.request.headers.len()
        };
        if stored >= self.config.max_header_count {
            return Step::Fail(ParseError::TooManyHeaders, 0);
        }

        let name = &line[..name_end];
        let known = KNOWN_HEADER_NAMES
            .iter()
            .find(|(known_name, _)| name.eq_ignore_ascii_case(known_name))
            .map(|&(_, kind)| kind);

        let header = Header::new(
            Span::new(base_off, name_end),
            Span::new(base_off + vs, ve - vs),
            known,
        );

        if trailer {
            self.request.trailers.push(header);
        } else {
            let idx = self.request.headers.len();
            self.request.headers.push(header);
            if let Some(kind) = known {
                if let Err((err, off)) = self.on_known_header(kind, idx, &line[vs..ve]) {
                    return Step::Fail(err, vs + off);
                }
            }
        }

        self.headers_size += line_total;
        Step::Advance(line_total)
    }

    fn enter_body(&mut self) {
        self.state = match self.request.body_type {
            BodyType::None => State::Complete,
            BodyType::ContentLength if self.request.content_length == 0 => State::Complete,
            BodyType::ContentLength => {
                self.body_remaining = self.request.content_length;
                State::BodyIdentity
            }
            BodyType::Chunked => State::BodyChunkedSize,
        };
        trace!(
            "headers done: {:?}, {} headers, state {:?}",
            self.request.body_type,
            self.request.headers.len(),
            self.state,
        );
    }
}
