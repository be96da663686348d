//! Request parsing state machine.
//!
//! The driver consumes a caller buffer and dispatches to a per-state routine
//! that scans for delimiters, validates bytes, updates parser state, and
//! either advances (with a consumed count) or reports that the input is short
//! of a boundary. Each full request ends in [`State::Complete`] or
//! [`State::Error`]; [`Parser::reset`] starts the next pipelined request.

use crate::config::Config;
use crate::error::ParseError;
use crate::log::{debug, trace};
use crate::request::Request;
use crate::scan;

mod reqline;
mod field;
mod semantics;
mod chunked;


// ===== ParseResult =====

/// Outcome of one parser call.
#[derive(Debug)]
#[must_use]
pub enum ParseResult<T> {
    /// The parser reached a yield point.
    Ok(T),
    /// Input is exhausted short of a boundary, more is required.
    Pending,
    /// Parse failed; the parser is latched in [`State::Error`].
    Err(ParseError),
}

impl<T> ParseResult<T> {
    /// Returns `true` if the parse result is [`Ok`].
    ///
    /// [`Ok`]: ParseResult::Ok
    #[inline]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(..))
    }

    /// Returns `true` if the parse result is [`Pending`].
    ///
    /// [`Pending`]: ParseResult::Pending
    #[inline]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns `true` if the parse result is [`Err`].
    ///
    /// [`Err`]: ParseResult::Err
    #[inline]
    pub const fn is_err(&self) -> bool {
        matches!(self, Self::Err(..))
    }

    /// Converts to [`Option`], discarding the error.
    #[inline]
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(ok) => Some(ok),
            _ => None,
        }
    }

    /// Returns the contained [`Ok`] value.
    ///
    /// [`Ok`]: ParseResult::Ok
    ///
    /// # Panics
    ///
    /// Panics on [`Pending`] or [`Err`].
    ///
    /// [`Pending`]: ParseResult::Pending
    /// [`Err`]: ParseResult::Err
    #[track_caller]
    pub fn unwrap(self) -> T {
        match self {
            Self::Ok(ok) => ok,
            Self::Pending => panic!("called `ParseResult::unwrap()` on `Pending`"),
            Self::Err(err) => panic!("called `ParseResult::unwrap()` on `Err`: {err:?}"),
        }
    }
}

// ===== State =====

/// Parser state. No backwards transitions exist; [`Parser::reset`] is the
/// only way back to [`State::Idle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Idle,
    RequestLine,
    Headers,
    BodyIdentity,
    BodyChunkedSize,
    BodyChunkedData,
    BodyChunkedCrlf,
    Trailers,
    Complete,
    Error,
}

/// Outcome of one per-state step, relative to the window the step saw.
pub(crate) enum Step {
    Advance(usize),
    Pending,
    Fail(ParseError, usize),
}

// ===== Parser =====

/// Incremental HTTP/1.1 request parser.
///
/// Owns only its internal bookkeeping and the header/trailer storage; input
/// bytes are borrowed per call and never copied. Feed the unconsumed
/// remainder of the connection buffer to [`parse`](Parser::parse) and keep
/// the bytes that produced spans alive while the spans are in use.
#[derive(Debug)]
pub struct Parser {
    config: Config,
    state: State,
    last_error: Option<ParseError>,
    error_offset: usize,
    request: Request,
    /// Accumulated size of all field lines, terminators included.
    headers_size: usize,
    body_remaining: u64,
    total_body_read: u64,
    /// Last Transfer-Encoding token seen so far was `chunked`.
    te_chunked_final: bool,
    method_connect: bool,
    method_options: bool,
}

impl Parser {
    /// Creates a parser with [`Config::default`].
    pub fn new() -> Parser {
        Parser::with_config(Config::default())
    }

    /// Creates a parser with an explicit configuration snapshot.
    pub fn with_config(config: Config) -> Parser {
        // the dispatch level is process-global and idempotent
        let _ = scan::level();
        Parser {
            config,
            state: State::Idle,
            last_error: None,
            error_offset: 0,
            request: Request::new(),
            headers_size: 0,
            body_remaining: 0,
            total_body_read: 0,
            te_chunked_final: false,
            method_connect: false,
            method_options: false,
        }
    }

    /// Returns the parser to [`State::Idle`] for the next pipelined request,
    /// keeping header and trailer storage capacity.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.last_error = None;
        self.error_offset = 0;
        self.request.reset();
        self.headers_size = 0;
        self.body_remaining = 0;
        self.total_body_read = 0;
        self.te_chunked_final = false;
        self.method_connect = false;
        self.method_options = false;
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The latched error, once [`state`](Parser::state) is [`State::Error`].
    #[inline]
    pub fn last_error(&self) -> Option<ParseError> {
        self.last_error
    }

    /// Offset of the failure site, relative to the `data` argument of the
    /// call that detected it.
    #[inline]
    pub fn error_offset(&self) -> usize {
        self.error_offset
    }

    /// Bytes of the current body left to deliver.
    #[inline]
    pub fn body_remaining(&self) -> u64 {
        self.body_remaining
    }

    /// Total body bytes delivered for the current request.
    #[inline]
    pub fn total_body_read(&self) -> u64 {
        self.total_body_read
    }

    // ===== Drive =====

    /// Drives the state machine over `data`.
    ///
    /// `consumed` is written on every return: how many input bytes were
    /// consumed, and on error, the bytes up to the error site. Returns
    /// [`ParseResult::Ok`] at a yield point ([`State::Complete`], or a
    /// body-reading state to pivot to [`read_body`](Parser::read_body)) and
    /// [`ParseResult::Pending`] when input ran out short of a boundary.
    /// An errored parser returns the stored error without touching input.
    pub fn parse(&mut self, data: &[u8], consumed: &mut usize) -> ParseResult<()> {
        *consumed = 0;

        if self.state == State::Error {
            return ParseResult::Err(self.last_error.unwrap_or(ParseError::Internal));
        }

        loop {
            match self.state {
                State::Complete | State::BodyIdentity | State::BodyChunkedData => {
                    return ParseResult::Ok(());
                }
                _ => {}
            }

            let at = *consumed;
            let step = match self.state {
                State::Idle => self.drive_idle(&data[at..]),
                State::RequestLine => self.drive_reqline(&data[at..], at),
                State::Headers => self.drive_fields(&data[at..], at, false),
                State::BodyChunkedSize => self.drive_chunk_size(&data[at..]),
                State::BodyChunkedCrlf => self.drive_chunk_crlf(&data[at..]),
                State::Trailers => self.drive_fields(&data[at..], at, true),
                // handled above / at entry
                State::BodyIdentity
                | State::BodyChunkedData
                | State::Complete
                | State::Error => unreachable!(),
            };

            match step {
                Step::Advance(n) => *consumed += n,
                Step::Pending => return ParseResult::Pending,
                Step::Fail(err, off) => {
                    let site = at + off;
                    *consumed = site;
                    self.latch(err, site);
                    return ParseResult::Err(err);
                }
            }
        }
    }

    /// Delivers body bytes as a zero-copy view into `data`.
    ///
    /// Valid only in [`State::BodyIdentity`] and [`State::BodyChunkedData`];
    /// any other state reports [`ParseError::Internal`] (or the latched
    /// error) without consuming input. Offers
    /// `min(data.len(), body_remaining)` bytes; when the body (or chunk) is
    /// exhausted the state moves on to [`State::Complete`] (identity) or
    /// [`State::BodyChunkedCrlf`] (chunked).
    pub fn read_body<'b>(&mut self, data: &'b [u8], consumed: &mut usize) -> ParseResult<&'b [u8]> {
        *consumed = 0;

        match self.state {
            State::BodyIdentity | State::BodyChunkedData => {}
            State::Error => {
                return ParseResult::Err(self.last_error.unwrap_or(ParseError::Internal));
            }
            _ => return ParseResult::Err(ParseError::Internal),
        }

        if data.is_empty() {
            return ParseResult::Pending;
        }

        let to_read = (data.len() as u64).min(self.body_remaining) as usize;

        if self.config.max_body_size != u64::MAX
            && self.total_body_read + to_read as u64 > self.config.max_body_size
        {
            self.latch(ParseError::BodyTooLarge, 0);
            return ParseResult::Err(ParseError::BodyTooLarge);
        }

        self.body_remaining -= to_read as u64;
        self.total_body_read += to_read as u64;
        *consumed = to_read;

        if self.body_remaining == 0 {
            self.state = match self.state {
                State::BodyIdentity => State::Complete,
                _ => State::BodyChunkedCrlf,
            };
            trace!("body segment done, state {:?}", self.state);
        }

        ParseResult::Ok(&data[..to_read])
    }

    // ===== Internals =====

    fn latch(&mut self, err: ParseError, site: usize) {
        debug!("parse error {} at {site}", err.name());
        self.state = State::Error;
        self.last_error = Some(err);
        self.error_offset = site;
    }

    fn drive_idle(&mut self, data: &[u8]) -> Step {
        if !self.config.allow_leading_crlf {
            self.state = State::RequestLine;
            return Step::Advance(0);
        }
        match data {
            [] | [b'\r'] => Step::Pending,
            [b'\r', b'\n', ..] => Step::Advance(2),
            [b'\n', ..] if !self.config.strict_crlf => Step::Advance(1),
            _ => {
                self.state = State::RequestLine;
                Step::Advance(0)
            }
        }
    }

    /// Finds the line terminator: the position of the content end and the
    /// terminator length. In strict mode only `\r\n` terminates; otherwise a
    /// bare `\n` also terminates, absorbing a directly preceding `\r`.
    fn find_line_end(&self, data: &[u8]) -> Option<(usize, usize)> {
        if self.config.strict_crlf {
            scan::find_crlf(data).map(|n| (n, 2))
        } else {
            match scan::find_byte(data, b'\n') {
                Some(0) => Some((0, 1)),
                Some(n) if data[n - 1] == b'\r' => Some((n - 1, 2)),
                Some(n) => Some((n, 1)),
                None => None,
            }
        }
    }
}

impl Default for Parser {
    fn default() -> Parser {
        Parser::new()
    }
}
