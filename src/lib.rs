//! Incremental, zero-copy HTTP/1.1 request parser.
//!
//! Feed byte windows in whatever sizes the transport produces; the parser
//! extracts the request line, header fields, the body framing decision,
//! body bytes, and trailer fields, all as spans into the caller's buffers.
//! It performs no I/O, generates no responses, and interprets nothing above
//! message framing.
//!
//! ```
//! use pintu::{Parser, ParseResult, State};
//!
//! let buf = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
//!
//! let mut parser = Parser::new();
//! let mut consumed = 0;
//! assert!(parser.parse(buf, &mut consumed).is_ok());
//! assert_eq!(parser.state(), State::Complete);
//! assert_eq!(consumed, buf.len());
//!
//! let request = parser.request();
//! assert_eq!(request.method.slice(buf), b"GET");
//! assert_eq!(request.target.slice(buf), b"/index.html");
//! assert_eq!(request.headers()[0].value.slice(buf), b"example.com");
//!
//! // next pipelined request
//! parser.reset();
//! ```
//!
//! When [`parse`] returns with the parser in [`State::BodyIdentity`] or
//! [`State::BodyChunkedData`], switch to [`read_body`] for zero-copy body
//! views, then return to [`parse`] for chunk framing and trailers.
//!
//! [`parse`]: Parser::parse
//! [`read_body`]: Parser::read_body
#![warn(missing_debug_implementations)]

mod matches;
mod log;

pub mod scan;

mod span;
mod version;
mod error;
mod config;
mod request;
mod parser;

// ===== Reexports =====

pub use config::Config;
pub use error::ParseError;
pub use parser::{ParseResult, Parser, State};
pub use request::{
    BodyType, HEADER_KNOWN_NAME, Header, INDEX_NONE, KnownHeader, REQ_EXPECT_CONTINUE,
    REQ_HAS_CONTENT_LENGTH, REQ_HAS_HOST, REQ_HAS_TRANSFER_ENCODING, REQ_HAS_UPGRADE,
    REQ_IS_CHUNKED, REQ_KEEP_ALIVE, Request, TargetForm,
};
pub use span::Span;
pub use version::Version;
