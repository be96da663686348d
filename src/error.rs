//! Parse errors.
//!
//! One discriminant per failure condition, in seven kinds: framing, header
//! syntax, header limits, header semantics, body/chunked, connection,
//! internal. Names and messages are static tables indexed by the code.
//!
//! The intended client-visible status per kind, for callers that answer on
//! the wire: syntax, target, header-syntax, Host, Content-Length,
//! Transfer-Encoding, and conflict errors map to 400; header size and count
//! limits to 431; body size to 413; unknown transfer codings to 501.

macro_rules! error_table {
    {
        $(
            $(#[$meta:meta])*
            $variant:ident = ($name:literal, $message:literal),
        )*
    } => {
        /// Reason a request was rejected.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum ParseError {
            $(
                $(#[$meta])*
                $variant,
            )*
        }

        impl ParseError {
            /// The enumerator name, e.g. `"INVALID_METHOD"`.
            pub const fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// Human-readable description.
            pub const fn message(&self) -> &'static str {
                match self {
                    $(Self::$variant => $message,)*
                }
            }

            #[cfg(test)]
            pub(crate) const ALL: &[ParseError] = &[$(Self::$variant,)*];
        }
    };
}

error_table! {
    /// A method byte outside tchar, or an empty method.
    InvalidMethod = ("INVALID_METHOD", "Invalid HTTP method"),
    /// A request-target byte or form violation, or a method/form mismatch.
    InvalidTarget = ("INVALID_TARGET", "Invalid request target"),
    /// Malformed `HTTP/x.y`, or a major version other than 1.
    InvalidVersion = ("INVALID_VERSION", "Invalid HTTP version"),
    /// Request line longer than `max_request_line_len`.
    RequestLineTooLong = ("REQUEST_LINE_TOO_LONG", "Request line too long"),
    /// A bare CR or LF where a CRLF line ending was required.
    InvalidCrlf = ("INVALID_CRLF", "Invalid line ending"),
    /// A field name byte outside tchar, or an empty or missing name.
    InvalidHeaderName = ("INVALID_HEADER_NAME", "Invalid header name"),
    /// A field value byte outside SP / HTAB / VCHAR / permitted obs-text.
    InvalidHeaderValue = ("INVALID_HEADER_VALUE", "Invalid header value"),
    /// Field line longer than `max_header_line_len`.
    HeaderLineTooLong = ("HEADER_LINE_TOO_LONG", "Header line too long"),
    /// More than `max_header_count` headers.
    TooManyHeaders = ("TOO_MANY_HEADERS", "Too many headers"),
    /// Header section larger than `max_headers_size`.
    HeadersTooLarge = ("HEADERS_TOO_LARGE", "Headers section too large"),
    /// Obsolete line folding while `reject_obs_fold` is set.
    ObsFoldRejected = ("OBS_FOLD_REJECTED", "Obsolete line folding rejected"),
    /// Whitespace before the first header field.
    LeadingWhitespace = ("LEADING_WHITESPACE", "Leading whitespace in header section"),
    /// HTTP/1.1 request without a Host header.
    MissingHost = ("MISSING_HOST", "Missing Host header"),
    /// More than one Host header.
    MultipleHost = ("MULTIPLE_HOST", "Multiple Host headers"),
    /// Host value fails host / port / IPv6 validation.
    InvalidHost = ("INVALID_HOST", "Invalid Host header value"),
    /// Content-Length value is not a plain digit sequence.
    InvalidContentLength = ("INVALID_CONTENT_LENGTH", "Invalid Content-Length value"),
    /// Differing Content-Length values in one request.
    MultipleContentLength = ("MULTIPLE_CONTENT_LENGTH", "Conflicting Content-Length values"),
    /// Content-Length does not fit in 64 bits.
    ContentLengthOverflow = ("CONTENT_LENGTH_OVERFLOW", "Content-Length value overflow"),
    /// Malformed Transfer-Encoding list, or parameters on `chunked`.
    InvalidTransferEncoding = ("INVALID_TRANSFER_ENCODING", "Invalid Transfer-Encoding"),
    /// Transfer-Encoding present but the final coding is not `chunked`.
    TeNotChunkedFinal = ("TE_NOT_CHUNKED_FINAL", "Transfer-Encoding final coding is not chunked"),
    /// Transfer-Encoding and Content-Length both present.
    TeClConflict = ("TE_CL_CONFLICT", "Transfer-Encoding and Content-Length both present"),
    /// A transfer coding outside the accepted set.
    UnknownTransferCoding = ("UNKNOWN_TRANSFER_CODING", "Unknown transfer coding"),
    /// Declared or accumulated body larger than `max_body_size`.
    BodyTooLarge = ("BODY_TOO_LARGE", "Body exceeds maximum size"),
    /// Malformed chunk-size line.
    InvalidChunkSize = ("INVALID_CHUNK_SIZE", "Invalid chunk size"),
    /// Chunk size does not fit in 64 bits.
    ChunkSizeOverflow = ("CHUNK_SIZE_OVERFLOW", "Chunk size overflow"),
    /// Malformed chunk extension.
    InvalidChunkExt = ("INVALID_CHUNK_EXT", "Invalid chunk extension"),
    /// Chunk extensions longer than `max_chunk_ext_len`.
    ChunkExtTooLong = ("CHUNK_EXT_TOO_LONG", "Chunk extension too long"),
    /// Missing CRLF after chunk data.
    InvalidChunkData = ("INVALID_CHUNK_DATA", "Invalid chunk data"),
    /// Malformed trailer field.
    InvalidTrailer = ("INVALID_TRAILER", "Invalid trailer field"),
    /// Reserved for the embedding layer; never produced by the parser.
    ConnectionClosed = ("CONNECTION_CLOSED", "Connection closed"),
    /// API misuse, e.g. a body read outside the body states.
    Internal = ("INTERNAL", "Internal error"),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod test {
    use super::ParseError;

    #[test]
    fn names() {
        assert_eq!(ParseError::InvalidMethod.name(), "INVALID_METHOD");
        assert_eq!(ParseError::MissingHost.name(), "MISSING_HOST");
        assert_eq!(ParseError::BodyTooLarge.name(), "BODY_TOO_LARGE");
        assert_eq!(ParseError::ConnectionClosed.name(), "CONNECTION_CLOSED");
        assert_eq!(ParseError::Internal.name(), "INTERNAL");
    }

    #[test]
    fn messages() {
        assert_eq!(ParseError::InvalidMethod.message(), "Invalid HTTP method");
        assert_eq!(ParseError::Internal.message(), "Internal error");
        assert_eq!(
            ParseError::TeClConflict.to_string(),
            "Transfer-Encoding and Content-Length both present",
        );
    }

    #[test]
    fn tables_are_complete() {
        for err in ParseError::ALL {
            assert!(!err.name().is_empty());
            assert!(!err.message().is_empty());
            assert!(err.name().bytes().all(|b| b.is_ascii_uppercase() || b == b'_'));
        }
    }
}
