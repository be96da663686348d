//! Known-header capture and end-of-headers validation.
//!
//! Value bytes are only addressable while their line is in the current
//! window, so per-value syntax runs the moment a known header is stored.
//! The finalize pass at the blank line performs the aggregate checks that
//! need no bytes: Host presence and multiplicity, the body-size cap, the
//! final transfer coding, the TE+CL conflict, the framing decision, and
//! method/target-form compatibility.

use super::Parser;
use crate::error::ParseError;
use crate::matches;
use crate::request::{
    BodyType, KnownHeader, REQ_EXPECT_CONTINUE, REQ_HAS_CONTENT_LENGTH, REQ_HAS_HOST,
    REQ_HAS_TRANSFER_ENCODING, REQ_HAS_UPGRADE, REQ_IS_CHUNKED, REQ_KEEP_ALIVE, TargetForm,
};
use crate::version::Version;

/// Error plus its offset into the value being examined.
type ValueError = (ParseError, usize);

impl Parser {
    /// Bookkeeping for a just-stored known header. `idx` is its position in
    /// the header list; `value` is the OWS-trimmed value bytes. Error
    /// offsets are relative to `value`.
    pub(super) fn on_known_header(
        &mut self,
        kind: KnownHeader,
        idx: usize,
        value: &[u8],
    ) -> Result<(), ValueError> {
        let slot = &mut self.request.known_idx[kind as usize];
        let first = *slot == crate::request::INDEX_NONE;
        if first {
            *slot = idx as u16;
        }

        match kind {
            KnownHeader::Host => {
                self.request.flags |= REQ_HAS_HOST;
                if first {
                    let authority_target = matches!(
                        self.request.target_form,
                        TargetForm::Absolute | TargetForm::Authority,
                    );
                    validate_host(value, authority_target)?;
                }
            }
            KnownHeader::ContentLength => {
                let parsed = parse_content_length(value)?;
                if self.request.flags & REQ_HAS_CONTENT_LENGTH != 0 {
                    if parsed != self.request.content_length {
                        return Err((ParseError::MultipleContentLength, 0));
                    }
                } else {
                    self.request.flags |= REQ_HAS_CONTENT_LENGTH;
                    self.request.content_length = parsed;
                }
            }
            KnownHeader::TransferEncoding => {
                self.request.flags |= REQ_HAS_TRANSFER_ENCODING;
                self.te_chunked_final = parse_transfer_encoding(value)?;
            }
            KnownHeader::Connection => {
                for token in list_tokens(value) {
                    if token.eq_ignore_ascii_case(b"close") {
                        self.request.flags &= !REQ_KEEP_ALIVE;
                    } else if token.eq_ignore_ascii_case(b"keep-alive") {
                        self.request.flags |= REQ_KEEP_ALIVE;
                    }
                }
            }
            KnownHeader::Expect => {
                let continue_ = list_tokens(value).any(|t| t.eq_ignore_ascii_case(b"100-continue"));
                if continue_ && self.request.version >= Version::HTTP_11 {
                    self.request.flags |= REQ_EXPECT_CONTINUE;
                }
            }
            KnownHeader::Upgrade => {
                self.request.flags |= REQ_HAS_UPGRADE;
            }
        }

        Ok(())
    }

    /// Runs exactly once, when the blank line ending the header section is
    /// consumed.
    pub(super) fn finalize(&mut self) -> Result<(), ParseError> {
        let req = &mut self.request;

        // Host: required from HTTP/1.1 on, and at most one
        if req.version >= Version::HTTP_11 && req.flags & REQ_HAS_HOST == 0 {
            return Err(ParseError::MissingHost);
        }
        let host_id = KnownHeader::Host as u16;
        if req.headers.iter().filter(|h| h.name_id == host_id).count() > 1 {
            return Err(ParseError::MultipleHost);
        }

        let has_cl = req.flags & REQ_HAS_CONTENT_LENGTH != 0;
        let has_te = req.flags & REQ_HAS_TRANSFER_ENCODING != 0;

        if has_cl && req.content_length > self.config.max_body_size {
            return Err(ParseError::BodyTooLarge);
        }

        if has_te && !self.te_chunked_final {
            return Err(ParseError::TeNotChunkedFinal);
        }

        // framing decision; requests are never close-delimited
        if has_te && has_cl {
            if self.config.reject_te_cl_conflict {
                return Err(ParseError::TeClConflict);
            }
            // honor Transfer-Encoding, and close the connection afterwards
            req.body_type = BodyType::Chunked;
            req.flags |= REQ_IS_CHUNKED;
            req.flags &= !REQ_KEEP_ALIVE;
        } else if has_te {
            req.body_type = BodyType::Chunked;
            req.flags |= REQ_IS_CHUNKED;
        } else if has_cl {
            req.body_type = BodyType::ContentLength;
        } else {
            req.body_type = BodyType::None;
        }

        // method/target-form compatibility
        let form_ok = match req.target_form {
            TargetForm::Authority => self.method_connect,
            TargetForm::Asterisk => self.method_options,
            TargetForm::Origin | TargetForm::Absolute => !self.method_connect,
        };
        if !form_ok {
            return Err(ParseError::InvalidTarget);
        }

        Ok(())
    }
}

// ===== Value scanners =====

fn trim_ows(mut bytes: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = bytes {
        bytes = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = bytes {
        bytes = rest;
    }
    bytes
}

/// Non-empty, OWS-trimmed elements of a comma-separated list.
fn list_tokens(value: &[u8]) -> impl Iterator<Item = &[u8]> {
    value
        .split(|&b| b == b',')
        .map(trim_ows)
        .filter(|t| !t.is_empty())
}

/// Content-Length: 1+ digits, surrounding OWS tolerated, no sign. A comma
/// list is accepted when every element carries the same value.
fn parse_content_length(value: &[u8]) -> Result<u64, ValueError> {
    let mut first: Option<u64> = None;
    let mut i = 0;
    loop {
        while i < value.len() && matches::is_ows(value[i]) {
            i += 1;
        }
        let start = i;
        let mut parsed: u64 = 0;
        while i < value.len() && matches::is_digit(value[i]) {
            let d = (value[i] - b'0') as u64;
            if parsed > (u64::MAX - d) / 10 {
                return Err((ParseError::ContentLengthOverflow, i));
            }
            parsed = parsed * 10 + d;
            i += 1;
        }
        if i == start {
            return Err((ParseError::InvalidContentLength, i));
        }
        while i < value.len() && matches::is_ows(value[i]) {
            i += 1;
        }

        match first {
            None => first = Some(parsed),
            Some(seen) if seen != parsed => {
                return Err((ParseError::MultipleContentLength, start));
            }
            Some(_) => {}
        }

        if i == value.len() {
            // `first` is set: the loop cannot reach here without one element
            return Ok(first.unwrap_or(0));
        }
        if value[i] != b',' {
            return Err((ParseError::InvalidContentLength, i));
        }
        i += 1;
    }
}

/// Transfer-Encoding: comma-separated codings, BWS skipped, parameters
/// allowed on everything but `chunked`. Returns whether the last coding in
/// this line was `chunked`.
fn parse_transfer_encoding(value: &[u8]) -> Result<bool, ValueError> {
    let mut last_chunked: Option<bool> = None;
    let mut i = 0;

    loop {
        while i < value.len() && matches::is_ows(value[i]) {
            i += 1;
        }
        if i == value.len() {
            break;
        }
        if value[i] == b',' {
            // empty list element
            i += 1;
            continue;
        }

        let start = i;
        while i < value.len() && matches::is_tchar(value[i]) {
            i += 1;
        }
        if i == start {
            return Err((ParseError::InvalidTransferEncoding, i));
        }
        let token = &value[start..i];
        let chunked = token.eq_ignore_ascii_case(b"chunked");
        let known = chunked
            || token.eq_ignore_ascii_case(b"gzip")
            || token.eq_ignore_ascii_case(b"deflate")
            || token.eq_ignore_ascii_case(b"compress")
            || token.eq_ignore_ascii_case(b"identity");
        if !known {
            return Err((ParseError::UnknownTransferCoding, start));
        }
        last_chunked = Some(chunked);

        while i < value.len() && matches::is_ows(value[i]) {
            i += 1;
        }
        if i == value.len() {
            break;
        }
        match value[i] {
            b',' => i += 1,
            b';' => {
                if chunked {
                    return Err((ParseError::InvalidTransferEncoding, i));
                }
                i = skip_te_params(value, i)?;
            }
            _ => return Err((ParseError::InvalidTransferEncoding, i)),
        }
    }

    match last_chunked {
        Some(chunked) => Ok(chunked),
        None => Err((ParseError::InvalidTransferEncoding, 0)),
    }
}

/// Skips `;`-separated transfer parameters up to the next list comma,
/// honoring quoted-strings so a quoted comma does not split the list.
fn skip_te_params(value: &[u8], mut i: usize) -> Result<usize, ValueError> {
    while i < value.len() {
        match value[i] {
            b',' => return Ok(i + 1),
            b'"' => {
                i += 1;
                loop {
                    match value.get(i) {
                        None => return Err((ParseError::InvalidTransferEncoding, i)),
                        Some(b'\\') => i += 2,
                        Some(b'"') => {
                            i += 1;
                            break;
                        }
                        Some(_) => i += 1,
                    }
                }
            }
            _ => i += 1,
        }
    }
    Ok(i)
}

/// Host value: `uri-host [ ":" port ]`. Empty is accepted only when the
/// request target carries no authority of its own.
fn validate_host(value: &[u8], authority_target: bool) -> Result<(), ValueError> {
    if value.is_empty() {
        return if authority_target {
            Err((ParseError::InvalidHost, 0))
        } else {
            Ok(())
        };
    }

    if value[0] == b'[' {
        let close = match value.iter().position(|&b| b == b']') {
            Some(close) if close > 1 => close,
            Some(close) => return Err((ParseError::InvalidHost, close)),
            None => return Err((ParseError::InvalidHost, value.len())),
        };
        for (i, &b) in value[1..close].iter().enumerate() {
            if !(matches::is_hexdig(b) || matches!(b, b':' | b'.')) {
                return Err((ParseError::InvalidHost, 1 + i));
            }
        }
        return match value.get(close + 1) {
            None => Ok(()),
            Some(b':') => super::reqline::validate_port(&value[close + 2..])
                .map_err(|off| (ParseError::InvalidHost, close + 2 + off)),
            Some(_) => Err((ParseError::InvalidHost, close + 1)),
        };
    }

    let col = value.iter().position(|&b| b == b':');
    let host = &value[..col.unwrap_or(value.len())];
    if host.is_empty() {
        return Err((ParseError::InvalidHost, 0));
    }
    for (i, &b) in host.iter().enumerate() {
        if b <= 0x20 || b == 0x7F {
            return Err((ParseError::InvalidHost, i));
        }
    }
    match col {
        Some(col) => super::reqline::validate_port(&value[col + 1..])
            .map_err(|off| (ParseError::InvalidHost, col + 1 + off)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn content_length_plain() {
        assert_eq!(parse_content_length(b"0"), Ok(0));
        assert_eq!(parse_content_length(b"5"), Ok(5));
        assert_eq!(parse_content_length(b"18446744073709551615"), Ok(u64::MAX));
        assert_eq!(parse_content_length(b" 42 "), Ok(42));
    }

    #[test]
    fn content_length_rejects_sign_and_junk() {
        assert_eq!(
            parse_content_length(b"+5"),
            Err((ParseError::InvalidContentLength, 0)),
        );
        assert_eq!(
            parse_content_length(b"-5"),
            Err((ParseError::InvalidContentLength, 0)),
        );
        assert_eq!(
            parse_content_length(b"5x"),
            Err((ParseError::InvalidContentLength, 1)),
        );
        assert_eq!(
            parse_content_length(b""),
            Err((ParseError::InvalidContentLength, 0)),
        );
    }

    #[test]
    fn content_length_overflow() {
        assert_eq!(
            parse_content_length(b"18446744073709551616"),
            Err((ParseError::ContentLengthOverflow, 19)),
        );
        assert_eq!(
            parse_content_length(b"99999999999999999999999"),
            Err((ParseError::ContentLengthOverflow, 19)),
        );
    }

    #[test]
    fn content_length_comma_list() {
        assert_eq!(parse_content_length(b"5, 5"), Ok(5));
        assert_eq!(parse_content_length(b"5 , 5 ,5"), Ok(5));
        assert_eq!(
            parse_content_length(b"5, 6"),
            Err((ParseError::MultipleContentLength, 4)),
        );
        assert_eq!(
            parse_content_length(b"5,"),
            Err((ParseError::InvalidContentLength, 2)),
        );
    }

    #[test]
    fn transfer_encoding_single() {
        assert_eq!(parse_transfer_encoding(b"chunked"), Ok(true));
        assert_eq!(parse_transfer_encoding(b"Chunked"), Ok(true));
        assert_eq!(parse_transfer_encoding(b"gzip"), Ok(false));
    }

    #[test]
    fn transfer_encoding_list() {
        assert_eq!(parse_transfer_encoding(b"gzip, chunked"), Ok(true));
        assert_eq!(parse_transfer_encoding(b"chunked, gzip"), Ok(false));
        assert_eq!(parse_transfer_encoding(b"gzip , deflate,chunked"), Ok(true));
        assert_eq!(parse_transfer_encoding(b",chunked,"), Ok(true));
    }

    #[test]
    fn transfer_encoding_params() {
        // parameters ride on non-chunked codings only
        assert_eq!(parse_transfer_encoding(b"gzip;q=1, chunked"), Ok(true));
        assert_eq!(parse_transfer_encoding(b"gzip;a=\"b,c\", chunked"), Ok(true));
        assert_eq!(
            parse_transfer_encoding(b"chunked;x=1"),
            Err((ParseError::InvalidTransferEncoding, 7)),
        );
        assert_eq!(
            parse_transfer_encoding(b"gzip;a=\"open"),
            Err((ParseError::InvalidTransferEncoding, 12)),
        );
    }

    #[test]
    fn transfer_encoding_unknown() {
        assert_eq!(
            parse_transfer_encoding(b"br, chunked"),
            Err((ParseError::UnknownTransferCoding, 0)),
        );
        assert_eq!(
            parse_transfer_encoding(b"gzip, snappy"),
            Err((ParseError::UnknownTransferCoding, 6)),
        );
    }

    #[test]
    fn transfer_encoding_empty() {
        assert_eq!(
            parse_transfer_encoding(b""),
            Err((ParseError::InvalidTransferEncoding, 0)),
        );
        assert_eq!(
            parse_transfer_encoding(b" , "),
            Err((ParseError::InvalidTransferEncoding, 0)),
        );
    }

    #[test]
    fn host_plain() {
        assert!(validate_host(b"example.com", false).is_ok());
        assert!(validate_host(b"example.com:8080", false).is_ok());
        assert!(validate_host(b"example.com:0", false).is_ok());
        assert!(validate_host(b"h", false).is_ok());
    }

    #[test]
    fn host_rejects_bad_port() {
        assert!(validate_host(b"example.com:", false).is_err());
        assert!(validate_host(b"example.com:x", false).is_err());
        assert!(validate_host(b"example.com:65536", false).is_err());
        assert!(validate_host(b"example.com:8080:1", false).is_err());
    }

    #[test]
    fn host_ipv6() {
        assert!(validate_host(b"[::1]", false).is_ok());
        assert!(validate_host(b"[2001:db8::1]:443", false).is_ok());
        assert!(validate_host(b"[::ffff:127.0.0.1]", false).is_ok());
        assert!(validate_host(b"[::1", false).is_err());
        assert!(validate_host(b"[]", false).is_err());
        assert!(validate_host(b"[::1]x", false).is_err());
        assert!(validate_host(b"[g::1]", false).is_err());
    }

    #[test]
    fn host_empty() {
        assert!(validate_host(b"", false).is_ok());
        assert_eq!(validate_host(b"", true), Err((ParseError::InvalidHost, 0)));
    }

    #[test]
    fn host_rejects_sp_and_del() {
        assert!(validate_host(b"exa mple", false).is_err());
        assert!(validate_host(b"exa\x7Fmple", false).is_err());
        assert!(validate_host(b":80", false).is_err());
    }
}
