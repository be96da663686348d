//! Request-line parsing.
//!
//! ```not_rust
//! request-line = method SP request-target SP HTTP-version CRLF
//! method       = token
//! ```
//!
//! The request-target form is classified syntactically; method/form
//! compatibility is enforced once the header section ends.

use super::{Parser, State, Step};
use crate::error::ParseError;
use crate::log::trace;
use crate::matches;
use crate::request::TargetForm;
use crate::span::Span;
use crate::version::Version;

impl Parser {
    pub(super) fn drive_reqline(&mut self, data: &[u8], base_off: usize) -> Step {
        let max = self.config.max_request_line_len;

        let (line_len, term) = match self.find_line_end(data) {
            Some(found) => found,
            None if data.len() >= max => return Step::Fail(ParseError::RequestLineTooLong, max),
            None => return Step::Pending,
        };
        if line_len + term > max {
            return Step::Fail(ParseError::RequestLineTooLong, max);
        }

        let line = &data[..line_len];
        let tolerate = self.config.tolerate_spaces;

        // ===== method =====

        let mut i = 0;
        while i < line.len() && matches::is_tchar(line[i]) {
            i += 1;
        }
        if i == 0 {
            return Step::Fail(ParseError::InvalidMethod, 0);
        }
        if line.get(i) != Some(&b' ') {
            return Step::Fail(ParseError::InvalidMethod, i);
        }
        let method_len = i;
        i += 1;
        if tolerate {
            while line.get(i).is_some_and(|&b| matches::is_ows(b)) {
                i += 1;
            }
        }

        // ===== request-target =====

        let target_start = i;
        while i < line.len() {
            let b = line[i];
            if b == b' ' || (tolerate && b == b'\t') {
                break;
            }
            if b <= 0x20 || b == 0x7F {
                return Step::Fail(ParseError::InvalidTarget, i);
            }
            i += 1;
        }
        let target_end = i;
        if target_start == target_end {
            return Step::Fail(ParseError::InvalidTarget, target_start);
        }
        if i == line.len() {
            return Step::Fail(ParseError::InvalidVersion, line.len());
        }
        i += 1;
        if tolerate {
            while line.get(i).is_some_and(|&b| matches::is_ows(b)) {
                i += 1;
            }
        }

        let target = &line[target_start..target_end];
        let form = match classify_target(target) {
            Ok(form) => form,
            Err((err, off)) => return Step::Fail(err, target_start + off),
        };

        // ===== HTTP-version =====

        let ver_start = i;
        let v = &line[ver_start..];
        for (k, &expect) in b"HTTP/".iter().enumerate() {
            if v.get(k) != Some(&expect) {
                return Step::Fail(ParseError::InvalidVersion, ver_start + k);
            }
        }
        let major = match v.get(5) {
            Some(&b) if matches::is_digit(b) => b,
            _ => return Step::Fail(ParseError::InvalidVersion, ver_start + 5),
        };
        if v.get(6) != Some(&b'.') {
            return Step::Fail(ParseError::InvalidVersion, ver_start + 6);
        }
        let minor = match v.get(7) {
            Some(&b) if matches::is_digit(b) => b,
            _ => return Step::Fail(ParseError::InvalidVersion, ver_start + 7),
        };
        if major != b'1' {
            return Step::Fail(ParseError::InvalidVersion, ver_start + 5);
        }

        let mut j = ver_start + 8;
        if tolerate {
            while j < line.len() && matches::is_ows(line[j]) {
                j += 1;
            }
        }
        if j < line.len() {
            return if matches!(line[j], b'\r' | b'\n') {
                Step::Fail(ParseError::InvalidCrlf, j)
            } else {
                Step::Fail(ParseError::InvalidVersion, j)
            };
        }

        // ===== commit =====

        let req = &mut self.request;
        req.method = Span::new(base_off, method_len);
        req.target = Span::new(base_off + target_start, target_end - target_start);
        req.target_form = form;
        req.version = Version::new(1, minor - b'0');
        if minor >= b'1' {
            req.flags |= crate::request::REQ_KEEP_ALIVE;
        }
        self.method_connect = &line[..method_len] == b"CONNECT";
        self.method_options = &line[..method_len] == b"OPTIONS";

        trace!(
            "request line: {:?} form {:?} version {:?}",
            req.method, req.target_form, req.version,
        );

        self.state = State::Headers;
        Step::Advance(line_len + term)
    }
}

// ===== Target forms =====

type TargetResult = Result<TargetForm, (ParseError, usize)>;

/// Classifies and validates the request-target. Offsets in errors are
/// relative to `target`; every byte is already known to be above `0x20` and
/// not DEL from the request-line scan.
fn classify_target(target: &[u8]) -> TargetResult {
    if target == b"*" {
        return Ok(TargetForm::Asterisk);
    }
    if target[0] == b'/' {
        validate_origin(target)?;
        return Ok(TargetForm::Origin);
    }
    if let Some(scheme_end) = absolute_scheme(target) {
        validate_absolute(target, scheme_end)?;
        return Ok(TargetForm::Absolute);
    }
    validate_authority(target)?;
    Ok(TargetForm::Authority)
}

/// Position of the `:` of a leading `scheme://`, if the target starts with
/// a valid scheme followed by `://`.
fn absolute_scheme(target: &[u8]) -> Option<usize> {
    let col = target.iter().position(|&b| b == b':')?;
    if col == 0 || !target[0].is_ascii_alphabetic() {
        return None;
    }
    let scheme_rest = &target[1..col];
    if !scheme_rest
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
    {
        return None;
    }
    target[col..].starts_with(b"://").then_some(col)
}

/// absolute-path [ "?" query ], no fragment.
fn validate_origin(target: &[u8]) -> Result<(), (ParseError, usize)> {
    let mut in_query = false;
    let mut i = 0;
    while i < target.len() {
        let b = target[i];
        match b {
            b'#' => return Err((ParseError::InvalidTarget, i)),
            b'%' => {
                let ok = matches!(target.get(i + 1), Some(&h) if matches::is_hexdig(h))
                    && matches!(target.get(i + 2), Some(&l) if matches::is_hexdig(l));
                if !ok {
                    return Err((ParseError::InvalidTarget, i));
                }
                i += 3;
                continue;
            }
            b'?' if !in_query => in_query = true,
            _ => {
                if !(matches::is_uri(b) || (in_query && b == b'?')) {
                    return Err((ParseError::InvalidTarget, i));
                }
            }
        }
        i += 1;
    }
    Ok(())
}

/// absolute-URI: non-empty authority after the scheme, no fragment, valid
/// percent-encoding across the whole target.
fn validate_absolute(target: &[u8], scheme_end: usize) -> Result<(), (ParseError, usize)> {
    let authority = scheme_end + 3;
    match target.get(authority) {
        None => return Err((ParseError::InvalidTarget, target.len())),
        Some(b'/' | b'?' | b'#') => return Err((ParseError::InvalidTarget, authority)),
        Some(_) => {}
    }
    let mut i = 0;
    while i < target.len() {
        match target[i] {
            b'#' => return Err((ParseError::InvalidTarget, i)),
            b'%' => {
                let ok = matches!(target.get(i + 1), Some(&h) if matches::is_hexdig(h))
                    && matches!(target.get(i + 2), Some(&l) if matches::is_hexdig(l));
                if !ok {
                    return Err((ParseError::InvalidTarget, i));
                }
                i += 3;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    Ok(())
}

/// uri-host [ ":" port ].
fn validate_authority(target: &[u8]) -> Result<(), (ParseError, usize)> {
    if target[0] == b'[' {
        let close = match target.iter().position(|&b| b == b']') {
            Some(close) => close,
            None => return Err((ParseError::InvalidTarget, target.len())),
        };
        for (i, &b) in target[1..close].iter().enumerate() {
            if !(matches::is_hexdig(b) || matches!(b, b':' | b'.')) {
                return Err((ParseError::InvalidTarget, 1 + i));
            }
        }
        match target.get(close + 1) {
            None => Ok(()),
            Some(b':') => validate_port(&target[close + 2..])
                .map_err(|off| (ParseError::InvalidTarget, close + 2 + off)),
            Some(_) => Err((ParseError::InvalidTarget, close + 1)),
        }
    } else {
        // request-line scan already excluded CTL / SP / DEL
        match target.iter().position(|&b| b == b':') {
            Some(0) => Err((ParseError::InvalidTarget, 0)),
            Some(col) => validate_port(&target[col + 1..])
                .map_err(|off| (ParseError::InvalidTarget, col + 1 + off)),
            None => Ok(()),
        }
    }
}

/// 1+ digits, value within `0..=65535`. Errors carry the offending offset.
pub(super) fn validate_port(port: &[u8]) -> Result<(), usize> {
    if port.is_empty() {
        return Err(0);
    }
    let mut value = 0u32;
    for (i, &b) in port.iter().enumerate() {
        if !matches::is_digit(b) {
            return Err(i);
        }
        value = value * 10 + (b - b'0') as u32;
        if value > 65535 {
            return Err(i);
        }
    }
    Ok(())
}
