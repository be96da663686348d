//! Parsed request container.

use crate::span::Span;
use crate::version::Version;

// ===== Request flags =====

pub const REQ_KEEP_ALIVE: u16 = 1 << 0;
pub const REQ_EXPECT_CONTINUE: u16 = 1 << 1;
pub const REQ_HAS_UPGRADE: u16 = 1 << 2;
pub const REQ_HAS_HOST: u16 = 1 << 3;
pub const REQ_HAS_CONTENT_LENGTH: u16 = 1 << 4;
pub const REQ_HAS_TRANSFER_ENCODING: u16 = 1 << 5;
pub const REQ_IS_CHUNKED: u16 = 1 << 6;

/// Header flag: the name matched one of the known headers.
pub const HEADER_KNOWN_NAME: u16 = 1 << 0;

/// `name_id` / `known_idx` sentinel for "absent".
pub const INDEX_NONE: u16 = u16::MAX;

// ===== Known headers =====

/// The six headers whose semantics the parser itself interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum KnownHeader {
    Host = 0,
    ContentLength = 1,
    TransferEncoding = 2,
    Connection = 3,
    Expect = 4,
    Upgrade = 5,
}

pub(crate) const KNOWN_HEADER_COUNT: usize = 6;

pub(crate) const KNOWN_HEADER_NAMES: [(&[u8], KnownHeader); KNOWN_HEADER_COUNT] = [
    (b"host", KnownHeader::Host),
    (b"content-length", KnownHeader::ContentLength),
    (b"transfer-encoding", KnownHeader::TransferEncoding),
    (b"connection", KnownHeader::Connection),
    (b"expect", KnownHeader::Expect),
    (b"upgrade", KnownHeader::Upgrade),
];

impl KnownHeader {
    fn from_id(id: u16) -> Option<KnownHeader> {
        match id {
            0 => Some(KnownHeader::Host),
            1 => Some(KnownHeader::ContentLength),
            2 => Some(KnownHeader::TransferEncoding),
            3 => Some(KnownHeader::Connection),
            4 => Some(KnownHeader::Expect),
            5 => Some(KnownHeader::Upgrade),
            _ => None,
        }
    }
}

// ===== Header =====

/// One stored field line: name and value spans plus the known-header id.
#[derive(Debug, Clone, Copy, Default)]
pub struct Header {
    pub name: Span,
    pub value: Span,
    /// [`KnownHeader`] discriminant, or [`INDEX_NONE`].
    pub name_id: u16,
    pub flags: u16,
}

impl Header {
    pub(crate) fn new(name: Span, value: Span, known: Option<KnownHeader>) -> Header {
        match known {
            Some(id) => Header {
                name,
                value,
                name_id: id as u16,
                flags: HEADER_KNOWN_NAME,
            },
            None => Header {
                name,
                value,
                name_id: INDEX_NONE,
                flags: 0,
            },
        }
    }

    /// The known header this name matched, if any.
    #[inline]
    pub fn known(&self) -> Option<KnownHeader> {
        KnownHeader::from_id(self.name_id)
    }
}

// ===== Target / body classification =====

/// Request-target form of RFC 9112 §3.2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetForm {
    #[default]
    Origin,
    Absolute,
    Authority,
    Asterisk,
}

/// Body framing decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyType {
    /// No message body.
    #[default]
    None,
    /// Identity body of `content_length` bytes.
    ContentLength,
    /// Chunked transfer coding.
    Chunked,
}

// ===== Request =====

/// One fully- or partially-parsed request.
///
/// Spans resolve against the buffers that produced them; see [`Span`].
#[derive(Debug, Default)]
pub struct Request {
    pub method: Span,
    pub target: Span,
    /// Valid when `body_type` is [`BodyType::ContentLength`].
    pub content_length: u64,
    pub version: Version,
    pub target_form: TargetForm,
    pub body_type: BodyType,
    pub flags: u16,
    /// Index into `headers` of the first occurrence of each known header,
    /// or [`INDEX_NONE`].
    pub known_idx: [u16; KNOWN_HEADER_COUNT],
    pub(crate) headers: Vec<Header>,
    pub(crate) trailers: Vec<Header>,
}

impl Request {
    pub(crate) fn new() -> Request {
        Request {
            known_idx: [INDEX_NONE; KNOWN_HEADER_COUNT],
            headers: Vec::with_capacity(16),
            trailers: Vec::with_capacity(8),
            ..Request::default()
        }
    }

    /// Clears parse results, keeping the header and trailer capacity.
    pub(crate) fn reset(&mut self) {
        self.method = Span::default();
        self.target = Span::default();
        self.content_length = 0;
        self.version = Version::default();
        self.target_form = TargetForm::default();
        self.body_type = BodyType::default();
        self.flags = 0;
        self.known_idx = [INDEX_NONE; KNOWN_HEADER_COUNT];
        self.headers.clear();
        self.trailers.clear();
    }

    /// Header fields in insertion order.
    #[inline]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Trailer fields in insertion order, never merged into `headers`.
    #[inline]
    pub fn trailers(&self) -> &[Header] {
        &self.trailers
    }

    #[inline]
    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    #[inline]
    pub fn trailer_count(&self) -> usize {
        self.trailers.len()
    }

    /// First occurrence of a known header, by the stored index.
    pub fn known_header(&self, kind: KnownHeader) -> Option<&Header> {
        match self.known_idx[kind as usize] {
            INDEX_NONE => None,
            idx => self.headers.get(idx as usize),
        }
    }

    /// Case-insensitive linear lookup; returns the index of the first
    /// header whose name equals `name`.
    pub fn find(&self, base: &[u8], name: &[u8]) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.name.eq_ignore_ascii_case(base, name))
    }

    // ===== Flags =====

    #[inline]
    pub fn keep_alive(&self) -> bool {
        self.flags & REQ_KEEP_ALIVE != 0
    }

    #[inline]
    pub fn expect_continue(&self) -> bool {
        self.flags & REQ_EXPECT_CONTINUE != 0
    }

    #[inline]
    pub fn has_upgrade(&self) -> bool {
        self.flags & REQ_HAS_UPGRADE != 0
    }

    #[inline]
    pub fn has_host(&self) -> bool {
        self.flags & REQ_HAS_HOST != 0
    }

    #[inline]
    pub fn has_content_length(&self) -> bool {
        self.flags & REQ_HAS_CONTENT_LENGTH != 0
    }

    #[inline]
    pub fn has_transfer_encoding(&self) -> bool {
        self.flags & REQ_HAS_TRANSFER_ENCODING != 0
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        self.flags & REQ_IS_CHUNKED != 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn header(base: &[u8], name: &[u8], known: Option<KnownHeader>) -> Header {
        let off = base
            .windows(name.len())
            .position(|w| w == name)
            .expect("name not in base");
        Header::new(Span::new(off, name.len()), Span::default(), known)
    }

    #[test]
    fn find_is_case_insensitive() {
        let base = b"Host: a\r\nContent-Type: b\r\nConnection: c\r\n";
        let mut req = Request::new();
        req.headers.push(header(base, b"Host", Some(KnownHeader::Host)));
        req.headers.push(header(base, b"Content-Type", None));
        req.headers
            .push(header(base, b"Connection", Some(KnownHeader::Connection)));

        assert_eq!(req.find(base, b"host"), Some(0));
        assert_eq!(req.find(base, b"HOST"), Some(0));
        assert_eq!(req.find(base, b"content-type"), Some(1));
        assert_eq!(req.find(base, b"connection"), Some(2));
        assert_eq!(req.find(base, b"x-missing"), None);
        assert_eq!(req.find(base, b"accept"), None);
    }

    #[test]
    fn find_empty() {
        let req = Request::new();
        assert_eq!(req.find(b"", b"host"), None);
    }

    #[test]
    fn known_id_round_trip() {
        let h = Header::new(Span::default(), Span::default(), Some(KnownHeader::Expect));
        assert_eq!(h.known(), Some(KnownHeader::Expect));
        assert_eq!(h.flags & HEADER_KNOWN_NAME, HEADER_KNOWN_NAME);

        let other = Header::new(Span::default(), Span::default(), None);
        assert_eq!(other.known(), None);
        assert_eq!(other.name_id, INDEX_NONE);
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut req = Request::new();
        for _ in 0..40 {
            req.headers.push(Header::default());
        }
        let cap = req.headers.capacity();
        req.flags = REQ_KEEP_ALIVE | REQ_HAS_HOST;
        req.reset();
        assert_eq!(req.headers.len(), 0);
        assert_eq!(req.headers.capacity(), cap);
        assert_eq!(req.flags, 0);
        assert_eq!(req.known_idx, [INDEX_NONE; KNOWN_HEADER_COUNT]);
    }
}
