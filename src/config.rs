/// Parser limits and behavior toggles.
///
/// [`Config::default`] is the strict profile: CRLF-only line endings,
/// obs-fold rejected, obs-text permitted in values, leading empty lines
/// skipped, single-space request-line separators, and Transfer-Encoding +
/// Content-Length rejected as a framing conflict.
#[derive(Debug, Clone)]
pub struct Config {
    /// Declared and accumulated body size cap. Unbounded by default.
    pub max_body_size: u64,
    /// Request line cap, terminator included.
    pub max_request_line_len: usize,
    /// Field line cap, terminator included.
    pub max_header_line_len: usize,
    /// Cap on the total size of all field lines, terminators included.
    /// Trailer lines draw from the same budget.
    pub max_headers_size: usize,
    /// Cap on stored headers; applies to trailers separately.
    pub max_header_count: usize,
    /// Cap on chunk-extension bytes per chunk-size line.
    pub max_chunk_ext_len: usize,
    /// Only `\r\n` terminates a line. When off, a bare `\n` also terminates
    /// and a preceding `\r` is treated as part of the terminator.
    pub strict_crlf: bool,
    /// Reject obsolete line folding instead of skipping the folded line.
    pub reject_obs_fold: bool,
    /// Permit `0x80..=0xFF` in field values.
    pub allow_obs_text: bool,
    /// Silently consume empty lines before the request line.
    pub allow_leading_crlf: bool,
    /// Tolerate SP/HTAB runs between request-line parts and before its
    /// terminator.
    pub tolerate_spaces: bool,
    /// Reject requests carrying both Transfer-Encoding and Content-Length.
    /// When off, Transfer-Encoding wins and keep-alive is cleared.
    pub reject_te_cl_conflict: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_body_size: u64::MAX,
            max_request_line_len: 8192,
            max_header_line_len: 8192,
            max_headers_size: 65536,
            max_header_count: 100,
            max_chunk_ext_len: 1024,
            strict_crlf: true,
            reject_obs_fold: true,
            allow_obs_text: true,
            allow_leading_crlf: true,
            tolerate_spaces: false,
            reject_te_cl_conflict: true,
        }
    }
}
