//! Scanner primitives.
//!
//! [`find_crlf`] and [`find_byte`] dominate parser throughput. Each has four
//! implementations (scalar, 16-byte, 32-byte, 64-byte) behind a runtime
//! dispatch level detected once per process: the widest vector width that is
//! both advertised by the CPU and usable from the OS is selected, everything
//! else falls back to the scalar loop. The tail of every vector scan (length
//! below the vector width) also falls through to the scalar loop.

use std::sync::atomic::{AtomicU8, Ordering};

mod scalar;

#[cfg(target_arch = "x86_64")]
mod sse42;
#[cfg(target_arch = "x86_64")]
mod avx2;
#[cfg(target_arch = "x86_64")]
mod avx512;

#[cfg(test)]
mod test;

// ===== Dispatch level =====

/// Vector width selected for the scanner primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    /// One byte per step.
    Scalar = 0,
    /// 16 bytes per compare.
    Sse42 = 1,
    /// 32 bytes per compare.
    Avx2 = 2,
    /// 64 bytes per compare.
    Avx512 = 3,
}

const LEVEL_UNINIT: u8 = u8::MAX;

static LEVEL: AtomicU8 = AtomicU8::new(LEVEL_UNINIT);

/// Returns the process-wide dispatch level, detecting it on first use.
///
/// Racing first calls all compute the same value, so the store ordering is
/// the only synchronization required.
#[inline]
pub fn level() -> Level {
    match LEVEL.load(Ordering::Acquire) {
        LEVEL_UNINIT => init_level(),
        raw => Level::from_raw(raw),
    }
}

#[cold]
fn init_level() -> Level {
    let level = detect();
    LEVEL.store(level as u8, Ordering::Release);
    level
}

impl Level {
    fn from_raw(raw: u8) -> Level {
        match raw {
            1 => Level::Sse42,
            2 => Level::Avx2,
            3 => Level::Avx512,
            _ => Level::Scalar,
        }
    }

    /// Whether this level can run on the current CPU.
    #[cfg(test)]
    pub(crate) fn runtime_supported(self) -> bool {
        self <= detect()
    }
}

#[cfg(target_arch = "x86_64")]
fn detect() -> Level {
    if is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512bw") {
        Level::Avx512
    } else if is_x86_feature_detected!("avx2") {
        Level::Avx2
    } else if is_x86_feature_detected!("sse4.2") {
        Level::Sse42
    } else {
        Level::Scalar
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn detect() -> Level {
    Level::Scalar
}

// ===== Entry points =====

/// Returns the position of the `\r` of the first `\r\n` pair.
///
/// A lone `\r` as the final byte is not a match: the `\n` may still arrive
/// in the next read.
#[inline]
pub fn find_crlf(data: &[u8]) -> Option<usize> {
    find_crlf_at(level(), data)
}

/// Returns the position of the first byte equal to `byte`.
#[inline]
pub fn find_byte(data: &[u8], byte: u8) -> Option<usize> {
    find_byte_at(level(), data, byte)
}

pub(crate) fn find_crlf_at(level: Level, data: &[u8]) -> Option<usize> {
    match level {
        Level::Scalar => scalar::find_crlf(data),
        // SAFETY: non-scalar levels are only produced by `detect`, which
        // verified the matching CPU feature at runtime
        #[cfg(target_arch = "x86_64")]
        Level::Sse42 => unsafe { sse42::find_crlf(data) },
        #[cfg(target_arch = "x86_64")]
        Level::Avx2 => unsafe { avx2::find_crlf(data) },
        #[cfg(target_arch = "x86_64")]
        Level::Avx512 => unsafe { avx512::find_crlf(data) },
        #[cfg(not(target_arch = "x86_64"))]
        _ => scalar::find_crlf(data),
    }
}

pub(crate) fn find_byte_at(level: Level, data: &[u8], byte: u8) -> Option<usize> {
    match level {
        Level::Scalar => scalar::find_byte(data, byte),
        // SAFETY: non-scalar levels are only produced by `detect`, which
        // verified the matching CPU feature at runtime
        #[cfg(target_arch = "x86_64")]
        Level::Sse42 => unsafe { sse42::find_byte(data, byte) },
        #[cfg(target_arch = "x86_64")]
        Level::Avx2 => unsafe { avx2::find_byte(data, byte) },
        #[cfg(target_arch = "x86_64")]
        Level::Avx512 => unsafe { avx512::find_byte(data, byte) },
        #[cfg(not(target_arch = "x86_64"))]
        _ => scalar::find_byte(data, byte),
    }
}
