//! 64-byte scans.

use core::arch::x86_64::*;

use super::scalar;

const WIDTH: usize = 64;

#[target_feature(enable = "avx512f,avx512bw")]
pub(super) fn find_byte(data: &[u8], byte: u8) -> Option<usize> {
    let len = data.len();
    let ptr = data.as_ptr();
    let needle = _mm512_set1_epi8(byte as i8);

    let mut i = 0;
    while i + WIDTH <= len {
        // SAFETY: `i + WIDTH <= len` keeps the unaligned load in bounds
        let block = unsafe { _mm512_loadu_si512(ptr.add(i).cast()) };
        let mask: u64 = _mm512_cmpeq_epi8_mask(block, needle);
        if mask != 0 {
            return Some(i + mask.trailing_zeros() as usize);
        }
        i += WIDTH;
    }

    scalar::find_byte(&data[i..], byte).map(|n| i + n)
}

#[target_feature(enable = "avx512f,avx512bw")]
pub(super) fn find_crlf(data: &[u8]) -> Option<usize> {
    let len = data.len();
    let ptr = data.as_ptr();
    let cr = _mm512_set1_epi8(b'\r' as i8);

    let mut i = 0;
    while i + WIDTH <= len {
        // SAFETY: `i + WIDTH <= len` keeps the unaligned load in bounds
        let block = unsafe { _mm512_loadu_si512(ptr.add(i).cast()) };
        let mut mask: u64 = _mm512_cmpeq_epi8_mask(block, cr);
        while mask != 0 {
            let at = i + mask.trailing_zeros() as usize;
            match data.get(at + 1) {
                Some(b'\n') => return Some(at),
                Some(_) => {}
                None => return None,
            }
            mask &= mask - 1;
        }
        i += WIDTH;
    }

    scalar::find_crlf(&data[i..]).map(|n| i + n)
}
