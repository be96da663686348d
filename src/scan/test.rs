use super::{Level, find_byte, find_byte_at, find_crlf, find_crlf_at, level};

const LEVELS: [Level; 4] = [Level::Scalar, Level::Sse42, Level::Avx2, Level::Avx512];

fn supported() -> impl Iterator<Item = Level> {
    LEVELS.into_iter().filter(|l| l.runtime_supported())
}

#[test]
fn level_is_stable() {
    let first = level();
    assert_eq!(level(), first);
    assert!(first.runtime_supported());
}

#[test]
fn crlf_basic() {
    assert_eq!(find_crlf(b""), None);
    assert_eq!(find_crlf(b"\r\n"), Some(0));
    assert_eq!(find_crlf(b"abc"), None);
    assert_eq!(find_crlf(b"abc\r\ndef"), Some(3));
    assert_eq!(find_crlf(b"\rabc\r\n"), Some(4));
}

#[test]
fn crlf_lone_cr_at_end_is_not_a_match() {
    assert_eq!(find_crlf(b"\r"), None);
    assert_eq!(find_crlf(b"abc\r"), None);
    for l in supported() {
        assert_eq!(find_crlf_at(l, b"abc\r"), None, "{l:?}");
    }
}

#[test]
fn crlf_cr_without_lf_is_skipped() {
    assert_eq!(find_crlf(b"a\rb\r\nc"), Some(3));
    assert_eq!(find_crlf(b"\r\rx"), None);
    assert_eq!(find_crlf(b"\r\r\n"), Some(1));
}

#[test]
fn byte_basic() {
    assert_eq!(find_byte(b"", b':'), None);
    assert_eq!(find_byte(b"abc", b':'), None);
    assert_eq!(find_byte(b"a:b:c", b':'), Some(1));
    assert_eq!(find_byte(b":rest", b':'), Some(0));
}

// Every width boundary: the pair sits before, across, and after each block
// edge of the widest implementation.
#[test]
fn crlf_at_every_position() {
    for pos in 0..200 {
        let mut buf = vec![b'a'; pos + 2];
        buf[pos] = b'\r';
        buf[pos + 1] = b'\n';
        for l in supported() {
            assert_eq!(find_crlf_at(l, &buf), Some(pos), "{l:?} pos {pos}");
        }
    }
}

#[test]
fn byte_at_every_position() {
    for pos in 0..200 {
        let mut buf = vec![b'a'; pos + 1];
        buf[pos] = b':';
        for l in supported() {
            assert_eq!(find_byte_at(l, &buf, b':'), Some(pos), "{l:?} pos {pos}");
        }
    }
}

#[test]
fn crlf_pair_across_block_edges() {
    // '\r' as the last byte of a block, '\n' as the first of the next
    for edge in [16usize, 32, 64, 128] {
        let mut buf = vec![b'x'; edge + 8];
        buf[edge - 1] = b'\r';
        buf[edge] = b'\n';
        for l in supported() {
            assert_eq!(find_crlf_at(l, &buf), Some(edge - 1), "{l:?} edge {edge}");
        }
    }
}

// The scanner consistency law: all implementations agree on random input.
mod laws {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn levels_agree_on_random_buffers(
            bytes in proptest::collection::vec(
                prop_oneof![Just(b'\r'), Just(b'\n'), Just(b':'), any::<u8>()],
                0..300,
            ),
        ) {
            let crlf = find_crlf_at(Level::Scalar, &bytes);
            let colon = find_byte_at(Level::Scalar, &bytes, b':');
            for l in supported() {
                prop_assert_eq!(find_crlf_at(l, &bytes), crlf, "{:?}", l);
                prop_assert_eq!(find_byte_at(l, &bytes, b':'), colon, "{:?}", l);
            }
        }
    }
}

// All implementations agree on adversarial buffers full of near-miss bytes.
#[test]
fn levels_agree() {
    let mut buf = Vec::new();
    for i in 0..512u32 {
        buf.push(match i % 7 {
            0 => b'\r',
            1 => b'a',
            2 => b'\n',
            3 => b'\r',
            4 => b':',
            _ => (i % 251) as u8,
        });
    }
    for end in 0..buf.len() {
        let window = &buf[..end];
        let crlf = find_crlf_at(Level::Scalar, window);
        let colon = find_byte_at(Level::Scalar, window, b':');
        for l in supported() {
            assert_eq!(find_crlf_at(l, window), crlf, "{l:?} end {end}");
            assert_eq!(find_byte_at(l, window, b':'), colon, "{l:?} end {end}");
        }
    }
}
