/// Bytes stripped when no explicit set is given.
pub const WHITESPACE: &[u8] = b" \t\r\n\x0c\x0b";

#[inline]
pub(crate) fn is_space(byte: u8) -> bool {
    byte == b' ' || (b'\t'..=b'\r').contains(&byte)
}

#[inline]
pub(crate) fn is_digit(byte: u8) -> bool {
    byte.is_ascii_digit()
}

#[inline]
pub(crate) fn is_alpha(byte: u8) -> bool {
    byte.is_ascii_alphabetic()
}

/// True when `bytes` is non-empty and every byte satisfies `pred`.
#[inline]
pub(crate) fn all_nonempty(bytes: &[u8], pred: impl Fn(u8) -> bool) -> bool {
    !bytes.is_empty() && bytes.iter().all(|&b| pred(b))
}

/// Bounds `(lpos, rpos)` of `bytes` once the requested ends are trimmed of
/// every byte in `chars`.
pub(crate) fn strip_bounds(bytes: &[u8], chars: &[u8], left: bool, right: bool) -> (usize, usize) {
    let mut set = [false; 256];
    for &c in chars {
        set[c as usize] = true;
    }
    let mut lpos = 0;
    let mut rpos = bytes.len();
    if left {
        while lpos < rpos && set[bytes[lpos] as usize] {
            lpos += 1;
        }
    }
    if right {
        while rpos > lpos && set[bytes[rpos - 1] as usize] {
            rpos -= 1;
        }
    }
    (lpos, rpos)
}
