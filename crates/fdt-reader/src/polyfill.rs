// polyfill of unstable rust feature `ptr_is_aligned_to` <https://github.com/rust-lang/rust/issues/96284>
pub(crate) fn ptr_is_aligned_to<T>(ptr: *const T, align: usize) -> bool {
    assert!(align.is_power_of_two());
    (ptr.addr() & (align - 1)) == 0
}

// polyfill of unstable rust feature `slice_split_once` <https://github.com/rust-lang/rust/issues/112811>
pub(crate) fn slice_split_once<P, T>(s: &[T], pred: P) -> Option<(&[T], &[T])>
where
    P: FnMut(&T) -> bool,
{
    let pos = s.iter().position(pred)?;
    Some((&s[..pos], &s[pos + 1..]))
}

// polyfill of unstable rust feature `slice_split_once` <https://github.com/rust-lang/rust/issues/112811>
pub(crate) fn slice_rsplit_once<P, T>(s: &[T], pred: P) -> Option<(&[T], &[T])>
where
    P: FnMut(&T) -> bool,
{
    let pos = s.iter().rposition(pred)?;
    Some((&s[..pos], &s[pos + 1..]))
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_once() {
        assert_eq!(
            slice_split_once(b"serial0/tty", |&b| b == b'/'),
            Some((&b"serial0"[..], &b"tty"[..]))
        );
        assert_eq!(slice_split_once(b"serial0", |&b| b == b'/'), None);
    }

    #[test]
    fn test_rsplit_once() {
        assert_eq!(
            slice_rsplit_once(b"/soc/uart@1000", |&b| b == b'/'),
            Some((&b"/soc"[..], &b"uart@1000"[..]))
        );
        assert_eq!(
            slice_rsplit_once(b"/", |&b| b == b'/'),
            Some((&b""[..], &b""[..]))
        );
    }

    #[test]
    fn test_ptr_is_aligned_to() {
        let words = [0_u64; 2];
        let ptr = words.as_ptr().cast::<u8>();
        assert!(ptr_is_aligned_to(ptr, 8));
        assert!(!ptr_is_aligned_to(ptr.wrapping_add(4), 8));
        assert!(ptr_is_aligned_to(ptr.wrapping_add(4), 4));
    }
}
