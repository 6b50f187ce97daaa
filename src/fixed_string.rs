//! FixedString: an inline, fixed-capacity UTF-8 buffer.
//!
//! Writes that do not fit are truncated at the last whole character instead
//! of failing. Hashing and comparison go through `&str`, so a `FixedString`
//! key can be looked up with a plain `&str`.

use crate::error::FixedStringError;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;

#[derive(Copy, Clone)]
pub struct FixedString<const N: usize> {
    buf: [u8; N],
    len: usize,
}

/// Longest prefix of `s` no longer than `room` bytes that ends on a char boundary.
fn fit(s: &str, room: usize) -> &str {
    if s.len() <= room {
        return s;
    }
    let mut end = room;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl<const N: usize> FixedString<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
        }
    }

    /// Build from formatting arguments; see [`format`](Self::format).
    pub fn from_fmt(args: fmt::Arguments<'_>) -> Result<Self, FixedStringError> {
        let mut s = Self::new();
        s.format(args)?;
        Ok(s)
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn remaining(&self) -> usize {
        N - self.len
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: every write copies whole characters out of a `&str`, so
        // `buf[..len]` is always valid UTF-8.
        unsafe { core::str::from_utf8_unchecked(&self.buf[..self.len]) }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Replace the contents with `s`, truncating to capacity.
    pub fn copy_from(&mut self, s: &str) {
        self.clear();
        self.concat(s);
    }

    /// Append `s`, truncating to the remaining capacity.
    pub fn concat(&mut self, s: &str) {
        let s = fit(s, self.remaining());
        self.buf[self.len..self.len + s.len()].copy_from_slice(s.as_bytes());
        self.len += s.len();
    }

    /// Append one character if it fits whole.
    pub fn push(&mut self, c: char) {
        let mut tmp = [0u8; 4];
        self.concat(c.encode_utf8(&mut tmp));
    }

    /// Lowercase hex digits of `bytes`, two per byte. Bytes whose two
    /// digits no longer fit are dropped.
    pub fn from_hex_bytes(bytes: &[u8]) -> Self {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";
        let mut s = Self::new();
        for &b in bytes.iter().take(N / 2) {
            s.buf[s.len] = DIGITS[usize::from(b >> 4)];
            s.buf[s.len + 1] = DIGITS[usize::from(b & 0x0f)];
            s.len += 2;
        }
        s
    }

    /// Replace the contents with formatted output, truncated to capacity.
    ///
    /// If any `Display`/`Debug` implementation involved reports an error the
    /// current contents are left untouched.
    ///
    /// ```
    /// use lazy_flat_table::FixedString;
    ///
    /// let mut s = FixedString::<16>::new();
    /// s.format(format_args!("48+39={:03}", 48 + 39)).unwrap();
    /// assert_eq!(s, "48+39=087");
    /// ```
    pub fn format(&mut self, args: fmt::Arguments<'_>) -> Result<(), FixedStringError> {
        let mut scratch = Self::new();
        fmt::write(&mut scratch, args).map_err(|_| FixedStringError::Format)?;
        *self = scratch;
        Ok(())
    }
}

/// Build a `FixedString<N>` from a format string.
///
/// ```
/// let s = lazy_flat_table::fixed_format!(8, "{}-{}", "abc", 12345).unwrap();
/// assert_eq!(s, "abc-1234");
/// ```
#[macro_export]
macro_rules! fixed_format {
    ($n:expr, $($arg:tt)*) => {
        $crate::FixedString::<{ $n }>::from_fmt(::core::format_args!($($arg)*))
    };
}

/// Truncating writer: never reports an error itself.
impl<const N: usize> fmt::Write for FixedString<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.concat(s);
        Ok(())
    }
}

impl<const N: usize> Default for FixedString<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> From<&str> for FixedString<N> {
    fn from(s: &str) -> Self {
        let mut out = Self::new();
        out.concat(s);
        out
    }
}

impl<const N: usize> Deref for FixedString<N> {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl<const N: usize> AsRef<str> for FixedString<N> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<const N: usize> Borrow<str> for FixedString<N> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<const N: usize> PartialEq for FixedString<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<const N: usize> Eq for FixedString<N> {}

impl<const N: usize> PartialEq<str> for FixedString<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<const N: usize> PartialEq<&str> for FixedString<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<const N: usize> PartialOrd for FixedString<N> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<const N: usize> Ord for FixedString<N> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

// Must agree with `str`'s Hash for the `Borrow<str>` lookup path.
impl<const N: usize> Hash for FixedString<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl<const N: usize> fmt::Display for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl<const N: usize> fmt::Debug for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}
