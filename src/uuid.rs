//! Uuid: 128-bit identifiers in the 36-character hyphenated form.
//!
//! A thin layer over the `uuid` crate that makes random generation fallible
//! (the OS entropy source can fail) and parses only the canonical
//! `8-4-4-4-12` text form.

use crate::error::UuidError;
use crate::fixed_string::FixedString;
use core::fmt;
use core::str::FromStr;
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of the hyphenated text form.
pub const UUID_TEXT_LEN: usize = 36;

const HYPHENS: [usize; 4] = [8, 13, 18, 23];

/// Ordered and hashed byte-for-byte.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uuid(::uuid::Uuid);

fn fill_random(dst: &mut [u8]) -> Result<(), UuidError> {
    let mut rng = OsRng;
    rng.try_fill_bytes(dst)
        .map_err(|e| UuidError::Entropy(e.to_string()))
}

impl Uuid {
    /// All-zero identifier.
    pub const fn nil() -> Self {
        Self(::uuid::Uuid::nil())
    }

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(::uuid::Uuid::from_bytes(bytes))
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Version nibble, e.g. `4` for a random identifier.
    pub fn version_num(&self) -> usize {
        self.0.get_version_num()
    }

    /// Deterministic, MD5 of `namespace || name`.
    pub fn new_v3(name: &str, namespace: &Uuid) -> Self {
        Self(::uuid::Uuid::new_v3(&namespace.0, name.as_bytes()))
    }

    /// Deterministic, SHA-1 of `namespace || name`.
    pub fn new_v5(name: &str, namespace: &Uuid) -> Self {
        Self(::uuid::Uuid::new_v5(&namespace.0, name.as_bytes()))
    }

    /// Random identifier drawn from the OS entropy source.
    pub fn try_new_v4() -> Result<Self, UuidError> {
        let mut bytes = [0u8; 16];
        fill_random(&mut bytes)?;
        Ok(Self(::uuid::Builder::from_random_bytes(bytes).into_uuid()))
    }

    /// 48-bit Unix millisecond timestamp followed by random bits, so values
    /// sort roughly by creation time.
    pub fn try_new_v7() -> Result<Self, UuidError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut random = [0u8; 10];
        fill_random(&mut random)?;
        Ok(Self(
            ::uuid::Builder::from_unix_timestamp_millis(millis, &random).into_uuid(),
        ))
    }

    /// [`try_new_v4`](Self::try_new_v4), falling back to [`nil`](Self::nil).
    pub fn new_v4_or_nil() -> Self {
        Self::try_new_v4().unwrap_or_default()
    }

    /// [`try_new_v7`](Self::try_new_v7), falling back to [`nil`](Self::nil).
    pub fn new_v7_or_nil() -> Self {
        Self::try_new_v7().unwrap_or_default()
    }

    /// Lowercase hyphenated text in an inline buffer.
    pub fn to_fixed_string(&self) -> FixedString<UUID_TEXT_LEN> {
        let mut buf = [0u8; UUID_TEXT_LEN];
        FixedString::from(&*self.0.hyphenated().encode_lower(&mut buf))
    }

    pub fn into_inner(self) -> ::uuid::Uuid {
        self.0
    }
}

impl From<::uuid::Uuid> for Uuid {
    fn from(u: ::uuid::Uuid) -> Self {
        Self(u)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

/// Accepts exactly the 36-character hyphenated form, either case.
impl FromStr for Uuid {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.as_bytes();
        if text.len() != UUID_TEXT_LEN {
            return Err(UuidError::Length(text.len()));
        }
        if let Some(&pos) = HYPHENS.iter().find(|&&pos| text[pos] != b'-') {
            return Err(UuidError::MissingHyphen(pos));
        }

        // Only the hyphenated form is left, so a parse failure means a bad
        // digit; report where the first one sits.
        ::uuid::Uuid::try_parse(s).map(Self).map_err(|_| {
            let pos = text
                .iter()
                .enumerate()
                .find(|(pos, c)| !HYPHENS.contains(pos) && !c.is_ascii_hexdigit())
                .map_or(0, |(pos, _)| pos);
            UuidError::InvalidHex(pos)
        })
    }
}

impl TryFrom<&str> for Uuid {
    type Error = UuidError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}
