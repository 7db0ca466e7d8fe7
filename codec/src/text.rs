use std::fmt;

/// Code points at or above this value are split into a surrogate pair.
///
/// Kiwi producers split at 0x1000 rather than the usual 0x10000, so a decoded
/// string is not valid UTF-16 in general. Keep this value as is.
pub const SURROGATE_THRESHOLD: u32 = 0x1000;

const HIGH_SURROGATE_BASE: u32 = 0xD800;
const LOW_SURROGATE_BASE: u32 = 0xDC00;

/// A decoded Kiwi string, stored as the 16-bit units the wire encoding
/// describes.
///
/// Use [WideString::to_string_lossy] (or `Display`) to get Rust text out of
/// it. Code points at or above [SURROGATE_THRESHOLD] do not survive that
/// conversion: each of their two units turns into U+FFFD. Read
/// [WideString::units] when the exact value matters.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct WideString {
    units: Vec<u16>,
}

impl WideString {
    pub fn new() -> WideString {
        WideString { units: Vec::new() }
    }

    /// The raw 16-bit units, surrogates included.
    pub fn units(&self) -> &[u16] {
        &self.units
    }

    pub fn into_units(self) -> Vec<u16> {
        self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Appends one decoded code point, splitting it into two units when it
    /// reaches [SURROGATE_THRESHOLD].
    pub(crate) fn push_code_point(&mut self, code_point: u32) {
        if code_point < SURROGATE_THRESHOLD {
            self.units.push(code_point as u16);
        } else {
            let adjusted = code_point - SURROGATE_THRESHOLD;
            self.units.push(((adjusted >> 10) + HIGH_SURROGATE_BASE) as u16);
            self.units.push(((adjusted & 0x3FF) + LOW_SURROGATE_BASE) as u16);
        }
    }

    /// Converts to a Rust string one unit at a time. Units are never paired;
    /// every unit in `0xD800..=0xDFFF` becomes U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        self.chars().collect()
    }

    fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.units
            .iter()
            .map(|&unit| char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}

impl From<Vec<u16>> for WideString {
    fn from(units: Vec<u16>) -> WideString {
        WideString { units }
    }
}

impl PartialEq<str> for WideString {
    fn eq(&self, other: &str) -> bool {
        self.chars().eq(other.chars())
    }
}

impl PartialEq<&str> for WideString {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl fmt::Display for WideString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars() {
            fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for WideString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

#[test]
fn push_code_point() {
    let mut s = WideString::new();
    s.push_code_point(0x41);
    s.push_code_point(0xFFF);
    assert_eq!(s.units(), [0x41, 0xFFF]);

    let mut s = WideString::new();
    s.push_code_point(0x1000);
    assert_eq!(s.units(), [0xD800, 0xDC00]);

    let mut s = WideString::new();
    s.push_code_point(0x1001);
    assert_eq!(s.units(), [0xD800, 0xDC01]);

    let mut s = WideString::new();
    s.push_code_point(0x1F355);
    assert_eq!(s.units(), [0xD878, 0xDF55]);
}

#[test]
fn lossy_conversion() {
    assert_eq!(WideString::from(vec![0x61, 0x62]).to_string_lossy(), "ab");
    assert_eq!(WideString::from(vec![0x61, 0xD800]).to_string_lossy(), "a\u{FFFD}");
    assert_eq!(WideString::from(vec![0xDC00, 0x62]).to_string(), "\u{FFFD}b");
    assert_eq!(WideString::from(vec![0xFFF, 0xE000]).to_string_lossy(), "\u{FFF}\u{E000}");
}

#[test]
fn split_code_points_are_not_paired() {
    // U+4E2D is split into two units that must not be read back as U+13E2D.
    let mut s = WideString::new();
    s.push_code_point(0x4E2D);
    assert_eq!(s.units(), [0xD80F, 0xDE2D]);
    assert_eq!(s.to_string_lossy(), "\u{FFFD}\u{FFFD}");
    assert_eq!(s.to_string(), "\u{FFFD}\u{FFFD}");
    assert_eq!(WideString::from(vec![0xD800, 0xDC01]).to_string_lossy(), "\u{FFFD}\u{FFFD}");
}

#[test]
fn compare_with_str() {
    assert_eq!(WideString::from(vec![0x41]), "A");
    assert!(WideString::new() == "");
    assert!(WideString::from(vec![0x41]) != "AB");
}
