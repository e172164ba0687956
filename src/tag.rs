//! Table tags.
//!
//! Tags are the 4-byte identifiers of tables in an SFNT font, held as big-endian `u32`
//! values.

use crate::error::ParseError;
use std::fmt;

/// Generate a 4-byte font table tag from byte string, so `tag!(b"glyf")` is `0x676C7966`.
macro_rules! tag {
    ($w:expr) => {
        $crate::tag::tag(*$w)
    };
}

/// Wrapper that formats a tag as text, or as hex when it is not printable.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct DisplayTag(pub u32);

/// Build a tag from its four bytes.
pub const fn tag(chars: [u8; 4]) -> u32 {
    ((chars[3] as u32) << 0)
        | ((chars[2] as u32) << 8)
        | ((chars[1] as u32) << 16)
        | ((chars[0] as u32) << 24)
}

/// Parse a tag from a string of at most four ASCII characters, padding with spaces.
pub fn from_string(s: &str) -> Result<u32, ParseError> {
    if s.len() > 4 {
        return Err(ParseError::BadValue);
    }

    let mut tag: u32 = 0;
    let mut count = 0;

    for c in s.chars() {
        if !c.is_ascii() || c.is_ascii_control() {
            return Err(ParseError::BadValue);
        }

        tag = (tag << 8) | (c as u32);
        count += 1;
    }

    while count < 4 {
        tag = (tag << 8) | (' ' as u32);
        count += 1;
    }

    Ok(tag)
}

impl fmt::Display for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.0;
        let mut s = String::with_capacity(4);
        s.push(char::from((tag >> 24) as u8));
        s.push(char::from(((tag >> 16) & 255) as u8));
        s.push(char::from(((tag >> 8) & 255) as u8));
        s.push(char::from((tag & 255) as u8));
        if s.chars().any(|c| !c.is_ascii() || c.is_ascii_control()) {
            write!(f, "0x{:08x}", tag)
        } else {
            s.fmt(f)
        }
    }
}

impl fmt::Debug for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_string().fmt(f)
    }
}

pub const BDAT: u32 = tag!(b"bdat");
pub const BHED: u32 = tag!(b"bhed");
pub const BLOC: u32 = tag!(b"bloc");
pub const CFF: u32 = tag!(b"CFF ");
pub const CMAP: u32 = tag!(b"cmap");
pub const CVT: u32 = tag!(b"cvt ");
pub const EBDT: u32 = tag!(b"EBDT");
pub const EBLC: u32 = tag!(b"EBLC");
pub const EBSC: u32 = tag!(b"EBSC");
pub const FPGM: u32 = tag!(b"fpgm");
pub const GLYF: u32 = tag!(b"glyf");
pub const GSUB: u32 = tag!(b"GSUB");
pub const HDMX: u32 = tag!(b"hdmx");
pub const HEAD: u32 = tag!(b"head");
pub const HHEA: u32 = tag!(b"hhea");
pub const HMTX: u32 = tag!(b"hmtx");
pub const LOCA: u32 = tag!(b"loca");
pub const MAXP: u32 = tag!(b"maxp");
pub const NAME: u32 = tag!(b"name");
pub const OS_2: u32 = tag!(b"OS/2");
pub const OTTO: u32 = tag!(b"OTTO");
pub const POST: u32 = tag!(b"post");
pub const PREP: u32 = tag!(b"prep");
pub const TRUE: u32 = tag!(b"true");
pub const TTCF: u32 = tag!(b"ttcf");
