#![deny(missing_docs)]

//! OpenType table checksums.

use std::num::Wrapping;

use crate::binary::read::ReadScope;
use crate::binary::U32Be;

/// Calculate a checksum of `data` according to the OpenType table checksum algorithm
///
/// Data that is not a multiple of four bytes long is summed as though it were zero padded
/// out to the next 32-bit boundary, which is how tables are laid out in a font file.
///
/// https://docs.microsoft.com/en-us/typography/opentype/spec/otff#calculating-checksums
pub fn table_checksum(data: &[u8]) -> Wrapping<u32> {
    let whole = data.len() / 4;
    let mut ctxt = ReadScope::new(data).ctxt();
    let sum: Wrapping<u32> = match ctxt.read_array::<U32Be>(whole) {
        Ok(array) => array.iter().map(Wrapping).sum(),
        // `whole` words always fit in `data`
        Err(_) => Wrapping(0),
    };

    let tail = &data[whole * 4..];
    if tail.is_empty() {
        sum
    } else {
        let mut last = [0u8; 4];
        last[..tail.len()].copy_from_slice(tail);
        sum + Wrapping(u32::from_be_bytes(last))
    }
}
