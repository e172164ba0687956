//! Table headers.
//!
//! A `Header` is the directory entry of a table. Headers read from a font file have every field
//! valid. Headers synthesized for a new or rebuilt table only know their length, since the
//! offset and checksum are assigned when the table is written into a font.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::font::TableRecord;

/// Directory entry of a table. Equality and hashing consider the tag alone.
#[derive(Debug, Copy, Clone)]
pub struct Header {
    tag: u32,
    offset: u32,
    offset_valid: bool,
    length: u32,
    length_valid: bool,
    checksum: u32,
    checksum_valid: bool,
}

impl Header {
    /// Header for an empty new table.
    pub fn new(tag: u32) -> Self {
        Header::with_length(tag, 0)
    }

    /// Header for a new table of known length but no position in a font.
    pub fn with_length(tag: u32, length: u32) -> Self {
        Header {
            tag,
            offset: 0,
            offset_valid: false,
            length,
            length_valid: true,
            checksum: 0,
            checksum_valid: false,
        }
    }

    /// Header of a table read from a font file.
    pub fn from_record(tag: u32, checksum: u32, offset: u32, length: u32) -> Self {
        Header {
            tag,
            offset,
            offset_valid: true,
            length,
            length_valid: true,
            checksum,
            checksum_valid: true,
        }
    }

    pub fn tag(&self) -> u32 {
        self.tag
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn offset_valid(&self) -> bool {
        self.offset_valid
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn length_valid(&self) -> bool {
        self.length_valid
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn checksum_valid(&self) -> bool {
        self.checksum_valid
    }

    /// Order by offset in the source font. Headers without a valid offset sort last, and ties
    /// are broken by tag.
    pub fn cmp_by_offset(a: &Header, b: &Header) -> Ordering {
        let key = |h: &Header| (!h.offset_valid, if h.offset_valid { h.offset } else { 0 });
        key(a).cmp(&key(b)).then(a.tag.cmp(&b.tag))
    }

    pub fn cmp_by_tag(a: &Header, b: &Header) -> Ordering {
        a.tag.cmp(&b.tag)
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for Header {}

impl Hash for Header {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
    }
}

impl From<&TableRecord> for Header {
    fn from(record: &TableRecord) -> Self {
        Header::from_record(
            record.table_tag,
            record.checksum,
            record.offset,
            record.length,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag;
    use rustc_hash::FxHashSet;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(header: &Header) -> u64 {
        let mut hasher = DefaultHasher::new();
        header.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_identity_is_tag() {
        let file = Header::from_record(tag::CMAP, 0x1234, 200, 64);
        let synthesized = Header::with_length(tag::CMAP, 10);
        let empty = Header::new(tag::CMAP);

        assert_eq!(file, synthesized);
        assert_eq!(synthesized, empty);
        assert_eq!(hash_of(&file), hash_of(&synthesized));
        assert_ne!(file, Header::new(tag::HEAD));

        let mut set = FxHashSet::default();
        set.insert(file);
        assert!(!set.insert(synthesized));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_constructor_validity() {
        let empty = Header::new(tag::GLYF);
        assert_eq!(empty.length(), 0);
        assert!(empty.length_valid());
        assert!(!empty.offset_valid());
        assert!(!empty.checksum_valid());

        let file = Header::from_record(tag::GLYF, 1, 2, 3);
        assert!(file.offset_valid() && file.length_valid() && file.checksum_valid());
        assert_eq!((file.checksum(), file.offset(), file.length()), (1, 2, 3));
    }

    #[test]
    fn test_cmp_by_offset() {
        let mut headers = vec![
            Header::new(tag::NAME),
            Header::from_record(tag::HEAD, 0, 300, 54),
            Header::new(tag::CMAP),
            Header::from_record(tag::GLYF, 0, 100, 10),
            Header::from_record(tag::CVT, 0, 100, 0),
        ];
        headers.sort_by(Header::cmp_by_offset);
        let tags: Vec<u32> = headers.iter().map(Header::tag).collect();
        assert_eq!(
            tags,
            vec![tag::CVT, tag::GLYF, tag::HEAD, tag::CMAP, tag::NAME]
        );
    }

    #[test]
    fn test_cmp_by_tag() {
        let mut headers = vec![Header::new(tag::POST), Header::new(tag::CMAP)];
        headers.sort_by(Header::cmp_by_tag);
        assert_eq!(headers[0].tag(), tag::CMAP);
    }
}
