//! SFNT font files: the offset table, the table directory and whole-font serialization.
//!
//! `Font` is a read-only set of tables keyed by tag. `FontBuilder` holds one builder per
//! table and relates the builders whose decoding depends on other tables before building.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/otff#organization-of-an-opentype-font>

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io;
use std::num::Wrapping;

use itertools::Itertools;
use log::{debug, warn};

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom};
use crate::binary::write::{WriteBinary, WriteBuffer, WriteContext};
use crate::binary::{long_align, long_padding, U16Be, U32Be};
use crate::checksum;
use crate::error::{ParseError, ReadWriteError, WriteError};
use crate::font_data::ReadableFontData;
use crate::font_data_table::FontDataTable;
use crate::header::Header;
use crate::size;
use crate::table::{get_builder, get_empty_builder, AnyTable, AnyTableBuilder, SfntTable};
use crate::tag::{self, DisplayTag};

/// TrueType outlines.
pub const TTF_MAGIC: u32 = 0x00010000;

/// CFF outlines.
pub const CFF_MAGIC: u32 = tag::OTTO;

/// Apple TrueType.
pub const APPLE_MAGIC: u32 = tag::TRUE;

/// Whole-font checksum target, from which `head.checkSumAdjustment` is derived.
const CHECKSUM_MAGIC: u32 = 0xB1B0AFBA;

/// Offset of `checkSumAdjustment` in `head`.
const CHECK_SUM_ADJUSTMENT_OFFSET: usize = 8;

const OFFSET_TABLE_SIZE: usize = size::U32 + 4 * size::U16;

/// OpenType Offset Table
#[derive(Clone)]
pub struct OffsetTable<'a> {
    pub sfnt_version: u32,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
    pub table_records: ReadArray<'a, TableRecord>,
}

/// An entry in the Offset Table
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Hash)]
pub struct TableRecord {
    pub table_tag: u32,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

impl ReadBinary for OffsetTable<'_> {
    type HostType<'a> = OffsetTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<OffsetTable<'a>, ParseError> {
        let sfnt_version = ctxt.read_u32be()?;
        match sfnt_version {
            TTF_MAGIC | CFF_MAGIC | APPLE_MAGIC => {
                let num_tables = ctxt.read_u16be()?;
                let search_range = ctxt.read_u16be()?;
                let entry_selector = ctxt.read_u16be()?;
                let range_shift = ctxt.read_u16be()?;
                let table_records = ctxt.read_array::<TableRecord>(usize::from(num_tables))?;
                Ok(OffsetTable {
                    sfnt_version,
                    search_range,
                    entry_selector,
                    range_shift,
                    table_records,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl ReadFrom for TableRecord {
    type ReadType = ((U32Be, U32Be), (U32Be, U32Be));

    fn read_from(((table_tag, checksum), (offset, length)): ((u32, u32), (u32, u32))) -> Self {
        TableRecord {
            table_tag,
            checksum,
            offset,
            length,
        }
    }
}

impl WriteBinary<&Self> for TableRecord {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, table: &TableRecord) -> Result<(), WriteError> {
        U32Be::write(ctxt, table.table_tag)?;
        U32Be::write(ctxt, table.checksum)?;
        U32Be::write(ctxt, table.offset)?;
        U32Be::write(ctxt, table.length)?;

        Ok(())
    }
}

impl TableRecord {
    pub const SIZE: usize = 4 * size::U32;

    /// The table's bytes, sharing storage with `font_data`.
    pub fn table_data(&self, font_data: &ReadableFontData) -> Result<ReadableFontData, ParseError> {
        let offset = usize::try_from(self.offset)?;
        let length = usize::try_from(self.length)?;
        font_data.slice(offset, length)
    }
}

/// Calculate the maximum power of 2 that is <= num
fn max_power_of_2(num: u16) -> u16 {
    15u16.saturating_sub(num.leading_zeros() as u16)
}

fn is_head(tag: u32) -> bool {
    tag == tag::HEAD || tag == tag::BHED
}

/// The checksum a table directory records for `tag`. For `head` the checksum adjustment is
/// summed as zero.
fn directory_checksum(tag: u32, data: &[u8]) -> Wrapping<u32> {
    let sum = checksum::table_checksum(data);
    match data.get(CHECK_SUM_ADJUSTMENT_OFFSET..CHECK_SUM_ADJUSTMENT_OFFSET + size::U32) {
        Some(adjustment) if is_head(tag) => {
            let mut word = [0; 4];
            word.copy_from_slice(adjustment);
            sum - Wrapping(u32::from_be_bytes(word))
        }
        _ => sum,
    }
}

/// Builders for every table in `data`, with file-sourced headers.
fn read_builders(
    data: &ReadableFontData,
) -> Result<(u32, BTreeMap<u32, AnyTableBuilder>), ParseError> {
    let offset_table = data.scope().read::<OffsetTable<'_>>()?;
    let mut builders = BTreeMap::new();
    for record in offset_table.table_records.iter() {
        let table_data = record.table_data(data)?;
        let calculated = directory_checksum(record.table_tag, table_data.bytes()).0;
        if calculated != record.checksum {
            warn!(
                "'{}' table checksum is {:#010x} but the directory records {:#010x}",
                DisplayTag(record.table_tag),
                calculated,
                record.checksum
            );
        }
        let header = Header::from(&record);
        builders.insert(record.table_tag, get_builder(header, table_data));
    }
    Ok((offset_table.sfnt_version, builders))
}

/// A read-only font.
#[derive(Debug)]
pub struct Font {
    sfnt_version: u32,
    tables: BTreeMap<u32, AnyTable>,
}

impl Font {
    /// Read every table in `data`.
    pub fn read(data: ReadableFontData) -> Result<Font, ReadWriteError> {
        FontBuilder::from_data(data)?.build()
    }

    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    pub fn has_table(&self, tag: u32) -> bool {
        self.tables.contains_key(&tag)
    }

    pub fn table(&self, tag: u32) -> Option<&AnyTable> {
        self.tables.get(&tag)
    }

    pub fn header(&self, tag: u32) -> Option<&Header> {
        self.table(tag).map(SfntTable::header)
    }

    pub fn tables(&self) -> impl Iterator<Item = &AnyTable> {
        self.tables.values()
    }

    /// Headers in the order the tables appear in the source font. Tables without a source
    /// position come last.
    pub fn headers_by_offset(&self) -> Vec<Header> {
        self.tables
            .values()
            .map(|table| *table.header())
            .sorted_by(Header::cmp_by_offset)
            .collect_vec()
    }

    /// Write the font to `writer`, returning the number of bytes written.
    ///
    /// The table directory is sorted by tag. Table data keeps the order of the source font,
    /// and `head.checkSumAdjustment` is recalculated. Errors laying out the font are reported
    /// as `InvalidData`. Errors from `writer` are returned unchanged.
    pub fn serialize<W: io::Write>(&self, writer: &mut W) -> io::Result<usize> {
        let directory = self
            .directory()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        writer.write_all(directory.offset_table.bytes())?;
        let mut written = directory.offset_table.len();

        let adjustment = directory.check_sum_adjustment.to_be_bytes();
        for header in &directory.layout {
            let data = self.table_bytes(header.tag()).unwrap_or_default();
            let adjustment_range = CHECK_SUM_ADJUSTMENT_OFFSET..CHECK_SUM_ADJUSTMENT_OFFSET + 4;
            if is_head(header.tag()) && data.len() >= adjustment_range.end {
                writer.write_all(&data[..adjustment_range.start])?;
                writer.write_all(&adjustment)?;
                writer.write_all(&data[adjustment_range.end..])?;
            } else {
                writer.write_all(data)?;
            }
            let padding = long_padding(data.len());
            writer.write_all(&[0; 3][..padding])?;
            written += data.len() + padding;
        }

        Ok(written)
    }

    /// The serialized font.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.serialize(&mut bytes)?;
        Ok(bytes)
    }

    fn table_bytes(&self, tag: u32) -> Option<&[u8]> {
        self.tables
            .get(&tag)
            .map(|table| table.read_font_data().bytes())
    }

    fn directory(&self) -> Result<Directory, WriteError> {
        let num_tables = u16::try_from(self.tables.len())?;
        let directory_size = OFFSET_TABLE_SIZE + self.tables.len() * TableRecord::SIZE;
        let mut table_offset = long_align(directory_size);

        let mut records = BTreeMap::new();
        let mut checksum = Wrapping(0);
        let layout = self.headers_by_offset();
        for header in &layout {
            let data = self.table_bytes(header.tag()).unwrap_or_default();
            let table_checksum = directory_checksum(header.tag(), data);
            checksum += table_checksum;
            let record = TableRecord {
                table_tag: header.tag(),
                checksum: table_checksum.0,
                offset: u32::try_from(table_offset)?,
                length: u32::try_from(data.len())?,
            };
            records.insert(header.tag(), record);
            table_offset += long_align(data.len());
        }

        let mut offset_table = WriteBuffer::new();
        let n = max_power_of_2(num_tables);
        let search_range = (1u16 << n) * 16;
        U32Be::write(&mut offset_table, self.sfnt_version)?;
        U16Be::write(&mut offset_table, num_tables)?;
        U16Be::write(&mut offset_table, search_range)?;
        U16Be::write(&mut offset_table, n)?;
        let range_shift = num_tables.checked_mul(16).ok_or(WriteError::BadValue)?;
        U16Be::write(&mut offset_table, range_shift.saturating_sub(search_range))?;
        for record in records.values() {
            TableRecord::write(&mut offset_table, record)?;
        }
        offset_table.write_zeros(long_padding(directory_size))?;

        checksum += checksum::table_checksum(offset_table.bytes());
        Ok(Directory {
            offset_table,
            layout,
            check_sum_adjustment: (Wrapping(CHECKSUM_MAGIC) - checksum).0,
        })
    }
}

/// The laid out offset table and table directory of a font about to be written.
struct Directory {
    offset_table: WriteBuffer,
    layout: Vec<Header>,
    check_sum_adjustment: u32,
}

/// Builders for the tables of a font.
#[derive(Debug)]
pub struct FontBuilder {
    sfnt_version: u32,
    builders: BTreeMap<u32, AnyTableBuilder>,
}

impl FontBuilder {
    pub fn new(sfnt_version: u32) -> Self {
        FontBuilder {
            sfnt_version,
            builders: BTreeMap::new(),
        }
    }

    /// Builders for copies of the tables of `font`.
    pub fn from_font(font: &Font) -> Result<Self, ParseError> {
        let builders = font
            .tables
            .iter()
            .map(|(&tag, table)| (tag, table.to_builder()))
            .collect();
        let mut builder = FontBuilder {
            sfnt_version: font.sfnt_version,
            builders,
        };
        builder.relate_builders()?;
        Ok(builder)
    }

    /// Builders for the tables of the font file in `data`.
    pub fn from_data(data: ReadableFontData) -> Result<Self, ParseError> {
        let (sfnt_version, builders) = read_builders(&data)?;
        let mut builder = FontBuilder {
            sfnt_version,
            builders,
        };
        builder.relate_builders()?;
        Ok(builder)
    }

    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    pub fn has_table_builder(&self, tag: u32) -> bool {
        self.builders.contains_key(&tag)
    }

    pub fn table_builder(&self, tag: u32) -> Option<&AnyTableBuilder> {
        self.builders.get(&tag)
    }

    pub fn table_builder_mut(&mut self, tag: u32) -> Option<&mut AnyTableBuilder> {
        self.builders.get_mut(&tag)
    }

    /// Add a builder for a new, empty table, replacing any existing builder for `tag`.
    pub fn new_table_builder(&mut self, tag: u32) -> &mut AnyTableBuilder {
        self.insert(get_empty_builder(Header::new(tag)))
    }

    /// Add a builder initialised with `data`, replacing any existing builder for `tag`.
    pub fn new_table_builder_with_data(
        &mut self,
        tag: u32,
        data: ReadableFontData,
    ) -> Result<&mut AnyTableBuilder, ParseError> {
        let header = Header::with_length(tag, u32::try_from(data.len())?);
        Ok(self.insert(get_builder(header, data)))
    }

    pub fn remove_table_builder(&mut self, tag: u32) -> Option<AnyTableBuilder> {
        self.builders.remove(&tag)
    }

    fn insert(&mut self, builder: AnyTableBuilder) -> &mut AnyTableBuilder {
        match self.builders.entry(builder.header().tag()) {
            Entry::Occupied(mut entry) => {
                entry.insert(builder);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(builder),
        }
    }

    /// Hand the counts from `maxp` and `hhea` to the builders that need them to decode.
    ///
    /// This runs when the builder is created and again before building, so edits to either
    /// count reach the dependent tables.
    fn relate_builders(&mut self) -> Result<(), ParseError> {
        let num_glyphs = match self.builders.get_mut(&tag::MAXP) {
            Some(AnyTableBuilder::Maxp(maxp)) => Some(maxp.maxp()?.num_glyphs),
            _ => None,
        };
        let num_h_metrics = match self.builders.get_mut(&tag::HHEA) {
            Some(AnyTableBuilder::Hhea(hhea)) => Some(hhea.hhea()?.num_h_metrics),
            _ => None,
        };

        if let Some(AnyTableBuilder::Hmtx(hmtx)) = self.builders.get_mut(&tag::HMTX) {
            if let Some(num_glyphs) = num_glyphs {
                if hmtx.num_glyphs() != Some(num_glyphs) {
                    hmtx.set_num_glyphs(num_glyphs)?;
                }
            }
            if let Some(num_h_metrics) = num_h_metrics {
                if hmtx.num_h_metrics() != Some(num_h_metrics) {
                    hmtx.set_num_h_metrics(num_h_metrics)?;
                }
            }
        }
        if let (Some(AnyTableBuilder::Hdmx(hdmx)), Some(num_glyphs)) =
            (self.builders.get_mut(&tag::HDMX), num_glyphs)
        {
            hdmx.set_num_glyphs(num_glyphs)?;
        }
        Ok(())
    }

    /// Build every table. Builders with nothing to build are left out of the font.
    pub fn build(mut self) -> Result<Font, ReadWriteError> {
        self.relate_builders()?;
        let mut tables = BTreeMap::new();
        for (tag, builder) in self.builders {
            match builder.build()? {
                Some(table) => {
                    tables.insert(tag, table);
                }
                None => debug!("'{}' table has nothing to build, dropping it", DisplayTag(tag)),
            }
        }
        Ok(Font {
            sfnt_version: self.sfnt_version,
            tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font_data(records: &[(u32, Vec<u8>)]) -> ReadableFontData {
        let mut font = WriteBuffer::new();
        let num_tables = records.len() as u16;
        let n = max_power_of_2(num_tables);
        U32Be::write(&mut font, TTF_MAGIC).unwrap();
        U16Be::write(&mut font, num_tables).unwrap();
        U16Be::write(&mut font, (1u16 << n) * 16).unwrap();
        U16Be::write(&mut font, n).unwrap();
        U16Be::write(&mut font, num_tables * 16 - (1 << n) * 16).unwrap();
        let mut offset = OFFSET_TABLE_SIZE + records.len() * TableRecord::SIZE;
        for (tag, data) in records {
            let record = TableRecord {
                table_tag: *tag,
                checksum: directory_checksum(*tag, data).0,
                offset: offset as u32,
                length: data.len() as u32,
            };
            TableRecord::write(&mut font, &record).unwrap();
            offset += long_align(data.len());
        }
        for (_, data) in records {
            font.write_bytes(data).unwrap();
            font.write_zeros(long_padding(data.len())).unwrap();
        }
        ReadableFontData::new(font.into_inner())
    }

    #[test]
    fn test_max_power_of_2() {
        assert_eq!(max_power_of_2(1), 0);
        assert_eq!(max_power_of_2(9), 3);
        assert_eq!(max_power_of_2(16), 4);
    }

    #[test]
    fn test_bad_sfnt_version() {
        let data = ReadableFontData::new(vec![0, 0, 0, 0, 0, 0]);
        assert_eq!(
            Font::read(data).err(),
            Some(ReadWriteError::Read(ParseError::BadVersion))
        );
    }

    #[test]
    fn test_read_generic_tables() {
        let name = vec![1, 2, 3, 4, 5];
        let data = font_data(&[(tag::NAME, name.clone()), (tag!(b"zzzz"), vec![9; 8])]);
        let font = Font::read(data).unwrap();
        assert_eq!(font.num_tables(), 2);
        assert_eq!(font.sfnt_version(), TTF_MAGIC);

        let header = font.header(tag::NAME).unwrap();
        assert!(header.offset_valid() && header.checksum_valid());
        assert_eq!(header.offset(), 44);
        assert_eq!(header.length(), 5);
        assert_eq!(font.table(tag::NAME).unwrap().read_font_data().bytes(), &name[..]);
        assert_eq!(
            font.headers_by_offset().iter().map(Header::tag).collect_vec(),
            vec![tag::NAME, tag!(b"zzzz")]
        );
    }

    #[test]
    fn test_serialize_unchanged_round_trip() {
        let data = font_data(&[(tag::NAME, vec![1, 2, 3, 4, 5]), (tag::POST, vec![7; 4])]);
        let font = Font::read(data.clone()).unwrap();
        let bytes = font.to_bytes().unwrap();
        assert_eq!(&bytes[..], data.bytes());
    }

    #[test]
    fn test_wrong_directory_checksum_is_rewritten() {
        let mut bytes = font_data(&[(tag::POST, vec![0, 0, 0, 7])]).bytes().to_vec();
        // The checksum field of the only table record.
        bytes[16..20].copy_from_slice(&[0, 0, 0, 9]);
        let font = Font::read(ReadableFontData::new(bytes)).unwrap();
        let post = font.table(tag::POST).unwrap();
        assert_eq!(post.header_checksum(), 9);
        assert_eq!(post.calculated_checksum(), 7);

        let reread = Font::read(ReadableFontData::new(font.to_bytes().unwrap())).unwrap();
        let post = reread.table(tag::POST).unwrap();
        assert_eq!(post.header_checksum(), 7);
        assert_eq!(post.header_checksum(), post.calculated_checksum());
    }

    #[test]
    fn test_directory_checksum_skips_head_adjustment() {
        let mut head = vec![0; 12];
        head[3] = 1;
        head[8..12].copy_from_slice(&[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(directory_checksum(tag::HEAD, &head), Wrapping(1));
        assert_eq!(directory_checksum(tag::NAME, &head), Wrapping(0x1234_5679));
    }

    #[test]
    fn test_new_table_builders() {
        let mut builder = FontBuilder::new(CFF_MAGIC);
        builder.new_table_builder(tag::NAME);
        builder
            .new_table_builder_with_data(tag::POST, ReadableFontData::new(vec![1, 2, 3, 4]))
            .unwrap();
        assert!(builder.has_table_builder(tag::NAME));
        assert!(builder.remove_table_builder(tag!(b"none")).is_none());

        let font = builder.build().unwrap();
        assert!(!font.has_table(tag::NAME));
        assert!(font.has_table(tag::POST));
        assert!(!font.header(tag::POST).unwrap().offset_valid());
    }
}
