//! `cmap` character to glyph index mapping table
//!
//! The table is a directory of encoding records, each pointing at a subtable. Subtable offsets
//! are relative to the start of the `cmap` table, so every subtable is read with the whole
//! table as its master data.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/cmap>

pub mod builder;

use std::collections::BTreeMap;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, U16Be, U32Be, U8};
use crate::error::{ParseError, WriteError};
use crate::size;
use crate::subtable::{SubTable, SubTableContainer};
use crate::table::Table;

pub use builder::{CmapModel, CmapSubtableBuilder, CmapSubtableModel, CmapTableBuilder};

const HEADER_SIZE: usize = 2 * size::U16;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlatformId(pub u16);

impl PlatformId {
    pub const UNICODE: PlatformId = PlatformId(0);
    pub const MACINTOSH: PlatformId = PlatformId(1);
    pub const WINDOWS: PlatformId = PlatformId(3);
    pub const CUSTOM: PlatformId = PlatformId(4);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingId(pub u16);

impl EncodingId {
    pub const UNICODE_BMP: EncodingId = EncodingId(3);
    pub const UNICODE_FULL: EncodingId = EncodingId(4);

    pub const WINDOWS_SYMBOL: EncodingId = EncodingId(0);
    pub const WINDOWS_UNICODE_BMP_UCS2: EncodingId = EncodingId(1);
    pub const WINDOWS_SHIFT_JIS: EncodingId = EncodingId(2);
    pub const WINDOWS_PRC: EncodingId = EncodingId(3);
    pub const WINDOWS_BIG5: EncodingId = EncodingId(4);
    pub const WINDOWS_WANSUNG: EncodingId = EncodingId(5);
    pub const WINDOWS_JOHAB: EncodingId = EncodingId(6);
    pub const WINDOWS_UNICODE_UCS4: EncodingId = EncodingId(10);

    pub const MACINTOSH_APPLE_ROMAN: EncodingId = EncodingId(0);
}

/// Identifies a subtable by its platform and encoding.
///
/// Ordering is by platform then encoding, which is the order encoding records must appear in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CmapId {
    pub platform_id: u16,
    pub encoding_id: u16,
}

impl CmapId {
    pub const WINDOWS_BMP: CmapId = CmapId::new(PlatformId::WINDOWS, EncodingId(1));
    pub const WINDOWS_UCS4: CmapId = CmapId::new(PlatformId::WINDOWS, EncodingId(10));
    pub const MAC_ROMAN: CmapId = CmapId::new(PlatformId::MACINTOSH, EncodingId(0));

    pub const fn new(platform_id: PlatformId, encoding_id: EncodingId) -> Self {
        CmapId {
            platform_id: platform_id.0,
            encoding_id: encoding_id.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub offset: u32,
}

impl EncodingRecord {
    pub fn id(&self) -> CmapId {
        CmapId {
            platform_id: self.platform_id,
            encoding_id: self.encoding_id,
        }
    }
}

impl ReadFrom for EncodingRecord {
    type ReadType = (U16Be, U16Be, U32Be);

    fn read_from((platform_id, encoding_id, offset): (u16, u16, u32)) -> Self {
        EncodingRecord {
            platform_id,
            encoding_id,
            offset,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SequentialMapGroup {
    start_char_code: u32,
    end_char_code: u32,
    start_glyph_id: u32,
}

impl ReadFrom for SequentialMapGroup {
    type ReadType = (U32Be, U32Be, U32Be);

    fn read_from((start_char_code, end_char_code, start_glyph_id): (u32, u32, u32)) -> Self {
        SequentialMapGroup {
            start_char_code,
            end_char_code,
            start_glyph_id,
        }
    }
}

impl SequentialMapGroup {
    fn contains(&self, ch: u32) -> bool {
        self.start_char_code <= ch && ch <= self.end_char_code
    }

    /// The glyph `ch` maps to. `ch` must be in the group.
    fn glyph_id(&self, ch: u32) -> Result<u16, ParseError> {
        let glyph_id = self
            .start_glyph_id
            .checked_add(ch - self.start_char_code)
            .ok_or(ParseError::BadValue)?;
        Ok(u16::try_from(glyph_id)?)
    }

    /// Fails when the group maps past the last possible glyph id.
    fn check_span(&self) -> Result<(), ParseError> {
        if self.end_char_code < self.start_char_code {
            return Err(ParseError::BadValue);
        }
        self.glyph_id(self.end_char_code).map(|_| ())
    }
}

impl WriteBinary for SequentialMapGroup {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, group: SequentialMapGroup) -> Result<(), WriteError> {
        U32Be::write(ctxt, group.start_char_code)?;
        U32Be::write(ctxt, group.end_char_code)?;
        U32Be::write(ctxt, group.start_glyph_id)?;

        Ok(())
    }
}

/// The decodable subtable formats.
enum Mappings<'a> {
    Format0 {
        glyph_id_array: ReadArray<'a, U8>,
    },
    Format4 {
        end_codes: ReadArray<'a, U16Be>,
        start_codes: ReadArray<'a, U16Be>,
        id_deltas: ReadArray<'a, I16Be>,
        id_range_offsets: ReadArray<'a, U16Be>,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format6 {
        first_code: u16,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format10 {
        start_char_code: u32,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format12 {
        groups: ReadArray<'a, SequentialMapGroup>,
    },
}

impl ReadBinary for Mappings<'_> {
    type HostType<'a> = Mappings<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Mappings<'a>, ParseError> {
        let subtable_format = ctxt.read_u16be()?;
        match subtable_format {
            0 => {
                let length = usize::from(ctxt.read_u16be()?);
                ctxt.check(length >= 3 * size::U16 + 256)?;
                let _language = ctxt.read_u16be()?;
                let glyph_id_array = ctxt.read_array::<U8>(256)?;
                Ok(Mappings::Format0 { glyph_id_array })
            }
            4 => {
                let length = usize::from(ctxt.read_u16be()?);
                let _language = ctxt.read_u16be()?;
                let seg_count_x2 = usize::from(ctxt.read_u16be()?);
                ctxt.check((seg_count_x2 & 1) == 0)?;
                let seg_count = seg_count_x2 >> 1;
                let _search_range = ctxt.read_u16be()?;
                let _entry_selector = ctxt.read_u16be()?;
                let _range_shift = ctxt.read_u16be()?;
                let end_codes = ctxt.read_array::<U16Be>(seg_count)?;
                let _reserved_pad = ctxt.read_u16be()?;
                let start_codes = ctxt.read_array::<U16Be>(seg_count)?;
                let id_deltas = ctxt.read_array::<I16Be>(seg_count)?;
                let id_range_offsets = ctxt.read_array::<U16Be>(seg_count)?;
                ctxt.check(length >= (8 + (4 * seg_count)) * size::U16)?;
                let remaining = length - ((8 + (4 * seg_count)) * size::U16);
                ctxt.check((remaining & 1) == 0)?;
                let num_indices = remaining >> 1;
                let glyph_id_array = ctxt.read_array::<U16Be>(num_indices)?;
                Ok(Mappings::Format4 {
                    end_codes,
                    start_codes,
                    id_deltas,
                    id_range_offsets,
                    glyph_id_array,
                })
            }
            6 => {
                let _length = ctxt.read_u16be()?;
                let _language = ctxt.read_u16be()?;
                let first_code = ctxt.read_u16be()?;
                let entry_count = usize::from(ctxt.read_u16be()?);
                let glyph_id_array = ctxt.read_array::<U16Be>(entry_count)?;
                Ok(Mappings::Format6 {
                    first_code,
                    glyph_id_array,
                })
            }
            10 => {
                let reserved = ctxt.read_u16be()?;
                ctxt.check(reserved == 0)?;
                let _length = ctxt.read_u32be()?;
                let _language = ctxt.read_u32be()?;
                let start_char_code = ctxt.read_u32be()?;
                let num_chars = usize::try_from(ctxt.read_u32be()?)?;
                let glyph_id_array = ctxt.read_array::<U16Be>(num_chars)?;
                Ok(Mappings::Format10 {
                    start_char_code,
                    glyph_id_array,
                })
            }
            12 => {
                let reserved = ctxt.read_u16be()?;
                ctxt.check(reserved == 0)?;
                let _length = ctxt.read_u32be()?;
                let _language = ctxt.read_u32be()?;
                let num_groups = usize::try_from(ctxt.read_u32be()?)?;
                let groups = ctxt.read_array::<SequentialMapGroup>(num_groups)?;
                Ok(Mappings::Format12 { groups })
            }
            2 | 8 | 13 | 14 => Err(ParseError::NotImplemented),
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl<'a> Mappings<'a> {
    fn format4_glyph(
        index: usize,
        ch: u32,
        start_code: u32,
        id_delta: i32,
        id_range_offset: usize,
        num_segments: usize,
        glyph_id_array: &ReadArray<'a, U16Be>,
    ) -> Result<u16, ParseError> {
        if id_range_offset == 0 {
            return Ok((((ch as i32) + id_delta) as u32 & 0xFFFF) as u16);
        }
        let glyph_id_offset = id_range_offset + index * 2 + ((ch - start_code) as usize) * 2;
        if glyph_id_offset < num_segments * 2 || (glyph_id_offset & 1) != 0 {
            return Err(ParseError::BadIndex);
        }
        let glyph_id = glyph_id_array
            .get_item((glyph_id_offset >> 1) - num_segments)
            .ok_or(ParseError::BadIndex)?;
        if glyph_id == 0 {
            Ok(0)
        } else {
            Ok(((i32::from(glyph_id) + id_delta) as u32 & 0xFFFF) as u16)
        }
    }

    fn map_glyph(&self, ch: u32) -> Result<Option<u16>, ParseError> {
        match self {
            Mappings::Format0 { glyph_id_array } => {
                let index = usize::try_from(ch)?;
                Ok(glyph_id_array.get_item(index).map(u16::from))
            }
            Mappings::Format4 {
                end_codes,
                start_codes,
                id_deltas,
                id_range_offsets,
                glyph_id_array,
            } => {
                let segments = start_codes.iter().zip(end_codes.iter()).enumerate();
                for (index, (start_code, end_code)) in segments {
                    let (start_code, end_code) = (u32::from(start_code), u32::from(end_code));
                    if start_code <= ch && ch <= end_code {
                        let id_delta = id_deltas.get_item(index).ok_or(ParseError::BadIndex)?;
                        let id_range_offset = id_range_offsets
                            .get_item(index)
                            .ok_or(ParseError::BadIndex)?;
                        let glyph_id = Mappings::format4_glyph(
                            index,
                            ch,
                            start_code,
                            i32::from(id_delta),
                            usize::from(id_range_offset),
                            id_range_offsets.len(),
                            glyph_id_array,
                        )?;
                        return Ok(Some(glyph_id));
                    }
                }
                Ok(None)
            }
            Mappings::Format6 {
                first_code,
                glyph_id_array,
            } => {
                let first_code = u32::from(*first_code);
                if first_code <= ch {
                    let index = usize::try_from(ch - first_code)?;
                    Ok(glyph_id_array.get_item(index))
                } else {
                    Ok(None)
                }
            }
            Mappings::Format10 {
                start_char_code,
                glyph_id_array,
            } => {
                if ch >= *start_char_code {
                    let index = usize::try_from(ch - start_char_code)?;
                    Ok(glyph_id_array.get_item(index))
                } else {
                    Ok(None)
                }
            }
            Mappings::Format12 { groups } => {
                for group in groups {
                    if group.contains(ch) {
                        return group.glyph_id(ch).map(Some);
                    }
                }
                Ok(None)
            }
        }
    }

    /// Every character mapped to a glyph other than `.notdef`.
    fn collect(&self) -> Result<BTreeMap<u32, u16>, ParseError> {
        let mut mappings = BTreeMap::new();
        let mut insert = |ch: u32, glyph_id: u16| {
            if glyph_id != 0 {
                mappings.insert(ch, glyph_id);
            }
        };
        match self {
            Mappings::Format0 { glyph_id_array } => {
                for (ch, glyph_id) in (0u32..).zip(glyph_id_array.iter()) {
                    insert(ch, u16::from(glyph_id));
                }
            }
            Mappings::Format4 {
                start_codes,
                end_codes,
                ..
            } => {
                for (start_code, end_code) in start_codes.iter().zip(end_codes.iter()) {
                    for ch in u32::from(start_code)..=u32::from(end_code) {
                        // 0xFFFF only terminates the segment list.
                        if ch == 0xFFFF {
                            continue;
                        }
                        if let Some(glyph_id) = self.map_glyph(ch)? {
                            insert(ch, glyph_id);
                        }
                    }
                }
            }
            Mappings::Format6 {
                first_code,
                glyph_id_array,
            } => {
                for (ch, glyph_id) in (u32::from(*first_code)..).zip(glyph_id_array.iter()) {
                    insert(ch, glyph_id);
                }
            }
            Mappings::Format10 {
                start_char_code,
                glyph_id_array,
            } => {
                for (ch, glyph_id) in (*start_char_code..).zip(glyph_id_array.iter()) {
                    insert(ch, glyph_id);
                }
            }
            Mappings::Format12 { groups } => {
                for group in groups {
                    group.check_span()?;
                    for ch in group.start_char_code..=group.end_char_code {
                        insert(ch, group.glyph_id(ch)?);
                    }
                }
            }
        }
        Ok(mappings)
    }
}

/// Length of the subtable at the start of `scope`, taken from its header.
pub(crate) fn subtable_length(scope: ReadScope<'_>) -> Result<usize, ParseError> {
    let mut ctxt = scope.ctxt();
    let format = ctxt.read_u16be()?;
    match format {
        0 | 2 | 4 | 6 => Ok(usize::from(ctxt.read_u16be()?)),
        8 | 10 | 12 | 13 => {
            let _reserved = ctxt.read_u16be()?;
            Ok(usize::try_from(ctxt.read_u32be()?)?)
        }
        14 => Ok(usize::try_from(ctxt.read_u32be()?)?),
        _ => Err(ParseError::BadVersion),
    }
}

/// The format and language of the subtable in `data`.
pub(crate) fn subtable_format_language(data: &[u8]) -> Result<(u16, u32), ParseError> {
    let mut ctxt = ReadScope::new(data).ctxt();
    let format = ctxt.read_u16be()?;
    let language = match format {
        0 | 2 | 4 | 6 => {
            let _length = ctxt.read_u16be()?;
            u32::from(ctxt.read_u16be()?)
        }
        8 | 10 | 12 | 13 => {
            let _reserved = ctxt.read_u16be()?;
            let _length = ctxt.read_u32be()?;
            ctxt.read_u32be()?
        }
        _ => 0,
    };
    Ok((format, language))
}

/// Decode the mappings of the subtable in `data`.
pub(crate) fn read_mappings(data: &[u8]) -> Result<BTreeMap<u32, u16>, ParseError> {
    ReadScope::new(data).read::<Mappings<'_>>()?.collect()
}

#[derive(Debug, Clone)]
pub struct CmapTable {
    table: Table,
}

/// A subtable of a `cmap` table.
#[derive(Debug, Clone)]
pub struct CmapSubtable<'a> {
    id: CmapId,
    subtable: SubTable<'a>,
}

impl CmapTable {
    pub fn encoding_records(&self) -> Result<ReadArray<'_, EncodingRecord>, ParseError> {
        let mut ctxt = self.table.data().scope().ctxt();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 0)?;
        let num_tables = usize::from(ctxt.read_u16be()?);
        Ok(ctxt.read_array::<EncodingRecord>(num_tables)?)
    }

    pub fn num_subtables(&self) -> Result<usize, ParseError> {
        self.encoding_records().map(|records| records.len())
    }

    pub fn subtable(&self, index: usize) -> Result<CmapSubtable<'_>, ParseError> {
        let record = self
            .encoding_records()?
            .get_item(index)
            .ok_or(ParseError::BadIndex)?;
        self.subtable_for_record(&record)
    }

    /// Find the first subtable for the given `platform_id` and `encoding_id`
    pub fn find_subtable(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Result<Option<CmapSubtable<'_>>, ParseError> {
        let id = CmapId::new(platform_id, encoding_id);
        match self.encoding_records()?.iter().find(|record| record.id() == id) {
            Some(record) => self.subtable_for_record(&record).map(Some),
            None => Ok(None),
        }
    }

    /// Find the first subtable for the given `platform_id`
    pub fn find_subtable_for_platform(
        &self,
        platform_id: PlatformId,
    ) -> Result<Option<CmapSubtable<'_>>, ParseError> {
        let record = self
            .encoding_records()?
            .iter()
            .find(|record| record.platform_id == platform_id.0);
        match record {
            Some(record) => self.subtable_for_record(&record).map(Some),
            None => Ok(None),
        }
    }

    fn subtable_for_record(
        &self,
        record: &EncodingRecord,
    ) -> Result<CmapSubtable<'_>, ParseError> {
        let data = self.table.data();
        let offset = usize::try_from(record.offset)?;
        if offset < HEADER_SIZE || offset > data.len() {
            return Err(ParseError::BadOffset);
        }
        let length = subtable_length(data.scope().offset(offset))?;
        Ok(CmapSubtable {
            id: record.id(),
            subtable: SubTable::from_range(data, offset, length)?,
        })
    }
}

impl_sfnt_table!(CmapTable);

impl SubTableContainer for CmapTable {
    fn subtable_count(&self) -> usize {
        self.num_subtables().unwrap_or(0)
    }
}

impl<'a> CmapSubtable<'a> {
    pub fn id(&self) -> CmapId {
        self.id
    }

    pub fn format(&self) -> Result<u16, ParseError> {
        subtable_format_language(self.subtable.data().bytes()).map(|(format, _)| format)
    }

    /// The language field. Format 14 has none and reports 0.
    pub fn language(&self) -> Result<u32, ParseError> {
        subtable_format_language(self.subtable.data().bytes()).map(|(_, language)| language)
    }

    /// The glyph for `ch`, or `None` if it isn't mapped.
    ///
    /// Fails with `NotImplemented` for formats 2, 8, 13 and 14.
    pub fn map_glyph(&self, ch: u32) -> Result<Option<u16>, ParseError> {
        self.subtable
            .data()
            .scope()
            .read::<Mappings<'_>>()?
            .map_glyph(ch)
    }

    /// Every character mapped to a glyph other than `.notdef`, in character order.
    pub fn mappings(&self) -> Result<BTreeMap<u32, u16>, ParseError> {
        read_mappings(self.subtable.data().bytes())
    }

    pub fn subtable(&self) -> &SubTable<'a> {
        &self.subtable
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::font_data::ReadableFontData;
    use crate::font_data_table::FontDataTable;
    use crate::header::Header;
    use crate::table::{get_builder, AnyTable};
    use crate::tag;
    use crate::tests::writer::{self, TtfType::*};

    /// A format 4 subtable mapping 'A'..='C' to 1..=3 and 'a' to 10 via the glyph id array.
    pub(crate) fn format4_subtable() -> Vec<u8> {
        writer::convert(&[
            UInt16(4),  // format
            UInt16(42), // length
            UInt16(0),  // language
            UInt16(6),  // seg_count_x2
            UInt16(4),  // search_range
            UInt16(1),  // entry_selector
            UInt16(2),  // range_shift
            // end codes
            UInt16(0x43),
            UInt16(0x61),
            UInt16(0xFFFF),
            UInt16(0), // reserved_pad
            // start codes
            UInt16(0x41),
            UInt16(0x61),
            UInt16(0xFFFF),
            // id deltas
            Int16(1 - 0x41),
            Int16(0),
            Int16(1),
            // id range offsets
            UInt16(0),
            UInt16(4),
            UInt16(0),
            // glyph id array
            UInt16(10),
        ])
    }

    /// A format 6 subtable mapping '0'..='2' to 20, 0 and 22.
    pub(crate) fn format6_subtable() -> Vec<u8> {
        writer::convert(&[
            UInt16(6),
            UInt16(16),
            UInt16(0),
            UInt16(0x30),
            UInt16(3),
            UInt16(20),
            UInt16(0),
            UInt16(22),
        ])
    }

    /// A `cmap` table with Unicode BMP and Windows BMP records sharing one format 4 subtable.
    pub(crate) fn cmap_data() -> Vec<u8> {
        let mut data = writer::convert(&[
            UInt16(0), // version
            UInt16(3), // num_tables
            UInt16(0),
            UInt16(3),
            UInt32(28),
            UInt16(1),
            UInt16(0),
            UInt32(70),
            UInt16(3),
            UInt16(1),
            UInt32(28),
        ]);
        data.extend(format4_subtable());
        data.extend(format6_subtable());
        data
    }

    fn cmap_table() -> CmapTable {
        let data = ReadableFontData::new(cmap_data());
        let header = Header::from_record(tag::CMAP, data.checksum(), 0, 86);
        match get_builder(header, data).build() {
            Ok(Some(AnyTable::Cmap(table))) => table,
            other => panic!("expected cmap table, got {:?}", other),
        }
    }

    #[test]
    fn test_encoding_records() {
        let table = cmap_table();
        let records = table.encoding_records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records.get_item(1),
            Some(EncodingRecord {
                platform_id: 1,
                encoding_id: 0,
                offset: 70
            })
        );
        assert_eq!(table.subtable_count(), 3);
    }

    #[test]
    fn test_format4_map_glyph() {
        let table = cmap_table();
        let subtable = table
            .find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2)
            .unwrap()
            .unwrap();
        assert_eq!(subtable.format(), Ok(4));
        assert_eq!(subtable.map_glyph(0x41), Ok(Some(1)));
        assert_eq!(subtable.map_glyph(0x43), Ok(Some(3)));
        assert_eq!(subtable.map_glyph(0x61), Ok(Some(10)));
        assert_eq!(subtable.map_glyph(0x44), Ok(None));
        assert_eq!(subtable.subtable().data_length(), 42);
        assert_eq!(
            subtable.subtable().master_data().map(ReadableFontData::len),
            Some(86)
        );
    }

    #[test]
    fn test_mappings() {
        let table = cmap_table();
        let format4 = table.subtable(0).unwrap().mappings().unwrap();
        assert_eq!(
            format4.into_iter().collect::<Vec<_>>(),
            vec![(0x41, 1), (0x42, 2), (0x43, 3), (0x61, 10)]
        );

        let format6 = table
            .find_subtable_for_platform(PlatformId::MACINTOSH)
            .unwrap()
            .unwrap();
        assert_eq!(format6.format(), Ok(6));
        assert_eq!(
            format6.mappings().unwrap().into_iter().collect::<Vec<_>>(),
            vec![(0x30, 20), (0x32, 22)]
        );
    }

    #[test]
    fn test_subtable_length_formats() {
        let format14 = writer::convert(&[UInt16(14), UInt32(10), UInt32(0)]);
        assert_eq!(subtable_length(ReadScope::new(&format14)), Ok(10));
        let format13 = writer::convert(&[UInt16(13), UInt16(0), UInt32(16)]);
        assert_eq!(subtable_length(ReadScope::new(&format13)), Ok(16));
        let format3 = writer::convert(&[UInt16(3), UInt16(6)]);
        assert_eq!(
            subtable_length(ReadScope::new(&format3)),
            Err(ParseError::BadVersion)
        );
    }

    fn format12_subtable(start: u32, end: u32, start_glyph_id: u32) -> Vec<u8> {
        writer::convert(&[
            UInt16(12),
            UInt16(0),
            UInt32(28),
            UInt32(0),
            UInt32(1),
            UInt32(start),
            UInt32(end),
            UInt32(start_glyph_id),
        ])
    }

    #[test]
    fn test_format12_glyph_id_overflow() {
        let data = format12_subtable(0x20, 0x30, u32::MAX - 4);
        let mappings = ReadScope::new(&data).read::<Mappings<'_>>().unwrap();
        assert_eq!(mappings.map_glyph(0x30), Err(ParseError::BadValue));
        assert_eq!(read_mappings(&data), Err(ParseError::BadValue));

        // A group mapping past the last glyph id is rejected before it is walked.
        let data = format12_subtable(0, u32::MAX, 1);
        assert_eq!(read_mappings(&data), Err(ParseError::BadValue));

        let data = format12_subtable(0x20, 0x22, 5);
        assert_eq!(
            read_mappings(&data).unwrap().into_iter().collect::<Vec<_>>(),
            vec![(0x20, 5), (0x21, 6), (0x22, 7)]
        );
    }

    #[test]
    fn test_unsupported_format_not_decoded() {
        let format14 = writer::convert(&[UInt16(14), UInt32(10), UInt32(0)]);
        assert_eq!(read_mappings(&format14), Err(ParseError::NotImplemented));
        assert_eq!(subtable_format_language(&format14), Ok((14, 0)));
    }
}
