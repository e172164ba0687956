//! `head` font header table, also used for the Apple `bhed` table.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/head>

use bitflags::bitflags;

use crate::binary::read::{ReadBinary, ReadCtxt, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, I64Be, U16Be, U32Be};
use crate::error::{ParseError, WriteError};
use crate::table::TableBuilder;
use crate::tables::{Fixed, IndexToLocFormat, LongDateTime, Record, RecordModel, RecordTable};

/// Offset of the `checkSumAdjustment` field from the start of the table.
pub const CHECKSUM_ADJUSTMENT_OFFSET: usize = 8;

/// Value of the `magicNumber` field.
pub const MAGIC_NUMBER: u32 = 0x5F0F3CF5;

/// The whole font sums to this value once `checkSumAdjustment` is set.
pub const CHECKSUM_MAGIC: u32 = 0xB1B0AFBA;

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct HeadFlags: u16 {
        const BASELINE_AT_Y_0 = 1 << 0;
        const LEFT_SIDEBEARING_AT_X_0 = 1 << 1;
        const INSTRUCTIONS_DEPEND_ON_POINT_SIZE = 1 << 2;
        const FORCE_PPEM_TO_INTEGER = 1 << 3;
        const INSTRUCTIONS_ALTER_ADVANCE_WIDTH = 1 << 4;
        // Bits 5-10 are not used by OpenType.
        const LOSSLESS = 1 << 11;
        const CONVERTED = 1 << 12;
        const OPTIMIZED_FOR_CLEARTYPE = 1 << 13;
        const LAST_RESORT = 1 << 14;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct MacStyle: u16 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const OUTLINE = 1 << 3;
        const SHADOW = 1 << 4;
        const CONDENSED = 1 << 5;
        const EXTENDED = 1 << 6;
    }
}

/// The `head` record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Head {
    pub major_version: u16,
    pub minor_version: u16,
    pub font_revision: Fixed,
    pub check_sum_adjustment: u32,
    pub magic_number: u32,
    pub flags: HeadFlags,
    pub units_per_em: u16,
    pub created: LongDateTime,
    pub modified: LongDateTime,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: MacStyle,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    pub index_to_loc_format: IndexToLocFormat,
    pub glyph_data_format: i16,
}

pub type HeadTable = RecordTable<Head>;

pub type HeadTableBuilder = TableBuilder<RecordModel<Head>>;

impl Default for Head {
    fn default() -> Self {
        Head {
            major_version: 1,
            minor_version: 0,
            font_revision: Fixed::new(0x0001_0000),
            check_sum_adjustment: 0,
            magic_number: MAGIC_NUMBER,
            flags: HeadFlags::BASELINE_AT_Y_0 | HeadFlags::LEFT_SIDEBEARING_AT_X_0,
            units_per_em: 1000,
            created: 0,
            modified: 0,
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
            mac_style: MacStyle::empty(),
            lowest_rec_ppem: 0,
            font_direction_hint: 2,
            index_to_loc_format: IndexToLocFormat::Short,
            glyph_data_format: 0,
        }
    }
}

impl ReadBinary for Head {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read::<U16Be>()?;
        let minor_version = ctxt.read::<U16Be>()?;
        let font_revision = ctxt.read::<Fixed>()?;
        let check_sum_adjustment = ctxt.read::<U32Be>()?;
        let magic_number = ctxt.read::<U32Be>()?;
        ctxt.check(magic_number == MAGIC_NUMBER)?;
        let flags = HeadFlags::from_bits_retain(ctxt.read::<U16Be>()?);
        let units_per_em = ctxt.read::<U16Be>()?;
        let created = ctxt.read::<I64Be>()?;
        let modified = ctxt.read::<I64Be>()?;
        let x_min = ctxt.read::<I16Be>()?;
        let y_min = ctxt.read::<I16Be>()?;
        let x_max = ctxt.read::<I16Be>()?;
        let y_max = ctxt.read::<I16Be>()?;
        let mac_style = MacStyle::from_bits_retain(ctxt.read::<U16Be>()?);
        let lowest_rec_ppem = ctxt.read::<U16Be>()?;
        let font_direction_hint = ctxt.read::<I16Be>()?;
        let index_to_loc_format = ctxt.read::<IndexToLocFormat>()?;
        let glyph_data_format = ctxt.read::<I16Be>()?;

        Ok(Head {
            major_version,
            minor_version,
            font_revision,
            check_sum_adjustment,
            magic_number,
            flags,
            units_per_em,
            created,
            modified,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            font_direction_hint,
            index_to_loc_format,
            glyph_data_format,
        })
    }
}

impl Record for Head {
    fn parse(scope: ReadScope<'_>) -> Result<Self, ParseError> {
        scope.read::<Head>()
    }

    fn write_record<C: WriteContext>(ctxt: &mut C, head: &Head) -> Result<(), WriteError> {
        U16Be::write(ctxt, head.major_version)?;
        U16Be::write(ctxt, head.minor_version)?;
        Fixed::write(ctxt, head.font_revision)?;
        U32Be::write(ctxt, head.check_sum_adjustment)?;
        U32Be::write(ctxt, head.magic_number)?;
        U16Be::write(ctxt, head.flags.bits())?;
        U16Be::write(ctxt, head.units_per_em)?;
        I64Be::write(ctxt, head.created)?;
        I64Be::write(ctxt, head.modified)?;
        I16Be::write(ctxt, head.x_min)?;
        I16Be::write(ctxt, head.y_min)?;
        I16Be::write(ctxt, head.x_max)?;
        I16Be::write(ctxt, head.y_max)?;
        U16Be::write(ctxt, head.mac_style.bits())?;
        U16Be::write(ctxt, head.lowest_rec_ppem)?;
        I16Be::write(ctxt, head.font_direction_hint)?;
        IndexToLocFormat::write(ctxt, head.index_to_loc_format)?;
        I16Be::write(ctxt, head.glyph_data_format)?;

        Ok(())
    }
}

impl Head {
    pub fn is_bold(&self) -> bool {
        self.mac_style.contains(MacStyle::BOLD)
    }

    pub fn is_italic(&self) -> bool {
        self.mac_style.contains(MacStyle::ITALIC)
    }
}

impl RecordTable<Head> {
    pub fn head(&self) -> &Head {
        self.record()
    }

    pub fn units_per_em(&self) -> u16 {
        self.record().units_per_em
    }

    pub fn index_to_loc_format(&self) -> IndexToLocFormat {
        self.record().index_to_loc_format
    }
}

impl TableBuilder<RecordModel<Head>> {
    pub fn head(&mut self) -> Result<&Head, ParseError> {
        self.record()
    }

    pub fn head_mut(&mut self) -> Result<&mut Head, ParseError> {
        self.record_mut()
    }

    pub fn set_units_per_em(&mut self, units_per_em: u16) -> Result<(), ParseError> {
        self.head_mut()?.units_per_em = units_per_em;
        Ok(())
    }

    pub fn set_font_revision(&mut self, font_revision: Fixed) -> Result<(), ParseError> {
        self.head_mut()?.font_revision = font_revision;
        Ok(())
    }

    pub fn set_modified(&mut self, modified: LongDateTime) -> Result<(), ParseError> {
        self.head_mut()?.modified = modified;
        Ok(())
    }

    pub fn set_index_to_loc_format(
        &mut self,
        index_to_loc_format: IndexToLocFormat,
    ) -> Result<(), ParseError> {
        self.head_mut()?.index_to_loc_format = index_to_loc_format;
        Ok(())
    }

    pub fn set_check_sum_adjustment(&mut self, adjustment: u32) -> Result<(), ParseError> {
        self.head_mut()?.check_sum_adjustment = adjustment;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_data::ReadableFontData;
    use crate::font_data_table::FontDataTable;
    use crate::header::Header;
    use crate::table::SfntTable;
    use crate::tag;
    use crate::tests::writer::{self, TtfType::*};

    fn head_data() -> Vec<u8> {
        writer::convert(&[
            UInt16(1),
            UInt16(0),
            Int32(0x0002_0000),
            UInt32(0xDEADBEEF),
            UInt32(MAGIC_NUMBER),
            UInt16(0b1000_0000_0000_1011),
            UInt16(2048),
            Int32(0),
            Int32(100),
            Int32(0),
            Int32(200),
            Int16(-10),
            Int16(-20),
            Int16(1000),
            Int16(900),
            UInt16(3),
            UInt16(8),
            Int16(2),
            Int16(1),
            Int16(0),
        ])
    }

    #[test]
    fn test_read_head() {
        let data = head_data();
        assert_eq!(data.len(), 54);
        let head = ReadScope::new(&data).read::<Head>().unwrap();
        assert_eq!(head.units_per_em, 2048);
        assert_eq!(head.font_revision, Fixed::new(0x0002_0000));
        assert_eq!(head.created, 100);
        assert!(head.flags.contains(HeadFlags::FORCE_PPEM_TO_INTEGER));
        assert_eq!(head.flags.bits(), 0b1000_0000_0000_1011);
        assert!(head.is_bold() && head.is_italic());
        assert_eq!(head.index_to_loc_format, IndexToLocFormat::Long);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = head_data();
        data[12] = 0;
        assert_eq!(
            ReadScope::new(&data).read::<Head>(),
            Err(ParseError::BadValue)
        );
    }

    #[test]
    fn test_unchanged_build_is_identical() {
        let data = ReadableFontData::new(head_data());
        let header = Header::from_record(tag::HEAD, data.checksum(), 0, 54);
        let builder = HeadTableBuilder::with_header_data(header, data.clone(), Default::default());
        let table = builder.build().unwrap().unwrap();

        let mut out = Vec::new();
        assert_eq!(table.serialize(&mut out).unwrap(), 54);
        assert_eq!(out, head_data());
        assert_eq!(table.header_checksum(), data.checksum());
        assert_eq!(table.units_per_em(), 2048);
    }

    #[test]
    fn test_edit_round_trips() {
        let data = ReadableFontData::new(head_data());
        let header = Header::from_record(tag::HEAD, data.checksum(), 0, 54);
        let mut builder = HeadTableBuilder::with_header_data(header, data, Default::default());
        assert!(!builder.changed());
        assert_eq!(builder.head().unwrap().units_per_em, 2048);
        assert!(!builder.changed());

        builder.set_units_per_em(1000).unwrap();
        builder.set_check_sum_adjustment(0).unwrap();
        assert!(builder.changed());

        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.units_per_em(), 1000);
        assert_eq!(table.head().check_sum_adjustment, 0);
        assert_eq!(table.head().flags.bits(), 0b1000_0000_0000_1011);
        assert_eq!(table.data_length(), 54);
        assert_eq!(table.header_length(), 54);
        assert!(!table.header().offset_valid());
        assert!(!table.header().checksum_valid());
    }

    #[test]
    fn test_new_table_uses_default() {
        let mut builder = HeadTableBuilder::with_header(Header::new(tag::HEAD), Default::default());
        builder.set_units_per_em(512).unwrap();
        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.head().magic_number, MAGIC_NUMBER);
        assert_eq!(table.head().major_version, 1);
        assert_eq!(table.units_per_em(), 512);
        assert_eq!(table.header_length(), 54);
    }

    #[test]
    fn test_untouched_new_table_builds_nothing() {
        let mut builder = HeadTableBuilder::with_header(Header::new(tag::HEAD), Default::default());
        assert_eq!(builder.head().unwrap().units_per_em, 1000);
        assert!(builder.build().unwrap().is_none());
    }
}
