//! `hhea` horizontal header table
//!
//! > This table contains information for horizontal layout.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/hhea>

use crate::binary::read::{ReadBinary, ReadCtxt, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, U16Be};
use crate::error::{ParseError, WriteError};
use crate::table::TableBuilder;
use crate::tables::{Record, RecordModel, RecordTable};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Hhea {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    /// Number of `longHorMetric` records in the `hmtx` table.
    pub num_h_metrics: u16,
}

pub type HheaTable = RecordTable<Hhea>;

pub type HheaTableBuilder = TableBuilder<RecordModel<Hhea>>;

impl ReadBinary for Hhea {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let _minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let ascender = ctxt.read_i16be()?;
        let descender = ctxt.read_i16be()?;
        let line_gap = ctxt.read_i16be()?;
        let advance_width_max = ctxt.read_u16be()?;
        let min_left_side_bearing = ctxt.read_i16be()?;
        let min_right_side_bearing = ctxt.read_i16be()?;
        let x_max_extent = ctxt.read_i16be()?;
        let caret_slope_rise = ctxt.read_i16be()?;
        let caret_slope_run = ctxt.read_i16be()?;
        let caret_offset = ctxt.read_i16be()?;
        let _reserved = ctxt.read_slice(8)?;
        let metric_data_format = ctxt.read_i16be()?;
        ctxt.check(metric_data_format == 0)?;
        let num_h_metrics = ctxt.read_u16be()?;

        Ok(Hhea {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            num_h_metrics,
        })
    }
}

impl Record for Hhea {
    fn parse(scope: ReadScope<'_>) -> Result<Self, ParseError> {
        scope.read::<Hhea>()
    }

    fn write_record<C: WriteContext>(ctxt: &mut C, table: &Hhea) -> Result<(), WriteError> {
        U16Be::write(ctxt, 1u16)?; // major_version
        U16Be::write(ctxt, 0u16)?; // minor_version

        I16Be::write(ctxt, table.ascender)?;
        I16Be::write(ctxt, table.descender)?;
        I16Be::write(ctxt, table.line_gap)?;
        U16Be::write(ctxt, table.advance_width_max)?;
        I16Be::write(ctxt, table.min_left_side_bearing)?;
        I16Be::write(ctxt, table.min_right_side_bearing)?;
        I16Be::write(ctxt, table.x_max_extent)?;
        I16Be::write(ctxt, table.caret_slope_rise)?;
        I16Be::write(ctxt, table.caret_slope_run)?;
        I16Be::write(ctxt, table.caret_offset)?;

        ctxt.write_zeros(8)?; // reserved

        I16Be::write(ctxt, 0i16)?; // metric_data_format

        U16Be::write(ctxt, table.num_h_metrics)?;

        Ok(())
    }
}

impl RecordTable<Hhea> {
    pub fn num_h_metrics(&self) -> u16 {
        self.record().num_h_metrics
    }
}

impl TableBuilder<RecordModel<Hhea>> {
    pub fn hhea(&mut self) -> Result<&Hhea, ParseError> {
        self.record()
    }

    pub fn hhea_mut(&mut self) -> Result<&mut Hhea, ParseError> {
        self.record_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_data::ReadableFontData;
    use crate::font_data_table::FontDataTable;
    use crate::header::Header;
    use crate::tag;
    use crate::tests::writer::{self, TtfType::*};

    fn hhea_data(version: u16) -> Vec<u8> {
        writer::convert(&[
            UInt16(version),
            UInt16(0),
            Int16(800),
            Int16(-200),
            Int16(90),
            UInt16(1200),
            Int16(-5),
            Int16(-6),
            Int16(1100),
            Int16(1),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            Int16(0),
            UInt16(7),
        ])
    }

    #[test]
    fn test_read_hhea() {
        let hhea = ReadScope::new(&hhea_data(1)).read::<Hhea>().unwrap();
        assert_eq!(hhea.ascender, 800);
        assert_eq!(hhea.descender, -200);
        assert_eq!(hhea.num_h_metrics, 7);
    }

    #[test]
    fn test_bad_version() {
        assert_eq!(
            ReadScope::new(&hhea_data(2)).read::<Hhea>(),
            Err(ParseError::BadVersion)
        );
    }

    #[test]
    fn test_edit_num_h_metrics() {
        let data = ReadableFontData::new(hhea_data(1));
        let mut builder = HheaTableBuilder::with_header_data(
            Header::with_length(tag::HHEA, 36),
            data,
            Default::default(),
        );
        builder.hhea_mut().unwrap().num_h_metrics = 3;
        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.num_h_metrics(), 3);
        assert_eq!(table.record().ascender, 800);

        let mut expected = hhea_data(1);
        expected[35] = 3;
        assert_eq!(table.read_font_data().bytes(), &expected[..]);
    }
}
