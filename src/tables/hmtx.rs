//! `hmtx` horizontal metrics table
//!
//! The layout of `hmtx` depends on `numberOfHMetrics` from `hhea` and `numGlyphs` from `maxp`,
//! so both the table and its builder are told these counts before the metrics are decoded.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/hmtx>

use crate::binary::read::{ReadArray, ReadFrom, ReadScope, ReadUnchecked};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, U16Be};
use crate::error::{ParseError, WriteError};
use crate::font_data::{ReadableFontData, SerializeSize, WritableFontData};
use crate::header::Header;
use crate::size;
use crate::table::{Table, TableBuilder, TableModel};

/// A `longHorMetric` record in the `hmtx` table.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct LongHorMetric {
    pub advance_width: u16,
    pub lsb: i16,
}

/// Decoded contents of an `hmtx` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HorizontalMetrics {
    pub h_metrics: Vec<LongHorMetric>,
    /// Left side bearings of the glyphs after the last long metric.
    pub left_side_bearings: Vec<i16>,
}

#[derive(Debug, Clone)]
pub struct HmtxTable {
    table: Table,
    num_glyphs: Option<u16>,
    num_h_metrics: Option<u16>,
}

#[derive(Debug, Default)]
pub struct HmtxModel {
    num_glyphs: Option<u16>,
    num_h_metrics: Option<u16>,
    metrics: Option<HorizontalMetrics>,
}

pub type HmtxTableBuilder = TableBuilder<HmtxModel>;

impl ReadFrom for LongHorMetric {
    type ReadType = (U16Be, I16Be);

    fn read_from((advance_width, lsb): (u16, i16)) -> Self {
        LongHorMetric { advance_width, lsb }
    }
}

impl WriteBinary for LongHorMetric {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, metric: LongHorMetric) -> Result<(), WriteError> {
        U16Be::write(ctxt, metric.advance_width)?;
        I16Be::write(ctxt, metric.lsb)?;

        Ok(())
    }
}

struct HmtxArrays<'a> {
    h_metrics: ReadArray<'a, LongHorMetric>,
    left_side_bearings: ReadArray<'a, I16Be>,
}

fn read_arrays<'a>(
    scope: ReadScope<'a>,
    num_glyphs: Option<u16>,
    num_h_metrics: Option<u16>,
) -> Result<HmtxArrays<'a>, ParseError> {
    let num_glyphs = usize::from(num_glyphs.ok_or(ParseError::MissingValue)?);
    let num_h_metrics = usize::from(num_h_metrics.ok_or(ParseError::MissingValue)?);
    let mut ctxt = scope.ctxt();
    let h_metrics = ctxt.read_array::<LongHorMetric>(num_h_metrics)?;
    let left_side_bearings = ctxt.read_array::<I16Be>(num_glyphs.saturating_sub(num_h_metrics))?;
    Ok(HmtxArrays {
        h_metrics,
        left_side_bearings,
    })
}

impl HorizontalMetrics {
    fn read(
        scope: ReadScope<'_>,
        num_glyphs: Option<u16>,
        num_h_metrics: Option<u16>,
    ) -> Result<Self, ParseError> {
        let arrays = read_arrays(scope, num_glyphs, num_h_metrics)?;
        Ok(HorizontalMetrics {
            h_metrics: arrays.h_metrics.to_vec(),
            left_side_bearings: arrays.left_side_bearings.to_vec(),
        })
    }

    fn size(&self) -> usize {
        self.h_metrics.len() * LongHorMetric::SIZE + self.left_side_bearings.len() * size::I16
    }
}

impl HmtxTable {
    pub fn num_glyphs(&self) -> Option<u16> {
        self.num_glyphs
    }

    pub fn num_h_metrics(&self) -> Option<u16> {
        self.num_h_metrics
    }

    /// The advance width of `glyph_id`.
    ///
    /// Glyphs past the last long metric share its advance width.
    pub fn advance_width(&self, glyph_id: u16) -> Result<u16, ParseError> {
        let arrays = self.arrays()?;
        let index = usize::from(glyph_id);
        if index >= arrays.h_metrics.len() + arrays.left_side_bearings.len() {
            return Err(ParseError::BadIndex);
        }
        let metric = match arrays.h_metrics.get_item(index) {
            Some(metric) => metric,
            None => arrays.h_metrics.last().ok_or(ParseError::BadIndex)?,
        };
        Ok(metric.advance_width)
    }

    pub fn left_side_bearing(&self, glyph_id: u16) -> Result<i16, ParseError> {
        let arrays = self.arrays()?;
        let index = usize::from(glyph_id);
        match arrays.h_metrics.get_item(index) {
            Some(metric) => Ok(metric.lsb),
            None => arrays
                .left_side_bearings
                .get_item(index - arrays.h_metrics.len())
                .ok_or(ParseError::BadIndex),
        }
    }

    pub fn metrics(&self) -> Result<HorizontalMetrics, ParseError> {
        HorizontalMetrics::read(self.table.data().scope(), self.num_glyphs, self.num_h_metrics)
    }

    fn arrays(&self) -> Result<HmtxArrays<'_>, ParseError> {
        read_arrays(self.table.data().scope(), self.num_glyphs, self.num_h_metrics)
    }
}

impl_sfnt_table!(HmtxTable);

impl TableModel for HmtxModel {
    type Table = HmtxTable;

    fn sub_serialize(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError> {
        let metrics = self.metrics.as_ref().ok_or(WriteError::BadValue)?;
        new_data.write_iter::<LongHorMetric, _>(metrics.h_metrics.iter().copied())?;
        new_data.write_iter::<I16Be, _>(metrics.left_side_bearings.iter().copied())?;
        Ok(metrics.size())
    }

    fn sub_ready_to_serialize(&self) -> bool {
        let metrics = match &self.metrics {
            Some(metrics) if !metrics.h_metrics.is_empty() => metrics,
            _ => return false,
        };
        let num_glyphs = metrics.h_metrics.len() + metrics.left_side_bearings.len();
        self.num_glyphs.map_or(true, |count| usize::from(count) == num_glyphs)
            && self
                .num_h_metrics
                .map_or(true, |count| usize::from(count) == metrics.h_metrics.len())
    }

    fn sub_data_size_to_serialize(&self) -> SerializeSize {
        match &self.metrics {
            Some(metrics) => SerializeSize::Fixed(metrics.size()),
            None => SerializeSize::Estimate(0),
        }
    }

    fn sub_data_set(&mut self) {
        self.metrics = None;
    }

    fn sub_build_table(
        &mut self,
        header: Header,
        data: ReadableFontData,
    ) -> Result<HmtxTable, ParseError> {
        // A built table reports the counts of the metrics it was serialized from.
        let (num_glyphs, num_h_metrics) = match &self.metrics {
            Some(metrics) => (
                Some(u16::try_from(
                    metrics.h_metrics.len() + metrics.left_side_bearings.len(),
                )?),
                Some(u16::try_from(metrics.h_metrics.len())?),
            ),
            None => (self.num_glyphs, self.num_h_metrics),
        };
        Ok(HmtxTable {
            table: Table::new(header, data),
            num_glyphs,
            num_h_metrics,
        })
    }
}

impl TableBuilder<HmtxModel> {
    pub fn num_glyphs(&self) -> Option<u16> {
        self.model().num_glyphs
    }

    pub fn num_h_metrics(&self) -> Option<u16> {
        self.model().num_h_metrics
    }

    /// Set the glyph count from `maxp`.
    pub fn set_num_glyphs(&mut self, num_glyphs: u16) -> Result<(), ParseError> {
        if self.num_glyphs() != Some(num_glyphs) {
            self.change_count()?;
            self.hooks_mut().model.num_glyphs = Some(num_glyphs);
        }
        Ok(())
    }

    /// Set the long metric count from `hhea`.
    pub fn set_num_h_metrics(&mut self, num_h_metrics: u16) -> Result<(), ParseError> {
        if self.num_h_metrics() != Some(num_h_metrics) {
            self.change_count()?;
            self.hooks_mut().model.num_h_metrics = Some(num_h_metrics);
        }
        Ok(())
    }

    /// Once both counts are known the metrics are decoded with them before either changes.
    /// The table is then changed and its metrics must match the new counts before it can be
    /// serialized.
    fn change_count(&mut self) -> Result<(), ParseError> {
        let model = self.model();
        if model.num_glyphs.is_some() && model.num_h_metrics.is_some() {
            self.decode()?;
            self.set_model_changed(true);
        }
        Ok(())
    }

    fn decode(&mut self) -> Result<(), ParseError> {
        let (hooks, scope) = self.split_mut();
        let model = &mut hooks.model;
        if model.metrics.is_none() {
            let metrics = if scope.data().is_empty() {
                HorizontalMetrics::default()
            } else {
                HorizontalMetrics::read(scope, model.num_glyphs, model.num_h_metrics)?
            };
            model.metrics = Some(metrics);
        }
        Ok(())
    }

    /// The decoded metrics. Decoding fails with `MissingValue` while either count is unknown.
    pub fn metrics(&mut self) -> Result<&HorizontalMetrics, ParseError> {
        self.decode()?;
        self.model().metrics.as_ref().ok_or(ParseError::MissingValue)
    }

    pub fn metrics_mut(&mut self) -> Result<&mut HorizontalMetrics, ParseError> {
        self.decode()?;
        self.set_model_changed(true);
        self.hooks_mut()
            .model
            .metrics
            .as_mut()
            .ok_or(ParseError::MissingValue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadWriteError;
    use crate::font_data_table::FontDataTable;
    use crate::tag;
    use crate::tests::writer::{self, TtfType::*};

    fn hmtx_data() -> ReadableFontData {
        ReadableFontData::new(writer::convert(&[
            UInt16(500),
            Int16(10),
            UInt16(600),
            Int16(20),
            Int16(30),
            Int16(-40),
        ]))
    }

    fn builder() -> HmtxTableBuilder {
        let header = Header::with_length(tag::HMTX, 12);
        HmtxTableBuilder::with_header_data(header, hmtx_data(), Default::default())
    }

    #[test]
    fn test_counts_required() {
        let mut builder = builder();
        assert_eq!(builder.metrics().err(), Some(ParseError::MissingValue));
        builder.set_num_glyphs(4).unwrap();
        assert_eq!(builder.metrics().err(), Some(ParseError::MissingValue));

        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.advance_width(0), Err(ParseError::MissingValue));
        assert_eq!(table.left_side_bearing(0), Err(ParseError::MissingValue));
    }

    #[test]
    fn test_metrics() {
        let mut builder = builder();
        builder.set_num_glyphs(4).unwrap();
        builder.set_num_h_metrics(2).unwrap();
        let metrics = builder.metrics().unwrap();
        assert_eq!(metrics.h_metrics.len(), 2);
        assert_eq!(metrics.left_side_bearings, vec![30, -40]);
        assert!(!builder.changed());

        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.advance_width(1), Ok(600));
        assert_eq!(table.advance_width(3), Ok(600));
        assert_eq!(table.advance_width(4), Err(ParseError::BadIndex));
        assert_eq!(table.left_side_bearing(0), Ok(10));
        assert_eq!(table.left_side_bearing(3), Ok(-40));
        assert_eq!(table.left_side_bearing(4), Err(ParseError::BadIndex));
    }

    #[test]
    fn test_edit_metrics() {
        let mut builder = builder();
        builder.set_num_glyphs(4).unwrap();
        builder.set_num_h_metrics(2).unwrap();
        builder.metrics_mut().unwrap().h_metrics.push(LongHorMetric {
            advance_width: 700,
            lsb: 1,
        });
        builder.metrics_mut().unwrap().left_side_bearings.truncate(1);
        builder.set_num_h_metrics(3).unwrap();

        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.data_length(), 14);
        assert_eq!(table.num_h_metrics(), Some(3));
        assert_eq!(table.num_glyphs(), Some(4));
        assert_eq!(table.advance_width(2), Ok(700));
        assert_eq!(table.left_side_bearing(3), Ok(30));
    }

    #[test]
    fn test_count_change_needs_new_metrics() {
        let mut builder = builder();
        builder.set_num_glyphs(4).unwrap();
        builder.set_num_h_metrics(2).unwrap();
        assert!(!builder.changed());

        builder.set_num_glyphs(5).unwrap();
        assert!(builder.current_model_changed());
        assert_eq!(builder.data(), Err(WriteError::NotReadyToSerialize(tag::HMTX)));

        // The metrics were read with the old counts.
        let metrics = builder.metrics_mut().unwrap();
        assert_eq!(metrics.left_side_bearings, vec![30, -40]);
        metrics.left_side_bearings.push(50);
        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.num_glyphs(), Some(5));
        assert_eq!(table.left_side_bearing(4), Ok(50));
    }

    #[test]
    fn test_long_metric_count_mismatch_not_ready() {
        let mut builder = builder();
        builder.set_num_glyphs(4).unwrap();
        builder.set_num_h_metrics(2).unwrap();
        builder.set_num_h_metrics(3).unwrap();
        assert_eq!(
            builder.build().err(),
            Some(ReadWriteError::Write(WriteError::NotReadyToSerialize(tag::HMTX)))
        );
    }

    #[test]
    fn test_empty_metrics_not_ready() {
        let mut builder = HmtxTableBuilder::with_header(Header::new(tag::HMTX), Default::default());
        builder.metrics_mut().unwrap();
        assert_eq!(
            builder.build().err(),
            Some(ReadWriteError::Write(WriteError::NotReadyToSerialize(tag::HMTX)))
        );
    }
}
