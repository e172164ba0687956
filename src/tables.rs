//! Typed SFNT tables and their builders.

pub mod cmap;
pub mod cvt;
pub mod hdmx;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod maxp;
pub mod program;

use crate::binary::read::{ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext, WriteCounter};
use crate::binary::{I16Be, I32Be};
use crate::error::{ParseError, WriteError};
use crate::font_data::{ReadableFontData, SerializeSize, WritableFontData};
use crate::font_data_table::FontDataTable;
use crate::header::Header;
use crate::table::{SfntTable, Table, TableBuilder, TableModel};

/// 32-bit signed fixed-point number (16.16)
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Fixed(i32);

/// Date represented in number of seconds since 12:00 midnight, January 1, 1904
///
/// The value is represented as a signed 64-bit integer.
pub type LongDateTime = i64;

/// The size of the offsets in the `loca` table
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum IndexToLocFormat {
    /// Offsets are 16-bit. The actual local offset divided by 2 is stored.
    #[default]
    Short,
    /// Offsets are 32-bit. The actual local offset is stored.
    Long,
}

/// A table that is a single fixed record, such as `head` or `hhea`.
pub trait Record: Clone + Default {
    fn parse(scope: ReadScope<'_>) -> Result<Self, ParseError>;

    fn write_record<C: WriteContext>(ctxt: &mut C, record: &Self) -> Result<(), WriteError>;
}

/// Builder model of a single record table, decoded on first access.
#[derive(Debug, Default)]
pub struct RecordModel<R> {
    record: Option<R>,
}

/// A built single record table.
#[derive(Debug, Clone)]
pub struct RecordTable<R> {
    table: Table,
    record: R,
}

impl<R: Record> RecordModel<R> {
    /// Decode the record from `scope` unless already decoded. With no data the record is the
    /// default for its type.
    fn decode(&mut self, scope: ReadScope<'_>) -> Result<&mut R, ParseError> {
        let record = match self.record.take() {
            Some(record) => record,
            None if scope.data().is_empty() => R::default(),
            None => R::parse(scope)?,
        };
        Ok(self.record.insert(record))
    }
}

impl<R: Record> TableModel for RecordModel<R> {
    type Table = RecordTable<R>;

    fn sub_serialize(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError> {
        let record = self.record.as_ref().ok_or(WriteError::BadValue)?;
        R::write_record(new_data, record)?;
        Ok(new_data.bytes_written())
    }

    fn sub_ready_to_serialize(&self) -> bool {
        self.record.is_some()
    }

    fn sub_data_size_to_serialize(&self) -> SerializeSize {
        let mut counter = WriteCounter::new();
        match &self.record {
            Some(record) if R::write_record(&mut counter, record).is_ok() => {
                SerializeSize::Fixed(counter.bytes_written())
            }
            _ => SerializeSize::Estimate(0),
        }
    }

    fn sub_data_set(&mut self) {
        self.record = None;
    }

    fn sub_build_table(
        &mut self,
        header: Header,
        data: ReadableFontData,
    ) -> Result<RecordTable<R>, ParseError> {
        let record = R::parse(data.scope())?;
        Ok(RecordTable {
            table: Table::new(header, data),
            record,
        })
    }
}

impl<R: Record> RecordTable<R> {
    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl<R: Record> TableBuilder<RecordModel<R>> {
    /// The decoded record. Reading does not mark the builder changed.
    pub fn record(&mut self) -> Result<&R, ParseError> {
        let (hooks, scope) = self.split_mut();
        hooks.model.decode(scope).map(|record| &*record)
    }

    /// The decoded record, for editing. The builder is marked changed.
    pub fn record_mut(&mut self) -> Result<&mut R, ParseError> {
        {
            let (hooks, scope) = self.split_mut();
            hooks.model.decode(scope)?;
        }
        self.set_model_changed(true);
        self.hooks_mut()
            .model
            .record
            .as_mut()
            .ok_or(ParseError::MissingValue)
    }

    /// Replace the record.
    pub fn set_record(&mut self, record: R) {
        self.hooks_mut().model.record = Some(record);
        self.set_model_changed(true);
    }
}

impl<R: Record> FontDataTable for RecordTable<R> {
    fn read_font_data(&self) -> &ReadableFontData {
        self.table.read_font_data()
    }
}

impl<R: Record> SfntTable for RecordTable<R> {
    fn header(&self) -> &Header {
        self.table.header()
    }

    fn set_header(&mut self, header: Header) {
        self.table.set_header(header)
    }
}

impl Fixed {
    pub fn new(value: i32) -> Fixed {
        Fixed(value)
    }

    pub fn raw_value(self) -> i32 {
        self.0
    }
}

impl ReadFrom for Fixed {
    type ReadType = I32Be;

    fn read_from(value: i32) -> Self {
        Fixed(value)
    }
}

impl WriteBinary for Fixed {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, val: Self) -> Result<(), WriteError> {
        I32Be::write(ctxt, val.0)
    }
}

impl From<Fixed> for f32 {
    fn from(value: Fixed) -> f32 {
        (f64::from(value.0) / 65536.0) as f32
    }
}

impl ReadBinary for IndexToLocFormat {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let index_to_loc_format = ctxt.read_i16be()?;

        match index_to_loc_format {
            0 => Ok(IndexToLocFormat::Short),
            1 => Ok(IndexToLocFormat::Long),
            _ => Err(ParseError::BadValue),
        }
    }
}

impl WriteBinary for IndexToLocFormat {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, index_to_loc_format: Self) -> Result<(), WriteError> {
        match index_to_loc_format {
            IndexToLocFormat::Short => I16Be::write(ctxt, 0i16),
            IndexToLocFormat::Long => I16Be::write(ctxt, 1i16),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_to_f32() {
        assert_eq!(f32::from(Fixed::new(0x0001_8000)), 1.5);
    }

    #[test]
    fn test_index_to_loc_format() {
        assert_eq!(
            ReadScope::new(&[0, 1]).read::<IndexToLocFormat>(),
            Ok(IndexToLocFormat::Long)
        );
        assert_eq!(
            ReadScope::new(&[0, 2]).read::<IndexToLocFormat>(),
            Err(ParseError::BadValue)
        );
    }
}
