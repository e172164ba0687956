//! `hdmx` horizontal device metrics table
//!
//! The table holds one device record per pixel size. Each record is its own subtable: a pixel
//! size, a maximum width and one width per glyph, padded to a 32-bit boundary. The record
//! length depends on `numGlyphs` from `maxp`.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/hdmx>

use crate::binary::read::{ReadBinary, ReadCtxt, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{long_align, I16Be, U16Be, U32Be, U8};
use crate::error::{ParseError, WriteError};
use crate::font_data::{ReadableFontData, SerializeSize, WritableFontData};
use crate::font_data_table::{BuilderHooks, ChangeFlag, FontDataTableBuilder};
use crate::header::Header;
use crate::subtable::{SubTable, SubTableContainer};
use crate::table::{Table, TableBuilder, TableModel};

const HEADER_SIZE: usize = 8;
const RECORD_HEADER_SIZE: usize = 2;

struct HdmxHeader {
    num_records: usize,
    size_device_record: usize,
}

impl ReadBinary for HdmxHeader {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 0)?;
        let num_records = usize::try_from(ctxt.read_i16be()?)?;
        let size_device_record = usize::try_from(ctxt.read_i32be()?)?;
        Ok(HdmxHeader {
            num_records,
            size_device_record,
        })
    }
}

/// Length of a device record for `num_glyphs` glyphs.
pub fn device_record_size(num_glyphs: u16) -> usize {
    long_align(RECORD_HEADER_SIZE + usize::from(num_glyphs))
}

#[derive(Debug, Clone)]
pub struct HdmxTable {
    table: Table,
    num_glyphs: Option<u16>,
}

/// A device record, viewed as a subtable of its `hdmx` table.
#[derive(Debug, Clone)]
pub struct DeviceRecord<'a> {
    subtable: SubTable<'a>,
}

impl HdmxTable {
    fn read_header(&self) -> Result<HdmxHeader, ParseError> {
        self.table.data().scope().read::<HdmxHeader>()
    }

    pub fn num_glyphs(&self) -> Option<u16> {
        self.num_glyphs
    }

    pub fn num_records(&self) -> Result<usize, ParseError> {
        self.read_header().map(|header| header.num_records)
    }

    pub fn size_device_record(&self) -> Result<usize, ParseError> {
        self.read_header().map(|header| header.size_device_record)
    }

    /// The record at `index`. The glyph count must be known to find the padding.
    pub fn device_record(&self, index: usize) -> Result<DeviceRecord<'_>, ParseError> {
        let num_glyphs = usize::from(self.num_glyphs.ok_or(ParseError::MissingValue)?);
        let header = self.read_header()?;
        if index >= header.num_records {
            return Err(ParseError::BadIndex);
        }
        let content = RECORD_HEADER_SIZE + num_glyphs;
        if header.size_device_record < content {
            return Err(ParseError::BadValue);
        }
        let offset = HEADER_SIZE + index * header.size_device_record;
        let mut subtable =
            SubTable::from_range(self.table.data(), offset, header.size_device_record)?;
        subtable.set_padding(header.size_device_record - content);
        Ok(DeviceRecord { subtable })
    }
}

impl_sfnt_table!(HdmxTable);

impl SubTableContainer for HdmxTable {
    fn subtable_count(&self) -> usize {
        self.num_records().unwrap_or(0)
    }
}

impl<'a> DeviceRecord<'a> {
    pub fn pixel_size(&self) -> u8 {
        self.subtable.content()[0]
    }

    pub fn max_width(&self) -> u8 {
        self.subtable.content()[1]
    }

    pub fn widths(&self) -> &[u8] {
        &self.subtable.content()[RECORD_HEADER_SIZE..]
    }

    pub fn width(&self, glyph_id: u16) -> Option<u8> {
        self.widths().get(usize::from(glyph_id)).copied()
    }

    pub fn padding(&self) -> usize {
        self.subtable.padding()
    }

    pub fn subtable(&self) -> &SubTable<'a> {
        &self.subtable
    }
}

/// The decoded contents of a device record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HdmxRecord {
    pub pixel_size: u8,
    pub max_width: u8,
    pub widths: Vec<u8>,
}

impl HdmxRecord {
    fn read(data: &[u8], num_glyphs: u16) -> Result<Self, ParseError> {
        let mut ctxt = ReadScope::new(data).ctxt();
        let pixel_size = ctxt.read_u8()?;
        let max_width = ctxt.read_u8()?;
        let widths = ctxt.read_slice(usize::from(num_glyphs))?.to_vec();
        Ok(HdmxRecord {
            pixel_size,
            max_width,
            widths,
        })
    }
}

#[derive(Debug)]
pub struct DeviceRecordModel {
    num_glyphs: u16,
    record: Option<HdmxRecord>,
}

pub type DeviceRecordBuilder = FontDataTableBuilder<DeviceRecordModel>;

impl BuilderHooks for DeviceRecordModel {
    type Built = SubTable<'static>;

    fn sub_serialize(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError> {
        let record = self.record.as_ref().ok_or(WriteError::BadValue)?;
        let size = device_record_size(self.num_glyphs);
        U8::write(new_data, record.pixel_size)?;
        U8::write(new_data, record.max_width)?;
        new_data.write_bytes(&record.widths)?;
        new_data.write_zeros(size - RECORD_HEADER_SIZE - record.widths.len())?;
        Ok(size)
    }

    fn sub_ready_to_serialize(&self) -> bool {
        self.record
            .as_ref()
            .map_or(false, |record| record.widths.len() == usize::from(self.num_glyphs))
    }

    fn sub_data_size_to_serialize(&self) -> SerializeSize {
        SerializeSize::Fixed(device_record_size(self.num_glyphs))
    }

    fn sub_data_set(&mut self) {
        self.record = None;
    }

    fn sub_build_table(
        &mut self,
        data: ReadableFontData,
    ) -> Result<SubTable<'static>, ParseError> {
        let padding = data
            .len()
            .saturating_sub(RECORD_HEADER_SIZE + usize::from(self.num_glyphs));
        let mut subtable = SubTable::new(data);
        subtable.set_padding(padding);
        Ok(subtable)
    }
}

impl FontDataTableBuilder<DeviceRecordModel> {
    fn from_record_data(num_glyphs: u16, data: ReadableFontData, parent: ChangeFlag) -> Self {
        let model = DeviceRecordModel {
            num_glyphs,
            record: None,
        };
        FontDataTableBuilder::from_data(data, model).with_parent(parent)
    }

    fn decode(&mut self) -> Result<(), ParseError> {
        let (hooks, scope) = self.split_mut();
        if hooks.record.is_none() {
            hooks.record = Some(HdmxRecord::read(scope.data(), hooks.num_glyphs)?);
        }
        Ok(())
    }

    pub fn num_glyphs(&self) -> u16 {
        self.hooks().num_glyphs
    }

    /// Number of filler bytes after the widths.
    pub fn padding(&self) -> usize {
        let num_glyphs = self.num_glyphs();
        device_record_size(num_glyphs) - RECORD_HEADER_SIZE - usize::from(num_glyphs)
    }

    pub fn record(&mut self) -> Result<&HdmxRecord, ParseError> {
        self.decode()?;
        self.hooks().record.as_ref().ok_or(ParseError::MissingValue)
    }

    /// The record, for editing. The builder and its container are marked changed.
    pub fn record_mut(&mut self) -> Result<&mut HdmxRecord, ParseError> {
        self.decode()?;
        self.set_model_changed(true);
        self.hooks_mut()
            .record
            .as_mut()
            .ok_or(ParseError::MissingValue)
    }

    /// Change the glyph count. The record is decoded with the old count first and must then
    /// be given one width per glyph before it can be serialized.
    fn set_num_glyphs(&mut self, num_glyphs: u16) -> Result<(), ParseError> {
        if num_glyphs != self.num_glyphs() {
            self.decode()?;
            self.hooks_mut().num_glyphs = num_glyphs;
            self.set_model_changed(true);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HdmxModel {
    num_glyphs: Option<u16>,
    records: Option<Vec<DeviceRecordBuilder>>,
}

pub type HdmxTableBuilder = TableBuilder<HdmxModel>;

impl SubTableContainer for HdmxModel {
    fn subtable_count(&self) -> usize {
        self.records.as_ref().map_or(0, Vec::len)
    }
}

impl TableModel for HdmxModel {
    type Table = HdmxTable;

    fn sub_serialize(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError> {
        let num_glyphs = self.num_glyphs.ok_or(WriteError::BadValue)?;
        let records = self.records.as_deref().unwrap_or_default();
        U16Be::write(new_data, 0u16)?; // version
        I16Be::write(new_data, i16::try_from(records.len())?)?;
        U32Be::write(new_data, u32::try_from(device_record_size(num_glyphs))?)?;
        let mut size = HEADER_SIZE;
        for record in records {
            size += record.serialize_into(new_data)?;
        }
        Ok(size)
    }

    fn sub_ready_to_serialize(&self) -> bool {
        match (self.num_glyphs, &self.records) {
            (Some(num_glyphs), Some(records)) => records
                .iter()
                .all(|record| record.num_glyphs() == num_glyphs && record.ready_to_serialize()),
            _ => false,
        }
    }

    fn sub_data_size_to_serialize(&self) -> SerializeSize {
        self.records
            .as_deref()
            .unwrap_or_default()
            .iter()
            .fold(SerializeSize::Fixed(HEADER_SIZE), |size, record| {
                size.combine(record.data_size_to_serialize())
            })
    }

    fn sub_data_set(&mut self) {
        self.records = None;
    }

    fn sub_build_table(
        &mut self,
        header: Header,
        data: ReadableFontData,
    ) -> Result<HdmxTable, ParseError> {
        Ok(HdmxTable {
            table: Table::new(header, data),
            num_glyphs: self.num_glyphs,
        })
    }
}

impl TableBuilder<HdmxModel> {
    pub fn num_glyphs(&self) -> Option<u16> {
        self.model().num_glyphs
    }

    /// Set the glyph count from `maxp`.
    ///
    /// Once a count is known, changing it decodes the records with the old count and marks
    /// the table changed. Every record then needs new widths before the table can be
    /// serialized.
    pub fn set_num_glyphs(&mut self, num_glyphs: u16) -> Result<(), ParseError> {
        match self.num_glyphs() {
            Some(old) if old == num_glyphs => return Ok(()),
            Some(_) => {
                for record in self.decode()?.iter_mut() {
                    record.set_num_glyphs(num_glyphs)?;
                }
                self.set_model_changed(true);
            }
            None => {}
        }
        self.hooks_mut().model.num_glyphs = Some(num_glyphs);
        Ok(())
    }

    fn decode(&mut self) -> Result<&mut Vec<DeviceRecordBuilder>, ParseError> {
        let parent = self.change_flag();
        let (hooks, scope) = self.split_mut();
        let model = &mut hooks.model;
        if model.records.is_none() {
            let num_glyphs = model.num_glyphs.ok_or(ParseError::MissingValue)?;
            let mut records = Vec::new();
            if !scope.data().is_empty() {
                let header = scope.read::<HdmxHeader>()?;
                if header.size_device_record != device_record_size(num_glyphs) {
                    return Err(ParseError::BadValue);
                }
                let data = ReadableFontData::from(scope.data());
                for index in 0..header.num_records {
                    let offset = HEADER_SIZE + index * header.size_device_record;
                    let record_data = data.slice(offset, header.size_device_record)?;
                    records.push(DeviceRecordBuilder::from_record_data(
                        num_glyphs,
                        record_data,
                        parent.clone(),
                    ));
                }
            }
            model.records = Some(records);
        }
        model.records.as_mut().ok_or(ParseError::MissingValue)
    }

    /// The device record builders. Decoding needs the glyph count.
    pub fn records(&mut self) -> Result<&[DeviceRecordBuilder], ParseError> {
        self.decode().map(|records| &records[..])
    }

    pub fn record_mut(&mut self, index: usize) -> Result<&mut DeviceRecordBuilder, ParseError> {
        self.decode()?.get_mut(index).ok_or(ParseError::BadIndex)
    }

    pub fn add_record(
        &mut self,
        pixel_size: u8,
        max_width: u8,
        widths: Vec<u8>,
    ) -> Result<&mut DeviceRecordBuilder, ParseError> {
        let parent = self.change_flag();
        let num_glyphs = self.num_glyphs().ok_or(ParseError::MissingValue)?;
        self.decode()?;
        self.set_model_changed(true);

        let model = DeviceRecordModel {
            num_glyphs,
            record: Some(HdmxRecord {
                pixel_size,
                max_width,
                widths,
            }),
        };
        let mut record = FontDataTableBuilder::new(model).with_parent(parent);
        record.set_model_changed(true);
        let records = self.decode()?;
        records.push(record);
        records.last_mut().ok_or(ParseError::MissingValue)
    }

    pub fn remove_record(&mut self, index: usize) -> Result<DeviceRecordBuilder, ParseError> {
        let records = self.decode()?;
        if index >= records.len() {
            return Err(ParseError::BadIndex);
        }
        let record = records.remove(index);
        self.set_model_changed(true);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadWriteError;
    use crate::font_data_table::FontDataTable;
    use crate::tag;
    use crate::tests::writer::{self, TtfType::*};

    // Three glyphs, so each record is 5 bytes padded to 8.
    fn hdmx_data() -> ReadableFontData {
        ReadableFontData::new(writer::convert(&[
            UInt16(0),
            Int16(2),
            Int32(8),
            UInt8(12),
            UInt8(9),
            Raw(&[7, 9, 8]),
            Raw(&[0, 0, 0]),
            UInt8(16),
            UInt8(12),
            Raw(&[10, 12, 11]),
            Raw(&[0, 0, 0]),
        ]))
    }

    fn builder() -> HdmxTableBuilder {
        let data = hdmx_data();
        let header = Header::from_record(tag::HDMX, data.checksum(), 0, 24);
        HdmxTableBuilder::with_header_data(header, data, Default::default())
    }

    #[test]
    fn test_read_device_records() {
        let mut builder = builder();
        builder.set_num_glyphs(3).unwrap();
        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.num_records(), Ok(2));
        assert_eq!(table.size_device_record(), Ok(8));
        assert_eq!(table.subtable_count(), 2);

        let record = table.device_record(1).unwrap();
        assert_eq!(record.pixel_size(), 16);
        assert_eq!(record.max_width(), 12);
        assert_eq!(record.widths(), &[10, 12, 11]);
        assert_eq!(record.width(2), Some(11));
        assert_eq!(record.padding(), 3);
        assert_eq!(record.subtable().master_data().map(ReadableFontData::len), Some(24));
        assert_eq!(table.device_record(2).err(), Some(ParseError::BadIndex));
    }

    #[test]
    fn test_num_glyphs_required() {
        let mut builder = builder();
        assert_eq!(builder.records().err(), Some(ParseError::MissingValue));
        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.device_record(0).err(), Some(ParseError::MissingValue));
    }

    #[test]
    fn test_child_edit_marks_container() {
        let mut builder = builder();
        builder.set_num_glyphs(3).unwrap();
        assert_eq!(builder.records().unwrap().len(), 2);
        assert!(!builder.changed());

        builder.record_mut(0).unwrap().record_mut().unwrap().widths[1] = 10;
        assert!(builder.model_changed());
        assert!(builder.contained_model_changed());
        assert!(!builder.current_model_changed());

        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.device_record(0).unwrap().widths(), &[7, 10, 8]);
        assert_eq!(table.device_record(1).unwrap().widths(), &[10, 12, 11]);
        assert_eq!(table.data_length(), 24);
    }

    #[test]
    fn test_add_and_remove_records() {
        let mut builder = builder();
        builder.set_num_glyphs(3).unwrap();
        builder.remove_record(0).unwrap();
        assert!(builder.current_model_changed());
        let record = builder.add_record(20, 15, vec![13, 15, 14]).unwrap();
        assert_eq!(record.padding(), 3);
        assert_eq!(builder.records().unwrap().len(), 2);

        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.num_records(), Ok(2));
        assert_eq!(table.device_record(0).unwrap().pixel_size(), 16);
        assert_eq!(table.device_record(1).unwrap().widths(), &[13, 15, 14]);
        assert_eq!(table.data_length(), 24);
    }

    #[test]
    fn test_wrong_width_count_not_ready() {
        let mut builder = builder();
        builder.set_num_glyphs(3).unwrap();
        builder.add_record(20, 15, vec![13, 15]).unwrap();
        assert_eq!(
            builder.build().err(),
            Some(ReadWriteError::Write(WriteError::NotReadyToSerialize(
                tag::HDMX
            )))
        );
    }

    #[test]
    fn test_glyph_count_change_needs_new_widths() {
        let mut builder = builder();
        builder.set_num_glyphs(3).unwrap();
        builder.records().unwrap();
        builder.set_num_glyphs(4).unwrap();
        assert_eq!(
            builder.data(),
            Err(WriteError::NotReadyToSerialize(tag::HDMX))
        );

        for index in 0..2 {
            builder.record_mut(index).unwrap().record_mut().unwrap().widths.push(5);
        }
        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.size_device_record(), Ok(8));
        assert_eq!(table.device_record(1).unwrap().widths(), &[10, 12, 11, 5]);
        assert_eq!(table.device_record(1).unwrap().padding(), 2);
    }

    #[test]
    fn test_glyph_count_change_before_decoding() {
        let mut builder = builder();
        builder.set_num_glyphs(3).unwrap();
        builder.set_num_glyphs(5).unwrap();
        assert!(builder.current_model_changed());
        assert_eq!(
            builder.data(),
            Err(WriteError::NotReadyToSerialize(tag::HDMX))
        );

        // The records were read with three glyphs.
        assert_eq!(builder.record_mut(0).unwrap().record().unwrap().widths, vec![7, 9, 8]);
    }

    #[test]
    fn test_new_table() {
        let mut builder = HdmxTableBuilder::with_header(Header::new(tag::HDMX), Default::default());
        builder.set_num_glyphs(1).unwrap();
        builder.add_record(8, 6, vec![6]).unwrap();
        let table = builder.build().unwrap().unwrap();
        assert_eq!(
            table.read_font_data().bytes(),
            &[0, 0, 0, 1, 0, 0, 0, 4, 8, 6, 6, 0]
        );
    }
}
