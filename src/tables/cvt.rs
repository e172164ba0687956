//! `cvt ` control value table
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/cvt>

use crate::binary::read::ReadScope;
use crate::binary::write::WriteContext;
use crate::binary::I16Be;
use crate::error::{ParseError, WriteError};
use crate::font_data::{ReadableFontData, SerializeSize, WritableFontData};
use crate::header::Header;
use crate::size;
use crate::table::{Table, TableBuilder, TableModel};

#[derive(Debug, Clone)]
pub struct CvtTable {
    table: Table,
}

#[derive(Debug, Default)]
pub struct CvtModel {
    values: Option<Vec<i16>>,
}

pub type CvtTableBuilder = TableBuilder<CvtModel>;

fn read_values(data: &[u8]) -> Result<Vec<i16>, ParseError> {
    // A trailing odd byte is padding, not a value.
    let mut ctxt = ReadScope::new(data).ctxt();
    Ok(ctxt.read_array::<I16Be>(data.len() / size::I16)?.to_vec())
}

impl CvtTable {
    pub fn len(&self) -> usize {
        self.table.data().len() / size::I16
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self, index: usize) -> Result<i16, ParseError> {
        let mut ctxt = self.table.data().scope().ctxt();
        ctxt.read_array::<I16Be>(self.len())?
            .get_item(index)
            .ok_or(ParseError::BadIndex)
    }

    pub fn values(&self) -> Result<Vec<i16>, ParseError> {
        read_values(self.table.data().bytes())
    }
}

impl_sfnt_table!(CvtTable);

impl TableModel for CvtModel {
    type Table = CvtTable;

    fn sub_serialize(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError> {
        let values = self.values.as_ref().ok_or(WriteError::BadValue)?;
        new_data.write_iter::<I16Be, _>(values.iter().copied())?;
        Ok(values.len() * size::I16)
    }

    fn sub_ready_to_serialize(&self) -> bool {
        self.values.is_some()
    }

    fn sub_data_size_to_serialize(&self) -> SerializeSize {
        SerializeSize::Fixed(self.values.as_ref().map_or(0, |values| values.len() * size::I16))
    }

    fn sub_data_set(&mut self) {
        self.values = None;
    }

    fn sub_build_table(
        &mut self,
        header: Header,
        data: ReadableFontData,
    ) -> Result<CvtTable, ParseError> {
        Ok(CvtTable {
            table: Table::new(header, data),
        })
    }
}

impl TableBuilder<CvtModel> {
    fn decode(&mut self) -> Result<(), ParseError> {
        let (hooks, scope) = self.split_mut();
        if hooks.model.values.is_none() {
            hooks.model.values = Some(read_values(scope.data())?);
        }
        Ok(())
    }

    pub fn values(&mut self) -> Result<&[i16], ParseError> {
        self.decode()?;
        Ok(self.model().values.as_deref().unwrap_or_default())
    }

    pub fn values_mut(&mut self) -> Result<&mut Vec<i16>, ParseError> {
        self.decode()?;
        self.set_model_changed(true);
        self.hooks_mut()
            .model
            .values
            .as_mut()
            .ok_or(ParseError::MissingValue)
    }
}
