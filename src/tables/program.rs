//! `fpgm` font program and `prep` control value program
//!
//! Both tables are a flat run of TrueType instructions.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/fpgm>
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/prep>

use crate::binary::write::WriteContext;
use crate::error::{ParseError, WriteError};
use crate::font_data::{ReadableFontData, SerializeSize, WritableFontData};
use crate::header::Header;
use crate::table::{Table, TableBuilder, TableModel};

#[derive(Debug, Clone)]
pub struct ProgramTable {
    table: Table,
}

#[derive(Debug, Default)]
pub struct ProgramModel {
    instructions: Option<Vec<u8>>,
}

pub type ProgramTableBuilder = TableBuilder<ProgramModel>;

impl ProgramTable {
    pub fn instructions(&self) -> &[u8] {
        self.table.data().bytes()
    }
}

impl_sfnt_table!(ProgramTable);

impl TableModel for ProgramModel {
    type Table = ProgramTable;

    fn sub_serialize(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError> {
        let instructions = self.instructions.as_ref().ok_or(WriteError::BadValue)?;
        new_data.write_bytes(instructions)?;
        Ok(instructions.len())
    }

    fn sub_ready_to_serialize(&self) -> bool {
        self.instructions.is_some()
    }

    fn sub_data_size_to_serialize(&self) -> SerializeSize {
        SerializeSize::Fixed(self.instructions.as_ref().map_or(0, Vec::len))
    }

    fn sub_data_set(&mut self) {
        self.instructions = None;
    }

    fn sub_build_table(
        &mut self,
        header: Header,
        data: ReadableFontData,
    ) -> Result<ProgramTable, ParseError> {
        Ok(ProgramTable {
            table: Table::new(header, data),
        })
    }
}

impl TableBuilder<ProgramModel> {
    fn decode(&mut self) {
        let (hooks, scope) = self.split_mut();
        if hooks.model.instructions.is_none() {
            hooks.model.instructions = Some(scope.data().to_vec());
        }
    }

    pub fn instructions(&mut self) -> &[u8] {
        self.decode();
        self.model().instructions.as_deref().unwrap_or_default()
    }

    /// The instructions, for editing. The builder is marked changed.
    pub fn instructions_mut(&mut self) -> &mut Vec<u8> {
        self.decode();
        self.set_model_changed(true);
        self.hooks_mut()
            .model
            .instructions
            .get_or_insert_with(Vec::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{get_builder, AnyTable, SfntTable};
    use crate::tag;

    #[test]
    fn test_edit_instructions() {
        let data = ReadableFontData::new(vec![0xB0, 0x01, 0x2C]);
        let header = Header::from_record(tag::PREP, data.checksum(), 100, 3);
        let mut builder = ProgramTableBuilder::with_header_data(header, data, Default::default());
        assert_eq!(builder.instructions(), &[0xB0, 0x01, 0x2C]);
        assert!(!builder.changed());

        builder.instructions_mut().pop();
        let table = builder.build().unwrap().unwrap();
        assert_eq!(table.instructions(), &[0xB0, 0x01]);
        assert_eq!(table.header_length(), 2);
        assert!(!table.header().offset_valid());
    }

    #[test]
    fn test_fpgm_and_prep_share_builder() {
        for tag in [tag::FPGM, tag::PREP] {
            let table = get_builder(Header::new(tag), ReadableFontData::new(vec![0x2C]))
                .build()
                .unwrap();
            assert!(matches!(table, Some(AnyTable::Program(_))));
        }
    }
}
