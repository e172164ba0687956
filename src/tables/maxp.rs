//! maxp - Maximum profile
//!
//! This table establishes the memory requirements for this font. Fonts with CFF data must use
//! Version 0.5 of this table, specifying only the numGlyphs field. Fonts with TrueType outlines
//! must use Version 1.0 of this table, where all data is required.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/maxp>

use crate::binary::read::{ReadBinary, ReadCtxt, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{U16Be, U32Be};
use crate::error::{ParseError, WriteError};
use crate::table::TableBuilder;
use crate::tables::{Record, RecordModel, RecordTable};

const VERSION_0_5: u32 = 0x00005000;
const VERSION_1_0: u32 = 0x00010000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Maxp {
    pub num_glyphs: u16,
    /// Extra fields, present if maxp table is version 1.0, absent if version 0.5.
    pub version1_sub_table: Option<MaxpVersion1SubTable>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MaxpVersion1SubTable {
    /// Maximum points in a non-composite glyph.
    pub max_points: u16,
    /// Maximum contours in a non-composite glyph.
    pub max_contours: u16,
    /// Maximum points in a composite glyph.
    pub max_composite_points: u16,
    /// Maximum contours in a composite glyph.
    pub max_composite_contours: u16,
    /// 1 if instructions do not use the twilight zone (Z0), or 2 if instructions do use Z0.
    pub max_zones: u16,
    /// Maximum points used in Z0.
    pub max_twilight_points: u16,
    /// Number of Storage Area locations.
    pub max_storage: u16,
    /// Number of FDEFs, equal to the highest function number + 1.
    pub max_function_defs: u16,
    /// Number of IDEFs.
    pub max_instruction_defs: u16,
    /// Maximum stack depth across `fpgm`, `prep` and all glyph instructions.
    pub max_stack_elements: u16,
    /// Maximum byte count for glyph instructions.
    pub max_size_of_instructions: u16,
    /// Maximum number of components referenced at "top level" for any composite glyph.
    pub max_component_elements: u16,
    /// Maximum levels of recursion; 1 for simple components.
    pub max_component_depth: u16,
}

pub type MaxpTable = RecordTable<Maxp>;

pub type MaxpTableBuilder = TableBuilder<RecordModel<Maxp>>;

impl ReadBinary for Maxp {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32be()?;
        ctxt.check_version(version == VERSION_0_5 || version == VERSION_1_0)?;
        let num_glyphs = ctxt.read_u16be()?;
        let sub_table = if version == VERSION_1_0 {
            Some(ctxt.read::<MaxpVersion1SubTable>()?)
        } else {
            None
        };
        Ok(Maxp {
            num_glyphs,
            version1_sub_table: sub_table,
        })
    }
}

impl Record for Maxp {
    fn parse(scope: ReadScope<'_>) -> Result<Self, ParseError> {
        scope.read::<Maxp>()
    }

    fn write_record<C: WriteContext>(ctxt: &mut C, table: &Maxp) -> Result<(), WriteError> {
        if let Some(sub_table) = &table.version1_sub_table {
            U32Be::write(ctxt, VERSION_1_0)?;
            U16Be::write(ctxt, table.num_glyphs)?;
            MaxpVersion1SubTable::write(ctxt, sub_table)?;
        } else {
            U32Be::write(ctxt, VERSION_0_5)?;
            U16Be::write(ctxt, table.num_glyphs)?;
        }
        Ok(())
    }
}

impl ReadBinary for MaxpVersion1SubTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let max_points = ctxt.read_u16be()?;
        let max_contours = ctxt.read_u16be()?;
        let max_composite_points = ctxt.read_u16be()?;
        let max_composite_contours = ctxt.read_u16be()?;
        let max_zones = ctxt.read_u16be()?;
        let max_twilight_points = ctxt.read_u16be()?;
        let max_storage = ctxt.read_u16be()?;
        let max_function_defs = ctxt.read_u16be()?;
        let max_instruction_defs = ctxt.read_u16be()?;
        let max_stack_elements = ctxt.read_u16be()?;
        let max_size_of_instructions = ctxt.read_u16be()?;
        let max_component_elements = ctxt.read_u16be()?;
        let max_component_depth = ctxt.read_u16be()?;

        Ok(MaxpVersion1SubTable {
            max_points,
            max_contours,
            max_composite_points,
            max_composite_contours,
            max_zones,
            max_twilight_points,
            max_storage,
            max_function_defs,
            max_instruction_defs,
            max_stack_elements,
            max_size_of_instructions,
            max_component_elements,
            max_component_depth,
        })
    }
}

impl WriteBinary<&Self> for MaxpVersion1SubTable {
    type Output = ();

    fn write<C: WriteContext>(
        ctxt: &mut C,
        table: &MaxpVersion1SubTable,
    ) -> Result<(), WriteError> {
        U16Be::write(ctxt, table.max_points)?;
        U16Be::write(ctxt, table.max_contours)?;
        U16Be::write(ctxt, table.max_composite_points)?;
        U16Be::write(ctxt, table.max_composite_contours)?;
        U16Be::write(ctxt, table.max_zones)?;
        U16Be::write(ctxt, table.max_twilight_points)?;
        U16Be::write(ctxt, table.max_storage)?;
        U16Be::write(ctxt, table.max_function_defs)?;
        U16Be::write(ctxt, table.max_instruction_defs)?;
        U16Be::write(ctxt, table.max_stack_elements)?;
        U16Be::write(ctxt, table.max_size_of_instructions)?;
        U16Be::write(ctxt, table.max_component_elements)?;
        U16Be::write(ctxt, table.max_component_depth)?;

        Ok(())
    }
}

impl RecordTable<Maxp> {
    pub fn num_glyphs(&self) -> u16 {
        self.record().num_glyphs
    }
}

impl TableBuilder<RecordModel<Maxp>> {
    pub fn maxp(&mut self) -> Result<&Maxp, ParseError> {
        self.record()
    }

    pub fn maxp_mut(&mut self) -> Result<&mut Maxp, ParseError> {
        self.record_mut()
    }

    pub fn set_num_glyphs(&mut self, num_glyphs: u16) -> Result<(), ParseError> {
        self.maxp_mut()?.num_glyphs = num_glyphs;
        Ok(())
    }
}
