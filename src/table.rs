//! Tables and table builders.
//!
//! A `Table` pairs a `Header` with the table's bytes. A table builder is a
//! `FontDataTableBuilder` whose hooks carry the header along with a format specific
//! `TableModel`. `get_builder` picks the builder for a tag from a static registry.

use lazy_static::lazy_static;
use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{ParseError, ReadWriteError, WriteError};
use crate::font_data::{ReadableFontData, SerializeSize, WritableFontData};
use crate::font_data_table::{BuilderHooks, FontDataTable, FontDataTableBuilder};
use crate::header::Header;
use crate::tables::cmap::{CmapTable, CmapTableBuilder};
use crate::tables::cvt::{CvtTable, CvtTableBuilder};
use crate::tables::hdmx::{HdmxTable, HdmxTableBuilder};
use crate::tables::head::{HeadTable, HeadTableBuilder};
use crate::tables::hhea::{HheaTable, HheaTableBuilder};
use crate::tables::hmtx::{HmtxTable, HmtxTableBuilder};
use crate::tables::maxp::{MaxpTable, MaxpTableBuilder};
use crate::tables::program::{ProgramTable, ProgramTableBuilder};
use crate::tag::{self, DisplayTag};

/// A table with a header, treated as a blob of bytes.
#[derive(Debug, Clone)]
pub struct Table {
    header: Header,
    data: ReadableFontData,
}

/// A table that has a directory entry in an SFNT font.
pub trait SfntTable: FontDataTable {
    fn header(&self) -> &Header;

    fn set_header(&mut self, header: Header);

    fn header_tag(&self) -> u32 {
        self.header().tag()
    }

    fn header_offset(&self) -> u32 {
        self.header().offset()
    }

    fn header_length(&self) -> u32 {
        self.header().length()
    }

    /// The checksum recorded in the header, which may be stale.
    fn header_checksum(&self) -> u32 {
        self.header().checksum()
    }

    /// The checksum of the table's current bytes.
    fn calculated_checksum(&self) -> u32 {
        self.read_font_data().checksum()
    }
}

impl Table {
    pub fn new(header: Header, data: ReadableFontData) -> Self {
        Table { header, data }
    }

    pub fn data(&self) -> &ReadableFontData {
        &self.data
    }
}

impl FontDataTable for Table {
    fn read_font_data(&self) -> &ReadableFontData {
        &self.data
    }
}

impl SfntTable for Table {
    fn header(&self) -> &Header {
        &self.header
    }

    fn set_header(&mut self, header: Header) {
        self.header = header;
    }
}

/// Implement `FontDataTable` and `SfntTable` for a type wrapping a `Table` in its `table` field.
macro_rules! impl_sfnt_table {
    ($ty:ty) => {
        impl $crate::font_data_table::FontDataTable for $ty {
            fn read_font_data(&self) -> &$crate::font_data::ReadableFontData {
                $crate::font_data_table::FontDataTable::read_font_data(&self.table)
            }
        }

        impl $crate::table::SfntTable for $ty {
            fn header(&self) -> &$crate::header::Header {
                $crate::table::SfntTable::header(&self.table)
            }

            fn set_header(&mut self, header: $crate::header::Header) {
                $crate::table::SfntTable::set_header(&mut self.table, header)
            }
        }
    };
}

/// The format specific part of a table builder.
///
/// These are the `BuilderHooks` of a table, except that building also receives the header.
pub trait TableModel {
    type Table: SfntTable;

    fn sub_serialize(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError>;

    fn sub_ready_to_serialize(&self) -> bool;

    fn sub_data_size_to_serialize(&self) -> SerializeSize;

    fn sub_data_set(&mut self);

    fn sub_build_table(
        &mut self,
        header: Header,
        data: ReadableFontData,
    ) -> Result<Self::Table, ParseError>;
}

/// Adapts a `TableModel` to the builder hooks, carrying the table's header.
#[derive(Debug)]
pub struct TableHooks<M> {
    pub(crate) header: Header,
    pub(crate) model: M,
}

impl<M: TableModel> BuilderHooks for TableHooks<M> {
    type Built = M::Table;

    fn sub_serialize(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError> {
        self.model.sub_serialize(new_data)
    }

    fn sub_ready_to_serialize(&self) -> bool {
        self.model.sub_ready_to_serialize()
    }

    fn sub_data_size_to_serialize(&self) -> SerializeSize {
        self.model.sub_data_size_to_serialize()
    }

    fn sub_data_set(&mut self) {
        self.model.sub_data_set()
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<M::Table, ParseError> {
        self.model.sub_build_table(self.header, data)
    }

    /// A changed table has a new length and no position or checksum until it is placed in a
    /// font.
    fn notify_post_table_build(&mut self, table: &mut M::Table, changed: bool) {
        if changed {
            let length = u32::try_from(table.data_length()).unwrap_or(u32::MAX);
            let header = Header::with_length(self.header.tag(), length);
            table.set_header(header);
            self.header = header;
        }
    }

    fn error_tag(&self) -> u32 {
        self.header.tag()
    }
}

/// Builder of a table with model `M`.
pub type TableBuilder<M> = FontDataTableBuilder<TableHooks<M>>;

impl<M: TableModel> FontDataTableBuilder<TableHooks<M>> {
    /// A builder for a new table with no data.
    pub fn with_header(header: Header, model: M) -> Self {
        FontDataTableBuilder::new(TableHooks { header, model })
    }

    pub fn with_header_data(header: Header, data: ReadableFontData, model: M) -> Self {
        FontDataTableBuilder::from_data(data, TableHooks { header, model })
    }

    pub fn with_header_writable(header: Header, data: WritableFontData, model: M) -> Self {
        FontDataTableBuilder::from_writable(data, TableHooks { header, model })
    }

    pub fn with_header_size(header: Header, size: SerializeSize, model: M) -> Self {
        FontDataTableBuilder::with_size(size, TableHooks { header, model })
    }

    pub fn header(&self) -> &Header {
        &self.hooks().header
    }

    pub fn model(&self) -> &M {
        &self.hooks().model
    }
}

/// A table model that never decodes its bytes.
#[derive(Debug, Default)]
pub struct GenericModel;

pub type GenericTableBuilder = TableBuilder<GenericModel>;

impl TableModel for GenericModel {
    type Table = Table;

    fn sub_serialize(&self, _new_data: &mut WritableFontData) -> Result<usize, WriteError> {
        Ok(0)
    }

    fn sub_ready_to_serialize(&self) -> bool {
        false
    }

    fn sub_data_size_to_serialize(&self) -> SerializeSize {
        SerializeSize::Estimate(0)
    }

    fn sub_data_set(&mut self) {}

    fn sub_build_table(
        &mut self,
        header: Header,
        data: ReadableFontData,
    ) -> Result<Table, ParseError> {
        Ok(Table::new(header, data))
    }
}

/// A builder for any table the crate knows how to build.
#[derive(Debug)]
pub enum AnyTableBuilder {
    Generic(GenericTableBuilder),
    Head(HeadTableBuilder),
    Hhea(HheaTableBuilder),
    Maxp(MaxpTableBuilder),
    Hmtx(HmtxTableBuilder),
    Cvt(CvtTableBuilder),
    Program(ProgramTableBuilder),
    Hdmx(HdmxTableBuilder),
    Cmap(CmapTableBuilder),
}

/// A built table of any kind.
#[derive(Debug)]
pub enum AnyTable {
    Generic(Table),
    Head(HeadTable),
    Hhea(HheaTable),
    Maxp(MaxpTable),
    Hmtx(HmtxTable),
    Cvt(CvtTable),
    Program(ProgramTable),
    Hdmx(HdmxTable),
    Cmap(CmapTable),
}

macro_rules! each_variant {
    ($value:expr, $enum:ident, $inner:ident => $body:expr) => {
        match $value {
            $enum::Generic($inner) => $body,
            $enum::Head($inner) => $body,
            $enum::Hhea($inner) => $body,
            $enum::Maxp($inner) => $body,
            $enum::Hmtx($inner) => $body,
            $enum::Cvt($inner) => $body,
            $enum::Program($inner) => $body,
            $enum::Hdmx($inner) => $body,
            $enum::Cmap($inner) => $body,
        }
    };
}

macro_rules! each_builder {
    ($value:expr, $builder:ident => $body:expr) => {
        match $value {
            AnyTableBuilder::Generic($builder) => $body.map(|t| t.map(AnyTable::Generic)),
            AnyTableBuilder::Head($builder) => $body.map(|t| t.map(AnyTable::Head)),
            AnyTableBuilder::Hhea($builder) => $body.map(|t| t.map(AnyTable::Hhea)),
            AnyTableBuilder::Maxp($builder) => $body.map(|t| t.map(AnyTable::Maxp)),
            AnyTableBuilder::Hmtx($builder) => $body.map(|t| t.map(AnyTable::Hmtx)),
            AnyTableBuilder::Cvt($builder) => $body.map(|t| t.map(AnyTable::Cvt)),
            AnyTableBuilder::Program($builder) => $body.map(|t| t.map(AnyTable::Program)),
            AnyTableBuilder::Hdmx($builder) => $body.map(|t| t.map(AnyTable::Hdmx)),
            AnyTableBuilder::Cmap($builder) => $body.map(|t| t.map(AnyTable::Cmap)),
        }
    };
}

impl AnyTableBuilder {
    pub fn header(&self) -> &Header {
        each_variant!(self, AnyTableBuilder, builder => builder.header())
    }

    pub fn changed(&self) -> bool {
        each_variant!(self, AnyTableBuilder, builder => builder.changed())
    }

    pub fn data(&self) -> Result<ReadableFontData, WriteError> {
        each_variant!(self, AnyTableBuilder, builder => builder.data())
    }

    pub fn set_data(&mut self, data: ReadableFontData) {
        each_variant!(self, AnyTableBuilder, builder => builder.set_data(data))
    }

    pub fn build(self) -> Result<Option<AnyTable>, ReadWriteError> {
        each_builder!(self, builder => builder.build())
    }

    pub fn as_generic(&self) -> Option<&GenericTableBuilder> {
        match self {
            AnyTableBuilder::Generic(builder) => Some(builder),
            _ => None,
        }
    }
}

impl AnyTable {
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            AnyTable::Generic(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_head(&self) -> Option<&HeadTable> {
        match self {
            AnyTable::Head(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_cmap(&self) -> Option<&CmapTable> {
        match self {
            AnyTable::Cmap(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_hmtx(&self) -> Option<&HmtxTable> {
        match self {
            AnyTable::Hmtx(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_hdmx(&self) -> Option<&HdmxTable> {
        match self {
            AnyTable::Hdmx(table) => Some(table),
            _ => None,
        }
    }

    /// A builder for editing a copy of this table.
    pub fn to_builder(&self) -> AnyTableBuilder {
        get_builder(*self.header(), self.read_font_data().clone())
    }
}

impl FontDataTable for AnyTable {
    fn read_font_data(&self) -> &ReadableFontData {
        each_variant!(self, AnyTable, table => table.read_font_data())
    }
}

impl SfntTable for AnyTable {
    fn header(&self) -> &Header {
        each_variant!(self, AnyTable, table => table.header())
    }

    fn set_header(&mut self, header: Header) {
        each_variant!(self, AnyTable, table => table.set_header(header))
    }
}

type BuilderFactory = fn(Header, Option<ReadableFontData>) -> AnyTableBuilder;

fn table_builder<M>(header: Header, data: Option<ReadableFontData>, model: M) -> TableBuilder<M>
where
    M: TableModel,
{
    match data {
        Some(data) => TableBuilder::with_header_data(header, data, model),
        None => TableBuilder::with_header(header, model),
    }
}

fn generic_builder(header: Header, data: Option<ReadableFontData>) -> AnyTableBuilder {
    AnyTableBuilder::Generic(table_builder(header, data, GenericModel))
}

lazy_static! {
    static ref BUILDERS: FxHashMap<u32, BuilderFactory> = {
        let mut builders: FxHashMap<u32, BuilderFactory> = FxHashMap::default();
        let head: BuilderFactory =
            |header, data| AnyTableBuilder::Head(table_builder(header, data, Default::default()));
        builders.insert(tag::HEAD, head);
        builders.insert(tag::BHED, head);
        builders.insert(tag::HHEA, |header, data| {
            AnyTableBuilder::Hhea(table_builder(header, data, Default::default()))
        });
        builders.insert(tag::MAXP, |header, data| {
            AnyTableBuilder::Maxp(table_builder(header, data, Default::default()))
        });
        builders.insert(tag::HMTX, |header, data| {
            AnyTableBuilder::Hmtx(table_builder(header, data, Default::default()))
        });
        builders.insert(tag::CVT, |header, data| {
            AnyTableBuilder::Cvt(table_builder(header, data, Default::default()))
        });
        let program: BuilderFactory = |header, data| {
            AnyTableBuilder::Program(table_builder(header, data, Default::default()))
        };
        builders.insert(tag::FPGM, program);
        builders.insert(tag::PREP, program);
        builders.insert(tag::HDMX, |header, data| {
            AnyTableBuilder::Hdmx(table_builder(header, data, Default::default()))
        });
        builders.insert(tag::CMAP, |header, data| {
            AnyTableBuilder::Cmap(table_builder(header, data, Default::default()))
        });
        for opaque in [
            tag::NAME,
            tag::OS_2,
            tag::POST,
            tag::GLYF,
            tag::LOCA,
            tag::EBDT,
            tag::BDAT,
            tag::EBLC,
            tag::BLOC,
            tag::EBSC,
            tag::GSUB,
        ] {
            builders.insert(opaque, generic_builder);
        }
        builders
    };
}

fn lookup(header: Header, data: Option<ReadableFontData>) -> AnyTableBuilder {
    match BUILDERS.get(&header.tag()) {
        Some(factory) => factory(header, data),
        None => {
            debug!(
                "no builder registered for '{}', treating as opaque",
                DisplayTag(header.tag())
            );
            generic_builder(header, data)
        }
    }
}

/// The builder for the table described by `header`, initialised with `data`.
pub fn get_builder(header: Header, data: ReadableFontData) -> AnyTableBuilder {
    lookup(header, Some(data))
}

/// The builder for a new, empty table described by `header`.
pub fn get_empty_builder(header: Header) -> AnyTableBuilder {
    lookup(header, None)
}

/// Whether a typed builder is registered for `tag`.
pub fn has_builder(tag: u32) -> bool {
    BUILDERS.contains_key(&tag)
}
