//! Subtables: tables nested inside a containing table.
//!
//! A subtable owns a view of its own bytes and may borrow the data of its master table, for
//! formats whose offsets are relative to the container rather than the subtable.

use crate::error::ParseError;
use crate::font_data::ReadableFontData;
use crate::font_data_table::FontDataTable;

#[derive(Debug, Clone)]
pub struct SubTable<'a> {
    data: ReadableFontData,
    master_data: Option<&'a ReadableFontData>,
    padding: usize,
}

/// A table model that owns child subtable builders.
///
/// Child builders are attached to the container's `ChangeFlag`, so editing a child marks the
/// container changed. Adding or removing a child marks the container itself changed.
pub trait SubTableContainer {
    fn subtable_count(&self) -> usize;
}

impl<'a> SubTable<'a> {
    pub fn new(data: ReadableFontData) -> Self {
        SubTable {
            data,
            master_data: None,
            padding: 0,
        }
    }

    pub fn with_master(data: ReadableFontData, master_data: &'a ReadableFontData) -> Self {
        SubTable {
            data,
            master_data: Some(master_data),
            padding: 0,
        }
    }

    /// The subtable at `offset..offset + length` of `master_data`.
    pub fn from_range(
        master_data: &'a ReadableFontData,
        offset: usize,
        length: usize,
    ) -> Result<Self, ParseError> {
        let data = master_data.slice(offset, length)?;
        Ok(SubTable::with_master(data, master_data))
    }

    pub fn data(&self) -> &ReadableFontData {
        &self.data
    }

    pub fn master_data(&self) -> Option<&'a ReadableFontData> {
        self.master_data
    }

    /// Number of filler bytes at the end of the subtable.
    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn set_padding(&mut self, padding: usize) {
        self.padding = padding;
    }

    /// The subtable's bytes without the trailing filler.
    pub fn content(&self) -> &[u8] {
        let bytes = self.data.bytes();
        &bytes[..bytes.len().saturating_sub(self.padding)]
    }
}

impl FontDataTable for SubTable<'_> {
    fn read_font_data(&self) -> &ReadableFontData {
        &self.data
    }
}
