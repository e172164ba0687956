//! Builders for `cmap` and its subtables.
//!
//! `CmapTableBuilder` is a subtable container keyed by `CmapId`. Each subtable builder decodes
//! its character to glyph mapping on first access and re-encodes it in its own format when
//! edited. Subtables in formats that can't be encoded are kept as raw bytes.

use std::collections::BTreeMap;
use std::iter;

use log::warn;
use rustc_hash::FxHashMap;

use crate::binary::write::{Placeholder, WriteBinary, WriteContext};
use crate::binary::{I16Be, U16Be, U32Be};
use crate::error::{ParseError, WriteError};
use crate::font_data::{ReadableFontData, SerializeSize, WritableFontData};
use crate::font_data_table::{BuilderHooks, ChangeFlag, FontDataTableBuilder};
use crate::header::Header;
use crate::size;
use crate::subtable::{SubTable, SubTableContainer};
use crate::table::{Table, TableBuilder, TableModel};
use crate::tables::cmap::{
    read_mappings, subtable_format_language, subtable_length, CmapId, CmapTable, EncodingRecord,
    SequentialMapGroup, HEADER_SIZE,
};

/// Formats a subtable builder can re-encode after an edit.
pub const WRITABLE_FORMATS: [u16; 4] = [0, 4, 6, 12];
/// Format reported for a subtable whose raw data is too short to hold one.
pub const UNREADABLE_FORMAT: u16 = u16::MAX;

const ENCODING_RECORD_SIZE: usize = 2 * size::U16 + size::U32;

#[derive(Copy, Clone)]
struct Format4Calculator {
    seg_count: u16,
}

impl Format4Calculator {
    fn seg_count_x2(self) -> u16 {
        2 * self.seg_count
    }

    fn search_range(self) -> u16 {
        2 * (2u16.pow((self.seg_count as f64).log2().floor() as u32))
    }

    fn entry_selector(self) -> u16 {
        (self.search_range() as f64 / 2.).log2() as u16
    }

    fn range_shift(self) -> u16 {
        2 * self.seg_count - self.search_range()
    }
}

#[derive(Debug, Default)]
struct Format4 {
    language: u16,
    end_codes: Vec<u16>,
    start_codes: Vec<u16>,
    id_deltas: Vec<i16>,
    id_range_offsets: Vec<u16>,
    glyph_id_array: Vec<u16>,
}

/// A run of characters encoded as one format 4 segment.
#[derive(Debug)]
struct Format4Segment<'a> {
    start: u32,
    end: u32,
    glyph_ids: &'a mut Vec<u16>,
    consecutive_glyph_ids: bool,
}

impl<'a> Format4Segment<'a> {
    fn new(start: u32, gid: u16, glyph_ids: &'a mut Vec<u16>) -> Self {
        glyph_ids.clear();
        glyph_ids.push(gid);
        Format4Segment {
            start,
            end: start,
            glyph_ids,
            consecutive_glyph_ids: true,
        }
    }

    fn add(&mut self, ch: u32, gid: u16) -> bool {
        // -1 because the next consecutive character introduces no gap
        let gap = ch.saturating_sub(self.end).saturating_sub(1);
        let should_remain_compact = self.consecutive_glyph_ids && self.glyph_ids.len() >= 4;

        if gap > 0 && should_remain_compact {
            // A new segment costs 8 bytes, less than giving up the delta encoding of a run of
            // four or more consecutive glyphs.
            false
        } else if gap < 4 {
            // Each gap entry is two bytes in the glyph id array, so a gap of less than four
            // characters is cheaper than a new segment. Gaps map to .notdef.
            if gap == 0 {
                let prev = self.glyph_ids.last().copied().unwrap_or(0);
                self.consecutive_glyph_ids &= prev.checked_add(1) == Some(gid);
            } else {
                self.glyph_ids.extend(iter::repeat(0).take(gap as usize));
                self.consecutive_glyph_ids = false;
            }
            self.glyph_ids.push(gid);
            self.end = ch;
            true
        } else {
            false
        }
    }
}

impl Format4 {
    fn from_mappings(language: u16, mappings: &BTreeMap<u32, u16>) -> Result<Self, WriteError> {
        // 0xFFFF is reserved for the final segment.
        if mappings.keys().any(|&ch| ch >= 0xFFFF) {
            return Err(WriteError::BadValue);
        }
        let mut table = Format4 {
            language,
            ..Format4::default()
        };

        // Group the mappings into contiguous ranges, there can be holes in the ranges
        let mut glyph_ids = Vec::new();
        let mut id_range_offset_fixup_indices = Vec::new();
        let mut entries = mappings.iter();
        if let Some((&start, &gid)) = entries.next() {
            let mut segment = Format4Segment::new(start, gid, &mut glyph_ids);
            for (&ch, &gid) in entries {
                if !segment.add(ch, gid) {
                    table.add_segment(segment, &mut id_range_offset_fixup_indices);
                    segment = Format4Segment::new(ch, gid, &mut glyph_ids);
                }
            }
            table.add_segment(segment, &mut id_range_offset_fixup_indices);
        }

        // The final segment maps 0xFFFF to .notdef and must be present.
        let segment = Format4Segment::new(0xFFFF, 0, &mut glyph_ids);
        table.add_segment(segment, &mut id_range_offset_fixup_indices);

        // Fix up the id_range_offsets now that all segments have been added
        let num_segments = table.end_codes.len();
        for index in id_range_offset_fixup_indices {
            let id_range_offset = &mut table.id_range_offsets[index];
            let count = num_segments + usize::from(*id_range_offset) - index;
            // x2 because we need to skip over `count` 16-bit values
            *id_range_offset = u16::try_from(2 * count)?;
        }

        Ok(table)
    }

    fn add_segment(
        &mut self,
        segment: Format4Segment<'_>,
        id_range_offset_fixups: &mut Vec<usize>,
    ) {
        // Characters are all below 0xFFFF here.
        self.start_codes.push(segment.start as u16);
        self.end_codes.push(segment.end as u16);

        match segment.glyph_ids.first() {
            Some(&first_glyph_id) if segment.consecutive_glyph_ids => {
                // The delta arithmetic is modulo 0x10000, so truncating to i16 is exact.
                self.id_deltas
                    .push((i32::from(first_glyph_id) - segment.start as i32 % 0x10000) as i16);
                self.id_range_offsets.push(0);
            }
            _ => {
                self.id_deltas.push(0);
                // Holds the glyph id array index until fixed up.
                id_range_offset_fixups.push(self.id_range_offsets.len());
                self.id_range_offsets.push(self.glyph_id_array.len() as u16);
                self.glyph_id_array.extend_from_slice(segment.glyph_ids);
            }
        }
    }
}

/// A subtable ready to be written.
enum EncodedSubtable {
    Format0 {
        language: u16,
        glyph_id_array: Box<[u8; 256]>,
    },
    Format4(Format4),
    Format6 {
        language: u16,
        first_code: u16,
        glyph_id_array: Vec<u16>,
    },
    Format12 {
        language: u32,
        groups: Vec<SequentialMapGroup>,
    },
}

impl EncodedSubtable {
    fn encode(
        format: u16,
        language: u32,
        mappings: &BTreeMap<u32, u16>,
    ) -> Result<Self, WriteError> {
        match format {
            0 => {
                let mut glyph_id_array = Box::new([0; 256]);
                for (&ch, &gid) in mappings {
                    let slot = glyph_id_array
                        .get_mut(usize::try_from(ch)?)
                        .ok_or(WriteError::BadValue)?;
                    *slot = u8::try_from(gid)?;
                }
                Ok(EncodedSubtable::Format0 {
                    language: u16::try_from(language)?,
                    glyph_id_array,
                })
            }
            4 => Ok(EncodedSubtable::Format4(Format4::from_mappings(
                u16::try_from(language)?,
                mappings,
            )?)),
            6 => {
                let range = (mappings.keys().next(), mappings.keys().last());
                let (first_code, glyph_id_array) = match range {
                    (Some(&first), Some(&last)) => {
                        let first_code = u16::try_from(first)?;
                        let count = usize::from(u16::try_from(last)? - first_code) + 1;
                        let mut glyph_id_array = vec![0; count];
                        for (&ch, &gid) in mappings {
                            glyph_id_array[(ch - first) as usize] = gid;
                        }
                        (first_code, glyph_id_array)
                    }
                    _ => (0, Vec::new()),
                };
                Ok(EncodedSubtable::Format6 {
                    language: u16::try_from(language)?,
                    first_code,
                    glyph_id_array,
                })
            }
            12 => Ok(EncodedSubtable::Format12 {
                language,
                groups: format12_groups(mappings),
            }),
            _ => Err(WriteError::NotImplemented),
        }
    }
}

fn continues_group(group: &SequentialMapGroup, ch: u32, gid: u32) -> bool {
    let next_gid = group.start_glyph_id + (group.end_char_code - group.start_char_code) + 1;
    ch == group.end_char_code + 1 && gid == next_gid
}

fn format12_groups(mappings: &BTreeMap<u32, u16>) -> Vec<SequentialMapGroup> {
    let mut groups: Vec<SequentialMapGroup> = Vec::new();
    for (&ch, &gid) in mappings {
        let gid = u32::from(gid);
        match groups.last_mut() {
            Some(group) if continues_group(group, ch, gid) => group.end_char_code = ch,
            _ => groups.push(SequentialMapGroup {
                start_char_code: ch,
                end_char_code: ch,
                start_glyph_id: gid,
            }),
        }
    }
    groups
}

impl WriteBinary<&Self> for EncodedSubtable {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, table: &EncodedSubtable) -> Result<(), WriteError> {
        match table {
            EncodedSubtable::Format0 {
                language,
                glyph_id_array,
            } => {
                U16Be::write(ctxt, 0u16)?; // format
                U16Be::write(ctxt, u16::try_from(3 * size::U16 + glyph_id_array.len())?)?; // length
                U16Be::write(ctxt, *language)?;
                ctxt.write_bytes(&glyph_id_array[..])?;
            }
            EncodedSubtable::Format4(format4) => {
                let start = ctxt.bytes_written();
                let calc = Format4Calculator {
                    seg_count: u16::try_from(format4.start_codes.len())?,
                };

                U16Be::write(ctxt, 4u16)?; // format
                let length = ctxt.placeholder::<U16Be, _>()?;
                U16Be::write(ctxt, format4.language)?;
                U16Be::write(ctxt, calc.seg_count_x2())?;
                U16Be::write(ctxt, calc.search_range())?;
                U16Be::write(ctxt, calc.entry_selector())?;
                U16Be::write(ctxt, calc.range_shift())?;
                ctxt.write_iter::<U16Be, _>(format4.end_codes.iter().copied())?;
                U16Be::write(ctxt, 0u16)?; // reserved_pad
                ctxt.write_iter::<U16Be, _>(format4.start_codes.iter().copied())?;
                ctxt.write_iter::<I16Be, _>(format4.id_deltas.iter().copied())?;
                ctxt.write_iter::<U16Be, _>(format4.id_range_offsets.iter().copied())?;
                ctxt.write_iter::<U16Be, _>(format4.glyph_id_array.iter().copied())?;
                let written = u16::try_from(ctxt.bytes_written() - start)?;
                ctxt.write_placeholder(length, written)?;
            }
            EncodedSubtable::Format6 {
                language,
                first_code,
                glyph_id_array,
            } => {
                let start = ctxt.bytes_written();

                U16Be::write(ctxt, 6u16)?; // format
                let length = ctxt.placeholder::<U16Be, _>()?;
                U16Be::write(ctxt, *language)?;
                U16Be::write(ctxt, *first_code)?;
                U16Be::write(ctxt, u16::try_from(glyph_id_array.len())?)?;
                ctxt.write_iter::<U16Be, _>(glyph_id_array.iter().copied())?;
                let written = u16::try_from(ctxt.bytes_written() - start)?;
                ctxt.write_placeholder(length, written)?;
            }
            EncodedSubtable::Format12 { language, groups } => {
                let start = ctxt.bytes_written();

                U16Be::write(ctxt, 12u16)?; // format
                U16Be::write(ctxt, 0u16)?; // reserved
                let length = ctxt.placeholder::<U32Be, _>()?;
                U32Be::write(ctxt, *language)?;
                U32Be::write(ctxt, u32::try_from(groups.len())?)?;
                ctxt.write_iter::<SequentialMapGroup, _>(groups.iter().copied())?;
                let written = u32::try_from(ctxt.bytes_written() - start)?;
                ctxt.write_placeholder(length, written)?;
            }
        }

        Ok(())
    }
}

/// Decoded contents of a subtable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Contents {
    language: u32,
    mappings: BTreeMap<u32, u16>,
}

#[derive(Debug)]
pub struct CmapSubtableModel {
    id: CmapId,
    format: u16,
    contents: Option<Contents>,
}

pub type CmapSubtableBuilder = FontDataTableBuilder<CmapSubtableModel>;

impl CmapSubtableModel {
    fn is_writable(&self) -> bool {
        WRITABLE_FORMATS.contains(&self.format)
    }
}

impl BuilderHooks for CmapSubtableModel {
    type Built = SubTable<'static>;

    fn sub_serialize(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError> {
        let contents = self.contents.as_ref().ok_or(WriteError::BadValue)?;
        let encoded = EncodedSubtable::encode(self.format, contents.language, &contents.mappings)?;
        let start = new_data.bytes_written();
        EncodedSubtable::write(new_data, &encoded)?;
        Ok(new_data.bytes_written() - start)
    }

    fn sub_ready_to_serialize(&self) -> bool {
        self.is_writable() && self.contents.is_some()
    }

    fn sub_data_size_to_serialize(&self) -> SerializeSize {
        let num_mappings = self.contents.as_ref().map_or(0, |contents| contents.mappings.len());
        SerializeSize::Estimate(16 + 4 * num_mappings)
    }

    fn sub_data_set(&mut self) {
        self.contents = None;
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<SubTable<'static>, ParseError> {
        Ok(SubTable::new(data))
    }
}

impl FontDataTableBuilder<CmapSubtableModel> {
    fn from_subtable_data(id: CmapId, data: ReadableFontData, parent: ChangeFlag) -> Self {
        let format = subtable_format_language(data.bytes())
            .map_or(UNREADABLE_FORMAT, |(format, _)| format);
        let model = CmapSubtableModel {
            id,
            format,
            contents: None,
        };
        FontDataTableBuilder::from_data(data, model).with_parent(parent)
    }

    fn decode(&mut self) -> Result<&mut Contents, ParseError> {
        let (hooks, scope) = self.split_mut();
        if hooks.contents.is_none() {
            let contents = if scope.data().is_empty() {
                Contents::default()
            } else {
                let (_format, language) = subtable_format_language(scope.data())?;
                Contents {
                    language,
                    mappings: read_mappings(scope.data())?,
                }
            };
            hooks.contents = Some(contents);
        }
        hooks.contents.as_mut().ok_or(ParseError::MissingValue)
    }

    fn decode_for_edit(&mut self) -> Result<(), ParseError> {
        if !self.hooks().is_writable() {
            return Err(ParseError::NotImplemented);
        }
        self.decode()?;
        self.set_model_changed(true);
        Ok(())
    }

    pub fn id(&self) -> CmapId {
        self.hooks().id
    }

    /// The subtable format, or `UNREADABLE_FORMAT` if the raw data is too short to hold one.
    pub fn format(&self) -> u16 {
        self.hooks().format
    }

    pub fn language(&mut self) -> Result<u32, ParseError> {
        self.decode().map(|contents| contents.language)
    }

    pub fn set_language(&mut self, language: u32) -> Result<(), ParseError> {
        self.decode_for_edit()?;
        self.decode()?.language = language;
        Ok(())
    }

    /// The character to glyph mapping. Characters mapped to `.notdef` are absent.
    pub fn mappings(&mut self) -> Result<&BTreeMap<u32, u16>, ParseError> {
        self.decode().map(|contents| &contents.mappings)
    }

    /// The mapping, for editing. Fails with `NotImplemented` for formats that can't be
    /// re-encoded.
    pub fn mappings_mut(&mut self) -> Result<&mut BTreeMap<u32, u16>, ParseError> {
        self.decode_for_edit()?;
        self.decode().map(|contents| &mut contents.mappings)
    }
}

#[derive(Debug, Default)]
pub struct CmapModel {
    subtables: Option<BTreeMap<CmapId, CmapSubtableBuilder>>,
}

pub type CmapTableBuilder = TableBuilder<CmapModel>;

impl SubTableContainer for CmapModel {
    fn subtable_count(&self) -> usize {
        self.subtables.as_ref().map_or(0, BTreeMap::len)
    }
}

impl TableModel for CmapModel {
    type Table = CmapTable;

    fn sub_serialize(&self, new_data: &mut WritableFontData) -> Result<usize, WriteError> {
        let empty = BTreeMap::new();
        let subtables = self.subtables.as_ref().unwrap_or(&empty);
        let start = new_data.bytes_written();

        U16Be::write(new_data, 0u16)?; // version
        U16Be::write(new_data, u16::try_from(subtables.len())?)?;
        let mut placeholders: Vec<Placeholder<U32Be, u32>> = Vec::with_capacity(subtables.len());
        for id in subtables.keys() {
            U16Be::write(new_data, id.platform_id)?;
            U16Be::write(new_data, id.encoding_id)?;
            placeholders.push(new_data.placeholder::<U32Be, _>()?);
        }

        // Identical subtables are written once and share an offset.
        let mut offsets: FxHashMap<Vec<u8>, u32> = FxHashMap::default();
        for (subtable, placeholder) in subtables.values().zip(placeholders) {
            let data = subtable.data()?;
            let offset = match offsets.get(data.bytes()) {
                Some(&offset) => offset,
                None => {
                    let offset = u32::try_from(new_data.bytes_written() - start)?;
                    data.copy_to(new_data)?;
                    offsets.insert(data.bytes().to_vec(), offset);
                    offset
                }
            };
            new_data.write_placeholder(placeholder, offset)?;
        }

        Ok(new_data.bytes_written() - start)
    }

    fn sub_ready_to_serialize(&self) -> bool {
        self.subtables.as_ref().map_or(false, |subtables| {
            subtables.values().all(CmapSubtableBuilder::ready_to_serialize)
        })
    }

    fn sub_data_size_to_serialize(&self) -> SerializeSize {
        let subtables = self.subtables.iter().flat_map(BTreeMap::values);
        let records = HEADER_SIZE + self.subtable_count() * ENCODING_RECORD_SIZE;
        let size = subtables.fold(records, |size, subtable| {
            size + subtable.data_size_to_serialize().size()
        });
        SerializeSize::Estimate(size)
    }

    fn sub_data_set(&mut self) {
        self.subtables = None;
    }

    fn sub_build_table(
        &mut self,
        header: Header,
        data: ReadableFontData,
    ) -> Result<CmapTable, ParseError> {
        Ok(CmapTable {
            table: Table::new(header, data),
        })
    }
}

fn read_subtables(
    data: ReadableFontData,
    parent: &ChangeFlag,
) -> Result<BTreeMap<CmapId, CmapSubtableBuilder>, ParseError> {
    let mut ctxt = data.scope().ctxt();
    let version = ctxt.read_u16be()?;
    ctxt.check_version(version == 0)?;
    let num_tables = usize::from(ctxt.read_u16be()?);
    let records = ctxt.read_array::<EncodingRecord>(num_tables)?;

    let mut subtables = BTreeMap::new();
    for record in records.iter() {
        let offset = usize::try_from(record.offset)?;
        if offset > data.len() {
            return Err(ParseError::BadOffset);
        }
        let length = match subtable_length(data.scope().offset(offset)) {
            Ok(length) => length,
            Err(err) => {
                warn!(
                    "cmap subtable {:?} has no readable length ({}), keeping the rest of the table",
                    record.id(),
                    err
                );
                data.len() - offset
            }
        };
        let subtable_data = data.slice(offset, length)?;
        let builder =
            CmapSubtableBuilder::from_subtable_data(record.id(), subtable_data, parent.clone());
        if !builder.hooks().is_writable() {
            warn!(
                "cmap subtable {:?} in format {} can't be edited, passing it through raw",
                record.id(),
                builder.format()
            );
        }
        subtables.entry(record.id()).or_insert(builder);
    }
    Ok(subtables)
}

impl TableBuilder<CmapModel> {
    fn decode(&mut self) -> Result<&mut BTreeMap<CmapId, CmapSubtableBuilder>, ParseError> {
        let parent = self.change_flag();
        let (hooks, scope) = self.split_mut();
        let model = &mut hooks.model;
        if model.subtables.is_none() {
            let subtables = if scope.data().is_empty() {
                BTreeMap::new()
            } else {
                read_subtables(ReadableFontData::from(scope.data()), &parent)?
            };
            model.subtables = Some(subtables);
        }
        model.subtables.as_mut().ok_or(ParseError::MissingValue)
    }

    /// The subtable builders in encoding record order.
    pub fn subtable_builders(
        &mut self,
    ) -> Result<&BTreeMap<CmapId, CmapSubtableBuilder>, ParseError> {
        self.decode().map(|subtables| &*subtables)
    }

    pub fn subtable_builder_mut(
        &mut self,
        id: CmapId,
    ) -> Result<Option<&mut CmapSubtableBuilder>, ParseError> {
        self.decode().map(|subtables| subtables.get_mut(&id))
    }

    /// Add an empty subtable for `id` in `format`, replacing any existing one.
    pub fn new_subtable_builder(
        &mut self,
        id: CmapId,
        format: u16,
    ) -> Result<&mut CmapSubtableBuilder, ParseError> {
        if !WRITABLE_FORMATS.contains(&format) {
            return Err(ParseError::NotImplemented);
        }
        let parent = self.change_flag();
        self.decode()?;
        self.set_model_changed(true);

        let model = CmapSubtableModel {
            id,
            format,
            contents: Some(Contents::default()),
        };
        let mut builder = FontDataTableBuilder::new(model).with_parent(parent);
        builder.set_model_changed(true);
        let subtables = self.decode()?;
        subtables.insert(id, builder);
        subtables.get_mut(&id).ok_or(ParseError::MissingValue)
    }

    pub fn remove_subtable_builder(
        &mut self,
        id: CmapId,
    ) -> Result<Option<CmapSubtableBuilder>, ParseError> {
        let removed = self.decode()?.remove(&id);
        if removed.is_some() {
            self.set_model_changed(true);
        }
        Ok(removed)
    }
}
