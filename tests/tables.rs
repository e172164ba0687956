mod common;

use std::collections::BTreeMap;

use sfnt_table::font_data::ReadableFontData;
use sfnt_table::font_data_table::FontDataTable;
use sfnt_table::header::Header;
use sfnt_table::table::{get_builder, get_empty_builder, has_builder, AnyTable, SfntTable};
use sfnt_table::tables::cmap::{CmapId, CmapTableBuilder, EncodingId, PlatformId};
use sfnt_table::tables::hdmx::HdmxTableBuilder;
use sfnt_table::tag;

use crate::common::{hdmx_data, tag as tag_of};

#[test]
fn unknown_tag_round_trips_as_generic() {
    let unknown = tag_of(b"Zapf");
    assert!(!has_builder(unknown));

    let data = ReadableFontData::new(vec![5, 4, 3, 2, 1]);
    let header = Header::from_record(unknown, data.checksum(), 64, 5);
    let builder = get_builder(header, data.clone());
    assert!(!builder.changed());
    let table = builder.build().unwrap().unwrap();
    assert!(table.as_table().is_some());

    let mut out = Vec::new();
    assert_eq!(table.serialize(&mut out).unwrap(), 5);
    assert_eq!(out, data.bytes());
    assert_eq!(table.header(), &header);
    assert_eq!(table.header_offset(), 64);
}

#[test]
fn snapshots_are_independent() {
    let data = ReadableFontData::new(hdmx_data(&[(10, &[1, 2])]));
    let builder = get_builder(Header::new(tag::HDMX), data);
    let first = builder.data().unwrap();
    let second = builder.data().unwrap();
    assert_eq!(first, second);
    assert!(!ReadableFontData::ptr_eq(&first, &second));
}

#[test]
fn empty_new_table_builds_nothing() {
    for tag in [tag::NAME, tag::GLYF, tag::CMAP, tag::HMTX] {
        let builder = get_empty_builder(Header::new(tag));
        assert!(builder.build().unwrap().is_none());
    }
}

#[test]
fn child_edit_marks_container_and_refreshes_header() {
    let data = ReadableFontData::new(hdmx_data(&[(10, &[1, 2]), (12, &[2, 3])]));
    let header = Header::from_record(tag::HDMX, data.checksum(), 300, 20);
    let mut builder = HdmxTableBuilder::with_header_data(header, data, Default::default());
    builder.set_num_glyphs(2).unwrap();
    assert!(!builder.changed());

    builder.record_mut(1).unwrap().record_mut().unwrap().widths[0] = 9;
    assert!(builder.changed());
    assert!(builder.contained_model_changed());
    assert!(!builder.current_model_changed());

    let table = builder.build().unwrap().unwrap();
    assert!(!table.header().offset_valid());
    assert!(!table.header().checksum_valid());
    assert_eq!(table.header_length(), 16);
    assert_eq!(table.device_record(1).unwrap().widths(), &[9, 3]);
    assert_eq!(table.device_record(0).unwrap().widths(), &[1, 2]);
}

#[test]
fn cmap_built_from_scratch() {
    let mut builder = CmapTableBuilder::with_header(Header::new(tag::CMAP), Default::default());
    let mappings: BTreeMap<u32, u16> = (0x41..=0x5A).zip(1..).collect();
    for id in [CmapId::WINDOWS_BMP, CmapId::new(PlatformId::UNICODE, EncodingId::UNICODE_BMP)] {
        let subtable = builder.new_subtable_builder(id, 4).unwrap();
        *subtable.mappings_mut().unwrap() = mappings.clone();
    }
    let table = builder.build().unwrap().unwrap();

    let records = table.encoding_records().unwrap().to_vec();
    assert_eq!(records.len(), 2);
    // Identical subtables are written once.
    assert_eq!(records[0].offset, records[1].offset);

    let windows = table
        .find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2)
        .unwrap()
        .unwrap();
    assert_eq!(windows.format(), Ok(4));
    assert_eq!(windows.map_glyph(0x5A), Ok(Some(26)));
    assert_eq!(windows.map_glyph(0x61), Ok(None));
    assert_eq!(windows.mappings().unwrap(), mappings);

    let rebuilt = AnyTable::Cmap(table).to_builder().build().unwrap().unwrap();
    assert_eq!(rebuilt.header_tag(), tag::CMAP);
}
