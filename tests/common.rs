// In-memory test fonts.

/// A TrueType font file holding `tables`, with a valid table directory.
pub fn font_bytes(tables: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = 15u16.saturating_sub(num_tables.leading_zeros() as u16);
    let search_range = (1u16 << entry_selector) * 16;

    let mut font = Vec::new();
    font.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    font.extend_from_slice(&num_tables.to_be_bytes());
    font.extend_from_slice(&search_range.to_be_bytes());
    font.extend_from_slice(&entry_selector.to_be_bytes());
    font.extend_from_slice(&(num_tables * 16 - search_range).to_be_bytes());

    let mut sorted = tables.to_vec();
    sorted.sort_by_key(|(tag, _)| *tag);
    let mut offset = 12 + 16 * tables.len();
    for (tag, data) in &sorted {
        let mut sum = checksum(data);
        if *tag == u32::from_be_bytes(*b"head") {
            sum = sum.wrapping_sub(checksum(&data[8..12]));
        }
        font.extend_from_slice(&tag.to_be_bytes());
        font.extend_from_slice(&sum.to_be_bytes());
        font.extend_from_slice(&(offset as u32).to_be_bytes());
        font.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += (data.len() + 3) / 4 * 4;
    }
    for (_, data) in &sorted {
        font.extend_from_slice(data);
        font.resize((font.len() + 3) / 4 * 4, 0);
    }
    font
}

/// Sum of the big-endian words of `data`, zero padded.
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

pub fn head_data() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&[0, 1, 0, 0]); // version
    data.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // fontRevision
    data.extend_from_slice(&0u32.to_be_bytes()); // checkSumAdjustment
    data.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes()); // magicNumber
    data.extend_from_slice(&0u16.to_be_bytes()); // flags
    data.extend_from_slice(&1000u16.to_be_bytes()); // unitsPerEm
    data.extend_from_slice(&[0; 16]); // created, modified
    for bound in [0i16, -200, 900, 800] {
        data.extend_from_slice(&bound.to_be_bytes());
    }
    data.extend_from_slice(&0u16.to_be_bytes()); // macStyle
    data.extend_from_slice(&8u16.to_be_bytes()); // lowestRecPPEM
    data.extend_from_slice(&2i16.to_be_bytes()); // fontDirectionHint
    data.extend_from_slice(&0i16.to_be_bytes()); // indexToLocFormat
    data.extend_from_slice(&0i16.to_be_bytes()); // glyphDataFormat
    data
}

pub fn maxp_data(num_glyphs: u16) -> Vec<u8> {
    let mut data = 0x0000_5000u32.to_be_bytes().to_vec();
    data.extend_from_slice(&num_glyphs.to_be_bytes());
    data
}

pub fn hhea_data(num_h_metrics: u16) -> Vec<u8> {
    let mut data = vec![0, 1, 0, 0];
    for value in [800i16, -200, 0] {
        data.extend_from_slice(&value.to_be_bytes());
    }
    data.extend_from_slice(&[0; 24]);
    data.extend_from_slice(&num_h_metrics.to_be_bytes());
    data
}

/// `hmtx` with the given long metrics, then left side bearings.
pub fn hmtx_data(metrics: &[(u16, i16)], lsbs: &[i16]) -> Vec<u8> {
    let mut data = Vec::new();
    for (advance, lsb) in metrics {
        data.extend_from_slice(&advance.to_be_bytes());
        data.extend_from_slice(&lsb.to_be_bytes());
    }
    for lsb in lsbs {
        data.extend_from_slice(&lsb.to_be_bytes());
    }
    data
}

/// `hdmx` with one device record per `(pixel_size, widths)`.
pub fn hdmx_data(records: &[(u8, &[u8])]) -> Vec<u8> {
    let num_glyphs = records.first().map_or(0, |(_, widths)| widths.len());
    let record_size = (2 + num_glyphs + 3) / 4 * 4;
    let mut data = vec![0, 0];
    data.extend_from_slice(&(records.len() as i16).to_be_bytes());
    data.extend_from_slice(&(record_size as i32).to_be_bytes());
    for (pixel_size, widths) in records {
        let start = data.len();
        data.push(*pixel_size);
        data.push(widths.iter().copied().max().unwrap_or(0));
        data.extend_from_slice(widths);
        data.resize(start + record_size, 0);
    }
    data
}

pub fn tag(bytes: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*bytes)
}
