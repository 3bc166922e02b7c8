#![allow(dead_code)]

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const SOC: [u8; 2] = [0xFF, 0x4F];
pub const SOD: [u8; 2] = [0xFF, 0x93];
pub const EOC: [u8; 2] = [0xFF, 0xD9];

/// SIZ for a single tile image with 8 bit unsigned components.
pub fn siz(width: u32, height: u32, no_components: u16) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0x51];
    bytes.extend_from_slice(&(38 + 3 * no_components).to_be_bytes());
    bytes.extend_from_slice(&[0x00, 0x00]);
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[0; 8]);
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[0; 8]);
    bytes.extend_from_slice(&no_components.to_be_bytes());
    for _ in 0..no_components {
        bytes.extend_from_slice(&[0x07, 0x01, 0x01]);
    }
    bytes
}

/// COD with LRCP progression, one layer, five decomposition levels, 64x64
/// code-blocks and the 5-3 reversible filter.
pub fn cod(coding_style: u8, multiple_component_transformation: u8) -> Vec<u8> {
    vec![
        0xFF,
        0x52,
        0x00,
        0x0C,
        coding_style,
        0x00,
        0x00,
        0x01,
        multiple_component_transformation,
        0x05,
        0x04,
        0x04,
        0x00,
        0x01,
    ]
}

pub fn qcd() -> Vec<u8> {
    vec![0xFF, 0x5C, 0x00, 0x07, 0x40, 0x40, 0x48, 0x48, 0x50]
}

pub fn sot(tile_index: u16, psot: u32, tile_part_index: u8, no_tile_parts: u8) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0x90, 0x00, 0x0A];
    bytes.extend_from_slice(&tile_index.to_be_bytes());
    bytes.extend_from_slice(&psot.to_be_bytes());
    bytes.push(tile_part_index);
    bytes.push(no_tile_parts);
    bytes
}

/// SOC, SIZ (3 components), COD, QCD.
pub fn main_header() -> Vec<u8> {
    [SOC.to_vec(), siz(2592, 1456, 3), cod(0x00, 0x01), qcd()].concat()
}

/// A codestream with one tile-part carrying `data`, with Psot as given.
pub fn single_tile_codestream(psot: u32, data: &[u8]) -> Vec<u8> {
    [
        main_header(),
        sot(0, psot, 0, 1),
        SOD.to_vec(),
        data.to_vec(),
        EOC.to_vec(),
    ]
    .concat()
}
