#![allow(dead_code)]

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A box with a 32-bit length header.
pub fn jbox(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut bytes = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    bytes.extend_from_slice(box_type);
    bytes.extend_from_slice(payload);
    bytes
}

pub fn signature() -> Vec<u8> {
    jbox(b"jP  ", &[0x0D, 0x0A, 0x87, 0x0A])
}

pub fn file_type(brand: &[u8; 4], compatibility_list: &[&[u8; 4]]) -> Vec<u8> {
    let mut payload = brand.to_vec();
    payload.extend_from_slice(&[0, 0, 0, 0]);
    for entry in compatibility_list {
        payload.extend_from_slice(*entry);
    }
    jbox(b"ftyp", &payload)
}

pub fn image_header(height: u32, width: u32, no_components: u16) -> Vec<u8> {
    let mut payload = height.to_be_bytes().to_vec();
    payload.extend_from_slice(&width.to_be_bytes());
    payload.extend_from_slice(&no_components.to_be_bytes());
    payload.extend_from_slice(&[7, 7, 0, 0]);
    jbox(b"ihdr", &payload)
}

pub fn enumerated_colour(colour_space: u32) -> Vec<u8> {
    let mut payload = vec![1, 0, 0];
    payload.extend_from_slice(&colour_space.to_be_bytes());
    jbox(b"colr", &payload)
}

pub fn icc_colour(method: u8, profile: &[u8]) -> Vec<u8> {
    let mut payload = vec![method, 0, 0];
    payload.extend_from_slice(profile);
    jbox(b"colr", &payload)
}

pub fn channel_definition(channels: &[(u16, u16, u16)]) -> Vec<u8> {
    let mut payload = (channels.len() as u16).to_be_bytes().to_vec();
    for (index, channel_type, association) in channels {
        payload.extend_from_slice(&index.to_be_bytes());
        payload.extend_from_slice(&channel_type.to_be_bytes());
        payload.extend_from_slice(&association.to_be_bytes());
    }
    jbox(b"cdef", &payload)
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
pub fn cod() -> Vec<u8> {
    vec![
        0xFF, 0x52, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x01, 0x01, 0x05, 0x04, 0x04, 0x00, 0x01,
    ]
}

pub fn qcd() -> Vec<u8> {
    vec![0xFF, 0x5C, 0x00, 0x07, 0x40, 0x40, 0x48, 0x48, 0x50]
}

pub fn sot(tile_index: u16, psot: u32) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0x90, 0x00, 0x0A];
    bytes.extend_from_slice(&tile_index.to_be_bytes());
    bytes.extend_from_slice(&psot.to_be_bytes());
    bytes.extend_from_slice(&[0, 1]);
    bytes
}

/// A single tile codestream of `width` by `height` with four bytes of
/// packet data.
pub fn codestream(width: u32, height: u32, no_components: u16) -> Vec<u8> {
    [
        SOC.to_vec(),
        siz(width, height, no_components),
        cod(),
        qcd(),
        sot(0, 18),
        SOD.to_vec(),
        vec![0x12, 0x34, 0x56, 0x78],
        EOC.to_vec(),
    ]
    .concat()
}

/// jP (12) + ftyp (20) + jp2h (45: ihdr 22 + colr 15) + jp2c.
pub fn jp2_file() -> Vec<u8> {
    let header = [image_header(1456, 2592, 3), enumerated_colour(16)].concat();
    [
        signature(),
        file_type(b"jp2 ", &[b"jp2 "]),
        jbox(b"jp2h", &header),
        jbox(b"jp2c", &codestream(2592, 1456, 3)),
    ]
    .concat()
}

// Header of a 546 byte Kodak ROMM RGB input profile.
pub fn romm_profile() -> Vec<u8> {
    let mut bytes = vec![0u8; 546];
    bytes[0..4].copy_from_slice(&546u32.to_be_bytes());
    bytes[4..8].copy_from_slice(b"KCMS");
    bytes[8..12].copy_from_slice(&[0x02, 0x20, 0x00, 0x00]);
    bytes[12..16].copy_from_slice(b"scnr");
    bytes[16..20].copy_from_slice(b"RGB ");
    bytes[20..24].copy_from_slice(b"XYZ ");
    for (i, value) in [2001u16, 8, 30, 13, 32, 37].iter().enumerate() {
        bytes[24 + 2 * i..26 + 2 * i].copy_from_slice(&value.to_be_bytes());
    }
    bytes[36..40].copy_from_slice(b"acsp");
    bytes[44..48].copy_from_slice(&1u32.to_be_bytes());
    bytes[48..52].copy_from_slice(b"KODA");
    bytes[52..56].copy_from_slice(b"ROMM");
    bytes[68..72].copy_from_slice(&63190u32.to_be_bytes());
    bytes[72..76].copy_from_slice(&65536u32.to_be_bytes());
    bytes[76..80].copy_from_slice(&54061u32.to_be_bytes());
    bytes[80..84].copy_from_slice(b"JPEG");
    bytes
}
