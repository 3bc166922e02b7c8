use icc::{decode_icc, DeviceClass, Platform, ProfileWarning, RenderingIntent};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Header of a 546 byte Kodak ROMM RGB input profile with a three entry tag
// table.
fn romm_profile() -> Vec<u8> {
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

    bytes[128..132].copy_from_slice(&3u32.to_be_bytes());
    let tags: [(&[u8; 4], u32, u32); 3] = [(b"desc", 168, 100), (b"wtpt", 268, 20), (b"rXYZ", 288, 20)];
    for (i, (signature, offset, size)) in tags.iter().enumerate() {
        let entry = 132 + 12 * i;
        bytes[entry..entry + 4].copy_from_slice(*signature);
        bytes[entry + 4..entry + 8].copy_from_slice(&offset.to_be_bytes());
        bytes[entry + 8..entry + 12].copy_from_slice(&size.to_be_bytes());
    }
    bytes
}

#[test]
fn test_romm_header() {
    init_logger();
    let mut warnings = Vec::new();
    let profile = decode_icc(&romm_profile(), &mut warnings);
    assert!(warnings.is_empty(), "{:?}", warnings);

    assert_eq!(profile.size(), Some(546));
    assert_eq!(profile.preferred_cmm().unwrap().to_string(), "KCMS");
    assert_eq!(profile.version().unwrap().to_string(), "2.2.0");
    assert_eq!(profile.device_class(), Some(DeviceClass::Input));
    assert_eq!(
        profile.device_class().unwrap().to_string(),
        "input device profile"
    );
    assert_eq!(profile.colour_space().unwrap().to_string(), "RGB");
    assert_eq!(profile.connection_space().unwrap().to_string(), "XYZ");
    assert_eq!(
        profile.date_time().unwrap().to_string(),
        "2001-08-30 13:32:37"
    );
    assert_eq!(profile.file_signature().unwrap().to_string(), "acsp");
    assert!(matches!(profile.platform(), Some(Platform::Unrecognized(_))));
    assert_eq!(profile.platform().unwrap().to_string(), "unrecognized");
    assert_eq!(
        profile.flags().unwrap().to_string(),
        "embedded, can be used independently"
    );
    assert_eq!(profile.manufacturer().unwrap().to_string(), "KODA");
    assert_eq!(profile.model().unwrap().to_string(), "ROMM");
    assert_eq!(
        profile.attributes().unwrap().to_string(),
        "reflective, glossy, positive media polarity, color media"
    );
    assert_eq!(profile.rendering_intent(), Some(RenderingIntent::Perceptual));
    assert_eq!(profile.creator().unwrap().to_string(), "JPEG");

    let illuminant = profile.illuminant().unwrap();
    assert!((illuminant[0] - 0.964203).abs() < 1e-6);
    assert!((illuminant[1] - 1.0).abs() < 1e-6);
    assert!((illuminant[2] - 0.824905).abs() < 1e-6);

    let tags = profile.tags();
    assert_eq!(tags.len(), 3);
    assert_eq!(tags[0].signature().to_string(), "desc");
    assert_eq!(tags[1].offset(), 268);
    assert_eq!(tags[2].size(), 20);
}

#[test]
fn test_truncated_profile() {
    init_logger();
    let bytes = romm_profile();
    let mut warnings = Vec::new();
    let profile = decode_icc(&bytes[..30], &mut warnings);

    assert_eq!(profile.size(), Some(546));
    assert_eq!(profile.device_class(), Some(DeviceClass::Input));
    assert_eq!(profile.connection_space().unwrap().to_string(), "XYZ");
    assert!(profile.date_time().is_none());
    assert!(profile.file_signature().is_none());
    assert!(profile.illuminant().is_none());
    assert!(profile.creator().is_none());
    assert!(profile.tags().is_empty());

    assert_eq!(warnings.len(), 2);
    assert_eq!(
        warnings[0].to_string(),
        "ICC profile of 30 bytes is shorter than its 128 byte header at profile offset 0"
    );
    assert_eq!(
        warnings[1].message(),
        "ICC profile size field is 546 but 30 bytes are present"
    );
}

#[test]
fn test_tag_table_is_clamped() {
    init_logger();
    let mut bytes = romm_profile();
    bytes[128..132].copy_from_slice(&1000u32.to_be_bytes());
    bytes.truncate(132 + 12 * 2 + 5);

    let mut warnings = Vec::new();
    let profile = decode_icc(&bytes, &mut warnings);
    assert_eq!(profile.tags().len(), 2);
    assert_eq!(profile.tags()[1].signature().to_string(), "wtpt");

    let offsets: Vec<usize> = warnings.iter().map(ProfileWarning::offset).collect();
    assert_eq!(offsets, vec![128, 132, 144, 0]);
    assert_eq!(
        warnings[0].message(),
        "ICC tag table declares 1000 tags but only 2 fit in the profile"
    );
    assert_eq!(
        warnings[2].message(),
        "ICC tag wtpt data runs past the end of the profile"
    );
}

#[test]
fn test_empty_profile() {
    init_logger();
    let mut warnings = Vec::new();
    let profile = decode_icc(&[], &mut warnings);
    assert_eq!(warnings.len(), 1);
    assert!(profile.size().is_none());
    assert!(profile.version().is_none());
    assert!(profile.tags().is_empty());
}
