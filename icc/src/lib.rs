use log::{debug, info};
use std::convert::TryInto;
use std::fmt;

// ICC.1:2001-04, clause 6.1
//
// The profile header is 128 bytes, followed by the tag count and a table of
// 12 byte tag entries.
const HEADER_SIZE: usize = 128;
const TAG_ENTRY_SIZE: usize = 12;

/// A recoverable anomaly in a profile, located by its offset from the first
/// byte of the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileWarning {
    offset: usize,
    message: String,
}

impl ProfileWarning {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProfileWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at profile offset {}", self.message, self.offset)
    }
}

fn push_warning(warnings: &mut Vec<ProfileWarning>, offset: usize, message: String) {
    let warning = ProfileWarning { offset, message };
    debug!("{}", warning);
    warnings.push(warning);
}

/// A four byte value registered with the ICC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 4]);

impl Signature {
    pub fn new(value: [u8; 4]) -> Self {
        Signature(value)
    }

    pub fn value(&self) -> [u8; 4] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }
}

impl fmt::Display for Signature {
    // Printable signatures are shown without their space padding, anything
    // else as hexadecimal.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            let text: String = self.0.iter().map(|b| *b as char).collect();
            f.write_str(text.trim_end())
        } else {
            write!(f, "0x{:08x}", u32::from_be_bytes(self.0))
        }
    }
}

// Profile version number, the major revision in byte 8 and the minor and
// bug fix revisions in the two nibbles of byte 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileVersion {
    pub major: u8,
    pub minor: u8,
    pub bugfix: u8,
}

impl fmt::Display for ProfileVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.bugfix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Input,
    Display,
    Output,
    DeviceLink,
    ColourSpaceConversion,
    Abstract,
    NamedColour,
    Unknown(Signature),
}

impl DeviceClass {
    pub fn new(signature: Signature) -> DeviceClass {
        match &signature.0 {
            b"scnr" => DeviceClass::Input,
            b"mntr" => DeviceClass::Display,
            b"prtr" => DeviceClass::Output,
            b"link" => DeviceClass::DeviceLink,
            b"spac" => DeviceClass::ColourSpaceConversion,
            b"abst" => DeviceClass::Abstract,
            b"nmcl" => DeviceClass::NamedColour,
            _ => DeviceClass::Unknown(signature),
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceClass::Input => f.write_str("input device profile"),
            DeviceClass::Display => f.write_str("display device profile"),
            DeviceClass::Output => f.write_str("output device profile"),
            DeviceClass::DeviceLink => f.write_str("devicelink profile"),
            DeviceClass::ColourSpaceConversion => f.write_str("colorspace conversion profile"),
            DeviceClass::Abstract => f.write_str("abstract profile"),
            DeviceClass::NamedColour => f.write_str("named colour profile"),
            DeviceClass::Unknown(signature) => write!(f, "unrecognized ({})", signature),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Apple,
    Microsoft,
    SiliconGraphics,
    Sun,
    Unrecognized(Signature),
}

impl Platform {
    pub fn new(signature: Signature) -> Platform {
        match &signature.0 {
            b"APPL" => Platform::Apple,
            b"MSFT" => Platform::Microsoft,
            b"SGI " => Platform::SiliconGraphics,
            b"SUNW" => Platform::Sun,
            _ => Platform::Unrecognized(signature),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Platform::Apple => f.write_str("Apple Computer, Inc."),
            Platform::Microsoft => f.write_str("Microsoft Corporation"),
            Platform::SiliconGraphics => f.write_str("Silicon Graphics, Inc."),
            Platform::Sun => f.write_str("Sun Microsystems, Inc."),
            Platform::Unrecognized(_) => f.write_str("unrecognized"),
        }
    }
}

// Profile flags, bit 0 is set for an embedded profile and bit 1 when the
// profile cannot be used independently of the embedded colour data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileFlags(u32);

impl ProfileFlags {
    pub fn new(value: u32) -> Self {
        ProfileFlags(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn is_embedded(&self) -> bool {
        self.0 & 0b01 != 0
    }

    pub fn is_independent(&self) -> bool {
        self.0 & 0b10 == 0
    }
}

impl fmt::Display for ProfileFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let embedded = if self.is_embedded() {
            "embedded"
        } else {
            "not embedded"
        };
        let independent = if self.is_independent() {
            "can"
        } else {
            "cannot"
        };
        write!(f, "{}, {} be used independently", embedded, independent)
    }
}

// Device attributes, the low four bits of a 64 bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceAttributes(u64);

impl DeviceAttributes {
    pub fn new(value: u64) -> Self {
        DeviceAttributes(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_transparency(&self) -> bool {
        self.0 & 0b0001 != 0
    }

    pub fn is_matte(&self) -> bool {
        self.0 & 0b0010 != 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 & 0b0100 != 0
    }

    pub fn is_black_and_white(&self) -> bool {
        self.0 & 0b1000 != 0
    }
}

impl fmt::Display for DeviceAttributes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let media = if self.is_transparency() {
            "transparency"
        } else {
            "reflective"
        };
        let finish = if self.is_matte() { "matte" } else { "glossy" };
        let polarity = if self.is_negative() {
            "negative"
        } else {
            "positive"
        };
        let colour = if self.is_black_and_white() {
            "black and white"
        } else {
            "color"
        };
        write!(
            f,
            "{}, {}, {} media polarity, {} media",
            media, finish, polarity, colour
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderingIntent {
    Perceptual,
    MediaRelativeColorimetric,
    Saturation,
    AbsoluteColorimetric,
    Reserved { value: u32 },
}

impl RenderingIntent {
    pub fn new(value: u32) -> RenderingIntent {
        // Only the low 16 bits carry the intent.
        match value & 0xFFFF {
            0 => RenderingIntent::Perceptual,
            1 => RenderingIntent::MediaRelativeColorimetric,
            2 => RenderingIntent::Saturation,
            3 => RenderingIntent::AbsoluteColorimetric,
            _ => RenderingIntent::Reserved { value },
        }
    }
}

impl fmt::Display for RenderingIntent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RenderingIntent::Perceptual => f.write_str("perceptual"),
            RenderingIntent::MediaRelativeColorimetric => {
                f.write_str("media-relative colorimetric")
            }
            RenderingIntent::Saturation => f.write_str("saturation"),
            RenderingIntent::AbsoluteColorimetric => f.write_str("ICC-absolute colorimetric"),
            RenderingIntent::Reserved { value } => write!(f, "reserved ({})", value),
        }
    }
}

// dateTimeNumber, six 16 bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

// Each tag signature in the tag table must be unique; a profile cannot
// contain more than one tag with the same signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    signature: Signature,
    offset: u32,
    size: u32,
}

impl Tag {
    pub fn signature(&self) -> Signature {
        self.signature
    }

    // An address within an ICC profile, relative to byte zero of the profile.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    // The number of bytes in the tag data element.
    pub fn size(&self) -> u32 {
        self.size
    }
}

/// Header fields and tag table of an ICC profile.
///
/// Fields that do not fit in the bytes given are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ICCProfile {
    size: Option<u32>,
    preferred_cmm: Option<Signature>,
    version: Option<ProfileVersion>,
    device_class: Option<DeviceClass>,
    colour_space: Option<Signature>,
    connection_space: Option<Signature>,
    date_time: Option<DateTime>,
    file_signature: Option<Signature>,
    platform: Option<Platform>,
    flags: Option<ProfileFlags>,
    manufacturer: Option<Signature>,
    model: Option<Signature>,
    attributes: Option<DeviceAttributes>,
    rendering_intent: Option<RenderingIntent>,
    illuminant: Option<[f64; 3]>,
    creator: Option<Signature>,
    tags: Vec<Tag>,
}

impl ICCProfile {
    pub fn size(&self) -> Option<u32> {
        self.size
    }

    pub fn preferred_cmm(&self) -> Option<Signature> {
        self.preferred_cmm
    }

    pub fn version(&self) -> Option<ProfileVersion> {
        self.version
    }

    pub fn device_class(&self) -> Option<DeviceClass> {
        self.device_class
    }

    pub fn colour_space(&self) -> Option<Signature> {
        self.colour_space
    }

    pub fn connection_space(&self) -> Option<Signature> {
        self.connection_space
    }

    pub fn date_time(&self) -> Option<DateTime> {
        self.date_time
    }

    pub fn file_signature(&self) -> Option<Signature> {
        self.file_signature
    }

    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    pub fn flags(&self) -> Option<ProfileFlags> {
        self.flags
    }

    pub fn manufacturer(&self) -> Option<Signature> {
        self.manufacturer
    }

    pub fn model(&self) -> Option<Signature> {
        self.model
    }

    pub fn attributes(&self) -> Option<DeviceAttributes> {
        self.attributes
    }

    pub fn rendering_intent(&self) -> Option<RenderingIntent> {
        self.rendering_intent
    }

    /// PCS illuminant as CIE XYZ.
    pub fn illuminant(&self) -> Option<[f64; 3]> {
        self.illuminant
    }

    pub fn creator(&self) -> Option<Signature> {
        self.creator
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

fn field<const N: usize>(bytes: &[u8], offset: usize) -> Option<[u8; N]> {
    bytes.get(offset..offset + N)?.try_into().ok()
}

fn u16_at(bytes: &[u8], offset: usize) -> Option<u16> {
    field(bytes, offset).map(u16::from_be_bytes)
}

fn u32_at(bytes: &[u8], offset: usize) -> Option<u32> {
    field(bytes, offset).map(u32::from_be_bytes)
}

fn signature_at(bytes: &[u8], offset: usize) -> Option<Signature> {
    field(bytes, offset).map(Signature)
}

// s15Fixed16Number
fn s15_fixed16_at(bytes: &[u8], offset: usize) -> Option<f64> {
    field(bytes, offset).map(|value| i32::from_be_bytes(value) as f64 / 65536.0)
}

fn date_time_at(bytes: &[u8], offset: usize) -> Option<DateTime> {
    Some(DateTime {
        year: u16_at(bytes, offset)?,
        month: u16_at(bytes, offset + 2)?,
        day: u16_at(bytes, offset + 4)?,
        hour: u16_at(bytes, offset + 6)?,
        minute: u16_at(bytes, offset + 8)?,
        second: u16_at(bytes, offset + 10)?,
    })
}

/// Decodes the header and tag table of the ICC profile in `bytes`.
///
/// Never fails: a truncated profile leaves the fields it cannot reach unset.
/// Anomalies are appended to `warnings`.
pub fn decode_icc(bytes: &[u8], warnings: &mut Vec<ProfileWarning>) -> ICCProfile {
    info!("ICC profile start, {} bytes", bytes.len());
    if bytes.len() < HEADER_SIZE {
        push_warning(
            warnings,
            0,
            format!(
                "ICC profile of {} bytes is shorter than its {} byte header",
                bytes.len(),
                HEADER_SIZE
            ),
        );
    }

    let profile = ICCProfile {
        size: u32_at(bytes, 0),
        preferred_cmm: signature_at(bytes, 4),
        version: field::<2>(bytes, 8).map(|version| ProfileVersion {
            major: version[0],
            minor: version[1] >> 4,
            bugfix: version[1] & 0x0F,
        }),
        device_class: signature_at(bytes, 12).map(DeviceClass::new),
        colour_space: signature_at(bytes, 16),
        connection_space: signature_at(bytes, 20),
        date_time: date_time_at(bytes, 24),
        file_signature: signature_at(bytes, 36),
        platform: signature_at(bytes, 40).map(Platform::new),
        flags: u32_at(bytes, 44).map(ProfileFlags),
        manufacturer: signature_at(bytes, 48),
        model: signature_at(bytes, 52),
        attributes: field(bytes, 56).map(|value| DeviceAttributes(u64::from_be_bytes(value))),
        rendering_intent: u32_at(bytes, 64).map(RenderingIntent::new),
        illuminant: match (
            s15_fixed16_at(bytes, 68),
            s15_fixed16_at(bytes, 72),
            s15_fixed16_at(bytes, 76),
        ) {
            (Some(x), Some(y), Some(z)) => Some([x, y, z]),
            _ => None,
        },
        creator: signature_at(bytes, 80),
        tags: decode_tag_table(bytes, warnings),
    };

    if let Some(signature) = profile.file_signature {
        if &signature.0 != b"acsp" {
            push_warning(
                warnings,
                36,
                format!("ICC profile signature is {}, expected acsp", signature),
            );
        }
    }
    if let Some(size) = profile.size {
        if size as usize != bytes.len() {
            push_warning(
                warnings,
                0,
                format!(
                    "ICC profile size field is {} but {} bytes are present",
                    size,
                    bytes.len()
                ),
            );
        }
    }
    debug!(
        "ICC profile version {:?}, class {:?}, {} tags",
        profile.version,
        profile.device_class,
        profile.tags.len()
    );
    info!("ICC profile end");

    profile
}

fn decode_tag_table(bytes: &[u8], warnings: &mut Vec<ProfileWarning>) -> Vec<Tag> {
    let count = match u32_at(bytes, HEADER_SIZE) {
        Some(count) => count as usize,
        None => return vec![],
    };

    let available = (bytes.len() - HEADER_SIZE - 4) / TAG_ENTRY_SIZE;
    if count > available {
        push_warning(
            warnings,
            HEADER_SIZE,
            format!(
                "ICC tag table declares {} tags but only {} fit in the profile",
                count, available
            ),
        );
    }

    let mut tags = Vec::with_capacity(count.min(available));
    for i in 0..count.min(available) {
        let entry = HEADER_SIZE + 4 + i * TAG_ENTRY_SIZE;
        if let (Some(signature), Some(offset), Some(size)) = (
            signature_at(bytes, entry),
            u32_at(bytes, entry + 4),
            u32_at(bytes, entry + 8),
        ) {
            if offset as u64 + size as u64 > bytes.len() as u64 {
                push_warning(
                    warnings,
                    entry,
                    format!("ICC tag {} data runs past the end of the profile", signature),
                );
            }
            tags.push(Tag {
                signature,
                offset,
                size,
            });
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_display() {
        assert_eq!(Signature::new(*b"RGB ").to_string(), "RGB");
        assert_eq!(Signature::new(*b"XYZ ").to_string(), "XYZ");
        assert_eq!(Signature::new([0, 0, 0, 1]).to_string(), "0x00000001");
    }

    #[test]
    fn test_field_past_end() {
        let bytes = [0u8, 1, 2];
        assert_eq!(u16_at(&bytes, 1), Some(0x0102));
        assert_eq!(u16_at(&bytes, 2), None);
        assert_eq!(u32_at(&bytes, 0), None);
    }
}
