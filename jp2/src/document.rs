use crate::*;
use jpc::{ByteReader, Codestream, Diagnostics, ImageAndTileSizeMarkerSegment};
use log::info;
use std::io;

// SOC, the first two bytes of every raw codestream.
const CODESTREAM_MAGIC: [u8; 2] = [0xFF, 0x4F];

/// Parse behaviour shared by every decode entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Stop each codestream parse at the first SOD marker.
    pub header_only: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions { header_only: true }
    }
}

/// A decoded file: a raw codestream or a tree of boxes.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Codestream {
        data: Vec<u8>,
        codestream: Codestream,
    },
    Boxes(Vec<Jp2Box>),
}

impl Document {
    /// Decodes whatever follows the reader's position, detecting a raw
    /// codestream by its SOC marker.
    ///
    /// A raw codestream that fails to parse is an error. In a box file the
    /// same failure is only a warning on `diagnostics`.
    pub fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        options: &DecodeOptions,
        diagnostics: &mut Diagnostics,
    ) -> Result<Document, JP2Error> {
        let start = reader.byte_offset()?;
        let length = reader.remaining_bytes()?;

        let magic: [u8; 2] = reader.read_array()?;
        reader.seek_to(start)?;

        if magic == CODESTREAM_MAGIC {
            info!("Raw codestream at byte offset {}", start);
            let codestream =
                jpc::decode_jpc(reader, length, options.header_only, diagnostics)?;
            reader.seek_to(start)?;
            let data = reader.read_bytes(length)?;
            Ok(Document::Codestream { data, codestream })
        } else {
            let boxes = decode_jp2(reader, options, diagnostics)?;
            Ok(Document::Boxes(boxes))
        }
    }

    /// Top-level boxes; empty for a raw codestream.
    pub fn boxes(&self) -> &[Jp2Box] {
        match self {
            Document::Codestream { .. } => &[],
            Document::Boxes(boxes) => boxes,
        }
    }

    /// The first codestream in the document.
    pub fn codestream(&self) -> Option<&Codestream> {
        match self {
            Document::Codestream { codestream, .. } => Some(codestream),
            Document::Boxes(boxes) => {
                Jp2Box::first_codestream(boxes).and_then(ContiguousCodestreamBox::codestream)
            }
        }
    }

    fn codestream_data(&self) -> Option<&[u8]> {
        match self {
            Document::Codestream { data, .. } => Some(data),
            Document::Boxes(boxes) => Jp2Box::first_codestream(boxes).map(|jp2c| jp2c.data()),
        }
    }

    /// First Image Header box inside the first JP2 Header box.
    pub fn image_header(&self) -> Option<&ImageHeaderBox> {
        let header = self
            .boxes()
            .iter()
            .find(|jbox| jbox.box_type() == BOX_TYPE_HEADER)?;
        header
            .children()
            .iter()
            .find_map(|jbox| match jbox.payload() {
                BoxPayload::ImageHeader(ihdr) => Some(ihdr),
                _ => None,
            })
    }

    /// First Colour Specification box inside the first JP2 Header box.
    pub fn colour_specification(&self) -> Option<&ColourSpecificationBox> {
        let header = self
            .boxes()
            .iter()
            .find(|jbox| jbox.box_type() == BOX_TYPE_HEADER)?;
        header
            .children()
            .iter()
            .find_map(|jbox| match jbox.payload() {
                BoxPayload::ColourSpecification(colr) => Some(colr),
                _ => None,
            })
    }

    /// Image height, width and number of components.
    ///
    /// Taken from the Image Header box when there is one, otherwise from
    /// the SIZ marker segment of the first codestream.
    pub fn shape(&self) -> Option<(u32, u32, u16)> {
        if let Some(ihdr) = self.image_header() {
            return Some((ihdr.height(), ihdr.width(), ihdr.components_num()));
        }
        let siz = self.codestream()?.image_and_tile_size_marker_segment()?;
        Some((siz.height(), siz.width(), siz.no_components()))
    }

    /// Wraps the first codestream in a default JP2 jacket.
    ///
    /// The colourspace of an existing JP2 Header box is carried over.
    pub fn rewrap(&self) -> Result<Vec<Jp2Box>, JP2Error> {
        let data = self.codestream_data().ok_or(JP2Error::BoxMissing {
            box_type: BOX_TYPE_CONTIGUOUS_CODESTREAM,
        })?;
        let colour = self.colour_specification().cloned();
        let mut diagnostics = Diagnostics::new();
        let jp2c = ContiguousCodestreamBox::new(data.to_vec(), true, &mut diagnostics);
        jacket(jp2c, colour)
    }

    /// Boxes of this file followed by `jbox`.
    ///
    /// Only XML boxes and XMP UUID boxes can be appended, and only to a box
    /// file. Lengths are recomputed on encode, so a last box read with a
    /// length of 0 is written back with its real length.
    pub fn append(&self, jbox: Jp2Box) -> Result<Vec<Jp2Box>, JP2Error> {
        let boxes = match self {
            Document::Boxes(boxes) => boxes,
            Document::Codestream { .. } => {
                return Err(JP2Error::AppendRefused {
                    box_type: jbox.box_type(),
                    reason: "a raw codestream has no boxes".to_owned(),
                })
            }
        };

        match jbox.payload() {
            BoxPayload::Xml(_) => {}
            BoxPayload::Uuid(uuid) if uuid.is_xmp() => {}
            _ => {
                return Err(JP2Error::AppendRefused {
                    box_type: jbox.box_type(),
                    reason: "only XML boxes and XMP UUID boxes can be appended".to_owned(),
                })
            }
        }

        info!("Appending '{}' box", jbox.box_type_str());
        let mut appended = boxes.clone();
        appended.push(jbox);
        Ok(appended)
    }

    /// Decodes a region of the first codestream through `codec`.
    ///
    /// The document must have been decoded with `header_only` unset.
    pub fn read_region<C: PixelCodec + ?Sized>(
        &self,
        codec: &mut C,
        request: &RegionRequest,
    ) -> Result<DecodedRegion, JP2Error> {
        let codestream = self.codestream().ok_or(JP2Error::BoxMissing {
            box_type: BOX_TYPE_CONTIGUOUS_CODESTREAM,
        })?;
        let parameters = DecodeParameters::new(codestream, request)?;
        codec
            .decode(codestream, &parameters)
            .map_err(JP2Error::Codec)
    }
}

/// Wraps raw codestream bytes in the default jacket: Signature, File Type,
/// JP2 Header (Image Header and Colour Specification) and Contiguous
/// Codestream boxes.
///
/// The colourspace is greyscale for fewer than three components and sRGB
/// otherwise.
pub fn wrap_codestream(data: Vec<u8>) -> Result<Vec<Jp2Box>, JP2Error> {
    let mut diagnostics = Diagnostics::new();
    let length = data.len() as u64;
    let codestream = jpc::decode_jpc(&mut io::Cursor::new(&data), length, true, &mut diagnostics)?;

    let mut jp2c = ContiguousCodestreamBox::default();
    jp2c.decode(&mut io::Cursor::new(data), &mut diagnostics)?;
    jp2c.set_codestream(Some(codestream));
    jacket(jp2c, None)
}

fn jacket(
    jp2c: ContiguousCodestreamBox,
    colour: Option<ColourSpecificationBox>,
) -> Result<Vec<Jp2Box>, JP2Error> {
    let siz = jp2c
        .codestream()
        .and_then(Codestream::image_and_tile_size_marker_segment)
        .ok_or(jpc::CodestreamError::MarkerMissing(jpc::MARKER_SYMBOL_SIZ))?;

    let colour = colour.unwrap_or_else(|| {
        ColourSpecificationBox::new_enumerated(if siz.no_components() < 3 {
            EnumeratedColourSpaces::Greyscale
        } else {
            EnumeratedColourSpaces::sRGB
        })
    });

    let mut header = image_header_boxes(siz);
    header.push(Jp2Box::new(BoxPayload::ColourSpecification(colour)));

    let boxes = vec![
        Jp2Box::new(BoxPayload::Signature(SignatureBox::default())),
        Jp2Box::new(BoxPayload::FileType(FileTypeBox::new(
            BRAND_JP2,
            0,
            vec![BRAND_JP2],
        ))),
        Jp2Box::superbox(BOX_TYPE_HEADER, header),
        Jp2Box::new(BoxPayload::ContiguousCodestream(jp2c)),
    ];
    validate_jp2_box_sequence(&boxes)?;
    Ok(boxes)
}

// Image Header box, followed by a Bits Per Component box when the components
// differ in depth or sign.
fn image_header_boxes(siz: &ImageAndTileSizeMarkerSegment) -> Vec<Jp2Box> {
    let depths: Vec<BitDepth> = siz
        .components()
        .iter()
        .map(|c| BitDepth::new(c.bit_depth(), c.is_signed()))
        .collect();
    let uniform = match depths.split_first() {
        Some((first, rest)) if rest.iter().all(|depth| depth == first) => Some(*first),
        _ => None,
    };

    let ihdr = ImageHeaderBox::new(siz.height(), siz.width(), siz.no_components(), uniform);
    let mut boxes = vec![Jp2Box::new(BoxPayload::ImageHeader(ihdr))];
    if uniform.is_none() {
        boxes.push(Jp2Box::new(BoxPayload::BitsPerComponent(
            BitsPerComponentBox::new(depths),
        )));
    }
    boxes
}
