use crate::*;
use jpc::{ByteReader, Codestream, Diagnostics};
use log::{debug, info};
use std::io;

/// Decoded contents of a box.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxPayload {
    Signature(SignatureBox),
    FileType(FileTypeBox),
    ImageHeader(ImageHeaderBox),
    BitsPerComponent(BitsPerComponentBox),
    ColourSpecification(ColourSpecificationBox),
    Palette(PaletteBox),
    ComponentMapping(ComponentMappingBox),
    ChannelDefinition(ChannelDefinitionBox),
    CaptureResolution(CaptureResolutionBox),
    DefaultDisplayResolution(DefaultDisplayResolutionBox),
    ContiguousCodestream(ContiguousCodestreamBox),
    IntellectualProperty(IntellectualPropertyBox),
    Xml(XMLBox),
    Uuid(UUIDBox),
    UUIDList(UUIDListBox),
    DataEntryURL(DataEntryURLBox),
    Label(LabelBox),
    NumberList(NumberListBox),
    ReaderRequirements(ReaderRequirementsBox),
    FragmentList(FragmentListBox),
    DataReference(DataReferenceBox),
    Free(FreeBox),

    /// A box made only of other boxes.
    Superbox(BoxType),

    Unknown(UnknownBox),
}

// Forwards a `JBox` method to the payload of every leaf variant.
macro_rules! each_leaf {
    ($payload:expr, $jbox:ident => $body:expr, $superbox:ident => $otherwise:expr) => {
        match $payload {
            BoxPayload::Signature($jbox) => $body,
            BoxPayload::FileType($jbox) => $body,
            BoxPayload::ImageHeader($jbox) => $body,
            BoxPayload::BitsPerComponent($jbox) => $body,
            BoxPayload::ColourSpecification($jbox) => $body,
            BoxPayload::Palette($jbox) => $body,
            BoxPayload::ComponentMapping($jbox) => $body,
            BoxPayload::ChannelDefinition($jbox) => $body,
            BoxPayload::CaptureResolution($jbox) => $body,
            BoxPayload::DefaultDisplayResolution($jbox) => $body,
            BoxPayload::ContiguousCodestream($jbox) => $body,
            BoxPayload::IntellectualProperty($jbox) => $body,
            BoxPayload::Xml($jbox) => $body,
            BoxPayload::Uuid($jbox) => $body,
            BoxPayload::UUIDList($jbox) => $body,
            BoxPayload::DataEntryURL($jbox) => $body,
            BoxPayload::Label($jbox) => $body,
            BoxPayload::NumberList($jbox) => $body,
            BoxPayload::ReaderRequirements($jbox) => $body,
            BoxPayload::FragmentList($jbox) => $body,
            BoxPayload::DataReference($jbox) => $body,
            BoxPayload::Free($jbox) => $body,
            BoxPayload::Unknown($jbox) => $body,
            BoxPayload::Superbox($superbox) => $otherwise,
        }
    };
}

impl BoxPayload {
    pub fn identifier(&self) -> BoxType {
        each_leaf!(self, jbox => jbox.identifier(), box_type => *box_type)
    }

    /// Length of the encoded payload. Superbox contents are owned by the
    /// enclosing [`Jp2Box`] and count as zero here.
    pub fn payload_length(&self) -> u64 {
        each_leaf!(self, jbox => jbox.payload_length(), _box_type => 0)
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        each_leaf!(self, jbox => jbox.encode(writer), _box_type => Ok(()))
    }
}

/// Types whose contents are a sequence of boxes.
pub(crate) fn is_superbox(box_type: BoxType) -> bool {
    matches!(
        box_type,
        BOX_TYPE_HEADER
            | BOX_TYPE_RESOLUTION
            | BOX_TYPE_UUID_INFO
            | BOX_TYPE_ASSOCIATION
            | BOX_TYPE_CODESTREAM_HEADER
            | BOX_TYPE_COMPOSITING_LAYER_HEADER
            | BOX_TYPE_FRAGMENT_TABLE
    )
}

/// Human readable name of a box type.
pub fn long_name(box_type: BoxType) -> &'static str {
    match box_type {
        BOX_TYPE_SIGNATURE => "JPEG 2000 Signature",
        BOX_TYPE_FILE_TYPE => "File Type",
        BOX_TYPE_HEADER => "JP2 Header",
        BOX_TYPE_IMAGE_HEADER => "Image Header",
        BOX_TYPE_COLOUR_SPECIFICATION => "Colour Specification",
        BOX_TYPE_CHANNEL_DEFINITION => "Channel Definition",
        BOX_TYPE_COMPONENT_MAPPING => "Component Mapping",
        BOX_TYPE_PALETTE => "Palette",
        BOX_TYPE_BITS_PER_COMPONENT => "Bits Per Component",
        BOX_TYPE_RESOLUTION => "Resolution",
        BOX_TYPE_CAPTURE_RESOLUTION => "Capture Resolution",
        BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION => "Display Resolution",
        BOX_TYPE_CONTIGUOUS_CODESTREAM => "Contiguous Codestream",
        BOX_TYPE_INTELLECTUAL_PROPERTY => "Intellectual Property",
        BOX_TYPE_XML => "XML",
        BOX_TYPE_UUID => "UUID",
        BOX_TYPE_UUID_INFO => "UUIDInfo",
        BOX_TYPE_UUID_LIST => "UUID List",
        BOX_TYPE_DATA_ENTRY_URL => "Data Entry URL",
        BOX_TYPE_LABEL => "Label",
        BOX_TYPE_ASSOCIATION => "Association",
        BOX_TYPE_NUMBER_LIST => "Number List",
        BOX_TYPE_READER_REQUIREMENTS => "Reader Requirements",
        BOX_TYPE_FRAGMENT_TABLE => "Fragment Table",
        BOX_TYPE_FRAGMENT_LIST => "Fragment List",
        BOX_TYPE_DATA_REFERENCE => "Data Reference",
        BOX_TYPE_FREE => "Free",
        BOX_TYPE_CODESTREAM_HEADER => "Codestream Header",
        BOX_TYPE_COMPOSITING_LAYER_HEADER => "Compositing Layer Header",
        _ => "Unknown",
    }
}

/// A box in the file, with its position and any nested boxes.
///
/// Boxes built in memory have an offset and length of zero until written;
/// [`Jp2Box::encoded_length`] gives the length they will be written with.
#[derive(Debug, Clone, PartialEq)]
pub struct Jp2Box {
    box_type: BoxType,
    offset: u64,
    length: u64,
    header_length: u8,
    payload: BoxPayload,
    children: Vec<Jp2Box>,
}

impl Jp2Box {
    /// A box wrapping a decoded payload.
    pub fn new(payload: BoxPayload) -> Self {
        Jp2Box {
            box_type: payload.identifier(),
            offset: 0,
            length: 0,
            header_length: 8,
            payload,
            children: vec![],
        }
    }

    pub fn superbox(box_type: BoxType, children: Vec<Jp2Box>) -> Self {
        Jp2Box {
            box_type,
            offset: 0,
            length: 0,
            header_length: 8,
            payload: BoxPayload::Superbox(box_type),
            children,
        }
    }

    pub fn box_type(&self) -> BoxType {
        self.box_type
    }

    pub fn box_type_str(&self) -> String {
        box_type_str(&self.box_type)
    }

    pub fn long_name(&self) -> &'static str {
        long_name(self.box_type)
    }

    /// Offset of the first header byte in the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Length in the source, header included. Open-ended boxes are resolved
    /// to the end of their enclosing range.
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn header_length(&self) -> u8 {
        self.header_length
    }

    pub fn payload(&self) -> &BoxPayload {
        &self.payload
    }

    pub fn children(&self) -> &[Jp2Box] {
        &self.children
    }

    pub fn is_superbox(&self) -> bool {
        matches!(self.payload, BoxPayload::Superbox(_))
    }

    /// First direct child of type `box_type`.
    pub fn find(&self, box_type: BoxType) -> Option<&Jp2Box> {
        self.children.iter().find(|child| child.box_type == box_type)
    }

    /// Number of bytes [`Jp2Box::encode`] writes.
    pub fn encoded_length(&self) -> u64 {
        let content = self.content_length();
        content + self.encoded_header_length(content)
    }

    fn content_length(&self) -> u64 {
        if self.is_superbox() {
            self.children.iter().map(Jp2Box::encoded_length).sum()
        } else {
            self.payload.payload_length()
        }
    }

    // XLBox is kept for boxes read with one, and required once the length
    // no longer fits in 32 bits.
    fn encoded_header_length(&self, content: u64) -> u64 {
        if self.header_length == 16 || content + 8 > u32::MAX as u64 {
            16
        } else {
            8
        }
    }

    /// Writes the box with lengths computed from its contents.
    ///
    /// The box is serialized in full before anything reaches `writer`.
    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        let length = self.encoded_length();
        let mut buffer = Vec::with_capacity(length as usize);
        self.encode_into(&mut buffer)?;
        if buffer.len() as u64 != length {
            return Err(JP2Error::malformed(
                self.box_type,
                format!("wrote {} bytes, expected {}", buffer.len(), length),
            ));
        }
        writer.write_all(&buffer)?;
        Ok(())
    }

    fn encode_into(&self, buffer: &mut Vec<u8>) -> Result<(), JP2Error> {
        let content = self.content_length();
        let header_length = self.encoded_header_length(content);
        encode_box_header(
            buffer,
            self.box_type,
            content + header_length,
            header_length == 16,
        )?;
        if self.is_superbox() {
            for child in &self.children {
                child.encode_into(buffer)?;
            }
        } else {
            self.payload.encode(buffer)?;
        }
        Ok(())
    }

    /// First Contiguous Codestream box at this level or below.
    pub(crate) fn first_codestream(boxes: &[Jp2Box]) -> Option<&ContiguousCodestreamBox> {
        boxes.iter().find_map(|jbox| match &jbox.payload {
            BoxPayload::ContiguousCodestream(jp2c) => Some(jp2c),
            BoxPayload::Superbox(_) => Jp2Box::first_codestream(&jbox.children),
            _ => None,
        })
    }
}

fn decode_with<B: JBox + Default>(
    data: &[u8],
    diagnostics: &mut Diagnostics,
) -> Result<(B, u64), JP2Error> {
    let mut reader = io::Cursor::new(data);
    let mut jbox = B::default();
    jbox.decode(&mut reader, diagnostics)?;
    Ok((jbox, reader.position()))
}

fn decode_typed(
    box_type: BoxType,
    data: &[u8],
    diagnostics: &mut Diagnostics,
) -> Result<Option<(BoxPayload, u64)>, JP2Error> {
    macro_rules! typed {
        ($variant:ident) => {{
            let (jbox, consumed) = decode_with(data, diagnostics)?;
            Some((BoxPayload::$variant(jbox), consumed))
        }};
    }

    let decoded = match box_type {
        BOX_TYPE_SIGNATURE => typed!(Signature),
        BOX_TYPE_FILE_TYPE => typed!(FileType),
        BOX_TYPE_IMAGE_HEADER => typed!(ImageHeader),
        BOX_TYPE_BITS_PER_COMPONENT => typed!(BitsPerComponent),
        BOX_TYPE_COLOUR_SPECIFICATION => typed!(ColourSpecification),
        BOX_TYPE_PALETTE => typed!(Palette),
        BOX_TYPE_COMPONENT_MAPPING => typed!(ComponentMapping),
        BOX_TYPE_CHANNEL_DEFINITION => typed!(ChannelDefinition),
        BOX_TYPE_CAPTURE_RESOLUTION => typed!(CaptureResolution),
        BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION => typed!(DefaultDisplayResolution),
        BOX_TYPE_CONTIGUOUS_CODESTREAM => typed!(ContiguousCodestream),
        BOX_TYPE_INTELLECTUAL_PROPERTY => typed!(IntellectualProperty),
        BOX_TYPE_XML => typed!(Xml),
        BOX_TYPE_UUID => typed!(Uuid),
        BOX_TYPE_UUID_LIST => typed!(UUIDList),
        BOX_TYPE_DATA_ENTRY_URL => typed!(DataEntryURL),
        BOX_TYPE_LABEL => typed!(Label),
        BOX_TYPE_NUMBER_LIST => typed!(NumberList),
        BOX_TYPE_READER_REQUIREMENTS => typed!(ReaderRequirements),
        BOX_TYPE_FRAGMENT_LIST => typed!(FragmentList),
        BOX_TYPE_DATA_REFERENCE => typed!(DataReference),
        BOX_TYPE_FREE => typed!(Free),
        _ => None,
    };
    Ok(decoded)
}

/// Decodes a leaf payload, keeping it opaque when the type is not recognized
/// or the bytes do not decode.
fn decode_payload(
    box_type: BoxType,
    data: Vec<u8>,
    offset: u64,
    diagnostics: &mut Diagnostics,
) -> BoxPayload {
    let decoded = diagnostics.relative_to(offset, |diagnostics| {
        decode_typed(box_type, &data, diagnostics)
    });
    match decoded {
        Ok(Some((payload, consumed))) => {
            if consumed < data.len() as u64 {
                diagnostics.warn(
                    offset + consumed,
                    format!(
                        "{} trailing bytes in '{}' box",
                        data.len() as u64 - consumed,
                        box_type_str(&box_type)
                    ),
                );
            }
            payload
        }
        Ok(None) => {
            info!("Unrecognized box type '{}'", box_type_str(&box_type));
            BoxPayload::Unknown(UnknownBox::new(box_type, data))
        }
        Err(e) => {
            diagnostics.warn(
                offset,
                format!(
                    "could not decode '{}' box, kept opaque: {}",
                    box_type_str(&box_type),
                    e
                ),
            );
            BoxPayload::Unknown(UnknownBox::new(box_type, data))
        }
    }
}

fn decode_codestream<R: io::Read + io::Seek>(
    reader: &mut R,
    start: u64,
    length: u64,
    options: &DecodeOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Option<Codestream>, JP2Error> {
    reader.seek_to(start)?;
    match jpc::decode_jpc(reader, length, options.header_only, diagnostics) {
        Ok(codestream) => Ok(Some(codestream)),
        Err(e) => {
            diagnostics.warn(start, format!("codestream not parsed: {}", e));
            Ok(None)
        }
    }
}

/// Decodes the sequence of boxes occupying `[start, end)` of `reader`.
///
/// Superboxes are decoded recursively. Framing problems are recorded on
/// `diagnostics`: a box overrunning `end` is truncated to it, a box shorter
/// than its own header ends the sequence, as do trailing bytes too short for
/// a header.
pub fn decode_boxes<R: io::Read + io::Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
    options: &DecodeOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Jp2Box>, JP2Error> {
    let mut boxes = vec![];
    let mut offset = start;

    while offset < end {
        let available = end - offset;
        if available < 8 {
            diagnostics.warn(
                offset,
                format!("{} trailing bytes too short for a box header", available),
            );
            break;
        }

        // XLBox must fit before it is read.
        reader.seek_to(offset)?;
        if available < 16 {
            let box_length = reader.read_u32()?;
            let box_type: BoxType = reader.read_array()?;
            if box_length == 1 {
                diagnostics.warn(
                    offset,
                    format!(
                        "'{}' box extended length runs past byte offset {}",
                        box_type_str(&box_type),
                        end
                    ),
                );
                break;
            }
            reader.seek_to(offset)?;
        }

        let header = decode_box_header(reader)?;
        let box_type = header.box_type();
        let header_length = header.header_length() as u64;

        let mut length = if header.is_open_ended() {
            available
        } else {
            header.box_length()
        };
        if length < header_length {
            diagnostics.warn(
                offset,
                format!(
                    "'{}' box length {} is shorter than its header",
                    box_type_str(&box_type),
                    length
                ),
            );
            break;
        }
        if length > available {
            diagnostics.warn(
                offset,
                format!(
                    "'{}' box length {} runs past byte offset {}, truncated to {}",
                    box_type_str(&box_type),
                    length,
                    end,
                    available
                ),
            );
            length = available;
        }

        let payload_start = offset + header_length;
        let payload_end = offset + length;
        info!(
            "Box '{}' start at byte offset {}",
            box_type_str(&box_type),
            offset
        );

        let (payload, children) = if is_superbox(box_type) {
            let children = decode_boxes(reader, payload_start, payload_end, options, diagnostics)?;
            (BoxPayload::Superbox(box_type), children)
        } else {
            reader.seek_to(payload_start)?;
            let data = reader.read_bytes(payload_end - payload_start)?;
            let mut payload = decode_payload(box_type, data, payload_start, diagnostics);
            if let BoxPayload::ContiguousCodestream(jp2c) = &mut payload {
                let codestream = decode_codestream(
                    reader,
                    payload_start,
                    payload_end - payload_start,
                    options,
                    diagnostics,
                )?;
                jp2c.set_codestream(codestream);
            }
            (payload, vec![])
        };
        debug!(
            "Box '{}' has {} children",
            box_type_str(&box_type),
            children.len()
        );

        boxes.push(Jp2Box {
            box_type,
            offset,
            length,
            header_length: header.header_length(),
            payload,
            children,
        });

        info!(
            "Box '{}' end at byte offset {}",
            box_type_str(&box_type),
            payload_end
        );
        offset = payload_end;
    }

    Ok(boxes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut bytes = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(box_type);
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_trailing_bytes_warn() {
        let mut bytes = leaf(b"free", &[1, 2]);
        bytes.extend_from_slice(&[0, 0, 0]);
        let end = bytes.len() as u64;
        let mut diagnostics = Diagnostics::new();
        let boxes = decode_boxes(
            &mut io::Cursor::new(bytes),
            0,
            end,
            &DecodeOptions::default(),
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.warnings()[0].offset(), 10);
    }

    #[test]
    fn test_unknown_box_kept_without_warning() {
        let bytes = leaf(b"abcd", &[9, 9, 9]);
        let mut diagnostics = Diagnostics::new();
        let boxes = decode_boxes(
            &mut io::Cursor::new(bytes),
            0,
            11,
            &DecodeOptions::default(),
            &mut diagnostics,
        )
        .unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(boxes[0].long_name(), "Unknown");
        match boxes[0].payload() {
            BoxPayload::Unknown(unknown) => assert_eq!(unknown.data(), &[9, 9, 9]),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_extended_header_kept_on_encode() {
        let mut bytes = vec![0, 0, 0, 1];
        bytes.extend_from_slice(b"xml ");
        bytes.extend_from_slice(&19u64.to_be_bytes());
        bytes.extend_from_slice(b"<a/>");
        bytes.push(b'\n');
        let mut diagnostics = Diagnostics::new();
        let boxes = decode_boxes(
            &mut io::Cursor::new(bytes.clone()),
            0,
            21,
            &DecodeOptions::default(),
            &mut diagnostics,
        )
        .unwrap();
        assert_eq!(boxes[0].header_length(), 16);
        assert_eq!(boxes[0].length(), 19);
        // The box declares 19 bytes, so the last two bytes are trailing.
        assert_eq!(diagnostics.len(), 1);

        let mut buffer = Vec::new();
        boxes[0].encode(&mut buffer).unwrap();
        assert_eq!(buffer, bytes[..19].to_vec());
    }

    #[test]
    fn test_payload_warnings_use_file_offsets() {
        // An empty palette after a 10 byte box.
        let bytes = [leaf(b"free", &[1, 2]), leaf(b"pclr", &[0, 0, 1, 7])].concat();
        let mut diagnostics = Diagnostics::new();
        let boxes = decode_boxes(
            &mut io::Cursor::new(bytes),
            0,
            22,
            &DecodeOptions::default(),
            &mut diagnostics,
        )
        .unwrap();

        match boxes[1].payload() {
            BoxPayload::Palette(pclr) => assert_eq!(pclr.num_entries(), 0),
            other => panic!("unexpected payload {:?}", other),
        }
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.warnings()[0].offset(), 18);
        assert_eq!(
            diagnostics.warnings()[0].message(),
            "palette entry count 0 out of range"
        );
    }
}
