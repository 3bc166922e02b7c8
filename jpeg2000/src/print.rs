use std::fmt;
use std::io;
use std::str;

use icc::ICCProfile;
use jp2::{
    BitsPerComponentBox, BoxPayload, ChannelDefinitionBox, ColourSpecificationBox,
    ComponentMapType, ComponentMappingBox, Document, FileTypeBox, GridResolution,
    ImageHeaderBox, Jp2Box, ReaderRequirementsBox, UUIDBox,
};
use jpc::{
    CodingBlockStyle, CodingStyleParameters, Codestream, CommentMarkerSegment,
    ImageAndTileSizeMarkerSegment, MarkerSegment, MultipleComponentTransformation,
    QuantizationStyle, QuantizationValue, RegionOfInterestStyle, Warning,
};

/// How much of a codestream to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodestreamLevel {
    None,
    MainHeader,
    Full,
}

impl CodestreamLevel {
    pub fn new(level: u8) -> Option<CodestreamLevel> {
        match level {
            0 => Some(CodestreamLevel::None),
            1 => Some(CodestreamLevel::MainHeader),
            2 => Some(CodestreamLevel::Full),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOptions {
    /// Only the box header lines.
    pub short: bool,

    /// Contents of XML boxes and XMP UUID boxes.
    pub xml: bool,

    pub codestream: CodestreamLevel,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            short: false,
            xml: true,
            codestream: CodestreamLevel::MainHeader,
        }
    }
}

fn line<W: io::Write>(writer: &mut W, depth: usize, text: fmt::Arguments) -> io::Result<()> {
    writeln!(writer, "{:indent$}{}", "", text, indent = 4 * depth)
}

fn python_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn joined<T: fmt::Display>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prints every box of `document`, or the codestream of a raw codestream
/// file.
pub fn document<W: io::Write>(
    writer: &mut W,
    document: &Document,
    options: &PrintOptions,
) -> io::Result<()> {
    match document {
        Document::Codestream { codestream, .. } => {
            if options.codestream != CodestreamLevel::None {
                print_codestream(writer, codestream, 0, options)?;
            }
        }
        Document::Boxes(boxes) => {
            for jbox in boxes {
                print_box(writer, jbox, 0, options)?;
            }
        }
    }
    Ok(())
}

/// Prints the warnings collected while decoding.
pub fn warnings<W: io::Write>(writer: &mut W, warnings: &[Warning]) -> io::Result<()> {
    for warning in warnings {
        writeln!(writer, "warning: {}", warning)?;
    }
    Ok(())
}

pub fn print_box<W: io::Write>(
    writer: &mut W,
    jbox: &Jp2Box,
    depth: usize,
    options: &PrintOptions,
) -> io::Result<()> {
    line(
        writer,
        depth,
        format_args!(
            "{} Box ({}) @ ({}, {})",
            jbox.long_name(),
            jbox.box_type_str(),
            jbox.offset(),
            jbox.length()
        ),
    )?;

    if !options.short {
        let depth = depth + 1;
        match jbox.payload() {
            BoxPayload::Signature(signature) => {
                let hex: String = signature
                    .signature()
                    .iter()
                    .map(|byte| format!("{:02x}", byte))
                    .collect();
                line(writer, depth, format_args!("Signature:  {}", hex))?;
            }
            BoxPayload::FileType(file_type) => print_file_type(writer, file_type, depth)?,
            BoxPayload::ImageHeader(ihdr) => print_image_header(writer, ihdr, depth)?,
            BoxPayload::BitsPerComponent(bpcc) => print_bits_per_component(writer, bpcc, depth)?,
            BoxPayload::ColourSpecification(colr) => {
                print_colour_specification(writer, colr, depth)?
            }
            BoxPayload::Palette(pclr) => {
                line(
                    writer,
                    depth,
                    format_args!(
                        "Size:  ({} x {})",
                        pclr.num_entries(),
                        pclr.num_components()
                    ),
                )?;
            }
            BoxPayload::ComponentMapping(cmap) => print_component_mapping(writer, cmap, depth)?,
            BoxPayload::ChannelDefinition(cdef) => print_channel_definition(writer, cdef, depth)?,
            BoxPayload::CaptureResolution(resc) => {
                print_resolution(writer, resc.resolution(), "VCR", "HCR", depth)?
            }
            BoxPayload::DefaultDisplayResolution(resd) => {
                print_resolution(writer, resd.resolution(), "VDR", "HDR", depth)?
            }
            BoxPayload::ContiguousCodestream(jp2c) => match jp2c.codestream() {
                Some(codestream) if options.codestream != CodestreamLevel::None => {
                    print_codestream(writer, codestream, depth, options)?
                }
                Some(_) => {}
                None => line(writer, depth, format_args!("Codestream:  not parsed"))?,
            },
            BoxPayload::IntellectualProperty(jp2i) => {
                line(writer, depth, format_args!("Data:  {} bytes", jp2i.data().len()))?;
            }
            BoxPayload::Xml(xml) => {
                if options.xml {
                    print_text(writer, xml.data(), depth)?;
                }
            }
            BoxPayload::Uuid(uuid) => print_uuid(writer, uuid, depth, options)?,
            BoxPayload::UUIDList(ulst) => {
                for (index, id) in ulst.ids_str().iter().enumerate() {
                    line(writer, depth, format_args!("UUID[{}]:  {}", index, id))?;
                }
            }
            BoxPayload::DataEntryURL(url) => {
                let flags = url.flags();
                line(writer, depth, format_args!("Version:  {}", url.version()))?;
                line(
                    writer,
                    depth,
                    format_args!("Flag:  {} {} {}", flags[0], flags[1], flags[2]),
                )?;
                line(writer, depth, format_args!("URL:  \"{}\"", url.location()))?;
            }
            BoxPayload::Label(lbl) => {
                line(writer, depth, format_args!("Label:  {}", lbl.label()))?;
            }
            BoxPayload::NumberList(nlst) => {
                for (index, association) in nlst.associations().iter().enumerate() {
                    line(
                        writer,
                        depth,
                        format_args!(
                            "Association[{}]:  {}",
                            index,
                            jp2::Association::new(*association)
                        ),
                    )?;
                }
            }
            BoxPayload::ReaderRequirements(rreq) => {
                print_reader_requirements(writer, rreq, depth)?
            }
            BoxPayload::FragmentList(flst) => {
                for (index, fragment) in flst.fragments().iter().enumerate() {
                    line(
                        writer,
                        depth,
                        format_args!(
                            "Fragment[{}]:  offset {}, length {}, data reference {}",
                            index,
                            fragment.offset(),
                            fragment.length(),
                            fragment.data_reference()
                        ),
                    )?;
                }
            }
            BoxPayload::DataReference(dtbl) => {
                for (index, url) in dtbl.references().iter().enumerate() {
                    line(
                        writer,
                        depth,
                        format_args!("URL[{}]:  \"{}\"", index, url.location()),
                    )?;
                }
            }
            BoxPayload::Free(_) | BoxPayload::Superbox(_) => {}
            BoxPayload::Unknown(unknown) => {
                line(writer, depth, format_args!("Data:  {} bytes", unknown.data().len()))?;
            }
        }
    }

    for child in jbox.children() {
        print_box(writer, child, depth + 1, options)?;
    }
    Ok(())
}

fn print_file_type<W: io::Write>(
    writer: &mut W,
    file_type: &FileTypeBox,
    depth: usize,
) -> io::Result<()> {
    line(writer, depth, format_args!("Brand:  {}", file_type.brand_str()))?;
    line(
        writer,
        depth,
        format_args!("Compatibility:  [{}]", {
            joined(
                file_type
                    .compatibility_list_str()
                    .iter()
                    .map(|entry| format!("'{}'", entry)),
            )
        }),
    )
}

fn print_image_header<W: io::Write>(
    writer: &mut W,
    ihdr: &ImageHeaderBox,
    depth: usize,
) -> io::Result<()> {
    line(
        writer,
        depth,
        format_args!(
            "Size:  [{} {} {}]",
            ihdr.height(),
            ihdr.width(),
            ihdr.components_num()
        ),
    )?;
    match ihdr.bit_depth() {
        Some(bit_depth) => {
            line(writer, depth, format_args!("Bitdepth:  {}", bit_depth.bit_depth()))?;
            line(
                writer,
                depth,
                format_args!("Signed:  {}", python_bool(bit_depth.is_signed())),
            )?;
        }
        None => line(writer, depth, format_args!("Bitdepth:  variable"))?,
    }
    if ihdr.compression_type() == 7 {
        line(writer, depth, format_args!("Compression:  wavelet"))?;
    } else {
        line(
            writer,
            depth,
            format_args!("Compression:  {} (invalid)", ihdr.compression_type()),
        )?;
    }
    line(
        writer,
        depth,
        format_args!(
            "Colorspace Unknown:  {}",
            python_bool(ihdr.colourspace_unknown() != 0)
        ),
    )
}

fn print_bits_per_component<W: io::Write>(
    writer: &mut W,
    bpcc: &BitsPerComponentBox,
    depth: usize,
) -> io::Result<()> {
    let depths = bpcc.bits_per_component();
    line(
        writer,
        depth,
        format_args!(
            "Bits per component:  ({})",
            joined(depths.iter().map(|bit_depth| bit_depth.bit_depth()))
        ),
    )?;
    line(
        writer,
        depth,
        format_args!(
            "Signed:  ({})",
            joined(depths.iter().map(|bit_depth| python_bool(bit_depth.is_signed())))
        ),
    )
}

fn approximation(value: u8) -> String {
    match value {
        1 => "accurately represents correct colorspace definition".to_owned(),
        2 => "approximates correct colorspace definition, exceptional quality".to_owned(),
        3 => "approximates correct colorspace definition, reasonable quality".to_owned(),
        4 => "approximates correct colorspace definition, poor quality".to_owned(),
        _ => format!("{} (invalid)", value),
    }
}

fn print_colour_specification<W: io::Write>(
    writer: &mut W,
    colr: &ColourSpecificationBox,
    depth: usize,
) -> io::Result<()> {
    line(writer, depth, format_args!("Method:  {}", colr.method()))?;
    line(writer, depth, format_args!("Precedence:  {}", colr.precedence()))?;
    if colr.colourspace_approximation() != 0 {
        line(
            writer,
            depth,
            format_args!(
                "Approximation:  {}",
                approximation(colr.colourspace_approximation())
            ),
        )?;
    }

    if let Some(colour_space) = colr.enumerated_colour_space() {
        line(writer, depth, format_args!("Colorspace:  {}", colour_space))?;
    } else if let Some(profile) = colr.icc_profile() {
        let size = colr.icc_profile_bytes().map_or(0, <[u8]>::len);
        line(writer, depth, format_args!("ICC Profile:  {} bytes", size))?;
        print_icc_profile(writer, profile, depth + 1)?;
    } else if let Some(data) = colr.vendor_data() {
        line(writer, depth, format_args!("Vendor data:  {} bytes", data.len()))?;
    }
    Ok(())
}

fn print_icc_profile<W: io::Write>(
    writer: &mut W,
    profile: &ICCProfile,
    depth: usize,
) -> io::Result<()> {
    if let Some(size) = profile.size() {
        line(writer, depth, format_args!("Size:  {}", size))?;
    }
    if let Some(cmm) = profile.preferred_cmm() {
        line(writer, depth, format_args!("Preferred CMM:  {}", cmm))?;
    }
    if let Some(version) = profile.version() {
        line(writer, depth, format_args!("Version:  {}", version))?;
    }
    if let Some(device_class) = profile.device_class() {
        line(writer, depth, format_args!("Device Class:  {}", device_class))?;
    }
    if let Some(colour_space) = profile.colour_space() {
        line(writer, depth, format_args!("Color Space:  {}", colour_space))?;
    }
    if let Some(connection_space) = profile.connection_space() {
        line(
            writer,
            depth,
            format_args!("Connection Space:  {}", connection_space),
        )?;
    }
    if let Some(date_time) = profile.date_time() {
        line(writer, depth, format_args!("Datetime:  {}", date_time))?;
    }
    if let Some(file_signature) = profile.file_signature() {
        line(writer, depth, format_args!("File Signature:  {}", file_signature))?;
    }
    if let Some(platform) = profile.platform() {
        line(writer, depth, format_args!("Platform:  {}", platform))?;
    }
    if let Some(flags) = profile.flags() {
        line(writer, depth, format_args!("Flags:  {}", flags))?;
    }
    if let Some(manufacturer) = profile.manufacturer() {
        line(
            writer,
            depth,
            format_args!("Device Manufacturer:  {}", manufacturer),
        )?;
    }
    if let Some(model) = profile.model() {
        line(writer, depth, format_args!("Device Model:  {}", model))?;
    }
    if let Some(attributes) = profile.attributes() {
        line(writer, depth, format_args!("Device Attributes:  {}", attributes))?;
    }
    if let Some(intent) = profile.rendering_intent() {
        line(writer, depth, format_args!("Rendering Intent:  {}", intent))?;
    }
    if let Some([x, y, z]) = profile.illuminant() {
        line(
            writer,
            depth,
            format_args!("Illuminant:  [{:.6}, {:.6}, {:.6}]", x, y, z),
        )?;
    }
    if let Some(creator) = profile.creator() {
        line(writer, depth, format_args!("Creator:  {}", creator))?;
    }
    Ok(())
}

fn print_component_mapping<W: io::Write>(
    writer: &mut W,
    cmap: &ComponentMappingBox,
    depth: usize,
) -> io::Result<()> {
    for map in cmap.component_map() {
        match map.mapping_type() {
            ComponentMapType::Palette => line(
                writer,
                depth,
                format_args!(
                    "Component {} ==> palette column {}",
                    map.component(),
                    map.palette()
                ),
            )?,
            ComponentMapType::Direct => line(
                writer,
                depth,
                format_args!("Component {} ==> {}", map.component(), map.component()),
            )?,
            ComponentMapType::Reserved { value } => line(
                writer,
                depth,
                format_args!(
                    "Component {} ==> mapping type {} (invalid)",
                    map.component(),
                    value
                ),
            )?,
        }
    }
    Ok(())
}

fn print_channel_definition<W: io::Write>(
    writer: &mut W,
    cdef: &ChannelDefinitionBox,
    depth: usize,
) -> io::Result<()> {
    for channel in cdef.channels() {
        let association = match channel.channel_association() {
            0 => "whole image".to_owned(),
            association => association.to_string(),
        };
        line(
            writer,
            depth,
            format_args!(
                "Channel {} ({}) ==> ({})",
                channel.channel_index(),
                channel.channel_type(),
                association
            ),
        )?;
    }
    Ok(())
}

fn print_resolution<W: io::Write>(
    writer: &mut W,
    resolution: &GridResolution,
    vertical: &str,
    horizontal: &str,
    depth: usize,
) -> io::Result<()> {
    line(
        writer,
        depth,
        format_args!("{}:  {}", vertical, resolution.vertical_resolution()),
    )?;
    line(
        writer,
        depth,
        format_args!("{}:  {}", horizontal, resolution.horizontal_resolution()),
    )
}

// Non-empty lines of a text payload, or its size when it is not UTF-8.
fn print_text<W: io::Write>(writer: &mut W, data: &[u8], depth: usize) -> io::Result<()> {
    match str::from_utf8(data) {
        Ok(text) => {
            for text_line in text.lines().filter(|l| !l.trim().is_empty()) {
                line(writer, depth, format_args!("{}", text_line.trim_end()))?;
            }
            Ok(())
        }
        Err(_) => line(
            writer,
            depth,
            format_args!("{} bytes of invalid UTF-8", data.len()),
        ),
    }
}

fn print_uuid<W: io::Write>(
    writer: &mut W,
    uuid: &UUIDBox,
    depth: usize,
    options: &PrintOptions,
) -> io::Result<()> {
    if uuid.is_xmp() {
        line(writer, depth, format_args!("UUID:  {} (XMP)", uuid.uuid_str()))?;
        if options.xml {
            line(writer, depth, format_args!("UUID Data:"))?;
            return print_text(writer, uuid.data(), depth + 1);
        }
    } else {
        line(writer, depth, format_args!("UUID:  {}", uuid.uuid_str()))?;
    }
    line(
        writer,
        depth,
        format_args!("UUID Data:  {} bytes", uuid.data().len()),
    )
}

fn print_reader_requirements<W: io::Write>(
    writer: &mut W,
    rreq: &ReaderRequirementsBox,
    depth: usize,
) -> io::Result<()> {
    line(
        writer,
        depth,
        format_args!(
            "Fully Understands Aspect Mask:  0x{:x}",
            rreq.fully_understand_aspects_mask()
        ),
    )?;
    line(
        writer,
        depth,
        format_args!(
            "Display Completely Mask:  0x{:x}",
            rreq.decode_completely_mask()
        ),
    )?;

    line(writer, depth, format_args!("Standard Features and Masks:"))?;
    for feature in rreq.standard_features() {
        line(
            writer,
            depth + 1,
            format_args!(
                "Feature {:03}:  0x{:x} {}",
                feature.flag(),
                feature.mask(),
                feature.description()
            ),
        )?;
    }

    line(writer, depth, format_args!("Vendor Features:"))?;
    for feature in rreq.vendor_features() {
        line(
            writer,
            depth + 1,
            format_args!("UUID {}:  0x{:x}", feature.uuid_str(), feature.mask()),
        )?;
    }
    Ok(())
}

fn print_codestream<W: io::Write>(
    writer: &mut W,
    codestream: &Codestream,
    depth: usize,
    options: &PrintOptions,
) -> io::Result<()> {
    // The whole marker sequence only exists when the codestream was parsed
    // past its main header.
    let segments = match options.codestream {
        CodestreamLevel::Full if !codestream.header_only() => {
            line(writer, depth, format_args!("Codestream:"))?;
            codestream.segments()
        }
        _ => {
            line(writer, depth, format_args!("Main header:"))?;
            codestream.main_header()
        }
    };
    for segment in segments {
        print_segment(writer, segment, depth + 1)?;
    }
    Ok(())
}

pub fn print_segment<W: io::Write>(
    writer: &mut W,
    segment: &MarkerSegment,
    depth: usize,
) -> io::Result<()> {
    line(
        writer,
        depth,
        format_args!(
            "{} marker segment @ ({}, {})",
            segment.marker_id(),
            segment.offset(),
            segment.length()
        ),
    )?;

    let depth = depth + 1;
    match segment {
        MarkerSegment::ImageAndTileSize(siz) => print_image_and_tile_size(writer, siz, depth)?,
        MarkerSegment::CodingStyle(cod) => {
            line(writer, depth, format_args!("Coding style:"))?;
            line(
                writer,
                depth + 1,
                format_args!(
                    "Entropy coder, {} partitions",
                    if cod.has_defined_precinct_size() {
                        "with"
                    } else {
                        "without"
                    }
                ),
            )?;
            line(
                writer,
                depth + 1,
                format_args!("SOP marker segments:  {}", python_bool(cod.uses_sop())),
            )?;
            line(
                writer,
                depth + 1,
                format_args!("EPH marker segments:  {}", python_bool(cod.uses_eph())),
            )?;
            line(writer, depth, format_args!("Coding style parameters:"))?;
            line(
                writer,
                depth + 1,
                format_args!("Progression order:  {}", cod.progression_order()),
            )?;
            line(
                writer,
                depth + 1,
                format_args!("Number of layers:  {}", cod.no_layers()),
            )?;
            let transformation = match cod.multiple_component_transformation() {
                MultipleComponentTransformation::None => "not used".to_owned(),
                MultipleComponentTransformation::Multiple => "used".to_owned(),
                MultipleComponentTransformation::Reserved { value } => {
                    format!("{} (invalid)", value)
                }
            };
            line(
                writer,
                depth + 1,
                format_args!(
                    "Multiple component transformation usage:  {}",
                    transformation
                ),
            )?;
            print_coding_style_parameters(writer, cod.coding_style_parameters(), depth + 1)?;
        }
        MarkerSegment::CodingStyleComponent(coc) => {
            line(
                writer,
                depth,
                format_args!("Associated component:  {}", coc.component_index()),
            )?;
            line(
                writer,
                depth,
                format_args!(
                    "Coding style for code block:  Entropy coder, {} partitions",
                    if coc.has_defined_precinct_size() {
                        "with"
                    } else {
                        "without"
                    }
                ),
            )?;
            print_coding_style_parameters(writer, coc.coding_style_parameters(), depth)?;
        }
        MarkerSegment::QuantizationDefault(qcd) => {
            print_quantization(writer, qcd.quantization_style(), qcd.values(), depth)?
        }
        MarkerSegment::QuantizationComponent(qcc) => {
            line(
                writer,
                depth,
                format_args!("Associated Component:  {}", qcc.component_index()),
            )?;
            print_quantization(writer, qcc.quantization_style(), qcc.values(), depth)?;
        }
        MarkerSegment::RegionOfInterest(rgn) => {
            line(
                writer,
                depth,
                format_args!("Associated component:  {}", rgn.component_index()),
            )?;
            match rgn.region_of_interest_style() {
                RegionOfInterestStyle::ImplicitRegionOfInterest => {
                    line(writer, depth, format_args!("ROI style:  implicit"))?
                }
                RegionOfInterestStyle::Reserved { value } => {
                    line(writer, depth, format_args!("ROI style:  {} (invalid)", value))?
                }
            }
            line(writer, depth, format_args!("Parameter:  {}", rgn.shift()))?;
        }
        MarkerSegment::ProgressionOrderChange(pod) => {
            for (index, progression) in pod.progressions().iter().enumerate() {
                line(writer, depth, format_args!("Progression change {}:", index))?;
                line(
                    writer,
                    depth + 1,
                    format_args!(
                        "Resolution index start:  {}",
                        progression.resolution_level_index_start()
                    ),
                )?;
                line(
                    writer,
                    depth + 1,
                    format_args!(
                        "Component index start:  {}",
                        progression.component_index_start()
                    ),
                )?;
                line(
                    writer,
                    depth + 1,
                    format_args!("Layer index end:  {}", progression.layer_index_end()),
                )?;
                line(
                    writer,
                    depth + 1,
                    format_args!(
                        "Resolution index end:  {}",
                        progression.resolution_level_index_end()
                    ),
                )?;
                line(
                    writer,
                    depth + 1,
                    format_args!(
                        "Component index end:  {}",
                        progression.component_index_end()
                    ),
                )?;
                line(
                    writer,
                    depth + 1,
                    format_args!("Progression order:  {}", progression.progression_order()),
                )?;
            }
        }
        MarkerSegment::TilePartLengths(tlm) => {
            let lengths = tlm.tile_part_lengths();
            line(writer, depth, format_args!("Index:  {}", tlm.index()))?;
            line(
                writer,
                depth,
                format_args!(
                    "Tile index:  ({})",
                    joined(lengths.iter().map(|length| match length.tile_index() {
                        Some(index) => index.to_string(),
                        None => "implicit".to_owned(),
                    }))
                ),
            )?;
            line(
                writer,
                depth,
                format_args!(
                    "Length:  ({})",
                    joined(lengths.iter().map(|length| length.tile_length()))
                ),
            )?;
        }
        MarkerSegment::PacketLength(plm) => {
            line(writer, depth, format_args!("Index:  {}", plm.index()))?;
            for (index, lengths) in plm.packet_lengths().iter().enumerate() {
                line(
                    writer,
                    depth,
                    format_args!("Tile-part {} packet lengths:  ({})", index, joined(lengths)),
                )?;
            }
        }
        MarkerSegment::TilePacketLength(plt) => {
            line(writer, depth, format_args!("Index:  {}", plt.index()))?;
            line(
                writer,
                depth,
                format_args!("Packet lengths:  ({})", joined(plt.packet_lengths())),
            )?;
        }
        MarkerSegment::PackedPacketHeader(ppm) => {
            line(writer, depth, format_args!("Index:  {}", ppm.index()))?;
            line(writer, depth, format_args!("Data:  {} bytes", ppm.data().len()))?;
        }
        MarkerSegment::TilePackedPacketHeader(ppt) => {
            line(writer, depth, format_args!("Index:  {}", ppt.index()))?;
            line(writer, depth, format_args!("Data:  {} bytes", ppt.data().len()))?;
        }
        MarkerSegment::ComponentRegistration(crg) => {
            let offsets = crg
                .horizontal_offsets()
                .into_iter()
                .zip(crg.vertical_offsets())
                .map(|(x, y)| format!("({}, {})", y, x));
            line(
                writer,
                depth,
                format_args!("Vertical, Horizontal offset:  ({})", joined(offsets)),
            )?;
        }
        MarkerSegment::Comment(cme) => print_comment(writer, cme, depth)?,
        MarkerSegment::StartOfTile(sot) => {
            line(writer, depth, format_args!("Tile part index:  {}", sot.tile_index()))?;
            line(writer, depth, format_args!("Tile part length:  {}", sot.tile_length()))?;
            line(
                writer,
                depth,
                format_args!("Tile part instance:  {}", sot.tile_part_index()),
            )?;
            line(
                writer,
                depth,
                format_args!("Number of tile parts:  {}", sot.no_tile_parts()),
            )?;
        }
        MarkerSegment::StartOfPacket(sop) => {
            line(writer, depth, format_args!("Nsop:  {}", sop.sequence_number()))?;
        }
        MarkerSegment::StartOfCodestream { .. }
        | MarkerSegment::EndOfPacketHeader { .. }
        | MarkerSegment::StartOfData { .. }
        | MarkerSegment::EndOfCodestream { .. }
        | MarkerSegment::Unknown(_) => {}
    }
    Ok(())
}

fn print_image_and_tile_size<W: io::Write>(
    writer: &mut W,
    siz: &ImageAndTileSizeMarkerSegment,
    depth: usize,
) -> io::Result<()> {
    line(writer, depth, format_args!("Profile:  {}", siz.decoder_capability()))?;
    line(
        writer,
        depth,
        format_args!(
            "Reference Grid Height, Width:  ({} x {})",
            siz.reference_grid_height(),
            siz.reference_grid_width()
        ),
    )?;
    line(
        writer,
        depth,
        format_args!(
            "Vertical, Horizontal Reference Grid Offset:  ({} x {})",
            siz.image_vertical_offset(),
            siz.image_horizontal_offset()
        ),
    )?;
    line(
        writer,
        depth,
        format_args!(
            "Reference Tile Height, Width:  ({} x {})",
            siz.reference_tile_height(),
            siz.reference_tile_width()
        ),
    )?;
    line(
        writer,
        depth,
        format_args!(
            "Vertical, Horizontal Reference Tile Offset:  ({} x {})",
            siz.tile_vertical_offset(),
            siz.tile_horizontal_offset()
        ),
    )?;
    line(
        writer,
        depth,
        format_args!("Bitdepth:  ({})", joined(siz.bit_depths())),
    )?;
    line(
        writer,
        depth,
        format_args!(
            "Signed:  ({})",
            joined(siz.signed().into_iter().map(python_bool))
        ),
    )?;
    let subsampling = siz
        .components()
        .iter()
        .map(|c| format!("({}, {})", c.vertical_separation(), c.horizontal_separation()));
    line(
        writer,
        depth,
        format_args!("Vertical, Horizontal Subsampling:  ({})", joined(subsampling)),
    )
}

fn print_coding_style_parameters<W: io::Write>(
    writer: &mut W,
    parameters: &CodingStyleParameters,
    depth: usize,
) -> io::Result<()> {
    line(
        writer,
        depth,
        format_args!(
            "Number of decomposition levels:  {}",
            parameters.no_decomposition_levels()
        ),
    )?;
    line(
        writer,
        depth,
        format_args!(
            "Code block height, width:  ({} x {})",
            parameters.code_block_height(),
            parameters.code_block_width()
        ),
    )?;
    line(
        writer,
        depth,
        format_args!("Wavelet transform:  {}", parameters.transformation()),
    )?;

    let precincts = parameters
        .precinct_sizes()
        .iter()
        .map(|size| format!("({}, {})", size.height(), size.width()))
        .collect::<Vec<_>>();
    if precincts.is_empty() {
        line(writer, depth, format_args!("Precinct size:  ((32768, 32768))"))?;
    } else {
        line(
            writer,
            depth,
            format_args!("Precinct size:  ({})", precincts.join(", ")),
        )?;
    }

    let styles = parameters.coding_block_styles();
    line(writer, depth, format_args!("Code block context:"))?;
    for (style, name) in [
        (
            CodingBlockStyle::SelectiveArithmeticCodingBypass,
            "Selective arithmetic coding bypass",
        ),
        (
            CodingBlockStyle::ResetContextProbabilities,
            "Reset context probabilities on coding pass boundaries",
        ),
        (
            CodingBlockStyle::TerminationOnEachCodingPass,
            "Termination on each coding pass",
        ),
        (
            CodingBlockStyle::VerticallyCausalContext,
            "Vertically stripe causal context",
        ),
        (
            CodingBlockStyle::PredictableTermination,
            "Predictable termination",
        ),
        (
            CodingBlockStyle::SegmentationSymbolsAreUsed,
            "Segmentation symbols",
        ),
    ]
    .iter()
    {
        line(
            writer,
            depth + 1,
            format_args!("{}:  {}", name, python_bool(styles.contains(style))),
        )?;
    }
    Ok(())
}

fn print_quantization<W: io::Write>(
    writer: &mut W,
    style: QuantizationStyle,
    values: &[QuantizationValue],
    depth: usize,
) -> io::Result<()> {
    match style.guard_bits() {
        Some(guard_bits) => line(
            writer,
            depth,
            format_args!("Quantization style:  {}, {} guard bits", style, guard_bits),
        )?,
        None => line(writer, depth, format_args!("Quantization style:  {}", style))?,
    }
    let steps = values
        .iter()
        .map(|value| format!("({}, {})", value.mantissa().unwrap_or(0), value.exponent()));
    line(writer, depth, format_args!("Step size:  [{}]", joined(steps)))
}

fn print_comment<W: io::Write>(
    writer: &mut W,
    cme: &CommentMarkerSegment,
    depth: usize,
) -> io::Result<()> {
    match cme.text() {
        Some(text) => line(writer, depth, format_args!("\"{}\"", text)),
        None => line(
            writer,
            depth,
            format_args!(
                "binary data (rcme = {}): {} bytes",
                cme.registration_value().value(),
                cme.comment().len()
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jp2::{
        ColourSpecificationBox, EnumeratedColourSpaces, StandardFeature, VendorFeature,
        UUID_XMP,
    };
    use jpc::Diagnostics;
    use std::io::Cursor;

    fn printed(jbox: &Jp2Box, options: &PrintOptions) -> String {
        let mut out = Vec::new();
        print_box(&mut out, jbox, 0, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn codestream() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0x4F, 0xFF, 0x51, 0x00, 0x29, 0x00, 0x00];
        for value in [64u32, 48, 0, 0, 64, 48, 0, 0].iter() {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        bytes.extend_from_slice(&[0x00, 0x01, 0x07, 0x01, 0x01]);
        bytes.extend_from_slice(&[
            0xFF, 0x52, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x01, 0x00, 0x05, 0x04, 0x04, 0x00, 0x01,
        ]);
        bytes.extend_from_slice(&[0xFF, 0x5C, 0x00, 0x07, 0x40, 0x40, 0x48, 0x48, 0x50]);
        bytes.extend_from_slice(&[0xFF, 0x90, 0x00, 0x0A, 0, 0, 0, 0, 0, 18, 0, 1]);
        bytes.extend_from_slice(&[0xFF, 0x93, 0x12, 0x34, 0x56, 0x78, 0xFF, 0xD9]);
        bytes
    }

    #[test]
    fn test_colour_specification() {
        let colr = Jp2Box::new(BoxPayload::ColourSpecification(
            ColourSpecificationBox::new_enumerated(EnumeratedColourSpaces::sRGB),
        ));
        assert_eq!(
            printed(&colr, &PrintOptions::default()),
            "Colour Specification Box (colr) @ (0, 0)\n    \
             Method:  enumerated colorspace\n    \
             Precedence:  0\n    \
             Colorspace:  sRGB\n"
        );

        let short = PrintOptions {
            short: true,
            ..PrintOptions::default()
        };
        assert_eq!(
            printed(&colr, &short),
            "Colour Specification Box (colr) @ (0, 0)\n"
        );
    }

    #[test]
    fn test_reader_requirements() {
        let rreq = jp2::ReaderRequirementsBox::new(
            2,
            0xFFFF,
            0xF8F0,
            vec![StandardFeature::new(1, 0x8000), StandardFeature::new(5, 0x4080)],
            vec![VendorFeature::new(UUID_XMP, 0x0040)],
        )
        .unwrap();
        let output = printed(
            &Jp2Box::new(BoxPayload::ReaderRequirements(rreq)),
            &PrintOptions::default(),
        );
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Reader Requirements Box (rreq) @ (0, 0)");
        assert_eq!(lines[1], "    Fully Understands Aspect Mask:  0xffff");
        assert_eq!(lines[2], "    Display Completely Mask:  0xf8f0");
        assert_eq!(lines[3], "    Standard Features and Masks:");
        assert!(lines[4].starts_with("        Feature 001:  0x8000 "));
        assert!(lines[5].starts_with("        Feature 005:  0x4080 "));
        assert_eq!(lines[6], "    Vendor Features:");
        assert_eq!(
            lines[7],
            "        UUID be7acfcb-97a9-42e8-9c71-999491e3afac:  0x40"
        );
    }

    #[test]
    fn test_xmp_uuid() {
        let xmp = Jp2Box::new(BoxPayload::Uuid(UUIDBox::new(
            UUID_XMP,
            b"<x:xmpmeta>\n  <rdf:RDF/>\n</x:xmpmeta>\n".to_vec(),
        )));
        assert_eq!(
            printed(&xmp, &PrintOptions::default()),
            "UUID Box (uuid) @ (0, 0)\n    \
             UUID:  be7acfcb-97a9-42e8-9c71-999491e3afac (XMP)\n    \
             UUID Data:\n        \
             <x:xmpmeta>\n        \
             \x20\x20<rdf:RDF/>\n        \
             </x:xmpmeta>\n"
        );

        let no_xml = PrintOptions {
            xml: false,
            ..PrintOptions::default()
        };
        assert!(printed(&xmp, &no_xml).ends_with("UUID Data:  38 bytes\n"));
    }

    #[test]
    fn test_codestream_levels() {
        let mut diagnostics = Diagnostics::new();
        let document = Document::decode(
            &mut Cursor::new(codestream()),
            &jp2::DecodeOptions {
                header_only: false,
            },
            &mut diagnostics,
        )
        .unwrap();
        assert!(diagnostics.is_empty());

        let print = |level| {
            let mut out = Vec::new();
            let options = PrintOptions {
                codestream: level,
                ..PrintOptions::default()
            };
            super::document(&mut out, &document, &options).unwrap();
            String::from_utf8(out).unwrap()
        };

        assert_eq!(print(CodestreamLevel::None), "");

        let main_header = print(CodestreamLevel::MainHeader);
        assert!(main_header.starts_with("Main header:\n    SOC marker segment @ (0, 0)\n"));
        assert!(main_header.contains("    SIZ marker segment @ (2, 41)\n"));
        assert!(main_header.contains("        Reference Grid Height, Width:  (48 x 64)\n"));
        assert!(main_header.contains("            Progression order:  LRCP\n"));
        assert!(main_header.contains("            Wavelet transform:  5-3 reversible\n"));
        assert!(main_header.contains(
            "        Quantization style:  no quantization, 2 guard bits\n"
        ));
        assert!(main_header.contains("        Step size:  [(0, 8), (0, 9), (0, 9), (0, 10)]\n"));
        assert!(!main_header.contains("SOT"));

        let full = print(CodestreamLevel::Full);
        assert!(full.starts_with("Codestream:\n"));
        assert!(full.contains("    SOT marker segment @ (68, 10)\n"));
        assert!(full.ends_with("    EOC marker segment @ (86, 0)\n"));
    }

    #[test]
    fn test_codestream_level() {
        assert_eq!(CodestreamLevel::new(0), Some(CodestreamLevel::None));
        assert_eq!(CodestreamLevel::new(2), Some(CodestreamLevel::Full));
        assert_eq!(CodestreamLevel::new(3), None);
    }
}
