use crate::*;
use jpc::Diagnostics;
use std::collections::BTreeMap;

// Box types a reader of the 'jp2 ' brand is expected to understand.
const JP2_BOX_TYPES: [BoxType; 19] = [
    BOX_TYPE_COLOUR_SPECIFICATION,
    BOX_TYPE_CHANNEL_DEFINITION,
    BOX_TYPE_COMPONENT_MAPPING,
    BOX_TYPE_CONTIGUOUS_CODESTREAM,
    BOX_TYPE_FILE_TYPE,
    BOX_TYPE_IMAGE_HEADER,
    BOX_TYPE_HEADER,
    BOX_TYPE_SIGNATURE,
    BOX_TYPE_PALETTE,
    BOX_TYPE_RESOLUTION,
    BOX_TYPE_CAPTURE_RESOLUTION,
    BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION,
    BOX_TYPE_XML,
    BOX_TYPE_UUID_LIST,
    BOX_TYPE_UUID_INFO,
    BOX_TYPE_DATA_ENTRY_URL,
    BOX_TYPE_UUID,
    BOX_TYPE_BITS_PER_COMPONENT,
    BOX_TYPE_INTELLECTUAL_PROPERTY,
];

// Boxes describing a single codestream, legal only in a JP2 Header or a
// Codestream Header box.
const HEADER_CHILDREN: [BoxType; 5] = [
    BOX_TYPE_BITS_PER_COMPONENT,
    BOX_TYPE_CHANNEL_DEFINITION,
    BOX_TYPE_COMPONENT_MAPPING,
    BOX_TYPE_IMAGE_HEADER,
    BOX_TYPE_PALETTE,
];

// Boxes that need 'jpx ' or 'jpxb' in the compatibility list.
const JPX_BOX_TYPES: [BoxType; 2] = [BOX_TYPE_ASSOCIATION, BOX_TYPE_NUMBER_LIST];

const TOP_LEVEL: &str = "top-level";

/// Checks that `boxes` form a file a JP2 reader can interpret.
///
/// The checks are not exhaustive; they catch the sequences a writer is most
/// likely to get wrong.
pub fn validate_jp2_box_sequence(boxes: &[Jp2Box]) -> Result<(), JP2Error> {
    let file_type = validate_signature_compatibility(boxes)?;
    validate_header(boxes)?;
    validate_codestream(boxes)?;

    if file_type.brand() == BRAND_JPX {
        validate_jpx_box_sequence(boxes, file_type)
    } else {
        let counts = count_box_types(boxes);
        match counts.keys().find(|box_type| !JP2_BOX_TYPES.contains(box_type)) {
            Some(box_type) => Err(JP2Error::BrandRequired {
                box_type: *box_type,
                brand: BRAND_JPX,
            }),
            None => Ok(()),
        }
    }
}

/// Reports, without failing, what a decoded file does against its brand.
pub(crate) fn inspect_jp2_box_sequence(boxes: &[Jp2Box], diagnostics: &mut Diagnostics) {
    let file_type = match boxes.get(1).map(Jp2Box::payload) {
        Some(BoxPayload::FileType(file_type)) => file_type,
        _ => return,
    };
    if file_type.brand() != BRAND_JP2 {
        return;
    }

    // A jp2-branded file can only use enumerated colourspaces or restricted
    // ICC profiles.
    let header = boxes.iter().find(|jbox| jbox.box_type() == BOX_TYPE_HEADER);
    for jbox in header.map_or(&[][..], Jp2Box::children) {
        if let BoxPayload::ColourSpecification(colour) = jbox.payload() {
            match colour.method() {
                ColourSpecificationMethods::EnumeratedColourSpace
                | ColourSpecificationMethods::RestrictedICCProfile => {}
                method => diagnostics.warn(
                    jbox.offset(),
                    format!(
                        "colour specification method '{}' is not allowed with the 'jp2 ' brand",
                        method
                    ),
                ),
            }
        }
    }
}

fn validate_signature_compatibility(boxes: &[Jp2Box]) -> Result<&FileTypeBox, JP2Error> {
    // The first two boxes must be the signature box and the file type box.
    match boxes.first() {
        Some(jbox) if jbox.box_type() == BOX_TYPE_SIGNATURE => {}
        Some(jbox) => {
            return Err(JP2Error::BoxUnexpected {
                box_type: jbox.box_type(),
                offset: jbox.offset(),
            })
        }
        None => {
            return Err(JP2Error::BoxMissing {
                box_type: BOX_TYPE_SIGNATURE,
            })
        }
    }
    let file_type = match boxes.get(1) {
        Some(jbox) => match jbox.payload() {
            BoxPayload::FileType(file_type) => file_type,
            _ => {
                return Err(JP2Error::BoxUnexpected {
                    box_type: jbox.box_type(),
                    offset: jbox.offset(),
                })
            }
        },
        None => {
            return Err(JP2Error::BoxMissing {
                box_type: BOX_TYPE_FILE_TYPE,
            })
        }
    };

    // The compatibility list must contain at a minimum 'jp2 '.
    if !file_type.is_compatible_with(BRAND_JP2) {
        return Err(JP2Error::NotCompatible {
            compatibility_list: file_type.compatibility_list_str(),
        });
    }
    Ok(file_type)
}

fn validate_header(boxes: &[Jp2Box]) -> Result<(), JP2Error> {
    check_header_children(boxes, TOP_LEVEL)?;

    let header = boxes
        .iter()
        .find(|jbox| jbox.box_type() == BOX_TYPE_HEADER)
        .ok_or(JP2Error::BoxMissing {
            box_type: BOX_TYPE_HEADER,
        })?;

    // The JP2 Header box shall start with an Image Header box.
    match header.children().first() {
        Some(jbox) if jbox.box_type() == BOX_TYPE_IMAGE_HEADER => {}
        Some(jbox) => {
            return Err(JP2Error::BoxUnexpected {
                box_type: jbox.box_type(),
                offset: jbox.offset(),
            })
        }
        None => {
            return Err(JP2Error::malformed(
                BOX_TYPE_HEADER,
                "the JP2 Header box cannot be empty",
            ))
        }
    }

    let colour = header
        .children()
        .iter()
        .find_map(|jbox| match jbox.payload() {
            BoxPayload::ColourSpecification(colour) => Some(colour),
            _ => None,
        })
        .ok_or(JP2Error::BoxMissing {
            box_type: BOX_TYPE_COLOUR_SPECIFICATION,
        })?;

    validate_channel_definition(header, colour)
}

fn validate_channel_definition(
    header: &Jp2Box,
    colour: &ColourSpecificationBox,
) -> Result<(), JP2Error> {
    let mut definitions = header
        .children()
        .iter()
        .filter(|jbox| jbox.box_type() == BOX_TYPE_CHANNEL_DEFINITION);
    let definition = match (definitions.next(), definitions.next()) {
        (None, _) => return Ok(()),
        (Some(_), Some(duplicate)) => {
            return Err(JP2Error::BoxDuplicate {
                box_type: BOX_TYPE_CHANNEL_DEFINITION,
                offset: duplicate.offset(),
            })
        }
        (Some(jbox), None) => match jbox.payload() {
            BoxPayload::ChannelDefinition(definition) => definition,
            _ => return Ok(()),
        },
    };

    let channels = definition.channels();
    let complete = match colour.enumerated_colour_space() {
        // Each of the three colours is associated with a colour channel.
        Some(EnumeratedColourSpaces::sRGB) => (0..3u16).all(|channel| {
            channels
                .iter()
                .any(|c| c.channel_association() == channel + 1)
                && channels.get(channel as usize).map(Channel::channel_type)
                    == Some(ChannelTypes::ColourImageData)
        }),
        Some(EnumeratedColourSpaces::Greyscale) => channels
            .iter()
            .any(|c| c.channel_type() == ChannelTypes::ColourImageData),
        _ => true,
    };
    if !complete {
        return Err(JP2Error::malformed(
            BOX_TYPE_CHANNEL_DEFINITION,
            "all colour channels must be defined in the Channel Definition box",
        ));
    }
    Ok(())
}

fn check_header_children(boxes: &[Jp2Box], parent: &str) -> Result<(), JP2Error> {
    let allowed = parent == box_type_str(&BOX_TYPE_HEADER)
        || parent == box_type_str(&BOX_TYPE_CODESTREAM_HEADER);
    for jbox in boxes {
        if !allowed && HEADER_CHILDREN.contains(&jbox.box_type()) {
            return Err(JP2Error::BoxMisplaced {
                box_type: jbox.box_type(),
                parent: parent.to_owned(),
            });
        }
        check_header_children(jbox.children(), &jbox.box_type_str())?;
    }
    Ok(())
}

fn validate_codestream(boxes: &[Jp2Box]) -> Result<(), JP2Error> {
    let position = |box_type: BoxType| boxes.iter().position(|jbox| jbox.box_type() == box_type);

    let codestream = position(BOX_TYPE_CONTIGUOUS_CODESTREAM).ok_or(JP2Error::BoxMissing {
        box_type: BOX_TYPE_CONTIGUOUS_CODESTREAM,
    })?;

    // The codestream must be preceded by a JP2 Header box.
    match position(BOX_TYPE_HEADER) {
        Some(header) if header < codestream => Ok(()),
        _ => Err(JP2Error::BoxUnexpected {
            box_type: BOX_TYPE_CONTIGUOUS_CODESTREAM,
            offset: boxes[codestream].offset(),
        }),
    }
}

fn validate_jpx_box_sequence(boxes: &[Jp2Box], file_type: &FileTypeBox) -> Result<(), JP2Error> {
    validate_label(boxes, TOP_LEVEL)?;
    validate_jpx_compatibility(boxes, file_type)?;
    validate_data_reference(boxes)
}

fn validate_label(boxes: &[Jp2Box], parent: &str) -> Result<(), JP2Error> {
    for jbox in boxes {
        if jbox.box_type() == BOX_TYPE_LABEL && parent != box_type_str(&BOX_TYPE_ASSOCIATION) {
            return Err(JP2Error::BoxMisplaced {
                box_type: BOX_TYPE_LABEL,
                parent: parent.to_owned(),
            });
        }
        validate_label(jbox.children(), &jbox.box_type_str())?;
    }
    Ok(())
}

fn validate_jpx_compatibility(boxes: &[Jp2Box], file_type: &FileTypeBox) -> Result<(), JP2Error> {
    let compatible = file_type.is_compatible_with(BRAND_JPX) || file_type.is_compatible_with(BRAND_JPXB);
    for jbox in boxes {
        if !compatible && JPX_BOX_TYPES.contains(&jbox.box_type()) {
            return Err(JP2Error::BrandRequired {
                box_type: jbox.box_type(),
                brand: BRAND_JPX,
            });
        }
        validate_jpx_compatibility(jbox.children(), file_type)?;
    }
    Ok(())
}

fn validate_data_reference(boxes: &[Jp2Box]) -> Result<(), JP2Error> {
    // The Data Reference box only appears at the top level.
    for jbox in boxes {
        if let Some(nested) = find_nested(jbox.children(), BOX_TYPE_DATA_REFERENCE) {
            return Err(JP2Error::BoxMisplaced {
                box_type: nested.box_type(),
                parent: jbox.box_type_str(),
            });
        }
    }

    let mut references = boxes
        .iter()
        .filter(|jbox| jbox.box_type() == BOX_TYPE_DATA_REFERENCE);
    if let (Some(_), Some(duplicate)) = (references.next(), references.next()) {
        return Err(JP2Error::BoxDuplicate {
            box_type: BOX_TYPE_DATA_REFERENCE,
            offset: duplicate.offset(),
        });
    }

    let counts = count_box_types(boxes);
    if counts.contains_key(&BOX_TYPE_DATA_REFERENCE)
        && !counts.contains_key(&BOX_TYPE_FRAGMENT_TABLE)
    {
        return Err(JP2Error::BoxMissing {
            box_type: BOX_TYPE_FRAGMENT_TABLE,
        });
    }
    Ok(())
}

fn find_nested(boxes: &[Jp2Box], box_type: BoxType) -> Option<&Jp2Box> {
    boxes.iter().find_map(|jbox| {
        if jbox.box_type() == box_type {
            Some(jbox)
        } else {
            find_nested(jbox.children(), box_type)
        }
    })
}

fn count_box_types(boxes: &[Jp2Box]) -> BTreeMap<BoxType, usize> {
    let mut counts = BTreeMap::new();
    let mut stack: Vec<&Jp2Box> = boxes.iter().collect();
    while let Some(jbox) = stack.pop() {
        *counts.entry(jbox.box_type()).or_insert(0) += 1;
        stack.extend(jbox.children());
    }
    counts
}
