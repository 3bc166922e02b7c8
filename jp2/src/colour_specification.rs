use crate::*;
use icc::{decode_icc, ICCProfile};
use jpc::{ByteReader, Diagnostics};
use log::debug;
use std::fmt;
use std::io;

const METHOD_ENUMERATED_COLOUR_SPACE: u8 = 1;
const METHOD_RESTRICTED_ICC_PROFILE: u8 = 2;
const METHOD_ANY_ICC_PROFILE: u8 = 3;
const METHOD_VENDOR_COLOUR: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourSpecificationMethods {
    EnumeratedColourSpace,
    RestrictedICCProfile,
    AnyICCProfile,
    VendorColourMethod,
    Reserved { value: u8 },
}

impl ColourSpecificationMethods {
    pub fn new(value: u8) -> ColourSpecificationMethods {
        match value {
            METHOD_ENUMERATED_COLOUR_SPACE => ColourSpecificationMethods::EnumeratedColourSpace,
            METHOD_RESTRICTED_ICC_PROFILE => ColourSpecificationMethods::RestrictedICCProfile,
            METHOD_ANY_ICC_PROFILE => ColourSpecificationMethods::AnyICCProfile,
            METHOD_VENDOR_COLOUR => ColourSpecificationMethods::VendorColourMethod,
            value => ColourSpecificationMethods::Reserved { value },
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            ColourSpecificationMethods::EnumeratedColourSpace => METHOD_ENUMERATED_COLOUR_SPACE,
            ColourSpecificationMethods::RestrictedICCProfile => METHOD_RESTRICTED_ICC_PROFILE,
            ColourSpecificationMethods::AnyICCProfile => METHOD_ANY_ICC_PROFILE,
            ColourSpecificationMethods::VendorColourMethod => METHOD_VENDOR_COLOUR,
            ColourSpecificationMethods::Reserved { value } => *value,
        }
    }

    /// True for the methods that carry an ICC profile.
    pub fn is_icc(&self) -> bool {
        matches!(
            self,
            ColourSpecificationMethods::RestrictedICCProfile
                | ColourSpecificationMethods::AnyICCProfile
        )
    }
}

impl fmt::Display for ColourSpecificationMethods {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ColourSpecificationMethods::EnumeratedColourSpace => {
                f.write_str("enumerated colorspace")
            }
            ColourSpecificationMethods::RestrictedICCProfile => {
                f.write_str("restricted ICC profile")
            }
            ColourSpecificationMethods::AnyICCProfile => f.write_str("any ICC profile"),
            ColourSpecificationMethods::VendorColourMethod => f.write_str("vendor color method"),
            ColourSpecificationMethods::Reserved { value } => {
                write!(f, "{} (unrecognized)", value)
            }
        }
    }
}

const ENUMERATED_COLOUR_SPACE_CMYK: u32 = 12;
const ENUMERATED_COLOUR_SPACE_SRGB: u32 = 16;
const ENUMERATED_COLOUR_SPACE_GREYSCALE: u32 = 17;
const ENUMERATED_COLOUR_SPACE_SYCC: u32 = 18;
const ENUMERATED_COLOUR_SPACE_E_SRGB: u32 = 20;
const ENUMERATED_COLOUR_SPACE_ROMM_RGB: u32 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumeratedColourSpaces {
    CMYK,
    #[allow(non_camel_case_types)]
    sRGB,
    Greyscale,
    #[allow(non_camel_case_types)]
    sYCC,
    #[allow(non_camel_case_types)]
    esRGB,
    ROMMRGB,
    Reserved { value: u32 },
}

impl EnumeratedColourSpaces {
    pub fn new(value: u32) -> EnumeratedColourSpaces {
        match value {
            ENUMERATED_COLOUR_SPACE_CMYK => EnumeratedColourSpaces::CMYK,
            ENUMERATED_COLOUR_SPACE_SRGB => EnumeratedColourSpaces::sRGB,
            ENUMERATED_COLOUR_SPACE_GREYSCALE => EnumeratedColourSpaces::Greyscale,
            ENUMERATED_COLOUR_SPACE_SYCC => EnumeratedColourSpaces::sYCC,
            ENUMERATED_COLOUR_SPACE_E_SRGB => EnumeratedColourSpaces::esRGB,
            ENUMERATED_COLOUR_SPACE_ROMM_RGB => EnumeratedColourSpaces::ROMMRGB,
            value => EnumeratedColourSpaces::Reserved { value },
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            EnumeratedColourSpaces::CMYK => ENUMERATED_COLOUR_SPACE_CMYK,
            EnumeratedColourSpaces::sRGB => ENUMERATED_COLOUR_SPACE_SRGB,
            EnumeratedColourSpaces::Greyscale => ENUMERATED_COLOUR_SPACE_GREYSCALE,
            EnumeratedColourSpaces::sYCC => ENUMERATED_COLOUR_SPACE_SYCC,
            EnumeratedColourSpaces::esRGB => ENUMERATED_COLOUR_SPACE_E_SRGB,
            EnumeratedColourSpaces::ROMMRGB => ENUMERATED_COLOUR_SPACE_ROMM_RGB,
            EnumeratedColourSpaces::Reserved { value } => *value,
        }
    }
}

impl fmt::Display for EnumeratedColourSpaces {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EnumeratedColourSpaces::CMYK => f.write_str("CMYK"),
            EnumeratedColourSpaces::sRGB => f.write_str("sRGB"),
            EnumeratedColourSpaces::Greyscale => f.write_str("greyscale"),
            EnumeratedColourSpaces::sYCC => f.write_str("YCC"),
            EnumeratedColourSpaces::esRGB => f.write_str("e-sRGB"),
            EnumeratedColourSpaces::ROMMRGB => f.write_str("ROMM-RGB"),
            EnumeratedColourSpaces::Reserved { value } => write!(f, "{} (unrecognized)", value),
        }
    }
}

// I.5.3.3
//
// Colour Specification box
//
// Each Colour Specification box defines one method by which an application can
// interpret the colourspace of the decompressed image data. This colour
// specification is to be applied to the image data after it has been
// decompressed and after any reverse decorrelating component transform has been
// applied to the image data.
//
// A JP2 file may contain multiple Colour Specification boxes, but must contain
// at least one. A conforming JP2 reader shall ignore all Colour Specification
// boxes after the first.
#[derive(Debug, Clone, PartialEq)]
pub struct ColourSpecificationBox {
    method: u8,
    precedence: u8,
    colourspace_approximation: u8,
    enumerated_colour_space: Option<u32>,

    // Everything following APPROX for the ICC, vendor and reserved methods.
    body: Vec<u8>,

    icc_profile: Option<ICCProfile>,
}

impl Default for ColourSpecificationBox {
    fn default() -> Self {
        ColourSpecificationBox {
            method: METHOD_ENUMERATED_COLOUR_SPACE,
            precedence: 0,
            colourspace_approximation: 0,
            enumerated_colour_space: None,
            body: Vec::new(),
            icc_profile: None,
        }
    }
}

impl ColourSpecificationBox {
    pub fn new_enumerated(colour_space: EnumeratedColourSpaces) -> Self {
        ColourSpecificationBox {
            enumerated_colour_space: Some(colour_space.value()),
            ..Default::default()
        }
    }

    /// Colour specification carrying an ICC profile, restricted (method 2)
    /// or any (method 3).
    pub fn new_icc(profile: Vec<u8>, restricted: bool) -> Self {
        let method = if restricted {
            METHOD_RESTRICTED_ICC_PROFILE
        } else {
            METHOD_ANY_ICC_PROFILE
        };
        ColourSpecificationBox {
            method,
            icc_profile: Some(decode_icc(&profile, &mut Vec::new())),
            body: profile,
            ..Default::default()
        }
    }

    // Specification method.
    //
    // This field specifies the method used by this Colour Specification box to
    // define the colourspace of the decompressed image.
    pub fn method(&self) -> ColourSpecificationMethods {
        ColourSpecificationMethods::new(self.method)
    }

    // Precedence.
    //
    // This field is reserved for ISO use and the value shall be set to zero;
    // however, conforming readers shall ignore the value of this field.
    pub fn precedence(&self) -> i8 {
        self.precedence as i8
    }

    // Colourspace approximation.
    //
    // This field specifies the extent to which this colour specification method
    // approximates the "correct" definition of the colourspace.
    pub fn colourspace_approximation(&self) -> u8 {
        self.colourspace_approximation
    }

    // If the value of the METH field is not 1, then the EnumCS field shall not
    // exist.
    pub fn enumerated_colour_space(&self) -> Option<EnumeratedColourSpaces> {
        self.enumerated_colour_space.map(EnumeratedColourSpaces::new)
    }

    /// Raw ICC profile bytes for methods 2 and 3.
    pub fn icc_profile_bytes(&self) -> Option<&[u8]> {
        if self.method().is_icc() {
            Some(&self.body)
        } else {
            None
        }
    }

    /// Decoded ICC profile header for methods 2 and 3.
    pub fn icc_profile(&self) -> Option<&ICCProfile> {
        self.icc_profile.as_ref()
    }

    /// Payload after APPROX for the vendor and reserved methods.
    pub fn vendor_data(&self) -> Option<&[u8]> {
        match self.method() {
            ColourSpecificationMethods::VendorColourMethod
            | ColourSpecificationMethods::Reserved { .. } => Some(&self.body),
            _ => None,
        }
    }
}

impl JBox for ColourSpecificationBox {
    // The type of a Colour Specification box shall be 'colr' (0x636F 6C72).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_COLOUR_SPECIFICATION
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        self.method = reader.read_u8()?;
        self.precedence = reader.read_u8()?;
        self.colourspace_approximation = reader.read_u8()?;

        if self.precedence() != 0 {
            diagnostics.warn(1, format!("precedence {} unexpected", self.precedence()));
        }
        debug!("Method {:?}", self.method());

        match self.method() {
            // 1 - Enumerated Colourspace.
            //
            // The EnumCS field shall exist in this box immediately following
            // the APPROX field, and shall be the last field in this box.
            ColourSpecificationMethods::EnumeratedColourSpace => {
                let remaining = reader.remaining_bytes()?;
                if remaining < 4 {
                    return Err(JP2Error::malformed(
                        BOX_TYPE_COLOUR_SPECIFICATION,
                        format!("enumerated colourspace needs 4 bytes, found {}", remaining),
                    ));
                }
                let value = reader.read_u32()?;
                self.enumerated_colour_space = Some(value);
                debug!("Enumerated Colour Space {}", EnumeratedColourSpaces::new(value));
            }

            // 2 - Restricted ICC profile, 3 - Any ICC profile.
            //
            // The PROFILE field shall immediately follow the APPROX field and
            // shall be the last field in the box.
            ColourSpecificationMethods::RestrictedICCProfile
            | ColourSpecificationMethods::AnyICCProfile => {
                let remaining = reader.remaining_bytes()?;
                self.body = reader.read_bytes(remaining)?;
                let mut warnings = Vec::new();
                self.icc_profile = Some(decode_icc(&self.body, &mut warnings));
                for warning in warnings {
                    diagnostics.warn(3 + warning.offset() as u64, warning.message());
                }
                debug!("ICC profile of {} bytes", self.body.len());
            }

            // Vendor colour methods and values reserved for other ISO use keep
            // whatever follows the APPROX field.
            ColourSpecificationMethods::VendorColourMethod
            | ColourSpecificationMethods::Reserved { .. } => {
                let remaining = reader.remaining_bytes()?;
                self.body = reader.read_bytes(remaining)?;
            }
        }

        Ok(())
    }

    fn payload_length(&self) -> u64 {
        match self.enumerated_colour_space {
            Some(_) if self.method == METHOD_ENUMERATED_COLOUR_SPACE => 7,
            _ => 3 + self.body.len() as u64,
        }
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&[self.method, self.precedence, self.colourspace_approximation])?;
        match self.enumerated_colour_space {
            Some(value) if self.method == METHOD_ENUMERATED_COLOUR_SPACE => {
                writer.write_all(&value.to_be_bytes())?
            }
            _ => writer.write_all(&self.body)?,
        }
        Ok(())
    }
}
