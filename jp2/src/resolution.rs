use crate::*;
use jpc::{ByteReader, Diagnostics};
use std::io;

/// Vertical and horizontal grid resolution as stored by the Capture and
/// Default Display Resolution boxes.
///
/// Each resolution is `numerator / denominator * 10^exponent` reference grid
/// points per metre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridResolution {
    vertical_numerator: u16,
    vertical_denominator: u16,
    horizontal_numerator: u16,
    horizontal_denominator: u16,
    vertical_exponent: i8,
    horizontal_exponent: i8,
}

impl GridResolution {
    pub fn new(vertical: (u16, u16, i8), horizontal: (u16, u16, i8)) -> Self {
        GridResolution {
            vertical_numerator: vertical.0,
            vertical_denominator: vertical.1,
            vertical_exponent: vertical.2,
            horizontal_numerator: horizontal.0,
            horizontal_denominator: horizontal.1,
            horizontal_exponent: horizontal.2,
        }
    }

    pub fn vertical_numerator(&self) -> u16 {
        self.vertical_numerator
    }

    pub fn vertical_denominator(&self) -> u16 {
        self.vertical_denominator
    }

    pub fn vertical_exponent(&self) -> i8 {
        self.vertical_exponent
    }

    pub fn horizontal_numerator(&self) -> u16 {
        self.horizontal_numerator
    }

    pub fn horizontal_denominator(&self) -> u16 {
        self.horizontal_denominator
    }

    pub fn horizontal_exponent(&self) -> i8 {
        self.horizontal_exponent
    }

    // VR = (VRN / VRD) * 10^VRE
    pub fn vertical_resolution(&self) -> f64 {
        resolution(
            self.vertical_numerator,
            self.vertical_denominator,
            self.vertical_exponent,
        )
    }

    // HR = (HRN / HRD) * 10^HRE
    pub fn horizontal_resolution(&self) -> f64 {
        resolution(
            self.horizontal_numerator,
            self.horizontal_denominator,
            self.horizontal_exponent,
        )
    }

    fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        box_type: BoxType,
        diagnostics: &mut Diagnostics,
    ) -> Result<GridResolution, JP2Error> {
        let resolution = GridResolution {
            vertical_numerator: reader.read_u16()?,
            vertical_denominator: reader.read_u16()?,
            horizontal_numerator: reader.read_u16()?,
            horizontal_denominator: reader.read_u16()?,
            vertical_exponent: reader.read_u8()? as i8,
            horizontal_exponent: reader.read_u8()? as i8,
        };
        if resolution.vertical_denominator == 0 || resolution.horizontal_denominator == 0 {
            diagnostics.warn(
                0,
                format!("'{}' box has a zero denominator", box_type_str(&box_type)),
            );
        }
        Ok(resolution)
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&self.vertical_numerator.to_be_bytes())?;
        writer.write_all(&self.vertical_denominator.to_be_bytes())?;
        writer.write_all(&self.horizontal_numerator.to_be_bytes())?;
        writer.write_all(&self.horizontal_denominator.to_be_bytes())?;
        writer.write_all(&[self.vertical_exponent as u8, self.horizontal_exponent as u8])?;
        Ok(())
    }
}

fn resolution(numerator: u16, denominator: u16, exponent: i8) -> f64 {
    numerator as f64 / denominator as f64 * 10_f64.powi(exponent as i32)
}

// I.5.3.7.1
//
// This box specifies the grid resolution at which the source was digitized to
// create the image samples specified by the codestream.
//
// For example, this may specify the resolution of the flatbed scanner that
// captured a page from a book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureResolutionBox {
    resolution: GridResolution,
}

impl CaptureResolutionBox {
    pub fn new(resolution: GridResolution) -> Self {
        CaptureResolutionBox { resolution }
    }

    pub fn resolution(&self) -> &GridResolution {
        &self.resolution
    }
}

impl JBox for CaptureResolutionBox {
    // The type of a Capture Resolution box shall be 'resc' (0x7265 7363).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_CAPTURE_RESOLUTION
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        self.resolution =
            GridResolution::decode(reader, BOX_TYPE_CAPTURE_RESOLUTION, diagnostics)?;
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        10
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        self.resolution.encode(writer)
    }
}

// I.5.3.7.2
//
// This box specifies a desired display grid resolution, for example when the
// image is placed in a page-layout program.
//
// However, this value is only a default. Each application must determine an
// appropriate display size for that application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultDisplayResolutionBox {
    resolution: GridResolution,
}

impl DefaultDisplayResolutionBox {
    pub fn new(resolution: GridResolution) -> Self {
        DefaultDisplayResolutionBox { resolution }
    }

    pub fn resolution(&self) -> &GridResolution {
        &self.resolution
    }
}

impl JBox for DefaultDisplayResolutionBox {
    // The type of a Default Display Resolution box shall be 'resd'
    // (0x7265 7364).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        self.resolution =
            GridResolution::decode(reader, BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION, diagnostics)?;
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        10
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        self.resolution.encode(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_resolution() {
        let mut reader = io::Cursor::new(vec![0, 3, 0, 1, 0, 5, 0, 2, 2, 0xFF]);
        let mut resc = CaptureResolutionBox::default();
        let mut diagnostics = Diagnostics::new();
        resc.decode(&mut reader, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());

        let resolution = resc.resolution();
        assert_eq!(resolution.vertical_exponent(), 2);
        assert_eq!(resolution.horizontal_exponent(), -1);
        assert!((resolution.vertical_resolution() - 300.0).abs() < 1e-9);
        assert!((resolution.horizontal_resolution() - 0.25).abs() < 1e-9);

        let mut buffer = Vec::new();
        resc.encode(&mut buffer).unwrap();
        assert_eq!(buffer, vec![0, 3, 0, 1, 0, 5, 0, 2, 2, 0xFF]);
    }

    #[test]
    fn test_zero_denominator() {
        let mut reader = io::Cursor::new(vec![0, 3, 0, 0, 0, 5, 0, 2, 0, 0]);
        let mut resd = DefaultDisplayResolutionBox::default();
        let mut diagnostics = Diagnostics::new();
        resd.decode(&mut reader, &mut diagnostics).unwrap();

        assert!(resd.resolution().vertical_resolution().is_infinite());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.warnings()[0].message(),
            "'resd' box has a zero denominator"
        );
    }
}
