use log::warn;
use std::fmt;

/// A recoverable anomaly found while decoding, located by absolute byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    offset: u64,
    message: String,
}

impl Warning {
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at byte offset {}", self.message, self.offset)
    }
}

/// Collects warnings for a single parse.
///
/// A collector is passed down explicitly through every decode call, so two
/// parses never share warning state. Each recorded warning is also emitted
/// through the `log` facade.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,

    // Added to every offset given to `warn`.
    base: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn<S: Into<String>>(&mut self, offset: u64, message: S) {
        let warning = Warning {
            offset: self.base + offset,
            message: message.into(),
        };
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Runs `f` with the offsets it records taken relative to `base`.
    ///
    /// Decoders working on a payload copied out of the file record offsets
    /// within that payload, and the collector keeps them absolute.
    pub fn relative_to<T, F>(&mut self, base: u64, f: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        let previous = self.base;
        self.base += base;
        let result = f(self);
        self.base = previous;
        result
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_offsets() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(4, "first");
        diagnostics.relative_to(100, |diagnostics| {
            diagnostics.warn(3, "second");
            diagnostics.relative_to(10, |diagnostics| diagnostics.warn(0, "third"));
        });
        diagnostics.warn(5, "fourth");

        let offsets: Vec<u64> = diagnostics.warnings().iter().map(Warning::offset).collect();
        assert_eq!(offsets, vec![4, 103, 110, 5]);
        assert_eq!(diagnostics.warnings()[1].to_string(), "second at byte offset 103");
    }
}
