//! W3C extended log header handling.
//!
//! The [W3C extended log format](https://www.w3.org/TR/WD-logfile.html) opens
//! with `#`-prefixed directive lines, one of which (`#Fields:`) declares the
//! ordered column names for every subsequent data row. The parser here walks
//! the header once, captures that schema, and remembers every header line so
//! it can be replayed into the output with the two synthetic geolocation
//! columns appended to the `#Fields:` line.

use crate::error::{Error, Result};

/// Directive keyword that declares the column schema.
const FIELDS_DIRECTIVE: &str = "#Fields:";

/// Synthetic column names appended to the echoed `#Fields:` line.
pub const GEO_FIELDS: &str = "GeoCity GeoCountry";

/// The ordered column names declared by a file's `#Fields:` directive.
///
/// Immutable after parse; only consulted for name-to-position resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<String>,
}

impl FieldSchema {
    /// Resolve a field name to its zero-based column position.
    ///
    /// Names are matched case-insensitively; the first match wins. A miss
    /// returns [`Error::FieldNotFound`], which callers treat as "skip this
    /// file", not as a fatal condition.
    pub fn resolve(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::FieldNotFound {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// State of the header scan.
enum ScanState {
    /// Still consuming `#` comment lines.
    ScanningHeader,
    /// A `#Fields:` directive has been seen.
    SchemaFound(FieldSchema),
}

/// Accumulates the leading comment lines of one log file.
///
/// Feed lines in order with [`HeaderParser::feed`] until it reports that the
/// header is over, then call [`HeaderParser::finish`] to obtain the schema and
/// the echoable header lines. The line that ended the header is the first
/// data row and still needs processing by the caller.
pub struct HeaderParser {
    state: ScanState,
    /// Header lines to replay into the output, `#Fields:` already extended.
    echoed: Vec<String>,
}

impl HeaderParser {
    pub fn new() -> Self {
        HeaderParser {
            state: ScanState::ScanningHeader,
            echoed: Vec::new(),
        }
    }

    /// Consume one line. Returns `true` if the line belonged to the header,
    /// `false` on the first non-comment line (which the caller must treat as
    /// the first data row).
    pub fn feed(&mut self, line: &str) -> bool {
        if !line.starts_with('#') {
            return false;
        }
        if let Some(rem) = line.strip_prefix(FIELDS_DIRECTIVE) {
            let fields: Vec<String> = rem.split_ascii_whitespace().map(String::from).collect();
            self.echoed.push(format!("{} {}", line.trim_end(), GEO_FIELDS));
            self.state = ScanState::SchemaFound(FieldSchema { fields });
        } else {
            self.echoed.push(line.trim_end().to_string());
        }
        true
    }

    /// Finish the scan, yielding the schema and the header lines to echo.
    ///
    /// Reaching the data rows without a `#Fields:` directive (or with an
    /// empty one) yields [`Error::MissingFieldsDirective`], which abandons
    /// the current file only.
    pub fn finish(self) -> Result<(FieldSchema, Vec<String>)> {
        match self.state {
            ScanState::SchemaFound(schema) if !schema.is_empty() => Ok((schema, self.echoed)),
            _ => Err(Error::MissingFieldsDirective),
        }
    }
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new()
    }
}
