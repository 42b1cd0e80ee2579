//! Per-file enrichment pipeline.
//!
//! One call to [`enrich_file`] drives a whole input file: header scan, field
//! resolution, then one pass over the data rows, classifying the IP token of
//! each, looking up routable addresses, and appending the geolocation columns
//! to every surviving line. Lines whose address falls in a private,
//! multicast, or link-local range are dropped from the output entirely and
//! never touch the resolver or the registry.

use camino::Utf8Path;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use crate::classify::classify;
use crate::error::{Error, Result};
use crate::geo::{GeoResolver, GeoResult};
use crate::header::HeaderParser;
use crate::registry::UniqueIpRegistry;

/// Output values when the database has no city- or country-level data for a
/// located address.
const NO_CITY: &str = "NoCity";
const NO_COUNTRY: &str = "NoCountry";

/// Output values when the address has no match in the database at all.
const NOT_FOUND: &str = "NA";

/// Outcome of processing one input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was enriched; counts of written and dropped data lines.
    Enriched { written: usize, dropped: usize },
    /// The file was abandoned before any output was produced.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No `#Fields:` directive before the data rows began.
    NoSchema,
    /// The target field is not declared in the schema.
    FieldNotFound,
}

/// Enrich one log file into `out_dir`, reusing the caller's registry.
///
/// The output file shares the input's base name. It is only created once the
/// schema is established and the target field resolved, so skipped files
/// leave nothing behind in `out_dir`.
pub fn enrich_file(
    input: &Utf8Path,
    out_dir: &Utf8Path,
    field: &str,
    resolver: &dyn GeoResolver,
    registry: &mut UniqueIpRegistry,
) -> Result<FileOutcome> {
    let reader = BufReader::new(File::open(input)?);
    let mut lines = reader.lines();

    // Header phase: buffer directives until the first data row shows up.
    let mut parser = HeaderParser::new();
    let mut first_data_line = None;
    for line in lines.by_ref() {
        let line = line?;
        if !parser.feed(&line) {
            first_data_line = Some(line);
            break;
        }
    }

    let (schema, header_lines) = match parser.finish() {
        Ok(parsed) => parsed,
        Err(Error::MissingFieldsDirective) => {
            log::warn!("{input}: no #Fields directive before data rows, skipping");
            return Ok(FileOutcome::Skipped(SkipReason::NoSchema));
        }
        Err(err) => return Err(err),
    };
    let index = match schema.resolve(field) {
        Ok(index) => index,
        Err(Error::FieldNotFound { .. }) => {
            log::warn!("{input}: field {field:?} not declared in #Fields, skipping");
            return Ok(FileOutcome::Skipped(SkipReason::FieldNotFound));
        }
        Err(err) => return Err(err),
    };

    let file_name = input.file_name().unwrap_or("enriched.log");
    let mut out = BufWriter::new(File::create(out_dir.join(file_name))?);
    for header in &header_lines {
        writeln!(out, "{header}")?;
    }

    let mut written = 0;
    let mut dropped = 0;
    let mut process = |line: String| -> Result<()> {
        match enrich_line(&line, index, resolver, registry) {
            Some(enriched) => {
                writeln!(out, "{enriched}")?;
                written += 1;
            }
            None => dropped += 1,
        }
        Ok(())
    };

    if let Some(line) = first_data_line {
        process(line)?;
    }
    for line in lines {
        process(line?)?;
    }
    out.flush()?;

    Ok(FileOutcome::Enriched { written, dropped })
}

/// Enrich one data line, or `None` when its address class excludes it from
/// the output.
fn enrich_line(
    line: &str,
    index: usize,
    resolver: &dyn GeoResolver,
    registry: &mut UniqueIpRegistry,
) -> Option<String> {
    // A row shorter than the schema degrades to an empty token, which flows
    // down the routable/lookup path and comes back as a lookup error.
    let token = line
        .split_ascii_whitespace()
        .nth(index)
        .unwrap_or("")
        .trim_matches('"');

    if classify(token).is_excluded() {
        return None;
    }

    let (city, country) = match resolver.lookup(token) {
        GeoResult::Found { city, country } => {
            let country = country.unwrap_or_else(|| NO_COUNTRY.to_string());
            registry.record_if_absent(token, city.clone(), country.clone());
            (
                city.as_deref().unwrap_or(NO_CITY).replace(' ', "_"),
                country.replace(' ', "_"),
            )
        }
        GeoResult::NotFound => (NOT_FOUND.to_string(), NOT_FOUND.to_string()),
        GeoResult::Error(message) => (
            format!("City error: {message}"),
            "Country error: (See city error)".to_string(),
        ),
    };

    Some(format!("{line} {city} {country}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    struct FakeResolver {
        known: FxHashMap<String, (Option<String>, Option<String>)>,
    }

    impl FakeResolver {
        fn new(entries: &[(&str, Option<&str>, Option<&str>)]) -> Self {
            let known = entries
                .iter()
                .map(|(ip, city, country)| {
                    (
                        ip.to_string(),
                        (
                            city.map(String::from),
                            country.map(String::from),
                        ),
                    )
                })
                .collect();
            FakeResolver { known }
        }
    }

    impl GeoResolver for FakeResolver {
        fn lookup(&self, ip: &str) -> GeoResult {
            if ip.parse::<std::net::IpAddr>().is_err() {
                return GeoResult::Error(format!("invalid IP address syntax: {ip}"));
            }
            match self.known.get(ip) {
                Some((city, country)) => GeoResult::Found {
                    city: city.clone(),
                    country: country.clone(),
                },
                None => GeoResult::NotFound,
            }
        }
    }

    fn enrich(line: &str, index: usize, resolver: &FakeResolver) -> Option<String> {
        let mut registry = UniqueIpRegistry::new();
        enrich_line(line, index, resolver, &mut registry)
    }

    #[test]
    fn resolved_line_gains_city_and_country() {
        let resolver = FakeResolver::new(&[("8.8.8.8", Some("Testville"), Some("Testland"))]);
        assert_eq!(
            enrich("2024-01-01 00:00:00 8.8.8.8 GET", 2, &resolver).as_deref(),
            Some("2024-01-01 00:00:00 8.8.8.8 GET Testville Testland")
        );
    }

    #[test]
    fn spaces_become_underscores_in_output_only() {
        let resolver = FakeResolver::new(&[("8.8.8.8", Some("New York"), Some("United States"))]);
        let mut registry = UniqueIpRegistry::new();
        let out = enrich_line("x 8.8.8.8", 1, &resolver, &mut registry).unwrap();
        assert_eq!(out, "x 8.8.8.8 New_York United_States");
        // Registry keeps the raw strings.
        assert_eq!(registry.entries()[0].city.as_deref(), Some("New York"));
        assert_eq!(registry.entries()[0].country, "United States");
    }

    #[test]
    fn not_found_appends_na_and_skips_registry() {
        let resolver = FakeResolver::new(&[]);
        let mut registry = UniqueIpRegistry::new();
        let out = enrich_line("x 9.9.9.9", 1, &resolver, &mut registry).unwrap();
        assert_eq!(out, "x 9.9.9.9 NA NA");
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_error_is_embedded_in_the_record() {
        let resolver = FakeResolver::new(&[]);
        let mut registry = UniqueIpRegistry::new();
        let out = enrich_line("x not-an-ip", 1, &resolver, &mut registry).unwrap();
        assert!(out.starts_with("x not-an-ip City error: "));
        assert!(out.ends_with("Country error: (See city error)"));
        assert!(registry.is_empty());
    }

    #[test]
    fn excluded_classes_are_dropped() {
        let resolver = FakeResolver::new(&[]);
        assert_eq!(enrich("x 192.168.1.5", 1, &resolver), None);
        assert_eq!(enrich("x 10.0.0.1", 1, &resolver), None);
        assert_eq!(enrich("x 224.0.0.1", 1, &resolver), None);
        assert_eq!(enrich("x fe80::1", 1, &resolver), None);
    }

    #[test]
    fn quoted_tokens_are_unwrapped() {
        let resolver = FakeResolver::new(&[("8.8.8.8", Some("Testville"), Some("Testland"))]);
        assert_eq!(
            enrich("x \"8.8.8.8\"", 1, &resolver).as_deref(),
            Some("x \"8.8.8.8\" Testville Testland")
        );
    }

    #[test]
    fn missing_city_level_data_uses_placeholders() {
        let resolver = FakeResolver::new(&[("8.8.8.8", None, None)]);
        let mut registry = UniqueIpRegistry::new();
        let out = enrich_line("x 8.8.8.8", 1, &resolver, &mut registry).unwrap();
        assert_eq!(out, "x 8.8.8.8 NoCity NoCountry");
        assert_eq!(registry.entries()[0].city, None);
        assert_eq!(registry.entries()[0].country, "NoCountry");
    }

    #[test]
    fn short_row_degrades_to_lookup_error() {
        let resolver = FakeResolver::new(&[]);
        let out = enrich("lonely", 5, &resolver).unwrap();
        assert!(out.contains("City error: "));
    }
}
