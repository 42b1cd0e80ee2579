//! The geologtag library: geolocation enrichment of W3C extended access logs.
//!
//! Each input file is scanned for its `#Fields:` schema, the client IP column
//! is resolved once, and every data row is classified, looked up against a
//! city geolocation database, and written back out with `GeoCity` and
//! `GeoCountry` columns appended. A run-scoped registry collects each
//! distinct resolved address exactly once for the summary CSV.
//!
//! The geolocation source is a trait seam ([`GeoResolver`]), so the pipeline
//! can be exercised end to end without a real MMDB file.

pub mod classify;
pub mod enrich;
pub mod error;
pub mod geo;
pub mod header;
pub mod registry;

pub use crate::classify::{classify, Classification};
pub use crate::enrich::{enrich_file, FileOutcome, SkipReason};
pub use crate::error::{Error, Result};
pub use crate::geo::{find_city_db, GeoResolver, GeoResult, MaxMindResolver};
pub use crate::header::{FieldSchema, HeaderParser};
pub use crate::registry::{UniqueIp, UniqueIpRegistry};
