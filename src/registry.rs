//! Run-scoped registry of distinct resolved IP addresses.

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::io::Write;

use crate::error::Result;

/// One distinct resolved address. City and country hold the raw resolver
/// strings, not the underscore-substituted output form.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UniqueIp {
    #[serde(rename = "IpAddress")]
    pub ip_address: String,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Country")]
    pub country: String,
}

/// Append-only store of distinct resolved addresses for one run.
///
/// Created once before any file is processed and shared across all of them;
/// the key set only ever grows. Entries keep their first-sighting city and
/// country and are never updated afterwards.
#[derive(Debug, Default)]
pub struct UniqueIpRegistry {
    seen: FxHashSet<String>,
    entries: Vec<UniqueIp>,
}

impl UniqueIpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the address unless it is already present. First sighting wins.
    pub fn record_if_absent(&mut self, ip: &str, city: Option<String>, country: String) {
        if self.seen.insert(ip.to_string()) {
            self.entries.push(UniqueIp {
                ip_address: ip.to_string(),
                city,
                country,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[UniqueIp] {
        &self.entries
    }

    /// Serialize the registry as CSV: an `IpAddress,City,Country` header row
    /// followed by one row per distinct address, in insertion order.
    pub fn write_summary<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        for entry in &self.entries {
            writer.serialize(entry).map_err(csv_io)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn csv_io(err: csv::Error) -> crate::error::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err).into()
}
