//! Geolocation lookup behind a narrow trait seam.
//!
//! The pipeline only ever asks one question of the outside world: "where is
//! this address?". [`GeoResolver`] captures that question, [`GeoResult`]
//! captures the three possible answers, and [`MaxMindResolver`] is the one
//! production implementation, backed by a MaxMind city MMDB opened once at
//! process start and shared read-only for the whole run.

use camino::{Utf8Path, Utf8PathBuf};
use maxminddb::{geoip2, MaxMindDBError, Mmap, Reader};
use std::net::IpAddr;

use crate::error::{Error, Result};

/// Recognized city database file names. The full commercial variant takes
/// precedence over the free lite variant when both are present.
const CITY_DB_FULL: &str = "GeoIP2-City.mmdb";
const CITY_DB_LITE: &str = "GeoLite2-City.mmdb";

/// Outcome of a single geolocation lookup.
///
/// `NotFound` is a normal, non-exceptional outcome; `Error` captures every
/// other failure (unparseable address, database fault) as diagnostic text
/// that the enricher embeds into the output record instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoResult {
    Found {
        city: Option<String>,
        country: Option<String>,
    },
    NotFound,
    Error(String),
}

/// Maps a routable IP address string to a city/country outcome.
pub trait GeoResolver {
    fn lookup(&self, ip: &str) -> GeoResult;
}

/// Locate the city database in `dir`, preferring the full variant.
pub fn find_city_db(dir: &Utf8Path) -> Result<Utf8PathBuf> {
    for name in [CITY_DB_FULL, CITY_DB_LITE] {
        let candidate = dir.join(name);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(Error::DatabaseNotFound {
        path: dir.to_owned(),
    })
}

/// [`GeoResolver`] backed by a MaxMind GeoIP2/GeoLite2 city database.
pub struct MaxMindResolver {
    reader: Reader<Mmap>,
}

impl MaxMindResolver {
    /// Open the database at `path` via mmap.
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let reader = Reader::open_mmap(path).map_err(|source| Error::DatabaseOpen {
            path: path.to_owned(),
            source,
        })?;
        Ok(MaxMindResolver { reader })
    }
}

impl GeoResolver for MaxMindResolver {
    fn lookup(&self, ip: &str) -> GeoResult {
        let addr: IpAddr = match ip.parse() {
            Ok(addr) => addr,
            Err(err) => return GeoResult::Error(err.to_string()),
        };

        match self.reader.lookup::<geoip2::City>(addr) {
            Ok(record) => {
                // English names only, matching the database's primary locale.
                let city = record
                    .city
                    .and_then(|c| c.names)
                    .and_then(|n| n.get("en").map(|s| s.to_string()));
                let country = record
                    .country
                    .and_then(|c| c.names)
                    .and_then(|n| n.get("en").map(|s| s.to_string()));
                GeoResult::Found { city, country }
            }
            Err(MaxMindDBError::AddressNotFoundError(_)) => GeoResult::NotFound,
            Err(err) => GeoResult::Error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_database_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap();
        assert!(matches!(
            find_city_db(dir),
            Err(Error::DatabaseNotFound { .. })
        ));
    }

    #[test]
    fn full_database_takes_precedence_over_lite() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::write(dir.join(CITY_DB_LITE), b"").unwrap();
        assert_eq!(find_city_db(dir).unwrap(), dir.join(CITY_DB_LITE));

        std::fs::write(dir.join(CITY_DB_FULL), b"").unwrap();
        assert_eq!(find_city_db(dir).unwrap(), dir.join(CITY_DB_FULL));
    }
}
