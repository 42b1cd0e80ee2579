use camino::Utf8PathBuf;

/// Error types for the geologtag library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No `*.log` files were found in the log directory. Fatal: nothing to do.
    #[error("no .log files found in {path}")]
    NoLogFiles { path: Utf8PathBuf },

    /// Neither recognized GeoIP city database file was found. Fatal.
    #[error("no GeoIP city database found in {path}")]
    DatabaseNotFound { path: Utf8PathBuf },

    /// Opening the GeoIP city database failed.
    #[error("failed to open GeoIP city database at {path}")]
    DatabaseOpen {
        path: Utf8PathBuf,
        #[source]
        source: maxminddb::MaxMindDBError,
    },

    /// The file ran out of header lines without declaring a `#Fields` directive.
    /// Per-file recoverable: the file is skipped.
    #[error("no #Fields directive found before data rows")]
    MissingFieldsDirective,

    /// The target field is not declared in the file's `#Fields` directive.
    /// Per-file recoverable: the file is skipped.
    #[error("field {name:?} not declared in #Fields directive")]
    FieldNotFound { name: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using the library error.
pub type Result<T> = std::result::Result<T, Error>;
