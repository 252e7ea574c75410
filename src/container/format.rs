//! Reserved part names, attribute keys and container-kind sniffing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Error part written when the remote service acknowledged a request and
/// signaled failure. Always first in the archive.
pub const API_ERROR_NAME: &str = "API-ERROR.lz4";

/// Error part written when no acknowledged response arrived at all.
/// Always first in the archive.
pub const NETWORK_ERROR_NAME: &str = "NETWORK-ERROR.json.lz4";

/// The frozen v0 blob. Always last in the archive, never empty.
pub const LEGACY_NAME: &str = "LEGACY.parquet";

/// Suffix of data part names: `<max-tweet-id>.json.lz4`.
pub const PAGE_SUFFIX: &str = ".json.lz4";

/// PAX extended-header keys carrying per-part attributes.
///
/// Absent attributes are omitted entirely; an empty value is never written.
pub mod pax {
    pub const API_ENDPOINT: &str = "twl:apiEndpoint";
    pub const API_PARAMS: &str = "twl:apiParams";
    pub const HTTP_STATUS: &str = "twl:httpStatus";
    pub const N_TWEETS: &str = "twl:nTweets";
}

/// Magic prefix of a Parquet file.
pub const PARQUET_MAGIC: &[u8; 4] = b"PAR1";

/// Whether a part name denotes an error part.
pub fn is_error_name(name: &str) -> bool {
    name.contains("ERROR")
}

/// The physical shape of a container, resolved once at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Zero-byte file: nothing ever fetched, no error.
    Empty,
    /// Bare v0 Parquet file.
    Legacy,
    /// Tar archive of parts (the current format).
    Archive,
}

/// Sniff a container's kind from its leading bytes.
pub fn sniff(path: &Path) -> std::io::Result<ContainerKind> {
    let mut file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(ContainerKind::Empty);
    }
    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) if &magic == PARQUET_MAGIC => Ok(ContainerKind::Legacy),
        // Shorter than four bytes: cannot be Parquet, let the archive
        // reader fail loudly on it.
        Ok(()) | Err(_) => Ok(ContainerKind::Archive),
    }
}
