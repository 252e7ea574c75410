//! The on-disk container format for fetch results.
//!
//! A container is one of three physical shapes, told apart by sniffing the
//! first bytes of the file, never by extension or caller hint:
//!
//! * a zero-byte file — nothing ever fetched, no error;
//! * an uncompressed tar archive of [`ResultPart`](crate::models::ResultPart)s
//!   in order: at most one error part first, data parts by strictly
//!   descending max tweet id, at most one `LEGACY.parquet` last;
//! * a bare v0 Parquet file (the frozen legacy format), equivalent to a
//!   single legacy part.
//!
//! The archive itself is uncompressed; each part body is compressed
//! individually, so accumulation can copy parts forward without
//! recompressing anything.
//!
//! Containers are never mutated. Each fetch cycle builds a fresh container
//! in a temporary file and publishes it by rename; "accumulation" means the
//! writer copies selected parts of the previous container into the new one.
//!
//! Corrupt archives, missing required attributes on data parts and
//! out-of-order part sequences are out of contract: readers may fail loudly
//! on them and make no recovery guarantee.

pub mod format;
pub mod reader;
pub mod writer;

use thiserror::Error;

pub use format::ContainerKind;
pub use reader::ResultFile;
pub use writer::ContainerWriter;

/// Errors that can occur while reading or writing containers.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed container: {0}")]
    Malformed(String),
}
