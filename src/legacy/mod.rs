//! Frozen v0 blob support.
//!
//! The v0 format stored fetched tweets as a single Parquet file sorted by
//! descending `id`. The storage core treats such a blob as opaque bytes
//! except for two things: the `PAR1` magic that identifies it, and the `id`
//! column, from which the maximum tweet id is extracted so accumulation can
//! resume above it. Full columnar rendering of v0 files belongs to the
//! rendering layer, not here.

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, Int64Array, StringArray};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use parquet::file::reader::ChunkReader;
use tracing::debug;

/// Maximum tweet id in a v0 Parquet file on disk.
///
/// `None` if the file has no rows, no readable `id` column, or is not
/// valid Parquet at all.
pub fn max_id_in_file(path: &Path) -> std::io::Result<Option<i64>> {
    let file = File::open(path)?;
    Ok(max_id(file))
}

/// Maximum tweet id in v0 Parquet bytes (e.g. a `LEGACY.parquet` part body).
pub fn max_id_in_bytes(bytes: Vec<u8>) -> Option<i64> {
    max_id(Bytes::from(bytes))
}

fn max_id<R: ChunkReader + 'static>(reader: R) -> Option<i64> {
    let builder = match ParquetRecordBatchReaderBuilder::try_new(reader) {
        Ok(builder) => builder,
        Err(e) => {
            debug!("Unreadable v0 blob: {}", e);
            return None;
        }
    };
    let schema = builder.parquet_schema();
    let id_index = schema.columns().iter().position(|c| c.name() == "id")?;
    let mask = ProjectionMask::leaves(schema, [id_index]);
    let reader = builder.with_projection(mask).build().ok()?;

    for batch in reader {
        let batch = batch.ok()?;
        if batch.num_rows() == 0 {
            continue;
        }
        let column = batch.column(0);
        // Sorted by descending id, so the first row holds the maximum.
        if let Some(ids) = column.as_any().downcast_ref::<Int64Array>() {
            if ids.is_null(0) {
                return None;
            }
            return Some(ids.value(0));
        }
        // Old ingest bug: some v0 files hold int64 ids as text.
        if let Some(ids) = column.as_any().downcast_ref::<StringArray>() {
            if ids.is_null(0) {
                return None;
            }
            return ids.value(0).parse().ok();
        }
        return None;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use tempfile::TempDir;

    #[test]
    fn test_max_id_int64() {
        assert_eq!(
            max_id_in_bytes(testutil::legacy_parquet_bytes(&[900, 500, 100])),
            Some(900)
        );
    }

    #[test]
    fn test_max_id_utf8_ids() {
        assert_eq!(
            max_id_in_bytes(testutil::legacy_parquet_bytes_utf8(&["321", "99"])),
            Some(321)
        );
    }

    #[test]
    fn test_max_id_empty_table() {
        assert_eq!(max_id_in_bytes(testutil::legacy_parquet_bytes(&[])), None);
    }

    #[test]
    fn test_max_id_garbage_bytes() {
        assert_eq!(max_id_in_bytes(b"PAR1 but not really".to_vec()), None);
    }

    #[test]
    fn test_max_id_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.parquet");
        std::fs::write(&path, testutil::legacy_parquet_bytes(&[7])).unwrap();
        assert_eq!(max_id_in_file(&path).unwrap(), Some(7));
    }
}
