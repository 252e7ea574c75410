//! Container writing.
//!
//! A fetch cycle always writes a brand-new container; it never mutates the
//! previous one. The writer builds the archive in a temporary file in the
//! destination directory and publishes it by rename, so an interrupted
//! cycle never leaves a truncated file where a valid container is expected.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::container::format::pax;
use crate::container::ContainerError;
use crate::models::ResultPart;

/// Append-style writer for one new container.
pub struct ContainerWriter {
    builder: tar::Builder<NamedTempFile>,
    dest: PathBuf,
    n_parts: usize,
}

impl ContainerWriter {
    /// Start a new container that will be published at `dest`.
    pub fn create(dest: &Path) -> Result<Self, ContainerError> {
        let tmp = temp_sibling(dest)?;
        Ok(Self {
            builder: tar::Builder::new(tmp),
            dest: dest.to_path_buf(),
            n_parts: 0,
        })
    }

    /// Append one part, attaching only the attributes it actually has.
    pub fn append(&mut self, part: &ResultPart) -> Result<(), ContainerError> {
        let mut attrs: Vec<(&str, Vec<u8>)> = Vec::new();
        if let Some(endpoint) = &part.api_endpoint {
            attrs.push((pax::API_ENDPOINT, endpoint.clone().into_bytes()));
        }
        if let Some(params) = &part.api_params {
            attrs.push((pax::API_PARAMS, params.clone().into_bytes()));
        }
        if let Some(status) = &part.http_status {
            attrs.push((pax::HTTP_STATUS, status.clone().into_bytes()));
        }
        if let Some(n) = part.n_tweets {
            attrs.push((pax::N_TWEETS, n.to_string().into_bytes()));
        }
        if !attrs.is_empty() {
            self.builder
                .append_pax_extensions(attrs.iter().map(|(key, value)| (*key, value.as_slice())))?;
        }

        let mut header = tar::Header::new_ustar();
        header.set_size(part.body.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(part.mtime.timestamp().max(0) as u64);
        self.builder
            .append_data(&mut header, &part.name, part.body.as_slice())?;
        self.n_parts += 1;
        Ok(())
    }

    /// Finish the archive and rename it into place.
    pub fn publish(self) -> Result<(), ContainerError> {
        let tmp = self.builder.into_inner()?;
        let dest = self.dest;
        tmp.persist(&dest).map_err(|e| ContainerError::Io(e.error))?;
        debug!("Published container with {} parts to {:?}", self.n_parts, dest);
        Ok(())
    }
}

/// Publish the canonical empty container: a zero-byte file, never a
/// zero-part archive.
pub fn publish_empty(dest: &Path) -> Result<(), ContainerError> {
    let tmp = temp_sibling(dest)?;
    tmp.persist(dest).map_err(|e| ContainerError::Io(e.error))?;
    debug!("Published empty container to {:?}", dest);
    Ok(())
}

/// Publish a byte-for-byte copy of an existing container.
pub fn publish_copy(src: &Path, dest: &Path) -> Result<(), ContainerError> {
    let tmp = temp_sibling(dest)?;
    std::fs::copy(src, tmp.path())?;
    tmp.persist(dest).map_err(|e| ContainerError::Io(e.error))?;
    debug!("Copied container {:?} to {:?}", src, dest);
    Ok(())
}

/// A temporary file in the same directory as `dest`, so the final rename
/// stays on one filesystem.
fn temp_sibling(dest: &Path) -> std::io::Result<NamedTempFile> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    NamedTempFile::new_in(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::format::{sniff, ContainerKind};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_publish_empty_is_zero_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out");
        publish_empty(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        assert_eq!(sniff(&path).unwrap(), ContainerKind::Empty);
    }

    #[test]
    fn test_publish_copy_preserves_bytes() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        std::fs::write(&src, b"PAR1 pretend parquet").unwrap();
        publish_copy(&src, &dest).unwrap();
        assert_eq!(
            std::fs::read(&src).unwrap(),
            std::fs::read(&dest).unwrap()
        );
    }

    #[test]
    fn test_write_produces_archive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out");
        let mut writer = ContainerWriter::create(&path).unwrap();
        writer
            .append(&ResultPart::page(
                99,
                vec![1, 2, 3],
                Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
                "1.1/search/tweets.json",
                "q=x".to_string(),
                "200".to_string(),
                1,
            ))
            .unwrap();
        writer.publish().unwrap();
        assert_eq!(sniff(&path).unwrap(), ContainerKind::Archive);
    }

    #[test]
    fn test_unpublished_writer_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out");
        {
            let mut writer = ContainerWriter::create(&path).unwrap();
            writer
                .append(&ResultPart::legacy(vec![1, 2, 3]))
                .unwrap();
            // dropped without publish()
        }
        assert!(!path.exists());
    }
}
