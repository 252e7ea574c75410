//! Low-memory reading of stored containers.
//!
//! [`ResultFile`] answers three questions about a container without loading
//! it whole: what query generated it, what is the newest tweet it holds,
//! and what is its current error state. Part iteration keeps at most one
//! part body in memory at a time.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::DateTime;
use tar::Archive;

use crate::container::format::{self, pax, ContainerKind, LEGACY_NAME, PAGE_SUFFIX};
use crate::container::ContainerError;
use crate::legacy;
use crate::models::{QueryIdentity, ResultPart};
use crate::query;

/// Everything about an archive entry except its body.
#[derive(Debug, Clone)]
struct PartMeta {
    name: String,
    mtime: u64,
    size: u64,
    offset: u64,
    api_endpoint: Option<String>,
    api_params: Option<String>,
    http_status: Option<String>,
    n_tweets: Option<u32>,
}

impl PartMeta {
    fn into_part(self, body: Vec<u8>) -> ResultPart {
        ResultPart {
            name: self.name,
            body,
            mtime: DateTime::from_timestamp(self.mtime as i64, 0).unwrap_or(DateTime::UNIX_EPOCH),
            api_endpoint: self.api_endpoint,
            api_params: self.api_params,
            http_status: self.http_status,
            n_tweets: self.n_tweets,
        }
    }

    fn is_error(&self) -> bool {
        format::is_error_name(&self.name)
    }

    fn page_id(&self) -> Option<i64> {
        if self.is_error() {
            return None;
        }
        self.name.strip_suffix(PAGE_SUFFIX)?.parse().ok()
    }
}

/// A stored container, opened lazily.
///
/// Every operation reopens the file and dispatches on the sniffed
/// [`ContainerKind`], so a `ResultFile` is cheap to hold and never keeps a
/// descriptor open between calls.
pub struct ResultFile {
    path: PathBuf,
}

impl ResultFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The container's physical shape, resolved by signature sniffing.
    pub fn kind(&self) -> Result<ContainerKind, ContainerError> {
        Ok(format::sniff(&self.path)?)
    }

    /// Iterate over stored parts in order.
    ///
    /// For the legacy form this yields zero parts if the blob has no rows,
    /// one legacy part otherwise. Memory use is bounded by one part body:
    /// archive bodies are read on demand from recorded offsets.
    pub fn parts(&self) -> Result<Parts, ContainerError> {
        match self.kind()? {
            ContainerKind::Empty => Ok(Parts {
                inner: PartsInner::Empty,
            }),
            ContainerKind::Legacy => {
                // An empty v0 blob holds no data; never surface it (and so
                // never copy it forward into a v1 archive).
                if legacy::max_id_in_file(&self.path)?.is_none() {
                    Ok(Parts {
                        inner: PartsInner::Empty,
                    })
                } else {
                    Ok(Parts {
                        inner: PartsInner::Legacy(Some(self.path.clone())),
                    })
                }
            }
            ContainerKind::Archive => {
                let metas = self.index()?;
                let file = File::open(&self.path)?;
                Ok(Parts {
                    inner: PartsInner::Archive {
                        file,
                        metas: metas.into_iter(),
                    },
                })
            }
        }
    }

    /// The newest tweet id across all data, or `None` if the container
    /// holds no tweets.
    pub fn newest_id(&self) -> Result<Option<i64>, ContainerError> {
        match self.kind()? {
            ContainerKind::Empty => Ok(None),
            ContainerKind::Legacy => Ok(legacy::max_id_in_file(&self.path)?),
            ContainerKind::Archive => {
                let metas = self.index()?;
                for meta in &metas {
                    if let Some(id) = meta.page_id() {
                        return Ok(Some(id));
                    }
                    if meta.name == LEGACY_NAME {
                        let body = self.read_body(meta)?;
                        return Ok(legacy::max_id_in_bytes(body));
                    }
                }
                Ok(None)
            }
        }
    }

    /// The (endpoint, normalized params) pair that generated this container.
    ///
    /// Unknowable (`None`) for empty containers and for a bare legacy blob,
    /// which predates endpoint/params tracking.
    pub fn query_identity(&self) -> Result<Option<QueryIdentity>, ContainerError> {
        if self.kind()? != ContainerKind::Archive {
            return Ok(None);
        }
        let metas = self.index()?;
        let Some(first) = metas.first() else {
            return Ok(None);
        };
        // The first entry of a non-empty archive is always a data or error
        // part; a legacy blob never comes first.
        match (&first.api_endpoint, &first.api_params) {
            (Some(endpoint), Some(params)) => Ok(Some(QueryIdentity::new(
                endpoint.clone(),
                query::normalize_params(params),
            ))),
            _ => Ok(None),
        }
    }

    /// The container's first part, if and only if it is an error part.
    pub fn leading_error(&self) -> Result<Option<ResultPart>, ContainerError> {
        if self.kind()? != ContainerKind::Archive {
            return Ok(None);
        }
        let metas = self.index()?;
        match metas.into_iter().next() {
            Some(meta) if meta.is_error() => {
                let body = self.read_body(&meta)?;
                Ok(Some(meta.into_part(body)))
            }
            _ => Ok(None),
        }
    }

    /// One streaming pass over the archive headers: names, attributes and
    /// body offsets, no bodies.
    fn index(&self) -> Result<Vec<PartMeta>, ContainerError> {
        let file = File::open(&self.path)?;
        let mut archive = Archive::new(file);
        let mut metas = Vec::new();
        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let name = entry.path()?.to_string_lossy().into_owned();
            let mut api_endpoint = None;
            let mut api_params = None;
            let mut http_status = None;
            let mut n_tweets = None;
            if let Some(extensions) = entry.pax_extensions()? {
                for extension in extensions {
                    let extension = extension?;
                    let (Ok(key), Ok(value)) = (extension.key(), extension.value()) else {
                        continue;
                    };
                    match key {
                        pax::API_ENDPOINT => api_endpoint = Some(value.to_string()),
                        pax::API_PARAMS => api_params = Some(value.to_string()),
                        pax::HTTP_STATUS => http_status = Some(value.to_string()),
                        pax::N_TWEETS => {
                            n_tweets = value.parse::<u32>().ok().filter(|n| *n > 0)
                        }
                        _ => {}
                    }
                }
            }
            metas.push(PartMeta {
                name,
                mtime: entry.header().mtime()?,
                size: entry.size(),
                offset: entry.raw_file_position(),
                api_endpoint,
                api_params,
                http_status,
                n_tweets,
            });
        }
        Ok(metas)
    }

    fn read_body(&self, meta: &PartMeta) -> Result<Vec<u8>, ContainerError> {
        let mut file = File::open(&self.path)?;
        read_body_at(&mut file, meta)
    }
}

fn read_body_at(file: &mut File, meta: &PartMeta) -> Result<Vec<u8>, ContainerError> {
    file.seek(SeekFrom::Start(meta.offset))?;
    let mut body = vec![0u8; meta.size as usize];
    file.read_exact(&mut body).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ContainerError::Malformed(format!("truncated body for part '{}'", meta.name))
        } else {
            ContainerError::Io(e)
        }
    })?;
    Ok(body)
}

enum PartsInner {
    Empty,
    Legacy(Option<PathBuf>),
    Archive {
        file: File,
        metas: std::vec::IntoIter<PartMeta>,
    },
}

/// Ordered, lazy iterator over a container's parts.
pub struct Parts {
    inner: PartsInner,
}

impl Iterator for Parts {
    type Item = Result<ResultPart, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            PartsInner::Empty => None,
            PartsInner::Legacy(slot) => {
                let path = slot.take()?;
                Some(
                    std::fs::read(&path)
                        .map(ResultPart::legacy)
                        .map_err(ContainerError::Io),
                )
            }
            PartsInner::Archive { file, metas } => {
                let meta = metas.next()?;
                Some(read_body_at(file, &meta).map(|body| meta.into_part(body)))
            }
        }
    }
}
