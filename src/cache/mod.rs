//! The two-region response cache used by the remote client.
//!
//! The `meta` region holds directory listings and expires entries after a
//! short time-to-live. The `content` region holds file bodies together with
//! the server modification time they were fetched at and never expires on
//! its own; freshness is decided by the caller comparing modification times.
//!
//! Concurrent processes sharing one cache directory race on writes. Each
//! write is atomic per file, the last writer wins.

pub mod error;
pub mod region;

use crate::cache::error::CacheError;
use crate::cache::region::{CacheRegion, DiskRegion, MemoryRegion};
use bincode::config::{Configuration, Fixint, LittleEndian};
use chrono::Duration;
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

pub(crate) const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

const META_REGION: &str = "meta";
const CONTENT_REGION: &str = "content";

/// Outcome of [`drop_storage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Removed,
    NothingToDrop,
}

pub struct ResponseCache {
    meta: Box<dyn CacheRegion>,
    content: Box<dyn CacheRegion>,
    location: Option<PathBuf>,
}

impl ResponseCache {
    /// Opens (or creates) the persistent cache below `root`.
    pub fn open(root: &Path, meta_ttl: Duration) -> Result<Self, CacheError> {
        info!("Using response cache at {}", root.display());
        Ok(Self {
            meta: Box::new(DiskRegion::open(&root.join(META_REGION), Some(meta_ttl))?),
            content: Box::new(DiskRegion::open(&root.join(CONTENT_REGION), None)?),
            location: Some(root.to_path_buf()),
        })
    }

    /// Creates a cache which lives in memory for the lifetime of the value.
    pub fn in_memory(meta_ttl: Duration) -> Self {
        Self {
            meta: Box::new(MemoryRegion::new(Some(meta_ttl))),
            content: Box::new(MemoryRegion::new(None)),
            location: None,
        }
    }

    /// Assembles a cache from arbitrary regions.
    pub fn from_regions(meta: Box<dyn CacheRegion>, content: Box<dyn CacheRegion>) -> Self {
        Self {
            meta,
            content,
            location: None,
        }
    }

    /// Directory the cache is persisted in, `None` for in-memory caches.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn get_meta<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        decode(key, self.meta.get(key)?)
    }

    pub fn set_meta<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), CacheError> {
        self.meta.set(key, &encode(key, value)?)
    }

    pub fn get_content<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        decode(key, self.content.get(key)?)
    }

    pub fn set_content<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), CacheError> {
        self.content.set(key, &encode(key, value)?)
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>, CacheError> {
    bincode::serde::encode_to_vec(value, BINCODE_CONFIG)
        .map_err(|e| CacheError::Encode(key.to_string(), Box::new(e)))
}

fn decode<T: DeserializeOwned>(key: &str, bytes: Option<Vec<u8>>) -> Result<Option<T>, CacheError> {
    let Some(bytes) = bytes else {
        return Ok(None);
    };
    bincode::serde::decode_from_slice::<T, _>(&bytes, BINCODE_CONFIG)
        .map(|(value, _)| Some(value))
        .map_err(|e| CacheError::Decode(key.to_string(), Box::new(e)))
}

/// Removes the whole cache directory `root`.
pub fn drop_storage(root: &Path) -> Result<DropOutcome, CacheError> {
    match std::fs::remove_dir_all(root) {
        Ok(()) => {
            info!("Dropped cache at {}", root.display());
            Ok(DropOutcome::Removed)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DropOutcome::NothingToDrop),
        Err(e) => Err(CacheError::Deletion(root.to_path_buf(), e)),
    }
}
