//! Key/value regions backing the response cache.
//!
//! A region stores opaque byte payloads together with the time they were
//! written. Regions configured with a time-to-live report entries older than
//! the TTL as missing.

use crate::cache::error::CacheError;
use crate::cache::BINCODE_CONFIG;
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const INDEX_FILE_NAME: &str = "index.bin";

pub trait CacheRegion: Send {
    /// Reads the payload stored under `key`, as seen at time `now`.
    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key`, recording `now` as its write time.
    fn set_at(&mut self, key: &str, value: &[u8], now: DateTime<Utc>) -> Result<(), CacheError>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.get_at(key, Utc::now())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.set_at(key, value, Utc::now())
    }
}

fn is_expired(stored_at: i64, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
    match ttl {
        Some(ttl) => now.timestamp() - stored_at >= ttl.num_seconds(),
        None => false,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    blob: String,
    stored_at: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegionIndex {
    next_blob: u64,
    entries: HashMap<String, IndexEntry>,
}

/// A region persisted below a directory: one `index.bin` plus one blob file per key.
///
/// Files are written through a temporary file and renamed into place, so a
/// reader never observes a partially written blob or index.
pub struct DiskRegion {
    dir: PathBuf,
    ttl: Option<Duration>,
    index: RegionIndex,
}

impl DiskRegion {
    pub fn open(dir: &Path, ttl: Option<Duration>) -> Result<Self, CacheError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| CacheError::RegionCreation(dir.to_path_buf(), e))?;
        let index_path = dir.join(INDEX_FILE_NAME);
        let index = match std::fs::read(&index_path) {
            Ok(bytes) => {
                match bincode::serde::decode_from_slice::<RegionIndex, _>(&bytes, BINCODE_CONFIG) {
                    Ok((index, _)) => index,
                    Err(e) => {
                        warn!(
                            "Discarding unreadable cache index {}: {}",
                            index_path.display(),
                            e
                        );
                        RegionIndex::default()
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => RegionIndex::default(),
            Err(e) => return Err(CacheError::Read(index_path, e)),
        };
        debug!(
            "Opened cache region {} with {} entries",
            dir.display(),
            index.entries.len()
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            ttl,
            index,
        })
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        let mut temp_file = NamedTempFile::new_in(&self.dir)
            .map_err(|e| CacheError::Write(path.to_path_buf(), e))?;
        temp_file
            .write_all(bytes)
            .map_err(|e| CacheError::Write(path.to_path_buf(), e))?;
        temp_file
            .persist(path)
            .map_err(|e| CacheError::Write(path.to_path_buf(), e.error))?;
        Ok(())
    }

    fn write_index(&self) -> Result<(), CacheError> {
        let bytes = bincode::serde::encode_to_vec(&self.index, BINCODE_CONFIG)
            .map_err(|e| CacheError::Encode(INDEX_FILE_NAME.to_string(), Box::new(e)))?;
        self.write_atomic(&self.dir.join(INDEX_FILE_NAME), &bytes)
    }
}

impl CacheRegion for DiskRegion {
    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>, CacheError> {
        let Some(entry) = self.index.entries.get(key) else {
            return Ok(None);
        };
        if is_expired(entry.stored_at, self.ttl, now) {
            debug!("Cache entry '{}' expired", key);
            return Ok(None);
        }
        let blob_path = self.dir.join(&entry.blob);
        match std::fs::read(&blob_path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Read(blob_path, e)),
        }
    }

    fn set_at(&mut self, key: &str, value: &[u8], now: DateTime<Utc>) -> Result<(), CacheError> {
        let blob = match self.index.entries.get(key) {
            Some(entry) => entry.blob.clone(),
            None => {
                self.index.next_blob += 1;
                format!("{:016x}.blob", self.index.next_blob)
            }
        };
        self.write_atomic(&self.dir.join(&blob), value)?;
        self.index.entries.insert(
            key.to_string(),
            IndexEntry {
                blob,
                stored_at: now.timestamp(),
            },
        );
        self.write_index()
    }
}

/// A region held in process memory only.
#[derive(Default)]
pub struct MemoryRegion {
    ttl: Option<Duration>,
    entries: HashMap<String, (Vec<u8>, i64)>,
}

impl MemoryRegion {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }
}

impl CacheRegion for MemoryRegion {
    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self
            .entries
            .get(key)
            .filter(|(_, stored_at)| !is_expired(*stored_at, self.ttl, now))
            .map(|(value, _)| value.clone()))
    }

    fn set_at(&mut self, key: &str, value: &[u8], now: DateTime<Utc>) -> Result<(), CacheError> {
        self.entries
            .insert(key.to_string(), (value.to_vec(), now.timestamp()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_disk_region_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("content");
        {
            let mut region = DiskRegion::open(&dir, None).unwrap();
            region.set("content:/a.txt", b"payload").unwrap();
            region.set("content:/a.txt", b"payload v2").unwrap();
            region.set("content:/b.txt", b"other").unwrap();
        }
        let region = DiskRegion::open(&dir, None).unwrap();
        assert_eq!(region.get("content:/a.txt").unwrap().unwrap(), b"payload v2");
        assert_eq!(region.get("content:/b.txt").unwrap().unwrap(), b"other");
        assert_eq!(region.get("content:/c.txt").unwrap(), None);
    }

    #[test]
    fn test_disk_region_ttl() {
        let temp_dir = TempDir::new().unwrap();
        let mut region = DiskRegion::open(temp_dir.path(), Some(Duration::minutes(5))).unwrap();
        let written = Utc::now();
        region.set_at("list:/help", b"listing", written).unwrap();

        let fresh = written + Duration::minutes(4);
        assert!(region.get_at("list:/help", fresh).unwrap().is_some());
        let stale = written + Duration::minutes(5);
        assert!(region.get_at("list:/help", stale).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_index_is_discarded() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(INDEX_FILE_NAME), b"\xff\xff").unwrap();
        let region = DiskRegion::open(temp_dir.path(), None).unwrap();
        assert!(region.get("anything").unwrap().is_none());
    }

    #[test]
    fn test_memory_region_without_ttl_never_expires() {
        let mut region = MemoryRegion::new(None);
        let written = Utc::now();
        region.set_at("content:/a", b"x", written).unwrap();
        let much_later = written + Duration::days(3650);
        assert_eq!(region.get_at("content:/a", much_later).unwrap().unwrap(), b"x");
    }
}
