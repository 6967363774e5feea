//! Directory listing and file retrieval with response caching.
//!
//! Listings are served from the `meta` cache region while it holds a fresh
//! snapshot. File bodies are served from the `content` region whenever the
//! cached modification time is not older than the one the server reports.

use crate::cache::ResponseCache;
use crate::remote::error::TransportError;
use crate::remote::listing::{parse_listing_line, DirectoryEntry};
use crate::remote::transport::Transport;
use chrono::{Datelike, Local, NaiveDateTime};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

pub struct RemoteClient {
    transport: Box<dyn Transport>,
    cache: Mutex<ResponseCache>,
    processing_year: i32,
}

impl RemoteClient {
    pub fn new(transport: Box<dyn Transport>, cache: ResponseCache) -> Self {
        Self {
            transport,
            cache: Mutex::new(cache),
            processing_year: Local::now().year(),
        }
    }

    /// Overrides the year stamped on listing entries that carry no year.
    pub fn with_processing_year(mut self, year: i32) -> Self {
        self.processing_year = year;
        self
    }

    /// Lists the directory at `path`.
    ///
    /// A failed listing is logged and yields an empty sequence. Successful
    /// listings are cached in the `meta` region.
    pub fn list_directory(&self, path: &str) -> Vec<DirectoryEntry> {
        let key = format!("list:{path}");
        if let Some(entries) = self.cached_meta::<Vec<DirectoryEntry>>(&key) {
            debug!("Listing of \"{path}\" served from cache");
            return entries;
        }

        match self.transport.list(path) {
            Ok(lines) => {
                let entries: Vec<DirectoryEntry> = lines
                    .iter()
                    .filter_map(|line| parse_listing_line(line, path, self.processing_year))
                    .collect();
                debug!("Listed {} entries in \"{path}\"", entries.len());
                self.store_meta(&key, &entries);
                entries
            }
            Err(e) => {
                warn!("Listing \"{path}\" failed: {e}");
                Vec::new()
            }
        }
    }

    /// Modification time of the file at `path`, taken from its parent listing.
    pub fn modification_time(&self, path: &str) -> Option<NaiveDateTime> {
        let (parent, name) = path.rsplit_once('/')?;
        let parent = if parent.is_empty() { "/" } else { parent };
        self.list_directory(parent)
            .into_iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.modified_at)
    }

    /// Retrieves the file at `path`.
    ///
    /// Returns `None` when the file does not exist or the transfer failed.
    pub fn retrieve_file(&self, path: &str) -> Option<Vec<u8>> {
        let content_key = format!("content:{path}");
        let mtime_key = format!("mtime:{path}");

        let current = self.modification_time(path);
        match current {
            Some(current) => {
                info!("Resource \"{path}\": last modified on {current}");
                let cached_at = self.cached_content::<NaiveDateTime>(&mtime_key);
                if cached_at.is_some_and(|cached_at| cached_at >= current) {
                    if let Some(payload) = self.cached_content::<Vec<u8>>(&content_key) {
                        debug!("Resource \"{path}\" served from cache");
                        return Some(payload);
                    }
                }
            }
            None => debug!("Resource \"{path}\": modification time unknown"),
        }

        match self.transport.retrieve(path) {
            Ok(payload) => {
                self.store_content(&content_key, &payload);
                if let Some(current) = current {
                    self.store_content(&mtime_key, &current);
                }
                Some(payload)
            }
            Err(TransportError::NotFound(_)) => {
                info!("Resource \"{path}\" does not exist");
                None
            }
            Err(e) => {
                warn!("Retrieving \"{path}\" failed: {e}");
                None
            }
        }
    }

    fn lock_cache(&self) -> Option<MutexGuard<'_, ResponseCache>> {
        match self.cache.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!("Response cache lock poisoned, bypassing cache");
                None
            }
        }
    }

    fn cached_meta<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lock_cache()?
            .get_meta(key)
            .unwrap_or_else(|e| {
                warn!("Reading cache entry \"{key}\" failed: {e}");
                None
            })
    }

    fn cached_content<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lock_cache()?
            .get_content(key)
            .unwrap_or_else(|e| {
                warn!("Reading cache entry \"{key}\" failed: {e}");
                None
            })
    }

    fn store_meta<T: Serialize>(&self, key: &str, value: &T) {
        if let Some(mut cache) = self.lock_cache() {
            if let Err(e) = cache.set_meta(key, value) {
                warn!("Writing cache entry \"{key}\" failed: {e}");
            }
        }
    }

    fn store_content<T: Serialize>(&self, key: &str, value: &T) {
        if let Some(mut cache) = self.lock_cache() {
            if let Err(e) = cache.set_content(key, value) {
                warn!("Writing cache entry \"{key}\" failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::region::MemoryRegion;
    use crate::testing::ScriptedTransport;
    use chrono::Duration;

    fn client(transport: &ScriptedTransport) -> RemoteClient {
        RemoteClient::new(
            Box::new(transport.clone()),
            ResponseCache::in_memory(Duration::minutes(5)),
        )
        .with_processing_year(2024)
    }

    #[test]
    fn test_unchanged_file_is_fetched_once() {
        let transport = ScriptedTransport::new();
        transport.add_file("/help/a.txt", "Mar 01 12:00", b"a;eor;");
        let client = client(&transport);

        assert_eq!(client.retrieve_file("/help/a.txt").unwrap(), b"a;eor;");
        assert_eq!(client.retrieve_file("/help/a.txt").unwrap(), b"a;eor;");
        assert_eq!(transport.retrievals("/help/a.txt"), 1);
        assert_eq!(transport.listings("/help"), 1);
    }

    #[test]
    fn test_newer_server_file_is_refetched() {
        let transport = ScriptedTransport::new();
        transport.add_file("/help/a.txt", "Mar 01 12:00", b"old");
        let cache = ResponseCache::from_regions(
            Box::new(MemoryRegion::new(Some(Duration::zero()))),
            Box::new(MemoryRegion::new(None)),
        );
        let client =
            RemoteClient::new(Box::new(transport.clone()), cache).with_processing_year(2024);

        assert_eq!(client.retrieve_file("/help/a.txt").unwrap(), b"old");
        transport.add_file("/help/a.txt", "Mar 02 08:30", b"new");
        assert_eq!(client.retrieve_file("/help/a.txt").unwrap(), b"new");
        assert_eq!(transport.retrievals("/help/a.txt"), 2);
    }

    #[test]
    fn test_listing_is_cached_within_ttl() {
        let transport = ScriptedTransport::new();
        transport.add_file("/help/a.txt", "Mar 01 12:00", b"a");
        let client = client(&transport);

        let first = client.list_directory("/help");
        transport.add_file("/help/b.txt", "Mar 01 12:00", b"b");
        let second = client.list_directory("/help");
        assert_eq!(first, second);
        assert_eq!(transport.listings("/help"), 1);
    }

    #[test]
    fn test_missing_file_yields_none() {
        let transport = ScriptedTransport::new();
        transport.add_file("/help/a.txt", "Mar 01 12:00", b"a");
        let client = client(&transport);
        assert!(client.retrieve_file("/help/missing.txt").is_none());
    }

    #[test]
    fn test_failures_degrade_to_no_data() {
        let transport = ScriptedTransport::new();
        transport.add_file("/help/a.txt", "Mar 01 12:00", b"a");
        transport.fail("/help/a.txt");
        transport.fail("/broken");
        let client = client(&transport);

        assert!(client.retrieve_file("/help/a.txt").is_none());
        assert!(client.list_directory("/broken").is_empty());
    }

    #[test]
    fn test_file_without_listing_entry_is_always_fetched() {
        let transport = ScriptedTransport::new();
        transport.add_unlisted_file("/hidden/a.txt", b"a");
        let client = client(&transport);

        assert!(client.modification_time("/hidden/a.txt").is_none());
        assert_eq!(client.retrieve_file("/hidden/a.txt").unwrap(), b"a");
        assert_eq!(client.retrieve_file("/hidden/a.txt").unwrap(), b"a");
        assert_eq!(transport.retrievals("/hidden/a.txt"), 2);
    }
}
