use crate::cdc::decoder::{decode, DecodeOptions};
use crate::cdc::error::DecodeError;
use crate::remote::client::RemoteClient;
use log::info;
use polars::prelude::DataFrame;

/// Access to decoded files below the Climate Data Center root.
pub struct CdcClient {
    remote: RemoteClient,
    base_path: String,
    url_prefix: String,
}

impl CdcClient {
    pub fn new(remote: RemoteClient, base_path: &str, url_prefix: &str) -> Self {
        Self {
            remote,
            base_path: base_path.trim_end_matches('/').to_string(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn remote(&self) -> &RemoteClient {
        &self.remote
    }

    /// Server path of `path`, given relative to the CDC root.
    pub fn server_path(&self, path: &str) -> String {
        format!("{}{}", self.base_path, path)
    }

    /// Public URL of an absolute server path.
    pub fn url(&self, server_path: &str) -> String {
        format!("{}{}", self.url_prefix, server_path)
    }

    /// Retrieves and decodes the file at `path` relative to the CDC root.
    pub fn get_frame(
        &self,
        path: &str,
        options: DecodeOptions,
    ) -> Result<Option<DataFrame>, DecodeError> {
        self.get_frame_at(&self.server_path(path), options)
    }

    /// Retrieves and decodes the file at the absolute server path `server_path`.
    ///
    /// Returns `Ok(None)` when the file is unavailable or holds no records.
    pub fn get_frame_at(
        &self,
        server_path: &str,
        options: DecodeOptions,
    ) -> Result<Option<DataFrame>, DecodeError> {
        info!("Retrieving resource {}", self.url(server_path));
        match self.remote.retrieve_file(server_path) {
            Some(payload) => decode(&payload, server_path, options),
            None => Ok(None),
        }
    }
}
