use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache region directory '{0}'")]
    RegionCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cache file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode cache data for '{0}'")]
    Decode(String, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode cache data for '{0}'")]
    Encode(String, #[source] Box<bincode::error::EncodeError>),

    #[error("Failed to delete cache '{0}'")]
    Deletion(PathBuf, #[source] std::io::Error),
}
