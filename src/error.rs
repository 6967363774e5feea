use crate::cache::error::CacheError;
use crate::cdc::error::DecodeError;
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhenodataError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution,

    #[error("Unknown dataset \"{0}\", use \"immediate\" or \"annual\"")]
    UnknownDataset(String),

    #[error("Unknown partition \"{0}\", use \"recent\" or \"historical\"")]
    UnknownPartition(String),

    #[error("Unknown language \"{0}\", use \"english\", \"german\" or \"latin\"")]
    UnknownLanguage(String),

    #[error("Unknown projection \"{0}\", use \"name\", \"path\" or \"url\"")]
    UnknownProjection(String),

    #[error("Unknown output format \"{0}\"")]
    UnknownFormat(String),

    #[error("Preset \"{name}\" not found in file \"{source_file}\"")]
    PresetNotFound { name: String, source_file: String },

    #[error("Failed to parse preset file \"{0}\"")]
    PresetParse(String, #[source] serde_json::Error),

    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Unknown column \"{0}\"")]
    UnknownColumn(String),

    #[error("Failed to write output")]
    Output(#[source] std::io::Error),
}
