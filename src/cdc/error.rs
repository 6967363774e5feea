use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed building table for \"{0}\"")]
    Polars(String, #[source] PolarsError),

    #[error("Resource \"{resource}\" lacks column \"{column}\"")]
    MissingColumn { resource: String, column: String },

    #[error("Invalid record normalization pattern")]
    Pattern(#[from] regex::Error),
}
