use crate::error::PhenodataError;
use log::info;
use regex::{Regex, RegexBuilder};
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "phenodata";

pub fn get_cache_dir() -> Result<PathBuf, PhenodataError> {
    dirs::cache_dir()
        .ok_or(PhenodataError::CacheDirResolution)
        .map(|p| p.join(CACHE_DIR_NAME))
}

pub fn ensure_cache_dir_exists(path: &Path) -> Result<(), PhenodataError> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(PhenodataError::CacheDirCreation(
            path.to_path_buf(),
            io::Error::new(io::ErrorKind::AlreadyExists, "path exists but is not a directory"),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            std::fs::create_dir_all(path)
                .map_err(|e| PhenodataError::CacheDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(PhenodataError::CacheDirCreation(path.to_path_buf(), e)),
    }
}

/// Case-insensitive matcher for any of `terms` appearing anywhere in a text.
/// Terms are matched literally.
pub(crate) fn term_matcher<S: AsRef<str>>(terms: &[S]) -> Result<Regex, regex::Error> {
    let alternation = terms
        .iter()
        .map(|term| regex::escape(term.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&alternation).case_insensitive(true).build()
}
