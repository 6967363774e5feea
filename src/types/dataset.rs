//! Identifiers selecting which part of the upstream phenology archive is accessed.

use crate::error::PhenodataError;
use std::fmt;
use std::str::FromStr;

/// The reporter kind of an observation dataset.
///
/// Immediate reporters submit observations shortly after they happen, annual
/// reporters once per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Immediate,
    Annual,
}

impl Dataset {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            Dataset::Immediate => "immediate",
            Dataset::Annual => "annual",
        }
    }

    /// Location of the observation directory tree, relative to the CDC base path.
    pub(crate) fn data_directory(&self) -> String {
        format!(
            "/observations_germany/phenology/{}_reporters",
            self.path_segment()
        )
    }

    /// Location of the station description file, relative to the CDC base path.
    pub(crate) fn stations_file(&self) -> &'static str {
        match self {
            Dataset::Immediate => "/help/PH_Beschreibung_Phaenologie_Stationen_Sofortmelder.txt",
            Dataset::Annual => "/help/PH_Beschreibung_Phaenologie_Stationen_Jahresmelder.txt",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

impl FromStr for Dataset {
    type Err = PhenodataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Ok(Dataset::Immediate),
            "annual" => Ok(Dataset::Annual),
            _ => Err(PhenodataError::UnknownDataset(s.to_string())),
        }
    }
}

/// Upstream freshness bucket of observation files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Recent,
    Historical,
}

impl Partition {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            Partition::Recent => "recent",
            Partition::Historical => "historical",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

impl FromStr for Partition {
    type Err = PhenodataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recent" => Ok(Partition::Recent),
            "historical" => Ok(Partition::Historical),
            _ => Err(PhenodataError::UnknownPartition(s.to_string())),
        }
    }
}

/// Which attribute of a scanned file to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileProjection {
    /// Bare file name, e.g. `PH_Sofortmelder_Wildwachsende_Pflanze_Hasel_akt.txt`.
    #[default]
    Name,
    /// Full path on the server.
    Path,
    /// Public `ftp://` URL.
    Url,
}

impl FromStr for FileProjection {
    type Err = PhenodataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(FileProjection::Name),
            "path" => Ok(FileProjection::Path),
            "url" => Ok(FileProjection::Url),
            _ => Err(PhenodataError::UnknownProjection(s.to_string())),
        }
    }
}
