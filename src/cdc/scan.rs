//! Scanning of the three-level observation file hierarchy
//! `<reporters>/<category>/<partition>/<file>`.

use crate::cdc::client::CdcClient;
use crate::remote::listing::DirectoryEntry;
use crate::types::dataset::{Dataset, FileProjection, Partition};
use log::{debug, info};
use regex::Regex;

/// Observation files of both reporter kinds.
const OBSERVATION_FILE_PATTERN: &str = r"PH_(Sofort|Jahres)melder.+\.txt";

/// Description, specification and note files living next to the observations.
const EXCLUDED_FILE_PATTERNS: [&str; 3] = ["PH_Beschreibung", "Spezifizierung", r"PH_.+_Notiz"];

struct FileFilter {
    include: Regex,
    exclude: Vec<Regex>,
}

impl FileFilter {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            include: Regex::new(OBSERVATION_FILE_PATTERN)?,
            exclude: EXCLUDED_FILE_PATTERNS
                .iter()
                .map(|pattern| Regex::new(pattern))
                .collect::<Result<_, _>>()?,
        })
    }

    fn accepts(&self, name: &str, fragments: Option<&[String]>) -> bool {
        self.include.is_match(name)
            && !self.exclude.iter().any(|pattern| pattern.is_match(name))
            && fragments.map_or(true, |fragments| {
                fragments.iter().any(|fragment| name.contains(fragment.as_str()))
            })
    }
}

impl CdcClient {
    /// Lists the observation files of `dataset` in `partition`.
    ///
    /// Only files following the observation naming convention are returned.
    /// With `fragments`, a file is kept when its name contains any of them.
    /// Entries appear in server listing order.
    pub fn scan_files(
        &self,
        dataset: Dataset,
        partition: Partition,
        fragments: Option<&[String]>,
    ) -> Result<Vec<DirectoryEntry>, regex::Error> {
        let filter = FileFilter::new()?;
        let root = self.server_path(&dataset.data_directory());
        info!("Scanning for files in {}", self.url(&root));

        let mut results = Vec::new();
        for category in self.remote().list_directory(&root) {
            if !category.is_directory {
                continue;
            }
            let directory = format!("{}/{}", category.full_path, partition.path_segment());
            let files = self.remote().list_directory(&directory);
            debug!("Found {} entries in {directory}", files.len());
            results.extend(
                files
                    .into_iter()
                    .filter(|entry| !entry.is_directory && filter.accepts(&entry.name, fragments)),
            );
        }
        Ok(results)
    }

    /// Reduces a scanned entry to the requested attribute.
    pub fn project(&self, entry: &DirectoryEntry, projection: FileProjection) -> String {
        match projection {
            FileProjection::Name => entry.name.clone(),
            FileProjection::Path => entry.full_path.clone(),
            FileProjection::Url => self.url(&entry.full_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::remote::client::RemoteClient;
    use crate::testing::{cdc_fixture, BASE, HAZEL_RECENT_PATH};
    use chrono::Duration;

    fn cdc() -> CdcClient {
        let remote = RemoteClient::new(
            Box::new(cdc_fixture()),
            ResponseCache::in_memory(Duration::minutes(5)),
        );
        CdcClient::new(remote, BASE, "ftp://opendata.dwd.de")
    }

    fn names(entries: &[DirectoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_scan_keeps_only_observation_files() {
        let entries = cdc()
            .scan_files(Dataset::Immediate, Partition::Recent, None)
            .unwrap();
        assert_eq!(
            names(&entries),
            [
                "PH_Sofortmelder_Landwirtschaft_Kulturpflanze_Ruebe_akt.txt",
                "PH_Sofortmelder_Wildwachsende_Pflanze_Hasel_akt.txt",
                "PH_Sofortmelder_Wildwachsende_Pflanze_Schneegloeckchen_akt.txt",
            ]
        );
        for entry in &entries {
            assert!(!entry.name.contains("PH_Beschreibung"));
            assert!(!entry.name.contains("Spezifizierung"));
            assert!(!entry.name.contains("Notiz"));
        }
    }

    #[test]
    fn test_scan_partitions_and_datasets() {
        let cdc = cdc();
        let historical = cdc
            .scan_files(Dataset::Immediate, Partition::Historical, None)
            .unwrap();
        assert_eq!(
            names(&historical),
            ["PH_Sofortmelder_Wildwachsende_Pflanze_Hasel_1979_2021_hist.txt"]
        );
        let annual = cdc.scan_files(Dataset::Annual, Partition::Recent, None).unwrap();
        assert_eq!(
            names(&annual),
            ["PH_Jahresmelder_Wildwachsende_Pflanze_Hasel_akt.txt"]
        );
        assert!(cdc
            .scan_files(Dataset::Annual, Partition::Historical, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_scan_with_fragments() {
        let cdc = cdc();
        let fragments = vec!["Hasel".to_string(), "Ruebe".to_string()];
        let entries = cdc
            .scan_files(Dataset::Immediate, Partition::Recent, Some(&fragments))
            .unwrap();
        assert_eq!(entries.len(), 2);

        let hazel = vec!["Hasel".to_string()];
        let entries = cdc
            .scan_files(Dataset::Immediate, Partition::Recent, Some(&hazel))
            .unwrap();
        assert_eq!(cdc.project(&entries[0], FileProjection::Path), HAZEL_RECENT_PATH);
        assert_eq!(
            cdc.project(&entries[0], FileProjection::Url),
            format!("ftp://opendata.dwd.de{HAZEL_RECENT_PATH}")
        );
        assert_eq!(
            cdc.project(&entries[0], FileProjection::Name),
            "PH_Sofortmelder_Wildwachsende_Pflanze_Hasel_akt.txt"
        );
    }
}
