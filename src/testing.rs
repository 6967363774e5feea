//! In-memory transport double and a miniature CDC tree for offline tests.

use crate::remote::error::TransportError;
use crate::remote::transport::Transport;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub(crate) const BASE: &str = "/climate_environment/CDC";

struct ScriptedFile {
    modified: String,
    payload: Vec<u8>,
    listed: bool,
}

#[derive(Default)]
struct Script {
    files: BTreeMap<String, ScriptedFile>,
    failing: HashSet<String>,
    listings: HashMap<String, usize>,
    retrievals: HashMap<String, usize>,
}

/// A [`Transport`] answering from a scripted file tree.
///
/// Clones share the same script, so a test keeps a handle for adding files
/// and counting commands after the transport has been moved into a client.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file. `modified` uses the listing layout, `Apr 08 10:12`.
    pub(crate) fn add_file(&self, path: &str, modified: &str, payload: &[u8]) {
        self.insert(path, modified, payload, true);
    }

    /// Adds a file which can be retrieved but never shows up in a listing.
    pub(crate) fn add_unlisted_file(&self, path: &str, payload: &[u8]) {
        self.insert(path, "Jan 01 2020", payload, false);
    }

    fn insert(&self, path: &str, modified: &str, payload: &[u8], listed: bool) {
        self.script.lock().unwrap().files.insert(
            path.to_string(),
            ScriptedFile {
                modified: modified.to_string(),
                payload: payload.to_vec(),
                listed,
            },
        );
    }

    /// Makes every command addressing `path` fail.
    pub(crate) fn fail(&self, path: &str) {
        self.script.lock().unwrap().failing.insert(path.to_string());
    }

    pub(crate) fn listings(&self, path: &str) -> usize {
        let script = self.script.lock().unwrap();
        script.listings.get(path).copied().unwrap_or(0)
    }

    pub(crate) fn retrievals(&self, path: &str) -> usize {
        let script = self.script.lock().unwrap();
        script.retrievals.get(path).copied().unwrap_or(0)
    }

    pub(crate) fn total_retrievals(&self) -> usize {
        self.script.lock().unwrap().retrievals.values().sum()
    }
}

impl Transport for ScriptedTransport {
    fn list(&self, path: &str) -> Result<Vec<String>, TransportError> {
        let mut script = self.script.lock().unwrap();
        *script.listings.entry(path.to_string()).or_default() += 1;
        if script.failing.contains(path) {
            return Err(TransportError::Failed(format!("{path}: 421 scripted failure")));
        }

        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut directories = BTreeSet::new();
        let mut lines = Vec::new();
        for (file_path, file) in &script.files {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((directory, _)) => {
                    directories.insert(directory.to_string());
                }
                None if file.listed => lines.push(format!(
                    "-rw-r--r--    1 ftp      ftp      {:>8} {} {}",
                    file.payload.len(),
                    file.modified,
                    rest
                )),
                None => {}
            }
        }
        let mut listing: Vec<String> = directories
            .into_iter()
            .map(|name| format!("drwxr-xr-x    2 ftp      ftp          4096 Jan 01  2020 {name}"))
            .collect();
        listing.extend(lines);
        Ok(listing)
    }

    fn retrieve(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let mut script = self.script.lock().unwrap();
        *script.retrievals.entry(path.to_string()).or_default() += 1;
        if script.failing.contains(path) {
            return Err(TransportError::Failed(format!("{path}: 426 scripted failure")));
        }
        script
            .files
            .get(path)
            .map(|file| file.payload.clone())
            .ok_or_else(|| TransportError::NotFound(path.to_string()))
    }
}

const SPECIES: &str = "Objekt_ID;Objekt;Objekt_englisch;Objekt_latein;eor;\r\n\
25;Rüben;beet;Beta vulgaris;eor;\r\n\
113;Hasel;common hazel;Corylus avellana;eor;\r\n\
127;Schneeglöckchen;snowdrop;Galanthus nivalis;eor;\r\n";

const PHASES: &str = "Phase_ID;Phase;Phase_englisch;eor;\r\n\
1;Ergrünen Beginn;beginning of turning green;eor;\r\n\
5;Blüte Beginn;beginning of flowering;eor;\r\n\
12;Aufgang;emergence;eor;\r\n";

const QUALITY_LEVELS: &str = "Qualitaetsniveau;Beschreibung;eor;\r\n\
1;nur formale Prüfung beim Entschlüsseln und Laden;eor;\r\n\
7;in ROUTINE geprüft, aber keine Korrekturen (z.B. RR_UN vor Korrektur);eor;\r\n\
10;in ROUTINE geprüft, routinemäßige Korrektur beendet;eor;\r\n";

const QUALITY_BYTES: &str = "Qualiaetsbyte;Beschreibung;eor;\r\n\
0;Feldwert ungeprüft;eor;\r\n\
1;Feldwert nicht beanstandet;eor;\r\n\
7;ungültiges Eintrittsdatum; z.B. 31. April, wird automatisch;eor;\r\n";

const STATIONS_HEADER: &str = "Stations_id;Stationsname;geograph.Breite;geograph.Laenge;Stationshoehe;\
Naturraumgruppe_Code;Naturraumgruppe;Naturraum_Code;Naturraum;Datum Stationsaufloesung;Bundesland;eor;\r\n";

const IMMEDIATE_STATIONS: &str = "\
  19475;Angermünde (Ph);53.0325;14.0125;54;78;Odertal;7820;Uckermärkisches Hügelland;;Brandenburg;eor;\r\n\
  12365;Wansdorf;52.6319;13.0869;35;81;Luchland;8120;Havelländisches Luch;;Brandenburg;eor;\r\n\
    662;Braunschweig;52.2915;10.4464;81;62;Weser-Aller-Flachland;6230;Burgdorf-Peiner Geestplatten;;Niedersachsen;eor;\r\n\
   7521;Berlin-Dahlem;52.4537;13.3017;51;81;Luchland;8110;Berliner Urstromtal;31.12.2015;Berlin;eor;\r\n";

const ANNUAL_STATIONS: &str = "\
   8290;Wall;52.9319;12.6422;38;81;Luchland;8140;Rhinluch;;Brandenburg;eor;\r\n\
    662;Braunschweig;52.2915;10.4464;81;62;Weser-Aller-Flachland;6230;Burgdorf-Peiner Geestplatten;;Niedersachsen;eor;\r\n";

const OBSERVATIONS_HEADER: &str =
    "Stations_id;Referenzjahr;Qualitaetsniveau;Objekt_id;Phase_id;Eintrittsdatum;Eintrittsdatum_QB;Jultag;eor;\r\n";

const HAZEL_RECENT: &str = "\
  19475;2021;    7;113;  5;20210211;1;  42;eor;\r\n\
  19475;2022;    7;113;  5;20220220;1;  51;eor;\r\n\
  12365;2021;   10;113;  5;20210201;1;  32;eor;\r\n\
  12365;2022;   10;113;  5;20220303;1;  62;eor;\r\n\
    662;2021;    7;113;  5;20210215;1;  46;eor;\r\n";

const SNOWDROP_RECENT: &str = "\
  19475;2021;    7;127;  5;20210203;1;  34;eor;\r\n\
  12365;2021;    7;127;  5;20210230;7;  61;eor;\r\n\
    662;2021;    7;127;  5;20210209;1;    ;eor;\r\n";

const BEET_RECENT: &str = "STATIONS_ID;REFERENZJAHR;QUALITAETSNIVEAU;OBJEKT_ID;PHASE_ID;EINTRITTSDATUM;EINTRITTSDATUM_QB;JULTAG;eor;\r\n\
    662;2021;    7; 25; 12;20210420;1; 110;eor;\r\n";

const HAZEL_HISTORICAL: &str = "\
  19475;2019;   10;113;  5;20190220;1;  51;eor;\r\n\
  19475;2020;   10;113;  5;20200131;1;  31;eor;\r\n";

const HAZEL_ANNUAL: &str = "\
   8290;2021;   10;113;  5;20210201;1;  32;eor;\r\n\
    662;2021;    7;113;  5;20210301;1;  60;eor;\r\n";

const MODIFIED: &str = "Apr 08 10:12";

/// Server path of the immediate reporters' recent hazel file.
pub(crate) const HAZEL_RECENT_PATH: &str = "/climate_environment/CDC/observations_germany/phenology/immediate_reporters/wild/recent/PH_Sofortmelder_Wildwachsende_Pflanze_Hasel_akt.txt";

/// A scripted server holding help files and a handful of observation files
/// for both reporter kinds and both partitions.
pub(crate) fn cdc_fixture() -> ScriptedTransport {
    let transport = ScriptedTransport::new();
    let help = |name: &str, content: &str| {
        transport.add_file(&format!("{BASE}/help/{name}"), MODIFIED, content.as_bytes());
    };
    help("PH_Beschreibung_Pflanze.txt", SPECIES);
    help("PH_Beschreibung_Phase.txt", PHASES);
    help("PH_Beschreibung_Phaenologie_Qualitaetsniveau.txt", QUALITY_LEVELS);
    help("PH_Beschreibung_Phaenologie_Qualitaetsbyte.txt", QUALITY_BYTES);
    help(
        "PH_Beschreibung_Phaenologie_Stationen_Sofortmelder.txt",
        &format!("{STATIONS_HEADER}{IMMEDIATE_STATIONS}"),
    );
    help(
        "PH_Beschreibung_Phaenologie_Stationen_Jahresmelder.txt",
        &format!("{STATIONS_HEADER}{ANNUAL_STATIONS}"),
    );

    let immediate = format!("{BASE}/observations_germany/phenology/immediate_reporters");
    let annual = format!("{BASE}/observations_germany/phenology/annual_reporters");
    let observations = |path: String, rows: &str| {
        transport.add_file(&path, MODIFIED, format!("{OBSERVATIONS_HEADER}{rows}").as_bytes());
    };
    observations(
        format!("{immediate}/wild/recent/PH_Sofortmelder_Wildwachsende_Pflanze_Hasel_akt.txt"),
        HAZEL_RECENT,
    );
    observations(
        format!("{immediate}/wild/recent/PH_Sofortmelder_Wildwachsende_Pflanze_Schneegloeckchen_akt.txt"),
        SNOWDROP_RECENT,
    );
    observations(
        format!("{immediate}/wild/historical/PH_Sofortmelder_Wildwachsende_Pflanze_Hasel_1979_2021_hist.txt"),
        HAZEL_HISTORICAL,
    );
    observations(
        format!("{annual}/wild/recent/PH_Jahresmelder_Wildwachsende_Pflanze_Hasel_akt.txt"),
        HAZEL_ANNUAL,
    );
    transport.add_file(
        &format!("{immediate}/crops/recent/PH_Sofortmelder_Landwirtschaft_Kulturpflanze_Ruebe_akt.txt"),
        MODIFIED,
        BEET_RECENT.as_bytes(),
    );

    for name in [
        "PH_Beschreibung_Sofortmelder_Wildwachsende_Pflanze.txt",
        "PH_Sofortmelder_Spezifizierung_Wildwachsende_Pflanze.txt",
        "PH_Sofortmelder_Wildwachsende_Pflanze_Notiz_2021.txt",
        "Readme_Sofortmelder.pdf",
    ] {
        transport.add_file(&format!("{immediate}/wild/recent/{name}"), MODIFIED, b"ignored");
    }
    transport
}
