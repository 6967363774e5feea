//! Command line interface of the phenodata toolkit.

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use log::warn;
use phenodata::{
    load_preset, write_frame, Dataset, DropOutcome, FileProjection, FilterCriteria, Format,
    HumanizeOptions, Language, LatLon, Partition, Phenodata, PhenodataError, Settings,
};
use polars::prelude::{DataFrame, SortMultipleOptions};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Acquisition and manipulation toolkit for open access phenology data
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug messages
    #[arg(long, global = true)]
    debug: bool,

    /// Cache directory, defaults to the user's cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show program information
    Info,
    /// List species
    ListSpecies(Listing),
    /// List phases
    ListPhases(Listing),
    /// List quality levels
    ListQualityLevels(Listing),
    /// List quality bytes
    ListQualityBytes(Listing),
    /// List stations
    ListStations {
        #[command(flatten)]
        source: Source,
        /// Filter by station name, natural region or state
        #[arg(long)]
        filter: Option<String>,
        /// Include decommissioned stations
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        output: Output,
    },
    /// List observation file names
    ListFilenames(FileListing),
    /// List observation file URLs
    ListUrls(FileListing),
    /// Find the station closest to a location
    NearestStation(Nearest),
    /// Find the stations closest to a location
    NearestStations {
        #[command(flatten)]
        nearest: Nearest,
        /// Maximum number of stations
        #[arg(long, default_value_t = phenodata::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Retrieve observations
    Observations(Query),
    /// Forecast phenological events from observations
    Forecast {
        #[command(flatten)]
        query: Query,
        /// Year to forecast, defaults to the current year
        #[arg(long)]
        forecast_year: Option<i32>,
    },
    /// Remove the local cache
    DropCache,
}

#[derive(Args)]
struct Source {
    /// Data source. Only "dwd" is available.
    #[arg(long, default_value = "dwd")]
    source: String,
    /// "immediate" or "annual"
    #[arg(long, default_value = "immediate")]
    dataset: String,
}

#[derive(Args)]
struct Output {
    /// "tabular", "csv", "json" or "string"
    #[arg(long, default_value = "tabular")]
    format: String,
    /// Sort by the given columns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    sort: Vec<String>,
    /// Only output the first rows
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct Listing {
    #[command(flatten)]
    source: Source,
    #[command(flatten)]
    output: Output,
}

#[derive(Args)]
struct FileListing {
    #[command(flatten)]
    source: Source,
    /// "recent" or "historical"
    #[arg(long)]
    partition: String,
    /// Filter by file names (comma-separated)
    #[arg(long, alias = "files", value_delimiter = ',')]
    filename: Vec<String>,
}

#[derive(Args)]
struct Nearest {
    #[command(flatten)]
    source: Source,
    #[arg(long, allow_hyphen_values = true)]
    latitude: f64,
    #[arg(long, allow_hyphen_values = true)]
    longitude: f64,
    /// Include decommissioned stations
    #[arg(long)]
    all: bool,
    #[command(flatten)]
    output: Output,
}

#[derive(Args)]
struct Query {
    #[command(flatten)]
    source: Source,
    /// "recent" or "historical"
    #[arg(long)]
    partition: String,
    /// Filter by file names (comma-separated)
    #[arg(long, alias = "files", value_delimiter = ',')]
    filename: Vec<String>,

    /// Filter by years (comma-separated)
    #[arg(long, value_delimiter = ',')]
    year: Vec<i64>,
    /// Filter by station identifiers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    station_id: Vec<i64>,
    /// Filter by species identifiers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    species_id: Vec<i64>,
    /// Filter by phase identifiers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    phase_id: Vec<i64>,
    /// Filter by quality levels (comma-separated)
    #[arg(long, value_delimiter = ',')]
    quality_level: Vec<i64>,
    /// Filter by quality bytes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    quality_byte: Vec<i64>,

    /// Filter by station name, natural region or state (comma-separated)
    #[arg(long, value_delimiter = ',')]
    station: Vec<String>,
    /// Filter by species names (comma-separated)
    #[arg(long, value_delimiter = ',')]
    species: Vec<String>,
    /// Filter by a named group of species
    #[arg(long)]
    species_preset: Option<String>,
    /// Filter by phase names (comma-separated)
    #[arg(long, value_delimiter = ',')]
    phase: Vec<String>,
    /// Filter by quality level or quality byte descriptions (comma-separated)
    #[arg(long, value_delimiter = ',')]
    quality: Vec<String>,

    /// Replace identifiers by names
    #[arg(long)]
    humanize: bool,
    /// "english", "german" or "latin"
    #[arg(long, default_value = "english")]
    language: String,
    /// Include natural regions in station names
    #[arg(long)]
    long_station: bool,
    /// Append identifiers to names
    #[arg(long)]
    show_ids: bool,
    /// Show a progress bar while acquiring files
    #[arg(long)]
    progress: bool,

    #[command(flatten)]
    output: Output,
}

fn set(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

fn ids(values: &[i64]) -> Option<Vec<i64>> {
    (!values.is_empty()).then(|| values.to_vec())
}

impl Source {
    fn dataset(&self) -> Result<Dataset> {
        if !self.source.eq_ignore_ascii_case("dwd") {
            bail!("Data source \"{}\" not implemented", self.source);
        }
        Ok(self.dataset.parse()?)
    }
}

impl Query {
    fn criteria(&self) -> Result<FilterCriteria> {
        let mut species = self.species.clone();
        if let Some(preset) = &self.species_preset {
            species.extend(load_preset("species", "groups", preset)?);
        }
        Ok(FilterCriteria::builder()
            .partition(self.partition.parse::<Partition>()?)
            .maybe_files(set(self.filename.clone()))
            .maybe_year(ids(&self.year))
            .maybe_station_id(ids(&self.station_id))
            .maybe_species_id(ids(&self.species_id))
            .maybe_phase_id(ids(&self.phase_id))
            .maybe_quality_level(ids(&self.quality_level))
            .maybe_quality_byte(ids(&self.quality_byte))
            .maybe_station(set(self.station.clone()))
            .maybe_species(set(species))
            .maybe_phase(set(self.phase.clone()))
            .maybe_quality(set(self.quality.clone()))
            .build())
    }

    fn humanize(&self) -> Result<Option<HumanizeOptions>> {
        if !self.humanize {
            return Ok(None);
        }
        Ok(Some(
            HumanizeOptions::builder()
                .language(self.language.parse::<Language>()?)
                .long_station(self.long_station)
                .show_ids(self.show_ids)
                .build(),
        ))
    }
}

impl Output {
    fn render(&self, frame: DataFrame) -> Result<()> {
        let format: Format = self.format.parse()?;
        let mut frame = frame;
        if !self.sort.is_empty() {
            for column in &self.sort {
                if frame.get_column_index(column).is_none() {
                    return Err(PhenodataError::UnknownColumn(column.clone()).into());
                }
            }
            frame = frame.sort(self.sort.clone(), SortMultipleOptions::default())?;
        }
        if let Some(limit) = self.limit {
            frame = frame.head(Some(limit));
        }
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_frame(&mut frame, format, &mut out)?;
        out.flush()?;
        Ok(())
    }
}

fn print_lines(lines: &[String]) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn settings(cli: &Cli, progress: bool) -> Settings {
    Settings::builder()
        .maybe_cache_dir(cli.cache_dir.clone())
        .progress(progress)
        .build()
}

fn run(cli: Cli) -> Result<()> {
    let progress = match &cli.command {
        Commands::Observations(query) => query.progress,
        Commands::Forecast { query, .. } => query.progress,
        _ => false,
    };
    let settings = settings(&cli, progress);

    match &cli.command {
        Commands::Info => {
            println!("Name:         phenodata-{}", env!("CARGO_PKG_VERSION"));
            println!("Description:  {}", env!("CARGO_PKG_DESCRIPTION"));
            println!("Data sources: DWD");
            if let Ok(root) = settings.cache_dir.clone().map_or_else(phenodata::get_cache_dir, Ok) {
                println!("Cache:        {}", root.display());
            }
            return Ok(());
        }
        Commands::DropCache => {
            match Phenodata::drop_cache(&settings)? {
                DropOutcome::Removed => println!("Dropping cache succeeded"),
                DropOutcome::NothingToDrop => println!("Dropping cache failed: nothing to drop"),
            }
            return Ok(());
        }
        _ => {}
    }

    let client = Phenodata::with_settings(settings)?;
    match &cli.command {
        Commands::ListSpecies(listing) => {
            listing.source.dataset()?;
            listing.output.render(client.species()?.to_frame()?)
        }
        Commands::ListPhases(listing) => {
            listing.source.dataset()?;
            listing.output.render(client.phases()?.to_frame()?)
        }
        Commands::ListQualityLevels(listing) => {
            listing.source.dataset()?;
            listing.output.render(client.quality_levels()?.to_frame()?)
        }
        Commands::ListQualityBytes(listing) => {
            listing.source.dataset()?;
            listing.output.render(client.quality_bytes()?.to_frame()?)
        }
        Commands::ListStations {
            source,
            filter,
            all,
            output,
        } => {
            let frame = client
                .list_stations()
                .dataset(source.dataset()?)
                .include_all(*all)
                .maybe_filter(filter.as_deref())
                .call()?;
            output.render(frame)
        }
        Commands::ListFilenames(listing) | Commands::ListUrls(listing) => {
            let projection = match &cli.command {
                Commands::ListUrls(_) => FileProjection::Url,
                _ => FileProjection::Name,
            };
            let files = client
                .files()
                .dataset(listing.source.dataset()?)
                .partition(listing.partition.parse()?)
                .maybe_fragments(set(listing.filename.clone()))
                .projection(projection)
                .call()?;
            print_lines(&files)
        }
        Commands::NearestStation(nearest) => {
            let frame = client
                .nearest_station()
                .dataset(nearest.source.dataset()?)
                .location(LatLon(nearest.latitude, nearest.longitude))
                .include_all(nearest.all)
                .call()?;
            nearest.output.render(frame)
        }
        Commands::NearestStations { nearest, limit } => {
            let frame = client
                .nearest_stations()
                .dataset(nearest.source.dataset()?)
                .location(LatLon(nearest.latitude, nearest.longitude))
                .include_all(nearest.all)
                .limit(*limit)
                .call()?;
            nearest.output.render(frame)
        }
        Commands::Observations(query) => {
            let criteria = query.criteria()?;
            let result = client
                .observations()
                .dataset(query.source.dataset()?)
                .criteria(&criteria)
                .maybe_humanize(query.humanize()?)
                .call()?;
            match result {
                Some(frame) => query.output.render(frame),
                None => {
                    warn!("No data");
                    Ok(())
                }
            }
        }
        Commands::Forecast {
            query,
            forecast_year,
        } => {
            let criteria = query.criteria()?;
            let result = client
                .forecast()
                .dataset(query.source.dataset()?)
                .criteria(&criteria)
                .maybe_target_year(*forecast_year)
                .maybe_humanize(query.humanize()?)
                .call()?;
            match result {
                Some(frame) => query.output.render(frame),
                None => {
                    warn!("No data");
                    Ok(())
                }
            }
        }
        Commands::Info | Commands::DropCache => Ok(()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Print every row and column in tabular output
    std::env::set_var("POLARS_FMT_MAX_ROWS", "-1");
    std::env::set_var("POLARS_FMT_MAX_COLS", "-1");

    run(cli)
}
