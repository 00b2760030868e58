//! Round providers.
//!
//! A [`RoundSource`] hands out fresh, unguessed rounds. [`FileCatalog`] is the
//! on-disk pool of location/image pairs the real game draws from:
//!
//! ```text
//! <data_dir>/
//!   job_listings.json              one {"project_id": "<uuid>"} per line
//!   job_deliverables/
//!     <project_id>.json            [{"lat": .., "lon": .., "image_url": ".."}, ...]
//! ```
//!
//! The whole catalog is read and validated up front so a bad file is a typed
//! error at startup rather than a failure in the middle of a game.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::location::{Location, LocationError};
use super::round::Round;

/// Listing file name inside the data directory.
pub const LISTINGS_FILE: &str = "job_listings.json";

/// Deliverables folder name inside the data directory.
pub const DELIVERABLES_DIR: &str = "job_deliverables";

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no catalog entries available")]
    NoDataAvailable,

    #[error("listings file {0} does not exist")]
    MissingListings(PathBuf),

    #[error("deliverables folder {0} does not exist")]
    MissingDeliverables(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed listing on line {line}: {source}")]
    MalformedListing {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed deliverable {path}: {source}")]
    MalformedDeliverable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("deliverable {path} row {row}: {source}")]
    InvalidLocation {
        path: PathBuf,
        row: usize,
        #[source]
        source: LocationError,
    },
}

/// Anything that can produce fresh rounds.
pub trait RoundSource {
    fn generate_round(&mut self) -> Result<Round, CatalogError>;
}

/// Always yields a round at the same place. Useful for tests and demos.
#[derive(Debug, Clone)]
pub struct FixedRoundSource {
    pub location: Location,
    pub image_url: String,
}

impl FixedRoundSource {
    pub fn new(location: Location, image_url: impl Into<String>) -> Self {
        Self {
            location,
            image_url: image_url.into(),
        }
    }
}

impl RoundSource for FixedRoundSource {
    fn generate_round(&mut self) -> Result<Round, CatalogError> {
        Ok(Round::new(self.location, self.image_url.clone()))
    }
}

/// A location with the image taken there.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationWithImage {
    pub location: Location,
    pub image_url: String,
}

#[derive(Deserialize)]
struct ListingLine {
    project_id: Uuid,
}

#[derive(Deserialize)]
struct DeliverableRow {
    lat: f64,
    lon: f64,
    image_url: String,
}

/// Validated catalog loaded from a data directory.
#[derive(Debug, Clone, Default)]
pub struct FileCatalog {
    /// Project ID to its locations; only non-empty projects are kept
    projects: BTreeMap<Uuid, Vec<LocationWithImage>>,
}

impl FileCatalog {
    /// Load and validate the catalog under `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let listings_path = dir.join(LISTINGS_FILE);
        let deliverables_dir = dir.join(DELIVERABLES_DIR);

        if !listings_path.is_file() {
            return Err(CatalogError::MissingListings(listings_path));
        }
        if !deliverables_dir.is_dir() {
            return Err(CatalogError::MissingDeliverables(deliverables_dir));
        }

        let listings = read_to_string(&listings_path)?;
        let mut projects = BTreeMap::new();

        for project_id in parse_listings(&listings)? {
            let path = deliverables_dir.join(format!("{project_id}.json"));
            if !path.is_file() {
                debug!(%project_id, "Skipping project without deliverable");
                continue;
            }
            let locations = parse_deliverable(&path, &read_to_string(&path)?)?;
            if locations.is_empty() {
                warn!(%project_id, "Skipping project with empty deliverable");
                continue;
            }
            projects.insert(project_id, locations);
        }

        let catalog = Self { projects };
        info!(
            dir = %dir.display(),
            projects = catalog.projects.len(),
            locations = catalog.location_count(),
            "Loaded round catalog"
        );
        Ok(catalog)
    }

    /// Build a catalog from in-memory data.
    pub fn from_projects(projects: impl IntoIterator<Item = (Uuid, Vec<LocationWithImage>)>) -> Self {
        Self {
            projects: projects
                .into_iter()
                .filter(|(_, locations)| !locations.is_empty())
                .collect(),
        }
    }

    /// Project IDs with at least one location, in ID order.
    pub fn projects(&self) -> impl Iterator<Item = &Uuid> {
        self.projects.keys()
    }

    /// Locations for a project.
    pub fn locations(&self, project_id: &Uuid) -> Option<&[LocationWithImage]> {
        self.projects.get(project_id).map(Vec::as_slice)
    }

    /// Total locations across all projects.
    pub fn location_count(&self) -> usize {
        self.projects.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Pick a project uniformly, then a location within it.
    pub fn random_location<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<&LocationWithImage, CatalogError> {
        let project_ids: Vec<&Uuid> = self.projects.keys().collect();
        let project_id = project_ids
            .choose(rng)
            .ok_or(CatalogError::NoDataAvailable)?;
        self.projects[*project_id]
            .choose(rng)
            .ok_or(CatalogError::NoDataAvailable)
    }
}

fn read_to_string(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_listings(contents: &str) -> Result<Vec<Uuid>, CatalogError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<ListingLine>(line)
                .map(|l| l.project_id)
                .map_err(|source| CatalogError::MalformedListing {
                    line: idx + 1,
                    source,
                })
        })
        .collect()
}

fn parse_deliverable(path: &Path, contents: &str) -> Result<Vec<LocationWithImage>, CatalogError> {
    let rows: Vec<DeliverableRow> =
        serde_json::from_str(contents).map_err(|source| CatalogError::MalformedDeliverable {
            path: path.to_path_buf(),
            source,
        })?;

    rows.into_iter()
        .enumerate()
        .map(|(row, r)| {
            let location =
                Location::new(r.lat, r.lon).map_err(|source| CatalogError::InvalidLocation {
                    path: path.to_path_buf(),
                    row,
                    source,
                })?;
            Ok(LocationWithImage {
                location,
                image_url: r.image_url,
            })
        })
        .collect()
}

/// Draws rounds at random from a [`FileCatalog`].
#[derive(Debug)]
pub struct RandomRoundSource<R> {
    catalog: FileCatalog,
    rng: R,
}

impl RandomRoundSource<rand::rngs::ThreadRng> {
    pub fn new(catalog: FileCatalog) -> Self {
        Self::with_rng(catalog, rand::rng())
    }
}

impl<R: Rng> RandomRoundSource<R> {
    pub fn with_rng(catalog: FileCatalog, rng: R) -> Self {
        Self { catalog, rng }
    }

    pub fn catalog(&self) -> &FileCatalog {
        &self.catalog
    }
}

impl<R: Rng> RoundSource for RandomRoundSource<R> {
    fn generate_round(&mut self) -> Result<Round, CatalogError> {
        let picked = self.catalog.random_location(&mut self.rng)?;
        Ok(Round::new(picked.location, picked.image_url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;

    const PROJECT: &str = "7aea928b-ccf0-414c-a86a-624cde68d8a7";
    const ORPHAN: &str = "0f2b7c4e-93a1-4d5e-8c61-2b1e0e9b8a11";

    fn write_catalog(dir: &Path, listings: &str, deliverables: &[(&str, &str)]) {
        fs::write(dir.join(LISTINGS_FILE), listings).unwrap();
        fs::create_dir_all(dir.join(DELIVERABLES_DIR)).unwrap();
        for (id, body) in deliverables {
            fs::write(dir.join(DELIVERABLES_DIR).join(format!("{id}.json")), body).unwrap();
        }
    }

    fn sample_rows() -> &'static str {
        r#"[
            {"lat": 40.7128, "lon": -74.0060, "image_url": "https://img.example/nyc.jpg"},
            {"lat": 34.0522, "lon": -118.2437, "image_url": "https://img.example/la.jpg"}
        ]"#
    }

    #[test]
    fn test_listing_line_parse() {
        let ids = parse_listings(&format!("{{\"project_id\": \"{PROJECT}\"}}\n\n")).unwrap();
        assert_eq!(ids, vec![Uuid::parse_str(PROJECT).unwrap()]);
    }

    #[test]
    fn test_open_keeps_projects_with_deliverables() {
        let dir = tempfile::tempdir().unwrap();
        let listings = format!(
            "{{\"project_id\": \"{PROJECT}\"}}\n{{\"project_id\": \"{ORPHAN}\"}}\n"
        );
        write_catalog(dir.path(), &listings, &[(PROJECT, sample_rows())]);

        let catalog = FileCatalog::open(dir.path()).unwrap();
        let project = Uuid::parse_str(PROJECT).unwrap();
        assert_eq!(catalog.projects().collect::<Vec<_>>(), vec![&project]);
        assert_eq!(catalog.location_count(), 2);
        assert!(catalog.locations(&project).unwrap().len() > 1);
    }

    #[test]
    fn test_open_skips_empty_deliverables() {
        let dir = tempfile::tempdir().unwrap();
        let listings = format!("{{\"project_id\": \"{PROJECT}\"}}\n");
        write_catalog(dir.path(), &listings, &[(PROJECT, "[]")]);

        let catalog = FileCatalog::open(dir.path()).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_open_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FileCatalog::open(dir.path()),
            Err(CatalogError::MissingListings(_))
        ));

        fs::write(dir.path().join(LISTINGS_FILE), "").unwrap();
        assert!(matches!(
            FileCatalog::open(dir.path()),
            Err(CatalogError::MissingDeliverables(_))
        ));
    }

    #[test]
    fn test_open_reports_schema_errors() {
        let dir = tempfile::tempdir().unwrap();
        let listings = format!("{{\"project_id\": \"{PROJECT}\"}}\nnot json\n");
        write_catalog(dir.path(), &listings, &[]);
        assert!(matches!(
            FileCatalog::open(dir.path()),
            Err(CatalogError::MalformedListing { line: 2, .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        let listings = format!("{{\"project_id\": \"{PROJECT}\"}}\n");
        write_catalog(
            dir.path(),
            &listings,
            &[(PROJECT, r#"[{"latitude": 1.0, "longitude": 2.0, "image_url": "x"}]"#)],
        );
        assert!(matches!(
            FileCatalog::open(dir.path()),
            Err(CatalogError::MalformedDeliverable { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        write_catalog(
            dir.path(),
            &listings,
            &[(PROJECT, r#"[{"lat": 95.0, "lon": 2.0, "image_url": "x"}]"#)],
        );
        assert!(matches!(
            FileCatalog::open(dir.path()),
            Err(CatalogError::InvalidLocation { row: 0, .. })
        ));
    }

    #[test]
    fn test_random_source_generates_unguessed_rounds() {
        let project = Uuid::parse_str(PROJECT).unwrap();
        let nyc = LocationWithImage {
            location: Location::new(40.7128, -74.0060).unwrap(),
            image_url: "https://img.example/nyc.jpg".to_string(),
        };
        let catalog = FileCatalog::from_projects([(project, vec![nyc.clone()])]);
        let mut source = RandomRoundSource::with_rng(catalog, StdRng::seed_from_u64(7));

        let round = source.generate_round().unwrap();
        assert_eq!(round.actual_location, nyc.location);
        assert_eq!(round.image_url, nyc.image_url);
        assert_eq!(round.guess_location, None);
        assert_eq!(round.score, None);
    }

    #[test]
    fn test_random_source_empty_catalog() {
        let mut source =
            RandomRoundSource::with_rng(FileCatalog::default(), StdRng::seed_from_u64(1));
        assert!(matches!(
            source.generate_round(),
            Err(CatalogError::NoDataAvailable)
        ));
    }

    #[test]
    fn test_fixed_source() {
        let loc = Location::new(40.7128, -74.0060).unwrap();
        let mut source = FixedRoundSource::new(loc, "https://example.com/image.jpg");
        let a = source.generate_round().unwrap();
        let b = source.generate_round().unwrap();
        assert_eq!(a.actual_location, loc);
        assert_ne!(a.id, b.id);
    }
}
