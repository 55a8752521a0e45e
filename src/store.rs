// In-memory listing store and the sources that fill it

use crate::car::{Car, Dimension};
use crate::engine;
use crate::facets::FacetIndex;
use crate::filter::FilterState;
use crate::jsonl;
use crate::record::now_ms;
use eyre::{Context, Result, eyre};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Anything that can supply the full set of listings
pub trait ListingSource {
    fn fetch(&self) -> Result<Vec<Car>>;

    /// Short label for logs
    fn describe(&self) -> String;
}

impl ListingSource for Vec<Car> {
    fn fetch(&self) -> Result<Vec<Car>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory listings", self.len())
    }
}

/// Static seed: one JSON array of listings
#[derive(Debug, Clone)]
pub struct SeedFile {
    path: PathBuf,
}

impl SeedFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ListingSource for SeedFile {
    fn fetch(&self) -> Result<Vec<Car>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read seed file {}", self.path.display()))?;
        let records: Vec<Value> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse seed file {}", self.path.display()))?;

        // One unreadable record never costs the rest of the seed
        let mut cars = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Car>(record) {
                Ok(car) => cars.push(car),
                Err(e) => warn!(
                    file = ?self.path,
                    index,
                    error = %e,
                    "Failed to read seed record, skipping"
                ),
            }
        }
        Ok(cars)
    }

    fn describe(&self) -> String {
        format!("seed file {}", self.path.display())
    }
}

/// Append-only listings log with latest-wins reads and tombstones
#[derive(Debug, Clone)]
pub struct ListingsLog {
    path: PathBuf,
}

impl ListingsLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate and append a listing, stamping its update time
    pub fn append(&self, mut car: Car) -> Result<Car> {
        car.validate()?;
        car.updated_at = now_ms();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create listings directory")?;
        }
        jsonl::append_jsonl(&self.path, &car)?;

        info!(id = %car.id, path = ?self.path, "Appended listing");
        Ok(car)
    }

    /// Append a tombstone for a listing that is currently present
    pub fn remove(&self, id: &str) -> Result<()> {
        let current: Vec<Car> = jsonl::read_jsonl_latest(&self.path)?;
        if !current.iter().any(|car| car.id == id) {
            return Err(eyre!("No listing with id {}", id));
        }
        jsonl::append_tombstone(&self.path, id, now_ms())?;

        info!(id, path = ?self.path, "Removed listing");
        Ok(())
    }
}

impl ListingSource for ListingsLog {
    fn fetch(&self) -> Result<Vec<Car>> {
        jsonl::read_jsonl_latest(&self.path)
    }

    fn describe(&self) -> String {
        format!("listings log {}", self.path.display())
    }
}

/// Pick a source by extension: `.json` is a seed file, anything else a listings log
pub fn source_for_path(path: &Path) -> Box<dyn ListingSource> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => Box::new(SeedFile::new(path)),
        _ => Box::new(ListingsLog::new(path)),
    }
}

/// Ordered, read-only collection of listings plus its facet index
///
/// Changes never patch the store in place: they build a new one, which
/// recomputes the index.
#[derive(Debug, Clone, Default)]
pub struct ListingStore {
    cars: Vec<Car>,
    facets: FacetIndex,
}

impl ListingStore {
    pub fn new(cars: Vec<Car>) -> Self {
        let facets = FacetIndex::build(&cars);
        Self { cars, facets }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every listing from `source`, propagating failure
    pub fn load(source: &dyn ListingSource) -> Result<Self> {
        let cars = source
            .fetch()
            .with_context(|| format!("Failed to load listings from {}", source.describe()))?;
        info!(count = cars.len(), source = %source.describe(), "Loaded listings");
        Ok(Self::new(cars))
    }

    /// Load every listing from `source`, falling back to an empty store on failure
    pub fn load_or_empty(source: &dyn ListingSource) -> Self {
        match Self::load(source) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = ?e, "Listing fetch failed, continuing with an empty store");
                Self::empty()
            }
        }
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn facets(&self) -> &FacetIndex {
        &self.facets
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Car> {
        self.cars.iter().find(|car| car.id == id)
    }

    /// Store with `car` added, or replacing the listing with the same id in place
    pub fn with_listing(&self, car: Car) -> Self {
        let mut cars = self.cars.clone();
        match cars.iter_mut().find(|existing| existing.id == car.id) {
            Some(existing) => *existing = car,
            None => cars.push(car),
        }
        Self::new(cars)
    }

    /// Store without the listing `id`
    pub fn without_listing(&self, id: &str) -> Self {
        let cars: Vec<Car> = self.cars.iter().filter(|car| car.id != id).cloned().collect();
        debug!(id, removed = self.cars.len() - cars.len(), "without_listing");
        Self::new(cars)
    }

    /// A fresh, unrestricted filter state whose sliders span this store
    pub fn filter_state(&self, price_step: u64, year_step: u32) -> FilterState {
        FilterState::for_index(&self.facets, price_step, year_step)
    }

    pub fn search(&self, filters: &FilterState) -> Vec<&Car> {
        filters.results(&self.cars)
    }

    pub fn count(&self, filters: &FilterState, dimension: Dimension, candidate: &str) -> usize {
        engine::count(&self.cars, filters, dimension, candidate)
    }
}
