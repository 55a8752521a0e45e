// Carlot - Faceted search over used-car listings

pub mod car;
pub mod config;
pub mod engine;
pub mod facets;
pub mod filter;
pub mod jsonl;
pub mod range;
pub mod record;
pub mod store;

// Re-export main types for convenience
pub use car::{Address, BodyType, Car, Dimension, FuelType, Ownership, Transmission};
pub use config::Settings;
pub use engine::{apply, count, count_value};
pub use facets::{FacetIndex, facet_counts};
pub use filter::{FacetValue, FilterState, LocationKey, SortOption};
pub use range::{Range, RangeControl};
pub use record::{Record, now_ms};
pub use store::{ListingSource, ListingStore, ListingsLog, SeedFile};
