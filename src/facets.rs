// Facet index derived from the listing store

use crate::car::{BodyType, Car, Dimension, FuelType, Ownership, Transmission};
use crate::engine;
use crate::filter::{FacetValue, FilterState, LocationKey};
use crate::range::Range;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Cities observed in one state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCities {
    pub state: String,
    pub cities: Vec<String>,
}

/// Read-only groupings of the listing store, sorted for stable display
///
/// Category values outside the fixed vocabularies are not indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetIndex {
    pub brands: Vec<String>,
    pub body_types: Vec<BodyType>,
    pub fuels: Vec<FuelType>,
    pub transmissions: Vec<Transmission>,
    pub ownerships: Vec<Ownership>,
    pub locations: Vec<StateCities>,
    pub price: Option<Range<u64>>,
    pub year: Option<Range<u32>>,
}

impl FacetIndex {
    pub fn build(cars: &[Car]) -> Self {
        let mut brands = BTreeSet::new();
        let mut body_types = BTreeSet::new();
        let mut fuels = BTreeSet::new();
        let mut transmissions = BTreeSet::new();
        let mut ownerships = BTreeSet::new();
        let mut locations: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for car in cars {
            if let Some(brand) = car.brand.as_deref().filter(|b| !b.trim().is_empty()) {
                brands.insert(brand.to_string());
            }
            body_types.extend(car.body());
            fuels.extend(car.fuel());
            transmissions.extend(car.gearbox());
            ownerships.extend(car.owners());

            if let Some(state) = car.state() {
                let cities = locations.entry(state.to_string()).or_default();
                if let Some(city) = car.city() {
                    cities.insert(city.to_string());
                }
            }
        }

        let index = Self {
            brands: brands.into_iter().collect(),
            body_types: body_types.into_iter().collect(),
            fuels: fuels.into_iter().collect(),
            transmissions: transmissions.into_iter().collect(),
            ownerships: ownerships.into_iter().collect(),
            locations: locations
                .into_iter()
                .map(|(state, cities)| StateCities {
                    state,
                    cities: cities.into_iter().collect(),
                })
                .collect(),
            price: Range::spanning(cars.iter().filter_map(Car::price)),
            year: Range::spanning(cars.iter().filter_map(Car::year)),
        };

        debug!(
            cars = cars.len(),
            brands = index.brands.len(),
            states = index.locations.len(),
            price = ?index.price,
            year = ?index.year,
            "Built facet index"
        );
        index
    }

    /// Observed values of one dimension. Locations list each state followed by its cities.
    pub fn values(&self, dimension: Dimension) -> Vec<FacetValue> {
        match dimension {
            Dimension::Brand => self.brands.iter().cloned().map(FacetValue::Brand).collect(),
            Dimension::BodyType => self.body_types.iter().copied().map(FacetValue::BodyType).collect(),
            Dimension::Fuel => self.fuels.iter().copied().map(FacetValue::Fuel).collect(),
            Dimension::Transmission => self.transmissions.iter().copied().map(FacetValue::Transmission).collect(),
            Dimension::Ownership => self.ownerships.iter().copied().map(FacetValue::Ownership).collect(),
            Dimension::Location => self
                .locations
                .iter()
                .flat_map(|entry| {
                    std::iter::once(LocationKey::state(&entry.state))
                        .chain(entry.cities.iter().map(|city| LocationKey::city(&entry.state, city)))
                })
                .map(FacetValue::Location)
                .collect(),
        }
    }
}

/// Fixed option list of a dimension, or `None` for dimensions whose values come
/// only from the listings (brand, location)
pub fn catalog(dimension: Dimension) -> Option<Vec<FacetValue>> {
    match dimension {
        Dimension::BodyType => Some(BodyType::ALL.iter().copied().map(FacetValue::BodyType).collect()),
        Dimension::Fuel => Some(FuelType::ALL.iter().copied().map(FacetValue::Fuel).collect()),
        Dimension::Transmission => Some(Transmission::ALL.iter().copied().map(FacetValue::Transmission).collect()),
        Dimension::Ownership => Some(Ownership::ALL.iter().copied().map(FacetValue::Ownership).collect()),
        Dimension::Brand | Dimension::Location => None,
    }
}

/// Facet count for every indexed value of `dimension`, in index order
pub fn facet_counts(
    cars: &[Car],
    filters: &FilterState,
    index: &FacetIndex,
    dimension: Dimension,
) -> Vec<(FacetValue, usize)> {
    index
        .values(dimension)
        .into_iter()
        .map(|value| {
            let n = engine::count_value(cars, filters, &value);
            (value, n)
        })
        .collect()
}
