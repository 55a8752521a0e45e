// Filter selections driven by the user

use crate::car::{Address, BodyType, Car, Dimension, FuelType, Ownership, Transmission};
use crate::engine;
use crate::facets::FacetIndex;
use crate::range::{Range, RangeControl};
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::iter;
use std::str::FromStr;

pub const DEFAULT_PRICE_STEP: u64 = 10_000;
pub const DEFAULT_YEAR_STEP: u32 = 1;

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOption {
    PriceLowToHigh,
    PriceHighToLow,
    YearNewToOld,
    YearOldToNew,
    /// Listing store order
    #[default]
    Popularity,
}

impl SortOption {
    pub const ALL: &'static [SortOption] = &[
        SortOption::PriceLowToHigh,
        SortOption::PriceHighToLow,
        SortOption::YearNewToOld,
        SortOption::YearOldToNew,
        SortOption::Popularity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::PriceLowToHigh => "priceLowToHigh",
            SortOption::PriceHighToLow => "priceHighToLow",
            SortOption::YearNewToOld => "yearNewToOld",
            SortOption::YearOldToNew => "yearOldToNew",
            SortOption::Popularity => "popularity",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace(['-', '_'], "");
        SortOption::ALL
            .iter()
            .copied()
            .find(|option| option.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                let accepted: Vec<&str> = SortOption::ALL.iter().map(|o| o.as_str()).collect();
                eyre!("Unknown sort option '{}' (expected one of: {})", s, accepted.join(", "))
            })
    }
}

/// A location selection: a whole state, or one city within a state
///
/// `Flat` holds a string read from the flat `"state"` / `"state-city"`
/// encoding. State names may contain hyphens themselves, so a flat key is not
/// split: it matches a car whose state equals it or whose `"{state}-{city}"`
/// composite equals it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocationKey {
    State(String),
    City { state: String, city: String },
    Flat(String),
}

impl LocationKey {
    pub fn state(state: impl Into<String>) -> Self {
        LocationKey::State(state.into())
    }

    pub fn city(state: impl Into<String>, city: impl Into<String>) -> Self {
        LocationKey::City {
            state: state.into(),
            city: city.into(),
        }
    }

    /// A city key matches on the `"{state}-{city}"` composite, exactly like the
    /// flat encoding it replaces.
    pub fn matches(&self, address: &Address) -> bool {
        match self {
            LocationKey::State(state) => address.state.as_deref() == Some(state.as_str()),
            LocationKey::City { state, city } => match (&address.state, &address.city) {
                (Some(s), Some(c)) => composite(s, c).eq(composite(state, city)),
                _ => false,
            },
            LocationKey::Flat(key) => match (&address.state, &address.city) {
                (Some(s), _) if s == key => true,
                (Some(s), Some(c)) => composite(s, c).eq(key.bytes()),
                _ => false,
            },
        }
    }

    /// Two keys name the same location when their flat encodings agree
    pub fn same_location(&self, other: &LocationKey) -> bool {
        self == other || self.to_string() == other.to_string()
    }
}

fn composite<'a>(state: &'a str, city: &'a str) -> impl Iterator<Item = u8> + 'a {
    state.bytes().chain(iter::once(b'-')).chain(city.bytes())
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKey::State(state) => write!(f, "{}", state),
            LocationKey::City { state, city } => write!(f, "{}-{}", state, city),
            LocationKey::Flat(key) => write!(f, "{}", key),
        }
    }
}

impl FromStr for LocationKey {
    type Err = eyre::Report;

    /// Reads the flat encoding: `"Punjab"` or `"Punjab-Chandigarh"`.
    /// A hyphenated string stays `Flat`, since it may be a state like `"Jammu-Kashmir"`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(eyre!("Location cannot be empty"));
        }
        if s.contains('-') {
            Ok(LocationKey::Flat(s.to_string()))
        } else {
            Ok(LocationKey::state(s))
        }
    }
}

/// One candidate value tagged with its dimension
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FacetValue {
    Brand(String),
    BodyType(BodyType),
    Fuel(FuelType),
    Transmission(Transmission),
    Ownership(Ownership),
    Location(LocationKey),
}

impl FacetValue {
    /// Parse a raw value for the given dimension, rejecting values outside its vocabulary
    pub fn parse(dimension: Dimension, raw: &str) -> Result<Self> {
        Ok(match dimension {
            Dimension::Brand => {
                let brand = raw.trim();
                if brand.is_empty() {
                    return Err(eyre!("Brand cannot be empty"));
                }
                FacetValue::Brand(brand.to_string())
            }
            Dimension::BodyType => FacetValue::BodyType(raw.parse()?),
            Dimension::Fuel => FacetValue::Fuel(raw.parse()?),
            Dimension::Transmission => FacetValue::Transmission(raw.parse()?),
            Dimension::Ownership => FacetValue::Ownership(raw.parse()?),
            Dimension::Location => FacetValue::Location(raw.parse()?),
        })
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            FacetValue::Brand(_) => Dimension::Brand,
            FacetValue::BodyType(_) => Dimension::BodyType,
            FacetValue::Fuel(_) => Dimension::Fuel,
            FacetValue::Transmission(_) => Dimension::Transmission,
            FacetValue::Ownership(_) => Dimension::Ownership,
            FacetValue::Location(_) => Dimension::Location,
        }
    }

    /// Whether the car carries this value in this value's dimension
    pub fn matches(&self, car: &Car) -> bool {
        match self {
            FacetValue::Brand(brand) => car.brand.as_deref() == Some(brand.as_str()),
            FacetValue::BodyType(body) => car.body() == Some(*body),
            FacetValue::Fuel(fuel) => car.fuel() == Some(*fuel),
            FacetValue::Transmission(gearbox) => car.gearbox() == Some(*gearbox),
            FacetValue::Ownership(owners) => car.owners() == Some(*owners),
            FacetValue::Location(key) => key.matches(&car.address),
        }
    }
}

impl fmt::Display for FacetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetValue::Brand(brand) => write!(f, "{}", brand),
            FacetValue::BodyType(body) => write!(f, "{}", body),
            FacetValue::Fuel(fuel) => write!(f, "{}", fuel),
            FacetValue::Transmission(gearbox) => write!(f, "{}", gearbox),
            FacetValue::Ownership(owners) => write!(f, "{}", owners),
            FacetValue::Location(key) => write!(f, "{}", key),
        }
    }
}

/// The user's active selections, price/year sliders, search term and sort order
///
/// An empty set places no restriction on its dimension. Within a dimension the
/// selected values are OR-ed; across dimensions they are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub brand: BTreeSet<String>,
    pub body_type: BTreeSet<BodyType>,
    pub fuel: BTreeSet<FuelType>,
    pub transmission: BTreeSet<Transmission>,
    pub ownership: BTreeSet<Ownership>,
    pub location: BTreeSet<LocationKey>,
    pub price: RangeControl<u64>,
    pub year: RangeControl<u32>,
    pub search_term: String,
    pub sort: SortOption,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_STEP, DEFAULT_YEAR_STEP)
    }
}

impl FilterState {
    /// Unrestricted state for a store with no data yet
    pub fn new(price_step: u64, year_step: u32) -> Self {
        Self {
            brand: BTreeSet::new(),
            body_type: BTreeSet::new(),
            fuel: BTreeSet::new(),
            transmission: BTreeSet::new(),
            ownership: BTreeSet::new(),
            location: BTreeSet::new(),
            price: RangeControl::unbounded(price_step),
            year: RangeControl::unbounded(year_step),
            search_term: String::new(),
            sort: SortOption::default(),
        }
    }

    /// Unrestricted state with the sliders spanning the indexed listings
    pub fn for_index(index: &FacetIndex, price_step: u64, year_step: u32) -> Self {
        let mut state = Self::new(price_step, year_step);
        state.rebound(index);
        state
    }

    /// Follow a listing store refresh: sliders adopt the new bounds
    pub fn rebound(&mut self, index: &FacetIndex) {
        self.price.rebound(index.price);
        self.year.rebound(index.year);
    }

    pub fn price_range(&self) -> Range<u64> {
        self.price.value()
    }

    pub fn year_range(&self) -> Range<u32> {
        self.year.value()
    }

    /// Returns true if the value was not selected before
    pub fn select(&mut self, value: FacetValue) -> bool {
        match value {
            FacetValue::Brand(v) => self.brand.insert(v),
            FacetValue::BodyType(v) => self.body_type.insert(v),
            FacetValue::Fuel(v) => self.fuel.insert(v),
            FacetValue::Transmission(v) => self.transmission.insert(v),
            FacetValue::Ownership(v) => self.ownership.insert(v),
            FacetValue::Location(v) => self.location.insert(v),
        }
    }

    /// Returns true if the value was selected
    pub fn deselect(&mut self, value: &FacetValue) -> bool {
        match value {
            FacetValue::Brand(v) => self.brand.remove(v),
            FacetValue::BodyType(v) => self.body_type.remove(v),
            FacetValue::Fuel(v) => self.fuel.remove(v),
            FacetValue::Transmission(v) => self.transmission.remove(v),
            FacetValue::Ownership(v) => self.ownership.remove(v),
            FacetValue::Location(v) => {
                let before = self.location.len();
                self.location.retain(|key| !key.same_location(v));
                self.location.len() < before
            }
        }
    }

    /// Checkbox behaviour. Returns whether the value is selected afterwards.
    pub fn toggle(&mut self, value: FacetValue) -> bool {
        if self.deselect(&value) { false } else { self.select(value) }
    }

    pub fn is_selected(&self, value: &FacetValue) -> bool {
        match value {
            FacetValue::Brand(v) => self.brand.contains(v),
            FacetValue::BodyType(v) => self.body_type.contains(v),
            FacetValue::Fuel(v) => self.fuel.contains(v),
            FacetValue::Transmission(v) => self.transmission.contains(v),
            FacetValue::Ownership(v) => self.ownership.contains(v),
            FacetValue::Location(v) => self.location.iter().any(|key| key.same_location(v)),
        }
    }

    /// Selected values of one dimension, in set order
    pub fn selected(&self, dimension: Dimension) -> Vec<FacetValue> {
        match dimension {
            Dimension::Brand => self.brand.iter().cloned().map(FacetValue::Brand).collect(),
            Dimension::BodyType => self.body_type.iter().copied().map(FacetValue::BodyType).collect(),
            Dimension::Fuel => self.fuel.iter().copied().map(FacetValue::Fuel).collect(),
            Dimension::Transmission => self.transmission.iter().copied().map(FacetValue::Transmission).collect(),
            Dimension::Ownership => self.ownership.iter().copied().map(FacetValue::Ownership).collect(),
            Dimension::Location => self.location.iter().cloned().map(FacetValue::Location).collect(),
        }
    }

    pub fn has_selection(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Brand => !self.brand.is_empty(),
            Dimension::BodyType => !self.body_type.is_empty(),
            Dimension::Fuel => !self.fuel.is_empty(),
            Dimension::Transmission => !self.transmission.is_empty(),
            Dimension::Ownership => !self.ownership.is_empty(),
            Dimension::Location => !self.location.is_empty(),
        }
    }

    pub fn clear(&mut self, dimension: Dimension) {
        match dimension {
            Dimension::Brand => self.brand.clear(),
            Dimension::BodyType => self.body_type.clear(),
            Dimension::Fuel => self.fuel.clear(),
            Dimension::Transmission => self.transmission.clear(),
            Dimension::Ownership => self.ownership.clear(),
            Dimension::Location => self.location.clear(),
        }
    }

    /// Drop every selection, the search term and slider moves. Sort order is kept.
    pub fn clear_all(&mut self) {
        for dimension in Dimension::ALL {
            self.clear(*dimension);
        }
        self.search_term.clear();
        self.price.reset();
        self.year.reset();
    }

    /// True when nothing narrows the listings
    pub fn is_unrestricted(&self) -> bool {
        Dimension::ALL.iter().all(|d| !self.has_selection(*d))
            && self.search_term.trim().is_empty()
            && self.price.is_full_span()
            && self.year.is_full_span()
    }

    /// Listings visible under this state, using its own search term and sort order
    pub fn results<'a>(&self, cars: &'a [Car]) -> Vec<&'a Car> {
        engine::apply(cars, &self.search_term, self.sort, self)
    }
}
