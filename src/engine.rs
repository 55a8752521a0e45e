// Filter engine and facet counter over an in-memory listing slice

use crate::car::{Car, Dimension};
use crate::filter::{FacetValue, FilterState, SortOption};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use tracing::debug;

/// Filter and sort `cars`.
///
/// `search_term` and `sort` are taken from the arguments; every other
/// constraint comes from `filters`. Records missing a field a constraint looks
/// at are left out. The input is never modified and ties keep store order.
pub fn apply<'a>(cars: &'a [Car], search_term: &str, sort: SortOption, filters: &FilterState) -> Vec<&'a Car> {
    let pipeline = Pipeline::new(filters, search_term);
    let mut results: Vec<&Car> = cars.iter().filter(|car| pipeline.matches(car, None)).collect();
    sort_cars(&mut results, sort);

    debug!(
        total = cars.len(),
        matched = results.len(),
        sort = %sort,
        "apply: filtered listings"
    );
    results
}

/// Number of listings that would match if `candidate` were also picked in `dimension`.
///
/// The current selection in `dimension` itself is ignored; all other filters,
/// the ranges and the state's search term stay in force. A candidate that does
/// not parse for the dimension matches nothing.
pub fn count(cars: &[Car], filters: &FilterState, dimension: Dimension, candidate: &str) -> usize {
    match FacetValue::parse(dimension, candidate) {
        Ok(value) => count_value(cars, filters, &value),
        Err(e) => {
            debug!(%dimension, candidate, error = %e, "count: candidate outside vocabulary");
            0
        }
    }
}

/// Facet count for an already typed candidate
pub fn count_value(cars: &[Car], filters: &FilterState, candidate: &FacetValue) -> usize {
    let pipeline = Pipeline::new(filters, &filters.search_term);
    let dimension = candidate.dimension();
    cars.iter()
        .filter(|car| candidate.matches(car) && pipeline.matches(car, Some(dimension)))
        .count()
}

/// Sort in place; `sort_by` is stable so equal keys keep their relative order
pub fn sort_cars(cars: &mut [&Car], sort: SortOption) {
    match sort {
        SortOption::PriceLowToHigh => cars.sort_by(|a, b| a.price().cmp(&b.price())),
        SortOption::PriceHighToLow => cars.sort_by(|a, b| b.price().cmp(&a.price())),
        SortOption::YearNewToOld => cars.sort_by(|a, b| b.year().cmp(&a.year())),
        SortOption::YearOldToNew => cars.sort_by(|a, b| a.year().cmp(&b.year())),
        SortOption::Popularity => {}
    }
}

/// Every narrowing pass for one filter state, with the search term prepared once
struct Pipeline<'f> {
    filters: &'f FilterState,
    term: Option<String>,
}

impl<'f> Pipeline<'f> {
    fn new(filters: &'f FilterState, search_term: &str) -> Self {
        let term = search_term.trim();
        Self {
            filters,
            term: (!term.is_empty()).then(|| term.to_lowercase()),
        }
    }

    /// AND of all passes, skipping the categorical pass for `except`
    fn matches(&self, car: &Car, except: Option<Dimension>) -> bool {
        self.matches_search(car)
            && Dimension::ALL
                .iter()
                .filter(|d| Some(**d) != except)
                .all(|d| self.matches_dimension(car, *d))
            && self.matches_ranges(car)
    }

    fn matches_search(&self, car: &Car) -> bool {
        match &self.term {
            Some(term) => car.search_text().contains(term.as_str()),
            None => true,
        }
    }

    fn matches_dimension(&self, car: &Car, dimension: Dimension) -> bool {
        let f = self.filters;
        match dimension {
            Dimension::Brand => in_selection(&f.brand, car.brand.as_deref()),
            Dimension::BodyType => in_selection(&f.body_type, car.body().as_ref()),
            Dimension::Fuel => in_selection(&f.fuel, car.fuel().as_ref()),
            Dimension::Transmission => in_selection(&f.transmission, car.gearbox().as_ref()),
            Dimension::Ownership => in_selection(&f.ownership, car.owners().as_ref()),
            Dimension::Location => f.location.is_empty() || f.location.iter().any(|key| key.matches(&car.address)),
        }
    }

    fn matches_ranges(&self, car: &Car) -> bool {
        let price = car.price().is_some_and(|p| self.filters.price_range().contains(p));
        let year = car.year().is_some_and(|y| self.filters.year_range().contains(y));
        price && year
    }
}

/// An empty selection admits everything; otherwise the value must be present and selected
fn in_selection<T, Q>(selected: &BTreeSet<T>, value: Option<&Q>) -> bool
where
    T: Ord + Borrow<Q>,
    Q: Ord + ?Sized,
{
    selected.is_empty() || value.is_some_and(|v| selected.contains(v))
}
