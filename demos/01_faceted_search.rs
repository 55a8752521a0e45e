//! Demo 01: Faceted Search
//!
//! Loads a handful of listings, narrows them with checkboxes and sliders, and
//! prints facet counts the way a filter sidebar would show them.
//!
//! Run with: cargo run --example 01_faceted_search

use carlot::{
    Address, Car, Dimension, FacetValue, FuelType, ListingStore, LocationKey, SortOption, facet_counts,
};
use eyre::Result;

fn listing(id: &str, brand: &str, model: &str, price: u64, year: u32, fuel: &str, state: &str, city: &str) -> Car {
    Car {
        title: Some(format!("{} {} {}", year, brand, model)),
        brand: Some(brand.to_string()),
        model: Some(model.to_string()),
        car_price: Some(price),
        manufacturing_year: Some(year),
        fuel_type: Some(fuel.to_string()),
        address: Address {
            state: Some(state.to_string()),
            city: Some(city.to_string()),
        },
        ..Car::new(id)
    }
}

fn main() -> Result<()> {
    println!("Carlot Faceted Search Demo");
    println!("==========================\n");

    let seed = vec![
        listing("car-001", "Hyundai", "Creta", 950_000, 2019, "Diesel", "Gujarat", "Surat"),
        listing("car-002", "Maruti", "Swift", 420_000, 2016, "Petrol", "Punjab", "Chandigarh"),
        listing("car-003", "Tata", "Nexon EV", 1_250_000, 2022, "Electric", "Gujarat", "Ahmedabad"),
        listing("car-004", "Hyundai", "i20", 560_000, 2018, "Petrol", "Punjab", "Ludhiana"),
        listing("car-005", "Mahindra", "XUV500", 880_000, 2017, "Diesel", "Maharashtra", "Pune"),
    ];
    let store = ListingStore::load(&seed)?;
    let mut filters = store.filter_state(10_000, 1);

    println!("Price bounds: {}", filters.price_range());
    println!("Year bounds:  {}\n", filters.year_range());

    // Tick "Petrol" and pick Gujarat plus one Punjab city
    filters.select(FacetValue::Fuel(FuelType::Petrol));
    filters.select(FacetValue::Location(LocationKey::state("Gujarat")));
    filters.select(FacetValue::Location(LocationKey::city("Punjab", "Ludhiana")));
    filters.sort = SortOption::PriceLowToHigh;

    println!("Petrol cars in Gujarat or Ludhiana:");
    for car in store.search(&filters) {
        println!("  {} {:?} {:?}", car.id, car.brand, car.price());
    }

    println!("\nFuel facet (not narrowed by the fuel selection itself):");
    for (value, n) in facet_counts(store.cars(), &filters, store.facets(), Dimension::Fuel) {
        println!("  {} ({})", value, n);
    }

    // Drag the upper price handle below the lower one: they meet, never cross
    filters.price.drag_low(500_000);
    filters.price.drag_high(100_000);
    println!("\nAfter crossing drag: {}", filters.price.release());

    Ok(())
}
