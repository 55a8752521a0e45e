use carlot::store::source_for_path;
use carlot::{
    Address, Car, Dimension, FacetValue, FilterState, ListingStore, ListingsLog, Settings, SortOption, facet_counts,
};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "carlot")]
#[command(about = "Carlot CLI - Browse, filter and manage used-car listings")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file (default: <config dir>/carlot/carlot.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listings source: a .json seed file or a .jsonl listings log
    #[arg(short, long)]
    listings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the listings matching the filters
    Search {
        #[command(flatten)]
        filters: FilterArgs,

        /// Sort order (priceLowToHigh, priceHighToLow, yearNewToOld, yearOldToNew, popularity)
        #[arg(long)]
        sort: Option<String>,

        /// Print at most this many listings
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show per-value counts for every filter dimension
    Facets {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Add a listing to the listings log
    Add(AddArgs),

    /// Remove a listing from the listings log
    Remove {
        /// Listing ID
        id: String,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Free-text search over title, brand, model, city and state
    #[arg(short, long)]
    query: Option<String>,

    #[arg(long)]
    brand: Vec<String>,

    #[arg(long)]
    fuel: Vec<String>,

    #[arg(long)]
    body: Vec<String>,

    #[arg(long)]
    transmission: Vec<String>,

    #[arg(long)]
    ownership: Vec<String>,

    /// State ("Punjab") or state-city ("Punjab-Chandigarh")
    #[arg(long)]
    location: Vec<String>,

    #[arg(long)]
    min_price: Option<u64>,

    #[arg(long)]
    max_price: Option<u64>,

    #[arg(long)]
    min_year: Option<u32>,

    #[arg(long)]
    max_year: Option<u32>,
}

impl FilterArgs {
    /// Build a filter state over `store`, rejecting values outside a dimension's vocabulary
    fn to_state(&self, store: &ListingStore, settings: &Settings) -> Result<FilterState> {
        let mut state = store.filter_state(settings.price_step, settings.year_step);

        let groups = [
            (Dimension::Brand, &self.brand),
            (Dimension::Fuel, &self.fuel),
            (Dimension::BodyType, &self.body),
            (Dimension::Transmission, &self.transmission),
            (Dimension::Ownership, &self.ownership),
            (Dimension::Location, &self.location),
        ];
        for (dimension, raw_values) in groups {
            for raw in raw_values {
                state.select(FacetValue::parse(dimension, raw)?);
            }
        }

        if let Some(query) = &self.query {
            state.search_term = query.clone();
        }

        if self.min_price.is_some() || self.max_price.is_some() {
            let current = state.price_range();
            state
                .price
                .set(self.min_price.unwrap_or(current.low), self.max_price.unwrap_or(current.high));
        }
        if self.min_year.is_some() || self.max_year.is_some() {
            let current = state.year_range();
            state
                .year
                .set(self.min_year.unwrap_or(current.low), self.max_year.unwrap_or(current.high));
        }

        Ok(state)
    }
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    brand: String,

    #[arg(long)]
    model: String,

    #[arg(long)]
    price: u64,

    #[arg(long)]
    year: u32,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    fuel: Option<String>,

    #[arg(long)]
    body: Option<String>,

    #[arg(long)]
    transmission: Option<String>,

    #[arg(long)]
    ownership: Option<String>,

    #[arg(long)]
    state: Option<String>,

    #[arg(long)]
    city: Option<String>,
}

impl AddArgs {
    fn into_car(self) -> Car {
        Car {
            title: self.title,
            brand: Some(self.brand),
            model: Some(self.model),
            car_price: Some(self.price),
            address: Address {
                state: self.state,
                city: self.city,
            },
            manufacturing_year: Some(self.year),
            fuel_type: self.fuel,
            body_type: self.body,
            transmission: self.transmission,
            ownership: self.ownership,
            ..Car::new(uuid::Uuid::now_v7().to_string())
        }
    }
}

fn main() -> Result<()> {
    // Setup tracing; stdout is reserved for results
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let listings_path = cli.listings.clone().unwrap_or_else(|| settings.listings.clone());

    match cli.command {
        Commands::Search { filters, sort, limit } => {
            let store = ListingStore::load_or_empty(source_for_path(&listings_path).as_ref());
            let mut state = filters.to_state(&store, &settings)?;
            state.sort = match sort {
                Some(raw) => raw.parse::<SortOption>()?,
                None => settings.default_sort,
            };

            let results = store.search(&state);
            let limit = limit.unwrap_or(settings.result_limit);
            let shown = if limit == 0 { results.len() } else { limit.min(results.len()) };

            for car in &results[..shown] {
                print_car(car);
            }
            println!(
                "{}",
                format!("{} of {} listings match (sorted by {})", results.len(), store.len(), state.sort).dimmed()
            );
        }
        Commands::Facets { filters } => {
            let store = ListingStore::load_or_empty(source_for_path(&listings_path).as_ref());
            let state = filters.to_state(&store, &settings)?;

            for dimension in Dimension::ALL {
                println!("{}", dimension.to_string().bold());
                for (value, n) in facet_counts(store.cars(), &state, store.facets(), *dimension) {
                    let marker = if state.is_selected(&value) { "[x]" } else { "[ ]" };
                    println!("  {} {} ({})", marker, value, n);
                }
            }
            println!("{} {}", "price".bold(), state.price_range());
            println!("{} {}", "year".bold(), state.year_range());
        }
        Commands::Add(args) => {
            let log = writable_log(&listings_path)?;
            let car = log.append(args.into_car())?;
            println!("{} {}", "Added".green(), car.id);
        }
        Commands::Remove { id } => {
            let log = writable_log(&listings_path)?;
            log.remove(&id)?;
            println!("{} {}", "Removed".green(), id);
        }
    }

    Ok(())
}

fn writable_log(path: &std::path::Path) -> Result<ListingsLog> {
    if path.extension().and_then(|s| s.to_str()) == Some("json") {
        return Err(eyre!(
            "{} is a read-only seed file; point --listings at a .jsonl log",
            path.display()
        ));
    }
    Ok(ListingsLog::new(path))
}

fn print_car(car: &Car) {
    let name = [car.brand.as_deref(), car.model.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let year = car.year().map(|y| y.to_string()).unwrap_or_else(|| "----".to_string());
    let price = car.price().map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
    let place = [car.city(), car.state()].into_iter().flatten().collect::<Vec<_>>().join(", ");

    println!(
        "{}  {} {}  {}  {}",
        car.id.dimmed(),
        year,
        name.bold(),
        price.yellow(),
        place.cyan()
    );
}
