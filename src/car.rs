// Listing data model for the marketplace

use crate::record::Record;
use chrono::Datelike;
use eyre::{Result, eyre};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Declares a closed category vocabulary with case-insensitive parsing.
macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every value, in catalog order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Match a raw record value against the vocabulary
            pub fn parse_lenient(value: &str) -> Option<Self> {
                let value = value.trim();
                Self::ALL.iter().copied().find(|v| v.as_str().eq_ignore_ascii_case(value))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = eyre::Report;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse_lenient(s).ok_or_else(|| {
                    let accepted: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                    eyre!("Unknown {} '{}' (expected one of: {})", $label, s, accepted.join(", "))
                })
            }
        }
    };
}

vocabulary!(
    /// Fuel type of a listing
    FuelType, "fuel type" {
        Petrol => "Petrol",
        Diesel => "Diesel",
        Cng => "CNG",
        Electric => "Electric",
        Hybrid => "Hybrid",
        Lpg => "LPG",
    }
);

vocabulary!(
    /// Gearbox of a listing
    Transmission, "transmission" {
        Manual => "Manual",
        Automatic => "Automatic",
    }
);

vocabulary!(
    /// Body style of a listing
    BodyType, "body type" {
        Suv => "SUV",
        Sedan => "Sedan",
        Hatchback => "Hatchback",
        Muv => "MUV",
        Coupe => "Coupe",
        Convertible => "Convertible",
        Wagon => "Wagon",
    }
);

vocabulary!(
    /// Number of previous owners
    Ownership, "ownership" {
        First => "1st",
        Second => "2nd",
        Third => "3rd",
        FourPlus => "3+",
    }
);

/// One categorical axis of filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Brand,
    BodyType,
    Fuel,
    Transmission,
    Ownership,
    Location,
}

impl Dimension {
    pub const ALL: &'static [Dimension] = &[
        Dimension::Brand,
        Dimension::BodyType,
        Dimension::Fuel,
        Dimension::Transmission,
        Dimension::Ownership,
        Dimension::Location,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Brand => "brand",
            Dimension::BodyType => "bodyType",
            Dimension::Fuel => "fuel",
            Dimension::Transmission => "transmission",
            Dimension::Ownership => "ownership",
            Dimension::Location => "location",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brand" => Ok(Dimension::Brand),
            "bodytype" | "body_type" | "body" => Ok(Dimension::BodyType),
            "fuel" | "fueltype" | "fuel_type" => Ok(Dimension::Fuel),
            "transmission" => Ok(Dimension::Transmission),
            "ownership" => Ok(Dimension::Ownership),
            "location" => Ok(Dimension::Location),
            _ => Err(eyre!(
                "Unknown dimension '{}' (expected brand, bodyType, fuel, transmission, ownership or location)",
                s
            )),
        }
    }
}

/// Where a listed car is parked
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub state: Option<String>,
    pub city: Option<String>,
}

/// A listed car as served by the marketplace backend
///
/// Every field the filters look at is optional: a record missing one, or
/// carrying a value of the wrong JSON type, simply fails any filter that
/// references it. Only a record without an id is unreadable. Fields the filters
/// never look at (images, seats, mileage, description, ...) are kept verbatim
/// in `extra`.
///
/// Category fields (fuel, body type, transmission, ownership) keep the stored
/// text, but match their vocabulary ignoring case and surrounding whitespace:
/// a record stored as `" petrol"` matches a `Petrol` selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub car_price: Option<u64>,
    pub address: Address,
    pub manufacturing_year: Option<u32>,
    pub fuel_type: Option<String>,
    pub body_type: Option<String>,
    pub transmission: Option<String>,
    pub ownership: Option<String>,
    pub updated_at: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for Car {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = Map::deserialize(deserializer)?;
        Car::from_fields(fields).map_err(D::Error::custom)
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => {
            debug!(field = key, value = %other, "Ignoring listing field of the wrong type");
            None
        }
    }
}

/// Non-negative whole number, also accepted as a whole float or a numeric string
fn as_amount(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First readable amount among `keys`; every key is consumed
fn take_amount(fields: &mut Map<String, Value>, keys: &[&str]) -> Option<u64> {
    let mut found = None;
    for key in keys {
        if let Some(value) = fields.remove(*key) {
            let amount = as_amount(&value);
            if amount.is_none() && !value.is_null() {
                debug!(field = *key, %value, "Ignoring listing field of the wrong type");
            }
            found = found.or(amount);
        }
    }
    found
}

impl Car {
    /// Build a listing from a JSON object, tolerating missing or mistyped fields.
    ///
    /// `carPrice` wins over `price` and `manufacturingYear` over `year` when a
    /// record carries both.
    pub fn from_fields(mut fields: Map<String, Value>) -> Result<Self> {
        let id = match fields.remove("id").or_else(|| fields.remove("_id")) {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(eyre!("Listing has no usable id")),
        };
        fields.remove("_id");

        let address = match fields.remove("address") {
            Some(Value::Object(mut inner)) => Address {
                state: take_string(&mut inner, "state"),
                city: take_string(&mut inner, "city"),
            },
            _ => Address::default(),
        };

        let updated_at = fields.remove("updatedAt").and_then(|v| v.as_i64()).unwrap_or(0);

        Ok(Self {
            id,
            title: take_string(&mut fields, "title"),
            brand: take_string(&mut fields, "brand"),
            model: take_string(&mut fields, "model"),
            car_price: take_amount(&mut fields, &["carPrice", "price"]),
            address,
            manufacturing_year: take_amount(&mut fields, &["manufacturingYear", "year"])
                .and_then(|y| u32::try_from(y).ok()),
            fuel_type: take_string(&mut fields, "fuelType"),
            body_type: take_string(&mut fields, "bodyType"),
            transmission: take_string(&mut fields, "transmission"),
            ownership: take_string(&mut fields, "ownership"),
            updated_at,
            extra: fields,
        })
    }

    /// Bare listing with only an id; fill in the rest with struct update syntax
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            brand: None,
            model: None,
            car_price: None,
            address: Address::default(),
            manufacturing_year: None,
            fuel_type: None,
            body_type: None,
            transmission: None,
            ownership: None,
            updated_at: 0,
            extra: Map::new(),
        }
    }

    pub fn price(&self) -> Option<u64> {
        self.car_price
    }

    pub fn year(&self) -> Option<u32> {
        self.manufacturing_year
    }

    pub fn state(&self) -> Option<&str> {
        self.address.state.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.address.city.as_deref()
    }

    pub fn fuel(&self) -> Option<FuelType> {
        self.fuel_type.as_deref().and_then(FuelType::parse_lenient)
    }

    pub fn gearbox(&self) -> Option<Transmission> {
        self.transmission.as_deref().and_then(Transmission::parse_lenient)
    }

    pub fn body(&self) -> Option<BodyType> {
        self.body_type.as_deref().and_then(BodyType::parse_lenient)
    }

    pub fn owners(&self) -> Option<Ownership> {
        self.ownership.as_deref().and_then(Ownership::parse_lenient)
    }

    /// Lowercased text matched by free-text search
    pub fn search_text(&self) -> String {
        [
            self.title.as_deref(),
            self.brand.as_deref(),
            self.model.as_deref(),
            self.city(),
            self.state(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }

    /// Check a listing before it is written to a listings log
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(eyre!("Listing ID cannot be empty or whitespace-only"));
        }
        if self.id.len() > 256 {
            return Err(eyre!("Listing ID too long: {} chars (max 256)", self.id.len()));
        }
        if self.brand.as_deref().is_none_or(|b| b.trim().is_empty()) {
            return Err(eyre!("Listing {} has no brand", self.id));
        }
        if self.model.as_deref().is_none_or(|m| m.trim().is_empty()) {
            return Err(eyre!("Listing {} has no model", self.id));
        }
        if self.car_price.is_none() {
            return Err(eyre!("Listing {} has no price", self.id));
        }

        let latest_year = chrono::Utc::now().year() as u32 + 1;
        match self.manufacturing_year {
            None => return Err(eyre!("Listing {} has no manufacturing year", self.id)),
            Some(year) if !(1000..=latest_year).contains(&year) => {
                return Err(eyre!(
                    "Listing {} has invalid manufacturing year {} (expected 1000..={})",
                    self.id,
                    year,
                    latest_year
                ));
            }
            Some(_) => {}
        }

        if let Some(fuel) = &self.fuel_type {
            fuel.parse::<FuelType>()?;
        }
        if let Some(transmission) = &self.transmission {
            transmission.parse::<Transmission>()?;
        }
        if let Some(body) = &self.body_type {
            body.parse::<BodyType>()?;
        }
        if let Some(ownership) = &self.ownership {
            ownership.parse::<Ownership>()?;
        }

        Ok(())
    }
}

impl Record for Car {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_car() -> Car {
        Car {
            title: Some("2019 Hyundai Creta SX".to_string()),
            brand: Some("Hyundai".to_string()),
            model: Some("Creta".to_string()),
            car_price: Some(950_000),
            address: Address {
                state: Some("Gujarat".to_string()),
                city: Some("Surat".to_string()),
            },
            manufacturing_year: Some(2019),
            fuel_type: Some("Diesel".to_string()),
            body_type: Some("SUV".to_string()),
            transmission: Some("Manual".to_string()),
            ownership: Some("1st".to_string()),
            ..Car::new("car-1")
        }
    }

    #[test]
    fn test_vocabulary_parse_is_case_insensitive() {
        assert_eq!("diesel".parse::<FuelType>().unwrap(), FuelType::Diesel);
        assert_eq!("cng".parse::<FuelType>().unwrap(), FuelType::Cng);
        assert_eq!(" suv ".parse::<BodyType>().unwrap(), BodyType::Suv);
        assert_eq!("3+".parse::<Ownership>().unwrap(), Ownership::FourPlus);
        assert_eq!("AUTOMATIC".parse::<Transmission>().unwrap(), Transmission::Automatic);
    }

    #[test]
    fn test_vocabulary_rejects_typos() {
        let err = "Petorl".parse::<FuelType>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Petorl"));
        assert!(message.contains("Petrol, Diesel, CNG, Electric, Hybrid, LPG"));
    }

    #[test]
    fn test_vocabulary_display() {
        assert_eq!(FuelType::Lpg.to_string(), "LPG");
        assert_eq!(Ownership::Second.to_string(), "2nd");
        assert_eq!(BodyType::ALL.len(), 7);
    }

    #[test]
    fn test_dimension_from_str() {
        assert_eq!("fuel".parse::<Dimension>().unwrap(), Dimension::Fuel);
        assert_eq!("bodyType".parse::<Dimension>().unwrap(), Dimension::BodyType);
        assert_eq!("body_type".parse::<Dimension>().unwrap(), Dimension::BodyType);
        assert!("colour".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_car_deserializes_backend_shape() {
        let json = r#"{
            "_id": "abc",
            "brand": "Maruti",
            "model": "Swift",
            "carPrice": 450000,
            "address": {"state": "Punjab", "city": "Chandigarh"},
            "manufacturingYear": 2017,
            "fuelType": "Petrol",
            "images": ["a.jpg"],
            "seats": 5
        }"#;

        let car: Car = serde_json::from_str(json).unwrap();
        assert_eq!(car.id, "abc");
        assert_eq!(car.price(), Some(450_000));
        assert_eq!(car.year(), Some(2017));
        assert_eq!(car.state(), Some("Punjab"));
        assert_eq!(car.fuel(), Some(FuelType::Petrol));
        assert_eq!(car.extra.get("seats"), Some(&serde_json::json!(5)));
    }

    #[test]
    fn test_car_accepts_short_field_aliases() {
        let json = r#"{"id": "x", "price": 100, "year": 2020}"#;
        let car: Car = serde_json::from_str(json).unwrap();
        assert_eq!(car.price(), Some(100));
        assert_eq!(car.year(), Some(2020));
        assert_eq!(car.brand, None);
        assert_eq!(car.address, Address::default());
    }

    #[test]
    fn test_car_passes_extra_fields_through() {
        let json = r#"{"id":"x","brand":"Kia","mileage":"18 kmpl","description":"clean"}"#;
        let car: Car = serde_json::from_str(json).unwrap();
        let back = serde_json::to_value(&car).unwrap();
        assert_eq!(back["mileage"], "18 kmpl");
        assert_eq!(back["description"], "clean");
    }

    #[test]
    fn test_car_tolerates_null_address_and_mistyped_fields() {
        let json = r#"{"id":"x","brand":"Kia","address":null,"fuelType":5,"carPrice":"350000","manufacturingYear":2018.0}"#;
        let car: Car = serde_json::from_str(json).unwrap();
        assert_eq!(car.address, Address::default());
        assert_eq!(car.fuel_type, None);
        assert_eq!(car.price(), Some(350_000));
        assert_eq!(car.year(), Some(2018));
        assert!(!car.extra.contains_key("fuelType"));
    }

    #[test]
    fn test_car_with_both_price_keys_prefers_car_price() {
        let json = r#"{"id":"x","carPrice":500000,"price":1,"manufacturingYear":2019,"year":1990}"#;
        let car: Car = serde_json::from_str(json).unwrap();
        assert_eq!(car.price(), Some(500_000));
        assert_eq!(car.year(), Some(2019));
        assert!(car.extra.is_empty());

        // An unreadable carPrice falls back to price
        let json = r#"{"id":"y","carPrice":"ask","price":200000}"#;
        let car: Car = serde_json::from_str(json).unwrap();
        assert_eq!(car.price(), Some(200_000));
    }

    #[test]
    fn test_car_without_id_is_unreadable() {
        assert!(serde_json::from_str::<Car>(r#"{"brand":"Kia"}"#).is_err());
        assert!(serde_json::from_str::<Car>(r#"{"id":"","brand":"Kia"}"#).is_err());
        assert!(serde_json::from_str::<Car>(r#"[1, 2]"#).is_err());

        let numeric: Car = serde_json::from_str(r#"{"_id": 42}"#).unwrap();
        assert_eq!(numeric.id, "42");
    }

    #[test]
    fn test_out_of_vocabulary_value_is_kept_but_unparsed() {
        let car = Car {
            fuel_type: Some("Steam".to_string()),
            ..sample_car()
        };
        assert_eq!(car.fuel_type.as_deref(), Some("Steam"));
        assert_eq!(car.fuel(), None);
    }

    #[test]
    fn test_search_text_joins_present_fields() {
        let car = sample_car();
        assert_eq!(car.search_text(), "2019 hyundai creta sx hyundai creta surat gujarat");

        let bare = Car {
            brand: Some("Tata".to_string()),
            ..Car::new("bare")
        };
        assert_eq!(bare.search_text(), "tata");
    }

    #[test]
    fn test_validate_accepts_complete_listing() {
        assert!(sample_car().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_listings() {
        let no_price = Car {
            car_price: None,
            ..sample_car()
        };
        assert!(no_price.validate().is_err());

        let future = Car {
            manufacturing_year: Some(3000),
            ..sample_car()
        };
        assert!(future.validate().is_err());

        let typo = Car {
            body_type: Some("Sedna".to_string()),
            ..sample_car()
        };
        assert!(typo.validate().is_err());

        let blank_id = Car {
            id: "   ".to_string(),
            ..sample_car()
        };
        assert!(blank_id.validate().is_err());
    }
}
