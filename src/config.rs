// Settings loaded from a YAML file

use crate::filter::{DEFAULT_PRICE_STEP, DEFAULT_YEAR_STEP, SortOption};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_FILE: &str = "carlot.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Settings {
    /// Listings source: a `.json` seed file or a JSONL listings log
    pub listings: PathBuf,
    pub price_step: u64,
    pub year_step: u32,
    pub default_sort: SortOption,
    /// Maximum rows printed by `search`; 0 prints everything
    pub result_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listings: PathBuf::from("listings.jsonl"),
            price_step: DEFAULT_PRICE_STEP,
            year_step: DEFAULT_YEAR_STEP,
            default_sort: SortOption::default(),
            result_limit: 0,
        }
    }
}

impl Settings {
    /// `<config dir>/carlot/carlot.yml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("carlot").join(CONFIG_FILE))
    }

    /// Load from an explicit path (which must exist) or from the default location
    /// (which may be missing, giving defaults)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        settings.validate()?;
        debug!(path = ?path, ?settings, "Loaded config");
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.price_step == 0 {
            return Err(eyre!("price_step must be greater than zero"));
        }
        if self.year_step == 0 {
            return Err(eyre!("year_step must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.price_step, 10_000);
        assert_eq!(settings.year_step, 1);
        assert_eq!(settings.default_sort, SortOption::Popularity);
        assert_eq!(settings.listings, PathBuf::from("listings.jsonl"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("carlot.yml");
        fs::write(&path, "listings: /srv/cars.json\ndefault_sort: priceLowToHigh\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.listings, PathBuf::from("/srv/cars.json"));
        assert_eq!(settings.default_sort, SortOption::PriceLowToHigh);
        assert_eq!(settings.price_step, 10_000);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(Settings::load(Some(&temp.path().join("absent.yml"))).is_err());
    }

    #[test]
    fn test_rejects_zero_step() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("carlot.yml");
        fs::write(&path, "price_step: 0\n").unwrap();
        assert!(Settings::from_file(&path).is_err());
    }

    #[test]
    fn test_rejects_unknown_sort() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("carlot.yml");
        fs::write(&path, "default_sort: cheapest\n").unwrap();
        assert!(Settings::from_file(&path).is_err());
    }
}
